pub mod app_context;
pub mod cli;
pub mod display;
pub mod errors;

pub use app_context::AppContext;
pub use display::TracingDisplay;
pub use errors::AppError;
