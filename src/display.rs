use std::sync::Arc;

use tracing::info;

use courtportal_registry::{
    CounterDisplay, IN_PROGRESS_PROCESSES_ELEMENT, ONLINE_USERS_ELEMENT,
    PENDING_PROCESSES_ELEMENT, TOTAL_PROCESSES_ELEMENT,
};

const ELEMENTS: [&str; 4] = [
    TOTAL_PROCESSES_ELEMENT,
    PENDING_PROCESSES_ELEMENT,
    IN_PROGRESS_PROCESSES_ELEMENT,
    ONLINE_USERS_ELEMENT,
];

/// Counter display for headless runs: each element update becomes a log line.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingDisplay;

impl TracingDisplay {
    pub fn shared() -> Arc<dyn CounterDisplay> {
        Arc::new(Self)
    }
}

impl CounterDisplay for TracingDisplay {
    fn set_text(&self, element: &str, text: &str) -> bool {
        if !ELEMENTS.contains(&element) {
            return false;
        }
        info!(target: "courtportal::counters", element, value = text, "counter updated");
        true
    }
}
