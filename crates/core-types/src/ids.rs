use std::fmt;

use chrono::{DateTime, Datelike, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const SUFFIX_LEN: usize = 9;

/// `<prefix>_<unix-millis>_<random suffix>`
fn generate(prefix: &str, at: DateTime<Utc>) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|byte| char::from(byte).to_ascii_lowercase())
        .collect();
    format!("{prefix}_{}_{suffix}", at.timestamp_millis())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(ProcessId);
string_id!(
    /// Supplied by the caller on login; never generated.
    UserId
);
string_id!(NotificationId);
string_id!(RequestId);
string_id!(
    /// Names one running portal instance on the cross-instance channel.
    InstanceId
);

impl ProcessId {
    pub fn generate(at: DateTime<Utc>) -> Self {
        Self(generate("proc", at))
    }
}

impl NotificationId {
    pub fn generate(at: DateTime<Utc>) -> Self {
        Self(generate("notif", at))
    }
}

impl RequestId {
    pub fn generate(at: DateTime<Utc>) -> Self {
        Self(generate("req", at))
    }
}

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Formats a case number in the unified `NNNNNNN-DD.YYYY.J.TR.OOOO` layout.
pub fn case_number(at: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let sequential = at.timestamp_millis().rem_euclid(10_000_000);
    let check: u8 = rng.gen_range(0..100);
    let origin: u16 = rng.gen_range(0..10_000);
    format!("{sequential:07}-{check:02}.{}.8.26.{origin:04}", at.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn generated_ids_carry_prefix_and_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let id = ProcessId::generate(at);
        let parts: Vec<&str> = id.as_str().split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "proc");
        assert_eq!(parts[1], at.timestamp_millis().to_string());
        assert_eq!(parts[2].len(), SUFFIX_LEN);
        assert!(parts[2]
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));

        assert!(NotificationId::generate(at).as_str().starts_with("notif_"));
        assert!(RequestId::generate(at).as_str().starts_with("req_"));
    }

    #[test]
    fn ids_from_same_instant_differ() {
        let at = Utc::now();
        assert_ne!(ProcessId::generate(at), ProcessId::generate(at));
    }

    #[test]
    fn case_number_layout() {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        let number = case_number(at);
        let (head, tail) = number.split_once('-').unwrap();
        assert_eq!(head.len(), 7);
        let segments: Vec<&str> = tail.split('.').collect();
        assert_eq!(segments.len(), 5);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[1], "2024");
        assert_eq!(segments[2], "8");
        assert_eq!(segments[3], "26");
        assert_eq!(segments[4].len(), 4);
    }
}
