use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use courtportal_core_types::UserId;

use crate::errors::RegistryError;
use crate::model::{Process, ProcessStatus, Urgency};

/// Every field of a process that `update` may change.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProcessPatch {
    #[serde(rename = "type")]
    pub process_type: Option<String>,
    pub plaintiff: Option<String>,
    pub defendant: Option<String>,
    pub urgency: Option<Urgency>,
    pub description: Option<String>,
    pub status: Option<ProcessStatus>,
    pub assigned_judge_id: Option<UserId>,
    pub assigned_judge_name: Option<String>,
    pub assumed_at: Option<DateTime<Utc>>,
}

impl ProcessPatch {
    pub fn status(status: ProcessStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn validate(&self, current: &Process) -> Result<(), RegistryError> {
        let text_fields = [
            ("type", &self.process_type),
            ("plaintiff", &self.plaintiff),
            ("defendant", &self.defendant),
            ("assignedJudgeName", &self.assigned_judge_name),
        ];
        for (name, value) in text_fields {
            if matches!(value, Some(text) if text.trim().is_empty()) {
                return Err(RegistryError::InvalidPatch(format!("{name} must not be blank")));
            }
        }
        if matches!(&self.assigned_judge_id, Some(id) if id.as_str().trim().is_empty()) {
            return Err(RegistryError::InvalidPatch(
                "assignedJudgeId must not be blank".into(),
            ));
        }
        if let Some(next) = self.status {
            if !current.status.can_transition_to(next) {
                return Err(RegistryError::InvalidPatch(format!(
                    "status cannot move from {} to {}",
                    current.status, next
                )));
            }
        }
        Ok(())
    }

    /// Shallow merge; call `validate` first.
    pub(crate) fn apply(self, process: &mut Process) {
        if let Some(value) = self.process_type {
            process.process_type = value;
        }
        if let Some(value) = self.plaintiff {
            process.plaintiff = value;
        }
        if let Some(value) = self.defendant {
            process.defendant = value;
        }
        if let Some(value) = self.urgency {
            process.urgency = Some(value);
        }
        if let Some(value) = self.description {
            process.description = Some(value);
        }
        if let Some(value) = self.status {
            process.status = value;
        }
        if let Some(value) = self.assigned_judge_id {
            process.assigned_judge_id = Some(value);
        }
        if let Some(value) = self.assigned_judge_name {
            process.assigned_judge_name = Some(value);
        }
        if let Some(value) = self.assumed_at {
            process.assumed_at = Some(value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtportal_core_types::ProcessId;

    fn sample(status: ProcessStatus) -> Process {
        let now = Utc::now();
        Process {
            id: ProcessId::from("proc_1"),
            case_number: "0000001-00.2024.8.26.0000".into(),
            process_type: "civil".into(),
            plaintiff: "A".into(),
            defendant: "B".into(),
            urgency: None,
            description: None,
            status,
            assigned_judge_id: None,
            assigned_judge_name: None,
            assumed_at: None,
            created_at: now,
            updated_at: now,
            history: Vec::new(),
            lawyer_requests: Vec::new(),
        }
    }

    #[test]
    fn rejects_blank_text_and_illegal_transitions() {
        let pending = sample(ProcessStatus::Pending);
        let blank = ProcessPatch {
            plaintiff: Some("   ".into()),
            ..ProcessPatch::default()
        };
        assert!(matches!(
            blank.validate(&pending),
            Err(RegistryError::InvalidPatch(_))
        ));

        let skip = ProcessPatch::status(ProcessStatus::Concluded);
        assert!(skip.validate(&pending).is_err());
        assert!(ProcessPatch::status(ProcessStatus::InProgress)
            .validate(&pending)
            .is_ok());
        assert!(ProcessPatch::status(ProcessStatus::Pending)
            .validate(&pending)
            .is_ok());
    }

    #[test]
    fn apply_merges_only_present_fields() {
        let mut process = sample(ProcessStatus::Pending);
        let patch = ProcessPatch {
            urgency: Some(Urgency::Alta),
            description: Some("urgent hearing".into()),
            ..ProcessPatch::default()
        };
        patch.validate(&process).unwrap();
        patch.apply(&mut process);
        assert_eq!(process.urgency, Some(Urgency::Alta));
        assert_eq!(process.description.as_deref(), Some("urgent hearing"));
        assert_eq!(process.plaintiff, "A");
        assert_eq!(process.status, ProcessStatus::Pending);
    }

    #[test]
    fn unknown_keys_fail_to_deserialize() {
        let parsed: ProcessPatch = serde_json::from_str(r#"{"status":"in_progress"}"#).unwrap();
        assert_eq!(parsed.status, Some(ProcessStatus::InProgress));
        assert!(serde_json::from_str::<ProcessPatch>(r#"{"caseNumber":"x"}"#).is_err());
        assert!(ProcessPatch::default().is_empty());
    }
}
