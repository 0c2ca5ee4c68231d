use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use courtportal_core_types::{NotificationId, ProcessId, RequestId, UserId};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessStatus {
    Pending,
    InProgress,
    Concluded,
}

impl ProcessStatus {
    /// Only pending→in-progress and in-progress→concluded move a process
    /// forward; staying put is always allowed.
    pub fn can_transition_to(self, next: ProcessStatus) -> bool {
        self == next
            || matches!(
                (self, next),
                (ProcessStatus::Pending, ProcessStatus::InProgress)
                    | (ProcessStatus::InProgress, ProcessStatus::Concluded)
            )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProcessStatus::Pending => "pending",
            ProcessStatus::InProgress => "in_progress",
            ProcessStatus::Concluded => "concluded",
        }
    }
}

impl fmt::Display for ProcessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Alta,
    Media,
    Baixa,
}

impl Urgency {
    pub fn rank(self) -> u8 {
        match self {
            Urgency::Alta => 3,
            Urgency::Media => 2,
            Urgency::Baixa => 1,
        }
    }

    /// Unspecified urgency ranks with `baixa`.
    pub fn rank_of(urgency: Option<Urgency>) -> u8 {
        urgency.map(Urgency::rank).unwrap_or(1)
    }
}

/// Stored records keep loading when they carry an urgency this build does
/// not know; it reads back as unspecified.
fn lenient_urgency<'de, D>(deserializer: D) -> Result<Option<Urgency>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| serde_json::from_value(value).ok()))
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
    Created,
    Updated,
    Assumed,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub at: DateTime<Utc>,
    pub action: HistoryAction,
    pub actor: String,
    pub description: String,
    pub from_status: Option<ProcessStatus>,
    pub to_status: ProcessStatus,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LawyerRequestStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LawyerRequest {
    pub id: RequestId,
    pub process_id: ProcessId,
    pub judge_id: UserId,
    pub lawyer_id: UserId,
    pub reason: String,
    pub status: LawyerRequestStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    pub id: ProcessId,
    pub case_number: String,
    #[serde(rename = "type")]
    pub process_type: String,
    pub plaintiff: String,
    pub defendant: String,
    #[serde(default, deserialize_with = "lenient_urgency")]
    pub urgency: Option<Urgency>,
    pub description: Option<String>,
    pub status: ProcessStatus,
    pub assigned_judge_id: Option<UserId>,
    pub assigned_judge_name: Option<String>,
    pub assumed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub lawyer_requests: Vec<LawyerRequest>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewProcess {
    #[serde(rename = "type")]
    pub process_type: String,
    pub plaintiff: String,
    pub defendant: String,
    #[serde(default)]
    pub urgency: Option<Urgency>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct ProcessFilter {
    pub status: Option<ProcessStatus>,
    pub assigned_judge: Option<UserId>,
}

impl ProcessFilter {
    pub fn status(status: ProcessStatus) -> Self {
        Self {
            status: Some(status),
            assigned_judge: None,
        }
    }

    pub fn matches(&self, process: &Process) -> bool {
        self.status.map_or(true, |status| process.status == status)
            && self
                .assigned_judge
                .as_ref()
                .map_or(true, |judge| process.assigned_judge_id.as_ref() == Some(judge))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// May assume and be auto-assigned processes.
    Judge,
    Counsel,
    Oversight,
    Clerk,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub level: u8,
    pub capabilities: BTreeSet<Capability>,
    pub online: bool,
    pub login_time: Option<DateTime<Utc>>,
    pub logout_time: Option<DateTime<Utc>>,
    pub last_activity: Option<DateTime<Utc>>,
}

impl User {
    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserLogin {
    pub id: UserId,
    pub name: String,
    pub level: u8,
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
}

#[derive(Clone, Debug, Default)]
pub struct UserFilter {
    pub online: Option<bool>,
    pub min_level: Option<u8>,
}

impl UserFilter {
    pub fn matches(&self, user: &User) -> bool {
        self.online.map_or(true, |online| user.online == online)
            && self.min_level.map_or(true, |level| user.level >= level)
    }
}

/// Notification targeting tag for a portal role.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PortalTag(pub String);

impl PortalTag {
    pub const ALL: &'static str = "all";
    pub const OVERSIGHT: &'static str = "cnj";
    pub const JUDICIAL: &'static str = "judicial";
    pub const COUNSEL: &'static str = "counsel";

    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn all() -> Self {
        Self::new(Self::ALL)
    }

    pub fn is(&self, tag: &str) -> bool {
        self.0 == tag
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ProcessAssumed,
    LawyerRequested,
    UserLogin,
    AutoDistribution,
    System,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub target_user: Option<UserId>,
    #[serde(default)]
    pub target_portals: Vec<PortalTag>,
    pub created_at: DateTime<Utc>,
    pub read: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewNotification {
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub target_user: Option<UserId>,
    #[serde(default)]
    pub target_portals: Vec<PortalTag>,
}

impl NewNotification {
    pub fn broadcast(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            target_user: None,
            target_portals: vec![PortalTag::all()],
        }
    }

    pub fn to_user(
        kind: NotificationKind,
        user: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            target_user: Some(user),
            target_portals: Vec::new(),
        }
    }

    pub fn to_portal(
        kind: NotificationKind,
        portal: PortalTag,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            target_user: None,
            target_portals: vec![portal],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_transitions() {
        use ProcessStatus::*;
        assert!(Pending.can_transition_to(InProgress));
        assert!(InProgress.can_transition_to(Concluded));
        assert!(Pending.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Concluded));
        assert!(!Concluded.can_transition_to(Pending));
        assert!(!InProgress.can_transition_to(Pending));
    }

    #[test]
    fn urgency_ranks() {
        assert_eq!(Urgency::rank_of(Some(Urgency::Alta)), 3);
        assert_eq!(Urgency::rank_of(Some(Urgency::Media)), 2);
        assert_eq!(Urgency::rank_of(Some(Urgency::Baixa)), 1);
        assert_eq!(Urgency::rank_of(None), 1);
    }

    #[test]
    fn new_process_rejects_unknown_fields() {
        let ok: NewProcess = serde_json::from_str(
            r#"{"type":"civil","plaintiff":"A","defendant":"B","urgency":"alta"}"#,
        )
        .unwrap();
        assert_eq!(ok.urgency, Some(Urgency::Alta));

        let err = serde_json::from_str::<NewProcess>(
            r#"{"type":"civil","plaintiff":"A","defendant":"B","judge":"x"}"#,
        );
        assert!(err.is_err());
    }

    #[test]
    fn stored_process_with_unknown_urgency_still_loads() {
        let raw = r#"{
            "id": "proc_1",
            "caseNumber": "0000001-00.2024.8.26.0000",
            "type": "civil",
            "plaintiff": "A",
            "defendant": "B",
            "urgency": "normal",
            "description": null,
            "status": "pending",
            "assignedJudgeId": null,
            "assignedJudgeName": null,
            "assumedAt": null,
            "createdAt": "2024-03-01T09:00:00Z",
            "updatedAt": "2024-03-01T09:00:00Z",
            "history": []
        }"#;
        let process: Process = serde_json::from_str(raw).unwrap();
        assert_eq!(process.urgency, None);
        assert_eq!(Urgency::rank_of(process.urgency), 1);

        let known = raw.replace("\"normal\"", "\"alta\"");
        let process: Process = serde_json::from_str(&known).unwrap();
        assert_eq!(process.urgency, Some(Urgency::Alta));

        let missing = raw.replace("\"urgency\": \"normal\",", "");
        let process: Process = serde_json::from_str(&missing).unwrap();
        assert_eq!(process.urgency, None);
    }
}
