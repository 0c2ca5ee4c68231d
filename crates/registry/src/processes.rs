use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use parking_lot::RwLock;
use tracing::debug;

use courtportal_core_types::{case_number, EventKind, ProcessId, RequestId, UserId};

use crate::{
    errors::RegistryError,
    metrics,
    model::{
        HistoryAction, HistoryEntry, LawyerRequest, LawyerRequestStatus, NewNotification,
        NewProcess, NotificationKind, PortalTag, Process, ProcessFilter, ProcessStatus,
    },
    patch::ProcessPatch,
    state::RegistryImpl,
};

const SYSTEM_ACTOR: &str = "system";

impl RegistryImpl {
    pub fn create_process(&self, data: NewProcess) -> ProcessId {
        let now = self.now();
        let process = loop {
            let candidate = ProcessId::generate(now);
            if let Entry::Vacant(slot) = self.processes.entry(candidate.clone()) {
                let process = Process {
                    id: candidate,
                    case_number: case_number(now),
                    process_type: data.process_type,
                    plaintiff: data.plaintiff,
                    defendant: data.defendant,
                    urgency: data.urgency,
                    description: data.description,
                    status: ProcessStatus::Pending,
                    assigned_judge_id: None,
                    assigned_judge_name: None,
                    assumed_at: None,
                    created_at: now,
                    updated_at: now,
                    history: vec![HistoryEntry {
                        at: now,
                        action: HistoryAction::Created,
                        actor: SYSTEM_ACTOR.to_string(),
                        description: "process registered".to_string(),
                        from_status: None,
                        to_status: ProcessStatus::Pending,
                    }],
                    lawyer_requests: Vec::new(),
                };
                slot.insert(Arc::new(RwLock::new(process.clone())));
                break process;
            }
        };

        metrics::record_process_created();
        debug!(process = %process.id, case = %process.case_number, "process created");
        self.emit(EventKind::ProcessCreated, &process);
        process.id
    }

    /// Validates and merges `patch`, then records the status transition in
    /// the history even when the status did not change.
    pub fn try_update_process(
        &self,
        id: &ProcessId,
        patch: ProcessPatch,
        actor: &str,
    ) -> Result<Process, RegistryError> {
        let record = self.ensure_process(id)?;
        let updated = {
            let mut guard = record.write();
            patch.validate(&guard)?;
            let now = self.now();
            let from = guard.status;
            patch.apply(&mut guard);
            guard.updated_at = now;
            let to = guard.status;
            guard.history.push(HistoryEntry {
                at: now,
                action: HistoryAction::Updated,
                actor: actor.to_string(),
                description: format!("status {from} -> {to}"),
                from_status: Some(from),
                to_status: to,
            });
            guard.clone()
        };
        self.emit(EventKind::ProcessUpdated, &updated);
        Ok(updated)
    }

    pub fn update_process(&self, id: &ProcessId, patch: ProcessPatch, actor: &str) -> bool {
        match self.try_update_process(id, patch, actor) {
            Ok(_) => true,
            Err(err) => {
                debug!(process = %id, "update rejected: {err}");
                false
            }
        }
    }

    /// Moves a pending process to in-progress under `judge_id`.
    pub fn try_assume_process(
        &self,
        id: &ProcessId,
        judge_id: &UserId,
        judge_name: &str,
    ) -> Result<Process, RegistryError> {
        let record = self.ensure_process(id)?;
        let assumed = {
            let mut guard = record.write();
            if guard.status != ProcessStatus::Pending {
                return Err(RegistryError::InvalidState {
                    id: id.to_string(),
                    status: guard.status,
                });
            }
            let now = self.now();
            let patch = ProcessPatch {
                status: Some(ProcessStatus::InProgress),
                assigned_judge_id: Some(judge_id.clone()),
                assigned_judge_name: Some(judge_name.to_string()),
                assumed_at: Some(now),
                ..ProcessPatch::default()
            };
            patch.validate(&guard)?;
            patch.apply(&mut guard);
            guard.updated_at = now;
            guard.history.push(HistoryEntry {
                at: now,
                action: HistoryAction::Updated,
                actor: judge_name.to_string(),
                description: format!(
                    "status {} -> {}",
                    ProcessStatus::Pending,
                    ProcessStatus::InProgress
                ),
                from_status: Some(ProcessStatus::Pending),
                to_status: ProcessStatus::InProgress,
            });
            guard.history.push(HistoryEntry {
                at: now,
                action: HistoryAction::Assumed,
                actor: judge_name.to_string(),
                description: format!("assumed by {judge_name}"),
                from_status: Some(ProcessStatus::Pending),
                to_status: ProcessStatus::InProgress,
            });
            guard.clone()
        };

        self.emit(EventKind::ProcessUpdated, &assumed);
        self.create_notification(NewNotification::to_portal(
            NotificationKind::ProcessAssumed,
            PortalTag::all(),
            "Process assumed",
            format!("{judge_name} assumed case {}", assumed.case_number),
        ));
        Ok(assumed)
    }

    pub fn assume_process(&self, id: &ProcessId, judge_id: &UserId, judge_name: &str) -> bool {
        match self.try_assume_process(id, judge_id, judge_name) {
            Ok(_) => true,
            Err(err) => {
                debug!(process = %id, judge = %judge_id, "assume rejected: {err}");
                false
            }
        }
    }

    /// Files a pending lawyer request on the process and notifies the lawyer.
    pub fn request_lawyer(
        &self,
        id: &ProcessId,
        judge_id: &UserId,
        lawyer_id: &UserId,
        reason: &str,
    ) -> Option<RequestId> {
        let record = self.ensure_process(id).ok()?;
        let (request, case) = {
            let mut guard = record.write();
            let now = self.now();
            let request = LawyerRequest {
                id: RequestId::generate(now),
                process_id: id.clone(),
                judge_id: judge_id.clone(),
                lawyer_id: lawyer_id.clone(),
                reason: reason.to_string(),
                status: LawyerRequestStatus::Pending,
                created_at: now,
            };
            guard.lawyer_requests.push(request.clone());
            guard.updated_at = now;
            (request, guard.case_number.clone())
        };

        self.emit(EventKind::LawyerRequested, &request);
        self.create_notification(NewNotification::to_user(
            NotificationKind::LawyerRequested,
            lawyer_id.clone(),
            "Counsel requested",
            format!("Case {case}: {reason}"),
        ));
        Some(request.id)
    }

    /// Ordered by creation time, then id.
    pub fn processes(&self, filter: &ProcessFilter) -> Vec<Process> {
        let mut list: Vec<Process> = self
            .processes
            .iter()
            .map(|entry| entry.value().read().clone())
            .filter(|process| filter.matches(process))
            .collect();
        list.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        list
    }

    pub fn process(&self, id: &ProcessId) -> Option<Process> {
        self.processes.get(id).map(|entry| entry.value().read().clone())
    }

    pub fn workload(&self, judge: &UserId) -> usize {
        self.processes
            .iter()
            .filter(|entry| {
                let process = entry.value().read();
                process.status == ProcessStatus::InProgress
                    && process.assigned_judge_id.as_ref() == Some(judge)
            })
            .count()
    }
}
