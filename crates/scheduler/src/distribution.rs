use std::cmp::Reverse;

use tracing::{debug, info};

use courtportal_policy_center::DistributionPolicy;
use courtportal_registry::{
    Capability, NewNotification, NotificationKind, ProcessFilter, ProcessStatus, Registry,
    Urgency, User, UserFilter,
};

use crate::metrics;
use crate::model::Assignment;

/// Hands pending processes to the least-loaded eligible judges.
#[derive(Clone, Debug)]
pub struct AutoDistributor {
    policy: DistributionPolicy,
}

impl AutoDistributor {
    pub fn new(policy: DistributionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &DistributionPolicy {
        &self.policy
    }

    pub fn is_judge(&self, user: &User) -> bool {
        user.online && user.level >= self.policy.min_judge_level && user.has(Capability::Judge)
    }

    /// One distribution pass. Pending processes are taken by urgency, then
    /// creation time, at most `max_per_cycle` of them. Workloads are read
    /// again before every pick so no judge passes `max_judge_workload`.
    pub fn run<R>(&self, registry: &R) -> Vec<Assignment>
    where
        R: Registry + ?Sized,
    {
        if !self.policy.enabled {
            return Vec::new();
        }

        let mut pending = registry.processes(&ProcessFilter::status(ProcessStatus::Pending));
        pending.sort_by_key(|process| Reverse(Urgency::rank_of(process.urgency)));

        let judges: Vec<User> = registry
            .users(&UserFilter {
                online: Some(true),
                min_level: Some(self.policy.min_judge_level),
            })
            .into_iter()
            .filter(|user| self.is_judge(user))
            .collect();

        let mut assigned = Vec::new();
        for process in pending.into_iter().take(self.policy.max_per_cycle) {
            let mut available: Vec<(usize, &User)> = judges
                .iter()
                .map(|judge| (registry.workload(&judge.id), judge))
                .filter(|(load, _)| *load < self.policy.max_judge_workload)
                .collect();
            if available.is_empty() {
                debug!("no judge below the workload cap; stopping distribution");
                break;
            }
            available.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.id.cmp(&b.1.id)));
            let (load, judge) = available[0];

            if registry.assume_process(&process.id, &judge.id, &judge.name) {
                debug!(process = %process.id, judge = %judge.id, load, "process distributed");
                assigned.push(Assignment {
                    process_id: process.id,
                    judge_id: judge.id.clone(),
                });
            }
        }

        if !assigned.is_empty() {
            metrics::record_assigned(assigned.len());
            info!(count = assigned.len(), "automatic distribution completed");
            registry.create_notification(NewNotification::broadcast(
                NotificationKind::AutoDistribution,
                "Automatic distribution",
                format!("{} process(es) distributed automatically", assigned.len()),
            ));
        }
        assigned
    }
}
