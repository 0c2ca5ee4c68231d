use chrono::{DateTime, Utc};
use tracing::debug;

use courtportal_core_types::{EventKind, NotificationId, UserId};

use crate::{
    metrics,
    model::{NewNotification, Notification, PortalTag},
    state::RegistryImpl,
};

impl RegistryImpl {
    pub fn create_notification(&self, data: NewNotification) -> NotificationId {
        let now = self.now();
        let notification = {
            let mut log = self.notifications.write();
            let mut id = NotificationId::generate(now);
            while log.iter().any(|existing| existing.id == id) {
                id = NotificationId::generate(now);
            }
            let notification = Notification {
                id,
                kind: data.kind,
                title: data.title,
                message: data.message,
                target_user: data.target_user,
                target_portals: data.target_portals,
                created_at: now,
                read: false,
            };
            log.push(notification.clone());
            notification
        };
        self.emit(EventKind::NotificationCreated, &notification);
        notification.id
    }

    /// Newest first. With no user the whole log is returned; otherwise only
    /// what that user may see: direct messages, `all` broadcasts, and
    /// oversight-portal messages when the user's level qualifies. Unknown
    /// users are treated as level 0.
    pub fn notifications_for(&self, user: Option<&UserId>) -> Vec<Notification> {
        let log = self.notifications.read();
        let mut visible: Vec<Notification> = match user {
            None => log.iter().rev().cloned().collect(),
            Some(id) => {
                let policy = self.notification_policy();
                let level = self.user(id).map(|user| user.level).unwrap_or(0);
                let oversight = level >= policy.oversight_min_level;
                log.iter()
                    .rev()
                    .filter(|notification| {
                        notification.target_user.as_ref() == Some(id)
                            || notification.target_portals.iter().any(|tag| {
                                tag.is(PortalTag::ALL)
                                    || (oversight && tag.is(&policy.oversight_portal))
                            })
                    })
                    .cloned()
                    .collect()
            }
        };
        // stable: equal timestamps keep later insertions first
        visible.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        visible
    }

    /// Drops every notification older than the retention window.
    pub fn prune_notifications(&self, now: DateTime<Utc>) -> usize {
        let retention = self.notification_policy().retention();
        let mut log = self.notifications.write();
        let before = log.len();
        log.retain(|notification| now - notification.created_at <= retention);
        let dropped = before - log.len();
        if dropped > 0 {
            metrics::record_notifications_pruned(dropped);
            debug!(dropped, "pruned stale notifications");
        }
        dropped
    }

    pub fn mark_read(&self, id: &NotificationId) -> bool {
        let mut log = self.notifications.write();
        match log.iter_mut().find(|notification| &notification.id == id) {
            Some(notification) => {
                notification.read = true;
                true
            }
            None => false,
        }
    }
}
