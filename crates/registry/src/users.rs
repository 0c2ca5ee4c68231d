use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use courtportal_core_types::{EventKind, UserId};

use crate::{
    model::{NewNotification, NotificationKind, PortalTag, User, UserFilter, UserLogin},
    state::RegistryImpl,
};

impl RegistryImpl {
    /// Upserts the user as online and tells the oversight portal.
    pub fn login(&self, data: UserLogin) -> User {
        let now = self.now();
        let user = match self.users.get(&data.id).map(|entry| Arc::clone(entry.value())) {
            Some(record) => {
                let mut guard = record.write();
                guard.name = data.name;
                guard.level = data.level;
                guard.capabilities = data.capabilities;
                guard.online = true;
                guard.login_time = Some(now);
                guard.last_activity = Some(now);
                guard.clone()
            }
            None => {
                let user = User {
                    id: data.id,
                    name: data.name,
                    level: data.level,
                    capabilities: data.capabilities,
                    online: true,
                    login_time: Some(now),
                    logout_time: None,
                    last_activity: Some(now),
                };
                self.users
                    .insert(user.id.clone(), Arc::new(RwLock::new(user.clone())));
                user
            }
        };

        debug!(user = %user.id, level = user.level, "user logged in");
        self.emit(EventKind::UserLogin, &user);
        let oversight = self.notification_policy().oversight_portal;
        self.create_notification(NewNotification::to_portal(
            NotificationKind::UserLogin,
            PortalTag::new(oversight),
            "User login",
            format!("{} (level {}) signed in", user.name, user.level),
        ));
        user
    }

    /// Unknown ids are ignored and return `false`.
    pub fn logout(&self, id: &UserId) -> bool {
        let Ok(record) = self.ensure_user(id) else {
            debug!(user = %id, "logout for unknown user ignored");
            return false;
        };
        let user = {
            let mut guard = record.write();
            guard.online = false;
            guard.logout_time = Some(self.now());
            guard.clone()
        };
        self.emit(EventKind::UserLogout, &user);
        true
    }

    /// Stamps `last_activity` on every online user; returns how many.
    pub fn refresh_activity(&self) -> usize {
        let now = self.now();
        let mut touched = 0;
        for entry in self.users.iter() {
            let mut guard = entry.value().write();
            if guard.online {
                guard.last_activity = Some(now);
                touched += 1;
            }
        }
        touched
    }

    /// Ordered by id.
    pub fn users(&self, filter: &UserFilter) -> Vec<User> {
        let mut list: Vec<User> = self
            .users
            .iter()
            .map(|entry| entry.value().read().clone())
            .filter(|user| filter.matches(user))
            .collect();
        list.sort_by(|a, b| a.id.cmp(&b.id));
        list
    }

    pub fn user(&self, id: &UserId) -> Option<User> {
        self.users.get(id).map(|entry| entry.value().read().clone())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use courtportal_core_types::Clock;

    use super::*;
    use crate::model::Capability;
    use crate::state::testing::registry;

    fn judge(id: &str, level: u8) -> UserLogin {
        UserLogin {
            id: UserId::from(id),
            name: format!("Judge {id}"),
            level,
            capabilities: BTreeSet::from([Capability::Judge]),
        }
    }

    #[test]
    fn login_upserts_and_logout_marks_offline() {
        let (registry, clock) = registry();
        let first = registry.login(judge("j1", 5));
        assert!(first.online);
        assert_eq!(first.login_time, Some(clock.now()));

        clock.advance(chrono::Duration::minutes(5));
        let again = registry.login(judge("j1", 6));
        assert_eq!(again.level, 6);
        assert_eq!(registry.users(&UserFilter::default()).len(), 1);

        assert!(registry.logout(&UserId::from("j1")));
        let user = registry.user(&UserId::from("j1")).unwrap();
        assert!(!user.online);
        assert_eq!(user.logout_time, Some(clock.now()));
    }

    #[test]
    fn logout_unknown_user_is_noop() {
        let (registry, _clock) = registry();
        assert!(!registry.logout(&UserId::from("ghost")));
        assert!(registry.users(&UserFilter::default()).is_empty());
    }

    #[test]
    fn login_notifies_oversight_portal_only() {
        let (registry, _clock) = registry();
        registry.login(judge("j1", 5));
        let log = registry.notifications_for(None);
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].kind, NotificationKind::UserLogin);
        assert!(log[0].target_portals.iter().all(|tag| tag.is(PortalTag::OVERSIGHT)));
    }

    #[test]
    fn refresh_touches_online_users_only() {
        let (registry, clock) = registry();
        registry.login(judge("j1", 5));
        registry.login(judge("j2", 5));
        registry.logout(&UserId::from("j2"));
        clock.advance(chrono::Duration::seconds(30));

        assert_eq!(registry.refresh_activity(), 1);
        assert_eq!(
            registry.user(&UserId::from("j1")).unwrap().last_activity,
            Some(clock.now())
        );
        assert_ne!(
            registry.user(&UserId::from("j2")).unwrap().last_activity,
            Some(clock.now())
        );
    }

    #[test]
    fn filter_by_online_and_level() {
        let (registry, _clock) = registry();
        registry.login(judge("b", 3));
        registry.login(judge("a", 7));
        registry.login(judge("c", 9));
        registry.logout(&UserId::from("c"));

        let ids: Vec<_> = registry
            .users(&UserFilter {
                online: Some(true),
                min_level: Some(4),
            })
            .into_iter()
            .map(|user| user.id)
            .collect();
        assert_eq!(ids, vec![UserId::from("a")]);

        let all: Vec<_> = registry
            .users(&UserFilter::default())
            .into_iter()
            .map(|user| user.id.to_string())
            .collect();
        assert_eq!(all, vec!["a", "b", "c"]);
    }
}
