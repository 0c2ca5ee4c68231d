use std::time::Duration;

use anyhow::Result;
use tokio::time::{sleep, timeout};

use courtportal_cli::AppContext;
use courtportal_core_types::{EventKind, SystemClock, UserId};
use courtportal_event_bus::CrossInstanceChannel;
use courtportal_policy_center::default_policy;
use courtportal_registry::{NewProcess, ProcessFilter, UserFilter, UserLogin};
use courtportal_state_center::{InMemorySlot, StorageSignalSlot, StorageSlot};

async fn wait_until<F: Fn() -> bool>(check: F) -> bool {
    timeout(Duration::from_secs(2), async {
        while !check() {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sibling_reloads_after_allow_listed_events() -> Result<()> {
    let storage = InMemorySlot::new();
    let channel = CrossInstanceChannel::new(64);
    let a = AppContext::new(
        default_policy(),
        storage.clone(),
        channel.clone(),
        SystemClock::shared(),
        None,
    )?;
    let b = AppContext::new(
        default_policy(),
        storage.clone(),
        channel.clone(),
        SystemClock::shared(),
        None,
    )?;
    assert_ne!(a.origin(), b.origin());

    let id = a.registry().create_process(NewProcess {
        process_type: "Penal".into(),
        plaintiff: "Ministério Público".into(),
        defendant: "Réu".into(),
        ..NewProcess::default()
    });
    assert!(
        wait_until(|| b.registry().process(&id).is_some()).await,
        "sibling never saw the new process"
    );

    a.registry().login(UserLogin {
        id: UserId::from("judge-2"),
        name: "Judge".into(),
        level: 5,
        capabilities: Default::default(),
    });
    assert!(
        wait_until(|| b.registry().users(&UserFilter::default()).len() == 1).await,
        "sibling never saw the login"
    );

    let signal = StorageSignalSlot::new(storage, default_policy().storage.signal_key);
    let latest = signal.latest().expect("signal slot written");
    assert_eq!(latest.origin, *a.origin());

    a.shutdown().await?;
    b.shutdown().await?;
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn non_allow_listed_events_do_not_reload() -> Result<()> {
    let storage = InMemorySlot::new();
    let channel = CrossInstanceChannel::new(64);
    let a = AppContext::new(
        default_policy(),
        storage.clone(),
        channel.clone(),
        SystemClock::shared(),
        None,
    )?;
    let b = AppContext::new(
        default_policy(),
        storage,
        channel,
        SystemClock::shared(),
        None,
    )?;

    let mut reloads = b.hub().channel().expect("attached").subscribe();
    a.registry().logout(&UserId::from("unknown"));
    a.registry()
        .create_notification(courtportal_registry::NewNotification::broadcast(
            courtportal_registry::NotificationKind::System,
            "notice",
            "",
        ));

    let envelope = timeout(Duration::from_secs(2), reloads.recv()).await??;
    assert_eq!(envelope.event, EventKind::NotificationCreated);
    assert!(!envelope.event.triggers_reload());

    sleep(Duration::from_millis(50)).await;
    assert!(b.registry().notifications_for(None).is_empty());
    assert_eq!(b.registry().processes(&ProcessFilter::default()).len(), 2);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn sibling_sees_seeded_state_of_a_fresh_instance() -> Result<()> {
    let storage = InMemorySlot::new();
    let channel = CrossInstanceChannel::new(64);
    let b = AppContext::new(
        default_policy(),
        storage.clone(),
        channel.clone(),
        SystemClock::shared(),
        None,
    )?;
    storage.remove(&default_policy().storage.state_key)?;

    let a = AppContext::new(
        default_policy(),
        storage.clone(),
        channel,
        SystemClock::shared(),
        None,
    )?;
    let seeded: Vec<_> = a
        .registry()
        .processes(&ProcessFilter::default())
        .into_iter()
        .map(|process| process.id)
        .collect();
    assert_eq!(seeded.len(), 2);

    assert!(
        wait_until(|| seeded
            .iter()
            .all(|id| b.registry().process(id).is_some()))
        .await,
        "sibling never loaded the seeded snapshot"
    );
    assert_eq!(b.registry().processes(&ProcessFilter::default()).len(), 2);

    a.shutdown().await?;
    b.shutdown().await?;
    Ok(())
}
