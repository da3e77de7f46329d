mod common;

use std::sync::Arc;

use assert_matches::assert_matches;
use common::{ingestor, press, report, MemoryStore};
use machwatch_core::error::CoreError;
use machwatch_core::event_names::EVENT_ISSUE_STATUS_CHANGED;
use machwatch_core::issue::IssueStatus;
use machwatch_core::light_status::LightTier;
use machwatch_core::machine::MachineStatus;
use machwatch_events::EventBus;
use machwatch_guard::ingest::Outcome;
use machwatch_guard::status_sync::StatusSync;
use machwatch_guard::workflow::IssueService;
use machwatch_guard::GuardError;

async fn open_issue(store: &Arc<MemoryStore>, bus: &Arc<EventBus>, report_id: i64) -> i64 {
    let outcome = ingestor(store, bus)
        .process(report(report_id, 1, 91.0, 2.0, "Normal"))
        .await
        .unwrap();
    assert_matches!(outcome, Outcome::Created { issue_id } => issue_id)
}

// ---------------------------------------------------------------------------
// Repair workflow
// ---------------------------------------------------------------------------

#[tokio::test]
async fn issue_moves_through_repair_to_fixed() {
    let store = MemoryStore::with_machine(press(1));
    let bus = Arc::new(EventBus::default());
    let service = IssueService::new(store.clone(), bus.clone());
    let issue_id = open_issue(&store, &bus, 10).await;
    let mut rx = bus.subscribe();

    let started = service.start_fix(issue_id).await.unwrap();
    assert_eq!(started.status, IssueStatus::InProgress);

    let fixed = service
        .mark_fixed(issue_id, "  Replaced bearing  ")
        .await
        .unwrap();
    assert_eq!(fixed.status, IssueStatus::Fixed);
    assert_eq!(fixed.fix_description.as_deref(), Some("Replaced bearing"));
    assert_eq!(store.issue(issue_id).status, IssueStatus::Fixed);

    let first = rx.recv().await.unwrap();
    assert_eq!(first.event_type, EVENT_ISSUE_STATUS_CHANGED);
    assert_eq!(first.payload["to"], "in_progress");
    let second = rx.recv().await.unwrap();
    assert_eq!(second.payload["from"], "in_progress");
    assert_eq!(second.payload["to"], "fixed");
}

#[tokio::test]
async fn open_issue_cannot_skip_to_fixed() {
    let store = MemoryStore::with_machine(press(1));
    let bus = Arc::new(EventBus::default());
    let service = IssueService::new(store.clone(), bus.clone());
    let issue_id = open_issue(&store, &bus, 10).await;

    let result = service.mark_fixed(issue_id, "Cleaned filter").await;

    assert_matches!(
        result,
        Err(GuardError::Core(CoreError::InvalidTransition {
            from: IssueStatus::Open,
            to: IssueStatus::Fixed,
        }))
    );
    assert_eq!(store.issue(issue_id).status, IssueStatus::Open);
}

#[tokio::test]
async fn closing_without_description_is_rejected() {
    let store = MemoryStore::with_machine(press(1));
    let bus = Arc::new(EventBus::default());
    let service = IssueService::new(store.clone(), bus.clone());
    let issue_id = open_issue(&store, &bus, 10).await;
    service.start_fix(issue_id).await.unwrap();

    let result = service.mark_fixed(issue_id, "   ").await;

    assert_matches!(result, Err(GuardError::Core(CoreError::Validation(_))));
    assert_eq!(store.issue(issue_id).status, IssueStatus::InProgress);
}

#[tokio::test]
async fn missing_issue_is_not_found() {
    let store = MemoryStore::with_machine(press(1));
    let bus = Arc::new(EventBus::default());
    let service = IssueService::new(store.clone(), bus.clone());

    let result = service.start_fix(404).await;

    assert_matches!(
        result,
        Err(GuardError::Core(CoreError::NotFound { id: 404, .. }))
    );
}

#[tokio::test]
async fn violation_after_fix_opens_a_new_issue() {
    let store = MemoryStore::with_machine(press(1));
    let bus = Arc::new(EventBus::default());
    let service = IssueService::new(store.clone(), bus.clone());
    let first = open_issue(&store, &bus, 10).await;
    service.start_fix(first).await.unwrap();
    service.mark_fixed(first, "Recalibrated").await.unwrap();

    let second = open_issue(&store, &bus, 11).await;

    assert_ne!(first, second);
    assert_eq!(store.issue(second).fault_probability, 40);
    assert_eq!(store.issue(first).status, IssueStatus::Fixed);
}

#[tokio::test]
async fn light_status_follows_the_workflow() {
    let store = MemoryStore::with_machine(press(1));
    let bus = Arc::new(EventBus::default());
    let service = IssueService::new(store.clone(), bus.clone());

    let light = service.light_status(1).await.unwrap();
    assert_eq!(light.tier, LightTier::Clear);
    assert!(light.green && !light.yellow && !light.red);

    let issue_id = open_issue(&store, &bus, 10).await;
    let light = service.light_status(1).await.unwrap();
    assert_eq!(light.tier, LightTier::Elevated);
    assert!(light.yellow && light.green);
    assert!(!light.work_in_progress);

    service.start_fix(issue_id).await.unwrap();
    let light = service.light_status(1).await.unwrap();
    assert!(light.work_in_progress);

    service.mark_fixed(issue_id, "Done").await.unwrap();
    let light = service.light_status(1).await.unwrap();
    assert_eq!(light.tier, LightTier::Clear);
}

// ---------------------------------------------------------------------------
// Machine status sync
// ---------------------------------------------------------------------------

#[tokio::test]
async fn sync_derives_status_from_unresolved_issues() {
    let store = MemoryStore::with_machine(press(1));
    let bus = Arc::new(EventBus::default());
    let service = IssueService::new(store.clone(), bus.clone());
    let sync = StatusSync::new(store.clone(), store.clone());

    assert_eq!(sync.sync(1).await.unwrap(), MachineStatus::Green);

    let issue_id = open_issue(&store, &bus, 10).await;
    assert_eq!(sync.sync(1).await.unwrap(), MachineStatus::Red);
    assert_eq!(store.machine_status(1), MachineStatus::Red);

    service.start_fix(issue_id).await.unwrap();
    assert_eq!(sync.sync(1).await.unwrap(), MachineStatus::Yellow);

    service.mark_fixed(issue_id, "Done").await.unwrap();
    assert_eq!(sync.sync(1).await.unwrap(), MachineStatus::Green);
    assert_eq!(store.machine_status(1), MachineStatus::Green);
}

#[tokio::test]
async fn sync_for_unknown_machine_fails() {
    let store = MemoryStore::with_machine(press(1));
    let sync = StatusSync::new(store.clone(), store.clone());

    assert_matches!(sync.sync(77).await, Err(GuardError::Store(_)));
}

#[tokio::test]
async fn sync_task_reacts_to_bus_events_until_closed() {
    let store = MemoryStore::with_machine(press(1));
    store.add_machine(press(2));
    let bus = Arc::new(EventBus::default());
    let handle = tokio::spawn(StatusSync::new(store.clone(), store.clone()).run(bus.subscribe()));

    open_issue(&store, &bus, 10).await;
    drop(bus);

    tokio::time::timeout(std::time::Duration::from_secs(5), handle)
        .await
        .expect("status sync should stop once the bus closes")
        .unwrap();

    assert_eq!(store.machine_status(1), MachineStatus::Red);
    assert_eq!(store.machine_status(2), MachineStatus::Green);
}
