mod common;

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use common::{press, report, MemoryStore};
use machwatch_core::error::CoreError;
use machwatch_core::machine::{MachineStatus, NewMachine};
use machwatch_events::EventBus;
use machwatch_guard::cache::MachineCache;
use machwatch_guard::ingest::{Ingestor, Outcome, SkipReason};
use machwatch_guard::registry::MachineRegistry;
use machwatch_guard::GuardError;

fn lathe() -> NewMachine {
    NewMachine {
        name: " Lathe ".to_string(),
        min_temp: 10.0,
        max_temp: 80.0,
        min_vib: 0.0,
        max_vib: 5.0,
        interval_secs: 15,
        notes: None,
        image: None,
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    registry: MachineRegistry,
    ingestor: Ingestor,
}

fn fixture(store: Arc<MemoryStore>) -> Fixture {
    let cache = Arc::new(MachineCache::new(store.clone(), Duration::from_secs(60)));
    let bus = Arc::new(EventBus::default());
    Fixture {
        registry: MachineRegistry::new(store.clone(), cache.clone()),
        ingestor: Ingestor::new(store.clone(), cache, bus),
        store,
    }
}

#[tokio::test]
async fn registered_machine_is_watched_immediately() {
    let f = fixture(Arc::new(MemoryStore::default()));

    let before = f.ingestor.process(report(10, 1, 95.0, 2.0, "Normal")).await.unwrap();
    assert_eq!(before, Outcome::Skipped(SkipReason::UnknownMachine));

    let machine = f.registry.register(&lathe()).await.unwrap();
    assert_eq!(machine.id, 1);
    assert_eq!(machine.name, "Lathe");
    assert_eq!(machine.status, MachineStatus::Green);

    let after = f.ingestor.process(report(11, 1, 95.0, 2.0, "Normal")).await.unwrap();
    assert_matches!(after, Outcome::Created { .. });
}

#[tokio::test]
async fn invalid_profile_is_rejected_before_storing() {
    let f = fixture(Arc::new(MemoryStore::default()));
    let mut input = lathe();
    input.min_temp = 90.0;

    let result = f.registry.register(&input).await;

    assert_matches!(result, Err(GuardError::Core(CoreError::Validation(_))));
    assert!(!f.store.has_machine(1));
}

#[tokio::test]
async fn removed_machine_stops_being_watched() {
    let f = fixture(MemoryStore::with_machine(press(1)));
    f.ingestor.process(report(10, 1, 95.0, 2.0, "Normal")).await.unwrap();
    assert_eq!(f.store.issues().len(), 1);

    f.registry.remove(1).await.unwrap();

    assert!(!f.store.has_machine(1));
    assert!(f.store.issues().is_empty());
    let outcome = f.ingestor.process(report(11, 1, 95.0, 2.0, "Normal")).await.unwrap();
    assert_eq!(outcome, Outcome::Skipped(SkipReason::UnknownMachine));
}

#[tokio::test]
async fn removing_unknown_machine_is_not_found() {
    let f = fixture(MemoryStore::with_machine(press(1)));

    let result = f.registry.remove(9).await;

    assert_matches!(
        result,
        Err(GuardError::Core(CoreError::NotFound { id: 9, .. }))
    );
}
