//! Read-through cache of machine profiles.
//!
//! Every report needs its machine's thresholds. Lookups hit the directory
//! at most once per TTL per machine; missing machines are cached too so a
//! stream of reports for an unknown id does not hammer the store. Callers
//! about to write use [`MachineCache::reload`] to see deletions and limit
//! changes immediately.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use machwatch_core::error::StoreError;
use machwatch_core::machine::Machine;
use machwatch_core::store::MachineDirectory;
use machwatch_core::types::DbId;
use tokio::sync::RwLock;

/// Most "no such machine" results kept at once.
pub const MAX_MISSING_ENTRIES: usize = 1024;

#[derive(Debug, Clone)]
struct Entry {
    machine: Option<Machine>,
    fetched_at: Instant,
}

fn missing_count(entries: &HashMap<DbId, Entry>) -> usize {
    entries.values().filter(|e| e.machine.is_none()).count()
}

pub struct MachineCache {
    directory: Arc<dyn MachineDirectory>,
    ttl: Duration,
    entries: RwLock<HashMap<DbId, Entry>>,
}

impl MachineCache {
    pub fn new(directory: Arc<dyn MachineDirectory>, ttl: Duration) -> Self {
        Self {
            directory,
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// The machine profile, from cache when fresh, else from the directory.
    pub async fn get(&self, machine_id: DbId) -> Result<Option<Machine>, StoreError> {
        if let Some(entry) = self.entries.read().await.get(&machine_id) {
            if entry.fetched_at.elapsed() < self.ttl {
                return Ok(entry.machine.clone());
            }
        }
        self.reload(machine_id).await
    }

    /// Read the profile from the directory regardless of what is cached,
    /// and cache the result.
    pub async fn reload(&self, machine_id: DbId) -> Result<Option<Machine>, StoreError> {
        let machine = self.directory.get_machine(machine_id).await?;
        self.store(machine_id, machine.clone()).await;
        Ok(machine)
    }

    async fn store(&self, machine_id: DbId, machine: Option<Machine>) {
        let mut entries = self.entries.write().await;

        // Misses are bounded: report streams may carry arbitrary ids.
        if machine.is_none() && !entries.contains_key(&machine_id) {
            let ttl = self.ttl;
            if missing_count(&entries) >= MAX_MISSING_ENTRIES {
                entries.retain(|_, e| e.machine.is_some() || e.fetched_at.elapsed() < ttl);
            }
            if missing_count(&entries) >= MAX_MISSING_ENTRIES {
                return;
            }
        }

        entries.insert(
            machine_id,
            Entry {
                machine,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Drop one entry; the next lookup goes to the directory.
    pub async fn invalidate(&self, machine_id: DbId) {
        self.entries.write().await.remove(&machine_id);
    }

    /// Replace the whole cache with a fresh listing. Returns the number of
    /// machines loaded.
    pub async fn refresh(&self) -> Result<usize, StoreError> {
        let machines = self.directory.list_machines().await?;
        let now = Instant::now();
        let fresh: HashMap<DbId, Entry> = machines
            .into_iter()
            .map(|m| {
                (
                    m.id,
                    Entry {
                        machine: Some(m),
                        fetched_at: now,
                    },
                )
            })
            .collect();
        let count = fresh.len();
        *self.entries.write().await = fresh;
        tracing::debug!(count, "Machine cache refreshed");
        Ok(count)
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use machwatch_core::machine::{MachineStatus, NewMachine};

    use super::*;

    #[derive(Default)]
    struct CountingDirectory {
        lookups: AtomicUsize,
    }

    fn machine(id: DbId) -> Machine {
        Machine {
            id,
            name: format!("M{id}"),
            min_temp: 0.0,
            max_temp: 80.0,
            min_vib: 0.0,
            max_vib: 5.0,
            interval_secs: 15,
            notes: None,
            image: None,
            status: MachineStatus::Green,
        }
    }

    #[async_trait]
    impl MachineDirectory for CountingDirectory {
        async fn get_machine(&self, machine_id: DbId) -> Result<Option<Machine>, StoreError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok((machine_id < 100).then(|| machine(machine_id)))
        }

        async fn list_machines(&self) -> Result<Vec<Machine>, StoreError> {
            Ok(vec![machine(1), machine(2)])
        }

        async fn create_machine(&self, _input: &NewMachine) -> Result<Machine, StoreError> {
            Ok(machine(1))
        }

        async fn delete_machine(&self, _machine_id: DbId) -> Result<bool, StoreError> {
            Ok(false)
        }

        async fn set_machine_status(
            &self,
            _machine_id: DbId,
            _status: MachineStatus,
        ) -> Result<(), StoreError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn second_lookup_is_served_from_cache() {
        let directory = Arc::new(CountingDirectory::default());
        let cache = MachineCache::new(directory.clone(), Duration::from_secs(60));

        assert_eq!(cache.get(1).await.unwrap().unwrap().id, 1);
        assert_eq!(cache.get(1).await.unwrap().unwrap().id, 1);
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unknown_machine_is_cached_as_missing() {
        let directory = Arc::new(CountingDirectory::default());
        let cache = MachineCache::new(directory.clone(), Duration::from_secs(60));

        assert!(cache.get(500).await.unwrap().is_none());
        assert!(cache.get(500).await.unwrap().is_none());
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn zero_ttl_always_reads_through() {
        let directory = Arc::new(CountingDirectory::default());
        let cache = MachineCache::new(directory.clone(), Duration::ZERO);

        cache.get(1).await.unwrap();
        cache.get(1).await.unwrap();
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_a_reload() {
        let directory = Arc::new(CountingDirectory::default());
        let cache = MachineCache::new(directory.clone(), Duration::from_secs(60));

        cache.get(1).await.unwrap();
        cache.invalidate(1).await;
        cache.get(1).await.unwrap();
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn refresh_preloads_all_machines() {
        let directory = Arc::new(CountingDirectory::default());
        let cache = MachineCache::new(directory.clone(), Duration::from_secs(60));

        assert!(cache.is_empty().await);
        assert_eq!(cache.refresh().await.unwrap(), 2);
        assert_eq!(cache.len().await, 2);
        cache.get(2).await.unwrap();
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reload_bypasses_a_fresh_entry() {
        let directory = Arc::new(CountingDirectory::default());
        let cache = MachineCache::new(directory.clone(), Duration::from_secs(60));

        cache.get(1).await.unwrap();
        assert_eq!(cache.reload(1).await.unwrap().unwrap().id, 1);
        assert_eq!(directory.lookups.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unknown_ids_do_not_grow_the_cache_without_bound() {
        let directory = Arc::new(CountingDirectory::default());
        let cache = MachineCache::new(directory.clone(), Duration::from_secs(60));
        cache.get(1).await.unwrap();

        for id in 1_000..11_000 {
            assert!(cache.get(id).await.unwrap().is_none());
        }

        assert_eq!(cache.len().await, MAX_MISSING_ENTRIES + 1);
        assert!(cache.get(1).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn expired_misses_make_room_for_new_ones() {
        let directory = Arc::new(CountingDirectory::default());
        let cache = MachineCache::new(directory.clone(), Duration::ZERO);

        for id in 1_000..3_000 {
            cache.get(id).await.unwrap();
        }

        assert!(cache.len().await <= MAX_MISSING_ENTRIES);
    }
}
