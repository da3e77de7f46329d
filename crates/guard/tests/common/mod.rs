//! In-memory store shared by the guard integration tests.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use machwatch_core::error::StoreError;
use machwatch_core::issue::{Issue, IssueDraft, IssuePatch, IssueStatus};
use machwatch_core::machine::{Machine, MachineStatus, NewMachine};
use machwatch_core::report::RawReport;
use machwatch_core::store::{LogStore, MachineDirectory, ReportSource};
use machwatch_core::types::DbId;
use machwatch_events::EventBus;
use machwatch_guard::cache::MachineCache;
use machwatch_guard::ingest::Ingestor;

#[derive(Default)]
struct Inner {
    machines: BTreeMap<DbId, Machine>,
    issues: BTreeMap<DbId, Issue>,
    reports: Vec<RawReport>,
    next_issue_id: DbId,
    fail_writes: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn with_machine(machine: Machine) -> Arc<Self> {
        let store = Arc::new(Self::default());
        store.add_machine(machine);
        store
    }

    pub fn add_machine(&self, machine: Machine) {
        self.inner.lock().unwrap().machines.insert(machine.id, machine);
    }

    /// Delete a machine and its issues, as the FK cascade would.
    pub fn remove_machine(&self, id: DbId) {
        let mut inner = self.inner.lock().unwrap();
        inner.machines.remove(&id);
        inner.issues.retain(|_, i| i.machine_id != id);
    }

    pub fn has_machine(&self, id: DbId) -> bool {
        self.inner.lock().unwrap().machines.contains_key(&id)
    }

    pub fn push_report(&self, report: RawReport) {
        self.inner.lock().unwrap().reports.push(report);
    }

    /// Make every write fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().unwrap().fail_writes = fail;
    }

    pub fn issues(&self) -> Vec<Issue> {
        self.inner.lock().unwrap().issues.values().cloned().collect()
    }

    pub fn issue(&self, id: DbId) -> Issue {
        self.inner.lock().unwrap().issues[&id].clone()
    }

    pub fn machine_status(&self, id: DbId) -> MachineStatus {
        self.inner.lock().unwrap().machines[&id].status
    }

    fn check_writable(inner: &Inner) -> Result<(), StoreError> {
        if inner.fail_writes {
            Err(StoreError::Backend("connection reset".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LogStore for MemoryStore {
    async fn find_open_issue(&self, machine_id: DbId) -> Result<Option<Issue>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .issues
            .values()
            .find(|i| i.machine_id == machine_id && i.status == IssueStatus::Open)
            .cloned())
    }

    async fn find_issue_by_report(&self, report_id: DbId) -> Result<Option<Issue>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .issues
            .values()
            .find(|i| i.references_report(report_id))
            .cloned())
    }

    async fn create_issue(&self, draft: &IssueDraft) -> Result<DbId, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_writable(&inner)?;
        inner.next_issue_id += 1;
        let id = inner.next_issue_id;
        let now = Utc::now();
        inner.issues.insert(
            id,
            Issue {
                id,
                machine_id: draft.machine_id,
                message: draft.message.clone(),
                fault_probability: draft.fault_probability,
                temperature: draft.temperature,
                vibration: draft.vibration,
                sound: draft.sound,
                status: draft.status,
                fix_description: None,
                report_id: Some(draft.report_id),
                merged_report_ids: vec![draft.report_id],
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn update_issue(&self, issue_id: DbId, patch: &IssuePatch) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_writable(&inner)?;
        let issue = inner.issues.get_mut(&issue_id).ok_or(StoreError::NotFound {
            entity: "issue",
            id: issue_id,
        })?;
        patch.apply_to(issue);
        issue.updated_at = Utc::now();
        Ok(())
    }

    async fn get_issue(&self, issue_id: DbId) -> Result<Option<Issue>, StoreError> {
        Ok(self.inner.lock().unwrap().issues.get(&issue_id).cloned())
    }

    async fn list_unresolved(&self, machine_id: DbId) -> Result<Vec<Issue>, StoreError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .issues
            .values()
            .filter(|i| i.machine_id == machine_id && i.status.is_unresolved())
            .cloned()
            .collect())
    }
}

#[async_trait]
impl MachineDirectory for MemoryStore {
    async fn get_machine(&self, machine_id: DbId) -> Result<Option<Machine>, StoreError> {
        Ok(self.inner.lock().unwrap().machines.get(&machine_id).cloned())
    }

    async fn list_machines(&self) -> Result<Vec<Machine>, StoreError> {
        Ok(self.inner.lock().unwrap().machines.values().cloned().collect())
    }

    async fn create_machine(&self, input: &NewMachine) -> Result<Machine, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_writable(&inner)?;
        let id = inner.machines.keys().max().copied().unwrap_or(0) + 1;
        let machine = Machine {
            id,
            name: input.name.trim().to_string(),
            min_temp: input.min_temp,
            max_temp: input.max_temp,
            min_vib: input.min_vib,
            max_vib: input.max_vib,
            interval_secs: input.interval_secs,
            notes: input.notes.clone(),
            image: input.image.clone(),
            status: MachineStatus::Green,
        };
        inner.machines.insert(id, machine.clone());
        Ok(machine)
    }

    async fn delete_machine(&self, machine_id: DbId) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_writable(&inner)?;
        let existed = inner.machines.remove(&machine_id).is_some();
        inner.issues.retain(|_, i| i.machine_id != machine_id);
        Ok(existed)
    }

    async fn set_machine_status(
        &self,
        machine_id: DbId,
        status: MachineStatus,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_writable(&inner)?;
        let machine = inner
            .machines
            .get_mut(&machine_id)
            .ok_or(StoreError::NotFound {
                entity: "machine",
                id: machine_id,
            })?;
        machine.status = status;
        Ok(())
    }
}

#[async_trait]
impl ReportSource for MemoryStore {
    async fn latest_report_id(&self) -> Result<Option<DbId>, StoreError> {
        Ok(self.inner.lock().unwrap().reports.iter().map(|r| r.id).max())
    }

    async fn reports_after(&self, cursor: DbId, limit: i64) -> Result<Vec<RawReport>, StoreError> {
        let inner = self.inner.lock().unwrap();
        let mut after: Vec<RawReport> = inner
            .reports
            .iter()
            .filter(|r| r.id > cursor)
            .cloned()
            .collect();
        after.sort_by_key(|r| r.id);
        after.truncate(limit as usize);
        Ok(after)
    }
}

/// Machine 1 from the worked examples: max 80 °C, max 5 g.
pub fn press(id: DbId) -> Machine {
    Machine {
        id,
        name: format!("Press {id}"),
        min_temp: 10.0,
        max_temp: 80.0,
        min_vib: 0.0,
        max_vib: 5.0,
        interval_secs: 15,
        notes: None,
        image: None,
        status: MachineStatus::Green,
    }
}

pub fn report(id: DbId, machine_id: DbId, temp: f64, vib: f64, sound: &str) -> RawReport {
    RawReport {
        id,
        machine_id,
        temp: Some(temp),
        vib: Some(vib),
        sound: Some(sound.to_string()),
        recorded_at: Utc::now(),
    }
}

pub fn ingestor(store: &Arc<MemoryStore>, bus: &Arc<EventBus>) -> Ingestor {
    let cache = Arc::new(MachineCache::new(store.clone(), Duration::from_secs(60)));
    Ingestor::new(store.clone(), cache, bus.clone())
}
