//! Keeps each machine's coarse status in step with its issues.
//!
//! Subscribes to the event bus; every issue event recomputes the status of
//! the affected machine and persists it.

use std::sync::Arc;

use machwatch_core::light_status::compute_light_status;
use machwatch_core::machine::MachineStatus;
use machwatch_core::store::{LogStore, MachineDirectory};
use machwatch_core::types::DbId;
use machwatch_events::MonitorEvent;
use tokio::sync::broadcast;

use crate::error::GuardError;

pub struct StatusSync {
    logs: Arc<dyn LogStore>,
    machines: Arc<dyn MachineDirectory>,
}

impl StatusSync {
    pub fn new(logs: Arc<dyn LogStore>, machines: Arc<dyn MachineDirectory>) -> Self {
        Self { logs, machines }
    }

    /// Run until the bus closes.
    pub async fn run(self, mut receiver: broadcast::Receiver<MonitorEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if let Err(e) = self.sync(event.machine_id).await {
                        tracing::error!(
                            error = %e,
                            machine_id = event.machine_id,
                            event_type = %event.event_type,
                            "Failed to sync machine status"
                        );
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Status sync lagged, resyncing all machines");
                    if let Err(e) = self.sync_all().await {
                        tracing::error!(error = %e, "Full status resync failed");
                    }
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, status sync shutting down");
                    break;
                }
            }
        }
    }

    /// Recompute and persist one machine's status.
    pub async fn sync(&self, machine_id: DbId) -> Result<MachineStatus, GuardError> {
        let issues = self.logs.list_unresolved(machine_id).await?;
        let status = MachineStatus::from_issues(&issues);
        let light = compute_light_status(&issues);

        self.machines.set_machine_status(machine_id, status).await?;
        tracing::info!(
            machine_id,
            status = %status,
            tier = ?light.tier,
            work_in_progress = light.work_in_progress,
            unresolved = issues.len(),
            "Machine status updated"
        );
        Ok(status)
    }

    pub async fn sync_all(&self) -> Result<usize, GuardError> {
        let machines = self.machines.list_machines().await?;
        for machine in &machines {
            self.sync(machine.id).await?;
        }
        Ok(machines.len())
    }
}
