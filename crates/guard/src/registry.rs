//! Machine registration and removal.
//!
//! Both keep the ingestion cache in step, so the next report for the
//! machine sees the change without waiting for the TTL.

use std::sync::Arc;

use machwatch_core::error::CoreError;
use machwatch_core::event_names::ENTITY_MACHINE;
use machwatch_core::machine::{Machine, NewMachine};
use machwatch_core::store::MachineDirectory;
use machwatch_core::types::DbId;

use crate::cache::MachineCache;
use crate::error::GuardError;

pub struct MachineRegistry {
    directory: Arc<dyn MachineDirectory>,
    cache: Arc<MachineCache>,
}

impl MachineRegistry {
    pub fn new(directory: Arc<dyn MachineDirectory>, cache: Arc<MachineCache>) -> Self {
        Self { directory, cache }
    }

    /// Validate and store a new machine profile.
    pub async fn register(&self, input: &NewMachine) -> Result<Machine, GuardError> {
        input.check()?;
        let machine = self.directory.create_machine(input).await?;
        self.cache.invalidate(machine.id).await;
        tracing::info!(machine_id = machine.id, name = %machine.name, "Machine registered");
        Ok(machine)
    }

    /// Delete a machine. Its issues are deleted with it.
    pub async fn remove(&self, machine_id: DbId) -> Result<(), GuardError> {
        let deleted = self.directory.delete_machine(machine_id).await?;
        self.cache.invalidate(machine_id).await;
        if !deleted {
            return Err(CoreError::NotFound {
                entity: ENTITY_MACHINE,
                id: machine_id,
            }
            .into());
        }
        tracing::info!(machine_id, "Machine removed");
        Ok(())
    }
}
