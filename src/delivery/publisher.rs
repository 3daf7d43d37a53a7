use super::index_files::{IndexFileStore, StoredDocument};
use super::DeliveryError;
use crate::compiler::{IndexCompiler, TaskScheduleCompiler};
use crate::player_store::{PlayerLookup, PlayerRecord};
use std::io::ErrorKind;
use tracing::info;

/// Turns an index request into the stored document to deliver.
#[derive(Clone)]
pub struct IndexPublisher {
    lookup: PlayerLookup,
    compiler: IndexCompiler,
    files: IndexFileStore,
}

impl IndexPublisher {
    pub fn new(lookup: PlayerLookup, compiler: IndexCompiler, files: IndexFileStore) -> Self {
        Self {
            lookup,
            compiler,
            files,
        }
    }

    /// Resolves the player, publishes pending tasks, compiles the index and
    /// persists it when it changed.
    pub async fn publish_index(
        &self,
        user_agent: &str,
        device_key: &str,
    ) -> Result<StoredDocument, DeliveryError> {
        let player = self
            .lookup
            .resolve_by_user_agent(user_agent, device_key)
            .map_err(DeliveryError::PlayerLookup)?;

        let has_task_schedule = self.publish_tasks(&player)?;
        let document = self.compiler.compile(&player, has_task_schedule).await?;

        let path = self.files.index_path(&player.uuid);
        let changed = self
            .files
            .write_if_changed(&path, document.render().as_bytes())
            .map_err(DeliveryError::Persist)?;
        if changed {
            info!(
                "Index for player {} changed ({} empty subtree(s))",
                player.uuid,
                document.failures.len()
            );
        }

        self.files
            .load(&path)?
            .ok_or_else(|| DeliveryError::ResourceRead {
                path: path.clone(),
                source: ErrorKind::NotFound.into(),
            })
    }

    /// Writes the task manifest when tasks are pending and clears them.
    /// Returns whether a manifest is published.
    fn publish_tasks(&self, player: &PlayerRecord) -> Result<bool, DeliveryError> {
        let path = self.files.task_schedule_path(&player.uuid);
        let tasks = TaskScheduleCompiler::from_pending(&player.pending_tasks);
        if tasks.has_tasks() {
            self.files
                .write_if_changed(&path, tasks.render().as_bytes())
                .map_err(DeliveryError::Persist)?;
            self.lookup
                .store()
                .clear_pending_tasks(&player.uuid)
                .map_err(DeliveryError::Persist)?;
            info!(
                "Published {} task(s) for player {}",
                tasks.tasks().len(),
                player.uuid
            );
        }
        Ok(path.exists())
    }

    pub fn task_schedule(&self, device_key: &str) -> Result<StoredDocument, DeliveryError> {
        self.files
            .load(&self.files.task_schedule_path(device_key))?
            .ok_or(DeliveryError::NotFound)
    }
}
