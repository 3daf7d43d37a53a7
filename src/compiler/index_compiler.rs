use super::content_source::{ContentSource, ExternalSource};
use super::document::{CompiledDocument, DocumentAssembler};
use super::error::CompileError;
use super::placeholder::{Diagnostics, PlaceholderResolver};
use super::playlist::PlaylistCompiler;
use crate::player_store::PlayerRecord;
use crate::server::metrics::record_compile_duration;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// Compiles a player's complete index document.
#[derive(Clone)]
pub struct IndexCompiler {
    internal: Arc<dyn ContentSource>,
    external: Arc<dyn ExternalSource>,
    assembler: DocumentAssembler,
    max_depth: usize,
}

impl IndexCompiler {
    pub fn new(
        internal: Arc<dyn ContentSource>,
        external: Arc<dyn ExternalSource>,
        assembler: DocumentAssembler,
        max_depth: usize,
    ) -> Self {
        Self {
            internal,
            external,
            assembler,
            max_depth,
        }
    }

    pub fn assembler(&self) -> &DocumentAssembler {
        &self.assembler
    }

    pub async fn compile(
        &self,
        player: &PlayerRecord,
        has_task_schedule: bool,
    ) -> Result<CompiledDocument, CompileError> {
        let start = Instant::now();
        let diagnostics = Diagnostics::default();

        let playlist = {
            let resolver = PlaceholderResolver::new(
                self.internal.as_ref(),
                self.external.as_ref(),
                self.max_depth,
                &diagnostics,
            );
            PlaylistCompiler::new(self.internal.as_ref(), resolver, &diagnostics)
                .compile(player.playlist_id)
                .await?
        };

        let failures = diagnostics.into_failures();
        if !failures.is_empty() {
            info!(
                "Index for player {} compiled with {} empty subtree(s)",
                player.uuid,
                failures.len()
            );
        }
        let document = self
            .assembler
            .assemble(player, playlist, has_task_schedule, failures);

        let elapsed = start.elapsed();
        record_compile_duration(elapsed);
        debug!(
            "Compiled index for player {} in {}ms",
            player.uuid,
            elapsed.as_millis()
        );
        Ok(document)
    }
}
