use super::models::PlayerRecord;
use super::user_agent::parse_user_agent;
use super::PlayerStore;
use anyhow::{Context, Result};
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

/// Resolves the player behind an index request, registering unknown devices.
#[derive(Clone)]
pub struct PlayerLookup {
    store: Arc<dyn PlayerStore>,
}

impl PlayerLookup {
    pub fn new(store: Arc<dyn PlayerStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn PlayerStore> {
        &self.store
    }

    /// The uuid from the User-Agent wins over the device key in the URL.
    pub fn resolve_by_user_agent(&self, user_agent: &str, device_key: &str) -> Result<PlayerRecord> {
        let identity = parse_user_agent(user_agent);
        let uuid = match identity.uuid.as_deref() {
            Some(uuid) => {
                if uuid != device_key {
                    warn!(
                        "User-Agent uuid {} differs from requested device key {}",
                        uuid, device_key
                    );
                }
                uuid.to_string()
            }
            None => device_key.to_string(),
        };
        let now = Utc::now();

        let mut player = PlayerRecord::new(
            &uuid,
            identity.name.as_deref().unwrap_or(&uuid),
            identity.model.as_deref().unwrap_or("unknown"),
            identity.firmware.as_deref().unwrap_or(""),
        );
        player.last_access = Some(now);
        let registered = self
            .store
            .register_player(&player)
            .with_context(|| format!("Failed to register player {}", uuid))?;
        if registered {
            info!("Registered new player {} (model {})", uuid, player.model);
        } else {
            self.store.record_access(&uuid, &identity, now)?;
        }

        self.store
            .get_player(&uuid)?
            .with_context(|| format!("Player {} vanished after lookup", uuid))
    }
}
