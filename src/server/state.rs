use axum::extract::FromRef;

use crate::delivery::IndexPublisher;
use std::time::Instant;

use super::ServerConfig;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub hash: String,
    pub publisher: IndexPublisher,
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}

impl FromRef<ServerState> for IndexPublisher {
    fn from_ref(input: &ServerState) -> Self {
        input.publisher.clone()
    }
}
