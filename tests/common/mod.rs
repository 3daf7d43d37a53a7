//! Common test infrastructure
//!
//! This module provides all the infrastructure needed for end-to-end tests.
//! Tests should only import from this module, not from internal submodules.
//!
//! # Example
//!
//! ```no_run
//! mod common;
//! use common::{TestServer, TestClient, LOBBY_UUID};
//! use reqwest::StatusCode;
//!
//! #[tokio::test]
//! async fn test_get_index() {
//!     let server = TestServer::spawn().await;
//!     let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);
//!
//!     let response = client.get_index(LOBBY_UUID).await;
//!     assert_eq!(response.status(), StatusCode::OK);
//! }
//! ```

mod client;
mod constants;
mod fixtures;
mod server;

// Public API - this is what tests import
pub use client::{player_user_agent, TestClient};
pub use constants::*;
#[allow(unused_imports)]
pub use fixtures::{assign_playlist, corrupt_item_kind, create_playlist_with_items, media_item};
pub use server::TestServer;
