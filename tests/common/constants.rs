//! Shared constants for end-to-end tests
//!
//! When test players or feed content change, update only this file.

#![allow(dead_code)]

// ============================================================================
// Test Players
// ============================================================================

/// Player registered on first contact in most tests
pub const LOBBY_UUID: &str = "lobby-0001";

/// A second player, used for isolation checks
pub const KIOSK_UUID: &str = "kiosk-0002";

/// Model string that maps to the full document shape
pub const GARLIC_MODEL: &str = "Garlic";

/// Model string that maps to the legacy vendor shape
pub const IADEA_MODEL: &str = "XMP-6400";

// ============================================================================
// External Feed
// ============================================================================

/// Path the stub feed server answers on
pub const FEED_PATH: &str = "/feed.smil";

/// Body the stub feed server returns
pub const FEED_BODY: &str =
    "<smil><head/><body><img src=\"https://feed.example.com/news.png\" dur=\"10s\"/></body></smil>";

/// Element the feed contributes once spliced into an index
pub const FEED_ELEMENT: &str = "<img src=\"https://feed.example.com/news.png\" dur=\"10s\"/>";

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for the server to become ready
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Interval between readiness polls
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 10;

/// Per-request timeout for the test client
pub const REQUEST_TIMEOUT_SECS: u64 = 10;
