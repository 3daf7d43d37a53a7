//! End-to-end tests for the index endpoint
//!
//! Covers registration on first contact, conditional revalidation, HEAD,
//! CORS preflight and failure statuses.

mod common;

use common::{
    assign_playlist, corrupt_item_kind, create_playlist_with_items, media_item,
    player_user_agent, TestClient, TestServer, FEED_ELEMENT, IADEA_MODEL, KIOSK_UUID, LOBBY_UUID,
};
use reqwest::header::{
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE, ETAG,
    LAST_MODIFIED,
};
use reqwest::StatusCode;
use signage_index_server::player_store::PlayerStore;
use signage_index_server::playlist_store::{Item, ItemKind, PlaylistStore};

async fn seeded_lobby(server: &TestServer, client: &TestClient) -> i64 {
    // First contact registers the player.
    let response = client.get_index(LOBBY_UUID).await;
    assert_eq!(response.status(), StatusCode::OK);

    let playlist_id = create_playlist_with_items(
        server.playlists.as_ref(),
        "lobby",
        &[media_item("welcome"), media_item("menu")],
    )
    .unwrap();
    point_player_at(server, LOBBY_UUID, playlist_id);
    playlist_id
}

fn point_player_at(server: &TestServer, uuid: &str, playlist_id: i64) {
    assign_playlist(server.players.as_ref(), uuid, playlist_id).unwrap();
}

// =============================================================================
// Registration and content
// =============================================================================

#[tokio::test]
async fn test_unknown_player_is_registered_with_empty_index() {
    let server = TestServer::spawn().await;
    let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);

    let response = client.get_index(LOBBY_UUID).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "application/smil+xml");
    let body = response.text().await.unwrap();
    assert!(body.starts_with("<?xml"));
    assert!(body.contains("<smil"));
    assert!(!body.contains("<img"));

    let player = server.players.get_player(LOBBY_UUID).unwrap().unwrap();
    assert_eq!(player.name, "Test Player");
    assert_eq!(player.playlist_id, 0);
    assert!(player.last_access.is_some());
}

#[tokio::test]
async fn test_assigned_playlist_items_are_compiled_in_order() {
    let server = TestServer::spawn().await;
    let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);
    seeded_lobby(&server, &client).await;

    let body = client.get_index(LOBBY_UUID).await.text().await.unwrap();
    let welcome = body.find("src=\"/mediapool/welcome.png\"").unwrap();
    let menu = body.find("src=\"/mediapool/menu.png\"").unwrap();
    assert!(welcome < menu);
    assert!(body.contains("<seq repeatCount=\"indefinite\">"));
    assert!(body.contains("<prefetch src=\"/mediapool/welcome.png\" />"));
}

#[tokio::test]
async fn test_external_feed_is_spliced_into_index() {
    let server = TestServer::spawn().await;
    let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);
    client.get_index(LOBBY_UUID).await;

    let channel = Item::new(ItemKind::Channel, "news", &server.feed_url, "application/smil");
    let playlist_id =
        create_playlist_with_items(server.playlists.as_ref(), "news", &[channel]).unwrap();
    point_player_at(&server, LOBBY_UUID, playlist_id);

    let body = client.get_index(LOBBY_UUID).await.text().await.unwrap();
    assert!(body.contains(FEED_ELEMENT));
    assert!(!body.contains("{ITEMS_0#"));
}

#[tokio::test]
async fn test_players_get_separate_documents() {
    let server = TestServer::spawn().await;
    let lobby = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);
    let kiosk = TestClient::new(
        server.base_url.clone(),
        player_user_agent(KIOSK_UUID, "Kiosk", IADEA_MODEL),
    );
    seeded_lobby(&server, &lobby).await;

    let lobby_body = lobby.get_index(LOBBY_UUID).await.text().await.unwrap();
    let kiosk_body = kiosk.get_index(KIOSK_UUID).await.text().await.unwrap();
    assert!(lobby_body.contains("welcome.png"));
    assert!(!kiosk_body.contains("welcome.png"));
    // Legacy vendor players get ids on their layout regions.
    assert!(kiosk_body.contains("<region xml:id=\"screen\""));
}

// =============================================================================
// Conditional GET
// =============================================================================

#[tokio::test]
async fn test_matching_etag_returns_not_modified() {
    let server = TestServer::spawn().await;
    let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);
    seeded_lobby(&server, &client).await;

    let response = client.get_index(LOBBY_UUID).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[CACHE_CONTROL]
        .to_str()
        .unwrap()
        .contains("must-revalidate"));
    let etag = response.headers()[ETAG].to_str().unwrap().to_string();
    assert!(etag.starts_with('"') && etag.ends_with('"'));

    let response = client
        .get_index_conditional(LOBBY_UUID, Some(&etag), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);
    assert_eq!(response.headers()[ETAG].to_str().unwrap(), etag);
    assert!(response.text().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_content_change_invalidates_etag() {
    let server = TestServer::spawn().await;
    let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);
    let playlist_id = seeded_lobby(&server, &client).await;

    let etag = client.get_index(LOBBY_UUID).await.headers()[ETAG]
        .to_str()
        .unwrap()
        .to_string();

    server
        .playlists
        .add_item(playlist_id, &media_item("specials"))
        .unwrap();

    let response = client
        .get_index_conditional(LOBBY_UUID, Some(&etag), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_ne!(response.headers()[ETAG].to_str().unwrap(), etag);
    assert!(response.text().await.unwrap().contains("specials.png"));
}

#[tokio::test]
async fn test_if_none_match_takes_priority_over_if_modified_since() {
    let server = TestServer::spawn().await;
    let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);
    seeded_lobby(&server, &client).await;
    client.get_index(LOBBY_UUID).await;

    let response = client
        .get_index_conditional(
            LOBBY_UUID,
            Some("\"stale\""),
            Some("Fri, 01 Jan 2100 00:00:00 GMT"),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_if_modified_since_must_be_newer_than_document() {
    let server = TestServer::spawn().await;
    let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);
    seeded_lobby(&server, &client).await;

    let response = client.get_index(LOBBY_UUID).await;
    let last_modified = response.headers()[LAST_MODIFIED]
        .to_str()
        .unwrap()
        .to_string();
    assert!(last_modified.ends_with(" GMT"));

    let response = client
        .get_index_conditional(LOBBY_UUID, None, Some("Fri, 01 Jan 2100 00:00:00 GMT"))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

    let response = client
        .get_index_conditional(LOBBY_UUID, None, Some("Mon, 01 Jan 2001 00:00:00 GMT"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = client
        .get_index_conditional(LOBBY_UUID, None, Some("not a date"))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_head_returns_validators_without_body() {
    let server = TestServer::spawn().await;
    let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);
    seeded_lobby(&server, &client).await;

    let get_etag = client.get_index(LOBBY_UUID).await.headers()[ETAG].clone();
    let response = client.head_index(LOBBY_UUID).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[ETAG], get_etag);
    assert!(response.headers().contains_key(LAST_MODIFIED));
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_options_answers_cors_preflight() {
    let server = TestServer::spawn().await;
    let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);

    let response = client.options_index(LOBBY_UUID).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert!(response.headers()[ACCESS_CONTROL_ALLOW_METHODS]
        .to_str()
        .unwrap()
        .contains("GET"));
    // Preflight never registers a player.
    assert!(server.players.get_player(LOBBY_UUID).unwrap().is_none());
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_missing_nested_playlist_is_dropped_not_fatal() {
    let server = TestServer::spawn().await;
    let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);
    client.get_index(LOBBY_UUID).await;

    let nested = Item::new(ItemKind::NestedPlaylist, "gone", "4242", "");
    let playlist_id = create_playlist_with_items(
        server.playlists.as_ref(),
        "lobby",
        &[media_item("welcome"), nested],
    )
    .unwrap();
    point_player_at(&server, LOBBY_UUID, playlist_id);

    let response = client.get_index(LOBBY_UUID).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("welcome.png"));
    assert!(!body.contains("{ITEMS_"));
}

#[tokio::test]
async fn test_unknown_item_kind_fails_the_whole_document() {
    let server = TestServer::spawn().await;
    let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);
    let playlist_id = seeded_lobby(&server, &client).await;

    let broken = server
        .playlists
        .add_item(playlist_id, &media_item("broken"))
        .unwrap();
    corrupt_item_kind(&server.playlist_db_path, broken, "hologram").unwrap();

    let response = client.get_index(LOBBY_UUID).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn test_stats_endpoint_reports_uptime() {
    let server = TestServer::spawn().await;
    let client = TestClient::for_player(server.base_url.clone(), LOBBY_UUID);

    let response = client.get_stats().await;
    assert_eq!(response.status(), StatusCode::OK);
    let stats: serde_json::Value = response.json().await.unwrap();
    assert!(stats["uptime"].as_str().unwrap().starts_with("0d "));
    assert!(stats["hash"].is_string());
}
