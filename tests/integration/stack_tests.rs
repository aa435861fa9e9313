//! Integration tests for stacked tile retrieval.
//!
//! Tests verify:
//! - First-hit-wins in the configured priority order
//! - Discovery order as the default stack
//! - Empty-tile fallback when no member has the tile
//! - Unknown stack members and failing members are errors, not misses

use axum::http::StatusCode;

use tilestack::tile::EMPTY_TILE;

use super::test_utils::{body_bytes, body_json, get, null_tile, tile, Fixture};

/// `detail` has one zoom-2 tile; `world` has the same tile and the root tile.
async fn two_layers() -> Fixture {
    Fixture::new()
        .with_tileset("detail", &[tile(2, 1, 2, b"detail-2-1-2")], &[])
        .await
        .with_tileset(
            "world",
            &[tile(2, 1, 2, b"world-2-1-2"), tile(0, 0, 0, b"world-root")],
            &[],
        )
        .await
}

#[tokio::test]
async fn test_first_source_with_tile_wins() {
    let fixture = two_layers().await;
    let router = fixture
        .router_with_stack(Some(&["detail", "world"]))
        .await;

    // XYZ row 1 at zoom 2 is TMS row 2
    let response = get(router, "/tiles-stack/2/1/1.mvt").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-tile-source"], "detail");
    assert_eq!(response.headers()["content-encoding"], "gzip");
    assert_eq!(body_bytes(response).await.as_ref(), b"detail-2-1-2");
}

#[tokio::test]
async fn test_falls_through_to_lower_priority() {
    let fixture = two_layers().await;
    let router = fixture
        .router_with_stack(Some(&["detail", "world"]))
        .await;

    let response = get(router, "/tiles-stack/0/0/0.mvt").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-tile-source"], "world");
    assert_eq!(body_bytes(response).await.as_ref(), b"world-root");
}

#[tokio::test]
async fn test_order_decides_winner() {
    let fixture = two_layers().await;
    let router = fixture
        .router_with_stack(Some(&["world", "detail"]))
        .await;

    let response = get(router, "/tiles-stack/2/1/1.mvt").await;
    assert_eq!(body_bytes(response).await.as_ref(), b"world-2-1-2");
}

#[tokio::test]
async fn test_default_order_is_discovery_order() {
    let fixture = two_layers().await;

    // Files are discovered in name order: detail, then world
    let response = get(fixture.router().await, "/tiles-stack/2/1/1.mvt").await;
    assert_eq!(response.headers()["x-tile-source"], "detail");
}

#[tokio::test]
async fn test_stack_tms_addressing() {
    let fixture = two_layers().await;
    let router = fixture
        .router_with_stack(Some(&["detail", "world"]))
        .await;

    let response = get(router, "/tiles-stack-tms/2/1/2.mvt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.as_ref(), b"detail-2-1-2");
}

#[tokio::test]
async fn test_stack_miss_returns_empty_tile() {
    let fixture = two_layers().await;
    let response = get(fixture.router().await, "/tiles-stack/2/3/3.mvt").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers().get("x-tile-source").is_none());
    assert_eq!(body_bytes(response).await.as_ref(), EMPTY_TILE);
}

#[tokio::test]
async fn test_empty_stack_at_zoom_zero() {
    let fixture = Fixture::new();

    for uri in ["/tiles-stack/0/0/0.mvt", "/tiles-stack-tms/0/0/0.mvt"] {
        let response = get(fixture.router().await, uri).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(body_bytes(response).await.as_ref(), EMPTY_TILE, "{uri}");
    }
}

#[tokio::test]
async fn test_null_tile_falls_through_to_next_source() {
    let fixture = Fixture::new()
        .with_tileset("a", &[null_tile(0, 0, 0)], &[])
        .await
        .with_tileset("b", &[tile(0, 0, 0, b"from-b")], &[])
        .await;

    let response = get(fixture.router().await, "/tiles-stack/0/0/0.mvt").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-tile-source"], "b");
    assert_eq!(body_bytes(response).await.as_ref(), b"from-b");
}

#[tokio::test]
async fn test_missing_lower_member_does_not_block_a_hit() {
    let fixture = two_layers().await;
    let router = fixture
        .router_with_stack(Some(&["detail", "world"]))
        .await;

    std::fs::remove_file(fixture.path("world")).unwrap();

    // "detail" answers before "world" would be opened
    let response = get(router, "/tiles-stack/2/1/1.mvt").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.as_ref(), b"detail-2-1-2");
}

#[tokio::test]
async fn test_unknown_stack_member_is_an_error() {
    let fixture = two_layers().await;
    let router = fixture
        .router_with_stack(Some(&["detail", "ghost"]))
        .await;

    let response = get(router, "/tiles-stack/0/0/0.mvt").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["error"], "not_found");
    assert!(json["message"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_failing_member_is_not_skipped() {
    let fixture = two_layers().await;
    let router = fixture
        .router_with_stack(Some(&["detail", "world"]))
        .await;

    std::fs::remove_file(fixture.path("detail")).unwrap();

    // "world" has the root tile, but "detail" ranks higher and cannot answer
    let response = get(router, "/tiles-stack/0/0/0.mvt").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "storage_error");
}
