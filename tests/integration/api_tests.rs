//! API integration tests for single-source tile retrieval and error handling.
//!
//! Tests verify:
//! - XYZ and TMS addressing of the same stored tile
//! - Empty-tile fallback with 404 on a miss
//! - Error cases (unknown source, malformed coordinates)
//! - HTTP response codes and headers

use axum::http::StatusCode;

use tilestack::tile::{EMPTY_TILE, MVT_CONTENT_TYPE};

use super::test_utils::{body_bytes, body_json, get, null_tile, tile, Fixture};

const STORED: &[u8] = b"\x1f\x8b\x08\x00stored-tile";

async fn world() -> Fixture {
    Fixture::new()
        .with_tileset(
            "world",
            &[
                tile(1, 0, 1, STORED),
                tile(3, 2, 4, b"deep"),
                null_tile(2, 0, 0),
            ],
            &[("minzoom", "0"), ("maxzoom", "1")],
        )
        .await
}

// =============================================================================
// Tile Retrieval
// =============================================================================

#[tokio::test]
async fn test_xyz_tile_hit() {
    let fixture = world().await;

    // XYZ row 0 at zoom 1 is TMS row 1
    let response = get(fixture.router().await, "/tiles/world/1/0/0.mvt").await;

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["content-type"], MVT_CONTENT_TYPE);
    assert_eq!(headers["content-encoding"], "gzip");
    assert_eq!(headers["cache-control"], "public, max-age=3600");
    assert_eq!(headers["x-tile-source"], "world");

    assert_eq!(body_bytes(response).await.as_ref(), STORED);
}

#[tokio::test]
async fn test_tms_tile_hit_matches_xyz() {
    let fixture = world().await;

    let xyz = get(fixture.router().await, "/tiles/world/1/0/0.mvt").await;
    let tms = get(fixture.router().await, "/tiles-tms/world/1/0/1.mvt").await;

    assert_eq!(tms.status(), StatusCode::OK);
    assert_eq!(body_bytes(xyz).await, body_bytes(tms).await);
}

#[tokio::test]
async fn test_row_without_extension() {
    let fixture = world().await;
    let response = get(fixture.router().await, "/tiles/world/1/0/0").await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_miss_returns_empty_tile_with_404() {
    let fixture = world().await;

    // TMS row 1 stored; as an XYZ row, 1 maps to TMS row 0
    let response = get(fixture.router().await, "/tiles/world/1/0/1.mvt").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.headers()["content-type"], MVT_CONTENT_TYPE);
    assert_eq!(response.headers()["content-encoding"], "gzip");
    assert!(response.headers().get("x-tile-source").is_none());
    assert_eq!(body_bytes(response).await.as_ref(), EMPTY_TILE);
}

#[tokio::test]
async fn test_row_outside_grid_is_a_miss() {
    let fixture = world().await;
    let response = get(fixture.router().await, "/tiles/world/1/0/5.mvt").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(response).await.as_ref(), EMPTY_TILE);
}

#[tokio::test]
async fn test_coordinates_too_large_to_address_are_a_miss() {
    let fixture = world().await;

    for uri in [
        "/tiles/world/256/0/0.mvt",
        "/tiles/world/1/4294967296/0.mvt",
        "/tiles/world/1/0/99999999999999999999.mvt",
        "/tiles-tms/world/300/0/0.mvt",
        "/tiles-stack/4294967296/0/0.mvt",
        "/tiles-stack-tms/1/4294967296/0.mvt",
    ] {
        let response = get(fixture.router().await, uri).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        assert_eq!(response.headers()["content-type"], MVT_CONTENT_TYPE, "{uri}");
        assert_eq!(response.headers()["content-encoding"], "gzip", "{uri}");
        assert_eq!(body_bytes(response).await.as_ref(), EMPTY_TILE, "{uri}");
    }
}

#[tokio::test]
async fn test_oversized_zoom_for_unknown_source_is_not_a_miss() {
    let fixture = world().await;
    let response = get(fixture.router().await, "/tiles/atlantis/256/0/0.mvt").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "not_found");
}

#[tokio::test]
async fn test_null_tile_data_is_a_miss() {
    let fixture = world().await;

    // TMS row 0 at zoom 2 is XYZ row 3
    let response = get(fixture.router().await, "/tiles/world/2/0/3.mvt").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_bytes(response).await.as_ref(), EMPTY_TILE);
}

#[tokio::test]
async fn test_zoom_beyond_declared_range_still_queries() {
    let fixture = world().await;

    // maxzoom is 1, but a tile exists at zoom 3 (TMS row 4 = XYZ row 3)
    let response = get(fixture.router().await, "/tiles/world/3/2/3.mvt").await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await.as_ref(), b"deep");
}

#[tokio::test]
async fn test_custom_cache_max_age() {
    use tilestack::source::{MbtilesCatalog, SourceRegistry};
    use tilestack::tile::TileService;
    use tilestack::{create_router, RouterConfig};

    let fixture = world().await;
    let catalog = MbtilesCatalog::discover(&[fixture.path("world")], 1)
        .await
        .unwrap();
    let router = create_router(
        TileService::new(SourceRegistry::new(catalog)),
        RouterConfig::new().with_cache_max_age(60).with_tracing(false),
    );

    let response = get(router, "/tiles/world/1/0/0.mvt").await;
    assert_eq!(response.headers()["cache-control"], "public, max-age=60");
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_unknown_source_is_not_a_miss() {
    let fixture = world().await;
    let response = get(fixture.router().await, "/tiles/atlantis/0/0/0.mvt").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert!(response.headers()["content-type"]
        .to_str()
        .unwrap()
        .starts_with("application/json"));

    let json = body_json(response).await;
    assert_eq!(json["error"], "not_found");
    assert_eq!(json["status"], 404);
    assert!(json["message"].as_str().unwrap().contains("atlantis"));
}

#[tokio::test]
async fn test_unknown_source_tms() {
    let fixture = world().await;
    let response = get(fixture.router().await, "/tiles-tms/atlantis/0/0/0.mvt").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "not_found");
}

#[tokio::test]
async fn test_malformed_row() {
    let fixture = world().await;
    let response = get(fixture.router().await, "/tiles/world/1/0/north.mvt").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_coordinate");
}

#[tokio::test]
async fn test_malformed_zoom_and_column() {
    let fixture = world().await;

    let response = get(fixture.router().await, "/tiles/world/one/0/0.mvt").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = get(fixture.router().await, "/tiles/world/1/-1/0.mvt").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_coordinate");

    let response = get(fixture.router().await, "/tiles-stack/one/0/0.mvt").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "invalid_coordinate");
}

#[tokio::test]
async fn test_storage_failure_is_500() {
    let fixture = world().await;
    let router = fixture.router().await;

    // Discovered, then removed before the first open
    std::fs::remove_file(fixture.path("world")).unwrap();

    let response = get(router, "/tiles/world/1/0/0.mvt").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["error"], "storage_error");
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health() {
    let fixture = Fixture::new();
    let response = get(fixture.router().await, "/health").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}
