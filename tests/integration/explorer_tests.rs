//! Integration tests for the source list and explorer endpoints.

use axum::http::StatusCode;

use super::test_utils::{body_json, get, tile, Fixture};

async fn fixture() -> Fixture {
    Fixture::new()
        .with_tileset(
            "city",
            &[tile(10, 301, 640, b"x")],
            &[
                ("name", "City"),
                ("minzoom", "8"),
                ("maxzoom", "14"),
                ("center", "-73.98,40.75,10"),
                ("attribution", "© OpenStreetMap contributors"),
            ],
        )
        .await
        .with_tileset(
            "world",
            &[],
            &[
                ("minzoom", "0"),
                ("maxzoom", "6"),
                ("attribution", "© OpenStreetMap contributors"),
            ],
        )
        .await
}

#[tokio::test]
async fn test_list_sources() {
    let fixture = fixture().await;
    let response = get(fixture.router().await, "/sources").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let sources = json["sources"].as_array().unwrap();

    assert_eq!(sources.len(), 2);
    assert_eq!(sources[0]["name"], "city");
    assert_eq!(sources[0]["min_zoom"], 8);
    assert_eq!(sources[0]["max_zoom"], 14);
    assert_eq!(sources[0]["tile_url"], "/tiles/city/{z}/{x}/{y}.mvt");
    assert_eq!(sources[1]["name"], "world");
    assert_eq!(sources[1]["attribution"], "© OpenStreetMap contributors");
}

#[tokio::test]
async fn test_source_explorer_defaults_from_center() {
    let fixture = fixture().await;
    let response = get(fixture.router().await, "/sources/city").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["source"], "city");
    assert_eq!(json["default_zoom"], 10);
    assert_eq!(json["default_latitude"], 40.75);
    assert_eq!(json["default_longitude"], -73.98);
    assert_eq!(json["current_zoom"], 10);
    assert_eq!(json["current_x"], 301);
    assert_eq!(json["current_y"], 384);
    assert_eq!(json["can_zoom_in"], true);
    assert_eq!(json["can_zoom_out"], true);
    assert_eq!(json["metadata"]["name"], "City");

    let compass = &json["compass"];
    for point in ["n", "s", "e", "w"] {
        assert!(compass[point]["latitude"].is_number(), "{point}");
        assert!(compass[point]["longitude"].is_number(), "{point}");
    }
    assert!(compass["n"]["latitude"].as_f64() > compass["s"]["latitude"].as_f64());
    assert!(compass["e"]["longitude"].as_f64() > compass["w"]["longitude"].as_f64());
}

#[tokio::test]
async fn test_source_explorer_clamps_zoom() {
    let fixture = fixture().await;
    let response = get(fixture.router().await, "/sources/city?lat=0&lon=0&z=20").await;

    let json = body_json(response).await;
    assert_eq!(json["current_zoom"], 14);
    assert_eq!(json["can_zoom_in"], false);
    assert_eq!(json["current_x"], 8192);
    assert_eq!(json["current_y"], 8192);
}

#[tokio::test]
async fn test_source_explorer_without_center() {
    let fixture = fixture().await;
    let response = get(fixture.router().await, "/sources/world").await;

    let json = body_json(response).await;
    assert_eq!(json["default_zoom"], 0);
    assert_eq!(json["current_zoom"], 0);
    assert_eq!(json["can_zoom_out"], false);
}

#[tokio::test]
async fn test_source_explorer_unknown_source() {
    let fixture = fixture().await;
    let response = get(fixture.router().await, "/sources/atlantis").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"], "not_found");
}

#[tokio::test]
async fn test_source_explorer_bad_query() {
    let fixture = fixture().await;
    let response = get(fixture.router().await, "/sources/city?lat=north").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_stack_explorer() {
    let fixture = fixture().await;
    let response = get(
        fixture.router_with_stack(Some(&["city", "world"])).await,
        "/stack",
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;

    assert_eq!(json["sources"], serde_json::json!(["city", "world"]));
    assert_eq!(json["min_zoom"], 0);
    assert_eq!(json["max_zoom"], 14);
    assert_eq!(json["default_zoom"], 0);
    assert_eq!(json["default_latitude"], 0.0);
    assert_eq!(json["attribution"], "© OpenStreetMap contributors");
    assert_eq!(json["tile_url"], "/tiles-stack/{z}/{x}/{y}.mvt");
}

#[tokio::test]
async fn test_stack_explorer_disagreeing_attribution() {
    let fixture = fixture()
        .await
        .with_tileset("other", &[], &[("attribution", "Someone else")])
        .await;
    let response = get(fixture.router().await, "/stack").await;

    let json = body_json(response).await;
    assert_eq!(json["attribution"], "");
    assert_eq!(json["sources"], serde_json::json!(["city", "other", "world"]));
}
