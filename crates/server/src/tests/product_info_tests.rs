use super::*;
use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde_json::Value;
use tokio::net::TcpListener;

async fn fake_canopy(headers: HeaderMap, Json(body): Json<Value>) -> axum::response::Response {
    if headers.get("API-KEY").and_then(|v| v.to_str().ok()) != Some("test-key") {
        return (StatusCode::UNAUTHORIZED, "bad key").into_response();
    }
    match body["variables"]["asin"].as_str() {
        Some("B000000001") => Json(serde_json::json!({
            "data": {
                "amazonProduct": {
                    "title": "Desk Lamp",
                    "mainImageUrl": "https://img.example/lamp.jpg",
                    "rating": 4.5,
                    "price": { "display": "$19.99" }
                }
            }
        }))
        .into_response(),
        Some("B000000002") => Json(serde_json::json!({
            "data": {
                "amazonProduct": {
                    "title": "Bare Item",
                    "mainImageUrl": "https://img.example/bare.jpg",
                    "rating": null,
                    "price": null
                }
            }
        }))
        .into_response(),
        Some("B00000000E") => Json(serde_json::json!({
            "data": null,
            "errors": [{ "message": "quota exceeded" }]
        }))
        .into_response(),
        _ => Json(serde_json::json!({ "data": { "amazonProduct": null } })).into_response(),
    }
}

async fn spawn_fake() -> String {
    let app = Router::new().route("/", post(fake_canopy));
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{addr}/")
}

#[test]
fn extracts_asin_from_product_links() {
    assert_eq!(
        extract_asin("https://www.amazon.com/Desk-Lamp/dp/B000000001/ref=sr_1_1"),
        Some("B000000001")
    );
    assert_eq!(
        extract_asin("https://www.amazon.com/dp/B000000001?th=1"),
        Some("B000000001")
    );
    assert_eq!(
        extract_asin("https://www.amazon.com/dp/B000000001"),
        Some("B000000001")
    );
}

#[test]
fn rejects_links_without_asin() {
    assert_eq!(extract_asin("https://www.amazon.com/"), None);
    assert_eq!(extract_asin("https://www.amazon.com/dp/b000000001"), None);
    assert_eq!(extract_asin("https://www.amazon.com/dp/B0000000011x"), None);
}

#[tokio::test]
async fn canopy_lookup_maps_product_fields() {
    let catalog = CanopyCatalog::new(spawn_fake().await, "test-key");

    let product = catalog.lookup("B000000001").await.expect("lookup");
    assert_eq!(product.name, "Desk Lamp");
    assert_eq!(product.image, "https://img.example/lamp.jpg");
    assert_eq!(product.rating, Some(4.5));
    assert_eq!(product.price.as_deref(), Some("$19.99"));

    let bare = catalog.lookup("B000000002").await.expect("lookup");
    assert_eq!(bare.rating, None);
    assert_eq!(bare.price, None);
}

#[tokio::test]
async fn canopy_lookup_surfaces_upstream_failures() {
    let url = spawn_fake().await;

    let unauthorized = CanopyCatalog::new(url.clone(), "wrong-key");
    assert!(unauthorized.lookup("B000000001").await.is_err());

    let catalog = CanopyCatalog::new(url, "test-key");
    let err = catalog.lookup("B00000000E").await.expect_err("graphql error");
    assert!(err.to_string().contains("quota exceeded"));

    assert!(catalog.lookup("B00000000Z").await.is_err());
}

#[tokio::test]
async fn missing_catalog_fails_every_lookup() {
    assert!(MissingProductCatalog.lookup("B000000001").await.is_err());
}
