use anyhow::Result;
use axum::{
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use corridor_view::demo::demo_evaluator;
use raster_query::{Evaluator, RemoteEvaluator, RemoteEvaluatorConfig};

mod error;
mod routes;

#[derive(Clone)]
pub struct AppState {
    pub evaluator: Arc<dyn Evaluator>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "corridor_gateway=debug,info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Evaluator: live backend when configured, demo catalogue otherwise.
    let evaluator: Arc<dyn Evaluator> = match std::env::var("CORRIDOR_EE_URL") {
        Ok(url) => {
            tracing::info!("   Using analysis backend at {url}");
            Arc::new(RemoteEvaluator::new(RemoteEvaluatorConfig::new(url))?)
        }
        Err(_) => {
            tracing::info!("   CORRIDOR_EE_URL not set - using demo catalogue");
            Arc::new(demo_evaluator(Utc::now().date_naive()))
        }
    };

    let state = AppState { evaluator };
    let app = build_router(state);

    let port = std::env::var("CORRIDOR_GATEWAY_PORT")
        .or_else(|_| std::env::var("PORT"))
        .unwrap_or_else(|_| "18650".to_string());
    let addr = format!("0.0.0.0:{}", port);

    tracing::info!("🌍 Corridor Gateway starting on {}", addr);
    tracing::info!("   Imagery: {}", corridor_view::SENTINEL2_DATASET);
    tracing::info!("   Classification: {}", corridor_view::DYNAMIC_WORLD_DATASET);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: AppState) -> Router {
    let corridor_routes = Router::new()
        .route("/render", post(routes::run_render))
        .route("/regions", get(routes::list_regions))
        .route("/variants", get(routes::list_variants))
        .with_state(state);

    let api_routes = Router::new()
        .route("/health", get(health))
        .nest("/api/v1/corridor", corridor_routes)
        .layer(CorsLayer::permissive());

    // Static file serving for the map UI (if dist exists)
    let ui_path = std::path::Path::new("ui/map-dashboard/dist");
    if ui_path.exists() {
        tracing::info!("   Serving UI from {}", ui_path.display());
        api_routes.nest_service("/", ServeDir::new(ui_path))
    } else {
        api_routes
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "corridor-gateway",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    fn demo_state() -> AppState {
        AppState {
            evaluator: Arc::new(demo_evaluator(Utc::now().date_naive())),
        }
    }

    #[tokio::test]
    async fn health_endpoint_responds() {
        let app = build_router(demo_state());
        let resp = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn regions_menu_lists_all_three_choices() {
        let app = build_router(demo_state());
        let resp = app
            .oneshot(
                Request::get("/api/v1/corridor/regions")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let regions: Vec<serde_json::Value> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(regions.len(), 3);
    }

    #[tokio::test]
    async fn render_endpoint_serves_a_pass_from_the_demo_catalogue() {
        let app = build_router(demo_state());
        let body = serde_json::json!({
            "variant": "scene-5d",
            "region": "cornwall-hedgerows",
            "show_distance": true
        });
        let resp = app
            .oneshot(
                Request::post("/api/v1/corridor/render")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let response: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(response["map"]["layers"].as_array().unwrap().len() >= 4);
    }

    /// One clear Sentinel-2 scene with no classification companion at all.
    fn lone_scene_state() -> AppState {
        use chrono::NaiveDate;
        use corridor_view::{CLOUD_ATTR, DYNAMIC_WORLD_DATASET, SENTINEL2_DATASET};
        use raster_query::{GeoBounds, GridImage, InMemoryEvaluator, Scene};

        let bounds = GeoBounds {
            min_lon: -5.6,
            max_lon: -4.2,
            min_lat: 50.0,
            max_lat: 50.9,
        };
        let mut img = GridImage::new(2, 2, bounds);
        for band in ["B4", "B3", "B2"] {
            img.bands.insert(band.to_string(), vec![Some(1000.0); 4]);
        }
        let captured = NaiveDate::from_ymd_opt(2022, 4, 3).unwrap();
        let scene = Scene::new("20220403T110621", captured, img).with_property(CLOUD_ATTR, 12.0);
        let eval = InMemoryEvaluator::new()
            .with_dataset(SENTINEL2_DATASET, vec![scene])
            .with_dataset(DYNAMIC_WORLD_DATASET, Vec::new());
        AppState {
            evaluator: Arc::new(eval),
        }
    }

    #[tokio::test]
    async fn missing_companion_scene_maps_to_not_found() {
        let app = build_router(lone_scene_state());
        let body = serde_json::json!({
            "anchor": "2022-04-01",
            "variant": "scene-5d",
            "region": "cornwall-hedgerows"
        });
        let resp = app
            .oneshot(
                Request::post("/api/v1/corridor/render")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let error: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(error["code"], "NOT_FOUND");
        assert!(error["message"].as_str().unwrap().contains("20220403T110621"));
    }

    #[tokio::test]
    async fn unknown_variant_is_a_bad_request() {
        let app = build_router(demo_state());
        let resp = app
            .oneshot(
                Request::post("/api/v1/corridor/render")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"variant": "scene-99d"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
