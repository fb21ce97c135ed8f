mod config;
mod geocoder;
mod graphql;
mod profiles;
mod session;
mod storage;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_graphql_axum::{GraphQLRequest, GraphQLResponse};
use axum::http::{HeaderMap, HeaderValue};
use axum::{
    extract::State,
    response::Html,
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing_subscriber::EnvFilter;

use config::Config;
use graphql::Schema;
use session::Viewer;
use storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub schema: Schema,
    pub storage: Arc<Storage>,
    pub dist_dir: PathBuf,
}

async fn graphql_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    req: GraphQLRequest,
) -> GraphQLResponse {
    let viewer = Viewer(session::identify(&state.storage, &headers));
    state
        .schema
        .execute(req.into_inner().data(viewer))
        .await
        .into()
}

async fn graphiql() -> Html<String> {
    Html(
        async_graphql::http::GraphiQLSource::build()
            .endpoint("/graphql")
            .finish(),
    )
}

/// Build a cache-controlled static file router.
///
/// Separated so tests can exercise the caching layer with arbitrary directories.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Build the full application router.
fn build_app(state: AppState, public_dir: &Path) -> Router {
    let dist_dir = state.dist_dir.clone();
    // Static routers are stateless, merge them after the state is attached
    let static_files = Router::new()
        .nest("/static", cached_static_router(public_dir, CACHE_1DAY))
        .nest("/dist", cached_static_router(&dist_dir, CACHE_IMMUTABLE))
        .nest(
            "/assets",
            cached_static_router(&dist_dir.join("assets"), CACHE_IMMUTABLE),
        );

    Router::new()
        .route("/graphql", get(graphiql).post(graphql_handler))
        .route("/api/profile", post(profiles::submit_handler))
        .route("/", get(serve_index))
        .with_state(state)
        .merge(static_files)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();

    let storage = Storage::open(&config.db_path).expect("Failed to open profile database");
    let geocoder = geocoder::Geocoder::new(
        &config.geocoder_url,
        &config.geocoder_user_agent,
        config.geocoder_limit,
    )
    .expect("Failed to build geocoder client");

    let schema = graphql::build_schema(storage.clone(), geocoder);
    let state = AppState {
        schema,
        storage,
        dist_dir: config.dist_dir.clone(),
    };
    let app = build_app(state, &config.public_dir);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(port = config.port, "Server running at http://localhost:{}", config.port);
    tracing::info!("GraphiQL playground at http://localhost:{}/graphql", config.port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listener");
    axum::serve(listener, app).await.expect("Server error");
}

async fn serve_index(State(state): State<AppState>) -> Html<String> {
    // Serve the built frontend, or a placeholder until it exists
    match tokio::fs::read_to_string(state.dist_dir.join("index.html")).await {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>Member Map</title></head>
<body>
<h1>Member Map</h1>
<p>Frontend not built yet. Visit <a href="/graphql">GraphiQL</a> to explore the API.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    /// Create a temp dir with a test file and return the dir path.
    fn temp_dir_with_file(file_name: &str, content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(file_name), content).unwrap();
        dir
    }

    /// Full router over a fresh database and the given directories.
    fn test_app(db_dir: &Path, dist_dir: &Path, public_dir: &Path) -> Router {
        let storage = Storage::open(&db_dir.join("test.redb")).unwrap();
        let geocoder = geocoder::Geocoder::new("http://127.0.0.1:9", "test", 5).unwrap();
        let state = AppState {
            schema: graphql::build_schema(storage.clone(), geocoder),
            storage,
            dist_dir: dist_dir.to_path_buf(),
        };
        build_app(state, public_dir)
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn profile_request(user: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/profile")
            .header("content-type", "application/json");
        if let Some(user) = user {
            builder = builder.header(session::USER_HEADER, user);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    const VALID_BODY: &str = r#"{"name":"Maria Lopez","program":"Biology","graduationYear":"2023","location":"Lima, Peru","latitude":-12.0464,"longitude":-77.0428}"#;

    #[tokio::test]
    async fn test_submit_profile_ok() {
        let db = tempfile::tempdir().unwrap();
        let dist = tempfile::tempdir().unwrap();
        let public = tempfile::tempdir().unwrap();
        let app = test_app(db.path(), dist.path(), public.path());

        let resp = app
            .oneshot(profile_request(Some("acc-1"), VALID_BODY))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["profile"]["name"], "Maria Lopez");
        assert_eq!(json["profile"]["graduationYear"], "2023");
        assert!(json["profile"]["id"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_submit_profile_without_session_is_401() {
        let db = tempfile::tempdir().unwrap();
        let dist = tempfile::tempdir().unwrap();
        let public = tempfile::tempdir().unwrap();
        let app = test_app(db.path(), dist.path(), public.path());

        let resp = app.oneshot(profile_request(None, VALID_BODY)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(resp).await["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_submit_profile_invalid_is_400() {
        let db = tempfile::tempdir().unwrap();
        let dist = tempfile::tempdir().unwrap();
        let public = tempfile::tempdir().unwrap();
        let app = test_app(db.path(), dist.path(), public.path());

        let body = r#"{"name":"","program":"Biology","location":"Lima","latitude":0,"longitude":0}"#;
        let resp = app
            .clone()
            .oneshot(profile_request(Some("acc-1"), body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "name is required");

        let resp = app
            .oneshot(profile_request(Some("acc-1"), "not json"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_graphql_sees_proxy_session() {
        let db = tempfile::tempdir().unwrap();
        let dist = tempfile::tempdir().unwrap();
        let public = tempfile::tempdir().unwrap();
        let app = test_app(db.path(), dist.path(), public.path());

        let resp = app
            .clone()
            .oneshot(profile_request(Some("acc-1"), VALID_BODY))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/graphql")
                    .header("content-type", "application/json")
                    .header(session::USER_HEADER, "acc-1")
                    .body(Body::from(r#"{"query":"{ myProfile { location } }"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let json = body_json(resp).await;
        assert_eq!(json["data"]["myProfile"]["location"], "Lima, Peru");
    }

    #[tokio::test]
    async fn test_index_falls_back_without_build() {
        let db = tempfile::tempdir().unwrap();
        let dist = tempfile::tempdir().unwrap();
        let public = tempfile::tempdir().unwrap();
        let app = test_app(db.path(), dist.path(), public.path());

        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Frontend not built yet"));
    }

    #[tokio::test]
    async fn test_index_serves_built_frontend() {
        let db = tempfile::tempdir().unwrap();
        let dist = temp_dir_with_file("index.html", "<html>built</html>");
        let public = tempfile::tempdir().unwrap();
        let app = test_app(db.path(), dist.path(), public.path());

        let resp = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<html>built</html>");
    }

    #[tokio::test]
    async fn test_public_files_have_1day_cache() {
        let db = tempfile::tempdir().unwrap();
        let dist = tempfile::tempdir().unwrap();
        let public = temp_dir_with_file("world.svg", "<svg/>");
        let app = test_app(db.path(), dist.path(), public.path());

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/static/world.svg")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=86400, must-revalidate"
        );
    }

    #[tokio::test]
    async fn test_dist_bundles_have_immutable_cache() {
        let db = tempfile::tempdir().unwrap();
        let dist = temp_dir_with_file("app-abc123.js", "bundle()");
        let public = tempfile::tempdir().unwrap();
        let app = test_app(db.path(), dist.path(), public.path());

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/dist/app-abc123.js")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=31536000, immutable"
        );
    }

    #[tokio::test]
    async fn test_dist_assets_have_immutable_cache() {
        let db = tempfile::tempdir().unwrap();
        let dist = tempfile::tempdir().unwrap();
        std::fs::create_dir(dist.path().join("assets")).unwrap();
        std::fs::write(dist.path().join("assets/main-xyz.css"), "body{}").unwrap();
        let public = tempfile::tempdir().unwrap();
        let app = test_app(db.path(), dist.path(), public.path());

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/assets/main-xyz.css")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "public, max-age=31536000, immutable"
        );
    }

    #[tokio::test]
    async fn test_missing_static_file_returns_404() {
        let db = tempfile::tempdir().unwrap();
        let dist = tempfile::tempdir().unwrap();
        let public = tempfile::tempdir().unwrap();
        let app = test_app(db.path(), dist.path(), public.path());

        let resp = app
            .oneshot(
                Request::builder()
                    .uri("/static/nonexistent.txt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
