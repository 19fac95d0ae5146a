use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use clap::Parser;
use profile_index_api::{
    match_percentage, EngineStats, MatchSource, QueryEngine, API_CONTRACT_VERSION,
};
use profile_index_core::{validate_label, Category, ClassificationReport, ProfileId};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const SERVICE_CONTRACT_VERSION: &str = "service.v1";

#[derive(Debug, Clone)]
struct ServiceState {
    engine: Arc<QueryEngine>,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceEnvelope<T>
where
    T: Serialize,
{
    service_contract_version: &'static str,
    api_contract_version: &'static str,
    data: T,
}

#[derive(Debug, Clone, Serialize)]
struct ServiceError {
    #[serde(skip)]
    status: StatusCode,
    service_contract_version: &'static str,
    error: String,
}

#[derive(Debug, Clone, Serialize)]
struct HealthResponse {
    status: &'static str,
    total_users: usize,
}

#[derive(Debug, Clone, Deserialize)]
struct FindQuery {
    category: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct FindResponse {
    key: String,
    matched: MatchSource,
    user_ids: BTreeSet<ProfileId>,
    count: usize,
    total_users: usize,
    percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
struct UserResponse {
    user_id: ProfileId,
    version_marker: String,
    profile: String,
    categories: BTreeSet<Category>,
    tags: BTreeSet<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct AddTagRequest {
    tag: String,
}

#[derive(Debug, Clone, Serialize)]
struct TagResponse {
    user_id: String,
    tag: String,
    tags: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize)]
struct StatsResponse {
    #[serde(flatten)]
    stats: EngineStats,
    percentages: BTreeMap<String, f64>,
}

#[derive(Debug, Parser)]
#[command(name = "profile-index-service")]
#[command(about = "Local HTTP service for the profile index")]
struct Args {
    #[arg(long, default_value = "./data")]
    data_dir: PathBuf,
    #[arg(long, default_value = "127.0.0.1:8080")]
    bind: SocketAddr,
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status;
        (status, Json(self)).into_response()
    }
}

impl ServiceState {
    fn error(status: StatusCode, message: impl Into<String>) -> ServiceError {
        ServiceError {
            status,
            service_contract_version: SERVICE_CONTRACT_VERSION,
            error: message.into(),
        }
    }

    fn user_not_found(user_id: &str) -> ServiceError {
        Self::error(StatusCode::NOT_FOUND, format!("user {user_id} not found"))
    }
}

fn envelope<T>(data: T) -> ServiceEnvelope<T>
where
    T: Serialize,
{
    ServiceEnvelope {
        service_contract_version: SERVICE_CONTRACT_VERSION,
        api_contract_version: API_CONTRACT_VERSION,
        data,
    }
}

fn app(state: ServiceState) -> Router {
    Router::new()
        .route("/v1/health", get(health))
        .route("/v1/users", get(find_users))
        .route("/v1/users/:user_id", get(user_show))
        .route("/v1/users/:user_id/classification", get(user_classification))
        .route("/v1/users/:user_id/tags", post(user_add_tag))
        .route("/v1/users/:user_id/tags/:tag", delete(user_remove_tag))
        .route("/v1/stats", get(stats))
        .with_state(state)
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();
    let engine = QueryEngine::new()?;
    engine.load_directory(&args.data_dir)?;
    let state = ServiceState { engine: Arc::new(engine) };

    let listener = tokio::net::TcpListener::bind(args.bind).await?;
    tracing::info!(bind = %args.bind, "profile index service listening");
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn health(State(state): State<ServiceState>) -> Json<ServiceEnvelope<HealthResponse>> {
    Json(envelope(HealthResponse { status: "ok", total_users: state.engine.total_count() }))
}

async fn find_users(
    State(state): State<ServiceState>,
    Query(query): Query<FindQuery>,
) -> Result<Json<ServiceEnvelope<FindResponse>>, ServiceError> {
    let key = query
        .category
        .filter(|key| !key.is_empty())
        .ok_or_else(|| ServiceState::error(StatusCode::BAD_REQUEST, "missing `category` query parameter"))?;

    let result = state.engine.find(&key);
    let count = result.user_ids.len();
    Ok(Json(envelope(FindResponse {
        key: result.key,
        matched: result.matched,
        count,
        total_users: result.total_users,
        percentage: match_percentage(count, result.total_users),
        user_ids: result.user_ids,
    })))
}

async fn user_show(
    State(state): State<ServiceState>,
    Path(user_id): Path<String>,
) -> Result<Json<ServiceEnvelope<UserResponse>>, ServiceError> {
    let profile = state.engine.get_user(&user_id).ok_or_else(|| ServiceState::user_not_found(&user_id))?;
    Ok(Json(envelope(UserResponse {
        user_id: profile.id().clone(),
        version_marker: profile.version_marker().to_string(),
        profile: profile.raw_content().to_string(),
        categories: profile.categories().clone(),
        tags: profile.tags().clone(),
    })))
}

async fn user_classification(
    State(state): State<ServiceState>,
    Path(user_id): Path<String>,
) -> Result<Json<ServiceEnvelope<ClassificationReport>>, ServiceError> {
    let report = state.engine.explain(&user_id).ok_or_else(|| ServiceState::user_not_found(&user_id))?;
    Ok(Json(envelope(report)))
}

async fn user_add_tag(
    State(state): State<ServiceState>,
    Path(user_id): Path<String>,
    Json(request): Json<AddTagRequest>,
) -> Result<Json<ServiceEnvelope<TagResponse>>, ServiceError> {
    validate_label(&request.tag)
        .map_err(|err| ServiceState::error(StatusCode::BAD_REQUEST, err.to_string()))?;
    if !state.engine.add_tag(&user_id, &request.tag) {
        return Err(ServiceState::user_not_found(&user_id));
    }
    Ok(Json(envelope(tag_response(&state, user_id, request.tag))))
}

async fn user_remove_tag(
    State(state): State<ServiceState>,
    Path((user_id, tag)): Path<(String, String)>,
) -> Result<Json<ServiceEnvelope<TagResponse>>, ServiceError> {
    if !state.engine.remove_tag(&user_id, &tag) {
        return Err(ServiceState::error(
            StatusCode::NOT_FOUND,
            format!("tag {tag} not found on user {user_id}"),
        ));
    }
    Ok(Json(envelope(tag_response(&state, user_id, tag))))
}

fn tag_response(state: &ServiceState, user_id: String, tag: String) -> TagResponse {
    let tags = state.engine.get_user(&user_id).map(|profile| profile.tags().clone()).unwrap_or_default();
    TagResponse { user_id, tag, tags }
}

async fn stats(State(state): State<ServiceState>) -> Json<ServiceEnvelope<StatsResponse>> {
    let stats = state.engine.stats();
    let percentages = stats
        .categories
        .iter()
        .map(|(category, count)| (category.clone(), match_percentage(*count, stats.total_users)))
        .collect();
    Json(envelope(StatsResponse { stats, percentages }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use http::Request;
    use tower::ServiceExt;

    const IDLE: &str = "# Final Profile (UUID): 11aa-22bb\nsupply_total_posts: 0\n\
demand_searches_made: 0\n";
    const FRAUD: &str = "supply_total_posts: 3\ndemand_searches_made: 8\n\
note: scam payment taken, no show\n";

    fn loaded_state() -> ServiceState {
        let dir = std::env::temp_dir().join(format!("profile-index-service-{}", ulid::Ulid::new()));
        std::fs::create_dir_all(&dir)
            .unwrap_or_else(|err| panic!("failed to create temp dir {}: {err}", dir.display()));
        for (name, content) in [("user_42.md", IDLE), ("user_44.md", FRAUD)] {
            std::fs::write(dir.join(name), content)
                .unwrap_or_else(|err| panic!("failed to write fixture {name}: {err}"));
        }

        let engine = QueryEngine::new().unwrap_or_else(|err| panic!("engine should build: {err}"));
        if let Err(err) = engine.load_directory(&dir) {
            panic!("fixture load should succeed: {err}");
        }
        let _ = std::fs::remove_dir_all(&dir);
        ServiceState { engine: Arc::new(engine) }
    }

    async fn send(router: Router, method: &str, uri: &str, body: Option<serde_json::Value>) -> Response {
        let builder = Request::builder().uri(uri).method(method);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap_or_else(|err| panic!("failed to build request: {err}"));

        match router.oneshot(request).await {
            Ok(response) => response,
            Err(err) => panic!("router request failed: {err}"),
        }
    }

    async fn response_json(response: Response) -> serde_json::Value {
        let bytes = match to_bytes(response.into_body(), 1024 * 1024).await {
            Ok(bytes) => bytes,
            Err(err) => panic!("failed to read response body: {err}"),
        };
        let body = match String::from_utf8(bytes.to_vec()) {
            Ok(body) => body,
            Err(err) => panic!("response body is not UTF-8: {err}"),
        };
        match serde_json::from_str(&body) {
            Ok(value) => value,
            Err(err) => panic!("response body is not JSON: {err}; body={body}"),
        }
    }

    #[tokio::test]
    async fn health_endpoint_reports_user_count() {
        let router = app(loaded_state());
        let response = send(router, "GET", "/v1/health", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        assert_eq!(
            value.get("service_contract_version").and_then(serde_json::Value::as_str),
            Some(SERVICE_CONTRACT_VERSION)
        );
        assert_eq!(
            value.get("api_contract_version").and_then(serde_json::Value::as_str),
            Some(API_CONTRACT_VERSION)
        );
        assert_eq!(value.pointer("/data/total_users").and_then(serde_json::Value::as_u64), Some(2));
    }

    #[tokio::test]
    async fn find_by_category_includes_percentage() {
        let router = app(loaded_state());
        let response = send(router, "GET", "/v1/users?category=fraudsters", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        assert_eq!(value.pointer("/data/matched").and_then(serde_json::Value::as_str), Some("category"));
        assert_eq!(value.pointer("/data/user_ids"), Some(&serde_json::json!(["user_44"])));
        assert_eq!(value.pointer("/data/percentage").and_then(serde_json::Value::as_f64), Some(50.0));
    }

    #[tokio::test]
    async fn find_without_category_is_bad_request() {
        let router = app(loaded_state());
        let response = send(router, "GET", "/v1/users", None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let value = response_json(response).await;
        assert!(value.get("error").and_then(serde_json::Value::as_str).is_some());
    }

    #[tokio::test]
    async fn tag_added_over_http_is_findable_and_removable() {
        let state = loaded_state();

        let response = send(
            app(state.clone()),
            "POST",
            "/v1/users/user_42/tags",
            Some(serde_json::json!({ "tag": "vip" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = response_json(response).await;
        assert_eq!(value.pointer("/data/tags"), Some(&serde_json::json!(["vip"])));

        let response = send(app(state.clone()), "GET", "/v1/users?category=vip", None).await;
        let value = response_json(response).await;
        assert_eq!(value.pointer("/data/matched").and_then(serde_json::Value::as_str), Some("tag"));
        assert_eq!(value.pointer("/data/user_ids"), Some(&serde_json::json!(["user_42"])));

        let response = send(app(state.clone()), "DELETE", "/v1/users/user_42/tags/vip", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let response = send(app(state.clone()), "DELETE", "/v1/users/user_42/tags/vip", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(app(state), "GET", "/v1/users?category=vip", None).await;
        let value = response_json(response).await;
        assert_eq!(value.pointer("/data/matched").and_then(serde_json::Value::as_str), Some("none"));
        assert_eq!(value.pointer("/data/count").and_then(serde_json::Value::as_u64), Some(0));
    }

    #[tokio::test]
    async fn add_tag_rejects_unknown_user_and_invalid_tag() {
        let state = loaded_state();

        let response = send(
            app(state.clone()),
            "POST",
            "/v1/users/user_999/tags",
            Some(serde_json::json!({ "tag": "vip" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(
            app(state.clone()),
            "POST",
            "/v1/users/user_42/tags",
            Some(serde_json::json!({ "tag": "two words" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(state.engine.find_by_tag("two words").is_empty());
    }

    #[tokio::test]
    async fn user_endpoints_return_profile_and_classification() {
        let state = loaded_state();

        let response = send(app(state.clone()), "GET", "/v1/users/user_42", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = response_json(response).await;
        assert_eq!(value.pointer("/data/version_marker").and_then(serde_json::Value::as_str), Some("11aa-22bb"));
        assert_eq!(value.pointer("/data/profile").and_then(serde_json::Value::as_str), Some(IDLE));
        assert_eq!(value.pointer("/data/categories"), Some(&serde_json::json!(["new_users"])));

        let response = send(app(state.clone()), "GET", "/v1/users/user_42/classification", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = response_json(response).await;
        assert_eq!(
            value.pointer("/data/verdicts").and_then(serde_json::Value::as_array).map(Vec::len),
            Some(4)
        );

        let response = send(app(state.clone()), "GET", "/v1/users/user_999", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let response = send(app(state), "GET", "/v1/users/user_999/classification", None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn stats_endpoint_lists_categories() {
        let router = app(loaded_state());
        let response = send(router, "GET", "/v1/stats", None).await;
        assert_eq!(response.status(), StatusCode::OK);

        let value = response_json(response).await;
        assert_eq!(value.pointer("/data/total_users").and_then(serde_json::Value::as_u64), Some(2));
        assert_eq!(value.pointer("/data/categories/new_users").and_then(serde_json::Value::as_u64), Some(1));
        assert_eq!(
            value.pointer("/data/percentages/fraudsters").and_then(serde_json::Value::as_f64),
            Some(50.0)
        );
    }
}
