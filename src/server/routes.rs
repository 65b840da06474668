//! HTTP routes.
//!
//! # Endpoints
//!
//! - `GET /health`: health check (no auth)
//! - `GET /manifest.json`: web app manifest (no auth)
//! - `POST /api/auth/signup`, `POST /api/auth/login`, `POST /api/auth/logout`
//! - `GET /api/auth/me`: current user (auth required)
//! - `GET /api/workouts`, `POST /api/workouts`: the user's workout
//!   collection (auth required)

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Extension, Json, Router,
};
use repbook_core::User;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_http::trace::TraceLayer;

use super::auth::{self, AuthUser};
use super::config::ServerConfig;
use super::error::ApiError;
use super::manifest::manifest;
use super::sessions::SessionStore;
use super::store::{keys, SharedStore};
use super::users::{StoredUser, UserStore};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub users: UserStore,
    pub sessions: SessionStore,
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(store: SharedStore, config: &ServerConfig) -> Self {
        Self {
            users: UserStore::new(store.clone()),
            sessions: SessionStore::new(store.clone(), config.session_ttl),
            store,
            secure_cookies: config.secure_cookies,
        }
    }
}

/// Builds the application router.
pub fn app(state: AppState) -> Router {
    // Public routes (no auth)
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/manifest.json", get(manifest))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/auth/me", get(me))
        .route("/api/workouts", get(get_workouts).post(save_workouts))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

// ============================================================================
// Handlers
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Debug, Deserialize)]
struct SignupRequest {
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: Option<String>,
    password: Option<String>,
}

#[derive(Serialize)]
struct AuthResponse {
    user: User,
    message: &'static str,
    token: String,
}

#[derive(Serialize)]
struct MeResponse {
    user: User,
}

#[derive(Serialize)]
struct MessageResponse {
    message: &'static str,
}

/// Treats absent and blank fields alike.
fn required(field: Option<String>) -> Option<String> {
    field.filter(|value| !value.trim().is_empty())
}

/// Issues a session for `user` and answers with it as body and cookie.
async fn start_session(
    state: &AppState,
    user: &StoredUser,
    message: &'static str,
) -> Result<Response, ApiError> {
    let token = state.sessions.create(user).await?;
    let cookie = auth::session_cookie(&token, state.sessions.ttl(), state.secure_cookies);

    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse {
            user: user.to_user(),
            message,
            token,
        }),
    )
        .into_response())
}

async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    const MISSING: ApiError = ApiError::BadRequest("Missing required fields");

    let Json(request) = payload.map_err(|_| MISSING)?;
    let (Some(email), Some(password), Some(name)) = (
        required(request.email),
        required(request.password),
        required(request.name),
    ) else {
        return Err(MISSING);
    };

    let user = state.users.create(&email, &name, &password).await?;
    start_session(&state, &user, "User created successfully").await
}

async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    const MISSING: ApiError = ApiError::BadRequest("Missing email or password");

    let Json(request) = payload.map_err(|_| MISSING)?;
    let (Some(email), Some(password)) = (required(request.email), required(request.password))
    else {
        return Err(MISSING);
    };

    let Some(user) = state.users.verify(&email, &password).await? else {
        tracing::info!("Failed login for {}", email.trim());
        return Err(ApiError::Unauthorized("Invalid credentials"));
    };
    start_session(&state, &user, "Login successful").await
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Result<Response, ApiError> {
    if let Some(token) = auth::session_token(&headers) {
        state.sessions.delete(&token).await?;
    }

    Ok((
        [(
            header::SET_COOKIE,
            auth::clear_session_cookie(state.secure_cookies),
        )],
        Json(MessageResponse {
            message: "Logged out successfully",
        }),
    )
        .into_response())
}

async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> Result<Json<MeResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(&auth_user.user_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(MeResponse {
        user: user.to_user(),
    }))
}

#[derive(Serialize)]
struct WorkoutsResponse {
    workouts: Value,
}

#[derive(Debug, Deserialize)]
struct WorkoutsRequest {
    workouts: Option<Value>,
}

async fn get_workouts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<WorkoutsResponse>, ApiError> {
    let stored = state.store.get(&keys::workouts(&user.user_id)).await?;

    let workouts = match stored {
        None => Value::Array(Vec::new()),
        Some(raw) => match serde_json::from_str::<Value>(&raw) {
            Ok(value @ Value::Array(_)) => value,
            Ok(_) => {
                tracing::warn!(user_id = %user.user_id, "Stored workouts are not a list; returning none");
                Value::Array(Vec::new())
            }
            Err(e) => {
                tracing::warn!(user_id = %user.user_id, "Stored workouts are unreadable ({}); returning none", e);
                Value::Array(Vec::new())
            }
        },
    };

    Ok(Json(WorkoutsResponse { workouts }))
}

/// Replaces the stored collection with the request body's `workouts`,
/// verbatim.
async fn save_workouts(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<WorkoutsRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    const MALFORMED: ApiError = ApiError::BadRequest("Missing workouts");

    let Json(request) = payload.map_err(|_| MALFORMED)?;
    let workouts = request.workouts.ok_or(MALFORMED)?;

    state
        .store
        .set(&keys::workouts(&user.user_id), &workouts.to_string())
        .await?;
    tracing::debug!(user_id = %user.user_id, "Saved workouts");

    Ok(Json(MessageResponse {
        message: "Workouts saved successfully",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::store::MemoryStore;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn test_app() -> (Router, SharedStore) {
        let store: SharedStore = Arc::new(MemoryStore::new());
        let state = AppState::new(store.clone(), &ServerConfig::in_memory());
        (app(state), store)
    }

    struct Reply {
        status: StatusCode,
        headers: HeaderMap,
        body: Value,
    }

    async fn call(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> Reply {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Reply {
            status,
            headers,
            body,
        }
    }

    async fn signup(app: &Router, email: &str) -> String {
        let reply = call(
            app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"email": email, "password": "pw", "name": "Tester"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        reply.body["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = test_app();
        let reply = call(&app, "GET", "/health", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["status"], "ok");
    }

    #[tokio::test]
    async fn test_manifest() {
        let (app, _) = test_app();
        let reply = call(&app, "GET", "/manifest.json", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(
            reply.headers[header::CONTENT_TYPE],
            "application/manifest+json"
        );
        assert_eq!(reply.body["short_name"], "WorkoutTracker");
        assert_eq!(reply.body["icons"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_signup_sets_cookie_and_returns_user() {
        let (app, _) = test_app();
        let reply = call(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"email": " Ann@Example.com", "password": "pw", "name": "Ann"})),
        )
        .await;

        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "User created successfully");
        assert_eq!(reply.body["user"]["email"], "ann@example.com");
        assert_eq!(reply.body["user"]["name"], "Ann");
        assert!(reply.body["user"].get("password_hash").is_none());

        let token = reply.body["token"].as_str().unwrap();
        let cookie = reply.headers[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(&format!("session={};", token)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=604800"));
    }

    #[tokio::test]
    async fn test_signup_validation() {
        let (app, _) = test_app();

        let reply = call(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"email": "ann@example.com", "password": "pw"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["error"], "Missing required fields");

        let reply = call(&app, "POST", "/api/auth/signup", None, None).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);

        signup(&app, "ann@example.com").await;
        let reply = call(
            &app,
            "POST",
            "/api/auth/signup",
            None,
            Some(json!({"email": "ANN@example.com", "password": "x", "name": "Other"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["error"], "User already exists");
    }

    #[tokio::test]
    async fn test_login() {
        let (app, _) = test_app();
        signup(&app, "ann@example.com").await;

        let reply = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "ann@example.com", "password": "pw"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "Login successful");
        assert!(reply.headers.contains_key(header::SET_COOKIE));

        let reply = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "ann@example.com", "password": "nope"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["error"], "Invalid credentials");

        let reply = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "bob@example.com", "password": "pw"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["error"], "Invalid credentials");

        let reply = call(
            &app,
            "POST",
            "/api/auth/login",
            None,
            Some(json!({"email": "ann@example.com"})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
        assert_eq!(reply.body["error"], "Missing email or password");
    }

    #[tokio::test]
    async fn test_me() {
        let (app, _) = test_app();

        let reply = call(&app, "GET", "/api/auth/me", None, None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["error"], "Not authenticated");

        let reply = call(&app, "GET", "/api/auth/me", Some("bogus"), None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
        assert_eq!(reply.body["error"], "Invalid session");

        let token = signup(&app, "ann@example.com").await;
        let reply = call(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["user"]["email"], "ann@example.com");
    }

    #[tokio::test]
    async fn test_me_after_user_removed() {
        let (app, store) = test_app();
        let token = signup(&app, "ann@example.com").await;

        UserStore::new(store)
            .remove("ann@example.com")
            .await
            .unwrap();

        let reply = call(&app, "GET", "/api/auth/me", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::NOT_FOUND);
        assert_eq!(reply.body["error"], "User not found");
    }

    #[tokio::test]
    async fn test_session_cookie_is_accepted() {
        let (app, _) = test_app();
        let token = signup(&app, "ann@example.com").await;

        let request = Request::builder()
            .uri("/api/auth/me")
            .header(header::COOKIE, format!("session={}", token))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_logout_ends_session() {
        let (app, _) = test_app();
        let token = signup(&app, "ann@example.com").await;

        let reply = call(&app, "POST", "/api/auth/logout", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "Logged out successfully");
        let cookie = reply.headers[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.contains("Max-Age=0"));

        let reply = call(&app, "GET", "/api/workouts", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

        // Logging out without a session still succeeds.
        let reply = call(&app, "POST", "/api/auth/logout", None, None).await;
        assert_eq!(reply.status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_workouts_require_session() {
        let (app, _) = test_app();

        let reply = call(&app, "GET", "/api/workouts", None, None).await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);

        let reply = call(
            &app,
            "POST",
            "/api/workouts",
            Some("bogus"),
            Some(json!({"workouts": []})),
        )
        .await;
        assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_workouts_round_trip() {
        let (app, _) = test_app();
        let token = signup(&app, "ann@example.com").await;

        let reply = call(&app, "GET", "/api/workouts", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, json!({"workouts": []}));

        let workouts = json!([{"id": "w1", "name": "Legs", "exercises": []}]);
        let reply = call(
            &app,
            "POST",
            "/api/workouts",
            Some(&token),
            Some(json!({ "workouts": workouts })),
        )
        .await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body["message"], "Workouts saved successfully");

        let reply = call(&app, "GET", "/api/workouts", Some(&token), None).await;
        assert_eq!(reply.body["workouts"], workouts);
    }

    #[tokio::test]
    async fn test_save_without_workouts_field() {
        let (app, _) = test_app();
        let token = signup(&app, "ann@example.com").await;

        let reply = call(&app, "POST", "/api/workouts", Some(&token), Some(json!({}))).await;
        assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_users_are_isolated() {
        let (app, _) = test_app();
        let ann = signup(&app, "ann@example.com").await;
        let bob = signup(&app, "bob@example.com").await;

        call(
            &app,
            "POST",
            "/api/workouts",
            Some(&ann),
            Some(json!({"workouts": [{"id": "w1", "name": "Legs", "exercises": []}]})),
        )
        .await;

        let reply = call(&app, "GET", "/api/workouts", Some(&bob), None).await;
        assert_eq!(reply.body, json!({"workouts": []}));
    }

    #[tokio::test]
    async fn test_unreadable_stored_workouts_read_as_empty() {
        let (app, store) = test_app();
        let token = signup(&app, "ann@example.com").await;
        let me = call(&app, "GET", "/api/auth/me", Some(&token), None).await;
        let user_id = me.body["user"]["id"].as_str().unwrap().to_string();

        store.set(&keys::workouts(&user_id), "{oops").await.unwrap();
        let reply = call(&app, "GET", "/api/workouts", Some(&token), None).await;
        assert_eq!(reply.status, StatusCode::OK);
        assert_eq!(reply.body, json!({"workouts": []}));

        store
            .set(&keys::workouts(&user_id), r#"{"not":"a list"}"#)
            .await
            .unwrap();
        let reply = call(&app, "GET", "/api/workouts", Some(&token), None).await;
        assert_eq!(reply.body, json!({"workouts": []}));
    }
}
