//! HTTP entry point for the clothes shop account demo.
//!
//! # Responsibility
//! - Expose register/login/logout/me as a small JSON API over the
//!   SQLite-backed store.
//! - Carry the session token in an `sid` cookie (`HttpOnly`, path-scoped).
//!
//! All business rules live in `shopauth_core`; handlers only translate
//! between HTTP and service outcomes. Password hashing runs on the blocking
//! pool so PBKDF2 never stalls the request loop.

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Deserialize;
use shopauth_core::db::open_db;
use shopauth_core::{
    default_log_level, init_logging, CredentialService, LoginError, LoginRequest, RegisterError,
    RegisterRequest, SessionRegistry, SqliteUserStore, UserStore,
};
use std::sync::Arc;

const SESSION_COOKIE: &str = "sid";
const DEFAULT_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_DB_PATH: &str = "shopauth.db";

#[derive(Clone)]
struct AppState {
    service: Arc<CredentialService<SqliteUserStore>>,
    sessions: Arc<SessionRegistry>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(log_dir) = log_dir() {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("warning: logging disabled: {err}");
        }
    }

    let db_path = std::env::var("SHOPAUTH_DB").unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());
    let conn = open_db(&db_path)?;
    let state = AppState {
        service: Arc::new(CredentialService::new(SqliteUserStore::new(conn))),
        sessions: Arc::new(SessionRegistry::new()),
    };

    let app = Router::new()
        .route("/api/register", post(handle_register))
        .route("/api/login", post(handle_login))
        .route("/api/logout", post(handle_logout))
        .route("/api/me", get(handle_me))
        .with_state(state);

    let addr = std::env::var("SHOPAUTH_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("event=server_start module=server status=ok addr={addr} db={db_path}");

    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
struct RegisterBody {
    name: Option<String>,
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

async fn handle_register(
    State(state): State<AppState>,
    Json(body): Json<RegisterBody>,
) -> Response {
    let service = Arc::clone(&state.service);
    let request = RegisterRequest {
        key: body.email.trim().to_string(),
        name: body.name.map(|name| name.trim().to_string()),
        email: None,
        password: body.password,
    };

    let outcome = tokio::task::spawn_blocking(move || service.register(&request)).await;
    match outcome {
        Ok(Ok(user)) => {
            let token = state.sessions.create(user.id);
            (
                StatusCode::CREATED,
                [(header::SET_COOKIE, session_cookie(&token))],
                Json(serde_json::json!({ "user": user.to_view() })),
            )
                .into_response()
        }
        Ok(Err(err)) => register_error_response(&err),
        Err(err) => {
            error!("event=register module=server status=error error=join:{err}");
            internal_error()
        }
    }
}

async fn handle_login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Response {
    let service = Arc::clone(&state.service);
    let request = LoginRequest {
        key: body.email.trim().to_string(),
        password: body.password,
    };

    let outcome = tokio::task::spawn_blocking(move || service.login(&request)).await;
    match outcome {
        Ok(Ok(user)) => {
            let token = state.sessions.create(user.id);
            (
                StatusCode::OK,
                [(header::SET_COOKIE, session_cookie(&token))],
                Json(serde_json::json!({ "user": user.to_view() })),
            )
                .into_response()
        }
        Ok(Err(err)) => login_error_response(&err),
        Err(err) => {
            error!("event=login module=server status=error error=join:{err}");
            internal_error()
        }
    }
}

async fn handle_logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        state.sessions.destroy(&token);
    }
    // Destroying an unknown or absent session is a no-op; the cookie is
    // cleared either way.
    (
        StatusCode::NO_CONTENT,
        [(header::SET_COOKIE, clear_session_cookie())],
    )
        .into_response()
}

async fn handle_me(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let Some(token) = session_token(&headers) else {
        return unauthorized();
    };
    let Some(user_id) = state.sessions.resolve(&token) else {
        return unauthorized();
    };

    match state.service.store().find_by_id(user_id) {
        Ok(Some(user)) => Json(serde_json::json!({ "user": user.to_view() })).into_response(),
        Ok(None) => unauthorized(),
        Err(err) => {
            error!("event=me module=server status=error error={err}");
            internal_error()
        }
    }
}

fn register_error_response(err: &RegisterError) -> Response {
    let status = match err {
        RegisterError::MissingFields
        | RegisterError::WeakPassword
        | RegisterError::InvalidEmail => StatusCode::BAD_REQUEST,
        RegisterError::DuplicateKey => StatusCode::CONFLICT,
        RegisterError::Store(store_err) => {
            error!("event=register module=server status=error error={store_err}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(serde_json::json!({ "error": err.to_string() }))).into_response()
}

fn login_error_response(err: &LoginError) -> Response {
    match err {
        LoginError::InvalidCredentials => (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": err.to_string() })),
        )
            .into_response(),
        LoginError::Store(store_err) => {
            error!("event=login module=server status=error error={store_err}");
            internal_error()
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "not signed in" })),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({ "error": "account storage is unavailable, try again" })),
    )
        .into_response()
}

fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/")
}

fn clear_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

/// Extracts the `sid` value from the request `Cookie` header, if present.
fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

fn log_dir() -> Option<String> {
    let dir = std::env::current_dir().ok()?.join("logs");
    Some(dir.to_str()?.to_string())
}

#[cfg(test)]
mod tests {
    use super::{clear_session_cookie, session_cookie, session_token};
    use axum::http::{header, HeaderMap, HeaderValue};

    #[test]
    fn session_cookie_is_http_only_and_path_scoped() {
        let cookie = session_cookie("abc123");
        assert!(cookie.starts_with("sid=abc123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Path=/"));
    }

    #[test]
    fn clear_cookie_expires_immediately() {
        let cookie = clear_session_cookie();
        assert!(cookie.starts_with("sid=;"));
        assert!(cookie.contains("Max-Age=0"));
    }

    #[test]
    fn session_token_parses_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; sid=deadbeef; lang=en"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("deadbeef"));
    }

    #[test]
    fn session_token_absent_when_no_cookie() {
        let headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(session_token(&headers), None);
    }
}
