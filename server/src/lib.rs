pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod models;
pub mod policy;
pub mod recipe;
pub mod schema;
pub mod services;
pub mod store;
pub mod telemetry;

use axum::extract::MatchedPath;
use axum::http::Request;
use axum::Router;
use chrono::Duration;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::Span;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::SessionManager;
use crate::config::Config;
use crate::services::{AuthService, RecipeService, UserService};
use crate::store::Store;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub users: Arc<UserService>,
    pub recipes: Arc<RecipeService>,
    pub sessions: Arc<SessionManager>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        let sessions = Arc::new(SessionManager::new(
            &config.jwt_secret,
            Duration::seconds(config.session_ttl_secs),
            config.cookie_secure,
        ));
        Self {
            auth: Arc::new(AuthService::new(store.clone(), sessions.clone())),
            users: Arc::new(UserService::new(
                store.clone(),
                config.delete_recipes_with_user,
            )),
            recipes: Arc::new(RecipeService::new(store)),
            sessions,
        }
    }
}

/// Health probe spans are trace-level, so under the usual filters they are
/// disabled outright and carry no metadata at all.
fn is_quiet(span: &Span) -> bool {
    span.is_disabled() || span.metadata().map(|m| *m.level()) == Some(tracing::Level::TRACE)
}

/// Builds the full router: API routes, Swagger UI and request tracing.
pub fn app(state: AppState) -> Router {
    let swagger_ui = SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api::openapi());

    Router::new()
        .merge(api::public::router())
        .merge(api::users::router())
        .merge(api::recipes::router())
        .with_state(state)
        .merge(swagger_ui)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let matched_path = request
                        .extensions()
                        .get::<MatchedPath>()
                        .map(MatchedPath::as_str)
                        .unwrap_or(request.uri().path());

                    // Health probes are too frequent to log
                    if matched_path == "/api/health" {
                        tracing::trace_span!("http_request")
                    } else {
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            path = %matched_path,
                        )
                    }
                })
                .on_request(|_request: &Request<_>, _span: &Span| {})
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        if is_quiet(span) {
                            return;
                        }
                        let status = response.status().as_u16();
                        if status >= 500 {
                            tracing::error!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request failed with server error"
                            );
                        } else {
                            tracing::info!(
                                status = %status,
                                latency_ms = %latency.as_millis(),
                                "request completed"
                            );
                        }
                    },
                )
                .on_failure(
                    |error: tower_http::classify::ServerErrorsFailureClass,
                     latency: std::time::Duration,
                     _span: &Span| {
                        tracing::error!(
                            error = %error,
                            latency_ms = %latency.as_millis(),
                            "request failed"
                        );
                    },
                ),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;

    fn with_max_level<T>(level: Level, f: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::fmt().with_max_level(level).finish();
        tracing::subscriber::with_default(subscriber, f)
    }

    #[test]
    fn test_health_span_is_quiet_at_default_level() {
        with_max_level(Level::INFO, || {
            assert!(is_quiet(&tracing::trace_span!("http_request")));
            assert!(!is_quiet(&tracing::info_span!("http_request")));
        });
    }

    #[test]
    fn test_health_span_is_quiet_when_trace_enabled() {
        with_max_level(Level::TRACE, || {
            let span = tracing::trace_span!("http_request");
            assert!(!span.is_disabled());
            assert!(is_quiet(&span));
            assert!(!is_quiet(&tracing::info_span!("http_request")));
        });
    }
}
