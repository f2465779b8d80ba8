//! Chatbot conversation API - Library exports for the binary and tests

pub mod api;
pub mod config;
pub mod core;
pub mod infrastructure;

use crate::config::Settings;
use crate::core::services::DefaultConversationService;
use crate::infrastructure::chatbot::HttpChatbotClient;
use crate::infrastructure::database::DatabaseConnection;
use crate::infrastructure::repositories::{DbConversationRepository, DbMessageRepository};
use axum::Router;
use axum::http::{HeaderValue, Method};
use di::{Injectable, Ref, ServiceCollection, ServiceProvider, singleton_factory};
use di_axum::RouterServiceProviderExtensions;
use log::warn;
use sqlx::SqlitePool;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Registers everything the HTTP handlers resolve.
///
/// Settings, the pool and the chatbot client live for the whole process; repositories
/// and the conversation service are created per request.
pub fn services(settings: Settings, pool: SqlitePool) -> ServiceCollection {
    let mut services = ServiceCollection::new();
    services
        .add(singleton_factory(move |_| Ref::new(settings.clone())))
        .add(singleton_factory(move |_| {
            Ref::new(DatabaseConnection::new(pool.clone()))
        }))
        .add(HttpChatbotClient::singleton())
        .add(DbConversationRepository::scoped())
        .add(DbMessageRepository::scoped())
        .add(DefaultConversationService::scoped());
    services
}

/// Builds the application router with CORS, request tracing and the DI provider attached.
pub fn app(provider: ServiceProvider, cors_allowed_origins: &[String]) -> Router {
    api::router()
        .layer(cors_layer(cors_allowed_origins))
        .layer(TraceLayer::new_for_http())
        .with_provider(provider)
}

/// A `*` entry allows every origin; otherwise only the listed origins are allowed.
fn cors_layer(cors_allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if cors_allowed_origins.iter().any(|origin| origin == "*") {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = cors_allowed_origins
            .iter()
            .filter_map(|origin| match origin.parse::<HeaderValue>() {
                Ok(origin) => Some(origin),
                Err(_) => {
                    warn!("ignoring invalid CORS origin `{origin}`");
                    None
                }
            })
            .collect();
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_headers(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_origin(allow_origin)
}
