//! HTTP API Layer
//!
//! REST surface of the motor insurance workflow, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one module per document type, each delegating to the
//!   workflow or vehicle service
//! - **Middleware**: bearer authentication and audit logging with
//!   correlation ids
//! - **DTOs**: request and response bodies
//! - **Error Handling**: every domain error maps to one HTTP status
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::new(store, registry, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::DocumentStore;
use domain_vehicle::{RcRegistryPort, VerificationService};
use domain_workflow::{StoreProcedures, WorkflowService};

use crate::config::ApiConfig;
use crate::handlers::{claims, health, payments, plans, policies, proposals, vehicles};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub workflow: Arc<WorkflowService>,
    pub vehicles: Arc<VerificationService>,
    pub config: ApiConfig,
}

impl AppState {
    /// Wires the services over one document store
    pub fn new(
        store: Arc<dyn DocumentStore>,
        registry: Arc<dyn RcRegistryPort>,
        config: ApiConfig,
    ) -> Self {
        let procedures = Arc::new(StoreProcedures::new(store.clone()));
        let workflow = Arc::new(
            WorkflowService::new(store.clone(), procedures).with_claim_limits(config.claims.clone()),
        );
        let vehicles = Arc::new(
            VerificationService::new(store.clone(), registry)
                .with_timeout(Duration::from_secs(config.registry.timeout_secs)),
        );
        Self {
            store,
            workflow,
            vehicles,
            config,
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let proposal_routes = Router::new()
        .route("/:name/actions", get(proposals::actions))
        .route("/:name/submit-for-review", post(proposals::submit_for_review))
        .route("/:name/approve", post(proposals::approve))
        .route("/:name/reject", post(proposals::reject))
        .route("/:name/record-payment", post(proposals::record_payment))
        .route("/:name/convert-to-policy", post(proposals::convert_to_policy));

    let policy_routes = Router::new()
        .route("/:name/actions", get(policies::actions))
        .route("/:name/payments", post(policies::record_payment))
        .route("/:name/cancel", post(policies::cancel))
        .route("/:name/claims", post(policies::create_claim));

    let claim_routes = Router::new()
        .route("/survey-assignments", post(claims::assign_surveyor))
        .route("/:name/actions", get(claims::actions))
        .route("/:name/settlement", post(claims::create_settlement))
        .route("/:name/status", post(claims::advance));

    let payment_routes = Router::new().route("/:name/submit", post(payments::submit));

    let vehicle_routes = Router::new()
        .route("/:name", patch(vehicles::update))
        .route("/:name/verify-rc", post(vehicles::verify_rc));

    let plan_routes = Router::new().route("/:name/premium-quote", post(plans::quote));

    let api_routes = Router::new()
        .nest("/proposals", proposal_routes)
        .nest("/policies", policy_routes)
        .nest("/claims", claim_routes)
        .nest("/payments", payment_routes)
        .nest("/vehicles", vehicle_routes)
        .nest("/plans", plan_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
