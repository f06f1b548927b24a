use std::sync::Arc;

use anyhow::Result;
use axum::{
    routing::{get, patch, post},
    Router,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use civitas_common::Config;
use civitas_notify::{Notifier, NotifyConfig};
use civitas_store::{
    AssignmentRouter, ComplaintReader, ComplaintWriter, RoutingTable, SimilarityMatcher,
    StoreClient, ZoneAggregator, ZoneThresholds,
};

mod auth;
mod error;
mod rest;

use auth::JwtService;

pub struct AppState {
    pub reader: ComplaintReader,
    pub writer: ComplaintWriter,
    pub matcher: SimilarityMatcher,
    pub router: AssignmentRouter,
    pub zones: ZoneAggregator,
    pub notifier: Notifier,
    pub jwt: JwtService,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("civitas=info".parse()?))
        .init();

    let config = Config::from_env();

    let client = StoreClient::connect(&config.database_url).await?;
    client.migrate().await?;

    let reader = ComplaintReader::new(client.clone());
    let thresholds = ZoneThresholds {
        red_above: config.zone_red_above,
        elevated_above: config.zone_elevated_above,
    };

    let state = Arc::new(AppState {
        reader: reader.clone(),
        writer: ComplaintWriter::new(client.clone()),
        matcher: SimilarityMatcher::new(client),
        router: AssignmentRouter::new(RoutingTable::default()),
        zones: ZoneAggregator::new(reader, thresholds),
        notifier: Notifier::new(NotifyConfig::from_config(&config)),
        jwt: JwtService::new(&config.jwt_secret, config.jwt_issuer.clone()),
    });

    let app = Router::new()
        // Health check
        .route("/", get(|| async { "ok" }))
        // Citizen surface
        .route("/api/complaints", post(rest::complaints::create_complaint))
        .route("/api/complaints/mine", get(rest::complaints::my_complaints))
        .route("/api/complaints/similar", get(rest::complaints::similar_complaints))
        .route("/api/complaints/local", get(rest::complaints::local_complaints))
        .route("/api/complaints/stats/city", get(rest::complaints::city_stats))
        .route("/api/complaints/{id}", get(rest::complaints::complaint_detail))
        .route("/api/complaints/{id}/reraise", post(rest::complaints::reraise_complaint))
        .route("/api/complaints/{id}/support", post(rest::complaints::support_complaint))
        .route("/api/complaints/{id}/resolution", post(rest::complaints::submit_resolution))
        .route("/api/complaints/{id}/feedback", post(rest::complaints::submit_feedback))
        // Administrator surface
        .route("/api/admin/complaints", get(rest::admin::all_complaints))
        .route(
            "/api/admin/complaints/{id}",
            get(rest::admin::complaint_detail).delete(rest::admin::delete_complaint),
        )
        .route("/api/admin/complaints/{id}/assign", post(rest::admin::assign_complaint))
        .route("/api/admin/complaints/{id}/status", patch(rest::admin::update_status))
        .route("/api/admin/complaints/{id}/photos", post(rest::admin::record_photo))
        // Zone map
        .route("/api/zones/map", get(rest::zones::zone_map))
        .with_state(state)
        // CORS
        .layer(
            tower_http::cors::CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods(tower_http::cors::Any)
                .allow_headers(tower_http::cors::Any),
        )
        // Logging layer: method + path + status + latency only
        .layer(
            tower_http::trace::TraceLayer::new_for_http().make_span_with(
                |request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                    )
                },
            ),
        );

    let addr = format!("{}:{}", config.api_host, config.api_port);
    info!("CIVITAS API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
