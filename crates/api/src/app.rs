use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use domain::outcome::{CheckInFailure, FailureCode};
use domain::services::authorization::is_marker;
use domain::services::checkin::{CheckInConfig, CheckInService};
use persistence::repositories::{AttendanceRepository, EventRepository, RosterRepository};
use shared::clock::SystemClock;
use shared::token::TokenCodec;

use crate::config::Config;
use crate::error::ApiError;
use crate::middleware::{metrics_handler, metrics_middleware, trace_id};
use crate::routes::{attendance, events, health};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub engine: Arc<CheckInService>,
    pub events: EventRepository,
    pub attendance: AttendanceRepository,
    pub roster: RosterRepository,
}

impl AppState {
    /// Rejects callers not qualified to act on other participants'
    /// records (issue tokens, list attendance, remove records).
    pub async fn require_marker_role(
        &self,
        team_id: &str,
        participant_id: &str,
    ) -> Result<(), ApiError> {
        let qualified = is_marker(&self.roster, team_id, participant_id)
            .await
            .map_err(|e| {
                ApiError::CheckIn(CheckInFailure::new(
                    FailureCode::StoreUnavailable,
                    e.to_string(),
                ))
            })?;

        if qualified {
            Ok(())
        } else {
            Err(ApiError::CheckIn(CheckInFailure::new(
                FailureCode::PermissionDenied,
                "Caller is not allowed to manage attendance for this team",
            )))
        }
    }
}

pub fn create_app(config: Config, pool: PgPool) -> Router {
    let config = Arc::new(config);

    let events = EventRepository::new(pool.clone());
    let attendance = AttendanceRepository::new(pool.clone());
    let roster = RosterRepository::new(pool.clone());

    let engine = Arc::new(CheckInService::new(
        Arc::new(events.clone()),
        Arc::new(attendance.clone()),
        Arc::new(roster.clone()),
        Arc::new(SystemClock),
        TokenCodec::new(&config.checkin.token_secret),
        CheckInConfig {
            default_radius_m: config.checkin.default_radius_m,
            grace_minutes: config.checkin.grace_minutes,
            credential_cache_ttl_secs: config.checkin.credential_cache_ttl_secs,
            scan_token_slack_minutes: config.checkin.scan_token_slack_minutes,
        },
    ));

    let state = AppState {
        pool,
        config: config.clone(),
        engine,
        events,
        attendance,
        roster,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Versioned API routes; caller identity comes from the trusted
    // header extractor in each handler.
    let api_routes = Router::new()
        .route("/api/v1/attendance/check-in", post(attendance::check_in))
        .route("/api/v1/attendance/check-out", post(attendance::check_out))
        .route(
            "/api/v1/attendance/:record_id",
            delete(attendance::delete_record),
        )
        .route(
            "/api/v1/events/:event_ref/scan-token",
            post(events::issue_scan_token),
        )
        .route(
            "/api/v1/events/:event_ref/attendance",
            get(events::list_attendance),
        );

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
