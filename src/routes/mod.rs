pub mod health;
pub mod submissions;
pub mod surveys;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth::require_bearer_auth,
    cors::api_cors,
    rate_limit::{limit_requests, RateLimiter},
};
use crate::AppState;

const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Full HTTP surface: public registration plus the bearer-protected
/// survey API, throttled to `rps` requests per second.
pub fn api_router(state: AppState, rps: u32) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/api/signup", post(users::sign_up));

    let protected = Router::new()
        .route(
            "/api/surveys",
            get(surveys::list_published).post(surveys::create_survey),
        )
        .route("/api/surveys/mine/unpublished", get(surveys::my_unpublished))
        .route(
            "/api/surveys/mine/unpublished/:id",
            get(surveys::my_unpublished_detail),
        )
        .route("/api/surveys/:id", get(surveys::published_detail))
        .route("/api/surveys/:id/title", patch(surveys::update_title))
        .route("/api/surveys/:id/publish", post(surveys::publish))
        .route("/api/surveys/:id/questions", post(surveys::add_question))
        .route(
            "/api/surveys/:id/questions/:question_id",
            put(surveys::update_question),
        )
        .route(
            "/api/surveys/:id/responses",
            post(submissions::submit_responses),
        )
        .route_layer(from_fn_with_state(state.keys.clone(), require_bearer_auth));

    public
        .merge(protected)
        .layer(from_fn_with_state(RateLimiter::new(rps), limit_requests))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
        .layer(api_cors())
        .layer(TraceLayer::new_for_http())
}
