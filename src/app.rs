use crate::handlers::{self, AppState};
use crate::middleware::{payment_gate_layer, PaymentGate};
use axum::{
    extract::Request,
    middleware::{self as axum_middleware, Next},
    routing::{get, post, MethodRouter},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

// One gated route: the payment middleware runs in front of the handler with
// the service id baked in.
fn priced(
    path: &str,
    service: &'static str,
    method_router: MethodRouter<AppState>,
    gate: Arc<PaymentGate>,
) -> Router<AppState> {
    Router::new().route(
        path,
        method_router.layer(axum_middleware::from_fn({
            let gate = gate.clone();
            move |req: Request, next: Next| {
                let gate = gate.clone();
                async move { payment_gate_layer(gate, service, req, next).await }
            }
        })),
    )
}

pub fn router(state: AppState, gate: Arc<PaymentGate>) -> Router {
    Router::new()
        // Free endpoints
        .route("/health", get(handlers::health_check))
        .route("/api/info", get(handlers::service_info))
        .route("/api/verify", post(handlers::verify_payment))
        .route("/api/balance", get(handlers::get_balance))
        // Payment-gated endpoints
        .merge(priced("/api/weather", "weather", get(handlers::weather), gate.clone()))
        .merge(priced("/api/crypto", "crypto", get(handlers::crypto), gate.clone()))
        .merge(priced("/api/news", "news", get(handlers::news), gate.clone()))
        .merge(priced("/api/geo", "geo", get(handlers::geo), gate.clone()))
        .merge(priced("/api/tts", "tts", get(handlers::tts), gate.clone()))
        .merge(priced("/api/memory", "memory", get(handlers::memory), gate.clone()))
        .merge(priced("/api/premium", "premium", get(handlers::premium), gate))
        // Global middleware
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
