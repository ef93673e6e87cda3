//! Route table.

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use axum::routing::{get, post, put};
use billsync_core::repository::Backend;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::*;
use crate::state::AppState;

/// Build the router with every route and request tracing.
pub fn router<B: Backend>(state: AppState<B>) -> Router {
    Router::new()
        .route("/health", get(health))
        // Customers
        .route("/v1/customers", post(create_customer::<B>))
        .route(
            "/v1/customers/by-company",
            get(get_customer_by_company::<B>).put(update_customer_by_company::<B>),
        )
        .route(
            "/v1/customers/:id",
            get(get_customer::<B>).put(update_customer::<B>),
        )
        // Charges
        .route(
            "/v1/charges",
            post(create_charge::<B>).get(list_charges::<B>),
        )
        .route(
            "/v1/charges/:id",
            get(get_charge::<B>)
                .put(update_charge::<B>)
                .delete(delete_charge::<B>),
        )
        .route("/v1/charges/:id/digitable-line", get(digitable_line::<B>))
        .route("/v1/charges/:id/pix-qrcode", get(pix_qr_code::<B>))
        // Provider notifications
        .route("/webhook", post(webhook::<B>))
        .route("/asaas/feecharges", post(webhook::<B>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// CORS policy for the configured origins. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(
            origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::ACCEPT,
            header::AUTHORIZATION,
        ])
}
