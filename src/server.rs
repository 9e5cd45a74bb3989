use std::sync::Arc;

use aide::axum::ApiRouter;
use aide::openapi::OpenApi;
use axum::http::Method;
use axum::routing::get;
use axum::{Extension, Json};
use log::{error, info};
use tower_http::cors::{Any, CorsLayer};

use crate::database::AppState;
use crate::error::ServiceResult;
use crate::{api, docs, env};

fn api_v1(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .merge(api::auth::router(app_state.clone()))
        .merge(api::members::router(app_state.clone()))
        .merge(api::membership_applications::router(app_state.clone()))
        .merge(api::loan_applications::router(app_state.clone()))
        .merge(api::accounts::router(app_state.clone()))
        .merge(api::transactions::router(app_state.clone()))
        .merge(api::payment_references::router(app_state.clone()))
        .merge(api::invoices::router(app_state.clone()))
        .merge(api::payments::router(app_state.clone()))
        .merge(api::dashboard::router(app_state.clone()))
        .merge(api::files::router(app_state))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "coop-pay",
        "status": "ok",
        "routes": [
            "/api/v1/auth",
            "/api/v1/members",
            "/api/v1/membership-applications",
            "/api/v1/loan-applications",
            "/api/v1/accounts",
            "/api/v1/transactions",
            "/api/v1/payment-references",
            "/api/v1/invoices",
            "/api/v1/payments/checkout",
            "/api/v1/dashboard",
            "/docs",
        ],
    }))
}

pub async fn start_server(app_state: AppState) -> ServiceResult<()> {
    aide::gen::on_error(|err| {
        error!("{err}");
    });
    aide::gen::extract_schemas(true);

    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
        ])
        .allow_headers(Any)
        .allow_origin(Any);

    let mut open_api = OpenApi::default();

    let router = ApiRouter::new()
        .nest_api_service("/api/v1", api_v1(app_state))
        .nest_api_service("/docs", docs::docs_routes())
        .route("/", get(health))
        .finish_api_with(&mut open_api, docs::api_docs)
        .layer(Extension(Arc::new(open_api)))
        .layer(cors);

    let address = format!("{}:{}", env::HOST.as_str(), *env::HTTP_PORT);
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("Listening on {address}");

    axum::serve(listener, router.into_make_service()).await?;
    Ok(())
}
