use std::sync::Arc;

use aide::{
    axum::{
        routing::{get, get_with},
        ApiRouter, IntoApiResponse,
    },
    openapi::{OpenApi, Tag},
    redoc::Redoc,
    transform::TransformOpenApi,
};
use axum::{response::IntoResponse, Extension, Json};

pub fn api_docs(api: TransformOpenApi) -> TransformOpenApi {
    api.title("coop-pay")
        .summary("Credit cooperative back office")
        .tag(Tag {
            name: "auth".into(),
            description: Some("Session management".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "members".into(),
            description: Some("Member and staff administration".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "membership".into(),
            description: Some("Membership application pipeline".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "loans".into(),
            description: Some("Loan application review pipeline".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "accounts".into(),
            description: Some("Member accounts".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "transactions".into(),
            description: Some("Account ledger".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "payment-references".into(),
            description: Some("Proof-of-payment confirmation".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "invoices".into(),
            description: Some("Invoices".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "payments".into(),
            description: Some("External payment gateway".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "dashboard".into(),
            description: Some("Role specific counters".into()),
            ..Default::default()
        })
        .tag(Tag {
            name: "files".into(),
            description: Some("Uploaded documents".into()),
            ..Default::default()
        })
        .security_scheme(
            "SessionToken",
            aide::openapi::SecurityScheme::Http {
                scheme: "bearer".into(),
                bearer_format: Some("opaque".into()),
                description: Some("Session token issued by POST /api/v1/auth/password.".into()),
                extensions: Default::default(),
            },
        )
}

pub fn docs_routes() -> ApiRouter {
    aide::gen::infer_responses(true);

    let router = ApiRouter::new()
        .api_route_with(
            "/",
            get_with(
                Redoc::new("/docs/api.json")
                    .with_title("coop-pay")
                    .axum_handler(),
                |op| op.description("This documentation page."),
            ),
            |p| p.security_requirement("SessionToken"),
        )
        .route("/api.json", get(serve_docs));

    aide::gen::infer_responses(false);

    router
}

async fn serve_docs(Extension(api): Extension<Arc<OpenApi>>) -> impl IntoApiResponse {
    Json(api).into_response()
}
