use aide::axum::routing::post_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::payment_gateway::{CheckoutRequest, PaymentGateway};
use crate::request_state::RequestState;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/payments/checkout",
            post_with(create_checkout, create_checkout_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateCheckoutDto {
    /// Positive amount in currency units.
    pub amount: f64,
    pub description: Option<String>,
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct CheckoutDto {
    pub checkout_id: String,
    pub checkout_url: String,
}

/// Proxies the checkout to the external gateway. Nothing is stored locally;
/// the resulting payment comes back through the payment reference flow.
async fn create_checkout(
    mut state: RequestState,
    form: Json<CreateCheckoutDto>,
) -> ServiceResult<Json<CheckoutDto>> {
    let member = state.session_require_member()?;
    let form = form.0;

    if !form.amount.is_finite() || form.amount <= 0.0 {
        return Err(ServiceError::BadRequest(
            "Amount must be a finite positive number".to_string(),
        ));
    }
    let amount_cents = (form.amount * 100.0).round() as i64;
    if amount_cents <= 0 {
        return Err(ServiceError::BadRequest(
            "Amount must be a finite positive number".to_string(),
        ));
    }

    let gateway = PaymentGateway::new()?;
    let response = gateway
        .create_checkout(&CheckoutRequest {
            member_number: member.member_number,
            amount_cents,
            description: form.description.unwrap_or_default(),
        })
        .await?;

    Ok(Json(CheckoutDto {
        checkout_id: response.checkout_id,
        checkout_url: response.checkout_url,
    }))
}

fn create_checkout_docs(op: TransformOperation) -> TransformOperation {
    op.description("Create a checkout at the external payment gateway.")
        .tag("payments")
        .response::<200, Json<CheckoutDto>>()
        .response_with::<400, (), _>(|res| res.description("Invalid amount!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<502, (), _>(|res| res.description("The payment gateway rejected the request!"))
        .security_requirement_scopes("SessionToken", ["self"])
}
