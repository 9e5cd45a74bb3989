use aide::axum::routing::{get_with, post_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Multipart, Path, Query};
use axum::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{self, PaymentReferenceStatus, Subject};
use crate::permissions::Operation;
use crate::request_state::RequestState;

use super::{coerce_amount_cents, store_upload};

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/payment-references",
            get_with(list_references, list_references_docs)
                .post_with(submit_reference, submit_reference_docs),
        )
        .api_route(
            "/payment-reference/:id",
            get_with(get_reference, get_reference_docs),
        )
        .api_route(
            "/payment-reference/:id/resolve",
            post_with(resolve_reference, resolve_reference_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub enum PaymentReferenceStatusDto {
    Pending,
    Confirmed,
    Rejected,
}

impl From<&PaymentReferenceStatus> for PaymentReferenceStatusDto {
    fn from(value: &PaymentReferenceStatus) -> Self {
        match value {
            PaymentReferenceStatus::Pending => PaymentReferenceStatusDto::Pending,
            PaymentReferenceStatus::Confirmed => PaymentReferenceStatusDto::Confirmed,
            PaymentReferenceStatus::Rejected => PaymentReferenceStatusDto::Rejected,
        }
    }
}

impl From<PaymentReferenceStatusDto> for PaymentReferenceStatus {
    fn from(value: PaymentReferenceStatusDto) -> Self {
        match value {
            PaymentReferenceStatusDto::Pending => PaymentReferenceStatus::Pending,
            PaymentReferenceStatusDto::Confirmed => PaymentReferenceStatus::Confirmed,
            PaymentReferenceStatusDto::Rejected => PaymentReferenceStatus::Rejected,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct PaymentReferenceDto {
    pub id: u64,
    pub member_id: u64,
    pub image_path: String,
    pub reference_text: Option<String>,
    pub amount: Option<f64>,
    pub status: PaymentReferenceStatusDto,
    pub confirmed_by: Option<u64>,
    pub notes: Option<String>,
    pub resolved_at: Option<String>,
    pub submitted_at: String,
}

impl From<&models::PaymentReference> for PaymentReferenceDto {
    fn from(value: &models::PaymentReference) -> Self {
        Self {
            id: value.id.to_owned(),
            member_id: value.member_id.to_owned(),
            image_path: value.image_path.to_owned(),
            reference_text: value.reference_text.to_owned(),
            amount: value.amount_cents.map(|c| c as f64 / 100.0),
            status: (&value.status).into(),
            confirmed_by: value.confirmed_by.to_owned(),
            notes: value.notes.to_owned(),
            resolved_at: value.resolved_at.map(|t| format!("{t:?}")),
            submitted_at: format!("{:?}", value.submitted_at),
        }
    }
}

/// Member upload: a proof-of-payment image plus optional reference text
/// and amount. The image is mandatory.
async fn submit_reference(
    mut state: RequestState,
    mut multipart: Multipart,
) -> ServiceResult<Json<PaymentReferenceDto>> {
    let member = state.session_require_member()?;

    let mut image_path = None;
    let mut reference_text = None;
    let mut amount_cents = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" => {
                let content_type = field.content_type().unwrap_or("").to_lowercase();
                let data = field.bytes().await.map_err(|_| {
                    ServiceError::BadRequest("Could not read uploaded file".to_string())
                })?;
                if data.is_empty() {
                    continue;
                }
                image_path = Some(store_upload("payment-references", &content_type, &data).await?);
            }
            "reference_text" => {
                if let Ok(value) = field.text().await {
                    let value = value.trim().to_string();
                    if !value.is_empty() {
                        reference_text = Some(value);
                    }
                }
            }
            "amount" => {
                if let Ok(value) = field.text().await {
                    amount_cents = coerce_amount_cents(&serde_json::Value::String(value));
                }
            }
            _ => {}
        }
    }

    let image_path = image_path.ok_or_else(|| {
        ServiceError::BadRequest("Missing required field 'image'".to_string())
    })?;

    let reference = state
        .db
        .create_payment_reference(member.id, &image_path, reference_text, amount_cents)
        .await?;
    Ok(Json(PaymentReferenceDto::from(&reference)))
}

fn submit_reference_docs(op: TransformOperation) -> TransformOperation {
    op.description("Upload a proof-of-payment image for staff confirmation.")
        .tag("payment-references")
        .response::<200, Json<PaymentReferenceDto>>()
        .response_with::<400, (), _>(|res| res.description("Missing image or unsupported file type!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListPaymentReferencesQuery {
    pub status: Option<PaymentReferenceStatusDto>,
}

async fn list_references(
    mut state: RequestState,
    query: Query<ListPaymentReferencesQuery>,
) -> ServiceResult<Json<Vec<PaymentReferenceDto>>> {
    let status = query.0.status.map(PaymentReferenceStatus::from);

    let references = match state.session_require()?.subject {
        Subject::Member(member) => {
            state
                .db
                .list_payment_references(status, Some(member.id))
                .await?
        }
        Subject::Staff(staff) => {
            if !crate::permissions::is_allowed(staff.role, Operation::ConfirmPaymentReferences) {
                return Err(ServiceError::Forbidden("Missing permissions!"));
            }
            state.db.list_payment_references(status, None).await?
        }
    };

    Ok(Json(references.iter().map(|r| r.into()).collect()))
}

fn list_references_docs(op: TransformOperation) -> TransformOperation {
    op.description("List payment references, newest first. Members see their own, staff see all.")
        .tag("payment-references")
        .response::<200, Json<Vec<PaymentReferenceDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff", "self"])
}

async fn get_reference(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<PaymentReferenceDto>> {
    let session = state.session_require()?;

    let reference = state.db.get_payment_reference(id).await?;
    let reference = match reference {
        Some(reference) => reference,
        None => return Err(ServiceError::NotFound),
    };

    match session.subject {
        Subject::Member(member) if member.id == reference.member_id => {}
        Subject::Member(_) => return Err(ServiceError::Forbidden("Missing permissions!")),
        Subject::Staff(staff) => {
            if !crate::permissions::is_allowed(staff.role, Operation::ConfirmPaymentReferences) {
                return Err(ServiceError::Forbidden("Missing permissions!"));
            }
        }
    }

    Ok(Json(PaymentReferenceDto::from(&reference)))
}

fn get_reference_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get a single payment reference.")
        .tag("payment-references")
        .response::<200, Json<PaymentReferenceDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested payment reference does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff", "self"])
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ResolvePaymentReferenceDto {
    pub confirm: bool,
    pub notes: Option<String>,
}

async fn resolve_reference(
    mut state: RequestState,
    Path(id): Path<u64>,
    form: Json<ResolvePaymentReferenceDto>,
) -> ServiceResult<Json<PaymentReferenceDto>> {
    let staff = state.session_require_permission(Operation::ConfirmPaymentReferences)?;
    let form = form.0;

    let reference = state
        .db
        .resolve_payment_reference(id, form.confirm, &staff, form.notes)
        .await?;
    Ok(Json(PaymentReferenceDto::from(&reference)))
}

fn resolve_reference_docs(op: TransformOperation) -> TransformOperation {
    op.description("Confirm or reject a pending payment reference. Resolution is final.")
        .tag("payment-references")
        .response::<200, Json<PaymentReferenceDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested payment reference does not exist!"))
        .response_with::<409, (), _>(|res| res.description("The payment reference is already resolved!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["cashier"])
}
