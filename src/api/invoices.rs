use aide::axum::routing::{get_with, post_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::Path;
use axum::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{self, Subject};
use crate::permissions::Operation;
use crate::request_state::RequestState;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/invoices",
            get_with(list_own_invoices, list_own_invoices_docs)
                .post_with(create_invoice, create_invoice_docs),
        )
        .api_route(
            "/member/:id/invoices",
            get_with(list_member_invoices, list_member_invoices_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InvoiceItemDto {
    pub description: String,
    /// Amount in currency units.
    pub amount: f64,
}

impl From<&models::InvoiceItem> for InvoiceItemDto {
    fn from(value: &models::InvoiceItem) -> Self {
        Self {
            description: value.description.to_owned(),
            amount: value.amount_cents as f64 / 100.0,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct InvoiceDto {
    pub id: u64,
    pub member_id: u64,
    pub issued_by: u64,
    pub items: Vec<InvoiceItemDto>,
    pub total: f64,
    pub created_at: String,
}

impl From<&models::Invoice> for InvoiceDto {
    fn from(value: &models::Invoice) -> Self {
        Self {
            id: value.id.to_owned(),
            member_id: value.member_id.to_owned(),
            issued_by: value.issued_by.to_owned(),
            items: value.items.iter().map(|i| i.into()).collect(),
            total: value.total_cents as f64 / 100.0,
            created_at: format!("{:?}", value.created_at),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateInvoiceDto {
    pub member_id: u64,
    pub items: Vec<InvoiceItemDto>,
}

async fn create_invoice(
    mut state: RequestState,
    form: Json<CreateInvoiceDto>,
) -> ServiceResult<Json<InvoiceDto>> {
    let staff = state.session_require_permission(Operation::IssueInvoices)?;
    let form = form.0;

    if form.items.is_empty() {
        return Err(ServiceError::BadRequest(
            "An invoice needs at least one item".to_string(),
        ));
    }

    let mut items = Vec::with_capacity(form.items.len());
    for item in &form.items {
        if item.description.trim().is_empty() {
            return Err(ServiceError::BadRequest(
                "Invoice items need a description".to_string(),
            ));
        }
        if !item.amount.is_finite() || item.amount <= 0.0 {
            return Err(ServiceError::BadRequest(
                "Invoice item amounts must be positive numbers".to_string(),
            ));
        }
        items.push(models::InvoiceItem {
            description: item.description.trim().to_string(),
            amount_cents: (item.amount * 100.0).round() as i64,
        });
    }

    if state.db.get_member_by_id(form.member_id).await?.is_none() {
        return Err(ServiceError::NotFound);
    }

    let invoice = state
        .db
        .create_invoice(form.member_id, staff.id, items)
        .await?;
    Ok(Json(InvoiceDto::from(&invoice)))
}

fn create_invoice_docs(op: TransformOperation) -> TransformOperation {
    op.description("Issue an invoice to a member. The total is the sum of the item amounts.")
        .tag("invoices")
        .response::<200, Json<InvoiceDto>>()
        .response_with::<400, (), _>(|res| res.description("Empty item list or invalid item!"))
        .response_with::<404, (), _>(|res| res.description("The requested member does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["cashier"])
}

/// Members get their own invoices, staff get the invoices they issued.
async fn list_own_invoices(mut state: RequestState) -> ServiceResult<Json<Vec<InvoiceDto>>> {
    let invoices = match state.session_require()?.subject {
        Subject::Member(member) => state.db.list_invoices_by_member(member.id).await?,
        Subject::Staff(staff) => state.db.list_invoices_by_staff(staff.id).await?,
    };

    Ok(Json(invoices.iter().map(|i| i.into()).collect()))
}

fn list_own_invoices_docs(op: TransformOperation) -> TransformOperation {
    op.description("List the caller's invoices, newest first.")
        .tag("invoices")
        .response::<200, Json<Vec<InvoiceDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["staff", "self"])
}

async fn list_member_invoices(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<Vec<InvoiceDto>>> {
    state.session_require_permission(Operation::IssueInvoices)?;

    if state.db.get_member_by_id(id).await?.is_none() {
        return Err(ServiceError::NotFound);
    }

    let invoices = state.db.list_invoices_by_member(id).await?;
    Ok(Json(invoices.iter().map(|i| i.into()).collect()))
}

fn list_member_invoices_docs(op: TransformOperation) -> TransformOperation {
    op.description("List all invoices issued to a member.")
        .tag("invoices")
        .response::<200, Json<Vec<InvoiceDto>>>()
        .response_with::<404, (), _>(|res| res.description("The requested member does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["cashier"])
}
