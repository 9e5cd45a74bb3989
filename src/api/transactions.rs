use aide::axum::routing::get_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::Query;
use axum::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::{AppState, TRANSACTION_PAGE_LIMIT};
use crate::error::{ServiceError, ServiceResult};
use crate::models;
use crate::request_state::RequestState;

use super::accounts::{AccountDto, AccountTypeDto};

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/transactions",
            get_with(list_transactions, list_transactions_docs)
                .post_with(create_transaction, create_transaction_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub enum TransactionTypeDto {
    Credit,
    Debit,
}

impl From<&models::TransactionType> for TransactionTypeDto {
    fn from(value: &models::TransactionType) -> Self {
        match value {
            models::TransactionType::Credit => TransactionTypeDto::Credit,
            models::TransactionType::Debit => TransactionTypeDto::Debit,
        }
    }
}

impl From<TransactionTypeDto> for models::TransactionType {
    fn from(value: TransactionTypeDto) -> Self {
        match value {
            TransactionTypeDto::Credit => models::TransactionType::Credit,
            TransactionTypeDto::Debit => models::TransactionType::Debit,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct TransactionDto {
    pub id: u64,
    pub account_id: u64,
    pub transaction_type: TransactionTypeDto,
    /// Signed amount in currency units: credits positive, debits negative.
    pub amount: f64,
    pub description: String,
    pub timestamp: String,
}

impl From<&models::Transaction> for TransactionDto {
    fn from(value: &models::Transaction) -> Self {
        Self {
            id: value.id.to_owned(),
            account_id: value.account_id.to_owned(),
            transaction_type: (&value.transaction_type).into(),
            amount: value.amount_cents as f64 / 100.0,
            description: value.description.to_owned(),
            timestamp: format!("{:?}", value.created_at),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListTransactionsQuery {
    pub limit: Option<i64>,
}

async fn list_transactions(
    mut state: RequestState,
    query: Query<ListTransactionsQuery>,
) -> ServiceResult<Json<Vec<TransactionDto>>> {
    let member = state.session_require_member()?;

    let limit = query.limit.unwrap_or(TRANSACTION_PAGE_LIMIT);
    let transactions = state.db.get_transactions_by_member(member.id, limit).await?;
    Ok(Json(transactions.iter().map(|t| t.into()).collect()))
}

fn list_transactions_docs(op: TransformOperation) -> TransformOperation {
    op.description("List the authenticated member's transactions, newest first. The page size is capped.")
        .tag("transactions")
        .response::<200, Json<Vec<TransactionDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateTransactionDto {
    pub account_type: AccountTypeDto,
    pub transaction_type: TransactionTypeDto,
    pub description: Option<String>,
    /// Positive amount in currency units.
    pub amount: f64,
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct CreateTransactionResponseDto {
    pub transaction: TransactionDto,
    pub account: AccountDto,
}

async fn create_transaction(
    mut state: RequestState,
    form: Json<CreateTransactionDto>,
) -> ServiceResult<Json<CreateTransactionResponseDto>> {
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

    let (transaction, account) = state
        .db
        .create_transaction(
            member.id,
            form.account_type.into(),
            form.transaction_type.into(),
            form.description.as_deref().unwrap_or(""),
            amount_cents,
        )
        .await?;

    Ok(Json(CreateTransactionResponseDto {
        transaction: TransactionDto::from(&transaction),
        account: AccountDto::from(&account),
    }))
}

fn create_transaction_docs(op: TransformOperation) -> TransformOperation {
    op.description("Record a credit or debit against one of the member's accounts.")
        .tag("transactions")
        .response::<200, Json<CreateTransactionResponseDto>>()
        .response_with::<400, (), _>(|res| res.description("Invalid account type, transaction type or amount!"))
        .response_with::<409, (), _>(|res| {
            res.description("No account of the requested type exists for this member!")
        })
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["self"])
}
