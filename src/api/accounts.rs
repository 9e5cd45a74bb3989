use aide::axum::routing::get_with;
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
        .api_route("/accounts", get_with(list_own_accounts, list_own_accounts_docs))
        .api_route(
            "/member/:id/accounts",
            get_with(list_member_accounts, list_member_accounts_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub enum AccountTypeDto {
    Savings,
    Checking,
}

impl From<&models::AccountType> for AccountTypeDto {
    fn from(value: &models::AccountType) -> Self {
        match value {
            models::AccountType::Savings => AccountTypeDto::Savings,
            models::AccountType::Checking => AccountTypeDto::Checking,
        }
    }
}

impl From<AccountTypeDto> for models::AccountType {
    fn from(value: AccountTypeDto) -> Self {
        match value {
            AccountTypeDto::Savings => models::AccountType::Savings,
            AccountTypeDto::Checking => models::AccountType::Checking,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct AccountDto {
    pub id: u64,
    pub member_id: u64,
    pub account_type: AccountTypeDto,
    pub account_number: String,
    /// Balance in currency units, cached sum of the account's transactions.
    pub balance: f64,
}

impl From<&models::Account> for AccountDto {
    fn from(value: &models::Account) -> Self {
        Self {
            id: value.id.to_owned(),
            member_id: value.member_id.to_owned(),
            account_type: (&value.account_type).into(),
            account_number: value.account_number.to_owned(),
            balance: value.balance_cents as f64 / 100.0,
        }
    }
}

async fn list_own_accounts(mut state: RequestState) -> ServiceResult<Json<Vec<AccountDto>>> {
    let member = state.session_require_member()?;

    let accounts = state.db.get_accounts_by_member(member.id).await?;
    Ok(Json(accounts.iter().map(|a| a.into()).collect()))
}

fn list_own_accounts_docs(op: TransformOperation) -> TransformOperation {
    op.description("List the authenticated member's accounts with balances.")
        .tag("accounts")
        .response::<200, Json<Vec<AccountDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

async fn list_member_accounts(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<Vec<AccountDto>>> {
    match state.session_require()?.subject {
        Subject::Member(member) if member.id == id => {}
        Subject::Member(_) => return Err(ServiceError::Forbidden("Missing permissions!")),
        Subject::Staff(_) => {
            state.session_require_permission(Operation::ManageMembers)?;
        }
    }

    if state.db.get_member_by_id(id).await?.is_none() {
        return Err(ServiceError::NotFound);
    }

    let accounts = state.db.get_accounts_by_member(id).await?;
    Ok(Json(accounts.iter().map(|a| a.into()).collect()))
}

fn list_member_accounts_docs(op: TransformOperation) -> TransformOperation {
    op.description("List a member's accounts.")
        .tag("accounts")
        .response::<200, Json<Vec<AccountDto>>>()
        .response_with::<404, (), _>(|res| res.description("The requested member does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff", "self"])
}
