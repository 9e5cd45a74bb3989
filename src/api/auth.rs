use std::ops::Add;

use aide::axum::routing::{delete_with, get_with, post_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models::Subject;
use crate::request_state::RequestState;

use super::members::{MemberDto, StaffDto};
use super::password_hash_verify;

/// Validity window for issued session tokens.
const SESSION_MINUTES: i64 = 60;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/auth/password",
            post_with(auth_password_based, auth_password_based_docs),
        )
        .api_route(
            "/auth/account",
            get_with(auth_get_account, auth_get_account_docs),
        )
        .api_route("/auth", delete_with(auth_delete, auth_delete_docs))
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct AuthTokenDto {
    pub token: String,
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum SubjectDto {
    Member(MemberDto),
    Staff(StaffDto),
}

impl From<&Subject> for SubjectDto {
    fn from(value: &Subject) -> Self {
        match value {
            Subject::Member(member) => SubjectDto::Member(member.into()),
            Subject::Staff(staff) => SubjectDto::Staff(staff.into()),
        }
    }
}

#[derive(Debug, PartialEq, Deserialize, JsonSchema)]
pub struct AuthPasswordBasedDto {
    pub username: String,
    pub password: String,
}

async fn auth_password_based(
    mut state: RequestState,
    form: Json<AuthPasswordBasedDto>,
) -> ServiceResult<Json<AuthTokenDto>> {
    let form = form.0;

    let subject = if let Some(staff) = state.db.get_staff_by_username(&form.username).await? {
        Some(Subject::Staff(staff))
    } else if let Some(member) = state.db.get_member_by_email(&form.username).await? {
        Some(Subject::Member(member))
    } else {
        state
            .db
            .get_member_by_member_number(&form.username)
            .await?
            .map(Subject::Member)
    };

    if let Some(subject) = subject {
        let hash = match &subject {
            Subject::Staff(staff) => staff.password_hash.clone(),
            Subject::Member(member) => member.password_hash.clone(),
        };
        let active = match &subject {
            Subject::Staff(_) => true,
            Subject::Member(member) => member.active,
        };

        if active && !hash.is_empty() && password_hash_verify(&hash, &form.password)? {
            let token = state
                .db
                .create_session_token(&subject, Utc::now().add(Duration::minutes(SESSION_MINUTES)))
                .await?;

            return Ok(Json(AuthTokenDto { token }));
        }
    }

    Err(ServiceError::Unauthorized("Invalid username or password"))
}

fn auth_password_based_docs(op: TransformOperation) -> TransformOperation {
    op.description("Login with username and password.")
        .tag("auth")
        .response::<200, Json<AuthTokenDto>>()
        .response_with::<401, (), _>(|res| res.description("Invalid username or password!"))
}

async fn auth_delete(mut state: RequestState) -> ServiceResult<StatusCode> {
    if let Some(session) = state.session.clone() {
        state.db.delete_session_token(session.token).await?;
    }

    Ok(StatusCode::NO_CONTENT)
}

fn auth_delete_docs(op: TransformOperation) -> TransformOperation {
    op.description("Logout the current session.")
        .tag("auth")
        .response_with::<204, (), _>(|res| res.description("Logout was successfull!"))
}

pub async fn auth_get_account(state: RequestState) -> ServiceResult<Json<SubjectDto>> {
    let session = state.session_require()?;
    Ok(Json(SubjectDto::from(&session.subject)))
}

fn auth_get_account_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get the currently authenticated member or staff account.")
        .tag("auth")
        .response::<200, Json<SubjectDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["self"])
}
