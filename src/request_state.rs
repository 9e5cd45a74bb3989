use aide::OperationInput;
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::TypedHeader;
use headers::{authorization::Bearer, Authorization};

use crate::{
    database::{AppState, DatabaseConnection},
    error::ServiceError,
    models::{Member, Session, StaffAccount, StaffRole, Subject},
    permissions::{self, Operation},
};

/// Per-request context: a database connection plus the session resolved from
/// the bearer token, if any.
pub struct RequestState {
    pub db: DatabaseConnection,
    pub session: Option<Session>,
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestState
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        let connection = state
            .pool
            .acquire()
            .await
            .map_err(|err| ServiceError::InternalServerError(err.to_string()))?;
        let mut db = DatabaseConnection { connection };

        let session = if let Ok(TypedHeader(Authorization(bearer))) =
            parts.extract::<TypedHeader<Authorization<Bearer>>>().await
        {
            let session_token = bearer.token().to_owned();
            db.get_session_by_session_token(session_token).await?
        } else {
            None
        };

        Ok(Self { db, session })
    }
}

impl OperationInput for RequestState {}

impl RequestState {
    pub fn session_require(&self) -> Result<Session, ServiceError> {
        self.session
            .clone()
            .ok_or(ServiceError::Unauthorized("Missing login!"))
    }

    /// Require an authenticated member session.
    pub fn session_require_member(&self) -> Result<Member, ServiceError> {
        match self.session_require()?.subject {
            Subject::Member(member) => Ok(member),
            Subject::Staff(_) => Err(ServiceError::Forbidden(
                "This operation is only available to members!",
            )),
        }
    }

    /// Require an authenticated staff session.
    pub fn session_require_staff(&self) -> Result<StaffAccount, ServiceError> {
        match self.session_require()?.subject {
            Subject::Staff(staff) => Ok(staff),
            Subject::Member(_) => Err(ServiceError::Forbidden(
                "This operation is only available to staff!",
            )),
        }
    }

    /// Require a staff session whose role permits the given operation
    /// according to the static permission table.
    pub fn session_require_permission(
        &self,
        operation: Operation,
    ) -> Result<StaffAccount, ServiceError> {
        let staff = self.session_require_staff()?;
        if permissions::is_allowed(staff.role, operation) {
            Ok(staff)
        } else {
            Err(ServiceError::Forbidden("Missing permissions!"))
        }
    }

    /// Require a staff session with the exact given role.
    pub fn session_require_role(&self, role: StaffRole) -> Result<StaffAccount, ServiceError> {
        let staff = self.session_require_staff()?;
        if staff.role == role {
            Ok(staff)
        } else {
            Err(ServiceError::Forbidden("Missing permissions!"))
        }
    }
}
