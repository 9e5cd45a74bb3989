use aide::axum::routing::{get_with, post_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Path, Query};
use axum::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{self, MembershipAction, MembershipStatus};
use crate::permissions::Operation;
use crate::request_state::RequestState;

use super::coerce_amount_cents;
use super::members::StaffRoleDto;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/membership-applications",
            get_with(list_applications, list_applications_docs)
                .post_with(submit_application, submit_application_docs),
        )
        .api_route(
            "/membership-application/:id",
            get_with(get_application, get_application_docs),
        )
        .api_route(
            "/membership-application/:id/review",
            post_with(review_application, review_application_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub enum MembershipStatusDto {
    Pending,
    UnderReview,
    ForwardedToManager,
    Approved,
    Rejected,
}

impl From<&MembershipStatus> for MembershipStatusDto {
    fn from(value: &MembershipStatus) -> Self {
        match value {
            MembershipStatus::Pending => MembershipStatusDto::Pending,
            MembershipStatus::UnderReview => MembershipStatusDto::UnderReview,
            MembershipStatus::ForwardedToManager => MembershipStatusDto::ForwardedToManager,
            MembershipStatus::Approved => MembershipStatusDto::Approved,
            MembershipStatus::Rejected => MembershipStatusDto::Rejected,
        }
    }
}

impl From<MembershipStatusDto> for MembershipStatus {
    fn from(value: MembershipStatusDto) -> Self {
        match value {
            MembershipStatusDto::Pending => MembershipStatus::Pending,
            MembershipStatusDto::UnderReview => MembershipStatus::UnderReview,
            MembershipStatusDto::ForwardedToManager => MembershipStatus::ForwardedToManager,
            MembershipStatusDto::Approved => MembershipStatus::Approved,
            MembershipStatusDto::Rejected => MembershipStatus::Rejected,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct MembershipApplicationDto {
    pub id: u64,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub employer: String,
    pub occupation: String,
    pub monthly_income: Option<f64>,
    pub reference_name: Option<String>,
    pub reference_contact: Option<String>,
    pub status: MembershipStatusDto,
    pub membership_number: Option<String>,
    pub submitted_at: String,
}

impl From<&models::MembershipApplication> for MembershipApplicationDto {
    fn from(value: &models::MembershipApplication) -> Self {
        Self {
            id: value.id.to_owned(),
            fullname: value.fullname.to_owned(),
            email: value.email.to_owned(),
            phone: value.phone.to_owned(),
            address: value.address.to_owned(),
            employer: value.employer.to_owned(),
            occupation: value.occupation.to_owned(),
            monthly_income: value.monthly_income_cents.map(|c| c as f64 / 100.0),
            reference_name: value.reference_name.to_owned(),
            reference_contact: value.reference_contact.to_owned(),
            status: (&value.status).into(),
            membership_number: value.membership_number.to_owned(),
            submitted_at: format!("{:?}", value.submitted_at),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct MembershipReviewDto {
    pub id: u64,
    pub reviewer_id: u64,
    pub role: StaffRoleDto,
    pub action: String,
    pub notes: String,
    pub timestamp: String,
}

impl From<&models::MembershipReview> for MembershipReviewDto {
    fn from(value: &models::MembershipReview) -> Self {
        Self {
            id: value.id.to_owned(),
            reviewer_id: value.reviewer_id.to_owned(),
            role: (&value.role).into(),
            action: value.action.to_owned(),
            notes: value.notes.to_owned(),
            timestamp: format!("{:?}", value.created_at),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct MembershipApplicationDetailsDto {
    #[serde(flatten)]
    pub application: MembershipApplicationDto,
    pub history: Vec<MembershipReviewDto>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SubmitMembershipApplicationDto {
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub employer: String,
    pub occupation: String,
    #[serde(default)]
    pub monthly_income: serde_json::Value,
    pub reference_name: Option<String>,
    pub reference_contact: Option<String>,
}

/// Public intake endpoint for prospective members.
async fn submit_application(
    mut state: RequestState,
    form: Json<SubmitMembershipApplicationDto>,
) -> ServiceResult<Json<MembershipApplicationDto>> {
    let form = form.0;

    for (name, value) in [
        ("fullname", &form.fullname),
        ("email", &form.email),
        ("phone", &form.phone),
        ("address", &form.address),
        ("employer", &form.employer),
        ("occupation", &form.occupation),
    ] {
        if value.trim().is_empty() {
            return Err(ServiceError::BadRequest(format!(
                "Missing required field '{name}'"
            )));
        }
    }

    let application = state
        .db
        .create_membership_application(models::MembershipApplication {
            id: 0,
            fullname: form.fullname.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone.trim().to_string(),
            address: form.address.trim().to_string(),
            employer: form.employer.trim().to_string(),
            occupation: form.occupation.trim().to_string(),
            monthly_income_cents: coerce_amount_cents(&form.monthly_income),
            reference_name: form.reference_name,
            reference_contact: form.reference_contact,
            status: MembershipStatus::Pending,
            membership_number: None,
            submitted_at: chrono::Utc::now(),
            reviewed_at: None,
        })
        .await?;

    Ok(Json(MembershipApplicationDto::from(&application)))
}

fn submit_application_docs(op: TransformOperation) -> TransformOperation {
    op.description("Submit a membership application. Duplicate emails are rejected.")
        .tag("membership")
        .response::<200, Json<MembershipApplicationDto>>()
        .response_with::<400, (), _>(|res| res.description("Missing required field or duplicate email!"))
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListApplicationsQuery {
    pub status: Option<MembershipStatusDto>,
}

async fn list_applications(
    mut state: RequestState,
    query: Query<ListApplicationsQuery>,
) -> ServiceResult<Json<Vec<MembershipApplicationDto>>> {
    let staff = state.session_require_staff()?;
    if !crate::permissions::is_allowed(staff.role, Operation::ReviewMembershipApplications)
        && !crate::permissions::is_allowed(staff.role, Operation::DecideMembershipApplications)
    {
        return Err(ServiceError::Forbidden("Missing permissions!"));
    }

    let applications = state
        .db
        .list_membership_applications(query.0.status.map(Into::into))
        .await?;
    Ok(Json(applications.iter().map(|a| a.into()).collect()))
}

fn list_applications_docs(op: TransformOperation) -> TransformOperation {
    op.description("List membership applications, optionally filtered by status, newest first.")
        .tag("membership")
        .response::<200, Json<Vec<MembershipApplicationDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff"])
}

async fn get_application(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<MembershipApplicationDetailsDto>> {
    state.session_require_staff()?;

    let application = state.db.get_membership_application(id).await?;
    if let Some(application) = application {
        let history = state.db.get_membership_reviews(id).await?;
        return Ok(Json(MembershipApplicationDetailsDto {
            application: MembershipApplicationDto::from(&application),
            history: history.iter().map(|r| r.into()).collect(),
        }));
    }

    Err(ServiceError::NotFound)
}

fn get_application_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get a membership application with its review history.")
        .tag("membership")
        .response::<200, Json<MembershipApplicationDetailsDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested application does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["staff"])
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub enum MembershipActionDto {
    PickUp,
    ForwardToManager,
    Approve,
    Reject,
}

impl From<MembershipActionDto> for MembershipAction {
    fn from(value: MembershipActionDto) -> Self {
        match value {
            MembershipActionDto::PickUp => MembershipAction::PickUp,
            MembershipActionDto::ForwardToManager => MembershipAction::ForwardToManager,
            MembershipActionDto::Approve => MembershipAction::Approve,
            MembershipActionDto::Reject => MembershipAction::Reject,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ReviewMembershipApplicationDto {
    pub action: MembershipActionDto,
    pub notes: Option<String>,
    pub membership_number: Option<String>,
}

async fn review_application(
    mut state: RequestState,
    Path(id): Path<u64>,
    form: Json<ReviewMembershipApplicationDto>,
) -> ServiceResult<Json<MembershipApplicationDetailsDto>> {
    let form = form.0;
    let action: MembershipAction = form.action.into();

    let reviewer = match action {
        MembershipAction::PickUp | MembershipAction::ForwardToManager => {
            state.session_require_permission(Operation::ReviewMembershipApplications)?
        }
        MembershipAction::Approve => {
            state.session_require_permission(Operation::DecideMembershipApplications)?
        }
        MembershipAction::Reject => {
            let staff = state.session_require_staff()?;
            if !crate::permissions::is_allowed(staff.role, Operation::ReviewMembershipApplications)
                && !crate::permissions::is_allowed(
                    staff.role,
                    Operation::DecideMembershipApplications,
                )
            {
                return Err(ServiceError::Forbidden("Missing permissions!"));
            }
            staff
        }
    };

    let application = state
        .db
        .membership_transition(
            id,
            action,
            &reviewer,
            form.notes.as_deref().unwrap_or(""),
            form.membership_number,
        )
        .await?;

    let history = state.db.get_membership_reviews(id).await?;
    Ok(Json(MembershipApplicationDetailsDto {
        application: MembershipApplicationDto::from(&application),
        history: history.iter().map(|r| r.into()).collect(),
    }))
}

fn review_application_docs(op: TransformOperation) -> TransformOperation {
    op.description("Apply a review transition to a membership application. Forwarding requires an assigned membership number.")
        .tag("membership")
        .response::<200, Json<MembershipApplicationDetailsDto>>()
        .response_with::<400, (), _>(|res| res.description("Missing membership number or duplicate!"))
        .response_with::<404, (), _>(|res| res.description("The requested application does not exist!"))
        .response_with::<409, (), _>(|res| res.description("The application cannot take this transition from its current status!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff"])
}
