use aide::axum::routing::{get_with, post_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Multipart, Path, Query};
use axum::Json;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    self, ApplicantSnapshot, LoanReviewFields, ManagerAction, OfficerAction, ReviewStatus,
    StaffRole, Subject,
};
use crate::permissions::Operation;
use crate::request_state::RequestState;

use super::members::{StaffDto, StaffRoleDto};
use super::{coerce_amount_cents, coerce_f64, coerce_i64, coerce_string, store_upload};

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/loan-applications",
            get_with(list_applications, list_applications_docs)
                .post_with(submit_application, submit_application_docs),
        )
        .api_route(
            "/loan-applications/statistics",
            get_with(get_statistics, get_statistics_docs),
        )
        .api_route(
            "/loan-applications/autofill/:member_number",
            get_with(autofill, autofill_docs),
        )
        .api_route(
            "/loan-application/:id",
            get_with(get_application, get_application_docs),
        )
        .api_route(
            "/loan-application/:id/assign",
            post_with(assign_application, assign_application_docs),
        )
        .api_route(
            "/loan-application/:id/review",
            post_with(review_application, review_application_docs),
        )
        .api_route(
            "/loan-application/:id/decision",
            post_with(decide_application, decide_application_docs),
        )
        .api_route("/loan-officers", get_with(list_officers, list_officers_docs))
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub enum ReviewStatusDto {
    PendingReview,
    UnderReview,
    Approved,
    Rejected,
    Returned,
}

impl From<&ReviewStatus> for ReviewStatusDto {
    fn from(value: &ReviewStatus) -> Self {
        match value {
            ReviewStatus::PendingReview => ReviewStatusDto::PendingReview,
            ReviewStatus::UnderReview => ReviewStatusDto::UnderReview,
            ReviewStatus::Approved => ReviewStatusDto::Approved,
            ReviewStatus::Rejected => ReviewStatusDto::Rejected,
            ReviewStatus::Returned => ReviewStatusDto::Returned,
        }
    }
}

impl From<ReviewStatusDto> for ReviewStatus {
    fn from(value: ReviewStatusDto) -> Self {
        match value {
            ReviewStatusDto::PendingReview => ReviewStatus::PendingReview,
            ReviewStatusDto::UnderReview => ReviewStatus::UnderReview,
            ReviewStatusDto::Approved => ReviewStatus::Approved,
            ReviewStatusDto::Rejected => ReviewStatus::Rejected,
            ReviewStatusDto::Returned => ReviewStatus::Returned,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct LoanApplicationDto {
    pub id: u64,
    pub member_id: u64,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub employer: String,
    pub occupation: String,
    pub amount: f64,
    pub interest_rate: Option<f64>,
    pub term_months: Option<i64>,
    pub purpose: String,
    pub credit_score: Option<i64>,
    pub monthly_income: Option<f64>,
    pub employment_status: Option<String>,
    pub collateral: Option<String>,
    pub priority: Option<String>,
    pub government_id_path: Option<String>,
    pub company_id_path: Option<String>,
    pub review_status: ReviewStatusDto,
    pub loan_officer_id: Option<u64>,
    pub manager_id: Option<u64>,
    pub submitted_at: String,
    pub reviewed_at: Option<String>,
    pub rejected_at: Option<String>,
}

impl From<&models::LoanApplication> for LoanApplicationDto {
    fn from(value: &models::LoanApplication) -> Self {
        Self {
            id: value.id.to_owned(),
            member_id: value.member_id.to_owned(),
            fullname: value.applicant.fullname.to_owned(),
            email: value.applicant.email.to_owned(),
            phone: value.applicant.phone.to_owned(),
            address: value.applicant.address.to_owned(),
            employer: value.applicant.employer.to_owned(),
            occupation: value.applicant.occupation.to_owned(),
            amount: value.amount_cents as f64 / 100.0,
            interest_rate: value.interest_rate.to_owned(),
            term_months: value.term_months.to_owned(),
            purpose: value.purpose.to_owned(),
            credit_score: value.credit_score.to_owned(),
            monthly_income: value.monthly_income_cents.map(|c| c as f64 / 100.0),
            employment_status: value.employment_status.to_owned(),
            collateral: value.collateral.to_owned(),
            priority: value.priority.to_owned(),
            government_id_path: value.government_id_path.to_owned(),
            company_id_path: value.company_id_path.to_owned(),
            review_status: (&value.review_status).into(),
            loan_officer_id: value.loan_officer_id.to_owned(),
            manager_id: value.manager_id.to_owned(),
            submitted_at: format!("{:?}", value.submitted_at),
            reviewed_at: value.reviewed_at.map(|t| format!("{t:?}")),
            rejected_at: value.rejected_at.map(|t| format!("{t:?}")),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct LoanReviewDto {
    pub id: u64,
    pub reviewer_id: u64,
    pub role: StaffRoleDto,
    pub action: String,
    pub notes: String,
    pub timestamp: String,
}

impl From<&models::LoanReview> for LoanReviewDto {
    fn from(value: &models::LoanReview) -> Self {
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
pub struct LoanApplicationDetailsDto {
    #[serde(flatten)]
    pub application: LoanApplicationDto,
    pub history: Vec<LoanReviewDto>,
}

/// Member intake: multipart submission with required text fields and two
/// optional image attachments (government id, company id).
async fn submit_application(
    mut state: RequestState,
    mut multipart: Multipart,
) -> ServiceResult<Json<LoanApplicationDto>> {
    let member = state.session_require_member()?;

    let mut text_fields = std::collections::HashMap::<String, String>::new();
    let mut government_id_path = None;
    let mut company_id_path = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "government_id" | "company_id" => {
                let content_type = field.content_type().unwrap_or("").to_lowercase();
                let data = field.bytes().await.map_err(|_| {
                    ServiceError::BadRequest("Could not read uploaded file".to_string())
                })?;
                if data.is_empty() {
                    continue;
                }
                let path = store_upload("loan-documents", &content_type, &data).await?;
                if name == "government_id" {
                    government_id_path = Some(path);
                } else {
                    company_id_path = Some(path);
                }
            }
            _ => {
                if let Ok(value) = field.text().await {
                    text_fields.insert(name, value);
                }
            }
        }
    }

    for name in [
        "fullname",
        "email",
        "phone",
        "address",
        "employer",
        "occupation",
        "amount",
        "purpose",
    ] {
        if text_fields.get(name).map(|v| v.trim()).unwrap_or("").is_empty() {
            return Err(ServiceError::BadRequest(format!(
                "Missing required field '{name}'"
            )));
        }
    }

    let text = |name: &str| -> String { text_fields.get(name).map(|v| v.trim().to_string()).unwrap_or_default() };
    let json = |name: &str| -> serde_json::Value {
        text_fields
            .get(name)
            .map(|v| serde_json::Value::String(v.clone()))
            .unwrap_or(serde_json::Value::Null)
    };

    let amount_cents = coerce_amount_cents(&json("amount")).ok_or_else(|| {
        ServiceError::BadRequest("Field 'amount' must be a positive number".to_string())
    })?;
    if amount_cents <= 0 {
        return Err(ServiceError::BadRequest(
            "Field 'amount' must be a positive number".to_string(),
        ));
    }

    let application = state
        .db
        .create_loan_application(models::LoanApplication {
            id: 0,
            member_id: member.id,
            applicant: ApplicantSnapshot {
                fullname: text("fullname"),
                email: text("email"),
                phone: text("phone"),
                address: text("address"),
                employer: text("employer"),
                occupation: text("occupation"),
            },
            amount_cents,
            interest_rate: coerce_f64(&json("interest_rate")),
            term_months: coerce_i64(&json("term_months")),
            purpose: text("purpose"),
            credit_score: coerce_i64(&json("credit_score")),
            monthly_income_cents: coerce_amount_cents(&json("monthly_income")),
            employment_status: coerce_string(&json("employment_status")),
            collateral: coerce_string(&json("collateral")),
            priority: coerce_string(&json("priority")),
            government_id_path,
            company_id_path,
            review_status: ReviewStatus::PendingReview,
            loan_officer_id: None,
            manager_id: None,
            submitted_at: chrono::Utc::now(),
            reviewed_at: None,
            rejected_at: None,
        })
        .await?;

    Ok(Json(LoanApplicationDto::from(&application)))
}

fn submit_application_docs(op: TransformOperation) -> TransformOperation {
    op.description("Submit a loan application with optional document attachments.")
        .tag("loans")
        .response::<200, Json<LoanApplicationDto>>()
        .response_with::<400, (), _>(|res| res.description("Missing required field or unsupported attachment!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["self"])
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListLoanApplicationsQuery {
    pub status: Option<ReviewStatusDto>,
}

/// Role scoping: loan officers see unassigned applications plus their own,
/// managers see only `under_review`, admins see everything, members see
/// their own applications.
async fn list_applications(
    mut state: RequestState,
    query: Query<ListLoanApplicationsQuery>,
) -> ServiceResult<Json<Vec<LoanApplicationDto>>> {
    let status = query.0.status.map(ReviewStatus::from);

    let applications = match state.session_require()?.subject {
        Subject::Member(member) => {
            state
                .db
                .list_loan_applications(status, None, Some(member.id))
                .await?
        }
        Subject::Staff(staff) => {
            if !crate::permissions::is_allowed(staff.role, Operation::ListLoanApplications) {
                return Err(ServiceError::Forbidden("Missing permissions!"));
            }
            match staff.role {
                StaffRole::LoanOfficer => {
                    state
                        .db
                        .list_loan_applications(status, Some(staff.id), None)
                        .await?
                }
                StaffRole::Manager => {
                    state
                        .db
                        .list_loan_applications(Some(ReviewStatus::UnderReview), None, None)
                        .await?
                }
                _ => state.db.list_loan_applications(status, None, None).await?,
            }
        }
    };

    Ok(Json(applications.iter().map(|a| a.into()).collect()))
}

fn list_applications_docs(op: TransformOperation) -> TransformOperation {
    op.description("List loan applications, newest first, scoped by role.")
        .tag("loans")
        .response::<200, Json<Vec<LoanApplicationDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff", "self"])
}

async fn get_application(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<LoanApplicationDetailsDto>> {
    let session = state.session_require()?;

    let application = state.db.get_loan_application(id).await?;
    let application = match application {
        Some(application) => application,
        None => return Err(ServiceError::NotFound),
    };

    match session.subject {
        Subject::Member(member) if member.id == application.member_id => {}
        Subject::Member(_) => return Err(ServiceError::Forbidden("Missing permissions!")),
        Subject::Staff(staff) => {
            if !crate::permissions::is_allowed(staff.role, Operation::ListLoanApplications) {
                return Err(ServiceError::Forbidden("Missing permissions!"));
            }
        }
    }

    let history = state.db.get_loan_reviews(id).await?;
    Ok(Json(LoanApplicationDetailsDto {
        application: LoanApplicationDto::from(&application),
        history: history.iter().map(|r| r.into()).collect(),
    }))
}

fn get_application_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get a loan application with its full review history.")
        .tag("loans")
        .response::<200, Json<LoanApplicationDetailsDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested application does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff", "self"])
}

async fn assign_application(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<LoanApplicationDto>> {
    let officer = state.session_require_role(StaffRole::LoanOfficer)?;

    let application = state.db.assign_loan_officer(id, &officer).await?;
    Ok(Json(LoanApplicationDto::from(&application)))
}

fn assign_application_docs(op: TransformOperation) -> TransformOperation {
    op.description("Assign a pending application to the authenticated loan officer.")
        .tag("loans")
        .response::<200, Json<LoanApplicationDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested application does not exist!"))
        .response_with::<409, (), _>(|res| res.description("The application is not pending or already assigned!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["loan_officer"])
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub enum OfficerActionDto {
    ApproveForManager,
    ReturnToMember,
    Reject,
}

impl From<OfficerActionDto> for OfficerAction {
    fn from(value: OfficerActionDto) -> Self {
        match value {
            OfficerActionDto::ApproveForManager => OfficerAction::ApproveForManager,
            OfficerActionDto::ReturnToMember => OfficerAction::ReturnToMember,
            OfficerActionDto::Reject => OfficerAction::Reject,
        }
    }
}

/// Optional structured review fields. Declared as raw json values so the
/// lenient coercion contract applies: empty strings, `null` and malformed
/// numbers all store NULL rather than failing the request.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct ReviewFieldsDto {
    #[serde(default)]
    pub loan_amount: serde_json::Value,
    #[serde(default)]
    pub interest_rate: serde_json::Value,
    #[serde(default)]
    pub loan_term_months: serde_json::Value,
    #[serde(default)]
    pub loan_purpose: serde_json::Value,
    #[serde(default)]
    pub credit_score: serde_json::Value,
    #[serde(default)]
    pub monthly_income: serde_json::Value,
    #[serde(default)]
    pub employment_status: serde_json::Value,
    #[serde(default)]
    pub collateral: serde_json::Value,
    #[serde(default)]
    pub priority: serde_json::Value,
}

impl ReviewFieldsDto {
    fn coerce(&self) -> LoanReviewFields {
        LoanReviewFields {
            amount_cents: coerce_amount_cents(&self.loan_amount),
            interest_rate: coerce_f64(&self.interest_rate),
            term_months: coerce_i64(&self.loan_term_months),
            purpose: coerce_string(&self.loan_purpose),
            credit_score: coerce_i64(&self.credit_score),
            monthly_income_cents: coerce_amount_cents(&self.monthly_income),
            employment_status: coerce_string(&self.employment_status),
            collateral: coerce_string(&self.collateral),
            priority: coerce_string(&self.priority),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct OfficerReviewDto {
    pub action: OfficerActionDto,
    pub notes: Option<String>,
    #[serde(flatten)]
    pub fields: ReviewFieldsDto,
}

async fn review_application(
    mut state: RequestState,
    Path(id): Path<u64>,
    form: Json<OfficerReviewDto>,
) -> ServiceResult<Json<LoanApplicationDetailsDto>> {
    let officer = state.session_require_permission(Operation::ReviewLoanApplications)?;
    let form = form.0;

    let application = state
        .db
        .loan_officer_review(
            id,
            form.action.into(),
            officer.id,
            officer.role,
            form.notes.as_deref().unwrap_or(""),
            &form.fields.coerce(),
        )
        .await?;

    let history = state.db.get_loan_reviews(id).await?;
    Ok(Json(LoanApplicationDetailsDto {
        application: LoanApplicationDto::from(&application),
        history: history.iter().map(|r| r.into()).collect(),
    }))
}

fn review_application_docs(op: TransformOperation) -> TransformOperation {
    op.description("Submit a loan officer review decision for an application under review.")
        .tag("loans")
        .response::<200, Json<LoanApplicationDetailsDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested application does not exist!"))
        .response_with::<409, (), _>(|res| res.description("The application is not under review!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["loan_officer"])
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub enum ManagerActionDto {
    Approve,
    Reject,
}

impl From<ManagerActionDto> for ManagerAction {
    fn from(value: ManagerActionDto) -> Self {
        match value {
            ManagerActionDto::Approve => ManagerAction::Approve,
            ManagerActionDto::Reject => ManagerAction::Reject,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ManagerDecisionDto {
    pub action: ManagerActionDto,
    pub notes: Option<String>,
}

async fn decide_application(
    mut state: RequestState,
    Path(id): Path<u64>,
    form: Json<ManagerDecisionDto>,
) -> ServiceResult<Json<LoanApplicationDetailsDto>> {
    let manager = state.session_require_permission(Operation::DecideLoanApplications)?;
    let form = form.0;

    let application = state
        .db
        .manager_decision(
            id,
            form.action.into(),
            manager.id,
            form.notes.as_deref().unwrap_or(""),
        )
        .await?;

    let history = state.db.get_loan_reviews(id).await?;
    Ok(Json(LoanApplicationDetailsDto {
        application: LoanApplicationDto::from(&application),
        history: history.iter().map(|r| r.into()).collect(),
    }))
}

fn decide_application_docs(op: TransformOperation) -> TransformOperation {
    op.description("Submit a manager decision for an application under review.")
        .tag("loans")
        .response::<200, Json<LoanApplicationDetailsDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested application does not exist!"))
        .response_with::<409, (), _>(|res| res.description("The application is not under review!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["manager"])
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct LoanStatisticsDto {
    pub pending_review: i64,
    pub under_review: i64,
    pub approved: i64,
    pub rejected: i64,
    pub returned: i64,
}

impl From<&models::LoanStatistics> for LoanStatisticsDto {
    fn from(value: &models::LoanStatistics) -> Self {
        Self {
            pending_review: value.pending_review.to_owned(),
            under_review: value.under_review.to_owned(),
            approved: value.approved.to_owned(),
            rejected: value.rejected.to_owned(),
            returned: value.returned.to_owned(),
        }
    }
}

async fn get_statistics(mut state: RequestState) -> ServiceResult<Json<LoanStatisticsDto>> {
    state.session_require_permission(Operation::LoanStatistics)?;

    let statistics = state.db.loan_statistics().await?;
    Ok(Json(LoanStatisticsDto::from(&statistics)))
}

fn get_statistics_docs(op: TransformOperation) -> TransformOperation {
    op.description("Per-status counts over all loan applications.")
        .tag("loans")
        .response::<200, Json<LoanStatisticsDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff"])
}

async fn list_officers(mut state: RequestState) -> ServiceResult<Json<Vec<StaffDto>>> {
    state.session_require_staff()?;

    let officers = state.db.list_loan_officers().await?;
    Ok(Json(officers.iter().map(|o| o.into()).collect()))
}

fn list_officers_docs(op: TransformOperation) -> TransformOperation {
    op.description("List all staff accounts with the loan officer role.")
        .tag("loans")
        .response::<200, Json<Vec<StaffDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["staff"])
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct AutofillDto {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub employer: Option<String>,
    pub occupation: Option<String>,
    pub monthly_income: Option<f64>,
}

/// Project fields of the approved membership application into the loan
/// intake form. Pure read; a missing membership application is a normal
/// reportable outcome.
async fn autofill(
    mut state: RequestState,
    Path(member_number): Path<String>,
) -> ServiceResult<Json<AutofillDto>> {
    state.session_require()?;

    let application = state
        .db
        .get_approved_membership_application_by_member_number(&member_number)
        .await?;

    match application {
        Some(application) => Ok(Json(AutofillDto {
            fullname: Some(application.fullname),
            email: Some(application.email),
            phone: Some(application.phone),
            address: Some(application.address),
            employer: Some(application.employer),
            occupation: Some(application.occupation),
            monthly_income: application.monthly_income_cents.map(|c| c as f64 / 100.0),
        })),
        None => Err(ServiceError::NotFound),
    }
}

fn autofill_docs(op: TransformOperation) -> TransformOperation {
    op.description("Prefill loan intake fields from an approved membership application.")
        .tag("loans")
        .response::<200, Json<AutofillDto>>()
        .response_with::<404, (), _>(|res| {
            res.description("No approved membership application exists for this member number!")
        })
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["self"])
}
