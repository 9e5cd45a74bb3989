use aide::axum::routing::get_with;
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::Json;
use schemars::JsonSchema;
use serde::Serialize;

use crate::database::AppState;
use crate::error::ServiceResult;
use crate::models::StaffRole;
use crate::permissions::Operation;
use crate::request_state::RequestState;

use super::loan_applications::LoanStatisticsDto;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route("/dashboard", get_with(get_dashboard, get_dashboard_docs))
        .with_state(app_state)
}

/// Role-dependent snapshot. Sections a role has no business seeing
/// are omitted rather than zeroed.
#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct DashboardDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub member_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_membership_applications: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loan_statistics: Option<LoanStatisticsDto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_deposits: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pending_payment_references: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoices_issued_today: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_queue_under_review: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unassigned_applications: Option<i64>,
}

async fn get_dashboard(mut state: RequestState) -> ServiceResult<Json<DashboardDto>> {
    let staff = state.session_require_permission(Operation::ViewDashboard)?;

    let mut dashboard = DashboardDto {
        member_count: None,
        pending_membership_applications: None,
        loan_statistics: None,
        total_deposits: None,
        pending_payment_references: None,
        invoices_issued_today: None,
        own_queue_under_review: None,
        unassigned_applications: None,
    };

    match staff.role {
        StaffRole::Admin | StaffRole::Manager => {
            dashboard.member_count = Some(state.db.count_members().await?);
            dashboard.pending_membership_applications =
                Some(state.db.count_pending_membership_applications().await?);
            dashboard.loan_statistics = Some((&state.db.loan_statistics().await?).into());
            dashboard.total_deposits = Some(state.db.total_deposits_cents().await? as f64 / 100.0);
            dashboard.pending_payment_references =
                Some(state.db.count_pending_payment_references().await?);
            dashboard.invoices_issued_today =
                Some(state.db.count_invoices_issued_today().await?);
        }
        StaffRole::LoanOfficer => {
            dashboard.loan_statistics = Some((&state.db.loan_statistics().await?).into());
            let (own, unassigned) = state.db.officer_queue_counts(staff.id).await?;
            dashboard.own_queue_under_review = Some(own);
            dashboard.unassigned_applications = Some(unassigned);
        }
        StaffRole::Cashier => {
            dashboard.pending_payment_references =
                Some(state.db.count_pending_payment_references().await?);
            dashboard.invoices_issued_today =
                Some(state.db.count_invoices_issued_today().await?);
        }
        StaffRole::ItAdmin => {
            dashboard.member_count = Some(state.db.count_members().await?);
        }
    }

    Ok(Json(dashboard))
}

fn get_dashboard_docs(op: TransformOperation) -> TransformOperation {
    op.description("Summary counters for the authenticated staff account's role.")
        .tag("dashboard")
        .response::<200, Json<DashboardDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff"])
}
