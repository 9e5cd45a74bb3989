use aide::axum::routing::{get_with, post_with, put_with};
use aide::axum::ApiRouter;
use aide::transform::TransformOperation;
use axum::extract::{Path, Query};
use axum::Json;
use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::database::AppState;
use crate::error::{ServiceError, ServiceResult};
use crate::import::member_import::{self, ImportReportDto};
use crate::models::{self, Account, AccountType, StaffRole, Subject};
use crate::permissions::Operation;
use crate::request_state::RequestState;

use super::password_hash_create;

pub fn router(app_state: AppState) -> ApiRouter {
    ApiRouter::new()
        .api_route(
            "/members",
            get_with(list_members, list_members_docs).post_with(create_member, create_member_docs),
        )
        .api_route(
            "/members/import",
            post_with(import_members, import_members_docs),
        )
        .api_route("/member/:id", get_with(get_member, get_member_docs))
        .api_route(
            "/member/:id/active",
            put_with(set_member_active, set_member_active_docs),
        )
        .api_route(
            "/staff/:id/role",
            put_with(update_staff_role, update_staff_role_docs),
        )
        .api_route(
            "/staff/password",
            put_with(change_own_password, change_own_password_docs),
        )
        .with_state(app_state)
}

#[derive(Debug, PartialEq, Serialize, Deserialize, Clone, Copy, JsonSchema)]
pub enum StaffRoleDto {
    Admin,
    Manager,
    LoanOfficer,
    Cashier,
    ItAdmin,
}

impl From<&StaffRole> for StaffRoleDto {
    fn from(value: &StaffRole) -> Self {
        match value {
            StaffRole::Admin => StaffRoleDto::Admin,
            StaffRole::Manager => StaffRoleDto::Manager,
            StaffRole::LoanOfficer => StaffRoleDto::LoanOfficer,
            StaffRole::Cashier => StaffRoleDto::Cashier,
            StaffRole::ItAdmin => StaffRoleDto::ItAdmin,
        }
    }
}

impl From<StaffRoleDto> for StaffRole {
    fn from(value: StaffRoleDto) -> Self {
        match value {
            StaffRoleDto::Admin => StaffRole::Admin,
            StaffRoleDto::Manager => StaffRole::Manager,
            StaffRoleDto::LoanOfficer => StaffRole::LoanOfficer,
            StaffRoleDto::Cashier => StaffRole::Cashier,
            StaffRoleDto::ItAdmin => StaffRole::ItAdmin,
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct MemberDto {
    pub id: u64,
    pub member_number: String,
    pub fullname: String,
    pub email: String,
    pub active: bool,
}

impl From<&models::Member> for MemberDto {
    fn from(value: &models::Member) -> Self {
        Self {
            id: value.id.to_owned(),
            member_number: value.member_number.to_owned(),
            fullname: value.fullname.to_owned(),
            email: value.email.to_owned(),
            active: value.active.to_owned(),
        }
    }
}

#[derive(Debug, PartialEq, Serialize, JsonSchema)]
pub struct StaffDto {
    pub id: u64,
    pub fullname: String,
    pub email: String,
    pub username: String,
    pub role: StaffRoleDto,
}

impl From<&models::StaffAccount> for StaffDto {
    fn from(value: &models::StaffAccount) -> Self {
        Self {
            id: value.id.to_owned(),
            fullname: value.fullname.to_owned(),
            email: value.email.to_owned(),
            username: value.username.to_owned(),
            role: (&value.role).into(),
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListMembersQuery {
    pub search: Option<String>,
}

async fn list_members(
    mut state: RequestState,
    query: Query<ListMembersQuery>,
) -> ServiceResult<Json<Vec<MemberDto>>> {
    state.session_require_permission(Operation::ManageMembers)?;

    let members = state.db.list_members(query.search.as_deref()).await?;
    Ok(Json(members.iter().map(|m| m.into()).collect()))
}

fn list_members_docs(op: TransformOperation) -> TransformOperation {
    op.description("List members, optionally filtered by name, email or member number.")
        .tag("members")
        .response::<200, Json<Vec<MemberDto>>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff"])
}

async fn get_member(
    mut state: RequestState,
    Path(id): Path<u64>,
) -> ServiceResult<Json<MemberDto>> {
    // Members may fetch themselves, staff with member management may fetch anyone.
    match state.session_require()?.subject {
        Subject::Member(member) if member.id == id => {}
        Subject::Member(_) => return Err(ServiceError::Forbidden("Missing permissions!")),
        Subject::Staff(_) => {
            state.session_require_permission(Operation::ManageMembers)?;
        }
    }

    let member = state.db.get_member_by_id(id).await?;
    if let Some(member) = member {
        return Ok(Json(MemberDto::from(&member)));
    }

    Err(ServiceError::NotFound)
}

fn get_member_docs(op: TransformOperation) -> TransformOperation {
    op.description("Get a member by id.")
        .tag("members")
        .response::<200, Json<MemberDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested member does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff", "self"])
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateMemberDto {
    pub fullname: String,
    pub email: String,
    pub password: String,
    pub member_number: Option<String>,
}

/// Create a member plus their savings and checking accounts.
/// Self-registration does not exist; this is a staff operation.
async fn create_member(
    mut state: RequestState,
    form: Json<CreateMemberDto>,
) -> ServiceResult<Json<MemberDto>> {
    state.session_require_permission(Operation::ManageMembers)?;
    let form = form.0;

    if form.fullname.trim().is_empty() || form.email.trim().is_empty() {
        return Err(ServiceError::BadRequest(
            "Fullname and email are required".to_string(),
        ));
    }
    if state.db.get_member_by_email(&form.email).await?.is_some() {
        return Err(ServiceError::BadRequest(
            "A member with this email already exists".to_string(),
        ));
    }

    let member_number = match form.member_number {
        Some(number) if !number.trim().is_empty() => number.trim().to_string(),
        _ => generate_member_number(),
    };
    if state
        .db
        .get_member_by_member_number(&member_number)
        .await?
        .is_some()
    {
        return Err(ServiceError::BadRequest(
            "This member number is already in use".to_string(),
        ));
    }

    let member = state
        .db
        .store_member(models::Member {
            id: 0,
            member_number: member_number.clone(),
            fullname: form.fullname.trim().to_string(),
            email: form.email.trim().to_string(),
            password_hash: password_hash_create(&form.password),
            active: true,
            created_at: Utc::now(),
        })
        .await?;

    for account_type in [AccountType::Savings, AccountType::Checking] {
        state
            .db
            .store_account(Account {
                id: 0,
                member_id: member.id,
                account_type,
                account_number: account_number_for(&member_number, account_type),
                balance_cents: 0,
                created_at: Utc::now(),
            })
            .await?;
    }

    Ok(Json(MemberDto::from(&member)))
}

fn create_member_docs(op: TransformOperation) -> TransformOperation {
    op.description("Create a new member with savings and checking accounts.")
        .tag("members")
        .response::<200, Json<MemberDto>>()
        .response_with::<400, (), _>(|res| res.description("Duplicate email or member number!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff"])
}

pub fn generate_member_number() -> String {
    let digits: u32 = rand::random::<u32>() % 100_000_000;
    format!("MB-{digits:08}")
}

pub fn account_number_for(member_number: &str, account_type: AccountType) -> String {
    let prefix = match account_type {
        AccountType::Savings => "SA",
        AccountType::Checking => "CA",
    };
    format!("{prefix}-{member_number}")
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetMemberActiveDto {
    pub active: bool,
}

async fn set_member_active(
    mut state: RequestState,
    Path(id): Path<u64>,
    form: Json<SetMemberActiveDto>,
) -> ServiceResult<Json<MemberDto>> {
    state.session_require_permission(Operation::ManageMembers)?;

    state.db.set_member_active(id, form.active).await?;
    let member = state.db.get_member_by_id(id).await?;
    if let Some(member) = member {
        return Ok(Json(MemberDto::from(&member)));
    }

    Err(ServiceError::NotFound)
}

fn set_member_active_docs(op: TransformOperation) -> TransformOperation {
    op.description("Activate or deactivate a member. Members are never hard-deleted.")
        .tag("members")
        .response::<200, Json<MemberDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested member does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff"])
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateStaffRoleDto {
    pub role: StaffRoleDto,
}

async fn update_staff_role(
    mut state: RequestState,
    Path(id): Path<u64>,
    form: Json<UpdateStaffRoleDto>,
) -> ServiceResult<Json<StaffDto>> {
    state.session_require_permission(Operation::ManageStaffRoles)?;

    state.db.update_staff_role(id, form.0.role.into()).await?;
    let staff = state.db.get_staff_by_id(id).await?;
    if let Some(staff) = staff {
        return Ok(Json(StaffDto::from(&staff)));
    }

    Err(ServiceError::NotFound)
}

fn update_staff_role_docs(op: TransformOperation) -> TransformOperation {
    op.description("Change a staff account's role. Restricted to it admins.")
        .tag("members")
        .response::<200, Json<StaffDto>>()
        .response_with::<404, (), _>(|res| res.description("The requested staff account does not exist!"))
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["it_admin"])
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ChangePasswordDto {
    pub old_password: String,
    pub new_password: String,
}

async fn change_own_password(
    mut state: RequestState,
    form: Json<ChangePasswordDto>,
) -> ServiceResult<Json<StaffDto>> {
    let mut staff = state.session_require_staff()?;
    let form = form.0;

    if !super::password_hash_verify(&staff.password_hash, &form.old_password)? {
        return Err(ServiceError::Unauthorized("Invalid username or password"));
    }
    if form.new_password.trim().is_empty() {
        return Err(ServiceError::BadRequest(
            "The new password must not be empty".to_string(),
        ));
    }

    staff.password_hash = password_hash_create(&form.new_password);
    let staff = state.db.store_staff_account(staff).await?;

    Ok(Json(StaffDto::from(&staff)))
}

fn change_own_password_docs(op: TransformOperation) -> TransformOperation {
    op.description("Change the password of the current staff account.")
        .tag("members")
        .response::<200, Json<StaffDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .security_requirement_scopes("SessionToken", ["staff"])
}

async fn import_members(
    mut state: RequestState,
    form: Json<Vec<serde_json::Value>>,
) -> ServiceResult<Json<ImportReportDto>> {
    state.session_require_permission(Operation::ImportMembers)?;

    let report = member_import::import_members(&mut state.db, form.0).await?;
    Ok(Json(report))
}

fn import_members_docs(op: TransformOperation) -> TransformOperation {
    op.description("Bulk import members from loosely keyed records.")
        .tag("members")
        .response::<200, Json<ImportReportDto>>()
        .response_with::<401, (), _>(|res| res.description("Missing login!"))
        .response_with::<403, (), _>(|res| res.description("Missing permissions!"))
        .security_requirement_scopes("SessionToken", ["staff"])
}
