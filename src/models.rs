use chrono::{DateTime, Utc};

/// Username of the staff row that is substituted when a review actor
/// cannot be resolved against the staff identity table.
pub const SYSTEM_ACTOR_USERNAME: &str = "system";

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum StaffRole {
    Admin,
    Manager,
    LoanOfficer,
    Cashier,
    ItAdmin,
}

impl StaffRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            StaffRole::Admin => "admin",
            StaffRole::Manager => "manager",
            StaffRole::LoanOfficer => "loan_officer",
            StaffRole::Cashier => "cashier",
            StaffRole::ItAdmin => "it_admin",
        }
    }

    pub fn parse(value: &str) -> Option<StaffRole> {
        match value {
            "admin" => Some(StaffRole::Admin),
            "manager" => Some(StaffRole::Manager),
            "loan_officer" => Some(StaffRole::LoanOfficer),
            "cashier" => Some(StaffRole::Cashier),
            "it_admin" => Some(StaffRole::ItAdmin),
            _ => None,
        }
    }

    pub fn all() -> [StaffRole; 5] {
        [
            StaffRole::Admin,
            StaffRole::Manager,
            StaffRole::LoanOfficer,
            StaffRole::Cashier,
            StaffRole::ItAdmin,
        ]
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct StaffAccount {
    pub id: u64,
    pub fullname: String,
    pub email: String,
    pub username: String,
    pub password_hash: Vec<u8>,
    pub role: StaffRole,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Member {
    pub id: u64,
    pub member_number: String,
    pub fullname: String,
    pub email: String,
    pub password_hash: Vec<u8>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// The authenticated subject carried by a session token.
#[derive(Debug, PartialEq, Clone)]
pub enum Subject {
    Member(Member),
    Staff(StaffAccount),
}

impl Subject {
    pub fn id(&self) -> u64 {
        match self {
            Subject::Member(member) => member.id,
            Subject::Staff(staff) => staff.id,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Session {
    pub subject: Subject,
    pub token: String,
    pub valid_until: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MembershipStatus {
    Pending,
    UnderReview,
    ForwardedToManager,
    Approved,
    Rejected,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipStatus::Pending => "pending",
            MembershipStatus::UnderReview => "under_review",
            MembershipStatus::ForwardedToManager => "forwarded_to_manager",
            MembershipStatus::Approved => "approved",
            MembershipStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<MembershipStatus> {
        match value {
            "pending" => Some(MembershipStatus::Pending),
            "under_review" => Some(MembershipStatus::UnderReview),
            "forwarded_to_manager" => Some(MembershipStatus::ForwardedToManager),
            "approved" => Some(MembershipStatus::Approved),
            "rejected" => Some(MembershipStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MembershipAction {
    PickUp,
    ForwardToManager,
    Approve,
    Reject,
}

impl MembershipAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            MembershipAction::PickUp => "pick_up",
            MembershipAction::ForwardToManager => "forward_to_manager",
            MembershipAction::Approve => "approve",
            MembershipAction::Reject => "reject",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct MembershipApplication {
    pub id: u64,
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub employer: String,
    pub occupation: String,
    pub monthly_income_cents: Option<i64>,
    pub reference_name: Option<String>,
    pub reference_contact: Option<String>,
    pub status: MembershipStatus,
    pub membership_number: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct MembershipReview {
    pub id: u64,
    pub application_id: u64,
    pub reviewer_id: u64,
    pub role: StaffRole,
    pub action: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum ReviewStatus {
    PendingReview,
    UnderReview,
    Approved,
    Rejected,
    Returned,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::PendingReview => "pending_review",
            ReviewStatus::UnderReview => "under_review",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::Returned => "returned",
        }
    }

    pub fn parse(value: &str) -> Option<ReviewStatus> {
        match value {
            "pending_review" => Some(ReviewStatus::PendingReview),
            "under_review" => Some(ReviewStatus::UnderReview),
            "approved" => Some(ReviewStatus::Approved),
            "rejected" => Some(ReviewStatus::Rejected),
            "returned" => Some(ReviewStatus::Returned),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ReviewStatus::Approved | ReviewStatus::Rejected)
    }
}

/// Loan officer actions on an application in `under_review`.
///
/// `ApproveForManager` intentionally leaves the status at `under_review`;
/// readiness for the manager is only visible in the review history.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OfficerAction {
    ApproveForManager,
    ReturnToMember,
    Reject,
}

impl OfficerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfficerAction::ApproveForManager => "approve_for_manager",
            OfficerAction::ReturnToMember => "return_to_member",
            OfficerAction::Reject => "reject",
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum ManagerAction {
    Approve,
    Reject,
}

impl ManagerAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ManagerAction::Approve => "approve",
            ManagerAction::Reject => "reject",
        }
    }
}

/// Applicant data snapshotted from the membership record at submission time.
/// This is a point-in-time capture, never re-joined against live member data.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct ApplicantSnapshot {
    pub fullname: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub employer: String,
    pub occupation: String,
}

#[derive(Debug, PartialEq, Clone)]
pub struct LoanApplication {
    pub id: u64,
    pub member_id: u64,
    pub applicant: ApplicantSnapshot,
    pub amount_cents: i64,
    pub interest_rate: Option<f64>,
    pub term_months: Option<i64>,
    pub purpose: String,
    pub credit_score: Option<i64>,
    pub monthly_income_cents: Option<i64>,
    pub employment_status: Option<String>,
    pub collateral: Option<String>,
    pub priority: Option<String>,
    pub government_id_path: Option<String>,
    pub company_id_path: Option<String>,
    pub review_status: ReviewStatus,
    pub loan_officer_id: Option<u64>,
    pub manager_id: Option<u64>,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct LoanReview {
    pub id: u64,
    pub application_id: u64,
    pub reviewer_id: u64,
    pub role: StaffRole,
    pub action: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Optional structured review fields. All values pass through the lenient
/// numeric coercion contract before reaching the database: malformed input
/// becomes `None`, never an error.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct LoanReviewFields {
    pub amount_cents: Option<i64>,
    pub interest_rate: Option<f64>,
    pub term_months: Option<i64>,
    pub purpose: Option<String>,
    pub credit_score: Option<i64>,
    pub monthly_income_cents: Option<i64>,
    pub employment_status: Option<String>,
    pub collateral: Option<String>,
    pub priority: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum AccountType {
    Savings,
    Checking,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Savings => "savings",
            AccountType::Checking => "checking",
        }
    }

    pub fn parse(value: &str) -> Option<AccountType> {
        match value {
            "savings" => Some(AccountType::Savings),
            "checking" => Some(AccountType::Checking),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TransactionType {
    Credit,
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }

    pub fn parse(value: &str) -> Option<TransactionType> {
        match value {
            "credit" => Some(TransactionType::Credit),
            "debit" => Some(TransactionType::Debit),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Account {
    pub id: u64,
    pub member_id: u64,
    pub account_type: AccountType,
    pub account_number: String,
    pub balance_cents: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Transaction {
    pub id: u64,
    pub member_id: u64,
    pub account_id: u64,
    pub transaction_type: TransactionType,
    /// Signed amount: credits positive, debits negative.
    pub amount_cents: i64,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum PaymentReferenceStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl PaymentReferenceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentReferenceStatus::Pending => "pending",
            PaymentReferenceStatus::Confirmed => "confirmed",
            PaymentReferenceStatus::Rejected => "rejected",
        }
    }

    pub fn parse(value: &str) -> Option<PaymentReferenceStatus> {
        match value {
            "pending" => Some(PaymentReferenceStatus::Pending),
            "confirmed" => Some(PaymentReferenceStatus::Confirmed),
            "rejected" => Some(PaymentReferenceStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct PaymentReference {
    pub id: u64,
    pub member_id: u64,
    pub image_path: String,
    pub reference_text: Option<String>,
    pub amount_cents: Option<i64>,
    pub status: PaymentReferenceStatus,
    pub confirmed_by: Option<u64>,
    pub notes: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, PartialEq, Clone)]
pub struct InvoiceItem {
    pub description: String,
    pub amount_cents: i64,
}

#[derive(Debug, PartialEq, Clone)]
pub struct Invoice {
    pub id: u64,
    pub member_id: u64,
    pub issued_by: u64,
    pub items: Vec<InvoiceItem>,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

/// Per-status totals over the full loan application set,
/// produced by a single grouped count.
#[derive(Debug, PartialEq, Clone, Default)]
pub struct LoanStatistics {
    pub pending_review: i64,
    pub under_review: i64,
    pub approved: i64,
    pub rejected: i64,
    pub returned: i64,
}
