use chrono::{DateTime, Utc};
use sqlx::migrate::Migrator;
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Connection, PgPool, Pool, Postgres, Row};

use crate::error::{ServiceError, ServiceResult};
use crate::models::{
    Account, AccountType, ApplicantSnapshot, Invoice, InvoiceItem, LoanApplication,
    LoanReview, LoanReviewFields, LoanStatistics, ManagerAction, Member, MembershipAction,
    MembershipApplication, MembershipReview, MembershipStatus, OfficerAction, PaymentReference,
    PaymentReferenceStatus, ReviewStatus, Session, StaffAccount, StaffRole, Subject, Transaction,
    TransactionType, SYSTEM_ACTOR_USERNAME,
};

mod migration;
#[cfg(test)]
mod tests;

/// Hard cap for transaction listings, regardless of the requested page size.
pub const TRANSACTION_PAGE_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct AppState {
    pub pool: Pool<Postgres>,
}

impl AppState {
    pub async fn connect(url: &str) -> AppState {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .expect("connect to database");

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: PgPool) -> AppState {
        let migrator = Migrator::new(migration::postgresql_migrations())
            .await
            .expect("load migrations");
        migrator.run(&pool).await.expect("run migrations");

        AppState { pool }
    }
}

pub struct DatabaseConnection {
    pub connection: PoolConnection<Postgres>,
}

fn parse_staff_role(value: &str) -> ServiceResult<StaffRole> {
    StaffRole::parse(value)
        .ok_or_else(|| ServiceError::InternalServerError(format!("unknown staff role '{value}'")))
}

fn parse_membership_status(value: &str) -> ServiceResult<MembershipStatus> {
    MembershipStatus::parse(value).ok_or_else(|| {
        ServiceError::InternalServerError(format!("unknown membership status '{value}'"))
    })
}

fn parse_review_status(value: &str) -> ServiceResult<ReviewStatus> {
    ReviewStatus::parse(value)
        .ok_or_else(|| ServiceError::InternalServerError(format!("unknown review status '{value}'")))
}

fn parse_account_type(value: &str) -> ServiceResult<AccountType> {
    AccountType::parse(value)
        .ok_or_else(|| ServiceError::InternalServerError(format!("unknown account type '{value}'")))
}

fn parse_transaction_type(value: &str) -> ServiceResult<TransactionType> {
    TransactionType::parse(value).ok_or_else(|| {
        ServiceError::InternalServerError(format!("unknown transaction type '{value}'"))
    })
}

fn parse_payment_reference_status(value: &str) -> ServiceResult<PaymentReferenceStatus> {
    PaymentReferenceStatus::parse(value).ok_or_else(|| {
        ServiceError::InternalServerError(format!("unknown payment reference status '{value}'"))
    })
}

fn row_to_staff(row: &PgRow) -> ServiceResult<StaffAccount> {
    Ok(StaffAccount {
        id: row.try_get::<i64, _>("id")? as u64,
        fullname: row.try_get("fullname")?,
        email: row.try_get("email")?,
        username: row.try_get("username")?,
        password_hash: row.try_get("password_hash")?,
        role: parse_staff_role(row.try_get::<String, _>("role")?.as_str())?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_member(row: &PgRow) -> ServiceResult<Member> {
    Ok(Member {
        id: row.try_get::<i64, _>("id")? as u64,
        member_number: row.try_get("member_number")?,
        fullname: row.try_get("fullname")?,
        email: row.try_get("email")?,
        password_hash: row.try_get("password_hash")?,
        active: row.try_get("active")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_membership_application(row: &PgRow) -> ServiceResult<MembershipApplication> {
    Ok(MembershipApplication {
        id: row.try_get::<i64, _>("id")? as u64,
        fullname: row.try_get("fullname")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        address: row.try_get("address")?,
        employer: row.try_get("employer")?,
        occupation: row.try_get("occupation")?,
        monthly_income_cents: row.try_get("monthly_income_cents")?,
        reference_name: row.try_get("reference_name")?,
        reference_contact: row.try_get("reference_contact")?,
        status: parse_membership_status(row.try_get::<String, _>("status")?.as_str())?,
        membership_number: row.try_get("membership_number")?,
        submitted_at: row.try_get("submitted_at")?,
        reviewed_at: row.try_get("reviewed_at")?,
    })
}

fn row_to_membership_review(row: &PgRow) -> ServiceResult<MembershipReview> {
    Ok(MembershipReview {
        id: row.try_get::<i64, _>("id")? as u64,
        application_id: row.try_get::<i64, _>("application_id")? as u64,
        reviewer_id: row.try_get::<i64, _>("reviewer_id")? as u64,
        role: parse_staff_role(row.try_get::<String, _>("role")?.as_str())?,
        action: row.try_get("action")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_loan_application(row: &PgRow) -> ServiceResult<LoanApplication> {
    Ok(LoanApplication {
        id: row.try_get::<i64, _>("id")? as u64,
        member_id: row.try_get::<i64, _>("member_id")? as u64,
        applicant: ApplicantSnapshot {
            fullname: row.try_get("applicant_fullname")?,
            email: row.try_get("applicant_email")?,
            phone: row.try_get("applicant_phone")?,
            address: row.try_get("applicant_address")?,
            employer: row.try_get("applicant_employer")?,
            occupation: row.try_get("applicant_occupation")?,
        },
        amount_cents: row.try_get("amount_cents")?,
        interest_rate: row.try_get("interest_rate")?,
        term_months: row.try_get("term_months")?,
        purpose: row.try_get("purpose")?,
        credit_score: row.try_get("credit_score")?,
        monthly_income_cents: row.try_get("monthly_income_cents")?,
        employment_status: row.try_get("employment_status")?,
        collateral: row.try_get("collateral")?,
        priority: row.try_get("priority")?,
        government_id_path: row.try_get("government_id_path")?,
        company_id_path: row.try_get("company_id_path")?,
        review_status: parse_review_status(row.try_get::<String, _>("review_status")?.as_str())?,
        loan_officer_id: row
            .try_get::<Option<i64>, _>("loan_officer_id")?
            .map(|id| id as u64),
        manager_id: row
            .try_get::<Option<i64>, _>("manager_id")?
            .map(|id| id as u64),
        submitted_at: row.try_get("submitted_at")?,
        reviewed_at: row.try_get("reviewed_at")?,
        rejected_at: row.try_get("rejected_at")?,
    })
}

fn row_to_loan_review(row: &PgRow) -> ServiceResult<LoanReview> {
    Ok(LoanReview {
        id: row.try_get::<i64, _>("id")? as u64,
        application_id: row.try_get::<i64, _>("application_id")? as u64,
        reviewer_id: row.try_get::<i64, _>("reviewer_id")? as u64,
        role: parse_staff_role(row.try_get::<String, _>("role")?.as_str())?,
        action: row.try_get("action")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_account(row: &PgRow) -> ServiceResult<Account> {
    Ok(Account {
        id: row.try_get::<i64, _>("id")? as u64,
        member_id: row.try_get::<i64, _>("member_id")? as u64,
        account_type: parse_account_type(row.try_get::<String, _>("account_type")?.as_str())?,
        account_number: row.try_get("account_number")?,
        balance_cents: row.try_get("balance_cents")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_transaction(row: &PgRow) -> ServiceResult<Transaction> {
    Ok(Transaction {
        id: row.try_get::<i64, _>("id")? as u64,
        member_id: row.try_get::<i64, _>("member_id")? as u64,
        account_id: row.try_get::<i64, _>("account_id")? as u64,
        transaction_type: parse_transaction_type(
            row.try_get::<String, _>("transaction_type")?.as_str(),
        )?,
        amount_cents: row.try_get("amount_cents")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
    })
}

fn row_to_payment_reference(row: &PgRow) -> ServiceResult<PaymentReference> {
    Ok(PaymentReference {
        id: row.try_get::<i64, _>("id")? as u64,
        member_id: row.try_get::<i64, _>("member_id")? as u64,
        image_path: row.try_get("image_path")?,
        reference_text: row.try_get("reference_text")?,
        amount_cents: row.try_get("amount_cents")?,
        status: parse_payment_reference_status(row.try_get::<String, _>("status")?.as_str())?,
        confirmed_by: row
            .try_get::<Option<i64>, _>("confirmed_by")?
            .map(|id| id as u64),
        notes: row.try_get("notes")?,
        resolved_at: row.try_get("resolved_at")?,
        submitted_at: row.try_get("submitted_at")?,
    })
}

fn row_to_invoice(row: &PgRow) -> ServiceResult<Invoice> {
    let items: serde_json::Value = row.try_get("items")?;
    let items: Vec<InvoiceItem> = items
        .as_array()
        .map(|arr| {
            arr.iter()
                .map(|item| InvoiceItem {
                    description: item["description"].as_str().unwrap_or("").to_string(),
                    amount_cents: item["amount_cents"].as_i64().unwrap_or(0),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(Invoice {
        id: row.try_get::<i64, _>("id")? as u64,
        member_id: row.try_get::<i64, _>("member_id")? as u64,
        issued_by: row.try_get::<i64, _>("issued_by")? as u64,
        items,
        total_cents: row.try_get("total_cents")?,
        created_at: row.try_get("created_at")?,
    })
}

impl DatabaseConnection {
    // ------------------------------------------------------------------
    // staff accounts

    pub async fn store_staff_account(
        &mut self,
        mut staff: StaffAccount,
    ) -> ServiceResult<StaffAccount> {
        if staff.id == 0 {
            let row = sqlx::query(
                r#"INSERT INTO staff_accounts (fullname, email, username, password_hash, role)
                   VALUES ($1, $2, $3, $4, $5) RETURNING id, created_at"#,
            )
            .bind(&staff.fullname)
            .bind(&staff.email)
            .bind(&staff.username)
            .bind(&staff.password_hash)
            .bind(staff.role.as_str())
            .fetch_one(&mut *self.connection)
            .await?;

            staff.id = row.try_get::<i64, _>("id")? as u64;
            staff.created_at = row.try_get("created_at")?;
        } else {
            sqlx::query(
                r#"UPDATE staff_accounts
                   SET fullname = $2, email = $3, username = $4, password_hash = $5, role = $6
                   WHERE id = $1"#,
            )
            .bind(staff.id as i64)
            .bind(&staff.fullname)
            .bind(&staff.email)
            .bind(&staff.username)
            .bind(&staff.password_hash)
            .bind(staff.role.as_str())
            .execute(&mut *self.connection)
            .await?;
        }

        Ok(staff)
    }

    pub async fn get_staff_by_id(&mut self, id: u64) -> ServiceResult<Option<StaffAccount>> {
        let row = sqlx::query("SELECT * FROM staff_accounts WHERE id = $1")
            .bind(id as i64)
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(row_to_staff).transpose()
    }

    pub async fn get_staff_by_username(
        &mut self,
        username: &str,
    ) -> ServiceResult<Option<StaffAccount>> {
        let row = sqlx::query("SELECT * FROM staff_accounts WHERE username = $1")
            .bind(username)
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(row_to_staff).transpose()
    }

    pub async fn update_staff_role(&mut self, id: u64, role: StaffRole) -> ServiceResult<()> {
        let result = sqlx::query("UPDATE staff_accounts SET role = $2 WHERE id = $1")
            .bind(id as i64)
            .bind(role.as_str())
            .execute(&mut *self.connection)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound);
        }
        Ok(())
    }

    pub async fn list_loan_officers(&mut self) -> ServiceResult<Vec<StaffAccount>> {
        let rows = sqlx::query(
            "SELECT * FROM staff_accounts WHERE role = 'loan_officer' ORDER BY fullname",
        )
        .fetch_all(&mut *self.connection)
        .await?;

        rows.iter().map(row_to_staff).collect()
    }

    // ------------------------------------------------------------------
    // members

    pub async fn store_member(&mut self, mut member: Member) -> ServiceResult<Member> {
        if member.id == 0 {
            let row = sqlx::query(
                r#"INSERT INTO members (member_number, fullname, email, password_hash, active)
                   VALUES ($1, $2, $3, $4, $5) RETURNING id, created_at"#,
            )
            .bind(&member.member_number)
            .bind(&member.fullname)
            .bind(&member.email)
            .bind(&member.password_hash)
            .bind(member.active)
            .fetch_one(&mut *self.connection)
            .await?;

            member.id = row.try_get::<i64, _>("id")? as u64;
            member.created_at = row.try_get("created_at")?;
        } else {
            sqlx::query(
                r#"UPDATE members
                   SET member_number = $2, fullname = $3, email = $4, password_hash = $5, active = $6
                   WHERE id = $1"#,
            )
            .bind(member.id as i64)
            .bind(&member.member_number)
            .bind(&member.fullname)
            .bind(&member.email)
            .bind(&member.password_hash)
            .bind(member.active)
            .execute(&mut *self.connection)
            .await?;
        }

        Ok(member)
    }

    pub async fn get_member_by_id(&mut self, id: u64) -> ServiceResult<Option<Member>> {
        let row = sqlx::query("SELECT * FROM members WHERE id = $1")
            .bind(id as i64)
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(row_to_member).transpose()
    }

    pub async fn get_member_by_email(&mut self, email: &str) -> ServiceResult<Option<Member>> {
        let row = sqlx::query("SELECT * FROM members WHERE email = $1")
            .bind(email)
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(row_to_member).transpose()
    }

    pub async fn get_member_by_member_number(
        &mut self,
        member_number: &str,
    ) -> ServiceResult<Option<Member>> {
        let row = sqlx::query("SELECT * FROM members WHERE member_number = $1")
            .bind(member_number)
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(row_to_member).transpose()
    }

    pub async fn list_members(&mut self, search: Option<&str>) -> ServiceResult<Vec<Member>> {
        let rows = match search {
            Some(search) => {
                sqlx::query(
                    r#"SELECT * FROM members
                       WHERE fullname ILIKE $1 OR email ILIKE $1 OR member_number ILIKE $1
                       ORDER BY id"#,
                )
                .bind(format!("%{search}%"))
                .fetch_all(&mut *self.connection)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM members ORDER BY id")
                    .fetch_all(&mut *self.connection)
                    .await?
            }
        };

        rows.iter().map(row_to_member).collect()
    }

    pub async fn set_member_active(&mut self, id: u64, active: bool) -> ServiceResult<()> {
        let result = sqlx::query("UPDATE members SET active = $2 WHERE id = $1")
            .bind(id as i64)
            .bind(active)
            .execute(&mut *self.connection)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::NotFound);
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // sessions

    pub async fn create_session_token(
        &mut self,
        subject: &Subject,
        valid_until: DateTime<Utc>,
    ) -> ServiceResult<String> {
        use base64::engine::general_purpose;
        use base64::Engine;

        let token = general_purpose::URL_SAFE_NO_PAD.encode(rand::random::<[u8; 32]>());
        let (kind, subject_id) = match subject {
            Subject::Member(member) => ("member", member.id),
            Subject::Staff(staff) => ("staff", staff.id),
        };

        sqlx::query(
            r#"INSERT INTO sessions (token, subject_kind, subject_id, valid_until)
               VALUES ($1, $2, $3, $4)"#,
        )
        .bind(&token)
        .bind(kind)
        .bind(subject_id as i64)
        .bind(valid_until)
        .execute(&mut *self.connection)
        .await?;

        Ok(token)
    }

    pub async fn get_session_by_session_token(
        &mut self,
        token: String,
    ) -> ServiceResult<Option<Session>> {
        let row = sqlx::query("SELECT * FROM sessions WHERE token = $1 AND valid_until > now()")
            .bind(&token)
            .fetch_optional(&mut *self.connection)
            .await?;

        let row = match row {
            Some(row) => row,
            None => return Ok(None),
        };

        let subject_kind: String = row.try_get("subject_kind")?;
        let subject_id = row.try_get::<i64, _>("subject_id")? as u64;
        let valid_until: DateTime<Utc> = row.try_get("valid_until")?;

        let subject = match subject_kind.as_str() {
            "member" => match self.get_member_by_id(subject_id).await? {
                Some(member) if member.active => Subject::Member(member),
                _ => return Ok(None),
            },
            "staff" => match self.get_staff_by_id(subject_id).await? {
                Some(staff) => Subject::Staff(staff),
                None => return Ok(None),
            },
            _ => return Ok(None),
        };

        Ok(Some(Session {
            subject,
            token,
            valid_until,
        }))
    }

    pub async fn delete_session_token(&mut self, token: String) -> ServiceResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&mut *self.connection)
            .await?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // membership applications

    pub async fn create_membership_application(
        &mut self,
        application: MembershipApplication,
    ) -> ServiceResult<MembershipApplication> {
        let duplicate = sqlx::query(
            r#"SELECT 1 AS hit FROM membership_applications WHERE email = $1
               UNION ALL
               SELECT 1 AS hit FROM members WHERE email = $1
               LIMIT 1"#,
        )
        .bind(&application.email)
        .fetch_optional(&mut *self.connection)
        .await?;

        if duplicate.is_some() {
            return Err(ServiceError::BadRequest(
                "An application or member with this email already exists".to_string(),
            ));
        }

        let mut application = application;
        let row = sqlx::query(
            r#"INSERT INTO membership_applications
               (fullname, email, phone, address, employer, occupation, monthly_income_cents,
                reference_name, reference_contact, status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending')
               RETURNING id, submitted_at"#,
        )
        .bind(&application.fullname)
        .bind(&application.email)
        .bind(&application.phone)
        .bind(&application.address)
        .bind(&application.employer)
        .bind(&application.occupation)
        .bind(application.monthly_income_cents)
        .bind(&application.reference_name)
        .bind(&application.reference_contact)
        .fetch_one(&mut *self.connection)
        .await?;

        application.id = row.try_get::<i64, _>("id")? as u64;
        application.submitted_at = row.try_get("submitted_at")?;
        application.status = MembershipStatus::Pending;
        application.membership_number = None;
        application.reviewed_at = None;

        Ok(application)
    }

    pub async fn get_membership_application(
        &mut self,
        id: u64,
    ) -> ServiceResult<Option<MembershipApplication>> {
        let row = sqlx::query("SELECT * FROM membership_applications WHERE id = $1")
            .bind(id as i64)
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(row_to_membership_application).transpose()
    }

    pub async fn get_membership_reviews(
        &mut self,
        application_id: u64,
    ) -> ServiceResult<Vec<MembershipReview>> {
        let rows = sqlx::query(
            "SELECT * FROM membership_reviews WHERE application_id = $1 ORDER BY id",
        )
        .bind(application_id as i64)
        .fetch_all(&mut *self.connection)
        .await?;

        rows.iter().map(row_to_membership_review).collect()
    }

    pub async fn list_membership_applications(
        &mut self,
        status: Option<MembershipStatus>,
    ) -> ServiceResult<Vec<MembershipApplication>> {
        let rows = match status {
            Some(status) => {
                sqlx::query(
                    r#"SELECT * FROM membership_applications WHERE status = $1
                       ORDER BY submitted_at DESC, id DESC"#,
                )
                .bind(status.as_str())
                .fetch_all(&mut *self.connection)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT * FROM membership_applications ORDER BY submitted_at DESC, id DESC",
                )
                .fetch_all(&mut *self.connection)
                .await?
            }
        };

        rows.iter().map(row_to_membership_application).collect()
    }

    /// Apply a membership status transition and append the review row in one
    /// database transaction.
    pub async fn membership_transition(
        &mut self,
        application_id: u64,
        action: MembershipAction,
        reviewer: &StaffAccount,
        notes: &str,
        membership_number: Option<String>,
    ) -> ServiceResult<MembershipApplication> {
        let mut tx = self.connection.begin().await?;

        let row = sqlx::query("SELECT * FROM membership_applications WHERE id = $1 FOR UPDATE")
            .bind(application_id as i64)
            .fetch_optional(&mut *tx)
            .await?;
        let application = match row.as_ref() {
            Some(row) => row_to_membership_application(row)?,
            None => return Err(ServiceError::NotFound),
        };

        let (new_status, assigned_number, set_reviewed_at) = match action {
            MembershipAction::PickUp => {
                if application.status != MembershipStatus::Pending {
                    return Err(ServiceError::IllegalState(
                        "Application is not pending and cannot be picked up",
                    ));
                }
                (MembershipStatus::UnderReview, application.membership_number.clone(), false)
            }
            MembershipAction::ForwardToManager => {
                if application.status != MembershipStatus::UnderReview {
                    return Err(ServiceError::IllegalState(
                        "Application is not under review and cannot be forwarded",
                    ));
                }
                // Escalation requires an assigned membership number, enforced here
                // and not only in the portal forms.
                let number = membership_number
                    .clone()
                    .or_else(|| application.membership_number.clone())
                    .filter(|n| !n.trim().is_empty())
                    .ok_or_else(|| {
                        ServiceError::BadRequest(
                            "A membership number must be assigned before forwarding to a manager"
                                .to_string(),
                        )
                    })?;

                let duplicate = sqlx::query(
                    r#"SELECT 1 AS hit FROM membership_applications
                       WHERE membership_number = $1 AND id <> $2
                       UNION ALL
                       SELECT 1 AS hit FROM members WHERE member_number = $1
                       LIMIT 1"#,
                )
                .bind(&number)
                .bind(application_id as i64)
                .fetch_optional(&mut *tx)
                .await?;
                if duplicate.is_some() {
                    return Err(ServiceError::BadRequest(
                        "This membership number is already in use".to_string(),
                    ));
                }

                (MembershipStatus::ForwardedToManager, Some(number), false)
            }
            MembershipAction::Approve => {
                if application.status != MembershipStatus::ForwardedToManager {
                    return Err(ServiceError::IllegalState(
                        "Application was not forwarded to a manager and cannot be approved",
                    ));
                }
                (MembershipStatus::Approved, application.membership_number.clone(), true)
            }
            MembershipAction::Reject => {
                if !matches!(
                    application.status,
                    MembershipStatus::UnderReview | MembershipStatus::ForwardedToManager
                ) {
                    return Err(ServiceError::IllegalState(
                        "Application is not in a reviewable state and cannot be rejected",
                    ));
                }
                (MembershipStatus::Rejected, application.membership_number.clone(), true)
            }
        };

        let row = sqlx::query(
            r#"UPDATE membership_applications
               SET status = $2, membership_number = $3,
                   reviewed_at = CASE WHEN $4 THEN now() ELSE reviewed_at END
               WHERE id = $1
               RETURNING *"#,
        )
        .bind(application_id as i64)
        .bind(new_status.as_str())
        .bind(&assigned_number)
        .bind(set_reviewed_at)
        .fetch_one(&mut *tx)
        .await?;
        let application = row_to_membership_application(&row)?;

        sqlx::query(
            r#"INSERT INTO membership_reviews (application_id, reviewer_id, role, action, notes)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(application_id as i64)
        .bind(reviewer.id as i64)
        .bind(reviewer.role.as_str())
        .bind(action.as_str())
        .bind(notes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(application)
    }

    pub async fn get_approved_membership_application_by_member_number(
        &mut self,
        member_number: &str,
    ) -> ServiceResult<Option<MembershipApplication>> {
        let row = sqlx::query(
            r#"SELECT * FROM membership_applications
               WHERE membership_number = $1 AND status = 'approved'
               ORDER BY id DESC LIMIT 1"#,
        )
        .bind(member_number)
        .fetch_optional(&mut *self.connection)
        .await?;

        row.as_ref().map(row_to_membership_application).transpose()
    }

    // ------------------------------------------------------------------
    // loan applications

    pub async fn create_loan_application(
        &mut self,
        mut application: LoanApplication,
    ) -> ServiceResult<LoanApplication> {
        let row = sqlx::query(
            r#"INSERT INTO loan_applications
               (member_id, applicant_fullname, applicant_email, applicant_phone,
                applicant_address, applicant_employer, applicant_occupation,
                amount_cents, interest_rate, term_months, purpose, credit_score,
                monthly_income_cents, employment_status, collateral, priority,
                government_id_path, company_id_path, review_status)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16,
                       $17, $18, 'pending_review')
               RETURNING id, submitted_at"#,
        )
        .bind(application.member_id as i64)
        .bind(&application.applicant.fullname)
        .bind(&application.applicant.email)
        .bind(&application.applicant.phone)
        .bind(&application.applicant.address)
        .bind(&application.applicant.employer)
        .bind(&application.applicant.occupation)
        .bind(application.amount_cents)
        .bind(application.interest_rate)
        .bind(application.term_months)
        .bind(&application.purpose)
        .bind(application.credit_score)
        .bind(application.monthly_income_cents)
        .bind(&application.employment_status)
        .bind(&application.collateral)
        .bind(&application.priority)
        .bind(&application.government_id_path)
        .bind(&application.company_id_path)
        .fetch_one(&mut *self.connection)
        .await?;

        application.id = row.try_get::<i64, _>("id")? as u64;
        application.submitted_at = row.try_get("submitted_at")?;
        application.review_status = ReviewStatus::PendingReview;

        Ok(application)
    }

    pub async fn get_loan_application(
        &mut self,
        id: u64,
    ) -> ServiceResult<Option<LoanApplication>> {
        let row = sqlx::query("SELECT * FROM loan_applications WHERE id = $1")
            .bind(id as i64)
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(row_to_loan_application).transpose()
    }

    pub async fn get_loan_reviews(
        &mut self,
        application_id: u64,
    ) -> ServiceResult<Vec<LoanReview>> {
        let rows = sqlx::query("SELECT * FROM loan_reviews WHERE application_id = $1 ORDER BY id")
            .bind(application_id as i64)
            .fetch_all(&mut *self.connection)
            .await?;

        rows.iter().map(row_to_loan_review).collect()
    }

    /// List applications, newest first with stable id tie-break. An officer
    /// scope restricts the result to unassigned applications plus those
    /// assigned to that officer.
    pub async fn list_loan_applications(
        &mut self,
        status: Option<ReviewStatus>,
        officer_scope: Option<u64>,
        member_scope: Option<u64>,
    ) -> ServiceResult<Vec<LoanApplication>> {
        let rows = match (status, officer_scope, member_scope) {
            (Some(status), Some(officer), _) => {
                sqlx::query(
                    r#"SELECT * FROM loan_applications
                       WHERE review_status = $1
                         AND (loan_officer_id IS NULL OR loan_officer_id = $2)
                       ORDER BY submitted_at DESC, id DESC"#,
                )
                .bind(status.as_str())
                .bind(officer as i64)
                .fetch_all(&mut *self.connection)
                .await?
            }
            (None, Some(officer), _) => {
                sqlx::query(
                    r#"SELECT * FROM loan_applications
                       WHERE loan_officer_id IS NULL OR loan_officer_id = $1
                       ORDER BY submitted_at DESC, id DESC"#,
                )
                .bind(officer as i64)
                .fetch_all(&mut *self.connection)
                .await?
            }
            (Some(status), None, Some(member)) => {
                sqlx::query(
                    r#"SELECT * FROM loan_applications
                       WHERE review_status = $1 AND member_id = $2
                       ORDER BY submitted_at DESC, id DESC"#,
                )
                .bind(status.as_str())
                .bind(member as i64)
                .fetch_all(&mut *self.connection)
                .await?
            }
            (None, None, Some(member)) => {
                sqlx::query(
                    r#"SELECT * FROM loan_applications WHERE member_id = $1
                       ORDER BY submitted_at DESC, id DESC"#,
                )
                .bind(member as i64)
                .fetch_all(&mut *self.connection)
                .await?
            }
            (Some(status), None, None) => {
                sqlx::query(
                    r#"SELECT * FROM loan_applications WHERE review_status = $1
                       ORDER BY submitted_at DESC, id DESC"#,
                )
                .bind(status.as_str())
                .fetch_all(&mut *self.connection)
                .await?
            }
            (None, None, None) => {
                sqlx::query("SELECT * FROM loan_applications ORDER BY submitted_at DESC, id DESC")
                    .fetch_all(&mut *self.connection)
                    .await?
            }
        };

        rows.iter().map(row_to_loan_application).collect()
    }

    /// Assign an unassigned `pending_review` application to a loan officer,
    /// moving it to `under_review`.
    pub async fn assign_loan_officer(
        &mut self,
        application_id: u64,
        officer: &StaffAccount,
    ) -> ServiceResult<LoanApplication> {
        let mut tx = self.connection.begin().await?;

        let row = sqlx::query("SELECT * FROM loan_applications WHERE id = $1 FOR UPDATE")
            .bind(application_id as i64)
            .fetch_optional(&mut *tx)
            .await?;
        let application = match row.as_ref() {
            Some(row) => row_to_loan_application(row)?,
            None => return Err(ServiceError::NotFound),
        };

        if application.review_status != ReviewStatus::PendingReview {
            return Err(ServiceError::IllegalState(
                "Application is not pending review and cannot be assigned",
            ));
        }
        if application.loan_officer_id.is_some() {
            return Err(ServiceError::IllegalState(
                "Application is already assigned to a loan officer",
            ));
        }

        let row = sqlx::query(
            r#"UPDATE loan_applications
               SET review_status = 'under_review', loan_officer_id = $2
               WHERE id = $1 RETURNING *"#,
        )
        .bind(application_id as i64)
        .bind(officer.id as i64)
        .fetch_one(&mut *tx)
        .await?;
        let application = row_to_loan_application(&row)?;

        sqlx::query(
            r#"INSERT INTO loan_reviews (application_id, reviewer_id, role, action, notes)
               VALUES ($1, $2, $3, 'assign', '')"#,
        )
        .bind(application_id as i64)
        .bind(officer.id as i64)
        .bind(officer.role.as_str())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(application)
    }

    /// Loan officer review action on an `under_review` application.
    ///
    /// `fields` replaces the optional review columns wholesale: a `None`
    /// (blank or malformed submission) stores NULL. Only the required
    /// amount and purpose keep their previous value when absent.
    ///
    /// The actor id comes from the staff portal and may not resolve against
    /// the staff table; in that case the seeded system actor is substituted
    /// and the notes are prefixed with the external id, so the audit row is
    /// never dropped.
    pub async fn loan_officer_review(
        &mut self,
        application_id: u64,
        action: OfficerAction,
        actor_id: u64,
        actor_role: StaffRole,
        notes: &str,
        fields: &LoanReviewFields,
    ) -> ServiceResult<LoanApplication> {
        let mut tx = self.connection.begin().await?;

        let row = sqlx::query("SELECT * FROM loan_applications WHERE id = $1 FOR UPDATE")
            .bind(application_id as i64)
            .fetch_optional(&mut *tx)
            .await?;
        let application = match row.as_ref() {
            Some(row) => row_to_loan_application(row)?,
            None => return Err(ServiceError::NotFound),
        };

        if application.review_status != ReviewStatus::UnderReview {
            return Err(ServiceError::IllegalState(
                "Application is not under review",
            ));
        }

        let new_status = match action {
            // Intentionally leaves the status unchanged; readiness for the
            // manager is recorded in the review history only.
            OfficerAction::ApproveForManager => ReviewStatus::UnderReview,
            OfficerAction::ReturnToMember => ReviewStatus::Returned,
            OfficerAction::Reject => ReviewStatus::Rejected,
        };
        let set_rejected_at = action == OfficerAction::Reject;

        let row = sqlx::query(
            r#"UPDATE loan_applications
               SET review_status = $2,
                   rejected_at = CASE WHEN $3 THEN now() ELSE rejected_at END,
                   amount_cents = COALESCE($4, amount_cents),
                   interest_rate = $5,
                   term_months = $6,
                   purpose = COALESCE($7, purpose),
                   credit_score = $8,
                   monthly_income_cents = $9,
                   employment_status = $10,
                   collateral = $11,
                   priority = $12
               WHERE id = $1 RETURNING *"#,
        )
        .bind(application_id as i64)
        .bind(new_status.as_str())
        .bind(set_rejected_at)
        .bind(fields.amount_cents)
        .bind(fields.interest_rate)
        .bind(fields.term_months)
        .bind(&fields.purpose)
        .bind(fields.credit_score)
        .bind(fields.monthly_income_cents)
        .bind(&fields.employment_status)
        .bind(&fields.collateral)
        .bind(&fields.priority)
        .fetch_one(&mut *tx)
        .await?;
        let application = row_to_loan_application(&row)?;

        Self::append_loan_review(&mut tx, application_id, actor_id, actor_role, action.as_str(), notes)
            .await?;

        tx.commit().await?;
        Ok(application)
    }

    /// Manager decision on an `under_review` application.
    pub async fn manager_decision(
        &mut self,
        application_id: u64,
        action: ManagerAction,
        actor_id: u64,
        notes: &str,
    ) -> ServiceResult<LoanApplication> {
        let mut tx = self.connection.begin().await?;

        let row = sqlx::query("SELECT * FROM loan_applications WHERE id = $1 FOR UPDATE")
            .bind(application_id as i64)
            .fetch_optional(&mut *tx)
            .await?;
        let application = match row.as_ref() {
            Some(row) => row_to_loan_application(row)?,
            None => return Err(ServiceError::NotFound),
        };

        if application.review_status != ReviewStatus::UnderReview {
            return Err(ServiceError::IllegalState(
                "Application is not under review",
            ));
        }

        let new_status = match action {
            ManagerAction::Approve => ReviewStatus::Approved,
            ManagerAction::Reject => ReviewStatus::Rejected,
        };

        let resolved = Self::resolve_reviewer_or_system(&mut tx, actor_id).await?;

        let row = sqlx::query(
            r#"UPDATE loan_applications
               SET review_status = $2, reviewed_at = now(), manager_id = $3,
                   rejected_at = CASE WHEN $4 THEN now() ELSE rejected_at END
               WHERE id = $1 RETURNING *"#,
        )
        .bind(application_id as i64)
        .bind(new_status.as_str())
        .bind(resolved.reviewer.id as i64)
        .bind(action == ManagerAction::Reject)
        .fetch_one(&mut *tx)
        .await?;
        let application = row_to_loan_application(&row)?;

        let notes = resolved.annotate(actor_id, notes);
        sqlx::query(
            r#"INSERT INTO loan_reviews (application_id, reviewer_id, role, action, notes)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(application_id as i64)
        .bind(resolved.reviewer.id as i64)
        .bind(StaffRole::Manager.as_str())
        .bind(action.as_str())
        .bind(notes)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(application)
    }

    async fn append_loan_review(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        application_id: u64,
        actor_id: u64,
        actor_role: StaffRole,
        action: &str,
        notes: &str,
    ) -> ServiceResult<()> {
        let resolved = Self::resolve_reviewer_or_system(tx, actor_id).await?;
        let notes = resolved.annotate(actor_id, notes);

        sqlx::query(
            r#"INSERT INTO loan_reviews (application_id, reviewer_id, role, action, notes)
               VALUES ($1, $2, $3, $4, $5)"#,
        )
        .bind(application_id as i64)
        .bind(resolved.reviewer.id as i64)
        .bind(actor_role.as_str())
        .bind(action)
        .bind(notes)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn resolve_reviewer_or_system(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        actor_id: u64,
    ) -> ServiceResult<ResolvedReviewer> {
        let row = sqlx::query("SELECT * FROM staff_accounts WHERE id = $1")
            .bind(actor_id as i64)
            .fetch_optional(&mut **tx)
            .await?;

        if let Some(row) = row.as_ref() {
            return Ok(ResolvedReviewer {
                reviewer: row_to_staff(row)?,
                substituted: false,
            });
        }

        let row = sqlx::query("SELECT * FROM staff_accounts WHERE username = $1")
            .bind(SYSTEM_ACTOR_USERNAME)
            .fetch_one(&mut **tx)
            .await?;

        Ok(ResolvedReviewer {
            reviewer: row_to_staff(&row)?,
            substituted: true,
        })
    }

    /// Per-status counts over the full application set, one grouped query.
    pub async fn loan_statistics(&mut self) -> ServiceResult<LoanStatistics> {
        let rows = sqlx::query(
            "SELECT review_status, COUNT(*) AS count FROM loan_applications GROUP BY review_status",
        )
        .fetch_all(&mut *self.connection)
        .await?;

        let mut stats = LoanStatistics::default();
        for row in rows {
            let status: String = row.try_get("review_status")?;
            let count: i64 = row.try_get("count")?;
            match parse_review_status(&status)? {
                ReviewStatus::PendingReview => stats.pending_review = count,
                ReviewStatus::UnderReview => stats.under_review = count,
                ReviewStatus::Approved => stats.approved = count,
                ReviewStatus::Rejected => stats.rejected = count,
                ReviewStatus::Returned => stats.returned = count,
            }
        }

        Ok(stats)
    }

    // ------------------------------------------------------------------
    // accounts & ledger

    pub async fn store_account(&mut self, mut account: Account) -> ServiceResult<Account> {
        let row = sqlx::query(
            r#"INSERT INTO accounts (member_id, account_type, account_number, balance_cents)
               VALUES ($1, $2, $3, $4) RETURNING id, created_at"#,
        )
        .bind(account.member_id as i64)
        .bind(account.account_type.as_str())
        .bind(&account.account_number)
        .bind(account.balance_cents)
        .fetch_one(&mut *self.connection)
        .await?;

        account.id = row.try_get::<i64, _>("id")? as u64;
        account.created_at = row.try_get("created_at")?;
        Ok(account)
    }

    pub async fn get_account(
        &mut self,
        member_id: u64,
        account_type: AccountType,
    ) -> ServiceResult<Option<Account>> {
        let row = sqlx::query("SELECT * FROM accounts WHERE member_id = $1 AND account_type = $2")
            .bind(member_id as i64)
            .bind(account_type.as_str())
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(row_to_account).transpose()
    }

    pub async fn get_accounts_by_member(&mut self, member_id: u64) -> ServiceResult<Vec<Account>> {
        let rows = sqlx::query("SELECT * FROM accounts WHERE member_id = $1 ORDER BY account_type")
            .bind(member_id as i64)
            .fetch_all(&mut *self.connection)
            .await?;

        rows.iter().map(row_to_account).collect()
    }

    /// Insert a ledger transaction and update the cached balance in one
    /// database transaction. The account row is locked `FOR UPDATE`, which
    /// serializes concurrent balance updates for the same account.
    pub async fn create_transaction(
        &mut self,
        member_id: u64,
        account_type: AccountType,
        transaction_type: TransactionType,
        description: &str,
        amount_cents: i64,
    ) -> ServiceResult<(Transaction, Account)> {
        let mut tx = self.connection.begin().await?;

        let row = sqlx::query(
            "SELECT * FROM accounts WHERE member_id = $1 AND account_type = $2 FOR UPDATE",
        )
        .bind(member_id as i64)
        .bind(account_type.as_str())
        .fetch_optional(&mut *tx)
        .await?;
        let account = match row.as_ref() {
            Some(row) => row_to_account(row)?,
            None => {
                return Err(ServiceError::IllegalState(
                    "No account of the requested type exists for this member",
                ))
            }
        };

        let signed_amount = match transaction_type {
            TransactionType::Credit => amount_cents,
            TransactionType::Debit => -amount_cents,
        };

        let row = sqlx::query(
            r#"INSERT INTO transactions
               (member_id, account_id, transaction_type, amount_cents, description)
               VALUES ($1, $2, $3, $4, $5)
               RETURNING *"#,
        )
        .bind(member_id as i64)
        .bind(account.id as i64)
        .bind(transaction_type.as_str())
        .bind(signed_amount)
        .bind(description)
        .fetch_one(&mut *tx)
        .await?;
        let transaction = row_to_transaction(&row)?;

        let row = sqlx::query(
            "UPDATE accounts SET balance_cents = balance_cents + $2 WHERE id = $1 RETURNING *",
        )
        .bind(account.id as i64)
        .bind(signed_amount)
        .fetch_one(&mut *tx)
        .await?;
        let account = row_to_account(&row)?;

        tx.commit().await?;
        Ok((transaction, account))
    }

    pub async fn get_transactions_by_member(
        &mut self,
        member_id: u64,
        limit: i64,
    ) -> ServiceResult<Vec<Transaction>> {
        let rows = sqlx::query(
            r#"SELECT * FROM transactions WHERE member_id = $1
               ORDER BY created_at DESC, id DESC LIMIT $2"#,
        )
        .bind(member_id as i64)
        .bind(limit.clamp(1, TRANSACTION_PAGE_LIMIT))
        .fetch_all(&mut *self.connection)
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    pub async fn get_transactions_by_account(
        &mut self,
        account_id: u64,
    ) -> ServiceResult<Vec<Transaction>> {
        let rows = sqlx::query(
            "SELECT * FROM transactions WHERE account_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(account_id as i64)
        .fetch_all(&mut *self.connection)
        .await?;

        rows.iter().map(row_to_transaction).collect()
    }

    // ------------------------------------------------------------------
    // payment references

    pub async fn create_payment_reference(
        &mut self,
        member_id: u64,
        image_path: &str,
        reference_text: Option<String>,
        amount_cents: Option<i64>,
    ) -> ServiceResult<PaymentReference> {
        let row = sqlx::query(
            r#"INSERT INTO payment_references
               (member_id, image_path, reference_text, amount_cents, status)
               VALUES ($1, $2, $3, $4, 'pending')
               RETURNING *"#,
        )
        .bind(member_id as i64)
        .bind(image_path)
        .bind(reference_text)
        .bind(amount_cents)
        .fetch_one(&mut *self.connection)
        .await?;

        row_to_payment_reference(&row)
    }

    pub async fn get_payment_reference(
        &mut self,
        id: u64,
    ) -> ServiceResult<Option<PaymentReference>> {
        let row = sqlx::query("SELECT * FROM payment_references WHERE id = $1")
            .bind(id as i64)
            .fetch_optional(&mut *self.connection)
            .await?;

        row.as_ref().map(row_to_payment_reference).transpose()
    }

    pub async fn list_payment_references(
        &mut self,
        status: Option<PaymentReferenceStatus>,
        member_scope: Option<u64>,
    ) -> ServiceResult<Vec<PaymentReference>> {
        let rows = match (status, member_scope) {
            (Some(status), Some(member)) => {
                sqlx::query(
                    r#"SELECT * FROM payment_references
                       WHERE status = $1 AND member_id = $2
                       ORDER BY submitted_at DESC, id DESC"#,
                )
                .bind(status.as_str())
                .bind(member as i64)
                .fetch_all(&mut *self.connection)
                .await?
            }
            (Some(status), None) => {
                sqlx::query(
                    r#"SELECT * FROM payment_references WHERE status = $1
                       ORDER BY submitted_at DESC, id DESC"#,
                )
                .bind(status.as_str())
                .fetch_all(&mut *self.connection)
                .await?
            }
            (None, Some(member)) => {
                sqlx::query(
                    r#"SELECT * FROM payment_references WHERE member_id = $1
                       ORDER BY submitted_at DESC, id DESC"#,
                )
                .bind(member as i64)
                .fetch_all(&mut *self.connection)
                .await?
            }
            (None, None) => {
                sqlx::query("SELECT * FROM payment_references ORDER BY submitted_at DESC, id DESC")
                    .fetch_all(&mut *self.connection)
                    .await?
            }
        };

        rows.iter().map(row_to_payment_reference).collect()
    }

    /// Confirm or reject a pending payment reference. A reference that has
    /// already reached a terminal status cannot be resolved again.
    pub async fn resolve_payment_reference(
        &mut self,
        id: u64,
        confirm: bool,
        staff: &StaffAccount,
        notes: Option<String>,
    ) -> ServiceResult<PaymentReference> {
        let mut tx = self.connection.begin().await?;

        let row = sqlx::query("SELECT * FROM payment_references WHERE id = $1 FOR UPDATE")
            .bind(id as i64)
            .fetch_optional(&mut *tx)
            .await?;
        let reference = match row.as_ref() {
            Some(row) => row_to_payment_reference(row)?,
            None => return Err(ServiceError::NotFound),
        };

        if reference.status != PaymentReferenceStatus::Pending {
            return Err(ServiceError::IllegalState(
                "Payment reference has already been resolved",
            ));
        }

        let new_status = if confirm {
            PaymentReferenceStatus::Confirmed
        } else {
            PaymentReferenceStatus::Rejected
        };

        let row = sqlx::query(
            r#"UPDATE payment_references
               SET status = $2, confirmed_by = $3, notes = $4, resolved_at = now()
               WHERE id = $1 RETURNING *"#,
        )
        .bind(id as i64)
        .bind(new_status.as_str())
        .bind(staff.id as i64)
        .bind(notes)
        .fetch_one(&mut *tx)
        .await?;
        let reference = row_to_payment_reference(&row)?;

        tx.commit().await?;
        Ok(reference)
    }

    // ------------------------------------------------------------------
    // invoices

    pub async fn create_invoice(
        &mut self,
        member_id: u64,
        issued_by: u64,
        items: Vec<InvoiceItem>,
    ) -> ServiceResult<Invoice> {
        let total_cents: i64 = items.iter().map(|item| item.amount_cents).sum();
        let items_json = serde_json::Value::Array(
            items
                .iter()
                .map(|item| {
                    serde_json::json!({
                        "description": item.description,
                        "amount_cents": item.amount_cents,
                    })
                })
                .collect(),
        );

        let row = sqlx::query(
            r#"INSERT INTO invoices (member_id, issued_by, items, total_cents)
               VALUES ($1, $2, $3, $4) RETURNING *"#,
        )
        .bind(member_id as i64)
        .bind(issued_by as i64)
        .bind(items_json)
        .bind(total_cents)
        .fetch_one(&mut *self.connection)
        .await?;

        row_to_invoice(&row)
    }

    pub async fn list_invoices_by_member(&mut self, member_id: u64) -> ServiceResult<Vec<Invoice>> {
        let rows = sqlx::query(
            "SELECT * FROM invoices WHERE member_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(member_id as i64)
        .fetch_all(&mut *self.connection)
        .await?;

        rows.iter().map(row_to_invoice).collect()
    }

    pub async fn list_invoices_by_staff(&mut self, staff_id: u64) -> ServiceResult<Vec<Invoice>> {
        let rows = sqlx::query(
            "SELECT * FROM invoices WHERE issued_by = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(staff_id as i64)
        .fetch_all(&mut *self.connection)
        .await?;

        rows.iter().map(row_to_invoice).collect()
    }

    // ------------------------------------------------------------------
    // dashboard aggregates

    pub async fn count_members(&mut self) -> ServiceResult<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM members")
            .fetch_one(&mut *self.connection)
            .await?;
        Ok(row.try_get("count")?)
    }

    pub async fn count_pending_membership_applications(&mut self) -> ServiceResult<i64> {
        let row =
            sqlx::query("SELECT COUNT(*) AS count FROM membership_applications WHERE status = 'pending'")
                .fetch_one(&mut *self.connection)
                .await?;
        Ok(row.try_get("count")?)
    }

    pub async fn total_deposits_cents(&mut self) -> ServiceResult<i64> {
        let row = sqlx::query("SELECT COALESCE(SUM(balance_cents), 0)::BIGINT AS total FROM accounts")
            .fetch_one(&mut *self.connection)
            .await?;
        Ok(row.try_get("total")?)
    }

    pub async fn count_pending_payment_references(&mut self) -> ServiceResult<i64> {
        let row =
            sqlx::query("SELECT COUNT(*) AS count FROM payment_references WHERE status = 'pending'")
                .fetch_one(&mut *self.connection)
                .await?;
        Ok(row.try_get("count")?)
    }

    pub async fn count_invoices_issued_today(&mut self) -> ServiceResult<i64> {
        let row = sqlx::query(
            "SELECT COUNT(*) AS count FROM invoices WHERE created_at::date = now()::date",
        )
        .fetch_one(&mut *self.connection)
        .await?;
        Ok(row.try_get("count")?)
    }

    pub async fn officer_queue_counts(&mut self, officer_id: u64) -> ServiceResult<(i64, i64)> {
        let row = sqlx::query(
            r#"SELECT
                 COUNT(*) FILTER (WHERE review_status = 'under_review' AND loan_officer_id = $1) AS own,
                 COUNT(*) FILTER (WHERE review_status = 'pending_review' AND loan_officer_id IS NULL) AS unassigned
               FROM loan_applications"#,
        )
        .bind(officer_id as i64)
        .fetch_one(&mut *self.connection)
        .await?;

        Ok((row.try_get("own")?, row.try_get("unassigned")?))
    }
}

struct ResolvedReviewer {
    reviewer: StaffAccount,
    substituted: bool,
}

impl ResolvedReviewer {
    /// Prefix the notes with the unresolved external actor id when the
    /// system placeholder was substituted.
    fn annotate(&self, actor_id: u64, notes: &str) -> String {
        if self.substituted {
            format!("[external actor {actor_id}] {notes}")
        } else {
            notes.to_string()
        }
    }
}
