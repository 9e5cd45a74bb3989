use std::ops::Add;

use chrono::{Duration, Utc};
use sqlx::PgPool;

use crate::error::ServiceError;
use crate::models::{
    Account, AccountType, ApplicantSnapshot, InvoiceItem, LoanApplication, LoanReviewFields,
    ManagerAction, Member, MembershipAction, MembershipApplication, MembershipStatus,
    OfficerAction, ReviewStatus, StaffAccount, StaffRole, Subject, TransactionType,
    SYSTEM_ACTOR_USERNAME,
};

use super::{AppState, DatabaseConnection, TRANSACTION_PAGE_LIMIT};

async fn connect(pool: PgPool) -> (AppState, DatabaseConnection) {
    let _ = env_logger::try_init();
    let app_state = AppState::from_pool(pool).await;
    let db = DatabaseConnection {
        connection: app_state.pool.acquire().await.unwrap(),
    };
    (app_state, db)
}

async fn seed_staff(db: &mut DatabaseConnection, username: &str, role: StaffRole) -> StaffAccount {
    db.store_staff_account(StaffAccount {
        id: 0,
        fullname: format!("Staff {username}"),
        email: format!("{username}@coop.example"),
        username: username.to_string(),
        password_hash: vec![13u8; 32],
        role,
        created_at: Utc::now(),
    })
    .await
    .unwrap()
}

async fn seed_member(db: &mut DatabaseConnection, member_number: &str) -> Member {
    db.store_member(Member {
        id: 0,
        member_number: member_number.to_string(),
        fullname: format!("Member {member_number}"),
        email: format!("{member_number}@coop.example"),
        password_hash: vec![13u8; 32],
        active: true,
        created_at: Utc::now(),
    })
    .await
    .unwrap()
}

async fn seed_account(db: &mut DatabaseConnection, member: &Member) -> Account {
    db.store_account(Account {
        id: 0,
        member_id: member.id,
        account_type: AccountType::Savings,
        account_number: format!("SA-{}", member.member_number),
        balance_cents: 0,
        created_at: Utc::now(),
    })
    .await
    .unwrap()
}

fn membership_application(email: &str) -> MembershipApplication {
    MembershipApplication {
        id: 0,
        fullname: "Ada Lovelace".to_string(),
        email: email.to_string(),
        phone: "+49 351 0000".to_string(),
        address: "1 Analytical St".to_string(),
        employer: "Babbage & Co".to_string(),
        occupation: "Engineer".to_string(),
        monthly_income_cents: Some(250_000),
        reference_name: None,
        reference_contact: None,
        status: MembershipStatus::Pending,
        membership_number: None,
        submitted_at: Utc::now(),
        reviewed_at: None,
    }
}

fn loan_application(member: &Member, amount_cents: i64) -> LoanApplication {
    LoanApplication {
        id: 0,
        member_id: member.id,
        applicant: ApplicantSnapshot {
            fullname: member.fullname.clone(),
            email: member.email.clone(),
            phone: "+49 351 0000".to_string(),
            address: "1 Analytical St".to_string(),
            employer: "Babbage & Co".to_string(),
            occupation: "Engineer".to_string(),
        },
        amount_cents,
        interest_rate: None,
        term_months: Some(24),
        purpose: "renovation".to_string(),
        credit_score: None,
        monthly_income_cents: Some(250_000),
        employment_status: Some("employed".to_string()),
        collateral: None,
        priority: None,
        government_id_path: None,
        company_id_path: None,
        review_status: ReviewStatus::PendingReview,
        loan_officer_id: None,
        manager_id: None,
        submitted_at: Utc::now(),
        reviewed_at: None,
        rejected_at: None,
    }
}

#[sqlx::test]
async fn test_session_lifecycle(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let member = seed_member(&mut db, "MB-00000001").await;
    let subject = Subject::Member(member.clone());

    let token = db
        .create_session_token(&subject, Utc::now().add(Duration::minutes(30)))
        .await
        .unwrap();
    let session = db
        .get_session_by_session_token(token.clone())
        .await
        .unwrap()
        .expect("there is a session for the token");
    assert_eq!(session.subject, subject);
    assert_eq!(session.token, token);

    // expired tokens behave like absent sessions
    let expired = db
        .create_session_token(&subject, Utc::now() - Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(db.get_session_by_session_token(expired).await.unwrap(), None);

    // deactivated members cannot use their tokens
    db.set_member_active(member.id, false).await.unwrap();
    assert_eq!(
        db.get_session_by_session_token(token.clone()).await.unwrap(),
        None
    );
    db.set_member_active(member.id, true).await.unwrap();

    db.delete_session_token(token.clone()).await.unwrap();
    assert_eq!(db.get_session_by_session_token(token).await.unwrap(), None);
}

#[sqlx::test]
async fn test_membership_pipeline_happy_path(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let officer = seed_staff(&mut db, "officer", StaffRole::LoanOfficer).await;
    let manager = seed_staff(&mut db, "manager", StaffRole::Manager).await;

    let application = db
        .create_membership_application(membership_application("ada@coop.example"))
        .await
        .unwrap();
    assert_eq!(application.status, MembershipStatus::Pending);

    let application = db
        .membership_transition(application.id, MembershipAction::PickUp, &officer, "", None)
        .await
        .unwrap();
    assert_eq!(application.status, MembershipStatus::UnderReview);

    let application = db
        .membership_transition(
            application.id,
            MembershipAction::ForwardToManager,
            &officer,
            "looks fine",
            Some("MB-00000042".to_string()),
        )
        .await
        .unwrap();
    assert_eq!(application.status, MembershipStatus::ForwardedToManager);
    assert_eq!(application.membership_number.as_deref(), Some("MB-00000042"));

    let application = db
        .membership_transition(application.id, MembershipAction::Approve, &manager, "", None)
        .await
        .unwrap();
    assert_eq!(application.status, MembershipStatus::Approved);
    assert!(application.reviewed_at.is_some());

    let history = db.get_membership_reviews(application.id).await.unwrap();
    let actions: Vec<&str> = history.iter().map(|r| r.action.as_str()).collect();
    assert_eq!(actions, vec!["pick_up", "forward_to_manager", "approve"]);
    assert_eq!(history[1].notes, "looks fine");
    assert_eq!(history[2].reviewer_id, manager.id);

    // the approved record feeds loan intake autofill
    let autofill = db
        .get_approved_membership_application_by_member_number("MB-00000042")
        .await
        .unwrap()
        .expect("approved application is found by member number");
    assert_eq!(autofill.email, "ada@coop.example");
}

#[sqlx::test]
async fn test_membership_duplicate_email_rejected(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    db.create_membership_application(membership_application("ada@coop.example"))
        .await
        .unwrap();
    let duplicate = db
        .create_membership_application(membership_application("ada@coop.example"))
        .await;
    assert!(matches!(duplicate, Err(ServiceError::BadRequest(_))));

    // emails of existing members are rejected too
    let member = seed_member(&mut db, "MB-00000002").await;
    let duplicate = db
        .create_membership_application(membership_application(&member.email))
        .await;
    assert!(matches!(duplicate, Err(ServiceError::BadRequest(_))));
}

#[sqlx::test]
async fn test_membership_illegal_transitions_leave_state_unchanged(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let officer = seed_staff(&mut db, "officer", StaffRole::LoanOfficer).await;
    let manager = seed_staff(&mut db, "manager", StaffRole::Manager).await;

    let application = db
        .create_membership_application(membership_application("ada@coop.example"))
        .await
        .unwrap();

    // approve straight from pending is not a valid transition
    let result = db
        .membership_transition(application.id, MembershipAction::Approve, &manager, "", None)
        .await;
    assert!(matches!(result, Err(ServiceError::IllegalState(_))));

    let application = db
        .membership_transition(application.id, MembershipAction::PickUp, &officer, "", None)
        .await
        .unwrap();

    // forwarding requires a membership number
    let result = db
        .membership_transition(
            application.id,
            MembershipAction::ForwardToManager,
            &officer,
            "",
            None,
        )
        .await;
    assert!(matches!(result, Err(ServiceError::BadRequest(_))));
    let result = db
        .membership_transition(
            application.id,
            MembershipAction::ForwardToManager,
            &officer,
            "",
            Some("   ".to_string()),
        )
        .await;
    assert!(matches!(result, Err(ServiceError::BadRequest(_))));

    let current = db
        .get_membership_application(application.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(current.status, MembershipStatus::UnderReview);
    assert_eq!(current.membership_number, None);

    // failed attempts leave no history rows
    let history = db.get_membership_reviews(application.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[sqlx::test]
async fn test_loan_pipeline_manager_approval(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let officer = seed_staff(&mut db, "officer", StaffRole::LoanOfficer).await;
    let manager = seed_staff(&mut db, "manager", StaffRole::Manager).await;
    let member = seed_member(&mut db, "MB-00000001").await;

    let application = db
        .create_loan_application(loan_application(&member, 5_000_000))
        .await
        .unwrap();
    assert_eq!(application.review_status, ReviewStatus::PendingReview);
    assert_eq!(application.loan_officer_id, None);

    let application = db
        .assign_loan_officer(application.id, &officer)
        .await
        .unwrap();
    assert_eq!(application.review_status, ReviewStatus::UnderReview);
    assert_eq!(application.loan_officer_id, Some(officer.id));

    // double assignment is rejected
    let result = db.assign_loan_officer(application.id, &officer).await;
    assert!(matches!(result, Err(ServiceError::IllegalState(_))));

    // officer endorsement keeps the application under review
    let application = db
        .loan_officer_review(
            application.id,
            OfficerAction::ApproveForManager,
            officer.id,
            officer.role,
            "checked documents",
            &LoanReviewFields {
                credit_score: Some(710),
                interest_rate: Some(4.5),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(application.review_status, ReviewStatus::UnderReview);
    assert_eq!(application.credit_score, Some(710));
    assert_eq!(application.interest_rate, Some(4.5));
    // required fields keep their submitted values, absent optional ones clear
    assert_eq!(application.amount_cents, 5_000_000);
    assert_eq!(application.purpose, "renovation");
    assert_eq!(application.term_months, None);

    let application = db
        .manager_decision(application.id, ManagerAction::Approve, manager.id, "ok")
        .await
        .unwrap();
    assert_eq!(application.review_status, ReviewStatus::Approved);
    assert_eq!(application.manager_id, Some(manager.id));
    assert!(application.reviewed_at.is_some());
    assert_eq!(application.rejected_at, None);

    let history = db.get_loan_reviews(application.id).await.unwrap();
    let actions: Vec<&str> = history.iter().map(|r| r.action.as_str()).collect();
    assert_eq!(actions, vec!["assign", "approve_for_manager", "approve"]);
    assert_eq!(history[1].notes, "checked documents");

    // terminal applications accept no further actions
    let result = db
        .manager_decision(application.id, ManagerAction::Reject, manager.id, "")
        .await;
    assert!(matches!(result, Err(ServiceError::IllegalState(_))));
    let result = db
        .loan_officer_review(
            application.id,
            OfficerAction::Reject,
            officer.id,
            officer.role,
            "",
            &LoanReviewFields::default(),
        )
        .await;
    assert!(matches!(result, Err(ServiceError::IllegalState(_))));
}

#[sqlx::test]
async fn test_loan_rejection_sets_rejected_at(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let officer = seed_staff(&mut db, "officer", StaffRole::LoanOfficer).await;
    let member = seed_member(&mut db, "MB-00000001").await;

    let application = db
        .create_loan_application(loan_application(&member, 1_000_000))
        .await
        .unwrap();
    let application = db
        .assign_loan_officer(application.id, &officer)
        .await
        .unwrap();

    let application = db
        .loan_officer_review(
            application.id,
            OfficerAction::Reject,
            officer.id,
            officer.role,
            "insufficient income",
            &LoanReviewFields::default(),
        )
        .await
        .unwrap();
    assert_eq!(application.review_status, ReviewStatus::Rejected);
    assert!(application.rejected_at.is_some());
    assert!(application.review_status.is_terminal());
}

#[sqlx::test]
async fn test_blank_review_fields_store_null(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let officer = seed_staff(&mut db, "officer", StaffRole::LoanOfficer).await;
    let member = seed_member(&mut db, "MB-00000001").await;

    let application = db
        .create_loan_application(loan_application(&member, 2_000_000))
        .await
        .unwrap();
    let application = db
        .assign_loan_officer(application.id, &officer)
        .await
        .unwrap();

    let application = db
        .loan_officer_review(
            application.id,
            OfficerAction::ApproveForManager,
            officer.id,
            officer.role,
            "",
            &LoanReviewFields {
                credit_score: Some(710),
                term_months: Some(36),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(application.credit_score, Some(710));
    assert_eq!(application.term_months, Some(36));

    // a later review submitting those fields blank clears the stored values
    let application = db
        .loan_officer_review(
            application.id,
            OfficerAction::ApproveForManager,
            officer.id,
            officer.role,
            "",
            &LoanReviewFields::default(),
        )
        .await
        .unwrap();
    assert_eq!(application.credit_score, None);
    assert_eq!(application.term_months, None);
    // required fields survive a blank submission
    assert_eq!(application.amount_cents, 2_000_000);
    assert_eq!(application.purpose, "renovation");
}

#[sqlx::test]
async fn test_loan_returned_to_member(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let officer = seed_staff(&mut db, "officer", StaffRole::LoanOfficer).await;
    let member = seed_member(&mut db, "MB-00000001").await;

    let application = db
        .create_loan_application(loan_application(&member, 1_000_000))
        .await
        .unwrap();
    let application = db
        .assign_loan_officer(application.id, &officer)
        .await
        .unwrap();

    let application = db
        .loan_officer_review(
            application.id,
            OfficerAction::ReturnToMember,
            officer.id,
            officer.role,
            "missing payslips",
            &LoanReviewFields::default(),
        )
        .await
        .unwrap();
    assert_eq!(application.review_status, ReviewStatus::Returned);
    assert_eq!(application.rejected_at, None);
}

#[sqlx::test]
async fn test_unresolved_actor_substitutes_system(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let officer = seed_staff(&mut db, "officer", StaffRole::LoanOfficer).await;
    let member = seed_member(&mut db, "MB-00000001").await;

    let application = db
        .create_loan_application(loan_application(&member, 1_000_000))
        .await
        .unwrap();
    let application = db
        .assign_loan_officer(application.id, &officer)
        .await
        .unwrap();

    let system = db
        .get_staff_by_username(SYSTEM_ACTOR_USERNAME)
        .await
        .unwrap()
        .expect("system actor is seeded by the migrations");

    // actor id 424242 resolves against nothing; the transition still lands
    // and the audit row carries the system actor plus the external id
    let application = db
        .loan_officer_review(
            application.id,
            OfficerAction::ApproveForManager,
            424_242,
            StaffRole::LoanOfficer,
            "imported decision",
            &LoanReviewFields::default(),
        )
        .await
        .unwrap();
    assert_eq!(application.review_status, ReviewStatus::UnderReview);

    let history = db.get_loan_reviews(application.id).await.unwrap();
    let last = history.last().unwrap();
    assert_eq!(last.reviewer_id, system.id);
    assert_eq!(last.notes, "[external actor 424242] imported decision");
}

#[sqlx::test]
async fn test_loan_listing_scopes(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let officer = seed_staff(&mut db, "officer", StaffRole::LoanOfficer).await;
    let other = seed_staff(&mut db, "other", StaffRole::LoanOfficer).await;
    let member = seed_member(&mut db, "MB-00000001").await;

    let first = db
        .create_loan_application(loan_application(&member, 1_000_000))
        .await
        .unwrap();
    let second = db
        .create_loan_application(loan_application(&member, 2_000_000))
        .await
        .unwrap();
    db.assign_loan_officer(first.id, &other).await.unwrap();

    // officer scope: unassigned applications plus their own
    let scoped = db
        .list_loan_applications(None, Some(officer.id), None)
        .await
        .unwrap();
    assert_eq!(scoped.iter().map(|a| a.id).collect::<Vec<_>>(), vec![second.id]);

    let scoped = db
        .list_loan_applications(None, Some(other.id), None)
        .await
        .unwrap();
    let mut ids = scoped.iter().map(|a| a.id).collect::<Vec<_>>();
    ids.sort();
    assert_eq!(ids, vec![first.id, second.id]);

    // member scope
    let scoped = db
        .list_loan_applications(None, None, Some(member.id))
        .await
        .unwrap();
    assert_eq!(scoped.len(), 2);

    // status filter
    let scoped = db
        .list_loan_applications(Some(ReviewStatus::UnderReview), None, None)
        .await
        .unwrap();
    assert_eq!(scoped.iter().map(|a| a.id).collect::<Vec<_>>(), vec![first.id]);

    let stats = db.loan_statistics().await.unwrap();
    assert_eq!(stats.pending_review, 1);
    assert_eq!(stats.under_review, 1);
    assert_eq!(stats.approved, 0);
}

#[sqlx::test]
async fn test_transaction_balance_is_signed_sum(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let member = seed_member(&mut db, "MB-00000001").await;
    seed_account(&mut db, &member).await;

    let (tx1, account) = db
        .create_transaction(
            member.id,
            AccountType::Savings,
            TransactionType::Credit,
            "deposit",
            10_000,
        )
        .await
        .unwrap();
    assert_eq!(tx1.amount_cents, 10_000);
    assert_eq!(account.balance_cents, 10_000);

    let (tx2, account) = db
        .create_transaction(
            member.id,
            AccountType::Savings,
            TransactionType::Debit,
            "withdrawal",
            2_500,
        )
        .await
        .unwrap();
    assert_eq!(tx2.amount_cents, -2_500);
    assert_eq!(account.balance_cents, 7_500);

    let transactions = db
        .get_transactions_by_member(member.id, TRANSACTION_PAGE_LIMIT)
        .await
        .unwrap();
    let signed_sum: i64 = transactions.iter().map(|t| t.amount_cents).sum();
    assert_eq!(signed_sum, account.balance_cents);

    // a transaction against a missing account is an illegal state
    let result = db
        .create_transaction(
            member.id,
            AccountType::Checking,
            TransactionType::Credit,
            "",
            100,
        )
        .await;
    assert!(matches!(result, Err(ServiceError::IllegalState(_))));
}

#[sqlx::test]
async fn test_transaction_listing_is_capped(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let member = seed_member(&mut db, "MB-00000001").await;
    seed_account(&mut db, &member).await;

    for _ in 0..5 {
        db.create_transaction(
            member.id,
            AccountType::Savings,
            TransactionType::Credit,
            "",
            100,
        )
        .await
        .unwrap();
    }

    let transactions = db.get_transactions_by_member(member.id, 2).await.unwrap();
    assert_eq!(transactions.len(), 2);

    // out-of-range limits are clamped instead of failing
    let transactions = db.get_transactions_by_member(member.id, 0).await.unwrap();
    assert_eq!(transactions.len(), 1);
    let transactions = db
        .get_transactions_by_member(member.id, 1_000_000)
        .await
        .unwrap();
    assert_eq!(transactions.len(), 5);
}

#[sqlx::test]
async fn test_concurrent_credits_lose_no_updates(pool: PgPool) {
    let (state, mut db) = connect(pool).await;

    let member = seed_member(&mut db, "MB-00000001").await;
    seed_account(&mut db, &member).await;

    let mut handles = Vec::new();
    for _ in 0..10 {
        let pool = state.pool.clone();
        let member_id = member.id;
        handles.push(tokio::spawn(async move {
            let mut db = DatabaseConnection {
                connection: pool.acquire().await.unwrap(),
            };
            db.create_transaction(
                member_id,
                AccountType::Savings,
                TransactionType::Credit,
                "",
                1_000,
            )
            .await
            .unwrap();
        }));
    }
    for result in futures::future::join_all(handles).await {
        result.unwrap();
    }

    let account = db
        .get_account(member.id, AccountType::Savings)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(account.balance_cents, 10_000);
}

#[sqlx::test]
async fn test_payment_reference_resolution_is_final(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let cashier = seed_staff(&mut db, "cashier", StaffRole::Cashier).await;
    let member = seed_member(&mut db, "MB-00000001").await;

    let reference = db
        .create_payment_reference(
            member.id,
            "payment-references/abc.png",
            Some("GCASH-1234".to_string()),
            Some(50_000),
        )
        .await
        .unwrap();
    assert_eq!(reference.status, crate::models::PaymentReferenceStatus::Pending);

    let reference = db
        .resolve_payment_reference(reference.id, true, &cashier, Some("matches".to_string()))
        .await
        .unwrap();
    assert_eq!(
        reference.status,
        crate::models::PaymentReferenceStatus::Confirmed
    );
    assert_eq!(reference.confirmed_by, Some(cashier.id));
    assert!(reference.resolved_at.is_some());

    // resolution cannot be repeated or flipped
    let result = db
        .resolve_payment_reference(reference.id, false, &cashier, None)
        .await;
    assert!(matches!(result, Err(ServiceError::IllegalState(_))));

    let rejected = db
        .create_payment_reference(member.id, "payment-references/def.png", None, None)
        .await
        .unwrap();
    let rejected = db
        .resolve_payment_reference(rejected.id, false, &cashier, Some("blurry".to_string()))
        .await
        .unwrap();
    assert_eq!(
        rejected.status,
        crate::models::PaymentReferenceStatus::Rejected
    );
}

#[sqlx::test]
async fn test_invoice_totals_and_listings(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let cashier = seed_staff(&mut db, "cashier", StaffRole::Cashier).await;
    let member = seed_member(&mut db, "MB-00000001").await;

    let invoice = db
        .create_invoice(
            member.id,
            cashier.id,
            vec![
                InvoiceItem {
                    description: "Membership fee".to_string(),
                    amount_cents: 25_000,
                },
                InvoiceItem {
                    description: "Loan processing".to_string(),
                    amount_cents: 10_000,
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(invoice.total_cents, 35_000);
    assert_eq!(invoice.items.len(), 2);

    let by_member = db.list_invoices_by_member(member.id).await.unwrap();
    assert_eq!(by_member, vec![invoice.clone()]);
    let by_staff = db.list_invoices_by_staff(cashier.id).await.unwrap();
    assert_eq!(by_staff, vec![invoice]);

    assert_eq!(db.count_invoices_issued_today().await.unwrap(), 1);
}

#[sqlx::test]
async fn test_dashboard_counters(pool: PgPool) {
    let (_state, mut db) = connect(pool).await;

    let officer = seed_staff(&mut db, "officer", StaffRole::LoanOfficer).await;
    let member = seed_member(&mut db, "MB-00000001").await;
    seed_account(&mut db, &member).await;

    db.create_membership_application(membership_application("new@coop.example"))
        .await
        .unwrap();
    db.create_transaction(
        member.id,
        AccountType::Savings,
        TransactionType::Credit,
        "",
        12_345,
    )
    .await
    .unwrap();
    let assigned = db
        .create_loan_application(loan_application(&member, 1_000_000))
        .await
        .unwrap();
    db.assign_loan_officer(assigned.id, &officer).await.unwrap();
    db.create_loan_application(loan_application(&member, 2_000_000))
        .await
        .unwrap();
    db.create_payment_reference(member.id, "payment-references/abc.png", None, None)
        .await
        .unwrap();

    assert_eq!(db.count_members().await.unwrap(), 1);
    assert_eq!(db.count_pending_membership_applications().await.unwrap(), 1);
    assert_eq!(db.total_deposits_cents().await.unwrap(), 12_345);
    assert_eq!(db.count_pending_payment_references().await.unwrap(), 1);

    let (own, unassigned) = db.officer_queue_counts(officer.id).await.unwrap();
    assert_eq!(own, 1);
    assert_eq!(unassigned, 1);
}
