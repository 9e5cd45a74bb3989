//! Static role permission table.
//!
//! Each staff role maps to the set of operations it may perform. The table is
//! plain data loaded once at startup so coverage can be inspected and tested
//! without tracing conditionals through the handlers.

use std::collections::{HashMap, HashSet};

use crate::models::StaffRole;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub enum Operation {
    ManageMembers,
    ImportMembers,
    ManageStaffRoles,
    ReviewMembershipApplications,
    DecideMembershipApplications,
    ListLoanApplications,
    ReviewLoanApplications,
    DecideLoanApplications,
    LoanStatistics,
    ConfirmPaymentReferences,
    IssueInvoices,
    ViewDashboard,
}

lazy_static::lazy_static! {
    static ref ROLE_PERMISSIONS: HashMap<StaffRole, HashSet<Operation>> = {
        let mut map = HashMap::new();

        map.insert(
            StaffRole::Admin,
            [
                Operation::ManageMembers,
                Operation::ImportMembers,
                Operation::ReviewMembershipApplications,
                Operation::ListLoanApplications,
                Operation::LoanStatistics,
                Operation::ViewDashboard,
            ]
            .into_iter()
            .collect(),
        );
        map.insert(
            StaffRole::Manager,
            [
                Operation::DecideMembershipApplications,
                Operation::ListLoanApplications,
                Operation::DecideLoanApplications,
                Operation::LoanStatistics,
                Operation::ViewDashboard,
            ]
            .into_iter()
            .collect(),
        );
        map.insert(
            StaffRole::LoanOfficer,
            [
                Operation::ListLoanApplications,
                Operation::ReviewLoanApplications,
                Operation::LoanStatistics,
                Operation::ViewDashboard,
            ]
            .into_iter()
            .collect(),
        );
        map.insert(
            StaffRole::Cashier,
            [
                Operation::ConfirmPaymentReferences,
                Operation::IssueInvoices,
                Operation::ViewDashboard,
            ]
            .into_iter()
            .collect(),
        );
        map.insert(
            StaffRole::ItAdmin,
            [
                Operation::ManageMembers,
                Operation::ImportMembers,
                Operation::ManageStaffRoles,
                Operation::ViewDashboard,
            ]
            .into_iter()
            .collect(),
        );

        map
    };
}

pub fn is_allowed(role: StaffRole, operation: Operation) -> bool {
    ROLE_PERMISSIONS
        .get(&role)
        .map(|ops| ops.contains(&operation))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_has_an_entry() {
        for role in StaffRole::all() {
            assert!(ROLE_PERMISSIONS.contains_key(&role), "{:?}", role);
        }
    }

    #[test]
    fn manager_decides_but_does_not_review() {
        assert!(is_allowed(StaffRole::Manager, Operation::DecideLoanApplications));
        assert!(!is_allowed(StaffRole::Manager, Operation::ReviewLoanApplications));
    }

    #[test]
    fn officer_reviews_but_does_not_decide() {
        assert!(is_allowed(StaffRole::LoanOfficer, Operation::ReviewLoanApplications));
        assert!(!is_allowed(StaffRole::LoanOfficer, Operation::DecideLoanApplications));
    }

    #[test]
    fn cashier_is_restricted_to_payments() {
        assert!(is_allowed(StaffRole::Cashier, Operation::ConfirmPaymentReferences));
        assert!(is_allowed(StaffRole::Cashier, Operation::IssueInvoices));
        assert!(!is_allowed(StaffRole::Cashier, Operation::ListLoanApplications));
        assert!(!is_allowed(StaffRole::Cashier, Operation::ManageMembers));
    }

    #[test]
    fn only_it_admin_changes_staff_roles() {
        for role in StaffRole::all() {
            assert_eq!(
                is_allowed(role, Operation::ManageStaffRoles),
                role == StaffRole::ItAdmin
            );
        }
    }
}
