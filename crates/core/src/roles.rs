//! Well-known role name constants.
//!
//! These must match the seed data in `20261001000001_create_roles_and_users.sql`.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_INVESTIGATOR: &str = "investigator";
pub const ROLE_REVIEWER: &str = "reviewer";
pub const ROLE_VIEWER: &str = "viewer";

/// Roles allowed to edit investigation records.
pub fn can_investigate(role: &str) -> bool {
    matches!(role, ROLE_ADMIN | ROLE_INVESTIGATOR | ROLE_REVIEWER)
}

/// Roles allowed to sign off on reviews.
pub fn can_review(role: &str) -> bool {
    matches!(role, ROLE_ADMIN | ROLE_REVIEWER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_cannot_investigate() {
        assert!(!can_investigate(ROLE_VIEWER));
        assert!(can_investigate(ROLE_INVESTIGATOR));
        assert!(can_investigate(ROLE_ADMIN));
    }

    #[test]
    fn only_admin_and_reviewer_review() {
        assert!(can_review(ROLE_ADMIN));
        assert!(can_review(ROLE_REVIEWER));
        assert!(!can_review(ROLE_INVESTIGATOR));
        assert!(!can_review("unknown"));
    }
}
