//! Role-based access control
//!
//! Authorization is exact membership in a per-operation role set; the gate
//! fails closed when no principal is attached.

use crate::auth::middleware::CurrentUser;
use crate::error::ApiError;
use gatehouse_shared::models::UserRole;

/// Authorize a principal against the roles required for an operation
pub fn authorize(principal: Option<&CurrentUser>, required: &[UserRole]) -> Result<(), ApiError> {
    let user =
        principal.ok_or_else(|| ApiError::Authentication("Session has expired".to_string()))?;

    if !required.contains(&user.role) {
        return Err(ApiError::Authorization(
            "You do not have permission to perform this action".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn principal(role: UserRole) -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            full_name: "Test User".to_string(),
            email: "test@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_matching_role_allowed() {
        let user = principal(UserRole::Admin);
        assert!(authorize(Some(&user), &[UserRole::Admin]).is_ok());
    }

    #[test]
    fn test_role_outside_set_denied() {
        let user = principal(UserRole::User);
        let err = authorize(Some(&user), &[UserRole::Admin]).unwrap_err();
        assert!(matches!(err, ApiError::Authorization(_)));
    }

    #[test]
    fn test_missing_principal_fails_closed() {
        let err = authorize(None, &[UserRole::User, UserRole::Admin]).unwrap_err();
        assert!(matches!(err, ApiError::Authentication(_)));
    }

    #[test]
    fn test_multiple_required_roles() {
        let user = principal(UserRole::User);
        assert!(authorize(Some(&user), &[UserRole::User, UserRole::Admin]).is_ok());
    }
}
