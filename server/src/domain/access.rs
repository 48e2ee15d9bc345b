// Copyright (c) 2026 Smart Keybox
// SPDX-License-Identifier: AGPL-3.0

use crate::domain::role::RoleId;

/// Role-based access check gating every TAKE.
///
/// Deny when the key has an assigned role and the user does not carry exactly
/// that role (a role-less user is denied any role-assigned key). Pure; the
/// caller supplies both sides.
pub fn allows(user_role: Option<RoleId>, assigned_role: Option<RoleId>) -> bool {
    match assigned_role {
        None => true,
        Some(required) => user_role == Some(required),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_role_is_allowed() {
        let role = RoleId::new();
        assert!(allows(Some(role), Some(role)));
    }

    #[test]
    fn differing_role_is_denied() {
        assert!(!allows(Some(RoleId::new()), Some(RoleId::new())));
    }

    #[test]
    fn roleless_user_is_denied_assigned_key() {
        assert!(!allows(None, Some(RoleId::new())));
    }

    #[test]
    fn unassigned_key_is_open_to_everyone() {
        assert!(allows(Some(RoleId::new()), None));
        assert!(allows(None, None));
    }
}
