//! Tenant-scoped query planning helpers.
//!
//! Two rules, applied uniformly by every handler:
//!
//! - list/find requests run against the caller's own tenant (super_admin may
//!   name one explicitly);
//! - get-by-id fetches first, then compares `tenant_id`, and an out-of-tenant
//!   row answers exactly like an absent one.

use taskdeck_core::{AppError, AppResult, Role, TenantId};
use taskdeck_auth::Claim;

/// Resolve the tenant a scoped operation runs against.
///
/// Non-super callers always operate on their own tenant. A super_admin may
/// target any tenant explicitly; without an explicit target they fall back to
/// their own claim context, and with neither the operation cannot proceed.
pub fn resolve_tenant(claim: &Claim, explicit: Option<TenantId>) -> AppResult<TenantId> {
    if claim.role == Role::SuperAdmin {
        return explicit
            .or(claim.tenant_id)
            .ok_or_else(|| AppError::authorization("tenant context required"));
    }
    claim
        .tenant_id
        .ok_or_else(|| AppError::authorization("tenant context required"))
}

/// The caller's own tenant, required for non-bypass operations.
pub fn require_tenant(claim: &Claim) -> AppResult<TenantId> {
    resolve_tenant(claim, None)
}

/// Post-fetch ownership verification.
///
/// Outside the caller's tenant, the answer is `NotFound`, never "forbidden",
/// so the existence of out-of-tenant resources does not leak.
pub fn verify_owned(claim: &Claim, owner_tenant_id: TenantId) -> AppResult<()> {
    if claim.role == Role::SuperAdmin {
        return Ok(());
    }
    if claim.tenant_id == Some(owner_tenant_id) {
        Ok(())
    } else {
        Err(AppError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskdeck_core::UserId;

    fn claim(role: Role, tenant_id: Option<TenantId>) -> Claim {
        Claim {
            user_id: UserId::new(),
            tenant_id,
            role,
        }
    }

    #[test]
    fn member_resolves_to_own_tenant_ignoring_explicit() {
        let own = TenantId::new();
        let c = claim(Role::User, Some(own));
        assert_eq!(resolve_tenant(&c, Some(TenantId::new())).unwrap(), own);
    }

    #[test]
    fn super_admin_may_target_any_tenant() {
        let target = TenantId::new();
        let c = claim(Role::SuperAdmin, None);
        assert_eq!(resolve_tenant(&c, Some(target)).unwrap(), target);
    }

    #[test]
    fn super_admin_without_any_tenant_context_is_refused() {
        let c = claim(Role::SuperAdmin, None);
        assert!(matches!(
            require_tenant(&c).unwrap_err(),
            AppError::Authorization(_)
        ));
    }

    #[test]
    fn out_of_tenant_row_reads_as_not_found() {
        let c = claim(Role::TenantAdmin, Some(TenantId::new()));
        assert_eq!(
            verify_owned(&c, TenantId::new()).unwrap_err(),
            AppError::NotFound
        );
    }

    #[test]
    fn super_admin_bypasses_ownership() {
        let c = claim(Role::SuperAdmin, None);
        assert!(verify_owned(&c, TenantId::new()).is_ok());
    }
}
