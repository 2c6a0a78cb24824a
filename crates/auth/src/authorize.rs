//! The authorization decision engine.
//!
//! Every permission rule in the system lives in [`authorize`], consulted by
//! every mutating and reading path. Call sites never re-derive role semantics.
//!
//! - No IO
//! - No panics
//! - No business logic (pure policy check)

use thiserror::Error;

use taskdeck_core::{AppError, Role, TenantId, UserId};

use crate::claims::Claim;

/// The operation being attempted, as seen by the policy layer.
///
/// Field-level nuance is carried in the variant payloads: `restricted` marks
/// tenant fields only super_admin may touch (status, plan, ceilings);
/// `privileged` marks user fields only admins may touch (role, is_active).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ListTenants,
    ReadTenant,
    UpdateTenant { restricted: bool },

    CreateProject,
    ReadProject,
    UpdateProject,
    DeleteProject,

    CreateTask,
    ReadTask,
    UpdateTask,
    UpdateTaskStatus,
    DeleteTask,

    AddUser,
    ListUsers,
    UpdateUser { privileged: bool },
    DeleteUser,
}

impl Action {
    /// Actions that only make sense inside a concrete tenant context. A
    /// super_admin without a tenant in their claim is denied these.
    fn requires_tenant_context(&self) -> bool {
        matches!(self, Action::CreateProject | Action::CreateTask)
    }
}

/// Ownership facts about the target resource, resolved by the caller before
/// asking for a decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceFacts {
    /// Tenant the resource belongs to. `None` for tenant-less targets
    /// (e.g. a super_admin user record, or a global listing).
    pub owner_tenant_id: Option<TenantId>,

    /// The user the resource "belongs to": a project's creator, or the user
    /// record being touched. `None` when ownership is not tracked (tasks).
    pub owner_user_id: Option<UserId>,
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// Collapsed into "not found" at the API boundary so out-of-tenant
    /// resources are indistinguishable from absent ones.
    #[error("unauthorized tenant access")]
    TenantMismatch,

    #[error("tenant context required")]
    TenantContextRequired,

    #[error("cannot delete own account")]
    SelfDeletion,

    #[error("insufficient permissions")]
    Forbidden,
}

impl From<Denial> for AppError {
    fn from(denial: Denial) -> Self {
        match denial {
            Denial::TenantMismatch => AppError::NotFound,
            other => AppError::authorization(other.to_string()),
        }
    }
}

/// Decide whether `claim` may perform `action` on the resource described by
/// `facts`. Rules are evaluated in precedence order; first match wins.
pub fn authorize(claim: &Claim, action: Action, facts: &ResourceFacts) -> Result<(), Denial> {
    // Self-delete guard: no actor, regardless of role, may delete their own
    // user record. Prevents self-lockout of the only admin.
    if action == Action::DeleteUser && facts.owner_user_id == Some(claim.user_id) {
        return Err(Denial::SelfDeletion);
    }

    // super_admin bypass, except for actions that need a concrete tenant.
    if claim.role == Role::SuperAdmin {
        if action.requires_tenant_context() && claim.tenant_id.is_none() {
            return Err(Denial::TenantContextRequired);
        }
        return Ok(());
    }

    // Tenant isolation: a non-super actor never touches another tenant's
    // resource. Tenant-less targets owned by someone else (platform-level
    // accounts) are equally off limits; global listings carry no owner at
    // all and fall through to the role rules.
    match facts.owner_tenant_id {
        Some(owner_tenant) if claim.tenant_id != Some(owner_tenant) => {
            return Err(Denial::TenantMismatch);
        }
        None if facts.owner_user_id.is_some() && facts.owner_user_id != Some(claim.user_id) => {
            return Err(Denial::TenantMismatch);
        }
        _ => {}
    }

    // Self-action exception: anyone may update their own profile's
    // non-privileged fields. Privileged fields (role/is_active) fall through
    // to the role rules, where the admin path allows them even on self.
    if let Action::UpdateUser { privileged } = action {
        if facts.owner_user_id == Some(claim.user_id) && !privileged {
            return Ok(());
        }
    }

    match claim.role {
        // Already returned above; kept for exhaustiveness.
        Role::SuperAdmin => Ok(()),

        Role::TenantAdmin => match action {
            // Restricted tenant fields (status, plan, ceilings) are
            // super_admin-only; tenant_admin may rename only.
            Action::UpdateTenant { restricted: true } => Err(Denial::Forbidden),
            Action::ListTenants => Err(Denial::Forbidden),
            _ => Ok(()),
        },

        Role::User => match action {
            Action::ReadTenant
            | Action::CreateProject
            | Action::ReadProject
            | Action::CreateTask
            | Action::ReadTask
            | Action::UpdateTaskStatus
            | Action::ListUsers => Ok(()),

            // Update/delete on a project or task only for its original
            // creator. Tasks don't track a creator (owner_user_id is None),
            // so tenant membership suffices there.
            Action::UpdateProject
            | Action::DeleteProject
            | Action::UpdateTask
            | Action::DeleteTask => match facts.owner_user_id {
                None => Ok(()),
                Some(owner) if owner == claim.user_id => Ok(()),
                Some(_) => Err(Denial::Forbidden),
            },

            Action::ListTenants
            | Action::UpdateTenant { .. }
            | Action::AddUser
            | Action::UpdateUser { .. }
            | Action::DeleteUser => Err(Denial::Forbidden),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn claim(role: Role, tenant_id: Option<TenantId>) -> Claim {
        Claim {
            user_id: UserId::new(),
            tenant_id,
            role,
        }
    }

    fn in_tenant(claim: &Claim) -> ResourceFacts {
        ResourceFacts {
            owner_tenant_id: claim.tenant_id,
            owner_user_id: None,
        }
    }

    #[test]
    fn super_admin_reads_any_tenant() {
        let claim = claim(Role::SuperAdmin, None);
        let facts = ResourceFacts {
            owner_tenant_id: Some(TenantId::new()),
            owner_user_id: None,
        };
        assert_eq!(authorize(&claim, Action::ReadTenant, &facts), Ok(()));
        assert_eq!(authorize(&claim, Action::ListTenants, &facts), Ok(()));
        assert_eq!(
            authorize(&claim, Action::UpdateTenant { restricted: true }, &facts),
            Ok(())
        );
    }

    #[test]
    fn super_admin_without_tenant_cannot_create_projects() {
        let claim = claim(Role::SuperAdmin, None);
        assert_eq!(
            authorize(&claim, Action::CreateProject, &ResourceFacts::default()),
            Err(Denial::TenantContextRequired)
        );
    }

    #[test]
    fn cross_tenant_access_is_a_mismatch() {
        let claim = claim(Role::TenantAdmin, Some(TenantId::new()));
        let facts = ResourceFacts {
            owner_tenant_id: Some(TenantId::new()),
            owner_user_id: None,
        };
        assert_eq!(
            authorize(&claim, Action::UpdateProject, &facts),
            Err(Denial::TenantMismatch)
        );
    }

    #[test]
    fn tenant_admin_cannot_touch_platform_accounts() {
        // A super_admin user record has no tenant; only super_admin reaches it.
        let claim = claim(Role::TenantAdmin, Some(TenantId::new()));
        let facts = ResourceFacts {
            owner_tenant_id: None,
            owner_user_id: Some(UserId::new()),
        };
        assert_eq!(
            authorize(&claim, Action::UpdateUser { privileged: false }, &facts),
            Err(Denial::TenantMismatch)
        );
        assert_eq!(
            authorize(&claim, Action::DeleteUser, &facts),
            Err(Denial::TenantMismatch)
        );
    }

    #[test]
    fn mismatch_collapses_to_not_found() {
        assert_eq!(AppError::from(Denial::TenantMismatch), AppError::NotFound);
    }

    #[test]
    fn anyone_updates_own_non_privileged_profile() {
        let claim = claim(Role::User, Some(TenantId::new()));
        let facts = ResourceFacts {
            owner_tenant_id: claim.tenant_id,
            owner_user_id: Some(claim.user_id),
        };
        assert_eq!(
            authorize(&claim, Action::UpdateUser { privileged: false }, &facts),
            Ok(())
        );
    }

    #[test]
    fn plain_user_cannot_set_role_even_on_self() {
        let claim = claim(Role::User, Some(TenantId::new()));
        let facts = ResourceFacts {
            owner_tenant_id: claim.tenant_id,
            owner_user_id: Some(claim.user_id),
        };
        assert_eq!(
            authorize(&claim, Action::UpdateUser { privileged: true }, &facts),
            Err(Denial::Forbidden)
        );
    }

    #[test]
    fn admin_may_set_privileged_fields_on_self() {
        let claim = claim(Role::TenantAdmin, Some(TenantId::new()));
        let facts = ResourceFacts {
            owner_tenant_id: claim.tenant_id,
            owner_user_id: Some(claim.user_id),
        };
        assert_eq!(
            authorize(&claim, Action::UpdateUser { privileged: true }, &facts),
            Ok(())
        );
    }

    #[test]
    fn tenant_admin_mutates_anything_in_tenant() {
        let claim = claim(Role::TenantAdmin, Some(TenantId::new()));
        let facts = ResourceFacts {
            owner_tenant_id: claim.tenant_id,
            owner_user_id: Some(UserId::new()),
        };
        for action in [
            Action::UpdateProject,
            Action::DeleteProject,
            Action::AddUser,
            Action::UpdateUser { privileged: true },
            Action::DeleteUser,
            Action::UpdateTenant { restricted: false },
        ] {
            assert_eq!(authorize(&claim, action, &facts), Ok(()), "{action:?}");
        }
    }

    #[test]
    fn tenant_admin_cannot_touch_restricted_tenant_fields() {
        let claim = claim(Role::TenantAdmin, Some(TenantId::new()));
        assert_eq!(
            authorize(
                &claim,
                Action::UpdateTenant { restricted: true },
                &in_tenant(&claim)
            ),
            Err(Denial::Forbidden)
        );
    }

    #[test]
    fn plain_user_cannot_touch_tenant_settings_at_all() {
        let claim = claim(Role::User, Some(TenantId::new()));
        assert_eq!(
            authorize(
                &claim,
                Action::UpdateTenant { restricted: false },
                &in_tenant(&claim)
            ),
            Err(Denial::Forbidden)
        );
    }

    #[test]
    fn plain_user_mutates_only_own_projects() {
        let claim = claim(Role::User, Some(TenantId::new()));

        let own = ResourceFacts {
            owner_tenant_id: claim.tenant_id,
            owner_user_id: Some(claim.user_id),
        };
        assert_eq!(authorize(&claim, Action::DeleteProject, &own), Ok(()));

        let someone_elses = ResourceFacts {
            owner_tenant_id: claim.tenant_id,
            owner_user_id: Some(UserId::new()),
        };
        assert_eq!(
            authorize(&claim, Action::DeleteProject, &someone_elses),
            Err(Denial::Forbidden)
        );
    }

    #[test]
    fn any_member_touches_ownerless_tasks() {
        let claim = claim(Role::User, Some(TenantId::new()));
        let facts = in_tenant(&claim);
        assert_eq!(authorize(&claim, Action::UpdateTask, &facts), Ok(()));
        assert_eq!(authorize(&claim, Action::UpdateTaskStatus, &facts), Ok(()));
        assert_eq!(authorize(&claim, Action::DeleteTask, &facts), Ok(()));
    }

    #[test]
    fn self_delete_is_denied_for_every_role() {
        for role in [Role::SuperAdmin, Role::TenantAdmin, Role::User] {
            let tenant = (role != Role::SuperAdmin).then(TenantId::new);
            let claim = claim(role, tenant);
            let facts = ResourceFacts {
                owner_tenant_id: claim.tenant_id,
                owner_user_id: Some(claim.user_id),
            };
            assert_eq!(
                authorize(&claim, Action::DeleteUser, &facts),
                Err(Denial::SelfDeletion),
                "{role:?}"
            );
        }
    }

    fn any_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            Just(Action::ListTenants),
            Just(Action::ReadTenant),
            any::<bool>().prop_map(|restricted| Action::UpdateTenant { restricted }),
            Just(Action::CreateProject),
            Just(Action::ReadProject),
            Just(Action::UpdateProject),
            Just(Action::DeleteProject),
            Just(Action::CreateTask),
            Just(Action::ReadTask),
            Just(Action::UpdateTask),
            Just(Action::UpdateTaskStatus),
            Just(Action::DeleteTask),
            Just(Action::AddUser),
            Just(Action::ListUsers),
            any::<bool>().prop_map(|privileged| Action::UpdateUser { privileged }),
            Just(Action::DeleteUser),
        ]
    }

    proptest! {
        /// Non-super actors are never allowed across a tenant boundary, for
        /// any action, and the denial is always the collapsible mismatch.
        #[test]
        fn no_cross_tenant_grant_for_non_super(
            action in any_action(),
            admin in any::<bool>(),
        ) {
            let role = if admin { Role::TenantAdmin } else { Role::User };
            let claim = claim(role, Some(TenantId::new()));
            let facts = ResourceFacts {
                owner_tenant_id: Some(TenantId::new()),
                owner_user_id: None,
            };

            let decision = authorize(&claim, action, &facts);
            prop_assert!(decision.is_err());
            // Self-delete can't trigger here (owner_user_id is None), so the
            // boundary denial is always the mismatch.
            if action != Action::DeleteUser {
                prop_assert_eq!(decision, Err(Denial::TenantMismatch));
            }
        }

        /// The self-delete guard wins over everything, including super_admin.
        #[test]
        fn self_delete_never_succeeds(admin in any::<bool>(), has_tenant in any::<bool>()) {
            let role = match (admin, has_tenant) {
                (true, false) => Role::SuperAdmin,
                (true, true) => Role::TenantAdmin,
                (false, _) => Role::User,
            };
            let claim = claim(role, has_tenant.then(TenantId::new));
            let facts = ResourceFacts {
                owner_tenant_id: claim.tenant_id,
                owner_user_id: Some(claim.user_id),
            };
            prop_assert_eq!(
                authorize(&claim, Action::DeleteUser, &facts),
                Err(Denial::SelfDeletion)
            );
        }
    }
}
