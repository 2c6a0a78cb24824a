use std::sync::Arc;

use axum::{Json, extract::Extension};
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use taskdeck_auth::{Claim, CredentialError, verify_password};
use taskdeck_core::{AppError, Tenant, TenantStatus};
use taskdeck_store::{AuditRecord, RegisterTenant};

use crate::app::dto;
use crate::app::envelope::{self, ApiResult};
use crate::app::services::AppServices;
use crate::context::Identity;

pub(crate) fn hash_password(password: &str) -> Result<String, AppError> {
    taskdeck_auth::hash_password(password).map_err(credential_fault)
}

fn credential_fault(e: CredentialError) -> AppError {
    tracing::error!(error = %e, "credential processing failed");
    AppError::internal("credential processing failed")
}

pub async fn register_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RegisterTenantRequest>,
) -> ApiResult {
    dto::validate_required(&body.tenant_name, "Tenant name is required")?;
    dto::validate_required(&body.admin_full_name, "Full name is required")?;
    validate_subdomain(&body.subdomain)?;
    dto::validate_email(&body.admin_email)?;
    dto::validate_password(&body.admin_password)?;

    let password_hash = hash_password(&body.admin_password)?;

    let (tenant, admin) = services
        .store
        .register_tenant(RegisterTenant {
            tenant_name: body.tenant_name,
            subdomain: body.subdomain,
            admin_email: body.admin_email,
            admin_password_hash: password_hash,
            admin_full_name: body.admin_full_name,
        })
        .await?;

    services
        .audit
        .record(AuditRecord {
            tenant_id: Some(tenant.id),
            user_id: admin.id,
            action: "REGISTER_TENANT".into(),
            entity_type: "tenant".into(),
            entity_id: Some(Uuid::from(tenant.id)),
            ip_address: None,
        })
        .await;

    Ok(envelope::created_with_message(
        "Tenant registered successfully",
        json!({
            "tenantId": tenant.id,
            "subdomain": tenant.subdomain,
            "adminUser": admin,
        }),
    ))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> ApiResult {
    // Resolve the tenant context the caller is logging in under.
    let context_tenant: Option<Tenant> = match (&body.tenant_subdomain, body.tenant_id) {
        (Some(subdomain), _) => Some(
            services
                .store
                .tenant_by_subdomain(subdomain)
                .await?
                .ok_or(AppError::NotFound)?,
        ),
        (None, Some(id)) => services.store.tenant_by_id(id).await?,
        (None, None) => None,
    };
    let context_tenant_id = context_tenant.as_ref().map(|t| t.id);

    let user = services
        .store
        .user_for_login(&body.email, context_tenant_id)
        .await?
        .ok_or_else(|| AppError::authentication("Invalid credentials"))?;

    let valid = verify_password(&body.password, &user.password_hash).map_err(credential_fault)?;
    if !valid {
        return Err(AppError::authentication("Invalid credentials").into());
    }
    if !user.is_active {
        return Err(AppError::authorization("Account is inactive").into());
    }

    // The tenant-status gate applies to the tenant's own members. A
    // tenant-less super_admin may still sign in under a suspended tenant's
    // subdomain to administer it.
    if let Some(tenant) = &context_tenant {
        if user.tenant_id == Some(tenant.id) && tenant.status != TenantStatus::Active {
            return Err(AppError::authorization("Tenant is not active").into());
        }
    }

    let claim = Claim {
        user_id: user.id,
        tenant_id: user.tenant_id,
        role: user.role,
    };
    let token = services
        .tokens
        .issue(claim, Utc::now(), services.token_ttl)
        .map_err(|e| {
            tracing::error!(error = %e, "token issuance failed");
            AppError::internal("token issuance failed")
        })?;

    services
        .audit
        .record(AuditRecord {
            tenant_id: context_tenant_id.or(user.tenant_id),
            user_id: user.id,
            action: "LOGIN".into(),
            entity_type: "user".into(),
            entity_id: Some(Uuid::from(user.id)),
            ip_address: None,
        })
        .await;

    Ok(envelope::ok(json!({
        "user": {
            "id": user.id,
            "email": user.email,
            "fullName": user.full_name,
            "role": user.role,
            "tenantId": user.tenant_id,
        },
        "token": token,
        "expiresIn": services.token_ttl.num_seconds(),
    })))
}

pub async fn me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult {
    let claim = identity.claim();
    let user = services
        .store
        .user_by_id(claim.user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let tenant = match user.tenant_id {
        Some(id) => services.store.tenant_by_id(id).await?,
        None => None,
    };

    Ok(envelope::ok(json!({
        "id": user.id,
        "email": user.email,
        "fullName": user.full_name,
        "role": user.role,
        "isActive": user.is_active,
        "tenant": tenant.map(|t| json!({
            "id": t.id,
            "name": t.name,
            "subdomain": t.subdomain,
            "subscriptionPlan": t.subscription_plan,
            "maxUsers": t.max_users,
            "maxProjects": t.max_projects,
        })),
    })))
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
) -> ApiResult {
    let claim = identity.claim();
    services
        .audit
        .record(AuditRecord {
            tenant_id: claim.tenant_id,
            user_id: claim.user_id,
            action: "LOGOUT".into(),
            entity_type: "user".into(),
            entity_id: Some(Uuid::from(claim.user_id)),
            ip_address: None,
        })
        .await;

    Ok(envelope::message("Logged out successfully"))
}

fn validate_subdomain(subdomain: &str) -> Result<(), AppError> {
    let ok = !subdomain.is_empty()
        && subdomain
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !subdomain.starts_with('-')
        && !subdomain.ends_with('-');
    if !ok {
        return Err(AppError::validation(
            "Subdomain must be lowercase letters, digits or hyphens",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subdomain_charset() {
        assert!(validate_subdomain("acme-1").is_ok());
        assert!(validate_subdomain("Acme").is_err());
        assert!(validate_subdomain("-acme").is_err());
        assert!(validate_subdomain("ac me").is_err());
        assert!(validate_subdomain("").is_err());
    }
}
