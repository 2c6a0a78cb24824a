use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
};
use serde_json::json;
use uuid::Uuid;

use taskdeck_auth::{Action, ResourceFacts, authorize};
use taskdeck_core::{AppError, PageRequest, Role, TenantId, UserId};
use taskdeck_store::{AuditRecord, NewUser, UserFilter, UserPatch};

use crate::app::dto;
use crate::app::envelope::{self, ApiResult};
use crate::app::routes::auth::hash_password;
use crate::app::services::AppServices;
use crate::context::Identity;

pub async fn add_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(tenant_id): Path<String>,
    Json(body): Json<dto::AddUserRequest>,
) -> ApiResult {
    let claim = identity.claim();
    let tenant_id: TenantId = tenant_id.parse()?;

    authorize(
        claim,
        Action::AddUser,
        &ResourceFacts {
            owner_tenant_id: Some(tenant_id),
            owner_user_id: None,
        },
    )?;

    dto::validate_email(&body.email)?;
    dto::validate_password(&body.password)?;
    dto::validate_required(&body.full_name, "Full name is required")?;

    // Only two roles can ever be granted here; anything else collapses to
    // the ordinary member role.
    let role = match body.role {
        Some(Role::TenantAdmin) => Role::TenantAdmin,
        _ => Role::User,
    };

    let password_hash = hash_password(&body.password)?;

    let user = services
        .store
        .create_user(NewUser {
            tenant_id,
            email: body.email,
            password_hash,
            full_name: body.full_name,
            role,
        })
        .await?;

    services
        .audit
        .record(AuditRecord {
            tenant_id: Some(tenant_id),
            user_id: claim.user_id,
            action: "CREATE_USER".into(),
            entity_type: "user".into(),
            entity_id: Some(Uuid::from(user.id)),
            ip_address: None,
        })
        .await;

    Ok(envelope::created_with_message(
        "User created successfully",
        user,
    ))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(tenant_id): Path<String>,
    Query(query): Query<dto::UserListQuery>,
) -> ApiResult {
    let claim = identity.claim();
    let tenant_id: TenantId = tenant_id.parse()?;

    authorize(
        claim,
        Action::ListUsers,
        &ResourceFacts {
            owner_tenant_id: Some(tenant_id),
            owner_user_id: None,
        },
    )?;

    let page = PageRequest::clamped(query.page, query.limit, 50);
    let filter = UserFilter {
        role: query.role,
        search: query.search,
    };
    let result = services.store.list_users(tenant_id, &filter, page).await?;

    Ok(envelope::ok(json!({
        "users": result.items,
        "total": result.total,
        "pagination": envelope::pagination(&page, result.total),
    })))
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
    Json(body): Json<dto::UpdateUserRequest>,
) -> ApiResult {
    let claim = identity.claim();
    let user_id: UserId = user_id.parse()?;

    let target = services
        .store
        .user_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let patch = UserPatch::from(body);
    authorize(
        claim,
        Action::UpdateUser {
            privileged: patch.touches_privileged(),
        },
        &ResourceFacts {
            owner_tenant_id: target.tenant_id,
            owner_user_id: Some(target.id),
        },
    )?;

    if patch.is_empty() {
        return Ok(envelope::ok_with_message("No changes", target));
    }

    let updated = services.store.update_user(user_id, patch).await?;

    services
        .audit
        .record(AuditRecord {
            tenant_id: target.tenant_id,
            user_id: claim.user_id,
            action: "UPDATE_USER".into(),
            entity_type: "user".into(),
            entity_id: Some(Uuid::from(user_id)),
            ip_address: None,
        })
        .await;

    Ok(envelope::ok_with_message("User updated successfully", updated))
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(user_id): Path<String>,
) -> ApiResult {
    let claim = identity.claim();
    let user_id: UserId = user_id.parse()?;

    let target = services
        .store
        .user_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    authorize(
        claim,
        Action::DeleteUser,
        &ResourceFacts {
            owner_tenant_id: target.tenant_id,
            owner_user_id: Some(target.id),
        },
    )?;

    services.store.delete_user(user_id).await?;

    services
        .audit
        .record(AuditRecord {
            tenant_id: target.tenant_id,
            user_id: claim.user_id,
            action: "DELETE_USER".into(),
            entity_type: "user".into(),
            entity_id: Some(Uuid::from(user_id)),
            ip_address: None,
        })
        .await;

    Ok(envelope::message("User deleted successfully"))
}
