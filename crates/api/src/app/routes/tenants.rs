use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
};
use serde_json::json;
use uuid::Uuid;

use taskdeck_auth::{Action, ResourceFacts, authorize};
use taskdeck_core::{AppError, PageRequest, TenantId};
use taskdeck_store::{AuditRecord, TenantFilter, TenantPatch};

use crate::app::dto;
use crate::app::envelope::{self, ApiResult};
use crate::app::services::AppServices;
use crate::context::Identity;

pub async fn list_tenants(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<dto::TenantListQuery>,
) -> ApiResult {
    let claim = identity.claim();
    authorize(claim, Action::ListTenants, &ResourceFacts::default())?;

    let page = PageRequest::clamped(query.page, query.limit, 10);
    let filter = TenantFilter {
        status: query.status,
        subscription_plan: query.subscription_plan,
    };
    let result = services.store.list_tenants(&filter, page).await?;

    let mut pagination = envelope::pagination(&page, result.total);
    pagination["totalTenants"] = json!(result.total);

    Ok(envelope::ok(json!({
        "tenants": result.items,
        "pagination": pagination,
    })))
}

pub async fn get_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(tenant_id): Path<String>,
) -> ApiResult {
    let claim = identity.claim();
    let tenant_id: TenantId = tenant_id.parse()?;

    authorize(
        claim,
        Action::ReadTenant,
        &ResourceFacts {
            owner_tenant_id: Some(tenant_id),
            owner_user_id: None,
        },
    )?;

    let tenant = services
        .store
        .tenant_by_id(tenant_id)
        .await?
        .ok_or(AppError::NotFound)?;
    let stats = services.store.tenant_stats(tenant_id).await?;

    let mut data = serde_json::to_value(&tenant).map_err(serialize_fault)?;
    data["stats"] = serde_json::to_value(&stats).map_err(serialize_fault)?;

    Ok(envelope::ok(data))
}

pub async fn update_tenant(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(tenant_id): Path<String>,
    Json(body): Json<dto::UpdateTenantRequest>,
) -> ApiResult {
    let claim = identity.claim();
    let tenant_id: TenantId = tenant_id.parse()?;
    let patch = TenantPatch::from(body);

    authorize(
        claim,
        Action::UpdateTenant {
            restricted: patch.touches_restricted(),
        },
        &ResourceFacts {
            owner_tenant_id: Some(tenant_id),
            owner_user_id: None,
        },
    )?;

    if patch.is_empty() {
        return Ok(envelope::message("No changes provided"));
    }

    let tenant = services.store.update_tenant(tenant_id, patch).await?;

    services
        .audit
        .record(AuditRecord {
            tenant_id: Some(tenant_id),
            user_id: claim.user_id,
            action: "UPDATE_TENANT".into(),
            entity_type: "tenant".into(),
            entity_id: Some(Uuid::from(tenant_id)),
            ip_address: None,
        })
        .await;

    Ok(envelope::ok_with_message(
        "Tenant updated successfully",
        tenant,
    ))
}

fn serialize_fault(e: serde_json::Error) -> AppError {
    tracing::error!(error = %e, "response serialization failed");
    AppError::internal("response serialization failed")
}
