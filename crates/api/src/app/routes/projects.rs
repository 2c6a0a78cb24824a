use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
};
use serde_json::json;
use uuid::Uuid;

use taskdeck_auth::{Action, ResourceFacts, authorize};
use taskdeck_core::{AppError, PageRequest, Project, ProjectId, ProjectStatus};
use taskdeck_store::{AuditRecord, NewProject, ProjectFilter, ProjectPatch, scope};

use crate::app::dto;
use crate::app::envelope::{self, ApiResult};
use crate::app::services::AppServices;
use crate::context::Identity;

pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Json(body): Json<dto::CreateProjectRequest>,
) -> ApiResult {
    let claim = identity.claim();
    authorize(claim, Action::CreateProject, &ResourceFacts::default())?;
    let tenant_id = scope::require_tenant(claim)?;

    dto::validate_required(&body.name, "Name is required")?;

    let project = services
        .store
        .create_project(NewProject {
            tenant_id,
            name: body.name,
            description: body.description,
            status: body.status.unwrap_or(ProjectStatus::Active),
            created_by: claim.user_id,
        })
        .await?;

    services
        .audit
        .record(AuditRecord {
            tenant_id: Some(tenant_id),
            user_id: claim.user_id,
            action: "CREATE_PROJECT".into(),
            entity_type: "project".into(),
            entity_id: Some(Uuid::from(project.id)),
            ip_address: None,
        })
        .await;

    Ok(envelope::created(project))
}

pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<dto::ProjectListQuery>,
) -> ApiResult {
    let claim = identity.claim();
    // super_admin browses a tenant by passing ?tenantId=; members always get
    // their own tenant regardless of the parameter.
    let tenant_id = scope::resolve_tenant(claim, query.tenant_id)?;
    authorize(
        claim,
        Action::ReadProject,
        &ResourceFacts {
            owner_tenant_id: Some(tenant_id),
            owner_user_id: None,
        },
    )?;

    let page = PageRequest::clamped(query.page, query.limit, 20);
    let filter = ProjectFilter {
        status: query.status,
        search: query.search,
    };
    let result = services
        .store
        .list_projects(tenant_id, &filter, page)
        .await?;

    Ok(envelope::ok(json!({
        "projects": result.items,
        "total": result.total,
        "pagination": envelope::pagination(&page, result.total),
    })))
}

pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<String>,
) -> ApiResult {
    let claim = identity.claim();
    let project = fetch_project(&services, &project_id).await?;

    authorize(
        claim,
        Action::ReadProject,
        &ResourceFacts {
            owner_tenant_id: Some(project.tenant_id),
            owner_user_id: Some(project.created_by),
        },
    )?;

    Ok(envelope::ok(project))
}

pub async fn update_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<String>,
    Json(body): Json<dto::UpdateProjectRequest>,
) -> ApiResult {
    let claim = identity.claim();
    let project = fetch_project(&services, &project_id).await?;

    authorize(
        claim,
        Action::UpdateProject,
        &ResourceFacts {
            owner_tenant_id: Some(project.tenant_id),
            owner_user_id: Some(project.created_by),
        },
    )?;

    let patch = ProjectPatch::from(body);
    if patch.is_empty() {
        return Ok(envelope::ok_with_message("No changes", project));
    }

    let updated = services.store.update_project(project.id, patch).await?;

    services
        .audit
        .record(AuditRecord {
            tenant_id: Some(project.tenant_id),
            user_id: claim.user_id,
            action: "UPDATE_PROJECT".into(),
            entity_type: "project".into(),
            entity_id: Some(Uuid::from(project.id)),
            ip_address: None,
        })
        .await;

    Ok(envelope::ok_with_message("Project updated", updated))
}

pub async fn delete_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<String>,
) -> ApiResult {
    let claim = identity.claim();
    let project = fetch_project(&services, &project_id).await?;

    authorize(
        claim,
        Action::DeleteProject,
        &ResourceFacts {
            owner_tenant_id: Some(project.tenant_id),
            owner_user_id: Some(project.created_by),
        },
    )?;

    services.store.delete_project(project.id).await?;

    services
        .audit
        .record(AuditRecord {
            tenant_id: Some(project.tenant_id),
            user_id: claim.user_id,
            action: "DELETE_PROJECT".into(),
            entity_type: "project".into(),
            entity_id: Some(Uuid::from(project.id)),
            ip_address: None,
        })
        .await;

    Ok(envelope::message("Project deleted"))
}

pub(crate) async fn fetch_project(
    services: &AppServices,
    raw_id: &str,
) -> Result<Project, AppError> {
    let id: ProjectId = raw_id.parse()?;
    services
        .store
        .project_by_id(id)
        .await?
        .ok_or(AppError::NotFound)
}
