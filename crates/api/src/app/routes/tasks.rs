use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Path, Query},
};
use serde_json::json;
use uuid::Uuid;

use taskdeck_auth::{Action, ResourceFacts, authorize};
use taskdeck_core::{AppError, PageRequest, Task, TaskId, TaskPriority};
use taskdeck_store::{AuditRecord, NewTask, TaskFilter, TaskPatch, scope};

use crate::app::dto;
use crate::app::envelope::{self, ApiResult};
use crate::app::routes::projects::fetch_project;
use crate::app::services::AppServices;
use crate::context::Identity;

pub async fn create_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<String>,
    Json(body): Json<dto::CreateTaskRequest>,
) -> ApiResult {
    let claim = identity.claim();
    authorize(claim, Action::CreateTask, &ResourceFacts::default())?;

    let project = fetch_project(&services, &project_id).await?;
    scope::verify_owned(claim, project.tenant_id)?;

    // Tasks always belong to their parent project's tenant, never the
    // caller's. The two can differ for a super_admin acting across tenants.
    let tenant_id = project.tenant_id;

    dto::validate_required(&body.title, "Title is required")?;

    if let Some(assignee) = body.assigned_to {
        if !services.store.user_in_tenant(assignee, tenant_id).await? {
            return Err(
                AppError::validation("Assigned user does not belong to this tenant").into(),
            );
        }
    }

    let row = services
        .store
        .create_task(NewTask {
            project_id: project.id,
            tenant_id,
            title: body.title,
            description: body.description,
            priority: body.priority.unwrap_or(TaskPriority::Medium),
            assigned_to: body.assigned_to,
            due_date: body.due_date,
        })
        .await?;

    services
        .audit
        .record(AuditRecord {
            tenant_id: Some(tenant_id),
            user_id: claim.user_id,
            action: "CREATE_TASK".into(),
            entity_type: "task".into(),
            entity_id: Some(Uuid::from(row.task.id)),
            ip_address: None,
        })
        .await;

    Ok(envelope::created(row))
}

pub async fn list_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(project_id): Path<String>,
    Query(query): Query<dto::TaskListQuery>,
) -> ApiResult {
    let claim = identity.claim();
    let project = fetch_project(&services, &project_id).await?;
    scope::verify_owned(claim, project.tenant_id)?;
    authorize(
        claim,
        Action::ReadTask,
        &ResourceFacts {
            owner_tenant_id: Some(project.tenant_id),
            owner_user_id: None,
        },
    )?;

    let page = PageRequest::clamped(query.page, query.limit, 50);
    let filter = TaskFilter {
        status: query.status,
        priority: query.priority,
        assigned_to: query.assigned_to,
        search: query.search,
    };
    let result = services
        .store
        .list_tasks(project.id, project.tenant_id, &filter, page)
        .await?;

    Ok(envelope::ok(json!({
        "tasks": result.items,
        "total": result.total,
        "pagination": envelope::pagination(&page, result.total),
    })))
}

pub async fn update_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<String>,
    Json(body): Json<dto::UpdateTaskRequest>,
) -> ApiResult {
    let claim = identity.claim();
    let task = fetch_task(&services, &task_id).await?;

    authorize(
        claim,
        Action::UpdateTask,
        &ResourceFacts {
            owner_tenant_id: Some(task.tenant_id),
            owner_user_id: None,
        },
    )?;

    let patch = TaskPatch::from(body);

    if let Some(Some(assignee)) = patch.assigned_to {
        if !services
            .store
            .user_in_tenant(assignee, task.tenant_id)
            .await?
        {
            return Err(AppError::validation("Invalid assignee").into());
        }
    }

    if patch.is_empty() {
        return Ok(envelope::ok_with_message("No changes", task));
    }

    let row = services.store.update_task(task.id, patch).await?;

    services
        .audit
        .record(AuditRecord {
            tenant_id: Some(task.tenant_id),
            user_id: claim.user_id,
            action: "UPDATE_TASK".into(),
            entity_type: "task".into(),
            entity_id: Some(Uuid::from(task.id)),
            ip_address: None,
        })
        .await;

    Ok(envelope::ok_with_message("Task updated", row))
}

pub async fn update_task_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<String>,
    Json(body): Json<dto::UpdateTaskStatusRequest>,
) -> ApiResult {
    let claim = identity.claim();
    let task = fetch_task(&services, &task_id).await?;

    authorize(
        claim,
        Action::UpdateTaskStatus,
        &ResourceFacts {
            owner_tenant_id: Some(task.tenant_id),
            owner_user_id: None,
        },
    )?;

    let row = services
        .store
        .update_task(
            task.id,
            TaskPatch {
                status: Some(body.status),
                ..TaskPatch::default()
            },
        )
        .await?;

    Ok(envelope::ok(json!({
        "id": row.task.id,
        "status": row.task.status,
        "updatedAt": row.task.updated_at,
    })))
}

pub async fn delete_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Path(task_id): Path<String>,
) -> ApiResult {
    let claim = identity.claim();
    let task = fetch_task(&services, &task_id).await?;

    authorize(
        claim,
        Action::DeleteTask,
        &ResourceFacts {
            owner_tenant_id: Some(task.tenant_id),
            owner_user_id: None,
        },
    )?;

    services.store.delete_task(task.id).await?;

    Ok(envelope::message("Task deleted"))
}

pub async fn my_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<dto::MyTasksQuery>,
) -> ApiResult {
    let claim = identity.claim();
    let tenant_id = scope::require_tenant(claim)?;
    let limit = PageRequest::clamped(None, query.limit, 10).limit;

    let tasks = services
        .store
        .tasks_assigned_to(tenant_id, claim.user_id, limit)
        .await?;

    Ok(envelope::ok(json!({ "tasks": tasks })))
}

async fn fetch_task(services: &AppServices, raw_id: &str) -> Result<Task, AppError> {
    let id: TaskId = raw_id.parse()?;
    services
        .store
        .task_by_id(id)
        .await?
        .ok_or(AppError::NotFound)
}
