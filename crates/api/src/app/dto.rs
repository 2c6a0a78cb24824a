//! Request DTOs and JSON field mapping. Responses are built from the domain
//! read models, which already serialize in camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use taskdeck_core::{
    AppError, AppResult, ProjectStatus, Role, SubscriptionPlan, TaskPriority, TaskStatus, TenantId,
    TenantStatus, UserId,
};
use taskdeck_store::{ProjectPatch, TaskPatch, TenantPatch, UserPatch};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterTenantRequest {
    pub tenant_name: String,
    pub subdomain: String,
    pub admin_email: String,
    pub admin_password: String,
    pub admin_full_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    pub tenant_subdomain: Option<String>,
    pub tenant_id: Option<TenantId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTenantRequest {
    pub name: Option<String>,
    pub status: Option<TenantStatus>,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub max_users: Option<i32>,
    pub max_projects: Option<i32>,
}

impl From<UpdateTenantRequest> for TenantPatch {
    fn from(req: UpdateTenantRequest) -> Self {
        TenantPatch {
            name: req.name,
            status: req.status,
            subscription_plan: req.subscription_plan,
            max_users: req.max_users,
            max_projects: req.max_projects,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUserRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl From<UpdateUserRequest> for UserPatch {
    fn from(req: UpdateUserRequest) -> Self {
        UserPatch {
            full_name: req.full_name,
            role: req.role,
            is_active: req.is_active,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    pub name: String,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl From<UpdateProjectRequest> for ProjectPatch {
    fn from(req: UpdateProjectRequest) -> Self {
        ProjectPatch {
            name: req.name,
            description: req.description,
            status: req.status,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<UserId>,
    pub priority: Option<TaskPriority>,
    pub due_date: Option<DateTime<Utc>>,
}

/// `assignedTo` and `dueDate` are clearable: an absent key means "leave as
/// is", an explicit `null` means "clear". The double-`Option` keeps the two
/// apart through deserialization.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    #[serde(default, deserialize_with = "double_option")]
    pub assigned_to: Option<Option<UserId>>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl From<UpdateTaskRequest> for TaskPatch {
    fn from(req: UpdateTaskRequest) -> Self {
        TaskPatch {
            title: req.title,
            description: req.description,
            status: req.status,
            priority: req.priority,
            assigned_to: req.assigned_to,
            due_date: req.due_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateTaskStatusRequest {
    pub status: TaskStatus,
}

fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantListQuery {
    pub status: Option<TenantStatus>,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserListQuery {
    pub search: Option<String>,
    pub role: Option<Role>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListQuery {
    pub status: Option<ProjectStatus>,
    pub search: Option<String>,
    pub tenant_id: Option<TenantId>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListQuery {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<UserId>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MyTasksQuery {
    pub limit: Option<u32>,
}

/// Shallow shape check; real deliverability is out of scope.
pub fn validate_email(email: &str) -> AppResult<()> {
    let (local, domain) = email
        .split_once('@')
        .ok_or_else(|| AppError::validation("Valid email is required"))?;
    if local.is_empty() || domain.len() < 3 || !domain.contains('.') || email.contains(' ') {
        return Err(AppError::validation("Valid email is required"));
    }
    Ok(())
}

pub fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < 8 {
        return Err(AppError::validation(
            "Password must be at least 8 characters",
        ));
    }
    Ok(())
}

pub fn validate_required(value: &str, message: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::validation(message));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape_check() {
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@missing-local.com").is_err());
        assert!(validate_email("user@nodot").is_err());
        assert!(validate_email("spaced user@b.co").is_err());
    }

    #[test]
    fn absent_and_null_assignee_deserialize_differently() {
        let absent: UpdateTaskRequest = serde_json::from_str(r#"{"title":"t"}"#).unwrap();
        assert_eq!(absent.assigned_to, None);

        let null: UpdateTaskRequest = serde_json::from_str(r#"{"assignedTo":null}"#).unwrap();
        assert_eq!(null.assigned_to, Some(None));

        let set: UpdateTaskRequest =
            serde_json::from_str(r#"{"assignedTo":"0193c7a0-0000-7000-8000-000000000001"}"#)
                .unwrap();
        assert!(matches!(set.assigned_to, Some(Some(_))));
    }
}
