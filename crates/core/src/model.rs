//! Persisted entity shapes and store-produced read models.
//!
//! # Invariants
//! - A task's `tenant_id` always equals its parent project's `tenant_id`.
//!   The copy is denormalized so isolation checks never need a join; the
//!   write path keeps it in sync, readers never repair it.
//! - `tenant_id = None` on a user means a tenant-less super_admin identity.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::id::{ProjectId, TaskId, TenantId, UserId};
use crate::types::{ProjectStatus, Role, SubscriptionPlan, TaskPriority, TaskStatus, TenantStatus};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    /// Globally unique, lowercase.
    pub subdomain: String,
    pub status: TenantStatus,
    pub subscription_plan: SubscriptionPlan,
    /// Hard ceiling checked at user creation time only; a plan downgrade is
    /// not retroactively enforced.
    pub max_users: i32,
    /// Same creation-time-only semantics as `max_users`.
    pub max_projects: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub tenant_id: Option<TenantId>,
    /// Unique per tenant, not globally.
    pub email: String,
    /// Argon2id PHC string. Never serialized.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub project_id: ProjectId,
    /// Always equals the parent project's tenant (see module invariants).
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    /// Cleared (set-null) when the assignee is deleted; the task survives.
    pub assigned_to: Option<UserId>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit record. Write failures never abort the operation that
/// triggered them.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogEntry {
    pub id: Uuid,
    pub tenant_id: Option<TenantId>,
    pub user_id: UserId,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub ip_address: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Read models (list enrichments produced by the store)
// ---------------------------------------------------------------------------

/// Compact user reference embedded in list rows.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub full_name: String,
    pub email: String,
}

/// Project list row with creator and task progress counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListRow {
    #[serde(flatten)]
    pub project: Project,
    pub creator: Option<UserSummary>,
    pub task_count: i64,
    pub completed_task_count: i64,
}

/// Task row with the assignee resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRow {
    #[serde(flatten)]
    pub task: Task,
    pub assignee: Option<UserSummary>,
}

/// "My tasks" dashboard row: task + parent project name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyTaskRow {
    #[serde(flatten)]
    pub task: Task,
    pub project_name: String,
    pub assignee: Option<UserSummary>,
}

/// Per-tenant usage counters shown on the tenant detail view.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TenantStats {
    pub total_users: i64,
    pub total_projects: i64,
    pub total_tasks: i64,
}

/// Tenant list row for the cross-tenant admin view.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantListRow {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub total_users: i64,
    pub total_projects: i64,
}
