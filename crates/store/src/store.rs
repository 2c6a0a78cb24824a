//! The `Store` trait and its input types.
//!
//! Implementations must uphold two contracts:
//!
//! 1. **Quota atomicity**: `create_user` / `create_project` read the
//!    tenant's ceiling and current count in the same atomic unit as the
//!    insert. Two concurrent "last slot" creations must not both succeed.
//! 2. **Tenant scoping**: every list method constrains by the tenant id it
//!    is given; totals are computed from the same filtered predicate as the
//!    page.
//!
//! Get-by-id methods are deliberately *unscoped*: callers fetch first and
//! compare `tenant_id` afterwards (see [`crate::scope`]), so out-of-tenant
//! lookups collapse into "not found" without leaking existence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use taskdeck_core::{
    AppResult, MyTaskRow, Page, PageRequest, Project, ProjectId, ProjectListRow, ProjectStatus,
    Role, SubscriptionPlan, Task, TaskId, TaskPriority, TaskRow, TaskStatus, Tenant, TenantId,
    TenantListRow, TenantStats, TenantStatus, User, UserId,
};

// ---------------------------------------------------------------------------
// Write inputs
// ---------------------------------------------------------------------------

/// Atomic tenant registration: the tenant row plus its first tenant_admin.
#[derive(Debug, Clone)]
pub struct RegisterTenant {
    pub tenant_name: String,
    pub subdomain: String,
    pub admin_email: String,
    pub admin_password_hash: String,
    pub admin_full_name: String,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub tenant_id: TenantId,
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
}

#[derive(Debug, Clone)]
pub struct NewProject {
    pub tenant_id: TenantId,
    pub name: String,
    pub description: Option<String>,
    pub status: ProjectStatus,
    pub created_by: UserId,
}

#[derive(Debug, Clone)]
pub struct NewTask {
    pub project_id: ProjectId,
    /// Must equal the parent project's tenant; the write path keeps the
    /// denormalized copy in sync.
    pub tenant_id: TenantId,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub assigned_to: Option<UserId>,
    pub due_date: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Patches (None = leave unchanged). An all-None patch is a no-op the service
// layer answers with the current row, not an error.
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TenantPatch {
    pub name: Option<String>,
    pub status: Option<TenantStatus>,
    pub subscription_plan: Option<SubscriptionPlan>,
    pub max_users: Option<i32>,
    pub max_projects: Option<i32>,
}

impl TenantPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && !self.touches_restricted()
    }

    /// Fields only super_admin may change.
    pub fn touches_restricted(&self) -> bool {
        self.status.is_some()
            || self.subscription_plan.is_some()
            || self.max_users.is_some()
            || self.max_projects.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
    pub full_name: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.full_name.is_none() && !self.touches_privileged()
    }

    /// Fields only the admin path may change.
    pub fn touches_privileged(&self) -> bool {
        self.role.is_some() || self.is_active.is_some()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProjectPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
}

impl ProjectPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.status.is_none()
    }
}

/// Task patch. `assigned_to`/`due_date` use a double option: the outer level
/// is "touch this field at all", the inner level allows clearing to NULL.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<Option<UserId>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.assigned_to.is_none()
            && self.due_date.is_none()
    }
}

// ---------------------------------------------------------------------------
// List filters
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct TenantFilter {
    pub status: Option<TenantStatus>,
    pub subscription_plan: Option<SubscriptionPlan>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub role: Option<Role>,
    /// Matches email or full name, case-insensitive substring.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub status: Option<ProjectStatus>,
    /// Matches project name, case-insensitive substring.
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub assigned_to: Option<UserId>,
    /// Matches task title, case-insensitive substring.
    pub search: Option<String>,
}

/// One audit append. `entity_id` is the primary entity the action touched.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    pub tenant_id: Option<TenantId>,
    pub user_id: UserId,
    pub action: String,
    pub entity_type: String,
    pub entity_id: Option<Uuid>,
    pub ip_address: Option<String>,
}

// ---------------------------------------------------------------------------
// The storage boundary
// ---------------------------------------------------------------------------

#[async_trait]
pub trait Store: Send + Sync {
    // Tenants
    async fn register_tenant(&self, reg: RegisterTenant) -> AppResult<(Tenant, User)>;
    async fn tenant_by_subdomain(&self, subdomain: &str) -> AppResult<Option<Tenant>>;
    async fn tenant_by_id(&self, id: TenantId) -> AppResult<Option<Tenant>>;
    async fn tenant_stats(&self, id: TenantId) -> AppResult<TenantStats>;
    async fn list_tenants(
        &self,
        filter: &TenantFilter,
        page: PageRequest,
    ) -> AppResult<Page<TenantListRow>>;
    async fn update_tenant(&self, id: TenantId, patch: TenantPatch) -> AppResult<Tenant>;

    // Users
    /// Login lookup: matches the given tenant's users *and* tenant-less
    /// (super_admin) users. With `tenant_id = None`, only tenant-less users
    /// match.
    async fn user_for_login(
        &self,
        email: &str,
        tenant_id: Option<TenantId>,
    ) -> AppResult<Option<User>>;
    async fn user_by_id(&self, id: UserId) -> AppResult<Option<User>>;
    /// True iff the user exists and belongs to the tenant (assignee checks).
    async fn user_in_tenant(&self, user_id: UserId, tenant_id: TenantId) -> AppResult<bool>;
    /// Quota-guarded: fails with `QuotaExceeded` at the `max_users` ceiling,
    /// `Conflict` on duplicate in-tenant email.
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    async fn list_users(
        &self,
        tenant_id: TenantId,
        filter: &UserFilter,
        page: PageRequest,
    ) -> AppResult<Page<User>>;
    async fn update_user(&self, id: UserId, patch: UserPatch) -> AppResult<User>;
    /// Deletes the user; task assignments referencing them are cleared
    /// (set-null), never cascaded.
    async fn delete_user(&self, id: UserId) -> AppResult<()>;

    // Projects
    /// Quota-guarded: fails with `QuotaExceeded` at the `max_projects` ceiling.
    async fn create_project(&self, project: NewProject) -> AppResult<Project>;
    async fn project_by_id(&self, id: ProjectId) -> AppResult<Option<Project>>;
    async fn list_projects(
        &self,
        tenant_id: TenantId,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> AppResult<Page<ProjectListRow>>;
    async fn update_project(&self, id: ProjectId, patch: ProjectPatch) -> AppResult<Project>;
    /// Deletes the project and its tasks.
    async fn delete_project(&self, id: ProjectId) -> AppResult<()>;

    // Tasks
    async fn create_task(&self, task: NewTask) -> AppResult<TaskRow>;
    async fn task_by_id(&self, id: TaskId) -> AppResult<Option<Task>>;
    async fn list_tasks(
        &self,
        project_id: ProjectId,
        tenant_id: TenantId,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> AppResult<Page<TaskRow>>;
    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> AppResult<TaskRow>;
    async fn delete_task(&self, id: TaskId) -> AppResult<()>;
    /// Tasks assigned to `user_id` within the tenant, priority-first.
    async fn tasks_assigned_to(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        limit: u32,
    ) -> AppResult<Vec<MyTaskRow>>;

    // Audit
    /// Append-only; callers use [`crate::AuditRecorder`] which swallows
    /// failures. The raw method still reports them for logging.
    async fn append_audit(&self, record: AuditRecord) -> AppResult<()>;
}
