//! In-memory store for tests and development.
//!
//! One mutex over the whole state doubles as the quota serialization point:
//! check-then-insert sequences run under a single lock acquisition, so the
//! ceiling contract holds under concurrency exactly as it does for the
//! Postgres implementation's row lock.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use taskdeck_core::{
    AppError, AppResult, AuditLogEntry, MyTaskRow, Page, PageRequest, Project, ProjectId,
    ProjectListRow, Role, SubscriptionPlan, Task, TaskId, TaskRow, Tenant, TenantId, TenantListRow,
    TenantStats, TenantStatus, User, UserId, UserSummary,
};

use crate::store::{
    AuditRecord, NewProject, NewTask, NewUser, ProjectFilter, ProjectPatch, RegisterTenant, Store,
    TaskFilter, TaskPatch, TenantFilter, TenantPatch, UserFilter, UserPatch,
};

/// Registration defaults for the free plan.
const DEFAULT_MAX_USERS: i32 = 5;
const DEFAULT_MAX_PROJECTS: i32 = 3;

#[derive(Debug, Default)]
struct State {
    tenants: HashMap<TenantId, Tenant>,
    users: HashMap<UserId, User>,
    projects: HashMap<ProjectId, Project>,
    tasks: HashMap<TaskId, Task>,
    audit: Vec<AuditLogEntry>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> AppResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|_| AppError::internal("store state poisoned"))
    }

    /// Seed a tenant-less super_admin (dev/test bootstrap; registration can
    /// only ever create tenant-scoped identities).
    pub fn seed_super_admin(
        &self,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        full_name: impl Into<String>,
    ) -> AppResult<User> {
        let mut state = self.locked()?;
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            tenant_id: None,
            email: email.into(),
            password_hash: password_hash.into(),
            full_name: full_name.into(),
            role: Role::SuperAdmin,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    /// Snapshot of the audit log, oldest first (test inspection).
    pub fn audit_entries(&self) -> Vec<AuditLogEntry> {
        self.state
            .lock()
            .map(|s| s.audit.clone())
            .unwrap_or_default()
    }
}

fn summary_of(state: &State, id: UserId) -> Option<UserSummary> {
    state.users.get(&id).map(|u| UserSummary {
        id: u.id,
        full_name: u.full_name.clone(),
        email: u.email.clone(),
    })
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn task_row(state: &State, task: &Task) -> TaskRow {
    TaskRow {
        task: task.clone(),
        assignee: task.assigned_to.and_then(|id| summary_of(state, id)),
    }
}

/// Task list ordering: priority high-first, then due date soonest-first with
/// undated tasks last, then newest creation.
fn task_order(a: &Task, b: &Task) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

fn paginate<T>(mut items: Vec<T>, page: PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let start = (page.offset() as usize).min(items.len());
    let end = (start + page.limit as usize).min(items.len());
    let items = items.drain(start..end).collect();
    Page { items, total }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn register_tenant(&self, reg: RegisterTenant) -> AppResult<(Tenant, User)> {
        let mut state = self.locked()?;

        if state
            .tenants
            .values()
            .any(|t| t.subdomain == reg.subdomain)
        {
            return Err(AppError::conflict("subdomain already exists"));
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: TenantId::new(),
            name: reg.tenant_name,
            subdomain: reg.subdomain,
            status: TenantStatus::Active,
            subscription_plan: SubscriptionPlan::Free,
            max_users: DEFAULT_MAX_USERS,
            max_projects: DEFAULT_MAX_PROJECTS,
            created_at: now,
            updated_at: now,
        };
        let admin = User {
            id: UserId::new(),
            tenant_id: Some(tenant.id),
            email: reg.admin_email,
            password_hash: reg.admin_password_hash,
            full_name: reg.admin_full_name,
            role: Role::TenantAdmin,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        state.tenants.insert(tenant.id, tenant.clone());
        state.users.insert(admin.id, admin.clone());
        Ok((tenant, admin))
    }

    async fn tenant_by_subdomain(&self, subdomain: &str) -> AppResult<Option<Tenant>> {
        let state = self.locked()?;
        Ok(state
            .tenants
            .values()
            .find(|t| t.subdomain == subdomain)
            .cloned())
    }

    async fn tenant_by_id(&self, id: TenantId) -> AppResult<Option<Tenant>> {
        Ok(self.locked()?.tenants.get(&id).cloned())
    }

    async fn tenant_stats(&self, id: TenantId) -> AppResult<TenantStats> {
        let state = self.locked()?;
        Ok(TenantStats {
            total_users: state
                .users
                .values()
                .filter(|u| u.tenant_id == Some(id))
                .count() as i64,
            total_projects: state
                .projects
                .values()
                .filter(|p| p.tenant_id == id)
                .count() as i64,
            total_tasks: state.tasks.values().filter(|t| t.tenant_id == id).count() as i64,
        })
    }

    async fn list_tenants(
        &self,
        filter: &TenantFilter,
        page: PageRequest,
    ) -> AppResult<Page<TenantListRow>> {
        let state = self.locked()?;
        let mut tenants: Vec<Tenant> = state
            .tenants
            .values()
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| {
                filter
                    .subscription_plan
                    .is_none_or(|p| t.subscription_plan == p)
            })
            .cloned()
            .collect();
        tenants.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let page = paginate(tenants, page);
        let items = page
            .items
            .into_iter()
            .map(|tenant| TenantListRow {
                total_users: state
                    .users
                    .values()
                    .filter(|u| u.tenant_id == Some(tenant.id))
                    .count() as i64,
                total_projects: state
                    .projects
                    .values()
                    .filter(|p| p.tenant_id == tenant.id)
                    .count() as i64,
                tenant,
            })
            .collect();
        Ok(Page {
            items,
            total: page.total,
        })
    }

    async fn update_tenant(&self, id: TenantId, patch: TenantPatch) -> AppResult<Tenant> {
        let mut state = self.locked()?;
        let tenant = state.tenants.get_mut(&id).ok_or(AppError::NotFound)?;

        if let Some(name) = patch.name {
            tenant.name = name;
        }
        if let Some(status) = patch.status {
            tenant.status = status;
        }
        if let Some(plan) = patch.subscription_plan {
            tenant.subscription_plan = plan;
        }
        if let Some(max_users) = patch.max_users {
            tenant.max_users = max_users;
        }
        if let Some(max_projects) = patch.max_projects {
            tenant.max_projects = max_projects;
        }
        tenant.updated_at = Utc::now();
        Ok(tenant.clone())
    }

    async fn user_for_login(
        &self,
        email: &str,
        tenant_id: Option<TenantId>,
    ) -> AppResult<Option<User>> {
        let state = self.locked()?;
        // An exact tenant match wins over a tenant-less platform account
        // sharing the same email.
        let mut tenantless = None;
        for user in state.users.values() {
            if user.email != email {
                continue;
            }
            if user.tenant_id.is_some() && user.tenant_id == tenant_id {
                return Ok(Some(user.clone()));
            }
            if user.tenant_id.is_none() {
                tenantless = Some(user.clone());
            }
        }
        Ok(tenantless)
    }

    async fn user_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.locked()?.users.get(&id).cloned())
    }

    async fn user_in_tenant(&self, user_id: UserId, tenant_id: TenantId) -> AppResult<bool> {
        let state = self.locked()?;
        Ok(state
            .users
            .get(&user_id)
            .is_some_and(|u| u.tenant_id == Some(tenant_id)))
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        // Ceiling check and insert under one lock acquisition: the quota
        // guard's atomic unit.
        let mut state = self.locked()?;

        let tenant = state
            .tenants
            .get(&user.tenant_id)
            .cloned()
            .ok_or(AppError::NotFound)?;

        let current = state
            .users
            .values()
            .filter(|u| u.tenant_id == Some(user.tenant_id))
            .count() as i32;
        if current >= tenant.max_users {
            return Err(AppError::quota("subscription user limit reached"));
        }

        if state
            .users
            .values()
            .any(|u| u.tenant_id == Some(user.tenant_id) && u.email == user.email)
        {
            return Err(AppError::conflict("email already exists in this tenant"));
        }

        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            tenant_id: Some(user.tenant_id),
            email: user.email,
            password_hash: user.password_hash,
            full_name: user.full_name,
            role: user.role,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn list_users(
        &self,
        tenant_id: TenantId,
        filter: &UserFilter,
        page: PageRequest,
    ) -> AppResult<Page<User>> {
        let state = self.locked()?;
        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| u.tenant_id == Some(tenant_id))
            .filter(|u| filter.role.is_none_or(|r| u.role == r))
            .filter(|u| {
                filter
                    .search
                    .as_deref()
                    .is_none_or(|q| contains_ci(&u.email, q) || contains_ci(&u.full_name, q))
            })
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(users, page))
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> AppResult<User> {
        let mut state = self.locked()?;
        let user = state.users.get_mut(&id).ok_or(AppError::NotFound)?;

        if let Some(full_name) = patch.full_name {
            user.full_name = full_name;
        }
        if let Some(role) = patch.role {
            user.role = role;
        }
        if let Some(is_active) = patch.is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn delete_user(&self, id: UserId) -> AppResult<()> {
        let mut state = self.locked()?;
        state.users.remove(&id).ok_or(AppError::NotFound)?;

        // Set-null, not cascade: assigned tasks survive their assignee.
        let now = Utc::now();
        for task in state.tasks.values_mut() {
            if task.assigned_to == Some(id) {
                task.assigned_to = None;
                task.updated_at = now;
            }
        }
        Ok(())
    }

    async fn create_project(&self, project: NewProject) -> AppResult<Project> {
        let mut state = self.locked()?;

        let tenant = state
            .tenants
            .get(&project.tenant_id)
            .cloned()
            .ok_or(AppError::NotFound)?;

        let current = state
            .projects
            .values()
            .filter(|p| p.tenant_id == project.tenant_id)
            .count() as i32;
        if current >= tenant.max_projects {
            return Err(AppError::quota("subscription project limit reached"));
        }

        let now = Utc::now();
        let project = Project {
            id: ProjectId::new(),
            tenant_id: project.tenant_id,
            name: project.name,
            description: project.description,
            status: project.status,
            created_by: project.created_by,
            created_at: now,
            updated_at: now,
        };
        state.projects.insert(project.id, project.clone());
        Ok(project)
    }

    async fn project_by_id(&self, id: ProjectId) -> AppResult<Option<Project>> {
        Ok(self.locked()?.projects.get(&id).cloned())
    }

    async fn list_projects(
        &self,
        tenant_id: TenantId,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> AppResult<Page<ProjectListRow>> {
        let state = self.locked()?;
        let mut projects: Vec<Project> = state
            .projects
            .values()
            .filter(|p| p.tenant_id == tenant_id)
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .filter(|p| filter.search.as_deref().is_none_or(|q| contains_ci(&p.name, q)))
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let page = paginate(projects, page);
        let items = page
            .items
            .into_iter()
            .map(|project| ProjectListRow {
                creator: summary_of(&state, project.created_by),
                task_count: state
                    .tasks
                    .values()
                    .filter(|t| t.project_id == project.id)
                    .count() as i64,
                completed_task_count: state
                    .tasks
                    .values()
                    .filter(|t| {
                        t.project_id == project.id
                            && t.status == taskdeck_core::TaskStatus::Completed
                    })
                    .count() as i64,
                project,
            })
            .collect();
        Ok(Page {
            items,
            total: page.total,
        })
    }

    async fn update_project(&self, id: ProjectId, patch: ProjectPatch) -> AppResult<Project> {
        let mut state = self.locked()?;
        let project = state.projects.get_mut(&id).ok_or(AppError::NotFound)?;

        if let Some(name) = patch.name {
            project.name = name;
        }
        if let Some(description) = patch.description {
            project.description = Some(description);
        }
        if let Some(status) = patch.status {
            project.status = status;
        }
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn delete_project(&self, id: ProjectId) -> AppResult<()> {
        let mut state = self.locked()?;
        state.projects.remove(&id).ok_or(AppError::NotFound)?;
        state.tasks.retain(|_, t| t.project_id != id);
        Ok(())
    }

    async fn create_task(&self, task: NewTask) -> AppResult<TaskRow> {
        let mut state = self.locked()?;
        if !state.projects.contains_key(&task.project_id) {
            return Err(AppError::NotFound);
        }

        let now = Utc::now();
        let task = Task {
            id: TaskId::new(),
            project_id: task.project_id,
            tenant_id: task.tenant_id,
            title: task.title,
            description: task.description,
            status: taskdeck_core::TaskStatus::Todo,
            priority: task.priority,
            assigned_to: task.assigned_to,
            due_date: task.due_date,
            created_at: now,
            updated_at: now,
        };
        state.tasks.insert(task.id, task.clone());
        Ok(task_row(&state, &task))
    }

    async fn task_by_id(&self, id: TaskId) -> AppResult<Option<Task>> {
        Ok(self.locked()?.tasks.get(&id).cloned())
    }

    async fn list_tasks(
        &self,
        project_id: ProjectId,
        tenant_id: TenantId,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> AppResult<Page<TaskRow>> {
        let state = self.locked()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.project_id == project_id && t.tenant_id == tenant_id)
            .filter(|t| filter.status.is_none_or(|s| t.status == s))
            .filter(|t| filter.priority.is_none_or(|p| t.priority == p))
            .filter(|t| filter.assigned_to.is_none_or(|u| t.assigned_to == Some(u)))
            .filter(|t| filter.search.as_deref().is_none_or(|q| contains_ci(&t.title, q)))
            .cloned()
            .collect();
        tasks.sort_by(task_order);

        let page = paginate(tasks, page);
        let items = page.items.iter().map(|t| task_row(&state, t)).collect();
        Ok(Page {
            items,
            total: page.total,
        })
    }

    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> AppResult<TaskRow> {
        let mut state = self.locked()?;
        let task = state.tasks.get_mut(&id).ok_or(AppError::NotFound)?;

        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = Some(description);
        }
        if let Some(status) = patch.status {
            task.status = status;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(assigned_to) = patch.assigned_to {
            task.assigned_to = assigned_to;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        task.updated_at = Utc::now();

        let task = task.clone();
        Ok(task_row(&state, &task))
    }

    async fn delete_task(&self, id: TaskId) -> AppResult<()> {
        let mut state = self.locked()?;
        state.tasks.remove(&id).ok_or(AppError::NotFound)?;
        Ok(())
    }

    async fn tasks_assigned_to(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        limit: u32,
    ) -> AppResult<Vec<MyTaskRow>> {
        let state = self.locked()?;
        let mut tasks: Vec<Task> = state
            .tasks
            .values()
            .filter(|t| t.tenant_id == tenant_id && t.assigned_to == Some(user_id))
            .cloned()
            .collect();
        tasks.sort_by(task_order);
        tasks.truncate(limit as usize);

        Ok(tasks
            .into_iter()
            .map(|task| MyTaskRow {
                project_name: state
                    .projects
                    .get(&task.project_id)
                    .map(|p| p.name.clone())
                    .unwrap_or_default(),
                assignee: task.assigned_to.and_then(|id| summary_of(&state, id)),
                task,
            })
            .collect())
    }

    async fn append_audit(&self, record: AuditRecord) -> AppResult<()> {
        let mut state = self.locked()?;
        state.audit.push(AuditLogEntry {
            id: Uuid::now_v7(),
            tenant_id: record.tenant_id,
            user_id: record.user_id,
            action: record.action,
            entity_type: record.entity_type,
            entity_id: record.entity_id,
            ip_address: record.ip_address,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use taskdeck_core::TaskStatus;

    fn registration(subdomain: &str) -> RegisterTenant {
        RegisterTenant {
            tenant_name: "Acme".into(),
            subdomain: subdomain.into(),
            admin_email: "admin@acme.com".into(),
            admin_password_hash: "hash".into(),
            admin_full_name: "Acme Admin".into(),
        }
    }

    fn new_project(tenant_id: TenantId, created_by: UserId, name: &str) -> NewProject {
        NewProject {
            tenant_id,
            name: name.into(),
            description: None,
            status: Default::default(),
            created_by,
        }
    }

    #[tokio::test]
    async fn duplicate_subdomain_conflicts() {
        let store = InMemoryStore::new();
        store.register_tenant(registration("acme")).await.unwrap();
        let err = store
            .register_tenant(registration("acme"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn email_uniqueness_is_scoped_per_tenant() {
        let store = InMemoryStore::new();
        let (a, _) = store.register_tenant(registration("acme")).await.unwrap();
        let (b, _) = store.register_tenant(registration("globex")).await.unwrap();

        let user = |tenant_id| NewUser {
            tenant_id,
            email: "shared@example.com".into(),
            password_hash: "hash".into(),
            full_name: "Shared Name".into(),
            role: Role::User,
        };

        // Same email in two different tenants is fine.
        store.create_user(user(a.id)).await.unwrap();
        store.create_user(user(b.id)).await.unwrap();

        // Same email twice in one tenant is not.
        let err = store.create_user(user(a.id)).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn project_ceiling_is_enforced() {
        let store = InMemoryStore::new();
        let (tenant, admin) = store.register_tenant(registration("acme")).await.unwrap();
        store
            .update_tenant(
                tenant.id,
                TenantPatch {
                    max_projects: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        store
            .create_project(new_project(tenant.id, admin.id, "first"))
            .await
            .unwrap();
        let err = store
            .create_project(new_project(tenant.id, admin.id, "second"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded(_)));

        let page = store
            .list_projects(
                tenant.id,
                &ProjectFilter::default(),
                PageRequest::clamped(None, None, 20),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 1);
    }

    #[tokio::test]
    async fn concurrent_last_slot_creation_admits_exactly_one() {
        let store = Arc::new(InMemoryStore::new());
        let (tenant, admin) = store.register_tenant(registration("acme")).await.unwrap();
        store
            .update_tenant(
                tenant.id,
                TenantPatch {
                    max_projects: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let mut handles = Vec::new();
        for i in 0..8 {
            let store = Arc::clone(&store);
            let tenant_id = tenant.id;
            let admin_id = admin.id;
            handles.push(tokio::spawn(async move {
                store
                    .create_project(new_project(tenant_id, admin_id, &format!("p{i}")))
                    .await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }
        assert_eq!(successes, 1);
    }

    #[tokio::test]
    async fn user_ceiling_is_enforced() {
        let store = InMemoryStore::new();
        let (tenant, _) = store.register_tenant(registration("acme")).await.unwrap();
        store
            .update_tenant(
                tenant.id,
                TenantPatch {
                    max_users: Some(1),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        // The admin created at registration already fills the single slot.
        let err = store
            .create_user(NewUser {
                tenant_id: tenant.id,
                email: "second@acme.com".into(),
                password_hash: "hash".into(),
                full_name: "Second".into(),
                role: Role::User,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::QuotaExceeded(_)));
    }

    #[tokio::test]
    async fn deleting_assignee_clears_assignment_but_keeps_task() {
        let store = InMemoryStore::new();
        let (tenant, admin) = store.register_tenant(registration("acme")).await.unwrap();
        let member = store
            .create_user(NewUser {
                tenant_id: tenant.id,
                email: "member@acme.com".into(),
                password_hash: "hash".into(),
                full_name: "Member".into(),
                role: Role::User,
            })
            .await
            .unwrap();
        let project = store
            .create_project(new_project(tenant.id, admin.id, "p"))
            .await
            .unwrap();
        let task = store
            .create_task(NewTask {
                project_id: project.id,
                tenant_id: tenant.id,
                title: "t".into(),
                description: None,
                priority: Default::default(),
                assigned_to: Some(member.id),
                due_date: None,
            })
            .await
            .unwrap();

        store.delete_user(member.id).await.unwrap();

        let survivor = store.task_by_id(task.task.id).await.unwrap().unwrap();
        assert_eq!(survivor.assigned_to, None);
        assert_eq!(survivor.status, TaskStatus::Todo);
    }

    #[tokio::test]
    async fn login_lookup_matches_tenant_and_tenantless_users() {
        let store = InMemoryStore::new();
        let (tenant, admin) = store.register_tenant(registration("acme")).await.unwrap();
        store
            .seed_super_admin("root@taskdeck.dev", "hash", "Root")
            .unwrap();

        let found = store
            .user_for_login("admin@acme.com", Some(tenant.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, admin.id);

        // Tenant-less super admin resolves with and without tenant context.
        assert!(store
            .user_for_login("root@taskdeck.dev", Some(tenant.id))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .user_for_login("root@taskdeck.dev", None)
            .await
            .unwrap()
            .is_some());

        // A tenant member does not resolve without their tenant context.
        assert!(store
            .user_for_login("admin@acme.com", None)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn login_lookup_prefers_tenant_match_over_platform_account() {
        let store = InMemoryStore::new();
        let (tenant, admin) = store.register_tenant(registration("acme")).await.unwrap();
        store
            .seed_super_admin("admin@acme.com", "hash", "Root")
            .unwrap();

        // Shared email: the tenant member wins under tenant context.
        let found = store
            .user_for_login("admin@acme.com", Some(tenant.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, admin.id);

        // Without tenant context only the platform account resolves.
        let found = store
            .user_for_login("admin@acme.com", None)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.tenant_id, None);
    }

    #[tokio::test]
    async fn task_listing_orders_priority_first() {
        use taskdeck_core::TaskPriority;

        let store = InMemoryStore::new();
        let (tenant, admin) = store.register_tenant(registration("acme")).await.unwrap();
        let project = store
            .create_project(new_project(tenant.id, admin.id, "p"))
            .await
            .unwrap();

        for (title, priority) in [("low", TaskPriority::Low), ("high", TaskPriority::High)] {
            store
                .create_task(NewTask {
                    project_id: project.id,
                    tenant_id: tenant.id,
                    title: title.into(),
                    description: None,
                    priority,
                    assigned_to: None,
                    due_date: None,
                })
                .await
                .unwrap();
        }

        let page = store
            .list_tasks(
                project.id,
                tenant.id,
                &TaskFilter::default(),
                PageRequest::clamped(None, None, 50),
            )
            .await
            .unwrap();
        assert_eq!(page.items[0].task.title, "high");
        assert_eq!(page.items[1].task.title, "low");
    }
}
