//! Postgres-backed store.
//!
//! ## Quota guard
//!
//! `create_user` / `create_project` are the only multi-statement
//! transactions in the system: they lock the tenant row with
//! `SELECT ... FOR UPDATE`, count the resource, and insert, all in one
//! transaction. The row lock serializes concurrent creations against the same
//! tenant, so two "last slot" requests cannot both pass the ceiling check.
//!
//! ## Error mapping
//!
//! | sqlx error | PG code | AppError |
//! |------------|---------|----------|
//! | Database (unique violation) | `23505` | `Conflict` (subdomain / in-tenant email) |
//! | RowNotFound | | `NotFound` |
//! | anything else | | `Internal` (cause logged here, never surfaced) |

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use taskdeck_core::{
    AppError, AppResult, MyTaskRow, Page, PageRequest, Project, ProjectId, ProjectListRow,
    ProjectStatus, Role, SubscriptionPlan, Task, TaskId, TaskPriority, TaskRow, TaskStatus, Tenant,
    TenantId, TenantListRow, TenantStats, TenantStatus, User, UserId, UserSummary,
};

use crate::store::{
    AuditRecord, NewProject, NewTask, NewUser, ProjectFilter, ProjectPatch, RegisterTenant, Store,
    TaskFilter, TaskPatch, TenantFilter, TenantPatch, UserFilter, UserPatch,
};

/// Registration defaults for the free plan.
const DEFAULT_MAX_USERS: i32 = 5;
const DEFAULT_MAX_PROJECTS: i32 = 3;

/// Task ordering used by every task list: priority high-first, soonest due
/// date next (undated last), newest creation last.
const TASK_ORDER: &str = "CASE t.priority WHEN 'high' THEN 3 WHEN 'medium' THEN 2 ELSE 1 END DESC, \
     t.due_date ASC NULLS LAST, t.created_at DESC";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply the bundled schema migrations.
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "migration failed");
                AppError::internal("storage failure")
            })
    }
}

fn map_sqlx(op: &'static str, e: sqlx::Error) -> AppError {
    match &e {
        sqlx::Error::RowNotFound => AppError::NotFound,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
            let constraint = db.constraint().unwrap_or_default();
            if constraint.contains("subdomain") {
                AppError::conflict("subdomain already exists")
            } else if constraint.contains("email") {
                AppError::conflict("email already exists in this tenant")
            } else {
                AppError::conflict("duplicate value")
            }
        }
        _ => {
            tracing::error!(op, error = %e, "database error");
            AppError::internal("storage failure")
        }
    }
}

fn col<'r, T>(row: &'r PgRow, name: &str) -> AppResult<T>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name).map_err(|e| {
        tracing::error!(column = name, error = %e, "row decode failed");
        AppError::internal("storage failure")
    })
}

fn tenant_from_row(row: &PgRow) -> AppResult<Tenant> {
    Ok(Tenant {
        id: TenantId::from_uuid(col(row, "id")?),
        name: col(row, "name")?,
        subdomain: col(row, "subdomain")?,
        status: col::<String>(row, "status")?.parse::<TenantStatus>()?,
        subscription_plan: col::<String>(row, "subscription_plan")?.parse::<SubscriptionPlan>()?,
        max_users: col(row, "max_users")?,
        max_projects: col(row, "max_projects")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn user_from_row(row: &PgRow) -> AppResult<User> {
    Ok(User {
        id: UserId::from_uuid(col(row, "id")?),
        tenant_id: col::<Option<Uuid>>(row, "tenant_id")?.map(TenantId::from_uuid),
        email: col(row, "email")?,
        password_hash: col(row, "password_hash")?,
        full_name: col(row, "full_name")?,
        role: col::<String>(row, "role")?.parse::<Role>()?,
        is_active: col(row, "is_active")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn project_from_row(row: &PgRow) -> AppResult<Project> {
    Ok(Project {
        id: ProjectId::from_uuid(col(row, "id")?),
        tenant_id: TenantId::from_uuid(col(row, "tenant_id")?),
        name: col(row, "name")?,
        description: col(row, "description")?,
        status: col::<String>(row, "status")?.parse::<ProjectStatus>()?,
        created_by: UserId::from_uuid(col(row, "created_by")?),
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

fn task_from_row(row: &PgRow) -> AppResult<Task> {
    Ok(Task {
        id: TaskId::from_uuid(col(row, "id")?),
        project_id: ProjectId::from_uuid(col(row, "project_id")?),
        tenant_id: TenantId::from_uuid(col(row, "tenant_id")?),
        title: col(row, "title")?,
        description: col(row, "description")?,
        status: col::<String>(row, "status")?.parse::<TaskStatus>()?,
        priority: col::<String>(row, "priority")?.parse::<TaskPriority>()?,
        assigned_to: col::<Option<Uuid>>(row, "assigned_to")?.map(UserId::from_uuid),
        due_date: col(row, "due_date")?,
        created_at: col(row, "created_at")?,
        updated_at: col(row, "updated_at")?,
    })
}

/// Assignee columns come from a `LEFT JOIN users` aliased `u`.
fn assignee_from_row(row: &PgRow) -> AppResult<Option<UserSummary>> {
    let id: Option<Uuid> = col(row, "assignee_id")?;
    Ok(id.map(|id| UserSummary {
        id: UserId::from_uuid(id),
        full_name: col::<Option<String>>(row, "assignee_name")
            .ok()
            .flatten()
            .unwrap_or_default(),
        email: col::<Option<String>>(row, "assignee_email")
            .ok()
            .flatten()
            .unwrap_or_default(),
    }))
}

fn like_pattern(search: &Option<String>) -> Option<String> {
    search.as_ref().map(|q| format!("%{q}%"))
}

#[async_trait::async_trait]
impl Store for PgStore {
    #[instrument(skip(self, reg), fields(subdomain = %reg.subdomain))]
    async fn register_tenant(&self, reg: RegisterTenant) -> AppResult<(Tenant, User)> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx("register_tenant", e))?;

        let tenant_row = sqlx::query(
            r#"
            INSERT INTO tenants (id, name, subdomain, status, subscription_plan, max_users, max_projects)
            VALUES ($1, $2, $3, 'active', 'free', $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&reg.tenant_name)
        .bind(&reg.subdomain)
        .bind(DEFAULT_MAX_USERS)
        .bind(DEFAULT_MAX_PROJECTS)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx("register_tenant", e))?;
        let tenant = tenant_from_row(&tenant_row)?;

        let user_row = sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, email, password_hash, full_name, role, is_active)
            VALUES ($1, $2, $3, $4, $5, 'tenant_admin', TRUE)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(Uuid::from(tenant.id))
        .bind(&reg.admin_email)
        .bind(&reg.admin_password_hash)
        .bind(&reg.admin_full_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx("register_tenant", e))?;
        let admin = user_from_row(&user_row)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx("register_tenant", e))?;
        Ok((tenant, admin))
    }

    async fn tenant_by_subdomain(&self, subdomain: &str) -> AppResult<Option<Tenant>> {
        let row = sqlx::query("SELECT * FROM tenants WHERE subdomain = $1")
            .bind(subdomain)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx("tenant_by_subdomain", e))?;
        row.as_ref().map(tenant_from_row).transpose()
    }

    async fn tenant_by_id(&self, id: TenantId) -> AppResult<Option<Tenant>> {
        let row = sqlx::query("SELECT * FROM tenants WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx("tenant_by_id", e))?;
        row.as_ref().map(tenant_from_row).transpose()
    }

    async fn tenant_stats(&self, id: TenantId) -> AppResult<TenantStats> {
        let row = sqlx::query(
            r#"
            SELECT
              (SELECT COUNT(*) FROM users WHERE tenant_id = $1) AS total_users,
              (SELECT COUNT(*) FROM projects WHERE tenant_id = $1) AS total_projects,
              (SELECT COUNT(*) FROM tasks WHERE tenant_id = $1) AS total_tasks
            "#,
        )
        .bind(Uuid::from(id))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx("tenant_stats", e))?;

        Ok(TenantStats {
            total_users: col(&row, "total_users")?,
            total_projects: col(&row, "total_projects")?,
            total_tasks: col(&row, "total_tasks")?,
        })
    }

    async fn list_tenants(
        &self,
        filter: &TenantFilter,
        page: PageRequest,
    ) -> AppResult<Page<TenantListRow>> {
        let status = filter.status.map(|s| s.as_str());
        let plan = filter.subscription_plan.map(|p| p.as_str());

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM tenants
            WHERE ($1::text IS NULL OR status = $1)
              AND ($2::text IS NULL OR subscription_plan = $2)
            "#,
        )
        .bind(status)
        .bind(plan)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx("list_tenants", e))?;

        let rows = sqlx::query(
            r#"
            SELECT t.*,
              (SELECT COUNT(*) FROM users u WHERE u.tenant_id = t.id) AS total_users,
              (SELECT COUNT(*) FROM projects p WHERE p.tenant_id = t.id) AS total_projects
            FROM tenants t
            WHERE ($1::text IS NULL OR t.status = $1)
              AND ($2::text IS NULL OR t.subscription_plan = $2)
            ORDER BY t.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(status)
        .bind(plan)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx("list_tenants", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(TenantListRow {
                tenant: tenant_from_row(row)?,
                total_users: col(row, "total_users")?,
                total_projects: col(row, "total_projects")?,
            });
        }
        Ok(Page {
            items,
            total: total as u64,
        })
    }

    async fn update_tenant(&self, id: TenantId, patch: TenantPatch) -> AppResult<Tenant> {
        let row = sqlx::query(
            r#"
            UPDATE tenants SET
              name = COALESCE($2, name),
              status = COALESCE($3, status),
              subscription_plan = COALESCE($4, subscription_plan),
              max_users = COALESCE($5, max_users),
              max_projects = COALESCE($6, max_projects),
              updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(Uuid::from(id))
        .bind(patch.name)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.subscription_plan.map(|p| p.as_str()))
        .bind(patch.max_users)
        .bind(patch.max_projects)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx("update_tenant", e))?;

        tenant_from_row(row.as_ref().ok_or(AppError::NotFound)?)
    }

    async fn user_for_login(
        &self,
        email: &str,
        tenant_id: Option<TenantId>,
    ) -> AppResult<Option<User>> {
        // Matches the tenant's users and tenant-less (super_admin) users.
        let row = sqlx::query(
            r#"
            SELECT * FROM users
            WHERE email = $1 AND (tenant_id IS NULL OR tenant_id = $2)
            ORDER BY tenant_id NULLS LAST
            LIMIT 1
            "#,
        )
        .bind(email)
        .bind(tenant_id.map(Uuid::from))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx("user_for_login", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_by_id(&self, id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx("user_by_id", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn user_in_tenant(&self, user_id: UserId, tenant_id: TenantId) -> AppResult<bool> {
        let exists: Option<i32> =
            sqlx::query_scalar("SELECT 1 FROM users WHERE id = $1 AND tenant_id = $2")
                .bind(Uuid::from(user_id))
                .bind(Uuid::from(tenant_id))
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| map_sqlx("user_in_tenant", e))?;
        Ok(exists.is_some())
    }

    #[instrument(skip(self, user), fields(tenant_id = %user.tenant_id))]
    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx("create_user", e))?;

        // Row lock on the tenant serializes concurrent creations; the count
        // below only ever sees committed rows plus our own.
        let ceiling: Option<i32> =
            sqlx::query_scalar("SELECT max_users FROM tenants WHERE id = $1 FOR UPDATE")
                .bind(Uuid::from(user.tenant_id))
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx("create_user", e))?;
        let ceiling = ceiling.ok_or(AppError::NotFound)?;

        let current: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE tenant_id = $1")
            .bind(Uuid::from(user.tenant_id))
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx("create_user", e))?;

        if current >= i64::from(ceiling) {
            // Dropping tx rolls back; nothing has been written yet.
            return Err(AppError::quota("subscription user limit reached"));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, email, password_hash, full_name, role, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, TRUE)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(Uuid::from(user.tenant_id))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.full_name)
        .bind(user.role.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx("create_user", e))?;
        let created = user_from_row(&row)?;

        tx.commit().await.map_err(|e| map_sqlx("create_user", e))?;
        Ok(created)
    }

    async fn list_users(
        &self,
        tenant_id: TenantId,
        filter: &UserFilter,
        page: PageRequest,
    ) -> AppResult<Page<User>> {
        let role = filter.role.map(|r| r.as_str());
        let pattern = like_pattern(&filter.search);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM users
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR role = $2)
              AND ($3::text IS NULL OR email ILIKE $3 OR full_name ILIKE $3)
            "#,
        )
        .bind(Uuid::from(tenant_id))
        .bind(role)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx("list_users", e))?;

        let rows = sqlx::query(
            r#"
            SELECT * FROM users
            WHERE tenant_id = $1
              AND ($2::text IS NULL OR role = $2)
              AND ($3::text IS NULL OR email ILIKE $3 OR full_name ILIKE $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(Uuid::from(tenant_id))
        .bind(role)
        .bind(&pattern)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx("list_users", e))?;

        let items = rows
            .iter()
            .map(user_from_row)
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Page {
            items,
            total: total as u64,
        })
    }

    async fn update_user(&self, id: UserId, patch: UserPatch) -> AppResult<User> {
        let row = sqlx::query(
            r#"
            UPDATE users SET
              full_name = COALESCE($2, full_name),
              role = COALESCE($3, role),
              is_active = COALESCE($4, is_active),
              updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(Uuid::from(id))
        .bind(patch.full_name)
        .bind(patch.role.map(|r| r.as_str()))
        .bind(patch.is_active)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx("update_user", e))?;

        user_from_row(row.as_ref().ok_or(AppError::NotFound)?)
    }

    async fn delete_user(&self, id: UserId) -> AppResult<()> {
        // tasks.assigned_to is ON DELETE SET NULL; the schema clears
        // assignments, tasks survive.
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx("delete_user", e))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    #[instrument(skip(self, project), fields(tenant_id = %project.tenant_id))]
    async fn create_project(&self, project: NewProject) -> AppResult<Project> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx("create_project", e))?;

        let ceiling: Option<i32> =
            sqlx::query_scalar("SELECT max_projects FROM tenants WHERE id = $1 FOR UPDATE")
                .bind(Uuid::from(project.tenant_id))
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx("create_project", e))?;
        let ceiling = ceiling.ok_or(AppError::NotFound)?;

        let current: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE tenant_id = $1")
                .bind(Uuid::from(project.tenant_id))
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| map_sqlx("create_project", e))?;

        if current >= i64::from(ceiling) {
            return Err(AppError::quota("subscription project limit reached"));
        }

        let row = sqlx::query(
            r#"
            INSERT INTO projects (id, tenant_id, name, description, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(Uuid::from(project.tenant_id))
        .bind(&project.name)
        .bind(&project.description)
        .bind(project.status.as_str())
        .bind(Uuid::from(project.created_by))
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx("create_project", e))?;
        let created = project_from_row(&row)?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx("create_project", e))?;
        Ok(created)
    }

    async fn project_by_id(&self, id: ProjectId) -> AppResult<Option<Project>> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx("project_by_id", e))?;
        row.as_ref().map(project_from_row).transpose()
    }

    async fn list_projects(
        &self,
        tenant_id: TenantId,
        filter: &ProjectFilter,
        page: PageRequest,
    ) -> AppResult<Page<ProjectListRow>> {
        let status = filter.status.map(|s| s.as_str());
        let pattern = like_pattern(&filter.search);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM projects p
            WHERE p.tenant_id = $1
              AND ($2::text IS NULL OR p.status = $2)
              AND ($3::text IS NULL OR p.name ILIKE $3)
            "#,
        )
        .bind(Uuid::from(tenant_id))
        .bind(status)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx("list_projects", e))?;

        let rows = sqlx::query(
            r#"
            SELECT p.*,
              u.id AS creator_id, u.full_name AS creator_name, u.email AS creator_email,
              (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id) AS task_count,
              (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id AND t.status = 'completed')
                AS completed_task_count
            FROM projects p
            LEFT JOIN users u ON p.created_by = u.id
            WHERE p.tenant_id = $1
              AND ($2::text IS NULL OR p.status = $2)
              AND ($3::text IS NULL OR p.name ILIKE $3)
            ORDER BY p.created_at DESC
            LIMIT $4 OFFSET $5
            "#,
        )
        .bind(Uuid::from(tenant_id))
        .bind(status)
        .bind(&pattern)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx("list_projects", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            let creator_id: Option<Uuid> = col(row, "creator_id")?;
            items.push(ProjectListRow {
                project: project_from_row(row)?,
                creator: creator_id.map(|id| {
                    Ok::<_, AppError>(UserSummary {
                        id: UserId::from_uuid(id),
                        full_name: col::<Option<String>>(row, "creator_name")?
                            .unwrap_or_default(),
                        email: col::<Option<String>>(row, "creator_email")?.unwrap_or_default(),
                    })
                })
                .transpose()?,
                task_count: col(row, "task_count")?,
                completed_task_count: col(row, "completed_task_count")?,
            });
        }
        Ok(Page {
            items,
            total: total as u64,
        })
    }

    async fn update_project(&self, id: ProjectId, patch: ProjectPatch) -> AppResult<Project> {
        let row = sqlx::query(
            r#"
            UPDATE projects SET
              name = COALESCE($2, name),
              description = COALESCE($3, description),
              status = COALESCE($4, status),
              updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(Uuid::from(id))
        .bind(patch.name)
        .bind(patch.description)
        .bind(patch.status.map(|s| s.as_str()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx("update_project", e))?;

        project_from_row(row.as_ref().ok_or(AppError::NotFound)?)
    }

    async fn delete_project(&self, id: ProjectId) -> AppResult<()> {
        // tasks.project_id is ON DELETE CASCADE.
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx("delete_project", e))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn create_task(&self, task: NewTask) -> AppResult<TaskRow> {
        let row = sqlx::query(
            r#"
            WITH inserted AS (
              INSERT INTO tasks
                (id, project_id, tenant_id, title, description, status, priority, assigned_to, due_date)
              VALUES ($1, $2, $3, $4, $5, 'todo', $6, $7, $8)
              RETURNING *
            )
            SELECT t.*, u.id AS assignee_id, u.full_name AS assignee_name, u.email AS assignee_email
            FROM inserted t
            LEFT JOIN users u ON t.assigned_to = u.id
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(Uuid::from(task.project_id))
        .bind(Uuid::from(task.tenant_id))
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.priority.as_str())
        .bind(task.assigned_to.map(Uuid::from))
        .bind(task.due_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx("create_task", e))?;

        Ok(TaskRow {
            task: task_from_row(&row)?,
            assignee: assignee_from_row(&row)?,
        })
    }

    async fn task_by_id(&self, id: TaskId) -> AppResult<Option<Task>> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = $1")
            .bind(Uuid::from(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx("task_by_id", e))?;
        row.as_ref().map(task_from_row).transpose()
    }

    async fn list_tasks(
        &self,
        project_id: ProjectId,
        tenant_id: TenantId,
        filter: &TaskFilter,
        page: PageRequest,
    ) -> AppResult<Page<TaskRow>> {
        let status = filter.status.map(|s| s.as_str());
        let priority = filter.priority.map(|p| p.as_str());
        let assigned = filter.assigned_to.map(Uuid::from);
        let pattern = like_pattern(&filter.search);

        let total: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM tasks t
            WHERE t.project_id = $1 AND t.tenant_id = $2
              AND ($3::text IS NULL OR t.status = $3)
              AND ($4::text IS NULL OR t.priority = $4)
              AND ($5::uuid IS NULL OR t.assigned_to = $5)
              AND ($6::text IS NULL OR t.title ILIKE $6)
            "#,
        )
        .bind(Uuid::from(project_id))
        .bind(Uuid::from(tenant_id))
        .bind(status)
        .bind(priority)
        .bind(assigned)
        .bind(&pattern)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_sqlx("list_tasks", e))?;

        let rows = sqlx::query(&format!(
            r#"
            SELECT t.*, u.id AS assignee_id, u.full_name AS assignee_name, u.email AS assignee_email
            FROM tasks t
            LEFT JOIN users u ON t.assigned_to = u.id
            WHERE t.project_id = $1 AND t.tenant_id = $2
              AND ($3::text IS NULL OR t.status = $3)
              AND ($4::text IS NULL OR t.priority = $4)
              AND ($5::uuid IS NULL OR t.assigned_to = $5)
              AND ($6::text IS NULL OR t.title ILIKE $6)
            ORDER BY {TASK_ORDER}
            LIMIT $7 OFFSET $8
            "#
        ))
        .bind(Uuid::from(project_id))
        .bind(Uuid::from(tenant_id))
        .bind(status)
        .bind(priority)
        .bind(assigned)
        .bind(&pattern)
        .bind(i64::from(page.limit))
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx("list_tasks", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(TaskRow {
                task: task_from_row(row)?,
                assignee: assignee_from_row(row)?,
            });
        }
        Ok(Page {
            items,
            total: total as u64,
        })
    }

    async fn update_task(&self, id: TaskId, patch: TaskPatch) -> AppResult<TaskRow> {
        // `assigned_to`/`due_date` are clearable, so COALESCE is not enough:
        // a boolean flag per field distinguishes "untouched" from "set null".
        let (touch_assignee, assignee) = match patch.assigned_to {
            Some(value) => (true, value.map(Uuid::from)),
            None => (false, None),
        };
        let (touch_due, due): (bool, Option<DateTime<Utc>>) = match patch.due_date {
            Some(value) => (true, value),
            None => (false, None),
        };

        let row = sqlx::query(
            r#"
            WITH updated AS (
              UPDATE tasks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                assigned_to = CASE WHEN $6 THEN $7 ELSE assigned_to END,
                due_date = CASE WHEN $8 THEN $9 ELSE due_date END,
                updated_at = NOW()
              WHERE id = $1
              RETURNING *
            )
            SELECT t.*, u.id AS assignee_id, u.full_name AS assignee_name, u.email AS assignee_email
            FROM updated t
            LEFT JOIN users u ON t.assigned_to = u.id
            "#,
        )
        .bind(Uuid::from(id))
        .bind(patch.title)
        .bind(patch.description)
        .bind(patch.status.map(|s| s.as_str()))
        .bind(patch.priority.map(|p| p.as_str()))
        .bind(touch_assignee)
        .bind(assignee)
        .bind(touch_due)
        .bind(due)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx("update_task", e))?;

        let row = row.ok_or(AppError::NotFound)?;
        Ok(TaskRow {
            task: task_from_row(&row)?,
            assignee: assignee_from_row(&row)?,
        })
    }

    async fn delete_task(&self, id: TaskId) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(Uuid::from(id))
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx("delete_task", e))?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn tasks_assigned_to(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        limit: u32,
    ) -> AppResult<Vec<MyTaskRow>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT t.*, p.name AS project_name,
              u.id AS assignee_id, u.full_name AS assignee_name, u.email AS assignee_email
            FROM tasks t
            JOIN projects p ON t.project_id = p.id
            LEFT JOIN users u ON t.assigned_to = u.id
            WHERE t.tenant_id = $1 AND t.assigned_to = $2
            ORDER BY {TASK_ORDER}
            LIMIT $3
            "#
        ))
        .bind(Uuid::from(tenant_id))
        .bind(Uuid::from(user_id))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx("tasks_assigned_to", e))?;

        let mut items = Vec::with_capacity(rows.len());
        for row in &rows {
            items.push(MyTaskRow {
                task: task_from_row(row)?,
                project_name: col(row, "project_name")?,
                assignee: assignee_from_row(row)?,
            });
        }
        Ok(items)
    }

    async fn append_audit(&self, record: AuditRecord) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (id, tenant_id, user_id, action, entity_type, entity_id, ip_address)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(record.tenant_id.map(Uuid::from))
        .bind(Uuid::from(record.user_id))
        .bind(&record.action)
        .bind(&record.entity_type)
        .bind(record.entity_id)
        .bind(&record.ip_address)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx("append_audit", e))?;
        Ok(())
    }
}
