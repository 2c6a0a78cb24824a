use axum::{
    Router,
    routing::{get, patch, post, put},
};

pub mod auth;
pub mod projects;
pub mod system;
pub mod tasks;
pub mod tenants;
pub mod users;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/api/auth/me", get(auth::me))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/tenants", get(tenants::list_tenants))
        .route(
            "/api/tenants/:tenantId",
            get(tenants::get_tenant).put(tenants::update_tenant),
        )
        .route(
            "/api/tenants/:tenantId/users",
            post(users::add_user).get(users::list_users),
        )
        .route(
            "/api/users/:userId",
            put(users::update_user).delete(users::delete_user),
        )
        .route(
            "/api/projects",
            post(projects::create_project).get(projects::list_projects),
        )
        .route(
            "/api/projects/:projectId",
            get(projects::get_project)
                .put(projects::update_project)
                .delete(projects::delete_project),
        )
        .route(
            "/api/projects/:projectId/tasks",
            post(tasks::create_task).get(tasks::list_tasks),
        )
        .route("/api/tasks/my", get(tasks::my_tasks))
        .route(
            "/api/tasks/:taskId",
            put(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/api/tasks/:taskId/status", patch(tasks::update_task_status))
}
