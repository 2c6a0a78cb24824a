//! `taskdeck-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! strongly-typed identifiers, closed enumerations, the error taxonomy shared
//! by every layer, pagination, and the persisted entity shapes.

pub mod error;
pub mod id;
pub mod model;
pub mod page;
pub mod types;

pub use error::{AppError, AppResult};
pub use id::{ProjectId, TaskId, TenantId, UserId};
pub use model::{
    AuditLogEntry, MyTaskRow, Project, ProjectListRow, Task, TaskRow, Tenant, TenantListRow,
    TenantStats, User, UserSummary,
};
pub use page::{Page, PageInfo, PageRequest};
pub use types::{ProjectStatus, Role, SubscriptionPlan, TaskPriority, TaskStatus, TenantStatus};
