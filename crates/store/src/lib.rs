//! `taskdeck-store` — the storage boundary.
//!
//! Exposes the [`Store`] trait consumed by the API layer, an in-memory
//! implementation for tests/dev, a Postgres implementation behind the
//! `postgres` feature, the tenant-scoped query helpers, and the best-effort
//! audit recorder.
//!
//! Quota enforcement lives *inside* the store: every `create_user` /
//! `create_project` checks the tenant ceiling in the same atomic unit as the
//! insert, so concurrent last-slot creations cannot both succeed.

pub mod audit;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod scope;
pub mod store;

pub use audit::AuditRecorder;
pub use memory::InMemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PgStore;
pub use store::{
    AuditRecord, NewProject, NewTask, NewUser, ProjectFilter, ProjectPatch, RegisterTenant, Store,
    TaskFilter, TaskPatch, TenantFilter, TenantPatch, UserFilter, UserPatch,
};
