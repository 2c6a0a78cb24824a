//! Closed enumerations for roles and lifecycle states.
//!
//! Every "is this string one of..." check lives here once, as a typed enum.
//! Call sites never re-derive role or status semantics from raw strings.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

macro_rules! impl_enum_str {
    ($t:ty, $name:literal, { $($variant:path => $s:literal),+ $(,)? }) => {
        impl $t {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($variant => $s,)+
                }
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $t {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok($variant),)+
                    other => Err(AppError::validation(format!(
                        "invalid {}: '{}'", $name, other
                    ))),
                }
            }
        }
    };
}

/// Actor role. `SuperAdmin` is a tenant-less global identity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    SuperAdmin,
    TenantAdmin,
    User,
}

impl_enum_str!(Role, "role", {
    Role::SuperAdmin => "super_admin",
    Role::TenantAdmin => "tenant_admin",
    Role::User => "user",
});

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TenantStatus {
    #[default]
    Active,
    Suspended,
    Cancelled,
}

impl_enum_str!(TenantStatus, "tenant status", {
    TenantStatus::Active => "active",
    TenantStatus::Suspended => "suspended",
    TenantStatus::Cancelled => "cancelled",
});

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    Starter,
    Pro,
}

impl_enum_str!(SubscriptionPlan, "subscription plan", {
    SubscriptionPlan::Free => "free",
    SubscriptionPlan::Starter => "starter",
    SubscriptionPlan::Pro => "pro",
});

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    #[default]
    Active,
    Archived,
    Completed,
}

impl_enum_str!(ProjectStatus, "project status", {
    ProjectStatus::Active => "active",
    ProjectStatus::Archived => "archived",
    ProjectStatus::Completed => "completed",
});

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Completed,
}

impl_enum_str!(TaskStatus, "task status", {
    TaskStatus::Todo => "todo",
    TaskStatus::InProgress => "in_progress",
    TaskStatus::Completed => "completed",
});

/// Ordered so that `Low < Medium < High` (task lists sort priority-first).
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl_enum_str!(TaskPriority, "task priority", {
    TaskPriority::Low => "low",
    TaskPriority::Medium => "medium",
    TaskPriority::High => "high",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::SuperAdmin, Role::TenantAdmin, Role::User] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn unknown_role_is_a_validation_error() {
        let err = "owner".parse::<Role>().unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn priority_ordering_puts_high_first_when_sorted_desc() {
        let mut priorities = vec![TaskPriority::Medium, TaskPriority::High, TaskPriority::Low];
        priorities.sort_by(|a, b| b.cmp(a));
        assert_eq!(
            priorities,
            vec![TaskPriority::High, TaskPriority::Medium, TaskPriority::Low]
        );
    }

    #[test]
    fn serde_uses_snake_case_wire_names() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
        assert_eq!(
            serde_json::from_str::<Role>("\"tenant_admin\"").unwrap(),
            Role::TenantAdmin
        );
    }
}
