//! Role-based authorization policy.
//!
//! A single stateless function decides whether a role may perform an action.
//! The HTTP layer consults it; the engine itself never checks roles.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Roles a caller can hold. The role is established by upstream identity
/// infrastructure and handed to us as a plain value.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Role {
  GlobalAdmin,
  TenantAdmin,
  Director,
  Accountant,
  Instructor,
  Student,
}

impl Role {
  /// Roles that may back an employee record.
  pub const EMPLOYEE_ROLES: [Role; 3] =
    [Role::TenantAdmin, Role::Accountant, Role::Instructor];

  pub fn is_employee_role(self) -> bool { Self::EMPLOYEE_ROLES.contains(&self) }
}

/// Things a caller may try to do through the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Action {
  ReadCatalog,
  WriteCatalog,
  ManageStaff,
  ManageStudents,
  AssignInstructors,
  ManageEnrollments,
}

/// Decide whether `role` may perform `action`.
pub fn authorize(role: Role, action: Action) -> bool {
  use Action::*;
  use Role::*;

  match (role, action) {
    (GlobalAdmin, _) => true,
    (_, ReadCatalog) => true,
    (TenantAdmin | Director | Instructor, WriteCatalog | AssignInstructors) => true,
    (TenantAdmin | Director, ManageStaff) => true,
    (TenantAdmin | Director | Accountant, ManageStudents | ManageEnrollments) => true,
    _ => false,
  }
}
