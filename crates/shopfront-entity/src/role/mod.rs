//! Role domain entities.

pub mod model;
pub mod name;

pub use model::{CreateRole, Role, RoleRef, RoleSet, UpdateRole};
pub use name::{BuiltinRole, RoleName};
