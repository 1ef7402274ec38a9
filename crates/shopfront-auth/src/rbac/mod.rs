//! Role-based access control: capability policies, the enforcement gate,
//! and the role & permission authority.

pub mod authority;
pub mod enforcer;
pub mod policies;
pub mod principal;

pub use authority::RoleAuthority;
pub use enforcer::RbacEnforcer;
pub use policies::{Capability, RbacPolicies};
pub use principal::Principal;
