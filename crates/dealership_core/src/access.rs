//! crates/dealership_core/src/access.rs
//!
//! Role-based capability checks shared by every endpoint.

use crate::domain::{Role, Subject};
use crate::error::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// See full inventory records, including `sold` and bookkeeping.
    ViewPrivilegedCatalog,
    /// Create, update and delete cars.
    ManageInventory,
    ViewSales,
    ViewStaff,
    /// Delete staff accounts.
    ManageStaff,
    Purchase,
}

pub fn allows(role: Role, capability: Capability) -> bool {
    match role {
        Role::Admin => true,
        Role::Staff => capability != Capability::ManageStaff,
        Role::User => capability == Capability::Purchase,
    }
}

/// Fails with [`CoreError::Forbidden`] unless the subject's role grants `capability`.
pub fn require(subject: &Subject, capability: Capability) -> CoreResult<()> {
    if allows(subject.role, capability) {
        Ok(())
    } else {
        Err(CoreError::Forbidden)
    }
}
