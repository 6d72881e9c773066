//! crates/dealership_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete store, session cache and token format.

use async_trait::async_trait;
use uuid::Uuid;

use crate::catalog::FieldPredicate;
use crate::domain::{Car, NewCar, NewUser, Role, Sale, Subject, User};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, crypto).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Conflicting record: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Storage Ports
//=========================================================================================

#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn insert_car(&self, car: NewCar, actor: Option<Uuid>) -> PortResult<Car>;

    async fn find_car(&self, car_id: Uuid) -> PortResult<Option<Car>>;

    /// Unsold records matching `predicate`, oldest first. `None` returns every unsold record.
    async fn find_unsold(&self, predicate: Option<&FieldPredicate>) -> PortResult<Vec<Car>>;

    /// Persists every field of `car`. Returns `false` when no record has that id.
    async fn update_car(&self, car: &Car) -> PortResult<bool>;

    async fn delete_car(&self, car_id: Uuid) -> PortResult<bool>;

    async fn count_unsold(&self) -> PortResult<i64>;

    async fn count_cars(&self) -> PortResult<i64>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with [`PortError::Conflict`] when the email is taken.
    async fn insert_user(&self, user: NewUser) -> PortResult<User>;

    async fn find_user(&self, user_id: Uuid) -> PortResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>>;

    async fn find_admin(&self) -> PortResult<Option<User>>;

    /// Every account with the staff or admin role.
    async fn list_staff(&self) -> PortResult<Vec<User>>;

    async fn update_user(&self, user: &User) -> PortResult<bool>;

    /// Deletes the account, optionally only if it currently has `role`.
    async fn delete_user(&self, user_id: Uuid, role: Option<Role>) -> PortResult<bool>;

    async fn count_users(&self) -> PortResult<i64>;
}

#[async_trait]
pub trait SalesLedger: Send + Sync {
    /// Atomically flips the car to sold and records the sale.
    /// Returns `None` when the car is missing or already sold.
    async fn record_sale(&self, car_id: Uuid, buyer_id: Uuid) -> PortResult<Option<Sale>>;

    async fn sales_for_buyer(&self, buyer_id: Uuid) -> PortResult<Vec<Sale>>;

    async fn all_sales(&self) -> PortResult<Vec<Sale>>;
}

//=========================================================================================
// Session Ports
//=========================================================================================

/// Key/value store holding the active token for each account.
#[async_trait]
pub trait SessionCache: Send + Sync {
    /// Stores `value` under `key`, replacing any previous entry.
    /// Returns `false` if the write could not be made.
    async fn set(&self, key: &str, value: String) -> bool;

    async fn get(&self, key: &str) -> Option<String>;

    async fn has(&self, key: &str) -> bool;

    /// Returns the number of entries removed.
    async fn delete(&self, key: &str) -> usize;
}

/// Signs and verifies session tokens.
pub trait TokenService: Send + Sync {
    fn sign(&self, subject: &Subject) -> PortResult<String>;

    /// Checks signature and expiry and returns the embedded subject.
    fn verify(&self, token: &str) -> PortResult<Subject>;
}

/// A one-way password digest.
pub trait PasswordDigest: Send + Sync {
    fn digest(&self, password: &str) -> PortResult<String>;

    fn verify(&self, password: &str, digest: &str) -> PortResult<bool>;
}
