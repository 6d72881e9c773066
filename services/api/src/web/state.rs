//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use dealership_core::ports::{InventoryStore, PasswordDigest, SalesLedger, UserStore};
use dealership_core::SessionManager;
use std::sync::Arc;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub inventory: Arc<dyn InventoryStore>,
    pub users: Arc<dyn UserStore>,
    pub sales: Arc<dyn SalesLedger>,
    pub sessions: SessionManager,
    pub digest: Arc<dyn PasswordDigest>,
    pub config: Arc<Config>,
}
