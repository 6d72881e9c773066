//! services/api/src/lib.rs
//!
//! The dealership HTTP service: adapters for the core ports, configuration,
//! input validation and the axum web layer.

pub mod adapters;
pub mod config;
pub mod error;
pub mod seed;
pub mod validation;
pub mod web;

use std::sync::Arc;

use dealership_core::ports::{InventoryStore, SalesLedger, UserStore};
use dealership_core::SessionManager;

use crate::adapters::{Argon2Digest, DbAdapter, JwtTokenService, MemorySessionCache, MemoryStore};
use crate::config::Config;
use crate::web::state::AppState;

/// The three storage ports, all backed by one adapter.
#[derive(Clone)]
pub struct Stores {
    pub inventory: Arc<dyn InventoryStore>,
    pub users: Arc<dyn UserStore>,
    pub sales: Arc<dyn SalesLedger>,
}

impl Stores {
    pub fn memory() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            inventory: store.clone(),
            users: store.clone(),
            sales: store,
        }
    }

    pub fn postgres(adapter: DbAdapter) -> Self {
        let adapter = Arc::new(adapter);
        Self {
            inventory: adapter.clone(),
            users: adapter.clone(),
            sales: adapter,
        }
    }
}

/// Wires the stores, the session cache and the token and password services
/// into the shared handler state.
pub fn build_state(
    config: Arc<Config>,
    stores: Stores,
    session_cache: MemorySessionCache,
) -> Arc<AppState> {
    let tokens = Arc::new(JwtTokenService::new(&config.jwt_secret, config.jwt_expiry));
    Arc::new(AppState {
        inventory: stores.inventory,
        users: stores.users,
        sales: stores.sales,
        sessions: SessionManager::new(tokens, Arc::new(session_cache)),
        digest: Arc::new(Argon2Digest),
        config,
    })
}
