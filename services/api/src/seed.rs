//! services/api/src/seed.rs
//!
//! Starter inventory loaded into an empty store at boot.

use dealership_core::domain::NewCar;
use dealership_core::ports::{InventoryStore, PortError, PortResult};
use tracing::info;

const STARTER_INVENTORY: &str = include_str!("../seed/cars.json");

pub fn starter_inventory() -> PortResult<Vec<NewCar>> {
    serde_json::from_str(STARTER_INVENTORY)
        .map_err(|e| PortError::Unexpected(format!("Malformed starter inventory: {e}")))
}

/// Inserts the starter inventory when the store holds no cars at all.
/// Returns the number of cars inserted.
pub async fn seed_inventory(store: &dyn InventoryStore) -> PortResult<usize> {
    if store.count_cars().await? > 0 {
        return Ok(0);
    }
    let cars = starter_inventory()?;
    let total = cars.len();
    for car in cars {
        store.insert_car(car, None).await?;
    }
    info!(cars = total, "Seeded starter inventory.");
    Ok(total)
}
