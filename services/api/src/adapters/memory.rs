//! services/api/src/adapters/memory.rs
//!
//! An in-process store implementing the storage ports. Used when no
//! `DATABASE_URL` is configured, and by the HTTP integration tests.

use async_trait::async_trait;
use chrono::Utc;
use dealership_core::catalog::FieldPredicate;
use dealership_core::domain::{Car, NewCar, NewUser, Role, Sale, User};
use dealership_core::ports::{InventoryStore, PortError, PortResult, SalesLedger, UserStore};
use tokio::sync::RwLock;
use uuid::Uuid;

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    /// Insertion order, which is also creation order.
    cars: Vec<Car>,
    sales: Vec<Sale>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

//=========================================================================================
// `InventoryStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl InventoryStore for MemoryStore {
    async fn insert_car(&self, car: NewCar, actor: Option<Uuid>) -> PortResult<Car> {
        let car = car.into_car(Uuid::new_v4(), Utc::now(), actor);
        self.tables.write().await.cars.push(car.clone());
        Ok(car)
    }

    async fn find_car(&self, car_id: Uuid) -> PortResult<Option<Car>> {
        let tables = self.tables.read().await;
        Ok(tables.cars.iter().find(|car| car.id == car_id).cloned())
    }

    async fn find_unsold(&self, predicate: Option<&FieldPredicate>) -> PortResult<Vec<Car>> {
        let tables = self.tables.read().await;
        Ok(tables
            .cars
            .iter()
            .filter(|car| !car.sold && predicate.map_or(true, |p| p.matches(car)))
            .cloned()
            .collect())
    }

    async fn update_car(&self, car: &Car) -> PortResult<bool> {
        let mut tables = self.tables.write().await;
        match tables.cars.iter_mut().find(|stored| stored.id == car.id) {
            Some(stored) => {
                *stored = car.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_car(&self, car_id: Uuid) -> PortResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.cars.len();
        tables.cars.retain(|car| car.id != car_id);
        Ok(tables.cars.len() != before)
    }

    async fn count_unsold(&self) -> PortResult<i64> {
        let tables = self.tables.read().await;
        Ok(count(tables.cars.iter().filter(|car| !car.sold).count()))
    }

    async fn count_cars(&self) -> PortResult<i64> {
        Ok(count(self.tables.read().await.cars.len()))
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> PortResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(PortError::Conflict(format!(
                "email '{}' is already registered",
                user.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, user_id: Uuid) -> PortResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_admin(&self) -> PortResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.role == Role::Admin).cloned())
    }

    async fn list_staff(&self) -> PortResult<Vec<User>> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .filter(|u| matches!(u.role, Role::Staff | Role::Admin))
            .cloned()
            .collect())
    }

    async fn update_user(&self, user: &User) -> PortResult<bool> {
        let mut tables = self.tables.write().await;
        if tables
            .users
            .iter()
            .any(|u| u.id != user.id && u.email == user.email)
        {
            return Err(PortError::Conflict(format!(
                "email '{}' is already registered",
                user.email
            )));
        }
        match tables.users.iter_mut().find(|u| u.id == user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_user(&self, user_id: Uuid, role: Option<Role>) -> PortResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables
            .users
            .retain(|u| !(u.id == user_id && role.map_or(true, |r| u.role == r)));
        Ok(tables.users.len() != before)
    }

    async fn count_users(&self) -> PortResult<i64> {
        Ok(count(self.tables.read().await.users.len()))
    }
}

//=========================================================================================
// `SalesLedger` Trait Implementation
//=========================================================================================

#[async_trait]
impl SalesLedger for MemoryStore {
    async fn record_sale(&self, car_id: Uuid, buyer_id: Uuid) -> PortResult<Option<Sale>> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let Some(car) = tables
            .cars
            .iter_mut()
            .find(|car| car.id == car_id && !car.sold)
        else {
            return Ok(None);
        };
        car.sold = true;
        car.updated_at = now;
        car.updated_by = Some(buyer_id);
        let sale = Sale::for_car(car, buyer_id, now);
        tables.sales.push(sale.clone());
        Ok(Some(sale))
    }

    async fn sales_for_buyer(&self, buyer_id: Uuid) -> PortResult<Vec<Sale>> {
        let tables = self.tables.read().await;
        Ok(tables
            .sales
            .iter()
            .filter(|sale| sale.buyer_id == buyer_id)
            .cloned()
            .collect())
    }

    async fn all_sales(&self) -> PortResult<Vec<Sale>> {
        Ok(self.tables.read().await.sales.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealership_core::domain::{BodyType, FuelType, Transmission};

    fn new_car(brand: &str) -> NewCar {
        NewCar {
            brand: brand.to_string(),
            model: "Model".to_string(),
            body_type: BodyType::Suv,
            transmission: Transmission::Manual,
            price: 15_000.0,
            horse_power: 150,
            fuel_type: FuelType::Hybrid,
            mileage: 5_000,
            year: 2021,
            img_url: "https://img.example/car.png".to_string(),
        }
    }

    #[tokio::test]
    async fn a_car_can_only_be_sold_once() {
        let store = MemoryStore::new();
        let car = store.insert_car(new_car("Toyota"), None).await.unwrap();
        let buyer = Uuid::new_v4();

        let sale = store.record_sale(car.id, buyer).await.unwrap();
        assert_eq!(sale.map(|s| s.car_id), Some(car.id));
        assert!(store.record_sale(car.id, buyer).await.unwrap().is_none());

        assert_eq!(store.count_unsold().await.unwrap(), 0);
        assert_eq!(store.count_cars().await.unwrap(), 1);
        assert!(store.find_unsold(None).await.unwrap().is_empty());
        assert_eq!(store.sales_for_buyer(buyer).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_emails_conflict() {
        let store = MemoryStore::new();
        let user = NewUser {
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            password_hash: "x".to_string(),
            role: Role::User,
        };
        store.insert_user(user.clone()).await.unwrap();
        assert!(matches!(
            store.insert_user(user).await,
            Err(PortError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn delete_user_respects_role_guard() {
        let store = MemoryStore::new();
        let user = store
            .insert_user(NewUser {
                name: "Sam".to_string(),
                email: "sam@example.com".to_string(),
                password_hash: "x".to_string(),
                role: Role::User,
            })
            .await
            .unwrap();

        assert!(!store.delete_user(user.id, Some(Role::Staff)).await.unwrap());
        assert!(store.delete_user(user.id, None).await.unwrap());
        assert_eq!(store.count_users().await.unwrap(), 0);
    }
}
