//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, the concrete implementation of the
//! storage ports from the `core` crate. It handles all interactions with the
//! PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dealership_core::catalog::FieldPredicate;
use dealership_core::domain::{Car, NewCar, NewUser, Role, Sale, User};
use dealership_core::ports::{InventoryStore, PortError, PortResult, SalesLedger, UserStore};
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the storage ports.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

/// Maps unique-constraint violations to [`PortError::Conflict`].
fn classify(e: sqlx::Error) -> PortError {
    match &e {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            PortError::Conflict(db_err.constraint().unwrap_or("unique").to_string())
        }
        _ => unexpected(e),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const CAR_COLUMNS: &str = "id, brand, model, body_type, transmission, price, horse_power, \
     fuel_type, mileage, year, img_url, sold, created_at, updated_at, updated_by";

#[derive(FromRow)]
struct CarRecord {
    id: Uuid,
    brand: String,
    model: String,
    body_type: String,
    transmission: String,
    price: f64,
    horse_power: i32,
    fuel_type: String,
    mileage: i64,
    year: i32,
    img_url: String,
    sold: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    updated_by: Option<Uuid>,
}
impl CarRecord {
    fn into_domain(self) -> PortResult<Car> {
        let id = self.id;
        let corrupt = move |e: dealership_core::domain::UnknownVariant| {
            PortError::Unexpected(format!("car {} has {}", id, e))
        };
        Ok(Car {
            id,
            body_type: self.body_type.parse().map_err(corrupt)?,
            transmission: self.transmission.parse().map_err(corrupt)?,
            fuel_type: self.fuel_type.parse().map_err(corrupt)?,
            brand: self.brand,
            model: self.model,
            price: self.price,
            horse_power: self.horse_power,
            mileage: self.mileage,
            year: self.year,
            img_url: self.img_url,
            sold: self.sold,
            created_at: self.created_at,
            updated_at: self.updated_at,
            updated_by: self.updated_by,
        })
    }
}

fn cars_to_domain(records: Vec<CarRecord>) -> PortResult<Vec<Car>> {
    records.into_iter().map(CarRecord::into_domain).collect()
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at";

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn into_domain(self) -> PortResult<User> {
        let role: Role = self
            .role
            .parse()
            .map_err(|e| PortError::Unexpected(format!("user {} has {}", self.id, e)))?;
        Ok(User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role,
            created_at: self.created_at,
        })
    }
}

const SALE_COLUMNS: &str = "id, car_id, buyer_id, brand, model, year, price, sold_at";

#[derive(FromRow)]
struct SaleRecord {
    id: Uuid,
    car_id: Uuid,
    buyer_id: Uuid,
    brand: String,
    model: String,
    year: i32,
    price: f64,
    sold_at: DateTime<Utc>,
}
impl SaleRecord {
    fn into_domain(self) -> Sale {
        Sale {
            id: self.id,
            car_id: self.car_id,
            buyer_id: self.buyer_id,
            brand: self.brand,
            model: self.model,
            year: self.year,
            price: self.price,
            sold_at: self.sold_at,
        }
    }
}

//=========================================================================================
// `InventoryStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl InventoryStore for DbAdapter {
    async fn insert_car(&self, car: NewCar, actor: Option<Uuid>) -> PortResult<Car> {
        let sql = format!(
            "INSERT INTO cars (id, brand, model, body_type, transmission, price, horse_power, \
             fuel_type, mileage, year, img_url, updated_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) RETURNING {CAR_COLUMNS}"
        );
        let record = sqlx::query_as::<_, CarRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&car.brand)
            .bind(&car.model)
            .bind(car.body_type.as_str())
            .bind(car.transmission.as_str())
            .bind(car.price)
            .bind(car.horse_power)
            .bind(car.fuel_type.as_str())
            .bind(car.mileage)
            .bind(car.year)
            .bind(&car.img_url)
            .bind(actor)
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)?;
        record.into_domain()
    }

    async fn find_car(&self, car_id: Uuid) -> PortResult<Option<Car>> {
        let sql = format!("SELECT {CAR_COLUMNS} FROM cars WHERE id = $1");
        sqlx::query_as::<_, CarRecord>(&sql)
            .bind(car_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(CarRecord::into_domain)
            .transpose()
    }

    async fn find_unsold(&self, predicate: Option<&FieldPredicate>) -> PortResult<Vec<Car>> {
        let mut qb: QueryBuilder<Postgres> =
            QueryBuilder::new(format!("SELECT {CAR_COLUMNS} FROM cars WHERE sold = FALSE"));

        match predicate {
            None => {}
            Some(FieldPredicate::Brand(needle)) => {
                qb.push(" AND POSITION(").push_bind(needle.clone()).push(" IN LOWER(brand)) > 0");
            }
            Some(FieldPredicate::Model(needle)) => {
                qb.push(" AND POSITION(").push_bind(needle.clone()).push(" IN LOWER(model)) > 0");
            }
            Some(FieldPredicate::BodyType(Some(body))) => {
                qb.push(" AND body_type = ").push_bind(body.as_str());
            }
            Some(FieldPredicate::Transmission(Some(transmission))) => {
                qb.push(" AND transmission = ").push_bind(transmission.as_str());
            }
            Some(FieldPredicate::FuelType(Some(fuel))) => {
                qb.push(" AND fuel_type = ").push_bind(fuel.as_str());
            }
            Some(FieldPredicate::Price(Some(limit))) => {
                qb.push(" AND price <= ").push_bind(*limit);
            }
            Some(FieldPredicate::Mileage(Some(limit))) => {
                qb.push(" AND mileage::float8 <= ").push_bind(*limit);
            }
            Some(FieldPredicate::Year(Some(limit))) => {
                qb.push(" AND year <= ").push_bind(*limit);
            }
            // Out-of-domain value: nothing can match.
            Some(_) => return Ok(Vec::new()),
        }
        qb.push(" ORDER BY created_at ASC");

        let records = qb
            .build_query_as::<CarRecord>()
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        cars_to_domain(records)
    }

    async fn update_car(&self, car: &Car) -> PortResult<bool> {
        let result = sqlx::query(
            "UPDATE cars SET brand = $2, model = $3, body_type = $4, transmission = $5, \
             price = $6, horse_power = $7, fuel_type = $8, mileage = $9, year = $10, \
             img_url = $11, sold = $12, updated_at = $13, updated_by = $14 WHERE id = $1",
        )
        .bind(car.id)
        .bind(&car.brand)
        .bind(&car.model)
        .bind(car.body_type.as_str())
        .bind(car.transmission.as_str())
        .bind(car.price)
        .bind(car.horse_power)
        .bind(car.fuel_type.as_str())
        .bind(car.mileage)
        .bind(car.year)
        .bind(&car.img_url)
        .bind(car.sold)
        .bind(car.updated_at)
        .bind(car.updated_by)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_car(&self, car_id: Uuid) -> PortResult<bool> {
        let result = sqlx::query("DELETE FROM cars WHERE id = $1")
            .bind(car_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_unsold(&self) -> PortResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM cars WHERE sold = FALSE")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }

    async fn count_cars(&self) -> PortResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM cars")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }
}

//=========================================================================================
// `UserStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl UserStore for DbAdapter {
    async fn insert_user(&self, user: NewUser) -> PortResult<User> {
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        );
        let record = sqlx::query_as::<_, UserRecord>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .fetch_one(&self.pool)
            .await
            .map_err(classify)?;
        record.into_domain()
    }

    async fn find_user(&self, user_id: Uuid) -> PortResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(UserRecord::into_domain)
            .transpose()
    }

    async fn find_user_by_email(&self, email: &str) -> PortResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(UserRecord::into_domain)
            .transpose()
    }

    async fn find_admin(&self) -> PortResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE role = 'admin' LIMIT 1");
        sqlx::query_as::<_, UserRecord>(&sql)
            .fetch_optional(&self.pool)
            .await
            .map_err(unexpected)?
            .map(UserRecord::into_domain)
            .transpose()
    }

    async fn list_staff(&self) -> PortResult<Vec<User>> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE role IN ('admin', 'staff') ORDER BY created_at ASC"
        );
        let records = sqlx::query_as::<_, UserRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        records.into_iter().map(UserRecord::into_domain).collect()
    }

    async fn update_user(&self, user: &User) -> PortResult<bool> {
        let result = sqlx::query(
            "UPDATE users SET name = $2, email = $3, password_hash = $4, role = $5 WHERE id = $1",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .execute(&self.pool)
        .await
        .map_err(classify)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_user(&self, user_id: Uuid, role: Option<Role>) -> PortResult<bool> {
        let result = sqlx::query(
            "DELETE FROM users WHERE id = $1 AND ($2::text IS NULL OR role = $2)",
        )
        .bind(user_id)
        .bind(role.map(Role::as_str))
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_users(&self) -> PortResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(unexpected)
    }
}

//=========================================================================================
// `SalesLedger` Trait Implementation
//=========================================================================================

#[async_trait]
impl SalesLedger for DbAdapter {
    async fn record_sale(&self, car_id: Uuid, buyer_id: Uuid) -> PortResult<Option<Sale>> {
        let mut tx = self.pool.begin().await.map_err(unexpected)?;

        // The `sold = FALSE` guard makes a second purchase of the same car a no-op.
        let sql = format!(
            "UPDATE cars SET sold = TRUE, updated_at = NOW(), updated_by = $2 \
             WHERE id = $1 AND sold = FALSE RETURNING {CAR_COLUMNS}"
        );
        let Some(record) = sqlx::query_as::<_, CarRecord>(&sql)
            .bind(car_id)
            .bind(buyer_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(unexpected)?
        else {
            tx.rollback().await.map_err(unexpected)?;
            return Ok(None);
        };
        let car = record.into_domain()?;
        let sale = Sale::for_car(&car, buyer_id, car.updated_at);

        let sql = format!(
            "INSERT INTO sales ({SALE_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {SALE_COLUMNS}"
        );
        let stored = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(sale.id)
            .bind(sale.car_id)
            .bind(sale.buyer_id)
            .bind(&sale.brand)
            .bind(&sale.model)
            .bind(sale.year)
            .bind(sale.price)
            .bind(sale.sold_at)
            .fetch_one(&mut *tx)
            .await
            .map_err(unexpected)?;

        tx.commit().await.map_err(unexpected)?;
        Ok(Some(stored.into_domain()))
    }

    async fn sales_for_buyer(&self, buyer_id: Uuid) -> PortResult<Vec<Sale>> {
        let sql =
            format!("SELECT {SALE_COLUMNS} FROM sales WHERE buyer_id = $1 ORDER BY sold_at ASC");
        let records = sqlx::query_as::<_, SaleRecord>(&sql)
            .bind(buyer_id)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.into_domain()).collect())
    }

    async fn all_sales(&self) -> PortResult<Vec<Sale>> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales ORDER BY sold_at ASC");
        let records = sqlx::query_as::<_, SaleRecord>(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.into_domain()).collect())
    }
}

#[cfg(test)]
mod tests {
    const INIT_MIGRATION: &str = include_str!("../../migrations/0001_init.sql");

    fn sales_table() -> &'static str {
        let start = INIT_MIGRATION
            .find("CREATE TABLE IF NOT EXISTS sales")
            .expect("sales table should be declared");
        let rest = &INIT_MIGRATION[start..];
        &rest[..rest.find(");").expect("sales table should be closed")]
    }

    #[test]
    fn a_restocked_car_can_appear_in_the_ledger_again() {
        // Resales reuse car_id; only the `sold = FALSE` guard in `record_sale` applies.
        let sales = sales_table().to_uppercase();
        assert!(!sales.contains("UNIQUE"), "sales table must not be unique per car: {sales}");
    }

    #[test]
    fn emails_stay_unique() {
        assert!(INIT_MIGRATION.contains("CONSTRAINT unique_email_index UNIQUE (email)"));
    }
}
