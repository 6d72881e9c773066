//! crates/dealership_core/src/domain.rs
//!
//! Defines the core data structures for the dealership: accounts, inventory
//! records and the sales ledger. These structs are independent of any database.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Accounts
//=========================================================================================

/// The role attached to every account and carried inside session tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Staff,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Staff => "staff",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Role::User),
            "staff" => Ok(Role::Staff),
            "admin" => Ok(Role::Admin),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A stored account, including its password digest.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Everything needed to insert an account. The password is already digested.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// The account shape returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            role: user.role,
        }
    }
}

/// The authenticated owner of a session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subject {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

impl From<&User> for Subject {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
        }
    }
}

//=========================================================================================
// Inventory
//=========================================================================================

/// Error returned when a categorical value is outside its enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown value '{0}'")]
pub struct UnknownVariant(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum BodyType {
    #[serde(rename = "SUV")]
    Suv,
    Hatchback,
    Saloon,
    Coupe,
    Convertible,
    Van,
    #[serde(rename = "Pick-up")]
    PickUp,
    #[serde(rename = "Chassis Cab")]
    ChassisCab,
}

impl BodyType {
    pub const ALL: [BodyType; 8] = [
        BodyType::Suv,
        BodyType::Hatchback,
        BodyType::Saloon,
        BodyType::Coupe,
        BodyType::Convertible,
        BodyType::Van,
        BodyType::PickUp,
        BodyType::ChassisCab,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            BodyType::Suv => "SUV",
            BodyType::Hatchback => "Hatchback",
            BodyType::Saloon => "Saloon",
            BodyType::Coupe => "Coupe",
            BodyType::Convertible => "Convertible",
            BodyType::Van => "Van",
            BodyType::PickUp => "Pick-up",
            BodyType::ChassisCab => "Chassis Cab",
        }
    }

    /// Case-insensitive lookup, used by catalog search.
    pub fn parse_ignore_case(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|body| body.as_str().eq_ignore_ascii_case(value))
    }
}

impl FromStr for BodyType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|body| body.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Transmission {
    Manual,
    Automatic,
}

impl Transmission {
    pub fn as_str(self) -> &'static str {
        match self {
            Transmission::Manual => "manual",
            Transmission::Automatic => "automatic",
        }
    }
}

impl FromStr for Transmission {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "manual" => Ok(Transmission::Manual),
            "automatic" => Ok(Transmission::Automatic),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum FuelType {
    Petrol,
    Diesel,
    Electric,
    Hybrid,
}

impl FuelType {
    pub fn as_str(self) -> &'static str {
        match self {
            FuelType::Petrol => "petrol",
            FuelType::Diesel => "diesel",
            FuelType::Electric => "electric",
            FuelType::Hybrid => "hybrid",
        }
    }
}

impl FromStr for FuelType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "petrol" => Ok(FuelType::Petrol),
            "diesel" => Ok(FuelType::Diesel),
            "electric" => Ok(FuelType::Electric),
            "hybrid" => Ok(FuelType::Hybrid),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

/// A full inventory record. This is the privileged shape shown to staff and admins.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Car {
    pub id: Uuid,
    pub brand: String,
    pub model: String,
    pub body_type: BodyType,
    pub transmission: Transmission,
    pub price: f64,
    pub horse_power: i32,
    pub fuel_type: FuelType,
    pub mileage: i64,
    pub year: i32,
    pub img_url: String,
    pub sold: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<Uuid>,
}

/// The redacted shape shown to anonymous callers and plain users.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct PublicCar {
    pub id: String,
    pub brand: String,
    pub model: String,
    pub body_type: BodyType,
    pub transmission: Transmission,
    pub price: f64,
    pub horse_power: i32,
    pub fuel_type: FuelType,
    pub mileage: i64,
    pub year: i32,
    pub img_url: String,
}

impl From<&Car> for PublicCar {
    fn from(car: &Car) -> Self {
        Self {
            id: car.id.to_string(),
            brand: car.brand.clone(),
            model: car.model.clone(),
            body_type: car.body_type,
            transmission: car.transmission,
            price: car.price,
            horse_power: car.horse_power,
            fuel_type: car.fuel_type,
            mileage: car.mileage,
            year: car.year,
            img_url: car.img_url.clone(),
        }
    }
}

/// A validated car ready to be added to the inventory.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct NewCar {
    pub brand: String,
    pub model: String,
    pub body_type: BodyType,
    pub transmission: Transmission,
    pub price: f64,
    pub horse_power: i32,
    pub fuel_type: FuelType,
    pub mileage: i64,
    pub year: i32,
    pub img_url: String,
}

impl NewCar {
    /// Builds the stored record: unsold, stamped with `now` and the acting account.
    pub fn into_car(self, id: Uuid, now: DateTime<Utc>, actor: Option<Uuid>) -> Car {
        Car {
            id,
            brand: self.brand,
            model: self.model,
            body_type: self.body_type,
            transmission: self.transmission,
            price: self.price,
            horse_power: self.horse_power,
            fuel_type: self.fuel_type,
            mileage: self.mileage,
            year: self.year,
            img_url: self.img_url,
            sold: false,
            created_at: now,
            updated_at: now,
            updated_by: actor,
        }
    }
}

/// A validated partial update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CarUpdate {
    pub brand: Option<String>,
    pub model: Option<String>,
    pub body_type: Option<BodyType>,
    pub transmission: Option<Transmission>,
    pub price: Option<f64>,
    pub horse_power: Option<i32>,
    pub fuel_type: Option<FuelType>,
    pub mileage: Option<i64>,
    pub year: Option<i32>,
    pub img_url: Option<String>,
    pub sold: Option<bool>,
}

fn replace<T: PartialEq>(slot: &mut T, value: Option<T>) -> bool {
    match value {
        Some(value) if *slot != value => {
            *slot = value;
            true
        }
        _ => false,
    }
}

impl Car {
    /// Applies `update` in place and reports whether any field actually changed.
    /// Bookkeeping fields are only touched when something changed.
    pub fn apply(&mut self, update: CarUpdate, actor: Uuid, now: DateTime<Utc>) -> bool {
        let mut changed = false;
        changed |= replace(&mut self.brand, update.brand);
        changed |= replace(&mut self.model, update.model);
        changed |= replace(&mut self.body_type, update.body_type);
        changed |= replace(&mut self.transmission, update.transmission);
        changed |= replace(&mut self.price, update.price);
        changed |= replace(&mut self.horse_power, update.horse_power);
        changed |= replace(&mut self.fuel_type, update.fuel_type);
        changed |= replace(&mut self.mileage, update.mileage);
        changed |= replace(&mut self.year, update.year);
        changed |= replace(&mut self.img_url, update.img_url);
        changed |= replace(&mut self.sold, update.sold);
        if changed {
            self.updated_at = now;
            self.updated_by = Some(actor);
        }
        changed
    }
}

//=========================================================================================
// Sales ledger
//=========================================================================================

/// A recorded purchase. Car details are copied at the time of sale.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Sale {
    pub id: Uuid,
    pub car_id: Uuid,
    pub buyer_id: Uuid,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: f64,
    pub sold_at: DateTime<Utc>,
}

impl Sale {
    pub fn for_car(car: &Car, buyer_id: Uuid, sold_at: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            car_id: car.id,
            buyer_id,
            brand: car.brand.clone(),
            model: car.model.clone(),
            year: car.year,
            price: car.price,
            sold_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_type_lookup_respects_case_mode() {
        assert_eq!("Pick-up".parse::<BodyType>(), Ok(BodyType::PickUp));
        assert!("suv".parse::<BodyType>().is_err());
        assert_eq!(BodyType::parse_ignore_case("suv"), Some(BodyType::Suv));
        assert_eq!(
            BodyType::parse_ignore_case("chassis cab"),
            Some(BodyType::ChassisCab)
        );
        assert_eq!(BodyType::parse_ignore_case("Minivan"), None);
    }

    #[test]
    fn public_car_drops_bookkeeping_fields() {
        let now = Utc::now();
        let car = NewCar {
            brand: "Benz".into(),
            model: "C200".into(),
            body_type: BodyType::Saloon,
            transmission: Transmission::Automatic,
            price: 30_000.0,
            horse_power: 200,
            fuel_type: FuelType::Petrol,
            mileage: 12_000,
            year: 2020,
            img_url: "https://img.example/benz.png".into(),
        }
        .into_car(Uuid::new_v4(), now, None);

        let json = serde_json::to_value(PublicCar::from(&car)).unwrap();
        assert_eq!(json["id"], car.id.to_string());
        assert_eq!(json["bodyType"], "Saloon");
        assert!(json.get("sold").is_none());
        assert!(json.get("createdAt").is_none());
        assert!(json.get("updatedBy").is_none());

        let full = serde_json::to_value(&car).unwrap();
        assert_eq!(full["sold"], false);
    }

    #[test]
    fn apply_reports_changes_only_when_values_differ() {
        let now = Utc::now();
        let actor = Uuid::new_v4();
        let mut car = NewCar {
            brand: "Ford".into(),
            model: "Focus".into(),
            body_type: BodyType::Hatchback,
            transmission: Transmission::Manual,
            price: 9_000.0,
            horse_power: 120,
            fuel_type: FuelType::Diesel,
            mileage: 80_000,
            year: 2015,
            img_url: "https://img.example/focus.png".into(),
        }
        .into_car(Uuid::new_v4(), now, None);

        let same = CarUpdate {
            brand: Some("Ford".into()),
            ..CarUpdate::default()
        };
        assert!(!car.apply(same, actor, now));
        assert_eq!(car.updated_by, None);

        let cheaper = CarUpdate {
            price: Some(8_500.0),
            ..CarUpdate::default()
        };
        assert!(car.apply(cheaper, actor, now));
        assert_eq!(car.price, 8_500.0);
        assert_eq!(car.updated_by, Some(actor));
    }
}
