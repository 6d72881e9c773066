//! services/api/src/validation.rs
//!
//! Input-shape checks for request bodies. Each function takes the raw JSON
//! body and either returns typed input or a `CoreError::Validation` carrying
//! the message shown to the client.

use std::str::FromStr;
use std::sync::LazyLock;

use dealership_core::catalog::{current_year, FIRST_CAR_YEAR};
use dealership_core::domain::{BodyType, CarUpdate, FuelType, NewCar, Transmission};
use dealership_core::{CoreError, CoreResult};
use regex::Regex;
use serde_json::Value;

pub const MIN_PASSWORD_LEN: usize = 6;

static EMAIL_PATTERN: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$"));

const INVALID_EMAIL: &str = "Invalid email format.";
const SHORT_PASSWORD: &str = "Password must be at least 6 characters long.";
const BAD_TRANSMISSION: &str = "'transmission' field must be either 'manual' or 'automatic'.";
const BAD_FUEL_TYPE: &str =
    "'fuelType' field can only be one of 'petrol', 'diesel', 'electric', or 'hybrid'.";
const BAD_BODY_TYPE: &str = "'bodyType' field can only be one of 'SUV', 'Hatchback','Saloon', \
     'Coupe','Convertible', 'Van', 'Pick-up', or 'Chassis Cab'.";
const BAD_YEAR: &str = "'year' field must contain a valid year, between 1886 and current year.";
const BAD_IMG_URL: &str =
    "'imgUrl' field must be a valid URL starting with 'http://' or 'https://'.";

fn invalid(message: impl Into<String>) -> CoreError {
    CoreError::Validation(message.into())
}

pub fn is_valid_email(email: &str) -> bool {
    match EMAIL_PATTERN.as_ref() {
        Ok(pattern) => pattern.is_match(email),
        Err(_) => false,
    }
}

/// A present, non-null field.
fn field<'a>(body: &'a Value, key: &str) -> Option<&'a Value> {
    body.get(key).filter(|value| !value.is_null())
}

//=========================================================================================
// Accounts
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Only honoured on the admin registration route.
    pub admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Reads every key as a string, or `None` if any of them is missing or not a string.
fn strings<const N: usize>(body: &Value, keys: [&str; N]) -> Option<[String; N]> {
    let mut out: [String; N] = std::array::from_fn(|_| String::new());
    for (slot, key) in out.iter_mut().zip(keys) {
        *slot = field(body, key)?.as_str()?.to_string();
    }
    Some(out)
}

fn check_email_and_password(email: &str, password: &str) -> CoreResult<()> {
    if !is_valid_email(email) {
        return Err(invalid(INVALID_EMAIL));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(invalid(SHORT_PASSWORD));
    }
    Ok(())
}

pub fn validate_user_inputs(body: &Value) -> CoreResult<Registration> {
    let [name, email, password] = strings(body, ["name", "email", "password"]).ok_or_else(|| {
        invalid("Invalid input types: name, email, and password must be strings.")
    })?;
    if name.trim().is_empty() || email.trim().is_empty() || password.trim().is_empty() {
        return Err(invalid(
            "Invalid input values: name, email, and password cannot be empty.",
        ));
    }
    check_email_and_password(&email, &password)?;
    Ok(Registration {
        name: name.trim().to_string(),
        email,
        password,
        admin: field(body, "admin").and_then(Value::as_bool).unwrap_or(false),
    })
}

pub fn validate_login_inputs(body: &Value) -> CoreResult<Credentials> {
    let [email, password] = strings(body, ["email", "password"])
        .ok_or_else(|| invalid("Invalid input types: email, and password must be strings."))?;
    if email.trim().is_empty() || password.trim().is_empty() {
        return Err(invalid(
            "Invalid input values: email, and password cannot be empty.",
        ));
    }
    check_email_and_password(&email, &password)?;
    Ok(Credentials { email, password })
}

pub fn validate_update_data(body: &Value) -> CoreResult<ProfileUpdate> {
    const KEYS: [&str; 3] = ["name", "email", "password"];

    let provided = KEYS.iter().any(|key| match field(body, key) {
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
        None => false,
    });
    if !provided {
        return Err(invalid(
            "At least one field (email, name, or password) must be provided for update.",
        ));
    }

    let mut values: [Option<String>; 3] = Default::default();
    for (slot, key) in values.iter_mut().zip(KEYS) {
        match field(body, key) {
            None => {}
            Some(Value::String(s)) if s.trim().is_empty() => {
                return Err(invalid(format!(
                    "Invalid input value for '{key}': field cannot be empty."
                )));
            }
            Some(Value::String(s)) => *slot = Some(s.clone()),
            Some(_) => {
                return Err(invalid(format!(
                    "Invalid input type for '{key}': field must be a string."
                )));
            }
        }
    }
    let [name, email, password] = values;

    if email.as_deref().is_some_and(|e| !is_valid_email(e)) {
        return Err(invalid(INVALID_EMAIL));
    }
    if password
        .as_deref()
        .is_some_and(|p| p.chars().count() < MIN_PASSWORD_LEN)
    {
        return Err(invalid(SHORT_PASSWORD));
    }
    Ok(ProfileUpdate {
        name: name.map(|n| n.trim().to_string()),
        email,
        password,
    })
}

//=========================================================================================
// Inventory
//=========================================================================================

fn text(value: &Value, key: &str, required: bool) -> CoreResult<String> {
    match value.as_str().map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ if required => Err(invalid(format!(
            "'{key}' field is required and must contain a non-empty string."
        ))),
        _ => Err(invalid(format!("'{key}' field must contain a non-empty string."))),
    }
}

fn non_negative_price(value: &Value, key: &str) -> CoreResult<f64> {
    value
        .as_f64()
        .filter(|n| n.is_finite() && *n >= 0.0)
        .ok_or_else(|| invalid(format!("'{key}' field must contain a positive number.")))
}

fn non_negative_int<T: TryFrom<i64>>(value: &Value, key: &str) -> CoreResult<T> {
    value
        .as_i64()
        .filter(|n| *n >= 0)
        .and_then(|n| T::try_from(n).ok())
        .ok_or_else(|| invalid(format!("'{key}' field must contain a positive number.")))
}

fn variant<T: FromStr>(value: &Value, message: &str) -> CoreResult<T> {
    value
        .as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| invalid(message))
}

fn model_year(value: &Value) -> CoreResult<i32> {
    value
        .as_i64()
        .and_then(|n| i32::try_from(n).ok())
        .filter(|year| (FIRST_CAR_YEAR..=current_year()).contains(year))
        .ok_or_else(|| invalid(BAD_YEAR))
}

fn img_url(value: &Value, required: bool) -> CoreResult<String> {
    let url = text(value, "imgUrl", required)?;
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(invalid(BAD_IMG_URL))
    }
}

/// Validates a full car record for creation.
pub fn validate_new_car(body: &Value) -> CoreResult<NewCar> {
    let get = |key: &str| field(body, key).unwrap_or(&Value::Null);

    let brand = text(get("brand"), "brand", true)?;
    let model = text(get("model"), "model", true)?;
    // Presence first, the URL scheme is checked after the categorical fields.
    text(get("imgUrl"), "imgUrl", true)?;

    let price = non_negative_price(get("price"), "price")?;
    let horse_power = non_negative_int(get("horsePower"), "horsePower")?;
    let mileage = non_negative_int(get("mileage"), "mileage")?;

    let transmission: Transmission = variant(get("transmission"), BAD_TRANSMISSION)?;
    let fuel_type: FuelType = variant(get("fuelType"), BAD_FUEL_TYPE)?;
    let body_type: BodyType = variant(get("bodyType"), BAD_BODY_TYPE)?;
    let year = model_year(get("year"))?;
    let img_url = img_url(get("imgUrl"), true)?;

    Ok(NewCar {
        brand,
        model,
        body_type,
        transmission,
        price,
        horse_power,
        fuel_type,
        mileage,
        year,
        img_url,
    })
}

/// Validates a partial car update. Unknown keys are ignored.
pub fn validate_car_update(body: &Value) -> CoreResult<CarUpdate> {
    let get = |key: &str| field(body, key);

    let update = CarUpdate {
        brand: get("brand").map(|v| text(v, "brand", false)).transpose()?,
        model: get("model").map(|v| text(v, "model", false)).transpose()?,
        price: get("price")
            .map(|v| non_negative_price(v, "price"))
            .transpose()?,
        horse_power: get("horsePower")
            .map(|v| non_negative_int(v, "horsePower"))
            .transpose()?,
        mileage: get("mileage")
            .map(|v| non_negative_int(v, "mileage"))
            .transpose()?,
        transmission: get("transmission")
            .map(|v| variant(v, BAD_TRANSMISSION))
            .transpose()?,
        fuel_type: get("fuelType")
            .map(|v| variant(v, BAD_FUEL_TYPE))
            .transpose()?,
        body_type: get("bodyType")
            .map(|v| variant(v, BAD_BODY_TYPE))
            .transpose()?,
        year: get("year").map(model_year).transpose()?,
        img_url: get("imgUrl").map(|v| img_url(v, false)).transpose()?,
        sold: get("sold")
            .map(|v| {
                v.as_bool()
                    .ok_or_else(|| invalid("'sold' field must be a boolean value."))
            })
            .transpose()?,
    };

    if update == CarUpdate::default() {
        return Err(invalid(
            "At least one field (brand, model, bodyType...) must be provided for a car update.",
        ));
    }
    Ok(update)
}
