//! services/api/src/web/cars.rs
//!
//! Catalog search, inventory management and purchases.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::Utc;
use dealership_core::catalog::{search_cars, CatalogPage};
use dealership_core::domain::{BodyType, Car, FuelType, NewCar, Sale, Transmission};
use dealership_core::{require, Capability, CoreError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiResult;
use crate::validation::{validate_car_update, validate_new_car};
use crate::web::middleware::{JsonBody, MaybeSession, RequireSession};
use crate::web::rest::{ErrorResponse, MessageResponse};
use crate::web::state::AppState;

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// Partial car update. Omitted fields are left as they are.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CarUpdateRequest {
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

#[derive(Serialize, ToSchema)]
pub struct CarResponse {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub car: Option<Car>,
}

#[derive(Serialize, ToSchema)]
pub struct SaleResponse {
    pub message: String,
    pub sale: Sale,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
    pub total_sales: usize,
    pub revenue: f64,
    pub sales: Vec<Sale>,
}

fn car_not_found() -> CoreError {
    CoreError::NotFound("Car not found".to_string())
}

/// Unparseable ids can never name a car.
fn car_id(raw: &str) -> Result<Uuid, CoreError> {
    Uuid::parse_str(raw).map_err(|_| car_not_found())
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /cars - Search the unsold inventory
///
/// Every recognised, non-empty filter must match. Staff and admins see full
/// records; everyone else sees the public shape.
#[utoipa::path(
    get,
    path = "/cars",
    params(
        ("brand" = Option<String>, Query, description = "Case-insensitive substring"),
        ("model" = Option<String>, Query, description = "Case-insensitive substring"),
        ("bodyType" = Option<String>, Query, description = "Case-insensitive body type"),
        ("transmission" = Option<String>, Query, description = "manual or automatic"),
        ("fuelType" = Option<String>, Query, description = "petrol, diesel, electric or hybrid"),
        ("price" = Option<f64>, Query, description = "Maximum price"),
        ("mileage" = Option<f64>, Query, description = "Maximum mileage"),
        ("year" = Option<i32>, Query, description = "Latest model year"),
        ("page" = Option<usize>, Query, description = "1-based page"),
        ("size" = Option<usize>, Query, description = "Page size"),
    ),
    responses(
        (status = 200, description = "Matching cars, newest first", body = CatalogPage),
        (status = 400, description = "Invalid pagination", body = ErrorResponse)
    )
)]
pub async fn search_cars_handler(
    State(state): State<Arc<AppState>>,
    MaybeSession(session): MaybeSession,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<CatalogPage>> {
    let page = search_cars(
        state.inventory.as_ref(),
        &query,
        session.subject(),
        state.config.default_page_size,
    )
    .await?;
    Ok(Json(page))
}

/// POST /inventory/cars/create - Add a car to the inventory
#[utoipa::path(
    post,
    path = "/inventory/cars/create",
    request_body = NewCar,
    responses(
        (status = 201, description = "Car created", body = CarResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "No live session", body = ErrorResponse),
        (status = 403, description = "Caller is not staff", body = ErrorResponse)
    )
)]
pub async fn create_car_handler(
    State(state): State<Arc<AppState>>,
    RequireSession(subject): RequireSession,
    JsonBody(body): JsonBody,
) -> ApiResult<(StatusCode, Json<CarResponse>)> {
    require(&subject, Capability::ManageInventory)?;
    let new_car = validate_new_car(&body)?;
    let car = state.inventory.insert_car(new_car, Some(subject.id)).await?;
    info!(car_id = %car.id, by = %subject.id, "Car added to inventory");

    Ok((
        StatusCode::CREATED,
        Json(CarResponse {
            message: "Car created successfully".to_string(),
            car: Some(car),
        }),
    ))
}

/// PUT /inventory/cars/update/{carId} - Change fields of a car
#[utoipa::path(
    put,
    path = "/inventory/cars/update/{carId}",
    request_body = CarUpdateRequest,
    params(("carId" = String, Path, description = "Car id")),
    responses(
        (status = 200, description = "Car updated, or nothing changed", body = CarResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "No live session", body = ErrorResponse),
        (status = 403, description = "Caller is not staff", body = ErrorResponse),
        (status = 404, description = "Car not found", body = ErrorResponse)
    )
)]
pub async fn update_car_handler(
    State(state): State<Arc<AppState>>,
    RequireSession(subject): RequireSession,
    Path(raw_id): Path<String>,
    JsonBody(body): JsonBody,
) -> ApiResult<Json<CarResponse>> {
    require(&subject, Capability::ManageInventory)?;
    let id = car_id(&raw_id)?;
    let update = validate_car_update(&body)?;

    let mut car = state.inventory.find_car(id).await?.ok_or_else(car_not_found)?;
    if !car.apply(update, subject.id, Utc::now()) {
        return Ok(Json(CarResponse {
            message: "No changes made".to_string(),
            car: None,
        }));
    }
    if !state.inventory.update_car(&car).await? {
        return Err(car_not_found().into());
    }
    info!(car_id = %car.id, by = %subject.id, "Car updated");

    Ok(Json(CarResponse {
        message: "Car updated successfully".to_string(),
        car: Some(car),
    }))
}

/// DELETE /inventory/cars/delete/{carId} - Remove a car from the inventory
#[utoipa::path(
    delete,
    path = "/inventory/cars/delete/{carId}",
    params(("carId" = String, Path, description = "Car id")),
    responses(
        (status = 200, description = "Car deleted", body = MessageResponse),
        (status = 401, description = "No live session", body = ErrorResponse),
        (status = 403, description = "Caller is not staff", body = ErrorResponse),
        (status = 404, description = "Car not found", body = ErrorResponse)
    )
)]
pub async fn delete_car_handler(
    State(state): State<Arc<AppState>>,
    RequireSession(subject): RequireSession,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    require(&subject, Capability::ManageInventory)?;
    let id = car_id(&raw_id)?;
    if !state.inventory.delete_car(id).await? {
        return Err(car_not_found().into());
    }
    info!(car_id = %id, by = %subject.id, "Car deleted");
    Ok(MessageResponse::new(format!("Car with id '{id}' deleted successfully")))
}

/// POST /inventory/cars/buy/{carId} - Purchase a car
#[utoipa::path(
    post,
    path = "/inventory/cars/buy/{carId}",
    params(("carId" = String, Path, description = "Car id")),
    responses(
        (status = 201, description = "Sale recorded", body = SaleResponse),
        (status = 401, description = "No live session", body = ErrorResponse),
        (status = 404, description = "Car not found", body = ErrorResponse),
        (status = 409, description = "Car already sold", body = ErrorResponse)
    )
)]
pub async fn buy_car_handler(
    State(state): State<Arc<AppState>>,
    RequireSession(subject): RequireSession,
    Path(raw_id): Path<String>,
) -> ApiResult<(StatusCode, Json<SaleResponse>)> {
    require(&subject, Capability::Purchase)?;
    let id = car_id(&raw_id)?;

    let car = state.inventory.find_car(id).await?.ok_or_else(car_not_found)?;
    if car.sold {
        return Err(CoreError::Conflict("Car already sold".to_string()).into());
    }
    // The ledger re-checks `sold` atomically; losing a race is still a conflict.
    let Some(sale) = state.sales.record_sale(id, subject.id).await? else {
        return Err(CoreError::Conflict("Car already sold".to_string()).into());
    };
    info!(car_id = %id, buyer = %subject.id, "Car sold");

    Ok((
        StatusCode::CREATED,
        Json(SaleResponse {
            message: format!("{} {} purchased successfully", car.brand, car.model),
            sale,
        }),
    ))
}

/// GET /inventory/cars/sales - The full sales ledger
#[utoipa::path(
    get,
    path = "/inventory/cars/sales",
    responses(
        (status = 200, description = "All sales", body = SalesReport),
        (status = 401, description = "No live session", body = ErrorResponse),
        (status = 403, description = "Caller is not staff", body = ErrorResponse)
    )
)]
pub async fn sales_handler(
    State(state): State<Arc<AppState>>,
    RequireSession(subject): RequireSession,
) -> ApiResult<Json<SalesReport>> {
    require(&subject, Capability::ViewSales)?;
    let sales = state.sales.all_sales().await?;
    Ok(Json(SalesReport {
        total_sales: sales.len(),
        revenue: sales.iter().map(|sale| sale.price).sum(),
        sales,
    }))
}
