//! services/api/src/web/rest.rs
//!
//! Service-level handlers and the master definition for the OpenAPI
//! specification.

use crate::web::state::AppState;
use crate::web::{admin, auth, cars, users};
use axum::{extract::State, http::StatusCode, response::Json};
use dealership_core::catalog::{CarListing, CatalogPage};
use dealership_core::domain::{
    BodyType, Car, FuelType, NewCar, PublicCar, Role, Sale, Transmission, UserProfile,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::error;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        home_handler,
        stat_handler,
        auth::register_handler,
        auth::admin_register_handler,
        auth::login_handler,
        auth::logout_handler,
        users::my_info_handler,
        users::update_user_handler,
        users::delete_user_handler,
        users::purchases_handler,
        admin::list_staff_handler,
        admin::delete_staff_handler,
        cars::search_cars_handler,
        cars::create_car_handler,
        cars::update_car_handler,
        cars::delete_car_handler,
        cars::buy_car_handler,
        cars::sales_handler,
    ),
    components(
        schemas(
            MessageResponse, ErrorResponse, StatResponse,
            auth::RegisterRequest, auth::LoginRequest, auth::TokenResponse,
            users::MyInfoResponse, users::UpdateUserRequest, users::PurchasesResponse,
            admin::StaffResponse,
            cars::CarUpdateRequest, cars::CarResponse, cars::SaleResponse, cars::SalesReport,
            CatalogPage, CarListing, Car, PublicCar, NewCar, Sale, UserProfile,
            Role, BodyType, Transmission, FuelType,
        )
    ),
    tags(
        (
            name = "RideFleet Dealership API",
            description = "Accounts, inventory search and the sales ledger."
        )
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// A plain acknowledgement.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// Every failure is reported in this shape.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize, ToSchema)]
pub struct StatResponse {
    /// Whether the store answered.
    pub database: bool,
    pub users: i64,
    /// Unsold cars.
    pub cars: i64,
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Welcome message", body = MessageResponse))
)]
pub async fn home_handler() -> Json<MessageResponse> {
    MessageResponse::new("Welcome to RideFleet dealership")
}

/// Reports store health and headline counts. A store fault is reported, not raised.
#[utoipa::path(
    get,
    path = "/stat",
    responses((status = 200, description = "Store status", body = StatResponse))
)]
pub async fn stat_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<StatResponse>) {
    let counts = tokio::try_join!(state.users.count_users(), state.inventory.count_unsold());
    let body = match counts {
        Ok((users, cars)) => StatResponse {
            database: true,
            users,
            cars,
        },
        Err(e) => {
            error!(error = %e, "Store unavailable while collecting stats");
            StatResponse {
                database: false,
                users: 0,
                cars: 0,
            }
        }
    };
    (StatusCode::OK, Json(body))
}
