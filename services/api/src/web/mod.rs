pub mod admin;
pub mod auth;
pub mod cars;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderName, HeaderValue, Method,
    },
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::web::middleware::TOKEN_HEADER;
use crate::web::rest::ApiDoc;
use crate::web::state::AppState;

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::permissive();
    };
    match origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([
                AUTHORIZATION,
                CONTENT_TYPE,
                ACCEPT,
                HeaderName::from_static(TOKEN_HEADER),
            ]),
        Err(_) => {
            warn!(origin, "CORS_ORIGIN is not a valid header value, allowing any origin");
            CorsLayer::permissive()
        }
    }
}

/// Builds the complete application: API routes, Swagger UI, CORS and request tracing.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    // Service and account routes
    let account_routes = Router::new()
        .route("/", get(rest::home_handler))
        .route("/stat", get(rest::stat_handler))
        .route("/register", post(auth::register_handler))
        .route("/admin/register/{admin_slug}", post(auth::admin_register_handler))
        .route("/login", post(auth::login_handler))
        .route("/logout", get(auth::logout_handler))
        .route("/user", get(users::my_info_handler))
        .route("/user/update", put(users::update_user_handler))
        .route("/user/delete", delete(users::delete_user_handler))
        .route("/user/purchases", get(users::purchases_handler))
        .route("/admin/staff", get(admin::list_staff_handler))
        .route("/admin/delete/{staff_id}", delete(admin::delete_staff_handler));

    // Catalog and inventory routes
    let inventory_routes = Router::new()
        .route("/cars", get(cars::search_cars_handler))
        .route("/inventory/cars/create", post(cars::create_car_handler))
        .route("/inventory/cars/update/{car_id}", put(cars::update_car_handler))
        .route("/inventory/cars/delete/{car_id}", delete(cars::delete_car_handler))
        .route("/inventory/cars/buy/{car_id}", post(cars::buy_car_handler))
        .route("/inventory/cars/sales", get(cars::sales_handler));

    let api_router = Router::new()
        .merge(account_routes)
        .merge(inventory_routes)
        .layer(DefaultBodyLimit::max(64 * 1024))
        .with_state(state);

    // Merge the API router with the Swagger UI router for a complete application.
    Router::new()
        .merge(api_router)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
