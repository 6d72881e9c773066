//! HTTP-level integration tests for catalog search, inventory management and
//! the sales ledger.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, build_test_app, delete_auth, get, get_auth, login, new_car, post_auth,
    post_json_auth, put_json_auth, register_staff, register_user, stock_car, TestApp,
};
use dealership_core::domain::BodyType;

async fn admin_token(app: &TestApp) -> String {
    register_staff(&app.router, "Boss", "boss@example.com", true).await;
    login(&app.router, "boss@example.com").await
}

async fn customer_token(app: &TestApp) -> String {
    register_user(&app.router, "Ann", "ann@example.com").await;
    login(&app.router, "ann@example.com").await
}

// ---------------------------------------------------------------------------
// Catalog search
// ---------------------------------------------------------------------------

#[tokio::test]
async fn anonymous_search_gets_the_public_shape() {
    let app = build_test_app();
    stock_car(&app, new_car("Mercedes-Benz", "C 200", 2020)).await;
    stock_car(&app, new_car("Toyota", "Corolla", 2018)).await;

    let json = body_json(get(&app.router, "/cars?brand=benz").await).await;
    assert_eq!(json["total"], 1);
    let car = &json["cars"][0];
    assert_eq!(car["brand"], "Mercedes-Benz");
    assert!(car["id"].is_string());
    assert!(car.get("sold").is_none());
    assert!(car.get("createdAt").is_none());
    assert!(car.get("updatedBy").is_none());
}

#[tokio::test]
async fn admin_search_gets_the_full_record() {
    let app = build_test_app();
    stock_car(&app, new_car("Mercedes-Benz", "C 200", 2020)).await;
    let token = admin_token(&app).await;

    let json = body_json(get_auth(&app.router, "/cars?brand=benz", &token).await).await;
    let car = &json["cars"][0];
    assert_eq!(car["sold"], false);
    assert!(car["createdAt"].is_string());
}

#[tokio::test]
async fn customers_get_the_public_shape_too() {
    let app = build_test_app();
    stock_car(&app, new_car("Toyota", "Corolla", 2018)).await;
    let token = customer_token(&app).await;

    let json = body_json(get_auth(&app.router, "/cars", &token).await).await;
    assert_eq!(json["total"], 1);
    assert!(json["cars"][0].get("sold").is_none());
}

#[tokio::test]
async fn an_invalid_token_searches_anonymously() {
    let app = build_test_app();
    stock_car(&app, new_car("Toyota", "Corolla", 2018)).await;

    let response = get_auth(&app.router, "/cars", "expired-or-forged").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_json(response).await["cars"][0].get("sold").is_none());
}

#[tokio::test]
async fn filters_combine_with_and() {
    let app = build_test_app();
    stock_car(&app, new_car("Mercedes-Benz", "C 200", 2020)).await;
    stock_car(&app, new_car("Mercedes-Benz", "E 300", 2021)).await;
    stock_car(&app, new_car("Toyota", "Corolla", 2019)).await;

    let json = body_json(get(&app.router, "/cars?brand=benz&year=2020").await).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["cars"][0]["model"], "C 200");
}

#[tokio::test]
async fn unknown_body_type_empties_the_result() {
    let app = build_test_app();
    let mut van = new_car("Volkswagen", "Transporter", 2019);
    van.body_type = BodyType::Van;
    stock_car(&app, van).await;

    let json = body_json(get(&app.router, "/cars?bodyType=Minivan").await).await;
    assert_eq!(json["total"], 0);

    let json = body_json(get(&app.router, "/cars?bodyType=Minivan&brand=volks").await).await;
    assert_eq!(json["total"], 0);
    assert!(json["cars"].as_array().unwrap().is_empty());

    let json = body_json(get(&app.router, "/cars?bodyType=van").await).await;
    assert_eq!(json["total"], 1);
}

#[tokio::test]
async fn empty_and_unknown_parameters_are_ignored() {
    let app = build_test_app();
    stock_car(&app, new_car("Toyota", "Corolla", 2019)).await;
    stock_car(&app, new_car("Honda", "Civic", 2015)).await;

    let json = body_json(get(&app.router, "/cars?brand=&color=red").await).await;
    assert_eq!(json["total"], 2);
}

#[tokio::test]
async fn pagination_slices_and_reports_the_full_total() {
    let app = build_test_app();
    for i in 0..5 {
        stock_car(&app, new_car("Toyota", &format!("Model {i}"), 2019)).await;
    }

    let json = body_json(get(&app.router, "/cars?page=2&size=2").await).await;
    assert_eq!(json["total"], 5);
    assert_eq!(json["page"], 2);
    assert_eq!(json["size"], 2);
    assert_eq!(json["cars"].as_array().unwrap().len(), 2);

    let json = body_json(get(&app.router, "/cars?page=999&size=10").await).await;
    assert!(json["cars"].as_array().unwrap().is_empty());

    let json = body_json(get(&app.router, "/cars").await).await;
    assert!(json.get("page").is_none());
    assert_eq!(json["cars"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn invalid_pagination_is_a_bad_request() {
    let app = build_test_app();
    for query in ["page=0", "size=-3", "page=two", "page=1&size=0"] {
        let response = get(&app.router, &format!("/cars?{query}")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{query}");
    }
}

// ---------------------------------------------------------------------------
// Inventory management
// ---------------------------------------------------------------------------

fn car_body() -> serde_json::Value {
    serde_json::json!({
        "brand": "Kia",
        "model": "EV6",
        "bodyType": "SUV",
        "transmission": "automatic",
        "price": 38700,
        "horsePower": 325,
        "fuelType": "electric",
        "mileage": 15000,
        "year": 2023,
        "imgUrl": "https://img.example/ev6.png"
    })
}

#[tokio::test]
async fn staff_create_update_and_delete_cars() {
    let app = build_test_app();
    let token = admin_token(&app).await;

    let response = post_json_auth(&app.router, "/inventory/cars/create", &token, car_body()).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    let id = json["car"]["id"].as_str().unwrap().to_string();
    assert_eq!(json["car"]["sold"], false);
    assert!(json["car"]["updatedBy"].is_string());

    let uri = format!("/inventory/cars/update/{id}");
    let price = serde_json::json!({ "price": 35000 });
    let response = put_json_auth(&app.router, &uri, &token, price.clone()).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["car"]["price"], 35000.0);

    let response = put_json_auth(&app.router, &uri, &token, price).await;
    assert_eq!(body_json(response).await["message"], "No changes made");

    let response = delete_auth(&app.router, &format!("/inventory/cars/delete/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = delete_auth(&app.router, &format!("/inventory/cars/delete/{id}"), &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn car_creation_is_validated_and_guarded() {
    let app = build_test_app();
    let customer = customer_token(&app).await;
    let response =
        post_json_auth(&app.router, "/inventory/cars/create", &customer, car_body()).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = admin_token(&app).await;
    let mut body = car_body();
    body["year"] = serde_json::json!(1700);
    let response = post_json_auth(&app.router, "/inventory/cars/create", &admin, body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await["error"],
        "'year' field must contain a valid year, between 1886 and current year."
    );
}

#[tokio::test]
async fn updating_an_unknown_car_is_not_found() {
    let app = build_test_app();
    let token = admin_token(&app).await;

    let body = serde_json::json!({ "price": 1000 });
    for id in ["not-a-uuid", "00000000-0000-0000-0000-000000000000"] {
        let uri = format!("/inventory/cars/update/{id}");
        let response = put_json_auth(&app.router, &uri, &token, body.clone()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{id}");
        assert_eq!(body_json(response).await["error"], "Car not found");
    }
}

// ---------------------------------------------------------------------------
// Purchases
// ---------------------------------------------------------------------------

#[tokio::test]
async fn a_car_can_only_be_bought_once() {
    let app = build_test_app();
    let car = stock_car(&app, new_car("Tesla", "Model 3", 2021)).await;
    let buyer = customer_token(&app).await;
    let uri = format!("/inventory/cars/buy/{}", car.id);

    let response = post_auth(&app.router, &uri, &buyer).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["sale"]["carId"], car.id.to_string());
    assert_eq!(json["sale"]["price"], 20000.0);

    let response = post_auth(&app.router, &uri, &buyer).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Sold cars leave the catalog.
    let json = body_json(get(&app.router, "/cars").await).await;
    assert_eq!(json["total"], 0);

    let json = body_json(get_auth(&app.router, "/user/purchases", &buyer).await).await;
    assert_eq!(json["totalPurchases"], 1);
}

#[tokio::test]
async fn a_restocked_car_can_be_sold_again() {
    let app = build_test_app();
    let car = stock_car(&app, new_car("Tesla", "Model 3", 2021)).await;
    let buyer = customer_token(&app).await;
    let admin = admin_token(&app).await;
    let uri = format!("/inventory/cars/buy/{}", car.id);

    let response = post_auth(&app.router, &uri, &buyer).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let restock = serde_json::json!({ "sold": false });
    let update_uri = format!("/inventory/cars/update/{}", car.id);
    let response = put_json_auth(&app.router, &update_uri, &admin, restock).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["car"]["sold"], false);

    let response = post_auth(&app.router, &uri, &buyer).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(get_auth(&app.router, "/inventory/cars/sales", &admin).await).await;
    assert_eq!(json["totalSales"], 2);
    assert_eq!(json["sales"][0]["carId"], json["sales"][1]["carId"]);
}

#[tokio::test]
async fn buying_requires_a_session_and_a_real_car() {
    let app = build_test_app();
    let car = stock_car(&app, new_car("Tesla", "Model 3", 2021)).await;

    let response = post_auth(&app.router, &format!("/inventory/cars/buy/{}", car.id), "nope").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let buyer = customer_token(&app).await;
    let response = post_auth(
        &app.router,
        "/inventory/cars/buy/00000000-0000-0000-0000-000000000000",
        &buyer,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn sales_report_is_staff_only() {
    let app = build_test_app();
    let first = stock_car(&app, new_car("Tesla", "Model 3", 2021)).await;
    let second = stock_car(&app, new_car("Honda", "Civic", 2015)).await;
    let buyer = customer_token(&app).await;
    for car in [&first, &second] {
        let uri = format!("/inventory/cars/buy/{}", car.id);
        let response = post_auth(&app.router, &uri, &buyer).await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = get_auth(&app.router, "/inventory/cars/sales", &buyer).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let admin = admin_token(&app).await;
    let json = body_json(get_auth(&app.router, "/inventory/cars/sales", &admin).await).await;
    assert_eq!(json["totalSales"], 2);
    assert_eq!(json["revenue"], 40000.0);

    let json = body_json(get(&app.router, "/stat").await).await;
    assert_eq!(json["cars"], 0);
}
