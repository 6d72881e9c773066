//! crates/dealership_core/src/catalog.rs
//!
//! The inventory search pipeline: pick the filter fields present in a query,
//! gather candidates with one store query per field, keep only the records
//! that satisfy every field, then order, shape and paginate the result.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Utc};
use futures::future::try_join_all;
use serde::Serialize;
use tracing::debug;

use crate::access::{allows, Capability};
use crate::domain::{BodyType, Car, FuelType, PublicCar, Subject, Transmission};
use crate::error::{CoreError, CoreResult};
use crate::ports::{InventoryStore, PortResult};

/// The year the first production car was built. Earlier years never match.
pub const FIRST_CAR_YEAR: i32 = 1886;

//=========================================================================================
// Field Selection
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryField {
    Brand,
    Model,
    BodyType,
    Transmission,
    FuelType,
    Price,
    Mileage,
    Year,
}

impl QueryField {
    /// Canonical order. Selection always follows it.
    pub const ALL: [QueryField; 8] = [
        QueryField::Brand,
        QueryField::Model,
        QueryField::BodyType,
        QueryField::Transmission,
        QueryField::FuelType,
        QueryField::Price,
        QueryField::Mileage,
        QueryField::Year,
    ];

    /// The query-string parameter carrying this field.
    pub fn key(self) -> &'static str {
        match self {
            QueryField::Brand => "brand",
            QueryField::Model => "model",
            QueryField::BodyType => "bodyType",
            QueryField::Transmission => "transmission",
            QueryField::FuelType => "fuelType",
            QueryField::Price => "price",
            QueryField::Mileage => "mileage",
            QueryField::Year => "year",
        }
    }
}

/// Returns every recognized filter field with a non-empty value, in canonical order.
/// Unknown parameters are ignored.
pub fn select_fields(query: &HashMap<String, String>) -> Vec<QueryField> {
    QueryField::ALL
        .into_iter()
        .filter(|field| {
            query
                .get(field.key())
                .is_some_and(|value| !value.trim().is_empty())
        })
        .collect()
}

//=========================================================================================
// Field Predicates
//=========================================================================================

/// A parsed filter value. A `None` payload means the raw value was out of
/// domain, so the field matches nothing.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldPredicate {
    /// Lowercased needle, matched as a substring.
    Brand(String),
    Model(String),
    BodyType(Option<BodyType>),
    Transmission(Option<Transmission>),
    FuelType(Option<FuelType>),
    /// Inclusive upper bound.
    Price(Option<f64>),
    Mileage(Option<f64>),
    Year(Option<i32>),
}

fn parse_threshold(raw: &str) -> Option<f64> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && *value >= 0.0)
}

impl FieldPredicate {
    pub fn parse(field: QueryField, raw: &str, current_year: i32) -> Self {
        let raw = raw.trim();
        match field {
            QueryField::Brand => FieldPredicate::Brand(raw.to_lowercase()),
            QueryField::Model => FieldPredicate::Model(raw.to_lowercase()),
            QueryField::BodyType => FieldPredicate::BodyType(BodyType::parse_ignore_case(raw)),
            QueryField::Transmission => FieldPredicate::Transmission(raw.parse().ok()),
            QueryField::FuelType => FieldPredicate::FuelType(raw.parse().ok()),
            QueryField::Price => FieldPredicate::Price(parse_threshold(raw)),
            QueryField::Mileage => FieldPredicate::Mileage(parse_threshold(raw)),
            QueryField::Year => FieldPredicate::Year(
                raw.parse::<i32>()
                    .ok()
                    .filter(|year| (FIRST_CAR_YEAR..=current_year).contains(year)),
            ),
        }
    }

    pub fn field(&self) -> QueryField {
        match self {
            FieldPredicate::Brand(_) => QueryField::Brand,
            FieldPredicate::Model(_) => QueryField::Model,
            FieldPredicate::BodyType(_) => QueryField::BodyType,
            FieldPredicate::Transmission(_) => QueryField::Transmission,
            FieldPredicate::FuelType(_) => QueryField::FuelType,
            FieldPredicate::Price(_) => QueryField::Price,
            FieldPredicate::Mileage(_) => QueryField::Mileage,
            FieldPredicate::Year(_) => QueryField::Year,
        }
    }

    /// `false` when the value was rejected at parse time and nothing can match.
    pub fn is_satisfiable(&self) -> bool {
        match self {
            FieldPredicate::Brand(_) | FieldPredicate::Model(_) => true,
            FieldPredicate::BodyType(value) => value.is_some(),
            FieldPredicate::Transmission(value) => value.is_some(),
            FieldPredicate::FuelType(value) => value.is_some(),
            FieldPredicate::Price(value) | FieldPredicate::Mileage(value) => value.is_some(),
            FieldPredicate::Year(value) => value.is_some(),
        }
    }

    /// Evaluates this predicate against a record's own attributes.
    pub fn matches(&self, car: &Car) -> bool {
        match self {
            FieldPredicate::Brand(needle) => car.brand.to_lowercase().contains(needle.as_str()),
            FieldPredicate::Model(needle) => car.model.to_lowercase().contains(needle.as_str()),
            FieldPredicate::BodyType(value) => *value == Some(car.body_type),
            FieldPredicate::Transmission(value) => *value == Some(car.transmission),
            FieldPredicate::FuelType(value) => *value == Some(car.fuel_type),
            FieldPredicate::Price(limit) => limit.is_some_and(|limit| car.price <= limit),
            FieldPredicate::Mileage(limit) => {
                limit.is_some_and(|limit| car.mileage as f64 <= limit)
            }
            FieldPredicate::Year(limit) => limit.is_some_and(|limit| car.year <= limit),
        }
    }
}

/// Parses the value of each selected field.
pub fn parse_predicates(
    query: &HashMap<String, String>,
    fields: &[QueryField],
    current_year: i32,
) -> Vec<FieldPredicate> {
    fields
        .iter()
        .filter_map(|field| {
            query
                .get(field.key())
                .map(|raw| FieldPredicate::parse(*field, raw, current_year))
        })
        .collect()
}

//=========================================================================================
// Candidate Resolution
//=========================================================================================

/// Runs one unsold-only store query per predicate and concatenates the results
/// in predicate order. The list may hold duplicates and records that fail
/// other predicates; [`reconcile`] narrows it down.
pub async fn resolve_candidates(
    store: &dyn InventoryStore,
    predicates: &[FieldPredicate],
) -> PortResult<Vec<Car>> {
    let queries = predicates.iter().map(|predicate| async move {
        if !predicate.is_satisfiable() {
            debug!(field = predicate.field().key(), "filter value out of domain, skipping query");
            return Ok(Vec::new());
        }
        store.find_unsold(Some(predicate)).await
    });

    let batches = try_join_all(queries).await?;
    Ok(batches.into_iter().flatten().collect())
}

//=========================================================================================
// Reconciliation
//=========================================================================================

/// The surviving records in both shapes, index-aligned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciled {
    pub filtered: Vec<Car>,
    pub formatted: Vec<PublicCar>,
}

impl Reconciled {
    /// Orders both shapes most-recently-created first. Ties keep their order.
    pub fn newest_first(mut self) -> Self {
        self.filtered.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        self.formatted = self.filtered.iter().map(PublicCar::from).collect();
        self
    }
}

/// Keeps each candidate that passes every predicate, once.
pub fn reconcile(candidates: Vec<Car>, predicates: &[FieldPredicate]) -> Reconciled {
    let mut seen = HashSet::new();
    let filtered: Vec<Car> = candidates
        .into_iter()
        .filter(|car| predicates.iter().all(|predicate| predicate.matches(car)))
        .filter(|car| seen.insert(car.id))
        .collect();
    let formatted = filtered.iter().map(PublicCar::from).collect();

    Reconciled {
        filtered,
        formatted,
    }
}

//=========================================================================================
// Pagination
//=========================================================================================

/// A validated page request. Both numbers are at least 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
}

fn parse_positive(query: &HashMap<String, String>, key: &str) -> CoreResult<Option<usize>> {
    let Some(raw) = query.get(key) else {
        return Ok(None);
    };
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(Some(value)),
        _ => Err(CoreError::InvalidPagination(format!(
            "'{key}' must be a positive integer"
        ))),
    }
}

impl PageRequest {
    /// Reads `page` and `size` from the query. Neither present means no pagination;
    /// a missing one falls back to page 1 or `default_size`.
    pub fn from_query(
        query: &HashMap<String, String>,
        default_size: usize,
    ) -> CoreResult<Option<Self>> {
        let page = parse_positive(query, "page")?;
        let size = parse_positive(query, "size")?;
        if page.is_none() && size.is_none() {
            return Ok(None);
        }
        Ok(Some(Self {
            page: page.unwrap_or(1),
            size: size.unwrap_or(default_size.max(1)),
        }))
    }
}

/// Returns `items[(page-1)*size .. page*size]`, clamped to the list.
/// Pages past the end are empty.
pub fn paginate<T>(items: &[T], page: usize, size: usize) -> &[T] {
    let start = page
        .saturating_sub(1)
        .saturating_mul(size)
        .min(items.len());
    let end = start.saturating_add(size).min(items.len());
    &items[start..end]
}

//=========================================================================================
// Catalog Listing
//=========================================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(untagged)]
pub enum CarListing {
    Privileged(Vec<Car>),
    Public(Vec<PublicCar>),
}

impl CarListing {
    pub fn len(&self) -> usize {
        match self {
            CarListing::Privileged(cars) => cars.len(),
            CarListing::Public(cars) => cars.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CatalogPage {
    /// Matching records before pagination.
    pub total: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,
    pub cars: CarListing,
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

/// Searches the unsold inventory. Staff and admins get the full record shape;
/// everyone else, including anonymous callers, gets the public shape.
pub async fn search_cars(
    store: &dyn InventoryStore,
    query: &HashMap<String, String>,
    viewer: Option<&Subject>,
    default_page_size: usize,
) -> CoreResult<CatalogPage> {
    let page = PageRequest::from_query(query, default_page_size)?;

    let fields = select_fields(query);
    let predicates = parse_predicates(query, &fields, current_year());
    let candidates = if predicates.is_empty() {
        store.find_unsold(None).await?
    } else {
        resolve_candidates(store, &predicates).await?
    };
    let result = reconcile(candidates, &predicates).newest_first();
    debug!(
        filters = fields.len(),
        matches = result.filtered.len(),
        "catalog search resolved"
    );

    let privileged =
        viewer.is_some_and(|subject| allows(subject.role, Capability::ViewPrivilegedCatalog));
    let total = result.filtered.len();
    let cars = match (privileged, page) {
        (true, Some(p)) => {
            CarListing::Privileged(paginate(&result.filtered, p.page, p.size).to_vec())
        }
        (true, None) => CarListing::Privileged(result.filtered),
        (false, Some(p)) => {
            CarListing::Public(paginate(&result.formatted, p.page, p.size).to_vec())
        }
        (false, None) => CarListing::Public(result.formatted),
    };

    Ok(CatalogPage {
        total,
        page: page.map(|p| p.page),
        size: page.map(|p| p.size),
        cars,
    })
}
