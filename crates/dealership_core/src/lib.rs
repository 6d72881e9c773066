pub mod access;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod ports;
pub mod session;

pub use access::{allows, require, Capability};
pub use catalog::{
    paginate, reconcile, resolve_candidates, search_cars, select_fields, CarListing, CatalogPage,
    FieldPredicate, PageRequest, QueryField, Reconciled,
};
pub use domain::{
    BodyType, Car, CarUpdate, FuelType, NewCar, NewUser, PublicCar, Role, Sale, Subject,
    Transmission, User, UserProfile,
};
pub use error::{CoreError, CoreResult};
pub use ports::{
    InventoryStore, PasswordDigest, PortError, PortResult, SalesLedger, SessionCache,
    TokenService, UserStore,
};
pub use session::{cache_key, validate_session, SessionCheck, SessionManager};
