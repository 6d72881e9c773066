pub mod db;
pub mod jwt;
pub mod memory;
pub mod password;
pub mod session_cache;

pub use db::DbAdapter;
pub use jwt::JwtTokenService;
pub use memory::MemoryStore;
pub use password::Argon2Digest;
pub use session_cache::MemorySessionCache;
