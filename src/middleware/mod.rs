pub mod auth;
pub mod request_id;

pub use auth::{AdminPrincipal, Principal, Role, TrustedHeaderAuth};
pub use request_id::{RequestId, RequestIdValue};
