mod auth_service;
mod lookup_service;

pub use auth_service::*;
pub use lookup_service::*;
