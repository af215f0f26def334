mod auth_service_impl;
mod credential_verifier;
mod jwt_codec;
mod lookup_service_fake;

pub use auth_service_impl::*;
pub use credential_verifier::*;
pub use jwt_codec::*;
pub use lookup_service_fake::*;
