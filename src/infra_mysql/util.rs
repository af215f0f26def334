use crate::domain_port::StoreError;
use uuid::Uuid;

pub fn uuid_from_bytes(bytes: &[u8]) -> Result<Uuid, StoreError> {
    Uuid::from_slice(bytes).map_err(|e| StoreError(e.to_string()))
}

pub fn store_err<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError(e.to_string())
}
