//! Persistence errors

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query error: {0}")]
    Query(String),

    #[error("Schema error: {0}")]
    SchemaError(String),

    /// A stored row could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl PersistenceError {
    /// Unreadable stored data, as opposed to an unreachable store
    pub fn is_data_error(&self) -> bool {
        matches!(self, PersistenceError::InvalidData(_))
    }
}

impl From<scylla::transport::errors::NewSessionError> for PersistenceError {
    fn from(err: scylla::transport::errors::NewSessionError) -> Self {
        PersistenceError::Connection(err.to_string())
    }
}

impl From<scylla::transport::errors::QueryError> for PersistenceError {
    fn from(err: scylla::transport::errors::QueryError) -> Self {
        PersistenceError::Query(err.to_string())
    }
}

impl From<scylla::cql_to_rust::FromRowError> for PersistenceError {
    fn from(err: scylla::cql_to_rust::FromRowError) -> Self {
        PersistenceError::InvalidData(err.to_string())
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(err: serde_json::Error) -> Self {
        PersistenceError::InvalidData(err.to_string())
    }
}

impl From<PersistenceError> for storefront_chat_core::Error {
    fn from(err: PersistenceError) -> Self {
        match err {
            PersistenceError::InvalidData(msg) => storefront_chat_core::Error::Data(msg),
            other => storefront_chat_core::Error::Persistence(other.to_string()),
        }
    }
}
