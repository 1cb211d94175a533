//! Domain library for the record store.
//!
//! This crate holds the `Record` entity, the `RecordRepository` port, the
//! error type, and a small application service. It stays free of IO; real
//! storage adapters (MongoDB) live in separate crates and are verified
//! against the same scenarios as the in-memory fake via [`contract`].

use std::error::Error;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// A stored item. The id is assigned by the caller, never by the store.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub name: String,
}

impl Record {
    pub fn new<I: Into<String>, N: Into<String>>(id: I, name: N) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Repository port for persisting and listing records.
///
/// Every implementation must behave identically: `save` upserts by id
/// (last write wins) and `find_all` returns exactly the latest value per id,
/// in no particular order, or an empty vector when nothing was stored.
pub trait RecordRepository: Send + Sync {
    fn save(&self, record: Record) -> Result<(), CoreError>;
    fn find_all(&self) -> Result<Vec<Record>, CoreError>;
}

impl<R: RecordRepository + ?Sized> RecordRepository for Box<R> {
    fn save(&self, record: Record) -> Result<(), CoreError> {
        (**self).save(record)
    }

    fn find_all(&self) -> Result<Vec<Record>, CoreError> {
        (**self).find_all()
    }
}

/// Id generator interface; callers assign ids before persistence.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> String;
}

impl<G: IdGenerator + ?Sized> IdGenerator for Box<G> {
    fn next_id(&self) -> String {
        (**self).next_id()
    }
}

/// Core domain errors (no external error crates to keep deps minimal).
#[derive(Debug)]
pub enum CoreError {
    InvalidRecord(String),
    InvalidConnectionString(String),
    Repository(String),
}

impl Display for CoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::InvalidRecord(msg) => write!(f, "invalid record: {}", msg),
            CoreError::InvalidConnectionString(msg) => {
                write!(f, "invalid connection string: {}", msg)
            }
            CoreError::Repository(msg) => write!(f, "repository error: {}", msg),
        }
    }
}

impl Error for CoreError {}

pub mod adapters;
#[cfg(feature = "contract")]
pub mod contract;
pub mod id;
pub mod service;
pub mod validate;
