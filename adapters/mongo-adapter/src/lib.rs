//! MongoDB adapter implementing the `RecordRepository` port.
//!
//! - Stores records in the `records` collection, one document per record,
//!   with the record id as the document `_id`. The server therefore enforces
//!   id uniqueness and `save` is an upsert, matching the in-memory fake.
//! - `find_all` is an unfiltered scan; meant for small data volumes only.
//! - Provides `from_env()` wiring using `MONGODB_URI` and `MONGODB_DATABASE`.
//!
//! Notes:
//! - The domain `RecordRepository` trait is synchronous. We bridge to the async
//!   driver using an internal `tokio::runtime::Runtime` and `block_on`.
//! - The driver connects lazily; `ping()` forces a round-trip when a caller
//!   wants to fail fast.

use std::sync::Arc;

use domain::{CoreError, Record, RecordRepository};
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use tokio::runtime::RuntimeFlavor;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

/// Database used when none is configured.
pub const DEFAULT_DATABASE: &str = "test";
/// Collection holding the records.
pub const COLLECTION: &str = "records";

/// Connection settings for the MongoDB repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
}

impl MongoSettings {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: DEFAULT_DATABASE.into(),
        }
    }

    /// Build from environment variables:
    /// - `MONGODB_URI` (required)
    /// - `MONGODB_DATABASE` (optional, defaults to "test")
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_vars(
            std::env::var("MONGODB_URI").ok(),
            std::env::var("MONGODB_DATABASE").ok(),
        )
    }

    fn from_vars(uri: Option<String>, database: Option<String>) -> Result<Self, CoreError> {
        let uri = uri
            .filter(|s| !s.is_empty())
            .ok_or_else(|| CoreError::InvalidConnectionString("missing MONGODB_URI".into()))?;
        let database = database
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE.into());
        Ok(Self { uri, database })
    }
}

/// Stored shape of a record. The id doubles as the primary key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct RecordDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
}

impl From<Record> for RecordDocument {
    fn from(record: Record) -> Self {
        Self {
            id: record.id,
            name: record.name,
        }
    }
}

impl From<RecordDocument> for Record {
    fn from(document: RecordDocument) -> Self {
        Record::new(document.id, document.name)
    }
}

/// Repository backed by MongoDB.
///
/// Supports both standalone mode (creates its own Tokio runtime) and embedded
/// mode (reuses the caller's runtime via `Handle::current()`).
pub struct MongoRepo {
    client: Client,
    collection: Collection<RecordDocument>,
    database: String,
    // None when constructed inside an existing runtime
    rt: Option<Arc<tokio::runtime::Runtime>>,
}

impl MongoRepo {
    /// Connect to `uri`, storing records in the default database.
    pub fn connect(uri: &str) -> Result<Self, CoreError> {
        Self::with_settings(MongoSettings::new(uri))
    }

    /// Connect to `uri`, storing records in `database`.
    pub fn connect_to(uri: &str, database: &str) -> Result<Self, CoreError> {
        Self::with_settings(MongoSettings {
            uri: uri.into(),
            database: database.into(),
        })
    }

    /// Construct from `MONGODB_URI` / `MONGODB_DATABASE`.
    pub fn from_env() -> Result<Self, CoreError> {
        Self::with_settings(MongoSettings::from_env()?)
    }

    /// Parse the connection string, enable retryable writes and prepare a
    /// client. No network traffic happens until the first operation.
    pub fn with_settings(settings: MongoSettings) -> Result<Self, CoreError> {
        let rt = Self::maybe_create_runtime()?;
        let client = Self::block_on_with_rt(&rt, async {
            let mut options = ClientOptions::parse(&settings.uri)
                .await
                .map_err(map_uri_err)?;
            options.retry_writes = Some(true);
            Client::with_options(options).map_err(map_mongo_err)
        })?;
        let collection = client
            .database(&settings.database)
            .collection::<RecordDocument>(COLLECTION);
        info!(database = %settings.database, collection = COLLECTION, "mongo repository prepared");
        Ok(Self {
            client,
            collection,
            database: settings.database,
            rt,
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    /// Round-trip to the server; surfaces connection and auth failures early.
    pub fn ping(&self) -> Result<(), CoreError> {
        let db = self.client.database(&self.database);
        self.block_on(async { db.run_command(doc! { "ping": 1 }).await })
            .map_err(map_mongo_err)?;
        debug!(database = %self.database, "mongo ping ok");
        Ok(())
    }

    /// Check if we're inside a Tokio runtime. If yes, return None (reuse existing).
    /// If no, create a new runtime. Blocking on the caller's runtime needs
    /// `block_in_place`, which a current-thread runtime cannot provide.
    fn maybe_create_runtime() -> Result<Option<Arc<tokio::runtime::Runtime>>, CoreError> {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::CurrentThread => Err(
                CoreError::Repository("current-thread runtime not supported".into()),
            ),
            Ok(_) => Ok(None),
            Err(_) => {
                let rt = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(2)
                    .enable_all()
                    .build()
                    .map_err(|e| CoreError::Repository(format!("tokio runtime init: {e}")))?;
                Ok(Some(Arc::new(rt)))
            }
        }
    }

    fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        Self::block_on_with_rt(&self.rt, fut)
    }

    fn block_on_with_rt<F: std::future::Future>(
        rt: &Option<Arc<tokio::runtime::Runtime>>,
        fut: F,
    ) -> F::Output {
        match rt {
            Some(rt) => rt.block_on(fut),
            // Requires a multi-threaded runtime
            None => tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(fut)),
        }
    }
}

impl Drop for MongoRepo {
    fn drop(&mut self) {
        // The driver cleans up on the current runtime when its last handle
        // drops; an owned runtime is not current here, so shut down on it.
        // Neither blocking on nor dropping a runtime is allowed from inside
        // another one, so that case moves both onto a plain thread.
        let Some(rt) = self.rt.take() else {
            return;
        };
        let client = self.client.clone();
        let shutdown = move || {
            rt.block_on(async { client.shutdown().await });
            drop(rt);
        };
        if tokio::runtime::Handle::try_current().is_ok() {
            std::thread::scope(|s| {
                s.spawn(shutdown);
            });
        } else {
            shutdown();
        }
    }
}

impl RecordRepository for MongoRepo {
    #[instrument(skip(self, record), fields(id = %record.id))]
    fn save(&self, record: Record) -> Result<(), CoreError> {
        let id = record.id.clone();
        let document = RecordDocument::from(record);
        let fut = async {
            self.collection
                .replace_one(doc! { "_id": id.as_str() }, &document)
                .upsert(true)
                .await
        };
        let out = self.block_on(fut).map_err(map_mongo_err)?;
        debug!(
            matched = out.matched_count,
            upserted = out.upserted_id.is_some(),
            "record saved"
        );
        Ok(())
    }

    #[instrument(skip(self))]
    fn find_all(&self) -> Result<Vec<Record>, CoreError> {
        let fut = async {
            let cursor = self.collection.find(doc! {}).await?;
            cursor.try_collect::<Vec<RecordDocument>>().await
        };
        let documents = self.block_on(fut).map_err(map_mongo_err)?;
        debug!(count = documents.len(), "records loaded");
        Ok(documents.into_iter().map(Record::from).collect())
    }
}

fn map_uri_err(e: mongodb::error::Error) -> CoreError {
    CoreError::InvalidConnectionString(e.to_string())
}

fn map_mongo_err(e: mongodb::error::Error) -> CoreError {
    CoreError::Repository(format!("mongodb error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Nothing listens on port 1; keep server selection short so failures are quick.
    const UNREACHABLE: &str = "mongodb://127.0.0.1:1/?serverSelectionTimeoutMS=200";

    #[test]
    fn document_mapping_uses_id_as_primary_key() {
        let doc = RecordDocument::from(Record::new("abc-123", "Joe"));
        let bson = mongodb::bson::to_document(&doc).unwrap();
        assert_eq!(bson.get_str("_id").unwrap(), "abc-123");
        assert_eq!(bson.get_str("name").unwrap(), "Joe");
        assert!(bson.get("id").is_none());

        let back: RecordDocument = mongodb::bson::from_document(bson).unwrap();
        assert_eq!(Record::from(back), Record::new("abc-123", "Joe"));
    }

    #[test]
    fn settings_require_uri() {
        let err = MongoSettings::from_vars(None, None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConnectionString(_)));
        let err = MongoSettings::from_vars(Some(String::new()), None).unwrap_err();
        assert!(matches!(err, CoreError::InvalidConnectionString(_)));
    }

    #[test]
    fn settings_default_database() {
        let s = MongoSettings::from_vars(Some("mongodb://localhost:27017".into()), None).unwrap();
        assert_eq!(s.database, DEFAULT_DATABASE);
        let s = MongoSettings::from_vars(
            Some("mongodb://localhost:27017".into()),
            Some("records_dev".into()),
        )
        .unwrap();
        assert_eq!(s.database, "records_dev");
    }

    #[test]
    fn malformed_uri_is_rejected_at_construction() {
        let err = MongoRepo::connect("not-a-connection-string").err().unwrap();
        assert!(matches!(err, CoreError::InvalidConnectionString(_)));
    }

    #[test]
    fn connect_is_lazy() {
        let repo = MongoRepo::connect(UNREACHABLE).unwrap();
        assert_eq!(repo.database(), DEFAULT_DATABASE);
        let repo = MongoRepo::connect_to(UNREACHABLE, "other").unwrap();
        assert_eq!(repo.database(), "other");
    }

    #[test]
    fn unreachable_server_fails_operations() {
        let repo = MongoRepo::connect(UNREACHABLE).unwrap();
        assert!(matches!(repo.ping(), Err(CoreError::Repository(_))));
        assert!(matches!(repo.find_all(), Err(CoreError::Repository(_))));
        assert!(matches!(
            repo.save(Record::new("abc-123", "Joe")),
            Err(CoreError::Repository(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn reuses_ambient_runtime() {
        let repo = MongoRepo::connect(UNREACHABLE).unwrap();
        assert!(repo.rt.is_none());
        assert!(matches!(repo.ping(), Err(CoreError::Repository(_))));
    }

    #[tokio::test]
    async fn current_thread_runtime_is_rejected() {
        let err = MongoRepo::connect(UNREACHABLE).err().unwrap();
        assert!(matches!(err, CoreError::Repository(ref msg) if msg.contains("current-thread")));
    }

    #[test]
    fn owned_runtime_repo_drops_inside_another_runtime() {
        let repo = MongoRepo::connect(UNREACHABLE).unwrap();
        assert!(repo.rt.is_some());
        let outer = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .enable_all()
            .build()
            .unwrap();
        outer.block_on(async move { drop(repo) });
    }

    #[test]
    fn owned_runtime_repo_drops_inside_current_thread_runtime() {
        let repo = MongoRepo::connect(UNREACHABLE).unwrap();
        let outer = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        outer.block_on(async move { drop(repo) });
    }
}
