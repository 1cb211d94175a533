use crate::validate::{validate_name, validate_record};
use crate::{CoreError, IdGenerator, Record, RecordRepository};

/// Application service in front of a record repository.
///
/// It stays generic over the repository and the id generator so the same
/// code runs against the in-memory fake in tests and MongoDB in production.
/// Validation happens here, never inside the repositories.
pub struct RecordService<R: RecordRepository, G: IdGenerator> {
    repo: R,
    ids: G,
}

impl<R: RecordRepository, G: IdGenerator> RecordService<R, G> {
    pub fn new(repo: R, ids: G) -> Self {
        Self { repo, ids }
    }

    /// Create a record with a freshly generated id and persist it.
    pub fn register(&self, name: &str) -> Result<Record, CoreError> {
        validate_name(name)?;
        let record = Record::new(self.ids.next_id(), name);
        self.repo.save(record.clone())?;
        Ok(record)
    }

    /// Persist a caller-built record, replacing any record with the same id.
    pub fn save(&self, record: Record) -> Result<(), CoreError> {
        validate_record(&record)?;
        self.repo.save(record)
    }

    /// All stored records, sorted by id for stable presentation.
    pub fn list(&self) -> Result<Vec<Record>, CoreError> {
        let mut records = self.repo.find_all()?;
        records.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(records)
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }
}
