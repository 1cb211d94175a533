use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::{CoreError, Record, RecordRepository};

/// In-memory repository keyed by record id. Data lives as long as the value;
/// the internal mutex is the only concurrency control.
pub struct InMemoryRecordRepo {
    inner: Mutex<HashMap<String, Record>>,
}

impl InMemoryRecordRepo {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, Record>>, CoreError> {
        self.inner
            .lock()
            .map_err(|_| CoreError::Repository("mutex poisoned".into()))
    }
}

impl Default for InMemoryRecordRepo {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordRepository for InMemoryRecordRepo {
    fn save(&self, record: Record) -> Result<(), CoreError> {
        let mut map = self.lock()?;
        map.insert(record.id.clone(), record);
        Ok(())
    }

    fn find_all(&self) -> Result<Vec<Record>, CoreError> {
        let map = self.lock()?;
        Ok(map.values().cloned().collect())
    }
}
