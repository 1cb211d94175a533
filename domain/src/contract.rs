//! Shared contract suite for [`RecordRepository`] implementations.
//!
//! Each scenario is written once as a generic function and expects a fresh,
//! empty repository. Implementations run all of them through
//! [`record_repository_contract!`](crate::record_repository_contract):
//!
//! ```ignore
//! mod in_memory {
//!     domain::record_repository_contract!(domain::adapters::memory_repo::InMemoryRecordRepo::new());
//! }
//! ```
//!
//! The factory expression is evaluated once per test, so every scenario
//! starts from an empty store.

use crate::{Record, RecordRepository};

/// A record with a freshly generated unique id and a fixed name.
pub fn fresh_record(name: &str) -> Record {
    Record::new(uuid::Uuid::new_v4().to_string(), name)
}

fn sorted(mut records: Vec<Record>) -> Vec<Record> {
    records.sort_by(|a, b| a.id.cmp(&b.id));
    records
}

pub fn inserts_and_finds_all<R: RecordRepository>(repo: &R) {
    let record = fresh_record("Joe");

    repo.save(record.clone()).expect("save");

    assert_eq!(repo.find_all().expect("find_all"), vec![record]);
}

pub fn finds_the_concrete_record<R: RecordRepository>(repo: &R) {
    repo.save(Record::new("abc-123", "Joe")).expect("save");

    assert_eq!(
        repo.find_all().expect("find_all"),
        vec![Record::new("abc-123", "Joe")]
    );
}

pub fn finds_nothing_when_empty<R: RecordRepository>(repo: &R) {
    assert_eq!(repo.find_all().expect("find_all"), Vec::<Record>::new());
}

pub fn finds_every_distinct_record<R: RecordRepository>(repo: &R) {
    let first = fresh_record("Joe");
    let second = fresh_record("Ann");

    repo.save(first.clone()).expect("save first");
    repo.save(second.clone()).expect("save second");

    assert_eq!(
        sorted(repo.find_all().expect("find_all")),
        sorted(vec![first, second])
    );
}

pub fn repeated_reads_agree<R: RecordRepository>(repo: &R) {
    repo.save(fresh_record("Joe")).expect("save first");
    repo.save(fresh_record("Ann")).expect("save second");

    let first_read = sorted(repo.find_all().expect("first find_all"));
    let second_read = sorted(repo.find_all().expect("second find_all"));

    assert_eq!(first_read.len(), 2);
    assert_eq!(first_read, second_read);
}

pub fn save_overwrites_same_id<R: RecordRepository>(repo: &R) {
    let original = fresh_record("Joe");
    let renamed = Record::new(original.id.clone(), "Joseph");

    repo.save(original).expect("save original");
    repo.save(renamed.clone()).expect("save renamed");

    assert_eq!(repo.find_all().expect("find_all"), vec![renamed]);
}

/// Runs the round-trip scenario against two empty repositories and checks
/// that both report the same contents afterwards.
pub fn same_results<A: RecordRepository, B: RecordRepository>(a: &A, b: &B) {
    let record = fresh_record("Joe");

    a.save(record.clone()).expect("save into first repository");
    b.save(record.clone()).expect("save into second repository");

    let from_a = sorted(a.find_all().expect("first find_all"));
    let from_b = sorted(b.find_all().expect("second find_all"));

    assert_eq!(from_a, vec![record]);
    assert_eq!(from_a, from_b);
}

/// Generates one `#[test]` per contract scenario for the repository built
/// by `$make`.
#[macro_export]
macro_rules! record_repository_contract {
    ($make:expr) => {
        #[test]
        fn inserts_and_finds_all() {
            $crate::contract::inserts_and_finds_all(&$make);
        }

        #[test]
        fn finds_the_concrete_record() {
            $crate::contract::finds_the_concrete_record(&$make);
        }

        #[test]
        fn finds_nothing_when_empty() {
            $crate::contract::finds_nothing_when_empty(&$make);
        }

        #[test]
        fn finds_every_distinct_record() {
            $crate::contract::finds_every_distinct_record(&$make);
        }

        #[test]
        fn repeated_reads_agree() {
            $crate::contract::repeated_reads_agree(&$make);
        }

        #[test]
        fn save_overwrites_same_id() {
            $crate::contract::save_overwrites_same_id(&$make);
        }
    };
}
