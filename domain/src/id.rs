//! Id generation strategies.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::IdGenerator;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Encode an unsigned 64-bit integer in base62 (0-9, A-Z, a-z).
fn encode_base62(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::with_capacity(11);
    while n > 0 {
        digits.push(ALPHABET[(n % 62) as usize] as char);
        n /= 62;
    }
    digits.iter().rev().collect()
}

/// Issues `<prefix>-<base62 counter>` ids. Unique within one generator only;
/// seed `start` past any ids already in the store when sharing a backend.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new<S: Into<String>>(prefix: S, start: u64) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(start),
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.prefix, encode_base62(n))
    }
}
