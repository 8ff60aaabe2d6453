//! Record store contract and enrollment numbers.
//!
//! The hosted realtime database stays outside this crate; what the admin
//! flows need from it is a keyed read/write/delete contract. The
//! in-memory implementation backs tests and offline tooling.

use rand::Rng;
use std::collections::HashMap;

use crate::error::CardstockError;

/// Keyed store contract: values addressed by slash-separated path
/// strings, as the upstream realtime database does.
pub trait RecordStore {
    fn read(&self, path: &str) -> Option<String>;
    fn write(&mut self, path: &str, value: String);
    fn delete(&mut self, path: &str);

    fn exists(&self, path: &str) -> bool {
        self.read(path).is_some()
    }
}

/// In-memory store for tests and offline runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl RecordStore for MemoryStore {
    fn read(&self, path: &str) -> Option<String> {
        self.entries.get(path).cloned()
    }

    fn write(&mut self, path: &str, value: String) {
        self.entries.insert(path.to_string(), value);
    }

    fn delete(&mut self, path: &str) {
        self.entries.remove(path);
    }
}

/// Attempts before giving up on finding a free enrollment number.
const ENROLLMENT_ATTEMPTS: usize = 100;

/// Generate a unique enrollment number by drawing random four-digit
/// candidates and retrying until one is free under `enrollments/`.
pub fn generate_enrollment_number<S, R>(
    store: &S,
    prefix: &str,
    rng: &mut R,
) -> Result<String, CardstockError>
where
    S: RecordStore,
    R: Rng,
{
    for _ in 0..ENROLLMENT_ATTEMPTS {
        let candidate = format!("{prefix}{:04}", rng.random_range(0..10_000));
        if !store.exists(&format!("enrollments/{candidate}")) {
            return Ok(candidate);
        }
    }
    Err(CardstockError::Store(format!(
        "no free enrollment number under prefix {prefix:?} after {ENROLLMENT_ATTEMPTS} attempts"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let mut store = MemoryStore::default();
        store.write("students/1", "ASHA".into());
        assert_eq!(store.read("students/1").as_deref(), Some("ASHA"));
        assert!(store.exists("students/1"));
        store.delete("students/1");
        assert!(!store.exists("students/1"));
    }

    #[test]
    fn test_enrollment_number_has_prefix_and_four_digits() {
        let store = MemoryStore::default();
        let mut rng = rand::rng();
        let number = generate_enrollment_number(&store, "STU-", &mut rng).unwrap();
        assert!(number.starts_with("STU-"));
        assert_eq!(number.len(), "STU-".len() + 4);
    }

    #[test]
    fn test_enrollment_number_skips_taken_values() {
        let mut store = MemoryStore::default();
        // Occupy everything outside 5000..6000.
        for n in 0..10_000 {
            if !(5000..6000).contains(&n) {
                store.write(&format!("enrollments/S{n:04}"), "taken".into());
            }
        }
        let mut rng = rand::rng();
        let number = generate_enrollment_number(&store, "S", &mut rng).unwrap();
        let digits: u32 = number.strip_prefix('S').unwrap().parse().unwrap();
        assert!((5000..6000).contains(&digits));
        assert!(!store.exists(&format!("enrollments/{number}")));
    }

    #[test]
    fn test_enrollment_number_exhaustion_is_an_error() {
        let mut store = MemoryStore::default();
        for n in 0..10_000 {
            store.write(&format!("enrollments/S{n:04}"), "taken".into());
        }
        let mut rng = rand::rng();
        let err = generate_enrollment_number(&store, "S", &mut rng).unwrap_err();
        assert!(matches!(err, CardstockError::Store(_)));
    }
}
