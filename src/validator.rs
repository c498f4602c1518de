//! Field-keyed validation error collection.
//!
//! Checks never short-circuit: every violated constraint is recorded so the
//! caller can report them all at once. Each field keeps only its first
//! message.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::hash::Hash;

use crate::error::Error;

/// Violated-field messages, ordered by field name.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Validator {
        Validator::default()
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Record a message for a field. The first message wins; later ones for
    /// the same field are dropped.
    pub fn add_error(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    /// Record `message` under `field` when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: &str) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }

    /// Consume the validator: `Ok` when nothing failed, otherwise the
    /// collected field errors.
    pub fn finish(self) -> Result<(), Error> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(Error::Validation(self.errors))
        }
    }
}

/// True when `value` is one of `list`.
pub fn permitted(value: &str, list: &[&str]) -> bool {
    list.contains(&value)
}

/// True when no value occurs twice.
pub fn unique<T: Eq + Hash>(values: &[T]) -> bool {
    let distinct: HashSet<&T> = values.iter().collect();
    distinct.len() == values.len()
}
