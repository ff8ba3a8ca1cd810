// Touched/error bookkeeping shared by the wizard steps.
//
// Errors are always computed, but only *shown* once the field has been touched, so a
// fresh form does not open covered in red.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

#[derive(Debug, Clone)]
pub struct FieldTracker<F> {
    touched: HashSet<F>,
    errors: HashMap<F, String>,
}

impl<F> Default for FieldTracker<F> {
    fn default() -> Self {
        Self {
            touched: HashSet::new(),
            errors: HashMap::new(),
        }
    }
}

impl<F: Copy + Eq + Hash> FieldTracker<F> {
    pub fn touch(&mut self, field: F) {
        self.touched.insert(field);
    }

    pub fn is_touched(&self, field: F) -> bool {
        self.touched.contains(&field)
    }

    /// Record the outcome of validating one field.
    pub fn record(&mut self, field: F, outcome: anyhow::Result<()>) {
        match outcome {
            Ok(()) => {
                self.errors.remove(&field);
            }
            Err(e) => {
                self.errors.insert(field, e.to_string());
            }
        }
    }

    pub fn clear(&mut self, field: F) {
        self.errors.remove(&field);
    }

    /// The error to render under `field`, if it has been touched.
    pub fn visible_error(&self, field: F) -> Option<&str> {
        if !self.is_touched(field) {
            return None;
        }
        self.errors.get(&field).map(String::as_str)
    }

    pub fn error(&self, field: F) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn reset(&mut self) {
        self.touched.clear();
        self.errors.clear();
    }
}
