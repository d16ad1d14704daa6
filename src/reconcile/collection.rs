use super::OrderedRecord;
use crate::core::CvError;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("index {index} is out of bounds for a list of {len} records")]
    OutOfBounds { index: usize, len: usize },
}

impl From<EditError> for CvError {
    fn from(err: EditError) -> Self {
        CvError::validation("index", err.to_string())
    }
}

/// An ordered list of records being edited in memory.
///
/// The position of a record in the list is its display order. Nothing here
/// talks to the store; the list is persisted by [`super::reconcile`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct EditedCollection<T> {
    records: Vec<OrderedRecord<T>>,
}

impl<T> Default for EditedCollection<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T> EditedCollection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<OrderedRecord<T>>) -> Self {
        Self { records }
    }

    /// Adds a new, unsaved record at the end and returns its index.
    pub fn append(&mut self, payload: T) -> usize {
        self.records.push(OrderedRecord::new(payload));
        self.records.len() - 1
    }

    /// Swaps the payload at `index`, keeping the record's identity.
    pub fn replace(&mut self, index: usize, payload: T) -> Result<(), EditError> {
        let len = self.records.len();
        let record = self
            .records
            .get_mut(index)
            .ok_or(EditError::OutOfBounds { index, len })?;
        record.payload = payload;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<OrderedRecord<T>, EditError> {
        self.check(index)?;
        Ok(self.records.remove(index))
    }

    /// Moves the record at `from` so that it ends up at `to`.
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<(), EditError> {
        self.check(from)?;
        self.check(to)?;
        if from != to {
            let record = self.records.remove(from);
            self.records.insert(to, record);
        }
        Ok(())
    }

    pub fn get(&self, index: usize) -> Option<&OrderedRecord<T>> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[OrderedRecord<T>] {
        &self.records
    }

    pub fn into_records(self) -> Vec<OrderedRecord<T>> {
        self.records
    }

    fn check(&self, index: usize) -> Result<(), EditError> {
        if index < self.records.len() {
            Ok(())
        } else {
            Err(EditError::OutOfBounds {
                index,
                len: self.records.len(),
            })
        }
    }
}
