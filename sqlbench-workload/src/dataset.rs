//! The synthetic YCSB-style dataset.
//!
//! A [`Dataset`] is a table of `tuple_count` records, keyed densely by `[0, tuple_count)`. Each
//! record consists of `field_count` fields of exactly `field_width` alphanumeric ASCII bytes.
//!
//! The dataset is generated once, loaded into the database and then kept around as the oracle
//! that lookups are validated against. All records live in one contiguous buffer, so a field is
//! found with index arithmetic alone.

use std::ops::Range;

use rand::distr::{Alphanumeric, Distribution};

use crate::Key;
use crate::rng::{DEFAULT_SEED, Prng};

/// Errors that can occur when building a [`Dataset`].
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// Records would have no content.
    #[error("records need at least one field of at least one byte (got {fields} x {width})")]
    EmptyRecord {
        /// The configured number of fields.
        fields: usize,
        /// The configured field width.
        width: usize,
    },

    /// The dataset does not fit into the address space.
    #[error("dataset of {0} tuples does not fit into memory")]
    TooLarge(u64),
}

/// Parameters for generating a [`Dataset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DatasetParams {
    /// The number of records, and thus the size of the key space.
    pub tuple_count: u64,
    /// The number of fields per record, not counting the key.
    pub field_count: usize,
    /// The exact width of every field in bytes.
    pub field_width: usize,
    /// Seed for the content generator.
    pub seed: u64,
}

impl Default for DatasetParams {
    fn default() -> Self {
        Self {
            tuple_count: 100_000,
            field_count: 10,
            field_width: 100,
            seed: DEFAULT_SEED,
        }
    }
}

/// An immutable, generated table of fixed-width records.
pub struct Dataset {
    params: DatasetParams,
    record_bytes: usize,
    data: Vec<u8>,
}

impl Dataset {
    /// Generates the dataset described by `params`.
    pub fn build(params: DatasetParams) -> Result<Self, DatasetError> {
        let DatasetParams {
            tuple_count,
            field_count,
            field_width,
            seed,
        } = params;

        if field_count == 0 || field_width == 0 {
            return Err(DatasetError::EmptyRecord {
                fields: field_count,
                width: field_width,
            });
        }

        let record_bytes = field_count
            .checked_mul(field_width)
            .ok_or(DatasetError::TooLarge(tuple_count))?;
        let total_bytes = usize::try_from(tuple_count)
            .ok()
            .and_then(|tuples| tuples.checked_mul(record_bytes))
            .ok_or(DatasetError::TooLarge(tuple_count))?;

        let mut rng = Prng::new(seed);
        let data: Vec<u8> = Alphanumeric
            .sample_iter(&mut rng)
            .take(total_bytes)
            .collect();

        tracing::debug!(
            tuple_count,
            field_count,
            field_width,
            total_bytes,
            "generated dataset"
        );

        Ok(Self {
            params,
            record_bytes,
            data,
        })
    }

    /// The number of records.
    pub fn len(&self) -> u64 {
        self.params.tuple_count
    }

    /// Returns `true` if the dataset contains no records.
    pub fn is_empty(&self) -> bool {
        self.params.tuple_count == 0
    }

    /// The number of fields per record.
    pub fn field_count(&self) -> usize {
        self.params.field_count
    }

    /// The width of every field in bytes.
    pub fn field_width(&self) -> usize {
        self.params.field_width
    }

    /// The payload size of one record in bytes, excluding the key.
    pub fn record_bytes(&self) -> usize {
        self.record_bytes
    }

    /// The payload size of all records in bytes, excluding keys.
    pub fn total_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns the record stored under `key`.
    pub fn record(&self, key: Key) -> Option<Record<'_>> {
        if key >= self.len() {
            return None;
        }

        let start = key as usize * self.record_bytes;
        Some(Record {
            key,
            width: self.params.field_width,
            bytes: &self.data[start..start + self.record_bytes],
        })
    }

    /// Returns the contents of a single field, the oracle for lookups.
    pub fn lookup(&self, key: Key, field: usize) -> Option<&[u8]> {
        self.record(key)?.field(field)
    }

    /// Iterates all records in ascending key order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Record<'_>> {
        let width = self.params.field_width;
        self.data
            .chunks_exact(self.record_bytes)
            .enumerate()
            .map(move |(index, bytes)| Record {
                key: index as Key,
                width,
                bytes,
            })
    }

    /// Splits the key space into ascending ranges of at most `size` keys.
    ///
    /// A `size` of zero is treated as one.
    pub fn key_batches(&self, size: usize) -> impl Iterator<Item = Range<Key>> + use<> {
        let size = size.max(1) as u64;
        let len = self.len();
        (0..len.div_ceil(size)).map(move |batch| {
            let start = batch * size;
            start..(start + size).min(len)
        })
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A borrowed record of a [`Dataset`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Record<'a> {
    key: Key,
    width: usize,
    bytes: &'a [u8],
}

impl<'a> Record<'a> {
    /// The key of this record.
    pub fn key(&self) -> Key {
        self.key
    }

    /// Returns the field at `index`.
    pub fn field(&self, index: usize) -> Option<&'a [u8]> {
        let start = index.checked_mul(self.width)?;
        self.bytes.get(start..start + self.width)
    }

    /// Iterates all fields in column order.
    pub fn fields(&self) -> impl ExactSizeIterator<Item = &'a [u8]> + use<'a> {
        self.bytes.chunks_exact(self.width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(tuple_count: u64, field_count: usize, field_width: usize) -> DatasetParams {
        DatasetParams {
            tuple_count,
            field_count,
            field_width,
            seed: 17,
        }
    }

    #[test]
    fn deterministic_for_seed() {
        let a = Dataset::build(params(200, 4, 12)).unwrap();
        let b = Dataset::build(params(200, 4, 12)).unwrap();

        assert!(a.iter().zip(b.iter()).all(|(a, b)| a == b));

        let other = Dataset::build(DatasetParams {
            seed: 18,
            ..params(200, 4, 12)
        })
        .unwrap();
        assert_ne!(a.record(0), other.record(0));
    }

    #[test]
    fn fields_have_exact_width() {
        let dataset = Dataset::build(params(100, 10, 20)).unwrap();

        for record in dataset.iter() {
            assert_eq!(record.fields().len(), 10);
            for field in record.fields() {
                assert_eq!(field.len(), 20);
                assert!(field.iter().all(u8::is_ascii_alphanumeric));
            }
        }
        assert_eq!(dataset.total_bytes(), 100 * 10 * 20);
    }

    #[test]
    fn covers_key_space_in_order() {
        let dataset = Dataset::build(params(1000, 2, 3)).unwrap();
        assert_eq!(dataset.len(), 1000);

        let keys: Vec<_> = dataset.iter().map(|record| record.key()).collect();
        assert_eq!(keys, (0..1000).collect::<Vec<_>>());
    }

    #[test]
    fn lookup_returns_generated_fields() {
        let dataset = Dataset::build(params(300, 5, 8)).unwrap();

        for record in dataset.iter() {
            for (index, field) in record.fields().enumerate() {
                assert_eq!(dataset.lookup(record.key(), index), Some(field));
            }
        }

        assert_eq!(dataset.lookup(300, 0), None);
        assert_eq!(dataset.lookup(0, 5), None);
    }

    #[test]
    fn key_batches_cover_all_keys() {
        let dataset = Dataset::build(params(10, 1, 1)).unwrap();

        let batches: Vec<_> = dataset.key_batches(4).collect();
        assert_eq!(batches, vec![0..4, 4..8, 8..10]);

        assert_eq!(dataset.key_batches(0).count(), 10);
        assert_eq!(dataset.key_batches(100).collect::<Vec<_>>(), vec![0..10]);
    }

    #[test]
    fn empty_dataset() {
        let dataset = Dataset::build(params(0, 3, 3)).unwrap();
        assert!(dataset.is_empty());
        assert_eq!(dataset.iter().count(), 0);
        assert_eq!(dataset.key_batches(10).count(), 0);
    }

    #[test]
    fn rejects_empty_records() {
        assert!(matches!(
            Dataset::build(params(10, 0, 10)),
            Err(DatasetError::EmptyRecord { .. })
        ));
        assert!(matches!(
            Dataset::build(params(10, 10, 0)),
            Err(DatasetError::EmptyRecord { .. })
        ));
    }
}
