//! Identifier index: normalized identifier to the rows carrying it.

use std::sync::Arc;

use indexmap::map::Entry;
use indexmap::IndexSet;

use super::cursor::{CursorRows, RowCursor};
use super::natural::natural_cmp;
use crate::storage::{open_backend, BackendKind, StorageBackend};
use crate::types::{identifier_of, Buckets, CacheError, CacheResult, IndexEntry, Position, Row};

/// Caller-supplied identifier normalization, applied on build and on lookup.
pub type Normalizer = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// What a call to [`IdentifierIndex::prime`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimeStats {
    /// Rows stored in a bucket.
    pub indexed: usize,
    /// Rows without the identifier field.
    pub skipped_missing: usize,
    /// Rows whose identifier was null, empty, or not a scalar.
    pub skipped_empty: usize,
    /// Rows dropped because multiple matches are disabled.
    pub dropped_duplicates: usize,
    /// Distinct identifiers stored.
    pub buckets: usize,
    /// The index was already primed; nothing was read.
    pub already_primed: bool,
}

impl PrimeStats {
    /// Rows that were read but not stored.
    pub fn skipped(&self) -> usize {
        self.skipped_missing + self.skipped_empty + self.dropped_duplicates
    }
}

/// Index of rows by the value of one designated field.
///
/// Built once per source with [`prime`](Self::prime); lookups never
/// re-read the source. Call [`clear`](Self::clear) before rebuilding.
pub struct IdentifierIndex {
    field: String,
    storage: Box<dyn StorageBackend>,
    allow_multiple_matches: bool,
    sort_before_index: bool,
    normalizer: Option<Normalizer>,
    primed: bool,
    last_stats: PrimeStats,
}

impl IdentifierIndex {
    /// Create an index over `field` stored in `storage`.
    pub fn new(field: impl Into<String>, storage: Box<dyn StorageBackend>) -> CacheResult<Self> {
        let field = field.into();
        if field.trim().is_empty() {
            return Err(CacheError::EmptyIdentifierField);
        }
        Ok(Self {
            field,
            storage,
            allow_multiple_matches: true,
            sort_before_index: false,
            normalizer: None,
            primed: false,
            last_stats: PrimeStats::default(),
        })
    }

    /// Create an index over `field` on the backend selected by `kind`.
    pub fn with_backend(field: impl Into<String>, kind: BackendKind) -> CacheResult<Self> {
        Self::new(field, open_backend(kind))
    }

    /// Create an index over `field` held in process memory.
    pub fn in_process(field: impl Into<String>) -> CacheResult<Self> {
        Self::with_backend(field, BackendKind::InProcess)
    }

    /// Keep every row per identifier (`true`, default) or only the first.
    pub fn allow_multiple_matches(mut self, allow: bool) -> Self {
        self.allow_multiple_matches = allow;
        self
    }

    /// Persist buckets in natural order of their identifiers.
    pub fn sort_before_index(mut self, sort: bool) -> Self {
        self.sort_before_index = sort;
        self
    }

    /// Normalize identifiers on both build and lookup.
    pub fn normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = Some(normalizer);
        self
    }

    /// The identifier field.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Whether the index has been primed since the last clear.
    pub fn is_primed(&self) -> bool {
        self.primed
    }

    /// Statistics from the last prime that actually read rows.
    pub fn last_stats(&self) -> &PrimeStats {
        &self.last_stats
    }

    /// Label of the active storage kind.
    pub fn backend_label(&self) -> &'static str {
        self.storage.label()
    }

    /// Build the index from a single pass over `rows`.
    ///
    /// A second call before [`clear`](Self::clear) reads nothing and
    /// returns stats with `already_primed` set.
    pub fn prime<I>(&mut self, rows: I) -> CacheResult<PrimeStats>
    where
        I: IntoIterator<Item = (Position, Row)>,
    {
        if self.primed {
            log::debug!("Index on '{}' already primed; skipping", self.field);
            return Ok(PrimeStats {
                already_primed: true,
                ..PrimeStats::default()
            });
        }
        let (buckets, stats) = self.build(rows);
        self.store(buckets, stats)
    }

    /// Build the index by draining `cursor`, then rewind it.
    ///
    /// A cursor error aborts the build before anything is stored.
    pub fn prime_cursor<C: RowCursor>(&mut self, cursor: &mut C) -> CacheResult<PrimeStats> {
        if self.primed {
            return self.prime(std::iter::empty());
        }
        let mut rows = CursorRows::new(cursor);
        let (buckets, stats) = self.build(&mut rows);
        if let Some(e) = rows.error.take() {
            return Err(e);
        }
        cursor.rewind()?;
        self.store(buckets, stats)
    }

    /// Rows whose identifier equals `identifier`, in bucket order.
    pub fn match_rows(&self, identifier: &str) -> CacheResult<Vec<Row>> {
        let Some(key) = self.normalize(identifier) else {
            return Ok(Vec::new());
        };
        Ok(self
            .storage
            .fetch(&key)?
            .map(|bucket| bucket.into_iter().map(|e| e.row).collect())
            .unwrap_or_default())
    }

    /// Rows matching any of `identifiers`, fetched in one backend call.
    ///
    /// Order across identifiers follows the backend and is not guaranteed.
    pub fn match_many<S: AsRef<str>>(&self, identifiers: &[S]) -> CacheResult<Vec<Row>> {
        let keys: Vec<String> = identifiers
            .iter()
            .filter_map(|id| self.normalize(id.as_ref()))
            .collect::<IndexSet<String>>()
            .into_iter()
            .collect();
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        Ok(flatten(self.storage.fetch_many(&keys)?))
    }

    /// Every indexed row, in storage iteration order.
    ///
    /// With `sort_before_index`, buckets come back in natural order of
    /// their identifiers even when the backend does not keep write order
    /// (a large Redis hash, for one).
    pub fn all_rows(&self) -> CacheResult<Vec<Row>> {
        let mut buckets = self.storage.all()?;
        if self.sort_before_index {
            buckets.sort_by(|a, _, b, _| natural_cmp(a, b));
        }
        Ok(flatten(buckets))
    }

    /// Number of distinct identifiers stored.
    pub fn count(&self) -> CacheResult<usize> {
        self.storage.count()
    }

    /// Drop the stored index and allow priming again.
    pub fn clear(&mut self) -> CacheResult<()> {
        self.storage.clear()?;
        self.primed = false;
        Ok(())
    }

    fn normalize(&self, raw: &str) -> Option<String> {
        let key = match &self.normalizer {
            Some(normalize) => normalize(raw),
            None => raw.to_string(),
        };
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    fn build<I>(&self, rows: I) -> (Buckets, PrimeStats)
    where
        I: IntoIterator<Item = (Position, Row)>,
    {
        let mut buckets = Buckets::new();
        let mut stats = PrimeStats::default();

        for (position, row) in rows {
            if !row.contains_key(&self.field) {
                stats.skipped_missing += 1;
                log::trace!("Row {position} has no '{}' field; skipped", self.field);
                continue;
            }
            let Some(key) = identifier_of(&row, &self.field).and_then(|id| self.normalize(&id))
            else {
                stats.skipped_empty += 1;
                log::trace!("Row {position} has an empty '{}'; skipped", self.field);
                continue;
            };
            match buckets.entry(key) {
                Entry::Occupied(mut bucket) => {
                    if self.allow_multiple_matches {
                        bucket.get_mut().push(IndexEntry::new(row, position));
                    } else {
                        stats.dropped_duplicates += 1;
                        continue;
                    }
                }
                Entry::Vacant(slot) => {
                    slot.insert(vec![IndexEntry::new(row, position)]);
                }
            }
            stats.indexed += 1;
        }

        if self.sort_before_index {
            buckets.sort_by(|a, _, b, _| natural_cmp(a, b));
        }
        stats.buckets = buckets.len();
        (buckets, stats)
    }

    fn store(&mut self, buckets: Buckets, stats: PrimeStats) -> CacheResult<PrimeStats> {
        if !buckets.is_empty() {
            self.storage.hydrate(buckets)?;
        }
        self.primed = true;
        log::info!(
            "Primed {} index on '{}': {} rows in {} buckets, {} skipped",
            self.storage.label(),
            self.field,
            stats.indexed,
            stats.buckets,
            stats.skipped()
        );
        self.last_stats = stats.clone();
        Ok(stats)
    }
}

fn flatten(buckets: Buckets) -> Vec<Row> {
    buckets
        .into_values()
        .flat_map(|bucket| bucket.into_iter().map(|e| e.row))
        .collect()
}
