//! Zone index: groups row positions into fixed-size contiguous zones.
//!
//! Two maps are kept: identifier key to position, and position to zone.
//! Rows themselves are not stored; callers re-read a whole zone from the
//! source when they need it.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use super::cursor::RowCursor;
use crate::types::{identifier_of, CacheResult, Position, ZONE_SIZE_MEDIUM, ZONE_SIZE_SMALL};

/// How identifiers are keyed in the identifier-to-position map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ZoneKeyMode {
    /// CRC-32 of the identifier. Bounds key size; distinct identifiers may
    /// collide, in which case the later position wins.
    #[default]
    Checksum,
    /// The identifier string itself. Collision-free, larger keys.
    Verbatim,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ZoneKey {
    Checksum(u32),
    Verbatim(String),
}

/// Maps positions to zones and identifiers to positions.
#[derive(Debug)]
pub struct ZoneIndexer {
    /// Positions per zone.
    cache_size: u64,
    /// Position of the first row.
    offset: u64,
    mode: ZoneKeyMode,
    /// identifier key -> position.
    hashed_index: HashMap<ZoneKey, Position>,
    /// position -> zone.
    zones: BTreeMap<Position, u64>,
}

impl ZoneIndexer {
    /// Create an indexer grouping `cache_size` positions per zone.
    pub fn new(cache_size: u64) -> Self {
        if cache_size == 0 {
            log::warn!("Zone size of 0 requested; using 1");
        }
        Self {
            cache_size: cache_size.max(1),
            offset: 0,
            mode: ZoneKeyMode::default(),
            hashed_index: HashMap::new(),
            zones: BTreeMap::new(),
        }
    }

    /// Indexer with the default (medium) zone size.
    pub fn medium() -> Self {
        Self::new(ZONE_SIZE_MEDIUM)
    }

    /// Indexer with the small zone size, for very wide rows.
    pub fn small() -> Self {
        Self::new(ZONE_SIZE_SMALL)
    }

    /// Set the position of the first row (zone 0 starts there).
    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Set how identifiers are keyed.
    pub fn with_key_mode(mut self, mode: ZoneKeyMode) -> Self {
        self.mode = mode;
        self
    }

    /// Positions per zone.
    pub fn cache_size(&self) -> u64 {
        self.cache_size
    }

    /// Build both maps from one pass over `cursor`, then rewind it.
    ///
    /// Does nothing if the index already has entries. Returns the number
    /// of rows indexed. A cursor error leaves the index empty, so the
    /// build can be retried. Rows positioned before the offset are skipped.
    pub fn init<C: RowCursor>(
        &mut self,
        cursor: &mut C,
        identifier_field: &str,
    ) -> CacheResult<usize> {
        if !self.is_empty() {
            log::debug!("Zone index already built; skipping");
            return Ok(0);
        }

        let mut hashed_index = HashMap::new();
        let mut zones = BTreeMap::new();
        while let Some((position, row)) = cursor.next_row()? {
            let Some(identifier) = identifier_of(&row, identifier_field) else {
                continue;
            };
            let Some(zone) = self.zone_for(position) else {
                log::warn!(
                    "Row {position} precedes zone offset {}; not indexed",
                    self.offset
                );
                continue;
            };
            zones.insert(position, zone);
            if let Some(previous) = hashed_index.insert(self.key(&identifier), position) {
                log::debug!(
                    "Zone key for '{identifier}' moved from position {previous} to {position}"
                );
            }
        }
        cursor.rewind()?;

        let indexed = zones.len();
        self.zones = zones;
        self.hashed_index = hashed_index;
        log::info!(
            "Zone index on '{identifier_field}': {indexed} rows in {} zones of {}",
            self.zone_count(),
            self.cache_size
        );
        Ok(indexed)
    }

    /// Forget one row, e.g. after it was deleted from the source.
    pub fn remove_entry(&mut self, identifier: &str, position: Position) {
        self.zones.remove(&position);
        let key = self.key(identifier);
        self.hashed_index.remove(&key);
    }

    /// Position recorded for `identifier`.
    pub fn position_of(&self, identifier: &str) -> Option<Position> {
        self.hashed_index.get(&self.key(identifier)).copied()
    }

    /// Zone recorded for `position`.
    pub fn zone_of(&self, position: Position) -> Option<u64> {
        self.zones.get(&position).copied()
    }

    /// Every recorded position in `zone`, ascending.
    ///
    /// Scans the whole position map.
    pub fn positions_in_zone(&self, zone: u64) -> Vec<Position> {
        self.zones
            .iter()
            .filter(|(_, &z)| z == zone)
            .map(|(&position, _)| position)
            .collect()
    }

    /// Number of distinct zones with at least one position.
    pub fn zone_count(&self) -> usize {
        self.zones.values().collect::<BTreeSet<_>>().len()
    }

    /// Number of recorded positions.
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Whether nothing has been indexed.
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty() && self.hashed_index.is_empty()
    }

    /// Drop both maps so the index can be rebuilt.
    pub fn clear(&mut self) {
        self.zones.clear();
        self.hashed_index.clear();
    }

    fn zone_for(&self, position: Position) -> Option<u64> {
        position
            .checked_sub(self.offset)
            .map(|relative| relative / self.cache_size)
    }

    fn key(&self, identifier: &str) -> ZoneKey {
        match self.mode {
            ZoneKeyMode::Checksum => ZoneKey::Checksum(crc32fast::hash(identifier.as_bytes())),
            ZoneKeyMode::Verbatim => ZoneKey::Verbatim(identifier.to_string()),
        }
    }
}

impl Default for ZoneIndexer {
    fn default() -> Self {
        Self::medium()
    }
}
