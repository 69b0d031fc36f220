//! Phase 3 tests: zone indexing over row cursors.

use serde_json::json;

use rowcache::types::{row_from, Position, Row};
use rowcache::{
    CacheConfig, CacheError, CacheResult, IdentifierIndex, RowCursor, VecCursor, ZoneIndexer,
    ZoneKeyMode, ZONE_SIZE_MEDIUM, ZONE_SIZE_SMALL,
};

// ==================== Helpers ====================

fn row(id: &str) -> Row {
    row_from([("id", json!(id)), ("payload", json!("x"))])
}

/// Rows "r0".."r{count-1}" numbered from `first`.
fn cursor(count: usize, first: Position) -> VecCursor {
    VecCursor::numbered((0..count).map(|i| row(&format!("r{i}"))).collect(), first)
}

/// Yields `good` rows, then fails.
struct FailingCursor {
    good: usize,
    read: usize,
    rewound: bool,
}

impl RowCursor for FailingCursor {
    fn next_row(&mut self) -> CacheResult<Option<(Position, Row)>> {
        if self.read == self.good {
            return Err(CacheError::Codec("truncated record".to_string()));
        }
        self.read += 1;
        Ok(Some((self.read as Position, row(&format!("r{}", self.read)))))
    }

    fn rewind(&mut self) -> CacheResult<()> {
        self.read = 0;
        self.rewound = true;
        Ok(())
    }
}

// ==================== Zone assignment ====================

#[test]
fn test_zones_from_offset() {
    let mut zones = ZoneIndexer::new(2).with_offset(1);
    let indexed = zones.init(&mut cursor(4, 1), "id").unwrap();

    assert_eq!(indexed, 4);
    let assigned: Vec<u64> = (1..=4).map(|p| zones.zone_of(p).unwrap()).collect();
    assert_eq!(assigned, vec![0, 0, 1, 1]);
    assert_eq!(zones.zone_count(), 2);
}

#[test]
fn test_zone_is_position_over_size() {
    let mut zones = ZoneIndexer::new(3);
    zones.init(&mut cursor(10, 0), "id").unwrap();

    for p in 0..10u64 {
        assert_eq!(zones.zone_of(p), Some(p / 3));
    }
    assert_eq!(zones.zone_count(), 4);
    assert_eq!(zones.positions_in_zone(1), vec![3, 4, 5]);
    assert_eq!(zones.positions_in_zone(3), vec![9]);
    assert!(zones.positions_in_zone(4).is_empty());
}

#[test]
fn test_identifier_lookup() {
    let mut zones = ZoneIndexer::small();
    zones.init(&mut cursor(20, 100), "id").unwrap();

    assert_eq!(zones.position_of("r0"), Some(100));
    assert_eq!(zones.position_of("r19"), Some(119));
    assert_eq!(zones.position_of("nope"), None);
    assert_eq!(zones.len(), 20);
}

#[test]
fn test_rows_without_identifier_are_skipped() {
    let rows = vec![
        (0, row("a")),
        (1, row_from([("payload", json!("no id"))])),
        (2, row_from([("id", json!(""))])),
        (3, row("b")),
    ];
    let mut zones = ZoneIndexer::new(10);
    assert_eq!(zones.init(&mut VecCursor::new(rows), "id").unwrap(), 2);
    assert_eq!(zones.zone_of(1), None);
    assert_eq!(zones.zone_of(3), Some(0));
}

// ==================== Lifecycle ====================

#[test]
fn test_init_rewinds_cursor() {
    let mut rows = cursor(5, 0);
    let mut zones = ZoneIndexer::medium();
    zones.init(&mut rows, "id").unwrap();
    assert!(rows.at_start());

    // The same cursor can feed the identifier index afterwards.
    let mut index = IdentifierIndex::in_process("id").unwrap();
    assert_eq!(index.prime_cursor(&mut rows).unwrap().indexed, 5);
}

#[test]
fn test_init_is_idempotent() {
    let mut zones = ZoneIndexer::new(2);
    zones.init(&mut cursor(4, 0), "id").unwrap();
    assert_eq!(zones.init(&mut cursor(50, 0), "id").unwrap(), 0);
    assert_eq!(zones.len(), 4);

    zones.clear();
    assert!(zones.is_empty());
    assert_eq!(zones.init(&mut cursor(50, 0), "id").unwrap(), 50);
}

#[test]
fn test_remove_entry() {
    let mut zones = ZoneIndexer::new(2);
    zones.init(&mut cursor(4, 0), "id").unwrap();

    zones.remove_entry("r1", 1);
    assert_eq!(zones.zone_of(1), None);
    assert_eq!(zones.position_of("r1"), None);
    assert_eq!(zones.positions_in_zone(0), vec![0]);
    assert_eq!(zones.len(), 3);

    // Unknown entries are ignored.
    zones.remove_entry("missing", 999);
    assert_eq!(zones.len(), 3);
}

#[test]
fn test_cursor_error_propagates() {
    let mut failing = FailingCursor {
        good: 3,
        read: 0,
        rewound: false,
    };
    let mut zones = ZoneIndexer::new(2);
    let result = zones.init(&mut failing, "id");
    assert!(matches!(result, Err(CacheError::Codec(_))));
    assert!(!failing.rewound);

    // Nothing from the failed pass is kept, so a retry builds the whole index.
    assert!(zones.is_empty());
    assert_eq!(zones.position_of("r1"), None);
    assert_eq!(zones.init(&mut cursor(10, 0), "id").unwrap(), 10);
    assert_eq!(zones.len(), 10);
    assert_eq!(zones.position_of("r7"), Some(7));
}

#[test]
fn test_rows_before_offset_are_not_indexed() {
    let mut zones = ZoneIndexer::new(2).with_offset(5);
    assert_eq!(zones.init(&mut cursor(8, 0), "id").unwrap(), 3);

    for p in 0..5 {
        assert_eq!(zones.zone_of(p), None);
    }
    assert_eq!(zones.position_of("r4"), None);
    assert_eq!(zones.positions_in_zone(0), vec![5, 6]);
    assert_eq!(zones.positions_in_zone(1), vec![7]);
}

#[test]
fn test_identifier_index_cursor_error_stores_nothing() {
    let mut failing = FailingCursor {
        good: 2,
        read: 0,
        rewound: false,
    };
    let mut index = IdentifierIndex::in_process("id").unwrap();
    assert!(index.prime_cursor(&mut failing).is_err());
    assert!(!index.is_primed());
    assert_eq!(index.count().unwrap(), 0);
}

// ==================== Key modes and sizes ====================

#[test]
fn test_checksum_collision_keeps_last_position() {
    // "plumless" and "buckeroo" share a CRC-32.
    assert_eq!(
        crc32fast::hash(b"plumless"),
        crc32fast::hash(b"buckeroo")
    );
    let rows = vec![(0, row("plumless")), (1, row("buckeroo"))];

    let mut checksum = ZoneIndexer::new(10);
    checksum.init(&mut VecCursor::new(rows.clone()), "id").unwrap();
    assert_eq!(checksum.position_of("plumless"), Some(1));

    let mut verbatim = ZoneIndexer::new(10).with_key_mode(ZoneKeyMode::Verbatim);
    verbatim.init(&mut VecCursor::new(rows), "id").unwrap();
    assert_eq!(verbatim.position_of("plumless"), Some(0));
    assert_eq!(verbatim.position_of("buckeroo"), Some(1));
}

#[test]
fn test_named_sizes() {
    assert_eq!(ZoneIndexer::medium().cache_size(), ZONE_SIZE_MEDIUM);
    assert_eq!(ZoneIndexer::small().cache_size(), ZONE_SIZE_SMALL);
    assert_eq!(ZoneIndexer::default().cache_size(), ZONE_SIZE_MEDIUM);
    assert_eq!(ZoneIndexer::new(0).cache_size(), 1);

    let config = CacheConfig {
        zone_size: 7,
        ..CacheConfig::default()
    };
    assert_eq!(config.zone_indexer().cache_size(), 7);
}
