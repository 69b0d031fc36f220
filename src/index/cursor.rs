//! Sequential row cursors consumed by the indexers.

use crate::types::{CacheResult, Position, Row};

/// A rewindable, single-pass source of positioned rows.
///
/// Format parsers implement this; the indexers only ever read forward and
/// rewind once when done.
pub trait RowCursor {
    /// The next row and its position, or `None` at the end.
    fn next_row(&mut self) -> CacheResult<Option<(Position, Row)>>;

    /// Move back to the first row.
    fn rewind(&mut self) -> CacheResult<()>;
}

/// A cursor over rows already held in memory.
#[derive(Debug, Clone, Default)]
pub struct VecCursor {
    rows: Vec<(Position, Row)>,
    next: usize,
}

impl VecCursor {
    /// A cursor over explicitly positioned rows.
    pub fn new(rows: Vec<(Position, Row)>) -> Self {
        Self { rows, next: 0 }
    }

    /// A cursor numbering `rows` consecutively from `first_position`.
    pub fn numbered(rows: Vec<Row>, first_position: Position) -> Self {
        Self::new(
            rows.into_iter()
                .zip(first_position..)
                .map(|(row, pos)| (pos, row))
                .collect(),
        )
    }

    /// Whether the cursor is at its first row.
    pub fn at_start(&self) -> bool {
        self.next == 0
    }

    /// Number of rows behind the cursor.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the cursor has no rows at all.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl RowCursor for VecCursor {
    fn next_row(&mut self) -> CacheResult<Option<(Position, Row)>> {
        let row = self.rows.get(self.next).cloned();
        if row.is_some() {
            self.next += 1;
        }
        Ok(row)
    }

    fn rewind(&mut self) -> CacheResult<()> {
        self.next = 0;
        Ok(())
    }
}

/// Drains a cursor as an iterator, stopping at the first error.
///
/// The error, if any, is kept in `error` for the caller to surface.
pub struct CursorRows<'a, C: RowCursor> {
    cursor: &'a mut C,
    /// First error hit while reading.
    pub error: Option<crate::types::CacheError>,
}

impl<'a, C: RowCursor> CursorRows<'a, C> {
    /// Iterate the remaining rows of `cursor`.
    pub fn new(cursor: &'a mut C) -> Self {
        Self {
            cursor,
            error: None,
        }
    }
}

impl<C: RowCursor> Iterator for CursorRows<'_, C> {
    type Item = (Position, Row);

    fn next(&mut self) -> Option<Self::Item> {
        if self.error.is_some() {
            return None;
        }
        match self.cursor.next_row() {
            Ok(row) => row,
            Err(e) => {
                self.error = Some(e);
                None
            }
        }
    }
}
