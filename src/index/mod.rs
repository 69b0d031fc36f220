//! Index structures for row lookup: the identifier index and the zone index.

pub mod cursor;
pub mod identifier_index;
pub mod natural;
pub mod zone_index;

pub use cursor::{CursorRows, RowCursor, VecCursor};
pub use identifier_index::{IdentifierIndex, Normalizer, PrimeStats};
pub use natural::natural_cmp;
pub use zone_index::{ZoneIndexer, ZoneKeyMode};
