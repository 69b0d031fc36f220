//! Item buffers: ordered output accumulated across a run.

pub mod factory;
pub mod item_buffer;

pub use factory::ItemBufferFactory;
pub use item_buffer::{ordinal_field, ItemBuffer, Items};
