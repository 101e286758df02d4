//! # ffire-wire
//!
//! The wire-format contract: bounds-checked buffer cursors, the
//! canonical struct field order, the reference encoder/decoder, and the
//! `WireError` taxonomy every emitted codec's error model maps onto.
//!
//! This crate provides:
//! - Bounds-checked read/write cursors ([`buffer::ReadCursor`],
//!   [`buffer::WriteCursor`]) plus a cache-aligned pooled buffer for
//!   callers that want pre-sized allocation targets
//! - The single canonical field-order comparator ([`order`]), shared by
//!   the reference codec below and the code generator's planner
//! - The reference `encode_value`/`decode_value` pair ([`codec`]),
//!   the ground truth every target-language emitter's output is checked
//!   against
//! - [`error::WireError`], the shared failure taxonomy

pub mod buffer;
pub mod codec;
pub mod error;
pub mod order;

pub use buffer::{AlignedBuffer, BufferPool, ReadCursor, WriteCursor};
pub use codec::{decode_message, decode_message_strict, decode_value, encode_message, encode_value, Value};
pub use error::WireError;
pub use order::{canonical_order, compare_fields, reorder_fields};
