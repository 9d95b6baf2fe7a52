//! Channel-tagged frame decoding.
//!
//! A frame is a flat sequence of segments, each made of a two-byte tag
//! (channel, type) followed by a fixed-width value. The layout of the value
//! depends on the device family, so the walk itself knows nothing about
//! fields; it asks a [`TagTable`](crate::TagTable) for every tag it meets.
//!
//! The module follows the same layering as the rest of the crate:
//! - `layout`: tag and crawl widths (source of truth)
//! - `reader`: bounds-checked cursor over the raw bytes
//! - `parser`: the walk, applying the table's policies
//! - `error`: cursor errors, never surfaced past the parser
//!
//! Decoding is pure: no I/O, no shared state between frames.

pub mod error;
pub mod layout;
pub mod parser;
pub mod reader;

pub use parser::decode_frame;
pub use reader::ByteCursor;
