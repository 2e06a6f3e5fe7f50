//! # quire-core: Foundational Types
//!
//! The leaf of the quire crate graph. Defines the read-only [`ContentUnit`]
//! snapshot every checker consumes and the [`Sequencer`] that puts
//! multi-part content (chapters) into reading order.
//!
//! ## Sequence Keys
//!
//! Chapter files carry their position as a Roman-numeral token embedded in
//! the filename (`13-chapter-iv-the-art-of-networking.xhtml`). The numeric
//! index prefix is *not* trusted: front matter and part dividers share the
//! same counter. The Sequencer decodes the `<prefix>-<numeral>` token and
//! sorts on it; names without a recognizable token get key `0` and sort
//! first.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `quire-*` crates.
//! - No `.unwrap()` outside tests.
//! - Everything here is synchronous and free of shared mutable state.

pub mod error;
pub mod roman;
pub mod sequence;
pub mod unit;

pub use error::{CoreError, CoreResult};
pub use roman::{decode_roman, ROMAN_NUMERALS};
pub use sequence::{Sequencer, DEFAULT_SEQUENCE_PREFIX};
pub use unit::{discover_unit_paths, ContentUnit};
