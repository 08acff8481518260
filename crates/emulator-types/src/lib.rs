//! Record and value types shared by the posting emulator crates.
//!
//! A [`Record`] is one row fetched from one [`Source`] table. Records flow from
//! the row fetcher to the emitter unchanged; the only transformation applied on
//! the way out is the JSON encoding policy in [`encode`], which renders
//! temporal values as ISO-8601 strings.
//!
//! # Structure
//!
//! - `value`: scalar column values ([`Value`])
//! - `record`: ordered column-name-to-value mapping ([`Record`]) and the
//!   per-iteration triple ([`SourceRecords`])
//! - `source`: the three logical sources and the sample key
//! - `encode`: `Value`/`Record` → `serde_json::Value`

pub mod encode;
pub mod record;
pub mod source;
pub mod value;

pub use encode::{encode_record, encode_value, to_json_vec, SerializationError};
pub use record::{Record, SourceRecords};
pub use source::{SampleKey, Source};
pub use value::Value;
