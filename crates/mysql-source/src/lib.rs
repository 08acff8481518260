//! Row fetching for the posting emulator.
//!
//! Every iteration reads the row at one ordinal position from each of the
//! three source tables. The lookup is positional (`LIMIT K, 1`), not keyed:
//! the row at position K is whatever the database returns at that offset
//! under its own, unspecified ordering. An offset past the end of a table
//! yields an empty [`Record`](emulator_types::Record), never an error.
//!
//! - [`MySqlRowFetcher`]: opens one connection per fetch and releases it
//!   before returning
//! - [`MemoryRowFetcher`]: the same semantics over in-memory tables

pub mod convert;
pub mod error;
pub mod fetcher;
pub mod memory;
pub mod mysql;

pub use error::FetchError;
pub use fetcher::{RowFetcher, SourceTables};
pub use memory::MemoryRowFetcher;
pub use mysql::{sanitize_connection_string, MySqlRowFetcher};
