//! Sequential IDs for scanned pages and the range expressions that regroup
//! them into documents. All state lives in filenames; every call recomputes
//! it from a directory listing.

pub mod archive;
pub mod cli;
pub mod commands;
pub mod config;
pub mod id_range;
pub mod mcp;
pub mod naming;
pub mod pdf;

pub use archive::alloc::{next_id, next_id_in, next_odd_id, next_odd_id_in, OddId};
pub use archive::assemble::{assemble, output_span};
pub use archive::resolve::{resolve, resolve_in, ResolvedPage};
pub use archive::Snapshot;
pub use id_range::{parse_ids, IdSpan, ParseError, RangeParser};
pub use naming::{FilenameCodec, ScanName};
