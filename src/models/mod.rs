//! Data models shared by the client, the query engine and export adapters.

mod link;
mod primitives;

pub use link::{parse_link_header, ContinuationLink, LinkDescriptor};
pub use primitives::{Database, DatasetName, Record};
