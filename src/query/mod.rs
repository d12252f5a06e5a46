//! Query engine: options, `in()` filter chunking and the paging stream.

mod chunk;
mod engine;
mod options;

pub use chunk::FILTER_LENGTH_LIMIT;
pub use engine::RecordStream;
pub use options::{
    in_, in_list, QueryOptions, OMIT_HEADER_NEXT_LINKS, PAGE_SIZE_OPTION, PAGING_OPTION,
};
pub(crate) use options::header_map;
