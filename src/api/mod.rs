//! API service modules.
//!
//! Every dataset endpoint is served by the same [`DatasetService`].

mod datasets;

pub use datasets::{DatasetService, RECORD_COUNT_HEADER};
