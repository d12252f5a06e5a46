//! Splitting oversized `in()` filters into several requests.

use std::collections::VecDeque;

use super::options::in_;
use crate::{Error, Result};

/// Longest serialized `in()` filter sent in a single request.
pub const FILTER_LENGTH_LIMIT: usize = 1950;

const IN_PREFIX: &str = "in(";

/// Ordered value subsets for one oversized `in()` filter.
///
/// Each subset drives its own paging sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ChunkPlan {
    field: String,
    subsets: VecDeque<Vec<String>>,
}

impl ChunkPlan {
    /// Inspect query parameters for an `in()` filter longer than the limit.
    ///
    /// # Errors
    ///
    /// More than one oversized filter is rejected with
    /// [`Error::InvalidInput`].
    pub(crate) fn detect(params: &[(String, String)]) -> Result<Option<Self>> {
        let mut oversized = params
            .iter()
            .filter(|(_, value)| value.len() > FILTER_LENGTH_LIMIT)
            .filter_map(|(field, value)| in_values(value).map(|values| (field, values)));

        let Some((field, values)) = oversized.next() else {
            return Ok(None);
        };
        if let Some((other, _)) = oversized.next() {
            return Err(Error::InvalidInput(format!(
                "Only one oversized in() filter can be split per query; both `{field}` and `{other}` exceed {FILTER_LENGTH_LIMIT} characters"
            )));
        }

        Ok(Some(Self::split(field.clone(), values)))
    }

    fn split(field: String, values: Vec<String>) -> Self {
        let longest = values.iter().map(String::len).max().unwrap_or(1).max(1);
        // Leave room for the `in()` wrapper and one separator per value.
        let budget = FILTER_LENGTH_LIMIT - IN_PREFIX.len() - 1;
        let per_subset = (budget / (longest + 1)).max(1);

        let subsets = values
            .chunks(per_subset)
            .map(<[String]>::to_vec)
            .collect();
        Self { field, subsets }
    }

    /// The filter field being chunked.
    pub(crate) fn field(&self) -> &str {
        &self.field
    }

    pub(crate) fn has_pending(&self) -> bool {
        !self.subsets.is_empty()
    }

    /// Next subset, serialized as an `in()` expression.
    pub(crate) fn next_filter(&mut self) -> Option<String> {
        self.subsets.pop_front().map(in_)
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.subsets.len()
    }
}

/// Values inside an `in(...)` expression, or `None` for other filters.
fn in_values(value: &str) -> Option<Vec<String>> {
    let start = value.find(IN_PREFIX)? + IN_PREFIX.len();
    let end = value.rfind(')').filter(|end| *end >= start)?;
    Some(
        value[start..end]
            .split(',')
            .map(str::to_string)
            .collect(),
    )
}

/// Replace `field` in `params` with `value`.
pub(crate) fn substitute(params: &mut [(String, String)], field: &str, value: String) {
    if let Some(param) = params.iter_mut().find(|(name, _)| name == field) {
        param.1 = value;
    }
}
