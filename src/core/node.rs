//! Build-graph nodes

use crate::error::Result;

/// A unit of work whose output is fully determined by its inputs
///
/// Two nodes with the same `cache_key` produce the same output, so callers
/// may reuse an earlier result instead of calling `compute` again.
pub trait BuildNode {
    type Output;

    /// Content hash over every input of this node
    fn cache_key(&self) -> String;

    fn compute(&self) -> Result<Self::Output>;
}
