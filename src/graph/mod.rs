//! Graph algorithms over molecule graphs.

use petgraph::graph::{EdgeReference, IndexType, NodeIndex};
use petgraph::visit::EdgeRef;

pub mod algo;

pub use algo::*;

/// The endpoint of an edge that isn't `node`.
#[inline]
pub fn other_end<E, Ix: IndexType>(edge: &EdgeReference<'_, E, Ix>, node: NodeIndex<Ix>) -> NodeIndex<Ix> {
    if edge.source() == node {
        edge.target()
    } else {
        edge.source()
    }
}
