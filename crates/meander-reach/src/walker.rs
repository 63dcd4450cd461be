//! Downstream walk through the segment network.

use crate::{HucLevel, NetworkIssue, NodeId, ReachError, Result, SegmentCatalog, SegmentId};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Ordered segment identifiers of one reach, upstream first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReachChain(Vec<SegmentId>);

impl ReachChain {
    pub fn new(ids: Vec<SegmentId>) -> Self {
        Self(ids)
    }

    pub fn ids(&self) -> &[SegmentId] {
        &self.0
    }

    /// First (most upstream) segment.
    pub fn start(&self) -> Option<SegmentId> {
        self.0.first().copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.0.iter().copied()
    }
}

/// Follow the network downstream from `start`.
///
/// The walk is restricted to segments sharing the start segment's unit at
/// `level`. From the current segment it looks for the segment whose
/// `from_node` equals the current `to_node`. No match ends the reach (the
/// network boundary is a normal terminal condition). More than one match,
/// a revisit, or exceeding `max_len` segments fails with
/// [`ReachError::NetworkInconsistency`].
pub fn walk(
    catalog: &SegmentCatalog,
    start: SegmentId,
    level: HucLevel,
    max_len: Option<usize>,
) -> Result<ReachChain> {
    let start_segment = catalog.lookup(start)?;
    let unit = start_segment.unit(level)?;

    // from_node -> segments starting there, in catalog order
    let mut successors: HashMap<NodeId, Vec<SegmentId>> = HashMap::new();
    for segment in catalog.in_unit(unit, level) {
        successors.entry(segment.from_node).or_default().push(segment.id);
    }

    let mut chain = Vec::new();
    let mut visited = HashSet::new();
    let mut current = start_segment;

    loop {
        if !visited.insert(current.id) {
            return Err(ReachError::NetworkInconsistency {
                segment: chain.last().copied().unwrap_or(current.id),
                issue: NetworkIssue::Cycle { revisited: current.id },
            });
        }
        if let Some(limit) = max_len {
            if chain.len() >= limit {
                return Err(ReachError::NetworkInconsistency {
                    segment: current.id,
                    issue: NetworkIssue::WalkLimit { limit },
                });
            }
        }
        chain.push(current.id);

        let next = match successors.get(&current.to_node).map(Vec::as_slice) {
            None | Some([]) => break,
            Some([next]) => *next,
            Some(candidates) => {
                return Err(ReachError::NetworkInconsistency {
                    segment: current.id,
                    issue: NetworkIssue::AmbiguousSuccessor {
                        candidates: candidates.to_vec(),
                    },
                });
            }
        };
        current = catalog.lookup(next)?;
    }

    debug!(start = %start, unit, segments = chain.len(), "walked reach");
    Ok(ReachChain(chain))
}
