//! Assigns each hyper loop a routing slot per side, i.e. how far from the node it runs.
//!
//! Loops that would cross fewer other loops when drawn further out get higher slots. The ordering
//! comes from a crossing dependency graph (see [`crate::hyperedge`]); afterwards loops are pulled
//! as close to the node as the ports they pass over and their labels allow.

use super::holder::{SelfHyperLoop, SelfLoopHolder};
use crate::hyperedge::{SegmentGraph, SegmentId};
use strata_graph::{Graph, PortSide};
use tracing::trace;

pub fn assign_routing_slots(g: &Graph, holder: &mut SelfLoopHolder) {
    let port_count = g.node(holder.node).ports.len();
    let overlaps = label_overlaps(&holder.loops);
    let activity: Vec<Vec<bool>> = holder
        .loops
        .iter()
        .map(|lp| loop_activity(g, lp, port_count))
        .collect();

    let mut segments = SegmentGraph::new();
    let ids: Vec<SegmentId> = holder.loops.iter().map(|_| segments.add_segment()).collect();
    for i in 0..holder.loops.len() {
        for j in i + 1..holder.loops.len() {
            let first_above = count_crossings(g, &holder.loops[i], &activity[j]);
            let second_above = count_crossings(g, &holder.loops[j], &activity[i]);
            if first_above < second_above {
                segments.add_dependency(ids[i], ids[j], (second_above - first_above) as i64);
            } else if second_above < first_above {
                segments.add_dependency(ids[j], ids[i], (first_above - second_above) as i64);
            } else if first_above != 0 || overlaps[i][j] {
                segments.add_dependency(ids[i], ids[j], 0);
                segments.add_dependency(ids[j], ids[i], 0);
            }
        }
    }
    segments.break_cycles();
    segments.assign_routing_slots();

    for (lp, &id) in holder.loops.iter_mut().zip(&ids) {
        let slot = segments.routing_slot(id);
        for side in lp.occupied_sides.clone() {
            lp.set_routing_slot(side, slot);
        }
    }

    let mut next_free = vec![0usize; port_count];
    for side in PortSide::CLOCKWISE {
        shift_towards_node(g, holder, side, &activity, &overlaps, &mut next_free);
    }
    holder.update_routing_slot_count();
    trace!(
        node = %holder.node,
        loops = holder.loops.len(),
        "assigned self loop routing slots"
    );
}

/// Whether the labels of two loops sit on the same north or south side and overlap horizontally.
pub fn labels_overlap(a: &SelfHyperLoop, b: &SelfHyperLoop) -> bool {
    let (Some(la), Some(lb)) = (&a.labels, &b.labels) else {
        return false;
    };
    if la.side != lb.side || matches!(la.side, PortSide::East | PortSide::West) {
        return false;
    }
    let (start1, start2) = (la.position.x, lb.position.x);
    let (end1, end2) = (start1 + la.size.x, start2 + lb.size.x);
    start1 <= end2 && end1 >= start2
}

fn label_overlaps(loops: &[SelfHyperLoop]) -> Vec<Vec<bool>> {
    let n = loops.len();
    let mut matrix = vec![vec![false; n]; n];
    for i in 0..n {
        for j in i + 1..n {
            let overlap = labels_overlap(&loops[i], &loops[j]);
            matrix[i][j] = overlap;
            matrix[j][i] = overlap;
        }
    }
    matrix
}

/// Ports (by id) the loop runs past, walking clockwise from its leftmost to its rightmost port.
fn loop_activity(g: &Graph, lp: &SelfHyperLoop, port_count: usize) -> Vec<bool> {
    let mut active = vec![false; port_count];
    if port_count == 0 {
        return active;
    }
    let target = g.port(lp.rightmost).id;
    let mut index = g.port(lp.leftmost).id;
    loop {
        active[index] = true;
        if index == target {
            break;
        }
        index = (index + 1) % port_count;
    }
    active
}

/// How many ports of `upper` lie under the loop whose activity is `lower_activity`.
fn count_crossings(g: &Graph, upper: &SelfHyperLoop, lower_activity: &[bool]) -> usize {
    upper
        .ports
        .iter()
        .filter(|&&p| lower_activity.get(g.port(p).id).copied().unwrap_or(false))
        .count()
}

fn shift_towards_node(
    g: &Graph,
    holder: &mut SelfLoopHolder,
    side: PortSide,
    activity: &[Vec<bool>],
    overlaps: &[Vec<bool>],
    next_free: &mut [usize],
) {
    let mut on_side: Vec<usize> = (0..holder.loops.len())
        .filter(|&i| holder.loops[i].occupies(side))
        .collect();
    on_side.sort_by_key(|&i| holder.loops[i].routing_slot(side));

    let ids = g
        .node(holder.node)
        .ports
        .iter()
        .filter(|&&p| g.port(p).side == side)
        .map(|&p| g.port(p).id);
    let (Some(min), Some(max)) = (ids.clone().min(), ids.max()) else {
        for (slot, &i) in on_side.iter().enumerate() {
            holder.loops[i].set_routing_slot(side, slot);
        }
        return;
    };

    let mut label_slots: Vec<Option<usize>> = vec![None; holder.loops.len()];
    for &i in &on_side {
        let active = &activity[i];
        let mut slot = (min..=max)
            .filter(|&p| active[p])
            .map(|p| next_free[p])
            .max()
            .unwrap_or(0);

        if holder.loops[i].labels.is_some() {
            let conflicts: Vec<usize> = (0..holder.loops.len())
                .filter(|&j| overlaps[i][j])
                .filter_map(|j| label_slots[j])
                .collect();
            while conflicts.contains(&slot) {
                slot += 1;
            }
        }

        holder.loops[i].set_routing_slot(side, slot);
        for p in (min..=max).filter(|&p| active[p]) {
            next_free[p] = slot + 1;
        }
        if holder.loops[i].labels.is_some() {
            label_slots[i] = Some(slot);
        }
    }
}
