//! Chooses where the label group of each hyper loop goes.
//!
//! Labels sit on a north or south side when they can, centered on the stretch the loop covers or
//! aligned to one of its boundary ports. Loops running along a single east or west side put their
//! labels next to their topmost port. The coordinate along the side is computed here; the distance
//! from the node follows from the routing slot and is filled in by the router.

use super::holder::{LabelAlignment, SelfHyperLoop, SelfLoopHolder, SelfLoopType};
use strata_graph::{Graph, LabelData, NodeId, Point, PortId, PortSide, SelfLoopOrdering};
use tracing::trace;

/// Narrowest width a label manager is ever asked to fit a label group into.
pub const MIN_LABEL_WIDTH: f64 = 60.0;

/// Shrinks labels that would otherwise stick out too far, for example by wrapping their text.
pub trait LabelManager {
    /// Size `label` should take if it may be at most `target_width` wide.
    fn manage_label(&self, label: &LabelData, target_width: f64) -> Point;
}

/// Assigns side, alignment and the coordinate along the side to every labeled loop.
pub fn place_labels(g: &mut Graph, holder: &mut SelfLoopHolder, manager: Option<&dyn LabelManager>) {
    let node = holder.node;
    let ordering = g.options(g.node(node).graph).self_loop_ordering;
    assign_sides_and_alignments(g, &mut holder.loops, ordering);

    let spacing = g.node_spacing(node).label_label;
    for lp in &mut holder.loops {
        if lp.labels.is_none() {
            continue;
        }
        if let Some(manager) = manager {
            manage_labels(g, node, lp, manager, spacing);
        }
        compute_coordinates(g, node, lp);
        if let Some(labels) = &lp.labels {
            trace!(
                node = %node,
                side = ?labels.side,
                alignment = ?labels.alignment,
                "placed self loop labels"
            );
        }
    }
}

fn assign_sides_and_alignments(g: &Graph, loops: &mut [SelfHyperLoop], ordering: SelfLoopOrdering) {
    let mut northern: Vec<usize> = Vec::new();
    let mut southern: Vec<usize> = Vec::new();

    for (i, lp) in loops.iter_mut().enumerate() {
        if lp.labels.is_none() {
            continue;
        }
        let left_side = g.port(lp.leftmost).side;
        let right_side = g.port(lp.rightmost).side;
        let (side, alignment, reference) = match lp.loop_type {
            SelfLoopType::OneSide => {
                let side = lp.occupied_sides.first().copied().unwrap_or(left_side);
                match (ordering, side) {
                    (SelfLoopOrdering::Sequenced, PortSide::North) => {
                        northern.push(i);
                        continue;
                    }
                    (SelfLoopOrdering::Sequenced, PortSide::South) => {
                        southern.push(i);
                        continue;
                    }
                    (_, PortSide::East | PortSide::West) => {
                        let topmost = if g.port(lp.rightmost).position.y
                            < g.port(lp.leftmost).position.y
                        {
                            lp.rightmost
                        } else {
                            lp.leftmost
                        };
                        (side, LabelAlignment::Top, Some(topmost))
                    }
                    _ => (side, LabelAlignment::Center, None),
                }
            }
            SelfLoopType::TwoSidesCorner => {
                if left_side == PortSide::North {
                    (PortSide::North, LabelAlignment::Left, Some(lp.leftmost))
                } else if right_side == PortSide::North {
                    (PortSide::North, LabelAlignment::Right, Some(lp.rightmost))
                } else if left_side == PortSide::South {
                    (PortSide::South, LabelAlignment::Right, Some(lp.leftmost))
                } else {
                    (PortSide::South, LabelAlignment::Left, Some(lp.rightmost))
                }
            }
            SelfLoopType::TwoSidesOpposing | SelfLoopType::ThreeSides => {
                if !lp.occupies(PortSide::North) {
                    (PortSide::South, LabelAlignment::Center, None)
                } else if !lp.occupies(PortSide::South) {
                    (PortSide::North, LabelAlignment::Center, None)
                } else if !lp.occupies(PortSide::West) {
                    (PortSide::North, LabelAlignment::Left, Some(lp.leftmost))
                } else {
                    (PortSide::North, LabelAlignment::Right, Some(lp.rightmost))
                }
            }
            SelfLoopType::FourSides => {
                if left_side == PortSide::North || right_side == PortSide::North {
                    (PortSide::South, LabelAlignment::Center, None)
                } else {
                    (PortSide::North, LabelAlignment::Center, None)
                }
            }
        };
        assign(lp, side, alignment, reference);
    }

    if !northern.is_empty() {
        assign_sequenced(g, loops, northern, PortSide::North);
    }
    if !southern.is_empty() {
        assign_sequenced(g, loops, southern, PortSide::South);
    }
}

/// Pairs one-sided loops from the outside in and aligns each pair's labels away from each other.
fn assign_sequenced(g: &Graph, loops: &mut [SelfHyperLoop], mut indices: Vec<usize>, side: PortSide) {
    let leftmost_id = |i: &usize| g.port(loops[*i].leftmost).id;
    if side == PortSide::North {
        indices.sort_by_key(leftmost_id);
    } else {
        indices.sort_by_key(|i| std::cmp::Reverse(leftmost_id(i)));
    }

    let (mut left, mut right) = (0, indices.len() - 1);
    while left < right {
        let (l, r) = (indices[left], indices[right]);
        let (l_ref, r_ref) = if side == PortSide::North {
            (loops[l].rightmost, loops[r].leftmost)
        } else {
            (loops[l].leftmost, loops[r].rightmost)
        };
        assign(&mut loops[l], side, LabelAlignment::Right, Some(l_ref));
        assign(&mut loops[r], side, LabelAlignment::Left, Some(r_ref));
        left += 1;
        right -= 1;
    }
    if left == right {
        assign(&mut loops[indices[left]], side, LabelAlignment::Center, None);
    }
}

fn assign(lp: &mut SelfHyperLoop, side: PortSide, alignment: LabelAlignment, reference: Option<PortId>) {
    if let Some(labels) = &mut lp.labels {
        labels.side = side;
        labels.alignment = alignment;
        labels.reference_port = reference;
    }
}

/// Horizontal position of the reference port's anchor, relative to the node.
fn reference_x(g: &Graph, port: Option<PortId>) -> f64 {
    port.map(|p| g.port(p).position.x + g.port(p).anchor.x)
        .unwrap_or(0.0)
}

fn manage_labels(
    g: &mut Graph,
    node: NodeId,
    lp: &mut SelfHyperLoop,
    manager: &dyn LabelManager,
    spacing: f64,
) {
    let Some(labels) = &mut lp.labels else {
        return;
    };
    let size = g.node(node).size;
    let margin = g.node(node).margin;
    let target = match labels.alignment {
        LabelAlignment::Center => margin.left + size.x + margin.right,
        LabelAlignment::Left => size.x - reference_x(g, labels.reference_port) + margin.right,
        LabelAlignment::Right => margin.left + reference_x(g, labels.reference_port),
        LabelAlignment::Top => MIN_LABEL_WIDTH,
    }
    .max(MIN_LABEL_WIDTH);

    for &label in &labels.labels {
        let managed = manager.manage_label(g.label(label), target);
        g.label_mut(label).size = managed;
    }
    labels.update_size(g, spacing);
}

fn compute_coordinates(g: &Graph, node: NodeId, lp: &mut SelfHyperLoop) {
    let Some(labels) = &mut lp.labels else {
        return;
    };
    let reference = labels.reference_port;
    match labels.alignment {
        LabelAlignment::Center => {
            labels.position.x = (g.node(node).size.x - labels.size.x) / 2.0;
        }
        LabelAlignment::Left => labels.position.x = reference_x(g, reference),
        LabelAlignment::Right => labels.position.x = reference_x(g, reference) - labels.size.x,
        LabelAlignment::Top => {
            labels.position.y = reference
                .map(|p| g.port(p).position.y + g.port(p).anchor.y)
                .unwrap_or(0.0);
        }
    }
}
