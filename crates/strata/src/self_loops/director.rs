//! Decides which way around its node each hyper loop runs.
//!
//! A loop is drawn clockwise from its leftmost to its rightmost port. The arc between the
//! rightmost and the leftmost port stays free, so the director picks the boundary ports such that
//! the free arc passes as many (and as busy) ports as possible.

use super::holder::{SelfHyperLoop, SelfLoopHolder, SelfLoopType};
use crate::error::{Error, Result};
use strata_graph::{Graph, PortId, PortSide};
use tracing::trace;

const UNCONNECTED_PORT_PENALTY: i64 = 1;
const CONNECTED_PORT_PENALTY: i64 = 3;

/// Assigns port ids in port order, then the leftmost port, the rightmost port and the occupied
/// sides of every loop in `holder`.
pub fn determine_loop_routes(g: &mut Graph, holder: &mut SelfLoopHolder) -> Result<()> {
    let node = holder.node;
    let ports = g.node(node).ports.clone();
    for (i, &p) in ports.iter().enumerate() {
        g.port_mut(p).id = i;
    }
    let penalties = port_penalties(g, &ports);

    for lp in &mut holder.loops {
        lp.ports.sort_by_key(|&p| g.port(p).id);
        let (leftmost, rightmost) = match lp.loop_type {
            SelfLoopType::OneSide => {
                let side = g.port(lp.ports[0]).side;
                extremes(g, lp, side, side)
            }
            SelfLoopType::TwoSidesCorner => {
                let sides = corner_sides(&lp.sides(g));
                extremes(g, lp, sides[0], sides[1])
            }
            SelfLoopType::TwoSidesOpposing => {
                let sides = lp.sides(g);
                let option1 = extremes(g, lp, sides[0], sides[1]);
                let option2 = extremes(g, lp, sides[1], sides[0]);
                if edge_penalty(g, &penalties, option1) <= edge_penalty(g, &penalties, option2) {
                    option1
                } else {
                    option2
                }
            }
            SelfLoopType::ThreeSides => {
                let sides = lp.sides(g);
                let missing = PortSide::CLOCKWISE
                    .into_iter()
                    .find(|s| !sides.contains(s))
                    .ok_or_else(|| Error::UnexpectedLoopSides { node, sides })?;
                let (left, right) = match missing {
                    PortSide::North => (PortSide::East, PortSide::West),
                    PortSide::East => (PortSide::South, PortSide::North),
                    PortSide::South => (PortSide::West, PortSide::East),
                    _ => (PortSide::North, PortSide::South),
                };
                extremes(g, lp, left, right)
            }
            SelfLoopType::FourSides => four_side_extremes(g, &penalties, lp),
        };

        lp.leftmost = leftmost;
        lp.rightmost = rightmost;
        lp.occupied_sides = occupied_sides(g.port(leftmost).side, g.port(rightmost).side);
        trace!(
            node = %node,
            leftmost = %leftmost,
            rightmost = %rightmost,
            sides = ?lp.occupied_sides,
            "determined self loop route"
        );
    }
    Ok(())
}

/// Canonical order of two adjacent sides, clockwise across their shared corner.
pub fn corner_sides(sides: &[PortSide]) -> [PortSide; 2] {
    match sides {
        [PortSide::North, PortSide::West] => [PortSide::West, PortSide::North],
        [a, b] => [*a, *b],
        _ => [PortSide::Undefined; 2],
    }
}

/// Sides visited walking clockwise from `from` to `to`, both included.
pub fn occupied_sides(from: PortSide, to: PortSide) -> Vec<PortSide> {
    let mut sides = Vec::with_capacity(4);
    let mut current = from;
    while current != to && sides.len() < 4 {
        sides.push(current);
        current = current.right();
    }
    sides.push(current);
    sides
}

/// Lowest port on `left` and highest port on `right`.
fn extremes(g: &Graph, lp: &SelfHyperLoop, left: PortSide, right: PortSide) -> (PortId, PortId) {
    let id = |p: &PortId| g.port(*p).id;
    let leftmost = lp.ports_on(g, left).min_by_key(id).unwrap_or(lp.leftmost);
    let rightmost = lp.ports_on(g, right).max_by_key(id).unwrap_or(lp.rightmost);
    (leftmost, rightmost)
}

/// Splits the ring of ports at the adjacent pair that would be most expensive to connect.
fn four_side_extremes(g: &Graph, penalties: &[i64], lp: &SelfHyperLoop) -> (PortId, PortId) {
    let (Some(&first), Some(&last)) = (lp.ports.first(), lp.ports.last()) else {
        return (lp.leftmost, lp.rightmost);
    };
    let mut worst = (last, first);
    let mut worst_penalty = edge_penalty(g, penalties, worst);
    for pair in lp.ports.windows(2) {
        let candidate = (pair[0], pair[1]);
        let penalty = edge_penalty(g, penalties, candidate);
        if penalty > worst_penalty {
            worst = candidate;
            worst_penalty = penalty;
        }
    }
    (worst.1, worst.0)
}

/// Prefix sums of the port penalties in port order. Ports of other self loops count as connected.
fn port_penalties(g: &Graph, ports: &[PortId]) -> Vec<i64> {
    let mut sum = 0;
    ports
        .iter()
        .map(|&p| {
            let data = g.port(p);
            sum += if !data.incoming.is_empty() || !data.outgoing.is_empty() {
                CONNECTED_PORT_PENALTY
            } else {
                UNCONNECTED_PORT_PENALTY
            };
            sum
        })
        .collect()
}

/// Penalty of the ports strictly between `left` and `right`, walking clockwise.
fn edge_penalty(g: &Graph, penalties: &[i64], (left, right): (PortId, PortId)) -> i64 {
    let count = penalties.len();
    if count == 0 {
        return 0;
    }
    let left = g.port(left).id;
    let right = g.port(right).id;
    let left_of_right = if right == 0 { count - 1 } else { right - 1 };
    if left <= left_of_right {
        penalties[left_of_right] - penalties[left]
    } else {
        penalties[count - 1] - penalties[left] + penalties[left_of_right]
    }
}
