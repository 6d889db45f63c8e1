//! Turns routing slots into bend points.
//!
//! Every side gets a list of slot positions, measured from the node's top-left corner: slot 0 sits
//! just outside the node (and whatever margin it already has), each further slot one edge spacing
//! farther out plus room for labels placed in the slot. A loop edge leaves its source port
//! straight out to its slot on that side, turns around the corners of the sides in between and
//! comes back in to its target port.

use super::holder::{LoopLabels, SelfHyperLoop, SelfLoopEdge, SelfLoopHolder};
use crate::error::{Error, Result};
use crate::spline::bspline_to_bezier;
use strata_graph::{EdgeRouting, Graph, LayoutOptions, Point, PortId, PortSide, Spacing};
use tracing::trace;

/// The geometry styles self loops can be drawn in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelfLoopRouter {
    Orthogonal,
    /// Orthogonal routes whose corners are cut by up to `corner_cut`. Without a cut distance the
    /// route stays orthogonal.
    Polyline { corner_cut: Option<f64> },
    Spline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingDirection {
    Clockwise,
    CounterClockwise,
}

impl SelfLoopRouter {
    pub fn from_options(options: &LayoutOptions) -> Self {
        match options.edge_routing {
            EdgeRouting::Orthogonal => SelfLoopRouter::Orthogonal,
            EdgeRouting::Polyline => SelfLoopRouter::Polyline {
                corner_cut: options.polyline_corner_cut,
            },
            EdgeRouting::Splines => SelfLoopRouter::Spline,
        }
    }

    /// Routes every loop of `holder`, places the label groups and grows the node margin so that
    /// it covers all of them.
    ///
    /// Bend points and label positions are written in the coordinate system of the node's graph.
    pub fn route(&self, g: &mut Graph, holder: &mut SelfLoopHolder) -> Result<()> {
        let node = holder.node;
        let spacing = g.node_spacing(node);
        let size = g.node(node).size;
        let origin = g.node(node).position;
        let positions = SlotPositions::compute(g, holder, &spacing);
        let mut margin = g.node(node).margin;

        for lp in &mut holder.loops {
            for edge in &lp.edges {
                let bends = self.bend_points(g, lp, edge, &positions, &spacing)?;
                for &p in &bends {
                    margin.include(size, p);
                }
                g.edge_mut(edge.edge).bend_points = bends.into_iter().map(|p| p + origin).collect();
            }

            let Some(label_side) = lp.labels.as_ref().map(|l| l.side) else {
                continue;
            };
            let base = positions.get(label_side, lp.routing_slot(label_side));
            if let Some(labels) = &mut lp.labels {
                place_label_group(labels, base, spacing.edge_label);
                margin.include(size, labels.position);
                margin.include(size, labels.position + labels.size);
                labels.apply_positions(g, origin, spacing.label_label);
            }
        }

        g.node_mut(node).margin = margin;
        trace!(node = %node, loops = holder.loops.len(), router = ?self, "routed self loops");
        Ok(())
    }

    /// Bend points of one loop edge relative to the node's top-left corner.
    pub fn bend_points(
        &self,
        g: &Graph,
        lp: &SelfHyperLoop,
        edge: &SelfLoopEdge,
        positions: &SlotPositions,
        spacing: &Spacing,
    ) -> Result<Vec<Point>> {
        let direction = routing_direction(g, lp, edge)?;
        let orthogonal = orthogonal_bend_points(g, lp, edge, direction, positions);
        let source = anchor(g, edge.source);
        let target = anchor(g, edge.target);

        Ok(match *self {
            SelfLoopRouter::Orthogonal | SelfLoopRouter::Polyline { corner_cut: None } => orthogonal,
            SelfLoopRouter::Polyline {
                corner_cut: Some(cut),
            } => cut_corners(source, &orthogonal, target, cut),
            SelfLoopRouter::Spline => {
                let sides = walked_sides(g.port(edge.source).side, g.port(edge.target).side, direction);
                let mut control = Vec::with_capacity(orthogonal.len() + 1);
                control.push(source);
                for (pair, side) in orthogonal.windows(2).zip(sides) {
                    control.push(pair[0].midpoint(pair[1]) + outward(side) * spacing.edge_label);
                }
                control.push(target);
                bspline_to_bezier(&control)
            }
        })
    }
}

/// Slot positions per side, relative to the node's top-left corner.
#[derive(Debug, Clone, Default)]
pub struct SlotPositions {
    sides: [Vec<f64>; 4],
}

impl SlotPositions {
    pub fn compute(g: &Graph, holder: &SelfLoopHolder, spacing: &Spacing) -> Self {
        let mut sides: [Vec<f64>; 4] = Default::default();
        for side in PortSide::CLOCKWISE {
            if let Some(i) = side.ordinal() {
                sides[i] = vec![0.0; holder.routing_slot_count(side)];
            }
        }

        for lp in &holder.loops {
            let Some(labels) = &lp.labels else {
                continue;
            };
            if !labels.side.is_horizontal() {
                continue;
            }
            let Some(i) = labels.side.ordinal() else {
                continue;
            };
            let slot = lp.routing_slot(labels.side);
            if sides[i].len() <= slot {
                sides[i].resize(slot + 1, 0.0);
            }
            sides[i][slot] = sides[i][slot].max(labels.size.y);
        }

        let node = g.node(holder.node);
        for side in PortSide::CLOCKWISE {
            let mut current = match side {
                PortSide::North => -node.margin.top - spacing.node_self_loop,
                PortSide::East => node.size.x + node.margin.right + spacing.node_self_loop,
                PortSide::South => node.size.y + node.margin.bottom + spacing.node_self_loop,
                _ => -node.margin.left - spacing.node_self_loop,
            };
            let factor = if matches!(side, PortSide::North | PortSide::West) {
                -1.0
            } else {
                1.0
            };
            let Some(i) = side.ordinal() else {
                continue;
            };
            for slot in sides[i].iter_mut() {
                let mut label = *slot;
                if label > 0.0 {
                    label += spacing.edge_label;
                }
                *slot = current;
                current += factor * (label + spacing.edge_edge);
            }
        }
        Self { sides }
    }

    /// Coordinate of `slot` on `side`: a y value for north and south, an x value for east and west.
    pub fn get(&self, side: PortSide, slot: usize) -> f64 {
        side.ordinal()
            .and_then(|i| self.sides[i].get(slot))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn slot_count(&self, side: PortSide) -> usize {
        side.ordinal().map(|i| self.sides[i].len()).unwrap_or(0)
    }
}

pub fn routing_direction(g: &Graph, lp: &SelfHyperLoop, edge: &SelfLoopEdge) -> Result<RoutingDirection> {
    let source = g.port(edge.source);
    let target = g.port(edge.target);
    for (port, side) in [(edge.source, source.side), (edge.target, target.side)] {
        if !side.is_defined() {
            return Err(Error::UndefinedPortSide {
                node: g.port_node(port),
                port,
            });
        }
    }

    Ok(if source.side == target.side {
        if source.id < target.id {
            RoutingDirection::Clockwise
        } else {
            RoutingDirection::CounterClockwise
        }
    } else if source.side.right() == target.side {
        RoutingDirection::Clockwise
    } else if source.side.left() == target.side {
        RoutingDirection::CounterClockwise
    } else if lp.occupies(source.side.right()) {
        RoutingDirection::Clockwise
    } else {
        RoutingDirection::CounterClockwise
    })
}

fn orthogonal_bend_points(
    g: &Graph,
    lp: &SelfHyperLoop,
    edge: &SelfLoopEdge,
    direction: RoutingDirection,
    positions: &SlotPositions,
) -> Vec<Point> {
    let source_side = g.port(edge.source).side;
    let target_side = g.port(edge.target).side;
    let base = |side: PortSide| base_vector(side, positions.get(side, lp.routing_slot(side)));

    let mut points = Vec::new();
    points.push(base(source_side) + along_side(source_side, anchor(g, edge.source)));
    let sides = walked_sides(source_side, target_side, direction);
    for pair in sides.windows(2) {
        points.push(base(pair[0]) + base(pair[1]));
    }
    points.push(base(target_side) + along_side(target_side, anchor(g, edge.target)));
    points
}

/// Sides passed walking from `from` to `to` in `direction`, both included.
fn walked_sides(from: PortSide, to: PortSide, direction: RoutingDirection) -> Vec<PortSide> {
    let mut sides = vec![from];
    let mut current = from;
    while current != to && sides.len() < 5 {
        current = match direction {
            RoutingDirection::Clockwise => current.right(),
            RoutingDirection::CounterClockwise => current.left(),
        };
        sides.push(current);
    }
    sides
}

fn base_vector(side: PortSide, position: f64) -> Point {
    if side.is_horizontal() {
        Point::new(0.0, position)
    } else {
        Point::new(position, 0.0)
    }
}

/// The component of `anchor` that runs along `side`.
fn along_side(side: PortSide, anchor: Point) -> Point {
    if side.is_horizontal() {
        Point::new(anchor.x, 0.0)
    } else {
        Point::new(0.0, anchor.y)
    }
}

fn anchor(g: &Graph, port: PortId) -> Point {
    let p = g.port(port);
    p.position + p.anchor
}

/// Unit vector pointing away from the node across `side`.
fn outward(side: PortSide) -> Point {
    match side {
        PortSide::North => Point::new(0.0, -1.0),
        PortSide::East => Point::new(1.0, 0.0),
        PortSide::South => Point::new(0.0, 1.0),
        PortSide::West => Point::new(-1.0, 0.0),
        PortSide::Undefined => Point::ZERO,
    }
}

/// Replaces every bend point by two points `cut` before and after it, never cutting more than
/// half of an adjacent segment.
fn cut_corners(source: Point, bends: &[Point], target: Point, cut: f64) -> Vec<Point> {
    let mut out = Vec::with_capacity(bends.len() * 2);
    for (i, &corner) in bends.iter().enumerate() {
        let previous = if i == 0 { source } else { bends[i - 1] };
        let next = bends.get(i + 1).copied().unwrap_or(target);
        let to_prev = previous - corner;
        let to_next = next - corner;
        let d = cut.min(to_prev.length() / 2.0).min(to_next.length() / 2.0);
        if d <= 0.0 {
            out.push(corner);
            continue;
        }
        out.push(corner + to_prev.normalized() * d);
        out.push(corner + to_next.normalized() * d);
    }
    out
}

/// Moves the label group out past the loop's slot on the label side.
fn place_label_group(labels: &mut LoopLabels, slot_position: f64, edge_label: f64) {
    match labels.side {
        PortSide::North => labels.position.y = slot_position - edge_label - labels.size.y,
        PortSide::South => labels.position.y = slot_position + edge_label,
        PortSide::West => labels.position.x = slot_position - edge_label - labels.size.x,
        PortSide::East => labels.position.x = slot_position + edge_label,
        PortSide::Undefined => {}
    }
}
