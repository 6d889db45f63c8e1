//! Segment dependency graph used to assign routing slots.
//!
//! Every segment that needs a routing slot becomes a node; a dependency `a -> b` with weight `w`
//! says that drawing `a` farther from the node than `b` saves `w` crossings. Dependencies may form
//! cycles, which are broken with the Eades-Lin-Smyth heuristic before slots are assigned by a
//! longest-path pass starting at the sinks.

use std::collections::{BTreeSet, VecDeque};

/// Distance below which two coordinates are considered equal by orthogonal routing.
pub const TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(usize);

impl SegmentId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DependencyId(usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dependency {
    pub source: SegmentId,
    pub target: SegmentId,
    pub weight: i64,
}

#[derive(Debug, Clone, Default)]
struct Segment {
    routing_slot: usize,
    incoming: Vec<DependencyId>,
    outgoing: Vec<DependencyId>,
}

#[derive(Debug, Clone, Default)]
pub struct SegmentGraph {
    segments: Vec<Segment>,
    dependencies: Vec<Option<Dependency>>,
}

impl SegmentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_segment(&mut self) -> SegmentId {
        self.segments.push(Segment::default());
        SegmentId(self.segments.len() - 1)
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn add_dependency(&mut self, source: SegmentId, target: SegmentId, weight: i64) -> DependencyId {
        let id = DependencyId(self.dependencies.len());
        self.dependencies.push(Some(Dependency {
            source,
            target,
            weight,
        }));
        self.segments[source.0].outgoing.push(id);
        self.segments[target.0].incoming.push(id);
        id
    }

    pub fn dependency(&self, id: DependencyId) -> Option<&Dependency> {
        self.dependencies.get(id.0).and_then(Option::as_ref)
    }

    /// Live dependencies in creation order.
    pub fn dependencies(&self) -> impl Iterator<Item = (DependencyId, &Dependency)> + '_ {
        self.dependencies
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.as_ref().map(|d| (DependencyId(i), d)))
    }

    pub fn outgoing(&self, segment: SegmentId) -> &[DependencyId] {
        &self.segments[segment.0].outgoing
    }

    pub fn incoming(&self, segment: SegmentId) -> &[DependencyId] {
        &self.segments[segment.0].incoming
    }

    pub fn routing_slot(&self, segment: SegmentId) -> usize {
        self.segments[segment.0].routing_slot
    }

    pub fn remove_dependency(&mut self, id: DependencyId) {
        let Some(dep) = self.dependencies[id.0].take() else {
            return;
        };
        self.segments[dep.source.0].outgoing.retain(|&d| d != id);
        self.segments[dep.target.0].incoming.retain(|&d| d != id);
    }

    pub fn reverse_dependency(&mut self, id: DependencyId) {
        let Some(dep) = self.dependencies[id.0].as_mut() else {
            return;
        };
        let (old_source, old_target) = (dep.source, dep.target);
        dep.source = old_target;
        dep.target = old_source;

        self.segments[old_source.0].outgoing.retain(|&d| d != id);
        self.segments[old_target.0].incoming.retain(|&d| d != id);
        self.segments[old_target.0].outgoing.push(id);
        self.segments[old_source.0].incoming.push(id);
    }

    /// Dependencies that point backwards in a linear ordering computed with the Eades-Lin-Smyth
    /// heuristic. Removing or reversing all of them leaves the graph acyclic.
    ///
    /// Ties between candidate segments are broken by the lowest segment index, so the result is
    /// deterministic.
    pub fn detect_cycles(&self) -> Vec<DependencyId> {
        let n = self.segments.len();
        if n == 0 {
            return Vec::new();
        }

        let mut in_w = vec![0i64; n];
        let mut out_w = vec![0i64; n];
        let mut sources: VecDeque<usize> = VecDeque::new();
        let mut sinks: VecDeque<usize> = VecDeque::new();
        for (i, seg) in self.segments.iter().enumerate() {
            out_w[i] = seg.outgoing.iter().map(|&d| self.weight(d)).sum();
            in_w[i] = seg.incoming.iter().map(|&d| self.weight(d)).sum();
            if out_w[i] == 0 {
                sinks.push_back(i);
            } else if in_w[i] == 0 {
                sources.push_back(i);
            }
        }

        struct Work<'a> {
            graph: &'a SegmentGraph,
            unprocessed: BTreeSet<usize>,
            mark: Vec<i64>,
            in_w: Vec<i64>,
            out_w: Vec<i64>,
            sources: VecDeque<usize>,
            sinks: VecDeque<usize>,
        }

        impl Work<'_> {
            fn take(&mut self, v: usize, mark: i64) {
                let graph = self.graph;
                self.unprocessed.remove(&v);
                self.mark[v] = mark;

                for &d in &graph.segments[v].outgoing {
                    let Some(dep) = graph.dependency(d) else {
                        continue;
                    };
                    let t = dep.target.0;
                    if self.unprocessed.contains(&t) && dep.weight > 0 {
                        self.in_w[t] -= dep.weight;
                        if self.in_w[t] <= 0 && self.out_w[t] > 0 {
                            self.sources.push_back(t);
                        }
                    }
                }
                for &d in &graph.segments[v].incoming {
                    let Some(dep) = graph.dependency(d) else {
                        continue;
                    };
                    let s = dep.source.0;
                    if self.unprocessed.contains(&s) && dep.weight > 0 {
                        self.out_w[s] -= dep.weight;
                        if self.out_w[s] <= 0 && self.in_w[s] > 0 {
                            self.sinks.push_back(s);
                        }
                    }
                }
            }
        }

        let mut work = Work {
            graph: self,
            unprocessed: (0..n).collect(),
            mark: vec![0; n],
            in_w,
            out_w,
            sources,
            sinks,
        };

        // Sinks are marked below `mark_base` in discovery order and shifted past the sources at
        // the end.
        let mark_base = n as i64;
        let mut next_right = mark_base - 1;
        let mut next_left = mark_base + 1;

        while !work.unprocessed.is_empty() {
            while let Some(v) = work.sinks.pop_front() {
                if work.unprocessed.contains(&v) {
                    work.take(v, next_right);
                    next_right -= 1;
                }
            }
            while let Some(v) = work.sources.pop_front() {
                if work.unprocessed.contains(&v) {
                    work.take(v, next_left);
                    next_left += 1;
                }
            }

            let mut best: Option<(usize, i64)> = None;
            for &v in &work.unprocessed {
                let outflow = work.out_w[v] - work.in_w[v];
                if best.is_none_or(|(_, f)| outflow > f) {
                    best = Some((v, outflow));
                }
            }
            if let Some((v, _)) = best {
                work.take(v, next_left);
                next_left += 1;
            }
        }

        let shift = n as i64 + 1;
        let mark: Vec<i64> = work
            .mark
            .into_iter()
            .map(|m| if m < mark_base { m + shift } else { m })
            .collect();

        self.dependencies()
            .filter(|(_, dep)| mark[dep.source.0] > mark[dep.target.0])
            .map(|(id, _)| id)
            .collect()
    }

    /// Makes the graph acyclic: backward dependencies without weight are dropped, weighted ones
    /// are reversed.
    pub fn break_cycles(&mut self) {
        for id in self.detect_cycles() {
            if self.weight(id) == 0 {
                self.remove_dependency(id);
            } else {
                self.reverse_dependency(id);
            }
        }
    }

    /// Longest-path slot assignment: sinks get slot 0 and every segment sits at least one slot
    /// above each segment it depends on. The graph must be acyclic.
    pub fn assign_routing_slots(&mut self) {
        let n = self.segments.len();
        let mut remaining_out: Vec<usize> = self.segments.iter().map(|s| s.outgoing.len()).collect();
        let mut queue: VecDeque<usize> = VecDeque::new();
        for (i, seg) in self.segments.iter_mut().enumerate() {
            seg.routing_slot = 0;
            if remaining_out[i] == 0 {
                queue.push_back(i);
            }
        }

        let mut processed = 0usize;
        while let Some(v) = queue.pop_front() {
            processed += 1;
            let next_slot = self.segments[v].routing_slot + 1;
            let incoming = self.segments[v].incoming.clone();
            for d in incoming {
                let Some(dep) = self.dependency(d).copied() else {
                    continue;
                };
                let s = dep.source.0;
                let seg = &mut self.segments[s];
                seg.routing_slot = seg.routing_slot.max(next_slot);
                remaining_out[s] -= 1;
                if remaining_out[s] == 0 {
                    queue.push_back(s);
                }
            }
        }
        debug_assert_eq!(processed, n, "segment dependency graph still has cycles");
    }

    fn weight(&self, id: DependencyId) -> i64 {
        self.dependency(id).map(|d| d.weight).unwrap_or(0)
    }
}
