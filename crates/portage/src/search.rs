//! Lazy route search over the format graph.
//!
//! Candidate routes come out of a Dijkstra-style frontier in
//! non-decreasing cost order: every edge cost is positive and every
//! adaptive addition non-negative, so a route is only yielded once all
//! cheaper ones have been considered. Equal-cost routes come out in
//! insertion order, inherited from the frontier heap's tiebreak.
//!
//! The search is a stateful iterator. Each `next` call drives the loop
//! until it yields a route or exhausts the frontier; restarting means
//! creating a new search.
//!
//! `visited` is deliberately an append-only list scanned linearly, not a
//! set. Frames only consult the prefix up to their own `visited_border`
//! (the frontier as of their enqueueing), which lets a vertex be
//! re-explored along a genuinely different, later-discovered prefix
//! while still suppressing cycles within a single exploration.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::format::FormatDescriptor;
use crate::graph::{FormatGraph, LOG_FREQUENCY};
use crate::handler::Handler;
use crate::heap::MinHeap;

/// One step of a route: the format reached and the handler that
/// produced it. The first node of a route carries the source handler as
/// context only.
pub struct RouteNode {
    pub handler: Arc<dyn Handler>,
    pub format: FormatDescriptor,
}

impl RouteNode {
    pub fn new(handler: Arc<dyn Handler>, format: FormatDescriptor) -> Self {
        Self { handler, format }
    }
}

impl Clone for RouteNode {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
            format: self.format.clone(),
        }
    }
}

impl fmt::Debug for RouteNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteNode")
            .field("handler", &self.handler.name())
            .field("format", &self.format.format)
            .field("mime", &self.format.mime)
            .finish()
    }
}

/// A candidate route and its total cost under the cost model.
#[derive(Debug, Clone)]
pub struct Route {
    pub nodes: Vec<RouteNode>,
    pub cost: f64,
}

/// Informational search events, delivered synchronously with the path
/// at that moment. Observers must not mutate the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchEvent {
    Searching,
    Found,
    Skipped,
}

struct Frame {
    vertex: usize,
    cost: f64,
    path: Vec<RouteNode>,
    visited_border: usize,
}

fn frame_order(a: &Frame, b: &Frame) -> Ordering {
    a.cost.partial_cmp(&b.cost).unwrap_or(Ordering::Equal)
}

type Observer<'g> = Box<dyn FnMut(SearchEvent, &[RouteNode]) + Send + 'g>;

/// Lazy iterator over candidate routes in non-decreasing cost order.
pub struct RouteSearch<'g> {
    graph: &'g FormatGraph,
    queue: MinHeap<Frame, fn(&Frame, &Frame) -> Ordering>,
    visited: Vec<usize>,
    destination: Option<usize>,
    target_handler: String,
    simple_mode: bool,
    popped: u64,
    observer: Option<Observer<'g>>,
}

impl<'g> RouteSearch<'g> {
    pub(crate) fn new(
        graph: &'g FormatGraph,
        source: &RouteNode,
        target: &RouteNode,
        simple_mode: bool,
    ) -> Self {
        let mut queue = MinHeap::new(frame_order as fn(&Frame, &Frame) -> Ordering);
        let origin = graph.vertex_index(&source.format.mime);
        let destination = graph.vertex_index(&target.format.mime);
        if let (Some(origin), Some(_)) = (origin, destination) {
            queue.push(Frame {
                vertex: origin,
                cost: 0.0,
                path: vec![source.clone()],
                visited_border: 0,
            });
        }
        Self {
            graph,
            queue,
            visited: Vec::new(),
            destination,
            target_handler: target.handler.name().to_owned(),
            simple_mode,
            popped: 0,
            observer: None,
        }
    }

    /// Attach an observer for `Searching` / `Found` / `Skipped` events.
    pub fn observe(mut self, observer: impl FnMut(SearchEvent, &[RouteNode]) + Send + 'g) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    fn emit(&mut self, event: SearchEvent, path: &[RouteNode]) {
        if let Some(observer) = &mut self.observer {
            observer(event, path);
        }
    }
}

impl Iterator for RouteSearch<'_> {
    type Item = Route;

    fn next(&mut self) -> Option<Route> {
        let graph = self.graph;
        loop {
            let frame = self.queue.pop()?;
            self.popped += 1;
            if self.popped % LOG_FREQUENCY == 0 {
                debug!(
                    frames = self.popped,
                    queued = self.queue.len(),
                    "route search still expanding"
                );
            }

            if self.visited[..frame.visited_border].contains(&frame.vertex) {
                self.emit(SearchEvent::Skipped, &frame.path);
                continue;
            }

            if Some(frame.vertex) == self.destination {
                if graph.safety_filter_enabled() && loses_all_signal(&frame.path) {
                    self.emit(SearchEvent::Skipped, &frame.path);
                    continue;
                }
                let terminal_matches = frame
                    .path
                    .last()
                    .is_some_and(|node| node.handler.name() == self.target_handler);
                if self.simple_mode || terminal_matches {
                    self.emit(SearchEvent::Found, &frame.path);
                    return Some(Route {
                        nodes: frame.path,
                        cost: frame.cost,
                    });
                }
                self.emit(SearchEvent::Skipped, &frame.path);
                continue;
            }

            self.visited.push(frame.vertex);
            self.emit(SearchEvent::Searching, &frame.path);

            for &edge_idx in graph.vertex_edges(frame.vertex) {
                let edge = graph.edge(edge_idx);
                let Some(next_vertex) = graph.vertex_index(&edge.to.mime) else {
                    continue;
                };
                if self.visited[..frame.visited_border].contains(&next_vertex) {
                    continue;
                }
                let Some(handler) = graph.handler_by_name(&edge.handler) else {
                    continue;
                };

                let mut path = frame.path.clone();
                path.push(RouteNode::new(Arc::clone(handler), edge.to.clone()));
                let categories: Vec<&str> =
                    path.iter().map(|n| n.format.primary_category()).collect();
                let cost = frame.cost + edge.cost + graph.adaptive_cost(&categories);
                self.queue.push(Frame {
                    vertex: next_vertex,
                    cost,
                    path,
                    visited_border: self.visited.len(),
                });
            }
        }
    }
}

/// A route whose primary categories run `image, video, audio` in a row
/// has lost every meaningful signal; the search refuses to yield it.
fn loses_all_signal(path: &[RouteNode]) -> bool {
    let categories: Vec<&str> = path.iter().map(|n| n.format.primary_category()).collect();
    categories.windows(3).any(|w| w == ["image", "video", "audio"])
}
