//! Deterministic simulated host for integration tests.
//!
//! Models a scrollable document: containers with a scroll position, nodes
//! with a document-space top and height, and watch bands evaluated the way
//! the native primitives judge intersection ratios against their threshold
//! lists. Events are queued rather than delivered inline; the test drains
//! them into the scroller's intake methods, which also reproduces the
//! register-callbacks-after-setup window real embedders get.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use scrollstep::{
    CrossingConfig, CrossingRecord, Direction, Host, OverlayRegion, Scroller, StepEnter, StepExit,
    StepProgress, WatchId,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContainerId(pub u32);

/// The container standing in for the page viewport.
pub const ROOT: ContainerId = ContainerId(0);

#[derive(Clone, Debug)]
pub enum HostEvent {
    Scrolled(ContainerId, f64),
    Crossing(WatchId, CrossingRecord),
    Resized(WatchId, f64),
}

#[derive(Debug)]
struct SimNode {
    container: ContainerId,
    top: f64,
    height: f64,
    offset_attr: Option<String>,
}

#[derive(Debug)]
enum SimWatchKind {
    Crossing {
        config: CrossingConfig<NodeId>,
        last: Option<(bool, usize)>,
    },
    Size,
}

#[derive(Debug)]
struct SimWatch {
    node: NodeId,
    kind: SimWatchKind,
}

#[derive(Default)]
struct SimState {
    viewport_height: f64,
    scroll: FxHashMap<ContainerId, f64>,
    nodes: FxHashMap<NodeId, SimNode>,
    selections: FxHashMap<String, Vec<NodeId>>,
    watches: SlotMap<WatchId, SimWatch>,
    scroll_watched: FxHashSet<ContainerId>,
    scroll_watch_calls: u32,
    events: Vec<HostEvent>,
    frame_requests: u32,
    overlay: Option<OverlayRegion>,
}

impl SimState {
    fn evaluate(&self, node: NodeId, config: &CrossingConfig<NodeId>) -> (bool, usize, f64) {
        let node = &self.nodes[&node];
        let scroll = self.scroll.get(&node.container).copied().unwrap_or(0.0);
        let top = node.top - scroll;
        let bottom = top + node.height;

        // Positive margins grow the observed band, negative ones shrink it.
        let band_top = -config.margin_top;
        let band_bottom = self.viewport_height + config.margin_bottom;
        let overlap = (bottom.min(band_bottom) - top.max(band_top)).max(0.0);
        let ratio = if node.height > 0.0 {
            (overlap / node.height).clamp(0.0, 1.0)
        } else {
            0.0
        };

        // A threshold list without 0 judges intersection at its lowest
        // rung (the boundary watch's midpoint criterion); a ladder that
        // starts at 0 intersects on any overlap.
        let has_zero = config.thresholds.iter().any(|t| *t == 0.0);
        let min_threshold = config
            .thresholds
            .iter()
            .copied()
            .filter(|t| *t > 0.0)
            .fold(f64::INFINITY, f64::min);
        let is_intersecting = if has_zero || !min_threshold.is_finite() {
            ratio > 0.0
        } else {
            ratio >= min_threshold
        };

        let bucket = config
            .thresholds
            .iter()
            .filter(|t| ratio >= **t - 1e-9)
            .count();
        (is_intersecting, bucket, ratio)
    }

    fn reevaluate_crossings(&mut self) {
        let mut fired = Vec::new();
        for (id, watch) in &self.watches {
            if let SimWatchKind::Crossing { config, last } = &watch.kind {
                let (is_intersecting, bucket, ratio) = self.evaluate(watch.node, config);
                if *last != Some((is_intersecting, bucket)) {
                    fired.push((id, is_intersecting, bucket, ratio));
                }
            }
        }
        for (id, is_intersecting, bucket, ratio) in fired {
            if let SimWatchKind::Crossing { last, .. } = &mut self.watches[id].kind {
                *last = Some((is_intersecting, bucket));
            }
            self.events.push(HostEvent::Crossing(
                id,
                CrossingRecord {
                    is_intersecting,
                    ratio,
                },
            ));
        }
    }
}

/// Cheap-clone handle to the simulated document.
#[derive(Clone)]
pub struct SimHost {
    state: Rc<RefCell<SimState>>,
}

impl SimHost {
    pub fn new(viewport_height: f64) -> Self {
        let state = SimState {
            viewport_height,
            ..SimState::default()
        };
        Self {
            state: Rc::new(RefCell::new(state)),
        }
    }

    /// Change the viewport height, as a window resize would. Watch geometry
    /// only follows once the engine rebuilds its watches.
    pub fn set_viewport_height(&self, height: f64) {
        self.state.borrow_mut().viewport_height = height;
    }

    pub fn add_node(&self, id: NodeId, container: ContainerId, top: f64, height: f64) {
        self.state.borrow_mut().nodes.insert(
            id,
            SimNode {
                container,
                top,
                height,
                offset_attr: None,
            },
        );
    }

    pub fn set_offset_attr(&self, id: NodeId, attr: &str) {
        if let Some(node) = self.state.borrow_mut().nodes.get_mut(&id) {
            node.offset_attr = Some(attr.to_owned());
        }
    }

    pub fn register_selection(&self, selector: &str, nodes: Vec<NodeId>) {
        self.state
            .borrow_mut()
            .selections
            .insert(selector.to_owned(), nodes);
    }

    /// Scroll a container, queueing the scroll event and any threshold
    /// crossings it causes.
    pub fn set_scroll(&self, container: ContainerId, position: f64) {
        let mut state = self.state.borrow_mut();
        state.scroll.insert(container, position);
        if state.scroll_watched.contains(&container) {
            state.events.push(HostEvent::Scrolled(container, position));
        }
        state.reevaluate_crossings();
    }

    /// Change a node's measured height, firing its size watches. Crossing
    /// watches are left to the engine's re-geometry pass rather than
    /// synthesizing churn here.
    pub fn resize_node(&self, id: NodeId, height: f64) {
        let mut state = self.state.borrow_mut();
        if let Some(node) = state.nodes.get_mut(&id) {
            node.height = height;
        }
        let fired: Vec<WatchId> = state
            .watches
            .iter()
            .filter(|(_, w)| w.node == id && matches!(w.kind, SimWatchKind::Size))
            .map(|(watch_id, _)| watch_id)
            .collect();
        for watch_id in fired {
            state.events.push(HostEvent::Resized(watch_id, height));
        }
    }

    pub fn take_events(&self) -> Vec<HostEvent> {
        std::mem::take(&mut self.state.borrow_mut().events)
    }

    /// Consume one outstanding frame request, if any.
    pub fn pop_frame_request(&self) -> bool {
        let mut state = self.state.borrow_mut();
        if state.frame_requests > 0 {
            state.frame_requests -= 1;
            true
        } else {
            false
        }
    }

    pub fn watch_count(&self) -> usize {
        self.state.borrow().watches.len()
    }

    pub fn is_scroll_watched(&self, container: ContainerId) -> bool {
        self.state.borrow().scroll_watched.contains(&container)
    }

    pub fn scroll_watch_calls(&self) -> u32 {
        self.state.borrow().scroll_watch_calls
    }

    pub fn overlay(&self) -> Option<OverlayRegion> {
        self.state.borrow().overlay
    }

    /// All crossing watch configurations currently attached for a node.
    pub fn crossing_configs_for(&self, id: NodeId) -> Vec<CrossingConfig<NodeId>> {
        self.state
            .borrow()
            .watches
            .iter()
            .filter(|(_, w)| w.node == id)
            .filter_map(|(_, w)| match &w.kind {
                SimWatchKind::Crossing { config, .. } => Some(config.clone()),
                SimWatchKind::Size => None,
            })
            .collect()
    }
}

impl Host for SimHost {
    type Node = NodeId;
    type Container = ContainerId;

    fn select(&mut self, selector: &str, _parent: Option<&NodeId>) -> Vec<NodeId> {
        self.state
            .borrow()
            .selections
            .get(selector)
            .cloned()
            .unwrap_or_default()
    }

    fn viewport_height(&mut self) -> f64 {
        self.state.borrow().viewport_height
    }

    fn measure_height(&mut self, node: &NodeId) -> f64 {
        self.state
            .borrow()
            .nodes
            .get(node)
            .map(|n| n.height)
            .unwrap_or(0.0)
    }

    fn offset_override(&mut self, node: &NodeId) -> Option<String> {
        self.state
            .borrow()
            .nodes
            .get(node)
            .and_then(|n| n.offset_attr.clone())
    }

    fn root_container(&mut self) -> ContainerId {
        ROOT
    }

    fn scroll_position(&mut self, container: &ContainerId) -> f64 {
        self.state
            .borrow()
            .scroll
            .get(container)
            .copied()
            .unwrap_or(0.0)
    }

    fn observe_crossing(&mut self, node: &NodeId, config: CrossingConfig<NodeId>) -> WatchId {
        let mut state = self.state.borrow_mut();
        // Native observers report the current state once on attach.
        let (is_intersecting, bucket, ratio) = state.evaluate(*node, &config);
        let id = state.watches.insert(SimWatch {
            node: *node,
            kind: SimWatchKind::Crossing {
                config,
                last: Some((is_intersecting, bucket)),
            },
        });
        state.events.push(HostEvent::Crossing(
            id,
            CrossingRecord {
                is_intersecting,
                ratio,
            },
        ));
        id
    }

    fn observe_size(&mut self, node: &NodeId) -> WatchId {
        let mut state = self.state.borrow_mut();
        let height = state.nodes.get(node).map(|n| n.height).unwrap_or(0.0);
        let id = state.watches.insert(SimWatch {
            node: *node,
            kind: SimWatchKind::Size,
        });
        state.events.push(HostEvent::Resized(id, height));
        id
    }

    fn disconnect(&mut self, watch: WatchId) {
        self.state.borrow_mut().watches.remove(watch);
    }

    fn watch_scroll(&mut self, container: &ContainerId) {
        let mut state = self.state.borrow_mut();
        state.scroll_watch_calls += 1;
        state.scroll_watched.insert(*container);
    }

    fn unwatch_scroll(&mut self, container: &ContainerId) {
        self.state.borrow_mut().scroll_watched.remove(container);
    }

    fn request_frame(&mut self) {
        self.state.borrow_mut().frame_requests += 1;
    }

    fn show_trigger_overlay(&mut self, region: OverlayRegion) {
        self.state.borrow_mut().overlay = Some(region);
    }

    fn clear_trigger_overlay(&mut self) {
        self.state.borrow_mut().overlay = None;
    }
}

// ============================================================================
// Test drivers
// ============================================================================

/// What the registered callbacks observed, in delivery order.
#[derive(Clone, Debug, PartialEq)]
pub enum CallbackEvent {
    Enter {
        index: usize,
        direction: Direction,
    },
    Exit {
        index: usize,
        direction: Direction,
    },
    Progress {
        index: usize,
        progress: f64,
        direction: Direction,
    },
}

/// Shared recorder wired into all three callbacks.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<CallbackEvent>>>,
}

impl Recorder {
    pub fn attach(&self, scroller: &mut Scroller<SimHost>) {
        let sink = self.events.clone();
        scroller.on_step_enter(move |e: &StepEnter<NodeId>| {
            sink.borrow_mut().push(CallbackEvent::Enter {
                index: e.index,
                direction: e.direction,
            });
        });
        let sink = self.events.clone();
        scroller.on_step_exit(move |e: &StepExit<NodeId>| {
            sink.borrow_mut().push(CallbackEvent::Exit {
                index: e.index,
                direction: e.direction,
            });
        });
        let sink = self.events.clone();
        scroller.on_step_progress(move |e: &StepProgress<NodeId>| {
            sink.borrow_mut().push(CallbackEvent::Progress {
                index: e.index,
                progress: e.progress,
                direction: e.direction,
            });
        });
    }

    /// Drain everything observed so far.
    pub fn take(&self) -> Vec<CallbackEvent> {
        std::mem::take(&mut self.events.borrow_mut())
    }
}

pub fn deliver(scroller: &mut Scroller<SimHost>, event: &HostEvent) {
    match event {
        HostEvent::Scrolled(container, position) => scroller.handle_scroll(container, *position),
        HostEvent::Crossing(watch, record) => scroller.handle_crossing(*watch, *record),
        HostEvent::Resized(watch, height) => scroller.handle_resize(*watch, *height),
    }
}

/// Drain queued host events into the scroller until quiescent.
pub fn pump(scroller: &mut Scroller<SimHost>, host: &SimHost) {
    loop {
        let events = host.take_events();
        if events.is_empty() {
            break;
        }
        for event in &events {
            deliver(scroller, event);
        }
    }
}

/// Run one virtual frame if the engine asked for one, then drain whatever
/// the flush produced.
pub fn run_frame(scroller: &mut Scroller<SimHost>, host: &SimHost) {
    if host.pop_frame_request() {
        scroller.handle_frame();
        pump(scroller, host);
    }
}

/// Scroll, deliver, and settle one frame.
pub fn scroll_to(scroller: &mut Scroller<SimHost>, host: &SimHost, position: f64) {
    host.set_scroll(ROOT, position);
    pump(scroller, host);
    run_frame(scroller, host);
}

/// Install a test subscriber once so tracing output lands in the test
/// harness.
pub fn init_logs() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("scrollstep=debug")
        .with_test_writer()
        .try_init();
}
