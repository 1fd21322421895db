//! The public orchestrator
//!
//! [`Scroller`] composes the direction tracker, step registry, watch
//! geometry and update scheduler behind the setup/enable/disable lifecycle.
//! The embedder wires host events into the intake methods
//! (`handle_scroll`, `handle_crossing`, `handle_resize`, `handle_frame`);
//! the scroller transitions step state and invokes the registered
//! callbacks.
//!
//! Boundary crossings act immediately. Progress readings and resize-driven
//! re-geometry go through the scheduler and land once per frame.

use std::sync::atomic::{AtomicU64, Ordering};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::{debug, error, warn};

use scrollstep_core::{
    parse_offset, CrossingRecord, Direction, Host, OffsetInput, OverlayRegion, SetupError,
    StepEnter, StepExit, StepProgress, TriggerOffset, WatchId,
};

use crate::direction::DirectionTracker;
use crate::engine;
use crate::registry::StepRegistry;
use crate::scheduler::{PendingProgress, UpdateScheduler};
use crate::step::{Crossing, Step, StepState};

/// Monotonic instance ids for diagnostics.
static NEXT_ID: AtomicU64 = AtomicU64::new(1);

// ============================================================================
// Configuration
// ============================================================================

/// Step selection: a host query string or an explicit element collection.
#[derive(Clone, Debug)]
pub enum StepSelector<N> {
    Query(String),
    Nodes(Vec<N>),
}

impl<N> From<&str> for StepSelector<N> {
    fn from(selector: &str) -> Self {
        Self::Query(selector.to_owned())
    }
}

impl<N> From<String> for StepSelector<N> {
    fn from(selector: String) -> Self {
        Self::Query(selector)
    }
}

impl<N> From<Vec<N>> for StepSelector<N> {
    fn from(nodes: Vec<N>) -> Self {
        Self::Nodes(nodes)
    }
}

/// Configuration for [`Scroller::setup`].
#[derive(Clone, Debug)]
pub struct SetupConfig<H: Host> {
    /// The step selection. Must resolve to at least one element.
    pub step: StepSelector<H::Node>,
    /// Scoping root for string selections.
    pub parent: Option<H::Node>,
    /// Global trigger offset; default half the viewport.
    pub offset: OffsetInput,
    /// Progress granularity: pixels of scroll per progress tick, coerced to
    /// at least 1.
    pub threshold: f64,
    /// Deliver progress readings while a step is entered.
    pub progress: bool,
    /// Fire each step's enter callback at most once per session.
    pub once: bool,
    /// Push boundary watch regions to the host debug overlay.
    pub debug: bool,
    /// Scroll container; default is the host's root container.
    pub container: Option<H::Container>,
    /// Intersection root override for the attached watches.
    pub root: Option<H::Node>,
}

impl<H: Host> SetupConfig<H> {
    /// Configuration with the documented defaults for everything but the
    /// selection.
    pub fn new(step: impl Into<StepSelector<H::Node>>) -> Self {
        Self {
            step: step.into(),
            parent: None,
            offset: OffsetInput::Number(0.5),
            threshold: 4.0,
            progress: false,
            once: false,
            debug: false,
            container: None,
            root: None,
        }
    }

    pub fn parent(mut self, parent: H::Node) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn offset(mut self, offset: impl Into<OffsetInput>) -> Self {
        self.offset = offset.into();
        self
    }

    pub fn threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    pub fn once(mut self, once: bool) -> Self {
        self.once = once;
        self
    }

    pub fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn container(mut self, container: H::Container) -> Self {
        self.container = Some(container);
        self
    }

    pub fn root(mut self, root: H::Node) -> Self {
        self.root = Some(root);
        self
    }
}

/// Session state derived from the last successful setup.
struct Session<H: Host> {
    global_offset: TriggerOffset,
    granularity_px: f64,
    progress_mode: bool,
    once_mode: bool,
    debug_mode: bool,
    container: H::Container,
    root: Option<H::Node>,
}

// ============================================================================
// Callbacks
// ============================================================================

type EnterCallback<N> = Box<dyn FnMut(&StepEnter<N>)>;
type ExitCallback<N> = Box<dyn FnMut(&StepExit<N>)>;
type ProgressCallback<N> = Box<dyn FnMut(&StepProgress<N>)>;

/// Registered handlers; single slot each, last registration wins.
struct Callbacks<N> {
    enter: Option<EnterCallback<N>>,
    exit: Option<ExitCallback<N>>,
    progress: Option<ProgressCallback<N>>,
}

impl<N> Default for Callbacks<N> {
    fn default() -> Self {
        Self {
            enter: None,
            exit: None,
            progress: None,
        }
    }
}

impl<N> Callbacks<N> {
    fn reset(&mut self) {
        self.enter = None;
        self.exit = None;
        self.progress = None;
    }
}

// ============================================================================
// Watch routing
// ============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum WatchPurpose {
    Boundary,
    Progress,
    Size,
}

#[derive(Clone, Copy, Debug)]
struct WatchBinding {
    step: usize,
    purpose: WatchPurpose,
}

// ============================================================================
// Scroller
// ============================================================================

/// Scroll-driven step observer.
///
/// Owns the host capability object and every per-session subsystem. All
/// mutating operations return `&mut Self` for chaining; [`Scroller::setup`]
/// is the only fallible one.
pub struct Scroller<H: Host> {
    id: u64,
    host: H,
    tracker: DirectionTracker<H::Container>,
    registry: StepRegistry<H::Node>,
    callbacks: Callbacks<H::Node>,
    scheduler: UpdateScheduler,
    watch_table: FxHashMap<WatchId, WatchBinding>,
    session: Option<Session<H>>,
    enabled: bool,
}

impl<H: Host> std::fmt::Debug for Scroller<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scroller")
            .field("id", &self.id)
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}

impl<H: Host> Scroller<H> {
    pub fn new(host: H) -> Self {
        Self::with_direction_tracker(host, DirectionTracker::new())
    }

    /// Share a direction registry with other instances observing the same
    /// containers, so the host keeps a single scroll listener per
    /// container.
    pub fn with_direction_tracker(host: H, tracker: DirectionTracker<H::Container>) -> Self {
        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            host,
            tracker,
            registry: StepRegistry::empty(),
            callbacks: Callbacks::default(),
            scheduler: UpdateScheduler::new(),
            watch_table: FxHashMap::default(),
            session: None,
            enabled: false,
        }
    }

    /// Instance id carried in this scroller's log lines.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Handle to the shared direction registry.
    pub fn direction_tracker(&self) -> DirectionTracker<H::Container> {
        self.tracker.clone()
    }

    pub fn step_count(&self) -> usize {
        self.registry.len()
    }

    pub fn step(&self, index: usize) -> Option<&Step<H::Node>> {
        self.registry.get(index)
    }

    /// Reverse lookup from a watched element to its step index.
    pub fn step_index(&self, node: &H::Node) -> Option<usize> {
        self.registry.index_of(node)
    }

    // ========================================================================
    // Public operations
    // ========================================================================

    /// Build a session from the configured step selection.
    ///
    /// An empty match set logs an error and leaves any prior session,
    /// callbacks and registry untouched. Otherwise the previous session is
    /// torn down, the registry is rebuilt from a snapshot of host layout
    /// reads, callbacks reset to no-ops, the direction tracker registers
    /// the configured container, and the scroller transitions to enabled.
    pub fn setup(&mut self, config: SetupConfig<H>) -> Result<&mut Self, SetupError> {
        let nodes = match &config.step {
            StepSelector::Query(selector) => self.host.select(selector, config.parent.as_ref()),
            StepSelector::Nodes(nodes) => nodes.clone(),
        };
        if nodes.is_empty() {
            error!(id = self.id, "no step elements matched the configured selection");
            return Err(SetupError::NoStepsFound);
        }

        // Tear down any previous session before rebuilding.
        let was_debug = self.session.as_ref().is_some_and(|s| s.debug_mode);
        self.set_enabled(false);
        self.release_container();
        if was_debug && !config.debug {
            self.host.clear_trigger_overlay();
        }

        let global_offset = parse_offset(&config.offset).unwrap_or_else(|| {
            warn!(id = self.id, "unparseable global offset, falling back to 0.5");
            TriggerOffset::percent(0.5)
        });

        // Snapshot layout reads in one pass before mutating anything else.
        let steps = nodes
            .iter()
            .enumerate()
            .map(|(index, node)| {
                let height = self.host.measure_height(node);
                let offset = self
                    .host
                    .offset_override(node)
                    .and_then(|raw| parse_offset(&OffsetInput::Text(raw)));
                Step::new(index, node.clone(), height, offset)
            })
            .collect();
        self.registry = StepRegistry::new(steps);
        self.callbacks.reset();
        self.scheduler.clear();

        let container = config
            .container
            .clone()
            .unwrap_or_else(|| self.host.root_container());
        let position = self.host.scroll_position(&container);
        if self.tracker.register(container.clone(), position) {
            self.host.watch_scroll(&container);
        }

        self.session = Some(Session {
            global_offset,
            granularity_px: config.threshold.max(1.0),
            progress_mode: config.progress,
            once_mode: config.once,
            debug_mode: config.debug,
            container,
            root: config.root,
        });

        debug!(id = self.id, steps = self.registry.len(), "setup complete");
        self.set_enabled(true);
        Ok(self)
    }

    /// Attach observation for every step. Idempotent.
    pub fn enable(&mut self) -> &mut Self {
        self.set_enabled(true);
        self
    }

    /// Detach observation without discarding registry state. Idempotent.
    pub fn disable(&mut self) -> &mut Self {
        self.set_enabled(false);
        self
    }

    /// Force a full re-geometry of every step's watches, for layout changes
    /// the size watches cannot see (e.g. a window resize).
    pub fn resize(&mut self) -> &mut Self {
        if self.enabled {
            self.detach_all_watches();
            self.attach_all_watches();
        }
        self
    }

    /// Current global trigger offset value (a fraction in percent format,
    /// raw pixels otherwise).
    pub fn offset(&self) -> f64 {
        self.session
            .as_ref()
            .map(|s| s.global_offset.value)
            .unwrap_or(0.5)
    }

    /// Reparse the global trigger offset and reapply geometry to all steps.
    ///
    /// Unparseable input keeps the previous offset with a warning.
    pub fn set_offset(&mut self, offset: impl Into<OffsetInput>) -> &mut Self {
        let input = offset.into();
        let Some(parsed) = parse_offset(&input) else {
            warn!(id = self.id, input = ?input, "ignoring unparseable offset");
            return self;
        };
        let Some(session) = self.session.as_mut() else {
            debug!(id = self.id, "set_offset before setup has no effect");
            return self;
        };
        session.global_offset = parsed;
        self.resize();
        self
    }

    /// Tear the session down: detach observation, clear the registry and
    /// callbacks, release the scroll listener registration.
    pub fn destroy(&mut self) -> &mut Self {
        self.set_enabled(false);
        self.callbacks.reset();
        self.scheduler.clear();
        let was_debug = self.session.as_ref().is_some_and(|s| s.debug_mode);
        self.release_container();
        self.registry.clear();
        self.watch_table.clear();
        if was_debug {
            self.host.clear_trigger_overlay();
        }
        debug!(id = self.id, "destroyed");
        self
    }

    /// Register the enter handler. Last registration wins.
    pub fn on_step_enter(&mut self, handler: impl FnMut(&StepEnter<H::Node>) + 'static) -> &mut Self {
        self.callbacks.enter = Some(Box::new(handler));
        self
    }

    /// Register the exit handler. Last registration wins.
    pub fn on_step_exit(&mut self, handler: impl FnMut(&StepExit<H::Node>) + 'static) -> &mut Self {
        self.callbacks.exit = Some(Box::new(handler));
        self
    }

    /// Register the progress handler. Last registration wins.
    pub fn on_step_progress(
        &mut self,
        handler: impl FnMut(&StepProgress<H::Node>) + 'static,
    ) -> &mut Self {
        self.callbacks.progress = Some(Box::new(handler));
        self
    }

    // ========================================================================
    // Host event intake
    // ========================================================================

    /// Feed a scroll position observed for a container.
    pub fn handle_scroll(&mut self, container: &H::Container, position: f64) {
        self.tracker.on_scroll(container, position);
    }

    /// Feed a crossing record for a watch handle.
    ///
    /// Records for unknown handles (detached, or delivered after destroy)
    /// are ignored.
    pub fn handle_crossing(&mut self, watch: WatchId, record: CrossingRecord) {
        let Some(binding) = self.watch_table.get(&watch).copied() else {
            return;
        };
        match binding.purpose {
            WatchPurpose::Boundary => {
                if record.is_intersecting {
                    self.notify_step_enter(binding.step);
                } else {
                    self.notify_step_exit(binding.step);
                }
            }
            WatchPurpose::Progress => {
                let entered = self
                    .registry
                    .get(binding.step)
                    .is_some_and(|step| step.state.is_entered());
                if record.is_intersecting && entered {
                    self.queue_progress(binding.step, record.ratio);
                }
            }
            WatchPurpose::Size => {}
        }
    }

    /// Feed a size observation for a watch handle.
    ///
    /// Heights that did not actually change are dropped so no-op observer
    /// firings cause no watch churn.
    pub fn handle_resize(&mut self, watch: WatchId, height: f64) {
        let Some(binding) = self.watch_table.get(&watch).copied() else {
            return;
        };
        if binding.purpose != WatchPurpose::Size {
            return;
        }
        let Some(step) = self.registry.get_mut(binding.step) else {
            return;
        };
        if step.height == height {
            return;
        }
        step.height = height;
        if self.scheduler.queue_resize(binding.step) {
            self.host.request_frame();
        }
    }

    /// Frame callback: drain all pending progress deliveries, then all
    /// pending re-geometry, in one pass.
    pub fn handle_frame(&mut self) {
        self.scheduler.begin_frame();
        for (index, update) in self.scheduler.take_progress() {
            self.flush_progress(index, update);
        }
        let progress_mode = self.session.as_ref().is_some_and(|s| s.progress_mode);
        for index in self.scheduler.take_resize() {
            self.detach_watches(index, false);
            self.attach_step_watches(index, progress_mode);
        }
    }

    // ========================================================================
    // Visibility transitions
    // ========================================================================

    fn current_direction(&self) -> Direction {
        match self.session.as_ref() {
            Some(session) => self.tracker.direction(&session.container),
            None => Direction::default(),
        }
    }

    fn notify_step_enter(&mut self, index: usize) {
        let direction = self.current_direction();
        let once_mode = self.session.as_ref().is_some_and(|s| s.once_mode);
        let excluded = self.registry.is_excluded(index);

        let Some(step) = self.registry.get_mut(index) else {
            return;
        };
        let Some(next) = step.state.on_crossing(Crossing::Enter) else {
            return;
        };
        step.direction = Some(direction);
        step.state = next;
        let event = StepEnter {
            element: step.node.clone(),
            index,
            direction,
        };

        if !excluded {
            if let Some(callback) = self.callbacks.enter.as_mut() {
                callback(&event);
            }
        }
        if once_mode {
            self.registry.exclude(index);
        }
    }

    fn notify_step_exit(&mut self, index: usize) {
        let direction = self.current_direction();
        let progress_mode = self.session.as_ref().is_some_and(|s| s.progress_mode);

        let Some(step) = self.registry.get(index) else {
            return;
        };
        if step.state.on_crossing(Crossing::Exit).is_none() {
            return;
        }

        // Deliver the snapped boundary reading before the exit notification,
        // replacing whatever was still waiting on the next frame.
        if progress_mode {
            let snap = match direction {
                Direction::Down if step.progress < 1.0 => Some(1.0),
                Direction::Up if step.progress > 0.0 => Some(0.0),
                _ => None,
            };
            if let Some(progress) = snap {
                self.scheduler.cancel_progress(index);
                self.flush_progress(index, PendingProgress { progress, direction });
            }
        }

        let Some(step) = self.registry.get_mut(index) else {
            return;
        };
        step.direction = Some(direction);
        step.state = StepState::Exited;
        let event = StepExit {
            element: step.node.clone(),
            index,
            direction,
        };
        if let Some(callback) = self.callbacks.exit.as_mut() {
            callback(&event);
        }
    }

    fn queue_progress(&mut self, index: usize, ratio: f64) {
        let update = PendingProgress {
            progress: ratio.clamp(0.0, 1.0),
            direction: self.current_direction(),
        };
        if self.scheduler.queue_progress(index, update) {
            self.host.request_frame();
        }
    }

    fn flush_progress(&mut self, index: usize, update: PendingProgress) {
        let Some(step) = self.registry.get_mut(index) else {
            return;
        };
        step.progress = update.progress;
        if !step.state.is_entered() {
            // Stale reading for a step that exited before the flush.
            return;
        }
        let event = StepProgress {
            element: step.node.clone(),
            index,
            progress: update.progress,
            direction: update.direction,
        };
        if let Some(callback) = self.callbacks.progress.as_mut() {
            callback(&event);
        }
    }

    // ========================================================================
    // Watch attachment
    // ========================================================================

    fn set_enabled(&mut self, enable: bool) {
        if enable && !self.enabled {
            self.attach_all_watches();
            debug!(id = self.id, "enabled");
        }
        if !enable && self.enabled {
            self.detach_all_watches();
            // An already-requested frame callback must find nothing to drain.
            self.scheduler.clear();
            debug!(id = self.id, "disabled");
        }
        self.enabled = enable;
    }

    fn attach_all_watches(&mut self) {
        let Some(progress_mode) = self.session.as_ref().map(|s| s.progress_mode) else {
            return;
        };
        for index in self.registry.indices() {
            self.attach_size_watch(index);
            self.attach_step_watches(index, progress_mode);
        }
    }

    fn attach_step_watches(&mut self, index: usize, progress_mode: bool) {
        self.attach_boundary_watch(index);
        if progress_mode {
            self.attach_progress_watch(index);
        }
    }

    fn attach_boundary_watch(&mut self, index: usize) {
        let viewport_height = self.host.viewport_height();
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(step) = self.registry.get(index) else {
            return;
        };
        let offset_px =
            engine::offset_pixels(step.offset.as_ref(), &session.global_offset, viewport_height);
        let geometry = engine::boundary_geometry(step.height, offset_px, viewport_height);
        let overlay = OverlayRegion {
            top: -geometry.margin_top,
            height: step.height,
        };
        let node = step.node.clone();
        let root = session.root.clone();
        let debug_mode = session.debug_mode;

        let watch = self.host.observe_crossing(&node, geometry.into_config(root));
        self.watch_table.insert(
            watch,
            WatchBinding {
                step: index,
                purpose: WatchPurpose::Boundary,
            },
        );
        if let Some(step) = self.registry.get_mut(index) {
            step.watches.boundary = Some(watch);
        }
        if debug_mode {
            self.host.show_trigger_overlay(overlay);
        }
    }

    fn attach_progress_watch(&mut self, index: usize) {
        let viewport_height = self.host.viewport_height();
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let Some(step) = self.registry.get(index) else {
            return;
        };
        let offset_px =
            engine::offset_pixels(step.offset.as_ref(), &session.global_offset, viewport_height);
        let geometry = engine::progress_geometry(
            step.height,
            offset_px,
            viewport_height,
            session.granularity_px,
        );
        let node = step.node.clone();
        let root = session.root.clone();

        let watch = self.host.observe_crossing(&node, geometry.into_config(root));
        self.watch_table.insert(
            watch,
            WatchBinding {
                step: index,
                purpose: WatchPurpose::Progress,
            },
        );
        if let Some(step) = self.registry.get_mut(index) {
            step.watches.progress = Some(watch);
        }
    }

    fn attach_size_watch(&mut self, index: usize) {
        let Some(step) = self.registry.get(index) else {
            return;
        };
        let node = step.node.clone();
        let watch = self.host.observe_size(&node);
        self.watch_table.insert(
            watch,
            WatchBinding {
                step: index,
                purpose: WatchPurpose::Size,
            },
        );
        if let Some(step) = self.registry.get_mut(index) {
            step.watches.size = Some(watch);
        }
    }

    fn detach_all_watches(&mut self) {
        for index in self.registry.indices() {
            self.detach_watches(index, true);
        }
    }

    /// Disconnect a step's watches; `include_size` stays false during
    /// resize re-geometry so the size watch keeps reporting.
    fn detach_watches(&mut self, index: usize, include_size: bool) {
        let Some(step) = self.registry.get_mut(index) else {
            return;
        };
        let mut handles: SmallVec<[WatchId; 3]> = SmallVec::new();
        handles.extend(step.watches.boundary.take());
        handles.extend(step.watches.progress.take());
        if include_size {
            handles.extend(step.watches.size.take());
        }
        for watch in handles {
            self.watch_table.remove(&watch);
            self.host.disconnect(watch);
        }
    }

    fn release_container(&mut self) {
        if let Some(session) = self.session.take() {
            if self.tracker.unregister(&session.container) {
                self.host.unwatch_scroll(&session.container);
            }
        }
    }
}
