//! Host environment abstraction
//!
//! The engine never touches a rendering surface directly. Everything it
//! needs from the environment - element selection, geometry reads, crossing
//! and size observation, scroll listening and frame scheduling - goes
//! through this trait, so a real DOM-like host and a deterministic test
//! host are interchangeable.

use std::fmt::Debug;
use std::hash::Hash;

use crate::watch::{CrossingConfig, OverlayRegion, WatchId};

/// Host environment capability trait.
///
/// This trait covers the outbound direction only. Hosts deliver events back
/// by calling the engine's intake methods (`handle_scroll`,
/// `handle_crossing`, `handle_resize`, `handle_frame`) with the handles and
/// containers they were given here.
///
/// Hosts are expected to report the current crossing state of a watch once
/// when it is attached, the way the native observation primitives do; the
/// engine's lifecycle guards make the initial not-intersecting report a
/// no-op for steps that never entered.
pub trait Host {
    /// An observable element reference.
    type Node: Clone + Eq + Hash + Debug;
    /// A scrollable container reference.
    type Container: Clone + Eq + Hash + Debug;

    /// Resolve a string selection to elements, optionally scoped to a
    /// parent. Result order must be document order.
    fn select(&mut self, selector: &str, parent: Option<&Self::Node>) -> Vec<Self::Node>;

    /// Current viewport height in pixels.
    fn viewport_height(&mut self) -> f64;

    /// Measured pixel height of an element.
    fn measure_height(&mut self, node: &Self::Node) -> f64;

    /// Raw per-step trigger offset attribute, if the element carries one.
    fn offset_override(&mut self, node: &Self::Node) -> Option<String>;

    /// The container representing the page viewport itself.
    fn root_container(&mut self) -> Self::Container;

    /// Current scroll position of a container.
    fn scroll_position(&mut self, container: &Self::Container) -> f64;

    /// Attach a crossing watch for `node` and return its handle.
    fn observe_crossing(
        &mut self,
        node: &Self::Node,
        config: CrossingConfig<Self::Node>,
    ) -> WatchId;

    /// Attach a size watch for `node` and return its handle.
    fn observe_size(&mut self, node: &Self::Node) -> WatchId;

    /// Detach a previously attached watch.
    fn disconnect(&mut self, watch: WatchId);

    /// Start delivering scroll events for a container.
    fn watch_scroll(&mut self, container: &Self::Container);

    /// Stop delivering scroll events for a container.
    fn unwatch_scroll(&mut self, container: &Self::Container);

    /// Request a single frame callback. The engine enforces the
    /// at-most-one-pending discipline itself; hosts may treat this as
    /// fire-and-forget.
    fn request_frame(&mut self);

    /// Show or move the debug overlay for a boundary watch region.
    fn show_trigger_overlay(&mut self, region: OverlayRegion) {
        let _ = region;
    }

    /// Remove the debug overlay if shown.
    fn clear_trigger_overlay(&mut self) {}
}
