//! Observation capability types
//!
//! Configuration and records exchanged with the host's crossing and size
//! observation primitives. Watch handles are minted by the host and used by
//! the engine to route delivered events back to the owning step.

use slotmap::new_key_type;
use smallvec::SmallVec;

new_key_type! {
    /// Handle to one attached observation, minted by the host.
    pub struct WatchId;
}

/// Threshold list for a crossing watch.
///
/// Boundary watches carry a single midpoint threshold; progress watches
/// carry a ladder of fractions and spill to the heap.
pub type Thresholds = SmallVec<[f64; 4]>;

/// Geometry and firing configuration for a crossing watch.
///
/// Margins grow (positive) or shrink (negative) the observed band the way
/// the native primitive's root margins do; thresholds are the intersection
/// ratios at which the host must deliver a crossing record.
#[derive(Clone, Debug, PartialEq)]
pub struct CrossingConfig<N> {
    /// Intersection root override; `None` observes against the viewport.
    pub root: Option<N>,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub thresholds: Thresholds,
}

/// One crossing observation delivered by the host.
///
/// `is_intersecting` is judged against the watch's threshold criterion
/// (`ratio >= 0.5` for a boundary watch's midpoint threshold), and `ratio`
/// is the current intersection ratio. Hosts deliver the current state once
/// when a watch is attached, mirroring the native primitives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrossingRecord {
    pub is_intersecting: bool,
    pub ratio: f64,
}

/// Region pushed to the host debug overlay for a step's boundary watch.
///
/// `top` is the band's offset from the viewport top; the trigger line sits
/// at `height / 2.0` within the band.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverlayRegion {
    pub top: f64,
    pub height: f64,
}
