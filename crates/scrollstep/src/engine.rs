//! Watch geometry derivation
//!
//! Margins place each observed band so its edges sit exactly on a step's
//! trigger line. The boundary band is one step-height tall and centered on
//! the trigger line, so its midpoint threshold fires when the element is
//! judged to straddle the line. The progress band spans the step's full
//! scroll-through range, making the intersection ratio the completion
//! fraction.

use scrollstep_core::{CrossingConfig, Thresholds, TriggerOffset};
use smallvec::smallvec;

/// Midpoint criterion for boundary watches.
pub(crate) const BOUNDARY_THRESHOLD: f64 = 0.5;

/// Margins and thresholds for one watch.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct WatchGeometry {
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub thresholds: Thresholds,
}

impl WatchGeometry {
    pub fn into_config<N>(self, root: Option<N>) -> CrossingConfig<N> {
        CrossingConfig {
            root,
            margin_top: self.margin_top,
            margin_bottom: self.margin_bottom,
            thresholds: self.thresholds,
        }
    }
}

/// Resolve a step's effective trigger offset to pixels.
pub(crate) fn offset_pixels(
    step_offset: Option<&TriggerOffset>,
    global: &TriggerOffset,
    viewport_height: f64,
) -> f64 {
    step_offset.unwrap_or(global).to_pixels(viewport_height)
}

/// Boundary watch geometry for the enter/exit crossing.
pub(crate) fn boundary_geometry(height: f64, offset_px: f64, viewport_height: f64) -> WatchGeometry {
    WatchGeometry {
        margin_top: height / 2.0 - offset_px,
        margin_bottom: height / 2.0 - (viewport_height - offset_px),
        thresholds: smallvec![BOUNDARY_THRESHOLD],
    }
}

/// Progress watch geometry with a threshold ladder sized so one tick
/// corresponds to `granularity_px` of scroll.
pub(crate) fn progress_geometry(
    height: f64,
    offset_px: f64,
    viewport_height: f64,
    granularity_px: f64,
) -> WatchGeometry {
    WatchGeometry {
        margin_top: height - offset_px,
        margin_bottom: offset_px - viewport_height,
        thresholds: progress_thresholds(height, granularity_px),
    }
}

/// Ladder `0, 1/n, .. 1` with `n = ceil(height / granularity)`, bounded to
/// at least one tick.
pub(crate) fn progress_thresholds(height: f64, granularity_px: f64) -> Thresholds {
    let count = (height / granularity_px).ceil().max(1.0) as usize;
    let ratio = 1.0 / count as f64;
    (0..=count).map(|i| i as f64 * ratio).collect()
}
