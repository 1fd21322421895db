//! Scrollstep Engine
//!
//! Step visibility tracking for scroll-driven narratives: callers register
//! step elements with a [`Host`] environment and receive directional
//! enter/exit notifications and coalesced progress readings as a container
//! scrolls past each step's trigger line.
//!
//! # Architecture
//!
//! ```text
//! Host events                    Scroller intake
//!   scroll position   ──────▶  handle_scroll   ──▶ DirectionTracker
//!   crossing records  ──────▶  handle_crossing ──▶ enter/exit transitions ──▶ callbacks
//!   size records      ──────▶  handle_resize   ──┐
//!   frame callback    ──────▶  handle_frame    ◀─┴─ UpdateScheduler (one flush per frame)
//! ```
//!
//! Boundary crossings transition step state and call back immediately;
//! progress readings and resize-driven re-geometry are coalesced to one
//! delivery per step per frame.
//!
//! # Example
//!
//! ```ignore
//! use scrollstep::{Scroller, SetupConfig};
//!
//! let mut scroller = Scroller::new(host);
//! scroller.setup(SetupConfig::new(".step").progress(true))?;
//! scroller
//!     .on_step_enter(|e| println!("enter {} going {:?}", e.index, e.direction))
//!     .on_step_progress(|e| println!("progress {:.2}", e.progress));
//! ```

mod engine;
mod registry;
mod scheduler;

pub mod direction;
pub mod scroller;
pub mod step;

pub use direction::DirectionTracker;
pub use scroller::{Scroller, SetupConfig, StepSelector};
pub use step::{Crossing, Step, StepState, StepWatches};

// Re-export the host seam so embedders depend on one crate.
pub use scrollstep_core::{
    parse_offset, CrossingConfig, CrossingRecord, Direction, Host, OffsetFormat, OffsetInput,
    OverlayRegion, Result, SetupError, StepEnter, StepExit, StepProgress, Thresholds,
    TriggerOffset, WatchId,
};
