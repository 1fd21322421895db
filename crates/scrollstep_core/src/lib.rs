//! Scrollstep Core
//!
//! This crate provides the seam between the scrollstep engine and whatever
//! environment actually renders and scrolls content:
//!
//! - **Host trait**: injectable capabilities for element selection, geometry
//!   reads, crossing/size observation, scroll listening and frame scheduling
//! - **Watch types**: configuration and records exchanged with the host's
//!   observation primitives
//! - **Trigger offsets**: parsing and normalization of user-supplied trigger
//!   positions
//! - **Event payloads**: the structs handed to step callbacks
//!
//! The engine in the `scrollstep` crate depends only on these types, so a
//! real DOM-like host and a deterministic simulated host are
//! interchangeable.

pub mod error;
pub mod event;
pub mod host;
pub mod offset;
pub mod watch;

pub use error::{Result, SetupError};
pub use event::{Direction, StepEnter, StepExit, StepProgress};
pub use host::Host;
pub use offset::{parse_offset, OffsetFormat, OffsetInput, TriggerOffset};
pub use watch::{CrossingConfig, CrossingRecord, OverlayRegion, Thresholds, WatchId};
