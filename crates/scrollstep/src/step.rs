//! Step records and lifecycle state

use scrollstep_core::{Direction, TriggerOffset, WatchId};

/// Lifecycle state of one step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StepState {
    /// Never crossed the trigger line.
    #[default]
    Idle,
    /// Currently straddling the trigger line.
    Entered,
    /// Crossed back out after having entered.
    Exited,
}

/// A crossing judgement delivered by a step's boundary watch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    Enter,
    Exit,
}

impl StepState {
    /// Transition table for boundary crossings.
    ///
    /// Returns the next state, or `None` when the event is not legal from
    /// the current state: an exit on a step that never entered is swallowed,
    /// which is what makes the host's initial not-intersecting report safe.
    pub fn on_crossing(self, crossing: Crossing) -> Option<Self> {
        match (self, crossing) {
            (_, Crossing::Enter) => Some(Self::Entered),
            (Self::Entered, Crossing::Exit) => Some(Self::Exited),
            (Self::Idle | Self::Exited, Crossing::Exit) => None,
        }
    }

    /// Whether progress readings are currently meaningful for the step.
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }
}

/// Watch handles attached to one step, keyed by purpose.
#[derive(Clone, Copy, Debug, Default)]
pub struct StepWatches {
    /// Fires the enter/exit crossings at the trigger line.
    pub boundary: Option<WatchId>,
    /// Fires fine-grained readings across the scroll-through range.
    pub progress: Option<WatchId>,
    /// Fires when the element's measured height changes.
    pub size: Option<WatchId>,
}

/// One observed step element.
///
/// Mutated exclusively by the visibility transitions and the scheduler
/// flush; the registry clears all records on teardown.
#[derive(Clone, Debug)]
pub struct Step<N> {
    /// Position in the registry, 0-based, document order at setup.
    pub index: usize,
    /// The owned element reference.
    pub node: N,
    /// Last measured pixel height.
    pub height: f64,
    /// Per-step trigger offset override; falls back to the global offset.
    pub offset: Option<TriggerOffset>,
    /// Last reported progress fraction.
    pub progress: f64,
    pub state: StepState,
    /// Direction at the last transition.
    pub direction: Option<Direction>,
    pub watches: StepWatches,
}

impl<N> Step<N> {
    pub fn new(index: usize, node: N, height: f64, offset: Option<TriggerOffset>) -> Self {
        Self {
            index,
            node,
            height,
            offset,
            progress: 0.0,
            state: StepState::default(),
            direction: None,
            watches: StepWatches::default(),
        }
    }
}
