//! Callback payloads delivered to step handlers

/// Scroll direction derived from successive container positions.
///
/// A container that has never scrolled reports `Down`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    Up,
    #[default]
    Down,
}

/// Payload for a step enter notification.
#[derive(Clone, Debug, PartialEq)]
pub struct StepEnter<N> {
    /// The step element that crossed its trigger line.
    pub element: N,
    /// Position of the step in the registry, stable for the session.
    pub index: usize,
    /// Direction the container was scrolling when the crossing fired.
    pub direction: Direction,
}

/// Payload for a step exit notification.
#[derive(Clone, Debug, PartialEq)]
pub struct StepExit<N> {
    pub element: N,
    pub index: usize,
    pub direction: Direction,
}

/// Payload for a coalesced step progress notification.
#[derive(Clone, Debug, PartialEq)]
pub struct StepProgress<N> {
    pub element: N,
    pub index: usize,
    /// Completion fraction through the step's scroll range, `0.0..=1.0`.
    pub progress: f64,
    pub direction: Direction,
}
