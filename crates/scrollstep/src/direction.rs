//! Scroll direction tracking
//!
//! One registry entry per distinct scroll container holds the last seen
//! position and the direction derived from it. Entries are reference
//! counted so several consumers of the same container share a single host
//! scroll listener; the entry is discarded when the last consumer leaves,
//! letting a removed container be collected.
//!
//! Direction updates run on every scroll event, outside the frame
//! scheduler, so the direction is fresh at the moment a crossing is
//! evaluated.

use std::cell::RefCell;
use std::hash::Hash;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use scrollstep_core::Direction;

/// Per-container scroll state. Owned and mutated exclusively by the
/// tracker; consumers only read the derived direction.
#[derive(Debug)]
struct ContainerScrollState {
    last_position: f64,
    direction: Direction,
    listeners: usize,
}

/// Cheap-clone handle to a shared direction registry.
///
/// Scroller instances observing the same container should share a tracker
/// so the host ends up with one scroll listener per container.
#[derive(Debug)]
pub struct DirectionTracker<C> {
    inner: Rc<RefCell<FxHashMap<C, ContainerScrollState>>>,
}

impl<C> Clone for DirectionTracker<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<C> Default for DirectionTracker<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> DirectionTracker<C> {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(FxHashMap::default())),
        }
    }
}

impl<C: Eq + Hash + Clone> DirectionTracker<C> {
    /// Register a consumer for `container`, seeding new state with the
    /// current scroll position and direction `Down`.
    ///
    /// Returns `true` when this was the first registration, in which case
    /// the caller must attach the host scroll listener.
    pub fn register(&self, container: C, position: f64) -> bool {
        let mut registry = self.inner.borrow_mut();
        if let Some(state) = registry.get_mut(&container) {
            state.listeners += 1;
            false
        } else {
            registry.insert(
                container,
                ContainerScrollState {
                    last_position: position,
                    direction: Direction::Down,
                    listeners: 1,
                },
            );
            true
        }
    }

    /// Release one registration.
    ///
    /// Returns `true` when the last consumer left and the caller must
    /// detach the host scroll listener. Unknown containers are a no-op.
    pub fn unregister(&self, container: &C) -> bool {
        let mut registry = self.inner.borrow_mut();
        let Some(state) = registry.get_mut(container) else {
            return false;
        };
        state.listeners -= 1;
        if state.listeners == 0 {
            registry.remove(container);
            true
        } else {
            false
        }
    }

    /// Feed a scroll position observed for `container`.
    ///
    /// An unchanged position leaves the direction untouched.
    pub fn on_scroll(&self, container: &C, position: f64) {
        let mut registry = self.inner.borrow_mut();
        let Some(state) = registry.get_mut(container) else {
            return;
        };
        if position == state.last_position {
            return;
        }
        state.direction = if position > state.last_position {
            Direction::Down
        } else {
            Direction::Up
        };
        state.last_position = position;
    }

    /// Current direction for `container`; `Down` if it was never
    /// registered.
    pub fn direction(&self, container: &C) -> Direction {
        self.inner
            .borrow()
            .get(container)
            .map(|state| state.direction)
            .unwrap_or_default()
    }

    /// Number of live registrations for `container`.
    pub fn listener_count(&self, container: &C) -> usize {
        self.inner
            .borrow()
            .get(container)
            .map(|state| state.listeners)
            .unwrap_or(0)
    }
}
