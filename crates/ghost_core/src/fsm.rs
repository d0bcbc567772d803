//! State Machine Runtime
//!
//! Flat, table-driven state machines with typed states and events.
//! Events that have no transition from the current state are ignored and
//! reported back to the caller, so rejected commands can be logged instead of
//! silently mutating state.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use std::fmt::Debug;
use std::hash::Hash;

/// Bound shared by state and event types
pub trait FsmKey: Copy + Eq + Hash + Debug {}

impl<T: Copy + Eq + Hash + Debug> FsmKey for T {}

/// A transition in the state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition<S, E> {
    pub from: S,
    pub event: E,
    pub to: S,
}

impl<S: FsmKey, E: FsmKey> Transition<S, E> {
    pub fn new(from: S, event: E, to: S) -> Self {
        Self { from, event, to }
    }
}

/// Builder for creating state machines
pub struct StateMachineBuilder<S, E> {
    initial_state: S,
    table: FxHashMap<(S, E), S>,
    history_limit: Option<usize>,
}

impl<S: FsmKey, E: FsmKey> StateMachineBuilder<S, E> {
    pub fn new(initial_state: S) -> Self {
        Self {
            initial_state,
            table: FxHashMap::default(),
            history_limit: None,
        }
    }

    /// Keep at most `limit` transitions, dropping the oldest first
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = Some(limit);
        self
    }

    /// Add a transition (from, event, to)
    pub fn on(mut self, from: S, event: E, to: S) -> Self {
        self.table.insert((from, event), to);
        self
    }

    /// Add the same event transition from several source states
    pub fn on_any(mut self, from: &[S], event: E, to: S) -> Self {
        for state in from {
            self.table.insert((*state, event), to);
        }
        self
    }

    pub fn build(self) -> StateMachine<S, E> {
        StateMachine {
            current_state: self.initial_state,
            table: self.table,
            history: SmallVec::new(),
            history_limit: self.history_limit,
        }
    }
}

/// A state machine instance
pub struct StateMachine<S, E> {
    current_state: S,
    table: FxHashMap<(S, E), S>,
    /// History of state transitions (for debugging and run reports)
    history: SmallVec<[Transition<S, E>; 8]>,
    history_limit: Option<usize>,
}

impl<S: FsmKey, E: FsmKey> StateMachine<S, E> {
    pub fn builder(initial_state: S) -> StateMachineBuilder<S, E> {
        StateMachineBuilder::new(initial_state)
    }

    pub fn current_state(&self) -> S {
        self.current_state
    }

    pub fn is_in(&self, state: S) -> bool {
        self.current_state == state
    }

    pub fn history(&self) -> &[Transition<S, E>] {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    /// Check if an event can trigger a transition from current state
    pub fn can_send(&self, event: E) -> bool {
        self.table.contains_key(&(self.current_state, event))
    }

    /// Send an event; returns the transition taken, or `None` if the event
    /// is not valid in the current state.
    pub fn send(&mut self, event: E) -> Option<Transition<S, E>> {
        let from = self.current_state;
        let to = *self.table.get(&(from, event))?;

        self.current_state = to;
        let transition = Transition::new(from, event, to);
        match self.history_limit {
            Some(0) => {}
            Some(limit) => {
                if self.history.len() >= limit {
                    let excess = self.history.len() + 1 - limit;
                    self.history.drain(..excess);
                }
                self.history.push(transition);
            }
            None => self.history.push(transition),
        }
        tracing::trace!(?from, ?event, ?to, "fsm transition");
        Some(transition)
    }
}
