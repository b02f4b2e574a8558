//! Transition tables for single- and two-tape machines.
//!
//! Tables are accumulated through a [`TableBuilder`] and frozen into an
//! immutable [`TransitionTable`] once validated. Executors only ever see the
//! frozen form, usually behind an `Arc`.

use crate::analyzer::analyze;
use crate::types::{DualTransition, Symbol, TapeSymbol, Transition, TuringMachineError};
use std::collections::BTreeMap;
use std::fmt;

/// A kind of transition together with the key it is read under.
pub trait TableEntry: Copy + fmt::Debug {
    /// What the machine reads to select this transition.
    type Key: Copy + Ord + fmt::Debug;

    fn target(&self) -> usize;

    /// Human-readable form of a key, used in error messages.
    fn key_label(key: &Self::Key) -> String;

    /// Writes one entry in the line-oriented text format.
    fn fmt_entry(key: &Self::Key, entry: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl TableEntry for Transition {
    type Key = TapeSymbol;

    fn target(&self) -> usize {
        self.target
    }

    fn key_label(key: &TapeSymbol) -> String {
        key.to_string()
    }

    fn fmt_entry(key: &TapeSymbol, entry: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            key, entry.target, entry.write, entry.direction
        )
    }
}

impl TableEntry for DualTransition {
    type Key = [Symbol; 2];

    fn target(&self) -> usize {
        self.target
    }

    fn key_label(key: &[Symbol; 2]) -> String {
        format!("{}{}", key[0], key[1])
    }

    fn fmt_entry(key: &[Symbol; 2], entry: &Self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {} {}",
            key[0],
            key[1],
            entry.target,
            entry.write[0],
            entry.write[1],
            entry.directions[0],
            entry.directions[1]
        )
    }
}

/// An immutable transition table. State `len() - 1` is the accept state.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionTable<T: TableEntry> {
    states: Vec<BTreeMap<T::Key, T>>,
}

/// A single-tape table.
pub type SingleTable = TransitionTable<Transition>;
/// A two-tape table.
pub type DualTable = TransitionTable<DualTransition>;

impl<T: TableEntry> TransitionTable<T> {
    /// Number of states, the accept state included.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// The highest-indexed state. Validated tables always have one.
    pub fn accept_state(&self) -> usize {
        self.states.len().saturating_sub(1)
    }

    /// Looks up the transition for `state` on `key`.
    pub fn get(&self, state: usize, key: &T::Key) -> Option<&T> {
        self.states.get(state).and_then(|map| map.get(key))
    }

    /// Iterates the transitions leaving `state`, ordered by key.
    pub fn transitions(&self, state: usize) -> impl Iterator<Item = (&T::Key, &T)> {
        self.states.get(state).into_iter().flat_map(|map| map.iter())
    }

    /// Total number of transitions over every state.
    pub fn transition_count(&self) -> usize {
        self.states.iter().map(BTreeMap::len).sum()
    }
}

impl<T: TableEntry> fmt::Display for TransitionTable<T> {
    /// Renders the table in the line-oriented text format: the state count,
    /// then one row per non-accept state.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.states.len())?;

        for map in self.states.iter().take(self.accept_state()) {
            write!(f, "\n{}", map.len())?;
            for (key, entry) in map {
                write!(f, " ")?;
                T::fmt_entry(key, entry, f)?;
            }
        }

        Ok(())
    }
}

/// Accumulates states and transitions before freezing them into a table.
#[derive(Debug, Clone)]
pub struct TableBuilder<T: TableEntry> {
    states: Vec<BTreeMap<T::Key, T>>,
}

impl<T: TableEntry> Default for TableBuilder<T> {
    fn default() -> Self {
        Self { states: Vec::new() }
    }
}

impl<T: TableEntry> TableBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with `count` empty states.
    pub fn with_states(count: usize) -> Self {
        Self {
            states: vec![BTreeMap::new(); count],
        }
    }

    /// Appends an empty state and returns its index.
    pub fn add_state(&mut self) -> usize {
        self.states.push(BTreeMap::new());
        self.states.len() - 1
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Registers a transition leaving `state` on `key`.
    ///
    /// Targets are checked when the table is built, since they may name
    /// states that have not been added yet.
    ///
    /// # Returns
    ///
    /// * `Err(TuringMachineError::InvalidState)` if `state` was never added.
    /// * `Err(TuringMachineError::DuplicateTransition)` if `(state, key)` already has a transition.
    pub fn add_transition(
        &mut self,
        state: usize,
        key: T::Key,
        transition: T,
    ) -> Result<&mut Self, TuringMachineError> {
        let map = self
            .states
            .get_mut(state)
            .ok_or(TuringMachineError::InvalidState(state))?;

        if map.contains_key(&key) {
            return Err(TuringMachineError::DuplicateTransition {
                state,
                key: T::key_label(&key),
            });
        }

        map.insert(key, transition);
        Ok(self)
    }

    /// Validates the accumulated states and freezes them.
    pub fn build(self) -> Result<TransitionTable<T>, TuringMachineError> {
        let table = TransitionTable {
            states: self.states,
        };
        analyze(&table)?;

        Ok(table)
    }
}
