//! This module provides functions for analyzing transition tables to detect structural
//! errors before any machine runs on them, plus reachability diagnostics.

use crate::table::{TableEntry, TransitionTable};
use crate::types::TuringMachineError;
use std::collections::HashSet;
use tracing::debug;

/// Represents the problems that can be found while analyzing a transition table.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum AnalysisError {
    /// The table has no states at all, so it has no accept state either.
    NoStates,
    /// Transitions target states outside `[0, N)`, listed as `(source, target)`.
    UndefinedTargets(Vec<(usize, usize)>),
    /// The accept state carries outgoing transitions.
    AcceptStateHasTransitions(usize),
}

impl From<AnalysisError> for TuringMachineError {
    /// Converts an `AnalysisError` into a `TuringMachineError::ValidationError`.
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::NoStates => {
                TuringMachineError::ValidationError("Table has no states".to_string())
            }
            AnalysisError::UndefinedTargets(targets) => TuringMachineError::ValidationError(
                format!("Transitions reference undefined states: {:?}", targets),
            ),
            AnalysisError::AcceptStateHasTransitions(state) => {
                TuringMachineError::ValidationError(format!(
                    "Accept state {} must not have outgoing transitions",
                    state
                ))
            }
        }
    }
}

/// Analyzes a transition table for structural errors.
///
/// Unreachable states are legal and are only reported at debug level.
///
/// # Returns
///
/// * `Ok(())` if no errors are found.
/// * `Err(TuringMachineError::ValidationError)` for the first violated rule.
pub fn analyze<T: TableEntry>(table: &TransitionTable<T>) -> Result<(), TuringMachineError> {
    let checks: [fn(&TransitionTable<T>) -> Result<(), AnalysisError>; 3] =
        [check_states, check_targets, check_accept_state];

    let errors = checks
        .iter()
        .filter_map(|f| f(table).err())
        .collect::<Vec<_>>();

    if let Some(first_error) = errors.into_iter().next() {
        return Err(first_error.into());
    }

    let unreachable = unreachable_states(table);
    if !unreachable.is_empty() {
        debug!(count = unreachable.len(), "table has unreachable states");
    }

    Ok(())
}

fn check_states<T: TableEntry>(table: &TransitionTable<T>) -> Result<(), AnalysisError> {
    if table.is_empty() {
        return Err(AnalysisError::NoStates);
    }

    Ok(())
}

/// Checks that every transition targets a state inside the table.
fn check_targets<T: TableEntry>(table: &TransitionTable<T>) -> Result<(), AnalysisError> {
    let undefined: Vec<(usize, usize)> = (0..table.len())
        .flat_map(|state| {
            table
                .transitions(state)
                .map(move |(_, entry)| (state, entry.target()))
        })
        .filter(|&(_, target)| target >= table.len())
        .collect();

    if !undefined.is_empty() {
        return Err(AnalysisError::UndefinedTargets(undefined));
    }

    Ok(())
}

/// Checks that the accept state is terminal.
fn check_accept_state<T: TableEntry>(table: &TransitionTable<T>) -> Result<(), AnalysisError> {
    let accept = table.accept_state();
    if !table.is_empty() && table.transitions(accept).next().is_some() {
        return Err(AnalysisError::AcceptStateHasTransitions(accept));
    }

    Ok(())
}

/// Returns the states reachable from state 0 by following transitions,
/// ignoring what is actually on the tape.
pub fn reachable_states<T: TableEntry>(table: &TransitionTable<T>) -> HashSet<usize> {
    let mut visited = HashSet::new();
    if table.is_empty() {
        return visited;
    }

    let mut queue = vec![0];
    while let Some(state) = queue.pop() {
        if !visited.insert(state) {
            continue;
        }

        for (_, entry) in table.transitions(state) {
            if entry.target() < table.len() && !visited.contains(&entry.target()) {
                queue.push(entry.target());
            }
        }
    }

    visited
}

/// Returns the states that can never be entered from state 0, sorted.
pub fn unreachable_states<T: TableEntry>(table: &TransitionTable<T>) -> Vec<usize> {
    let reachable = reachable_states(table);
    (0..table.len())
        .filter(|state| !reachable.contains(state))
        .collect()
}
