//! This module defines the single-tape executor, the [`Tape`] both executors share,
//! and the [`Machine`] trait that drives a run to completion and records its trace.

use crate::table::SingleTable;
use crate::types::{Direction, Outcome, Step, Symbol, TapeSymbol, Trace};
use std::sync::Arc;

/// A tape unbounded to the right with a single head.
///
/// Cells past the end are blank and only materialized when the head reaches
/// them. Moving left from position 0 leaves the head at 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape<S> {
    cells: Vec<S>,
    head: usize,
    blank: S,
}

impl<S: Copy> Tape<S> {
    pub fn new(blank: S) -> Self {
        Self {
            cells: Vec::new(),
            head: 0,
            blank,
        }
    }

    /// Replaces the content of the tape and parks the head at position 0.
    pub fn load<I: IntoIterator<Item = S>>(&mut self, content: I) {
        self.cells.clear();
        self.cells.extend(content);
        self.head = 0;
    }

    /// Returns the symbol under the head, extending the tape with blanks if needed.
    pub fn read(&mut self) -> S {
        self.materialize();
        self.cells[self.head]
    }

    pub fn write(&mut self, symbol: S) {
        self.materialize();
        self.cells[self.head] = symbol;
    }

    pub fn shift(&mut self, direction: Direction) {
        match direction {
            Direction::Left => self.head = self.head.saturating_sub(1),
            Direction::Right => self.head += 1,
        }
    }

    pub fn head(&self) -> usize {
        self.head
    }

    /// The materialized part of the tape.
    pub fn cells(&self) -> &[S] {
        &self.cells
    }

    fn materialize(&mut self) {
        if self.head >= self.cells.len() {
            self.cells.resize(self.head + 1, self.blank);
        }
    }
}

/// A deterministic machine that can be stepped and driven to a halt.
pub trait Machine {
    /// Executes one transition.
    fn step(&mut self) -> Step;

    /// The current state index.
    fn state(&self) -> usize;

    /// Transitions executed since the last load.
    fn step_count(&self) -> usize;

    /// Drives the machine from its current configuration until it halts or,
    /// when `limit` is given, until `step_count()` reaches it.
    ///
    /// Without a limit a machine that never halts never returns.
    fn resume(&mut self, limit: Option<usize>) -> Trace {
        let mut states = Vec::new();

        loop {
            if limit.is_some_and(|limit| self.step_count() >= limit) {
                return Trace {
                    states,
                    outcome: Outcome::Undetermined,
                };
            }

            match self.step() {
                Step::Continue => states.push(self.state()),
                Step::Halt(outcome) => return Trace { states, outcome },
            }
        }
    }
}

/// A deterministic single-tape Turing machine over the encoded alphabet.
///
/// The table is shared and read-only; the tape, head and state belong to this
/// instance and are reset by every load.
#[derive(Debug, Clone)]
pub struct TapeMachine {
    table: Arc<SingleTable>,
    state: usize,
    tape: Tape<TapeSymbol>,
    step_count: usize,
    halted: Option<Outcome>,
}

impl TapeMachine {
    /// Creates a machine over `table`, starting in state 0 on an empty tape.
    pub fn new(table: impl Into<Arc<SingleTable>>) -> Self {
        Self {
            table: table.into(),
            state: 0,
            tape: Tape::new(TapeSymbol::BLANK),
            step_count: 0,
            halted: None,
        }
    }

    /// Runs on `input` from state 0 until the machine halts.
    ///
    /// There is no step ceiling: a table that never halts on `input` makes
    /// this loop forever. Use [`TapeMachine::run_bounded`] when that matters.
    pub fn run(&mut self, input: &[Symbol]) -> Trace {
        self.load(input);
        self.resume(None)
    }

    /// Runs on `input`, giving up with `Outcome::Undetermined` after `limit` steps.
    pub fn run_bounded(&mut self, input: &[Symbol], limit: usize) -> Trace {
        self.load(input);
        self.resume(Some(limit))
    }

    /// Resets the machine and writes `input` at the start of the tape.
    pub fn load(&mut self, input: &[Symbol]) {
        self.load_cells(0, input.iter().copied().map(TapeSymbol::from));
    }

    /// Resets the machine into `state` with `cells` already on the tape.
    pub fn load_cells<I: IntoIterator<Item = TapeSymbol>>(&mut self, state: usize, cells: I) {
        self.reset();
        self.state = state;
        self.tape.load(cells);
    }

    /// Returns the machine to state 0 with an empty tape.
    pub fn reset(&mut self) {
        self.state = 0;
        self.tape.load(std::iter::empty());
        self.step_count = 0;
        self.halted = None;
    }

    pub fn table(&self) -> &SingleTable {
        &self.table
    }

    pub fn tape(&self) -> &[TapeSymbol] {
        self.tape.cells()
    }

    pub fn head(&self) -> usize {
        self.tape.head()
    }

    /// The outcome of the run, once halted.
    pub fn halted(&self) -> Option<Outcome> {
        self.halted
    }
}

impl Machine for TapeMachine {
    fn step(&mut self) -> Step {
        if let Some(outcome) = self.halted {
            return Step::Halt(outcome);
        }

        let read = self.tape.read();
        let Some(transition) = self.table.get(self.state, &read).copied() else {
            self.halted = Some(Outcome::Reject);
            return Step::Halt(Outcome::Reject);
        };

        self.tape.write(transition.write);
        self.tape.shift(transition.direction);
        self.state = transition.target;
        self.step_count += 1;

        if transition.target == self.table.accept_state() {
            let outcome = Outcome::Accept(transition.target);
            self.halted = Some(outcome);
            return Step::Halt(outcome);
        }

        Step::Continue
    }

    fn state(&self) -> usize {
        self.state
    }

    fn step_count(&self) -> usize {
        self.step_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableBuilder;
    use crate::types::{parse_symbols, Transition};

    fn transition(target: usize, write: Symbol, direction: Direction) -> Transition {
        Transition {
            target,
            write: write.into(),
            direction,
        }
    }

    /// Accepts strings that start with `1`, walking right over the rest and
    /// accepting on the first blank.
    fn create_leading_one_table() -> SingleTable {
        let mut builder = TableBuilder::with_states(3);
        builder
            .add_transition(0, Symbol::One.into(), transition(1, Symbol::One, Direction::Right))
            .unwrap()
            .add_transition(1, Symbol::Zero.into(), transition(1, Symbol::Zero, Direction::Right))
            .unwrap()
            .add_transition(1, Symbol::One.into(), transition(1, Symbol::One, Direction::Right))
            .unwrap()
            .add_transition(1, Symbol::Blank.into(), transition(2, Symbol::Blank, Direction::Left))
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_tape_clamps_left() {
        let mut tape = Tape::new(Symbol::Blank);
        tape.load([Symbol::One]);
        tape.shift(Direction::Left);
        assert_eq!(tape.head(), 0);
        assert_eq!(tape.read(), Symbol::One);
    }

    #[test]
    fn test_tape_materializes_blanks() {
        let mut tape = Tape::new(Symbol::Blank);
        tape.shift(Direction::Right);
        tape.shift(Direction::Right);
        assert!(tape.cells().is_empty());
        assert_eq!(tape.read(), Symbol::Blank);
        assert_eq!(tape.cells().len(), 3);
    }

    #[test]
    fn test_accepting_run() {
        let mut machine = TapeMachine::new(create_leading_one_table());
        let trace = machine.run(&parse_symbols("101").unwrap());

        assert_eq!(trace.outcome, Outcome::Accept(2));
        assert_eq!(trace.states, vec![1, 1, 1]);
        assert_eq!(trace.to_string(), "1\n1\n1\n2");
        assert_eq!(machine.step_count(), 4);
    }

    #[test]
    fn test_rejecting_run() {
        let mut machine = TapeMachine::new(create_leading_one_table());
        let trace = machine.run(&parse_symbols("01").unwrap());

        assert_eq!(trace.outcome, Outcome::Reject);
        assert_eq!(trace.to_string(), "-1");
    }

    #[test]
    fn test_halted_machine_stays_halted() {
        let mut machine = TapeMachine::new(create_leading_one_table());
        machine.run(&parse_symbols("1").unwrap());

        assert_eq!(machine.halted(), Some(Outcome::Accept(2)));
        assert_eq!(machine.step(), Step::Halt(Outcome::Accept(2)));
    }

    #[test]
    fn test_runs_are_deterministic() {
        let mut machine = TapeMachine::new(create_leading_one_table());
        let input = parse_symbols("1100").unwrap();

        let first = machine.run(&input);
        let second = machine.run(&input);
        assert_eq!(first, second);
    }

    #[test]
    fn test_left_move_at_origin_is_clamped() {
        let mut builder = TableBuilder::with_states(3);
        builder
            .add_transition(0, Symbol::Zero.into(), transition(1, Symbol::One, Direction::Left))
            .unwrap()
            .add_transition(1, Symbol::One.into(), transition(2, Symbol::One, Direction::Right))
            .unwrap();
        let mut machine = TapeMachine::new(builder.build().unwrap());
        machine.load(&parse_symbols("0").unwrap());

        assert_eq!(machine.step(), Step::Continue);
        assert_eq!(machine.head(), 0);
        assert_eq!(machine.step(), Step::Halt(Outcome::Accept(2)));
        assert_eq!(machine.head(), 1);
    }

    #[test]
    fn test_machine_without_transitions_rejects_everything() {
        let table = TableBuilder::<Transition>::with_states(2).build().unwrap();
        let mut machine = TapeMachine::new(table);

        assert!(machine.run(&parse_symbols("0110").unwrap()).is_reject());
        assert!(machine.run(&[]).is_reject());
    }

    #[test]
    fn test_bounded_run_is_undetermined() {
        let mut builder = TableBuilder::with_states(2);
        builder
            .add_transition(0, Symbol::Blank.into(), transition(0, Symbol::Blank, Direction::Right))
            .unwrap();
        let mut machine = TapeMachine::new(builder.build().unwrap());

        let trace = machine.run_bounded(&[], 25);
        assert!(trace.is_undetermined());
        assert_eq!(trace.states.len(), 25);
        assert_eq!(machine.step_count(), 25);
    }

    #[test]
    fn test_reset() {
        let mut machine = TapeMachine::new(create_leading_one_table());
        machine.run(&parse_symbols("11").unwrap());

        machine.reset();
        assert_eq!(machine.state(), 0);
        assert!(machine.tape().is_empty());
        assert_eq!(machine.head(), 0);
        assert_eq!(machine.step_count(), 0);
        assert_eq!(machine.halted(), None);
    }
}
