//! The two-tape executor. It mirrors [`TapeMachine`](crate::machine::TapeMachine),
//! except that transitions are keyed by the pair of symbols under both heads and
//! write and move both heads in the same step.

use crate::machine::{Machine, Tape};
use crate::table::DualTable;
use crate::types::{Outcome, Step, Symbol, Trace};
use std::sync::Arc;

/// A deterministic two-tape Turing machine over `{_, 0, 1}`.
#[derive(Debug, Clone)]
pub struct DualTapeMachine {
    table: Arc<DualTable>,
    state: usize,
    tapes: [Tape<Symbol>; 2],
    step_count: usize,
    halted: Option<Outcome>,
}

impl DualTapeMachine {
    pub fn new(table: impl Into<Arc<DualTable>>) -> Self {
        Self {
            table: table.into(),
            state: 0,
            tapes: [Tape::new(Symbol::Blank), Tape::new(Symbol::Blank)],
            step_count: 0,
            halted: None,
        }
    }

    /// Runs with `input` on tape 1 and an empty tape 2 until the machine halts.
    ///
    /// Like the single-tape executor, this never returns for a non-halting run.
    pub fn run(&mut self, input: &[Symbol]) -> Trace {
        self.load(input);
        self.resume(None)
    }

    /// Runs with `input` on tape 1, giving up after `limit` steps.
    pub fn run_bounded(&mut self, input: &[Symbol], limit: usize) -> Trace {
        self.load(input);
        self.resume(Some(limit))
    }

    /// Resets the machine with `input` on tape 1 and nothing on tape 2.
    pub fn load(&mut self, input: &[Symbol]) {
        self.load_tapes(input, &[]);
    }

    /// Resets the machine with both tapes preloaded.
    pub fn load_tapes(&mut self, first: &[Symbol], second: &[Symbol]) {
        self.reset();
        self.tapes[0].load(first.iter().copied());
        self.tapes[1].load(second.iter().copied());
    }

    pub fn reset(&mut self) {
        self.state = 0;
        for tape in &mut self.tapes {
            tape.load(std::iter::empty());
        }
        self.step_count = 0;
        self.halted = None;
    }

    pub fn table(&self) -> &DualTable {
        &self.table
    }

    /// The materialized content of tape 1 (`index == 0`) or tape 2.
    pub fn tape(&self, index: usize) -> &[Symbol] {
        self.tapes[index].cells()
    }

    pub fn heads(&self) -> [usize; 2] {
        [self.tapes[0].head(), self.tapes[1].head()]
    }

    pub fn halted(&self) -> Option<Outcome> {
        self.halted
    }
}

impl Machine for DualTapeMachine {
    fn step(&mut self) -> Step {
        if let Some(outcome) = self.halted {
            return Step::Halt(outcome);
        }

        let read = [self.tapes[0].read(), self.tapes[1].read()];
        let Some(transition) = self.table.get(self.state, &read).copied() else {
            self.halted = Some(Outcome::Reject);
            return Step::Halt(Outcome::Reject);
        };

        for (i, tape) in self.tapes.iter_mut().enumerate() {
            tape.write(transition.write[i]);
            tape.shift(transition.directions[i]);
        }
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
