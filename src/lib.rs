//! This crate folds two-tape Turing machines onto a single tape.
//! It includes executors for single-tape and two-tape machines, a parser for the
//! line-oriented table format, a compiler from two-tape to single-tape tables, and
//! a harness that checks a compiled table against its source on every short input.

pub mod analyzer;
pub mod catalog;
pub mod compiler;
pub mod dual;
pub mod encoder;
pub mod harness;
pub mod loader;
pub mod machine;
pub mod parser;
pub mod table;
pub mod types;

/// Re-exports the `Rule` enum from the parser module, used by the `pest` grammar.
pub use crate::parser::Rule;
/// Re-exports the `analyze` function and `AnalysisError` enum from the analyzer module.
pub use analyzer::{analyze, AnalysisError};
/// Re-exports the bundled machine registry.
pub use catalog::{Catalog, CATALOG};
/// Re-exports the compiler entry point and its output.
pub use compiler::{compile, BlockLayout, Compiled};
/// Re-exports the two-tape executor.
pub use dual::DualTapeMachine;
/// Re-exports the encoding functions from the encoder module.
pub use encoder::{decode, encode_input, encode_tapes, DecodedTapes};
/// Re-exports the equivalence harness.
pub use harness::{Counterexample, Harness, HarnessConfig, Report};
/// Re-exports the `TableLoader` struct from the loader module.
pub use loader::TableLoader;
/// Re-exports the single-tape executor and the `Machine` trait.
pub use machine::{Machine, TapeMachine};
/// Re-exports the table parsers.
pub use parser::{parse_dual, parse_single};
/// Re-exports the transition table types.
pub use table::{DualTable, SingleTable, TableBuilder, TransitionTable};
/// Re-exports the shared vocabulary from the types module.
pub use types::{
    Direction, DualTransition, Outcome, Step, Symbol, TapeSymbol, Trace, Transition,
    TuringMachineError, DEFAULT_STEP_LIMIT, MAX_TABLE_SIZE,
};
