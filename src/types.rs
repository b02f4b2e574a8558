//! This module defines the core data structures and types used throughout the crate:
//! tape alphabets, head directions, transitions, execution outcomes and error types.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::Rule;

/// The sentinel printed in place of an accept index when a run rejects.
pub const REJECT_SENTINEL: i64 = -1;
/// The maximum allowed size for a transition table description in bytes.
pub const MAX_TABLE_SIZE: usize = 1 << 20; // 1MB
/// The default step ceiling used when a caller asks for a bounded run.
pub const DEFAULT_STEP_LIMIT: usize = 10_000;

/// A symbol of the two-tape alphabet, and the plain part of the encoded alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Symbol {
    Blank,
    Zero,
    One,
}

impl Symbol {
    /// Every symbol of the alphabet, in text-format order.
    pub const ALL: [Symbol; 3] = [Symbol::Blank, Symbol::Zero, Symbol::One];

    /// Symbols that may appear in raw machine input.
    pub const INPUT: [Symbol; 2] = [Symbol::Zero, Symbol::One];

    pub fn as_char(self) -> char {
        match self {
            Symbol::Blank => '_',
            Symbol::Zero => '0',
            Symbol::One => '1',
        }
    }
}

impl TryFrom<char> for Symbol {
    type Error = TuringMachineError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '_' => Ok(Symbol::Blank),
            '0' => Ok(Symbol::Zero),
            '1' => Ok(Symbol::One),
            _ => Err(TuringMachineError::UnknownSymbol(c)),
        }
    }
}

/// Parses a string of `_`, `0` and `1` characters into symbols.
pub fn parse_symbols(input: &str) -> Result<Vec<Symbol>, TuringMachineError> {
    input.chars().map(Symbol::try_from).collect()
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A symbol of the single-tape alphabet.
///
/// Plain cells hold ordinary tape content, dotted cells mark where an emulated
/// head sits, and the separator delimits the virtual tape regions of an
/// encoded tape. A single-tape machine that never touches an encoded tape
/// simply uses the plain symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TapeSymbol {
    Plain(Symbol),
    Dotted(Symbol),
    Separator,
}

impl TapeSymbol {
    pub const BLANK: TapeSymbol = TapeSymbol::Plain(Symbol::Blank);

    /// Every symbol a virtual tape region may contain: plain and dotted forms.
    pub fn cells() -> impl Iterator<Item = TapeSymbol> {
        Symbol::ALL
            .into_iter()
            .map(TapeSymbol::Plain)
            .chain(Symbol::ALL.into_iter().map(TapeSymbol::Dotted))
    }

    /// The whole encoded alphabet.
    pub fn all() -> impl Iterator<Item = TapeSymbol> {
        Self::cells().chain(std::iter::once(TapeSymbol::Separator))
    }

    /// Returns the dotted form of a cell. The separator has none and is returned as is.
    pub fn dotted(self) -> TapeSymbol {
        match self {
            TapeSymbol::Plain(s) | TapeSymbol::Dotted(s) => TapeSymbol::Dotted(s),
            TapeSymbol::Separator => TapeSymbol::Separator,
        }
    }

    /// Returns the underlying two-tape symbol, if this is not a separator.
    pub fn symbol(self) -> Option<Symbol> {
        match self {
            TapeSymbol::Plain(s) | TapeSymbol::Dotted(s) => Some(s),
            TapeSymbol::Separator => None,
        }
    }

    pub fn is_dotted(self) -> bool {
        matches!(self, TapeSymbol::Dotted(_))
    }

    pub fn as_char(self) -> char {
        match self {
            TapeSymbol::Plain(s) => s.as_char(),
            TapeSymbol::Dotted(Symbol::Blank) => '^',
            TapeSymbol::Dotted(Symbol::Zero) => 'O',
            TapeSymbol::Dotted(Symbol::One) => 'I',
            TapeSymbol::Separator => ':',
        }
    }
}

impl From<Symbol> for TapeSymbol {
    fn from(symbol: Symbol) -> Self {
        TapeSymbol::Plain(symbol)
    }
}

impl TryFrom<char> for TapeSymbol {
    type Error = TuringMachineError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            '^' => Ok(TapeSymbol::Dotted(Symbol::Blank)),
            'O' => Ok(TapeSymbol::Dotted(Symbol::Zero)),
            'I' => Ok(TapeSymbol::Dotted(Symbol::One)),
            ':' => Ok(TapeSymbol::Separator),
            c => Symbol::try_from(c).map(TapeSymbol::Plain),
        }
    }
}

impl fmt::Display for TapeSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Represents the possible directions a Turing Machine head can move.
///
/// There is no `Stay`: every transition moves its head. Moving left from
/// position 0 leaves the head where it is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    Left,
    /// Move the head one position to the right.
    Right,
}

impl Direction {
    pub fn as_char(self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }
}

impl TryFrom<char> for Direction {
    type Error = TuringMachineError;

    fn try_from(c: char) -> Result<Self, Self::Error> {
        match c {
            'L' | 'l' => Ok(Direction::Left),
            'R' | 'r' => Ok(Direction::Right),
            _ => Err(TuringMachineError::UnknownDirection(c)),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// A single-tape transition, keyed in its table by `(state, read symbol)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    /// The state the machine moves to.
    pub target: usize,
    /// The symbol written under the head.
    pub write: TapeSymbol,
    /// The direction the head moves after writing.
    pub direction: Direction,
}

/// A two-tape transition, keyed in its table by `(state, [read1, read2])`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DualTransition {
    /// The state the machine moves to.
    pub target: usize,
    /// The symbols written under head 1 and head 2.
    pub write: [Symbol; 2],
    /// The directions head 1 and head 2 move after writing.
    pub directions: [Direction; 2],
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// A transition targeted the accept state, whose index is carried.
    Accept(usize),
    /// No transition exists for the current state and symbol(s).
    Reject,
    /// The run hit its step ceiling before halting.
    Undetermined,
}

/// Represents the outcome of a single execution step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The machine performed a transition and keeps running.
    Continue,
    /// The machine halted with the given outcome.
    Halt(Outcome),
}

/// The ordered log of every intermediate state a run visited, and how it ended.
///
/// The `Display` form is the line-oriented run output: one visited state per
/// line followed by either the accept index or `-1`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trace {
    pub states: Vec<usize>,
    pub outcome: Outcome,
}

impl Trace {
    pub fn is_accept(&self) -> bool {
        matches!(self.outcome, Outcome::Accept(_))
    }

    pub fn is_reject(&self) -> bool {
        self.outcome == Outcome::Reject
    }

    pub fn is_undetermined(&self) -> bool {
        self.outcome == Outcome::Undetermined
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for state in &self.states {
            writeln!(f, "{state}")?;
        }

        match self.outcome {
            Outcome::Accept(state) => write!(f, "{state}"),
            Outcome::Reject => write!(f, "{REJECT_SENTINEL}"),
            Outcome::Undetermined => write!(f, "?"),
        }
    }
}

/// Represents the errors that can occur while building, loading or encoding machines.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TuringMachineError {
    /// A transition was registered against, or targets, a state that does not exist.
    #[error("Invalid state: {0}")]
    InvalidState(usize),
    /// A second transition was registered for the same state and read key.
    #[error("Duplicate transition for state {state} on {key}")]
    DuplicateTransition { state: usize, key: String },
    #[error("Unknown symbol: {0:?}")]
    UnknownSymbol(char),
    #[error("Unknown direction: {0:?}")]
    UnknownDirection(char),
    /// Indicates an error during the parsing of a transition table.
    #[error("Table parsing error: {0}")]
    ParseError(#[from] Box<pest::error::Error<Rule>>),
    /// Indicates a table that parsed but is structurally unsound.
    #[error("Table validation error: {0}")]
    ValidationError(String),
    /// Indicates a tape that does not follow the two-region encoding.
    #[error("Tape encoding error: {0}")]
    EncodingError(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    FileError(String),
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_serialization() {
        let left_json = serde_json::to_string(&Direction::Left).unwrap();
        let right_json = serde_json::to_string(&Direction::Right).unwrap();

        assert_eq!(left_json, "\"Left\"");
        assert_eq!(right_json, "\"Right\"");

        let left: Direction = serde_json::from_str(&left_json).unwrap();
        assert_eq!(left, Direction::Left);
    }

    #[test]
    fn test_direction_chars() {
        assert_eq!(Direction::try_from('l'), Ok(Direction::Left));
        assert_eq!(Direction::try_from('R'), Ok(Direction::Right));
        assert_eq!(
            Direction::try_from('S'),
            Err(TuringMachineError::UnknownDirection('S'))
        );
    }

    #[test]
    fn test_encoded_alphabet() {
        let chars: String = TapeSymbol::all().map(TapeSymbol::as_char).collect();
        assert_eq!(chars, "_01^OI:");

        for symbol in TapeSymbol::all() {
            assert_eq!(TapeSymbol::try_from(symbol.as_char()), Ok(symbol));
        }
    }

    #[test]
    fn test_dotting() {
        let zero = TapeSymbol::from(Symbol::Zero);
        assert!(!zero.is_dotted());
        assert!(zero.dotted().is_dotted());
        assert_eq!(zero.dotted().symbol(), Some(Symbol::Zero));
        assert_eq!(TapeSymbol::Separator.dotted(), TapeSymbol::Separator);
        assert_eq!(TapeSymbol::Separator.symbol(), None);
    }

    #[test]
    fn test_trace_display() {
        let accepted = Trace {
            states: vec![1, 2],
            outcome: Outcome::Accept(3),
        };
        assert_eq!(accepted.to_string(), "1\n2\n3");

        let rejected = Trace {
            states: vec![],
            outcome: Outcome::Reject,
        };
        assert_eq!(rejected.to_string(), "-1");
        assert!(rejected.is_reject());
    }

    #[test]
    fn test_error_display() {
        let error = TuringMachineError::DuplicateTransition {
            state: 0,
            key: "01".to_string(),
        };

        let error_msg = format!("{}", error);
        assert!(error_msg.contains("Duplicate transition"));
        assert!(error_msg.contains("01"));
    }
}
