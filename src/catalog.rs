//! Two-tape reference machines bundled with the crate.

use crate::parser::parse_dual;
use crate::table::DualTable;
use crate::types::TuringMachineError;
use serde::Serialize;
use std::sync::Arc;
use tracing::warn;

// Embedded machine definitions, by name
const MACHINE_TEXTS: [(&str, &str); 4] = [
    ("copy", include_str!("../machines/copy.tm2")),
    ("even-ones", include_str!("../machines/even-ones.tm2")),
    ("leading-one", include_str!("../machines/leading-one.tm2")),
    ("palindrome", include_str!("../machines/palindrome.tm2")),
];

/// A bundled machine and the text it was parsed from.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: &'static str,
    pub source: &'static str,
    pub table: Arc<DualTable>,
}

lazy_static::lazy_static! {
    pub static ref CATALOG: Vec<CatalogEntry> = load_entries();
}

fn load_entries() -> Vec<CatalogEntry> {
    MACHINE_TEXTS
        .iter()
        .filter_map(|&(name, source)| match parse_dual(source) {
            Ok(table) => Some(CatalogEntry {
                name,
                source,
                table: Arc::new(table),
            }),
            Err(e) => {
                warn!(name, error = %e, "failed to parse bundled machine");
                None
            }
        })
        .collect()
}

pub struct Catalog;

impl Catalog {
    pub fn entries() -> &'static [CatalogEntry] {
        &CATALOG
    }

    pub fn names() -> Vec<&'static str> {
        CATALOG.iter().map(|entry| entry.name).collect()
    }

    /// Looks up a machine by name.
    pub fn get(name: &str) -> Result<Arc<DualTable>, TuringMachineError> {
        Self::find(name).map(|entry| Arc::clone(&entry.table))
    }

    /// The text a machine was parsed from.
    pub fn source(name: &str) -> Result<&'static str, TuringMachineError> {
        Self::find(name).map(|entry| entry.source)
    }

    pub fn info(name: &str) -> Result<MachineInfo, TuringMachineError> {
        let entry = Self::find(name)?;

        Ok(MachineInfo {
            name: entry.name.to_string(),
            state_count: entry.table.len(),
            transition_count: entry.table.transition_count(),
        })
    }

    fn find(name: &str) -> Result<&'static CatalogEntry, TuringMachineError> {
        CATALOG
            .iter()
            .find(|entry| entry.name == name)
            .ok_or_else(|| {
                TuringMachineError::ValidationError(format!("Machine '{}' not found", name))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineInfo {
    pub name: String,
    pub state_count: usize,
    pub transition_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dual::DualTapeMachine;
    use crate::types::{parse_symbols, Symbol};

    fn accepts(name: &str, input: &str) -> bool {
        let mut machine = DualTapeMachine::new(Catalog::get(name).unwrap());
        machine.run(&parse_symbols(input).unwrap()).is_accept()
    }

    #[test]
    fn test_all_machines_parse() {
        assert_eq!(Catalog::entries().len(), MACHINE_TEXTS.len());
        assert_eq!(
            Catalog::names(),
            vec!["copy", "even-ones", "leading-one", "palindrome"]
        );
    }

    #[test]
    fn test_unknown_machine() {
        let error = Catalog::get("missing").unwrap_err();
        assert_eq!(
            error.to_string(),
            "Table validation error: Machine 'missing' not found"
        );
    }

    #[test]
    fn test_info() {
        let info = Catalog::info("palindrome").unwrap();
        assert_eq!(info.state_count, 6);
        assert_eq!(info.transition_count, 21);
        assert!(Catalog::source("palindrome").unwrap().contains("palindromes"));
    }

    #[test]
    fn test_copy() {
        let mut machine = DualTapeMachine::new(Catalog::get("copy").unwrap());
        assert!(machine.run(&parse_symbols("0110").unwrap()).is_accept());
        assert_eq!(
            &machine.tape(1)[..4],
            &[Symbol::Zero, Symbol::One, Symbol::One, Symbol::Zero]
        );
    }

    #[test]
    fn test_even_ones() {
        assert!(accepts("even-ones", ""));
        assert!(accepts("even-ones", "0110"));
        assert!(!accepts("even-ones", "010"));
    }

    #[test]
    fn test_leading_one() {
        assert!(accepts("leading-one", "10"));
        assert!(!accepts("leading-one", "01"));
        assert!(!accepts("leading-one", ""));
    }

    #[test]
    fn test_palindrome() {
        for input in ["", "0", "1", "00", "11", "010", "0110", "10101"] {
            assert!(accepts("palindrome", input), "{input} is a palindrome");
        }
        for input in ["01", "10", "001", "0111", "10100"] {
            assert!(!accepts("palindrome", input), "{input} is not a palindrome");
        }
    }
}
