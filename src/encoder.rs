//! This module provides the encoding that folds two virtual tapes onto one physical tape,
//! and the decoding that recovers them.
//!
//! An encoded tape looks like `: t1 : t2 :` followed by blanks. Each region holds
//! the materialized cells of one virtual tape, with exactly one dotted cell
//! marking where that tape's head is.

use crate::types::{Symbol, TapeSymbol, TuringMachineError};
use serde::{Deserialize, Serialize};

/// The input the compiled machine consumes: the raw symbols, undecorated.
///
/// The compiled machine's setup block lays out the regions itself.
pub fn encode_input(input: &[Symbol]) -> Vec<TapeSymbol> {
    input.iter().copied().map(TapeSymbol::from).collect()
}

/// Builds the encoded tape the setup block would leave behind, with both
/// heads at position 0 of their region. An empty tape becomes a single
/// dotted blank.
pub fn encode_tapes(first: &[Symbol], second: &[Symbol]) -> Vec<TapeSymbol> {
    let mut cells = vec![TapeSymbol::Separator];
    for tape in [first, second] {
        cells.extend(encode_region(tape));
        cells.push(TapeSymbol::Separator);
    }

    cells
}

fn encode_region(tape: &[Symbol]) -> Vec<TapeSymbol> {
    if tape.is_empty() {
        return vec![TapeSymbol::Dotted(Symbol::Blank)];
    }

    tape.iter()
        .enumerate()
        .map(|(i, &symbol)| {
            if i == 0 {
                TapeSymbol::Dotted(symbol)
            } else {
                TapeSymbol::Plain(symbol)
            }
        })
        .collect()
}

/// Two virtual tapes recovered from an encoded tape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedTapes {
    pub tapes: [Vec<Symbol>; 2],
    pub heads: [usize; 2],
}

/// Decodes an encoded tape, checking that it has exactly three separators,
/// one dotted cell per region, and nothing but blanks after the last separator.
///
/// # Returns
///
/// * `Ok(DecodedTapes)` with each region's cells in order, dots stripped.
/// * `Err(TuringMachineError::EncodingError)` if the layout is broken.
pub fn decode(cells: &[TapeSymbol]) -> Result<DecodedTapes, TuringMachineError> {
    if cells.first() != Some(&TapeSymbol::Separator) {
        return Err(TuringMachineError::EncodingError(
            "Encoded tape must start with a separator".to_string(),
        ));
    }

    let separators: Vec<usize> = cells
        .iter()
        .enumerate()
        .filter(|&(_, &cell)| cell == TapeSymbol::Separator)
        .map(|(i, _)| i)
        .collect();

    if separators.len() != 3 {
        return Err(TuringMachineError::EncodingError(format!(
            "Expected 3 separators, found {}",
            separators.len()
        )));
    }

    if cells[separators[2] + 1..]
        .iter()
        .any(|&cell| cell != TapeSymbol::BLANK)
    {
        return Err(TuringMachineError::EncodingError(
            "Non-blank cells after the last separator".to_string(),
        ));
    }

    let first = decode_region(&cells[separators[0] + 1..separators[1]], 1)?;
    let second = decode_region(&cells[separators[1] + 1..separators[2]], 2)?;

    Ok(DecodedTapes {
        tapes: [first.0, second.0],
        heads: [first.1, second.1],
    })
}

fn decode_region(
    region: &[TapeSymbol],
    number: usize,
) -> Result<(Vec<Symbol>, usize), TuringMachineError> {
    let dots: Vec<usize> = region
        .iter()
        .enumerate()
        .filter(|(_, cell)| cell.is_dotted())
        .map(|(i, _)| i)
        .collect();

    let [head] = dots.as_slice() else {
        return Err(TuringMachineError::EncodingError(format!(
            "Tape {} region has {} head markers",
            number,
            dots.len()
        )));
    };

    let symbols = region
        .iter()
        .map(|cell| {
            cell.symbol().ok_or_else(|| {
                TuringMachineError::EncodingError(format!(
                    "Separator inside tape {} region",
                    number
                ))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok((symbols, *head))
}

/// Renders encoded cells in their one-character text form.
pub fn render(cells: &[TapeSymbol]) -> String {
    cells.iter().map(|cell| cell.as_char()).collect()
}

/// Parses the one-character text form of encoded cells.
pub fn parse_cells(text: &str) -> Result<Vec<TapeSymbol>, TuringMachineError> {
    text.chars().map(TapeSymbol::try_from).collect()
}
