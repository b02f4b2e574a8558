//! This module provides the parser for transition tables, utilizing the `pest` crate.
//! It defines the grammar for the line-oriented table format and functions to parse
//! it into single-tape and two-tape tables.

use crate::{
    analyzer::AnalysisError,
    table::{DualTable, SingleTable, TableBuilder, TableEntry, TransitionTable},
    types::{
        Direction, DualTransition, Symbol, TapeSymbol, Transition, TuringMachineError,
        MAX_TABLE_SIZE,
    },
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;

/// Derives a `PestParser` for the table grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct TuringMachineParser;

/// Parses a single-tape transition table.
///
/// The first line holds the state count; each following line describes one
/// state in index order, except the last state, which is the accept state and
/// has no row. The parsed table is validated before being returned.
///
/// # Returns
///
/// * `Ok(SingleTable)` if the input is well formed and validates.
/// * `Err(TuringMachineError::ParseError)` for syntax errors and rows whose
///   declared transition count does not match their entries.
/// * `Err(TuringMachineError::ValidationError)` for missing rows, out of range
///   targets and other structural faults.
/// * `Err(TuringMachineError::DuplicateTransition)` if a state reads the same
///   symbol twice.
pub fn parse_single(input: &str) -> Result<SingleTable, TuringMachineError> {
    let root = parse_root(Rule::single_table, input)?;
    parse_table(root, parse_single_entry)
}

/// Parses a two-tape transition table. Same layout as [`parse_single`], with
/// seven fields per transition.
pub fn parse_dual(input: &str) -> Result<DualTable, TuringMachineError> {
    let root = parse_root(Rule::dual_table, input)?;
    parse_table(root, parse_dual_entry)
}

fn parse_root(rule: Rule, input: &str) -> Result<Pair<'_, Rule>, TuringMachineError> {
    if input.len() > MAX_TABLE_SIZE {
        return Err(TuringMachineError::ValidationError(format!(
            "Table text is {} bytes, the limit is {}",
            input.len(),
            MAX_TABLE_SIZE
        )));
    }

    let mut pairs = TuringMachineParser::parse(rule, input)
        .map_err(|e| TuringMachineError::ParseError(Box::new(e)))?;

    pairs.next().ok_or_else(|| {
        TuringMachineError::ValidationError("Empty table definition".to_string())
    })
}

/// Turns a parsed table into a validated `TransitionTable`, reading each
/// transition with `parse_entry`.
fn parse_table<T: TableEntry>(
    root: Pair<Rule>,
    parse_entry: fn(Pair<Rule>) -> Result<(T::Key, T), TuringMachineError>,
) -> Result<TransitionTable<T>, TuringMachineError> {
    let span = root.as_span();
    let mut pairs = root.into_inner();
    let states = parse_count(next_pair(&mut pairs, span)?)?;

    let rows: Vec<Pair<Rule>> = pairs
        .filter(|p| matches!(p.as_rule(), Rule::single_row | Rule::dual_row))
        .collect();

    if states == 0 {
        return Err(AnalysisError::NoStates.into());
    }

    // The accept state is the last one and has no row.
    if rows.len() != states - 1 {
        return Err(TuringMachineError::ValidationError(format!(
            "Expected {} state rows, found {}",
            states - 1,
            rows.len()
        )));
    }

    let mut builder = TableBuilder::with_states(states);
    for (state, row) in rows.into_iter().enumerate() {
        let row_span = row.as_span();
        let mut inner = row.into_inner();
        let declared = parse_count(next_pair(&mut inner, row_span)?)?;

        let entries = inner
            .filter(|p| matches!(p.as_rule(), Rule::single_entry | Rule::dual_entry))
            .map(parse_entry)
            .collect::<Result<Vec<_>, _>>()?;

        if entries.len() != declared {
            return Err(parse_error(
                &format!(
                    "State {state} declares {declared} transitions but lists {}",
                    entries.len()
                ),
                row_span,
            ));
        }

        for (key, transition) in entries {
            builder.add_transition(state, key, transition)?;
        }
    }

    builder.build()
}

/// Parses `<read> <target> <write> <dir>`.
fn parse_single_entry(pair: Pair<Rule>) -> Result<(TapeSymbol, Transition), TuringMachineError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();

    let read = parse_tape_symbol(next_pair(&mut pairs, span)?)?;
    let target = parse_index(next_pair(&mut pairs, span)?)?;
    let write = parse_tape_symbol(next_pair(&mut pairs, span)?)?;
    let direction = parse_direction(next_pair(&mut pairs, span)?)?;

    Ok((
        read,
        Transition {
            target,
            write,
            direction,
        },
    ))
}

/// Parses `<read1> <read2> <target> <write1> <write2> <dir1> <dir2>`.
fn parse_dual_entry(
    pair: Pair<Rule>,
) -> Result<([Symbol; 2], DualTransition), TuringMachineError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();

    let read = [
        parse_symbol(next_pair(&mut pairs, span)?)?,
        parse_symbol(next_pair(&mut pairs, span)?)?,
    ];
    let target = parse_index(next_pair(&mut pairs, span)?)?;
    let write = [
        parse_symbol(next_pair(&mut pairs, span)?)?,
        parse_symbol(next_pair(&mut pairs, span)?)?,
    ];
    let directions = [
        parse_direction(next_pair(&mut pairs, span)?)?,
        parse_direction(next_pair(&mut pairs, span)?)?,
    ];

    Ok((
        read,
        DualTransition {
            target,
            write,
            directions,
        },
    ))
}

/// Creates a `TuringMachineError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> TuringMachineError {
    TuringMachineError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Takes the next child pair, reporting a truncated rule against `span`.
fn next_pair<'i>(
    pairs: &mut Pairs<'i, Rule>,
    span: Span<'i>,
) -> Result<Pair<'i, Rule>, TuringMachineError> {
    pairs
        .next()
        .ok_or_else(|| parse_error("Unexpected end of rule", span))
}

fn parse_count(pair: Pair<Rule>) -> Result<usize, TuringMachineError> {
    pair.as_str()
        .parse()
        .map_err(|_| parse_error("Count out of range", pair.as_span()))
}

fn parse_index(pair: Pair<Rule>) -> Result<usize, TuringMachineError> {
    pair.as_str()
        .parse()
        .map_err(|_| parse_error("State index out of range", pair.as_span()))
}

/// The first character of a single-character token.
fn parse_char(pair: &Pair<Rule>) -> Result<char, TuringMachineError> {
    pair.as_str()
        .chars()
        .next()
        .ok_or_else(|| parse_error("Empty token", pair.as_span()))
}

fn parse_symbol(pair: Pair<Rule>) -> Result<Symbol, TuringMachineError> {
    Symbol::try_from(parse_char(&pair)?)
}

fn parse_tape_symbol(pair: Pair<Rule>) -> Result<TapeSymbol, TuringMachineError> {
    TapeSymbol::try_from(parse_char(&pair)?)
}

fn parse_direction(pair: Pair<Rule>) -> Result<Direction, TuringMachineError> {
    Direction::try_from(parse_char(&pair)?)
}
