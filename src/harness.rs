//! Differential testing of the compiler: run a two-tape table and its compiled
//! single-tape table on every short input and report the first disagreement.

use crate::compiler::{compile, Compiled};
use crate::dual::DualTapeMachine;
use crate::encoder::encode_input;
use crate::machine::{Machine, TapeMachine};
use crate::table::DualTable;
use crate::types::{Symbol, TapeSymbol, Trace, TuringMachineError, DEFAULT_STEP_LIMIT};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// Settings for an equivalence check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Longest input enumerated, inclusive.
    pub max_len: usize,
    /// Step ceiling for the two-tape machine. Inputs it does not decide
    /// within this many steps are counted as undetermined and skipped.
    pub step_limit: usize,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            max_len: 6,
            step_limit: DEFAULT_STEP_LIMIT,
        }
    }
}

impl HarnessConfig {
    /// Parses a config from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, TuringMachineError> {
        serde_json::from_str(json).map_err(|e| TuringMachineError::ConfigError(e.to_string()))
    }
}

/// Every string over `{0, 1}` of length `0..=max_len`, shortest first and
/// lexicographic within a length.
pub fn inputs(max_len: usize) -> impl Iterator<Item = Vec<Symbol>> {
    (0..=max_len).flat_map(|len| {
        (0..1usize << len).map(move |bits| {
            (0..len)
                .map(|i| Symbol::INPUT[(bits >> (len - 1 - i)) & 1])
                .collect()
        })
    })
}

/// A step ceiling the compiled machine cannot exceed when the two-tape
/// machine halts within `dual_steps` steps on an input of `input_len` symbols.
///
/// The encoded tape starts `max(input_len, 1) + 4` cells long and grows by at
/// most two cells per emulated step. Setup walks it twice, and each emulated
/// step walks it at most four times plus a constant.
pub fn compiled_step_bound(input_len: usize, dual_steps: usize) -> usize {
    let initial = input_len.max(1) + 4;
    let emulated = dual_steps + 1;
    let widest = initial + 2 * emulated;

    2 * initial + emulated * (4 * widest + 16)
}

/// Two runs that disagree.
#[derive(Debug, Clone, Serialize)]
pub struct Counterexample {
    pub input: Vec<Symbol>,
    pub dual_table: String,
    pub dual_trace: Trace,
    pub single_table: String,
    pub single_trace: Trace,
}

impl fmt::Display for Counterexample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "~".repeat(50);
        let input: String = self.input.iter().map(|s| s.as_char()).collect();

        writeln!(f, "{}\n{}\n{}", self.dual_table, rule, self.dual_trace)?;
        writeln!(f, "{}\n{}\n{}", self.single_table, rule, self.single_trace)?;
        write!(f, "COMPARISON FAILED ON STRING \"{}\"", input)
    }
}

/// The result of an equivalence check.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Inputs on which both machines were run and compared.
    pub checked: usize,
    /// Inputs the two-tape machine did not decide within the step limit.
    pub undetermined: usize,
    /// Longest input length enumerated.
    pub max_len: usize,
    pub counterexample: Option<Counterexample>,
}

impl Report {
    pub fn is_equivalent(&self) -> bool {
        self.counterexample.is_none()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.counterexample {
            Some(counterexample) => write!(f, "{}", counterexample),
            None => write!(
                f,
                "no counterexample up to length {} ({} checked, {} undetermined)",
                self.max_len, self.checked, self.undetermined
            ),
        }
    }
}

/// Drives a two-tape table and its compiled form side by side.
pub struct Harness {
    dual_table: Arc<DualTable>,
    compiled: Compiled,
    config: HarnessConfig,
}

impl Harness {
    /// Compiles `dual_table` once for all subsequent checks.
    pub fn new(dual_table: DualTable, config: HarnessConfig) -> Result<Self, TuringMachineError> {
        let compiled = compile(&dual_table)?;

        Ok(Self {
            dual_table: Arc::new(dual_table),
            compiled,
            config,
        })
    }

    pub fn compiled(&self) -> &Compiled {
        &self.compiled
    }

    /// Runs both machines on every input up to `config.max_len` and stops at
    /// the first one where their verdicts differ.
    pub fn check(&self) -> Report {
        let mut dual = DualTapeMachine::new(Arc::clone(&self.dual_table));
        let mut single = self.compiled.machine();
        let mut report = Report {
            checked: 0,
            undetermined: 0,
            max_len: self.config.max_len,
            counterexample: None,
        };

        for input in inputs(self.config.max_len) {
            match self.compare(&mut dual, &mut single, &input) {
                Comparison::Agree => report.checked += 1,
                Comparison::Undetermined => report.undetermined += 1,
                Comparison::Disagree(counterexample) => {
                    warn!(input = ?counterexample.input, "compiled machine disagrees");
                    report.checked += 1;
                    report.counterexample = Some(*counterexample);
                    break;
                }
            }
        }

        debug!(
            checked = report.checked,
            undetermined = report.undetermined,
            "equivalence check finished"
        );
        report
    }

    /// Runs both machines on a single input.
    pub fn check_input(&self, input: &[Symbol]) -> Option<Counterexample> {
        let mut dual = DualTapeMachine::new(Arc::clone(&self.dual_table));
        let mut single = self.compiled.machine();

        match self.compare(&mut dual, &mut single, input) {
            Comparison::Disagree(counterexample) => Some(*counterexample),
            _ => None,
        }
    }

    fn compare(
        &self,
        dual: &mut DualTapeMachine,
        single: &mut TapeMachine,
        input: &[Symbol],
    ) -> Comparison {
        let dual_trace = dual.run_bounded(input, self.config.step_limit);
        if dual_trace.is_undetermined() {
            return Comparison::Undetermined;
        }

        let bound = compiled_step_bound(input.len(), dual.step_count());
        single.load_cells(0, encode_input(input));
        let single_trace = single.resume(Some(bound));

        if dual_trace.is_accept() == single_trace.is_accept()
            && dual_trace.is_reject() == single_trace.is_reject()
        {
            return Comparison::Agree;
        }

        Comparison::Disagree(Box::new(Counterexample {
            input: input.to_vec(),
            dual_table: self.dual_table.to_string(),
            dual_trace,
            single_table: self.compiled.table().to_string(),
            single_trace,
        }))
    }
}

enum Comparison {
    Agree,
    Undetermined,
    Disagree(Box<Counterexample>),
}

/// Renders a symbol string, e.g. for log output.
pub fn render_input(input: &[Symbol]) -> String {
    input.iter().map(|&s| TapeSymbol::from(s).as_char()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableBuilder;
    use crate::types::{parse_symbols, Direction, DualTransition, Outcome};

    use crate::types::Direction::{Left, Right};
    use crate::types::Symbol::{Blank, One, Zero};

    fn transition(target: usize, write: [Symbol; 2], directions: [Direction; 2]) -> DualTransition {
        DualTransition {
            target,
            write,
            directions,
        }
    }

    /// Two states; state 0 accepts on `read` and has no other transition.
    fn create_single_pair_table(read: [Symbol; 2]) -> DualTable {
        let mut builder = TableBuilder::with_states(2);
        builder
            .add_transition(0, read, transition(1, [One, One], [Right, Right]))
            .unwrap();
        builder.build().unwrap()
    }

    #[test]
    fn test_inputs_order() {
        let rendered: Vec<String> = inputs(2).map(|input| render_input(&input)).collect();
        assert_eq!(rendered, vec!["", "0", "1", "00", "01", "10", "11"]);
        assert_eq!(inputs(6).count(), 127);
    }

    #[test]
    fn test_config_from_json() {
        let config = HarnessConfig::from_json(r#"{ "max_len": 3 }"#).unwrap();
        assert_eq!(config.max_len, 3);
        assert_eq!(config.step_limit, DEFAULT_STEP_LIMIT);

        assert!(matches!(
            HarnessConfig::from_json("{ nope"),
            Err(TuringMachineError::ConfigError(_))
        ));
    }

    #[test]
    fn test_accepting_pair_on_both_machines() {
        let table = create_single_pair_table([Zero, Zero]);
        let compiled = compile(&table).unwrap();

        let mut dual = DualTapeMachine::new(table);
        dual.load_tapes(&[Zero], &[Zero]);
        assert_eq!(dual.resume(None).outcome, Outcome::Accept(1));

        let mut single = compiled.machine();
        single.load_cells(
            compiled.entry(0),
            crate::encoder::encode_tapes(&[Zero], &[Zero]),
        );
        assert_eq!(
            single.resume(None).outcome,
            Outcome::Accept(compiled.accept_state())
        );
    }

    #[test]
    fn test_input_with_empty_second_tape_accepts() {
        let harness =
            Harness::new(create_single_pair_table([Zero, Blank]), HarnessConfig::default())
                .unwrap();

        let input = parse_symbols("0").unwrap();
        let mut dual = DualTapeMachine::new(create_single_pair_table([Zero, Blank]));
        assert!(dual.run(&input).is_accept());
        assert!(harness.compiled().machine().run(&input).is_accept());
        assert!(harness.check_input(&input).is_none());
    }

    #[test]
    fn test_missing_pair_rejects_on_both_machines() {
        let table = create_single_pair_table([Zero, Zero]);
        let compiled = compile(&table).unwrap();

        let mut dual = DualTapeMachine::new(table);
        dual.load_tapes(&[One], &[One]);
        assert_eq!(dual.resume(None).to_string(), "-1");

        let mut single = compiled.machine();
        single.load_cells(compiled.entry(0), crate::encoder::encode_tapes(&[One], &[One]));
        assert!(single.resume(None).to_string().ends_with("-1"));
    }

    #[test]
    fn test_check_finds_no_counterexample() {
        let mut builder = TableBuilder::with_states(3);
        builder
            .add_transition(0, [Zero, Blank], transition(0, [Zero, Zero], [Right, Right]))
            .unwrap()
            .add_transition(0, [One, Blank], transition(1, [One, One], [Right, Left]))
            .unwrap()
            .add_transition(1, [Blank, Zero], transition(2, [Blank, Zero], [Left, Right]))
            .unwrap()
            .add_transition(1, [Zero, Zero], transition(0, [One, Blank], [Left, Right]))
            .unwrap();
        let harness = Harness::new(builder.build().unwrap(), HarnessConfig::default()).unwrap();

        let report = harness.check();
        assert!(report.is_equivalent(), "{}", report);
        assert_eq!(report.checked + report.undetermined, 127);
    }

    #[test]
    fn test_non_halting_inputs_are_undetermined() {
        let mut builder = TableBuilder::with_states(2);
        builder
            .add_transition(0, [Blank, Blank], transition(0, [Blank, Blank], [Left, Right]))
            .unwrap();
        let config = HarnessConfig {
            max_len: 2,
            step_limit: 50,
        };
        let harness = Harness::new(builder.build().unwrap(), config).unwrap();

        let report = harness.check();
        assert!(report.is_equivalent());
        assert_eq!(report.undetermined, 1);
        assert_eq!(report.checked, 6);
    }

    #[test]
    fn test_counterexample_display() {
        let counterexample = Counterexample {
            input: vec![One, Zero],
            dual_table: "2\n0".to_string(),
            dual_trace: Trace {
                states: vec![],
                outcome: Outcome::Reject,
            },
            single_table: "1".to_string(),
            single_trace: Trace {
                states: vec![],
                outcome: Outcome::Accept(0),
            },
        };

        let text = counterexample.to_string();
        assert!(text.starts_with("2\n0\n~~~"));
        assert!(text.ends_with("COMPARISON FAILED ON STRING \"10\""));
    }

    #[test]
    fn test_step_bound_grows_with_work() {
        assert!(compiled_step_bound(0, 0) > 0);
        assert!(compiled_step_bound(6, 10) > compiled_step_bound(6, 9));
        assert!(compiled_step_bound(7, 10) > compiled_step_bound(6, 10));
    }
}
