use proptest::prelude::*;
use tapefold::encoder::decode;
use tapefold::{
    compile, Catalog, Direction, DualTable, DualTapeMachine, DualTransition, Harness,
    HarnessConfig, Machine, Outcome, Step, Symbol, TableBuilder,
};

fn symbol() -> impl Strategy<Value = Symbol> {
    prop_oneof![Just(Symbol::Blank), Just(Symbol::Zero), Just(Symbol::One)]
}

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Left), Just(Direction::Right)]
}

fn transition(states: usize) -> impl Strategy<Value = DualTransition> {
    (0..states, symbol(), symbol(), direction(), direction()).prop_map(
        |(target, first, second, d1, d2)| DualTransition {
            target,
            write: [first, second],
            directions: [d1, d2],
        },
    )
}

fn keys() -> Vec<[Symbol; 2]> {
    Symbol::ALL
        .iter()
        .flat_map(|&a| Symbol::ALL.iter().map(move |&b| [a, b]))
        .collect()
}

/// Random tables of 2 to 8 states, each non-accept state defining a random
/// subset of the nine read pairs.
fn dual_table() -> impl Strategy<Value = DualTable> {
    (2usize..=8).prop_flat_map(|states| {
        proptest::collection::vec(
            proptest::option::weighted(0.7, transition(states)),
            9 * (states - 1),
        )
        .prop_map(move |entries| {
            let keys = keys();
            let mut builder = TableBuilder::with_states(states);
            for (i, entry) in entries.into_iter().enumerate() {
                if let Some(transition) = entry {
                    builder
                        .add_transition(i / 9, keys[i % 9], transition)
                        .expect("each key is registered once");
                }
            }
            builder.build().expect("targets are in range")
        })
    })
}

fn trimmed(tape: &[Symbol]) -> &[Symbol] {
    let end = tape
        .iter()
        .rposition(|&symbol| symbol != Symbol::Blank)
        .map_or(0, |i| i + 1);
    &tape[..end]
}

/// Steps the compiled machine and, every time it enters the block of the
/// two-tape machine's current state, checks that the encoded tape decodes to
/// the two-tape machine's configuration before advancing it by one step.
fn assert_lockstep(table: DualTable, input: &[Symbol]) {
    let compiled = compile(&table).unwrap();
    let mut dual = DualTapeMachine::new(table);
    let mut single = compiled.machine();
    dual.load(input);
    single.load(input);

    let mut checkpoints = 0;
    loop {
        if let Step::Halt(outcome) = single.step() {
            let expected = dual.halted().expect("two-tape machine halted first");
            assert_eq!(
                matches!(outcome, Outcome::Accept(_)),
                matches!(expected, Outcome::Accept(_))
            );
            break;
        }

        if single.state() == compiled.entry(dual.state()) {
            let decoded = decode(single.tape()).unwrap();
            for i in 0..2 {
                assert_eq!(trimmed(&decoded.tapes[i]), trimmed(dual.tape(i)));
            }
            assert_eq!(decoded.heads, dual.heads());

            checkpoints += 1;
            dual.step();
        }
    }

    assert!(checkpoints > 0);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn compiled_tables_agree_with_their_source(table in dual_table()) {
        let config = HarnessConfig { max_len: 6, step_limit: 200 };
        let harness = Harness::new(table, config).expect("random tables compile");

        let report = harness.check();
        prop_assert!(report.is_equivalent(), "{}", report);
        prop_assert_eq!(report.checked + report.undetermined, 127);
    }

    #[test]
    fn compiled_table_text_parses_back(table in dual_table()) {
        let compiled = compile(&table).unwrap();
        let text = compiled.table().to_string();

        let parsed = tapefold::parse_single(&text).unwrap();
        prop_assert_eq!(parsed.len(), compiled.table().len());
        prop_assert_eq!(parsed.to_string(), text);
    }
}

#[test]
fn catalog_machines_compile_faithfully() {
    for entry in Catalog::entries() {
        let config = HarnessConfig {
            max_len: 5,
            ..HarnessConfig::default()
        };
        let harness = Harness::new((*entry.table).clone(), config).unwrap();

        let report = harness.check();
        assert!(report.is_equivalent(), "{}: {}", entry.name, report);
        assert_eq!(report.checked, 63, "{} decides every input", entry.name);
    }
}

#[test]
fn palindrome_runs_in_lockstep() {
    let table = (*Catalog::get("palindrome").unwrap()).clone();

    for input in ["", "0", "10", "0110", "01101", "100"] {
        let input = tapefold::types::parse_symbols(input).unwrap();
        assert_lockstep(table.clone(), &input);
    }
}

#[test]
fn copy_runs_in_lockstep() {
    let table = (*Catalog::get("copy").unwrap()).clone();
    let input = tapefold::types::parse_symbols("10110").unwrap();

    assert_lockstep(table, &input);
}
