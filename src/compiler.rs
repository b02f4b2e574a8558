//! Compiles a two-tape transition table into a single-tape one.
//!
//! The compiled machine keeps both virtual tapes on its only tape, laid out by
//! [`crate::encoder`] as `: t1 : t2 :`, with a dotted cell marking each
//! emulated head. Its states come in three groups:
//!
//! * a setup block that turns the raw input into that layout,
//! * one block per two-tape state, each emulating a single two-tape step,
//! * a terminal accept state.
//!
//! Every compiled state is named by a [`CompiledState`] value and mapped to
//! its index by [`BlockLayout::index`]. All sizes are derived from the
//! alphabet, so nothing in the emitter hard-codes an offset.

use crate::machine::TapeMachine;
use crate::table::{DualTable, SingleTable, TableBuilder};
use crate::types::{Direction, DualTransition, Symbol, TapeSymbol, Transition, TuringMachineError};
use std::sync::Arc;
use tracing::debug;

use crate::types::Direction::{Left, Right};
use crate::types::TapeSymbol::{Dotted, Plain, Separator};

/// Symbols per virtual tape.
const SIGMA: usize = Symbol::ALL.len();
/// Symbols that may appear in the raw input.
const INPUT: usize = Symbol::INPUT.len();
/// Distinct cells a region may hold: every symbol, plain or dotted.
const CELLS: usize = 2 * SIGMA;
/// Virtual tapes folded onto the physical one.
const REGIONS: usize = 2;

/// Moving a head left: probe the neighbor, then restore the dot when the
/// neighbor is the region's left separator.
const MOVE_LEFT: usize = 2;
/// Moving head 2 right: probe the neighbor, then push the trailing separator
/// one cell right when it is hit.
const MOVE_SECOND_RIGHT: usize = 2;
/// Moving head 1 right: probe the neighbor, then carry the middle separator,
/// each kind of tape-2 cell, and the trailing separator one cell right.
const MOVE_FIRST_RIGHT: usize = 1 + 1 + CELLS + 1;

const fn max(a: usize, b: usize) -> usize {
    if a > b {
        a
    } else {
        b
    }
}

/// States shared by every leaf of a block: park, then find both dots.
pub const COMMON_SIZE: usize = 2 + 2 * SIGMA;
/// One leaf per pair of symbols under the two heads.
pub const LEAVES: usize = SIGMA * SIGMA;
/// States per leaf: move head 2, walk back to head 1, move head 1, rewind.
pub const LEAF_SIZE: usize =
    max(MOVE_LEFT, MOVE_SECOND_RIGHT) + REGIONS + max(MOVE_LEFT, MOVE_FIRST_RIGHT) + REGIONS;
/// States per compiled two-tape state.
pub const BLOCK_SIZE: usize = COMMON_SIZE + LEAVES * LEAF_SIZE;
/// States of the setup block: start, carry each input symbol (first cell or
/// not), handle empty input, write the three remaining layout cells, rewind.
pub const SETUP_SIZE: usize = 1 + 2 * INPUT + 1 + 3 + REGIONS;

/// Which region the physical head is walking through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    First,
    Second,
}

impl Region {
    fn offset(self) -> usize {
        match self {
            Region::Second => 0,
            Region::First => 1,
        }
    }
}

/// States of the setup block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupState {
    /// Reads the first input cell and replaces it with the leading separator.
    Start,
    /// Shifts the input one cell right, carrying `symbol`. The first carried
    /// symbol is written dotted.
    Carry { symbol: Symbol, first: bool },
    /// The input was empty: tape 1 becomes a single dotted blank.
    EmptyInput,
    CloseFirst,
    OpenSecond,
    CloseSecond,
    /// Walks back to the leading separator.
    Rewind(Region),
}

impl SetupState {
    fn offset(self) -> usize {
        match self {
            SetupState::Start => 0,
            SetupState::Carry { symbol, first } => {
                1 + 2 * input_index(symbol) + usize::from(first)
            }
            SetupState::EmptyInput => 1 + 2 * INPUT,
            SetupState::CloseFirst => 2 + 2 * INPUT,
            SetupState::OpenSecond => 3 + 2 * INPUT,
            SetupState::CloseSecond => 4 + 2 * INPUT,
            SetupState::Rewind(region) => 5 + 2 * INPUT + region.offset(),
        }
    }
}

/// States inside the block of one two-tape state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockState {
    /// Entered on the leading separator; steps onto tape 1's region.
    Enter,
    /// Scans tape 1's region for its dot.
    SeekFirst,
    /// Tape 1's head reads the carried symbol; scans to the middle separator.
    CrossFirst(Symbol),
    /// Scans tape 2's region for its dot.
    SeekSecond(Symbol),
    /// Emulates the transition taken on `read`.
    Leaf { read: [Symbol; 2], step: LeafStep },
}

impl BlockState {
    fn offset(self) -> usize {
        match self {
            BlockState::Enter => 0,
            BlockState::SeekFirst => 1,
            BlockState::CrossFirst(symbol) => 2 + symbol_index(symbol),
            BlockState::SeekSecond(symbol) => 2 + SIGMA + symbol_index(symbol),
            BlockState::Leaf { read, step } => {
                let leaf = symbol_index(read[0]) * SIGMA + symbol_index(read[1]);
                COMMON_SIZE + leaf * LEAF_SIZE + step.offset()
            }
        }
    }
}

/// States of one leaf. Left and right variants of a head move share slots,
/// since a leaf only ever uses one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafStep {
    /// Head 2's old cell was just cleared; marks its neighbor.
    ProbeSecond,
    /// Left move off tape 2's first cell: put the dot back.
    RestoreSecond,
    /// Right move onto the trailing separator: re-write it one cell further.
    ExtendSecond,
    /// Walks left through tape 2's region.
    ReturnSecond,
    /// Walks left through tape 1's region to its dot.
    ReturnFirst,
    /// Head 1's old cell was just cleared; marks its neighbor.
    ProbeFirst,
    /// Left move off tape 1's first cell: put the dot back.
    RestoreFirst,
    /// Right move onto the middle separator: carry it one cell right.
    CarrySeparator,
    /// Carrying a cell of tape 2's region one cell right.
    CarryCell(TapeSymbol),
    /// Carrying the trailing separator one cell right.
    CarryLast,
    /// Walks back to the leading separator and jumps to the next block.
    Rewind(Region),
}

impl LeafStep {
    fn offset(self) -> usize {
        const HEAD_SECOND: usize = max(MOVE_LEFT, MOVE_SECOND_RIGHT);
        const HEAD_FIRST: usize = HEAD_SECOND + REGIONS;
        const REWIND: usize = HEAD_FIRST + max(MOVE_LEFT, MOVE_FIRST_RIGHT);

        match self {
            LeafStep::ProbeSecond => 0,
            LeafStep::RestoreSecond | LeafStep::ExtendSecond => 1,
            LeafStep::ReturnSecond => HEAD_SECOND,
            LeafStep::ReturnFirst => HEAD_SECOND + 1,
            LeafStep::ProbeFirst => HEAD_FIRST,
            LeafStep::RestoreFirst | LeafStep::CarrySeparator => HEAD_FIRST + 1,
            LeafStep::CarryCell(cell) => HEAD_FIRST + 2 + cell_index(cell),
            LeafStep::CarryLast => HEAD_FIRST + 2 + CELLS,
            LeafStep::Rewind(region) => REWIND + region.offset(),
        }
    }
}

/// A state of the compiled machine, named by role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompiledState {
    Setup(SetupState),
    Block { state: usize, step: BlockState },
    Accept,
}

fn symbol_index(symbol: Symbol) -> usize {
    match symbol {
        Symbol::Blank => 0,
        Symbol::Zero => 1,
        Symbol::One => 2,
    }
}

/// Position of a carried symbol within [`Symbol::INPUT`]. Only input symbols are ever carried.
fn input_index(symbol: Symbol) -> usize {
    Symbol::INPUT
        .iter()
        .position(|&s| s == symbol)
        .unwrap_or(0)
}

/// Position of a region cell within [`TapeSymbol::cells`].
fn cell_index(cell: TapeSymbol) -> usize {
    match cell {
        Plain(symbol) => symbol_index(symbol),
        Dotted(symbol) => SIGMA + symbol_index(symbol),
        Separator => CELLS,
    }
}

/// Where each compiled state lives, for a two-tape table of `states` states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    states: usize,
}

impl BlockLayout {
    pub fn new(states: usize) -> Self {
        Self { states }
    }

    /// Two-tape states compiled.
    pub fn source_states(&self) -> usize {
        self.states
    }

    /// Total compiled states, the accept state included.
    pub fn len(&self) -> usize {
        SETUP_SIZE + self.states * BLOCK_SIZE + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Base address of the block emulating two-tape `state`.
    pub fn entry(&self, state: usize) -> usize {
        SETUP_SIZE + state * BLOCK_SIZE
    }

    pub fn accept_state(&self) -> usize {
        self.len() - 1
    }

    pub fn index(&self, state: CompiledState) -> usize {
        match state {
            CompiledState::Setup(setup) => setup.offset(),
            CompiledState::Block { state, step } => self.entry(state) + step.offset(),
            CompiledState::Accept => self.accept_state(),
        }
    }

    /// Every compiled state, in index order.
    pub fn states(&self) -> Vec<CompiledState> {
        let mut all = Vec::with_capacity(self.len());

        all.push(CompiledState::Setup(SetupState::Start));
        for symbol in Symbol::INPUT {
            for first in [false, true] {
                all.push(CompiledState::Setup(SetupState::Carry { symbol, first }));
            }
        }
        all.extend(
            [
                SetupState::EmptyInput,
                SetupState::CloseFirst,
                SetupState::OpenSecond,
                SetupState::CloseSecond,
                SetupState::Rewind(Region::Second),
                SetupState::Rewind(Region::First),
            ]
            .map(CompiledState::Setup),
        );

        for state in 0..self.states {
            let block = |step| CompiledState::Block { state, step };
            all.push(block(BlockState::Enter));
            all.push(block(BlockState::SeekFirst));
            all.extend(Symbol::ALL.map(|s| block(BlockState::CrossFirst(s))));
            all.extend(Symbol::ALL.map(|s| block(BlockState::SeekSecond(s))));

            for a in Symbol::ALL {
                for b in Symbol::ALL {
                    let leaf = |step| block(BlockState::Leaf { read: [a, b], step });
                    all.push(leaf(LeafStep::ProbeSecond));
                    all.push(leaf(LeafStep::ExtendSecond));
                    all.push(leaf(LeafStep::ReturnSecond));
                    all.push(leaf(LeafStep::ReturnFirst));
                    all.push(leaf(LeafStep::ProbeFirst));
                    all.push(leaf(LeafStep::CarrySeparator));
                    all.extend(TapeSymbol::cells().map(|c| leaf(LeafStep::CarryCell(c))));
                    all.push(leaf(LeafStep::CarryLast));
                    all.push(leaf(LeafStep::Rewind(Region::Second)));
                    all.push(leaf(LeafStep::Rewind(Region::First)));
                }
            }
        }

        all.push(CompiledState::Accept);
        all
    }
}

/// A compiled single-tape table together with the layout that produced it.
#[derive(Debug, Clone)]
pub struct Compiled {
    table: Arc<SingleTable>,
    layout: BlockLayout,
}

impl Compiled {
    pub fn table(&self) -> &Arc<SingleTable> {
        &self.table
    }

    pub fn layout(&self) -> BlockLayout {
        self.layout
    }

    /// Index of the state that begins emulating two-tape `state`.
    pub fn entry(&self, state: usize) -> usize {
        self.layout.entry(state)
    }

    pub fn accept_state(&self) -> usize {
        self.layout.accept_state()
    }

    /// A fresh executor over the compiled table.
    pub fn machine(&self) -> TapeMachine {
        TapeMachine::new(Arc::clone(&self.table))
    }
}

/// Accumulates compiled transitions, addressing states by role.
struct Emitter {
    layout: BlockLayout,
    builder: TableBuilder<Transition>,
}

impl Emitter {
    fn emit(
        &mut self,
        from: CompiledState,
        read: TapeSymbol,
        to: CompiledState,
        write: TapeSymbol,
        direction: Direction,
    ) -> Result<(), TuringMachineError> {
        let transition = Transition {
            target: self.layout.index(to),
            write,
            direction,
        };
        self.builder
            .add_transition(self.layout.index(from), read, transition)?;

        Ok(())
    }

    /// Moves over `read` without changing it.
    fn pass(
        &mut self,
        from: CompiledState,
        read: TapeSymbol,
        to: CompiledState,
        direction: Direction,
    ) -> Result<(), TuringMachineError> {
        self.emit(from, read, to, read, direction)
    }
}

/// Compiles a two-tape table into a single-tape table that accepts, rejects
/// or runs forever on exactly the inputs the two-tape table does.
///
/// The compiled machine expects raw input over `{0, 1}` at the start of its
/// tape, as produced by [`crate::encoder::encode_input`].
pub fn compile(dual: &DualTable) -> Result<Compiled, TuringMachineError> {
    let layout = BlockLayout::new(dual.len());
    let mut emitter = Emitter {
        layout,
        builder: TableBuilder::with_states(layout.len()),
    };

    emit_setup(&mut emitter)?;
    for state in 0..dual.len() {
        emit_block(&mut emitter, dual, state)?;
    }

    let table = emitter.builder.build()?;
    debug!(
        source_states = dual.len(),
        block_size = BLOCK_SIZE,
        states = table.len(),
        transitions = table.transition_count(),
        "compiled two-tape table"
    );

    Ok(Compiled {
        table: Arc::new(table),
        layout,
    })
}

fn emit_setup(e: &mut Emitter) -> Result<(), TuringMachineError> {
    use SetupState::*;
    let setup = CompiledState::Setup;
    let blank = Plain(Symbol::Blank);

    for symbol in Symbol::INPUT {
        e.emit(
            setup(Start),
            Plain(symbol),
            setup(Carry { symbol, first: true }),
            Separator,
            Right,
        )?;
    }
    e.emit(setup(Start), blank, setup(EmptyInput), Separator, Right)?;

    for carried in Symbol::INPUT {
        for first in [false, true] {
            let from = setup(Carry {
                symbol: carried,
                first,
            });
            let write = if first {
                Dotted(carried)
            } else {
                Plain(carried)
            };

            for symbol in Symbol::INPUT {
                let to = setup(Carry {
                    symbol,
                    first: false,
                });
                e.emit(from, Plain(symbol), to, write, Right)?;
            }
            e.emit(from, blank, setup(CloseFirst), write, Right)?;
        }
    }

    e.emit(setup(EmptyInput), blank, setup(CloseFirst), Dotted(Symbol::Blank), Right)?;
    e.emit(setup(CloseFirst), blank, setup(OpenSecond), Separator, Right)?;
    e.emit(setup(OpenSecond), blank, setup(CloseSecond), Dotted(Symbol::Blank), Right)?;
    e.emit(setup(CloseSecond), blank, setup(Rewind(Region::Second)), Separator, Left)?;

    emit_rewind(
        e,
        setup(Rewind(Region::Second)),
        setup(Rewind(Region::First)),
        CompiledState::Block {
            state: 0,
            step: BlockState::Enter,
        },
    )
}

/// Walks left through tape 2's region, then tape 1's, and leaves the leading
/// separator for `next`. Moving left at position 0 keeps the head on it.
fn emit_rewind(
    e: &mut Emitter,
    second: CompiledState,
    first: CompiledState,
    next: CompiledState,
) -> Result<(), TuringMachineError> {
    for cell in TapeSymbol::cells() {
        e.pass(second, cell, second, Left)?;
        e.pass(first, cell, first, Left)?;
    }
    e.pass(second, Separator, first, Left)?;
    e.pass(first, Separator, next, Left)
}

fn emit_block(e: &mut Emitter, dual: &DualTable, state: usize) -> Result<(), TuringMachineError> {
    use BlockState::*;
    let block = |step| CompiledState::Block { state, step };

    e.pass(block(Enter), Separator, block(SeekFirst), Right)?;

    for symbol in Symbol::ALL {
        e.pass(block(SeekFirst), Plain(symbol), block(SeekFirst), Right)?;
        e.pass(block(SeekFirst), Dotted(symbol), block(CrossFirst(symbol)), Right)?;
    }

    for first in Symbol::ALL {
        for symbol in Symbol::ALL {
            e.pass(block(CrossFirst(first)), Plain(symbol), block(CrossFirst(first)), Right)?;
            e.pass(block(SeekSecond(first)), Plain(symbol), block(SeekSecond(first)), Right)?;
        }
        e.pass(block(CrossFirst(first)), Separator, block(SeekSecond(first)), Right)?;
    }

    for (read, transition) in dual.transitions(state) {
        let target = if transition.target == dual.accept_state() {
            CompiledState::Accept
        } else {
            CompiledState::Block {
                state: transition.target,
                step: Enter,
            }
        };
        let leaf = |step| block(Leaf { read: *read, step });

        e.emit(
            block(SeekSecond(read[0])),
            Dotted(read[1]),
            leaf(LeafStep::ProbeSecond),
            Plain(transition.write[1]),
            transition.directions[1],
        )?;
        emit_leaf(e, *read, transition, leaf, target)?;
    }

    Ok(())
}

/// Emits one leaf, entered with head 2's old cell already overwritten and the
/// physical head on the neighbor it moved to.
fn emit_leaf(
    e: &mut Emitter,
    read: [Symbol; 2],
    transition: &DualTransition,
    leaf: impl Fn(LeafStep) -> CompiledState,
    target: CompiledState,
) -> Result<(), TuringMachineError> {
    use LeafStep::*;
    let [write_first, write_second] = transition.write;
    let [move_first, move_second] = transition.directions;

    // Head 2.
    for symbol in Symbol::ALL {
        e.emit(leaf(ProbeSecond), Plain(symbol), leaf(ReturnSecond), Dotted(symbol), Left)?;
    }
    match move_second {
        Left => {
            e.pass(leaf(ProbeSecond), Separator, leaf(RestoreSecond), Right)?;
            e.emit(
                leaf(RestoreSecond),
                Plain(write_second),
                leaf(ReturnSecond),
                Dotted(write_second),
                Left,
            )?;
        }
        Right => {
            e.emit(
                leaf(ProbeSecond),
                Separator,
                leaf(ExtendSecond),
                Dotted(Symbol::Blank),
                Right,
            )?;
            e.emit(
                leaf(ExtendSecond),
                Plain(Symbol::Blank),
                leaf(ReturnSecond),
                Separator,
                Left,
            )?;
        }
    }

    // Back to head 1.
    for cell in TapeSymbol::cells() {
        e.pass(leaf(ReturnSecond), cell, leaf(ReturnSecond), Left)?;
    }
    e.pass(leaf(ReturnSecond), Separator, leaf(ReturnFirst), Left)?;
    for symbol in Symbol::ALL {
        e.pass(leaf(ReturnFirst), Plain(symbol), leaf(ReturnFirst), Left)?;
    }
    e.emit(
        leaf(ReturnFirst),
        Dotted(read[0]),
        leaf(ProbeFirst),
        Plain(write_first),
        move_first,
    )?;

    // Head 1.
    for symbol in Symbol::ALL {
        e.emit(
            leaf(ProbeFirst),
            Plain(symbol),
            leaf(Rewind(Region::First)),
            Dotted(symbol),
            Left,
        )?;
    }
    match move_first {
        Left => {
            e.pass(leaf(ProbeFirst), Separator, leaf(RestoreFirst), Right)?;
            e.emit(
                leaf(RestoreFirst),
                Plain(write_first),
                leaf(Rewind(Region::First)),
                Dotted(write_first),
                Left,
            )?;
        }
        Right => {
            e.emit(
                leaf(ProbeFirst),
                Separator,
                leaf(CarrySeparator),
                Dotted(Symbol::Blank),
                Right,
            )?;
            for cell in TapeSymbol::cells() {
                e.emit(leaf(CarrySeparator), cell, leaf(CarryCell(cell)), Separator, Right)?;
                for next in TapeSymbol::cells() {
                    e.emit(leaf(CarryCell(cell)), next, leaf(CarryCell(next)), cell, Right)?;
                }
                e.emit(leaf(CarryCell(cell)), Separator, leaf(CarryLast), cell, Right)?;
            }
            e.emit(
                leaf(CarryLast),
                Plain(Symbol::Blank),
                leaf(Rewind(Region::Second)),
                Separator,
                Left,
            )?;
        }
    }

    emit_rewind(
        e,
        leaf(Rewind(Region::Second)),
        leaf(Rewind(Region::First)),
        target,
    )
}
