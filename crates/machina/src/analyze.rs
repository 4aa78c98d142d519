use std::collections::VecDeque;

use bit_set::BitSet;
use log::debug;
use serde::Serialize;

use crate::automaton::Automaton;
use crate::error::MachinaError;
use crate::index::{AutomatonIndex, StateIdx};

/// Classification of states that can never take part in an accepting run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct StructureReport {
    /// States not reachable from the initial state.
    pub unreachable: Vec<u32>,
    /// States from which no final state can be reached.
    pub dead: Vec<u32>,
    /// Reachable states from which no final state can be reached.
    pub trap: Vec<u32>,
}

/// States reachable from the initial state over any transition, epsilon included.
pub(crate) fn reachable(index: &AutomatonIndex, initial: StateIdx) -> BitSet {
    let mut visited = index.singleton(initial);
    let mut queue: VecDeque<StateIdx> = VecDeque::from([initial]);

    while let Some(state) = queue.pop_front() {
        for &(_, next) in index.outgoing(state) {
            if visited.insert(next.value()) {
                queue.push_back(next);
            }
        }
    }

    visited
}

/// States from which some final state can be reached, found by searching backwards
/// from all final states.
pub(crate) fn productive(index: &AutomatonIndex) -> BitSet {
    let mut visited = index.accepting().clone();
    let mut queue: VecDeque<StateIdx> = visited.iter().map(StateIdx::new).collect();

    while let Some(state) = queue.pop_front() {
        for &previous in index.incoming(state) {
            if visited.insert(previous.value()) {
                queue.push_back(previous);
            }
        }
    }

    visited
}

/// Finds unreachable, dead and trap states. The automaton needs states and an initial state.
pub fn analyze_structure(automaton: &Automaton) -> Result<StructureReport, MachinaError> {
    if automaton.is_empty() {
        return Err(MachinaError::EmptyAutomaton);
    }
    let index = AutomatonIndex::new(automaton)?;
    let initial = index.require_initial()?;

    let all: BitSet = (0..index.num_states()).collect();
    let reachable = reachable(&index, initial);
    let productive = productive(&index);

    let mut unreachable = all.clone();
    unreachable.difference_with(&reachable);
    let mut dead = all;
    dead.difference_with(&productive);
    let mut trap = dead.clone();
    trap.intersect_with(&reachable);

    debug!(
        "{} unreachable, {} dead, {} trap states",
        unreachable.len(),
        dead.len(),
        trap.len()
    );

    Ok(StructureReport {
        unreachable: index.ids(&unreachable),
        dead: index.ids(&dead),
        trap: index.ids(&trap),
    })
}
