use std::collections::{HashMap, VecDeque};

use bit_set::BitSet;
use log::{debug, trace};
use machina_util::Grid;

use crate::automaton::{Automaton, Label, State, Transition};
use crate::error::MachinaError;
use crate::index::AutomatonIndex;
use crate::limits::Limits;

pub(crate) const RESULT_GRID: Grid = Grid::new(4, (150.0, 150.0), 120.0);

/// A deterministic automaton together with the power-state behind each of its states.
#[derive(Clone, Debug, PartialEq)]
pub struct Determinization {
    pub automaton: Automaton,
    /// `power_states[i]` holds the sorted ids of the input states merged into output state `i`.
    pub power_states: Vec<Vec<u32>>,
}

/// Subset construction over an indexed automaton.
///
/// Every output state is the epsilon-closed set of input states reachable on some
/// word; output ids are allocated in BFS discovery order starting at 0 for the
/// closure of the initial state, and states are labelled `<prefix><id>`.
pub(crate) fn determinize_indexed(
    index: &AutomatonIndex,
    prefix: &str,
    limits: &Limits,
) -> Result<Determinization, MachinaError> {
    let mut initial_configuration = index.singleton(index.require_initial()?);
    index.epsilon_closure(&mut initial_configuration);

    // configuration -> id
    let mut subsets: HashMap<BitSet, u32> = HashMap::new();
    let mut configurations: Vec<BitSet> = Vec::new();
    let mut transitions: Vec<Transition> = Vec::new();

    subsets.insert(initial_configuration.clone(), 0);
    configurations.push(initial_configuration.clone());

    let mut work_queue: VecDeque<BitSet> = VecDeque::new();
    work_queue.push_back(initial_configuration);

    while let Some(q) = work_queue.pop_front() {
        let from = subsets[&q];
        for &symbol in index.alphabet() {
            let t = index.step(&q, symbol);
            if t.is_empty() {
                continue;
            }

            let to = match subsets.get(&t) {
                Some(&id) => id,
                None => {
                    if configurations.len() >= limits.max_subset_states {
                        return Err(MachinaError::ResourceLimit {
                            what: "subset construction states",
                            limit: limits.max_subset_states,
                        });
                    }
                    let id = configurations.len() as u32;
                    trace!("new power-state {} = {:?}", id, index.ids(&t));
                    subsets.insert(t.clone(), id);
                    configurations.push(t.clone());
                    work_queue.push_back(t);
                    id
                }
            };

            transitions.push(Transition {
                from,
                to,
                label: Label::Symbol(symbol),
            });
        }
    }

    let states: Vec<State> = configurations
        .iter()
        .enumerate()
        .map(|(id, set)| State::on_grid(id as u32, prefix, &RESULT_GRID, id == 0, index.is_accepting(set)))
        .collect();

    debug!(
        "subset construction produced {} states from {}",
        states.len(),
        index.num_states()
    );

    Ok(Determinization {
        automaton: Automaton { states, transitions },
        power_states: configurations.iter().map(|set| index.ids(set)).collect(),
    })
}

/// Determinizes an arbitrary automaton, labelling the result `D0`, `D1`, ...
pub fn determinize(automaton: &Automaton, limits: &Limits) -> Result<Determinization, MachinaError> {
    let index = AutomatonIndex::new(automaton)?;
    determinize_indexed(&index, "D", limits)
}

/// Converts an NFA into an equivalent DFA. A missing initial state is an error.
pub fn nfa_to_dfa(automaton: &Automaton, limits: &Limits) -> Result<Automaton, MachinaError> {
    Ok(determinize(automaton, limits)?.automaton)
}

/// Removes the epsilon transitions of a freshly compiled NFA, labelling the result
/// `s0`, `s1`, ... An automaton without an initial state simplifies to the empty automaton.
pub fn simplify_nfa(automaton: &Automaton, limits: &Limits) -> Result<Automaton, MachinaError> {
    let index = AutomatonIndex::new(automaton)?;
    if index.initial().is_none() {
        return Ok(Automaton::default());
    }
    Ok(determinize_indexed(&index, "s", limits)?.automaton)
}
