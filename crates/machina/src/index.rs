use std::collections::{HashMap, VecDeque};

use bit_set::BitSet;
use log::warn;
use machina_util::make_type_idx;

use crate::automaton::{Automaton, Label, State};
use crate::error::MachinaError;

make_type_idx!(StateIdx, IndexedState);

#[derive(Debug)]
pub(crate) struct IndexedState {
    // position in `Automaton::states`
    position: usize,
    outgoing: Vec<(Label, StateIdx)>,
    incoming: Vec<StateIdx>,
}

/// Adjacency index over an [`Automaton`], built once and shared by every algorithm.
///
/// States are renumbered densely in ascending id order, so iterating a power-state
/// (a `BitSet` of dense indices) yields the original ids already sorted. Two
/// power-states are equal iff they contain the same states, which is what
/// subset construction and string generation key their maps on.
#[derive(Debug)]
pub struct AutomatonIndex<'a> {
    automaton: &'a Automaton,
    states: Vec<IndexedState>,
    by_id: HashMap<u32, StateIdx>,
    initial: Option<StateIdx>,
    accepting: BitSet,
    alphabet: Vec<char>,
}

impl<'a> AutomatonIndex<'a> {
    /// Indexes `automaton`, rejecting duplicate ids and dangling transitions.
    pub fn new(automaton: &'a Automaton) -> Result<AutomatonIndex<'a>, MachinaError> {
        let mut order: Vec<usize> = (0..automaton.states.len()).collect();
        order.sort_by_key(|&position| automaton.states[position].id);

        let mut states: Vec<IndexedState> = Vec::with_capacity(order.len());
        let mut by_id: HashMap<u32, StateIdx> = HashMap::with_capacity(order.len());
        let mut accepting = BitSet::with_capacity(order.len());
        let mut initial: Option<StateIdx> = None;

        for position in order {
            let state = &automaton.states[position];
            let idx = StateIdx::from_push(
                &mut states,
                IndexedState {
                    position,
                    outgoing: Vec::new(),
                    incoming: Vec::new(),
                },
            );
            if by_id.insert(state.id, idx).is_some() {
                return Err(MachinaError::DuplicateState(state.id));
            }
            if state.is_final {
                accepting.insert(idx.value());
            }
        }

        // the first initial state in declaration order wins
        for state in automaton.states.iter().filter(|s| s.is_initial) {
            match initial {
                None => initial = Some(by_id[&state.id]),
                Some(_) => warn!("ignoring additional initial state {}", state.id),
            }
        }

        for t in &automaton.transitions {
            let lookup = |id: u32| {
                by_id.get(&id).copied().ok_or(MachinaError::DanglingTransition {
                    from: t.from,
                    to: t.to,
                    missing: id,
                })
            };
            let from = lookup(t.from)?;
            let to = lookup(t.to)?;
            states[from].outgoing.push((t.label, to));
            states[to].incoming.push(from);
        }

        Ok(AutomatonIndex {
            automaton,
            states,
            by_id,
            initial,
            accepting,
            alphabet: automaton.alphabet(),
        })
    }

    pub fn num_states(&self) -> usize {
        self.states.len()
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub(crate) fn initial(&self) -> Option<StateIdx> {
        self.initial
    }

    pub(crate) fn require_initial(&self) -> Result<StateIdx, MachinaError> {
        self.initial.ok_or(MachinaError::MissingInitial)
    }

    pub(crate) fn lookup(&self, id: u32) -> Option<StateIdx> {
        self.by_id.get(&id).copied()
    }

    pub(crate) fn state(&self, idx: StateIdx) -> &'a State {
        &self.automaton.states[self.states[idx].position]
    }

    pub(crate) fn id(&self, idx: StateIdx) -> u32 {
        self.state(idx).id
    }

    pub(crate) fn outgoing(&self, idx: StateIdx) -> &[(Label, StateIdx)] {
        &self.states[idx].outgoing
    }

    pub(crate) fn incoming(&self, idx: StateIdx) -> &[StateIdx] {
        &self.states[idx].incoming
    }

    pub(crate) fn accepting(&self) -> &BitSet {
        &self.accepting
    }

    pub(crate) fn is_accepting(&self, set: &BitSet) -> bool {
        !set.is_disjoint(&self.accepting)
    }

    pub(crate) fn empty_set(&self) -> BitSet {
        BitSet::with_capacity(self.states.len())
    }

    pub(crate) fn singleton(&self, idx: StateIdx) -> BitSet {
        let mut set = self.empty_set();
        set.insert(idx.value());
        set
    }

    /// The ids of the states in `set`, ascending.
    pub(crate) fn ids(&self, set: &BitSet) -> Vec<u32> {
        set.iter().map(|i| self.id(StateIdx::new(i))).collect()
    }

    // basic BFS to compute epsilon closure
    pub(crate) fn epsilon_closure(&self, set: &mut BitSet) {
        let mut queue: VecDeque<usize> = set.iter().collect();

        while let Some(i) = queue.pop_front() {
            for (label, next) in self.outgoing(StateIdx::new(i)) {
                if label.is_epsilon() && set.insert(next.value()) {
                    queue.push_back(next.value());
                }
            }
        }
    }

    /// The states directly reachable from `set` on `symbol`.
    pub(crate) fn delta(&self, set: &BitSet, symbol: char) -> BitSet {
        let mut result = self.empty_set();

        for i in set.iter() {
            for (label, next) in self.outgoing(StateIdx::new(i)) {
                if *label == Label::Symbol(symbol) {
                    result.insert(next.value());
                }
            }
        }

        result
    }

    /// `delta` followed by the epsilon closure of the result.
    pub(crate) fn step(&self, set: &BitSet, symbol: char) -> BitSet {
        let mut next = self.delta(set, symbol);
        self.epsilon_closure(&mut next);
        next
    }

    /// Epsilon closure of a set of state ids, returned as sorted ids.
    pub fn closure_of(&self, ids: &[u32]) -> Result<Vec<u32>, MachinaError> {
        let mut set = self.empty_set();
        for &id in ids {
            let idx = self.lookup(id).ok_or(MachinaError::UnknownState(id))?;
            set.insert(idx.value());
        }
        self.epsilon_closure(&mut set);
        Ok(self.ids(&set))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn chain() -> Automaton {
        // 5 -e-> 3 -e-> 1, 3 -a-> 9, 1 -e-> 5
        Automaton::new()
            .with_state(5, true, false)
            .with_state(3, false, false)
            .with_state(1, false, false)
            .with_state(9, false, true)
            .with_transition(5, 3, None)
            .with_transition(3, 1, None)
            .with_transition(1, 5, None)
            .with_transition(3, 9, Some('a'))
    }

    #[test]
    fn dense_order_follows_ids() {
        let automaton = chain();
        let index = AutomatonIndex::new(&automaton).unwrap();
        let all: BitSet = (0..index.num_states()).collect();
        assert_eq!(index.ids(&all), vec![1, 3, 5, 9]);
        assert_eq!(index.id(index.initial().unwrap()), 5);
    }

    #[test]
    fn closure_follows_epsilon_cycles() {
        let automaton = chain();
        let index = AutomatonIndex::new(&automaton).unwrap();
        assert_eq!(index.closure_of(&[5]).unwrap(), vec![1, 3, 5]);
        assert_eq!(index.closure_of(&[9]).unwrap(), vec![9]);
    }

    #[test]
    fn closure_is_idempotent_and_monotone() {
        let automaton = chain();
        let index = AutomatonIndex::new(&automaton).unwrap();

        let closed = index.closure_of(&[3]).unwrap();
        assert_eq!(index.closure_of(&closed).unwrap(), closed);

        let larger = index.closure_of(&[3, 9]).unwrap();
        assert!(closed.iter().all(|id| larger.contains(id)));
    }

    #[test]
    fn step_moves_then_closes() {
        let automaton = chain();
        let index = AutomatonIndex::new(&automaton).unwrap();
        let mut start = index.singleton(index.require_initial().unwrap());
        index.epsilon_closure(&mut start);

        assert_eq!(index.ids(&index.step(&start, 'a')), vec![9]);
        assert!(index.step(&start, 'b').is_empty());
    }

    #[test]
    fn rejects_dangling_and_duplicate_ids() {
        let dangling = Automaton::new()
            .with_state(0, true, false)
            .with_transition(0, 4, Some('a'));
        assert!(matches!(
            AutomatonIndex::new(&dangling),
            Err(MachinaError::DanglingTransition { missing: 4, .. })
        ));

        let duplicate = Automaton::new().with_state(0, true, false).with_state(0, false, true);
        assert!(matches!(AutomatonIndex::new(&duplicate), Err(MachinaError::DuplicateState(0))));
    }

    #[test]
    fn unknown_id_in_closure_query() {
        let automaton = chain();
        let index = AutomatonIndex::new(&automaton).unwrap();
        assert!(matches!(index.closure_of(&[42]), Err(MachinaError::UnknownState(42))));
    }
}
