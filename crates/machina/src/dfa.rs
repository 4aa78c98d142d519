use serde::Serialize;

use crate::automaton::{Automaton, Label};
use crate::error::MachinaError;
use crate::index::AutomatonIndex;

// states = rows, alphabet symbols = columns
// None = no transition, the input is rejected
/// A validated DFA flattened into a transition table.
///
/// This is the record handed to code emission: building one performs the full
/// determinism check, so anything holding a `DfaTable` is known to be deterministic.
/// It is only ever written out; the sole way to obtain one is [`DfaTable::from_automaton`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DfaTable {
    alphabet: Vec<char>,
    state_ids: Vec<u32>,
    data: Vec<Option<usize>>,
    accepting: Vec<bool>,
    initial_state: usize,
}

impl DfaTable {
    /// Validates `dfa` and builds its table. Rows follow ascending state ids.
    pub fn from_automaton(dfa: &Automaton) -> Result<DfaTable, MachinaError> {
        if dfa.is_empty() {
            return Err(MachinaError::EmptyAutomaton);
        }

        let index = AutomatonIndex::new(dfa)?;
        let alphabet = index.alphabet().to_vec();
        let num_states = index.num_states();
        let num_inputs = alphabet.len();
        let mut data: Vec<Option<usize>> = vec![None; num_states * num_inputs];

        for t in &dfa.transitions {
            let symbol = match t.label {
                Label::Epsilon => return Err(MachinaError::EpsilonInDfa),
                Label::Symbol(c) => c,
            };
            // endpoints and symbols were all seen while indexing
            let (Some(from), Some(to), Ok(column)) = (
                index.lookup(t.from),
                index.lookup(t.to),
                alphabet.binary_search(&symbol),
            ) else {
                continue;
            };
            let slot = &mut data[from.value() * num_inputs + column];
            if slot.is_some() {
                return Err(MachinaError::NotDeterministic {
                    state: index.state(from).label.clone(),
                    symbol,
                });
            }
            *slot = Some(to.value());
        }

        let initial_state = index.require_initial()?.value();
        let all: bit_set::BitSet = (0..num_states).collect();

        Ok(DfaTable {
            alphabet,
            state_ids: index.ids(&all),
            data,
            accepting: (0..num_states).map(|i| index.accepting().contains(i)).collect(),
            initial_state,
        })
    }

    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    pub fn num_states(&self) -> usize {
        self.state_ids.len()
    }

    pub fn initial_state(&self) -> usize {
        self.initial_state
    }

    /// The caller-facing id of table row `state`.
    pub fn state_id(&self, state: usize) -> u32 {
        self.state_ids[state]
    }

    pub fn is_accepting(&self, state: usize) -> bool {
        self.accepting[state]
    }

    pub fn column(&self, symbol: char) -> Option<usize> {
        self.alphabet.binary_search(&symbol).ok()
    }

    pub fn next_state(&self, current_state: usize, symbol: char) -> Option<usize> {
        let column = self.column(symbol)?;
        self.next_state_by_column(current_state, column)
    }

    pub(crate) fn next_state_by_column(&self, current_state: usize, column: usize) -> Option<usize> {
        self.data[current_state * self.alphabet.len() + column]
    }

    /// Runs the table over `input`.
    pub fn matches(&self, input: &str) -> bool {
        let mut state = self.initial_state;
        for c in input.chars() {
            match self.next_state(state, c) {
                Some(next) => state = next,
                None => return false,
            }
        }
        self.accepting[state]
    }
}

/// Checks that `automaton` is a DFA: it has states, exactly one of them is used as
/// initial, there are no epsilon transitions and at most one transition per
/// `(state, symbol)`.
pub fn validate_dfa(automaton: &Automaton) -> Result<(), MachinaError> {
    DfaTable::from_automaton(automaton).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ends_in_b() -> Automaton {
        Automaton::new()
            .with_state(10, true, false)
            .with_state(20, false, true)
            .with_transition(10, 10, Some('a'))
            .with_transition(10, 20, Some('b'))
            .with_transition(20, 20, Some('b'))
            .with_transition(20, 10, Some('a'))
    }

    #[test]
    fn table_layout() {
        let table = DfaTable::from_automaton(&ends_in_b()).unwrap();
        assert_eq!(table.alphabet(), &['a', 'b']);
        assert_eq!(table.num_states(), 2);
        assert_eq!(table.state_id(table.initial_state()), 10);
        assert_eq!(table.next_state(0, 'b'), Some(1));
        assert_eq!(table.next_state(0, 'c'), None);
        assert!(table.is_accepting(1));
    }

    #[test]
    fn table_matches() {
        let table = DfaTable::from_automaton(&ends_in_b()).unwrap();
        assert!(table.matches("ab"));
        assert!(table.matches("bbab"));
        assert!(!table.matches(""));
        assert!(!table.matches("ba"));
        assert!(!table.matches("abc"));
    }

    #[test]
    fn names_the_nondeterministic_state() {
        let nfa = ends_in_b().with_transition(20, 20, Some('a'));
        match validate_dfa(&nfa) {
            Err(MachinaError::NotDeterministic { state, symbol }) => {
                assert_eq!(state, "q20");
                assert_eq!(symbol, 'a');
            }
            other => panic!("expected a determinism violation, got {other:?}"),
        }
    }

    #[test]
    fn rejects_epsilon_and_missing_initial() {
        let with_epsilon = ends_in_b().with_transition(10, 20, None);
        assert!(matches!(validate_dfa(&with_epsilon), Err(MachinaError::EpsilonInDfa)));

        let no_initial = Automaton::new().with_state(0, false, true);
        assert!(matches!(validate_dfa(&no_initial), Err(MachinaError::MissingInitial)));

        assert!(matches!(validate_dfa(&Automaton::new()), Err(MachinaError::EmptyAutomaton)));
    }

    #[test]
    fn serializes_for_emission() {
        let table = DfaTable::from_automaton(&ends_in_b()).unwrap();
        let value = serde_json::to_value(&table).unwrap();
        assert_eq!(value["alphabet"], serde_json::json!(["a", "b"]));
        assert_eq!(value["state_ids"], serde_json::json!([10, 20]));
        assert_eq!(value["data"], serde_json::json!([0, 1, 0, 1]));
        assert_eq!(value["accepting"], serde_json::json!([false, true]));
        assert_eq!(value["initial_state"], serde_json::json!(0));
    }
}
