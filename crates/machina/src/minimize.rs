use std::collections::VecDeque;

use log::debug;

use crate::automaton::{Automaton, Label, State, Transition};
use crate::dfa::DfaTable;
use crate::error::MachinaError;
use crate::limits::Limits;
use crate::subset::RESULT_GRID;

// Table-filling over the reachable states plus one virtual, non-accepting sink
// that stands for "no transition". Missing transitions are compared against the
// sink so that a partial DFA is never merged into a state that accepts more.
struct PairTable {
    // reachable table rows, ascending
    states: Vec<usize>,
    // table row -> position in `states`
    position: Vec<Option<usize>>,
    distinguishable: Vec<bool>,
}

impl PairTable {
    fn new(table: &DfaTable, states: Vec<usize>, limits: &Limits) -> Result<PairTable, MachinaError> {
        let size = states.len() + 1;
        // the initial marking alone examines every pair once
        if pair_count(size) > limits.max_pair_checks {
            return Err(pair_limit(limits));
        }

        let mut position = vec![None; table.num_states()];
        for (i, &state) in states.iter().enumerate() {
            position[state] = Some(i);
        }
        Ok(PairTable {
            states,
            position,
            distinguishable: vec![false; size * size],
        })
    }

    fn sink(&self) -> usize {
        self.states.len()
    }

    fn size(&self) -> usize {
        self.states.len() + 1
    }

    fn is_accepting(&self, table: &DfaTable, p: usize) -> bool {
        p != self.sink() && table.is_accepting(self.states[p])
    }

    fn successor(&self, table: &DfaTable, p: usize, column: usize) -> usize {
        if p == self.sink() {
            return p;
        }
        table
            .next_state_by_column(self.states[p], column)
            .and_then(|next| self.position[next])
            .unwrap_or(self.sink())
    }

    fn marked(&self, p: usize, q: usize) -> bool {
        self.distinguishable[p * self.size() + q]
    }

    fn mark(&mut self, p: usize, q: usize) {
        let size = self.size();
        self.distinguishable[p * size + q] = true;
        self.distinguishable[q * size + p] = true;
    }

    fn fill(&mut self, table: &DfaTable, limits: &Limits) -> Result<(), MachinaError> {
        let size = self.size();
        let pairs = pair_count(size);
        let mut checks = pairs;
        for p in 0..size {
            for q in p + 1..size {
                if self.is_accepting(table, p) != self.is_accepting(table, q) {
                    self.mark(p, q);
                }
            }
        }

        let mut rounds = 0;
        let mut changed = true;
        while changed {
            checks = checks.saturating_add(pairs);
            if checks > limits.max_pair_checks {
                return Err(pair_limit(limits));
            }
            rounds += 1;
            changed = false;

            for p in 0..size {
                for q in p + 1..size {
                    if self.marked(p, q) {
                        continue;
                    }
                    let split = (0..table.alphabet().len()).any(|column| {
                        let p_next = self.successor(table, p, column);
                        let q_next = self.successor(table, q, column);
                        p_next != q_next && self.marked(p_next, q_next)
                    });
                    if split {
                        self.mark(p, q);
                        changed = true;
                    }
                }
            }
        }

        debug!(
            "pair table reached its fixed point after {} rounds ({} pair checks)",
            rounds, checks
        );
        Ok(())
    }

    // classes of mutually indistinguishable positions, ordered by their smallest member;
    // a class holding only the sink is dropped
    fn partition(&self) -> Vec<Vec<usize>> {
        let size = self.size();
        let mut class_of: Vec<Option<usize>> = vec![None; size];
        let mut classes: Vec<Vec<usize>> = Vec::new();

        for p in 0..size {
            if class_of[p].is_some() {
                continue;
            }
            let members: Vec<usize> = (p..size)
                .filter(|&q| class_of[q].is_none() && (q == p || !self.marked(p, q)))
                .collect();
            if members == [self.sink()] {
                continue;
            }
            for &q in &members {
                class_of[q] = Some(classes.len());
            }
            classes.push(members);
        }

        classes
    }
}

// unordered pairs of distinct positions in a table with `size` rows
fn pair_count(size: usize) -> usize {
    size.saturating_mul(size - 1) / 2
}

fn pair_limit(limits: &Limits) -> MachinaError {
    MachinaError::ResourceLimit {
        what: "minimization pair checks",
        limit: limits.max_pair_checks,
    }
}

fn reachable_rows(table: &DfaTable) -> Vec<usize> {
    let mut visited = vec![false; table.num_states()];
    let mut queue: VecDeque<usize> = VecDeque::new();
    visited[table.initial_state()] = true;
    queue.push_back(table.initial_state());

    while let Some(state) = queue.pop_front() {
        for column in 0..table.alphabet().len() {
            if let Some(next) = table.next_state_by_column(state, column) {
                if !visited[next] {
                    visited[next] = true;
                    queue.push_back(next);
                }
            }
        }
    }

    (0..table.num_states()).filter(|&s| visited[s]).collect()
}

/// Minimizes a DFA with the Myhill-Nerode table-filling algorithm.
///
/// Unreachable states are discarded first, then mutually indistinguishable states
/// are merged. Output states are labelled `M0`, `M1`, ... in the order of their
/// smallest original id. An automaton without states minimizes to itself.
pub fn minimize_dfa(dfa: &Automaton, limits: &Limits) -> Result<Automaton, MachinaError> {
    if dfa.is_empty() {
        return Ok(Automaton::default());
    }

    let table = DfaTable::from_automaton(dfa)?;
    let reachable = reachable_rows(&table);
    debug!(
        "pruned {} unreachable states",
        table.num_states() - reachable.len()
    );

    let mut pairs = PairTable::new(&table, reachable, limits)?;
    pairs.fill(&table, limits)?;
    let classes = pairs.partition();

    let sink = pairs.sink();
    let mut class_of_row: Vec<Option<u32>> = vec![None; table.num_states()];
    for (class, members) in classes.iter().enumerate() {
        for &p in members.iter().filter(|&&p| p != sink) {
            class_of_row[pairs.states[p]] = Some(class as u32);
        }
    }

    let mut states: Vec<State> = Vec::with_capacity(classes.len());
    let mut transitions: Vec<Transition> = Vec::new();
    for (class, members) in classes.iter().enumerate() {
        let rows: Vec<usize> = members
            .iter()
            .filter(|&&p| p != sink)
            .map(|&p| pairs.states[p])
            .collect();
        let is_initial = rows.contains(&table.initial_state());
        let is_final = rows.iter().any(|&row| table.is_accepting(row));
        states.push(State::on_grid(class as u32, "M", &RESULT_GRID, is_initial, is_final));

        // one representative per class, so every (class, symbol) appears at most once
        let representative = rows[0];
        for (column, &symbol) in table.alphabet().iter().enumerate() {
            let target = table
                .next_state_by_column(representative, column)
                .and_then(|next| class_of_row[next]);
            if let Some(to) = target {
                transitions.push(Transition {
                    from: class as u32,
                    to,
                    label: Label::Symbol(symbol),
                });
            }
        }
    }

    debug!("minimized {} states into {}", dfa.states.len(), states.len());
    Ok(Automaton { states, transitions })
}
