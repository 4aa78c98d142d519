use std::collections::{HashSet, VecDeque};

use bit_set::BitSet;
use log::{debug, warn};
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::Serialize;

use crate::analyze::{productive, reachable};
use crate::automaton::Automaton;
use crate::error::MachinaError;
use crate::index::{AutomatonIndex, StateIdx};
use crate::limits::Limits;

/// What can be said about an automaton's language without enumerating it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LanguageDescription {
    pub empty: bool,
    pub accepts_empty_string: bool,
    /// Some cycle consuming at least one symbol lies on an accepting path.
    pub infinite: bool,
    /// Some transition leads from a state back to itself.
    pub has_self_loop: bool,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub strings: Vec<String>,
    pub language: LanguageDescription,
}

/// Enumerates up to `max_count` distinct accepted strings of at most `max_length`
/// symbols, shortest first.
///
/// The search is a BFS over power-states; a power-state is expanded only the first
/// time it is reached, so each recorded string is the shortest one leading there.
pub fn generate_strings(
    automaton: &Automaton,
    max_count: usize,
    max_length: usize,
) -> Result<Vec<String>, MachinaError> {
    let index = AutomatonIndex::new(automaton)?;
    let initial = index.require_initial()?;
    if index.accepting().is_empty() || max_count == 0 {
        return Ok(Vec::new());
    }

    let mut found: Vec<String> = Vec::new();
    let mut initial_set = index.singleton(initial);
    index.epsilon_closure(&mut initial_set);
    if index.is_accepting(&initial_set) {
        found.push(String::new());
    }

    let mut visited: HashSet<BitSet> = HashSet::from([initial_set.clone()]);
    let mut queue: VecDeque<(BitSet, String, usize)> = VecDeque::from([(initial_set, String::new(), 0)]);

    'search: while let Some((current, path, length)) = queue.pop_front() {
        if found.len() >= max_count {
            break;
        }
        if length >= max_length {
            continue;
        }

        for &symbol in index.alphabet() {
            let next = index.step(&current, symbol);
            if next.is_empty() || visited.contains(&next) {
                continue;
            }

            let mut next_path = path.clone();
            next_path.push(symbol);
            if index.is_accepting(&next) {
                found.push(next_path.clone());
                if found.len() >= max_count {
                    break 'search;
                }
            }

            visited.insert(next.clone());
            queue.push_back((next, next_path, length + 1));
        }
    }

    if found.len() >= max_count && !queue.is_empty() {
        warn!("stopped after {} strings, more may exist", found.len());
    }
    debug!("explored {} power-states", visited.len());
    Ok(found)
}

// a cycle that consumes a symbol and passes only through states that are both
// reachable and productive makes the language infinite
fn has_useful_cycle(index: &AutomatonIndex, useful: &BitSet) -> bool {
    let mut graph: DiGraph<(), bool> = DiGraph::with_capacity(index.num_states(), 0);
    for _ in 0..index.num_states() {
        graph.add_node(());
    }
    for from in useful.iter() {
        for &(label, to) in index.outgoing(StateIdx::new(from)) {
            if useful.contains(to.value()) {
                graph.add_edge(NodeIndex::new(from), NodeIndex::new(to.value()), !label.is_epsilon());
            }
        }
    }

    let mut component = vec![0; graph.node_count()];
    for (i, scc) in tarjan_scc(&graph).iter().enumerate() {
        for node in scc {
            component[node.index()] = i;
        }
    }

    graph.raw_edges().iter().any(|edge| {
        edge.weight && component[edge.source().index()] == component[edge.target().index()]
    })
}

/// Describes the language: emptiness, whether ε is accepted and whether it is infinite.
pub fn describe_language(automaton: &Automaton) -> Result<LanguageDescription, MachinaError> {
    let index = AutomatonIndex::new(automaton)?;
    let initial = index.require_initial()?;
    let has_self_loop = automaton.transitions.iter().any(|t| t.from == t.to);

    let mut useful = reachable(&index, initial);
    useful.intersect_with(&productive(&index));

    let mut initial_set = index.singleton(initial);
    index.epsilon_closure(&mut initial_set);
    let accepts_empty_string = index.is_accepting(&initial_set);

    if index.accepting().is_empty() || useful.is_empty() {
        let text = if index.accepting().is_empty() {
            "Language is empty (no final state)."
        } else {
            "Language is empty (no final state is reachable)."
        };
        return Ok(LanguageDescription {
            empty: true,
            accepts_empty_string: false,
            infinite: false,
            has_self_loop,
            text: text.to_string(),
        });
    }

    let infinite = has_useful_cycle(&index, &useful);
    let mut text = if accepts_empty_string {
        "Accepts the empty string (ε).".to_string()
    } else {
        "Does not accept the empty string.".to_string()
    };
    if infinite {
        text.push_str(" Accepts infinitely many strings (a cycle lies on an accepting path).");
    } else {
        text.push_str(" Accepts finitely many strings.");
    }

    Ok(LanguageDescription {
        empty: false,
        accepts_empty_string,
        infinite,
        has_self_loop,
        text,
    })
}

/// Samples the language and describes it. `count` and `length` fall back to
/// the generator defaults in `limits`.
pub fn generate(
    automaton: &Automaton,
    count: Option<usize>,
    length: Option<usize>,
    limits: &Limits,
) -> Result<GenerationReport, MachinaError> {
    let strings = generate_strings(
        automaton,
        count.unwrap_or(limits.generate_count),
        length.unwrap_or(limits.generate_length),
    )?;
    Ok(GenerationReport {
        strings,
        language: describe_language(automaton)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile::compile_regex;
    use crate::simulate::simulate;
    use test_log::test;

    #[test]
    fn shortest_strings_first() {
        let nfa = compile_regex("a(b|c)*").unwrap();
        let strings = generate_strings(&nfa, 3, 10).unwrap();
        assert_eq!(strings, vec!["a", "ab", "ac"]);
    }

    #[test]
    fn respects_limits() {
        let nfa = compile_regex("(a|b)*").unwrap();
        for (count, length) in [(0, 5), (1, 0), (4, 1), (50, 3)] {
            let strings = generate_strings(&nfa, count, length).unwrap();
            assert!(strings.len() <= count);
            assert!(strings.iter().all(|s| s.len() <= length));
            let distinct: HashSet<&String> = strings.iter().collect();
            assert_eq!(distinct.len(), strings.len());
            for s in &strings {
                assert!(simulate(&nfa, s).unwrap().accepted, "'{s}' should be accepted");
            }
        }
    }

    #[test]
    fn empty_string_is_found_first() {
        let nfa = compile_regex("a*").unwrap();
        let strings = generate_strings(&nfa, 2, 5).unwrap();
        assert_eq!(strings, vec!["", "a"]);
    }

    #[test]
    fn no_final_state_means_no_strings() {
        let automaton = Automaton::new()
            .with_state(0, true, false)
            .with_transition(0, 0, Some('a'));
        assert!(generate_strings(&automaton, 5, 5).unwrap().is_empty());

        let description = describe_language(&automaton).unwrap();
        assert!(description.empty);
        assert_eq!(description.text, "Language is empty (no final state).");
    }

    #[test]
    fn detects_cycles_longer_than_self_loops() {
        // (ab)* has a two-state cycle and no self-loop once determinized
        let nfa = compile_regex("(ab)*").unwrap();
        let description = describe_language(&nfa).unwrap();
        assert!(description.infinite);
        assert!(description.accepts_empty_string);
        assert!(!description.has_self_loop);
    }

    #[test]
    fn finite_languages() {
        let nfa = compile_regex("ab|c").unwrap();
        let description = describe_language(&nfa).unwrap();
        assert!(!description.infinite);
        assert!(!description.accepts_empty_string);
        assert_eq!(description.text, "Does not accept the empty string. Accepts finitely many strings.");
    }

    #[test]
    fn cycles_off_accepting_paths_do_not_count() {
        let automaton = Automaton::new()
            .with_state(0, true, false)
            .with_state(1, false, true)
            .with_state(2, false, false)
            .with_transition(0, 1, Some('a'))
            .with_transition(0, 2, Some('b'))
            .with_transition(2, 2, Some('b'));
        let description = describe_language(&automaton).unwrap();
        assert!(!description.infinite);
        assert!(description.has_self_loop);
    }

    #[test]
    fn report_uses_default_limits() {
        let nfa = compile_regex("a*").unwrap();
        let report = generate(&nfa, None, None, &Limits::default()).unwrap();
        assert_eq!(report.strings, vec!["", "a"]);
        assert!(report.language.infinite);
    }
}
