use log::trace;
use serde::Serialize;

use crate::automaton::Automaton;
use crate::error::MachinaError;
use crate::index::AutomatonIndex;

/// One entry of a simulation trace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraceStep {
    pub description: String,
    /// The input symbol consumed by this step, if any.
    pub symbol: Option<char>,
    /// Ids of the active states after this step, ascending.
    pub active: Vec<u32>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SimulationReport {
    pub accepted: bool,
    /// The active set became empty before the input was consumed.
    pub blocked: bool,
    pub message: String,
    pub trace: Vec<TraceStep>,
}

impl SimulationReport {
    fn rejected(message: &str) -> SimulationReport {
        SimulationReport {
            accepted: false,
            blocked: false,
            message: message.to_string(),
            trace: Vec::new(),
        }
    }
}

/// Runs `input` through any automaton, recording every move and epsilon closure.
///
/// An automaton without states or without an initial state is not an error here:
/// the report is simply non-accepting and says why.
pub fn simulate(automaton: &Automaton, input: &str) -> Result<SimulationReport, MachinaError> {
    if automaton.is_empty() {
        return Ok(SimulationReport::rejected("Automaton is empty."));
    }

    let index = AutomatonIndex::new(automaton)?;
    let Some(initial) = index.initial() else {
        return Ok(SimulationReport::rejected("No starting state defined."));
    };

    let mut current = index.singleton(initial);
    index.epsilon_closure(&mut current);

    let mut trace = vec![TraceStep {
        description: "Start (ε-closure)".to_string(),
        symbol: None,
        active: index.ids(&current),
    }];

    let mut blocked = false;
    for c in input.chars() {
        let mut next = index.delta(&current, c);
        trace.push(TraceStep {
            description: format!("Reading '{c}'"),
            symbol: Some(c),
            active: index.ids(&next),
        });

        index.epsilon_closure(&mut next);
        trace.push(TraceStep {
            description: format!("ε-close after '{c}'"),
            symbol: None,
            active: index.ids(&next),
        });
        current = next;

        if current.is_empty() {
            trace!("blocked on '{}'", c);
            blocked = true;
            break;
        }
    }

    let accepted = !blocked && index.is_accepting(&current);
    let message = if blocked {
        "Not accepted string."
    } else if accepted {
        "String accepted."
    } else {
        "String refused."
    };

    Ok(SimulationReport {
        accepted,
        blocked,
        message: message.to_string(),
        trace,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn a_then_b_star() -> Automaton {
        Automaton::new()
            .with_state(0, true, false)
            .with_state(1, false, false)
            .with_state(2, false, true)
            .with_transition(0, 1, Some('a'))
            .with_transition(1, 2, None)
            .with_transition(2, 2, Some('b'))
    }

    #[test]
    fn trace_has_two_entries_per_symbol() {
        let report = simulate(&a_then_b_star(), "ab").unwrap();
        assert!(report.accepted);
        assert_eq!(report.message, "String accepted.");
        assert_eq!(report.trace.len(), 5);
        assert_eq!(report.trace[0].active, vec![0]);
        assert_eq!(report.trace[1].symbol, Some('a'));
        assert_eq!(report.trace[1].active, vec![1]);
        assert_eq!(report.trace[2].active, vec![1, 2]);
        assert_eq!(report.trace[2].symbol, None);
        assert_eq!(report.trace[4].active, vec![2]);
    }

    #[test]
    fn stops_when_blocked() {
        let report = simulate(&a_then_b_star(), "bab").unwrap();
        assert!(!report.accepted);
        assert!(report.blocked);
        assert_eq!(report.message, "Not accepted string.");
        // start plus one move/closure pair, the rest of the input is never read
        assert_eq!(report.trace.len(), 3);
    }

    #[test]
    fn refuses_without_blocking() {
        let report = simulate(&a_then_b_star(), "").unwrap();
        assert!(!report.accepted);
        assert!(!report.blocked);
        assert_eq!(report.message, "String refused.");
        assert_eq!(report.trace.len(), 1);
    }

    #[test]
    fn incomplete_automata_are_reported() {
        let report = simulate(&Automaton::new(), "a").unwrap();
        assert!(!report.accepted);
        assert_eq!(report.message, "Automaton is empty.");

        let report = simulate(&Automaton::new().with_state(0, false, true), "").unwrap();
        assert!(!report.accepted);
        assert_eq!(report.message, "No starting state defined.");
    }
}
