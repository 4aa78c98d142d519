use serde::Serialize;
use thiserror::Error;

use crate::regex::RegexError;

/// Machine-readable classification of a [`MachinaError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    Malformed,
    InvalidAutomaton,
    NotDeterministic,
    RegexSyntax,
    ResourceLimit,
}

#[derive(Debug, Error)]
pub enum MachinaError {
    #[error("malformed input: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("automaton is empty")]
    EmptyAutomaton,
    #[error("automaton has no initial state")]
    MissingInitial,
    #[error("state id {0} is used more than once")]
    DuplicateState(u32),
    #[error("state {0} does not exist")]
    UnknownState(u32),
    #[error("transition {from} -> {to} references state {missing}, which does not exist")]
    DanglingTransition { from: u32, to: u32, missing: u32 },
    #[error("automaton contains epsilon transitions and is not a DFA")]
    EpsilonInDfa,
    #[error("automaton is not deterministic (state {state} has more than one transition on '{symbol}')")]
    NotDeterministic { state: String, symbol: char },
    #[error(transparent)]
    Syntax(#[from] RegexError),
    #[error("{what} exceeded the limit of {limit}")]
    ResourceLimit { what: &'static str, limit: usize },
}

impl MachinaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MachinaError::Malformed(_) => ErrorKind::Malformed,
            MachinaError::EmptyAutomaton
            | MachinaError::MissingInitial
            | MachinaError::DuplicateState(_)
            | MachinaError::UnknownState(_)
            | MachinaError::DanglingTransition { .. } => ErrorKind::InvalidAutomaton,
            MachinaError::EpsilonInDfa | MachinaError::NotDeterministic { .. } => {
                ErrorKind::NotDeterministic
            }
            MachinaError::Syntax(_) => ErrorKind::RegexSyntax,
            MachinaError::ResourceLimit { .. } => ErrorKind::ResourceLimit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_serialize_in_kebab_case() {
        let kind = MachinaError::DanglingTransition { from: 0, to: 1, missing: 1 }.kind();
        assert_eq!(serde_json::to_string(&kind).unwrap(), r#""invalid-automaton""#);
        assert_eq!(
            serde_json::to_string(&ErrorKind::NotDeterministic).unwrap(),
            r#""not-deterministic""#
        );
    }
}
