//! Construction, transformation, simulation and analysis of finite automata
//! over single-character alphabets.
//!
//! Every operation takes an [`Automaton`] by reference and returns a new
//! automaton or a report; nothing is cached between calls.

mod analyze;
mod automaton;
mod compile;
mod dfa;
mod error;
mod generate;
mod index;
mod limits;
mod minimize;
mod regex;
mod simulate;
mod subset;

#[cfg(test)]
mod fa_tests;

pub use analyze::{analyze_structure, StructureReport};
pub use automaton::{Automaton, Label, State, Summary, Transition, EPSILON_MARKER};
pub use compile::compile_regex;
pub use dfa::{validate_dfa, DfaTable};
pub use error::{ErrorKind, MachinaError};
pub use generate::{describe_language, generate, generate_strings, GenerationReport, LanguageDescription};
pub use index::AutomatonIndex;
pub use limits::Limits;
pub use minimize::minimize_dfa;
pub use regex::RegexError;
pub use simulate::{simulate, SimulationReport, TraceStep};
pub use subset::{determinize, nfa_to_dfa, simplify_nfa, Determinization};
