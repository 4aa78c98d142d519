use std::collections::BTreeSet;
use std::fmt;

use machina_util::Grid;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::MachinaError;

/// Reserved wire symbol for epsilon transitions.
pub const EPSILON_MARKER: char = 'e';

const DEFAULT_RADIUS: f64 = 30.0;

fn default_radius() -> f64 {
    DEFAULT_RADIUS
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct State {
    pub id: u32,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub is_initial: bool,
    #[serde(default)]
    pub is_final: bool,
    // presentation only, copied through untouched
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default = "default_radius")]
    pub radius: f64,
}

impl State {
    pub fn new(id: u32, label: impl Into<String>, is_initial: bool, is_final: bool) -> State {
        State {
            id,
            label: label.into(),
            is_initial,
            is_final,
            x: 0.0,
            y: 0.0,
            radius: DEFAULT_RADIUS,
        }
    }

    /// A state labelled `<prefix><id>` placed on `grid`.
    pub(crate) fn on_grid(id: u32, prefix: &str, grid: &Grid, is_initial: bool, is_final: bool) -> State {
        let (x, y) = grid.place(id);
        State {
            x,
            y,
            ..State::new(id, format!("{prefix}{id}"), is_initial, is_final)
        }
    }
}

/// A transition label: either an alphabet symbol or epsilon.
///
/// On the wire both are one-character strings, epsilon being
/// [`EPSILON_MARKER`] (`"ε"` is accepted on input as well).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Epsilon,
    Symbol(char),
}

impl Label {
    pub fn symbol(&self) -> Option<char> {
        match self {
            Label::Epsilon => None,
            Label::Symbol(c) => Some(*c),
        }
    }

    pub fn is_epsilon(&self) -> bool {
        matches!(self, Label::Epsilon)
    }
}

impl From<Option<char>> for Label {
    fn from(value: Option<char>) -> Self {
        match value {
            None => Label::Epsilon,
            Some(c) => Label::Symbol(c),
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Label::Epsilon => write!(f, "{EPSILON_MARKER}"),
            Label::Symbol(c) => write!(f, "{c}"),
        }
    }
}

impl Serialize for Label {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct LabelVisitor;

impl Visitor<'_> for LabelVisitor {
    type Value = Label;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a single-character transition label")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> Result<Label, E> {
        let mut chars = value.chars();
        match (chars.next(), chars.next()) {
            (Some(EPSILON_MARKER), None) | (Some('ε'), None) => Ok(Label::Epsilon),
            (Some(c), None) => Ok(Label::Symbol(c)),
            _ => Err(E::invalid_value(de::Unexpected::Str(value), &self)),
        }
    }
}

impl<'de> Deserialize<'de> for Label {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Label, D::Error> {
        deserializer.deserialize_str(LabelVisitor)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: u32,
    pub to: u32,
    pub label: Label,
}

/// The automaton exchange record: a set of states and the transitions between them.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Automaton {
    #[serde(default)]
    pub states: Vec<State>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
}

/// Structural overview of an automaton.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub num_states: usize,
    pub num_transitions: usize,
    pub alphabet: Vec<char>,
    pub has_epsilon: bool,
    pub is_deterministic: bool,
}

impl Automaton {
    pub fn new() -> Automaton {
        Automaton::default()
    }

    pub fn from_json(text: &str) -> Result<Automaton, MachinaError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String, MachinaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Adds a state labelled `q<id>`.
    pub fn with_state(mut self, id: u32, is_initial: bool, is_final: bool) -> Automaton {
        self.states.push(State::new(id, format!("q{id}"), is_initial, is_final));
        self
    }

    /// Adds a transition, `None` standing for epsilon.
    pub fn with_transition(mut self, from: u32, to: u32, label: Option<char>) -> Automaton {
        self.transitions.push(Transition {
            from,
            to,
            label: label.into(),
        });
        self
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self, id: u32) -> Option<&State> {
        self.states.iter().find(|s| s.id == id)
    }

    pub fn initial_state(&self) -> Option<&State> {
        self.states.iter().find(|s| s.is_initial)
    }

    pub fn final_states(&self) -> impl Iterator<Item = &State> {
        self.states.iter().filter(|s| s.is_final)
    }

    /// The distinct non-epsilon labels, in ascending order.
    pub fn alphabet(&self) -> Vec<char> {
        self.transitions
            .iter()
            .filter_map(|t| t.label.symbol())
            .collect::<BTreeSet<char>>()
            .into_iter()
            .collect()
    }

    pub fn has_epsilon(&self) -> bool {
        self.transitions.iter().any(|t| t.label.is_epsilon())
    }

    pub fn summary(&self) -> Summary {
        Summary {
            num_states: self.states.len(),
            num_transitions: self.transitions.len(),
            alphabet: self.alphabet(),
            has_epsilon: self.has_epsilon(),
            is_deterministic: crate::dfa::validate_dfa(self).is_ok(),
        }
    }
}
