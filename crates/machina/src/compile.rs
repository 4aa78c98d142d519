use log::debug;
use machina_util::Grid;

use crate::automaton::{Automaton, Label, State, Transition};
use crate::error::MachinaError;
use crate::regex::{Postfix, RegexError, Token};

pub(crate) const COMPILER_GRID: Grid = Grid::new(8, (50.0, 100.0), 90.0);

// (initial, final) state ids of a partially built automaton
type Fragment = (u32, u32);

// states and transitions of one compilation; ids are allocated densely from 0,
// so a state's id is also its position in `states`
#[derive(Default)]
struct ThompsonBuilder {
    states: Vec<State>,
    transitions: Vec<Transition>,
}

impl ThompsonBuilder {
    fn new_state(&mut self) -> u32 {
        let id = self.states.len() as u32;
        self.states.push(State::on_grid(id, "q", &COMPILER_GRID, false, false));
        id
    }

    fn connect(&mut self, from: u32, to: u32, label: Label) {
        self.transitions.push(Transition { from, to, label });
    }

    fn symbol(&mut self, c: char) -> Fragment {
        let start = self.new_state();
        let end = self.new_state();
        self.connect(start, end, Label::Symbol(c));
        (start, end)
    }

    fn concatenation(&mut self, first: Fragment, second: Fragment) -> Fragment {
        self.connect(first.1, second.0, Label::Epsilon);
        (first.0, second.1)
    }

    fn alternation(&mut self, left: Fragment, right: Fragment) -> Fragment {
        let start = self.new_state();
        let end = self.new_state();
        self.connect(start, left.0, Label::Epsilon);
        self.connect(start, right.0, Label::Epsilon);
        self.connect(left.1, end, Label::Epsilon);
        self.connect(right.1, end, Label::Epsilon);
        (start, end)
    }

    fn kleene(&mut self, inner: Fragment) -> Fragment {
        let start = self.new_state();
        let end = self.new_state();
        self.connect(start, end, Label::Epsilon);
        self.connect(start, inner.0, Label::Epsilon);
        self.connect(inner.1, end, Label::Epsilon);
        self.connect(inner.1, inner.0, Label::Epsilon);
        (start, end)
    }

    fn finish(mut self, (start, end): Fragment) -> Automaton {
        self.states[start as usize].is_initial = true;
        self.states[end as usize].is_final = true;
        Automaton {
            states: self.states,
            transitions: self.transitions,
        }
    }
}

fn pop_operand(stack: &mut Vec<Fragment>, position: usize, op: Token) -> Result<Fragment, RegexError> {
    stack.pop().ok_or(RegexError::MissingOperand {
        operator: op.as_char(),
        position,
    })
}

/// Compiles a regular expression into an epsilon-NFA using Thompson's construction.
///
/// The result has exactly one initial and one final state. The empty expression
/// compiles to a single state that is both, accepting only the empty string.
pub fn compile_regex(re_str: &str) -> Result<Automaton, MachinaError> {
    let postfix = Postfix::from_str(re_str)?;
    let mut builder = ThompsonBuilder::default();

    if postfix.tokens.is_empty() {
        let only = builder.new_state();
        return Ok(builder.finish((only, only)));
    }

    let mut stack: Vec<Fragment> = Vec::new();
    for (position, token) in postfix.tokens {
        let fragment = match token {
            Token::Symbol(c) => builder.symbol(c),
            Token::Concat => {
                let second = pop_operand(&mut stack, position, token)?;
                let first = pop_operand(&mut stack, position, token)?;
                builder.concatenation(first, second)
            }
            Token::Union => {
                let right = pop_operand(&mut stack, position, token)?;
                let left = pop_operand(&mut stack, position, token)?;
                builder.alternation(left, right)
            }
            Token::Star => {
                let inner = pop_operand(&mut stack, position, token)?;
                builder.kleene(inner)
            }
            Token::Open | Token::Close => unreachable!("parentheses never reach postfix"),
        };
        stack.push(fragment);
    }

    let fragment = match stack.as_slice() {
        [fragment] => *fragment,
        _ => return Err(RegexError::DanglingOperands { count: stack.len() }.into()),
    };

    let nfa = builder.finish(fragment);
    debug!(
        "compiled '{}' into {} states and {} transitions",
        re_str,
        nfa.states.len(),
        nfa.transitions.len()
    );
    Ok(nfa)
}
