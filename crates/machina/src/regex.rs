// regular expressions over alphanumeric symbols with the grammar
// <regex> ::= <regex> '|' <regex>
// |  <regex> <regex>              (implicit concatenation)
// |  <regex> '*'
// |  '(' <regex> ')'
// |  <symbol>
// |                                (empty: accepts only the empty string)
//
// parsed by shunting-yard into postfix, with precedence '|' < concatenation < '*'

use thiserror::Error;

use crate::automaton::EPSILON_MARKER;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Token {
    Symbol(char),
    Union,
    Concat,
    Star,
    Open,
    Close,
}

impl Token {
    fn precedence(self) -> u8 {
        match self {
            Token::Union => 1,
            Token::Concat => 2,
            Token::Star => 3,
            _ => 0,
        }
    }

    pub(crate) fn as_char(self) -> char {
        match self {
            Token::Symbol(c) => c,
            Token::Union => '|',
            Token::Concat => '.',
            Token::Star => '*',
            Token::Open => '(',
            Token::Close => ')',
        }
    }

    // tokens after which an implicit concatenation may follow
    fn ends_operand(self) -> bool {
        matches!(self, Token::Symbol(_) | Token::Close | Token::Star)
    }

    // tokens before which an implicit concatenation may precede
    fn starts_operand(self) -> bool {
        matches!(self, Token::Symbol(_) | Token::Open)
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegexError {
    #[error("unmatched parenthesis at position {position}")]
    UnmatchedParenthesis { position: usize },
    #[error("operator '{operator}' at position {position} is missing an operand")]
    MissingOperand { operator: char, position: usize },
    #[error("unexpected character '{character}' at position {position}")]
    UnexpectedCharacter { character: char, position: usize },
    #[error("'e' at position {position} is reserved for epsilon and cannot be a symbol")]
    ReservedSymbol { position: usize },
    #[error("expression leaves {count} unconnected operands")]
    DanglingOperands { count: usize },
}

/// A regex in postfix order; every token carries its position in the source text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Postfix {
    pub(crate) tokens: Vec<(usize, Token)>,
}

impl Postfix {
    pub(crate) fn from_str(re_str: &str) -> Result<Postfix, RegexError> {
        let tokens = with_concatenation(tokenize(re_str)?);
        to_postfix(tokens)
    }

    #[cfg(test)]
    fn render(&self) -> String {
        self.tokens.iter().map(|(_, t)| t.as_char()).collect()
    }
}

fn tokenize(re_str: &str) -> Result<Vec<(usize, Token)>, RegexError> {
    re_str
        .chars()
        .enumerate()
        .map(|(position, c)| {
            let token = match c {
                '|' => Token::Union,
                '*' => Token::Star,
                '(' => Token::Open,
                ')' => Token::Close,
                EPSILON_MARKER => return Err(RegexError::ReservedSymbol { position }),
                c if c.is_ascii_alphanumeric() => Token::Symbol(c),
                character => return Err(RegexError::UnexpectedCharacter { character, position }),
            };
            Ok((position, token))
        })
        .collect()
}

fn with_concatenation(tokens: Vec<(usize, Token)>) -> Vec<(usize, Token)> {
    let mut result: Vec<(usize, Token)> = Vec::with_capacity(tokens.len() * 2);
    for (position, token) in tokens {
        if let Some((_, previous)) = result.last() {
            if previous.ends_operand() && token.starts_operand() {
                result.push((position, Token::Concat));
            }
        }
        result.push((position, token));
    }
    result
}

fn to_postfix(tokens: Vec<(usize, Token)>) -> Result<Postfix, RegexError> {
    let mut output: Vec<(usize, Token)> = Vec::with_capacity(tokens.len());
    let mut operators: Vec<(usize, Token)> = Vec::new();

    for (position, token) in tokens {
        match token {
            Token::Symbol(_) => output.push((position, token)),
            Token::Open => operators.push((position, token)),
            Token::Close => loop {
                match operators.pop() {
                    Some((_, Token::Open)) => break,
                    Some(op) => output.push(op),
                    None => return Err(RegexError::UnmatchedParenthesis { position }),
                }
            },
            _ => {
                // all operators are left associative
                while let Some(&(_, top)) = operators.last() {
                    if top == Token::Open || top.precedence() < token.precedence() {
                        break;
                    }
                    output.extend(operators.pop());
                }
                operators.push((position, token));
            }
        }
    }

    while let Some((position, op)) = operators.pop() {
        if op == Token::Open {
            return Err(RegexError::UnmatchedParenthesis { position });
        }
        output.push((position, op));
    }

    Ok(Postfix { tokens: output })
}
