//! `#if` / `#elif` expression evaluation.
//!
//! The grammar is deliberately small: operands, unary `!`, `==`, `!=`, `&&`
//! and `||`. There are no parentheses. Expressions are converted to reverse
//! polish notation with a shunting-yard pass and then evaluated on a value stack.

use thiserror::Error;

use crate::macros::Defines;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub(crate) enum ConditionError {
    #[error("empty condition")]
    Empty,
    #[error("parentheses are not supported in conditions")]
    Parenthesis,
    #[error("unexpected character '{0}'")]
    UnexpectedChar(char),
    #[error("operator '{0}' is missing an operand")]
    MissingOperand(&'static str),
    #[error("operands '{0}' and '{1}' are not joined by an operator")]
    MissingOperator(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Operand(String),
    Op(Operator),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operator {
    Not,
    Equals,
    NotEquals,
    And,
    Or,
}

impl Operator {
    fn precedence(self) -> u8 {
        match self {
            Operator::Not => 4,
            Operator::Equals | Operator::NotEquals => 3,
            Operator::And => 2,
            Operator::Or => 1,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Operator::Not => "!",
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::And => "&&",
            Operator::Or => "||",
        }
    }
}

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    Bool(bool),
}

impl Value {
    fn truthy(&self, defines: &Defines) -> bool {
        match self {
            Value::Bool(b) => *b,
            Value::Text(text) => operand_truthy(text, defines),
        }
    }

    fn text(&self) -> &str {
        match self {
            Value::Text(text) => text,
            Value::Bool(true) => "1",
            Value::Bool(false) => "0",
        }
    }
}

/// An operand is true if it is `true`, a non-zero number, or the name of a
/// macro that is still defined (one whose value was empty, so substitution
/// left the bare name in place).
fn operand_truthy(text: &str, defines: &Defines) -> bool {
    match text {
        "true" => true,
        "false" => false,
        _ => {
            if let Ok(v) = text.parse::<i64>() {
                v != 0
            } else if let Ok(v) = text.parse::<f64>() {
                v != 0.0
            } else {
                defines.contains_key(text)
            }
        }
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ConditionError> {
    let mut tokens = Vec::new();
    let mut chars = expr.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        match c {
            '(' | ')' => return Err(ConditionError::Parenthesis),
            '&' | '|' | '=' => {
                chars.next();
                if chars.next_if_eq(&c).is_none() {
                    return Err(ConditionError::UnexpectedChar(c));
                }
                tokens.push(Token::Op(match c {
                    '&' => Operator::And,
                    '|' => Operator::Or,
                    _ => Operator::Equals,
                }));
            }
            '!' => {
                chars.next();
                if chars.next_if_eq(&'=').is_some() {
                    tokens.push(Token::Op(Operator::NotEquals));
                } else {
                    tokens.push(Token::Op(Operator::Not));
                }
            }
            _ => {
                let mut operand = String::new();
                while let Some(&c) = chars.peek() {
                    if c.is_whitespace() || "&|=!()".contains(c) {
                        break;
                    }
                    operand.push(c);
                    chars.next();
                }
                tokens.push(Token::Operand(operand));
            }
        }
    }

    Ok(tokens)
}

/// Shunting-yard conversion to reverse polish notation.
fn to_rpn(tokens: Vec<Token>) -> Vec<Token> {
    let mut output = Vec::with_capacity(tokens.len());
    let mut stack: Vec<Operator> = Vec::new();

    for token in tokens {
        match token {
            Token::Operand(_) => output.push(token),
            // Prefix operator: nothing to its left can bind to it yet
            Token::Op(Operator::Not) => stack.push(Operator::Not),
            Token::Op(op) => {
                while let Some(&top) = stack.last() {
                    if top.precedence() < op.precedence() {
                        break;
                    }
                    output.push(Token::Op(top));
                    stack.pop();
                }
                stack.push(op);
            }
        }
    }

    while let Some(op) = stack.pop() {
        output.push(Token::Op(op));
    }
    output
}

fn run_rpn(rpn: Vec<Token>, defines: &Defines) -> Result<bool, ConditionError> {
    let mut values: Vec<Value> = Vec::new();

    for token in rpn {
        match token {
            Token::Operand(text) => values.push(Value::Text(text)),
            Token::Op(Operator::Not) => {
                let value = values
                    .pop()
                    .ok_or(ConditionError::MissingOperand(Operator::Not.symbol()))?;
                values.push(Value::Bool(!value.truthy(defines)));
            }
            Token::Op(op) => {
                let (Some(rhs), Some(lhs)) = (values.pop(), values.pop()) else {
                    return Err(ConditionError::MissingOperand(op.symbol()));
                };
                let result = match op {
                    Operator::Equals => lhs.text() == rhs.text(),
                    Operator::NotEquals => lhs.text() != rhs.text(),
                    Operator::And => lhs.truthy(defines) && rhs.truthy(defines),
                    Operator::Or => lhs.truthy(defines) || rhs.truthy(defines),
                    Operator::Not => unreachable!("unary operator handled above"),
                };
                values.push(Value::Bool(result));
            }
        }
    }

    match values.len() {
        0 => Err(ConditionError::Empty),
        1 => Ok(values[0].truthy(defines)),
        _ => Err(ConditionError::MissingOperator(
            values[values.len() - 2].text().to_string(),
            values[values.len() - 1].text().to_string(),
        )),
    }
}

/// Evaluates an already macro-substituted condition.
pub(crate) fn evaluate(expr: &str, defines: &Defines) -> Result<bool, ConditionError> {
    let tokens = tokenize(expr)?;
    if tokens.is_empty() {
        return Err(ConditionError::Empty);
    }
    run_rpn(to_rpn(tokens), defines)
}
