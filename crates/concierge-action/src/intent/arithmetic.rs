//! Spoken arithmetic: operator-word rewriting and a small expression evaluator.
//!
//! Supports `+ - * / % ^`, parentheses, unary minus and decimal numbers.
//! `^` binds tighter than unary minus and is right associative, so `-2^2`
//! evaluates to `-4`.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::ArithmeticError;

/// Spoken operators, longest phrases first.
const WORD_OPERATORS: &[(&str, &str)] = &[
    (r"\bto the power of\b", "^"),
    (r"\bmultiplied by\b", "*"),
    (r"\bdivided by\b", "/"),
    (r"\bmodulo\b", "%"),
    (r"\bmod\b", "%"),
    (r"\bplus\b", "+"),
    (r"\bminus\b", "-"),
    (r"\btimes\b", "*"),
    (r"\bover\b", "/"),
];

/// Longest spoken expression accepted, in characters.
const MAX_EXPRESSION_LEN: usize = 256;
/// Deepest nesting of parentheses, signs and exponents the parser follows.
const MAX_DEPTH: usize = 64;

static OPERATOR_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    WORD_OPERATORS
        .iter()
        .map(|(pat, op)| (Regex::new(pat).expect("Invalid operator regex"), *op))
        .collect()
});

static INFIX_X: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d)\s*x\s*(\d)").expect("Invalid infix x regex"));

/// Rewrite a spoken expression into operator syntax.
///
/// Returns `None` when the text contains anything other than numbers,
/// operators, parentheses and whitespace after rewriting, has no digit, or
/// is longer than [`MAX_EXPRESSION_LEN`] characters.
pub fn prepare_expression(text: &str) -> Option<String> {
    if text.chars().count() > MAX_EXPRESSION_LEN {
        return None;
    }
    let mut expr = text.to_lowercase();
    for (regex, op) in OPERATOR_RULES.iter() {
        expr = regex.replace_all(&expr, *op).into_owned();
    }
    // Applied twice so "2x3x4" rewrites both overlapping operators.
    for _ in 0..2 {
        expr = INFIX_X.replace_all(&expr, "$1*$2").into_owned();
    }
    let expr = expr
        .replace("**", "^")
        .replace('×', "*")
        .replace('÷', "/")
        .replace(',', "");
    let expr = expr
        .trim()
        .trim_end_matches(['?', '=', '.', '!'])
        .trim()
        .to_string();

    let allowed = |c: char| c.is_ascii_digit() || c.is_whitespace() || "+-*/%^().".contains(c);
    if expr.is_empty() || !expr.chars().all(allowed) || !expr.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }
    Some(expr)
}

/// Evaluate an expression produced by [`prepare_expression`].
pub fn evaluate(expr: &str) -> Result<f64, ArithmeticError> {
    let tokens = tokenize(expr)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    if parser.pos != parser.tokens.len() {
        return Err(ArithmeticError::Syntax(format!(
            "unexpected '{}'",
            parser.tokens[parser.pos]
        )));
    }
    if !value.is_finite() {
        return Err(ArithmeticError::Overflow);
    }
    Ok(value)
}

/// Format a result: integers without decimals, others rounded to 6 places.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let rounded = format!("{:.6}", value);
    let trimmed = rounded.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Op(char),
    Open,
    Close,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number(n) => write!(f, "{}", n),
            Token::Op(c) => write!(f, "{}", c),
            Token::Open => write!(f, "("),
            Token::Close => write!(f, ")"),
        }
    }
}

fn tokenize(expr: &str) -> Result<Vec<Token>, ArithmeticError> {
    let chars: Vec<char> = expr.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' => i += 1,
            '0'..='9' | '.' => {
                let start = i;
                while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                    i += 1;
                }
                let literal: String = chars[start..i].iter().collect();
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| ArithmeticError::Syntax(format!("bad number '{}'", literal)))?;
                tokens.push(Token::Number(value));
            }
            '+' | '-' | '*' | '/' | '%' | '^' => {
                tokens.push(Token::Op(c));
                i += 1;
            }
            '(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            ')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            other => {
                return Err(ArithmeticError::Syntax(format!(
                    "unexpected character '{}'",
                    other
                )))
            }
        }
    }
    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expression(&mut self) -> Result<f64, ArithmeticError> {
        let mut value = self.term()?;
        while let Some(Token::Op(op @ ('+' | '-'))) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ArithmeticError> {
        let mut value = self.unary()?;
        while let Some(Token::Op(op @ ('*' | '/' | '%'))) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            value = match op {
                '*' => value * rhs,
                _ if rhs == 0.0 => return Err(ArithmeticError::DivisionByZero),
                '/' => value / rhs,
                _ => value % rhs,
            };
        }
        Ok(value)
    }

    /// All recursion passes through here.
    fn unary(&mut self) -> Result<f64, ArithmeticError> {
        if self.depth >= MAX_DEPTH {
            return Err(ArithmeticError::Syntax("expression nested too deeply".to_string()));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64, ArithmeticError> {
        match self.peek() {
            Some(Token::Op('-')) => {
                self.pos += 1;
                Ok(-self.unary()?)
            }
            Some(Token::Op('+')) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64, ArithmeticError> {
        let base = self.primary()?;
        if let Some(Token::Op('^')) = self.peek() {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, ArithmeticError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::Open) => {
                let value = self.expression()?;
                match self.next() {
                    Some(Token::Close) => Ok(value),
                    _ => Err(ArithmeticError::Syntax("missing ')'".to_string())),
                }
            }
            Some(other) => Err(ArithmeticError::Syntax(format!("unexpected '{}'", other))),
            None => Err(ArithmeticError::Syntax("expression ends early".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval_text(text: &str) -> Result<f64, ArithmeticError> {
        evaluate(&prepare_expression(text).expect("expression should prepare"))
    }

    #[test]
    fn test_basic_operators() {
        assert_eq!(eval_text("2 + 2").unwrap(), 4.0);
        assert_eq!(eval_text("10 - 4").unwrap(), 6.0);
        assert_eq!(eval_text("6 * 7").unwrap(), 42.0);
        assert_eq!(eval_text("9 / 3").unwrap(), 3.0);
        assert_eq!(eval_text("10 % 4").unwrap(), 2.0);
    }

    #[test]
    fn test_precedence_and_parentheses() {
        assert_eq!(eval_text("2 + 3 * 4").unwrap(), 14.0);
        assert_eq!(eval_text("(2 + 3) * 4").unwrap(), 20.0);
        assert_eq!(eval_text("2 ^ 3 ^ 2").unwrap(), 512.0);
        assert_eq!(eval_text("-2 ^ 2").unwrap(), -4.0);
        assert_eq!(eval_text("-(3 - 5)").unwrap(), 2.0);
    }

    #[test]
    fn test_word_operators() {
        assert_eq!(eval_text("5 plus 3").unwrap(), 8.0);
        assert_eq!(eval_text("5 minus 3").unwrap(), 2.0);
        assert_eq!(eval_text("5 times 3").unwrap(), 15.0);
        assert_eq!(eval_text("5 multiplied by 3").unwrap(), 15.0);
        assert_eq!(eval_text("15 divided by 3").unwrap(), 5.0);
        assert_eq!(eval_text("15 over 3").unwrap(), 5.0);
        assert_eq!(eval_text("2 to the power of 10").unwrap(), 1024.0);
        assert_eq!(eval_text("17 mod 5").unwrap(), 2.0);
        assert_eq!(eval_text("17 modulo 5").unwrap(), 2.0);
        assert_eq!(eval_text("4 x 5").unwrap(), 20.0);
        assert_eq!(eval_text("2x3x4").unwrap(), 24.0);
        assert_eq!(eval_text("3 ** 2").unwrap(), 9.0);
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval_text("1 / 0"), Err(ArithmeticError::DivisionByZero));
        assert_eq!(eval_text("1 mod 0"), Err(ArithmeticError::DivisionByZero));
    }

    #[test]
    fn test_syntax_errors() {
        assert!(matches!(evaluate("2 +"), Err(ArithmeticError::Syntax(_))));
        assert!(matches!(evaluate("(2 + 3"), Err(ArithmeticError::Syntax(_))));
        assert!(matches!(evaluate("2 3"), Err(ArithmeticError::Syntax(_))));
        assert!(matches!(evaluate("1..2"), Err(ArithmeticError::Syntax(_))));
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        let nested = format!("{}1{}", "(".repeat(100_000), ")".repeat(100_000));
        assert_eq!(
            evaluate(&nested),
            Err(ArithmeticError::Syntax("expression nested too deeply".to_string()))
        );
        let unbalanced = format!("{}1", "(".repeat(1000));
        assert!(matches!(evaluate(&unbalanced), Err(ArithmeticError::Syntax(_))));
        let signs = format!("{}1", "-".repeat(1000));
        assert!(matches!(evaluate(&signs), Err(ArithmeticError::Syntax(_))));
    }

    #[test]
    fn test_moderate_nesting_still_evaluates() {
        let nested = format!("{}2{}", "(".repeat(20), ")".repeat(20));
        assert_eq!(evaluate(&nested).unwrap(), 2.0);
        assert_eq!(evaluate("2 ^ 2 ^ 2 ^ 2").unwrap(), 65536.0);
    }

    #[test]
    fn test_prepare_rejects_overlong_input() {
        let long = vec!["1"; 200].join(" + ");
        assert_eq!(prepare_expression(&long), None);
        let parens = format!("{}1{}", "(".repeat(200), ")".repeat(200));
        assert_eq!(prepare_expression(&parens), None);
        assert!(prepare_expression("1 + 1").is_some());
    }

    #[test]
    fn test_overflow() {
        assert_eq!(evaluate("10 ^ 400"), Err(ArithmeticError::Overflow));
    }

    #[test]
    fn test_prepare_rejects_non_arithmetic() {
        assert_eq!(prepare_expression("the meaning of life"), None);
        assert_eq!(prepare_expression("3 body problem"), None);
        assert_eq!(prepare_expression("+ -"), None);
    }

    #[test]
    fn test_prepare_strips_trailing_punctuation() {
        assert_eq!(prepare_expression("2 + 2?").as_deref(), Some("2 + 2"));
        assert_eq!(prepare_expression("1,000 + 1 =").as_deref(), Some("1000 + 1"));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(4.0), "4");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(1.0 / 3.0), "0.333333");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-0.0000001), "0");
    }
}
