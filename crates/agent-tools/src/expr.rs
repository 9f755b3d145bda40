//! Arithmetic Expression Evaluator
//!
//! Recursive descent over `+ - * / ^`, unary signs and parentheses.
//! `**` is read as `^`. Nothing is ever executed, only computed.
//!
//! Precedence, lowest first:
//!
//! ```text
//! expr   = term (('+' | '-') term)*
//! term   = unary (('*' | '/') unary)*
//! unary  = ('-' | '+') unary | power
//! power  = atom ('^' unary)?          right-associative
//! atom   = NUMBER | '(' expr ')'
//! ```

use crate::error::{Result, ToolError};

/// Nesting limit for parentheses, signs and exponents
const MAX_DEPTH: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
}

/// Evaluate an expression to a finite number
pub fn evaluate(input: &str) -> Result<f64> {
    let tokens = tokenize(input)?;
    if tokens.is_empty() {
        return Err(ToolError::Evaluation("empty expression".into()));
    }

    let mut parser = Parser {
        tokens: &tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    if let Some(token) = parser.peek() {
        return Err(ToolError::Evaluation(format!(
            "unexpected {token:?} at token {}",
            parser.pos
        )));
    }
    if !value.is_finite() {
        return Err(ToolError::Evaluation("result is not a finite number".into()));
    }
    Ok(value)
}

/// Render a result the way people write numbers: no trailing `.0` on integers
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        value.to_string()
    }
}

fn tokenize(input: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '+' => Token::Plus,
            '-' => Token::Minus,
            '/' => Token::Slash,
            '^' => Token::Caret,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '*' => {
                if chars.next_if(|&(_, next)| next == '*').is_some() {
                    Token::Caret
                } else {
                    Token::Star
                }
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start + c.len_utf8();
                while let Some((i, d)) = chars.next_if(|&(_, d)| d.is_ascii_digit() || d == '.') {
                    end = i + d.len_utf8();
                }
                let literal = &input[start..end];
                let number = literal
                    .parse()
                    .map_err(|_| ToolError::Evaluation(format!("invalid number '{literal}'")))?;
                Token::Number(number)
            }
            other => {
                return Err(ToolError::Evaluation(format!("unexpected character '{other}'")));
            }
        };
        tokens.push(token);
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.peek();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn expr(&mut self) -> Result<f64> {
        let mut left = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.bump();
                    left += self.term()?;
                }
                Some(Token::Minus) => {
                    self.bump();
                    left -= self.term()?;
                }
                _ => return Ok(left),
            }
        }
    }

    fn term(&mut self) -> Result<f64> {
        let mut left = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.bump();
                    left *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.bump();
                    let right = self.unary()?;
                    if right == 0.0 {
                        return Err(ToolError::Evaluation("division by zero".into()));
                    }
                    left /= right;
                }
                _ => return Ok(left),
            }
        }
    }

    // Every recursive path passes through here, so this bounds the stack
    fn unary(&mut self) -> Result<f64> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(ToolError::Evaluation("expression nested too deeply".into()));
        }
        let value = self.signed();
        self.depth -= 1;
        value
    }

    fn signed(&mut self) -> Result<f64> {
        match self.peek() {
            Some(Token::Minus) => {
                self.bump();
                Ok(-self.unary()?)
            }
            Some(Token::Plus) => {
                self.bump();
                self.unary()
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> Result<f64> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Caret) {
            self.bump();
            let exponent = self.unary()?;
            return Ok(base.powf(exponent));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<f64> {
        match self.bump() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                let value = self.expr()?;
                match self.bump() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(ToolError::Evaluation("missing closing parenthesis".into())),
                }
            }
            Some(token) => Err(ToolError::Evaluation(format!("unexpected {token:?}"))),
            None => Err(ToolError::Evaluation("unexpected end of expression".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(expr: &str) -> f64 {
        evaluate(expr).unwrap()
    }

    #[test]
    fn test_precedence() {
        assert!((eval("2 + 2 * 3") - 8.0).abs() < f64::EPSILON);
        assert!((eval("(2 + 3) * 4") - 20.0).abs() < f64::EPSILON);
        assert!((eval("10 - 4 - 3") - 3.0).abs() < f64::EPSILON);
        assert!((eval("2 ^ 8") - 256.0).abs() < f64::EPSILON);
        assert!((eval("2 ** 3 ** 2") - 512.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_unary_signs() {
        assert!((eval("-3 + 5") - 2.0).abs() < f64::EPSILON);
        assert!((eval("4 * -2") - -8.0).abs() < f64::EPSILON);
        assert!((eval("-2 ^ 2") - -4.0).abs() < f64::EPSILON);
        assert!((eval("2 ^ -1") - 0.5).abs() < f64::EPSILON);
        assert!((eval("+(1.5)") - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_errors() {
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("").is_err());
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 + 2)").is_err());
        assert!(evaluate("__import__('os')").is_err());
        assert!(evaluate("1..2").is_err());
        assert!(evaluate("10 ^ 400").is_err());
    }

    #[test]
    fn test_deep_nesting_is_rejected() {
        let nested = format!("{}1{}", "(".repeat(8_000), ")".repeat(8_000));
        let err = evaluate(&nested).unwrap_err();
        assert!(err.to_string().contains("nested too deeply"));

        let signs = format!("{}1", "-".repeat(100_000));
        assert!(evaluate(&signs).unwrap_err().to_string().contains("nested too deeply"));

        let powers = vec!["2"; 5_000].join("^");
        assert!(evaluate(&powers).is_err());
    }

    #[test]
    fn test_moderate_nesting_is_fine() {
        let nested = format!("{}7{}", "(".repeat(100), ")".repeat(100));
        assert!((eval(&nested) - 7.0).abs() < f64::EPSILON);
        assert!((eval("--3") - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(8.0), "8");
        assert_eq!(format_number(-8.0), "-8");
        assert_eq!(format_number(2.5), "2.5");
    }
}
