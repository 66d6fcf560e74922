//! Formula evaluation.
//!
//! The host application normally owns the roll engine; `FormulaEvaluator`
//! is the seam it plugs into. `ArithmeticEvaluator` is the deterministic
//! built-in implementation: numbers, `@path` roll-data references,
//! `+ - * /`, parentheses and the functions `floor`, `ceil`, `round`,
//! `abs`, `min` and `max`. Dice are not supported.

use crate::error::StatError;
use crate::roll_data::RollData;

/// Evaluates change formulas against roll data.
///
/// Implementations must be deterministic for a given formula and snapshot.
pub trait FormulaEvaluator: Send + Sync {
    fn evaluate(&self, formula: &str, data: &RollData) -> Result<f64, StatError>;
}

/// Built-in arithmetic evaluator.
///
/// # Examples
///
/// ```rust
/// use pfstat::formula::{ArithmeticEvaluator, FormulaEvaluator};
/// use pfstat::RollData;
///
/// let mut data = RollData::new();
/// data.set("attributes.hd.total", 7);
///
/// let evaluator = ArithmeticEvaluator;
/// let value = evaluator
///     .evaluate("1 + floor(@attributes.hd.total / 4)", &data)
///     .unwrap();
/// assert_eq!(value, 2.0);
///
/// assert!(evaluator.evaluate("@abilities.str.mod", &data).is_err());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ArithmeticEvaluator;

impl FormulaEvaluator for ArithmeticEvaluator {
    fn evaluate(&self, formula: &str, data: &RollData) -> Result<f64, StatError> {
        let tokens = tokenize(formula)?;
        let mut parser = Parser {
            formula,
            tokens: &tokens,
            pos: 0,
            depth: 0,
            data,
        };
        let value = parser.expr()?;
        if parser.pos != tokens.len() {
            return Err(parser.error(format!("unexpected {:?}", tokens[parser.pos])));
        }
        if !value.is_finite() {
            return Err(parser.error("result is not a finite number".to_string()));
        }
        Ok(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Number(f64),
    Ref(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Comma,
}

fn tokenize(formula: &str) -> Result<Vec<Token>, StatError> {
    let chars: Vec<char> = formula.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;

    let take_while = |start: usize, pred: &dyn Fn(char) -> bool| -> usize {
        let mut end = start;
        while end < chars.len() && pred(chars[end]) {
            end += 1;
        }
        end
    };

    while i < chars.len() {
        let c = chars[i];
        match c {
            ' ' | '\t' | '\n' | '\r' => i += 1,
            '+' => {
                tokens.push(Token::Plus);
                i += 1;
            }
            '-' => {
                tokens.push(Token::Minus);
                i += 1;
            }
            '*' => {
                tokens.push(Token::Star);
                i += 1;
            }
            '/' => {
                tokens.push(Token::Slash);
                i += 1;
            }
            '(' => {
                tokens.push(Token::LParen);
                i += 1;
            }
            ')' => {
                tokens.push(Token::RParen);
                i += 1;
            }
            ',' => {
                tokens.push(Token::Comma);
                i += 1;
            }
            '@' => {
                let end = take_while(i + 1, &|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
                if end == i + 1 {
                    return Err(StatError::Formula {
                        formula: formula.to_string(),
                        reason: "empty reference after @".to_string(),
                    });
                }
                let path: String = chars[i + 1..end].iter().collect();
                tokens.push(Token::Ref(path.trim_end_matches('.').to_string()));
                i = end;
            }
            c if c.is_ascii_digit() || c == '.' => {
                let end = take_while(i, &|c| c.is_ascii_digit() || c == '.');
                let text: String = chars[i..end].iter().collect();
                let number = text.parse::<f64>().map_err(|_| StatError::Formula {
                    formula: formula.to_string(),
                    reason: format!("invalid number `{}`", text),
                })?;
                tokens.push(Token::Number(number));
                i = end;
            }
            c if c.is_ascii_alphabetic() => {
                let end = take_while(i, &|c| c.is_ascii_alphanumeric() || c == '_');
                tokens.push(Token::Ident(chars[i..end].iter().collect()));
                i = end;
            }
            other => {
                return Err(StatError::Formula {
                    formula: formula.to_string(),
                    reason: format!("unexpected character `{}`", other),
                })
            }
        }
    }
    Ok(tokens)
}

/// Deepest nesting of parentheses, calls and unary signs a formula may use.
const MAX_DEPTH: usize = 64;

struct Parser<'a> {
    formula: &'a str,
    tokens: &'a [Token],
    pos: usize,
    depth: usize,
    data: &'a RollData,
}

impl Parser<'_> {
    fn error(&self, reason: String) -> StatError {
        StatError::Formula {
            formula: self.formula.to_string(),
            reason,
        }
    }

    /// Run `parse` one nesting level deeper, failing past `MAX_DEPTH`.
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, StatError>,
    ) -> Result<T, StatError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("formula nested too deeply".to_string()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn expect(&mut self, expected: Token) -> Result<(), StatError> {
        match self.next() {
            Some(token) if token == expected => Ok(()),
            Some(token) => {
                let reason = format!("expected {:?}, found {:?}", expected, token);
                Err(self.error(reason))
            }
            None => Err(self.error("unexpected end of formula".to_string())),
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, StatError> {
        let mut value = self.term()?;
        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.pos += 1;
                    value += self.term()?;
                }
                Some(Token::Minus) => {
                    self.pos += 1;
                    value -= self.term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<f64, StatError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some(Token::Star) => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some(Token::Slash) => {
                    self.pos += 1;
                    let divisor = self.unary()?;
                    if divisor == 0.0 {
                        return Err(self.error("division by zero".to_string()));
                    }
                    value /= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    fn unary(&mut self) -> Result<f64, StatError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(-self.nested(Self::unary)?)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.nested(Self::unary)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, StatError> {
        let token = match self.next() {
            Some(token) => token,
            None => return Err(self.error("unexpected end of formula".to_string())),
        };
        match token {
            Token::Number(n) => Ok(n),
            Token::Ref(path) => self.data.number(&path).ok_or_else(|| StatError::UnknownReference {
                formula: self.formula.to_string(),
                path,
            }),
            Token::LParen => {
                let value = self.nested(Self::expr)?;
                self.expect(Token::RParen)?;
                Ok(value)
            }
            Token::Ident(name) => self.nested(|parser| parser.call(&name)),
            other => Err(self.error(format!("unexpected {:?}", other))),
        }
    }

    fn call(&mut self, name: &str) -> Result<f64, StatError> {
        self.expect(Token::LParen)?;
        let mut args = vec![self.expr()?];
        while self.peek() == Some(&Token::Comma) {
            self.pos += 1;
            args.push(self.expr()?);
        }
        self.expect(Token::RParen)?;

        let unary = |f: fn(f64) -> f64| -> Result<f64, StatError> {
            match args.as_slice() {
                [x] => Ok(f(*x)),
                _ => Err(self.error(format!("{} takes exactly one argument", name))),
            }
        };
        match name {
            "floor" => unary(f64::floor),
            "ceil" => unary(f64::ceil),
            "round" => unary(f64::round),
            "abs" => unary(f64::abs),
            "min" => Ok(args.iter().copied().fold(f64::INFINITY, f64::min)),
            "max" => Ok(args.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
            other => Err(self.error(format!("unknown function `{}`", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(formula: &str) -> Result<f64, StatError> {
        let mut data = RollData::new();
        data.set("abilities.con.mod", 2);
        data.set("attributes.hd.total", 5);
        data.set("attributes.energyDrain", 0);
        ArithmeticEvaluator.evaluate(formula, &data)
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("1 + 2 * 3").unwrap(), 7.0);
        assert_eq!(eval("(1 + 2) * 3").unwrap(), 9.0);
        assert_eq!(eval("-2 - -3").unwrap(), 1.0);
        assert_eq!(eval("7 / 2").unwrap(), 3.5);
    }

    #[test]
    fn test_references() {
        assert_eq!(eval("@abilities.con.mod * @attributes.hd.total").unwrap(), 10.0);
        assert_eq!(eval("-5 * @attributes.energyDrain").unwrap(), 0.0);
    }

    #[test]
    fn test_functions() {
        assert_eq!(eval("floor(7 / 2)").unwrap(), 3.0);
        assert_eq!(eval("ceil(7 / 2)").unwrap(), 4.0);
        assert_eq!(eval("min(4, @abilities.con.mod, 9)").unwrap(), 2.0);
        assert_eq!(eval("max(1, floor(@attributes.hd.total / 2))").unwrap(), 2.0);
    }

    #[test]
    fn test_unknown_reference() {
        let err = eval("@abilities.str.mod + 1").unwrap_err();
        assert_eq!(
            err,
            StatError::UnknownReference {
                formula: "@abilities.str.mod + 1".to_string(),
                path: "abilities.str.mod".to_string(),
            }
        );
    }

    #[test]
    fn test_nesting_is_bounded() {
        let shallow = format!("{}1{}", "(".repeat(32), ")".repeat(32));
        assert_eq!(eval(&shallow).unwrap(), 1.0);

        let deep = format!("{}1{}", "(".repeat(20_000), ")".repeat(20_000));
        let err = eval(&deep).unwrap_err();
        assert!(err.to_string().contains("nested too deeply"));

        let signs = format!("{}1", "-".repeat(500_000));
        assert!(matches!(eval(&signs), Err(StatError::Formula { .. })));

        let calls = format!("{}1{}", "abs(".repeat(100), ")".repeat(100));
        assert!(matches!(eval(&calls), Err(StatError::Formula { .. })));
    }

    #[test]
    fn test_malformed_formulas() {
        assert!(matches!(eval("1 +"), Err(StatError::Formula { .. })));
        assert!(matches!(eval("(1 + 2"), Err(StatError::Formula { .. })));
        assert!(matches!(eval("1d6"), Err(StatError::Formula { .. })));
        assert!(matches!(eval("4 / 0"), Err(StatError::Formula { .. })));
        assert!(matches!(eval("sqrt(4)"), Err(StatError::Formula { .. })));
        assert!(matches!(eval("floor(1, 2)"), Err(StatError::Formula { .. })));
        assert!(matches!(eval(""), Err(StatError::Formula { .. })));
    }
}
