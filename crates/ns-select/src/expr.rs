//! Selection expressions over event fields.
//!
//! Used for cuts and threshold schemes declared in configuration rather than
//! in code. The grammar covers arithmetic (`+ - * /`), comparisons
//! (`== != < <= > >=`), boolean operators (`&& || !`) and the functions
//! `abs sqrt log exp pow min max`. A value is "true" when it is `> 0`.
//!
//! Fields missing from an event evaluate to NaN, so any comparison that
//! involves them is false.

use std::iter::Peekable;
use std::str::CharIndices;

use ns_core::{Error, EventRecord, Result};

#[derive(Debug, Clone)]
enum Node {
    Const(f64),
    Field(usize),
    Neg(Box<Node>),
    Not(Box<Node>),
    Binary(Op, Box<Node>, Box<Node>),
    Call(Func, Vec<Node>),
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Op {
    Or,
    And,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
}

impl Op {
    /// Binding strength; higher binds tighter.
    fn precedence(self) -> u8 {
        match self {
            Op::Or => 1,
            Op::And => 2,
            Op::Eq | Op::Ne | Op::Lt | Op::Le | Op::Gt | Op::Ge => 3,
            Op::Add | Op::Sub => 4,
            Op::Mul | Op::Div => 5,
        }
    }

    fn is_comparison(self) -> bool {
        self.precedence() == 3
    }

    fn apply(self, lhs: f64, rhs: f64) -> f64 {
        let truth = |b: bool| if b { 1.0 } else { 0.0 };
        match self {
            Op::Add => lhs + rhs,
            Op::Sub => lhs - rhs,
            Op::Mul => lhs * rhs,
            Op::Div => lhs / rhs,
            Op::Eq => truth((lhs - rhs).abs() < f64::EPSILON),
            Op::Ne => truth((lhs - rhs).abs() >= f64::EPSILON),
            Op::Lt => truth(lhs < rhs),
            Op::Le => truth(lhs <= rhs),
            Op::Gt => truth(lhs > rhs),
            Op::Ge => truth(lhs >= rhs),
            Op::And => truth(lhs > 0.0 && rhs > 0.0),
            Op::Or => truth(lhs > 0.0 || rhs > 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Func {
    Abs,
    Sqrt,
    Log,
    Exp,
    Pow,
    Min,
    Max,
}

impl Func {
    fn lookup(name: &str) -> Option<(Func, usize)> {
        Some(match name {
            "abs" => (Func::Abs, 1),
            "sqrt" => (Func::Sqrt, 1),
            "log" => (Func::Log, 1),
            "exp" => (Func::Exp, 1),
            "pow" => (Func::Pow, 2),
            "min" => (Func::Min, 2),
            "max" => (Func::Max, 2),
            _ => return None,
        })
    }

    fn apply(self, args: &[f64]) -> f64 {
        match self {
            Func::Abs => args[0].abs(),
            Func::Sqrt => args[0].sqrt(),
            Func::Log => args[0].ln(),
            Func::Exp => args[0].exp(),
            Func::Pow => args[0].powf(args[1]),
            Func::Min => args[0].min(args[1]),
            Func::Max => args[0].max(args[1]),
        }
    }
}

/// A parsed expression, ready to be evaluated against events.
#[derive(Debug, Clone)]
pub struct CompiledExpr {
    source: String,
    root: Node,
    /// Event fields referenced by the expression, in order of first use.
    pub fields: Vec<String>,
}

impl CompiledExpr {
    /// Parse an expression. Identifiers that are not function names are
    /// event field names.
    pub fn compile(input: &str) -> Result<Self> {
        let tokens = lex(input)?;
        if tokens.is_empty() {
            return Err(Error::Expression("empty expression".into()));
        }
        let mut parser = Parser { tokens: &tokens, pos: 0, fields: Vec::new() };
        let root = parser.expression(0)?;
        if let Some(tok) = parser.tokens.get(parser.pos) {
            return Err(Error::Expression(format!(
                "unexpected {tok:?} after end of expression '{input}'"
            )));
        }
        Ok(Self { source: input.to_string(), root, fields: parser.fields })
    }

    /// The text this expression was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Evaluate against one event.
    pub fn eval<E: EventRecord + ?Sized>(&self, event: &E) -> f64 {
        let values: Vec<f64> =
            self.fields.iter().map(|f| event.field(f).unwrap_or(f64::NAN)).collect();
        eval_node(&self.root, &values)
    }

    /// Evaluate as a boolean selection (`value > 0`).
    pub fn passes<E: EventRecord + ?Sized>(&self, event: &E) -> bool {
        self.eval(event) > 0.0
    }
}

fn eval_node(node: &Node, values: &[f64]) -> f64 {
    match node {
        Node::Const(v) => *v,
        Node::Field(i) => values[*i],
        Node::Neg(inner) => -eval_node(inner, values),
        Node::Not(inner) => {
            if eval_node(inner, values) > 0.0 {
                0.0
            } else {
                1.0
            }
        }
        Node::Binary(op, lhs, rhs) => op.apply(eval_node(lhs, values), eval_node(rhs, values)),
        Node::Call(func, args) => {
            let args: Vec<f64> = args.iter().map(|a| eval_node(a, values)).collect();
            func.apply(&args)
        }
    }
}

// Lexer

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Number(f64),
    Ident(String),
    Op(Op),
    Bang,
    LParen,
    RParen,
    Comma,
}

fn lex(input: &str) -> Result<Vec<Tok>> {
    let mut out = Vec::new();
    let mut chars: Peekable<CharIndices<'_>> = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let tok = match c {
            c if c.is_whitespace() => continue,
            '(' => Tok::LParen,
            ')' => Tok::RParen,
            ',' => Tok::Comma,
            '+' => Tok::Op(Op::Add),
            '-' => Tok::Op(Op::Sub),
            '*' => Tok::Op(Op::Mul),
            '/' => Tok::Op(Op::Div),
            '&' | '|' | '=' => {
                let op = match c {
                    '&' => Op::And,
                    '|' => Op::Or,
                    _ => Op::Eq,
                };
                if chars.next_if(|&(_, n)| n == c).is_none() {
                    return Err(Error::Expression(format!(
                        "expected '{c}{c}' at offset {start} in '{input}'"
                    )));
                }
                Tok::Op(op)
            }
            '!' | '<' | '>' => {
                let with_eq = chars.next_if(|&(_, n)| n == '=').is_some();
                match (c, with_eq) {
                    ('!', false) => Tok::Bang,
                    ('!', true) => Tok::Op(Op::Ne),
                    ('<', false) => Tok::Op(Op::Lt),
                    ('<', true) => Tok::Op(Op::Le),
                    ('>', false) => Tok::Op(Op::Gt),
                    _ => Tok::Op(Op::Ge),
                }
            }
            c if c.is_ascii_digit() || c == '.' => {
                let mut end = start + c.len_utf8();
                let mut prev = c;
                while let Some(&(i, n)) = chars.peek() {
                    let exponent_sign = (n == '+' || n == '-') && (prev == 'e' || prev == 'E');
                    if n.is_ascii_digit() || n == '.' || n == 'e' || n == 'E' || exponent_sign {
                        prev = n;
                        end = i + n.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let text = &input[start..end];
                let value = text
                    .parse::<f64>()
                    .map_err(|_| Error::Expression(format!("invalid number '{text}'")))?;
                Tok::Number(value)
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start + 1;
                while let Some((i, n)) =
                    chars.next_if(|&(_, n)| n.is_ascii_alphanumeric() || n == '_')
                {
                    end = i + n.len_utf8();
                }
                Tok::Ident(input[start..end].to_string())
            }
            other => {
                return Err(Error::Expression(format!(
                    "unexpected character '{other}' at offset {start} in '{input}'"
                )));
            }
        };
        out.push(tok);
    }
    Ok(out)
}

// Parser (precedence climbing)

struct Parser<'a> {
    tokens: &'a [Tok],
    pos: usize,
    fields: Vec<String>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Tok> {
        self.tokens.get(self.pos)
    }

    fn bump(&mut self) -> Option<Tok> {
        let tok = self.tokens.get(self.pos).cloned();
        if tok.is_some() {
            self.pos += 1;
        }
        tok
    }

    fn expect(&mut self, want: Tok) -> Result<()> {
        match self.bump() {
            Some(tok) if tok == want => Ok(()),
            got => Err(Error::Expression(format!("expected {want:?}, found {got:?}"))),
        }
    }

    fn field_slot(&mut self, name: String) -> usize {
        match self.fields.iter().position(|f| *f == name) {
            Some(i) => i,
            None => {
                self.fields.push(name);
                self.fields.len() - 1
            }
        }
    }

    fn expression(&mut self, min_prec: u8) -> Result<Node> {
        let mut lhs = self.unary()?;
        while let Some(&Tok::Op(op)) = self.peek() {
            let prec = op.precedence();
            if prec <= min_prec {
                break;
            }
            self.pos += 1;
            let rhs = self.expression(prec)?;
            lhs = Node::Binary(op, Box::new(lhs), Box::new(rhs));
            // Comparisons do not chain: `a < b < c` is rejected.
            if op.is_comparison()
                && let Some(&Tok::Op(next)) = self.peek()
                && next.is_comparison()
            {
                return Err(Error::Expression("chained comparison is ambiguous".into()));
            }
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<Node> {
        match self.peek() {
            Some(Tok::Op(Op::Sub)) => {
                self.pos += 1;
                Ok(Node::Neg(Box::new(self.unary()?)))
            }
            Some(Tok::Bang) => {
                self.pos += 1;
                Ok(Node::Not(Box::new(self.unary()?)))
            }
            _ => self.atom(),
        }
    }

    fn atom(&mut self) -> Result<Node> {
        match self.bump() {
            Some(Tok::Number(v)) => Ok(Node::Const(v)),
            Some(Tok::LParen) => {
                let inner = self.expression(0)?;
                self.expect(Tok::RParen)?;
                Ok(inner)
            }
            Some(Tok::Ident(name)) if self.peek() == Some(&Tok::LParen) => {
                let (func, arity) = Func::lookup(&name)
                    .ok_or_else(|| Error::Expression(format!("unknown function '{name}'")))?;
                self.pos += 1;
                let mut args = vec![self.expression(0)?];
                while self.peek() == Some(&Tok::Comma) {
                    self.pos += 1;
                    args.push(self.expression(0)?);
                }
                self.expect(Tok::RParen)?;
                if args.len() != arity {
                    return Err(Error::Expression(format!(
                        "{name}() takes {arity} argument(s), got {}",
                        args.len()
                    )));
                }
                Ok(Node::Call(func, args))
            }
            Some(Tok::Ident(name)) => Ok(Node::Field(self.field_slot(name))),
            got => Err(Error::Expression(format!(
                "expected number, field name or '(', found {got:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::FieldMap;

    fn event(pairs: &[(&str, f64)]) -> FieldMap {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn arithmetic_precedence() {
        let e = CompiledExpr::compile("2 + 3 * 4 - 6 / 2").unwrap();
        assert!(e.fields.is_empty());
        assert!((e.eval(&FieldMap::new()) - 11.0).abs() < 1e-12);
    }

    #[test]
    fn ratio_cut_on_fields() {
        let e = CompiledExpr::compile("y1_pt / m_yy > 0.35 && y2_pt / m_yy > 0.25").unwrap();
        assert_eq!(e.fields, vec!["y1_pt", "m_yy", "y2_pt"]);
        assert!(e.passes(&event(&[("y1_pt", 60.0), ("y2_pt", 40.0), ("m_yy", 125.0)])));
        assert!(!e.passes(&event(&[("y1_pt", 60.0), ("y2_pt", 20.0), ("m_yy", 125.0)])));
    }

    #[test]
    fn missing_field_fails_comparisons() {
        let e = CompiledExpr::compile("met > 120").unwrap();
        assert!(!e.passes(&FieldMap::new()));
        assert!(e.eval(&FieldMap::new()).abs() < 1e-12);
    }

    #[test]
    fn functions_and_negation() {
        let ev = event(&[("eta", -2.7), ("a", 3.0), ("b", 7.0)]);
        assert!(!CompiledExpr::compile("abs(eta) < 2.5").unwrap().passes(&ev));
        assert!((CompiledExpr::compile("max(a, b)").unwrap().eval(&ev) - 7.0).abs() < 1e-12);
        assert!((CompiledExpr::compile("pow(a, 2)").unwrap().eval(&ev) - 9.0).abs() < 1e-12);
        assert!((CompiledExpr::compile("-a + 1").unwrap().eval(&ev) + 2.0).abs() < 1e-12);
        assert!(CompiledExpr::compile("!(a > b)").unwrap().passes(&ev));
    }

    #[test]
    fn only_positive_values_pass() {
        let e = CompiledExpr::compile("met - 200").unwrap();
        let low = event(&[("met", 100.0)]);
        assert!((e.eval(&low) + 100.0).abs() < 1e-12);
        assert!(!e.passes(&low));
        assert!(!e.passes(&event(&[("met", 200.0)])));
        assert!(e.passes(&event(&[("met", 250.0)])));
        assert!(!e.passes(&FieldMap::new()));
        assert!(CompiledExpr::compile("!(met - 200)").unwrap().passes(&low));
    }

    #[test]
    fn or_and_parentheses() {
        let e = CompiledExpr::compile("(x > 5 || y < 2) && x != 9").unwrap();
        assert!(e.passes(&event(&[("x", 6.0), ("y", 3.0)])));
        assert!(e.passes(&event(&[("x", 1.0), ("y", 1.0)])));
        assert!(!e.passes(&event(&[("x", 9.0), ("y", 1.0)])));
    }

    #[test]
    fn scientific_notation() {
        let e = CompiledExpr::compile("1.5e2 + 3.0E-1").unwrap();
        assert!((e.eval(&FieldMap::new()) - 150.3).abs() < 1e-10);
    }

    #[test]
    fn rejects_malformed_input() {
        assert!(CompiledExpr::compile("").is_err());
        assert!(CompiledExpr::compile("a & b").is_err());
        assert!(CompiledExpr::compile("(a > 1").is_err());
        assert!(CompiledExpr::compile("a > 1 )").is_err());
        assert!(CompiledExpr::compile("frobnicate(a)").is_err());
        assert!(CompiledExpr::compile("pow(a)").is_err());
        assert!(CompiledExpr::compile("1 < a < 3").is_err());
        assert!(CompiledExpr::compile("a $ b").is_err());
    }

    #[test]
    fn source_is_kept() {
        let e = CompiledExpr::compile("pt_yy > 120").unwrap();
        assert_eq!(e.source(), "pt_yy > 120");
    }
}
