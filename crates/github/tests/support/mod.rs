//! Reference evaluator for rendered GitHub Actions expressions.
//!
//! Supports the subset flowgate emits: `||`, `&&`, `!`, `==`, `!=`, string
//! literals, context paths, `contains()` and `always()`. String comparison is
//! case-insensitive and missing context paths evaluate to null, as on GitHub.

#![allow(dead_code, clippy::unwrap_used, clippy::panic)]

use serde_json::{Value, json};

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    Comma,
    And,
    Or,
    Not,
    Eq,
    Ne,
    Str(String),
    Ident(String),
}

#[derive(Debug)]
enum Node {
    Lit(Value),
    Prop(String),
    Not(Box<Node>),
    And(Vec<Node>),
    Or(Vec<Node>),
    Cmp(Box<Node>, Box<Node>, bool),
    Call(String, Vec<Node>),
}

fn tokenize(src: &str) -> Vec<Token> {
    let chars: Vec<char> = src.chars().collect();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        match chars[i] {
            c if c.is_whitespace() => i += 1,
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
            '&' => {
                assert_eq!(chars.get(i + 1), Some(&'&'), "stray '&' in {src}");
                tokens.push(Token::And);
                i += 2;
            }
            '|' => {
                assert_eq!(chars.get(i + 1), Some(&'|'), "stray '|' in {src}");
                tokens.push(Token::Or);
                i += 2;
            }
            '!' if chars.get(i + 1) == Some(&'=') => {
                tokens.push(Token::Ne);
                i += 2;
            }
            '!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            '=' => {
                assert_eq!(chars.get(i + 1), Some(&'='), "stray '=' in {src}");
                tokens.push(Token::Eq);
                i += 2;
            }
            '\'' => {
                let mut text = String::new();
                i += 1;
                loop {
                    assert!(i < chars.len(), "unterminated string in {src}");
                    if chars[i] == '\'' {
                        if chars.get(i + 1) == Some(&'\'') {
                            text.push('\'');
                            i += 2;
                        } else {
                            i += 1;
                            break;
                        }
                    } else {
                        text.push(chars[i]);
                        i += 1;
                    }
                }
                tokens.push(Token::Str(text));
            }
            c => {
                let start = i;
                while i < chars.len() && (chars[i].is_alphanumeric() || "_.-*".contains(chars[i])) {
                    i += 1;
                }
                assert!(i > start, "unexpected '{c}' in {src}");
                tokens.push(Token::Ident(chars[start..i].iter().collect()));
            }
        }
    }
    tokens
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Token {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        token
    }

    fn or(&mut self) -> Node {
        let mut terms = vec![self.and()];
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            terms.push(self.and());
        }
        if terms.len() == 1 { terms.pop().unwrap() } else { Node::Or(terms) }
    }

    fn and(&mut self) -> Node {
        let mut terms = vec![self.unary()];
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            terms.push(self.unary());
        }
        if terms.len() == 1 { terms.pop().unwrap() } else { Node::And(terms) }
    }

    fn unary(&mut self) -> Node {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Node::Not(Box::new(self.unary()));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Node {
        let left = self.primary();
        let negated = match self.peek() {
            Some(Token::Eq) => false,
            Some(Token::Ne) => true,
            _ => return left,
        };
        self.pos += 1;
        Node::Cmp(Box::new(left), Box::new(self.primary()), negated)
    }

    fn primary(&mut self) -> Node {
        match self.next() {
            Token::LParen => {
                let inner = self.or();
                assert_eq!(self.next(), Token::RParen);
                inner
            }
            Token::Str(text) => Node::Lit(Value::String(text)),
            Token::Ident(name) if self.peek() == Some(&Token::LParen) => {
                self.pos += 1;
                let mut args = Vec::new();
                while self.peek() != Some(&Token::RParen) {
                    args.push(self.or());
                    if self.peek() == Some(&Token::Comma) {
                        self.pos += 1;
                    }
                }
                self.pos += 1;
                Node::Call(name, args)
            }
            Token::Ident(name) => match name.as_str() {
                "true" => Node::Lit(Value::Bool(true)),
                "false" => Node::Lit(Value::Bool(false)),
                "null" => Node::Lit(Value::Null),
                _ => Node::Prop(name),
            },
            other => panic!("unexpected token {other:?}"),
        }
    }
}

fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn loose_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => x.eq_ignore_ascii_case(y),
        _ => a == b,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        _ => true,
    }
}

fn value(node: &Node, context: &Value) -> Value {
    match node {
        Node::Lit(v) => v.clone(),
        Node::Prop(path) => path
            .split('.')
            .try_fold(context, |v, segment| v.get(segment))
            .cloned()
            .unwrap_or(Value::Null),
        Node::Not(child) => Value::Bool(!truthy(&value(child, context))),
        Node::And(terms) => Value::Bool(terms.iter().all(|t| truthy(&value(t, context)))),
        Node::Or(terms) => Value::Bool(terms.iter().any(|t| truthy(&value(t, context)))),
        Node::Cmp(left, right, negated) => {
            Value::Bool(loose_eq(&value(left, context), &value(right, context)) != *negated)
        }
        Node::Call(name, args) => match name.as_str() {
            "always" => Value::Bool(true),
            "contains" => {
                let haystack = value(&args[0], context);
                let needle = value(&args[1], context);
                Value::Bool(match &haystack {
                    Value::Array(items) => items.iter().any(|item| loose_eq(item, &needle)),
                    other => as_text(other)
                        .to_lowercase()
                        .contains(&as_text(&needle).to_lowercase()),
                })
            }
            other => panic!("unsupported function {other}"),
        },
    }
}

/// Evaluate a rendered condition against a `{ "github": ... }` context.
pub fn evaluate(expression: &str, context: &Value) -> bool {
    let mut parser = Parser {
        tokens: tokenize(expression),
        pos: 0,
    };
    let node = parser.or();
    assert_eq!(
        parser.pos,
        parser.tokens.len(),
        "trailing tokens in {expression}"
    );
    truthy(&value(&node, context))
}

/// Context for an event with an optional activity type and payload.
pub fn event(name: &str, action: Option<&str>, mut payload: Value) -> Value {
    if let Some(action) = action {
        payload["action"] = json!(action);
    }
    json!({ "github": { "event_name": name, "event": payload } })
}

/// A comment on issue #7.
pub fn issue_comment(body: &str) -> Value {
    event(
        "issue_comment",
        Some("created"),
        json!({ "issue": { "number": 7, "body": "" }, "comment": { "body": body } }),
    )
}

/// A labeling action on issue #7.
pub fn issue_labeled(action: &str, label: &str) -> Value {
    event(
        "issues",
        Some(action),
        json!({ "issue": { "number": 7, "body": "" }, "label": { "name": label } }),
    )
}

/// A push with no issue or pull request payload.
pub fn push() -> Value {
    event("push", None, json!({ "ref": "refs/heads/main" }))
}
