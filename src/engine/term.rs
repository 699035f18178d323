use std::collections::HashMap;
use std::fmt;

use super::diagnostics::*;
use super::lexer::*;

/// The whole data model of the language. An atom is any bare word; an
/// application is two or more juxtaposed terms. Everything else (numbers,
/// booleans, lists) is an encoding built from these two by library rules.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    Atom(String),
    App(Vec<Term>),
}

pub type Bindings = HashMap<String, Term>;

/// Variables exist only by spelling convention, and only the matcher cares:
/// the parser produces plain atoms for them.
pub fn is_variable(name: &str) -> bool {
    name.chars().next().map_or(false, |x| x.is_uppercase())
}

fn starts_primary(kind: TokenKind) -> bool {
    use TokenKind::*;
    matches!(kind, Atom | Ellipsis | OpenParen | OpenBracket)
}

impl Term {
    /// The leftmost atom of the term, reached by descending through first
    /// children. Rules are indexed by the head atom of their pattern.
    pub fn head_atom(&self) -> &str {
        let mut term = self;
        loop {
            match term {
                Self::Atom(name) => return name,
                Self::App(children) => term = &children[0],
            }
        }
    }

    fn parse_primary(lexer: &mut Lexer, diag: &mut impl Diagnoster) -> Option<Self> {
        let token = lexer.next_token();
        match token.kind {
            TokenKind::Atom => Some(Self::Atom(token.text)),
            // `..` is an ordinary atom once parsed. The library gives it
            // meaning as the end marker of `list` clauses.
            TokenKind::Ellipsis => Some(Self::Atom(token.text)),
            TokenKind::OpenBracket => {
                lexer.expect_token(TokenKind::CloseBracket).map_err(|(expected_kind, actual_token)| {
                    diag.report(&actual_token.loc, Severity::Error, &format!("expected {expected_kind} right after the open bracket of the empty list, but got {actual_token} instead", actual_token = actual_token.report()));
                }).ok()?;
                Some(Self::Atom("[]".to_string()))
            }
            TokenKind::OpenParen => {
                let term = Self::parse(lexer, diag)?;
                lexer.expect_token(TokenKind::CloseParen).map_err(|(expected_kind, actual_token)| {
                    diag.report(&actual_token.loc, Severity::Error, &format!("expected {expected_kind} to close the group, but got {actual_token} instead", actual_token = actual_token.report()));
                }).ok()?;
                Some(term)
            }
            _ => {
                diag.report(&token.loc, Severity::Error, &format!("expected an atom, {} or {}, but got {} instead", TokenKind::OpenParen, TokenKind::OpenBracket, token.report()));
                None
            }
        }
    }

    /// Parses a run of one or more primaries. A single primary is the term
    /// itself; several become one application, stored flat.
    pub fn parse(lexer: &mut Lexer, diag: &mut impl Diagnoster) -> Option<Self> {
        let mut children = Vec::new();
        while starts_primary(lexer.peek_token().kind) {
            children.push(Self::parse_primary(lexer, diag)?);
        }
        if children.len() > 1 {
            Some(Self::App(children))
        } else if let Some(term) = children.pop() {
            Some(term)
        } else {
            let token = lexer.peek_token().clone();
            diag.report(&token.loc, Severity::Error, &format!("expected an expression, but got {} instead", token.report()));
            None
        }
    }

    /// Replaces every atom bound in `bindings` with a copy of its binding.
    /// Only variables ever get bound, so constants pass through untouched,
    /// and so do variables the pattern did not mention.
    pub fn substitute(&mut self, bindings: &Bindings) {
        match self {
            Self::Atom(name) => {
                if let Some(value) = bindings.get(name) {
                    *self = value.clone()
                }
            }

            Self::App(children) => {
                for child in children {
                    child.substitute(bindings)
                }
            }
        }
    }
}

pub fn pattern_match(pattern: &Term, value: &Term) -> Option<Bindings> {
    fn pattern_match_impl(pattern: &Term, value: &Term, bindings: &mut Bindings) -> bool {
        use Term::*;
        match (pattern, value) {
            (Atom(name), _) if is_variable(name) => {
                if let Some(bound_value) = bindings.get(name) {
                    // A repeated variable must see structurally equal terms.
                    bound_value == value
                } else {
                    bindings.insert(name.clone(), value.clone());
                    true
                }
            }
            (Atom(name1), Atom(name2)) => {
                name1 == name2
            }
            (App(children1), App(children2)) => {
                if children1.len() != children2.len() {
                    return false;
                }
                for i in 0..children1.len() {
                    if !pattern_match_impl(&children1[i], &children2[i], bindings) {
                        return false;
                    }
                }
                true
            }
            _ => false,
        }
    }

    let mut bindings = HashMap::new();

    if pattern_match_impl(pattern, value, &mut bindings) {
        Some(bindings)
    } else {
        None
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Term::Atom(name) => write!(f, "{}", name),
            Term::App(children) => {
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}
