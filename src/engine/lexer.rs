use std::fmt;

#[derive(Debug, Clone)]
pub enum Loc {
    File {
        path: String,
        row: usize,
        col: usize,
    },
    Repl {
        col: usize,
        line: Vec<char>,
    },
}

#[derive(Debug, PartialEq, Clone, Copy, Eq, Hash)]
pub enum TokenKind {
    Atom,
    Ellipsis,

    // Special Characters
    OpenParen,
    CloseParen,
    OpenBracket,
    CloseBracket,
    Equals,

    // Terminators
    Newline,
    End,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use TokenKind::*;
        match self {
            Atom => write!(f, "atom"),
            Ellipsis => write!(f, "ellipsis"),
            OpenParen => write!(f, "open paren"),
            CloseParen => write!(f, "close paren"),
            OpenBracket => write!(f, "open bracket"),
            CloseBracket => write!(f, "close bracket"),
            Equals => write!(f, "equals"),
            Newline => write!(f, "end of line"),
            End => write!(f, "end of input"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub loc: Loc,
}

impl Token {
    pub fn report(&self) -> ReportToken<'_> {
        ReportToken { inner: self }
    }
}

pub struct ReportToken<'a> {
    pub inner: &'a Token,
}

impl fmt::Display for ReportToken<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.text.is_empty() || self.inner.text == "\n" {
            write!(f, "{}", self.inner.kind)
        } else {
            write!(f, "{} `{}`", self.inner.kind, self.inner.text)
        }
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Token) -> bool {
        self.kind == other.kind && self.text == other.text
    }
}

pub struct Lexer {
    chars: Vec<char>,
    peeked: Option<Token>,
    exhausted: bool,
    file_path: Option<String>,
    lnum: usize,
    bol: usize,
    cnum: usize,
}

impl Lexer {
    pub fn new(chars: Vec<char>, file_path: Option<String>) -> Self {
        Self {
            chars,
            peeked: None,
            exhausted: false,
            file_path,
            lnum: 0,
            bol: 0,
            cnum: 0,
        }
    }

    pub fn current_line(&self) -> Vec<char> {
        let mut eol = self.bol;
        while eol < self.chars.len() && self.chars[eol] != '\n' {
            eol += 1;
        }
        self.chars[self.bol..eol].to_vec()
    }

    pub fn loc(&self) -> Loc {
        match &self.file_path {
            Some(file_path) => Loc::File {
                path: file_path.clone(),
                row: self.lnum + 1,
                col: self.cnum - self.bol,
            },
            None => Loc::Repl {
                col: self.cnum - self.bol,
                line: self.current_line(),
            },
        }
    }

    pub fn expect_token(&mut self, kind: TokenKind) -> Result<Token, (TokenKind, Token)> {
        let token = self.next_token();
        if kind == token.kind {
            Ok(token)
        } else {
            Err((kind, token))
        }
    }

    pub fn peek_token(&mut self) -> &Token {
        let token = self.next_token();
        self.peeked.insert(token)
    }

    pub fn next_token(&mut self) -> Token {
        self.peeked.take().unwrap_or_else(|| self.chop_tokens_from_chars())
    }

    fn drop_char_if(&mut self, predicate: impl FnOnce(char) -> bool) -> Option<char> {
        self.chars.get(self.cnum).cloned().and_then(|ch| {
            if predicate(ch) {
                self.drop_char()
            } else {
                None
            }
        })
    }

    fn drop_char(&mut self) -> Option<char> {
        self.chars.get(self.cnum).cloned().map(|ch| {
            self.cnum += 1;
            if ch == '\n' {
                self.bol = self.cnum;
                self.lnum += 1;
            }
            ch
        })
    }

    // Newline is a token of its own, so only the rest of the whitespace is
    // skippable.
    fn trim_whitespaces(&mut self) {
        while self.drop_char_if(|x| x.is_whitespace() && x != '\n').is_some() {}
    }

    fn chop_tokens_from_chars(&mut self) -> Token {
        assert!(!self.exhausted, "Completely exhausted lexer. The lexer MUST ALWAYS end with the terminators. If the lexer caller tries to pull tokens after the terminators, this is a bug.");

        self.trim_whitespaces();

        // A comment runs to the end of the line, but the newline itself is
        // still a token: it terminates the rule on that line.
        if self.chars.get(self.cnum) == Some(&'#') {
            while self.drop_char_if(|x| x != '\n').is_some() {}
        }

        let loc = self.loc();
        match self.drop_char() {
            Some(x) => {
                let mut text = x.to_string();
                match x {
                    '\n' => Token {kind: TokenKind::Newline,      text, loc},
                    '('  => Token {kind: TokenKind::OpenParen,    text, loc},
                    ')'  => Token {kind: TokenKind::CloseParen,   text, loc},
                    '['  => Token {kind: TokenKind::OpenBracket,  text, loc},
                    ']'  => Token {kind: TokenKind::CloseBracket, text, loc},
                    _ => {
                        while let Some(x) = self.drop_char_if(is_atom_char) {
                            text.push(x)
                        }

                        // `=` and `..` are special only when they stand on
                        // their own. As part of a longer word they are just
                        // atom spelling: `a=b` and `>=` are single atoms.
                        let kind = match text.as_str() {
                            "=" => TokenKind::Equals,
                            ".." => TokenKind::Ellipsis,
                            _ => TokenKind::Atom,
                        };
                        Token {kind, text, loc}
                    }
                }
            }

            None => {
                self.exhausted = true;
                Token {kind: TokenKind::End, text: "".to_string(), loc}
            }
        }
    }
}

fn is_atom_char(x: char) -> bool {
    !x.is_whitespace() && !"()[]#".contains(x)
}
