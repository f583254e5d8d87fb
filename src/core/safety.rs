// sql safety gate
// only a single SELECT ever reaches the database. this gates the kind of
// statement, it is not a sql parser.

use std::fmt;

/// Generated text after classification. `SafeSelect` can only be built here,
/// so nothing unclassified can be handed to an executor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    SafeSelect(SafeSelect),
    Rejected { sql: String, reason: Rejection },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeSelect(String);

impl SafeSelect {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeSelect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Empty,
    NotSelect(String),
    Comment,
    UnterminatedLiteral,
    MultipleStatements,
    DeniedColumn(String),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Empty => write!(f, "empty statement"),
            Rejection::NotSelect(kw) => write!(f, "leading keyword {kw:?} is not SELECT"),
            Rejection::Comment => write!(f, "sql comment, possible injection"),
            Rejection::UnterminatedLiteral => write!(f, "unterminated quoted literal"),
            Rejection::MultipleStatements => write!(f, "more than one statement"),
            Rejection::DeniedColumn(col) => write!(f, "reads denied column {col:?}"),
        }
    }
}

impl Statement {
    pub fn is_safe(&self) -> bool {
        matches!(self, Statement::SafeSelect(_))
    }
}

/// Classifier with an optional deny-list of identifiers that may not be read.
/// A non-empty deny-list also refuses `*` projections, since those would
/// read denied columns without naming them.
#[derive(Debug, Clone, Default)]
pub struct Safety {
    denied: Vec<String>,
}

impl Safety {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_denied_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let denied = columns
            .into_iter()
            .map(|c| c.as_ref().trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .collect();
        Self { denied }
    }

    /// Never fails; every input maps to exactly one variant.
    pub fn classify(&self, raw: &str) -> Statement {
        let sql = raw.trim();

        let reject = |reason| Statement::Rejected {
            sql: sql.to_string(),
            reason,
        };

        let keyword = leading_keyword(sql);
        if keyword.is_empty() {
            return reject(Rejection::Empty);
        }
        if !keyword.eq_ignore_ascii_case("select") {
            return reject(Rejection::NotSelect(keyword.to_string()));
        }

        let tokens = match tokenize(sql) {
            Ok(tokens) => tokens,
            Err(reason) => return reject(reason),
        };

        // one trailing `;` is allowed and dropped, anything after it is not
        let (tokens, end) = match tokens.iter().position(|t| t.kind == Kind::Symbol(';')) {
            Some(i) if i + 1 < tokens.len() => return reject(Rejection::MultipleStatements),
            Some(i) => (&tokens[..i], tokens[i].start),
            None => (&tokens[..], sql.len()),
        };

        if let Some(col) = self.first_denied(tokens) {
            return reject(Rejection::DeniedColumn(col));
        }

        Statement::SafeSelect(SafeSelect(sql[..end].trim_end().to_string()))
    }

    fn first_denied(&self, tokens: &[Token<'_>]) -> Option<String> {
        if self.denied.is_empty() {
            return None;
        }

        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                Kind::Word(w) => {
                    let w = w.to_lowercase();
                    if self.denied.contains(&w) {
                        return Some(w);
                    }
                }
                Kind::Symbol('*') if i > 0 && is_wildcard(&tokens[i - 1]) => {
                    return Some("*".to_string());
                }
                _ => {}
            }
        }

        None
    }
}

/// Classify with no column restrictions.
pub fn classify(raw: &str) -> Statement {
    Safety::new().classify(raw)
}

fn leading_keyword(sql: &str) -> &str {
    let end = sql
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(sql.len());
    &sql[..end]
}

// `*` is a projection after SELECT/DISTINCT/ALL, a comma or a `table.`;
// after `(` it's COUNT(*), after an operand it's multiplication
fn is_wildcard(prev: &Token<'_>) -> bool {
    match prev.kind {
        Kind::Symbol(',') | Kind::Symbol('.') => true,
        Kind::Word(w) => ["select", "distinct", "all"]
            .iter()
            .any(|kw| w.eq_ignore_ascii_case(kw)),
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind<'a> {
    /// bare or backtick-quoted identifier, keyword or number
    Word(&'a str),
    /// string literal, contents ignored
    Literal,
    Symbol(char),
}

#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    kind: Kind<'a>,
    start: usize,
}

// mysql-flavored lexing: '...' and "..." are strings with backslash escapes,
// `...` is a quoted identifier. any comment form is refused outright.
fn tokenize(sql: &str) -> Result<Vec<Token<'_>>, Rejection> {
    let bytes = sql.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let next = bytes.get(i + 1).copied();

        match c {
            b'#' => return Err(Rejection::Comment),
            b'-' if next == Some(b'-') => return Err(Rejection::Comment),
            b'/' if next == Some(b'*') => return Err(Rejection::Comment),
            b'\'' | b'"' => {
                let end = closing_quote(bytes, i, c, true)?;
                tokens.push(Token {
                    kind: Kind::Literal,
                    start: i,
                });
                i = end + 1;
            }
            b'`' => {
                let end = closing_quote(bytes, i, c, false)?;
                tokens.push(Token {
                    kind: Kind::Word(&sql[i + 1..end]),
                    start: i,
                });
                i = end + 1;
            }
            c if c.is_ascii_alphanumeric() || c == b'_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Token {
                    kind: Kind::Word(&sql[start..i]),
                    start,
                });
            }
            c if c.is_ascii_whitespace() => i += 1,
            _ => {
                // multi-byte chars outside literals are symbols too
                let ch = sql[i..].chars().next().unwrap_or('\u{fffd}');
                tokens.push(Token {
                    kind: Kind::Symbol(ch),
                    start: i,
                });
                i += ch.len_utf8();
            }
        }
    }

    Ok(tokens)
}

// index of the quote closing the one at `open`; doubled quotes stay inside
fn closing_quote(bytes: &[u8], open: usize, quote: u8, escapes: bool) -> Result<usize, Rejection> {
    let mut i = open + 1;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' if escapes => i += 2,
            b if b == quote && bytes.get(i + 1) == Some(&quote) => i += 2,
            b if b == quote => return Ok(i),
            _ => i += 1,
        }
    }

    Err(Rejection::UnterminatedLiteral)
}
