//! Parameterized equality queries
//!
//! Two surface forms compile to the same filter:
//!
//! ```text
//! SELECT * FROM c WHERE c.myPartitionKey = @pk AND c.name = @name
//! name = @name AND childObject.someProperty = @prop
//! ```
//!
//! A filter is a conjunction of `field = @param` clauses (either side may
//! hold the parameter). Parameters are bound by a [`QueryDefinition`] and
//! resolved at compile time, so evaluation never fails.

use quire_core::{get_at_path, json_equals, JsonPath, JsonValue, PartitionKey, QuireError, QuireResult};
use std::collections::HashMap;
use std::fmt;

/// Query text plus parameter bindings
///
/// ```
/// use quire_engine::QueryDefinition;
///
/// let query = QueryDefinition::new("SELECT * FROM c WHERE c.name = @name")
///     .with_parameter("@name", "Alex Turner");
/// assert_eq!(query.parameters().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryDefinition {
    text: String,
    parameters: Vec<(String, JsonValue)>,
}

impl QueryDefinition {
    /// Query with no parameters bound
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            parameters: Vec::new(),
        }
    }

    /// Bind a parameter; the name may be given with or without `@`
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.parameters.push((name.into(), value.into()));
        self
    }

    /// Query text
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Bound parameters in binding order
    pub fn parameters(&self) -> &[(String, JsonValue)] {
        &self.parameters
    }

    /// Parse and bind into an executable filter
    pub fn compile(&self) -> QuireResult<CompiledQuery> {
        let bindings: HashMap<&str, &serde_json::Value> = self
            .parameters
            .iter()
            .map(|(name, value)| (name.trim_start_matches('@'), value.as_inner()))
            .collect();
        let parsed = Parser::new(lex(&self.text)?).parse()?;
        let clauses = parsed
            .into_iter()
            .map(|(field, param)| -> QuireResult<Clause> {
                let value = bindings.get(param.as_str()).ok_or_else(|| {
                    QuireError::invalid_query(format!("parameter '@{}' is not bound", param))
                })?;
                Ok(Clause {
                    field,
                    value: (*value).clone(),
                })
            })
            .collect::<QuireResult<Vec<_>>>()?;
        Ok(CompiledQuery { clauses })
    }
}

/// Scope and paging for a query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOptions {
    /// Run in this partition only
    pub partition_key: Option<PartitionKey>,
    /// Documents per page; the container default applies when unset
    pub max_item_count: Option<usize>,
}

impl QueryOptions {
    /// Options with no scope and default paging
    pub fn new() -> Self {
        Self::default()
    }

    /// Scope to one partition
    pub fn with_partition_key(mut self, key: impl Into<PartitionKey>) -> Self {
        self.partition_key = Some(key.into());
        self
    }

    /// Set the page size
    pub fn with_max_item_count(mut self, count: usize) -> Self {
        self.max_item_count = Some(count);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Clause {
    field: JsonPath,
    value: serde_json::Value,
}

/// A bound, ready-to-run filter
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    clauses: Vec<Clause>,
}

impl CompiledQuery {
    /// Filter matching every document
    pub fn match_all() -> Self {
        Self { clauses: Vec::new() }
    }

    /// Number of clauses
    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    /// True if the filter has no clauses
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// True if `body` satisfies every clause
    ///
    /// A clause on a missing field never matches.
    pub fn matches(&self, body: &serde_json::Value) -> bool {
        self.clauses.iter().all(|clause| {
            get_at_path(body, &clause.field).map_or(false, |found| json_equals(found, &clause.value))
        })
    }

    /// Value the filter requires at `path`, if one clause pins it
    pub fn pinned(&self, path: &JsonPath) -> Option<&serde_json::Value> {
        self.clauses
            .iter()
            .find(|clause| &clause.field == path)
            .map(|clause| &clause.value)
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.clauses.is_empty() {
            return write!(f, "<all>");
        }
        for (i, clause) in self.clauses.iter().enumerate() {
            if i > 0 {
                write!(f, " AND ")?;
            }
            write!(f, "{} = {}", clause.field, clause.value)?;
        }
        Ok(())
    }
}

// ============================================================================
// Lexer
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Ident(String),
    Param(String),
    Star,
    Dot,
    Eq,
}

impl Token {
    fn is_keyword(&self, keyword: &str) -> bool {
        matches!(self, Token::Ident(word) if word.eq_ignore_ascii_case(keyword))
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(word) => write!(f, "'{}'", word),
            Token::Param(name) => write!(f, "'@{}'", name),
            Token::Star => write!(f, "'*'"),
            Token::Dot => write!(f, "'.'"),
            Token::Eq => write!(f, "'='"),
        }
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn lex(text: &str) -> QuireResult<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();
    while let Some((pos, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '*' => tokens.push(Token::Star),
            '.' => tokens.push(Token::Dot),
            '=' => tokens.push(Token::Eq),
            '@' => {
                let mut name = String::new();
                while let Some(&(_, c)) = chars.peek() {
                    if (name.is_empty() && !is_ident_start(c)) || !is_ident_char(c) {
                        break;
                    }
                    name.push(c);
                    chars.next();
                }
                if name.is_empty() {
                    return Err(QuireError::invalid_query(format!(
                        "expected parameter name after '@' at position {}",
                        pos
                    )));
                }
                tokens.push(Token::Param(name));
            }
            c if is_ident_start(c) => {
                let mut word = c.to_string();
                while let Some(&(_, c)) = chars.peek() {
                    if !is_ident_char(c) {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Ident(word));
            }
            other => {
                return Err(QuireError::invalid_query(format!(
                    "unexpected character '{}' at position {}",
                    other, pos
                )))
            }
        }
    }
    Ok(tokens)
}

// ============================================================================
// Parser
// ============================================================================

enum Operand {
    Field(Vec<String>),
    Param(String),
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    alias: Option<String>,
}

impl Parser {
    fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens,
            pos: 0,
            alias: None,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn unexpected(&self, expected: &str) -> QuireError {
        match self.peek() {
            Some(token) => QuireError::invalid_query(format!("expected {}, found {}", expected, token)),
            None => QuireError::invalid_query(format!("expected {}, found end of query", expected)),
        }
    }

    fn expect_keyword(&mut self, keyword: &str) -> QuireResult<()> {
        match self.peek() {
            Some(token) if token.is_keyword(keyword) => {
                self.pos += 1;
                Ok(())
            }
            _ => Err(self.unexpected(keyword)),
        }
    }

    fn expect_ident(&mut self, what: &str) -> QuireResult<String> {
        match self.peek() {
            Some(Token::Ident(word)) => {
                let word = word.clone();
                self.pos += 1;
                Ok(word)
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Parse the whole query into (field, parameter-name) pairs
    fn parse(mut self) -> QuireResult<Vec<(JsonPath, String)>> {
        let is_select = matches!(self.peek(), Some(t) if t.is_keyword("SELECT"))
            && self.tokens.get(self.pos + 1) == Some(&Token::Star);
        if !is_select {
            return self.parse_filter();
        }

        self.pos += 2;
        self.expect_keyword("FROM")?;
        let alias = self.expect_ident("container alias")?;
        if ["SELECT", "FROM", "WHERE", "AND"]
            .iter()
            .any(|kw| alias.eq_ignore_ascii_case(kw))
        {
            return Err(QuireError::invalid_query(format!(
                "'{}' cannot be used as a container alias",
                alias
            )));
        }
        self.alias = Some(alias);
        match self.peek() {
            None => Ok(Vec::new()),
            Some(token) if token.is_keyword("WHERE") => {
                self.pos += 1;
                if self.peek().is_none() {
                    return Err(self.unexpected("condition after WHERE"));
                }
                self.parse_filter()
            }
            Some(_) => Err(self.unexpected("WHERE or end of query")),
        }
    }

    fn parse_filter(&mut self) -> QuireResult<Vec<(JsonPath, String)>> {
        let mut clauses = Vec::new();
        if self.peek().is_none() {
            return Ok(clauses);
        }
        loop {
            clauses.push(self.parse_clause()?);
            match self.peek() {
                None => return Ok(clauses),
                Some(token) if token.is_keyword("AND") => {
                    self.pos += 1;
                }
                Some(_) => return Err(self.unexpected("AND or end of query")),
            }
        }
    }

    fn parse_clause(&mut self) -> QuireResult<(JsonPath, String)> {
        let left = self.parse_operand()?;
        if self.peek() != Some(&Token::Eq) {
            return Err(self.unexpected("'='"));
        }
        self.pos += 1;
        let right = self.parse_operand()?;
        let (segments, param) = match (left, right) {
            (Operand::Field(segments), Operand::Param(param))
            | (Operand::Param(param), Operand::Field(segments)) => (segments, param),
            (Operand::Field(_), Operand::Field(_)) => {
                return Err(QuireError::invalid_query(
                    "a clause must compare a field with a parameter, found two fields",
                ))
            }
            (Operand::Param(_), Operand::Param(_)) => {
                return Err(QuireError::invalid_query(
                    "a clause must compare a field with a parameter, found two parameters",
                ))
            }
        };
        Ok((self.resolve_field(segments)?, param))
    }

    fn parse_operand(&mut self) -> QuireResult<Operand> {
        match self.peek() {
            Some(Token::Param(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok(Operand::Param(name))
            }
            Some(Token::Ident(_)) => {
                let mut segments = vec![self.expect_ident("field name")?];
                while self.peek() == Some(&Token::Dot) {
                    self.pos += 1;
                    segments.push(self.expect_ident("field name after '.'")?);
                }
                Ok(Operand::Field(segments))
            }
            _ => Err(self.unexpected("field or parameter")),
        }
    }

    /// Strip the container alias in SELECT form
    fn resolve_field(&self, mut segments: Vec<String>) -> QuireResult<JsonPath> {
        if let Some(alias) = &self.alias {
            if segments.first() != Some(alias) {
                return Err(QuireError::invalid_query(format!(
                    "field '{}' must be qualified with alias '{}'",
                    segments.join("."),
                    alias
                )));
            }
            segments.remove(0);
            if segments.is_empty() {
                return Err(QuireError::invalid_query(format!(
                    "alias '{}' must be followed by a field name",
                    alias
                )));
            }
        }
        Ok(JsonPath::from_segments(segments))
    }
}
