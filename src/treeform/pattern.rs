//! Content pattern templates and their regex compilation
//!
//! Node definitions describe the allowed title and data text of a node with a
//! small template language. A template is matched against the whole target
//! string; there is no partial or fuzzy matching.
//!
//! Template syntax:
//!
//! ```text
//! Hello            literal text, must appear verbatim
//! <name>           free-text capture, one or more characters
//! <#>              integer (optional leading minus, one or more digits)
//! [ ... ]          literal bracket group; brackets appear verbatim in the
//!                  target, the content is a sub-pattern (groups may nest)
//! $[ ... ]         repeating bracket group: one or more occurrences,
//! [$ ... ]         successive occurrences separated by a literal comma
//!                  (both spellings are accepted)
//! ```
//!
//! Example, an image region list:
//!
//! ```text
//! template:  <imagefile>[$<#>,<#>,<#>,<#>]
//! matches:   bg.png[10,20,300,200]
//! matches:   bg.png[10,20,300,200],[0,0,50,50]
//! rejects:   bg.png[10,20,300]
//! ```
//!
//! Templates are parsed once into a [PatternPart] tree and translated into a
//! single anchored regex. Matching is then one `is_match` call per target.
//! Syntax errors in a template are authoring errors and surface at schema
//! construction time, never while verifying a file.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;

/// Capture names that may become regex named groups
static GROUP_NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("group name regex"));

/// Errors raised while parsing a pattern template
#[derive(Debug, Clone, PartialEq)]
pub enum PatternError {
    /// A `<` placeholder was never closed
    UnclosedPlaceholder(String),
    /// A `<>` placeholder with no name
    EmptyPlaceholder(String),
    /// A `[` group was never closed
    UnclosedGroup(String),
    /// A `]` with no matching `[`
    UnexpectedClose(String),
    /// The generated regex failed to compile
    Regex(String),
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::UnclosedPlaceholder(t) => {
                write!(f, "Unclosed '<' placeholder in pattern: {}", t)
            }
            PatternError::EmptyPlaceholder(t) => {
                write!(f, "Empty '<>' placeholder in pattern: {}", t)
            }
            PatternError::UnclosedGroup(t) => write!(f, "Unclosed '[' group in pattern: {}", t),
            PatternError::UnexpectedClose(t) => {
                write!(f, "']' without matching '[' in pattern: {}", t)
            }
            PatternError::Regex(msg) => write!(f, "Generated regex failed to compile: {}", msg),
        }
    }
}

impl std::error::Error for PatternError {}

/// One element of a parsed pattern template
#[derive(Debug, Clone, PartialEq)]
pub enum PatternPart {
    /// A run of ordinary characters, matched verbatim
    Literal(String),
    /// `<name>`: free-text capture, one or more characters
    Capture(String),
    /// `<#>`: an integer
    Number,
    /// `[...]` or `$[...]`: a literal bracket group with a sub-pattern inside
    Group {
        parts: Vec<PatternPart>,
        repeats: bool,
    },
}

/// A compiled content pattern: template source, parsed parts, anchored regex
#[derive(Debug, Clone)]
pub struct ContentPattern {
    source: String,
    parts: Vec<PatternPart>,
    regex: Regex,
}

impl ContentPattern {
    /// Parse and compile a template.
    ///
    /// The empty template is valid and matches only the empty string.
    pub fn compile(template: &str) -> Result<Self, PatternError> {
        let parts = Parser::new(template).parse()?;
        let regex = build_regex(&parts).map_err(|e| PatternError::Regex(e.to_string()))?;
        Ok(ContentPattern {
            source: template.to_string(),
            parts,
            regex,
        })
    }

    /// Test a target string against the pattern. The whole string must match.
    pub fn matches(&self, target: &str) -> bool {
        self.regex.is_match(target)
    }

    /// The original template source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The parsed parts of the template
    pub fn parts(&self) -> &[PatternPart] {
        &self.parts
    }

    /// Extract named capture values from a matching target.
    ///
    /// Returns `None` when the target does not match. Only the first
    /// occurrence of a capture name yields a regex group; repeated names
    /// match positionally but are not extracted.
    pub fn captures<'t>(&self, target: &'t str) -> Option<Vec<(String, &'t str)>> {
        let caps = self.regex.captures(target)?;
        let mut values = Vec::new();
        for name in self.regex.capture_names().flatten() {
            if let Some(m) = caps.name(name) {
                values.push((name.to_string(), m.as_str()));
            }
        }
        Some(values)
    }
}

impl PartialEq for ContentPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// Recursive descent parser over the template text
struct Parser<'a> {
    template: &'a str,
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> Parser<'a> {
    fn new(template: &'a str) -> Self {
        Parser {
            template,
            chars: template.chars().peekable(),
        }
    }

    fn parse(mut self) -> Result<Vec<PatternPart>, PatternError> {
        self.parse_seq(false)
    }

    /// Parse a part sequence until end of input, or until the closing `]`
    /// of the enclosing group when `in_group` is set.
    fn parse_seq(&mut self, in_group: bool) -> Result<Vec<PatternPart>, PatternError> {
        let mut parts = Vec::new();
        let mut literal = String::new();

        while let Some(&c) = self.chars.peek() {
            match c {
                ']' => {
                    if in_group {
                        self.chars.next();
                        flush_literal(&mut literal, &mut parts);
                        return Ok(parts);
                    }
                    return Err(PatternError::UnexpectedClose(self.template.to_string()));
                }
                '[' => {
                    self.chars.next();
                    flush_literal(&mut literal, &mut parts);
                    parts.push(self.parse_group()?);
                }
                '$' => {
                    self.chars.next();
                    if self.chars.peek() == Some(&'[') {
                        self.chars.next();
                        flush_literal(&mut literal, &mut parts);
                        let group = self.parse_group_body(true)?;
                        parts.push(group);
                    } else {
                        // A '$' not tied to a group is ordinary text
                        literal.push('$');
                    }
                }
                '<' => {
                    self.chars.next();
                    flush_literal(&mut literal, &mut parts);
                    parts.push(self.parse_placeholder()?);
                }
                _ => {
                    self.chars.next();
                    literal.push(c);
                }
            }
        }

        if in_group {
            return Err(PatternError::UnclosedGroup(self.template.to_string()));
        }
        flush_literal(&mut literal, &mut parts);
        Ok(parts)
    }

    /// Parse a group whose `[` has been consumed. A leading `$` in the
    /// content marks the group as repeating (the `[$...]` spelling).
    fn parse_group(&mut self) -> Result<PatternPart, PatternError> {
        let repeats = if self.chars.peek() == Some(&'$') {
            self.chars.next();
            true
        } else {
            false
        };
        self.parse_group_body(repeats)
    }

    fn parse_group_body(&mut self, repeats: bool) -> Result<PatternPart, PatternError> {
        let parts = self.parse_seq(true)?;
        Ok(PatternPart::Group { parts, repeats })
    }

    /// Parse a `<...>` placeholder whose `<` has been consumed
    fn parse_placeholder(&mut self) -> Result<PatternPart, PatternError> {
        let mut name = String::new();
        for c in self.chars.by_ref() {
            if c == '>' {
                if name.is_empty() {
                    return Err(PatternError::EmptyPlaceholder(self.template.to_string()));
                }
                if name == "#" {
                    return Ok(PatternPart::Number);
                }
                return Ok(PatternPart::Capture(name));
            }
            name.push(c);
        }
        Err(PatternError::UnclosedPlaceholder(self.template.to_string()))
    }
}

fn flush_literal(literal: &mut String, parts: &mut Vec<PatternPart>) {
    if !literal.is_empty() {
        parts.push(PatternPart::Literal(std::mem::take(literal)));
    }
}

/// Translate parsed parts into one anchored regex
fn build_regex(parts: &[PatternPart]) -> Result<Regex, regex::Error> {
    let mut expr = String::from("^");
    let mut used_names = HashSet::new();
    for part in parts {
        push_part(part, &mut expr, &mut used_names);
    }
    expr.push('$');
    Regex::new(&expr)
}

fn push_part(part: &PatternPart, expr: &mut String, used_names: &mut HashSet<String>) {
    match part {
        PatternPart::Literal(text) => expr.push_str(&regex::escape(text)),
        PatternPart::Capture(name) => {
            if GROUP_NAME_RE.is_match(name) && used_names.insert(name.clone()) {
                expr.push_str("(?P<");
                expr.push_str(name);
                expr.push_str(">.+?)");
            } else {
                expr.push_str("(?:.+?)");
            }
        }
        PatternPart::Number => expr.push_str(r"(?:-?\d+)"),
        PatternPart::Group { parts, repeats } => {
            let mut body = String::from(r"\[");
            for inner in parts {
                push_part(inner, &mut body, used_names);
            }
            body.push_str(r"\]");
            if *repeats {
                expr.push_str("(?:");
                expr.push_str(&body);
                expr.push_str(")(?:,(?:");
                expr.push_str(&body);
                expr.push_str("))*");
            } else {
                expr.push_str(&body);
            }
        }
    }
}
