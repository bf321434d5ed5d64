//! A small CSS selector engine covering what host-page lookups need.
//!
//! Supported: type and universal selectors, `#id`, `.class`, `[attr]`,
//! `[attr=value]`, descendant and child (`>`) combinators, and comma lists.

use crate::Document;
use anyhow::{Error, anyhow};
use indextree::NodeId;

#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrMatcher {
    Exists(String),
    Equals(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatcher>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none() && self.id.is_none() && self.classes.is_empty() && self.attrs.is_empty()
    }

    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        let Some(data) = doc.node(node) else {
            return false;
        };
        let Some(tag) = data.tag() else {
            return false;
        };
        if self.tag.as_deref().is_some_and(|wanted| wanted != tag) {
            return false;
        }
        if let Some(id) = &self.id
            && data.attr("id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.iter().all(|class| data.has_class(class)) {
            return false;
        }
        self.attrs.iter().all(|matcher| match matcher {
            AttrMatcher::Exists(name) => data.has_attr(name),
            AttrMatcher::Equals(name, value) => data.attr(name) == Some(value.as_str()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

/// Compounds left to right; `combinators[i]` joins `compounds[i]` and `compounds[i + 1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    compounds: Vec<Compound>,
    combinators: Vec<Combinator>,
}

impl Complex {
    fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.compounds
            .len()
            .checked_sub(1)
            .is_some_and(|last| self.match_at(doc, node, last))
    }

    fn match_at(&self, doc: &Document, node: NodeId, index: usize) -> bool {
        let Some(compound) = self.compounds.get(index) else {
            return false;
        };
        if !compound.matches(doc, node) {
            return false;
        }
        let Some(previous) = index.checked_sub(1) else {
            return true;
        };
        match self.combinators.get(previous) {
            Some(Combinator::Child) => doc
                .parent_element(node)
                .is_some_and(|parent| self.match_at(doc, parent, previous)),
            Some(Combinator::Descendant) => {
                let mut current = doc.parent_element(node);
                while let Some(ancestor) = current {
                    if self.match_at(doc, ancestor, previous) {
                        return true;
                    }
                    current = doc.parent_element(ancestor);
                }
                false
            }
            None => false,
        }
    }
}

/// A parsed selector list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    alternatives: Vec<Complex>,
}

impl Selector {
    /// Parse a selector list.
    ///
    /// # Errors
    /// Returns an error for empty input or syntax outside the supported subset.
    pub fn parse(source: &str) -> Result<Self, Error> {
        let mut parser = SelectorParser::new(source);
        let alternatives = parser.parse_list()?;
        Ok(Self {
            source: source.to_owned(),
            alternatives,
        })
    }

    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Whether the element `node` matches any alternative of this selector.
    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.alternatives
            .iter()
            .any(|complex| complex.matches(doc, node))
    }
}

struct SelectorParser<'source> {
    source: &'source str,
    chars: Vec<char>,
    pos: usize,
}

impl<'source> SelectorParser<'source> {
    fn new(source: &'source str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let current = self.peek()?;
        self.pos += 1;
        Some(current)
    }

    fn skip_whitespace(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos > start
    }

    fn error(&self, what: &str) -> Error {
        anyhow!(
            "Invalid selector {:?} at offset {}: {what}",
            self.source,
            self.pos
        )
    }

    fn parse_list(&mut self) -> Result<Vec<Complex>, Error> {
        let mut alternatives = vec![self.parse_complex()?];
        while self.peek() == Some(',') {
            self.pos += 1;
            alternatives.push(self.parse_complex()?);
        }
        if self.peek().is_some() {
            return Err(self.error("unexpected character"));
        }
        Ok(alternatives)
    }

    fn parse_complex(&mut self) -> Result<Complex, Error> {
        self.skip_whitespace();
        let mut compounds = vec![self.parse_compound()?];
        let mut combinators = Vec::new();
        loop {
            let had_space = self.skip_whitespace();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_whitespace();
                    Combinator::Child
                }
                Some(_) if had_space => Combinator::Descendant,
                Some(_) => return Err(self.error("expected combinator")),
            };
            combinators.push(combinator);
            compounds.push(self.parse_compound()?);
        }
        Ok(Complex {
            compounds,
            combinators,
        })
    }

    fn parse_compound(&mut self) -> Result<Compound, Error> {
        let mut compound = Compound::default();
        let mut universal = false;
        if self.peek() == Some('*') {
            self.pos += 1;
            universal = true;
        } else if self.peek().is_some_and(is_ident_char) {
            compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.pos += 1;
                    compound.id = Some(self.parse_ident()?);
                }
                Some('.') => {
                    self.pos += 1;
                    compound.classes.push(self.parse_ident()?);
                }
                Some('[') => {
                    self.pos += 1;
                    compound.attrs.push(self.parse_attr()?);
                }
                _ => break,
            }
        }
        if compound.is_empty() && !universal {
            return Err(self.error("expected a simple selector"));
        }
        Ok(compound)
    }

    fn parse_attr(&mut self) -> Result<AttrMatcher, Error> {
        self.skip_whitespace();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_whitespace();
        match self.bump() {
            Some(']') => Ok(AttrMatcher::Exists(name)),
            Some('=') => {
                self.skip_whitespace();
                let value = match self.peek() {
                    Some(quote @ ('"' | '\'')) => {
                        self.pos += 1;
                        let mut value = String::new();
                        loop {
                            match self.bump() {
                                Some(current) if current == quote => break,
                                Some(current) => value.push(current),
                                None => return Err(self.error("unterminated string")),
                            }
                        }
                        value
                    }
                    _ => self.parse_ident()?,
                };
                self.skip_whitespace();
                if self.bump() != Some(']') {
                    return Err(self.error("expected ']'"));
                }
                Ok(AttrMatcher::Equals(name, value))
            }
            _ => Err(self.error("expected ']' or '='")),
        }
    }

    fn parse_ident(&mut self) -> Result<String, Error> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if self.pos == start {
            return Err(self.error("expected identifier"));
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }
}

fn is_ident_char(current: char) -> bool {
    current.is_alphanumeric() || current == '-' || current == '_'
}
