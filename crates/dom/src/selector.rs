//! CSS selector parsing and matching
//!
//! Supported grammar (enough for a selection utility, not a style engine):
//!
//! ```text
//! list      := complex ( ',' complex )*
//! complex   := compound ( combinator compound )*
//! combinator:= ' ' | '>' | '+' | '~'
//! compound  := ( '*' | ident )? ( '#'id | '.'class | '[' attr ']' | ':'pseudo )*
//! attr      := name ( op value 'i'? )?      op := = ~= |= ^= $= *=
//! pseudo    := first-child | last-child | only-child | empty
//! ```
//!
//! Matching runs right-to-left: the rightmost compound is tested against the
//! candidate, then combinators walk towards ancestors and previous siblings.

use std::str::FromStr;

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{DomNode, NodeId, NodeType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
    NextSibling,
    SubsequentSibling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrOp {
    /// `=`
    Equals,
    /// `~=` whitespace-separated word
    Includes,
    /// `|=` exact or followed by `-`
    DashMatch,
    /// `^=`
    Prefix,
    /// `$=`
    Suffix,
    /// `*=`
    Substring,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    FirstChild,
    LastChild,
    OnlyChild,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SimpleSelector {
    Id(String),
    Class(String),
    Attribute {
        name: String,
        op: Option<AttrOp>,
        value: String,
        case_insensitive: bool,
    },
    Pseudo(Pseudo),
}

/// Type selector plus any number of simple selectors, no combinators
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    /// `None` is the universal selector
    pub tag: Option<String>,
    pub simple: Vec<SimpleSelector>,
}

/// `parts[i]` and `parts[i + 1]` are joined by `combinators[i]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplexSelector {
    pub parts: Vec<Compound>,
    pub combinators: Vec<Combinator>,
}

/// Comma-separated selector list, the unit `querySelectorAll` accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    pub selectors: Vec<ComplexSelector>,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self> {
        Parser::new(input).parse_list()
    }

    /// Does the element match any selector of the list
    pub fn matches(&self, arena: &DomArena, node_id: NodeId) -> Result<bool> {
        for complex in &self.selectors {
            let last = complex.parts.len() - 1;
            if match_at(arena, complex, last, node_id)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Matching element descendants of `scope` in document order
    pub fn query(&self, arena: &DomArena, scope: NodeId) -> Result<Vec<NodeId>> {
        let mut matched = Vec::new();
        for node_id in arena.descendants(scope)? {
            if arena.get(node_id)?.is_element() && self.matches(arena, node_id)? {
                matched.push(node_id);
            }
        }
        Ok(matched)
    }
}

impl FromStr for SelectorList {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

fn match_at(
    arena: &DomArena,
    complex: &ComplexSelector,
    index: usize,
    node_id: NodeId,
) -> Result<bool> {
    if !compound_matches(arena, &complex.parts[index], arena.get(node_id)?)? {
        return Ok(false);
    }
    if index == 0 {
        return Ok(true);
    }

    let next = index - 1;
    match complex.combinators[next] {
        Combinator::Child => match arena.get(node_id)?.parent_id {
            Some(parent_id) => match_at(arena, complex, next, parent_id),
            None => Ok(false),
        },
        Combinator::Descendant => {
            for ancestor in arena.ancestors(node_id)? {
                if match_at(arena, complex, next, ancestor)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Combinator::NextSibling => match preceding_elements(arena, node_id)?.last() {
            Some(&sibling) => match_at(arena, complex, next, sibling),
            None => Ok(false),
        },
        Combinator::SubsequentSibling => {
            for sibling in preceding_elements(arena, node_id)?.into_iter().rev() {
                if match_at(arena, complex, next, sibling)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
    }
}

/// Element siblings before `node_id`, in document order
fn preceding_elements(arena: &DomArena, node_id: NodeId) -> Result<Vec<NodeId>> {
    let Some(parent) = arena.parent(node_id)? else {
        return Ok(Vec::new());
    };
    let mut siblings = Vec::new();
    for &sibling in &parent.children_ids {
        if sibling == node_id {
            break;
        }
        if arena.get(sibling)?.is_element() {
            siblings.push(sibling);
        }
    }
    Ok(siblings)
}

/// Element siblings after `node_id`, in document order
fn following_elements(arena: &DomArena, node_id: NodeId) -> Result<Vec<NodeId>> {
    let Some(parent) = arena.parent(node_id)? else {
        return Ok(Vec::new());
    };
    let mut siblings = Vec::new();
    for &sibling in parent.children_ids.iter().skip_while(|&&id| id != node_id).skip(1) {
        if arena.get(sibling)?.is_element() {
            siblings.push(sibling);
        }
    }
    Ok(siblings)
}

fn compound_matches(arena: &DomArena, compound: &Compound, node: &DomNode) -> Result<bool> {
    if !node.is_element() {
        return Ok(false);
    }
    if let Some(tag) = &compound.tag {
        if !node.node_name.eq_ignore_ascii_case(tag) {
            return Ok(false);
        }
    }

    for simple in &compound.simple {
        let ok = match simple {
            SimpleSelector::Id(id) => node.attr("id") == Some(id.as_str()),
            SimpleSelector::Class(class) => node.has_class(class),
            SimpleSelector::Attribute {
                name,
                op,
                value,
                case_insensitive,
            } => match node.attr(name) {
                None => false,
                Some(actual) => match op {
                    None => true,
                    Some(op) => attr_value_matches(*op, actual, value, *case_insensitive),
                },
            },
            SimpleSelector::Pseudo(Pseudo::FirstChild) => {
                preceding_elements(arena, node.node_id)?.is_empty()
            }
            SimpleSelector::Pseudo(Pseudo::LastChild) => {
                following_elements(arena, node.node_id)?.is_empty()
            }
            SimpleSelector::Pseudo(Pseudo::OnlyChild) => {
                preceding_elements(arena, node.node_id)?.is_empty()
                    && following_elements(arena, node.node_id)?.is_empty()
            }
            SimpleSelector::Pseudo(Pseudo::Empty) => {
                let mut empty = true;
                for child in arena.children(node.node_id)? {
                    if child.is_element()
                        || (child.node_type == NodeType::Text && !child.node_value.is_empty())
                    {
                        empty = false;
                        break;
                    }
                }
                empty
            }
        };
        if !ok {
            return Ok(false);
        }
    }

    Ok(true)
}

fn attr_value_matches(op: AttrOp, actual: &str, expected: &str, case_insensitive: bool) -> bool {
    let (actual, expected) = if case_insensitive {
        (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
    } else {
        (actual.to_string(), expected.to_string())
    };

    match op {
        AttrOp::Equals => actual == expected,
        AttrOp::Includes => {
            !expected.is_empty() && actual.split_ascii_whitespace().any(|w| w == expected)
        }
        AttrOp::DashMatch => {
            actual == expected
                || (actual.starts_with(&expected) && actual[expected.len()..].starts_with('-'))
        }
        // Empty operands never match for the substring family
        AttrOp::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttrOp::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttrOp::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn error(&self, reason: impl Into<String>) -> DomError {
        DomError::InvalidSelector {
            selector: self.input.to_string(),
            reason: reason.into(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, expected: char) -> bool {
        if self.peek() == Some(expected) {
            self.pos += expected.len_utf8();
            true
        } else {
            false
        }
    }

    /// Skip whitespace, report whether any was skipped
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
        self.pos != start
    }

    fn parse_list(&mut self) -> Result<SelectorList> {
        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            selectors.push(self.parse_complex()?);
            self.skip_ws();
            match self.bump() {
                None => break,
                Some(',') => continue,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            }
        }
        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector> {
        let mut parts = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                Some('>') => Combinator::Child,
                Some('+') => Combinator::NextSibling,
                Some('~') => Combinator::SubsequentSibling,
                None | Some(',') => break,
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(self.error(format!("unexpected '{}'", c))),
            };
            if combinator != Combinator::Descendant {
                self.bump();
                self.skip_ws();
            }
            combinators.push(combinator);
            parts.push(self.parse_compound()?);
        }

        Ok(ComplexSelector { parts, combinators })
    }

    fn parse_compound(&mut self) -> Result<Compound> {
        let mut compound = Compound::default();
        let mut any = false;

        if self.eat('*') {
            any = true;
        } else if matches!(self.peek(), Some(c) if is_ident_start(c)) {
            compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
            any = true;
        }

        loop {
            match self.peek() {
                Some('#') => {
                    self.bump();
                    compound.simple.push(SimpleSelector::Id(self.parse_ident()?));
                }
                Some('.') => {
                    self.bump();
                    compound.simple.push(SimpleSelector::Class(self.parse_ident()?));
                }
                Some('[') => {
                    self.bump();
                    compound.simple.push(self.parse_attribute()?);
                }
                Some(':') => {
                    self.bump();
                    let name = self.parse_ident()?.to_ascii_lowercase();
                    let pseudo = match name.as_str() {
                        "first-child" => Pseudo::FirstChild,
                        "last-child" => Pseudo::LastChild,
                        "only-child" => Pseudo::OnlyChild,
                        "empty" => Pseudo::Empty,
                        other => {
                            return Err(self.error(format!("unsupported pseudo-class ':{}'", other)))
                        }
                    };
                    compound.simple.push(SimpleSelector::Pseudo(pseudo));
                }
                _ => break,
            }
            any = true;
        }

        if !any {
            return Err(match self.peek() {
                Some(c) => self.error(format!("expected selector, found '{}'", c)),
                None => self.error("expected selector, found end of input"),
            });
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if is_ident_char(c)) {
            self.bump();
        }
        if self.pos == start {
            return Err(self.error(format!("expected identifier at byte {}", start)));
        }
        Ok(self.input[start..self.pos].to_string())
    }

    fn parse_attribute(&mut self) -> Result<SimpleSelector> {
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();

        if self.eat(']') {
            return Ok(SimpleSelector::Attribute {
                name,
                op: None,
                value: String::new(),
                case_insensitive: false,
            });
        }

        let op = match self.bump() {
            Some('=') => AttrOp::Equals,
            Some(c @ ('~' | '|' | '^' | '$' | '*')) => {
                if !self.eat('=') {
                    return Err(self.error(format!("expected '=' after '{}'", c)));
                }
                match c {
                    '~' => AttrOp::Includes,
                    '|' => AttrOp::DashMatch,
                    '^' => AttrOp::Prefix,
                    '$' => AttrOp::Suffix,
                    _ => AttrOp::Substring,
                }
            }
            _ => return Err(self.error("malformed attribute selector")),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.bump();
                let start = self.pos;
                loop {
                    match self.bump() {
                        Some(c) if c == quote => break,
                        Some(_) => {}
                        None => return Err(self.error("unterminated string")),
                    }
                }
                self.input[start..self.pos - 1].to_string()
            }
            _ => self.parse_ident()?,
        };

        self.skip_ws();
        let case_insensitive = self.eat('i') || self.eat('I');
        self.skip_ws();
        if !self.eat(']') {
            return Err(self.error("expected ']'"));
        }

        Ok(SimpleSelector::Attribute {
            name,
            op: Some(op),
            value,
            case_insensitive,
        })
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_' || c == '-' || !c.is_ascii()
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || !c.is_ascii()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markup;

    fn doc(html: &str) -> (DomArena, NodeId) {
        let mut arena = DomArena::new();
        let root = arena.add_node(DomNode::document(0));
        arena.set_root(root).unwrap();
        markup::parse_fragment(&mut arena, root, html).unwrap();
        (arena, root)
    }

    fn ids(arena: &DomArena, root: NodeId, selector: &str) -> Vec<String> {
        SelectorList::parse(selector)
            .unwrap()
            .query(arena, root)
            .unwrap()
            .into_iter()
            .map(|id| arena.get(id).unwrap().attr("id").unwrap_or("?").to_string())
            .collect()
    }

    const PAGE: &str = r#"
        <div id="a" class="box main">
          <p id="b" class="lead">one</p>
          <p id="c" lang="en-US">two</p>
          <span id="d" data-kind="primary button"></span>
        </div>
        <section id="e"><p id="f"></p></section>
    "#;

    #[test]
    fn test_type_class_and_id() {
        let (arena, root) = doc(PAGE);

        assert_eq!(ids(&arena, root, "p"), vec!["b", "c", "f"]);
        assert_eq!(ids(&arena, root, ".lead"), vec!["b"]);
        assert_eq!(ids(&arena, root, "div.box.main"), vec!["a"]);
        assert_eq!(ids(&arena, root, "#e"), vec!["e"]);
        assert_eq!(ids(&arena, root, "*").len(), 6);
        assert!(ids(&arena, root, "div.missing").is_empty());
    }

    #[test]
    fn test_combinators() {
        let (arena, root) = doc(PAGE);

        assert_eq!(ids(&arena, root, "div p"), vec!["b", "c"]);
        assert_eq!(ids(&arena, root, "section > p"), vec!["f"]);
        assert_eq!(ids(&arena, root, "#b + p"), vec!["c"]);
        assert_eq!(ids(&arena, root, "#b ~ *"), vec!["c", "d"]);
        assert_eq!(ids(&arena, root, "div + section"), vec!["e"]);
    }

    #[test]
    fn test_list_keeps_document_order() {
        let (arena, root) = doc(PAGE);

        assert_eq!(ids(&arena, root, "#f, #a, p.lead"), vec!["a", "b", "f"]);
    }

    #[test]
    fn test_attribute_operators() {
        let (arena, root) = doc(PAGE);

        assert_eq!(ids(&arena, root, "[lang]"), vec!["c"]);
        assert_eq!(ids(&arena, root, "[lang|=en]"), vec!["c"]);
        assert_eq!(ids(&arena, root, "[lang='en-us' i]"), vec!["c"]);
        assert_eq!(ids(&arena, root, "[data-kind~=button]"), vec!["d"]);
        assert_eq!(ids(&arena, root, "[data-kind^=\"prim\"]"), vec!["d"]);
        assert_eq!(ids(&arena, root, "[data-kind$=ton]"), vec!["d"]);
        assert_eq!(ids(&arena, root, "[data-kind*=ary]"), vec!["d"]);
        assert!(ids(&arena, root, "[data-kind^='']").is_empty());
    }

    #[test]
    fn test_structural_pseudo_classes() {
        let (arena, root) = doc(PAGE);

        assert_eq!(ids(&arena, root, "div > :first-child"), vec!["b"]);
        assert_eq!(ids(&arena, root, "div > :last-child"), vec!["d"]);
        assert_eq!(ids(&arena, root, "p:only-child"), vec!["f"]);
        assert_eq!(ids(&arena, root, ":empty"), vec!["d", "f"]);
    }

    #[test]
    fn test_invalid_selectors() {
        for bad in ["", "  ", "div >", "p,", "[x", "[x=]", "a:hover", "#", "..x", "p !"] {
            let err = SelectorList::parse(bad).unwrap_err();
            assert!(
                matches!(err, DomError::InvalidSelector { .. }),
                "expected error for {:?}",
                bad
            );
        }
    }
}
