//! HTML markup - fragment parser and serializer
//!
//! The parser is lenient in the way browsers are: unknown end tags are
//! dropped, unclosed elements are closed at end of input, and a `<` that
//! does not start a tag is plain text. The only hard failures are
//! constructs that never terminate (`<div`, `<!-- ...`).

use crate::arena::DomArena;
use crate::error::{DomError, Result};
use crate::types::{is_raw_text_element, is_void_element, DomNode, NodeId, NodeType};
use crate::utils::{decode_entities, escape_attr, escape_text};

/// Parse `html` and append the resulting nodes to `parent`
///
/// Returns the IDs of the nodes appended directly to `parent`.
pub fn parse_fragment(arena: &mut DomArena, parent: NodeId, html: &str) -> Result<Vec<NodeId>> {
    let mut parser = FragmentParser {
        arena,
        input: html,
        pos: 0,
        stack: vec![parent],
        top_level: Vec::new(),
    };
    parser.run()?;
    Ok(parser.top_level)
}

/// Serialize the children of a node (DOM `innerHTML`)
pub fn inner_html(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut output = String::new();
    let node = arena.get(node_id)?;
    let raw = node.tag_name().map(is_raw_text_element).unwrap_or(false);
    for &child_id in &node.children_ids {
        serialize_node(arena, child_id, raw, &mut output)?;
    }
    Ok(output)
}

/// Serialize a node including its own tag (DOM `outerHTML`)
pub fn outer_html(arena: &DomArena, node_id: NodeId) -> Result<String> {
    let mut output = String::new();
    serialize_node(arena, node_id, false, &mut output)?;
    Ok(output)
}

/// Serialize a single node recursively
///
/// `raw` is set for children of `script`/`style`, whose text is not escaped.
fn serialize_node(arena: &DomArena, node_id: NodeId, raw: bool, output: &mut String) -> Result<()> {
    let node = arena.get(node_id)?;

    match node.node_type {
        NodeType::Element => {
            output.push('<');
            output.push_str(&node.node_name);
            for attr in &node.attributes {
                output.push(' ');
                output.push_str(&attr.name);
                output.push_str("=\"");
                escape_attr(&attr.value, output);
                output.push('"');
            }
            output.push('>');

            if is_void_element(&node.node_name) {
                return Ok(());
            }

            let raw_children = is_raw_text_element(&node.node_name);
            for &child_id in &node.children_ids {
                serialize_node(arena, child_id, raw_children, output)?;
            }

            output.push_str("</");
            output.push_str(&node.node_name);
            output.push('>');
        }
        NodeType::Text if raw => output.push_str(&node.node_value),
        NodeType::Text | NodeType::CdataSection => escape_text(&node.node_value, output),
        NodeType::Comment => {
            output.push_str("<!--");
            output.push_str(&node.node_value);
            output.push_str("-->");
        }
        NodeType::DocumentType => {
            output.push_str("<!DOCTYPE ");
            output.push_str(&node.node_name);
            output.push('>');
        }
        NodeType::Document | NodeType::DocumentFragment => {
            for &child_id in &node.children_ids {
                serialize_node(arena, child_id, false, output)?;
            }
        }
        // Not representable in markup
        _ => {}
    }

    Ok(())
}

struct FragmentParser<'a> {
    arena: &'a mut DomArena,
    input: &'a str,
    pos: usize,
    /// Open elements; index 0 is the fragment parent and is never popped
    stack: Vec<NodeId>,
    top_level: Vec<NodeId>,
}

impl<'a> FragmentParser<'a> {
    fn error(&self, offset: usize, reason: &str) -> DomError {
        DomError::InvalidMarkup {
            offset,
            reason: reason.to_string(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn current(&self) -> NodeId {
        // stack[0] is never popped
        self.stack[self.stack.len() - 1]
    }

    fn append(&mut self, node: DomNode) -> Result<NodeId> {
        let parent = self.current();
        let id = self.arena.add_node(node);
        self.arena.append_child(parent, id)?;
        if self.stack.len() == 1 {
            self.top_level.push(id);
        }
        Ok(id)
    }

    fn run(&mut self) -> Result<()> {
        while self.pos < self.input.len() {
            let rest = self.rest();
            if rest.starts_with("<!--") {
                self.parse_comment()?;
            } else if rest.starts_with("<!") {
                self.parse_doctype()?;
            } else if rest.starts_with("</") && starts_tag_name(&rest[2..]) {
                self.parse_end_tag()?;
            } else if rest.starts_with('<') && starts_tag_name(&rest[1..]) {
                self.parse_start_tag()?;
            } else {
                self.parse_text()?;
            }
        }
        Ok(())
    }

    fn parse_text(&mut self) -> Result<()> {
        let rest = self.rest();
        // Skip the first byte: if it is '<' it did not start a tag
        let end = rest
            .char_indices()
            .skip(1)
            .find(|&(i, c)| c == '<' && starts_markup(&rest[i + 1..]))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());

        let text = decode_entities(&rest[..end]);
        self.pos += end;
        self.append(DomNode::text(0, text))?;
        Ok(())
    }

    fn parse_comment(&mut self) -> Result<()> {
        let start = self.pos;
        let body = &self.rest()[4..];
        let end = body
            .find("-->")
            .ok_or_else(|| self.error(start, "unterminated comment"))?;
        let value = body[..end].to_string();
        self.pos += 4 + end + 3;
        self.append(DomNode::comment(0, value))?;
        Ok(())
    }

    fn parse_doctype(&mut self) -> Result<()> {
        let start = self.pos;
        let rest = self.rest();
        let end = rest
            .find('>')
            .ok_or_else(|| self.error(start, "unterminated declaration"))?;
        let body = rest[2..end].trim();
        self.pos += end + 1;

        let Some(name) = body
            .get(..7)
            .filter(|kw| kw.eq_ignore_ascii_case("doctype"))
            .map(|_| body[7..].trim())
        else {
            // Other `<!...>` declarations carry nothing we keep
            return Ok(());
        };
        let name = if name.is_empty() { "html" } else { name };
        self.append(DomNode::new(0, NodeType::DocumentType, name.to_ascii_lowercase()))?;
        Ok(())
    }

    fn parse_end_tag(&mut self) -> Result<()> {
        let start = self.pos;
        let rest = self.rest();
        let end = rest
            .find('>')
            .ok_or_else(|| self.error(start, "unterminated end tag"))?;
        let name = rest[2..end].trim().to_ascii_lowercase();
        self.pos += end + 1;

        // Close up to the nearest matching open element, ignore strays
        let matching = self.stack.iter().skip(1).rposition(|&id| {
            self.arena
                .get(id)
                .map(|node| node.node_name == name)
                .unwrap_or(false)
        });
        if let Some(index) = matching {
            self.stack.truncate(index + 1);
        }
        Ok(())
    }

    fn parse_start_tag(&mut self) -> Result<()> {
        let start = self.pos;
        self.pos += 1;
        let name = self.take_while(|c| !c.is_whitespace() && c != '/' && c != '>');
        let mut element = DomNode::element(0, name);

        let self_closing = loop {
            self.take_while(char::is_whitespace);
            let rest = self.rest();
            if rest.is_empty() {
                return Err(self.error(start, "unterminated start tag"));
            }
            if rest.starts_with("/>") {
                self.pos += 2;
                break true;
            }
            if rest.starts_with('>') {
                self.pos += 1;
                break false;
            }
            if rest.starts_with('/') {
                self.pos += 1;
                continue;
            }

            let attr_name =
                self.take_while(|c| !c.is_whitespace() && c != '=' && c != '>' && c != '/');
            let attr_name = attr_name.to_ascii_lowercase();
            self.take_while(char::is_whitespace);

            let value = if self.rest().starts_with('=') {
                self.pos += 1;
                self.take_while(char::is_whitespace);
                self.parse_attr_value(start)?
            } else {
                String::new()
            };

            // Nameless attributes (`<div =x>`) are dropped; first occurrence wins
            if !attr_name.is_empty() && element.attr(&attr_name).is_none() {
                element.set_attr(&attr_name, value);
            }
        };

        let tag = element.node_name.clone();
        let id = self.append(element)?;

        if is_void_element(&tag) || self_closing {
            return Ok(());
        }
        if is_raw_text_element(&tag) {
            return self.parse_raw_text(id, &tag);
        }
        self.stack.push(id);
        Ok(())
    }

    fn parse_attr_value(&mut self, tag_start: usize) -> Result<String> {
        let rest = self.rest();
        match rest.chars().next() {
            Some(quote @ ('"' | '\'')) => {
                let end = rest[1..]
                    .find(quote)
                    .ok_or_else(|| self.error(tag_start, "unterminated attribute value"))?;
                let value = decode_entities(&rest[1..1 + end]);
                self.pos += end + 2;
                Ok(value)
            }
            _ => {
                let raw = self.take_while(|c| !c.is_whitespace() && c != '>');
                Ok(decode_entities(raw))
            }
        }
    }

    /// Everything up to `</tag` is a single undecoded text node
    fn parse_raw_text(&mut self, element: NodeId, tag: &str) -> Result<()> {
        let rest = self.rest();
        let lower = rest.to_ascii_lowercase();
        let close = format!("</{}", tag);
        let (text_end, resume) = match lower.find(&close) {
            Some(i) => {
                let gt = rest[i..].find('>').map(|g| i + g + 1).unwrap_or(rest.len());
                (i, gt)
            }
            None => (rest.len(), rest.len()),
        };

        if text_end > 0 {
            let text = self.arena.add_node(DomNode::text(0, &rest[..text_end]));
            self.arena.append_child(element, text)?;
        }
        self.pos += resume;
        Ok(())
    }

    fn take_while(&mut self, predicate: impl Fn(char) -> bool) -> &'a str {
        let rest = self.rest();
        let end = rest
            .char_indices()
            .find(|&(_, c)| !predicate(c))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        self.pos += end;
        &rest[..end]
    }
}

fn starts_tag_name(s: &str) -> bool {
    s.starts_with(|c: char| c.is_ascii_alphabetic())
}

/// Would a `<` followed by `s` start a markup construct
fn starts_markup(s: &str) -> bool {
    starts_tag_name(s) || s.starts_with('!') || (s.starts_with('/') && starts_tag_name(&s[1..]))
}
