//! Inline style declarations
//!
//! The `style` attribute is the single source of truth for inline styles:
//! reads parse it, writes rewrite it. An empty value means "unset", so a
//! declaration with an empty value never exists.

/// Map a script-style property name (`fontSize`) to its CSS form (`font-size`)
///
/// Names that are already dashed pass through lower-cased; custom
/// properties (`--brand-color`) are case-sensitive and kept verbatim.
pub fn normalize_property_name(name: &str) -> String {
    let name = name.trim();
    if name.starts_with("--") {
        return name.to_string();
    }
    if name == "cssFloat" {
        return "float".to_string();
    }
    if name.contains('-') {
        return name.to_ascii_lowercase();
    }

    let mut out = String::with_capacity(name.len() + 4);
    if name.starts_with("ms") && name[2..].starts_with(|c: char| c.is_ascii_uppercase()) {
        out.push('-');
    }
    for c in name.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Ordered list of `property: value` declarations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyleDeclarations {
    entries: Vec<(String, String)>,
}

impl StyleDeclarations {
    /// Parse the text of a `style` attribute
    ///
    /// Malformed declarations are skipped, as browsers do.
    pub fn parse(text: &str) -> Self {
        let mut decls = Self::default();
        for chunk in split_declarations(text) {
            let Some((name, value)) = chunk.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            if name.starts_with("--") {
                decls.set(name, value);
            } else {
                decls.set(&name.to_ascii_lowercase(), value);
            }
        }
        decls
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        let name = normalize_property_name(name);
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set a property; an empty value removes it
    ///
    /// A value that would not survive as one declaration (a top-level `;`,
    /// a brace, an unclosed quote or parenthesis) is rejected and the
    /// declarations are left unchanged. Returns whether anything was applied.
    pub fn set(&mut self, name: &str, value: &str) -> bool {
        let name = normalize_property_name(name);
        let value = value.trim();
        if value.is_empty() {
            self.entries.retain(|(n, _)| *n != name);
            return true;
        }
        if !is_single_value(value) {
            return false;
        }
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = value.to_string(),
            None => self.entries.push((name, value.to_string())),
        }
        true
    }

    pub fn remove(&mut self, name: &str) {
        self.set(name, "");
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Serialize back to attribute text: `color: red; font-size: 20px;`
    pub fn to_css_text(&self) -> String {
        self.entries
            .iter()
            .map(|(n, v)| format!("{}: {};", n, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Can `value` be written as the value of exactly one declaration
fn is_single_value(value: &str) -> bool {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for c in value.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';' | '{' | '}') if depth == 0 => return false,
            _ => {}
        }
    }
    quote.is_none() && depth == 0
}

/// Split on `;` outside of quotes and parentheses (`url(a;b)` stays whole)
fn split_declarations(text: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (i, c) in text.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                parts.push(&text[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&text[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_property_name() {
        assert_eq!(normalize_property_name("fontSize"), "font-size");
        assert_eq!(normalize_property_name("font-size"), "font-size");
        assert_eq!(normalize_property_name("cssFloat"), "float");
        assert_eq!(normalize_property_name("WebkitTransform"), "-webkit-transform");
        assert_eq!(normalize_property_name("msTransform"), "-ms-transform");
        assert_eq!(normalize_property_name("Font-Size"), "font-size");
        assert_eq!(normalize_property_name("--Brand"), "--Brand");
    }

    #[test]
    fn test_parse_and_serialize() {
        let decls = StyleDeclarations::parse(
            "color: red; background: url('a;b.png') ; ; bogus; font-size:20px",
        );

        assert_eq!(decls.len(), 3);
        assert_eq!(decls.get("backgroundImage"), None);
        assert_eq!(decls.get("background"), Some("url('a;b.png')"));
        assert_eq!(decls.get("fontSize"), Some("20px"));
        assert_eq!(
            decls.to_css_text(),
            "color: red; background: url('a;b.png'); font-size: 20px;"
        );
    }

    #[test]
    fn test_empty_value_unsets() {
        let mut decls = StyleDeclarations::parse("color: red; margin: 0");

        decls.set("color", "  ");
        assert_eq!(decls.get("color"), None);

        decls.set("margin", "4px");
        decls.remove("padding");
        assert_eq!(decls.to_css_text(), "margin: 4px;");

        // Later declarations win, keeping the first position
        let dup = StyleDeclarations::parse("COLOR: red; color: blue");
        assert_eq!(dup.to_css_text(), "color: blue;");
    }

    #[test]
    fn test_value_cannot_add_declarations() {
        let mut decls = StyleDeclarations::parse("color: red");

        for bad in ["blue; background: blue", "blue }", "{ x", "'blue", "url(a.png"] {
            assert!(!decls.set("color", bad), "{:?}", bad);
        }
        assert_eq!(decls.to_css_text(), "color: red;");

        assert!(decls.set("background", "url('a;b.png')"));
        assert!(decls.set("content", "\"}\""));
        assert_eq!(decls.len(), 3);
        assert_eq!(
            StyleDeclarations::parse(&decls.to_css_text()),
            decls
        );
    }
}
