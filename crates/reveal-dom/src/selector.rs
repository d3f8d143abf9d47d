//! Selector parsing and matching
//!
//! The subset page scripts use with `querySelectorAll`: selector lists,
//! descendant and child combinators, type/universal, `#id`, `.class`
//! and attribute selectors. Pseudo-classes are rejected.

use crate::{DomTree, ElementData, NodeId};

/// Selector parse error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,
    #[error("unexpected '{ch}' at offset {offset} in selector `{selector}`")]
    Unexpected {
        ch: char,
        offset: usize,
        selector: String,
    },
    #[error("unexpected end of selector `{0}`")]
    UnexpectedEnd(String),
    #[error("pseudo-classes are not supported in `{0}`")]
    Unsupported(String),
}

/// Combinator between two compound selectors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// `a b`
    Descendant,
    /// `a > b`
    Child,
}

/// Attribute value matcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrMatcher {
    /// [attr=value]
    Exact(String),
    /// [attr~=value] - whitespace-separated list contains
    Includes(String),
    /// [attr|=value] - exact or prefix with hyphen
    DashMatch(String),
    /// [attr^=value]
    Prefix(String),
    /// [attr$=value]
    Suffix(String),
    /// [attr*=value]
    Substring(String),
}

impl AttrMatcher {
    fn matches(&self, actual: &str) -> bool {
        match self {
            AttrMatcher::Exact(v) => actual == v,
            AttrMatcher::Includes(v) => actual.split_whitespace().any(|w| w == v),
            AttrMatcher::DashMatch(v) => {
                actual == v || actual.strip_prefix(v.as_str()).is_some_and(|rest| rest.starts_with('-'))
            }
            // Empty operands never match, as in CSS
            AttrMatcher::Prefix(v) => !v.is_empty() && actual.starts_with(v.as_str()),
            AttrMatcher::Suffix(v) => !v.is_empty() && actual.ends_with(v.as_str()),
            AttrMatcher::Substring(v) => !v.is_empty() && actual.contains(v.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    matcher: Option<AttrMatcher>,
}

/// A compound selector such as `img.hero[data-src]`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

impl Compound {
    /// Check the compound against one element
    pub fn matches(&self, elem: &ElementData) -> bool {
        if let Some(tag) = &self.tag {
            if *tag != elem.tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if elem.id() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| elem.classes.contains(c)) {
            return false;
        }
        self.attrs.iter().all(|a| match (&a.matcher, elem.get_attr(&a.name)) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(m), Some(actual)) => m.matches(&actual),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct ComplexSelector {
    /// Compounds left to right
    parts: Vec<Compound>,
    /// `combinators[i]` joins `parts[i]` and `parts[i + 1]`
    combinators: Vec<Combinator>,
}

/// Parsed, comma-separated selector list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

impl std::str::FromStr for SelectorList {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl SelectorList {
    pub fn parse(selector: &str) -> Result<Self, SelectorError> {
        if selector.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        Parser::new(selector).parse_list()
    }

    /// Does the node match any selector in the list?
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|sel| matches_from(tree, node, sel, sel.parts.len() - 1))
    }
}

/// Match `sel.parts[..=idx]` with `parts[idx]` anchored at `node`,
/// walking combinators right to left.
fn matches_from(tree: &DomTree, node: NodeId, sel: &ComplexSelector, idx: usize) -> bool {
    let Some(elem) = tree.get(node).and_then(|n| n.as_element()) else {
        return false;
    };
    if !sel.parts[idx].matches(elem) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match sel.combinators[idx - 1] {
        Combinator::Child => tree
            .parent(node)
            .is_some_and(|p| matches_from(tree, p, sel, idx - 1)),
        Combinator::Descendant => tree
            .ancestors(node)
            .any(|a| matches_from(tree, a, sel, idx - 1)),
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii()
}

struct Parser<'a> {
    source: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            source,
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    /// Skip whitespace, reporting whether any was skipped
    fn skip_ws(&mut self) -> bool {
        let start = self.pos;
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
        self.pos != start
    }

    fn error_here(&self) -> SelectorError {
        match self.peek() {
            Some(ch) => SelectorError::Unexpected {
                ch,
                offset: self.pos,
                selector: self.source.to_string(),
            },
            None => SelectorError::UnexpectedEnd(self.source.to_string()),
        }
    }

    fn expect(&mut self, want: char) -> Result<(), SelectorError> {
        if self.peek() == Some(want) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error_here())
        }
    }

    fn parse_list(&mut self) -> Result<SelectorList, SelectorError> {
        let mut selectors = Vec::new();
        loop {
            self.skip_ws();
            selectors.push(self.parse_complex()?);
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(',') => {
                    self.pos += 1;
                }
                Some(_) => return Err(self.error_here()),
            }
        }
        Ok(SelectorList { selectors })
    }

    fn parse_complex(&mut self) -> Result<ComplexSelector, SelectorError> {
        let mut parts = vec![self.parse_compound()?];
        let mut combinators = Vec::new();

        loop {
            let had_ws = self.skip_ws();
            let combinator = match self.peek() {
                None | Some(',') => break,
                Some('>') => {
                    self.pos += 1;
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(_) => return Err(self.error_here()),
            };
            parts.push(self.parse_compound()?);
            combinators.push(combinator);
        }

        Ok(ComplexSelector { parts, combinators })
    }

    fn parse_compound(&mut self) -> Result<Compound, SelectorError> {
        let mut compound = Compound::default();
        let mut seen_any = false;

        match self.peek() {
            Some('*') => {
                self.pos += 1;
                seen_any = true;
            }
            Some(c) if is_ident_char(c) => {
                compound.tag = Some(self.parse_ident()?.to_ascii_lowercase());
                seen_any = true;
            }
            _ => {}
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
                Some(':') => return Err(SelectorError::Unsupported(self.source.to_string())),
                _ => break,
            }
            seen_any = true;
        }

        if !seen_any {
            return Err(self.error_here());
        }
        Ok(compound)
    }

    fn parse_ident(&mut self) -> Result<String, SelectorError> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_char) {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(self.error_here());
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    fn parse_attr(&mut self) -> Result<AttrSelector, SelectorError> {
        self.skip_ws();
        let name = self.parse_ident()?.to_ascii_lowercase();
        self.skip_ws();

        let ctor: fn(String) -> AttrMatcher = match self.peek() {
            Some(']') => {
                self.pos += 1;
                return Ok(AttrSelector { name, matcher: None });
            }
            Some('=') => {
                self.pos += 1;
                AttrMatcher::Exact
            }
            Some(op @ ('~' | '|' | '^' | '$' | '*')) => {
                self.pos += 1;
                self.expect('=')?;
                match op {
                    '~' => AttrMatcher::Includes,
                    '|' => AttrMatcher::DashMatch,
                    '^' => AttrMatcher::Prefix,
                    '$' => AttrMatcher::Suffix,
                    _ => AttrMatcher::Substring,
                }
            }
            _ => return Err(self.error_here()),
        };

        self.skip_ws();
        let value = match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += 1;
                }
                let value: String = self.chars[start..self.pos].iter().collect();
                self.expect(quote)?;
                value
            }
            _ => self.parse_ident()?,
        };
        self.skip_ws();
        self.expect(']')?;

        Ok(AttrSelector {
            name,
            matcher: Some(ctor(value)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_list() {
        let list = SelectorList::parse(".service-card, .testimonial,.about-content").unwrap();
        assert_eq!(list.selectors.len(), 3);
    }

    #[test]
    fn test_parse_attribute_forms() {
        let list = SelectorList::parse(r##"a[href^="#"], img[data-src], [lang|=en], [rel~=nofollow]"##).unwrap();
        let attrs: Vec<_> = list
            .selectors
            .iter()
            .map(|s| s.parts[0].attrs[0].matcher.clone())
            .collect();
        assert_eq!(
            attrs,
            vec![
                Some(AttrMatcher::Prefix("#".into())),
                None,
                Some(AttrMatcher::DashMatch("en".into())),
                Some(AttrMatcher::Includes("nofollow".into())),
            ]
        );
    }

    #[test]
    fn test_parse_combinators() {
        let list = SelectorList::parse("main  .pricing>.card   span").unwrap();
        let sel = &list.selectors[0];
        assert_eq!(sel.parts.len(), 4);
        assert_eq!(
            sel.combinators,
            vec![Combinator::Descendant, Combinator::Child, Combinator::Descendant]
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(SelectorList::parse("  "), Err(SelectorError::Empty));
        assert!(matches!(SelectorList::parse(".a,"), Err(SelectorError::UnexpectedEnd(_))));
        assert!(matches!(SelectorList::parse("a:hover"), Err(SelectorError::Unsupported(_))));
        assert!(matches!(SelectorList::parse("[data-src"), Err(SelectorError::UnexpectedEnd(_))));
        assert!(matches!(
            SelectorList::parse("div ) p"),
            Err(SelectorError::Unexpected { ch: ')', .. })
        ));
    }

    #[test]
    fn test_attr_matchers() {
        assert!(AttrMatcher::DashMatch("en".into()).matches("en-US"));
        assert!(!AttrMatcher::DashMatch("en".into()).matches("english"));
        assert!(!AttrMatcher::Prefix(String::new()).matches("anything"));
        assert!(AttrMatcher::Suffix(".png".into()).matches("hero.png"));
    }
}
