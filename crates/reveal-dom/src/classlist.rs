//! DOMTokenList (classList)
//!
//! Space-separated token set backing an element's `class` attribute.

/// DOMTokenList for managing space-separated tokens (e.g., classList)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DOMTokenList {
    tokens: Vec<String>,
}

impl DOMTokenList {
    /// Create empty token list
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from space-separated string, dropping duplicates
    pub fn from_string(s: &str) -> Self {
        let mut list = Self::new();
        for token in s.split_whitespace() {
            list.add(token);
        }
        list
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Check if token exists
    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t == token)
    }

    /// Add a token. Returns false if it was already present or empty.
    pub fn add(&mut self, token: &str) -> bool {
        if token.is_empty() || self.contains(token) {
            return false;
        }
        self.tokens.push(token.to_string());
        true
    }

    /// Remove a token. Returns whether it was present.
    pub fn remove(&mut self, token: &str) -> bool {
        let before = self.tokens.len();
        self.tokens.retain(|t| t != token);
        before != self.tokens.len()
    }

    /// Toggle token, returns new state
    pub fn toggle(&mut self, token: &str, force: Option<bool>) -> bool {
        match force {
            Some(true) => {
                self.add(token);
                true
            }
            Some(false) => {
                self.remove(token);
                false
            }
            None => {
                if !self.remove(token) {
                    self.add(token);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Get value as string
    pub fn value(&self) -> String {
        self.tokens.join(" ")
    }

    /// Iterate over tokens
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(|s| s.as_str())
    }
}

impl std::fmt::Display for DOMTokenList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_string_dedups() {
        let list = DOMTokenList::from_string("card  card fade-in");
        assert_eq!(list.len(), 2);
        assert_eq!(list.value(), "card fade-in");
    }

    #[test]
    fn test_add_remove() {
        let mut list = DOMTokenList::new();
        assert!(list.add("visible"));
        assert!(!list.add("visible"));
        assert!(!list.add(""));

        assert!(list.remove("visible"));
        assert!(!list.remove("visible"));
        assert!(list.is_empty());
    }

    #[test]
    fn test_toggle() {
        let mut list = DOMTokenList::new();

        assert!(list.toggle("is-open", None));
        assert!(list.contains("is-open"));

        assert!(!list.toggle("is-open", None));
        assert!(!list.contains("is-open"));

        assert!(list.toggle("is-open", Some(true)));
        assert!(list.toggle("is-open", Some(true)));
        assert_eq!(list.len(), 1);
    }
}
