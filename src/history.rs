use log::trace;

use crate::query::split_url;

/// The browser address surface: read the current address, write a new
/// navigation entry (`push`) or rewrite the current one in place (`replace`).
pub trait History {
    /// Current `(pathname, search)`; `search` keeps its leading `?` if any.
    fn location(&self) -> (String, String);

    fn push(&mut self, url: &str);

    fn replace(&mut self, url: &str);
}

/// In-memory history stack with back/forward, for native hosts and tests.
#[derive(Debug, Clone)]
pub struct MemoryHistory {
    entries: Vec<String>,
    index: usize,
}

impl MemoryHistory {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            entries: vec![initial.into()],
            index: 0,
        }
    }

    pub fn current(&self) -> &str {
        &self.entries[self.index]
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn can_go_back(&self) -> bool {
        self.index > 0
    }

    pub fn can_go_forward(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// Moves back one entry. The caller delivers the resulting pop-state.
    pub fn back(&mut self) -> bool {
        if !self.can_go_back() {
            return false;
        }
        self.index -= 1;
        true
    }

    pub fn forward(&mut self) -> bool {
        if !self.can_go_forward() {
            return false;
        }
        self.index += 1;
        true
    }
}

impl Default for MemoryHistory {
    fn default() -> Self {
        Self::new("/")
    }
}

impl History for MemoryHistory {
    fn location(&self) -> (String, String) {
        let (pathname, search) = split_url(self.current());
        (pathname.to_string(), search.to_string())
    }

    fn push(&mut self, url: &str) {
        trace!("history push {url}");
        self.entries.truncate(self.index + 1);
        self.entries.push(url.to_string());
        self.index += 1;
    }

    fn replace(&mut self, url: &str) {
        trace!("history replace {url}");
        self.entries[self.index] = url.to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_navigate() {
        let mut h = MemoryHistory::new("/zika/");
        h.push("/ebola/?l=radial");
        assert_eq!(h.len(), 2);
        assert_eq!(
            h.location(),
            ("/ebola/".to_string(), "?l=radial".to_string())
        );
        assert!(h.back());
        assert_eq!(h.current(), "/zika/");
        assert!(!h.back());
        assert!(h.forward());
        assert!(!h.forward());
    }

    #[test]
    fn test_push_drops_forward_entries() {
        let mut h = MemoryHistory::new("/a/");
        h.push("/b/");
        h.back();
        h.push("/c/");
        assert_eq!(h.entries(), &["/a/".to_string(), "/c/".to_string()]);
        assert!(!h.can_go_forward());
    }

    #[test]
    fn test_replace_keeps_length() {
        let mut h = MemoryHistory::new("/zika");
        h.replace("/zika/");
        assert_eq!(h.len(), 1);
        assert_eq!(h.current(), "/zika/");
    }
}
