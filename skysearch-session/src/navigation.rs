/// The navigable URL's query string, treated as an external key-value store.
pub trait NavigationStore: Send {
    /// Current query string, if any
    fn read(&self) -> Option<String>;

    /// Navigate to a new query string
    fn push(&mut self, query: String);
}

/// In-process navigation history, for the CLI and tests
#[derive(Debug, Default, Clone)]
pub struct MemoryNavigation {
    history: Vec<String>,
}

impl MemoryNavigation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with an existing query, as if the user opened a shared link
    pub fn with_query(query: &str) -> Self {
        Self {
            history: vec![query.to_string()],
        }
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }
}

impl NavigationStore for MemoryNavigation {
    fn read(&self) -> Option<String> {
        self.history.last().cloned()
    }

    fn push(&mut self, query: String) {
        self.history.push(query);
    }
}
