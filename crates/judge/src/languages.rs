use std::collections::HashMap;

/// Immutable mapping from language name to sandbox runtime id.
///
/// Injected into the coordinator at construction so tests can substitute it
/// and deployments can target differently provisioned sandboxes.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    ids: HashMap<String, u32>,
}

impl LanguageTable {
    pub fn new<S: Into<String>>(entries: impl IntoIterator<Item = (S, u32)>) -> Self {
        let ids = entries
            .into_iter()
            .map(|(name, id)| (name.into().to_lowercase(), id))
            .collect();
        Self { ids }
    }

    /// Resolve a language name to its runtime id. Case-insensitive.
    pub fn id_for(&self, language: &str) -> Option<u32> {
        self.ids.get(&language.to_lowercase()).copied()
    }
}

impl Default for LanguageTable {
    /// Runtimes provisioned on a stock sandbox deployment.
    fn default() -> Self {
        Self::new([("cpp", 54), ("java", 62), ("python", 71), ("javascript", 63)])
    }
}
