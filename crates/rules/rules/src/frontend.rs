use crate::error::RuleError;
use crate::ir::draft::RuleDraft;

/// Trait for rule frontends that parse rule drafts from various formats.
///
/// Frontends produce drafts, not rules: ids are assigned only when a draft is
/// added to a connection's rule set.
pub trait RuleFrontend: Send + Sync {
    /// Return the file extensions this frontend supports (e.g., `["yaml", "yml"]`).
    fn extensions(&self) -> &[&str];

    /// Parse rule drafts from a string content.
    fn parse(&self, content: &str) -> Result<Vec<RuleDraft>, RuleError>;

    /// Parse rule drafts from a file path.
    ///
    /// The default implementation reads the file and delegates to [`parse`](Self::parse).
    fn parse_file(&self, path: &std::path::Path) -> Result<Vec<RuleDraft>, RuleError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| RuleError::Parse(format!("cannot read {}: {e}", path.display())))?;
        self.parse(&content)
    }
}
