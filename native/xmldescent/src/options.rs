//! Parser configuration

/// Source name reported in diagnostics when none is given
pub const DEFAULT_SOURCE_NAME: &str = "<INPUT>";

/// Default limit on element nesting. Each nested element costs a few stack
/// frames, and NIF calls run on scheduler threads with small stacks.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Options for a single parse
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Name of the document source, used only in error messages
    pub source_name: Option<String>,
    /// Deepest element nesting accepted; root elements are at depth 1
    pub max_depth: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions {
            source_name: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the source name shown in diagnostics
    pub fn with_source_name(mut self, name: impl Into<String>) -> Self {
        self.source_name = Some(name.into());
        self
    }

    /// Set the element nesting limit
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// The source name, or the `<INPUT>` placeholder
    pub fn source_name(&self) -> &str {
        self.source_name.as_deref().unwrap_or(DEFAULT_SOURCE_NAME)
    }
}
