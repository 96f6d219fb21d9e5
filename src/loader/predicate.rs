//! Which type names a loader intercepts.

/// Substring selecting the types rewritten by default.
pub const DEFAULT_TRANSFORM_PATTERN: &str = "org.gradle.api.tasks.bundling.Tar";

/// Decides, per dotted type name, whether resolution goes through the
/// transformer.
pub trait TransformPredicate: Send + Sync {
    fn should_transform(&self, type_name: &str) -> bool;
}

impl<F> TransformPredicate for F
where
    F: Fn(&str) -> bool + Send + Sync,
{
    fn should_transform(&self, type_name: &str) -> bool {
        self(type_name)
    }
}

/// Matches a name containing any of its substrings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSet {
    patterns: Vec<String>,
}

impl PatternSet {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }

    /// Matches nothing.
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
        }
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl Default for PatternSet {
    fn default() -> Self {
        Self::new([DEFAULT_TRANSFORM_PATTERN])
    }
}

impl TransformPredicate for PatternSet {
    fn should_transform(&self, type_name: &str) -> bool {
        self.patterns.iter().any(|p| type_name.contains(p.as_str()))
    }
}
