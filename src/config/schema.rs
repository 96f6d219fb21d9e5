use crate::loader::{
    ClassPath, PatternSet, TransformerRegistry, TransformingLoader, DEFAULT_TRANSFORM_PATTERN,
};
use crate::rewrite::BRIDGE_REWRITER_ID;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const DEFAULT_LOADER_NAME: &str = "compat-loader";

#[derive(Debug, Deserialize, Default, Clone)]
pub struct LoaderConfig {
    #[serde(default)]
    pub loader: LoaderSection,
    /// Directory relative class path entries resolve against. Set by
    /// [`load_from_path`](super::load_from_path) to the config file's parent.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(deny_unknown_fields)]
pub struct LoaderSection {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_transformer")]
    pub transformer: String,
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub class_path: Vec<String>,
}

fn default_name() -> String {
    DEFAULT_LOADER_NAME.to_string()
}

fn default_transformer() -> String {
    BRIDGE_REWRITER_ID.to_string()
}

fn default_patterns() -> Vec<String> {
    vec![DEFAULT_TRANSFORM_PATTERN.to_string()]
}

impl Default for LoaderSection {
    fn default() -> Self {
        Self {
            name: default_name(),
            transformer: default_transformer(),
            patterns: default_patterns(),
            class_path: Vec::new(),
        }
    }
}

impl LoaderConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();
        let section = &self.loader;

        if section.name.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "loader.name",
            });
        }
        if section.transformer.trim().is_empty() {
            issues.push(ValidationIssue::MissingField {
                field: "loader.transformer",
            });
        }
        if section.class_path.is_empty() {
            issues.push(ValidationIssue::EmptyClassPath);
        }
        for (index, entry) in section.class_path.iter().enumerate() {
            if entry.trim().is_empty() {
                issues.push(ValidationIssue::BlankEntry {
                    field: "loader.class_path",
                    index,
                });
            }
        }
        for (index, pattern) in section.patterns.iter().enumerate() {
            if pattern.trim().is_empty() {
                issues.push(ValidationIssue::BlankEntry {
                    field: "loader.patterns",
                    index,
                });
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Class path directories with relative entries resolved.
    pub fn class_path_dirs(&self) -> Vec<PathBuf> {
        self.loader
            .class_path
            .iter()
            .map(|entry| {
                let path = Path::new(entry);
                match &self.base_dir {
                    Some(base) if path.is_relative() => base.join(path),
                    _ => path.to_path_buf(),
                }
            })
            .collect()
    }

    /// Construct the configured loader over `registry`.
    pub fn build(&self, registry: Arc<TransformerRegistry>) -> TransformingLoader {
        let class_path = self
            .class_path_dirs()
            .into_iter()
            .fold(ClassPath::new(), |path, dir| path.with_directory(dir));
        TransformingLoader::new(&self.loader.name, class_path, registry)
            .with_predicate(PatternSet::new(self.loader.patterns.iter().cloned()))
            .with_transformer_id(&self.loader.transformer)
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    EmptyClassPath,
    MissingField { field: &'static str },
    BlankEntry { field: &'static str, index: usize },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyClassPath => write!(f, "loader class path is empty"),
            ValidationIssue::MissingField { field } => {
                write!(f, "missing required field '{field}'")
            }
            ValidationIssue::BlankEntry { field, index } => {
                write!(f, "'{field}' entry {index} is blank")
            }
        }
    }
}
