use crate::error::{BuildError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque artifact identity: group, name, version and an optional classifier.
///
/// Coordinates are totally ordered (group, then name, then version, then
/// classifier) and compare strictly on every component.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactCoords {
    group: String,
    name: String,
    version: String,
    classifier: Option<String>,
}

impl ArtifactCoords {
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version: version.into(),
            classifier: None,
        }
    }

    pub fn with_classifier(mut self, classifier: impl Into<String>) -> Self {
        self.classifier = Some(classifier.into());
        self
    }

    /// Parses the canonical `group:name:version` or `group:name:version:classifier` form.
    pub fn parse(text: &str) -> Result<Self> {
        let parts: Vec<&str> = text.split(':').collect();
        if parts.len() < 3 || parts.len() > 4 || parts.iter().any(|p| p.is_empty()) {
            return Err(BuildError::graph(format!(
                "invalid artifact coordinates: {text:?}"
            )));
        }
        let mut coords = Self::new(parts[0], parts[1], parts[2]);
        if let Some(classifier) = parts.get(3) {
            coords = coords.with_classifier(*classifier);
        }
        Ok(coords)
    }

    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    /// Canonical `group:name:version[:classifier]` form, used for hashing.
    pub fn canonical(&self) -> String {
        match &self.classifier {
            Some(classifier) => {
                format!("{}:{}:{}:{}", self.group, self.name, self.version, classifier)
            }
            None => format!("{}:{}:{}", self.group, self.name, self.version),
        }
    }

    /// A form safe to use as a directory name component.
    pub fn directory_safe(&self) -> String {
        self.canonical()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '-'
                }
            })
            .collect()
    }
}

impl fmt::Display for ArtifactCoords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}
