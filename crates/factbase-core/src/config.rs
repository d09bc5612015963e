//! # Configuration
//!
//! The single configuration value passed into the codec and the hierarchy
//! attachment calls. The app layer loads it from TOML; the core only needs
//! the serde derive.

use crate::FactError;
use crate::primitives::{DEFAULT_ENTITY_RELATION, DEFAULT_FILE_ATTRIBUTE};
use crate::types::EdgeKind;
use serde::{Deserialize, Serialize};

/// Options controlling how facts are read, written and attached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FactConfig {
    /// Add File container nodes when installing a file hierarchy.
    pub include_files: bool,
    /// Add Subsystem container nodes when installing a file hierarchy.
    pub include_subsystems: bool,
    /// Relation whose tuples declare nodes instead of edges.
    pub entity_relation: String,
    /// Node attribute naming the source file a node was declared in.
    pub file_attribute: String,
}

impl Default for FactConfig {
    fn default() -> Self {
        Self {
            include_files: true,
            include_subsystems: true,
            entity_relation: DEFAULT_ENTITY_RELATION.to_string(),
            file_attribute: DEFAULT_FILE_ATTRIBUTE.to_string(),
        }
    }
}

impl FactConfig {
    /// Default configuration with a different entity relation name.
    #[must_use]
    pub fn with_entity_relation(relation: impl Into<String>) -> Self {
        Self {
            entity_relation: relation.into(),
            ..Self::default()
        }
    }

    /// Check the configuration is usable.
    ///
    /// The entity relation must be a single non-empty token and must not
    /// shadow an edge relation, otherwise node and edge tuples could not be
    /// told apart.
    pub fn validate(&self) -> Result<(), FactError> {
        if self.entity_relation.is_empty()
            || self.entity_relation.chars().any(char::is_whitespace)
        {
            return Err(FactError::Config(format!(
                "entity relation must be a single token, got {:?}",
                self.entity_relation
            )));
        }
        if EdgeKind::from_tag(&self.entity_relation).is_some() {
            return Err(FactError::Config(format!(
                "entity relation {:?} collides with an edge relation",
                self.entity_relation
            )));
        }
        if self.file_attribute.is_empty() {
            return Err(FactError::Config(
                "file attribute key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
