//! Entity catalog.
//!
//! Each entity declares which filter fields and which ordering columns
//! API callers may use, and how those names map onto the backing table.
//! The catalog is loaded once at start-up and shared read-only.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Catalog shipped with the binary.
const BUILTIN_CATALOG: &str = include_str!("../../catalog/adventureworks.yml");

/// Errors raised while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog")]
    Parse(#[from] serde_yml::Error),

    #[error("entity '{0}' is declared more than once")]
    DuplicateEntity(String),

    #[error("entity '{entity}' declares '{name}' more than once")]
    DuplicateName { entity: String, name: String },
}

/// Backend column type, as far as ordering is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    Integer,
    Float,
    Numeric,
    Text,
    Boolean,
    Date,
    Timestamp,
    Uuid,
    Json,
    Xml,
    Bytea,
    Tsvector,
}

impl ColumnType {
    /// Whether the backend can sort on columns of this type.
    pub fn is_orderable(self) -> bool {
        !matches!(
            self,
            ColumnType::Json | ColumnType::Xml | ColumnType::Bytea | ColumnType::Tsvector
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Numeric => "numeric",
            ColumnType::Text => "text",
            ColumnType::Boolean => "boolean",
            ColumnType::Date => "date",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Uuid => "uuid",
            ColumnType::Json => "json",
            ColumnType::Xml => "xml",
            ColumnType::Bytea => "bytea",
            ColumnType::Tsvector => "tsvector",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a scalar filter value is matched. Lists always match with `IN`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    /// `column = value`.
    #[default]
    Exact,
    /// Case-insensitive substring match.
    Phrase,
}

/// A filter field exposed to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterField {
    pub name: String,
    pub column: String,
    /// Values are checked against this type before any SQL is rendered.
    pub data_type: ColumnType,
    #[serde(default)]
    pub match_kind: MatchKind,
}

/// A column callers may order by.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderColumn {
    pub name: String,
    pub column: String,
    pub data_type: ColumnType,
}

/// One entity: its table and its allow-lists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityDefinition {
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    pub table: String,
    #[serde(default)]
    pub filters: Vec<FilterField>,
    #[serde(default)]
    pub ordering: Vec<OrderColumn>,
}

impl EntityDefinition {
    /// Filter allow-list, in declaration order.
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name.as_str()).collect()
    }

    /// Ordering allow-list, in declaration order.
    pub fn order_names(&self) -> Vec<&str> {
        self.ordering.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn filter_field(&self, name: &str) -> Option<&FilterField> {
        self.filters.iter().find(|f| f.name == name)
    }

    pub fn order_column(&self, name: &str) -> Option<&OrderColumn> {
        self.ordering.iter().find(|c| c.name == name)
    }

    fn check_unique_names(&self) -> Result<(), CatalogError> {
        for names in [self.filter_names(), self.order_names()] {
            for (i, name) in names.iter().enumerate() {
                if names[..i].contains(name) {
                    return Err(CatalogError::DuplicateName {
                        entity: self.name.clone(),
                        name: (*name).to_string(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct CatalogFile {
    entities: Vec<EntityDefinition>,
}

/// All known entities, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct EntityCatalog {
    entities: BTreeMap<String, EntityDefinition>,
}

impl EntityCatalog {
    /// Build a catalog, rejecting duplicate entity or field names.
    pub fn new(definitions: Vec<EntityDefinition>) -> Result<Self, CatalogError> {
        let mut entities = BTreeMap::new();
        for definition in definitions {
            definition.check_unique_names()?;
            let name = definition.name.clone();
            if entities.insert(name.clone(), definition).is_some() {
                return Err(CatalogError::DuplicateEntity(name));
            }
        }
        Ok(Self { entities })
    }

    /// Parse a catalog from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_yml::from_str(yaml)?;
        Self::new(file.entities)
    }

    /// Load a catalog from a YAML file on disk.
    pub fn from_path(path: &Path) -> Result<Self, CatalogError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let catalog = Self::from_yaml_str(&yaml)?;
        info!(path = %path.display(), entities = catalog.len(), "entity catalog loaded");
        Ok(catalog)
    }

    /// The catalog shipped with the binary.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_yaml_str(BUILTIN_CATALOG)
    }

    pub fn get(&self, name: &str) -> Option<&EntityDefinition> {
        self.entities.get(name)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &EntityDefinition> {
        self.entities.values()
    }
}
