//! Column type resolution
//!
//! Turns a header line into one [`ColumnSpec`] per field. Types come from
//! inline annotations (`name::type`, `name::type!` for nullable) and may be
//! replaced by an external override document, keyed either by position or
//! by column name.

use crate::error::{LoadError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Separates a column name from its type annotation in a header field.
pub const TYPE_SEPARATOR: &str = "::";

/// Trailing marker on a type string that makes the column nullable.
pub const NULLABLE_MARKER: char = '!';

/// Semantic type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// 64-bit signed integer, base 10
    Int,
    /// 64-bit IEEE float
    Float,
    Bool,
    String,
}

impl ColumnType {
    /// Match a type name (without nullable marker).
    ///
    /// Returns `None` for anything unrecognized, including the empty string.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "int" => Some(Self::Int),
            "float" => Some(Self::Float),
            "bool" => Some(Self::Bool),
            "string" => Some(Self::String),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::String => "string",
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// Resolved description of one input column
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    /// Zero-based index in the header
    pub position: usize,
}

/// Override document shape, decided from its first significant character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverrideFormat {
    /// JSON array of type strings, one per column position
    Positional,
    /// JSON object mapping column names to type strings
    Named,
}

impl OverrideFormat {
    /// Detect the format of an override document.
    pub fn detect(text: &str) -> Result<Self> {
        match text.trim_start().chars().next() {
            Some('[') => Ok(Self::Positional),
            Some('{') => Ok(Self::Named),
            _ => Err(LoadError::config(
                "type override document must be a JSON array (by position) or a JSON object (by name)",
            )),
        }
    }
}

/// Externally supplied column types taking precedence over the header
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TypeOverrides {
    #[default]
    None,
    ByPosition(Vec<String>),
    ByName(HashMap<String, String>),
}

impl TypeOverrides {
    /// Read and parse an override file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            LoadError::io(format!("reading type overrides from {}", path.display()), e)
        })?;

        let overrides = Self::parse(&text)?;
        info!(path = %path.display(), mode = overrides.mode_name(), "Loaded type overrides");
        Ok(overrides)
    }

    /// Parse an override document.
    pub fn parse(text: &str) -> Result<Self> {
        let overrides = match OverrideFormat::detect(text)? {
            OverrideFormat::Positional => Self::ByPosition(
                serde_json::from_str(text)
                    .map_err(|e| LoadError::config(format!("invalid positional type overrides: {}", e)))?,
            ),
            OverrideFormat::Named => Self::ByName(
                serde_json::from_str(text)
                    .map_err(|e| LoadError::config(format!("invalid named type overrides: {}", e)))?,
            ),
        };
        Ok(overrides)
    }

    /// Override for a column: by position for an array document, by name for
    /// an object document.
    pub fn find(&self, position: usize, name: &str) -> Option<&str> {
        match self {
            Self::None => None,
            Self::ByPosition(types) => types.get(position).map(String::as_str),
            Self::ByName(types) => types.get(name).map(String::as_str),
        }
    }

    fn mode_name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ByPosition(_) => "by-position",
            Self::ByName(_) => "by-name",
        }
    }
}

/// Split a trailing nullable marker off a type string.
fn strip_marker(type_str: &str) -> (&str, bool) {
    match type_str.strip_suffix(NULLABLE_MARKER) {
        Some(stripped) => (stripped, true),
        None => (type_str, false),
    }
}

/// Resolve one [`ColumnSpec`] per header field.
pub fn resolve_header<'a, I>(fields: I, overrides: &TypeOverrides) -> Vec<ColumnSpec>
where
    I: IntoIterator<Item = &'a str>,
{
    fields
        .into_iter()
        .enumerate()
        .map(|(position, field)| resolve_field(position, field, overrides))
        .collect()
}

fn resolve_field(position: usize, field: &str, overrides: &TypeOverrides) -> ColumnSpec {
    let (name, inline) = match field.split_once(TYPE_SEPARATOR) {
        Some((name, type_str)) => (name, type_str),
        None => (field, ""),
    };
    let (inline_type, inline_nullable) = strip_marker(inline);

    let (type_str, nullable) = match overrides.find(position, name) {
        Some(override_str) => {
            let (override_type, override_nullable) = strip_marker(override_str);
            (override_type, inline_nullable || override_nullable)
        },
        None => (inline_type, inline_nullable),
    };

    let column_type = ColumnType::from_name(type_str).unwrap_or_else(|| {
        info!(
            name = %name,
            idx = position,
            type_name = %type_str,
            "No column type specified, using string"
        );
        ColumnType::String
    });

    ColumnSpec {
        name: name.to_string(),
        column_type,
        nullable,
        position,
    }
}

/// Log the resolved column table, one line per column.
pub fn log_columns(columns: &[ColumnSpec]) {
    info!("columns");
    info!("{}   {:<40}{:<15}{}", "IDX", "NAME", "TYPE", "NULLABLE");
    for column in columns {
        info!(
            "[{:>3}] {:<40}{:<15}{}",
            column.position,
            column.name,
            column.column_type,
            if column.nullable { "NULL" } else { "" }
        );
    }
}
