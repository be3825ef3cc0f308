//! Field policy.
//!
//! A declarative table mapping each card field to the transformation applied
//! to it. The transformer consults the table and never hardcodes a field.
//!
//! The mapping itself is fixed: `Number` and `CVC` are digested, the holder
//! and expiry fields are encrypted. A policy file restates that table and is
//! rejected if any field names a different class.

use crate::{CardField, RedactionError, TransformClass};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Schema version for the policy file.
pub const POLICY_SCHEMA_VERSION: &str = "1.0.0";

/// Field-to-class table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPolicy {
    /// Schema version.
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Per-field rules.
    pub fields: BTreeMap<CardField, TransformClass>,
}

fn default_schema_version() -> String {
    POLICY_SCHEMA_VERSION.to_string()
}

impl FieldPolicy {
    /// Load a policy from a JSON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let policy: FieldPolicy = serde_json::from_str(&content)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Save the policy to a JSON file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> crate::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Check that every field of the record shape has its fixed class.
    ///
    /// The map key type rules out unknown fields and duplicates.
    pub fn validate(&self) -> crate::Result<()> {
        if self.schema_version != POLICY_SCHEMA_VERSION {
            return Err(RedactionError::Policy(format!(
                "unsupported schema version {} (supported: {})",
                self.schema_version, POLICY_SCHEMA_VERSION
            )));
        }

        let missing: Vec<&str> = CardField::ALL
            .iter()
            .filter(|f| !self.fields.contains_key(*f))
            .map(|f| f.json_name())
            .collect();
        if !missing.is_empty() {
            return Err(RedactionError::Policy(format!(
                "no class for field(s): {}",
                missing.join(", ")
            )));
        }

        let remapped: Vec<String> = CardField::ALL
            .iter()
            .filter_map(|f| {
                let class = self.fields.get(f)?;
                (*class != f.default_class())
                    .then(|| format!("{} must be {}, not {}", f.json_name(), f.default_class(), class))
            })
            .collect();
        if !remapped.is_empty() {
            return Err(RedactionError::Policy(format!(
                "field classes are fixed: {}",
                remapped.join("; ")
            )));
        }
        Ok(())
    }

    /// Get the class for a field.
    pub fn class_for(&self, field: CardField) -> TransformClass {
        self.fields
            .get(&field)
            .copied()
            .unwrap_or_else(|| field.default_class())
    }

    /// Fields assigned to the given class, in document order.
    pub fn fields_in(&self, class: TransformClass) -> Vec<CardField> {
        CardField::ALL
            .into_iter()
            .filter(|f| self.class_for(*f) == class)
            .collect()
    }
}

impl Default for FieldPolicy {
    fn default() -> Self {
        let fields = CardField::ALL
            .into_iter()
            .map(|f| (f, f.default_class()))
            .collect();

        Self {
            schema_version: POLICY_SCHEMA_VERSION.to_string(),
            fields,
        }
    }
}
