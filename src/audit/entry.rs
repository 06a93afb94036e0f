//! Audit entry data structures
//!
//! Snapshots stored in entries never carry secret material: envelope columns
//! are replaced by a placeholder before the entry is built.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Columns holding ciphertext envelopes
pub const ENVELOPE_COLUMNS: [&str; 2] = ["encrypted_password", "encrypted_api_key"];

/// Placeholder written instead of an envelope
pub const REDACTED: &str = "<encrypted>";

/// Types of operations that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Create,
    Update,
    Delete,
    /// Whole-account export
    Export,
    /// Whole-account or per-service import
    Import,
    /// Whole-account wipe
    Clear,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::Create => write!(f, "CREATE"),
            Operation::Update => write!(f, "UPDATE"),
            Operation::Delete => write!(f, "DELETE"),
            Operation::Export => write!(f, "EXPORT"),
            Operation::Import => write!(f, "IMPORT"),
            Operation::Clear => write!(f, "CLEAR"),
        }
    }
}

/// Types of entities that can be audited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Credential,
    ServiceNote,
    ResourceCategory,
    Resource,
    /// A user's whole dataset
    Dataset,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Credential => write!(f, "Credential"),
            EntityType::ServiceNote => write!(f, "ServiceNote"),
            EntityType::ResourceCategory => write!(f, "ResourceCategory"),
            EntityType::Resource => write!(f, "Resource"),
            EntityType::Dataset => write!(f, "Dataset"),
        }
    }
}

/// A single audit log entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// When the operation occurred (UTC)
    pub timestamp: DateTime<Utc>,

    /// Type of operation performed
    pub operation: Operation,

    /// Type of entity affected
    pub entity_type: EntityType,

    /// ID of the affected entity (the user id for dataset operations)
    pub entity_id: String,

    /// Human-readable label (service name, category name, file name)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity_name: Option<String>,

    /// Redacted row before the operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before: Option<Value>,

    /// Redacted row after the operation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub after: Option<Value>,

    /// Changed columns, or counts for dataset operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

impl AuditEntry {
    fn new(operation: Operation, entity_type: EntityType, entity_id: String) -> Self {
        Self {
            timestamp: Utc::now(),
            operation,
            entity_type,
            entity_id,
            entity_name: None,
            before: None,
            after: None,
            summary: None,
        }
    }

    /// Entry for a created row
    pub fn create<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            entity_name,
            after: redacted(entity),
            ..Self::new(Operation::Create, entity_type, entity_id.into())
        }
    }

    /// Entry for a replaced row, summarizing which columns changed
    pub fn update<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> Self {
        let before = redacted(before);
        let after = redacted(after);
        let summary = match (&before, &after) {
            (Some(b), Some(a)) => changed_columns(b, a),
            _ => None,
        };
        Self {
            entity_name,
            before,
            after,
            summary,
            ..Self::new(Operation::Update, entity_type, entity_id.into())
        }
    }

    /// Entry for a deleted row
    pub fn delete<T: Serialize>(
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Self {
        Self {
            entity_name,
            before: redacted(entity),
            ..Self::new(Operation::Delete, entity_type, entity_id.into())
        }
    }

    /// Entry for an export, import or clear of a user's dataset
    pub fn dataset(
        operation: Operation,
        user_id: impl Into<String>,
        label: Option<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            entity_name: label,
            summary: Some(summary.into()),
            ..Self::new(operation, EntityType::Dataset, user_id.into())
        }
    }

    /// Format the entry for human-readable output
    pub fn format_human_readable(&self) -> String {
        let mut output = format!(
            "[{}] {} {} {}",
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.operation,
            self.entity_type,
            self.entity_id
        );

        if let Some(name) = &self.entity_name {
            output.push_str(&format!(" ({})", name));
        }

        if let Some(summary) = &self.summary {
            output.push_str(&format!("\n  {}", summary));
        }

        output
    }
}

/// JSON form of `entity` with envelope columns masked
pub fn redacted<T: Serialize>(entity: &T) -> Option<Value> {
    let mut value = serde_json::to_value(entity).ok()?;
    if let Value::Object(map) = &mut value {
        for column in ENVELOPE_COLUMNS {
            if let Some(field) = map.get_mut(column) {
                let empty = field.as_str().map_or(true, str::is_empty);
                if !empty {
                    *field = Value::String(REDACTED.to_string());
                }
            }
        }
    }
    Some(value)
}

/// Comma-separated names of the top-level columns that differ
fn changed_columns(before: &Value, after: &Value) -> Option<String> {
    let (Value::Object(b), Value::Object(a)) = (before, after) else {
        return None;
    };

    let mut changed: Vec<&str> = a
        .iter()
        .filter(|(k, v)| b.get(k.as_str()) != Some(*v))
        .map(|(k, _)| k.as_str())
        .collect();
    changed.extend(b.keys().filter(|k| !a.contains_key(k.as_str())).map(String::as_str));

    if changed.is_empty() {
        None
    } else {
        Some(format!("Changed: {}", changed.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Create.to_string(), "CREATE");
        assert_eq!(Operation::Import.to_string(), "IMPORT");
        assert_eq!(Operation::Clear.to_string(), "CLEAR");
    }

    #[test]
    fn test_entity_type_serde() {
        assert_eq!(
            serde_json::to_value(EntityType::ResourceCategory).unwrap(),
            json!("resource_category")
        );
        assert_eq!(EntityType::ServiceNote.to_string(), "ServiceNote");
    }

    #[test]
    fn test_create_redacts_envelopes() {
        let row = json!({
            "service_name": "OpenAI",
            "encrypted_api_key": "c2VjcmV0LWVudmVsb3Bl",
            "encrypted_password": ""
        });
        let entry = AuditEntry::create(EntityType::Credential, "key-1", None, &row);
        let after = entry.after.unwrap();

        assert_eq!(after["encrypted_api_key"], REDACTED);
        assert_eq!(after["encrypted_password"], "");
        assert_eq!(after["service_name"], "OpenAI");
    }

    #[test]
    fn test_update_summary_names_columns_only() {
        let before = json!({"notes": "a", "encrypted_api_key": "ZW52MQ=="});
        let after = json!({"notes": "b", "encrypted_api_key": "ZW52Mg=="});
        let entry = AuditEntry::update(EntityType::Credential, "key-1", None, &before, &after);

        // Both envelopes redact to the same placeholder
        assert_eq!(entry.summary.as_deref(), Some("Changed: notes"));
        assert!(!serde_json::to_string(&entry).unwrap().contains("ZW52"));
    }

    #[test]
    fn test_dataset_entry() {
        let entry = AuditEntry::dataset(
            Operation::Export,
            "user-1",
            Some("backup.json".into()),
            "11 rows",
        );
        assert_eq!(entry.entity_type, EntityType::Dataset);
        let text = entry.format_human_readable();
        assert!(text.contains("EXPORT Dataset user-1 (backup.json)"));
        assert!(text.contains("11 rows"));
    }
}
