//! # Error Contexts
//!
//! Structured metadata attached to errors so failures can be inspected programmatically.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ErrorContext {
    /// Context for QT-1001..1005 (discovery query lifecycle)
    Query {
        execution_id: Option<String>,
        state: Option<String>,
        reason: Option<String>,
    },

    /// Context for QT-1006 (row that failed to decode)
    Decode { row_index: usize, raw: String },

    /// Context for QT-2001/2002 (bulk lookups)
    Batch {
        batch_index: usize,
        batch_size: usize,
        first_id: Option<String>,
    },

    /// Context for QT-3001..3003 (config errors)
    Config {
        file_path: Option<String>,
        field: Option<String>,
    },

    /// Context for QT-4001/4002 (report file)
    Output { path: String },

    /// Generic key-value context for extensibility
    Generic {
        #[serde(flatten)]
        data: std::collections::HashMap<String, serde_json::Value>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_context_serde_roundtrip() {
        let ctx = ErrorContext::Batch {
            batch_index: 3,
            batch_size: 49,
            first_id: Some("0a1b".to_string()),
        };

        let json = serde_json::to_string(&ctx).unwrap();
        let de: ErrorContext = serde_json::from_str(&json).unwrap();

        match de {
            ErrorContext::Batch {
                batch_index,
                first_id,
                ..
            } => {
                assert_eq!(batch_index, 3);
                assert_eq!(first_id.as_deref(), Some("0a1b"));
            }
            _ => panic!("Wrong variant"),
        }
    }
}
