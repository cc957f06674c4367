// Typed record trait for collection members

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

/// Trait for typed values that live in a collection
///
/// The store itself works on untyped JSON; implementing this lets callers use
/// the typed helpers (`save_record`, `find_all_as`, ...) without spelling out
/// keys and ids.
pub trait Record: Serialize + DeserializeOwned + Clone {
    /// Identifier matched against the `id` field of stored items
    fn id_value(&self) -> Value;

    /// Key of the collection this type is stored under by default
    fn collection_key() -> &'static str
    where
        Self: Sized;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Note {
        id: String,
        text: String,
    }

    impl Record for Note {
        fn id_value(&self) -> Value {
            Value::from(self.id.as_str())
        }

        fn collection_key() -> &'static str {
            "notes"
        }
    }

    #[test]
    fn test_record_trait_implementation() {
        let note = Note {
            id: "n-1".to_string(),
            text: "hello".to_string(),
        };

        assert_eq!(note.id_value(), json!("n-1"));
        assert_eq!(Note::collection_key(), "notes");
        assert_eq!(serde_json::to_value(&note).unwrap()["id"], note.id_value());
    }
}
