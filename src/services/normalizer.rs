// src/services/normalizer.rs

use serde_json::Value;

use crate::models::{FieldValue, NormalizedSubmission};

/// O que fazer com listas de um único item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPolicy {
    /// Formulários: lista continua lista (vira "a, b" só na renderização)
    Keep,
    /// Guidelines: ["x"] vira "x"
    CollapseSingle,
}

/// Converte o objeto `data` cru em um mapa tipado.
/// Nunca falha: no pior caso devolve um mapa vazio (o handler responde 400).
pub fn normalize_payload(data: &Value, policy: ListPolicy) -> NormalizedSubmission {
    let Some(obj) = data.as_object() else {
        return NormalizedSubmission::default();
    };

    let mut entries = Vec::with_capacity(obj.len());

    for (key, value) in obj {
        let normalized = match value {
            Value::String(text) => {
                let trimmed = text.trim();
                (!trimmed.is_empty()).then(|| FieldValue::Single(trimmed.to_string()))
            }
            Value::Array(items) => {
                let values: Vec<String> = items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .map(str::to_string)
                    .collect();

                match (values.len(), policy) {
                    (0, _) => None,
                    (1, ListPolicy::CollapseSingle) => {
                        values.into_iter().next().map(FieldValue::Single)
                    }
                    _ => Some(FieldValue::List(values)),
                }
            }
            // Números, booleanos, objetos e null são ignorados
            _ => None,
        };

        if let Some(field_value) = normalized {
            entries.push((key.clone(), field_value));
        }
    }

    NormalizedSubmission::from_entries(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_only_trimmed_non_empty_strings() {
        let data = json!({
            "firstName": "  Jane ",
            "lastName": "   ",
            "notes": "",
            "age": 42,
            "consent": true,
            "nested": { "a": "b" },
            "missing": null,
        });

        let submission = normalize_payload(&data, ListPolicy::Keep);

        assert_eq!(submission.len(), 1);
        assert_eq!(
            submission.get("firstName"),
            Some(&FieldValue::Single("Jane".to_string()))
        );
        assert!(!submission.contains_key("lastName"));
        assert!(!submission.contains_key("notes"));
    }

    #[test]
    fn filters_list_elements() {
        let data = json!({
            "areas": [" Forehead ", "", 3, null, "Crow's feet"],
            "empty": ["  ", 1, false],
        });

        let submission = normalize_payload(&data, ListPolicy::Keep);

        assert_eq!(
            submission.get("areas"),
            Some(&FieldValue::List(vec!["Forehead".to_string(), "Crow's feet".to_string()]))
        );
        assert!(!submission.contains_key("empty"));
        assert_eq!(submission.get("areas").map(FieldValue::as_text).as_deref(), Some("Forehead, Crow's feet"));
    }

    #[test]
    fn single_item_lists_depend_on_policy() {
        let data = json!({ "areas": ["Forehead", "  "] });

        let kept = normalize_payload(&data, ListPolicy::Keep);
        assert_eq!(kept.get("areas"), Some(&FieldValue::List(vec!["Forehead".to_string()])));

        let collapsed = normalize_payload(&data, ListPolicy::CollapseSingle);
        assert_eq!(collapsed.get("areas"), Some(&FieldValue::Single("Forehead".to_string())));
    }

    #[test]
    fn preserves_insertion_order_and_unknown_keys() {
        let data = json!({ "zeta": "1", "alpha": "2", "someBrandNewField": "3" });

        let submission = normalize_payload(&data, ListPolicy::Keep);
        let keys: Vec<&str> = submission.keys().collect();

        assert_eq!(keys, vec!["zeta", "alpha", "someBrandNewField"]);
    }

    #[test]
    fn non_object_input_is_empty() {
        assert!(normalize_payload(&json!(["a"]), ListPolicy::Keep).is_empty());
        assert!(normalize_payload(&Value::Null, ListPolicy::Keep).is_empty());
        assert!(normalize_payload(&json!({}), ListPolicy::Keep).is_empty());
    }
}
