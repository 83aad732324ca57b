// src/services/blueprint_service.rs

use std::cmp::Ordering;

use serde_json::Value;

use crate::{
    common::text::humanize_key,
    models::{
        blueprint::{ADDITIONAL_SECTION, DEFAULT_FIELD_SECTION, INTERNAL_SECTION},
        ContentBlueprintItem, ContentKind, FieldBlueprintItem, InternalFieldKind,
        NormalizedSubmission,
    },
};

// Prefixos que a UI usa nos nomes dos campos e que não devem aparecer no rótulo
const LABEL_PREFIXES: &[&str] = &["guidelines", "guideline", "ack"];

// Os cinco campos internos do profissional, na ordem em que aparecem no PDF
const INTERNAL_FIELDS: &[(&str, &str, InternalFieldKind)] = &[
    (
        "employeeInternalNote",
        "To be completed by the treating practitioner after reviewing these guidelines with the client.",
        InternalFieldKind::Note,
    ),
    (
        "employeeElectronicConsent",
        "I confirm I have reviewed these guidelines with the client and answered their questions.",
        InternalFieldKind::Checkbox,
    ),
    ("employeeSignature", "Practitioner Signature", InternalFieldKind::Signature),
    ("employeeName", "Practitioner Name", InternalFieldKind::NameLine),
    ("employeeDate", "Date", InternalFieldKind::DateLine),
];

/// Estrutura final usada pelo layout do PDF de guidelines.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedBlueprint {
    pub content: Vec<ContentBlueprintItem>,
    pub fields: Vec<FieldBlueprintItem>,
}

/// Pipeline completo: campos declarados (ou derivados dos dados), campos extras
/// não declarados e, por último, o bloco interno do profissional.
pub fn resolve_blueprint(
    field_blueprint: Option<&[Value]>,
    content_blueprint: Option<&[Value]>,
    submission: &NormalizedSubmission,
) -> ResolvedBlueprint {
    let mut fields = resolve_field_blueprint(field_blueprint);

    if fields.is_empty() {
        fields = derive_field_blueprint(submission);
    } else {
        let extras = unreferenced_fields(&fields, submission);
        fields.extend(extras);
    }

    ResolvedBlueprint {
        content: resolve_content_blueprint(content_blueprint),
        fields: ensure_internal_employee_fields(fields, submission),
    }
}

// =============================================================================
//  CAMPOS
// =============================================================================

pub fn resolve_field_blueprint(raw: Option<&[Value]>) -> Vec<FieldBlueprintItem> {
    let mut items: Vec<FieldBlueprintItem> = raw
        .unwrap_or_default()
        .iter()
        .filter_map(parse_field_item)
        .collect();

    // sort_by é estável: empates mantêm a ordem de entrada
    items.sort_by(|a, b| compare_order(a.order, b.order));
    items
}

fn parse_field_item(raw: &Value) -> Option<FieldBlueprintItem> {
    let obj = raw.as_object()?;
    let name = non_empty_str(obj.get("name"))?;

    let label = non_empty_str(obj.get("label"))
        .map(str::to_string)
        .unwrap_or_else(|| derive_label(name));

    let section = non_empty_str(obj.get("section"))
        .unwrap_or(DEFAULT_FIELD_SECTION)
        .to_string();

    Some(FieldBlueprintItem {
        name: name.to_string(),
        label,
        section,
        order: parse_order(obj.get("order")),
        internal: None,
    })
}

/// Sem blueprint do cliente: um item por campo enviado, na ordem recebida.
pub fn derive_field_blueprint(submission: &NormalizedSubmission) -> Vec<FieldBlueprintItem> {
    submission
        .keys()
        .map(|key| FieldBlueprintItem {
            name: key.to_string(),
            label: derive_label(key),
            section: DEFAULT_FIELD_SECTION.to_string(),
            order: None,
            internal: None,
        })
        .collect()
}

fn unreferenced_fields(
    fields: &[FieldBlueprintItem],
    submission: &NormalizedSubmission,
) -> Vec<FieldBlueprintItem> {
    submission
        .keys()
        .filter(|key| !fields.iter().any(|field| field.name == *key))
        .map(|key| FieldBlueprintItem {
            name: key.to_string(),
            label: derive_label(key),
            section: ADDITIONAL_SECTION.to_string(),
            order: None,
            internal: None,
        })
        .collect()
}

/// "guidelineAftercareRead" -> "Aftercare Read"
pub fn derive_label(name: &str) -> String {
    let lowered = name.to_ascii_lowercase();

    let stripped = LABEL_PREFIXES
        .iter()
        .find_map(|prefix| {
            if !lowered.starts_with(prefix) {
                return None;
            }
            let rest = &name[prefix.len()..];
            let starts_new_word = rest
                .chars()
                .next()
                .is_some_and(|c| c.is_uppercase() || c == '_' || c == '-');
            starts_new_word.then_some(rest)
        })
        .unwrap_or(name);

    let label = humanize_key(stripped);
    if label.is_empty() { humanize_key(name) } else { label }
}

// =============================================================================
//  CONTEÚDO
// =============================================================================

pub fn resolve_content_blueprint(raw: Option<&[Value]>) -> Vec<ContentBlueprintItem> {
    let mut items: Vec<ContentBlueprintItem> = raw
        .unwrap_or_default()
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let text = non_empty_str(obj.get("text"))?;

            Some(ContentBlueprintItem {
                kind: ContentKind::parse(obj.get("kind").and_then(Value::as_str)),
                text: text.to_string(),
                section: non_empty_str(obj.get("section")).map(str::to_string),
                order: parse_order(obj.get("order")),
            })
        })
        .collect();

    items.sort_by(|a, b| compare_order(a.order, b.order));
    items
}

// =============================================================================
//  BLOCO INTERNO DO PROFISSIONAL
// =============================================================================

/// Garante que todo PDF de guidelines tenha o bloco de assinatura do profissional.
/// Se qualquer campo (no blueprint ou nos dados) já casa com "employee", nada muda.
pub fn ensure_internal_employee_fields(
    mut fields: Vec<FieldBlueprintItem>,
    submission: &NormalizedSubmission,
) -> Vec<FieldBlueprintItem> {
    let has_employee_field = fields.iter().any(|field| mentions_employee(&field.name))
        || submission.keys().any(mentions_employee);

    if has_employee_field {
        return fields;
    }

    let next_order = fields
        .iter()
        .filter_map(|field| field.order)
        .fold(None, |max: Option<f64>, order| Some(max.map_or(order, |m| m.max(order))))
        .map(|max| max.floor() + 1.0)
        .unwrap_or(fields.len() as f64);

    for (index, (name, label, kind)) in INTERNAL_FIELDS.iter().enumerate() {
        fields.push(FieldBlueprintItem {
            name: name.to_string(),
            label: label.to_string(),
            section: INTERNAL_SECTION.to_string(),
            order: Some(next_order + index as f64),
            internal: Some(*kind),
        });
    }

    fields
}

fn mentions_employee(name: &str) -> bool {
    name.to_ascii_lowercase().contains("employee")
}

// --- helpers ---

fn non_empty_str(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn parse_order(value: Option<&Value>) -> Option<f64> {
    let order = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    order.is_finite().then_some(order)
}

// Itens sem ordem vão para o fim
fn compare_order(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::normalizer::{normalize_payload, ListPolicy};
    use serde_json::json;

    fn submission(data: Value) -> NormalizedSubmission {
        normalize_payload(&data, ListPolicy::CollapseSingle)
    }

    fn count_internal(fields: &[FieldBlueprintItem]) -> usize {
        fields.iter().filter(|f| f.section == INTERNAL_SECTION).count()
    }

    #[test]
    fn drops_malformed_field_items() {
        let raw = vec![
            json!({ "name": "clientName", "label": "Client name", "order": 2 }),
            json!({ "label": "No name" }),
            json!({ "name": "   " }),
            json!("not an object"),
            json!({ "name": "aftercareRead", "order": 1 }),
        ];

        let fields = resolve_field_blueprint(Some(raw.as_slice()));

        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["aftercareRead", "clientName"]);
        assert_eq!(fields[0].label, "Aftercare Read");
        assert_eq!(fields[0].section, DEFAULT_FIELD_SECTION);
    }

    #[test]
    fn unordered_items_sort_last_and_ties_keep_input_order() {
        let raw = vec![
            json!({ "name": "c" }),
            json!({ "name": "a", "order": 5 }),
            json!({ "name": "d" }),
            json!({ "name": "b", "order": "5" }),
            json!({ "name": "first", "order": -1 }),
        ];

        let fields = resolve_field_blueprint(Some(raw.as_slice()));
        let names: Vec<&str> = fields.iter().map(|f| f.name.as_str()).collect();

        assert_eq!(names, vec!["first", "a", "b", "c", "d"]);
    }

    #[test]
    fn derive_label_strips_known_prefix() {
        assert_eq!(derive_label("guidelineAftercareRead"), "Aftercare Read");
        assert_eq!(derive_label("ack_no_sunbeds"), "No Sunbeds");
        assert_eq!(derive_label("clientSignatureWax"), "Client Signature Wax");
        // "acknowledged" não é o prefixo "ack" seguido de palavra nova
        assert_eq!(derive_label("acknowledged"), "Acknowledged");
        assert_eq!(derive_label("guidelines"), "Guidelines");
    }

    #[test]
    fn content_items_need_text_and_default_to_paragraph() {
        let raw = vec![
            json!({ "kind": "heading", "text": "Before your treatment", "order": 0 }),
            json!({ "kind": "bullet" }),
            json!({ "kind": "marquee", "text": "Avoid sunbeds", "order": 2 }),
            json!({ "kind": "bullet", "text": "No retinol", "order": 1, "section": "Before" }),
        ];

        let content = resolve_content_blueprint(Some(raw.as_slice()));

        assert_eq!(content.len(), 3);
        assert_eq!(content[0].kind, ContentKind::Heading);
        assert_eq!(content[1].kind, ContentKind::Bullet);
        assert_eq!(content[1].section.as_deref(), Some("Before"));
        assert_eq!(content[2].kind, ContentKind::Paragraph);
    }

    #[test]
    fn injects_practitioner_block_after_highest_order() {
        let raw = vec![
            json!({ "name": "clientName", "order": 3 }),
            json!({ "name": "clientSignature", "order": 7.5 }),
        ];
        let data = submission(json!({ "clientName": "Jane" }));

        let resolved = resolve_blueprint(Some(raw.as_slice()), None, &data);
        let internal: Vec<&FieldBlueprintItem> = resolved
            .fields
            .iter()
            .filter(|f| f.internal.is_some())
            .collect();

        assert_eq!(internal.len(), 5);
        assert_eq!(internal[0].order, Some(8.0));
        assert_eq!(internal[4].order, Some(12.0));
        assert_eq!(internal[2].internal, Some(InternalFieldKind::Signature));
        assert!(internal.iter().all(|f| f.section == INTERNAL_SECTION));
    }

    #[test]
    fn practitioner_block_is_idempotent() {
        let data = submission(json!({ "clientName": "Jane" }));

        let once = ensure_internal_employee_fields(derive_field_blueprint(&data), &data);
        let twice = ensure_internal_employee_fields(once.clone(), &data);

        assert_eq!(count_internal(&once), 5);
        assert_eq!(once, twice);
    }

    #[test]
    fn existing_employee_field_suppresses_injection() {
        let data = submission(json!({ "clientName": "Jane", "EmployeeInitials": "AB" }));
        let fields = ensure_internal_employee_fields(Vec::new(), &data);
        assert!(fields.is_empty());

        let raw = vec![json!({ "name": "employee_sign_off" })];
        let resolved = resolve_blueprint(Some(raw.as_slice()), None, &submission(json!({ "a": "b" })));
        assert_eq!(count_internal(&resolved.fields), 0);
    }

    #[test]
    fn unreferenced_keys_land_in_additional_section() {
        let raw = vec![json!({ "name": "clientName" })];
        let data = submission(json!({ "clientName": "Jane", "extraQuestion": "Yes" }));

        let resolved = resolve_blueprint(Some(raw.as_slice()), None, &data);

        let extra = resolved
            .fields
            .iter()
            .find(|f| f.name == "extraQuestion")
            .expect("extra field");
        assert_eq!(extra.section, ADDITIONAL_SECTION);
        assert_eq!(extra.label, "Extra Question");
    }

    #[test]
    fn missing_blueprint_is_derived_from_data() {
        let data = submission(json!({ "firstName": "Jane", "aftercareRead": "Yes" }));

        let resolved = resolve_blueprint(None, None, &data);

        assert_eq!(resolved.fields[0].name, "firstName");
        assert_eq!(resolved.fields[1].label, "Aftercare Read");
        assert_eq!(count_internal(&resolved.fields), 5);
    }
}
