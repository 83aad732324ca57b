// src/models/submission.rs

use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;
use validator::Validate;

// --- VALORES NORMALIZADOS ---

/// Valor de um campo depois da normalização: texto único ou lista.
/// Nunca vazio; campos vazios simplesmente não existem no mapa.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum FieldValue {
    Single(String),
    List(Vec<String>),
}

impl FieldValue {
    /// Representação em texto (listas viram "a, b, c").
    pub fn as_text(&self) -> String {
        match self {
            FieldValue::Single(value) => value.clone(),
            FieldValue::List(values) => values.join(", "),
        }
    }

    /// Primeiro valor (útil para nomes, e-mails e assinaturas).
    pub fn first(&self) -> &str {
        match self {
            FieldValue::Single(value) => value,
            FieldValue::List(values) => values.first().map(String::as_str).unwrap_or(""),
        }
    }
}

/// Mapa campo -> valor, na ordem em que o cliente enviou.
/// Montado uma vez por requisição e nunca alterado depois.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedSubmission {
    entries: Vec<(String, FieldValue)>,
}

impl NormalizedSubmission {
    pub(crate) fn from_entries(entries: Vec<(String, FieldValue)>) -> Self {
        Self { entries }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value)
    }

    /// Primeiro campo presente entre as chaves candidatas.
    pub fn first_text(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .find_map(|key| self.get(key))
            .map(FieldValue::first)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// --- PAYLOADS DE ENTRADA ---

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmissionPayload {
    #[validate(length(max = 200, message = "treatment_name_too_long"))]
    #[schema(example = "Anti-Wrinkle Injections")]
    pub treatment_name: Option<String>,

    #[validate(length(max = 300, message = "treatment_path_too_long"))]
    #[schema(example = "/treatments/anti-wrinkle")]
    pub treatment_path: Option<String>,

    #[validate(length(max = 80, message = "template_too_long"))]
    #[schema(example = "anti-wrinkle")]
    pub template: Option<String>,

    #[schema(example = "2026-10-19T10:15:00.000Z")]
    pub submitted_at: Option<String>,

    // Esquema aberto: a UI pode mandar qualquer campo
    #[serde(default)]
    #[schema(value_type = Object, example = json!({"firstName": "Jane", "email": "jane@example.com"}))]
    pub data: Value,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuidelineSubmissionPayload {
    #[validate(length(max = 200, message = "treatment_name_too_long"))]
    #[schema(example = "Waxing")]
    pub treatment_name: Option<String>,

    #[validate(length(max = 300, message = "treatment_path_too_long"))]
    pub treatment_path: Option<String>,

    #[validate(length(max = 80, message = "template_too_long"))]
    pub template: Option<String>,

    pub submitted_at: Option<String>,

    #[validate(length(max = 300, message = "guidelines_title_too_long"))]
    #[schema(example = "Waxing Pre & Post Care Guidelines")]
    pub guidelines_title: Option<String>,

    // Chegam crus: item inválido (ou blueprint que nem é lista) é descartado, não rejeitado
    #[schema(value_type = Option<Vec<Object>>)]
    pub field_blueprint: Option<Value>,

    #[schema(value_type = Option<Vec<Object>>)]
    pub content_blueprint: Option<Value>,

    #[serde(default)]
    #[schema(value_type = Object)]
    pub data: Value,
}

// --- RESPOSTAS ---

/// Resultado de uma integração opcional (CRM ou e-mail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct IntegrationStatus {
    pub enabled: bool,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skipped: Option<bool>,
    pub message: String,
}

impl IntegrationStatus {
    pub fn skipped(message: impl Into<String>) -> Self {
        Self { enabled: false, ok: false, skipped: Some(true), message: message.into() }
    }

    pub fn succeeded(message: impl Into<String>) -> Self {
        Self { enabled: true, ok: true, skipped: None, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { enabled: true, ok: false, skipped: None, message: message.into() }
    }

    pub fn is_skipped(&self) -> bool {
        self.skipped == Some(true)
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PdfAttachment {
    #[schema(example = "jane-anti-wrinkle-injections-consultation-form.pdf")]
    pub file_name: String,
    #[schema(example = "application/pdf")]
    pub mime_type: String,
    pub base64: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FormSubmissionResponse {
    pub ok: bool,
    pub message: String,
    #[schema(example = "anti-wrinkle-injections-20261019-3f9a1c2e")]
    pub submission_reference: String,
    pub mailer_lite: IntegrationStatus,
    pub pdf: PdfAttachment,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GuidelineSubmissionResponse {
    pub ok: bool,
    pub message: String,
    #[schema(example = "waxing-guidelines-20261019-3f9a1c2e")]
    pub submission_reference: String,
    pub pdf: PdfAttachment,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    #[schema(example = false)]
    pub ok: bool,
    #[schema(example = "No form data was submitted.")]
    pub error: String,
}
