// src/models/blueprint.rs

use serde::{Deserialize, Serialize};

// Seção padrão para campos que o cliente não agrupou
pub const DEFAULT_FIELD_SECTION: &str = "Client Acknowledgement";

pub const INTERNAL_SECTION: &str = "Practitioner Acknowledgement (Internal Use Only)";

pub const ADDITIONAL_SECTION: &str = "Additional Information";

/// Como um campo interno (sintetizado) é desenhado no PDF.
/// Campos do cliente não têm tipo interno e mostram o próprio valor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InternalFieldKind {
    Note,
    Checkbox,
    Signature,
    NameLine,
    DateLine,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldBlueprintItem {
    pub name: String,
    pub label: String,
    pub section: String,
    // None = "no fim"
    pub order: Option<f64>,
    pub internal: Option<InternalFieldKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Heading,
    Subheading,
    Paragraph,
    Bullet,
    Label,
}

impl ContentKind {
    /// Tipos desconhecidos viram parágrafo.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("heading") => ContentKind::Heading,
            Some("subheading") => ContentKind::Subheading,
            Some("bullet") => ContentKind::Bullet,
            Some("label") => ContentKind::Label,
            _ => ContentKind::Paragraph,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentBlueprintItem {
    pub kind: ContentKind,
    pub text: String,
    pub section: Option<String>,
    pub order: Option<f64>,
}
