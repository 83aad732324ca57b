// src/models/mailerlite.rs

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// --- TEMPLATES DE TRATAMENTO ---

/// Templates de formulário conhecidos. Qualquer outro identificador cai em `Standard`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreatmentTemplate {
    AntiWrinkle,
    DermalFiller,
    SkinBooster,
    Microneedling,
    ChemicalPeel,
    LaserHairRemoval,
    Prp,
    Standard,
}

// Campos de identidade vão para atributos fixos do assinante, nunca para campos customizados
pub const IDENTITY_FIELDS: &[&str] = &["firstName", "lastName", "email", "phone"];

// Enviados ao CRM para qualquer template
pub const COMMON_FIELDS: &[&str] = &[
    "dateOfBirth",
    "gender",
    "address",
    "postcode",
    "medicalConditions",
    "currentMedications",
    "allergies",
    "previousAestheticTreatments",
    "howDidYouHear",
    "marketingConsent",
];

impl TreatmentTemplate {
    pub fn parse(raw: Option<&str>) -> Self {
        let normalized = raw
            .map(|s| s.trim().to_ascii_lowercase().replace(['_', ' '], "-"))
            .unwrap_or_default();

        match normalized.as_str() {
            "anti-wrinkle" => TreatmentTemplate::AntiWrinkle,
            "dermal-filler" => TreatmentTemplate::DermalFiller,
            "skin-booster" => TreatmentTemplate::SkinBooster,
            "microneedling" => TreatmentTemplate::Microneedling,
            "chemical-peel" => TreatmentTemplate::ChemicalPeel,
            "laser-hair-removal" => TreatmentTemplate::LaserHairRemoval,
            "prp" => TreatmentTemplate::Prp,
            _ => TreatmentTemplate::Standard,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TreatmentTemplate::AntiWrinkle => "anti-wrinkle",
            TreatmentTemplate::DermalFiller => "dermal-filler",
            TreatmentTemplate::SkinBooster => "skin-booster",
            TreatmentTemplate::Microneedling => "microneedling",
            TreatmentTemplate::ChemicalPeel => "chemical-peel",
            TreatmentTemplate::LaserHairRemoval => "laser-hair-removal",
            TreatmentTemplate::Prp => "prp",
            TreatmentTemplate::Standard => "standard",
        }
    }

    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            TreatmentTemplate::AntiWrinkle => &[
                "treatmentAreas",
                "previousBotoxTreatment",
                "lastBotoxDate",
                "neuromuscularDisorders",
                "pregnantOrBreastfeeding",
                "desiredOutcome",
            ],
            TreatmentTemplate::DermalFiller => &[
                "treatmentAreas",
                "previousFillerTreatment",
                "fillerComplications",
                "coldSoreHistory",
                "bloodThinners",
                "pregnantOrBreastfeeding",
                "desiredOutcome",
            ],
            TreatmentTemplate::SkinBooster => &[
                "skinConcerns",
                "skinType",
                "previousSkinTreatments",
                "pregnantOrBreastfeeding",
            ],
            TreatmentTemplate::Microneedling => &[
                "skinConcerns",
                "skinType",
                "isotretinoinUse",
                "activeSkinInfection",
                "keloidScarring",
                "sunExposure",
            ],
            TreatmentTemplate::ChemicalPeel => &[
                "skinType",
                "fitzpatrickType",
                "retinoidUse",
                "isotretinoinUse",
                "sunExposure",
                "coldSoreHistory",
            ],
            TreatmentTemplate::LaserHairRemoval => &[
                "treatmentAreas",
                "fitzpatrickType",
                "hairColour",
                "photosensitiveMedication",
                "recentTan",
            ],
            TreatmentTemplate::Prp => &[
                "treatmentAreas",
                "bloodDisorders",
                "bloodThinners",
                "plateletCount",
            ],
            TreatmentTemplate::Standard => &["treatmentInterest", "additionalNotes"],
        }
    }

    /// União (sem repetição) dos campos comuns com os do template.
    pub fn synced_fields(&self) -> Vec<&'static str> {
        let mut fields: Vec<&'static str> = Vec::new();
        for field in COMMON_FIELDS.iter().chain(self.fields()) {
            if !fields.contains(field) {
                fields.push(field);
            }
        }
        fields
    }
}

// --- API DO MAILERLITE ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteField {
    #[serde(default)]
    pub id: Value,
    pub name: String,
    pub key: String,
    #[serde(rename = "type", default)]
    pub field_type: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldPage {
    #[serde(default)]
    pub data: Vec<RemoteField>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

#[derive(Debug, Deserialize)]
pub struct PageMeta {
    pub current_page: Option<u32>,
    pub last_page: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CreatedField {
    pub data: RemoteField,
}

#[derive(Debug, Serialize)]
pub struct CreateFieldRequest<'a> {
    pub name: &'a str,
    #[serde(rename = "type")]
    pub field_type: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SubscriberUpsert {
    pub email: String,
    pub fields: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
}
