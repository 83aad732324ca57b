// src/services/submission_service.rs

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::ValidateEmail;

use crate::{
    common::text::{slugify, slugify_or},
    models::NormalizedSubmission,
};

const FIRST_NAME_KEYS: &[&str] = &["firstName", "first_name", "clientFirstName"];
const LAST_NAME_KEYS: &[&str] = &["lastName", "last_name", "clientLastName"];
const FULL_NAME_KEYS: &[&str] = &["fullName", "name", "clientName"];
const EMAIL_KEYS: &[&str] = &["email", "emailAddress", "clientEmail"];
const PHONE_KEYS: &[&str] = &["phone", "phoneNumber", "mobile", "clientPhone"];

/// Qual dos dois documentos está sendo gerado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    ConsultationForm,
    Guidelines,
}

impl DocumentKind {
    fn reference_infix(&self) -> &'static str {
        match self {
            DocumentKind::ConsultationForm => "",
            DocumentKind::Guidelines => "guidelines-",
        }
    }

    fn filename_suffix(&self) -> &'static str {
        match self {
            DocumentKind::ConsultationForm => "consultation-form",
            DocumentKind::Guidelines => "guidelines",
        }
    }
}

// =============================================================================
//  DADOS DO CLIENTE
// =============================================================================

/// Identidade do cliente extraída da submissão. O e-mail só aparece se for válido.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientContact {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl ClientContact {
    pub fn from_submission(submission: &NormalizedSubmission) -> Self {
        let full_name = submission.first_text(FULL_NAME_KEYS).map(str::to_string);
        let mut name_parts = full_name.as_deref().unwrap_or_default().split_whitespace();
        let full_first = name_parts.next().map(str::to_string);
        let full_rest = name_parts.collect::<Vec<_>>().join(" ");

        let first_name = submission
            .first_text(FIRST_NAME_KEYS)
            .map(str::to_string)
            .or(full_first);
        let last_name = submission
            .first_text(LAST_NAME_KEYS)
            .map(str::to_string)
            .or_else(|| (!full_rest.is_empty()).then_some(full_rest));

        let full_name = full_name.or_else(|| {
            let joined = [first_name.as_deref(), last_name.as_deref()]
                .into_iter()
                .flatten()
                .collect::<Vec<_>>()
                .join(" ");
            (!joined.is_empty()).then_some(joined)
        });

        let email = submission
            .first_text(EMAIL_KEYS)
            .map(|email| email.trim().to_string())
            .filter(|email| email.validate_email());

        Self {
            first_name,
            last_name,
            full_name,
            email,
            phone: submission.first_text(PHONE_KEYS).map(str::to_string),
        }
    }
}

// =============================================================================
//  REFERÊNCIA, NOME DO ARQUIVO E DATA
// =============================================================================

/// `{tratamento}-{guidelines-}{AAAAMMDD}-{8 hex}`. A unicidade vem do sufixo aleatório.
pub fn submission_reference(
    treatment_name: Option<&str>,
    kind: DocumentKind,
    now: DateTime<Utc>,
) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}{}-{}",
        slugify_or(treatment_name, "treatment"),
        kind.reference_infix(),
        now.format("%Y%m%d"),
        &suffix[..8]
    )
}

pub fn download_filename(
    contact: &ClientContact,
    treatment_name: Option<&str>,
    kind: DocumentKind,
) -> String {
    let client = contact
        .first_name
        .as_deref()
        .map(slugify)
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| "client".to_string());

    format!(
        "{}-{}-{}.pdf",
        client,
        slugify_or(treatment_name, "treatment"),
        kind.filename_suffix()
    )
}

/// Data legível para o PDF e o e-mail. Valor não-RFC3339 é mostrado como veio.
pub fn format_submitted_at(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let display = |at: DateTime<Utc>| at.format("%-d %B %Y, %H:%M UTC").to_string();

    match raw.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => DateTime::parse_from_rfc3339(value)
            .map(|parsed| display(parsed.with_timezone(&Utc)))
            .unwrap_or_else(|_| value.to_string()),
        None => display(now),
    }
}

// =============================================================================
//  CÓPIA EM DISCO
// =============================================================================

#[derive(Clone)]
pub struct SubmissionService {
    storage_dir: PathBuf,
}

impl SubmissionService {
    pub fn new(storage_dir: PathBuf) -> Self {
        Self { storage_dir }
    }

    /// Grava `{dir}/{referência}.pdf`. Melhor esforço: falha só gera log.
    pub async fn store_pdf(&self, reference: &str, bytes: &[u8]) -> Option<PathBuf> {
        let path = self.storage_dir.join(format!("{reference}.pdf"));

        let result = async {
            tokio::fs::create_dir_all(&self.storage_dir).await?;
            tokio::fs::write(&path, bytes).await
        }
        .await;

        match result {
            Ok(()) => {
                tracing::info!("💾 PDF salvo em {}", path.display());
                Some(path)
            }
            Err(e) => {
                tracing::warn!("⚠️ Não foi possível salvar o PDF em {}: {}", path.display(), e);
                None
            }
        }
    }
}
