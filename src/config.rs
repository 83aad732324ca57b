// src/config.rs

use std::{env, path::PathBuf, sync::Arc};

use crate::services::{
    document_service::DocumentService, mailerlite_service::MailerLiteService,
    notification_service::{NotificationService, SmtpEnv},
    submission_service::SubmissionService,
};

pub const DEFAULT_MAILERLITE_BASE_URL: &str = "https://connect.mailerlite.com/api";

#[derive(Debug, Clone)]
pub struct MailerLiteSettings {
    pub api_token: Option<String>,
    pub group_ids: Vec<String>,
    pub base_url: String,
}

/// Tudo que vem do ambiente, lido uma única vez na subida.
/// Nenhuma variável é obrigatória: ausência desliga a integração.
#[derive(Debug, Clone)]
pub struct FormsSettings {
    pub mailerlite: MailerLiteSettings,
    pub smtp: SmtpEnv,
    pub storage_dir: PathBuf,
}

impl FormsSettings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mailerlite = MailerLiteSettings {
            api_token: var("MAILERLITE_API_TOKEN"),
            group_ids: var("MAILERLITE_GROUP_IDS")
                .map(|ids| {
                    ids.split(',')
                        .map(str::trim)
                        .filter(|id| !id.is_empty())
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            base_url: var("MAILERLITE_API_BASE_URL")
                .unwrap_or_else(|| DEFAULT_MAILERLITE_BASE_URL.to_string()),
        };

        let smtp = SmtpEnv {
            host: var("FORMS_SMTP_HOST"),
            port: var("FORMS_SMTP_PORT"),
            secure: var("FORMS_SMTP_SECURE"),
            user: var("FORMS_SMTP_USER"),
            pass: var("FORMS_SMTP_PASS"),
            from: var("FORMS_PDF_EMAIL_FROM"),
            to: var("FORMS_PDF_EMAIL_TO"),
        };

        // Em ambiente serverless só o diretório temporário é gravável
        let storage_dir = match var("FORMS_PDF_STORAGE_DIR") {
            Some(dir) => PathBuf::from(dir),
            None if var("VERCEL").is_some() || var("AWS_LAMBDA_FUNCTION_NAME").is_some() => {
                env::temp_dir().join("form-submissions")
            }
            None => PathBuf::from("storage").join("form-submissions"),
        };

        Self { mailerlite, smtp, storage_dir }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<FormsSettings>,
    pub document_service: DocumentService,
    pub mailerlite_service: MailerLiteService,
    pub notification_service: NotificationService,
    pub submission_service: SubmissionService,
}

impl AppState {
    pub fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_settings(FormsSettings::from_env())
    }

    pub fn from_settings(settings: FormsSettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;

        tracing::info!(
            "⚙️ MailerLite: {} | SMTP: {} | PDFs em {}",
            if settings.mailerlite.api_token.is_some() { "ativo" } else { "desligado" },
            if settings.smtp.host.is_some() { "ativo" } else { "desligado" },
            settings.storage_dir.display()
        );

        // --- Monta o gráfico de dependências ---
        let submission_service = SubmissionService::new(settings.storage_dir.clone());

        Ok(Self {
            settings: Arc::new(settings),
            document_service: DocumentService::new(),
            mailerlite_service: MailerLiteService::new(http),
            notification_service: NotificationService::new(),
            submission_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> FormsSettings {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        FormsSettings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_disables_everything() {
        let settings = settings(&[]);

        assert!(settings.mailerlite.api_token.is_none());
        assert!(settings.mailerlite.group_ids.is_empty());
        assert_eq!(settings.mailerlite.base_url, DEFAULT_MAILERLITE_BASE_URL);
        assert!(settings.smtp.host.is_none());
        assert_eq!(settings.storage_dir, PathBuf::from("storage").join("form-submissions"));
    }

    #[test]
    fn reads_group_ids_and_blank_values() {
        let settings = settings(&[
            ("MAILERLITE_API_TOKEN", "  "),
            ("MAILERLITE_GROUP_IDS", "111, 222,,"),
            ("FORMS_SMTP_HOST", "smtp.example.com"),
        ]);

        assert!(settings.mailerlite.api_token.is_none());
        assert_eq!(settings.mailerlite.group_ids, vec!["111", "222"]);
        assert_eq!(settings.smtp.host.as_deref(), Some("smtp.example.com"));
    }

    #[test]
    fn storage_dir_follows_deployment() {
        let explicit = settings(&[("FORMS_PDF_STORAGE_DIR", "/data/pdfs"), ("VERCEL", "1")]);
        assert_eq!(explicit.storage_dir, PathBuf::from("/data/pdfs"));

        let lambda = settings(&[("AWS_LAMBDA_FUNCTION_NAME", "forms")]);
        assert_eq!(lambda.storage_dir, env::temp_dir().join("form-submissions"));
    }
}
