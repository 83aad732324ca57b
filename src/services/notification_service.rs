// src/services/notification_service.rs

use std::fmt::Display;

use anyhow::Context;
use lettre::{
    message::{header::ContentType, Attachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use thiserror::Error;

use crate::{models::IntegrationStatus, services::submission_service::ClientContact};

const DEFAULT_SMTP_PORT: u16 = 587;

/// Variáveis FORMS_SMTP_* / FORMS_PDF_EMAIL_* como vieram do ambiente.
#[derive(Debug, Clone, Default)]
pub struct SmtpEnv {
    pub host: Option<String>,
    pub port: Option<String>,
    pub secure: Option<String>,
    pub user: Option<String>,
    pub pass: Option<String>,
    pub from: Option<String>,
    pub to: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("FORMS_SMTP_USER e FORMS_SMTP_PASS devem ser definidos juntos")]
    PartialCredentials,

    #[error("FORMS_SMTP_PORT inválida: '{0}'")]
    InvalidPort(String),

    #[error("Endereço de e-mail inválido em {field}: '{value}'")]
    InvalidAddress { field: &'static str, value: String },
}

/// Configuração SMTP validada. Resolvida a cada requisição.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub secure: bool,
    pub credentials: Option<(String, String)>,
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_mailbox(field: &'static str, value: &str) -> Result<Mailbox, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

fn parse_bool(value: Option<&str>) -> bool {
    matches!(
        value.map(str::to_ascii_lowercase).as_deref(),
        Some("true" | "1" | "yes" | "on")
    )
}

impl SmtpConfig {
    /// `Ok(None)`: e-mail não configurado. `Err`: configurado errado.
    pub fn resolve(env: &SmtpEnv) -> Result<Option<Self>, ConfigError> {
        let recipients: Vec<&str> = present(&env.to)
            .map(|to| to.split(',').map(str::trim).filter(|v| !v.is_empty()).collect())
            .unwrap_or_default();

        let (Some(host), Some(from)) = (present(&env.host), present(&env.from)) else {
            return Ok(None);
        };
        if recipients.is_empty() {
            return Ok(None);
        }

        let credentials = match (present(&env.user), present(&env.pass)) {
            (Some(user), Some(pass)) => Some((user.to_string(), pass.to_string())),
            (None, None) => None,
            _ => return Err(ConfigError::PartialCredentials),
        };

        let port = match present(&env.port) {
            None => DEFAULT_SMTP_PORT,
            Some(raw) => match raw.parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => return Err(ConfigError::InvalidPort(raw.to_string())),
            },
        };

        let to = recipients
            .into_iter()
            .map(|address| parse_mailbox("FORMS_PDF_EMAIL_TO", address))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Self {
            host: host.to_string(),
            port,
            secure: parse_bool(present(&env.secure)),
            credentials,
            from: parse_mailbox("FORMS_PDF_EMAIL_FROM", from)?,
            to,
        }))
    }

    // secure => TLS implícito (465); senão STARTTLS quando o servidor oferecer
    pub fn build_transport(&self) -> anyhow::Result<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if self.secure {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&self.host)
                .context("falha ao configurar TLS do SMTP")?
        } else {
            let tls = TlsParameters::new(self.host.clone())
                .context("falha ao configurar STARTTLS do SMTP")?;
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.host)
                .tls(Tls::Opportunistic(tls))
        };

        let builder = builder.port(self.port);
        let builder = match &self.credentials {
            Some((user, pass)) => builder.credentials(Credentials::new(user.clone(), pass.clone())),
            None => builder,
        };

        Ok(builder.build())
    }
}

/// O que vai no e-mail para a clínica.
#[derive(Debug, Clone)]
pub struct Notification<'a> {
    pub document_title: &'a str,
    pub reference: &'a str,
    pub treatment_name: &'a str,
    pub template: Option<&'a str>,
    pub submitted_at: &'a str,
    pub contact: &'a ClientContact,
    pub file_name: &'a str,
    pub pdf: &'a [u8],
}

impl Notification<'_> {
    pub fn subject(&self) -> String {
        match self.contact.full_name.as_deref() {
            Some(name) => format!("{}: {} ({})", self.document_title, name, self.reference),
            None => format!("{} ({})", self.document_title, self.reference),
        }
    }

    pub fn body(&self) -> String {
        let mut lines = vec![
            format!("A new {} was submitted.", self.document_title.to_lowercase()),
            String::new(),
            format!("Reference: {}", self.reference),
            format!("Treatment: {}", self.treatment_name),
        ];
        if let Some(template) = self.template {
            lines.push(format!("Form template: {}", template));
        }
        lines.push(format!("Submitted: {}", self.submitted_at));

        let client = [
            ("Client", self.contact.full_name.as_deref()),
            ("Email", self.contact.email.as_deref()),
            ("Phone", self.contact.phone.as_deref()),
        ];
        if client.iter().any(|(_, value)| value.is_some()) {
            lines.push(String::new());
            for (label, value) in client {
                if let Some(value) = value {
                    lines.push(format!("{}: {}", label, value));
                }
            }
        }

        lines.push(String::new());
        lines.push(format!("The PDF is attached as {}.", self.file_name));
        lines.join("\n")
    }

    fn to_message(&self, config: &SmtpConfig) -> anyhow::Result<Message> {
        let mut builder = Message::builder()
            .from(config.from.clone())
            .subject(self.subject());
        for recipient in &config.to {
            builder = builder.to(recipient.clone());
        }
        if let Some(reply_to) = self.contact.email.as_deref().and_then(|e| e.parse::<Mailbox>().ok()) {
            builder = builder.reply_to(reply_to);
        }

        let pdf_type = ContentType::parse("application/pdf").context("content type do PDF")?;
        let message = builder
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(self.body()))
                    .singlepart(
                        Attachment::new(self.file_name.to_string()).body(self.pdf.to_vec(), pdf_type),
                    ),
            )
            .context("falha ao montar a mensagem de e-mail")?;

        Ok(message)
    }
}

#[derive(Clone, Default)]
pub struct NotificationService;

impl NotificationService {
    pub fn new() -> Self {
        Self
    }

    /// Envia o PDF para a equipe da clínica. Nunca falha: o resultado é um status.
    pub async fn notify(&self, env: &SmtpEnv, notification: &Notification<'_>) -> IntegrationStatus {
        let config = match SmtpConfig::resolve(env) {
            Ok(Some(config)) => config,
            Ok(None) => {
                tracing::info!("E-mail da clínica não configurado, envio ignorado");
                return IntegrationStatus::skipped("Email delivery is not configured.");
            }
            Err(e) => {
                tracing::error!("🔥 Configuração SMTP inválida: {}", e);
                return IntegrationStatus::failed("Email delivery is misconfigured.");
            }
        };

        match config.build_transport() {
            Ok(transport) => self.deliver(&transport, &config, notification).await,
            Err(e) => {
                tracing::error!("🔥 Falha ao preparar o transporte SMTP: {:#}", e);
                IntegrationStatus::failed("Email delivery failed.")
            }
        }
    }

    pub async fn deliver<T>(
        &self,
        transport: &T,
        config: &SmtpConfig,
        notification: &Notification<'_>,
    ) -> IntegrationStatus
    where
        T: AsyncTransport + Sync,
        T::Error: Display,
    {
        let message = match notification.to_message(config) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!("🔥 {:#}", e);
                return IntegrationStatus::failed("Email delivery failed.");
            }
        };

        match transport.send(message).await {
            Ok(_) => {
                tracing::info!(
                    "📧 PDF {} enviado para {} destinatário(s)",
                    notification.reference,
                    config.to.len()
                );
                IntegrationStatus::succeeded("PDF emailed to the clinic.")
            }
            Err(e) => {
                tracing::error!("🔥 Falha no envio SMTP de {}: {}", notification.reference, e);
                IntegrationStatus::failed("Email delivery failed.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lettre::transport::stub::AsyncStubTransport;

    fn configured_env() -> SmtpEnv {
        SmtpEnv {
            host: Some("smtp.example.com".to_string()),
            from: Some("Clinic Forms <forms@example.com>".to_string()),
            to: Some("reception@example.com, doctor@example.com".to_string()),
            ..Default::default()
        }
    }

    fn contact() -> ClientContact {
        ClientContact {
            first_name: Some("Jane".to_string()),
            last_name: Some("Doe".to_string()),
            full_name: Some("Jane Doe".to_string()),
            email: Some("jane@example.com".to_string()),
            phone: Some("07700 900000".to_string()),
        }
    }

    fn notification(contact: &ClientContact) -> Notification<'_> {
        Notification {
            document_title: "Consultation Form",
            reference: "dermal-filler-20261019-abcd1234",
            treatment_name: "Dermal Filler",
            template: Some("dermal-filler"),
            submitted_at: "19 October 2026, 09:30 UTC",
            contact,
            file_name: "jane-dermal-filler-consultation-form.pdf",
            pdf: b"%PDF-1.5 test",
        }
    }

    #[test]
    fn missing_host_from_or_to_is_not_configured() {
        assert!(SmtpConfig::resolve(&SmtpEnv::default()).unwrap().is_none());

        let no_to = SmtpEnv { to: Some(" , ".to_string()), ..configured_env() };
        assert!(SmtpConfig::resolve(&no_to).unwrap().is_none());

        let no_from = SmtpEnv { from: None, ..configured_env() };
        assert!(SmtpConfig::resolve(&no_from).unwrap().is_none());
    }

    #[test]
    fn resolves_defaults() {
        let config = SmtpConfig::resolve(&configured_env()).unwrap().unwrap();

        assert_eq!(config.port, 587);
        assert!(!config.secure);
        assert!(config.credentials.is_none());
        assert_eq!(config.to.len(), 2);
    }

    #[test]
    fn partial_credentials_are_an_error() {
        let env = SmtpEnv { user: Some("mailer".to_string()), ..configured_env() };
        assert_eq!(SmtpConfig::resolve(&env).unwrap_err(), ConfigError::PartialCredentials);
    }

    #[test]
    fn invalid_ports_are_an_error() {
        for port in ["abc", "0", "-25", "2.5", "70000"] {
            let env = SmtpEnv { port: Some(port.to_string()), ..configured_env() };
            assert!(
                matches!(SmtpConfig::resolve(&env), Err(ConfigError::InvalidPort(_))),
                "port {port}"
            );
        }
    }

    #[test]
    fn secure_flag_accepts_boolish_values() {
        let env = SmtpEnv { secure: Some("YES".to_string()), port: Some("465".to_string()), ..configured_env() };
        let config = SmtpConfig::resolve(&env).unwrap().unwrap();
        assert!(config.secure);
        assert_eq!(config.port, 465);
    }

    #[tokio::test]
    async fn notify_reports_skipped_and_failed() {
        let service = NotificationService::new();
        let contact = contact();

        let skipped = service.notify(&SmtpEnv::default(), &notification(&contact)).await;
        assert!(skipped.is_skipped());

        let env = SmtpEnv { pass: Some("secret".to_string()), ..configured_env() };
        let failed = service.notify(&env, &notification(&contact)).await;
        assert!(!failed.ok);
        assert!(!failed.is_skipped());

        let env = SmtpEnv { port: Some("smtp".to_string()), ..configured_env() };
        assert!(!service.notify(&env, &notification(&contact)).await.ok);
    }

    #[tokio::test]
    async fn delivers_summary_with_pdf_attached() {
        let service = NotificationService::new();
        let config = SmtpConfig::resolve(&configured_env()).unwrap().unwrap();
        let transport = AsyncStubTransport::new_ok();
        let contact = contact();

        let status = service.deliver(&transport, &config, &notification(&contact)).await;

        assert!(status.ok);
        let sent = transport.messages().await;
        assert_eq!(sent.len(), 1);
        let (envelope, raw) = &sent[0];
        assert_eq!(envelope.to().len(), 2);
        assert!(raw.contains("Reference: dermal-filler-20261019-abcd1234"));
        assert!(raw.contains("Reply-To: jane@example.com"));
        assert!(raw.contains("application/pdf"));
        assert!(raw.contains("jane-dermal-filler-consultation-form.pdf"));
    }

    #[tokio::test]
    async fn transport_errors_become_failed_status() {
        let service = NotificationService::new();
        let config = SmtpConfig::resolve(&configured_env()).unwrap().unwrap();
        let transport = AsyncStubTransport::new_error();
        let contact = contact();

        let status = service.deliver(&transport, &config, &notification(&contact)).await;

        assert!(!status.ok);
        assert!(status.enabled);
    }

    #[test]
    fn body_omits_missing_client_details() {
        let anonymous = ClientContact::default();
        let body = notification(&anonymous).body();

        assert!(body.contains("Treatment: Dermal Filler"));
        assert!(!body.contains("Email:"));
        assert!(!body.contains("Client:"));
    }
}
