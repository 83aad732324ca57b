// src/services/mailerlite_service.rs

use reqwest::{header::ACCEPT, StatusCode};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::{
    config::MailerLiteSettings,
    models::{
        mailerlite::{
            CreateFieldRequest, CreatedField, FieldPage, RemoteField, SubscriberUpsert,
            IDENTITY_FIELDS,
        },
        IntegrationStatus, NormalizedSubmission, TreatmentTemplate,
    },
    services::submission_service::ClientContact,
};

const FIELD_PAGE_SIZE: u32 = 100;
// O catálogo de campos é pequeno; isso só evita laço infinito com API quebrada
const MAX_FIELD_PAGES: u32 = 20;
const REMOTE_FIELD_PREFIX: &str = "form_";

#[derive(Debug, Error)]
pub enum MailerLiteError {
    #[error("Falha de comunicação com o MailerLite: {0}")]
    Http(#[from] reqwest::Error),

    #[error("MailerLite respondeu {status}: {body}")]
    Status { status: StatusCode, body: String },
}

// =============================================================================
//  CATÁLOGO DE CAMPOS (escopo da requisição)
// =============================================================================

/// "Skin Type " -> "skin_type"
pub fn normalize_field_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// Campos customizados do MailerLite, buscados uma vez por requisição.
/// Campos criados durante a sincronização entram aqui, então o mesmo
/// campo nunca é criado duas vezes na mesma requisição.
#[derive(Debug, Default)]
pub struct FieldCatalog {
    fields: Vec<RemoteField>,
}

impl FieldCatalog {
    pub fn new(fields: Vec<RemoteField>) -> Self {
        Self { fields }
    }

    /// Procura por nome OU chave normalizados.
    pub fn find(&self, wanted: &str) -> Option<&RemoteField> {
        let wanted = normalize_field_name(wanted);
        self.fields.iter().find(|field| {
            normalize_field_name(&field.name) == wanted || normalize_field_name(&field.key) == wanted
        })
    }

    pub fn insert(&mut self, field: RemoteField) {
        self.fields.push(field);
    }
}

/// Campos do template presentes na submissão, já com o nome remoto `form_{campo}`.
pub fn project_fields(
    template: TreatmentTemplate,
    submission: &NormalizedSubmission,
) -> Vec<(String, String)> {
    template
        .synced_fields()
        .into_iter()
        .filter(|field| !IDENTITY_FIELDS.contains(field))
        .filter_map(|field| {
            submission
                .get(field)
                .map(|value| (format!("{REMOTE_FIELD_PREFIX}{field}"), value.as_text()))
        })
        .collect()
}

// =============================================================================
//  CLIENTE HTTP
// =============================================================================

const MAX_ERROR_BODY_CHARS: usize = 300;

// Corta por caractere: o corpo pode ecoar nomes acentuados do formulário
fn clip_body(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

struct MailerLiteClient<'a> {
    http: &'a reqwest::Client,
    base_url: &'a str,
    token: &'a str,
}

impl MailerLiteClient<'_> {
    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, MailerLiteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = clip_body(&response.text().await.unwrap_or_default());
        Err(MailerLiteError::Status { status, body })
    }

    async fn list_fields(&self) -> Result<Vec<RemoteField>, MailerLiteError> {
        let mut fields = Vec::new();

        for page in 1..=MAX_FIELD_PAGES {
            let response = self
                .http
                .get(self.url("fields"))
                .bearer_auth(self.token)
                .header(ACCEPT, "application/json")
                .query(&[("limit", FIELD_PAGE_SIZE), ("page", page)])
                .send()
                .await?;

            let body: FieldPage = Self::check(response).await?.json().await?;
            let received = body.data.len();
            fields.extend(body.data);

            let last_page = body.meta.and_then(|meta| meta.last_page).unwrap_or(page);
            if received == 0 || page >= last_page {
                break;
            }
        }

        Ok(fields)
    }

    async fn create_field(&self, name: &str) -> Result<RemoteField, MailerLiteError> {
        let response = self
            .http
            .post(self.url("fields"))
            .bearer_auth(self.token)
            .header(ACCEPT, "application/json")
            .json(&CreateFieldRequest { name, field_type: "text" })
            .send()
            .await?;

        let created: CreatedField = Self::check(response).await?.json().await?;
        Ok(created.data)
    }

    async fn upsert_subscriber(&self, subscriber: &SubscriberUpsert) -> Result<(), MailerLiteError> {
        let response = self
            .http
            .post(self.url("subscribers"))
            .bearer_auth(self.token)
            .header(ACCEPT, "application/json")
            .json(subscriber)
            .send()
            .await?;

        Self::check(response).await?;
        Ok(())
    }
}

// =============================================================================
//  SERVIÇO
// =============================================================================

#[derive(Clone)]
pub struct MailerLiteService {
    http: reqwest::Client,
}

impl MailerLiteService {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Sincroniza o cliente com o MailerLite. Nunca falha: o resultado vai no corpo da resposta.
    pub async fn sync_submission(
        &self,
        settings: &MailerLiteSettings,
        template: TreatmentTemplate,
        submission: &NormalizedSubmission,
        contact: &ClientContact,
    ) -> IntegrationStatus {
        let Some(token) = settings.api_token.as_deref() else {
            tracing::info!("MailerLite não configurado, sincronização ignorada");
            return IntegrationStatus::skipped("MailerLite is not configured.");
        };

        let Some(email) = contact.email.as_deref() else {
            tracing::info!("Submissão sem e-mail válido, sincronização com MailerLite ignorada");
            return IntegrationStatus::skipped(
                "No valid email address was provided, so MailerLite sync was skipped.",
            );
        };

        let client = MailerLiteClient {
            http: &self.http,
            base_url: &settings.base_url,
            token,
        };

        match self.sync(&client, settings, template, submission, contact, email).await {
            Ok(field_count) => {
                tracing::info!(
                    "✅ Assinante sincronizado com MailerLite ({} campos, template {})",
                    field_count,
                    template.as_str()
                );
                IntegrationStatus::succeeded("Subscriber synced with MailerLite.")
            }
            Err(e) => {
                tracing::error!("🔥 Falha na sincronização com MailerLite: {}", e);
                IntegrationStatus::failed(
                    "MailerLite sync failed. The submission was still processed.",
                )
            }
        }
    }

    async fn sync(
        &self,
        client: &MailerLiteClient<'_>,
        settings: &MailerLiteSettings,
        template: TreatmentTemplate,
        submission: &NormalizedSubmission,
        contact: &ClientContact,
        email: &str,
    ) -> Result<usize, MailerLiteError> {
        let projected = project_fields(template, submission);

        // 1. Garante que os campos customizados existem (cache por requisição)
        let mut custom = Map::new();
        if !projected.is_empty() {
            let mut catalog = FieldCatalog::new(client.list_fields().await?);

            for (remote_name, value) in projected {
                let key = match catalog.find(&remote_name) {
                    Some(existing) => existing.key.clone(),
                    None => {
                        let created = client.create_field(&remote_name).await?;
                        tracing::info!("➕ Campo '{}' criado no MailerLite", created.key);
                        let key = created.key.clone();
                        catalog.insert(created);
                        key
                    }
                };
                custom.insert(key, Value::String(value));
            }
        }

        // 2. Atributos fixos do assinante
        let mut fields = Map::new();
        if let Some(first_name) = &contact.first_name {
            fields.insert("name".to_string(), Value::String(first_name.clone()));
        }
        if let Some(last_name) = &contact.last_name {
            fields.insert("last_name".to_string(), Value::String(last_name.clone()));
        }
        if let Some(phone) = &contact.phone {
            fields.insert("phone".to_string(), Value::String(phone.clone()));
        }
        let custom_count = custom.len();
        fields.extend(custom);

        // 3. Upsert
        let subscriber = SubscriberUpsert {
            email: email.to_string(),
            fields,
            groups: settings.group_ids.clone(),
        };
        client.upsert_subscriber(&subscriber).await?;

        Ok(custom_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{
        normalizer::{normalize_payload, ListPolicy},
        submission_service::ClientContact,
    };
    use axum::{
        extract::{Query, State},
        http::StatusCode as AxumStatus,
        response::{IntoResponse, Response},
        routing::{get, post},
        Json, Router,
    };
    use serde_json::json;
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    /// MailerLite falso, servido em uma porta local.
    #[derive(Clone, Default)]
    struct FakeProvider {
        fields: Arc<Mutex<Vec<RemoteField>>>,
        created: Arc<Mutex<Vec<String>>>,
        subscribers: Arc<Mutex<Vec<Value>>>,
        // Corpo devolvido com 422 em /subscribers
        rejection: Option<String>,
    }

    // Uma página por campo, para exercitar a paginação
    async fn list_fields(
        State(fake): State<FakeProvider>,
        Query(query): Query<HashMap<String, String>>,
    ) -> Json<Value> {
        let fields = fake.fields.lock().unwrap().clone();
        let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
        let data: Vec<RemoteField> = fields.get(page - 1).cloned().into_iter().collect();
        Json(json!({
            "data": data,
            "meta": { "current_page": page, "last_page": fields.len().max(1) }
        }))
    }

    async fn create_field(
        State(fake): State<FakeProvider>,
        Json(body): Json<Value>,
    ) -> (AxumStatus, Json<Value>) {
        let name = body["name"].as_str().unwrap_or_default().to_string();
        let field = RemoteField {
            id: json!(fake.fields.lock().unwrap().len() + 1),
            name: name.clone(),
            key: normalize_field_name(&name),
            field_type: Some("text".to_string()),
        };
        fake.created.lock().unwrap().push(name);
        fake.fields.lock().unwrap().push(field.clone());
        (AxumStatus::CREATED, Json(json!({ "data": field })))
    }

    async fn upsert_subscriber(
        State(fake): State<FakeProvider>,
        Json(body): Json<Value>,
    ) -> Response {
        if let Some(rejection) = &fake.rejection {
            return (AxumStatus::UNPROCESSABLE_ENTITY, rejection.clone()).into_response();
        }
        fake.subscribers.lock().unwrap().push(body);
        (AxumStatus::OK, Json(json!({ "data": {} }))).into_response()
    }

    async fn spawn(fake: FakeProvider) -> String {
        let app = Router::new()
            .route("/fields", get(list_fields).post(create_field))
            .route("/subscribers", post(upsert_subscriber))
            .with_state(fake);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn settings(token: Option<&str>, base_url: String) -> MailerLiteSettings {
        MailerLiteSettings {
            api_token: token.map(str::to_string),
            group_ids: vec!["123".to_string()],
            base_url,
        }
    }

    fn remote(name: &str, key: &str) -> RemoteField {
        RemoteField { id: json!(1), name: name.to_string(), key: key.to_string(), field_type: None }
    }

    fn submission(data: Value) -> (NormalizedSubmission, ClientContact) {
        let submission = normalize_payload(&data, ListPolicy::Keep);
        let contact = ClientContact::from_submission(&submission);
        (submission, contact)
    }

    #[test]
    fn catalog_matches_by_normalized_name_or_key() {
        let catalog = FieldCatalog::new(vec![
            remote("Form Skin Type", "custom_1"),
            remote("Allergies", "form_allergies"),
        ]);

        assert_eq!(catalog.find("form skin   TYPE").map(|f| f.key.as_str()), Some("custom_1"));
        assert_eq!(catalog.find("form_Allergies").map(|f| f.key.as_str()), Some("form_allergies"));
        assert!(catalog.find("form_skinType").is_none());
    }

    #[test]
    fn projection_uses_template_allow_list() {
        let (data, _) = submission(json!({
            "firstName": "Jane",
            "email": "jane@example.com",
            "allergies": "None",
            "treatmentAreas": ["Forehead", "Frown"],
            "unrelatedField": "ignored",
        }));

        let projected = project_fields(TreatmentTemplate::AntiWrinkle, &data);

        assert_eq!(
            projected,
            vec![
                ("form_allergies".to_string(), "None".to_string()),
                ("form_treatmentAreas".to_string(), "Forehead, Frown".to_string()),
            ]
        );
        // Template desconhecido cai no standard, que não conhece treatmentAreas
        let standard = project_fields(TreatmentTemplate::parse(Some("mystery")), &data);
        assert_eq!(standard, vec![("form_allergies".to_string(), "None".to_string())]);
    }

    #[tokio::test]
    async fn skipped_without_token() {
        let service = MailerLiteService::new(reqwest::Client::new());
        let (data, contact) = submission(json!({ "email": "jane@example.com" }));

        let status = service
            .sync_submission(&settings(None, "http://127.0.0.1:9".into()), TreatmentTemplate::Standard, &data, &contact)
            .await;

        assert!(status.is_skipped());
        assert!(!status.ok);
    }

    #[tokio::test]
    async fn skipped_without_email() {
        let service = MailerLiteService::new(reqwest::Client::new());
        let (data, contact) = submission(json!({ "firstName": "Jane", "email": "not-an-email" }));

        let status = service
            .sync_submission(&settings(Some("token"), "http://127.0.0.1:9".into()), TreatmentTemplate::Standard, &data, &contact)
            .await;

        assert!(status.is_skipped());
    }

    #[tokio::test]
    async fn creates_missing_fields_once_and_upserts_subscriber() {
        let fake = FakeProvider::default();
        fake.fields.lock().unwrap().extend([
            remote("form_allergies", "form_allergies"),
            remote("Unrelated", "unrelated"),
        ]);
        let base_url = spawn(fake.clone()).await;

        let service = MailerLiteService::new(reqwest::Client::new());
        let (data, contact) = submission(json!({
            "firstName": "Jane",
            "lastName": "Doe",
            "email": "jane@example.com",
            "phone": "07700 900000",
            "allergies": "Penicillin",
            "skinType": "Oily",
        }));

        let status = service
            .sync_submission(&settings(Some("token"), base_url), TreatmentTemplate::ChemicalPeel, &data, &contact)
            .await;

        assert!(status.ok, "{}", status.message);
        assert_eq!(*fake.created.lock().unwrap(), vec!["form_skinType".to_string()]);

        let subscribers = fake.subscribers.lock().unwrap();
        assert_eq!(subscribers.len(), 1);
        let body = &subscribers[0];
        assert_eq!(body["email"], "jane@example.com");
        assert_eq!(body["fields"]["name"], "Jane");
        assert_eq!(body["fields"]["last_name"], "Doe");
        assert_eq!(body["fields"]["phone"], "07700 900000");
        assert_eq!(body["fields"]["form_allergies"], "Penicillin");
        assert_eq!(body["fields"]["form_skintype"], "Oily");
        assert_eq!(body["groups"], json!(["123"]));
    }

    #[tokio::test]
    async fn repeated_submissions_reuse_created_fields() {
        let fake = FakeProvider::default();
        let base_url = spawn(fake.clone()).await;
        let service = MailerLiteService::new(reqwest::Client::new());
        let (data, contact) = submission(json!({ "email": "jane@example.com", "allergies": "None" }));
        let settings = settings(Some("token"), base_url);

        for _ in 0..2 {
            let status = service
                .sync_submission(&settings, TreatmentTemplate::Standard, &data, &contact)
                .await;
            assert!(status.ok);
        }

        assert_eq!(fake.created.lock().unwrap().len(), 1);
        assert_eq!(fake.subscribers.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn failed_when_provider_rejects_subscriber() {
        let fake = FakeProvider {
            rejection: Some(r#"{"message":"invalid"}"#.to_string()),
            ..Default::default()
        };
        let base_url = spawn(fake).await;
        let service = MailerLiteService::new(reqwest::Client::new());
        let (data, contact) = submission(json!({ "email": "jane@example.com" }));

        let status = service
            .sync_submission(&settings(Some("token"), base_url), TreatmentTemplate::Standard, &data, &contact)
            .await;

        assert!(!status.ok);
        assert!(!status.is_skipped());
        assert!(status.enabled);
    }

    #[test]
    fn error_body_is_clipped_on_char_boundary() {
        let body = format!("{}é{}", "a".repeat(299), "b".repeat(50));

        let clipped = clip_body(&body);

        assert_eq!(clipped.chars().count(), 300);
        assert!(clipped.ends_with('é'));
        assert_eq!(clip_body("short"), "short");
    }

    #[tokio::test]
    async fn accented_rejection_body_is_reported_as_failed() {
        // O byte 300 cai no meio do "é"
        let rejection = format!("{}é{}", "a".repeat(299), "b".repeat(50));
        let fake = FakeProvider { rejection: Some(rejection), ..Default::default() };
        let base_url = spawn(fake).await;
        let service = MailerLiteService::new(reqwest::Client::new());
        let (data, contact) = submission(json!({ "firstName": "Zoé", "email": "zoe@example.com" }));

        let status = service
            .sync_submission(&settings(Some("token"), base_url), TreatmentTemplate::Standard, &data, &contact)
            .await;

        assert_eq!(
            status,
            IntegrationStatus::failed("MailerLite sync failed. The submission was still processed.")
        );
    }
}
