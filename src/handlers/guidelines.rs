// src/handlers/guidelines.rs

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::Utc;
use serde_json::Value;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::submission::{ErrorResponse, GuidelineSubmissionPayload, GuidelineSubmissionResponse},
    services::{
        blueprint_service::resolve_blueprint,
        document_service::DocumentHeader,
        normalizer::{normalize_payload, ListPolicy},
        notification_service::Notification,
        submission_service::{
            download_filename, format_submitted_at, submission_reference, ClientContact,
            DocumentKind,
        },
    },
};

use super::{pdf_attachment, read_payload, treatment_label};

fn as_items(raw: Option<&Value>) -> Option<&[Value]> {
    raw.and_then(Value::as_array).map(Vec::as_slice)
}

// POST /api/guidelines/submit
#[utoipa::path(
    post,
    path = "/api/guidelines/submit",
    tag = "Guidelines",
    request_body = GuidelineSubmissionPayload,
    responses(
        (status = 200, description = "PDF de confirmação das orientações", body = GuidelineSubmissionResponse),
        (status = 400, description = "Payload inválido ou vazio", body = ErrorResponse),
        (status = 500, description = "Erro inesperado", body = ErrorResponse)
    )
)]
pub async fn submit_guidelines(
    State(app_state): State<AppState>,
    payload: Result<Json<GuidelineSubmissionPayload>, JsonRejection>,
) -> Result<Json<GuidelineSubmissionResponse>, AppError> {
    let payload = read_payload(payload)?;
    payload.validate()?;

    let submission = normalize_payload(&payload.data, ListPolicy::CollapseSingle);
    if submission.is_empty() {
        return Err(AppError::EmptySubmission);
    }

    let now = Utc::now();
    let contact = ClientContact::from_submission(&submission);
    let treatment_name = treatment_label(payload.treatment_name.as_deref());
    let submitted_at = format_submitted_at(payload.submitted_at.as_deref(), now);

    // Blueprint do cliente (ou derivado dos dados) + seção interna do profissional
    let blueprint = resolve_blueprint(
        as_items(payload.field_blueprint.as_ref()),
        as_items(payload.content_blueprint.as_ref()),
        &submission,
    );

    let title = payload
        .guidelines_title
        .as_deref()
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} Guidelines", treatment_name));

    let header = DocumentHeader {
        title: title.clone(),
        treatment_name: treatment_name.to_string(),
        template: payload.template.clone(),
        submitted_at: submitted_at.clone(),
        treatment_path: payload.treatment_path.clone(),
    };
    let pdf = app_state
        .document_service
        .render_guidelines_pdf(&header, &blueprint, &submission)?;

    let reference =
        submission_reference(payload.treatment_name.as_deref(), DocumentKind::Guidelines, now);
    let file_name =
        download_filename(&contact, payload.treatment_name.as_deref(), DocumentKind::Guidelines);

    let email = app_state
        .notification_service
        .notify(
            &app_state.settings.smtp,
            &Notification {
                document_title: &title,
                reference: &reference,
                treatment_name,
                template: payload.template.as_deref(),
                submitted_at: &submitted_at,
                contact: &contact,
                file_name: &file_name,
                pdf: &pdf.bytes,
            },
        )
        .await;

    tracing::info!(
        "✅ Guidelines {} processadas ({} campos, {} página(s), e-mail ok={})",
        reference,
        blueprint.fields.len(),
        pdf.page_count,
        email.ok
    );

    Ok(Json(GuidelineSubmissionResponse {
        ok: true,
        message: "Guidelines acknowledgement submitted successfully.".to_string(),
        submission_reference: reference,
        pdf: pdf_attachment(file_name, &pdf.bytes),
    }))
}
