// src/handlers/forms.rs

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use chrono::Utc;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        submission::{ErrorResponse, FormSubmissionPayload, FormSubmissionResponse},
        TreatmentTemplate,
    },
    services::{
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

// POST /api/forms/submit
#[utoipa::path(
    post,
    path = "/api/forms/submit",
    tag = "Forms",
    request_body = FormSubmissionPayload,
    responses(
        (status = 200, description = "PDF gerado; status do MailerLite no corpo", body = FormSubmissionResponse),
        (status = 400, description = "Payload inválido ou vazio", body = ErrorResponse),
        (status = 500, description = "Erro inesperado", body = ErrorResponse)
    )
)]
pub async fn submit_form(
    State(app_state): State<AppState>,
    payload: Result<Json<FormSubmissionPayload>, JsonRejection>,
) -> Result<Json<FormSubmissionResponse>, AppError> {
    // 1. Validação: única etapa que interrompe a requisição
    let payload = read_payload(payload)?;
    payload.validate()?;

    let submission = normalize_payload(&payload.data, ListPolicy::Keep);
    if submission.is_empty() {
        return Err(AppError::EmptySubmission);
    }

    let now = Utc::now();
    let template = TreatmentTemplate::parse(payload.template.as_deref());
    let contact = ClientContact::from_submission(&submission);
    let treatment_name = treatment_label(payload.treatment_name.as_deref());
    let submitted_at = format_submitted_at(payload.submitted_at.as_deref(), now);

    // 2. CRM (nunca derruba o PDF)
    let mailer_lite = app_state
        .mailerlite_service
        .sync_submission(&app_state.settings.mailerlite, template, &submission, &contact)
        .await;

    // 3. PDF
    let header = DocumentHeader {
        title: format!("{} Consultation Form", treatment_name),
        treatment_name: treatment_name.to_string(),
        template: Some(template.as_str().to_string()),
        submitted_at: submitted_at.clone(),
        treatment_path: payload.treatment_path.clone(),
    };
    let pdf = app_state.document_service.render_form_pdf(&header, &submission)?;

    // 4. Referência, nome do arquivo e cópia em disco
    let reference = submission_reference(
        payload.treatment_name.as_deref(),
        DocumentKind::ConsultationForm,
        now,
    );
    let file_name = download_filename(
        &contact,
        payload.treatment_name.as_deref(),
        DocumentKind::ConsultationForm,
    );
    app_state.submission_service.store_pdf(&reference, &pdf.bytes).await;

    // 5. E-mail para a clínica
    let email = app_state
        .notification_service
        .notify(
            &app_state.settings.smtp,
            &Notification {
                document_title: "Consultation Form",
                reference: &reference,
                treatment_name,
                template: Some(template.as_str()),
                submitted_at: &submitted_at,
                contact: &contact,
                file_name: &file_name,
                pdf: &pdf.bytes,
            },
        )
        .await;

    tracing::info!(
        "✅ Formulário {} processado ({} página(s), MailerLite ok={}, e-mail ok={})",
        reference,
        pdf.page_count,
        mailer_lite.ok,
        email.ok
    );

    Ok(Json(FormSubmissionResponse {
        ok: true,
        message: "Consultation form submitted successfully.".to_string(),
        submission_reference: reference,
        mailer_lite,
        pdf: pdf_attachment(file_name, &pdf.bytes),
    }))
}
