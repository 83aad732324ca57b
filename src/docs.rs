// src/docs.rs

use utoipa::OpenApi;
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Formulários ---
        handlers::forms::submit_form,

        // --- Guidelines ---
        handlers::guidelines::submit_guidelines,
    ),
    components(
        schemas(
            // --- Payloads ---
            models::submission::FieldValue,
            models::submission::FormSubmissionPayload,
            models::submission::GuidelineSubmissionPayload,

            // --- Respostas ---
            models::submission::IntegrationStatus,
            models::submission::PdfAttachment,
            models::submission::FormSubmissionResponse,
            models::submission::GuidelineSubmissionResponse,
            models::submission::ErrorResponse,
        )
    ),
    tags(
        (name = "Forms", description = "Formulários de consulta (PDF + MailerLite + e-mail)"),
        (name = "Guidelines", description = "Confirmação de orientações pré e pós tratamento")
    )
)]
pub struct ApiDoc;
