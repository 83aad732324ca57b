// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::submission::ErrorResponse;

pub const EMPTY_SUBMISSION_MESSAGE: &str = "No form data was submitted.";
pub const INVALID_PAYLOAD_MESSAGE: &str = "Invalid JSON payload.";
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Request body is too large.";
pub const INTERNAL_ERROR_MESSAGE: &str =
    "We could not process your submission. Please try again later.";

// Erros que interrompem a requisição. Falhas de CRM e e-mail NÃO entram aqui:
// elas viram IntegrationStatus no corpo da resposta.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Corpo da requisição inválido: {0}")]
    InvalidPayload(String),

    #[error("Corpo da requisição acima do limite")]
    PayloadTooLarge,

    #[error("Nenhum campo preenchido")]
    EmptySubmission,

    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Variante genérica para qualquer outro erro inesperado
    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InvalidPayload(ref detail) => {
                tracing::warn!("⚠️ Payload rejeitado: {}", detail);
                (StatusCode::BAD_REQUEST, INVALID_PAYLOAD_MESSAGE.to_string())
            }
            AppError::PayloadTooLarge => {
                tracing::warn!("⚠️ Payload rejeitado: corpo acima do limite");
                (StatusCode::PAYLOAD_TOO_LARGE, PAYLOAD_TOO_LARGE_MESSAGE.to_string())
            }
            AppError::EmptySubmission => {
                (StatusCode::BAD_REQUEST, EMPTY_SUBMISSION_MESSAGE.to_string())
            }
            AppError::ValidationError(errors) => {
                let fields: Vec<String> = errors
                    .field_errors()
                    .keys()
                    .map(|field| field.to_string())
                    .collect();
                (
                    StatusCode::BAD_REQUEST,
                    format!("Invalid value for: {}.", fields.join(", ")),
                )
            }
            // O detalhe fica só no log, nunca na resposta.
            AppError::InternalServerError(e) => {
                tracing::error!("🔥 Erro Interno do Servidor: {:#}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE.to_string())
            }
        };

        let body = Json(ErrorResponse { ok: false, error: error_message });
        (status, body).into_response()
    }
}

/// Resposta 500 usada pelo CatchPanicLayer quando um handler entra em pânico.
pub fn panic_response(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    tracing::error!("🔥 Pânico capturado durante o processamento da requisição");
    AppError::InternalServerError(anyhow::anyhow!("handler panicked")).into_response()
}
