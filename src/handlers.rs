pub mod forms;
pub mod guidelines;

use axum::{extract::rejection::JsonRejection, http::StatusCode, Json};
use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::{common::error::AppError, models::submission::PdfAttachment};

const PDF_MIME_TYPE: &str = "application/pdf";

/// Payload JSON malformado vira 400 e corpo grande demais vira 413, sempre no envelope padrão.
fn read_payload<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge
        } else {
            AppError::InvalidPayload(rejection.body_text())
        }
    })
}

/// Nome de exibição do tratamento no PDF e no e-mail.
fn treatment_label(raw: Option<&str>) -> &str {
    raw.map(str::trim).filter(|name| !name.is_empty()).unwrap_or("Not specified")
}

fn pdf_attachment(file_name: String, bytes: &[u8]) -> PdfAttachment {
    PdfAttachment {
        file_name,
        mime_type: PDF_MIME_TYPE.to_string(),
        base64: STANDARD.encode(bytes),
    }
}
