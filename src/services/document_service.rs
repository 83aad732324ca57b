// src/services/document_service.rs

use crate::{
    common::text::humanize_key,
    models::{
        ContentBlueprintItem, ContentKind, FieldBlueprintItem, FieldValue, InternalFieldKind,
        NormalizedSubmission,
    },
    pdf::{
        signature::{decode_signature, is_image_data_uri},
        Font, PdfCanvas, RenderedPdf,
    },
    services::blueprint_service::ResolvedBlueprint,
};

const TITLE_SIZE: f32 = 18.0;
const META_SIZE: f32 = 9.5;
const HEADING_SIZE: f32 = 16.0;
const SUBHEADING_SIZE: f32 = 13.0;
const SECTION_SIZE: f32 = 12.0;
const BODY_SIZE: f32 = 10.5;

// Caixa máxima da assinatura desenhada
const SIGNATURE_MAX_WIDTH: f32 = 220.0;
const SIGNATURE_MAX_HEIGHT: f32 = 80.0;
const SIGNATURE_BOX_HEIGHT: f32 = 70.0;

pub const NOT_PROVIDED: &str = "Not provided";
pub const SIGNATURE_FALLBACK: &str = "Drawn signature captured";

/// Cabeçalho comum aos dois documentos.
#[derive(Debug, Clone)]
pub struct DocumentHeader {
    pub title: String,
    pub treatment_name: String,
    pub template: Option<String>,
    pub submitted_at: String,
    pub treatment_path: Option<String>,
}

/// Monta os PDFs das submissões. Não sabe nada de rede, e-mail ou CRM.
#[derive(Clone, Default)]
pub struct DocumentService;

impl DocumentService {
    pub fn new() -> Self {
        Self
    }

    // =========================================================================
    //  FORMULÁRIO DE CONSULTA
    // =========================================================================

    pub fn render_form_pdf(
        &self,
        header: &DocumentHeader,
        submission: &NormalizedSubmission,
    ) -> anyhow::Result<RenderedPdf> {
        let mut canvas = PdfCanvas::new();

        render_header(&mut canvas, header);

        // Campos na ordem em que o cliente preencheu
        for (key, value) in submission.iter() {
            render_field(&mut canvas, &humanize_key(key), Some(value));
        }

        canvas.finish(&header.title)
    }

    // =========================================================================
    //  GUIDELINES (CUIDADOS PRÉ/PÓS)
    // =========================================================================

    pub fn render_guidelines_pdf(
        &self,
        header: &DocumentHeader,
        blueprint: &ResolvedBlueprint,
        submission: &NormalizedSubmission,
    ) -> anyhow::Result<RenderedPdf> {
        let mut canvas = PdfCanvas::new();

        render_header(&mut canvas, header);

        // 1. Texto que o cliente leu
        if !blueprint.content.is_empty() {
            render_content(&mut canvas, &blueprint.content);
            canvas.divider();
        }

        // 2. Campos de confirmação, um título por seção
        for (section, fields) in group_by_section(&blueprint.fields) {
            canvas.gap(8.0);
            canvas.paragraph(section, Font::Bold, SECTION_SIZE, 0.0);
            for field in fields {
                render_blueprint_field(&mut canvas, field, submission);
            }
        }

        canvas.finish(&header.title)
    }
}

/// Seções na ordem da primeira aparição. Dentro de cada uma, a ordem do blueprint é mantida.
fn group_by_section(fields: &[FieldBlueprintItem]) -> Vec<(&str, Vec<&FieldBlueprintItem>)> {
    let mut groups: Vec<(&str, Vec<&FieldBlueprintItem>)> = Vec::new();
    for field in fields {
        match groups.iter_mut().find(|(section, _)| *section == field.section) {
            Some((_, members)) => members.push(field),
            None => groups.push((field.section.as_str(), vec![field])),
        }
    }
    groups
}

fn render_header(canvas: &mut PdfCanvas, header: &DocumentHeader) {
    canvas.paragraph(&header.title, Font::Bold, TITLE_SIZE, 0.0);
    canvas.gap(4.0);

    let mut meta = vec![
        format!("Treatment: {}", header.treatment_name),
        format!("Submitted: {}", header.submitted_at),
    ];
    if let Some(template) = &header.template {
        meta.push(format!("Form template: {}", template));
    }
    if let Some(path) = &header.treatment_path {
        meta.push(format!("Page: {}", path));
    }

    for line in meta {
        canvas.paragraph(&line, Font::Regular, META_SIZE, 0.0);
    }
    canvas.divider();
}

fn render_content(canvas: &mut PdfCanvas, content: &[ContentBlueprintItem]) {
    let mut current_section: Option<&str> = None;

    for item in content {
        if let Some(section) = item.section.as_deref() {
            if current_section != Some(section) {
                canvas.gap(6.0);
                canvas.paragraph(section, Font::Bold, SECTION_SIZE, 0.0);
                current_section = Some(section);
            }
        }

        match item.kind {
            ContentKind::Heading => {
                canvas.gap(8.0);
                canvas.paragraph(&item.text, Font::Bold, HEADING_SIZE, 0.0);
                canvas.gap(2.0);
            }
            ContentKind::Subheading => {
                canvas.gap(6.0);
                canvas.paragraph(&item.text, Font::Bold, SUBHEADING_SIZE, 0.0);
            }
            ContentKind::Paragraph => {
                canvas.paragraph(&item.text, Font::Regular, BODY_SIZE, 0.0);
                canvas.gap(3.0);
            }
            ContentKind::Bullet => canvas.bullet(&item.text, Font::Regular, BODY_SIZE),
            ContentKind::Label => {
                canvas.gap(3.0);
                canvas.paragraph(&item.text, Font::Bold, BODY_SIZE, 0.0);
            }
        }
    }
}

fn render_blueprint_field(
    canvas: &mut PdfCanvas,
    field: &FieldBlueprintItem,
    submission: &NormalizedSubmission,
) {
    // Campos internos ignoram o valor: são preenchidos à mão pelo profissional
    match field.internal {
        Some(InternalFieldKind::Note) => {
            canvas.gap(4.0);
            canvas.paragraph(&field.label, Font::Oblique, BODY_SIZE, 0.0);
        }
        Some(InternalFieldKind::Checkbox) => {
            canvas.gap(4.0);
            canvas.checkbox(&field.label, Font::Regular, BODY_SIZE);
        }
        Some(InternalFieldKind::Signature) => {
            canvas.gap(6.0);
            canvas.paragraph(&field.label, Font::Bold, BODY_SIZE, 0.0);
            canvas.empty_box(SIGNATURE_MAX_WIDTH, SIGNATURE_BOX_HEIGHT);
        }
        Some(InternalFieldKind::NameLine) | Some(InternalFieldKind::DateLine) => {
            canvas.gap(4.0);
            canvas.paragraph(&field.label, Font::Bold, BODY_SIZE, 0.0);
            canvas.ruled_line(SIGNATURE_MAX_WIDTH);
        }
        None => render_field(canvas, &field.label, submission.get(&field.name)),
    }
}

/// Rótulo em negrito + valor. Campos ausentes mostram "Not provided".
fn render_field(canvas: &mut PdfCanvas, label: &str, value: Option<&FieldValue>) {
    canvas.gap(4.0);
    canvas.paragraph(label, Font::Bold, BODY_SIZE, 0.0);

    match value {
        None => canvas.paragraph(NOT_PROVIDED, Font::Oblique, BODY_SIZE, 0.0),
        Some(value) if is_image_data_uri(value.first()) => render_signature(canvas, value.first()),
        Some(value) => canvas.paragraph(&value.as_text(), Font::Regular, BODY_SIZE, 0.0),
    }
}

// Imagem corrompida nunca derruba o PDF: cai para o texto
fn render_signature(canvas: &mut PdfCanvas, data_uri: &str) {
    match decode_signature(data_uri) {
        Ok(image) => canvas.image(image, SIGNATURE_MAX_WIDTH, SIGNATURE_MAX_HEIGHT),
        Err(e) => {
            tracing::warn!("⚠️ Assinatura não pôde ser embutida no PDF: {:#}", e);
            canvas.paragraph(SIGNATURE_FALLBACK, Font::Regular, BODY_SIZE, 0.0);
        }
    }
}
