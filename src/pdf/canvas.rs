// src/pdf/canvas.rs

use anyhow::Context;
use lopdf::{
    content::{Content, Operation},
    dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat,
};

use super::{
    metrics::{encode, Font},
    signature::{fit_within, JpegImage},
    wrap::{wrap_paragraphs, wrap_text},
};

// A4 em pontos
pub const PAGE_WIDTH: f32 = 595.28;
pub const PAGE_HEIGHT: f32 = 841.89;
pub const MARGIN: f32 = 50.0;

const LINE_SPACING: f32 = 1.4;
const BULLET_INDENT: f32 = 14.0;
const CHECKBOX_SIZE: f32 = 9.0;

/// PDF renderizado em memória.
#[derive(Debug, Clone)]
pub struct RenderedPdf {
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

#[derive(Default)]
struct PageContent {
    operations: Vec<Operation>,
    // índices em `PdfCanvas::images`
    images: Vec<usize>,
}

/// Contexto de layout explícito: páginas, cursor vertical e imagens.
/// Cada documento tem o seu, então vários podem ser renderizados ao mesmo tempo.
pub struct PdfCanvas {
    pages: Vec<PageContent>,
    images: Vec<JpegImage>,
    y: f32,
}

impl Default for PdfCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfCanvas {
    pub fn new() -> Self {
        Self {
            pages: vec![PageContent::default()],
            images: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    pub fn cursor_y(&self) -> f32 {
        self.y
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn content_width(&self) -> f32 {
        PAGE_WIDTH - 2.0 * MARGIN
    }

    pub fn line_height(size: f32) -> f32 {
        size * LINE_SPACING
    }

    // =========================================================================
    //  PAGINAÇÃO
    // =========================================================================

    /// Único gatilho de quebra de página: se `height` não cabe, abre página nova.
    pub fn ensure_space(&mut self, height: f32) {
        if self.y - height < MARGIN {
            self.new_page();
        }
    }

    pub fn new_page(&mut self) {
        self.pages.push(PageContent::default());
        self.y = PAGE_HEIGHT - MARGIN;
    }

    /// Espaço em branco. Não quebra página sozinho; o próximo desenho decide.
    pub fn gap(&mut self, height: f32) {
        self.y = (self.y - height).max(MARGIN);
    }

    // =========================================================================
    //  TEXTO
    // =========================================================================

    /// Desenha uma linha já quebrada. A linha inteira sempre cabe na página.
    pub fn text_line(&mut self, text: &str, font: Font, size: f32, indent: f32) {
        let line_height = Self::line_height(size);
        self.ensure_space(line_height);

        let baseline = self.y - size;
        self.push_text(text, font, size, MARGIN + indent, baseline);
        self.y -= line_height;
    }

    /// Texto com quebra automática (mantém as quebras de linha do usuário).
    pub fn paragraph(&mut self, text: &str, font: Font, size: f32, indent: f32) {
        let width = self.content_width() - indent;
        for line in wrap_paragraphs(text, font, size, width) {
            if line.is_empty() {
                self.gap(Self::line_height(size) * 0.5);
            } else {
                self.text_line(&line, font, size, indent);
            }
        }
    }

    pub fn bullet(&mut self, text: &str, font: Font, size: f32) {
        let width = self.content_width() - BULLET_INDENT;
        for (index, line) in wrap_text(text, font, size, width).iter().enumerate() {
            let line_height = Self::line_height(size);
            self.ensure_space(line_height);
            if index == 0 {
                let baseline = self.y - size;
                self.push_text("•", font, size, MARGIN + 3.0, baseline);
            }
            self.text_line(line, font, size, BULLET_INDENT);
        }
    }

    /// Caixinha vazia seguida do rótulo (marcada à mão depois de impresso).
    pub fn checkbox(&mut self, label: &str, font: Font, size: f32) {
        let indent = CHECKBOX_SIZE + 8.0;
        let lines = wrap_text(label, font, size, self.content_width() - indent);
        let line_height = Self::line_height(size);

        for (index, line) in lines.iter().enumerate() {
            self.ensure_space(line_height);
            if index == 0 {
                let top = self.y - (line_height - CHECKBOX_SIZE) / 2.0;
                self.stroke_rect(MARGIN, top - CHECKBOX_SIZE, CHECKBOX_SIZE, CHECKBOX_SIZE, 0.8);
            }
            self.text_line(line, font, size, indent);
        }
    }

    // =========================================================================
    //  LINHAS E CAIXAS
    // =========================================================================

    pub fn divider(&mut self) {
        self.ensure_space(18.0);
        self.y -= 8.0;
        let y = self.y;
        self.stroke_line(MARGIN, y, PAGE_WIDTH - MARGIN, y, 0.75, 0.7);
        self.y -= 10.0;
    }

    /// Caixa vazia para assinatura à mão.
    pub fn empty_box(&mut self, width: f32, height: f32) {
        self.ensure_space(height + 6.0);
        let bottom = self.y - height;
        self.stroke_rect(MARGIN, bottom, width, height, 0.8);
        self.y = bottom - 6.0;
    }

    /// Linha para preencher à mão (nome, data).
    pub fn ruled_line(&mut self, width: f32) {
        self.ensure_space(26.0);
        self.y -= 22.0;
        let y = self.y;
        self.stroke_line(MARGIN, y, MARGIN + width, y, 0.8, 0.3);
        self.y -= 4.0;
    }

    // =========================================================================
    //  IMAGENS
    // =========================================================================

    /// Embute a imagem escalada para caber em `max_width` x `max_height`.
    pub fn image(&mut self, image: JpegImage, max_width: f32, max_height: f32) {
        let (width, height) =
            fit_within(image.width as f32, image.height as f32, max_width, max_height);
        self.ensure_space(height + 6.0);

        let index = self.images.len();
        self.images.push(image);

        let bottom = self.y - height;
        let page = self.current_page();
        page.images.push(index);
        page.operations.extend([
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![width.into(), 0.into(), 0.into(), height.into(), MARGIN.into(), bottom.into()],
            ),
            Operation::new("Do", vec![image_resource_name(index).as_str().into()]),
            Operation::new("Q", vec![]),
        ]);
        self.y = bottom - 6.0;
    }

    // =========================================================================
    //  SAÍDA
    // =========================================================================

    /// Monta o documento final (fontes, páginas, imagens) e serializa.
    pub fn finish(self, title: &str) -> anyhow::Result<RenderedPdf> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        // 1. Fontes padrão (não precisam ser embutidas)
        let mut fonts = Dictionary::new();
        for font in Font::ALL {
            let font_id = doc.add_object(dictionary! {
                "Type" => "Font",
                "Subtype" => "Type1",
                "BaseFont" => font.base_font(),
                "Encoding" => "WinAnsiEncoding",
            });
            fonts.set(font.resource_name(), font_id);
        }

        // 2. Imagens
        let image_ids: Vec<ObjectId> = self
            .images
            .into_iter()
            .map(|image| {
                let dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(image.width),
                    "Height" => i64::from(image.height),
                    "ColorSpace" => "DeviceRGB",
                    "BitsPerComponent" => 8,
                    "Filter" => "DCTDecode",
                };
                doc.add_object(Stream::new(dict, image.data))
            })
            .collect();

        // 3. Páginas
        let page_count = self.pages.len();
        let mut kids: Vec<Object> = Vec::with_capacity(page_count);

        for page in self.pages {
            let mut xobjects = Dictionary::new();
            for index in &page.images {
                xobjects.set(image_resource_name(*index), image_ids[*index]);
            }

            let content = Content { operations: page.operations };
            let encoded = content.encode().context("failed to encode page content")?;
            let content_id = doc.add_object(Stream::new(Dictionary::new(), encoded));

            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => dictionary! {
                    "Font" => fonts.clone(),
                    "XObject" => xobjects,
                },
            });
            kids.push(page_id.into());
        }

        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages));

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let info_id = doc.add_object(dictionary! {
            "Title" => Object::String(encode(title), StringFormat::Literal),
            "Producer" => Object::string_literal("clinic-forms-backend"),
        });
        doc.trailer.set("Info", info_id);

        // 4. Renderiza para Buffer (Memória)
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).context("failed to serialize PDF")?;

        Ok(RenderedPdf { bytes, page_count })
    }

    // --- primitivas ---

    fn current_page(&mut self) -> &mut PageContent {
        if self.pages.is_empty() {
            self.pages.push(PageContent::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn push_text(&mut self, text: &str, font: Font, size: f32, x: f32, baseline: f32) {
        let bytes = encode(text);
        self.current_page().operations.extend([
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec![font.resource_name().into(), size.into()]),
            Operation::new("Td", vec![x.into(), baseline.into()]),
            Operation::new("Tj", vec![Object::String(bytes, StringFormat::Literal)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn stroke_line(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, width: f32, gray: f32) {
        self.current_page().operations.extend([
            Operation::new("q", vec![]),
            Operation::new("G", vec![gray.into()]),
            Operation::new("w", vec![width.into()]),
            Operation::new("m", vec![x1.into(), y1.into()]),
            Operation::new("l", vec![x2.into(), y2.into()]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }

    fn stroke_rect(&mut self, x: f32, y: f32, width: f32, height: f32, line_width: f32) {
        self.current_page().operations.extend([
            Operation::new("q", vec![]),
            Operation::new("G", vec![0.4_f32.into()]),
            Operation::new("w", vec![line_width.into()]),
            Operation::new("re", vec![x.into(), y.into(), width.into(), height.into()]),
            Operation::new("S", vec![]),
            Operation::new("Q", vec![]),
        ]);
    }
}

fn image_resource_name(index: usize) -> String {
    format!("Im{}", index + 1)
}
