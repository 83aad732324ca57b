// src/pdf/signature.rs
// Assinaturas desenhadas chegam como data URI (PNG ou JPEG em base64).

use anyhow::{anyhow, bail, Context};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::jpeg::JpegEncoder, DynamicImage, ImageReader, Limits, Rgb, RgbImage};
use std::io::Cursor;

// Acima disso não é uma assinatura, é um abuso
const MAX_SIGNATURE_SIDE: u32 = 4096;
const MAX_SIGNATURE_PIXELS: u64 = MAX_SIGNATURE_SIDE as u64 * MAX_SIGNATURE_SIDE as u64;

const JPEG_QUALITY: u8 = 90;

/// Imagem pronta para virar um XObject /DCTDecode.
#[derive(Debug, Clone)]
pub struct JpegImage {
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

pub fn is_image_data_uri(value: &str) -> bool {
    value.trim_start().to_ascii_lowercase().starts_with("data:image/")
}

/// Devolve o conteúdo base64 se o data URI for PNG ou JPEG.
pub fn data_uri_payload(value: &str) -> Option<&str> {
    let value = value.trim();
    let (header, payload) = value.split_once(',')?;
    let header = header.to_ascii_lowercase();

    let supported = ["data:image/png;base64", "data:image/jpeg;base64", "data:image/jpg;base64"];
    supported.contains(&header.as_str()).then_some(payload)
}

/// Decodifica a assinatura e reencoda como JPEG sobre fundo branco
/// (as assinaturas do canvas vêm com fundo transparente).
pub fn decode_signature(value: &str) -> anyhow::Result<JpegImage> {
    let payload = data_uri_payload(value).ok_or_else(|| anyhow!("unsupported data URI"))?;

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .context("invalid base64 signature payload")?;

    let decoded = decode_limited(&bytes)?;

    let (width, height) = (decoded.width(), decoded.height());
    if width == 0 || height == 0 || u64::from(width) * u64::from(height) > MAX_SIGNATURE_PIXELS {
        bail!("signature image has unsupported dimensions {}x{}", width, height);
    }

    let rgba = decoded.to_rgba8();
    let mut flattened = RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend = |channel: u8| ((u16::from(channel) * alpha + 255 * (255 - alpha)) / 255) as u8;
        flattened.put_pixel(x, y, Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]));
    }

    let mut data = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut data, JPEG_QUALITY);
        encoder
            .encode_image(&flattened)
            .context("failed to re-encode signature as JPEG")?;
    }

    Ok(JpegImage { data, width, height })
}

// Os limites valem para as dimensões declaradas, antes de alocar os pixels
fn decode_limited(bytes: &[u8]) -> anyhow::Result<DynamicImage> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .context("unreadable signature image")?;

    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_SIGNATURE_SIDE);
    limits.max_image_height = Some(MAX_SIGNATURE_SIDE);
    reader.limits(limits);

    reader.decode().context("unreadable signature image")
}

/// Escala para caber na caixa mantendo a proporção. Nunca aumenta.
pub fn fit_within(width: f32, height: f32, max_width: f32, max_height: f32) -> (f32, f32) {
    if width <= 0.0 || height <= 0.0 {
        return (0.0, 0.0);
    }
    let scale = (max_width / width).min(max_height / height).min(1.0);
    (width * scale, height * scale)
}
