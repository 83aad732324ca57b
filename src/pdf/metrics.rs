// src/pdf/metrics.rs
// Métricas das fontes Type1 padrão (Helvetica) em WinAnsiEncoding.
// Larguras em milésimos de em, tiradas dos arquivos AFM da Adobe.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    pub const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Oblique];

    /// Nome do recurso dentro do dicionário /Font da página.
    pub fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
        }
    }

    pub fn base_font(&self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Oblique => "Helvetica-Oblique",
        }
    }
}

// ' ' (32) até '~' (126)
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 48-63
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 80-95
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 96-111
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 112-126
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 32-47
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 48-63
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 64-79
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 80-95
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 96-111
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 112-126
];

const FALLBACK_WIDTH: u16 = 556;

/// Mapeia um caractere Unicode para o byte WinAnsi, se existir.
pub fn win_ansi_byte(ch: char) -> Option<u8> {
    let byte = match ch {
        ' '..='~' => ch as u8,
        '\u{A0}'..='\u{FF}' => ch as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        _ => return None,
    };
    Some(byte)
}

/// Troca o que a fonte não sabe desenhar: tabs viram espaço, controles somem,
/// o resto fora do WinAnsi vira '?'.
pub fn sanitize(text: &str) -> String {
    text.chars()
        .filter_map(|ch| match ch {
            '\t' => Some(' '),
            '\n' => Some('\n'),
            c if c.is_control() => None,
            c if win_ansi_byte(c).is_some() => Some(c),
            _ => Some('?'),
        })
        .collect()
}

/// Bytes prontos para o operador Tj.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars()
        .map(|ch| win_ansi_byte(ch).unwrap_or(b'?'))
        .collect()
}

fn glyph_width(font: Font, byte: u8) -> u16 {
    let table = match font {
        Font::Bold => &HELVETICA_BOLD_WIDTHS,
        Font::Regular | Font::Oblique => &HELVETICA_WIDTHS,
    };

    match byte {
        32..=126 => table[(byte - 32) as usize],
        0x82 | 0x91 | 0x92 => 222,
        0x84 | 0x93 | 0x94 | 0x8B | 0x9B => 333,
        0x95 => 350,
        0x85 | 0x89 | 0x8C | 0x97 | 0x99 => 1000,
        0x9C => 944,
        0xA0 => 278,
        _ => FALLBACK_WIDTH,
    }
}

/// Largura do texto em pontos.
pub fn text_width(text: &str, font: Font, size: f32) -> f32 {
    let units: u32 = text
        .chars()
        .map(|ch| u32::from(glyph_width(font, win_ansi_byte(ch).unwrap_or(b'?'))))
        .sum();
    units as f32 * size / 1000.0
}
