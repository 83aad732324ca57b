// src/pdf/wrap.rs

use super::metrics::{sanitize, text_width, Font};

/// Quebra gulosa por largura medida. Palavras maiores que a linha são
/// cortadas caractere a caractere, então nenhum conteúdo se perde.
pub fn wrap_text(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let clean = sanitize(text);
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in clean.split_whitespace() {
        if text_width(word, font, size) > max_width {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let mut fragments = hard_break(word, font, size, max_width);
            // O último pedaço pode receber as próximas palavras
            current = fragments.pop().unwrap_or_default();
            lines.extend(fragments);
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            continue;
        }

        let candidate_width = text_width(&current, font, size)
            + text_width(" ", font, size)
            + text_width(word, font, size);

        if candidate_width <= max_width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Mantém as quebras de linha do usuário (textarea). Linhas em branco
/// repetidas viram uma só, e as das pontas são descartadas.
pub fn wrap_paragraphs(text: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();

    for paragraph in text.lines() {
        let wrapped = wrap_text(paragraph, font, size, max_width);
        if wrapped.is_empty() {
            if lines.last().is_some_and(|last| !last.is_empty()) {
                lines.push(String::new());
            }
        } else {
            lines.extend(wrapped);
        }
    }

    while lines.last().is_some_and(String::is_empty) {
        lines.pop();
    }
    lines
}

fn hard_break(word: &str, font: Font, size: f32, max_width: f32) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut current = String::new();

    for ch in word.chars() {
        let mut candidate = current.clone();
        candidate.push(ch);

        // Sempre pelo menos um caractere por pedaço
        if !current.is_empty() && text_width(&candidate, font, size) > max_width {
            fragments.push(std::mem::take(&mut current));
            current.push(ch);
        } else {
            current = candidate;
        }
    }

    if !current.is_empty() {
        fragments.push(current);
    }
    fragments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::text::collapse_whitespace;

    const SIZE: f32 = 10.5;
    const WIDTH: f32 = 200.0;

    #[test]
    fn rejoining_lines_reproduces_normalized_text() {
        let text = "Avoid  direct sun exposure,\tsunbeds and   fake tan for at least 48 hours \
                    after your treatment. Do not apply makeup to the treated area until the \
                    next day, and keep the skin clean and moisturised.";

        let lines = wrap_text(text, Font::Regular, SIZE, WIDTH);

        assert!(lines.len() > 1);
        assert_eq!(lines.join(" "), collapse_whitespace(text));
        for line in &lines {
            assert!(text_width(line, Font::Regular, SIZE) <= WIDTH);
        }
    }

    #[test]
    fn unbroken_token_is_hard_broken_without_loss() {
        let token = "https://example.com/".to_string() + &"a1b2c3d4".repeat(40);

        let lines = wrap_text(&token, Font::Bold, SIZE, WIDTH);

        assert!(lines.len() > 1);
        assert_eq!(lines.concat(), token);
        for line in &lines {
            assert!(text_width(line, Font::Bold, SIZE) <= WIDTH);
        }
    }

    #[test]
    fn long_token_shares_line_with_following_words() {
        let text = format!("see {} now", "x".repeat(120));

        let lines = wrap_text(&text, Font::Regular, SIZE, WIDTH);

        assert_eq!(lines.first().map(String::as_str), Some("see"));
        assert!(lines.last().is_some_and(|l| l.ends_with(" now")));
        assert_eq!(lines.concat().replace(' ', ""), text.replace(' ', ""));
    }

    #[test]
    fn empty_text_produces_no_lines() {
        assert!(wrap_text("   \t ", Font::Regular, SIZE, WIDTH).is_empty());
    }

    #[test]
    fn paragraphs_keep_user_line_breaks() {
        let lines = wrap_paragraphs("\nFirst line\n\n\n\nSecond line\n\n", Font::Regular, SIZE, WIDTH);
        assert_eq!(lines, vec!["First line", "", "Second line"]);
    }
}
