// src/common/text.rs
// Helpers de texto compartilhados entre referências, rótulos e nomes de arquivo.

/// "Anti-Wrinkle Injections!" -> "anti-wrinkle-injections"
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Igual a `slugify`, mas nunca devolve string vazia.
pub fn slugify_or(input: Option<&str>, fallback: &str) -> String {
    let slug = input.map(slugify).unwrap_or_default();
    if slug.is_empty() { fallback.to_string() } else { slug }
}

/// Quebra camelCase, snake_case e kebab-case em palavras.
/// "clientSignatureWax" -> ["client", "Signature", "Wax"]
pub fn split_words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for ch in input.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }

        let boundary = match prev {
            Some(p) => {
                (ch.is_uppercase() && (p.is_lowercase() || p.is_ascii_digit()))
                    || (ch.is_ascii_digit() && p.is_alphabetic())
            }
            None => false,
        };

        if boundary && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        current.push(ch);
        prev = Some(ch);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// "dateOfBirth" -> "Date Of Birth"
pub fn humanize_key(key: &str) -> String {
    split_words(key)
        .iter()
        .map(|word| capitalize(word))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Colapsa qualquer sequência de espaços em um só.
pub fn collapse_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<_>>().join(" ")
}
