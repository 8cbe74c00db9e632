use uuid::Uuid;

use crate::error::{Error, Result};

const URL_ID_LENGTH: usize = 10;
const MAX_SLUG_LENGTH: usize = 64;

/// Lowercases a title and collapses every run of non-alphanumeric characters
/// into a single dash.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut pending_dash = false;

    for c in title.trim().chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    if slug.chars().count() > MAX_SLUG_LENGTH {
        slug = slug.chars().take(MAX_SLUG_LENGTH).collect();
        slug = slug.trim_end_matches('-').to_string();
    }

    if slug.is_empty() {
        "untitled".to_string()
    } else {
        slug
    }
}

#[must_use]
pub fn document_url(slug: &str, url_id: &str) -> String {
    format!("/doc/{slug}-{url_id}")
}

/// Generates the short public identifier used in document urls.
#[must_use]
pub fn generate_url_id() -> String {
    Uuid::new_v4().simple().to_string()[..URL_ID_LENGTH].to_string()
}

/// Trims a title and checks it against the configured length limit.
pub fn normalize_title(title: &str, max_length: usize) -> Result<String> {
    let title = title.trim();

    if title.chars().count() > max_length {
        return Err(Error::validation(format!(
            "Title cannot exceed {max_length} characters"
        )));
    }

    const INVALID_CHARS: &[char] = &['\0', '\n', '\r'];
    if title.chars().any(|c| INVALID_CHARS.contains(&c)) {
        return Err(Error::validation("Title contains invalid characters"));
    }

    Ok(title.to_string())
}
