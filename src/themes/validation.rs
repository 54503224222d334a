use crate::error::{Error, Result};

pub const MIN_THEME_ID_LEN: usize = 3;
pub const MAX_THEME_ID_LEN: usize = 32;
pub const MAX_NAME_LEN: usize = 64;
pub const MAX_DESCRIPTION_LEN: usize = 8192;
pub const MAX_CONTENT_LEN: usize = 128 * 1024;
pub const MAX_MESSAGE_LEN: usize = 8192;
pub const MAX_PREVIEW_SIZE: usize = 512 * 1024;
pub const MAX_PREVIEW_COUNT: usize = 8;

/// Ids that would shadow a route segment under `/themes/`.
const RESERVED_THEME_IDS: &[&str] = &["new", "commit"];

fn is_valid_theme_id_char(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_'
}

pub fn validate_theme_id(id: &str) -> Result<()> {
    if id.len() < MIN_THEME_ID_LEN || id.len() > MAX_THEME_ID_LEN {
        return Err(Error::invalid(format!(
            "Theme id must be between {MIN_THEME_ID_LEN} and {MAX_THEME_ID_LEN} characters"
        )));
    }
    if !id.chars().all(is_valid_theme_id_char) {
        return Err(Error::invalid(
            "Theme id can only contain lowercase letters, digits, hyphens, and underscores",
        ));
    }
    if RESERVED_THEME_IDS.contains(&id) {
        return Err(Error::invalid(format!("Theme id '{id}' is reserved")));
    }
    Ok(())
}

/// Limits are in bytes, so multi-byte characters count for more than one.
fn validate_len(field: &str, value: &str, max_len: usize) -> Result<()> {
    if value.len() > max_len {
        return Err(Error::invalid(format!(
            "{field} cannot exceed {max_len} bytes"
        )));
    }
    Ok(())
}

pub fn validate_name(name: &str) -> Result<()> {
    validate_len("Name", name, MAX_NAME_LEN)
}

pub fn validate_description(description: &str) -> Result<()> {
    validate_len("Description", description, MAX_DESCRIPTION_LEN)
}

pub fn validate_content(content: &str) -> Result<()> {
    validate_len("Content", content, MAX_CONTENT_LEN)
}

pub fn validate_message(message: &str) -> Result<()> {
    validate_len("Commit message", message, MAX_MESSAGE_LEN)
}

/// Parses a preview id into its canonical hyphenated form.
pub fn parse_preview_id(id: &str) -> Result<String> {
    uuid::Uuid::parse_str(id.trim())
        .map(|uuid| uuid.hyphenated().to_string())
        .map_err(|_| Error::invalid(format!("'{id}' is not a valid preview id")))
}
