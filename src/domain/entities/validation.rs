use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;
use validator::{ValidationError, ValidationErrors, ValidationErrorsKind};

use crate::entities::option_fields::OptionField;

pub static SLUG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9-]+$").expect("slug pattern is valid"));

pub fn new_validation_error(code: &'static str, msg: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(Cow::Borrowed(msg));
    err
}

pub fn validate_url(url: &str) -> Result<(), ValidationError> {
    match url::Url::parse(url) {
        Ok(parsed) if parsed.scheme() == "http" || parsed.scheme() == "https" => Ok(()),
        Ok(_) => Err(new_validation_error("invalid_url_scheme", "URL must start with http:// or https://")),
        Err(_) => Err(new_validation_error("invalid_url", "Invalid URL format")),
    }
}

/// Link fields accept an empty string, meaning "no link".
pub fn validate_optional_link(url: &str) -> Result<(), ValidationError> {
    if url.is_empty() {
        return Ok(());
    }
    validate_url(url)
}

pub fn validate_link_field(value: &OptionField<String>) -> Result<(), ValidationError> {
    match value {
        OptionField::SetToValue(url) => validate_optional_link(url),
        _ => Ok(()),
    }
}

pub fn validate_image_urls(images: &[String]) -> Result<(), ValidationError> {
    images.iter().try_for_each(|url| validate_url(url))
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if !SLUG_PATTERN.is_match(slug) {
        return Err(new_validation_error(
            "slug_invalid_chars",
            "Slug can only contain lowercase letters, numbers, and hyphens",
        ));
    }
    Ok(())
}

/// Empty strings are dropped so an omitted link is stored as absent.
pub fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Flattens field errors into `field -> messages`, with camelCase field
/// names matching the JSON payloads.
pub fn field_messages(errors: &ValidationErrors) -> std::collections::BTreeMap<String, Vec<String>> {
    let mut out = std::collections::BTreeMap::new();
    collect_messages(errors, None, &mut out);
    out
}

fn collect_messages(
    errors: &ValidationErrors,
    prefix: Option<&str>,
    out: &mut std::collections::BTreeMap<String, Vec<String>>,
) {
    for (field, kind) in errors.errors() {
        let name = match prefix {
            Some(prefix) => format!("{prefix}.{}", to_camel_case(field)),
            None => to_camel_case(field),
        };
        match kind {
            ValidationErrorsKind::Field(errs) => {
                let messages = out.entry(name).or_insert_with(Vec::new);
                messages.extend(errs.iter().map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid value ({})", e.code))
                }));
            }
            ValidationErrorsKind::Struct(inner) => collect_messages(inner, Some(&name), out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    collect_messages(inner, Some(&format!("{name}.{index}")), out);
                }
            }
        }
    }
}

pub fn to_camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = !out.is_empty();
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
