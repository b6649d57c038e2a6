//! Pragmatic `.eml` (RFC 5322 style) parsing for the CLI driver.
//!
//! Deliberately lightweight: header unfolding plus a one-level
//! multipart split is enough to feed the normalizer, and keeps the
//! crate free of heavyweight MIME dependencies. Production ingestion
//! hands the engine an already-parsed [`ParsedMessage`] instead.

use crate::message::{MessagePart, ParsedMessage};
use anyhow::{anyhow, Result};
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

pub fn parse_eml_from_path(path: &Path) -> Result<ParsedMessage> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read {}: {e}", path.display()))?;
    Ok(parse_eml(&content))
}

pub fn parse_eml(content: &str) -> ParsedMessage {
    let content = content.replace("\r\n", "\n");
    let (headers_raw, body) = match content.find("\n\n") {
        Some(pos) => (&content[..pos], &content[pos + 2..]),
        None => (content.as_str(), ""),
    };

    let headers = parse_headers(headers_raw);
    let content_type = headers.get("content-type").cloned().unwrap_or_default();

    let parts = match boundary_of(&content_type) {
        Some(boundary) => split_multipart(body, &boundary),
        None => vec![MessagePart {
            content_type: mime_type(&content_type).unwrap_or_else(|| "text/plain".to_string()),
            charset: charset_of(&content_type),
            transfer_encoding: headers.get("content-transfer-encoding").cloned(),
            body: body.as_bytes().to_vec(),
        }],
    };

    ParsedMessage { headers, parts }
}

/// Unfold continuation lines and collect headers, lower-cased names,
/// first occurrence winning.
fn parse_headers(raw: &str) -> HashMap<String, String> {
    let mut headers = HashMap::new();
    let mut current: Option<(String, String)> = None;

    for line in raw.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = current.as_mut() {
                value.push(' ');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((name, value)) = current.take() {
            headers.entry(name).or_insert(value);
        }
        if let Some(colon) = line.find(':') {
            current = Some((
                line[..colon].trim().to_lowercase(),
                line[colon + 1..].trim().to_string(),
            ));
        }
    }
    if let Some((name, value)) = current.take() {
        headers.entry(name).or_insert(value);
    }
    headers
}

fn boundary_of(content_type: &str) -> Option<String> {
    let regex = Regex::new(r#"(?i)boundary\s*=\s*"?([^";]+)"?"#).unwrap();
    regex
        .captures(content_type)
        .map(|c| c[1].trim().to_string())
}

fn charset_of(content_type: &str) -> Option<String> {
    let regex = Regex::new(r#"(?i)charset\s*=\s*"?([^";]+)"?"#).unwrap();
    regex
        .captures(content_type)
        .map(|c| c[1].trim().to_string())
}

fn mime_type(content_type: &str) -> Option<String> {
    let mime = content_type.split(';').next()?.trim().to_lowercase();
    if mime.is_empty() {
        None
    } else {
        Some(mime)
    }
}

/// One-level multipart split. Nested multiparts are flattened by
/// re-splitting parts that carry their own boundary.
fn split_multipart(body: &str, boundary: &str) -> Vec<MessagePart> {
    let delimiter = format!("--{boundary}");
    let mut parts = Vec::new();

    for chunk in body.split(delimiter.as_str()).skip(1) {
        let chunk = chunk.trim_start_matches('\n');
        if chunk.starts_with("--") || chunk.trim().is_empty() {
            continue;
        }
        let (headers_raw, part_body) = match chunk.find("\n\n") {
            Some(pos) => (&chunk[..pos], &chunk[pos + 2..]),
            None => ("", chunk),
        };
        let part_headers = parse_headers(headers_raw);
        let content_type = part_headers
            .get("content-type")
            .cloned()
            .unwrap_or_else(|| "text/plain".to_string());

        if let Some(inner) = boundary_of(&content_type) {
            parts.extend(split_multipart(part_body, &inner));
            continue;
        }

        parts.push(MessagePart {
            content_type: mime_type(&content_type).unwrap_or_else(|| "text/plain".to_string()),
            charset: charset_of(&content_type),
            transfer_encoding: part_headers.get("content-transfer-encoding").cloned(),
            body: part_body.trim_end_matches('\n').as_bytes().to_vec(),
        });
    }
    parts
}
