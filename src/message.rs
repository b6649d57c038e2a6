use base64::{engine::general_purpose, Engine as _};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Already-parsed message as handed over by the ingestion layer:
/// a header map plus the MIME parts with their raw bytes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ParsedMessage {
    /// Header names are stored lower-cased; first occurrence wins.
    pub headers: HashMap<String, String>,
    pub parts: Vec<MessagePart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessagePart {
    pub content_type: String,
    pub charset: Option<String>,
    pub transfer_encoding: Option<String>,
    pub body: Vec<u8>,
}

impl ParsedMessage {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_lowercase()).map(|v| v.as_str())
    }
}

/// The fixed field set every provider works from. Built once per
/// message, immutable afterwards, discarded after scoring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedMessage {
    pub sender_address: String,
    pub display_name: String,
    pub sender_domain: String,
    pub base_domain: String,
    /// Empty when the Reply-To header is absent; an empty value is
    /// never treated as a mismatch.
    pub reply_to_domain: String,
    /// Raw Authentication-Results text, lower-cased. Empty when the
    /// header is absent.
    pub auth_results: String,
    pub body_text: String,
    pub urls: BTreeSet<String>,
}

impl NormalizedMessage {
    pub fn from_parsed(msg: &ParsedMessage) -> Self {
        let from = msg.header("from").unwrap_or("");
        let (display_name, sender_address) = split_address(from);
        let sender_domain = domain_of(&sender_address);
        let base_domain = base_domain(&sender_domain);

        let reply_to_domain = msg
            .header("reply-to")
            .map(|h| domain_of(&split_address(h).1))
            .unwrap_or_default();

        let auth_results = msg
            .header("authentication-results")
            .map(|h| h.to_lowercase())
            .unwrap_or_default();

        let body_text = extract_body_text(msg);
        let urls = extract_urls(&body_text);

        Self {
            sender_address,
            display_name,
            sender_domain,
            base_domain,
            reply_to_domain,
            auth_results,
            body_text,
            urls,
        }
    }
}

/// Split an address header into (display name, address).
/// Handles `"Name" <user@host>`, `Name <user@host>` and bare
/// `user@host` forms.
pub fn split_address(header: &str) -> (String, String) {
    let header = header.trim();
    if let (Some(open), Some(close)) = (header.find('<'), header.rfind('>')) {
        if open < close {
            let display = header[..open].trim().trim_matches('"').trim().to_string();
            let address = header[open + 1..close].trim().to_string();
            return (display, address);
        }
    }
    (String::new(), header.to_string())
}

/// Domain part of an address: substring after the last `@`, lowercased.
pub fn domain_of(address: &str) -> String {
    match address.rfind('@') {
        Some(pos) if pos + 1 < address.len() => address[pos + 1..].trim().to_lowercase(),
        _ => String::new(),
    }
}

/// Last two dot-separated labels. A deliberate registrable-domain
/// approximation; wrong for multi-label public suffixes.
pub fn base_domain(domain: &str) -> String {
    let parts: Vec<&str> = domain.split('.').collect();
    if parts.len() >= 2 {
        format!("{}.{}", parts[parts.len() - 2], parts[parts.len() - 1])
    } else {
        domain.to_string()
    }
}

/// Concatenate all text/plain and text/html parts. A part that fails
/// to decode is skipped, never fatal.
fn extract_body_text(msg: &ParsedMessage) -> String {
    let mut texts = Vec::new();
    for part in &msg.parts {
        let content_type = part.content_type.to_lowercase();
        if !content_type.starts_with("text/plain") && !content_type.starts_with("text/html") {
            continue;
        }
        match decode_part(part) {
            Some(text) => texts.push(text),
            None => log::debug!("skipping undecodable {} part", part.content_type),
        }
    }
    texts.join("\n")
}

/// Transfer-decode then charset-decode one part. UTF-8 with lossy
/// replacement is the fallback for any charset we do not handle.
fn decode_part(part: &MessagePart) -> Option<String> {
    let bytes = match part
        .transfer_encoding
        .as_deref()
        .map(|e| e.trim().to_lowercase())
        .as_deref()
    {
        Some("base64") => {
            let compact: String = std::str::from_utf8(&part.body)
                .ok()?
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            general_purpose::STANDARD.decode(compact).ok()?
        }
        _ => part.body.clone(),
    };

    match part.charset.as_deref().map(|c| c.trim().to_lowercase()) {
        Some(cs) if cs == "iso-8859-1" || cs == "latin1" || cs == "windows-1252" => {
            // Single-byte superset of ASCII; map bytes straight to chars.
            Some(bytes.iter().map(|&b| b as char).collect())
        }
        _ => Some(String::from_utf8_lossy(&bytes).into_owned()),
    }
}

/// Every HTTP(S) URL in the body, trailing punctuation trimmed,
/// deduplicated. BTreeSet keeps the set order-stable for repeat runs.
fn extract_urls(body: &str) -> BTreeSet<String> {
    let url_regex = Regex::new(r#"(?i)https?://[^\s<>"']+"#).unwrap();
    url_regex
        .find_iter(body)
        .map(|m| m.as_str().trim_end_matches(['.', ',', ')', ';', '!', '?']).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_part(body: &str) -> MessagePart {
        MessagePart {
            content_type: "text/plain".to_string(),
            charset: Some("utf-8".to_string()),
            transfer_encoding: None,
            body: body.as_bytes().to_vec(),
        }
    }

    fn message_with(headers: &[(&str, &str)], parts: Vec<MessagePart>) -> ParsedMessage {
        ParsedMessage {
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_lowercase(), v.to_string()))
                .collect(),
            parts,
        }
    }

    #[test]
    fn test_split_address() {
        assert_eq!(
            split_address("\"PayPal\" <billing@paypal-support.net>"),
            ("PayPal".to_string(), "billing@paypal-support.net".to_string())
        );
        assert_eq!(
            split_address("Alice <alice@example.com>"),
            ("Alice".to_string(), "alice@example.com".to_string())
        );
        assert_eq!(
            split_address("bob@example.com"),
            (String::new(), "bob@example.com".to_string())
        );
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(domain_of("user@Example.COM"), "example.com");
        assert_eq!(domain_of("weird@quoted@host.org"), "host.org");
        assert_eq!(domain_of("no-at-sign"), "");
        assert_eq!(domain_of("trailing@"), "");
    }

    #[test]
    fn test_base_domain() {
        assert_eq!(base_domain("mail.example.com"), "example.com");
        assert_eq!(base_domain("example.com"), "example.com");
        assert_eq!(base_domain("a.b.c.d.org"), "d.org");
        assert_eq!(base_domain("localhost"), "localhost");
    }

    #[test]
    fn absent_reply_to_yields_empty_domain() {
        let msg = message_with(&[("From", "a@example.com")], vec![]);
        let normalized = NormalizedMessage::from_parsed(&msg);
        assert_eq!(normalized.reply_to_domain, "");
    }

    #[test]
    fn body_concatenates_text_parts_and_skips_others() {
        let msg = message_with(
            &[("From", "a@example.com")],
            vec![
                text_part("hello"),
                MessagePart {
                    content_type: "application/pdf".to_string(),
                    charset: None,
                    transfer_encoding: None,
                    body: vec![0xff, 0xfe],
                },
                text_part("world"),
            ],
        );
        let normalized = NormalizedMessage::from_parsed(&msg);
        assert_eq!(normalized.body_text, "hello\nworld");
    }

    #[test]
    fn base64_part_is_transfer_decoded() {
        let msg = message_with(
            &[("From", "a@example.com")],
            vec![MessagePart {
                content_type: "text/plain".to_string(),
                charset: Some("utf-8".to_string()),
                transfer_encoding: Some("base64".to_string()),
                body: b"aGVsbG8gd29ybGQ=".to_vec(),
            }],
        );
        let normalized = NormalizedMessage::from_parsed(&msg);
        assert_eq!(normalized.body_text, "hello world");
    }

    #[test]
    fn invalid_base64_part_is_skipped() {
        let msg = message_with(
            &[("From", "a@example.com")],
            vec![
                MessagePart {
                    content_type: "text/plain".to_string(),
                    charset: None,
                    transfer_encoding: Some("base64".to_string()),
                    body: b"!!! not base64 !!!".to_vec(),
                },
                text_part("still here"),
            ],
        );
        let normalized = NormalizedMessage::from_parsed(&msg);
        assert_eq!(normalized.body_text, "still here");
    }

    #[test]
    fn urls_are_extracted_and_deduplicated() {
        let msg = message_with(
            &[("From", "a@example.com")],
            vec![text_part(
                "click http://192.168.1.5/reset-password now, \
                 or https://example.com/a. Again: http://192.168.1.5/reset-password",
            )],
        );
        let normalized = NormalizedMessage::from_parsed(&msg);
        assert_eq!(normalized.urls.len(), 2);
        assert!(normalized.urls.contains("http://192.168.1.5/reset-password"));
        assert!(normalized.urls.contains("https://example.com/a"));
    }

    #[test]
    fn latin1_charset_is_decoded() {
        let msg = message_with(
            &[("From", "a@example.com")],
            vec![MessagePart {
                content_type: "text/plain".to_string(),
                charset: Some("ISO-8859-1".to_string()),
                transfer_encoding: None,
                body: vec![b'K', 0xe4, b's', b'e'],
            }],
        );
        let normalized = NormalizedMessage::from_parsed(&msg);
        assert_eq!(normalized.body_text, "Käse");
    }

    #[test]
    fn normalizer_fills_all_fields() {
        let msg = message_with(
            &[
                ("From", "\"PayPal\" <billing@mail.paypal-support.net>"),
                ("Reply-To", "other@elsewhere.org"),
                ("Authentication-Results", "mx.example.com; SPF=Pass; dkim=fail"),
            ],
            vec![text_part("visit https://bit.ly/x")],
        );
        let normalized = NormalizedMessage::from_parsed(&msg);

        assert_eq!(normalized.display_name, "PayPal");
        assert_eq!(normalized.sender_domain, "mail.paypal-support.net");
        assert_eq!(normalized.base_domain, "paypal-support.net");
        assert_eq!(normalized.reply_to_domain, "elsewhere.org");
        assert!(normalized.auth_results.contains("spf=pass"));
        assert!(normalized.urls.contains("https://bit.ly/x"));
    }
}
