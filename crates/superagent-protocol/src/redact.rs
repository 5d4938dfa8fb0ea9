//! Secret redaction for anything emitted to logs or the NDJSON surface
//! (spec §6): mask API-key-shaped tokens in free text, and blank out the
//! value of any JSON object key whose name looks secret-bearing.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};
use serde_json::Value;

const MASK: &str = "***REDACTED***";

/// Key names containing any of these (case-insensitive) have their value
/// replaced outright, regardless of the value's shape (spec §6: "values of
/// keys whose name contains key|token|secret|password|auth").
static SENSITIVE_KEY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)key|token|secret|password|auth").unwrap());

/// Token-shaped patterns matched in free text: `sk-...` (OpenAI/Anthropic
/// style), `ghp_...` (GitHub personal access tokens), and `Bearer <token>`
/// authorization headers.
static TOKEN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"sk-[A-Za-z0-9_-]{10,}").unwrap(),
        Regex::new(r"ghp_[A-Za-z0-9]{20,}").unwrap(),
        Regex::new(r"(?i)Bearer\s+[A-Za-z0-9._\-]+").unwrap(),
    ]
});

static TOKEN_SET: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(TOKEN_PATTERNS.iter().map(|re| re.as_str())).unwrap()
});

/// Masks every token-shaped substring of `text`. Cheap no-op fast path via
/// `RegexSet::is_match` before doing any actual replacement work.
pub fn redact_text(text: &str) -> String {
    if !TOKEN_SET.is_match(text) {
        return text.to_string();
    }
    let mut out = text.to_string();
    for pattern in TOKEN_PATTERNS.iter() {
        out = pattern.replace_all(&out, MASK).into_owned();
    }
    out
}

/// Recursively redacts a JSON value: object entries whose key name matches
/// [`SENSITIVE_KEY_RE`] are replaced wholesale; every remaining string leaf
/// is passed through [`redact_text`] to catch tokens embedded in otherwise
/// innocuous fields (free-form error messages, tool output, etc).
pub fn redact_value(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if SENSITIVE_KEY_RE.is_match(key) {
                    *val = Value::String(MASK.to_string());
                } else {
                    redact_value(val);
                }
            }
        }
        Value::Array(items) => {
            for item in items.iter_mut() {
                redact_value(item);
            }
        }
        Value::String(s) => {
            let redacted = redact_text(s);
            if redacted != *s {
                *s = redacted;
            }
        }
        _ => {}
    }
}

/// Redacts a full JSON document, returning a new value rather than
/// mutating in place — used at the NDJSON write boundary where the caller
/// still needs the unredacted event for in-process consumers.
pub fn redacted_clone(value: &Value) -> Value {
    let mut cloned = value.clone();
    redact_value(&mut cloned);
    cloned
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_openai_style_keys() {
        let text = "used sk-abcdefghijklmno for the request";
        assert_eq!(redact_text(text), "used ***REDACTED*** for the request");
    }

    #[test]
    fn masks_github_tokens_and_bearer_headers() {
        assert_eq!(
            redact_text("token ghp_abcdefghijklmnopqrstuvwx ok"),
            "token ***REDACTED*** ok"
        );
        assert_eq!(
            redact_text("Authorization: Bearer abc123.def456"),
            "Authorization: ***REDACTED***"
        );
    }

    #[test]
    fn leaves_unrelated_text_untouched() {
        let text = "the plan has three steps";
        assert_eq!(redact_text(text), text);
    }

    #[test]
    fn redacts_sensitive_keys_in_json_regardless_of_shape() {
        let mut value = json!({
            "api_key": "sk-live-1234567890",
            "password": 12345,
            "auth_token": {"nested": "still replaced"},
            "note": "contains sk-nottechnicallyatoken1234 inline",
            "safe": "unchanged",
        });
        redact_value(&mut value);
        assert_eq!(value["api_key"], json!("***REDACTED***"));
        assert_eq!(value["password"], json!("***REDACTED***"));
        assert_eq!(value["auth_token"], json!("***REDACTED***"));
        assert_eq!(value["note"], json!("contains ***REDACTED*** inline"));
        assert_eq!(value["safe"], json!("unchanged"));
    }

    #[test]
    fn redacted_clone_does_not_mutate_original() {
        let original = json!({"secret": "shh"});
        let cloned = redacted_clone(&original);
        assert_eq!(original["secret"], json!("shh"));
        assert_eq!(cloned["secret"], json!("***REDACTED***"));
    }
}
