/// Extraction of the user object embedded in a rendered profile page
///
/// The upstream page has carried its bootstrap data under several
/// conventions over time. Each convention is a pattern that locates the
/// opening brace of a JSON blob; the blob is parsed as a single leading JSON
/// value and then searched for a `graphql.user` object.
use super::StrategyError;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::borrow::Cow;

/// Nesting limit for the user-object walk
pub const MAX_WALK_DEPTH: usize = 64;

struct EmbedPattern {
    name: &'static str,
    regex: Regex,
    /// Blob sits inside a JS string literal and must be unescaped first
    escaped: bool,
}

lazy_static! {
    static ref EMBED_PATTERNS: Vec<EmbedPattern> = vec![
        EmbedPattern {
            name: "shared_data",
            regex: Regex::new(r"window\._sharedData\s*=\s*(?P<json>\{)").unwrap(),
            escaped: false,
        },
        EmbedPattern {
            name: "escaped_config",
            regex: Regex::new(r#"(?P<json>\{)\\"config\\":"#).unwrap(),
            escaped: true,
        },
        EmbedPattern {
            name: "profile_page",
            regex: Regex::new(r#""profile_page_[0-9]+"\s*:\s*(?P<json>\{)"#).unwrap(),
            escaped: false,
        },
    ];
}

/// Find the embedded user object in a profile page
pub fn extract_user(html: &str) -> Result<Value, StrategyError> {
    for pattern in EMBED_PATTERNS.iter() {
        let Some(start) = pattern
            .regex
            .captures(html)
            .and_then(|caps| caps.name("json"))
            .map(|m| m.start())
        else {
            continue;
        };

        let tail = &html[start..];
        let text = if pattern.escaped {
            unescape(tail)
        } else {
            Cow::Borrowed(tail)
        };

        let Some(blob) = parse_leading_json(&text) else {
            tracing::debug!(pattern = pattern.name, "embedded blob did not parse");
            continue;
        };

        if let Some(user) = find_user(&blob) {
            tracing::debug!(pattern = pattern.name, "embedded user object found");
            return Ok(user.clone());
        }
    }

    Err(StrategyError::Shape(
        "no embedded profile data in page".to_string(),
    ))
}

/// Undo one level of JS string escaping
pub fn unescape(text: &str) -> Cow<'_, str> {
    if !text.contains('\\') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\\\"", "\"").replace("\\\\", "\\"))
}

/// Parse the first JSON value in `text`, ignoring whatever follows it
fn parse_leading_json(text: &str) -> Option<Value> {
    serde_json::Deserializer::from_str(text)
        .into_iter::<Value>()
        .next()
        .and_then(Result::ok)
}

/// Locate `graphql.user` anywhere in `root`.
///
/// Iterative pre-order walk; nodes deeper than [`MAX_WALK_DEPTH`] are not
/// expanded.
pub fn find_user(root: &Value) -> Option<&Value> {
    let mut worklist: Vec<(&Value, usize)> = vec![(root, 0)];

    while let Some((value, depth)) = worklist.pop() {
        match value {
            Value::Object(map) => {
                if let Some(user) = map.get("graphql").and_then(|g| g.get("user")) {
                    if user.is_object() {
                        return Some(user);
                    }
                }
                if depth < MAX_WALK_DEPTH {
                    worklist.extend(map.values().rev().map(|v| (v, depth + 1)));
                }
            }
            Value::Array(items) => {
                if depth < MAX_WALK_DEPTH {
                    worklist.extend(items.iter().rev().map(|v| (v, depth + 1)));
                }
            }
            _ => {}
        }
    }

    None
}
