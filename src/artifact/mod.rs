// Artifact parser — structured data out of nominally-structured oracle text
//
// Responses are asked for as strict JSON or tagged blocks but arrive as
// whatever the service felt like emitting: fenced, prefixed with prose,
// wrapped in stray tags. Everything here degrades to None/empty instead of
// erroring; the caller decides what "no signal" means.

use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

/// Strip markdown code fences and stray one-line `<tag>` wrappers.
///
/// Drops a leading/trailing ``` line (with or without a language tag) and any
/// line that is nothing but an XML-ish tag, then trims.
pub fn clean_block(content: &str) -> String {
    let mut lines: Vec<&str> = content.trim().lines().collect();

    if lines.first().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.remove(0);
    }
    if lines.last().is_some_and(|l| l.trim_start().starts_with("```")) {
        lines.pop();
    }

    lines.retain(|line| {
        let t = line.trim();
        !(t.starts_with('<') && t.ends_with('>') && !t.contains(' '))
    });

    lines.join("\n").trim().to_string()
}

/// Parse a JSON object of type `T` out of free-form oracle text.
///
/// Tries a direct parse of the cleaned text first, then the widest
/// `{`..`}` slice embedded in it.
pub fn parse_json_object<T: DeserializeOwned>(text: &str) -> Option<T> {
    let cleaned = clean_block(text);

    if let Ok(value) = serde_json::from_str::<T>(&cleaned) {
        return Some(value);
    }

    let start = cleaned.find('{')?;
    let end = cleaned.rfind('}')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<T>(&cleaned[start..=end]).ok()
}

/// Parse a JSON array of type `T` out of free-form oracle text.
pub fn parse_json_array<T: DeserializeOwned>(text: &str) -> Option<Vec<T>> {
    let cleaned = clean_block(text);

    if let Ok(value) = serde_json::from_str::<Vec<T>>(&cleaned) {
        return Some(value);
    }

    let start = cleaned.find('[')?;
    let end = cleaned.rfind(']')?;
    if end <= start {
        return None;
    }
    serde_json::from_str::<Vec<T>>(&cleaned[start..=end]).ok()
}

fn gen_file_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?s)<gen-file path=['"]?([^>'"]+?)['"]?>\s*(.*?)\s*</gen-file>"#)
            .expect("gen-file pattern is valid")
    })
}

/// Extract `<gen-file path="...">...</gen-file>` blocks as (path, content)
/// pairs. Content is cleaned of fences/tags per [`clean_block`].
pub fn parse_gen_file_blocks(text: &str) -> Vec<(String, String)> {
    gen_file_regex()
        .captures_iter(text)
        .map(|cap| (cap[1].trim().to_string(), clean_block(&cap[2])))
        .collect()
}
