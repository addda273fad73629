//! JSON extraction and repair for raw model output.
//!
//! The generation endpoint is asked for strict JSON and routinely returns it
//! wrapped in prose, code fences, or with the usual LLM syntax slips. The
//! chain below applies increasingly aggressive textual repairs; the first
//! pass that parses wins. Each repair is a pure function with its own test
//! table.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;

use crate::error::ParseError;

lazy_static! {
    static ref BARE_KEY: Regex =
        Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:"#).expect("bare-key regex");
    static ref TRAILING_COMMA: Regex = Regex::new(r",\s*([}\]])").expect("trailing-comma regex");
    static ref CODE_FENCE: Regex = Regex::new(r"```(?:json)?").expect("code-fence regex");
    static ref WHITESPACE_RUN: Regex = Regex::new(r"\s+").expect("whitespace regex");
}

const FRACTIONS: [(&str, &str); 9] = [
    ("1/2", "0.5"),
    ("1/4", "0.25"),
    ("3/4", "0.75"),
    ("1/3", "0.33"),
    ("2/3", "0.67"),
    ("1/8", "0.125"),
    ("3/8", "0.375"),
    ("5/8", "0.625"),
    ("7/8", "0.875"),
];

/// Substring from the first `{` to the last `}`, if any.
pub fn slice_outer_braces(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    (end >= start).then(|| &raw[start..=end])
}

/// Quote unquoted object keys: `{title: ...}` becomes `{"title": ...}`.
pub fn quote_bare_keys(text: &str) -> String {
    BARE_KEY.replace_all(text, "${1}\"${2}\":").into_owned()
}

/// Drop trailing commas before a closing brace or bracket.
pub fn strip_trailing_commas(text: &str) -> String {
    TRAILING_COMMA.replace_all(text, "$1").into_owned()
}

/// Replace vulgar-fraction literals in value position (`"amount": 1/2`)
/// with decimal literals. Fractions inside quoted strings are left alone by
/// requiring a value delimiter on both sides.
pub fn normalize_fractions(text: &str) -> String {
    let mut out = text.to_string();
    for (fraction, decimal) in FRACTIONS {
        let pattern = format!(r"([:\[,]\s*){}(\s*[,\}}\]])", regex::escape(fraction));
        let re = Regex::new(&pattern).expect("fraction regex");
        out = re
            .replace_all(&out, format!("${{1}}{decimal}${{2}}"))
            .into_owned();
    }
    out
}

pub fn strip_code_fences(text: &str) -> String {
    CODE_FENCE.replace_all(text, "").into_owned()
}

pub fn collapse_whitespace(text: &str) -> String {
    WHITESPACE_RUN.replace_all(text, " ").into_owned()
}

fn repair(text: &str) -> String {
    normalize_fractions(&strip_trailing_commas(&quote_bare_keys(text)))
}

/// Heuristic: the payload started a meals/groups object but never closed it.
fn looks_truncated(raw: &str) -> bool {
    (raw.contains("\"meals\"") || raw.contains("\"groups\""))
        && !raw.trim_end().ends_with('}')
}

/// Extract a JSON object from raw model output, repairing what can be
/// repaired. Truncation gets its own error so the caller can shrink the
/// request instead of retrying identically.
pub fn parse_llm_json(raw: &str) -> Result<Value, ParseError> {
    let trimmed = raw.trim();

    if let Some(slice) = slice_outer_braces(trimmed) {
        // Untouched first: the repairs are heuristics and can mangle JSON
        // that was already well formed.
        if let Ok(value) = serde_json::from_str::<Value>(slice) {
            return Ok(value);
        }
        if let Ok(value) = serde_json::from_str::<Value>(&repair(slice)) {
            return Ok(value);
        }
    }

    // Aggressive pass: strip fences, flatten whitespace, re-slice, re-repair.
    let flattened = collapse_whitespace(&strip_code_fences(trimmed));
    let last_error = match slice_outer_braces(&flattened) {
        Some(slice) => {
            if let Ok(value) = serde_json::from_str::<Value>(slice) {
                return Ok(value);
            }
            match serde_json::from_str::<Value>(&repair(slice)) {
                Ok(value) => return Ok(value),
                Err(e) => e.to_string(),
            }
        }
        None => "no JSON object found in response".to_string(),
    };

    if looks_truncated(trimmed) {
        Err(ParseError::Truncated)
    } else {
        Err(ParseError::Malformed(last_error))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clean_json_passes_through() {
        let value = parse_llm_json(r#"{"meals": [{"title": "Soup"}]}"#).expect("clean json");
        assert_eq!(value["meals"][0]["title"], "Soup");
    }

    #[test]
    fn well_formed_strings_with_inner_colons_are_untouched() {
        // The bare-key repair must not fire on already valid JSON.
        let raw = r#"{"instructions": ["Preheat oven, then: add the tray."]}"#;
        let value = parse_llm_json(raw).expect("plain parse");
        assert_eq!(value["instructions"][0], "Preheat oven, then: add the tray.");
    }

    #[test]
    fn prose_around_the_object_is_ignored() {
        let raw = r#"Here are your meals! {"meals": []} Enjoy."#;
        assert_eq!(parse_llm_json(raw).expect("sliced"), json!({"meals": []}));
    }

    #[test]
    fn fenced_response_with_trailing_comma_equals_clean_parse() {
        let dirty = "```json\n{\"meals\": [{\"title\": \"Soup\", \"servings\": 4,}],}\n```";
        let clean = r#"{"meals": [{"title": "Soup", "servings": 4}]}"#;
        assert_eq!(
            parse_llm_json(dirty).expect("repaired"),
            parse_llm_json(clean).expect("clean")
        );
    }

    #[test]
    fn truncated_meals_payload_gets_the_truncation_error() {
        let raw = r#"{"meals": [{"title": "Soup", "descript"#;
        assert_eq!(parse_llm_json(raw).unwrap_err(), ParseError::Truncated);
    }

    #[test]
    fn garbage_gets_the_generic_error() {
        match parse_llm_json("I'm sorry, I can't do that.") {
            Err(ParseError::Malformed(_)) => {}
            other => panic!("expected malformed error, got {other:?}"),
        }
    }

    #[test]
    fn quote_bare_keys_table() {
        let cases = [
            (r#"{title: "Soup"}"#, r#"{"title": "Soup"}"#),
            (
                r#"{"a": 1, servings: 4}"#,
                r#"{"a": 1, "servings": 4}"#,
            ),
            // Already-quoted keys untouched.
            (r#"{"title": "a:b"}"#, r#"{"title": "a:b"}"#),
        ];
        for (input, expected) in cases {
            assert_eq!(quote_bare_keys(input), expected, "input: {input}");
        }
    }

    #[test]
    fn strip_trailing_commas_table() {
        let cases = [
            (r#"{"a": 1,}"#, r#"{"a": 1}"#),
            (r#"[1, 2, ]"#, r#"[1, 2]"#),
            (r#"{"a": [1,],}"#, r#"{"a": [1]}"#),
            // Commas between elements survive.
            (r#"{"a": 1, "b": 2}"#, r#"{"a": 1, "b": 2}"#),
        ];
        for (input, expected) in cases {
            assert_eq!(strip_trailing_commas(input), expected, "input: {input}");
        }
    }

    #[test]
    fn normalize_fractions_table() {
        let cases = [
            (r#"{"amount": 1/2}"#, r#"{"amount": 0.5}"#),
            (r#"{"amount": 3/4, "b": 1}"#, r#"{"amount": 0.75, "b": 1}"#),
            (r#"[1/3, 7/8]"#, r#"[0.33, 0.875]"#),
            // Inside a quoted string the fraction is data, not a literal.
            (r#"{"note": "use 1/2 cup"}"#, r#"{"note": "use 1/2 cup"}"#),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_fractions(input), expected, "input: {input}");
        }
    }

    #[test]
    fn bare_keys_and_fractions_repair_end_to_end() {
        let raw = r#"{meals: [{title: "Soup", amount: 1/4,}]}"#;
        let value = parse_llm_json(raw).expect("fully repaired");
        assert_eq!(value["meals"][0]["amount"], json!(0.25));
    }

    #[test]
    fn newline_soup_is_flattened_on_the_second_pass() {
        let raw = "```json\n{\n  \"meals\"\n: []\n}\n```";
        assert_eq!(parse_llm_json(raw).expect("flattened"), json!({"meals": []}));
    }

    #[test]
    fn slice_outer_braces_handles_missing_braces() {
        assert_eq!(slice_outer_braces("no json here"), None);
        assert_eq!(slice_outer_braces("} backwards {"), None);
        assert_eq!(slice_outer_braces(r#"x {"a": 1} y"#), Some(r#"{"a": 1}"#));
    }
}
