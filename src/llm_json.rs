//! Best-effort extraction of JSON from LLM responses.
//!
//! The LLM is told to answer with pure JSON but regularly wraps it in prose,
//! markdown fences or bold markers, or answers with `key: value` lines instead.
//! [`extract`] runs an ordered chain of pure strategies and returns the first
//! hit together with the name of the strategy and a [`Confidence`] flag, so
//! callers can tell parsed JSON from scraped prose and from placeholders.
//!
//! Nothing here validates against a schema; callers normalize field by field.

use regex::Regex;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::sync::LazyLock;

/// Number of input characters quoted in [`ExtractError`].
const PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("Could not extract valid JSON or structured data from response: {preview}...")]
    Unrecognized { preview: String },
}

/// How much an extracted value can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// The value was parsed from JSON present in the text.
    Parsed,
    /// The value was scraped from prose by keyword patterns.
    Heuristic,
    /// Canned value chosen by keyword sniffing; carries no information.
    Placeholder,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub value: Value,
    pub strategy: &'static str,
    pub confidence: Confidence,
}

pub type Strategy = fn(&str) -> Option<Value>;

struct Step {
    name: &'static str,
    run: Strategy,
    confidence: Confidence,
}

const CHAIN: &[Step] = &[
    Step {
        name: "direct",
        run: parse_direct,
        confidence: Confidence::Parsed,
    },
    Step {
        name: "object_scan",
        run: scan_objects,
        confidence: Confidence::Parsed,
    },
    Step {
        name: "array_scan",
        run: scan_arrays,
        confidence: Confidence::Parsed,
    },
    Step {
        name: "markdown_cleanup",
        run: parse_without_markdown,
        confidence: Confidence::Parsed,
    },
    Step {
        name: "preamble_slice",
        run: slice_after_preamble,
        confidence: Confidence::Parsed,
    },
    Step {
        name: "flat_object_scan",
        run: scan_flat_objects,
        confidence: Confidence::Parsed,
    },
    Step {
        name: "leadership_lines",
        run: leadership_from_lines,
        confidence: Confidence::Heuristic,
    },
    Step {
        name: "company_metrics",
        run: metrics_from_prose,
        confidence: Confidence::Heuristic,
    },
    Step {
        name: "investor_rounds",
        run: investor_rounds_from_prose,
        confidence: Confidence::Heuristic,
    },
];

/// Extracts a JSON value from free-form LLM text.
///
/// Empty input yields `{"error": "No response data"}` as a placeholder. Fails
/// only when no strategy matches and no domain keyword suggests a placeholder
/// shape; the error quotes the first 100 characters of the input.
pub fn extract(text: &str) -> Result<Extraction, ExtractError> {
    if text.trim().is_empty() {
        tracing::warn!("Empty text provided to JSON extractor");
        return Ok(Extraction {
            value: json!({ "error": "No response data" }),
            strategy: "empty",
            confidence: Confidence::Placeholder,
        });
    }

    for step in CHAIN {
        if let Some(value) = (step.run)(text) {
            tracing::debug!(strategy = step.name, "Extracted JSON from LLM response");
            return Ok(Extraction {
                value,
                strategy: step.name,
                confidence: step.confidence,
            });
        }
    }

    if let Some(value) = placeholder_for(text) {
        tracing::warn!("All extraction methods failed, providing placeholder data");
        return Ok(Extraction {
            value,
            strategy: "placeholder",
            confidence: Confidence::Placeholder,
        });
    }

    Err(ExtractError::Unrecognized {
        preview: text.chars().take(PREVIEW_CHARS).collect(),
    })
}

/// Convenience wrapper returning only the extracted value.
pub fn extract_json(text: &str) -> Result<Value, ExtractError> {
    extract(text).map(|extraction| extraction.value)
}

// ============ Strategies ============

/// Whole-string parse.
pub fn parse_direct(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

/// Brace-delimited substrings, longest first.
///
/// Yields to [`scan_arrays`] when the winning object is an element of a
/// parseable array, so a fenced array of objects comes back whole.
pub fn scan_objects(text: &str) -> Option<Value> {
    for (start, end) in longest_first(balanced_spans(text, b'{', b'}')) {
        if let Ok(value) = serde_json::from_str::<Value>(&text[start..end]) {
            if enclosed_by_array(text, start, end) {
                return None;
            }
            return Some(value);
        }
    }
    None
}

/// Bracket-delimited substrings, longest first.
pub fn scan_arrays(text: &str) -> Option<Value> {
    longest_first(balanced_spans(text, b'[', b']'))
        .into_iter()
        .find_map(|(start, end)| serde_json::from_str(&text[start..end]).ok())
}

static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"```json|```").expect("fence regex"));
static LEADING_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*\*\*").expect("leading bold regex"));
static TRAILING_BOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)\*\*\s*$").expect("trailing bold regex"));

/// Whole-string parse after dropping code fences and bold markers.
pub fn parse_without_markdown(text: &str) -> Option<Value> {
    let cleaned = FENCE.replace_all(text, "");
    let cleaned = LEADING_BOLD.replace_all(&cleaned, "");
    let cleaned = TRAILING_BOLD.replace_all(&cleaned, "");
    serde_json::from_str(cleaned.trim()).ok()
}

static PREAMBLES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"^Based on .*?information[^{]*",
        r"^Here is [^{]*",
        r"^According to [^{]*",
        r"^The [^{]*",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).expect("preamble regex"))
    .collect()
});

/// Drops known preambles and parses from the first opening delimiter to the
/// last closing one.
pub fn slice_after_preamble(text: &str) -> Option<Value> {
    let mut cleaned = text.to_string();
    for preamble in PREAMBLES.iter() {
        cleaned = preamble.replace(&cleaned, "").into_owned();
    }
    let cleaned = FENCE.replace_all(&cleaned, "");
    let cleaned = cleaned.trim();

    let first = [cleaned.find('{'), cleaned.find('[')]
        .into_iter()
        .flatten()
        .min()?;
    let last = [cleaned.rfind('}'), cleaned.rfind(']')]
        .into_iter()
        .flatten()
        .max()?;
    if last < first {
        return None;
    }
    serde_json::from_str(&cleaned[first..=last]).ok()
}

static FLAT_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^{}]*\}").expect("flat object regex"));

/// `{...}` pairs without nested braces, longest first; ties keep their order
/// of appearance.
pub fn scan_flat_objects(text: &str) -> Option<Value> {
    let cleaned = FENCE.replace_all(text, "");
    let spans = FLAT_OBJECT
        .find_iter(&cleaned)
        .map(|m| (m.start(), m.end()))
        .collect();
    longest_first(spans)
        .into_iter()
        .find_map(|(start, end)| serde_json::from_str(&cleaned[start..end]).ok())
}

static NAME_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)name:\s*(.+)").expect("name line regex"));
static ROLE_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:role|title|position):\s*(.+)").expect("role line regex")
});
static BACKGROUND_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:background|experience):\s*(.+)").expect("background line regex")
});

/// Leadership records from `Name: / Role: / Background:` lines.
///
/// A background line closes the current record. A trailing record with a name
/// and a role is kept with background "Information unavailable".
pub fn leadership_from_lines(text: &str) -> Option<Value> {
    let lower = text.to_lowercase();
    if !(lower.contains("name")
        && (lower.contains("role") || lower.contains("title"))
        && lower.contains("background"))
    {
        return None;
    }

    let mut leaders = Vec::new();
    let mut current = Map::new();

    for line in text.lines() {
        if let Some(name) = line_value(&NAME_LINE, line) {
            if current.contains_key("name") {
                leaders.push(Value::Object(std::mem::take(&mut current)));
            }
            current.insert("name".to_string(), json!(name));
        }
        if !current.contains_key("name") {
            continue;
        }
        if let Some(role) = line_value(&ROLE_LINE, line) {
            current.insert("role".to_string(), json!(role));
        }
        if let Some(background) = line_value(&BACKGROUND_LINE, line) {
            current.insert("background".to_string(), json!(background));
            leaders.push(Value::Object(std::mem::take(&mut current)));
        }
    }

    if current.contains_key("name") && current.contains_key("role") {
        current
            .entry("background")
            .or_insert_with(|| json!("Information unavailable"));
        leaders.push(Value::Object(current));
    }

    if leaders.is_empty() {
        None
    } else {
        Some(Value::Array(leaders))
    }
}

static EMPLOYEE_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:size|employees|employee count|headcount|staff|workforce)[^0-9]*?([0-9][0-9,]*)",
    )
    .expect("employee count regex")
});
static FUNDING_STAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:stage|funding stage|round)[^A-Za-z]*?(?:is|at|in)?[^A-Za-z]*?(Seed|Series [A-Z]|Public|Private|Bootstrap|Angel|Growth|Late Stage|Early Stage|IPO)",
    )
    .expect("funding stage regex")
});
static FUNDING_AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:funding|raised|investment|capital)[^0-9]*?(?:USD|\$|US\$)?[^0-9]*?([0-9][0-9.,]*)[^0-9]*?(?:USD million|USD M|million|M)\b",
    )
    .expect("funding amount regex")
});

/// `{size, stage, funding}` scraped from prose; missing fields get defaults.
pub fn metrics_from_prose(text: &str) -> Option<Value> {
    let lower = text.to_lowercase();
    if !(lower.contains("size") || lower.contains("employee")) {
        return None;
    }

    let size = EMPLOYEE_COUNT
        .captures(text)
        .and_then(|caps| caps[1].replace(',', "").parse::<i64>().ok());
    let stage = FUNDING_STAGE
        .captures(text)
        .map(|caps| caps[1].trim().to_string());
    let funding = FUNDING_AMOUNT
        .captures(text)
        .and_then(|caps| caps[1].replace(',', "").parse::<f64>().ok());

    if size.is_none() && stage.is_none() && funding.is_none() {
        return None;
    }

    Some(json!({
        "size": size.unwrap_or(0),
        "stage": stage.unwrap_or_else(|| "Unknown".to_string()),
        "funding": funding.unwrap_or(0.0),
    }))
}

/// Round names recognised in prose; "Pre-Seed" comes first so its lines are
/// not claimed by "Seed".
const ROUND_NAMES: &[&str] = &[
    "Pre-Seed", "Seed", "Series A", "Series B", "Series C", "Series D", "Series E", "Angel",
];

static ROUND_LINES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ROUND_NAMES
        .iter()
        .map(|name| {
            Regex::new(&format!(r"(?i)({}[^:\n]*?):([^\n]+)", regex::escape(name)))
                .expect("round line regex")
        })
        .collect()
});
static INVESTOR_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*(?:,|\band\b)\s*").expect("investor separator regex"));

/// `[{round, investors}]` from `Round: investor, investor and investor` lines.
pub fn investor_rounds_from_prose(text: &str) -> Option<Value> {
    let lower = text.to_lowercase();
    if !(lower.contains("investor") || lower.contains("round") || lower.contains("funding")) {
        return None;
    }

    let mut claimed_lines = HashSet::new();
    let mut rounds = Vec::new();

    for pattern in ROUND_LINES.iter() {
        let Some(caps) = pattern
            .captures_iter(text)
            .find(|caps| !claimed_lines.contains(&caps[2].as_ptr()))
        else {
            continue;
        };

        let investors: Vec<String> = INVESTOR_SEPARATOR
            .split(caps[2].trim())
            .map(|investor| investor.trim().trim_end_matches('.').trim().to_string())
            .filter(|investor| !investor.is_empty())
            .collect();
        if investors.is_empty() {
            continue;
        }

        claimed_lines.insert(caps[2].as_ptr());
        rounds.push(json!({
            "round": caps[1].trim(),
            "investors": investors,
        }));
    }

    if rounds.is_empty() {
        None
    } else {
        Some(Value::Array(rounds))
    }
}

static EXECUTIVE_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:ceo|cto)\b").expect("executive title regex"));

/// Placeholder whose shape matches the domain the text talks about.
pub fn placeholder_for(text: &str) -> Option<Value> {
    let lower = text.to_lowercase();

    if lower.contains("senior") || lower.contains("leadership") || EXECUTIVE_TITLE.is_match(&lower)
    {
        return Some(json!([{
            "name": "Information extracted from unstructured data",
            "role": "Leadership position",
            "background": "Details unavailable - data extraction failed",
        }]));
    }

    if lower.contains("investor") || lower.contains("funding") {
        return Some(json!([{
            "round": "Unknown Round",
            "investors": ["Information unavailable - data extraction failed"],
        }]));
    }

    if lower.contains("employee") || lower.contains("size") || lower.contains("stage") {
        return Some(json!({
            "size": 0,
            "stage": "Information unavailable - data extraction failed",
            "funding": 0,
        }));
    }

    None
}

// ============ Helpers ============

/// Spans `[start, end)` of every balanced `open ... close` pair, ignoring
/// delimiters inside JSON strings. Unclosed openers are dropped.
fn balanced_spans(text: &str, open: u8, close: u8) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut stack = Vec::new();
    let mut in_string = false;
    let mut escaped = false;

    for (i, &byte) in text.as_bytes().iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if byte == b'\\' {
                escaped = true;
            } else if byte == b'"' {
                in_string = false;
            }
            continue;
        }
        if byte == b'"' {
            in_string = true;
        } else if byte == open {
            stack.push(i);
        } else if byte == close {
            if let Some(start) = stack.pop() {
                spans.push((start, i + 1));
            }
        }
    }

    spans
}

/// Stable sort, longest span first; equal lengths keep order of appearance.
fn longest_first(mut spans: Vec<(usize, usize)>) -> Vec<(usize, usize)> {
    spans.sort_by(|a, b| (b.1 - b.0).cmp(&(a.1 - a.0)));
    spans
}

fn enclosed_by_array(text: &str, start: usize, end: usize) -> bool {
    balanced_spans(text, b'[', b']')
        .into_iter()
        .filter(|&(array_start, array_end)| array_start < start && end <= array_end)
        .any(|(array_start, array_end)| {
            serde_json::from_str::<Value>(&text[array_start..array_end]).is_ok()
        })
}

fn line_value(pattern: &Regex, line: &str) -> Option<String> {
    let caps = pattern.captures(line)?;
    let value = caps[1].trim_matches(|c: char| c.is_whitespace() || c == '*');
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_parse_wins_for_valid_json() {
        let extraction = extract(r#"{"size": 120, "stage": "Series B", "funding": 45}"#).unwrap();
        assert_eq!(extraction.strategy, "direct");
        assert_eq!(extraction.confidence, Confidence::Parsed);
        assert_eq!(extraction.value["stage"], "Series B");
    }

    #[test]
    fn object_after_preamble() {
        let value =
            extract_json(r#"Here is the data: {"size": 10, "stage": "Seed", "funding": 5}"#)
                .unwrap();
        assert_eq!(value, json!({ "size": 10, "stage": "Seed", "funding": 5 }));
    }

    #[test]
    fn fenced_nested_object_comes_back_whole() {
        let text = "```json\n{\"company\": {\"size\": 300}, \"rounds\": [\"Seed\", \"Series A\"]}\n```";
        let extraction = extract(text).unwrap();
        assert_eq!(extraction.strategy, "object_scan");
        assert_eq!(
            extraction.value,
            json!({ "company": { "size": 300 }, "rounds": ["Seed", "Series A"] })
        );
    }

    #[test]
    fn fenced_array_of_objects_is_not_reduced_to_one_element() {
        let text = "Sure!\n```json\n[{\"name\": \"Ana\", \"role\": \"CEO\"}, {\"name\": \"Bo\", \"role\": \"CTO\"}]\n```";
        let extraction = extract(text).unwrap();
        assert_eq!(extraction.strategy, "array_scan");
        assert_eq!(extraction.value.as_array().map(Vec::len), Some(2));
    }

    #[test]
    fn object_scan_prefers_longest_candidate() {
        let text = r#"Short {"a": 1} then longer {"a": 1, "b": 2} done"#;
        assert_eq!(scan_objects(text), Some(json!({ "a": 1, "b": 2 })));
    }

    #[test]
    fn braces_inside_strings_do_not_split_objects() {
        let text = r#"Result: {"background": "built {core} systems", "name": "Kim"}"#;
        assert_eq!(
            scan_objects(text),
            Some(json!({ "background": "built {core} systems", "name": "Kim" }))
        );
    }

    #[test]
    fn markdown_cleanup_handles_bold_wrapped_json() {
        let text = "**\n{\"size\": 5}\n**";
        assert_eq!(parse_without_markdown(text), Some(json!({ "size": 5 })));
    }

    #[test]
    fn preamble_slice_spans_first_to_last_delimiter() {
        let text = "Based on the latest information available: [1, 2, 3]";
        assert_eq!(slice_after_preamble(text), Some(json!([1, 2, 3])));
        assert_eq!(slice_after_preamble("The answer is unknown"), None);
    }

    #[test]
    fn flat_object_scan_prefers_longest_parseable_pair() {
        let text = "{not json at all} and {\"ok\": true} and {\"a\": 1}";
        assert_eq!(scan_flat_objects(text), Some(json!({ "ok": true })));

        let text = "{\"a\": 1} then {\"b\": 2}";
        assert_eq!(scan_flat_objects(text), Some(json!({ "a": 1 })));
    }

    #[test]
    fn leadership_lines_become_records() {
        let text = "Name: Jane Doe\nRole: CEO\nBackground: Former VP at Stripe";
        let extraction = extract(text).unwrap();
        assert_eq!(extraction.strategy, "leadership_lines");
        assert_eq!(extraction.confidence, Confidence::Heuristic);
        assert_eq!(
            extraction.value,
            json!([{ "name": "Jane Doe", "role": "CEO", "background": "Former VP at Stripe" }])
        );
    }

    #[test]
    fn trailing_leader_without_background_gets_default() {
        let text = "Leadership (name, title, background):\n\
                    Name: Ana Lima\nTitle: CTO\nBackground: Ex-Google\n\
                    **Name:** Bo Chen\nRole: CFO";
        let value = leadership_from_lines(text).unwrap();
        assert_eq!(
            value,
            json!([
                { "name": "Ana Lima", "role": "CTO", "background": "Ex-Google" },
                { "name": "Bo Chen", "role": "CFO", "background": "Information unavailable" }
            ])
        );
    }

    #[test]
    fn metrics_scraped_from_prose() {
        let text = "The company has about 1,250 employees. Its funding stage is Series C \
                    and it has raised $85.5 million so far.";
        let value = metrics_from_prose(text).unwrap();
        assert_eq!(value["size"], 1250);
        assert_eq!(value["stage"], "Series C");
        assert_eq!(value["funding"].as_f64(), Some(85.5));
    }

    #[test]
    fn metrics_fill_missing_fields() {
        let value = metrics_from_prose("Employee headcount: 40").unwrap();
        assert_eq!(value["size"], 40);
        assert_eq!(value["stage"], "Unknown");
        assert_eq!(value["funding"].as_f64(), Some(0.0));
    }

    #[test]
    fn investor_rounds_scraped_from_lines() {
        let text = "Funding rounds:\nPre-Seed: Y Combinator\nSeed: Sand Hill Partners and Accel\nSeries A: Sequoia Capital, Benchmark.";
        let value = investor_rounds_from_prose(text).unwrap();
        assert_eq!(
            value,
            json!([
                { "round": "Pre-Seed", "investors": ["Y Combinator"] },
                { "round": "Seed", "investors": ["Sand Hill Partners", "Accel"] },
                { "round": "Series A", "investors": ["Sequoia Capital", "Benchmark"] }
            ])
        );
    }

    #[test]
    fn placeholder_shapes_follow_keywords() {
        let leaders = extract("Our senior team could not be determined.").unwrap();
        assert_eq!(leaders.confidence, Confidence::Placeholder);
        assert_eq!(leaders.value[0]["role"], "Leadership position");

        let investors = extract("No investor information was published.").unwrap();
        assert_eq!(investors.value[0]["round"], "Unknown Round");

        let metrics = extract("The growth stage is unclear.").unwrap();
        assert_eq!(metrics.value["size"], 0);
    }

    #[test]
    fn director_does_not_look_like_cto() {
        assert!(placeholder_for("The director declined to comment.").is_none());
    }

    #[test]
    fn unrecognised_prose_is_an_error_with_preview() {
        let text = "I'm sorry, I could not find anything useful about this company. ".repeat(3);
        let err = extract(&text).unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with(
            "Could not extract valid JSON or structured data from response: I'm sorry"
        ));
        let ExtractError::Unrecognized { preview } = err;
        assert_eq!(preview.chars().count(), PREVIEW_CHARS);
    }

    #[test]
    fn empty_text_yields_placeholder_object() {
        let extraction = extract("").unwrap();
        assert_eq!(extraction.confidence, Confidence::Placeholder);
        assert_eq!(extraction.value, json!({ "error": "No response data" }));
    }

    #[test]
    fn extraction_is_repeatable() {
        let text = "Name: Jane Doe\nRole: CEO\nBackground: Former VP";
        assert_eq!(extract(text), extract(text));
    }
}
