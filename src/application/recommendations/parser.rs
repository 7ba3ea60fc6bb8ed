//! Turns generated text into a list of recommendation strings.
//!
//! JSON output is accepted first (a bare array, or an object holding one),
//! then plain numbered or bulleted lists.

use serde_json::Value;

const LIST_KEYS: [&str; 5] = [
    "recommendations",
    "optimization_tips",
    "insights",
    "patterns",
    "tips",
];
const TEXT_KEYS: [&str; 5] = ["recommendation", "tip", "description", "insight", "text"];
const MIN_ITEM_CHARS: usize = 4;

pub fn parse_recommendations(text: &str) -> Vec<String> {
    let body = strip_code_fence(text.trim());
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        let items = from_json(&value);
        if !items.is_empty() {
            return items;
        }
    }
    from_lines(body)
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Skip the language tag on the opening fence.
    let rest = rest.split_once('\n').map_or("", |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn from_json(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(json_item).collect(),
        Value::Object(map) => LIST_KEYS
            .iter()
            .find_map(|k| map.get(*k))
            .map(from_json)
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn json_item(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => clean(s),
        Value::Object(map) => {
            let title = map.get("title").and_then(Value::as_str).map(clean);
            let detail = TEXT_KEYS
                .iter()
                .find_map(|k| map.get(*k).and_then(Value::as_str))
                .map(clean);
            match (title, detail) {
                (Some(t), Some(d)) => format!("{}: {}", t.trim_end_matches(':'), d),
                (Some(t), None) => t,
                (None, Some(d)) => d,
                (None, None) => return None,
            }
        }
        _ => return None,
    };
    (text.chars().count() >= MIN_ITEM_CHARS).then_some(text)
}

fn from_lines(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(clean)
        .filter(|line| !line.ends_with(':'))
        .filter(|line| line.chars().count() >= MIN_ITEM_CHARS)
        .collect()
}

/// Drop list markers and markdown emphasis.
fn clean(line: &str) -> String {
    let mut s = line.trim();
    for bullet in ["- ", "* ", "• ", "+ "] {
        if let Some(rest) = s.strip_prefix(bullet) {
            s = rest;
            break;
        }
    }
    s = strip_numbering(s);
    s.replace("**", "").replace("__", "").trim().to_string()
}

fn strip_numbering(s: &str) -> &str {
    let digits = s.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 || digits > 3 {
        return s;
    }
    let rest = &s[digits..];
    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbered_list() {
        let text = "Here are my suggestions:\n\n1. Lower the thermostat by 2°C at night.\n2) Switch to LED bulbs.\n\n3. **Unplug** idle electronics.";
        assert_eq!(
            parse_recommendations(text),
            vec![
                "Lower the thermostat by 2°C at night.",
                "Switch to LED bulbs.",
                "Unplug idle electronics.",
            ]
        );
    }

    #[test]
    fn bullets_and_headings() {
        let text = "## Tips\n- Run the dishwasher off-peak\n* Clean HVAC filters monthly\n• Ok\n• Use a smart plug";
        assert_eq!(
            parse_recommendations(text),
            vec![
                "Run the dishwasher off-peak",
                "Clean HVAC filters monthly",
                "Use a smart plug",
            ]
        );
    }

    #[test]
    fn decimal_numbers_are_not_list_markers() {
        assert_eq!(
            parse_recommendations("2.5 kWh per day is above average"),
            vec!["2.5 kWh per day is above average"]
        );
    }

    #[test]
    fn json_array_of_strings() {
        let text = r#"["Insulate the attic", "Service the boiler"]"#;
        assert_eq!(
            parse_recommendations(text),
            vec!["Insulate the attic", "Service the boiler"]
        );
    }

    #[test]
    fn fenced_json_object_with_titles() {
        let text = "```json\n{\"recommendations\": [{\"title\": \"Thermostat\", \"description\": \"Set it to 20°C\"}, {\"tip\": \"Seal window gaps\"}]}\n```";
        assert_eq!(
            parse_recommendations(text),
            vec!["Thermostat: Set it to 20°C", "Seal window gaps"]
        );
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(parse_recommendations("").is_empty());
        assert!(parse_recommendations("Recommendations:\n\n").is_empty());
        assert!(parse_recommendations("{}").is_empty());
    }
}
