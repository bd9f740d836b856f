// SPDX-License-Identifier: MIT
//! Tolerant JSON repair for text a model produced that almost, but does not
//! quite, parse: invalid escapes, a missing comma, or a truncated object.
//! Used both for tool-call argument strings and for the Planner's plan
//! envelope.

/// Try a plain parse, then a sequence of repair strategies, in order of how
/// much of the text they're willing to rewrite.
pub fn attempt_json_repair(json_str: &str) -> Option<serde_json::Value> {
    if let Ok(v) = serde_json::from_str(json_str) {
        return Some(v);
    }

    let fixed = fix_invalid_json_escapes(json_str);
    if let Ok(v) = serde_json::from_str(&fixed) {
        return Some(v);
    }

    let repaired = regex::Regex::new(r#""([^"]+)"([a-zA-Z_][a-zA-Z0-9_]*)":\s*"#)
        .unwrap()
        .replace_all(&fixed, r#""$1", "$2": "#);
    if let Ok(v) = serde_json::from_str(&repaired) {
        return Some(v);
    }

    if !fixed.trim().ends_with('}') {
        let mut completed = fixed.clone();
        let quote_count = fixed.chars().filter(|&c| c == '"').count();
        if quote_count % 2 == 1 {
            completed.push('"');
        }
        if !completed.trim().ends_with('}') {
            completed.push('}');
        }
        if let Ok(v) = serde_json::from_str(&completed) {
            return Some(v);
        }
    }

    None
}

/// Replace any escape sequence inside a string value that isn't valid JSON
/// (`\"`, `\\`, `\/`, `\b`, `\f`, `\n`, `\r`, `\t`, `\u`) with a doubled
/// backslash so the surrounding text still round-trips through serde_json.
fn fix_invalid_json_escapes(json_str: &str) -> String {
    let mut result = String::with_capacity(json_str.len() + 16);
    let mut chars = json_str.chars();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            match c {
                '\\' => match chars.next() {
                    Some(next) if matches!(next, '"' | '\\' | '/' | 'b' | 'f' | 'n' | 'r' | 't' | 'u') => {
                        result.push('\\');
                        result.push(next);
                    }
                    Some(next) => {
                        result.push('\\');
                        result.push('\\');
                        result.push(next);
                    }
                    None => result.push('\\'),
                },
                '"' => {
                    in_string = false;
                    result.push('"');
                }
                _ => result.push(c),
            }
        } else {
            if c == '"' {
                in_string = true;
            }
            result.push(c);
        }
    }
    result
}

/// One entry of the Planner's `steps` array, before it's turned into a
/// [`orc_types::Step`] with generated status/result/error fields.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PlanStepEnvelope {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub sub_flow_step: Option<usize>,
    #[serde(default)]
    pub sub_flow_type: Option<String>,
}

/// The Planner's expected reply shape: `{message, goal, title, steps}`.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct PlanEnvelope {
    #[serde(default)]
    pub message: String,
    pub goal: String,
    pub title: String,
    pub steps: Vec<PlanStepEnvelope>,
}

/// Parses a plan envelope out of free-form assistant text via tolerant JSON
/// repair. Returns `None` when no repair strategy recovers a `{goal, title,
/// steps: [...]}` object — the caller treats that as "not a plan" and
/// re-invokes the loop with the raw text as input.
pub fn parse_plan_envelope(text: &str) -> Option<PlanEnvelope> {
    let value = attempt_json_repair(text.trim())?;
    serde_json::from_value(value).ok()
}

// ─── Unit tests ──────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_json_directly() {
        let v = attempt_json_repair(r#"{"a": 1}"#).unwrap();
        assert_eq!(v["a"], 1);
    }

    #[test]
    fn repairs_invalid_escape_sequence() {
        let v = attempt_json_repair(r#"{"path": "C:\Users\foo"}"#).unwrap();
        assert_eq!(v["path"], "C:\\\\Users\\\\foo");
    }

    #[test]
    fn repairs_missing_comma() {
        let v = attempt_json_repair(r#"{"a": "1"b": "2"}"#).unwrap();
        assert_eq!(v["a"], "1");
        assert_eq!(v["b"], "2");
    }

    #[test]
    fn repairs_truncated_object() {
        let v = attempt_json_repair(r#"{"a": "1""#).unwrap();
        assert_eq!(v["a"], "1");
    }

    #[test]
    fn gives_up_on_unrecoverable_garbage() {
        assert!(attempt_json_repair("not json at all {{{").is_none());
    }

    #[test]
    fn parse_plan_envelope_extracts_steps() {
        let text = r#"{"message": "ok", "goal": "ship it", "title": "Release",
            "steps": [{"id": "s1", "description": "build"}]}"#;
        let plan = parse_plan_envelope(text).unwrap();
        assert_eq!(plan.steps.len(), 1);
        assert_eq!(plan.steps[0].id, "s1");
    }

    #[test]
    fn parse_plan_envelope_rejects_non_plan_text() {
        assert!(parse_plan_envelope("just chatting, no plan here").is_none());
    }

    #[test]
    fn parse_plan_envelope_accepts_empty_steps() {
        let text = r#"{"goal": "g", "title": "t", "steps": []}"#;
        let plan = parse_plan_envelope(text).unwrap();
        assert!(plan.steps.is_empty());
    }
}
