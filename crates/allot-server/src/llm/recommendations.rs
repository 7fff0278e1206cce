// crates/allot-server/src/llm/recommendations.rs
// Response parsing and shape validation for model output

use serde_json::{Map, Value};

/// Shape-level failure message shared by all adapters
pub const INVALID_FORMAT: &str = "Invalid allocation recommendations format";

/// One recommended allocation, kept as raw JSON.
///
/// Type and range checks happen in the engine against live state.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    raw: Value,
}

impl Recommendation {
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    pub fn student_id(&self) -> Option<i64> {
        self.id_field("student_id")
    }

    pub fn supervisor_id(&self) -> Option<i64> {
        self.id_field("supervisor_id")
    }

    pub fn project_id(&self) -> Option<i64> {
        self.id_field("project_id")
    }

    /// Field as shown in error messages, whatever its JSON type
    pub fn display_field(&self, field: &str) -> String {
        match self.raw.get(field) {
            Some(Value::String(s)) => s.clone(),
            Some(v) => v.to_string(),
            None => "null".to_string(),
        }
    }

    /// `Ok(None)` when absent or null, `Err` when present but not a number in 0..=100
    pub fn match_score(&self) -> Result<Option<f64>, String> {
        match self.raw.get("match_score") {
            None | Some(Value::Null) => Ok(None),
            Some(v) => match v.as_f64() {
                Some(score) if (0.0..=100.0).contains(&score) => Ok(Some(score)),
                _ => Err(format!("Invalid match_score {} (expected a number from 0 to 100)", v)),
            },
        }
    }

    pub fn reasoning(&self) -> Option<String> {
        self.raw
            .get("reasoning")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Integer ids, also accepting integral numeric strings like "12"
    fn id_field(&self, field: &str) -> Option<i64> {
        match self.raw.get(field)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Provider output in a uniform shape
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationSet {
    pub allocations: Vec<Recommendation>,
    pub summary: Option<Value>,
    pub recommendations: Vec<String>,
    pub errors: Vec<String>,
}

impl RecommendationSet {
    /// Normalised failure: no allocations, one error
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            errors: vec![message.into()],
            ..Default::default()
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// JSON view used for connection-test samples
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert(
            "allocations".into(),
            Value::Array(self.allocations.iter().map(|r| r.raw.clone()).collect()),
        );
        if let Some(summary) = &self.summary {
            map.insert("summary".into(), summary.clone());
        }
        map.insert(
            "recommendations".into(),
            Value::Array(self.recommendations.iter().cloned().map(Value::String).collect()),
        );
        map.insert(
            "errors".into(),
            Value::Array(self.errors.iter().cloned().map(Value::String).collect()),
        );
        Value::Object(map)
    }
}

/// Decode model text as JSON; any failure yields an empty object.
///
/// A response wrapped in a Markdown code fence is unwrapped first.
pub fn parse(raw: &str) -> Value {
    let text = strip_code_fence(raw);
    match serde_json::from_str::<Value>(text) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, response_len = raw.len(), "Failed to parse LLM response");
            Value::Object(Map::new())
        }
    }
}

/// `allocations` is an array and every element has the three id keys.
///
/// Presence only: values are checked later.
pub fn validate(value: &Value) -> bool {
    let Some(allocations) = value.get("allocations").and_then(Value::as_array) else {
        return false;
    };
    allocations.iter().all(|item| {
        ["student_id", "supervisor_id", "project_id"]
            .iter()
            .all(|key| item.get(key).is_some_and(|v| !v.is_null()))
    })
}

/// Parse, validate and convert into a typed set.
pub fn into_recommendation_set(raw: &str) -> Result<RecommendationSet, String> {
    let value = parse(raw);
    if !validate(&value) {
        return Err(INVALID_FORMAT.to_string());
    }

    let allocations = value
        .get("allocations")
        .and_then(Value::as_array)
        .map(|items| items.iter().cloned().map(Recommendation::new).collect())
        .unwrap_or_default();

    let summary = value.get("summary").filter(|v| !v.is_null()).cloned();

    let recommendations = value
        .get("recommendations")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(RecommendationSet {
        allocations,
        summary,
        recommendations,
        errors: Vec::new(),
    })
}

fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let Some(body) = rest.strip_suffix("```") else {
        return trimmed;
    };
    // drop an optional language tag on the opening line
    match body.find('\n') {
        Some(idx) if !body[..idx].trim_start().starts_with('{') => body[idx + 1..].trim(),
        _ => body.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ============================================================================
    // parse
    // ============================================================================

    #[test]
    fn test_parse_invalid_json_returns_empty_object() {
        assert_eq!(parse("not json at all"), json!({}));
        assert_eq!(parse(""), json!({}));
    }

    #[test]
    fn test_parse_unwraps_code_fence() {
        let raw = "```json\n{\"allocations\": []}\n```";
        assert_eq!(parse(raw), json!({"allocations": []}));
        let bare = "```\n{\"allocations\": []}\n```";
        assert_eq!(parse(bare), json!({"allocations": []}));
    }

    // ============================================================================
    // validate
    // ============================================================================

    #[test]
    fn test_validate_requires_allocations_array() {
        assert!(!validate(&json!({})));
        assert!(!validate(&json!({"allocations": {}})));
        assert!(validate(&json!({"allocations": []})));
    }

    #[test]
    fn test_validate_requires_all_ids() {
        let ok = json!({"allocations": [{"student_id": 1, "supervisor_id": 2, "project_id": 3}]});
        assert!(validate(&ok));
        let missing = json!({"allocations": [{"student_id": 1, "project_id": 3}]});
        assert!(!validate(&missing));
        let null = json!({"allocations": [{"student_id": 1, "supervisor_id": null, "project_id": 3}]});
        assert!(!validate(&null));
    }

    #[test]
    fn test_validate_is_presence_only() {
        let strings = json!({"allocations": [{"student_id": "a", "supervisor_id": "b", "project_id": "c"}]});
        assert!(validate(&strings));
    }

    // ============================================================================
    // into_recommendation_set
    // ============================================================================

    #[test]
    fn test_into_set_malformed_json() {
        assert_eq!(into_recommendation_set("{oops").unwrap_err(), INVALID_FORMAT);
    }

    #[test]
    fn test_into_set_full_response() {
        let raw = json!({
            "allocations": [
                {"student_id": 1, "supervisor_id": "2", "project_id": 3.0, "match_score": 85.5, "reasoning": "AI match"}
            ],
            "summary": {"total_allocations": 1},
            "recommendations": ["hire more", {"note": "x"}]
        })
        .to_string();
        let set = into_recommendation_set(&raw).unwrap();
        assert!(set.is_ok());
        let rec = &set.allocations[0];
        assert_eq!(rec.student_id(), Some(1));
        assert_eq!(rec.supervisor_id(), Some(2));
        assert_eq!(rec.project_id(), Some(3));
        assert_eq!(rec.match_score(), Ok(Some(85.5)));
        assert_eq!(rec.reasoning().as_deref(), Some("AI match"));
        assert_eq!(set.summary, Some(json!({"total_allocations": 1})));
        assert_eq!(set.recommendations, vec!["hire more".to_string(), "{\"note\":\"x\"}".to_string()]);
    }

    #[test]
    fn test_recommendation_id_and_score_edge_cases() {
        let rec = Recommendation::new(json!({
            "student_id": 1.5, "supervisor_id": "abc", "project_id": true, "match_score": 140
        }));
        assert_eq!(rec.student_id(), None);
        assert_eq!(rec.supervisor_id(), None);
        assert_eq!(rec.project_id(), None);
        assert!(rec.match_score().is_err());
        assert_eq!(rec.display_field("supervisor_id"), "abc");

        let text_score = Recommendation::new(json!({"match_score": "90"}));
        assert!(text_score.match_score().is_err());
        let no_score = Recommendation::new(json!({"reasoning": "  "}));
        assert_eq!(no_score.match_score(), Ok(None));
        assert_eq!(no_score.reasoning(), None);
    }

    #[test]
    fn test_failed_set_to_json() {
        let set = RecommendationSet::failed("boom");
        let json = set.to_json();
        assert_eq!(json["allocations"], json!([]));
        assert_eq!(json["errors"], json!(["boom"]));
        assert!(json.get("summary").is_none());
    }
}
