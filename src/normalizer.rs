//! Maps whatever the inference API answered into an [`AnalysisResult`].
//!
//! Model output is untrusted. It is only ever parsed as JSON data by
//! `serde_json`; anything that does not parse is kept verbatim as a single
//! free-text observation.

use serde_json::{Map, Value};
use tracing::debug;

use crate::models::{
    AnalysisError, AnalysisResult, ContentSegment, Marker, RawInferenceOutput, RiskLevel,
};

/// Normalizes one raw inference output.
///
/// Returns `Err` only when the call itself failed. Empty, unparsable or
/// partially malformed bodies are recovered into an `AnalysisResult`.
pub fn normalize(raw: RawInferenceOutput) -> Result<AnalysisResult, AnalysisError> {
    let text = match raw {
        RawInferenceOutput::Failed(failure) => {
            debug!(kind = ?failure.kind(), "Inference call failed");
            return Err(AnalysisError::from(&failure));
        }
        RawInferenceOutput::Text(text) | RawInferenceOutput::JsonText(text) => text,
        RawInferenceOutput::Segments(segments) => flatten_segments(&segments),
    };
    Ok(normalize_text(text))
}

/// Joins the text of every text segment with a newline, in order.
pub fn flatten_segments(segments: &[ContentSegment]) -> String {
    segments
        .iter()
        .filter_map(|segment| match segment {
            ContentSegment::Text { text } => Some(text.as_str()),
            ContentSegment::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn normalize_text(text: String) -> AnalysisResult {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        debug!("Inference output is blank");
        return AnalysisResult::empty();
    }
    if trimmed.starts_with('{') {
        match serde_json::from_str::<Map<String, Value>>(trimmed) {
            Ok(object) => return from_object(object),
            Err(err) => debug!(error = %err, "Structured output did not parse, keeping as text"),
        }
    }
    AnalysisResult::free_text(text)
}

fn from_object(mut object: Map<String, Value>) -> AnalysisResult {
    let mut result = AnalysisResult::empty();

    if let Some(observations) = object.remove("observations") {
        result.observations = observations_from(observations);
    }
    if let Some(Value::String(info)) = object.remove("general_info") {
        result.general_info = info;
    }
    if let Some(Value::String(level)) = object.remove("risk_level") {
        result.risk_level = level.parse().unwrap_or(RiskLevel::Unclear);
    }
    if let Some(Value::Array(markers)) = object.remove("visual_markers") {
        let total = markers.len();
        result.visual_markers = markers.iter().filter_map(marker_from).collect();
        if result.visual_markers.len() < total {
            debug!(
                dropped = total - result.visual_markers.len(),
                "Dropped malformed visual markers"
            );
        }
    }
    result
}

fn observations_from(value: Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect(),
        Value::String(s) if !s.trim().is_empty() => vec![s],
        _ => Vec::new(),
    }
}

fn marker_from(value: &Value) -> Option<Marker> {
    let label = value.get("label")?.as_str()?;
    let x = value.get("x")?.as_f64()?;
    let y = value.get("y")?.as_f64()?;
    Some(Marker {
        label: label.to_string(),
        x,
        y,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DEFAULT_GENERAL_INFO, TransportFailure};

    fn text(s: &str) -> RawInferenceOutput {
        RawInferenceOutput::Text(s.to_string())
    }

    #[test]
    fn plain_text_becomes_single_observation() {
        let input = "The skin on the lower leg looks slightly red.";
        let result = normalize(text(input)).unwrap();
        assert_eq!(result.observations, vec![input.to_string()]);
        assert_eq!(result.risk_level, RiskLevel::Unclear);
        assert!(result.visual_markers.is_empty());
        assert_eq!(result.general_info, DEFAULT_GENERAL_INFO);
    }

    #[test]
    fn plain_text_keeps_surrounding_whitespace() {
        let input = "  swelling near the knee\n";
        let result = normalize(text(input)).unwrap();
        assert_eq!(result.observations, vec![input.to_string()]);
    }

    #[test]
    fn blank_input_is_an_empty_result_not_an_error() {
        for input in ["", "   ", "\n\t "] {
            let result = normalize(text(input)).unwrap();
            assert!(result.observations.is_empty());
            assert_eq!(result.risk_level, RiskLevel::Unclear);
            assert!(result.visual_markers.is_empty());
            assert_eq!(result.general_info, DEFAULT_GENERAL_INFO);
        }
    }

    #[test]
    fn json_object_maps_recognized_keys() {
        let input = r#"{
            "observations": ["bruise on the shin", "no visible swelling"],
            "general_info": "Visual check only.",
            "risk_level": "medium",
            "visual_markers": [{"label": "bruise", "x": 0.25, "y": 0.5}],
            "confidence": 0.8
        }"#;
        let result = normalize(RawInferenceOutput::JsonText(input.to_string())).unwrap();
        assert_eq!(
            result,
            AnalysisResult {
                observations: vec!["bruise on the shin".into(), "no visible swelling".into()],
                general_info: "Visual check only.".into(),
                risk_level: RiskLevel::Medium,
                visual_markers: vec![Marker {
                    label: "bruise".into(),
                    x: 0.25,
                    y: 0.5,
                }],
            }
        );
    }

    #[test]
    fn missing_keys_take_defaults() {
        let result = normalize(text("{}")).unwrap();
        assert_eq!(result, AnalysisResult::empty());

        let result = normalize(text(r#"{"risk_level": "high"}"#)).unwrap();
        assert_eq!(result.risk_level, RiskLevel::High);
        assert!(result.observations.is_empty());
        assert_eq!(result.general_info, DEFAULT_GENERAL_INFO);
    }

    #[test]
    fn malformed_marker_is_dropped_alone() {
        let input = r#"{"visual_markers": [
            {"label": "a", "x": 0.1, "y": 0.2},
            {"label": "no x", "y": 0.3},
            {"label": "b", "x": "0.5", "y": 0.5},
            {"x": 0.4, "y": 0.4},
            "not a marker",
            {"label": "c", "x": 1, "y": 0}
        ]}"#;
        let result = normalize(text(input)).unwrap();
        let labels: Vec<_> = result.visual_markers.iter().map(|m| m.label.as_str()).collect();
        assert_eq!(labels, vec!["a", "c"]);
        assert_eq!(result.visual_markers[1].x, 1.0);
    }

    #[test]
    fn out_of_range_coordinates_pass_through() {
        let result =
            normalize(text(r#"{"visual_markers": [{"label": "edge", "x": 1.4, "y": -0.2}]}"#))
                .unwrap();
        assert_eq!(result.visual_markers[0].x, 1.4);
        assert_eq!(result.visual_markers[0].y, -0.2);
    }

    #[test]
    fn unrecognized_risk_level_is_unclear() {
        for level in [r#""severe""#, "3", "null", r#"["high"]"#] {
            let input = format!(r#"{{"risk_level": {}}}"#, level);
            assert_eq!(normalize(text(&input)).unwrap().risk_level, RiskLevel::Unclear);
        }
        let result = normalize(text(r#"{"risk_level": " LOW "}"#)).unwrap();
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn observations_as_string_or_mixed_list() {
        let result = normalize(text(r#"{"observations": "one long note"}"#)).unwrap();
        assert_eq!(result.observations, vec!["one long note".to_string()]);

        let result = normalize(text(r#"{"observations": ["a", null, 3, "b"]}"#)).unwrap();
        assert_eq!(result.observations, vec!["a".to_string(), "b".to_string()]);

        let result = normalize(text(r#"{"observations": "  "}"#)).unwrap();
        assert!(result.observations.is_empty());
    }

    #[test]
    fn non_string_general_info_takes_default() {
        let result = normalize(text(r#"{"general_info": 42}"#)).unwrap();
        assert_eq!(result.general_info, DEFAULT_GENERAL_INFO);
    }

    #[test]
    fn unparsable_json_falls_back_to_free_text() {
        for input in ["{", "{ observations: ['x'] }", "{\"a\": 1} trailing", "{'risk_level': 'low'}"] {
            let result = normalize(text(input)).unwrap();
            assert_eq!(result.observations, vec![input.to_string()]);
            assert_eq!(result.risk_level, RiskLevel::Unclear);
        }
    }

    #[test]
    fn script_like_payloads_are_kept_as_data() {
        let payloads = [
            "__import__('os').system('rm -rf /')",
            "{__import__('os').system('id')}",
            "<script>alert(1)</script>",
            r#"{"observations": ["<script>alert(1)</script>"], "risk_level": "low"}"#,
        ];
        for input in &payloads[..3] {
            let result = normalize(text(input)).unwrap();
            assert_eq!(result.observations, vec![input.to_string()]);
        }
        let result = normalize(text(payloads[3])).unwrap();
        assert_eq!(result.observations, vec!["<script>alert(1)</script>".to_string()]);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn segments_are_flattened_with_newlines() {
        let segments = vec![
            ContentSegment::text("A"),
            ContentSegment::Other,
            ContentSegment::text("B"),
        ];
        assert_eq!(flatten_segments(&segments), "A\nB");
        let result = normalize(RawInferenceOutput::Segments(segments)).unwrap();
        assert_eq!(result.observations, vec!["A\nB".to_string()]);
    }

    #[test]
    fn segments_carrying_json_are_parsed() {
        let segments = vec![
            ContentSegment::Other,
            ContentSegment::text(r#"{"observations": ["dry skin"], "risk_level": "low"}"#),
        ];
        let result = normalize(RawInferenceOutput::Segments(segments)).unwrap();
        assert_eq!(result.observations, vec!["dry skin".to_string()]);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[test]
    fn segments_without_text_are_empty() {
        let result = normalize(RawInferenceOutput::Segments(vec![ContentSegment::Other])).unwrap();
        assert_eq!(result, AnalysisResult::empty());
        let result = normalize(RawInferenceOutput::Segments(Vec::new())).unwrap();
        assert_eq!(result, AnalysisResult::empty());
    }

    #[test]
    fn transport_failure_becomes_sanitized_error() {
        let err = normalize(RawInferenceOutput::Failed(TransportFailure::Unauthorized)).unwrap_err();
        assert_eq!(err.message, TransportFailure::Unauthorized.to_string());
        assert_eq!(err.kind, crate::models::FailureKind::Unauthorized);
    }
}
