use limbscan::{
    AnalysisResult, ContentSegment, DEFAULT_GENERAL_INFO, FailureKind, Marker, RawInferenceOutput,
    RiskLevel, TransportFailure, normalize,
};

fn all_shapes(text: &str) -> Vec<RawInferenceOutput> {
    vec![
        RawInferenceOutput::Text(text.to_string()),
        RawInferenceOutput::JsonText(text.to_string()),
        RawInferenceOutput::Segments(vec![ContentSegment::text(text)]),
        RawInferenceOutput::Segments(vec![
            ContentSegment::Other,
            ContentSegment::text(text),
            ContentSegment::Other,
        ]),
    ]
}

#[test]
fn plain_text_in_any_shape_is_one_observation() {
    let inputs = [
        "Mild discoloration around the ankle.",
        "risk: high",
        "[\"not\", \"an\", \"object\"]",
        "```json\n{\"risk_level\": \"high\"}\n```",
    ];
    for input in inputs {
        for raw in all_shapes(input) {
            let result = normalize(raw).unwrap();
            assert_eq!(result.observations, vec![input.to_string()]);
            assert_eq!(result.risk_level, RiskLevel::Unclear);
            assert!(result.visual_markers.is_empty());
        }
    }
}

#[test]
fn structured_fields_round_trip() {
    let expected = AnalysisResult {
        observations: vec!["varicose veins on the calf".into(), "no open wounds".into()],
        general_info: "General visual observation.".into(),
        risk_level: RiskLevel::High,
        visual_markers: vec![
            Marker {
                label: "calf".into(),
                x: 0.42,
                y: 0.61,
            },
            Marker {
                label: "knee".into(),
                x: 0.5,
                y: 0.2,
            },
        ],
    };
    let text = serde_json::to_string(&expected).unwrap();
    for raw in all_shapes(&text) {
        assert_eq!(normalize(raw).unwrap(), expected);
    }
}

#[test]
fn blank_input_is_empty_result() {
    for input in ["", " ", "\n\n", "\t \r\n"] {
        for raw in all_shapes(input) {
            let result = normalize(raw).unwrap();
            assert!(result.observations.is_empty());
            assert_eq!(result.risk_level, RiskLevel::Unclear);
            assert_eq!(result.general_info, DEFAULT_GENERAL_INFO);
        }
    }
}

#[test]
fn marker_without_x_is_dropped_alone() {
    let text = r#"{"observations": ["bruise"], "visual_markers": [
        {"label": "first", "x": 0.1, "y": 0.1},
        {"label": "broken", "y": 0.5},
        {"label": "last", "x": 0.9, "y": 0.9}
    ]}"#;
    let result = normalize(RawInferenceOutput::JsonText(text.to_string())).unwrap();
    assert_eq!(result.observations, vec!["bruise".to_string()]);
    assert_eq!(
        result.visual_markers,
        vec![
            Marker {
                label: "first".into(),
                x: 0.1,
                y: 0.1,
            },
            Marker {
                label: "last".into(),
                x: 0.9,
                y: 0.9,
            },
        ]
    );
}

#[test]
fn mixed_segments_flatten_in_order() {
    let raw = RawInferenceOutput::Segments(vec![
        ContentSegment::text("A"),
        ContentSegment::Other,
        ContentSegment::text("B"),
    ]);
    assert_eq!(normalize(raw).unwrap().observations, vec!["A\nB".to_string()]);
}

#[test]
fn adversarial_strings_never_fail() {
    let inputs = [
        "{",
        "}",
        "{}",
        "{{}}",
        "{\"observations\": ",
        "{\"observations\": [1, 2, {\"x\": null}]}",
        "{\"visual_markers\": \"everywhere\"}",
        "{\"visual_markers\": [null, [], 1e400]}",
        "eval(\"__import__('os').system('ls')\")",
        "{\"__proto__\": {\"polluted\": true}}",
        "\u{0}\u{feff}{",
        "{\"risk_level\": \"high\"} {\"risk_level\": \"low\"}",
    ];
    for input in inputs {
        for raw in all_shapes(input) {
            let result = normalize(raw);
            assert!(result.is_ok(), "input {:?} produced an error", input);
        }
    }
}

#[test]
fn transport_failures_are_sanitized_errors() {
    let failures = [
        TransportFailure::Network,
        TransportFailure::Timeout,
        TransportFailure::Unauthorized,
        TransportFailure::RateLimited,
        TransportFailure::Rejected { status: 413 },
        TransportFailure::Upstream { status: 500 },
        TransportFailure::MalformedBody,
    ];
    for failure in failures {
        let err = normalize(RawInferenceOutput::Failed(failure.clone())).unwrap_err();
        assert_eq!(err.kind, failure.kind());
        assert!(!err.message.is_empty());
        assert!(!err.message.to_lowercase().contains("bearer"));
        assert_ne!(err.kind, FailureKind::Internal);
    }
}
