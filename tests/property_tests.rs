/// Property-based tests using proptest
/// Tests invariants of the LLM JSON extractor and funnel math that should hold for all inputs
use gauge_api::analytics::{compute_funnel, OutreachChannel, OutreachRecord, OutreachStatus};
use gauge_api::llm_json::{extract, Confidence};
use proptest::prelude::*;
use serde_json::Value;

/// JSON without floats; strings stay alphanumeric so no delimiter hides inside.
fn arb_json() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-zA-Z0-9 ]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::hash_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|map| Value::Object(map.into_iter().collect())),
        ]
    })
}

fn arb_object() -> impl Strategy<Value = Value> {
    prop::collection::hash_map("[a-z]{1,6}", arb_json(), 0..5)
        .prop_map(|map| Value::Object(map.into_iter().collect()))
}

// Property: valid JSON comes back unchanged
proptest! {
    #[test]
    fn valid_json_is_parsed_directly(value in arb_json()) {
        let text = serde_json::to_string(&value).unwrap();
        let extraction = extract(&text).unwrap();
        prop_assert_eq!(extraction.strategy, "direct");
        prop_assert_eq!(extraction.confidence, Confidence::Parsed);
        prop_assert_eq!(extraction.value, value);
    }

    #[test]
    fn fenced_object_after_preamble_is_recovered(value in arb_object()) {
        let text = format!(
            "Here is the company data you asked for:\n```json\n{}\n```\nLet me know if you need more.",
            serde_json::to_string_pretty(&value).unwrap()
        );
        let extraction = extract(&text).unwrap();
        prop_assert_eq!(extraction.confidence, Confidence::Parsed);
        prop_assert_eq!(extraction.value, value);
    }
}

// Property: extraction never panics and is deterministic
proptest! {
    #[test]
    fn extraction_never_panics(text in "\\PC*") {
        let _ = extract(&text);
    }

    #[test]
    fn extraction_is_idempotent(text in "\\PC{0,200}") {
        prop_assert_eq!(extract(&text), extract(&text));
    }

    #[test]
    fn whitespace_only_input_is_a_placeholder(text in "[ \\t\\n]{0,10}") {
        let extraction = extract(&text).unwrap();
        prop_assert_eq!(extraction.confidence, Confidence::Placeholder);
        prop_assert_eq!(extraction.value["error"].as_str(), Some("No response data"));
    }
}

fn arb_record() -> impl Strategy<Value = OutreachRecord> {
    let channel = prop_oneof![
        Just(OutreachChannel::Email),
        Just(OutreachChannel::Linkedin),
        Just(OutreachChannel::Other),
    ];
    let status = prop_oneof![
        Just(OutreachStatus::Sent),
        Just(OutreachStatus::Responded),
        Just(OutreachStatus::Interviewed),
        Just(OutreachStatus::Offered),
        Just(OutreachStatus::Hired),
        Just(OutreachStatus::Declined),
    ];
    ("[0-9]{1,4}", channel, status).prop_map(|(candidate_id, outreach_type, status)| {
        OutreachRecord {
            candidate_id,
            company: "Acme".to_string(),
            outreach_type,
            status,
        }
    })
}

// Property: funnel rates are bounded and counts add up
proptest! {
    #[test]
    fn funnel_counts_and_rates_are_consistent(records in prop::collection::vec(arb_record(), 0..60)) {
        let report = compute_funnel(&records);

        prop_assert_eq!(report.total_outreach, records.len());
        prop_assert!(
            report.responded + report.interviewed + report.offered + report.hired
                <= report.total_outreach
        );
        prop_assert!(report.email.sent + report.linkedin.sent <= report.total_outreach);
        prop_assert!(report.response_rate <= 100);
        prop_assert!(report.conversion_rate <= 100);
        prop_assert!(report.email.response_rate <= 100);
        prop_assert!(report.linkedin.response_rate <= 100);
        prop_assert_eq!(report.funnel.len(), 5);
    }
}
