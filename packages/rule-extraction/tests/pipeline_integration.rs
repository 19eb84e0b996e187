//! Integration tests for the rule extraction pipeline.
//!
//! These tests drive the full orchestrator against the scripted mock
//! provider:
//! 1. Extract with a well-behaved model
//! 2. Survive malformed/encoded model output via repair + normalization
//! 3. Fall back to bare-text extraction, then heuristic backfill
//! 4. Fail fast on invalid batch elements

use rule_extraction::pipeline::prompts;
use rule_extraction::testing::MockProvider;
use rule_extraction::{Condition, Logic, RuleError, RulePipeline};
use tokio_util::sync::CancellationToken;

const DECKHAND_TEXT: &str =
    "If a deckhand works over 12 hours, call someone from the casual pool first.";

const VALID_RULE_JSON: &str = r#"{
    "action": "contact",
    "target": "casual_pool",
    "conditions": [
        {"field": "hours_worked", "operator": "greater_than", "value": "12"}
    ],
    "timeRange": null,
    "priority": 2,
    "logic": "AND"
}"#;

fn pipeline_with(provider: MockProvider) -> RulePipeline<MockProvider> {
    RulePipeline::new(provider)
}

#[tokio::test]
async fn test_extract_rule_happy_path() {
    let provider = MockProvider::new().with_response(prompts::INTENT_EXTRACTOR, VALID_RULE_JSON);
    let pipeline = pipeline_with(provider);

    let rule = pipeline
        .extract_rule(DECKHAND_TEXT, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(rule.action, "contact");
    assert_eq!(rule.target, "casual_pool");
    assert_eq!(rule.priority, 2);
    assert_eq!(rule.logic, Logic::And);
    assert_eq!(
        rule.conditions,
        vec![Condition::new("hours_worked", "greater_than", "12")]
    );
}

#[tokio::test]
async fn test_extract_rule_decodes_entity_encoded_output() {
    // The model double-encodes quotes; the default mock repair echoes its
    // input, so only the normalizer stands between this and the parser.
    let encoded = r#"{&quot;action&quot;: &quot;notify&quot;,
        &quot;target&quot;: &quot;supervisor&quot;,
        &quot;conditions&quot;: [{&quot;field&quot;: &quot;day_of_week&quot;,
        &quot;operator&quot;: &quot;equals&quot;, &quot;value&quot;: &quot;monday&quot;}]}"#;
    let provider = MockProvider::new().with_response(prompts::INTENT_EXTRACTOR, encoded);
    let pipeline = pipeline_with(provider);

    let rule = pipeline
        .extract_rule("Notify the supervisor on Mondays.", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(rule.action, "notify");
    assert_eq!(rule.target, "supervisor");
    assert_eq!(
        rule.conditions,
        vec![Condition::new("day_of_week", "equals", "monday")]
    );
}

#[tokio::test]
async fn test_extract_rule_uses_scripted_repair() {
    let broken = r#"{'action': 'deny', 'target': 'contractor' conditions: []"#;
    let repaired = r#"{"action": "deny", "target": "contractor",
        "conditions": [{"field": "hours_worked", "operator": "greater_than", "value": "40"}]}"#;
    let provider = MockProvider::new()
        .with_response(prompts::INTENT_EXTRACTOR, broken)
        .with_response(prompts::REPAIR_FUNCTION, repaired);
    let pipeline = pipeline_with(provider);

    let rule = pipeline
        .extract_rule(
            "Deny contractor overtime above 40 hours.",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(rule.action, "deny");
    assert_eq!(rule.conditions[0].value, "40");
}

#[tokio::test]
async fn test_extract_rule_case_insensitive_model_output() {
    let shouting = r#"{"ACTION": "grant", "Target": "employees",
        "Conditions": [{"FIELD": "day_of_week", "Operator": "equals", "VALUE": "friday"}]}"#;
    let provider = MockProvider::new().with_response(prompts::INTENT_EXTRACTOR, shouting);
    let pipeline = pipeline_with(provider);

    let rule = pipeline
        .extract_rule("Give employees Fridays.", &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(rule.action, "grant");
    assert_eq!(rule.target, "employees");
}

#[tokio::test]
async fn test_fallback_retries_with_bare_text() {
    // First extraction (summary-combined input) yields prose; the retry
    // gets usable JSON.
    let provider = MockProvider::new()
        .with_response(prompts::INTENT_EXTRACTOR, "Sorry, I can't produce JSON here.")
        .with_response(prompts::INTENT_EXTRACTOR, VALID_RULE_JSON);
    let pipeline = pipeline_with(provider);

    let rule = pipeline
        .extract_rule(DECKHAND_TEXT, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(rule.action, "contact");

    let intent_calls = pipeline.provider().calls_to(prompts::INTENT_EXTRACTOR);
    assert_eq!(intent_calls.len(), 2);

    // The first pass sees the summary-combined document...
    let first = intent_calls[0].input().unwrap();
    assert!(first.starts_with("Original:\n"));
    assert!(first.contains("\n\nSummary:\n"));

    // ...the retry sees the bare source text, no summary.
    assert_eq!(intent_calls[1].input(), Some(DECKHAND_TEXT));
}

#[tokio::test]
async fn test_deckhand_scenario_backfills_missing_conditions() {
    // The model finds action and target but loses the condition; the
    // regex-based heuristic recovers it from the source text.
    let partial = r#"{"action": "contact", "target": "deckhand", "conditions": []}"#;
    let provider = MockProvider::new().with_response(prompts::INTENT_EXTRACTOR, partial);
    let pipeline = pipeline_with(provider);

    let rule = pipeline
        .extract_rule(DECKHAND_TEXT, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(rule.action, "contact");
    assert_eq!(rule.target, "deckhand");
    assert!(rule
        .conditions
        .contains(&Condition::new("hours_worked", "greater_than", "12")));
}

#[tokio::test]
async fn test_fully_heuristic_extraction_from_empty_model_output() {
    let provider = MockProvider::new().with_response(prompts::INTENT_EXTRACTOR, "{}");
    let pipeline = pipeline_with(provider);

    let rule = pipeline
        .extract_rule(
            "Employees must not be scheduled on Sunday.",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(rule.action, "schedule");
    assert_eq!(rule.target, "employees");
    assert_eq!(
        rule.conditions,
        vec![Condition::new("day_of_week", "equals", "sunday")]
    );
}

#[tokio::test]
async fn test_catch_all_condition_keeps_rule_complete() {
    let provider = MockProvider::new().with_response(prompts::INTENT_EXTRACTOR, "{}");
    let pipeline = pipeline_with(provider);

    let text = "Treat the casual pool fairly.";
    let rule = pipeline
        .extract_rule(text, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(rule.target, "casual_pool");
    assert_eq!(rule.conditions, vec![Condition::new("context", "contains", text)]);
    assert!(rule.has_core_fields());
}

#[tokio::test]
async fn test_provider_failure_propagates_unchanged() {
    let provider = MockProvider::new().fail_template(prompts::SUMMARIZE_PROMPT);
    let pipeline = pipeline_with(provider);

    let result = pipeline
        .extract_rule(DECKHAND_TEXT, &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(RuleError::Provider(_))));
}

#[tokio::test]
async fn test_cancelled_token_aborts_before_provider() {
    let provider = MockProvider::new();
    let pipeline = pipeline_with(provider);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = pipeline.extract_rule(DECKHAND_TEXT, &cancel).await;
    assert!(matches!(result, Err(RuleError::Cancelled)));
    assert!(pipeline.provider().calls().is_empty());
}

#[tokio::test]
async fn test_refine_returns_validated_rule() {
    let refined = r#"{"action": "grant_time_off", "target": "crew_member",
        "conditions": [{"field": "hours_worked", "operator": "greater_than", "value": "12"}]}"#;
    let provider = MockProvider::new().with_response(prompts::REFINE_PROMPT, refined);
    let pipeline = pipeline_with(provider);

    let rule = pipeline
        .refine(VALID_RULE_JSON, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(rule.action, "grant_time_off");
    assert_eq!(rule.target, "crew_member");
}

#[tokio::test]
async fn test_refine_fails_when_output_invalid() {
    let provider =
        MockProvider::new().with_response(prompts::REFINE_PROMPT, "I made it much better!");
    let pipeline = pipeline_with(provider);

    let result = pipeline.refine(VALID_RULE_JSON, &CancellationToken::new()).await;
    match result {
        Err(RuleError::Pipeline { message, .. }) => {
            assert!(message.contains("failed validation"));
        }
        other => panic!("expected pipeline failure, got {:?}", other.map(|r| r.action)),
    }
}

#[tokio::test]
async fn test_explain_rejects_blank_response() {
    let provider = MockProvider::new().with_response(prompts::RULE_EXPLAINER, "   \n");
    let pipeline = pipeline_with(provider);

    let result = pipeline.explain(VALID_RULE_JSON, &CancellationToken::new()).await;
    assert!(matches!(result, Err(RuleError::Pipeline { .. })));
}

#[tokio::test]
async fn test_explain_trims_response() {
    let provider = MockProvider::new()
        .with_response(prompts::RULE_EXPLAINER, "  Contact the casual pool.  ");
    let pipeline = pipeline_with(provider);

    let explanation = pipeline
        .explain(VALID_RULE_JSON, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(explanation, "Contact the casual pool.");
}

#[tokio::test]
async fn test_cluster_rules_passthrough() {
    let clusters = r#"{"clusters": [{"label": "overtime", "rules": [0]}]}"#;
    let provider = MockProvider::new().with_response(prompts::RULE_CLUSTERER, clusters);
    let pipeline = pipeline_with(provider);

    let response = pipeline
        .cluster_rules(&format!("[{VALID_RULE_JSON}]"), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response, clusters);
}

#[tokio::test]
async fn test_extract_multiple_returns_all_valid_rules() {
    let batch = r#"{"rules": [
        {"action": "notify", "target": "supervisor",
         "conditions": [{"field": "day_of_week", "operator": "equals", "value": "monday"}]},
        {"action": "deny", "target": "contractor",
         "conditions": [{"field": "hours_worked", "operator": "greater_than", "value": "40"}]}
    ]}"#;
    let provider = MockProvider::new().with_response(prompts::MULTI_RULE_EXTRACTOR, batch);
    let pipeline = pipeline_with(provider);

    let rules = pipeline
        .extract_multiple("two policies", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].action, "notify");
    assert_eq!(rules[1].target, "contractor");
}

#[tokio::test]
async fn test_batch_fail_fast_on_single_invalid_element() {
    // Element 1 (zero-based) is missing its target; the whole batch must
    // abort with no partial result.
    let batch = r#"{"rules": [
        {"action": "notify", "target": "supervisor",
         "conditions": [{"field": "day_of_week", "operator": "equals", "value": "monday"}]},
        {"action": "deny",
         "conditions": [{"field": "hours_worked", "operator": "greater_than", "value": "40"}]},
        {"action": "grant", "target": "employees",
         "conditions": [{"field": "day_of_week", "operator": "equals", "value": "friday"}]}
    ]}"#;
    let provider = MockProvider::new().with_response(prompts::MULTI_RULE_EXTRACTOR, batch);
    let pipeline = pipeline_with(provider);

    let result = pipeline
        .extract_multiple("three policies", &CancellationToken::new())
        .await;
    match result {
        Err(RuleError::BatchElement { index, .. }) => assert_eq!(index, 1),
        other => panic!("expected batch abort, got {:?}", other.map(|r| r.len())),
    }
}

#[tokio::test]
async fn test_extract_multiple_rejects_unparseable_payload() {
    let provider =
        MockProvider::new().with_response(prompts::MULTI_RULE_EXTRACTOR, "here are your rules");
    let pipeline = pipeline_with(provider);

    let result = pipeline
        .extract_multiple("some policies", &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(RuleError::Pipeline { .. })));
}

#[tokio::test]
async fn test_validate_combines_structural_and_critic() {
    let provider = MockProvider::new().with_response(
        prompts::SCHEMA_VALIDATOR,
        r#"{"valid": false, "issues": ["target should be snake_case"]}"#,
    );
    let pipeline = pipeline_with(provider);

    let result = pipeline
        .validate(VALID_RULE_JSON, &CancellationToken::new())
        .await
        .unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.issues, vec!["target should be snake_case"]);
}
