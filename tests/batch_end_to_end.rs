use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use taxonomy_mapper::{
    clients::{ChatCompletionClient, CompletionOptions},
    model::{CaseId, UNMAPPED},
    pipeline::{BatchRunner, MappingMetrics, TaxonomyMapper},
    report::ExecutionReport,
    store::{load_cases, save_results},
    taxonomy::{KeywordSignals, Taxonomy},
};
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_string_contains, header, method, path},
};

fn taxonomy_json() -> Value {
    json!({
        "Fiction": {
            "Romance": ["Enemies-to-Lovers", "Slow-burn", "Second Chance"],
            "Thriller": ["Espionage", "Psychological", "Legal Thriller"],
            "Sci-Fi": ["Hard Sci-Fi", "Space Opera", "Cyberpunk"],
            "Horror": ["Psychological Horror", "Gothic", "Slasher"]
        }
    })
}

fn cases_json() -> Value {
    json!([
        {
            "id": 1,
            "user_tags": ["Action", "Spies"],
            "story_snippet": "A covert spy infiltrates the embassy.",
            "expected_logic": "Thriller/Espionage"
        },
        {
            "id": 2,
            "user_tags": "Space",
            "story_snippet": "The imperial fleet crosses the galaxy.",
            "expected_logic": "Sci-Fi/Space Opera"
        },
        {
            "id": 3,
            "user_tags": ["Scary"],
            "story_snippet": "A masked killer stalks campers.",
            "expected_logic": "Horror/Slasher"
        },
        {
            "id": "quiet",
            "user_tags": [],
            "story_snippet": "A quiet picnic on a sunny day."
        },
        {
            "id": 5,
            "user_tags": ["Broken"],
            "story_snippet": 42,
            "expected_logic": "unreadable"
        }
    ])
}

fn completion(content: &str) -> Value {
    json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 120, "completion_tokens": 30, "total_tokens": 150}
    })
}

async fn mount_responses(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_string_contains("covert spy"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            "```json\n{\"mapped_category\": \"Thriller/Espionage\", \"confidence\": 0.93, \"reasoning\": \"Covert agent infiltration.\"}\n```",
        )))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("imperial fleet"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(
            r#"{"mapped_category": "Sci-Fi/Galactic War", "confidence": 0.8, "reasoning": "Fleets at war."}"#,
        )))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_string_contains("masked killer"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream overloaded"))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn batch_maps_validates_and_degrades_per_case() {
    let server = MockServer::start().await;
    mount_responses(&server).await;

    let dir = tempfile::tempdir().expect("tempdir");
    let taxonomy_path = dir.path().join("taxonomy.json");
    let cases_path = dir.path().join("test_cases.json");
    let log_path = dir.path().join("reasoning_log.json");
    std::fs::write(&taxonomy_path, taxonomy_json().to_string()).expect("write taxonomy");
    std::fs::write(&cases_path, cases_json().to_string()).expect("write cases");

    let taxonomy = Arc::new(Taxonomy::from_path(&taxonomy_path).expect("taxonomy loads"));
    let client = ChatCompletionClient::new(server.uri(), "test-key", CompletionOptions::default())
        .expect("client builds");
    let mapper = TaxonomyMapper::new(
        taxonomy,
        &KeywordSignals::default_signals(),
        Arc::new(client),
    )
    .expect("mapper builds");

    let cases = load_cases(&cases_path).await.expect("cases load");
    let mut metrics = MappingMetrics::new();
    let records = BatchRunner::new(&mapper, Duration::ZERO)
        .run(&cases, &mut metrics)
        .await;

    assert_eq!(records.len(), 5);

    assert_eq!(records[0].mapped_category, "Thriller/Espionage");
    assert!((records[0].confidence - 0.93).abs() < f64::EPSILON);
    assert!(!records[0].validated);

    assert_eq!(records[1].mapped_category, UNMAPPED);
    assert!(records[1].validated);
    assert_eq!(records[1].reasoning, "Fleets at war.");

    assert_eq!(records[2].mapped_category, UNMAPPED);
    assert!(records[2].confidence.abs() < f64::EPSILON);
    assert!(records[2].reasoning.starts_with("System error:"));
    assert!(records[2].reasoning.contains("500"));

    assert_eq!(records[3].test_case_id, CaseId::Text("quiet".to_string()));
    assert_eq!(records[3].mapped_category, UNMAPPED);
    assert!((records[3].confidence - 0.99).abs() < f64::EPSILON);
    assert_eq!(records[3].expected_logic, "");

    assert_eq!(records[4].test_case_id, CaseId::Number(5));
    assert_eq!(records[4].mapped_category, UNMAPPED);
    assert!(records[4].reasoning.starts_with("System error: invalid case record"));
    assert_eq!(records[4].expected_logic, "unreadable");

    assert_eq!(metrics.llm_call_count, 3);
    assert_eq!(metrics.validation_triggers, 1);
    assert_eq!(metrics.hallucinations_caught, 1);
    assert!(metrics.total_tokens > 0);

    save_results(&log_path, &records)
        .await
        .expect("log written");
    let written: Value =
        serde_json::from_str(&std::fs::read_to_string(&log_path).expect("read log"))
            .expect("log is json");
    assert_eq!(written.as_array().map(Vec::len), Some(5));
    assert_eq!(written[0]["test_case_id"], json!(1));
    assert_eq!(written[0]["mapped_category"], json!("Thriller/Espionage"));
    assert_eq!(written[1]["validated"], json!(true));
    assert_eq!(written[3]["test_case_id"], json!("quiet"));
    assert_eq!(written[4]["test_case_id"], json!(5));

    let log_display = log_path.display().to_string();
    let report = ExecutionReport::new(&records, &metrics, 0.20, &log_display).to_string();
    assert!(report.contains("   Total Cases: 5"));
    assert!(report.contains("   Successfully Mapped: 1"));
    assert!(report.contains("   Hallucinations Caught: 1"));
    assert!(report.contains("[>] Case 2: Space"));
}

#[tokio::test]
async fn cases_without_signals_never_reach_the_endpoint() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
        .expect(0)
        .mount(&server)
        .await;

    let taxonomy = Arc::new(Taxonomy::from_value(&taxonomy_json()).expect("taxonomy parses"));
    let client = ChatCompletionClient::new(server.uri(), "test-key", CompletionOptions::default())
        .expect("client builds");
    let mapper = TaxonomyMapper::new(
        taxonomy,
        &KeywordSignals::default_signals(),
        Arc::new(client),
    )
    .expect("mapper builds");

    let mut metrics = MappingMetrics::new();
    let result = mapper
        .map_story(&json!(["Cozy"]), "A quiet picnic on a sunny day.", &mut metrics)
        .await
        .expect("no-signal result");

    assert_eq!(result.mapped_category, UNMAPPED);
    assert!(result.matched_patterns.is_empty());
    assert_eq!(metrics, MappingMetrics::default());
}
