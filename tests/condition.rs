// Integration tests for PipeCondition
mod common;

use pipeweave::Engine;
use pipeweave::content::StuffContent;
use pipeweave::error::{ConditionError, PipelineError};
use pipeweave::pipeline::RunMode;
use serde_json::{Value, json};

fn bundle() -> Value {
    json!({
        "domain": "routing",
        "pipes": {
            "route_by_length": {
                "type": "PipeCondition",
                "inputs": {"input_text": "Text"},
                "output": "Text",
                "expression": "input_text.text|length > 5",
                "pipe_map": {"true": "handle_long", "false": "handle_short"},
                "add_alias_from_expression_to": "is_long"
            },
            "route_by_category": {
                "type": "PipeCondition",
                "inputs": {"category": "Text", "input_text": "Text"},
                "output": "Text",
                "expression_template": "{{ category.text }}",
                "pipe_map": {"long": "handle_long"}
            },
            "route_on_blank": {
                "type": "PipeCondition",
                "inputs": {"category": "Text", "input_text": "Text"},
                "output": "Text",
                "expression_template": "{{ category.text }}",
                "pipe_map": {"long": "handle_long"}
            },
            "route_on_missing": {
                "type": "PipeCondition",
                "inputs": {"input_text": "Text"},
                "output": "Text",
                "expression": "nowhere.text|length > 5",
                "pipe_map": {"true": "handle_long"},
                "default_pipe_code": "handle_short"
            },
            "handle_long": {
                "type": "PipeCompose",
                "inputs": {"input_text": "Text"},
                "output": "Text",
                "template": "long: {{ input_text.text }}"
            },
            "handle_short": {
                "type": "PipeCompose",
                "inputs": {"input_text": "Text"},
                "output": "Text",
                "template": "short: {{ input_text.text }}"
            }
        }
    })
}

async fn route(engine: &Engine, text: &str) -> pipeweave::pipeline::PipeOutput {
    let input = engine
        .make_stuff("input_text", "Text", StuffContent::text(text))
        .unwrap();
    engine.run("route_by_length", [input], None).await.unwrap()
}

#[tokio::test]
async fn test_routes_on_text_length() {
    let engine = Engine::new(common::load(common::builder(), bundle()));

    let short = route(&engine, "hi").await;
    assert_eq!(short.main_stuff.as_text(), Some("short: hi"));
    assert_eq!(
        short.working_memory.get_stuff("is_long").unwrap().as_text(),
        Some("false")
    );

    let long = route(&engine, "hello world").await;
    assert_eq!(long.main_stuff.as_text(), Some("long: hello world"));
    assert_eq!(
        long.working_memory.get_stuff("is_long").unwrap().as_text(),
        Some("true")
    );
}

#[tokio::test]
async fn test_no_match_without_default() {
    let engine = Engine::new(common::load(common::builder(), bundle()));
    let inputs = [
        engine
            .make_stuff("category", "Text", StuffContent::text("medium"))
            .unwrap(),
        engine
            .make_stuff("input_text", "Text", StuffContent::text("abc"))
            .unwrap(),
    ];

    let error = engine
        .run("route_by_category", inputs.clone(), Some(RunMode::Live))
        .await
        .unwrap_err();
    assert!(matches!(
        error.root_cause(),
        PipelineError::Condition(ConditionError::NoMatch { value, .. }) if value == "medium"
    ));

    // dry runs fall back to the first mapped pipe
    let output = engine
        .run("route_by_category", inputs, Some(RunMode::Dry))
        .await
        .unwrap();
    assert_eq!(output.main_stuff.as_text(), Some("long: abc"));
}

#[tokio::test]
async fn test_evaluation_failure_kinds() {
    let engine = Engine::new(common::load(common::builder(), bundle()));
    let input = engine
        .make_stuff("input_text", "Text", StuffContent::text("abc"))
        .unwrap();

    let live = engine
        .run("route_on_missing", [input.clone()], Some(RunMode::Live))
        .await
        .unwrap_err();
    assert!(matches!(
        live.root_cause(),
        PipelineError::Condition(ConditionError::Evaluation { .. })
    ));

    let dry = engine
        .run("route_on_missing", [input], Some(RunMode::Dry))
        .await
        .unwrap_err();
    assert!(matches!(dry.root_cause(), PipelineError::DryRun(_)));
}

#[tokio::test]
async fn test_empty_evaluation_tolerated_only_in_dry_runs() {
    let engine = Engine::new(common::load(common::builder(), bundle()));
    let inputs = [
        engine
            .make_stuff("category", "Text", StuffContent::text("   "))
            .unwrap(),
        engine
            .make_stuff("input_text", "Text", StuffContent::text("abc"))
            .unwrap(),
    ];

    let live = engine
        .run("route_on_blank", inputs.clone(), Some(RunMode::Live))
        .await
        .unwrap_err();
    assert!(matches!(
        live.root_cause(),
        PipelineError::Condition(ConditionError::NoMatch { value, .. }) if value.is_empty()
    ));

    let dry = engine
        .run("route_on_blank", inputs, Some(RunMode::Dry))
        .await
        .unwrap();
    assert_eq!(dry.main_stuff.as_text(), Some("long: abc"));
}
