// Integration tests for dry runs and library validation
mod common;

use pipeweave::Engine;
use pipeweave::content::StuffContent;
use pipeweave::dry_run::DryRunOutcome;
use pipeweave::error::{CollaboratorError, DryRunError, PipelineError};
use pipeweave::memory::WorkingMemory;
use pipeweave::pipeline::{RunMode, RunParams};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::sync::Arc;

fn bundle() -> Value {
    json!({
        "domain": "review",
        "concepts": {
            "Draft": "A first draft",
            "Score": {"definition": "A review score", "structure": {"value": "number", "reason": "text"}}
        },
        "pipes": {
            "compare": {
                "type": "PipeCompose",
                "inputs": {"left": "Text", "right": "Text", "criteria": "Text"},
                "output": "Text",
                "template": "{{ left.text }} vs {{ right.text }} on {{ criteria.text }}"
            },
            "write_drafts": {
                "type": "PipeLLM",
                "inputs": {"topic": "Text"},
                "output": "Draft",
                "prompt_template": "Write about {{ topic.text }}",
                "nb_output": 2
            },
            "score_draft": {
                "type": "PipeLLM",
                "inputs": {"draft": "Draft"},
                "output": "Score",
                "prompt_template": "Score {{ draft.text }}"
            },
            "write_and_score": {
                "type": "PipeSequence",
                "inputs": {"topic": "Text"},
                "output": "Score",
                "steps": [
                    {"pipe": "write_drafts", "result": "drafts"},
                    {"pipe": "score_draft", "result": "scores", "batch_over": "drafts", "batch_as": "draft"}
                ]
            },
            "score_all": {
                "type": "PipeBatch",
                "inputs": {"drafts": {"concept": "Draft", "multiplicity": true}},
                "output": "Score",
                "branch_pipe_code": "score_draft",
                "input_item_name": "draft"
            },
            "call_unknown": {
                "type": "PipeFunc",
                "inputs": {"topic": "Text"},
                "output": "Text",
                "function_name": "not_registered"
            },
            "dangling": {
                "type": "PipeSequence",
                "inputs": {"topic": "Text"},
                "output": "Text",
                "steps": [{"pipe": "missing_pipe"}]
            }
        }
    })
}

#[tokio::test]
async fn test_missing_inputs_reported_exactly() {
    let engine = Engine::new(common::load(common::builder(), bundle()));
    let left = engine
        .make_stuff("left", "Text", StuffContent::text("a"))
        .unwrap();
    let memory = WorkingMemory::from_stuffs([left]);

    let error = engine
        .run_with_memory("compare", memory.clone(), RunParams::new(RunMode::Dry))
        .await
        .unwrap_err();
    let expected: BTreeSet<String> = ["criteria", "right"].map(String::from).into();
    match error.root_cause() {
        PipelineError::DryRun(DryRunError::MissingInputs { pipe_code, missing }) => {
            assert_eq!(pipe_code, "compare");
            assert_eq!(missing, &expected);
        }
        other => panic!("unexpected error {other:?}"),
    }

    let live = engine
        .run_with_memory("compare", memory, RunParams::new(RunMode::Live))
        .await
        .unwrap_err();
    assert!(matches!(
        live.root_cause(),
        PipelineError::MissingInputs { missing, .. } if missing == &expected
    ));
}

#[tokio::test]
async fn test_empty_memory_misses_every_input() {
    let engine = Engine::new(common::load(common::builder(), bundle()));
    let error = engine
        .run_with_memory("compare", WorkingMemory::new(), RunParams::new(RunMode::Dry))
        .await
        .unwrap_err();
    match error.root_cause() {
        PipelineError::DryRun(DryRunError::MissingInputs { missing, .. }) => {
            assert_eq!(missing.len(), 3);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_dry_run_never_calls_the_generator() {
    let generator = common::ScriptedGenerator::new(|_| {
        Err(CollaboratorError::generation("should not be called"))
    });
    let library = common::load(
        common::builder().with_generator(generator.clone()),
        bundle(),
    );
    let engine = Engine::new(library);

    let output = engine.dry_run_pipe("write_and_score").await.unwrap();

    let drafts = output.working_memory.get_stuff("drafts").unwrap();
    assert_eq!(drafts.content.as_list().map(<[_]>::len), Some(2));
    let scores = output.working_memory.get_stuff("scores").unwrap();
    let items = scores.content.as_list().unwrap();
    assert_eq!(items.len(), 2);
    match &items[0] {
        StuffContent::Structured(score) => {
            assert_eq!(score.class_name, "Score");
            assert_eq!(score.value["value"], 0);
        }
        other => panic!("expected a structured score, got {other:?}"),
    }
    assert!(generator.jobs().is_empty());
}

#[tokio::test]
async fn test_validate_dry_run_reports_per_pipe() {
    let engine = Engine::new(common::load(common::builder(), bundle()));

    let report = engine.validate_dry_run().await;

    assert_eq!(report.len(), 7);
    assert!(!report.is_success());
    let failed: Vec<&str> = report.failed().into_iter().map(|(code, _)| code).collect();
    assert_eq!(failed, vec!["call_unknown", "dangling"]);
    assert_eq!(
        report.dangling_references(),
        &[("dangling".to_string(), "missing_pipe".to_string())]
    );
    // json! objects are key-ordered, so the library is too
    assert_eq!(
        report.passed(),
        vec!["compare", "score_all", "score_draft", "write_and_score", "write_drafts"]
    );
    match report.get("call_unknown") {
        Some(DryRunOutcome::Failed(error)) => assert!(matches!(
            error.root_cause(),
            PipelineError::Collaborator(CollaboratorError::FunctionNotFound(_))
        )),
        other => panic!("unexpected outcome {other:?}"),
    }
}

#[tokio::test]
async fn test_dry_run_is_deterministic() {
    let library = common::load(common::builder(), bundle());
    let engine = Engine::new(Arc::clone(&library));
    let first = engine.dry_run_pipe("score_all").await.unwrap();
    let second = engine.dry_run_pipe("score_all").await.unwrap();
    assert_eq!(first.working_memory, second.working_memory);
}
