// Integration tests for the generation operators against a scripted generator
mod common;

use pipeweave::Engine;
use pipeweave::collaborator::{GenerationJob, ImgGenJob};
use pipeweave::content::{IMAGE_CLASS, StuffContent};
use pipeweave::error::{CollaboratorError, PipelineError};
use serde_json::{Value, json};

fn bundle() -> Value {
    json!({
        "domain": "documents",
        "concepts": {
            "Scan": {"definition": "A scanned page", "refines": "Image"},
            "Review": {"definition": "A short review", "structure": {"rating": "number", "comment": "text"}}
        },
        "pipes": {
            "describe_scan": {
                "type": "PipeLLM",
                "inputs": {"scan": "Scan", "question": "Text"},
                "output": "Text",
                "system_prompt": "Be brief",
                "prompt_template": "{{ question.text }}"
            },
            "review_text": {
                "type": "PipeLLM",
                "inputs": {"input_text": "Text"},
                "output": "Review",
                "prompt_template": "Review: {{ input_text.text }}"
            },
            "brainstorm": {
                "type": "PipeLLM",
                "inputs": {"input_text": "Text"},
                "output": "Text",
                "prompt_template": "Ideas about {{ input_text.text }}",
                "nb_output": 3
            },
            "draw": {
                "type": "PipeImgGen",
                "inputs": {"input_text": "Text"},
                "output": "Image",
                "multiple_output": true
            }
        }
    })
}

fn text(engine: &Engine, name: &str, value: &str) -> pipeweave::memory::Stuff {
    engine
        .make_stuff(name, "Text", StuffContent::text(value))
        .unwrap()
}

#[tokio::test]
async fn test_text_job_carries_prompt_and_images() {
    let generator =
        common::ScriptedGenerator::new(|_| Ok(StuffContent::text("a cat on a mat")));
    let engine = Engine::new(common::load(
        common::builder().with_generator(generator.clone()),
        bundle(),
    ));
    let scan = engine
        .make_stuff("scan", "Scan", StuffContent::image("file://cat.png"))
        .unwrap();

    let output = engine
        .run("describe_scan", [scan, text(&engine, "question", "What is this?")], None)
        .await
        .unwrap();

    assert_eq!(output.main_stuff.as_text(), Some("a cat on a mat"));
    let jobs = generator.jobs();
    assert_eq!(jobs.len(), 1);
    match &jobs[0] {
        GenerationJob::Text(job) => {
            assert_eq!(job.pipe_code, "describe_scan");
            assert_eq!(job.prompt, "What is this?");
            assert_eq!(job.system_prompt.as_deref(), Some("Be brief"));
            assert_eq!(job.images.len(), 1);
            assert_eq!(job.images[0].url, "file://cat.png");
            assert!(!job.multiple_outputs);
        }
        other => panic!("expected a text job, got {other:?}"),
    }
}

#[tokio::test]
async fn test_structured_output_sends_object_job() {
    let generator = common::ScriptedGenerator::new(|_| {
        Ok(StuffContent::structured(
            "Review",
            json!({"rating": 4, "comment": "solid"}),
        ))
    });
    let engine = Engine::new(common::load(
        common::builder().with_generator(generator.clone()),
        bundle(),
    ));

    let output = engine
        .run("review_text", [text(&engine, "input_text", "fine prose")], None)
        .await
        .unwrap();

    assert_eq!(output.main_stuff.concept.concept_string(), "documents.Review");
    assert_eq!(output.main_stuff.name, "review");
    match &generator.jobs()[0] {
        GenerationJob::Object(job) => {
            assert_eq!(job.prompt, "Review: fine prose");
            assert_eq!(job.output_concept, "documents.Review");
            assert!(job.images.is_empty());
        }
        other => panic!("expected an object job, got {other:?}"),
    }
}

#[tokio::test]
async fn test_nb_output_requests_a_list() {
    let generator = common::ScriptedGenerator::new(|_| {
        Ok(StuffContent::list(vec![
            StuffContent::text("one"),
            StuffContent::text("two"),
            StuffContent::text("three"),
        ]))
    });
    let engine = Engine::new(common::load(
        common::builder().with_generator(generator.clone()),
        bundle(),
    ));

    let output = engine
        .run("brainstorm", [text(&engine, "input_text", "tea")], None)
        .await
        .unwrap();

    assert_eq!(output.main_stuff.content.as_list().map(<[_]>::len), Some(3));
    match &generator.jobs()[0] {
        GenerationJob::Text(job) => {
            assert!(job.multiple_outputs);
            assert_eq!(job.nb_outputs, Some(3));
        }
        other => panic!("expected a text job, got {other:?}"),
    }
}

#[tokio::test]
async fn test_single_item_is_wrapped_when_multiple() {
    let generator = common::ScriptedGenerator::new(|job| match job {
        GenerationJob::Image(_) => Ok(StuffContent::image("file://drawn.png")),
        other => Err(CollaboratorError::generation(format!("unexpected {other:?}"))),
    });
    let engine = Engine::new(common::load(
        common::builder().with_generator(generator.clone()),
        bundle(),
    ));

    let output = engine
        .run("draw", [text(&engine, "input_text", "a red kite")], None)
        .await
        .unwrap();

    let items = output.main_stuff.content.as_list().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].class_name(), IMAGE_CLASS);
    assert_eq!(
        generator.jobs(),
        vec![GenerationJob::Image(ImgGenJob {
            pipe_code: "draw".to_string(),
            prompt: "a red kite".to_string(),
            nb_images: 1,
        })]
    );
}

#[tokio::test]
async fn test_missing_generator_only_matters_live() {
    let engine = Engine::new(common::load(common::builder(), bundle()));
    let input = text(&engine, "input_text", "tea");

    let error = engine
        .run("brainstorm", [input], None)
        .await
        .unwrap_err();
    assert!(matches!(
        error.root_cause(),
        PipelineError::Collaborator(CollaboratorError::Unavailable(_))
    ));

    let output = engine.dry_run_pipe("brainstorm").await.unwrap();
    assert_eq!(output.main_stuff.content.as_list().map(<[_]>::len), Some(3));
}

#[tokio::test]
async fn test_function_errors_pass_through() {
    let bundle = json!({
        "domain": "documents",
        "pipes": {
            "strict_parse": {
                "type": "PipeFunc",
                "inputs": {"input_text": "Text"},
                "output": "Text",
                "function_name": "strict_parse"
            }
        }
    });
    let builder = common::builder().with_function(
        "strict_parse",
        |_: &indexmap::IndexMap<String, pipeweave::memory::Stuff>| {
            Err(CollaboratorError::UnexpectedContent("not a number".to_string()))
        },
    );
    let engine = Engine::new(common::load(builder, bundle));

    let error = engine
        .run("strict_parse", [text(&engine, "input_text", "abc")], None)
        .await
        .unwrap_err();

    assert_eq!(error.router_context().unwrap().pipe_code, "strict_parse");
    assert!(matches!(
        error.root_cause(),
        PipelineError::Collaborator(CollaboratorError::UnexpectedContent(message))
            if message == "not a number"
    ));
}
