//! End-to-end runs of a multi-page form through the engine.

use formflow_config::{RunMode, WorkflowDef};
use formflow_engine::{
  CONTENT_TYPE_HTML, ChannelNotifier, EngineConfig, EngineError, ExecutionEvent, FormEngine,
  HttpResponse, validate_forms,
};
use formflow_form::{FormError, HttpMethod, InboundRequest};
use formflow_store::{InMemoryRunStore, RunStatus};
use formflow_workflow::Workflow;
use serde_json::json;
use tokio::sync::mpsc;

const BASE_URL: &str = "https://forms.example.com/form-waiting";

/// signup -> step1 -> step2 -> done
fn wizard_def() -> serde_json::Value {
  json!({
    "workflow_id": "wizard",
    "name": "Signup wizard",
    "settings": { "timezone": "+02:00" },
    "nodes": [
      {
        "node_id": "signup",
        "type": "trigger",
        "type_version": 2,
        "title": "Signup",
        "options": { "button_label": "Next" }
      },
      {
        "node_id": "step1",
        "type": "form",
        "fields": [{ "key": "name", "label": "Name", "kind": "text", "required": true }]
      },
      {
        "node_id": "step2",
        "type": "form",
        "fields": [{ "key": "email", "label": "Email", "kind": "email", "required": true }]
      },
      {
        "node_id": "done",
        "type": "form",
        "operation": "completion",
        "options": { "completion_message": "Thanks for signing up" }
      }
    ],
    "edges": [
      { "from": "signup", "to": "step1" },
      { "from": "step1", "to": "step2" },
      { "from": "step2", "to": "done" }
    ]
  })
}

fn lock(def: serde_json::Value) -> Workflow {
  let def: WorkflowDef = serde_json::from_value(def).unwrap();
  Workflow::lock(def).unwrap()
}

fn config() -> EngineConfig {
  EngineConfig {
    resume_base_url: BASE_URL.to_string(),
    mode: RunMode::Production,
  }
}

fn engine() -> FormEngine<InMemoryRunStore> {
  FormEngine::new(lock(wizard_def()), InMemoryRunStore::new(), config())
}

/// The token at the end of a redirect to the next page.
fn next_token(response: &HttpResponse) -> String {
  assert_eq!(response.status, 303);
  let location = response.location.as_deref().unwrap();
  let token = location.strip_prefix(&format!("{}/", BASE_URL)).unwrap();
  token.to_string()
}

#[tokio::test]
async fn test_wizard_round_trip() {
  let engine = engine();

  let run = engine.start(json!({})).await.unwrap();
  assert_eq!(run.status, RunStatus::Waiting);
  assert_eq!(run.waiting_node(), Some("step1"));
  let step1_token = run.resume_token().unwrap().to_string();

  // Step1 renders, repeatedly, without moving the run.
  let first = engine
    .handle_request(&step1_token, InboundRequest::get())
    .await
    .unwrap();
  let second = engine
    .handle_request(&step1_token, InboundRequest::get())
    .await
    .unwrap();
  assert_eq!(first.status, 200);
  assert_eq!(first.content_type, CONTENT_TYPE_HTML);
  assert_eq!(first, second);
  assert!(first.body.contains(r#"name="name""#));
  assert_eq!(
    engine.get_run(&run.run_id).await.unwrap().waiting_node(),
    Some("step1")
  );

  // Submitting step1 parks the run on step2 and redirects there.
  let redirect = engine
    .handle_request(&step1_token, InboundRequest::post(json!({ "name": "Ada" })))
    .await
    .unwrap();
  let step2_token = next_token(&redirect);
  assert_ne!(step2_token, step1_token);

  let run = engine.get_run(&run.run_id).await.unwrap();
  assert_eq!(run.waiting_node(), Some("step2"));
  assert_eq!(run.resume_token(), Some(step2_token.as_str()));
  let step2_input = &run.state.slot.as_ref().unwrap().preserved_batch;
  assert_eq!(step2_input.len(), 1);
  assert_eq!(step2_input[0].json["name"], "Ada");

  let page = engine
    .handle_request(&step2_token, InboundRequest::get())
    .await
    .unwrap();
  assert!(page.body.contains(r#"name="email""#));
  assert!(!page.body.contains(r#"name="name""#));

  // Submitting step2 parks the run on the completion screen.
  let redirect = engine
    .handle_request(&step2_token, InboundRequest::post(json!({ "email": "a@x.com" })))
    .await
    .unwrap();
  let done_token = next_token(&redirect);
  let run = engine.get_run(&run.run_id).await.unwrap();
  assert_eq!(run.waiting_node(), Some("done"));

  // Any request to the completion resumes with the batch done was entered with.
  let done = engine
    .handle_request(&done_token, InboundRequest::get())
    .await
    .unwrap();
  assert_eq!(done.status, 200);
  assert!(done.body.contains("Thanks for signing up"));

  let run = engine.get_run(&run.run_id).await.unwrap();
  assert_eq!(run.status, RunStatus::Succeeded);
  let output = &run.outputs["done"];
  assert_eq!(output.len(), 1);
  assert_eq!(output[0].json.len(), 1);
  assert_eq!(output[0].json["email"], "a@x.com");
}

#[tokio::test]
async fn test_last_page_is_acknowledged() {
  let mut def = wizard_def();
  def["nodes"][3] = json!({ "node_id": "done", "type": "noop" });
  let engine = FormEngine::new(lock(def), InMemoryRunStore::new(), config());

  let run = engine.start(json!({})).await.unwrap();
  let token = run.resume_token().unwrap().to_string();
  let redirect = engine
    .handle_request(&token, InboundRequest::post(json!({ "name": "Ada" })))
    .await
    .unwrap();
  let token = next_token(&redirect);

  let ack = engine
    .handle_request(&token, InboundRequest::post(json!({ "email": "a@x.com" })))
    .await
    .unwrap();
  assert_eq!(ack.status, 200);
  assert!(ack.location.is_none());
  let body: serde_json::Value = serde_json::from_str(&ack.body).unwrap();
  assert_eq!(body["status"], "received");
  assert_eq!(body["run_status"], "succeeded");
  assert!(body.get("resume_url").is_none());
}

#[tokio::test]
async fn test_requests_after_completion_are_rejected() {
  let engine = engine();
  let run = engine.start(json!({})).await.unwrap();
  let step1_token = run.resume_token().unwrap().to_string();

  let mut token = step1_token.clone();
  for body in [json!({ "name": "Ada" }), json!({ "email": "a@x.com" })] {
    let redirect = engine
      .handle_request(&token, InboundRequest::post(body))
      .await
      .unwrap();
    token = next_token(&redirect);
  }
  engine
    .handle_request(&token, InboundRequest::post(json!({})))
    .await
    .unwrap();

  let late = engine
    .handle_request(&token, InboundRequest::post(json!({})))
    .await;
  match late {
    Err(e @ EngineError::NotWaiting { .. }) => assert_eq!(e.status_code(), 409),
    other => panic!("expected NotWaiting, got {:?}", other),
  }

  // Tokens of earlier pages no longer resolve.
  let stale = engine
    .handle_request(&step1_token, InboundRequest::post(json!({ "name": "Eve" })))
    .await;
  assert!(matches!(stale, Err(EngineError::TokenNotFound(_))));
}

#[tokio::test]
async fn test_redelivered_submission_is_not_applied_to_next_page() {
  let engine = engine();
  let run = engine.start(json!({})).await.unwrap();
  let step1_token = run.resume_token().unwrap().to_string();

  let submission = json!({ "name": "Ada" });
  engine
    .handle_request(&step1_token, InboundRequest::post(submission.clone()))
    .await
    .unwrap();

  let again = engine
    .handle_request(&step1_token, InboundRequest::post(submission))
    .await;
  match again {
    Err(e @ EngineError::TokenNotFound(_)) => assert_eq!(e.status_code(), 404),
    other => panic!("expected TokenNotFound, got {:?}", other),
  }

  let run = engine.get_run(&run.run_id).await.unwrap();
  assert_eq!(run.status, RunStatus::Waiting);
  assert_eq!(run.waiting_node(), Some("step2"));
  assert!(run.error.is_none());
}

#[tokio::test]
async fn test_unsupported_method_leaves_run_parked() {
  let engine = engine();
  let run = engine.start(json!({})).await.unwrap();
  let token = run.resume_token().unwrap().to_string();

  let refused = engine
    .handle_request(&token, InboundRequest::with_body(HttpMethod::Options, json!({})))
    .await;
  match refused {
    Err(e @ EngineError::MethodNotAllowed { .. }) => assert_eq!(e.status_code(), 405),
    other => panic!("expected MethodNotAllowed, got {:?}", other),
  }

  let run = engine.get_run(&run.run_id).await.unwrap();
  assert_eq!(run.status, RunStatus::Waiting);
  assert_eq!(run.waiting_node(), Some("step1"));
  assert!(run.error.is_none());

  let page = engine
    .handle_request(&token, InboundRequest::get())
    .await
    .unwrap();
  assert_eq!(page.status, 200);
  assert!(page.body.contains(r#"name="name""#));
}

#[tokio::test]
async fn test_unknown_token() {
  let engine = engine();
  let result = engine
    .handle_request("nope", InboundRequest::get())
    .await;

  match result {
    Err(e @ EngineError::TokenNotFound(_)) => assert_eq!(e.status_code(), 404),
    other => panic!("expected TokenNotFound, got {:?}", other),
  }
}

#[tokio::test]
async fn test_cancel_waiting_run() {
  let engine = engine();
  let run = engine.start(json!({})).await.unwrap();
  let token = run.resume_token().unwrap().to_string();

  let cancelled = engine.cancel(&run.run_id).await.unwrap();
  assert_eq!(cancelled.status, RunStatus::Cancelled);
  assert!(cancelled.resume_token().is_none());
  assert!(cancelled.state.slot.is_none());

  assert!(matches!(
    engine.handle_request(&token, InboundRequest::get()).await,
    Err(EngineError::TokenNotFound(_))
  ));
  assert!(matches!(
    engine.cancel(&run.run_id).await,
    Err(EngineError::NotWaiting { .. })
  ));
}

#[tokio::test]
async fn test_missing_required_field_fails_run() {
  let engine = engine();
  let run = engine.start(json!({})).await.unwrap();
  let token = run.resume_token().unwrap().to_string();

  let result = engine
    .handle_request(&token, InboundRequest::post(json!({ "name": "" })))
    .await;
  match result {
    Err(EngineError::NodeFailed { node_id, source }) => {
      assert_eq!(node_id, "step1");
      assert!(matches!(source, FormError::MissingRequiredField { .. }));
    }
    other => panic!("expected NodeFailed, got {:?}", other),
  }

  let run = engine.get_run(&run.run_id).await.unwrap();
  assert_eq!(run.status, RunStatus::Failed);
  assert!(run.error.unwrap().contains("name"));
}

#[tokio::test]
async fn test_head_renders_without_body() {
  let engine = engine();
  let run = engine.start(json!({})).await.unwrap();
  let token = run.resume_token().unwrap().to_string();

  let head = engine
    .handle_request(&token, InboundRequest::with_body(HttpMethod::Head, json!({})))
    .await
    .unwrap();
  assert_eq!(head.status, 200);
  assert!(head.body.is_empty());
  assert_eq!(
    engine.get_run(&run.run_id).await.unwrap().status,
    RunStatus::Waiting
  );
}

#[tokio::test]
async fn test_missing_trigger_fails_at_entry() {
  let mut def = wizard_def();
  def["nodes"][0] = json!({ "node_id": "signup", "type": "noop" });
  let engine = FormEngine::new(lock(def), InMemoryRunStore::new(), config());

  let result = engine.start(json!({})).await;
  assert!(matches!(
    result,
    Err(EngineError::NodeFailed { source: FormError::MissingTrigger { .. }, .. })
  ));

  let runs = engine.list_runs().await.unwrap();
  assert_eq!(runs.len(), 1);
  assert_eq!(runs[0].status, RunStatus::Failed);
  assert!(runs[0].state.slot.is_none());
}

#[tokio::test]
async fn test_events() {
  let (sender, mut receiver) = mpsc::unbounded_channel();
  let engine = FormEngine::with_notifier(
    lock(wizard_def()),
    InMemoryRunStore::new(),
    config(),
    ChannelNotifier::new(sender),
  );

  let run = engine.start(json!({ "source": "test" })).await.unwrap();

  let mut events = Vec::new();
  while let Ok(event) = receiver.try_recv() {
    events.push(event);
  }

  assert!(matches!(&events[0], ExecutionEvent::RunStarted { run_id, .. } if *run_id == run.run_id));
  assert!(events.iter().any(|e| matches!(
    e,
    ExecutionEvent::NodeCompleted { node_id, output, .. }
      if node_id == "signup" && output[0].json["source"] == "test"
  )));
  match events.last() {
    Some(ExecutionEvent::RunSuspended {
      node_id,
      resume_url,
      ..
    }) => {
      assert_eq!(node_id, "step1");
      assert!(resume_url.starts_with(BASE_URL));
    }
    other => panic!("expected RunSuspended, got {:?}", other),
  }
}

#[test]
fn test_validate_forms() {
  assert!(validate_forms(&lock(wizard_def())).is_empty());

  let mut def = wizard_def();
  def["nodes"][0] = json!({ "node_id": "signup", "type": "noop" });
  def["nodes"][1]["operation"] = json!("survey");
  let errors = validate_forms(&lock(def));

  assert_eq!(errors.len(), 3);
  assert!(matches!(&errors[0], FormError::MissingTrigger { node_id } if node_id == "done"));
  assert!(matches!(&errors[1], FormError::UnrecognizedOperation { node_id, .. } if node_id == "step1"));
  assert!(matches!(&errors[2], FormError::MissingTrigger { node_id } if node_id == "step2"));
}
