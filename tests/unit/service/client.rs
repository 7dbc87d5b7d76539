use std::collections::VecDeque;
use std::time::Duration;

use super::*;

struct ScriptedStream {
    frames: VecDeque<WireFrame>,
}

impl EventStream for ScriptedStream {
    fn next_frame(&mut self) -> ParallaxResult<Option<WireFrame>> {
        Ok(self.frames.pop_front())
    }
}

#[derive(Default)]
struct ScriptedTransport {
    failures_before_connect: u32,
    connect_calls: u32,
    frames: Vec<WireFrame>,
    submitted: Vec<serde_json::Value>,
    job_id: String,
}

impl ServiceTransport for ScriptedTransport {
    fn connect(&mut self, _client_id: &str) -> ParallaxResult<Box<dyn EventStream>> {
        self.connect_calls += 1;
        if self.connect_calls <= self.failures_before_connect {
            return Err(ParallaxError::Connection {
                attempts: 1,
                reason: "refused".to_string(),
            });
        }
        Ok(Box::new(ScriptedStream {
            frames: self.frames.drain(..).collect(),
        }))
    }

    fn submit(&mut self, submission: &JobSubmission) -> ParallaxResult<SubmitResponse> {
        self.submitted.push(serde_json::to_value(submission).unwrap());
        Ok(SubmitResponse {
            job_id: self.job_id.clone(),
            number: Some(0),
        })
    }
}

#[derive(Default)]
struct Recorder {
    progress: Vec<(String, u64, u64)>,
    executing: Vec<String>,
    statuses: usize,
}

impl ProgressSink for Recorder {
    fn on_status(&mut self, _queue_remaining: Option<u64>) {
        self.statuses += 1;
    }
    fn on_progress(&mut self, node: &str, value: u64, max: u64) {
        self.progress.push((node.to_string(), value, max));
    }
    fn on_executing(&mut self, node: &str) {
        self.executing.push(node.to_string());
    }
}

fn text(s: &str) -> WireFrame {
    WireFrame::Text(s.to_string())
}

fn workflow() -> Workflow {
    Workflow::from_value(
        "t",
        serde_json::json!({
            "8": { "class_type": "KSampler", "inputs": {} },
            "9": { "class_type": "SaveImage", "inputs": {}, "_meta": { "title": "Save" } }
        }),
    )
    .unwrap()
}

fn retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        delay: Duration::ZERO,
    }
}

fn client(transport: ScriptedTransport, max_attempts: u32) -> InpaintingServiceClient<ScriptedTransport> {
    InpaintingServiceClient::new(transport, retry(max_attempts))
}

#[test]
fn completes_on_matching_terminal_event() {
    let transport = ScriptedTransport {
        job_id: "p-1".to_string(),
        frames: vec![
            text(r#"{"type":"status","data":{"status":{"exec_info":{"queue_remaining":1}}}}"#),
            text(r#"{"type":"executing","data":{"node":"8","prompt_id":"p-1"}}"#),
            WireFrame::Binary(vec![1, 2, 3]),
            text(r#"{"type":"progress","data":{"value":5,"max":20,"node":"8","prompt_id":"p-1"}}"#),
            text(r#"{"type":"executing","data":{"node":null,"prompt_id":"other"}}"#),
            text(r#"{"type":"executing","data":{"node":"9","prompt_id":"p-1"}}"#),
            text(r#"{"type":"executing","data":{"node":null,"prompt_id":"p-1"}}"#),
        ],
        ..ScriptedTransport::default()
    };
    let mut c = client(transport, 3);
    let mut rec = Recorder::default();
    let outcome = c.run_job(&workflow(), &mut rec).unwrap();

    assert_eq!(outcome.job_id, "p-1");
    assert_eq!(outcome.connect_attempts, 1);
    assert_eq!(c.state(), &ClientState::Done { job_id: "p-1".to_string() });
    assert_eq!(rec.statuses, 1);
    assert_eq!(rec.progress, vec![("KSampler".to_string(), 5, 20)]);
    assert_eq!(rec.executing, vec!["KSampler".to_string(), "Save".to_string()]);

    let sent = &c.transport().submitted;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0]["client_id"], c.client_id());
    assert_eq!(sent[0]["prompt"]["8"]["class_type"], "KSampler");
}

#[test]
fn retries_connect_within_budget() {
    let transport = ScriptedTransport {
        failures_before_connect: 2,
        job_id: "p-1".to_string(),
        frames: vec![text(r#"{"type":"executing","data":{"node":null,"prompt_id":"p-1"}}"#)],
        ..ScriptedTransport::default()
    };
    let mut c = client(transport, 3);
    let outcome = c.run_job(&workflow(), &mut Recorder::default()).unwrap();
    assert_eq!(outcome.connect_attempts, 3);
    assert_eq!(c.transport().connect_calls, 3);
}

#[test]
fn exhausted_budget_is_a_connection_error_without_submission() {
    let transport = ScriptedTransport {
        failures_before_connect: 10,
        ..ScriptedTransport::default()
    };
    let mut c = client(transport, 4);
    let err = c.run_job(&workflow(), &mut Recorder::default()).unwrap_err();
    match err {
        ParallaxError::Connection { attempts, reason } => {
            assert_eq!(attempts, 4);
            assert!(reason.contains("refused"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(c.transport().connect_calls, 4);
    assert!(c.transport().submitted.is_empty());
    assert_eq!(c.state(), &ClientState::Disconnected);
}

#[test]
fn stream_closing_early_is_a_disconnect() {
    let transport = ScriptedTransport {
        job_id: "p-7".to_string(),
        frames: vec![text(r#"{"type":"progress","data":{"value":1,"max":2,"prompt_id":"p-7"}}"#)],
        ..ScriptedTransport::default()
    };
    let mut c = client(transport, 1);
    let err = c.run_job(&workflow(), &mut Recorder::default()).unwrap_err();
    assert!(matches!(err, ParallaxError::Disconnected { ref job_id } if job_id == "p-7"));
    assert!(err.is_connection());
    assert_eq!(c.transport().submitted.len(), 1);
    assert_eq!(c.state(), &ClientState::Disconnected);
}

#[test]
fn malformed_event_is_a_protocol_error() {
    let transport = ScriptedTransport {
        job_id: "p-1".to_string(),
        frames: vec![text("{oops")],
        ..ScriptedTransport::default()
    };
    let mut c = client(transport, 1);
    assert!(matches!(
        c.run_job(&workflow(), &mut Recorder::default()),
        Err(ParallaxError::Protocol(_))
    ));
}

#[test]
fn client_ids_are_unique_uuids() {
    let a = client(ScriptedTransport::default(), 1);
    let b = client(ScriptedTransport::default(), 1);
    assert_ne!(a.client_id(), b.client_id());
    assert!(uuid::Uuid::parse_str(a.client_id()).is_ok());
    assert_eq!(a.state(), &ClientState::Disconnected);
}

#[test]
fn retry_policy_reads_service_config() {
    let cfg = ServiceConfig::default();
    let p = RetryPolicy::from_config(&cfg);
    assert_eq!(p.max_attempts, 15);
    assert_eq!(p.delay, Duration::from_millis(1000));
}
