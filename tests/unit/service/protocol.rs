use super::*;

#[test]
fn submission_uses_service_field_names() {
    let s = JobSubmission {
        job: serde_json::json!({ "1": { "class_type": "LoadImage" } }),
        client_id: "abc".to_string(),
    };
    let v = serde_json::to_value(&s).unwrap();
    assert_eq!(v["client_id"], "abc");
    assert_eq!(v["prompt"]["1"]["class_type"], "LoadImage");
    assert!(v.get("job").is_none());
}

#[test]
fn submit_response_accepts_either_correlator_name() {
    let r: SubmitResponse =
        serde_json::from_str(r#"{"prompt_id":"p-1","number":3,"node_errors":{}}"#).unwrap();
    assert_eq!(r.job_id, "p-1");
    assert_eq!(r.number, Some(3));

    let r: SubmitResponse = serde_json::from_str(r#"{"job_id":"p-2"}"#).unwrap();
    assert_eq!(r.job_id, "p-2");
    assert_eq!(r.number, None);
}

#[test]
fn parses_status_progress_and_executing() {
    let status = ServiceEvent::parse(
        r#"{"type":"status","data":{"status":{"exec_info":{"queue_remaining":2}},"sid":"x"}}"#,
    )
    .unwrap();
    assert_eq!(status, ServiceEvent::Status { queue_remaining: Some(2) });

    let progress = ServiceEvent::parse(
        r#"{"type":"progress","data":{"value":3,"max":20,"prompt_id":"p-1","node":"8"}}"#,
    )
    .unwrap();
    assert_eq!(
        progress,
        ServiceEvent::Progress {
            value: 3,
            max: 20,
            node: Some("8".to_string()),
            job_id: Some("p-1".to_string()),
        }
    );

    let executing =
        ServiceEvent::parse(r#"{"type":"executing","data":{"node":"3","prompt_id":"p-1"}}"#).unwrap();
    assert!(!executing.is_terminal_for("p-1"));
}

#[test]
fn terminal_requires_null_node_and_matching_id() {
    let done =
        ServiceEvent::parse(r#"{"type":"executing","data":{"node":null,"prompt_id":"p-1"}}"#).unwrap();
    assert!(done.is_terminal_for("p-1"));
    assert!(!done.is_terminal_for("p-2"));

    let anonymous = ServiceEvent::parse(r#"{"type":"executing","data":{"node":null}}"#).unwrap();
    assert!(!anonymous.is_terminal_for("p-1"));
}

#[test]
fn unknown_types_are_passed_through_and_garbage_is_rejected() {
    let other = ServiceEvent::parse(r#"{"type":"execution_cached","data":{"nodes":[]}}"#).unwrap();
    assert_eq!(other, ServiceEvent::Other("execution_cached".to_string()));

    assert!(matches!(
        ServiceEvent::parse("not json"),
        Err(ParallaxError::Protocol(_))
    ));
    assert!(matches!(
        ServiceEvent::parse(r#"{"type":"progress","data":{"value":"x"}}"#),
        Err(ParallaxError::Protocol(_))
    ));
}
