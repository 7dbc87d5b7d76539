use super::*;

fn sample() -> Workflow {
    Workflow::from_value(
        "sample",
        serde_json::json!({
            "2": { "class_type": "LoadImage", "inputs": { "image": "x.png" }, "_meta": { "title": "Load Image" } },
            "3": { "class_type": "GrowMaskWithBlur", "inputs": { "expand": 1 } },
            "7": { "class_type": "SaveImage", "inputs": {}, "_meta": { "title": "LoadImage" } }
        }),
    )
    .unwrap()
}

#[test]
fn title_match_wins_over_class_type() {
    let wf = sample();
    assert_eq!(wf.find_node("LoadImage"), Some("7"));
    assert_eq!(wf.find_node("Load Image"), Some("2"));
    assert_eq!(wf.find_node("GrowMaskWithBlur"), Some("3"));
    assert_eq!(wf.find_node("KSampler"), None);
}

#[test]
fn node_names_fall_back_to_class_type_then_unknown() {
    let wf = sample();
    assert_eq!(wf.node_name("2"), "Load Image");
    assert_eq!(wf.node_name("3"), "GrowMaskWithBlur");
    assert_eq!(wf.node_name("99"), "Unknown");
}

#[test]
fn set_input_updates_node_inputs() {
    let mut wf = sample();
    wf.set_input("Load Image", "image", "start_step_00002_.png").unwrap();
    assert_eq!(
        wf.input("Load Image", "image"),
        Some(&serde_json::json!("start_step_00002_.png"))
    );
    wf.set_input("GrowMaskWithBlur", "blur_radius", 2.0).unwrap();
    assert_eq!(wf.to_value()["3"]["inputs"]["blur_radius"], 2.0);
    assert!(wf.set_input("KSampler", "seed", 1).is_err());
}

#[test]
fn optional_inputs_skip_absent_nodes() {
    let mut wf = sample();
    assert!(!wf.set_input_if_present("ImpactWildcardProcessor", "wildcard_text", "x").unwrap());
    assert!(wf.set_input_if_present("GrowMaskWithBlur", "expand", 14).unwrap());
    assert_eq!(wf.input("GrowMaskWithBlur", "expand"), Some(&serde_json::json!(14)));
}

#[test]
fn rejects_malformed_graphs() {
    assert!(Workflow::from_value("w", serde_json::json!([1, 2])).is_err());
    assert!(Workflow::from_value("w", serde_json::json!({ "1": { "inputs": {} } })).is_err());
}

#[test]
fn builtin_template_has_required_nodes() {
    let wf = Workflow::builtin().unwrap();
    assert_eq!(wf.name(), "outpaint");
    assert!(wf.find_node("LoadImage").is_some());
    assert!(wf.find_node("GrowMaskWithBlur").is_some());
    assert!(wf.find_node("ImpactWildcardProcessor").is_some());
    assert_eq!(
        wf.input("SaveImage", "filename_prefix"),
        Some(&serde_json::json!("end_step"))
    );
}

#[test]
fn save_and_load_round_trip_keeps_name_from_stem() {
    let dir = tempfile::tempdir().unwrap();
    let wf = sample();
    let path = dir.path().join("project_workflows").join(wf.project_copy_filename("lake"));
    wf.save(&path).unwrap();
    let loaded = Workflow::load(&path).unwrap();
    assert_eq!(loaded.name(), "sample-lake");
    assert_eq!(loaded.to_value(), wf.to_value());
}
