use super::*;

fn sample_json() -> serde_json::Value {
    serde_json::json!({
        "project_name": "lake",
        "input_image_path": "input.png",
        "total_steps": 3,
        "seconds_per_step": 0.5,
        "fps": 24,
        "layers": [
            { "height": 100, "velocity": [-20.0, 0.0], "distance_ratio": 0.3 },
            { "height": 140, "velocity": [30.0, 0.0], "distance_ratio": 0.7 }
        ]
    })
}

fn parse(v: serde_json::Value) -> ProjectConfig {
    serde_json::from_value(v).unwrap()
}

#[test]
fn defaults_fill_optional_fields() {
    let cfg = parse(sample_json());
    cfg.validate().unwrap();
    assert_eq!(cfg.feathering_margin, 8);
    assert_eq!(cfg.service.port, 8188);
    assert_eq!(cfg.service.max_connect_attempts, 15);
    assert!(cfg.salient_objects.is_empty());
    assert_eq!(cfg.layer_heights(), vec![100, 140]);
    assert_eq!(cfg.velocities().unwrap(), vec![Velocity::new(-20, 0), Velocity::new(30, 0)]);
    assert!((cfg.duration_secs(3) - 1.5).abs() < 1e-12);
}

#[test]
fn validation_rejects_bad_values() {
    let mut v = sample_json();
    v["fps"] = 0.into();
    assert!(parse(v).validate().is_err());

    let mut v = sample_json();
    v["seconds_per_step"] = 0.0.into();
    assert!(parse(v).validate().is_err());

    let mut v = sample_json();
    v["layers"] = serde_json::json!([]);
    assert!(parse(v).validate().is_err());

    let mut v = sample_json();
    v["layers"][0]["velocity"] = serde_json::Value::Null;
    assert!(parse(v).validate().is_err());
}

#[test]
fn validation_rejects_velocity_within_feathering_margin() {
    let mut v = sample_json();
    v["feathering_margin"] = 8.into();
    v["layers"][1]["velocity"] = serde_json::json!([8.0, 0.0]);
    let err = parse(v).validate().unwrap_err();
    assert!(matches!(err, ParallaxError::Geometry(_)));
    assert!(err.to_string().contains("layer 2"));

    let mut v = sample_json();
    v["feathering_margin"] = 8.into();
    v["layers"][1]["velocity"] = serde_json::json!([0.0, 4.0]);
    parse(v).validate().unwrap();

    let mut v = sample_json();
    v["feathering_margin"] = 8.into();
    v["layers"][0]["velocity"] = serde_json::json!([-9.0, 0.0]);
    parse(v).validate().unwrap();
}

#[test]
fn motion_block_derives_missing_velocities() {
    let mut v = sample_json();
    v["motion"] = serde_json::json!({ "direction_degrees": 180.0, "smoothness": 40.0 });
    v["layers"][0]["velocity"] = serde_json::Value::Null;
    let cfg = parse(v);
    cfg.validate().unwrap();
    assert_eq!(cfg.layer_velocity(1).unwrap(), Velocity::new(-12, 0));
    assert_eq!(cfg.layer_velocity(2).unwrap(), Velocity::new(30, 0));
    assert!(cfg.layer_velocity(3).is_err());
}

#[test]
fn motion_direction_uses_image_coordinates() {
    let up = MotionConfig {
        direction_degrees: 90.0,
        smoothness: 10.0,
    };
    assert_eq!(up.velocity_for(1.0).unwrap(), Velocity::new(0, -10));
    let down = MotionConfig {
        direction_degrees: -90.0,
        smoothness: 10.0,
    };
    assert_eq!(down.velocity_for(0.5).unwrap(), Velocity::new(0, 5));
}

#[test]
fn default_steps_follow_slowest_layer() {
    let v = [Velocity::new(-20, 0), Velocity::new(30, 0), Velocity::new(0, 4)];
    assert_eq!(default_steps(1024, &v).unwrap(), 51);
    assert!(matches!(
        default_steps(1024, &[Velocity::new(0, 3)]),
        Err(ParallaxError::Validation(_))
    ));
}

#[test]
fn default_steps_report_velocity_wider_than_image() {
    let err = default_steps(64, &[Velocity::new(-80, 0), Velocity::new(100, 0)]).unwrap_err();
    assert!(matches!(err, ParallaxError::Geometry(_)));
    assert!(err.to_string().contains("80px exceeds the 64px image width"));
}

#[test]
fn configured_steps_are_authoritative() {
    let cfg = parse(sample_json());
    assert_eq!(cfg.resolve_total_steps(1024).unwrap(), 3);

    let mut v = sample_json();
    v["total_steps"] = serde_json::Value::Null;
    assert_eq!(parse(v).resolve_total_steps(1024).unwrap(), 51);
}

#[test]
fn round_trips_through_project_dir() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = parse(sample_json());
    cfg.write(&dir.path().join(CONFIG_FILENAME)).unwrap();
    let loaded = ProjectConfig::from_project_dir(dir.path()).unwrap();
    assert_eq!(loaded.project_name, "lake");
    assert_eq!(loaded.total_steps, Some(3));
}

#[test]
fn resolve_path_keeps_absolute() {
    let root = Path::new("/proj");
    assert_eq!(resolve_path(root, Path::new("a.png")), PathBuf::from("/proj/a.png"));
    assert_eq!(resolve_path(root, Path::new("/abs/a.png")), PathBuf::from("/abs/a.png"));
}
