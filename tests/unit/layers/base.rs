use image::Rgba;

use super::*;

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 7, 255])
    })
}

fn layer(dirs: &ProjectDirs, width: u32, height: u32, vx: i32, steps: usize) -> BaseLayer {
    let segment = Segment {
        top: 0,
        image: gradient(width, height),
    };
    BaseLayer::new(1, segment, Velocity::new(vx, 0), steps, dirs)
}

#[test]
fn push_step_is_append_only() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = ProjectDirs::new(dir.path());
    let mut l = layer(&dirs, 8, 2, -2, 2);
    let step = |i| StepImage {
        step_index: i,
        handle: ImageHandle::from_path(format!("s{i}.png")),
    };
    l.push_step(step(1)).unwrap();
    assert!(l.push_step(step(3)).is_err());
    assert!(l.push_step(step(1)).is_err());
    l.push_step(step(2)).unwrap();
    assert_eq!(l.step_outputs().len(), 2);
}

#[test]
fn collect_reports_missing_step_as_missing_asset() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = ProjectDirs::new(dir.path());
    let mut l = layer(&dirs, 8, 2, -2, 2);
    save_png(&gradient(8, 2), &dirs.step_output_path("layer_1", 1)).unwrap();
    save_png(&gradient(8, 2), &dirs.step_output_path("layer_1", 2)).unwrap();

    let err = l.collect_step_outputs(&dirs).unwrap_err();
    match err {
        ParallaxError::MissingAsset { path, layer } => {
            assert_eq!(layer, "layer_1");
            assert_eq!(path, dirs.step_output_path("layer_1", 3));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn collect_rejects_steps_beyond_configured_count() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = ProjectDirs::new(dir.path());
    let mut l = layer(&dirs, 8, 2, -2, 1);
    for s in 1..=4 {
        save_png(&gradient(8, 2), &dirs.step_output_path("layer_1", s)).unwrap();
    }
    match l.collect_step_outputs(&dirs) {
        Err(ParallaxError::StepCountMismatch {
            layer,
            expected,
            found,
        }) => {
            assert_eq!(layer, "layer_1");
            assert_eq!(expected, 2);
            assert_eq!(found, 4);
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn stitch_drops_first_step_and_saves_outputs() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = ProjectDirs::new(dir.path());
    let mut l = layer(&dirs, 32, 4, -12, 3);
    for s in 1..=4 {
        let img = RgbaImage::from_pixel(32, 4, Rgba([s as u8 * 10, 0, 0, 255]));
        l.record_step(&dirs, s, img).unwrap();
    }

    let engine = LayerGeometryEngine::new(4);
    let ribbon = l.stitch(&engine, &dirs).unwrap();
    assert_eq!(ribbon.slide_distance, 3 * (12 - 4));
    assert_eq!(ribbon.image.width(), 32 + 3 * 12 - 3 * 4);
    // The last column comes from the last step's strip, never from step 1.
    assert_eq!(ribbon.image.get_pixel(ribbon.image.width() - 1, 0)[0], 40);

    assert!(dirs.cropped_path("layer_1", 2).exists());
    assert!(dirs.cropped_path("layer_1", 4).exists());
    assert!(!dirs.cropped_path("layer_1", 1).exists());
    assert!(dirs.ribbon_path("layer_1").exists());
    assert_eq!(l.slide_distance(), Some(24));
}

#[test]
fn static_layer_ribbon_is_its_original() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = ProjectDirs::new(dir.path());
    let mut l = layer(&dirs, 16, 2, 0, 2);
    for s in 1..=3 {
        l.record_step(&dirs, s, gradient(16, 2)).unwrap();
    }
    let ribbon = l.stitch(&LayerGeometryEngine::new(8), &dirs).unwrap();
    assert_eq!(ribbon.slide_distance, 0);
    assert_eq!(ribbon.image.width(), 16);
}

#[test]
fn stitch_with_too_few_steps_is_missing_asset() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = ProjectDirs::new(dir.path());
    let mut l = layer(&dirs, 16, 2, -4, 3);
    l.record_step(&dirs, 1, gradient(16, 2)).unwrap();
    assert!(matches!(
        l.stitch(&LayerGeometryEngine::new(2), &dirs),
        Err(ParallaxError::MissingAsset { .. })
    ));
}

#[test]
fn saved_ribbon_reloads_with_same_slide() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = ProjectDirs::new(dir.path());
    let mut l = layer(&dirs, 20, 2, -6, 2);
    for s in 1..=3 {
        l.record_step(&dirs, s, gradient(20, 2)).unwrap();
    }
    let engine = LayerGeometryEngine::new(2);
    let stitched = l.stitch(&engine, &dirs).unwrap().clone();

    let mut fresh = layer(&dirs, 20, 2, -6, 2);
    let loaded = fresh.load_ribbon(&dirs).unwrap();
    assert_eq!(loaded.slide_distance, stitched.slide_distance);
    assert_eq!(loaded.image, stitched.image);
}

#[test]
fn clip_requires_a_ribbon() {
    let dir = tempfile::tempdir().unwrap();
    let dirs = ProjectDirs::new(dir.path());
    let l = layer(&dirs, 8, 2, -2, 1);
    assert!(l.clip(1.0).is_err());
    assert_eq!(l.kind(), LayerKind::Base);
    assert_eq!(l.visible_width(), 8);
}
