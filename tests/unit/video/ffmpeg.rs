use super::*;

fn cfg(width: u32, height: u32) -> SinkConfig {
    SinkConfig {
        width,
        height,
        fps: Fps::new(24, 1).unwrap(),
    }
}

#[test]
fn sink_config_requires_even_nonzero_dimensions() {
    assert!(validate_sink_config(&cfg(0, 10)).is_err());
    assert!(validate_sink_config(&cfg(11, 10)).is_err());
    assert!(validate_sink_config(&cfg(10, 7)).is_err());
    assert!(validate_sink_config(&cfg(1024, 240)).is_ok());
}

#[test]
fn flatten_straight_over_black_produces_expected_rgb() {
    // Straight red @ 50% alpha => rgb becomes 128,0,0 over black.
    let src = vec![255u8, 0, 0, 128];
    let mut dst = vec![0u8; 4];
    flatten_straight_over_bg(&mut dst, &src, [0, 0, 0, 255]).unwrap();
    assert_eq!(dst, vec![128, 0, 0, 255]);
}

#[test]
fn flatten_transparent_pixel_shows_background() {
    let src = vec![9u8, 9, 9, 0, 1, 2, 3, 255];
    let mut dst = vec![0u8; 8];
    flatten_straight_over_bg(&mut dst, &src, [10, 20, 30, 255]).unwrap();
    assert_eq!(dst, vec![10, 20, 30, 255, 1, 2, 3, 255]);
}

#[test]
fn flatten_rejects_mismatched_buffers() {
    let mut dst = vec![0u8; 4];
    assert!(flatten_straight_over_bg(&mut dst, &[0u8; 8], [0, 0, 0, 255]).is_err());
}

#[test]
fn push_before_begin_is_rejected() {
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new("unused.mp4"));
    let frame = RgbaImage::new(2, 2);
    assert!(matches!(
        sink.push_frame(0, &frame),
        Err(ParallaxError::Validation(_))
    ));
    assert!(sink.end().is_err());
}
