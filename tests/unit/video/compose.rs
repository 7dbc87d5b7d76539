use image::{Luma, Rgba};

use super::*;
use crate::geometry::engine::Ribbon;
use crate::video::sink::InMemorySink;

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn solid_clip(name: &str, width: u32, height: u32, px: Rgba<u8>, top: u32) -> LayerClip {
    let ribbon = Ribbon {
        image: RgbaImage::from_pixel(width, height, px),
        slide_distance: 0,
    };
    LayerClip::new(name, &ribbon, width, top, 1.0).unwrap()
}

#[test]
fn base_clips_stack_at_band_offsets() {
    let clips = vec![
        solid_clip("layer_1", 4, 2, RED, 0),
        solid_clip("layer_2", 4, 2, BLUE, 2),
    ];
    let canvas = Canvas {
        width: 4,
        height: 4,
    };
    let frame = compose_frame(&clips, canvas, 0.0, [0, 0, 0, 255]);
    assert_eq!(*frame.get_pixel(0, 0), RED);
    assert_eq!(*frame.get_pixel(3, 1), RED);
    assert_eq!(*frame.get_pixel(0, 2), BLUE);
    assert_eq!(*frame.get_pixel(3, 3), BLUE);
}

#[test]
fn object_clips_draw_through_mask_over_bases() {
    let ribbon = Ribbon {
        image: RgbaImage::from_pixel(4, 4, WHITE),
        slide_distance: 0,
    };
    let mask = GrayImage::from_fn(4, 4, |x, y| Luma([if x == 1 && y == 1 { 255 } else { 0 }]));
    let object = LayerClip::new("object_1", &ribbon, 4, 0, 1.0)
        .unwrap()
        .with_mask(mask)
        .unwrap();
    // Object listed first still lands above the base layer.
    let clips = vec![object, solid_clip("layer_1", 4, 4, RED, 0)];
    let canvas = Canvas {
        width: 4,
        height: 4,
    };
    let frame = compose_frame(&clips, canvas, 0.0, [0, 0, 0, 255]);
    assert_eq!(*frame.get_pixel(1, 1), WHITE);
    assert_eq!(*frame.get_pixel(0, 0), RED);
    assert_eq!(*frame.get_pixel(2, 1), RED);
}

#[test]
fn transparent_pixels_reveal_background() {
    let ribbon = Ribbon {
        image: RgbaImage::new(2, 2),
        slide_distance: 0,
    };
    let clips = vec![LayerClip::new("layer_1", &ribbon, 2, 0, 1.0).unwrap()];
    let canvas = Canvas {
        width: 2,
        height: 3,
    };
    let frame = compose_frame(&clips, canvas, 0.0, [10, 20, 30, 255]);
    assert_eq!(frame.get_pixel(0, 0).0, [10, 20, 30, 255]);
    assert_eq!(frame.get_pixel(1, 2).0, [10, 20, 30, 255]);
}

#[test]
fn render_video_pushes_rounded_frame_count() {
    let ribbon = Ribbon {
        image: RgbaImage::from_fn(14, 2, |x, _| Rgba([x as u8, 0, 0, 255])),
        slide_distance: 4,
    };
    let clips = vec![LayerClip::new("layer_1", &ribbon, 10, 0, 1.5).unwrap()];
    let canvas = Canvas {
        width: 10,
        height: 2,
    };
    let mut sink = InMemorySink::new();
    let fps = Fps::new(4, 1).unwrap();
    let n = render_video(&clips, canvas, fps, 1.5, [0, 0, 0, 255], &mut sink).unwrap();
    assert_eq!(n, 6);
    assert!(sink.is_finished());
    assert_eq!(sink.config().unwrap().width, 10);
    let frames = sink.frames();
    assert_eq!(frames.len(), 6);
    assert_eq!(frames[0].0, 0);
    assert_eq!(frames[0].1.get_pixel(0, 0)[0], 0);
    // Frame 3 samples t = 0.75, halfway through a 4px slide.
    assert_eq!(frames[3].1.get_pixel(0, 0)[0], 2);
}

#[test]
fn render_video_rejects_empty_stack() {
    let mut sink = InMemorySink::new();
    let canvas = Canvas {
        width: 2,
        height: 2,
    };
    let fps = Fps::new(24, 1).unwrap();
    assert!(render_video(&[], canvas, fps, 1.0, [0, 0, 0, 255], &mut sink).is_err());
}
