use std::io::Cursor;
use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use imgfit::{
    InputKind, Job, OutputFormat, Pipeline, PlacementMode, RasterImage, Rgba8, TargetSize,
};

const BG: Rgba8 = Rgba8::rgb(0, 0, 255);

fn job(mode: PlacementMode, w: u32, h: u32) -> Job {
    Job {
        size: TargetSize::exact(w, h),
        mode,
        background: BG,
        jpeg_quality: 85,
        out_dir: PathBuf::from("unused"),
        threads: None,
    }
}

fn png_bytes(img: RgbaImage) -> Vec<u8> {
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn red_100x50() -> Vec<u8> {
    png_bytes(RgbaImage::from_pixel(100, 50, Rgba([255, 0, 0, 255])))
}

fn is_red(px: Rgba8) -> bool {
    px.r > 200 && px.g < 50 && px.b < 50
}

#[test]
fn scenario_a_fit_matches_limiting_axis() {
    let p = Pipeline::new(job(PlacementMode::Fit, 200, 200));
    let out = p
        .process_bytes(&red_100x50(), InputKind::Raster, OutputFormat::Png, None)
        .unwrap();
    let img = image::load_from_memory(&out).unwrap();
    assert_eq!((img.width(), img.height()), (200, 100));
}

#[test]
fn scenario_b_pad_letterboxes_with_exact_background() {
    let p = Pipeline::new(job(PlacementMode::Pad, 200, 200));
    let seq = p.render(&red_100x50(), InputKind::Raster, None).unwrap();
    let img = &seq.first().image;
    assert_eq!(img.dimensions(), (200, 200));

    for y in (0..50).chain(150..200) {
        for x in 0..200 {
            assert_eq!(img.pixel(x, y), Some(BG), "({x}, {y})");
        }
    }
    for y in 50..150 {
        for x in 0..200 {
            assert!(is_red(img.pixel(x, y).unwrap()), "({x}, {y})");
        }
    }
}

#[test]
fn scenario_c_fill_crops_center_of_cover() {
    let t = imgfit::TargetBox::new(200, 200, BG).unwrap();
    assert_eq!(
        imgfit::render::transform::plan(PlacementMode::Fill, (100, 50), &t),
        imgfit::render::transform::Placement::CoverCrop {
            scaled: (400, 200),
            left: 100,
            top: 0,
        }
    );

    // Green left quarter, red middle half, blue right quarter: after the 4x cover scale only the
    // red band survives the crop.
    let src = RgbaImage::from_fn(100, 50, |x, _| match x {
        0..25 => Rgba([0, 255, 0, 255]),
        25..75 => Rgba([255, 0, 0, 255]),
        _ => Rgba([0, 0, 255, 255]),
    });
    let p = Pipeline::new(job(PlacementMode::Fill, 200, 200));
    let seq = p.render(&png_bytes(src), InputKind::Raster, None).unwrap();
    let img = &seq.first().image;
    assert_eq!(img.dimensions(), (200, 200));
    for y in [0, 100, 199] {
        for x in 20..180 {
            assert!(is_red(img.pixel(x, y).unwrap()), "({x}, {y})");
        }
    }
}

#[test]
fn scenario_d_empty_source_is_blank_canvas() {
    for mode in PlacementMode::ALL {
        let p = Pipeline::new(job(mode, 30, 20));
        for kind in [InputKind::Raster, InputKind::Animated, InputKind::Vector] {
            let seq = p.render(&[], kind, None).unwrap();
            let img = &seq.first().image;
            assert_eq!(img.dimensions(), (30, 20), "{mode} {kind:?}");
            assert!(img.data().chunks_exact(4).all(|px| px == BG.to_array()));
        }
    }
}

#[test]
fn scenario_e_gif_timing_and_loop_survive() {
    let mut input = Vec::new();
    {
        let mut enc = gif::Encoder::new(&mut input, 40, 30, &[]).unwrap();
        enc.set_repeat(gif::Repeat::Infinite).unwrap();
        for (i, delay) in [8u16, 8, 12, 8].into_iter().enumerate() {
            let shade = (i as u8) * 60;
            let mut px = [shade, 255 - shade, 0, 255].repeat(40 * 30);
            let mut frame = gif::Frame::from_rgba_speed(40, 30, &mut px, 10);
            frame.delay = delay;
            enc.write_frame(&frame).unwrap();
        }
    }

    for mode in PlacementMode::ALL {
        let p = Pipeline::new(job(mode, 64, 64));
        let out = p
            .process_bytes(&input, InputKind::Animated, OutputFormat::Gif, None)
            .unwrap();
        let back = imgfit::assets::decode::decode_gif(&out).unwrap();
        assert_eq!(back.len(), 4, "{mode}");
        let durations: Vec<u32> = back.frames().iter().map(|f| f.duration_ms).collect();
        assert_eq!(durations, vec![80, 80, 120, 80], "{mode}");
        assert_eq!(back.loop_count(), 0, "{mode}");
        assert!(back.is_uniform());
    }
}

#[test]
fn jpeg_output_never_has_alpha() {
    let src = png_bytes(RgbaImage::from_pixel(10, 10, Rgba([255, 255, 255, 0])));
    let p = Pipeline::new(job(PlacementMode::Stretch, 16, 16));
    let out = p
        .process_bytes(&src, InputKind::Raster, OutputFormat::Jpeg, None)
        .unwrap();
    let img = image::load_from_memory_with_format(&out, image::ImageFormat::Jpeg).unwrap();
    assert!(!img.color().has_alpha());
    let px = img.to_rgb8().get_pixel(8, 8).0;
    // Fully transparent source shows the background.
    assert!(px[2] > 200 && px[0] < 50, "{px:?}");
}

#[test]
fn png_output_keeps_alpha() {
    let src = png_bytes(RgbaImage::from_pixel(10, 10, Rgba([255, 0, 0, 100])));
    let p = Pipeline::new(job(PlacementMode::Stretch, 10, 10));
    let out = p
        .process_bytes(&src, InputKind::Raster, OutputFormat::Png, None)
        .unwrap();
    let img = image::load_from_memory(&out).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(5, 5).0, [255, 0, 0, 100]);
}

#[test]
fn animated_source_to_png_keeps_first_frame() {
    let frames = vec![
        imgfit::Frame::new(RasterImage::filled(4, 4, Rgba8::rgb(255, 0, 0)), 50),
        imgfit::Frame::new(RasterImage::filled(4, 4, Rgba8::rgb(0, 255, 0)), 50),
    ];
    let seq = imgfit::FrameSequence::new(frames, 0).unwrap();
    let out = imgfit::encode(&seq, &imgfit::OutputSpec::new(OutputFormat::Png)).unwrap();
    let img = image::load_from_memory(&out).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(0, 0).0, [255, 0, 0, 255]);
}

#[cfg(feature = "svg")]
const RED_SQUARE_SVG: &[u8] = br##"<svg xmlns="http://www.w3.org/2000/svg" width="10" height="10">
  <rect width="10" height="10" fill="#ff0000"/>
</svg>"##;

#[cfg(feature = "svg")]
#[test]
fn svg_pad_letterboxes_with_background() {
    let p = Pipeline::new(job(PlacementMode::Pad, 48, 32));
    let out = p
        .process_bytes(RED_SQUARE_SVG, InputKind::Vector, OutputFormat::Png, None)
        .unwrap();
    let img = image::load_from_memory(&out).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (48, 32));
    assert_eq!(img.get_pixel(24, 16).0, [255, 0, 0, 255]);
    for y in [0, 16, 31] {
        for x in (0..8).chain(40..48) {
            assert_eq!(img.get_pixel(x, y).0, [0, 0, 255, 255], "border ({x},{y})");
        }
        for x in 9..39 {
            assert_eq!(img.get_pixel(x, y).0, [255, 0, 0, 255], "content ({x},{y})");
        }
    }
}

#[cfg(feature = "svg")]
#[test]
fn svg_fill_covers_without_background() {
    let p = Pipeline::new(job(PlacementMode::Fill, 48, 32));
    let out = p
        .process_bytes(RED_SQUARE_SVG, InputKind::Vector, OutputFormat::Png, None)
        .unwrap();
    let img = image::load_from_memory(&out).unwrap().to_rgba8();
    assert_eq!(img.dimensions(), (48, 32));
    assert!(img.pixels().all(|p| p.0 == [255, 0, 0, 255]));
}

#[cfg(feature = "svg")]
#[test]
fn svg_stretch_covers_the_whole_box() {
    let p = Pipeline::new(job(PlacementMode::Stretch, 48, 32));
    let out = p
        .process_bytes(RED_SQUARE_SVG, InputKind::Vector, OutputFormat::Png, None)
        .unwrap();
    let img = image::load_from_memory(&out).unwrap().to_rgba8();
    assert_eq!(img.get_pixel(0, 16).0, [255, 0, 0, 255]);
    assert_eq!(img.get_pixel(47, 16).0, [255, 0, 0, 255]);
}
