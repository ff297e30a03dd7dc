use std::path::PathBuf;

use image::{Rgba, RgbaImage};
use imgfit::{Pipeline, ResizeConfig, run_batch, run_job};

#[test]
fn bad_files_do_not_stop_the_batch() {
    let tmp = tempfile::tempdir().unwrap();
    let in_dir = tmp.path().join("in");
    std::fs::create_dir_all(&in_dir).unwrap();
    let out_dir = tmp.path().join("nested").join("out");

    let good_png = in_dir.join("good.png");
    RgbaImage::from_pixel(20, 10, Rgba([10, 200, 10, 255]))
        .save(&good_png)
        .unwrap();
    let good_jpg = in_dir.join("photo.JPEG");
    image::DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([1, 2, 3, 255])))
        .to_rgb8()
        .save_with_format(&good_jpg, image::ImageFormat::Jpeg)
        .unwrap();
    let odd = in_dir.join("scan.bmp");
    RgbaImage::from_pixel(5, 5, Rgba([9, 9, 9, 255]))
        .save_with_format(&odd, image::ImageFormat::Bmp)
        .unwrap();
    let garbage = in_dir.join("broken.png");
    std::fs::write(&garbage, b"not a png at all").unwrap();
    let missing = in_dir.join("missing.gif");

    let job = ResizeConfig {
        width: Some(16),
        height: Some(16),
        out_dir: Some(out_dir.clone()),
        threads: Some(2),
        ..Default::default()
    }
    .validate()
    .unwrap();

    let inputs: Vec<PathBuf> = vec![
        good_png.clone(),
        garbage.clone(),
        missing.clone(),
        good_jpg.clone(),
        odd.clone(),
    ];
    let report = run_batch(&Pipeline::new(job), &inputs).unwrap();

    assert_eq!(report.files.len(), 5);
    let order: Vec<&PathBuf> = report.files.iter().map(|f| &f.input).collect();
    assert_eq!(order, inputs.iter().collect::<Vec<_>>());
    assert_eq!(report.succeeded(), 3);
    assert_eq!(report.failed(), 2);

    assert!(matches!(
        report.files[1].outcome,
        Err(imgfit::ImgfitError::UnsupportedFormat(_))
    ));
    assert!(matches!(
        report.files[2].outcome,
        Err(imgfit::ImgfitError::InputNotFound(_))
    ));

    let png_out = out_dir.join("good.png");
    assert_eq!(report.files[0].outcome.as_ref().unwrap(), &png_out);
    let img = image::open(&png_out).unwrap();
    assert_eq!((img.width(), img.height()), (16, 16));

    let jpg_out = out_dir.join("photo.jpeg");
    assert_eq!(
        image::ImageFormat::from_path(&jpg_out).unwrap(),
        image::ImageFormat::Jpeg
    );
    assert!(jpg_out.exists());

    assert!(out_dir.join("scan.png").exists());
}

#[test]
fn inputs_sharing_a_stem_each_keep_their_output() {
    let tmp = tempfile::tempdir().unwrap();
    let out_dir = tmp.path().join("out");
    let mut inputs = Vec::new();
    for (dir, color) in [("x", [255, 0, 0, 255]), ("y", [0, 255, 0, 255])] {
        let d = tmp.path().join(dir);
        std::fs::create_dir_all(&d).unwrap();
        let p = d.join("a.png");
        RgbaImage::from_pixel(12, 12, Rgba(color)).save(&p).unwrap();
        inputs.push(p);
    }
    let bmp = tmp.path().join("x").join("a.bmp");
    RgbaImage::from_pixel(3, 3, Rgba([0, 0, 255, 255]))
        .save_with_format(&bmp, image::ImageFormat::Bmp)
        .unwrap();
    inputs.push(bmp);

    let job = ResizeConfig {
        width: Some(6),
        height: Some(6),
        out_dir: Some(out_dir.clone()),
        threads: Some(3),
        ..Default::default()
    }
    .validate()
    .unwrap();
    let report = run_job(&job, &inputs).unwrap();
    assert!(report.is_success());

    let outputs: Vec<PathBuf> = report
        .files
        .iter()
        .map(|f| f.outcome.as_ref().unwrap().clone())
        .collect();
    assert_eq!(
        outputs,
        vec![
            out_dir.join("a.png"),
            out_dir.join("a-2.png"),
            out_dir.join("a-3.png")
        ]
    );
    // Each output carries its own source's color.
    for (out, channel) in outputs.iter().zip([0, 1, 2]) {
        let px = image::open(out).unwrap().to_rgba8().get_pixel(3, 3).0;
        for c in 0..3 {
            if c == channel {
                assert!(px[c] > 240, "{}: {px:?}", out.display());
            } else {
                assert!(px[c] < 15, "{}: {px:?}", out.display());
            }
        }
    }
}

#[test]
fn configuration_errors_surface_before_any_file() {
    let tmp = tempfile::tempdir().unwrap();
    let out_dir = tmp.path().join("never");
    let err = ResizeConfig {
        width: Some(-1),
        height: Some(10),
        out_dir: Some(out_dir.clone()),
        ..Default::default()
    }
    .validate()
    .unwrap_err();
    assert!(err.is_config_error());
    assert!(!out_dir.exists());
}
