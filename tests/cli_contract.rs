use std::fs;
use std::path::Path;
use std::process::Command;

use image::{Rgba, RgbaImage};
use serde_json::Value;
use tempfile::tempdir;

fn run_glyphdrift(cwd: &Path, args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_glyphdrift"))
        .current_dir(cwd)
        .args(args)
        .output()
        .expect("glyphdrift command should run")
}

fn write_png(path: &Path, width: u32, height: u32, pixel: impl Fn(u32, u32) -> [u8; 3]) {
    let image = RgbaImage::from_fn(width, height, |x, y| {
        let [r, g, b] = pixel(x, y);
        Rgba([r, g, b, 255])
    });
    image.save(path).expect("png should write");
}

#[test]
fn sample_prints_grid_of_requested_shape() {
    let dir = tempdir().expect("tempdir should create");
    write_png(&dir.path().join("gradient.png"), 64, 32, |x, _| {
        let level = (x * 4) as u8;
        [level, level, level]
    });

    let output = run_glyphdrift(
        dir.path(),
        &["sample", "gradient.png", "--rows", "4", "--cols", "16"],
    );
    assert!(output.status.success(), "sample should succeed: {:?}", output);

    let stdout = String::from_utf8(output.stdout).expect("stdout utf8");
    let lines = stdout.lines().collect::<Vec<_>>();
    assert_eq!(lines.len(), 4);
    for line in &lines {
        assert_eq!(line.chars().count(), 16, "line {line:?}");
    }
    // Dark on the left, light on the right.
    assert!(lines[0].starts_with('@'));
    assert!(lines[0].ends_with(' ') || lines[0].ends_with('.'));
}

#[test]
fn sample_json_reports_dimensions_and_lines() {
    let dir = tempdir().expect("tempdir should create");
    write_png(&dir.path().join("black.png"), 5, 5, |_, _| [0, 0, 0]);

    let output = run_glyphdrift(
        dir.path(),
        &["sample", "black.png", "--rows", "2", "--cols", "3", "--json"],
    );
    assert!(output.status.success(), "sample --json should succeed");

    let json: Value = serde_json::from_slice(&output.stdout).expect("stdout should be json");
    assert_eq!(json["rows"], 2);
    assert_eq!(json["cols"], 3);
    assert_eq!(json["lines"], serde_json::json!(["@@@", "@@@"]));
}

#[test]
fn sample_invert_swaps_dense_and_sparse() {
    let dir = tempdir().expect("tempdir should create");
    write_png(&dir.path().join("white.png"), 4, 4, |_, _| [255, 255, 255]);

    let output = run_glyphdrift(
        dir.path(),
        &["sample", "white.png", "--rows", "1", "--cols", "4", "--invert"],
    );
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "@@@@\n");
}

#[test]
fn sample_of_unreadable_image_fails_with_context() {
    let dir = tempdir().expect("tempdir should create");
    fs::write(dir.path().join("broken.png"), b"not a png").expect("file should write");

    let output = run_glyphdrift(dir.path(), &["sample", "broken.png"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to sample"), "stderr: {stderr}");
    assert!(stderr.contains("decode"), "stderr: {stderr}");
}

#[test]
fn sample_rejects_zero_dimensions() {
    let dir = tempdir().expect("tempdir should create");
    write_png(&dir.path().join("black.png"), 2, 2, |_, _| [0, 0, 0]);

    let output = run_glyphdrift(dir.path(), &["sample", "black.png", "--rows", "0"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("grid dimensions must be positive"));
}

#[test]
fn check_accepts_valid_config() {
    let dir = tempdir().expect("tempdir should create");
    fs::write(
        dir.path().join("backdrop.yaml"),
        "rows: 30\ncols: 80\nimages:\n  - a.png\n  - https://example.com/b.jpeg\n",
    )
    .expect("config should write");

    let output = run_glyphdrift(dir.path(), &["check", "backdrop.yaml"]);
    assert!(output.status.success(), "check should succeed: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("OK: backdrop.yaml (80x30 glyphs"), "stdout: {stdout}");
    assert!(stdout.contains("Images: 2"));
}

#[test]
fn check_rejects_empty_catalog() {
    let dir = tempdir().expect("tempdir should create");
    fs::write(dir.path().join("backdrop.yaml"), "images: []\n").expect("config should write");

    let output = run_glyphdrift(dir.path(), &["check", "backdrop.yaml"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not a valid backdrop config"), "stderr: {stderr}");
    assert!(stderr.contains("at least one source"), "stderr: {stderr}");
}

#[test]
fn sources_lists_catalog_in_rotation_order() {
    let dir = tempdir().expect("tempdir should create");
    let output = run_glyphdrift(
        dir.path(),
        &["sources", "https://example.com/one.jpeg", "two.png"],
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("2 source(s)"));
    let first = stdout
        .find("* #0   remote https://example.com/one.jpeg")
        .expect("first entry listed");
    let second = stdout.find("  #1   local  two.png").expect("second entry listed");
    assert!(first < second);
}

#[test]
fn run_plays_local_images_for_a_bounded_time() {
    let dir = tempdir().expect("tempdir should create");
    write_png(&dir.path().join("black.png"), 8, 8, |_, _| [0, 0, 0]);

    let output = run_glyphdrift(
        dir.path(),
        &[
            "run",
            "black.png",
            "--rows",
            "2",
            "--cols",
            "6",
            "--tick-ms",
            "5",
            "--seed",
            "3",
            "--duration-secs",
            "1",
        ],
    );
    assert!(output.status.success(), "run should exit cleanly: {:?}", output);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\x1b[H"));
    assert!(stdout.contains("@@@@@@\n@@@@@@"), "stdout: {stdout:?}");
}
