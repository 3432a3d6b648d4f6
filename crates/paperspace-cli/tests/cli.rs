use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;

fn write_config(dir: &Path) -> std::path::PathBuf {
    fs::write(
        dir.join("calibration.json"),
        r#"{
            "camera_size": [640, 480],
            "projection_size": [640, 480],
            "projection_corners_on_camera": [[0, 0], [640, 0], [640, 480], [0, 480]]
        }"#,
    )
    .unwrap();
    fs::write(
        dir.join("papers.json"),
        r#"[
            {"id": 1, "type": "portal-in", "markers": [1, 2, 3, 4]},
            {"id": 2, "type": "portal-out", "markers": [5, 6, 7, 8]},
            {"id": 3, "type": "video", "markers": [11, 12, 13, 14],
             "video_file": "missing.mp4", "video_size": [640, 360]},
            {"id": 4, "type": "shortcut-button", "markers": [9], "topic": "desk/button"},
            {"id": 5, "type": "portal-in", "markers": [1, 2]}
        ]"#,
    )
    .unwrap();
    let app = dir.join("paperspace.json");
    fs::write(
        &app,
        r#"{"calibration": "calibration.json", "papers": "papers.json"}"#,
    )
    .unwrap();
    app
}

fn square(ids: [u32; 4], x: f32, y: f32, size: f32) -> Vec<Value> {
    let anchors = [(x, y), (x + size, y), (x + size, y + size), (x, y + size)];
    ids.iter()
        .zip(anchors)
        .map(|(id, (ax, ay))| {
            serde_json::json!({
                "id": id,
                "corners": [[ax, ay], [ax + 5.0, ay], [ax + 5.0, ay + 5.0], [ax, ay + 5.0]]
            })
        })
        .collect()
}

fn write_frames(dir: &Path) -> std::path::PathBuf {
    let mut both = square([1, 2, 3, 4], 0.0, 0.0, 100.0);
    both.extend(square([5, 6, 7, 8], 300.0, 0.0, 100.0));
    let video = square([11, 12, 13, 14], 0.0, 300.0, 100.0);
    let frames = serde_json::json!([
        {"t": 0.0, "detections": square([1, 2, 3, 4], 0.0, 0.0, 100.0)},
        {"t": 0.033, "detections": both},
        {"t": 0.066, "detections": video},
        {"t": 0.1, "detections": []}
    ]);
    let path = dir.join("frames.json");
    fs::write(&path, serde_json::to_string_pretty(&frames).unwrap()).unwrap();
    path
}

#[test]
fn check_lists_accepted_and_skipped_papers() {
    let dir = tempfile::tempdir().unwrap();
    let app = write_config(dir.path());

    Command::cargo_bin("paperspace")
        .unwrap()
        .args(["--log-level", "off", "check", "--config"])
        .arg(&app)
        .assert()
        .success()
        .stdout(predicate::str::contains("paper 1: portal-in on RectShape(1,2,3,4)"))
        .stdout(predicate::str::contains("paper 4: shortcut-button on SingleShape(9)"))
        .stdout(predicate::str::contains("skipped: paper 5 (portal-in) needs 4 markers, got 2"))
        .stdout(predicate::str::contains("4 papers, 1 skipped"));
}

#[cfg(not(feature = "tracing"))]
#[test]
fn stderr_logger_reports_at_the_requested_level() {
    let dir = tempfile::tempdir().unwrap();
    let app = write_config(dir.path());

    Command::cargo_bin("paperspace")
        .unwrap()
        .args(["--log-level", "info", "check", "--config"])
        .arg(&app)
        .assert()
        .success()
        .stderr(predicate::str::contains("INFO paperspace::session] loaded 4 papers"))
        .stderr(predicate::str::contains("WARN paperspace::config]"));
}

#[test]
fn replay_writes_a_frame_report() {
    let dir = tempfile::tempdir().unwrap();
    let app = write_config(dir.path());
    let frames = write_frames(dir.path());
    let out = dir.path().join("report.json");

    Command::cargo_bin("paperspace")
        .unwrap()
        .args(["--log-level", "off", "replay", "--config"])
        .arg(&app)
        .arg("--frames")
        .arg(&frames)
        .arg("--out")
        .arg(&out)
        .assert()
        .success();

    let report: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let frames = report["frames"].as_array().unwrap();
    assert_eq!(frames.len(), 4);

    assert_eq!(frames[0]["visible"], serde_json::json!([1]));
    assert_eq!(frames[0]["draw_count"], 2);

    // Portal out: outer quad and the camera-less black window.
    assert_eq!(frames[1]["visible"], serde_json::json!([1, 2]));
    assert_eq!(frames[1]["draw_count"], 4);

    // The video file does not exist: faulted, drawn as one indicator quad.
    assert_eq!(frames[2]["visible"], serde_json::json!([3]));
    assert_eq!(frames[2]["faulted"], serde_json::json!([3]));
    assert_eq!(frames[2]["draw_count"], 1);

    assert_eq!(frames[3]["visible"], serde_json::json!([]));
    assert_eq!(report["skipped"].as_array().unwrap().len(), 1);
}

#[test]
fn replay_can_include_draw_commands() {
    let dir = tempfile::tempdir().unwrap();
    let app = write_config(dir.path());
    let frames = write_frames(dir.path());

    Command::cargo_bin("paperspace")
        .unwrap()
        .args(["--log-level", "off", "replay", "--draws", "--config"])
        .arg(&app)
        .arg("--frames")
        .arg(&frames)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"uvq\""))
        .stdout(predicate::str::contains("\"kind\": \"solid\""));
}

#[test]
fn replay_rejects_backwards_timestamps() {
    let dir = tempfile::tempdir().unwrap();
    let app = write_config(dir.path());
    let frames = dir.path().join("frames.json");
    fs::write(&frames, r#"[{"t": 1.0}, {"t": 0.5}]"#).unwrap();

    Command::cargo_bin("paperspace")
        .unwrap()
        .args(["--log-level", "off", "replay", "--config"])
        .arg(&app)
        .arg("--frames")
        .arg(&frames)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Backwards"));
}

#[test]
fn missing_config_fails() {
    Command::cargo_bin("paperspace")
        .unwrap()
        .args(["check", "--config", "/nonexistent/paperspace.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("/nonexistent/paperspace.json"));
}
