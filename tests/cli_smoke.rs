use std::path::PathBuf;

use frameblend::{Frame, FrameFormat, load_frame, save_frame};

fn exe() -> PathBuf {
    std::env::var_os("CARGO_BIN_EXE_frameblend")
        .map(PathBuf::from)
        .unwrap_or_else(|| {
            let mut p = PathBuf::from("target").join("debug");
            p.push(if cfg!(windows) {
                "frameblend.exe"
            } else {
                "frameblend"
            });
            p
        })
}

#[test]
fn cli_blend_writes_sequence() {
    let dir = PathBuf::from("target").join("cli_smoke");
    let in_dir = dir.join("in");
    let out_dir = dir.join("out");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&in_dir).unwrap();

    for (i, v) in [10u64, 20, 30].iter().enumerate() {
        let f = Frame::filled(FrameFormat::rgb8(), 8, 4, *v).unwrap();
        save_frame(&f, &in_dir.join(format!("src_{i}.png"))).unwrap();
    }

    let status = std::process::Command::new(exe())
        .args(["blend", "--in-dir"])
        .arg(&in_dir)
        .arg("--out-dir")
        .arg(&out_dir)
        .args(["--weights", "1,1,1", "--parallel", "--threads", "2"])
        .status()
        .unwrap();
    assert!(status.success());

    let middle = load_frame(&out_dir.join("frame_000001.png")).unwrap();
    assert_eq!(middle.sample(0, 0, 0), 20);
    assert!(out_dir.join("frame_000002.png").exists());
}

#[test]
fn cli_plan_prints_window() {
    let out = std::process::Command::new(exe())
        .args(["plan", "--frame", "0", "--weights", "1,1,1,1,1"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["window"], serde_json::json!([0, 0, 0, 1, 2]));
}

#[test]
fn cli_rejects_even_weights() {
    let out = std::process::Command::new(exe())
        .args(["plan", "--frame", "0", "--weights", "1,1"])
        .output()
        .unwrap();
    assert!(!out.status.success());
}

#[test]
fn cli_config_file_drives_blend() {
    let dir = PathBuf::from("target").join("cli_smoke_config");
    let in_dir = dir.join("in");
    let out_dir = dir.join("out");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&in_dir).unwrap();

    for (i, v) in [0u64, 40, 80].iter().enumerate() {
        let f = Frame::filled(FrameFormat::gray8(), 4, 4, *v).unwrap();
        save_frame(&f, &in_dir.join(format!("src_{i}.png"))).unwrap();
    }
    let cfg = dir.join("blend.json");
    std::fs::write(&cfg, r#"{ "weights": [1, 2, 1], "log": true }"#).unwrap();

    let status = std::process::Command::new(exe())
        .args(["blend", "--in-dir"])
        .arg(&in_dir)
        .arg("--out-dir")
        .arg(&out_dir)
        .arg("--config")
        .arg(&cfg)
        .status()
        .unwrap();
    assert!(status.success());

    // (0 + 2*40 + 80) / 4
    let middle = load_frame(&out_dir.join("frame_000001.png")).unwrap();
    assert_eq!(middle.sample(0, 0, 0), 40);
}

#[test]
fn cli_rejects_weights_alongside_config() {
    let out = std::process::Command::new(exe())
        .args([
            "blend",
            "--in-dir",
            "target/unused_in",
            "--out-dir",
            "target/unused_out",
            "--config",
            "blend.json",
            "--weights",
            "1,1,1",
        ])
        .output()
        .unwrap();
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("cannot be used with"), "{stderr}");
}

#[test]
fn cli_blend_requires_weights_or_config() {
    let out = std::process::Command::new(exe())
        .args([
            "blend",
            "--in-dir",
            "target/unused_in",
            "--out-dir",
            "target/unused_out",
        ])
        .output()
        .unwrap();
    assert!(!out.status.success());
}
