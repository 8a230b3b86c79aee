use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_upcweight"))
}

fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures").join(name)
}

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("upcweight_cli_{}_{}_{}", std::process::id(), nanos, name));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn s(p: &PathBuf) -> String {
    p.to_string_lossy().into_owned()
}

fn assert_ok(out: &Output, what: &str) {
    assert!(
        out.status.success(),
        "{what} should succeed, stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
}

/// fill -> make-weights, returning (hists, weights) paths.
fn build_weights(dir: &PathBuf) -> (PathBuf, PathBuf) {
    std::fs::create_dir_all(dir).unwrap();
    let hists = dir.join("hists.json");
    let weights = dir.join("weights.json");
    let cfg = fixture_path("fill.yaml");

    for (events, name) in [("events_data.json", "h_num"), ("events_mc.json", "h_den")] {
        let out = run(&[
            "fill",
            "--config",
            &s(&cfg),
            "--events",
            &s(&fixture_path(events)),
            "--name",
            name,
            "--output",
            &s(&hists),
            "--chunk-size",
            "64",
        ]);
        assert_ok(&out, "fill");
    }

    let out = run(&[
        "make-weights",
        "--numerator",
        &s(&hists),
        "--denominator",
        &s(&hists),
        "--output",
        &s(&weights),
    ]);
    assert_ok(&out, "make-weights");
    let summary: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(summary["cells"], 12);
    assert_eq!(summary["zero_denominator_cells"], 0);
    (hists, weights)
}

#[test]
fn weight_file_holds_three_components() {
    let dir = tmp_dir("weights");
    let (_, weights) = build_weights(&dir);
    let v: serde_json::Value = serde_json::from_slice(&std::fs::read(&weights).unwrap()).unwrap();
    assert_eq!(v["format"], "uw-hist-v1");
    for key in ["h_num", "h_den", "h_ratio"] {
        let axes = v["histograms"][key]["axes"].as_array().unwrap();
        assert_eq!(axes.len(), 2, "{key}");
        assert_eq!(axes[0]["edges"], serde_json::json!([0.0, 2.0, 5.0, 10.0]));
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn closure_of_reweighted_mc_is_unity() {
    let dir = tmp_dir("closure");
    let (hists, weights) = build_weights(&dir);
    let out_dir = dir.join("closure");

    let out = run(&[
        "closure-test",
        "--config",
        &s(&fixture_path("closure.yaml")),
        "--weights",
        &s(&weights),
        "--events",
        &s(&fixture_path("events_mc.json")),
        "--target",
        &s(&hists),
        "--out-dir",
        &s(&out_dir),
        "--deterministic",
    ]);
    assert_ok(&out, "closure-test");

    let artifact: serde_json::Value =
        serde_json::from_slice(&std::fs::read(out_dir.join("closure.json")).unwrap()).unwrap();
    assert_eq!(artifact["meta"]["created_unix_ms"], 0);
    assert_eq!(artifact["meta"]["inputs_sha256"]["weights"].as_str().unwrap().len(), 64);
    assert_eq!(artifact["stats"]["zero_weight"], 0);

    let views = artifact["views"].as_array().unwrap();
    let names: Vec<_> = views.iter().map(|v| v["name"].as_str().unwrap()).collect();
    assert_eq!(names, vec!["full", "Gpt", "Gy", "GyIn2to5"]);
    for v in views {
        let defined = v["ratio_defined"].as_array().unwrap();
        for (r, d) in v["ratio_y"].as_array().unwrap().iter().zip(defined) {
            assert!(d.as_bool().unwrap());
            approx::assert_relative_eq!(r.as_f64().unwrap(), 1.0, epsilon = 1e-9);
        }
    }
    assert_eq!(views[3]["weighted"]["axes"].as_array().unwrap().len(), 1);

    let bytes = std::fs::read(out_dir.join("closure_hists.json")).unwrap();
    let container: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    for key in ["h_weighted_full", "h_target_Gy", "h_closure_GyIn2to5", "h_unweighted_Gpt"] {
        assert!(container["histograms"].get(key).is_some(), "missing {key}");
    }
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn missing_component_is_reported() {
    let dir = tmp_dir("missing");
    let (hists, _) = build_weights(&dir);
    let out = run(&[
        "closure-test",
        "--config",
        &s(&fixture_path("closure.yaml")),
        "--weights",
        &s(&hists),
        "--events",
        &s(&fixture_path("events_mc.json")),
        "--target",
        &s(&hists),
        "--out-dir",
        &s(&dir.join("closure")),
    ]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("h_ratio"), "stderr={stderr}");
    let _ = std::fs::remove_dir_all(&dir);
}
