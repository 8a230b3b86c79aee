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

#[test]
fn cutflow_counts_and_histograms() {
    let dir = tmp_dir("cutflow");
    std::fs::create_dir_all(&dir).unwrap();
    let hists = dir.join("cutflow_hists.json");
    let cfg = fixture_path("cutflow.yaml");
    let events = fixture_path("skim_events.json");

    let out = run(&[
        "cutflow",
        "--config",
        cfg.to_string_lossy().as_ref(),
        "--events",
        events.to_string_lossy().as_ref(),
        "--hists",
        hists.to_string_lossy().as_ref(),
        "--deterministic",
    ]);
    assert!(
        out.status.success(),
        "cutflow should succeed, stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

    assert_eq!(v["events"], 10);
    assert_eq!(v["tiers"][3], "ZBTrigger+Cls. Comp.+PV+HF");
    assert_eq!(v["categories"][0]["name"], "0nXn");
    assert_eq!(v["categories"][0]["counts"], serde_json::json!([5, 4, 3, 2]));
    assert_eq!(v["categories"][1]["counts"], serde_json::json!([3, 3, 2, 1]));

    let ratios: Vec<f64> =
        v["ratios"][0]["values"].as_array().unwrap().iter().map(|x| x.as_f64().unwrap()).collect();
    let expected = [5.0 / 3.0, 4.0 / 3.0, 1.5, 2.0];
    for (r, e) in ratios.iter().zip(expected) {
        approx::assert_relative_eq!(*r, e);
    }

    let container: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&hists).unwrap()).unwrap();
    let h = &container["histograms"]["h_VZ_0nXn_3"];
    let total: f64 = h["sumw"].as_array().unwrap().iter().map(|x| x.as_f64().unwrap()).sum();
    assert_eq!(total, 2.0);
    assert_eq!(h["axes"][0]["title"], "V_z [cm]");
    assert_eq!(container["histograms"].as_object().unwrap().len(), 24);

    // Signal candidates only: two from the event passing every tier, one more
    // from the event failing HF.
    let sum = |key: &str| -> f64 {
        let h = &container["histograms"][key];
        h["sumw"].as_array().unwrap().iter().map(|x| x.as_f64().unwrap()).sum()
    };
    assert_eq!(sum("h_Dmass_0nXn_3"), 2.0);
    assert_eq!(sum("h_Dmass_0nXn_2"), 3.0);
    assert_eq!(sum("h_Dmass_Xn0n_0"), 0.0);
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn cutflow_json_config() {
    let dir = tmp_dir("cutflow_json");
    std::fs::create_dir_all(&dir).unwrap();
    let cfg = dir.join("cutflow.json");
    std::fs::write(
        &cfg,
        r#"{"tiers": [{"name": "PV", "flags": ["selectedVtxFilter"]}],
            "categories": [{"name": "any"}]}"#,
    )
    .unwrap();
    let events = fixture_path("skim_events.json");
    let out = run(&[
        "cutflow",
        "--config",
        cfg.to_string_lossy().as_ref(),
        "--events",
        events.to_string_lossy().as_ref(),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["categories"][0]["counts"], serde_json::json!([8]));
    let _ = std::fs::remove_dir_all(&dir);
}
