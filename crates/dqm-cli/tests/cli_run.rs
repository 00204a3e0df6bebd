use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_muonmon"))
}

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("muonmon_cli_{}_{}_{}", std::process::id(), nanos, name));
    std::fs::create_dir_all(&p).unwrap();
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

const CONFIG: &str = r#"
histogramConfig:
  muonPSet: { nbins: 100, xmin: 0.0, xmax: 500.0 }
  lsPSet: { nbins: 50 }
minimumCandidateCount: 1
numeratorGate:
  highLevel: { paths: ["HLT_IsoMu24_v*"] }
denominatorGate:
  highLevel: { paths: ["HLT_PFMET120_v*"] }
"#;

fn event(run: u32, id: u64, reference: bool, signal: bool) -> String {
    format!(
        concat!(
            r#"{{"kind":"event","run":{run},"lumi":4,"event":{id},"#,
            r#""met":{{"pfMet":[{{"pt":150.0,"phi":0.2}}]}},"#,
            r#""muons":{{"muons":[{{"pt":35.0,"eta":0.4,"phi":1.0,"#,
            r#""bestTrack":{{"pt":35.0,"eta":0.4,"phi":1.0,"vx":0.0,"vy":0.01,"vz":0.02}}}}]}},"#,
            r#""vertices":{{"offlinePrimaryVertices":[{{"x":0.0,"y":0.0,"z":0.0}}]}},"#,
            r#""triggerResults":{{"TriggerResults::HLT":{{"HLT_PFMET120_v7":{reference},"HLT_IsoMu24_v4":{signal}}}}}}}"#
        ),
        run = run,
        id = id,
        reference = reference,
        signal = signal,
    )
}

fn run_record(run: u32) -> String {
    format!(
        r#"{{"kind":"run","run":{run},"hltMenus":{{"TriggerResults::HLT":["HLT_PFMET120_v7","HLT_IsoMu24_v4"]}}}}"#
    )
}

#[test]
fn run_writes_one_file_per_run() {
    let dir = tmp_dir("run");
    let config = dir.join("monitor.yaml");
    std::fs::write(&config, CONFIG).unwrap();
    let input = dir.join("events.jsonl");
    let lines = [
        run_record(100),
        event(100, 1, true, true),
        event(100, 2, true, false),
        event(100, 3, false, true),
        run_record(101),
        event(101, 1, true, true),
    ];
    std::fs::write(&input, lines.join("\n")).unwrap();
    let out_dir = dir.join("out");

    let out = run(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
        "--out-dir",
        out_dir.to_str().unwrap(),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report.as_array().unwrap().len(), 2);
    assert_eq!(report[0]["summary"]["processed"], 3);

    let first: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out_dir.join("run_100.json")).unwrap())
            .unwrap();
    assert_eq!(first["run"], 100);
    assert_eq!(first["folder"], "HLT/Muon");
    assert_eq!(first["summary"]["accepted"], 1);
    assert_eq!(first["summary"]["denominator_only"], 1);
    assert_eq!(first["summary"]["failed_denominator_gate"], 1);
    let hists = first["histograms"].as_array().unwrap();
    assert_eq!(hists.len(), 18);
    let entries = |path: &str| {
        hists.iter().find(|h| h["path"] == path).map(|h| h["entries"].as_u64().unwrap())
    };
    assert_eq!(entries("HLT/Muon/muon_pt_denominator"), Some(2));
    assert_eq!(entries("HLT/Muon/muon_pt_numerator"), Some(1));

    assert!(out_dir.join("run_101.json").exists());
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn event_before_run_record_fails() {
    let dir = tmp_dir("orphan");
    let config = dir.join("monitor.yaml");
    std::fs::write(&config, CONFIG).unwrap();
    let input = dir.join("events.jsonl");
    std::fs::write(&input, event(100, 1, true, true)).unwrap();

    let out = run(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
        "--out-dir",
        dir.join("out").to_str().unwrap(),
    ]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("before the first run record"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn repeated_run_number_fails() {
    let dir = tmp_dir("repeat");
    let config = dir.join("monitor.yaml");
    std::fs::write(&config, CONFIG).unwrap();
    let input = dir.join("events.jsonl");
    let lines = [
        run_record(100),
        event(100, 1, true, true),
        run_record(101),
        event(101, 1, true, true),
        run_record(100),
        event(100, 2, true, true),
    ];
    std::fs::write(&input, lines.join("\n")).unwrap();

    let out = run(&[
        "run",
        "--config",
        config.to_str().unwrap(),
        "--input",
        input.to_str().unwrap(),
        "--out-dir",
        dir.join("out").to_str().unwrap(),
    ]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("line 5") && stderr.contains("run 100"), "{stderr}");
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn defaults_round_trip_through_validate() {
    let out = run(&["defaults"]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let yaml = String::from_utf8(out.stdout).unwrap();
    assert!(yaml.contains("folderName: HLT/Muon"), "{yaml}");
    assert!(yaml.contains("muonPSet"));

    let dir = tmp_dir("defaults");
    let path = dir.join("defaults.yaml");
    std::fs::write(&path, yaml).unwrap();
    let out = run(&["validate", "--config", path.to_str().unwrap()]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("ok:"));
    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn validate_rejects_bad_configs() {
    let dir = tmp_dir("validate");
    let cases = [
        ("edges.yaml", "histogramConfig:\n  muonPSet: {nbins: 10, xmin: 0, xmax: 100}\n  muonBinning: [0, 2, 1, 5]\n", "strictly increasing"),
        ("cut.yaml", "histogramConfig:\n  muonPSet: {nbins: 10, xmin: 0, xmax: 100}\ncandidateSelection: \"pt > 6 &&\"\n", "invalid config"),
        ("pattern.json", r#"{"histogramConfig":{"muonPSet":{"nbins":10,"xmin":0,"xmax":100}},"numeratorGate":{"highLevel":{"paths":["~"]}}}"#, "invalid config"),
    ];
    for (name, text, needle) in cases {
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        let out = run(&["validate", "--config", path.to_str().unwrap()]);
        assert!(!out.status.success(), "{name} should fail");
        let stderr = String::from_utf8_lossy(&out.stderr);
        assert!(stderr.contains(needle), "{name}: {stderr}");
    }
    let _ = std::fs::remove_dir_all(&dir);
}
