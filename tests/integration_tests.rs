//! Integration tests for the nxconv CLI
//!
//! These tests exercise the CLI commands end-to-end using assert_cmd.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Helper to get an nxconv command isolated from user configuration
fn nxconv(tmp: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("nxconv").unwrap();
    cmd.current_dir(tmp.path())
        .env("HOME", tmp.path())
        .env("XDG_CONFIG_HOME", tmp.path().join(".config"))
        .env_remove("NXCONV_READER")
        .env_remove("NXCONV_OUTPUT")
        .env_remove("NXCONV_STRICT")
        .env_remove("RUST_LOG");
    cmd
}

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("data")
        .join(name)
}

fn nxdl() -> String {
    fixture("NXtransmission.nxdl.xml").display().to_string()
}

fn read_output(path: &Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

/// Run a transmission conversion of the given fixtures into `out.nxs`
fn convert_transmission(tmp: &TempDir, inputs: &[&str]) -> assert_cmd::assert::Assert {
    let mut cmd = nxconv(tmp);
    cmd.args(["convert", "--reader", "transmission", "--nxdl", &nxdl(), "--output", "out.nxs"]);
    for input in inputs {
        cmd.arg("--input-file").arg(fixture(input));
    }
    cmd.assert()
}

// ============================================================================
// CLI Basic Tests
// ============================================================================

#[test]
fn test_help_displays() {
    let tmp = TempDir::new().unwrap();
    nxconv(&tmp)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("convert"))
        .stdout(predicate::str::contains("readers"));
}

#[test]
fn test_convert_help_lists_options() {
    let tmp = TempDir::new().unwrap();
    nxconv(&tmp)
        .args(["convert", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--input-file"))
        .stdout(predicate::str::contains("--generate-template"))
        .stdout(predicate::str::contains("--nxdl"));
}

#[test]
fn test_readers_lists_discovered_readers() {
    let tmp = TempDir::new().unwrap();
    nxconv(&tmp)
        .arg("readers")
        .assert()
        .success()
        .stdout(predicate::str::contains("transmission"))
        .stdout(predicate::str::contains("NXtransmission"))
        .stdout(predicate::str::contains("example"))
        .stdout(predicate::str::contains("base").not());
}

#[test]
fn test_nxdl_is_required() {
    let tmp = TempDir::new().unwrap();
    nxconv(&tmp)
        .args(["convert", "--reader", "transmission"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--nxdl"));
}

#[test]
fn test_unknown_reader_is_rejected() {
    let tmp = TempDir::new().unwrap();
    nxconv(&tmp)
        .args(["convert", "--reader", "trans", "--nxdl", &nxdl()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("trans"))
        .stderr(predicate::str::contains("transmission"));
    assert!(!tmp.path().join("output.nxs").exists());
}

// ============================================================================
// Template Generation
// ============================================================================

#[test]
fn test_generate_template() {
    let tmp = TempDir::new().unwrap();
    let output = nxconv(&tmp)
        .args(["convert", "--nxdl", &nxdl(), "--generate-template"])
        .arg("--input-file")
        .arg(tmp.path().join("never-read.asc"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let skeleton: Value = serde_json::from_slice(&output.stdout).unwrap();
    let map = skeleton.as_object().unwrap();
    assert!(map.values().all(|v| v == "None"));

    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    insta::assert_snapshot!(keys.join("\n"), @r"
    /ENTRY[entry]/@default
    /ENTRY[entry]/SAMPLE[sample]/name
    /ENTRY[entry]/data/@axes
    /ENTRY[entry]/data/@signal
    /ENTRY[entry]/data/transmission
    /ENTRY[entry]/data/type
    /ENTRY[entry]/data/wavelength
    /ENTRY[entry]/data/wavelength/@units
    /ENTRY[entry]/definition
    /ENTRY[entry]/definition/@url
    /ENTRY[entry]/definition/@version
    /ENTRY[entry]/instrument/DETECTOR[detector]/gain
    /ENTRY[entry]/instrument/DETECTOR[detector]/response_time
    /ENTRY[entry]/instrument/DETECTOR[detector]/slit/type
    /ENTRY[entry]/instrument/DETECTOR[detector]/slit/x_gap
    /ENTRY[entry]/instrument/DETECTOR[detector]/slit/x_gap/@units
    /ENTRY[entry]/instrument/DETECTOR[detector]/type
    /ENTRY[entry]/instrument/DETECTOR[detector]/wavelength_range
    /ENTRY[entry]/instrument/SOURCE[source]/type
    /ENTRY[entry]/instrument/SOURCE[source]/wavelength_range
    /ENTRY[entry]/instrument/measured_data
    /ENTRY[entry]/instrument/ref_attenuator/attenuator_transmission
    /ENTRY[entry]/instrument/sample_attenuator/attenuator_transmission
    /ENTRY[entry]/instrument/spectrometer/GRATING[grating]/wavelength_range
    /ENTRY[entry]/instrument/spectrometer/wavelength
    /ENTRY[entry]/start_time
    /ENTRY[entry]/title
    ");

    assert!(!tmp.path().join("output.nxs").exists());
}

#[test]
fn test_generate_template_missing_nxdl() {
    let tmp = TempDir::new().unwrap();
    nxconv(&tmp)
        .args(["convert", "--nxdl", "NXmissing.nxdl.xml", "--generate-template"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read NXDL file"));
}

// ============================================================================
// Conversion
// ============================================================================

#[test]
fn test_convert_transmission() {
    let tmp = TempDir::new().unwrap();
    convert_transmission(&tmp, &["transmission.asc", "meta.yml"])
        .success()
        .stdout(predicate::str::contains("✓"))
        .stdout(predicate::str::contains("NXtransmission"));

    let out = read_output(&tmp.path().join("out.nxs"));
    let entry = &out["entry"];
    assert_eq!(out["@default"], "entry");
    assert_eq!(entry["@NX_class"], "NXentry");
    assert_eq!(entry["definition"]["value"], "NXtransmission");
    assert_eq!(entry["definition"]["@version"], "v2022.06");
    assert_eq!(entry["start_time"], "2022-05-24T13:25:41.000000Z");

    let instrument = &entry["instrument"];
    assert_eq!(instrument["detector2"]["@NX_class"], "NXdetector");
    assert_eq!(instrument["detector2"]["type"], "PMT");
    assert!(instrument["detector2"].get("gain").is_none());
    assert_eq!(instrument["detector2"]["slit"]["type"], "fixed");
    assert_eq!(instrument["detector2"]["slit"]["x_gap"]["@units"], "nm");
    assert_eq!(instrument["detector1"]["type"], "PbS");
    assert_eq!(instrument["detector1"]["gain"], 5.0);
    assert_eq!(instrument["detector"]["type"], "InGaAs");
    assert_eq!(instrument["detector"]["slit"]["type"], "servo");
    assert_eq!(instrument["sample_attenuator"]["attenuator_transmission"], 100);

    let wavelength = entry["data"]["wavelength"]["value"].as_array().unwrap();
    assert_eq!(wavelength.len(), 16);
    assert_eq!(entry["data"]["wavelength"]["@units"], "nm");
    assert_eq!(entry["data"]["@signal"], "transmission");
}

#[test]
fn test_yaml_overrides_asc_regardless_of_order() {
    let forward = TempDir::new().unwrap();
    convert_transmission(&forward, &["transmission.asc", "meta.yml"]).success();
    let backward = TempDir::new().unwrap();
    convert_transmission(&backward, &["meta.yml", "transmission.asc"]).success();

    let forward = read_output(&forward.path().join("out.nxs"));
    let backward = read_output(&backward.path().join("out.nxs"));
    assert_eq!(forward, backward);
    assert_eq!(forward["entry"]["sample"]["name"], "Borosilicate glass slide");
}

#[test]
fn test_unsupported_extension_is_a_warning() {
    let tmp = TempDir::new().unwrap();
    let csv = tmp.path().join("data.csv");
    fs::write(&csv, "1,2\n3,4\n").unwrap();

    nxconv(&tmp)
        .args(["convert", "--reader", "transmission", "--nxdl", &nxdl()])
        .arg("--input-file")
        .arg(&csv)
        .assert()
        .success()
        .stderr(predicate::str::contains("unsupported extension"));

    let out = read_output(&tmp.path().join("output.nxs"));
    assert_eq!(out["entry"]["definition"]["value"], "NXtransmission");
    assert!(out["entry"]["title"].is_null());
}

#[test]
fn test_unsupported_nxdl_is_fatal() {
    let tmp = TempDir::new().unwrap();
    nxconv(&tmp)
        .args(["convert", "--reader", "example", "--nxdl", &nxdl()])
        .arg("--input-file")
        .arg(fixture("meta.yml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not support NXtransmission"));
    assert!(!tmp.path().join("output.nxs").exists());
}

#[test]
fn test_reader_name_is_case_insensitive() {
    let tmp = TempDir::new().unwrap();
    nxconv(&tmp)
        .args(["convert", "--reader", "Transmission", "--nxdl", &nxdl()])
        .assert()
        .success();
    assert!(tmp.path().join("output.nxs").exists());
}

#[test]
fn test_strict_refuses_incomplete_output() {
    let tmp = TempDir::new().unwrap();
    let mut cmd = nxconv(&tmp);
    cmd.args(["convert", "--reader", "transmission", "--nxdl", &nxdl(), "--strict"])
        .arg("--input-file")
        .arg(fixture("transmission.asc"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Template validation failed"));
    assert!(!tmp.path().join("output.nxs").exists());

    nxconv(&tmp)
        .args(["convert", "--reader", "transmission", "--nxdl", &nxdl()])
        .arg("--input-file")
        .arg(fixture("transmission.asc"))
        .assert()
        .success()
        .stdout(predicate::str::contains("validation error"))
        .stderr(predicate::str::contains("/ENTRY[entry]/title"));
    assert!(tmp.path().join("output.nxs").exists());
}

#[test]
fn test_quiet_prints_no_summary() {
    let tmp = TempDir::new().unwrap();
    nxconv(&tmp)
        .args(["-q", "convert", "--reader", "transmission", "--nxdl", &nxdl()])
        .arg("--input-file")
        .arg(fixture("transmission.asc"))
        .arg("--input-file")
        .arg(fixture("meta.yml"))
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_project_config_selects_reader_and_output() {
    let tmp = TempDir::new().unwrap();
    fs::write(
        tmp.path().join(".nxconv.yaml"),
        "reader: transmission\noutput: configured.nxs\n",
    )
    .unwrap();

    nxconv(&tmp)
        .args(["convert", "--nxdl", &nxdl()])
        .arg("--input-file")
        .arg(fixture("meta.yml"))
        .assert()
        .success();
    assert!(tmp.path().join("configured.nxs").exists());
}

#[test]
fn test_env_overrides_project_config() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".nxconv.yaml"), "output: configured.nxs\n").unwrap();

    nxconv(&tmp)
        .env("NXCONV_READER", "transmission")
        .env("NXCONV_OUTPUT", "from-env.nxs")
        .args(["convert", "--nxdl", &nxdl()])
        .assert()
        .success();
    assert!(tmp.path().join("from-env.nxs").exists());
    assert!(!tmp.path().join("configured.nxs").exists());
}

#[test]
fn test_malformed_config_is_ignored() {
    let tmp = TempDir::new().unwrap();
    fs::write(tmp.path().join(".nxconv.yaml"), "reader: [broken\n").unwrap();

    nxconv(&tmp)
        .args(["convert", "--reader", "transmission", "--nxdl", &nxdl()])
        .assert()
        .success()
        .stderr(predicate::str::contains("malformed config file"));
}
