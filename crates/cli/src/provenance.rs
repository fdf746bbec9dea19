//! Provenance sidecars for scene reports.
//!
//! `report.json` gets a `report.provenance.json` next to it recording the
//! engine revision, the callsite, the evaluation parameters and every scene
//! file read, with its size at evaluation time.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variable overriding the recorded engine revision.
const REV_VAR: &str = "QSTR_CODE_REV";

/// Input file of a report.
#[derive(Debug, Serialize)]
pub struct InputFile {
    pub path: String,
    pub bytes: u64,
}

/// Metadata used to generate a provenance sidecar.
pub struct Payload {
    pub params: Value,
    pub inputs: Vec<InputFile>,
}

impl Payload {
    pub fn new(params: Value) -> Self {
        Self {
            params,
            inputs: Vec::new(),
        }
    }

    /// Record `path` as an input; its size is read now.
    pub fn input(mut self, path: &Path) -> Result<Self> {
        let meta =
            fs::metadata(path).with_context(|| format!("reading input {}", path.display()))?;
        self.inputs.push(InputFile {
            path: path.to_string_lossy().into_owned(),
            bytes: meta.len(),
        });
        Ok(self)
    }
}

#[derive(Serialize)]
struct Callsite {
    file: &'static str,
    line: u32,
}

#[derive(Serialize)]
struct Sidecar<'a> {
    code_rev: Option<String>,
    engine_version: &'static str,
    callsite: Callsite,
    params: &'a Value,
    inputs: &'a [InputFile],
    outputs: [String; 1],
}

/// Write the sidecar of `artifact` and return its path.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, payload: Payload) -> Result<PathBuf> {
    let artifact = artifact.as_ref();
    let caller = Location::caller();
    let doc = Sidecar {
        code_rev: code_rev(),
        engine_version: qstr::VERSION,
        callsite: Callsite {
            file: caller.file(),
            line: caller.line(),
        },
        params: &payload.params,
        inputs: &payload.inputs,
        outputs: [artifact.to_string_lossy().into_owned()],
    };
    let path = sidecar_path(artifact);
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

/// `dir/name.ext` → `dir/name.provenance.json`.
fn sidecar_path(artifact: &Path) -> PathBuf {
    artifact.with_extension("provenance.json")
}

/// Engine revision: `QSTR_CODE_REV` at run time, then at build time, then `git describe`.
pub fn code_rev() -> Option<String> {
    let non_empty = |s: String| (!s.trim().is_empty()).then(|| s.trim().to_string());
    std::env::var(REV_VAR)
        .ok()
        .and_then(non_empty)
        .or_else(|| option_env!("QSTR_CODE_REV").map(str::to_string).and_then(non_empty))
        .or_else(|| {
            let out = Command::new("git")
                .args(["describe", "--always", "--dirty", "--abbrev=12"])
                .output()
                .ok()?;
            if !out.status.success() {
                return None;
            }
            String::from_utf8(out.stdout).ok().and_then(non_empty)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn sidecar_sits_next_to_the_report() {
        let derived = sidecar_path(Path::new("/tmp/output/scene-report.json"));
        assert_eq!(derived, Path::new("/tmp/output/scene-report.provenance.json"));
        let bare = sidecar_path(Path::new("out/report"));
        assert_eq!(bare, Path::new("out/report.provenance.json"));
    }

    #[test]
    fn sidecar_records_inputs_and_params() {
        let dir = tempdir().unwrap();
        let scene = dir.path().join("scene.json");
        fs::write(&scene, r#"{"terms": []}"#).unwrap();
        let artifact = dir.path().join("report.json");
        fs::write(&artifact, "{}").unwrap();

        let payload = Payload::new(json!({"terms": 3})).input(&scene).unwrap();
        let prov_path = write_sidecar(&artifact, payload).unwrap();
        let parsed: Value = serde_json::from_slice(&fs::read(prov_path).unwrap()).unwrap();
        assert_eq!(parsed["outputs"][0], artifact.to_string_lossy().as_ref());
        assert_eq!(parsed["inputs"][0]["path"], scene.to_string_lossy().as_ref());
        assert_eq!(parsed["inputs"][0]["bytes"], 13);
        assert_eq!(parsed["params"]["terms"], 3);
        assert_eq!(parsed["engine_version"], qstr::VERSION);
        assert!(parsed["callsite"]["line"].as_u64().unwrap() > 0);
    }

    #[test]
    fn missing_input_is_an_error() {
        let dir = tempdir().unwrap();
        let err = Payload::new(json!({}))
            .input(&dir.path().join("absent.json"))
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("absent.json"));
    }
}
