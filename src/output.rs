//! Run orchestration and atomic output publishing
//!
//! A run reads the input once, analyzes it, and writes every artifact into a
//! hidden staging directory next to the final location. The staging directory
//! is renamed to `analysis_<stem>_<YYYYMMDD_HHMMSS>` only after the last file
//! is written; on any earlier error it is removed, so a failed run leaves no
//! output directory behind.

use crate::analysis::{analyze, AnalysisReport};
use crate::charts::render_charts;
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, Result};
use crate::record::read_trials;
use crate::report::{render_text_mapping, ReportFormat, ReportRenderer, RunMetadata, TextRenderer};
use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the text-id-to-title mapping document
pub const MAPPING_FILE: &str = "text_id_mapping.txt";

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Published output directory
    pub output_dir: PathBuf,
    pub report: AnalysisReport,
    pub metadata: RunMetadata,
    /// Plain-text rendering for the console
    pub console: String,
}

/// Output directory name for an input file and a generation time
pub fn output_dir_name(input: &Path, at: &DateTime<Local>) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "input".to_string());
    format!("analysis_{}_{}", stem, at.format("%Y%m%d_%H%M%S"))
}

/// Hex SHA-256 of a byte buffer
pub fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Staging directory removed on drop unless committed
struct StagingDir {
    path: PathBuf,
    committed: bool,
}

impl StagingDir {
    fn create(path: PathBuf) -> Result<Self> {
        fs::create_dir(&path).map_err(|e| AnalysisError::io(&path, e))?;
        debug!("Created staging directory {}", path.display());
        Ok(Self {
            path,
            committed: false,
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, name: &str, contents: &str) -> Result<()> {
        let path = self.path.join(name);
        fs::write(&path, contents).map_err(|e| AnalysisError::io(&path, e))
    }

    /// Rename into place; the guard is disarmed only if the rename succeeds
    ///
    /// Never replaces an existing `target`, even one created after the
    /// caller's own existence check.
    fn commit(mut self, target: &Path) -> Result<()> {
        // POSIX rename silently replaces an empty directory, so claim the
        // name first; `create_dir` fails if anything already holds it
        #[cfg(unix)]
        fs::create_dir(target).map_err(|e| AnalysisError::io(target, e))?;

        if let Err(e) = fs::rename(&self.path, target) {
            #[cfg(unix)]
            if let Err(cleanup) = fs::remove_dir(target) {
                warn!(
                    "Failed to release output directory {}: {}",
                    target.display(),
                    cleanup
                );
            }
            return Err(AnalysisError::io(target, e));
        }
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!(
                "Failed to remove staging directory {}: {}",
                self.path.display(),
                e
            );
        }
    }
}

/// Analyze `input` and publish the output directory under the configured root
pub fn run(input: &Path, config: &AnalysisConfig) -> Result<RunOutcome> {
    run_at(input, config, Local::now())
}

/// [`run`] with an explicit generation time
///
/// # Errors
/// Any loading or analysis error, `Io` for file system failures (including
/// an already existing output directory), and `Render` for chart failures.
/// No output directory exists after an error.
pub fn run_at(input: &Path, config: &AnalysisConfig, at: DateTime<Local>) -> Result<RunOutcome> {
    config.validate()?;

    let bytes = fs::read(input).map_err(|e| AnalysisError::io(input, e))?;
    let input_sha256 = sha256_hex(&bytes);
    let dataset = read_trials(bytes.as_slice())?;
    info!(
        "Loaded {} trials ({} participants, {} texts) from {}",
        dataset.records().len(),
        dataset.participants().len(),
        dataset.texts().len(),
        input.display()
    );

    let report = analyze(&dataset)?;

    let name = output_dir_name(input, &at);
    let root = &config.output_root;
    let output_dir = root.join(&name);
    if output_dir.exists() {
        return Err(AnalysisError::io(
            &output_dir,
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "output directory exists"),
        ));
    }
    fs::create_dir_all(root).map_err(|e| AnalysisError::io(root, e))?;
    let staging = StagingDir::create(root.join(format!(".{}.partial", name)))?;

    let artifacts = if config.charts.enabled {
        render_charts(&report, dataset.records(), &config.charts, staging.path())?
    } else {
        Vec::new()
    };

    let metadata = RunMetadata {
        source: input.display().to_string(),
        input_sha256,
        generated_at: at.format("%Y-%m-%d %H:%M:%S").to_string(),
        output_dir: output_dir.display().to_string(),
        artifacts,
    };

    let console = TextRenderer.render(&report, &metadata)?;
    let document = match config.format {
        ReportFormat::Text => console.clone(),
        format => format.renderer().render(&report, &metadata)?,
    };
    staging.write(&config.format.file_name(), &document)?;
    staging.write(MAPPING_FILE, &render_text_mapping(&report.text_mapping))?;

    staging.commit(&output_dir)?;
    info!("Results saved to {}", output_dir.display());

    Ok(RunOutcome {
        output_dir,
        report,
        metadata,
        console,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::fixtures;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 2, 10, 0, 0).unwrap()
    }

    fn config_in(dir: &Path) -> AnalysisConfig {
        let mut config = AnalysisConfig {
            output_root: dir.to_path_buf(),
            ..AnalysisConfig::default()
        };
        config.charts.enabled = false;
        config
    }

    fn write_input(dir: &Path, contents: &str) -> PathBuf {
        let path = dir.join("responses.csv");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_output_dir_name() {
        let name = output_dir_name(Path::new("data/responses.csv"), &fixed_time());
        assert_eq!(name, "analysis_responses_20240502_100000");
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_run_publishes_directory() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), fixtures::STUDY);
        let outcome = run_at(&input, &config_in(dir.path()), fixed_time()).unwrap();

        assert_eq!(
            outcome.output_dir,
            dir.path().join("analysis_responses_20240502_100000")
        );
        let report = fs::read_to_string(outcome.output_dir.join("analysis_results.txt")).unwrap();
        assert_eq!(report, outcome.console);
        let mapping = fs::read_to_string(outcome.output_dir.join(MAPPING_FILE)).unwrap();
        assert!(mapping.contains("Text 3: Rain, Again"));
        assert_eq!(outcome.metadata.input_sha256, sha256_hex(fixtures::STUDY.as_bytes()));

        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".partial"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_json_format_document() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), fixtures::STUDY);
        let mut config = config_in(dir.path());
        config.format = ReportFormat::Json;

        let outcome = run_at(&input, &config, fixed_time()).unwrap();
        let text = fs::read_to_string(outcome.output_dir.join("analysis_results.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["report"]["accuracy"]["total"], 12);
        assert!(!outcome.output_dir.join("analysis_results.txt").exists());
    }

    #[test]
    fn test_failed_analysis_leaves_nothing() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("out");
        let input = write_input(
            dir.path(),
            "participant__id,participant__experience,participant__department,\
text__id,text__title,text__origin,classification,confidence,response_time\n\
1,4,Math,1,A,ai,ai,5,1000\n",
        );

        assert!(run_at(&input, &config_in(&out), fixed_time()).is_err());
        assert!(!out.exists());
    }

    #[test]
    fn test_staging_removed_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(".analysis_x.partial");
        {
            let staging = StagingDir::create(path.clone()).unwrap();
            staging.write("partial.txt", "x").unwrap();
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_existing_output_dir_rejected() {
        let dir = TempDir::new().unwrap();
        let input = write_input(dir.path(), fixtures::STUDY);
        let config = config_in(dir.path());
        run_at(&input, &config, fixed_time()).unwrap();

        let err = run_at(&input, &config, fixed_time()).unwrap_err();
        assert!(matches!(err, AnalysisError::Io { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_commit_never_replaces_existing_dir() {
        let dir = TempDir::new().unwrap();
        let staging_path = dir.path().join(".analysis_x.partial");
        let target = dir.path().join("analysis_x");

        let staging = StagingDir::create(staging_path.clone()).unwrap();
        staging.write("analysis_results.txt", "report").unwrap();
        // Appears after the existence check in `run_at`
        fs::create_dir(&target).unwrap();

        let err = staging.commit(&target).unwrap_err();
        match err {
            AnalysisError::Io { source, .. } => {
                assert_eq!(source.kind(), std::io::ErrorKind::AlreadyExists)
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(target.is_dir());
        assert_eq!(fs::read_dir(&target).unwrap().count(), 0);
        assert!(!staging_path.exists());
    }
}
