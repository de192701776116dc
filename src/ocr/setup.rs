use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::PipelineConfig;

/// Resolved locations of the Tesseract CLI and its language data.
#[derive(Clone, Debug)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// `None` lets Tesseract fall back to `TESSDATA_PREFIX` or its built-in path
    pub tessdata: Option<PathBuf>,
}

/// Returns the per-user directory checked for `eng.traineddata`.
pub fn get_tessdata_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("launch-telemetry")
        .join("tessdata")
}

/// Locates a usable Tesseract installation.
///
/// Order: configured path, `tesseract` on PATH, common install locations.
pub fn locate_tesseract(config: &PipelineConfig) -> Result<TesseractPaths> {
    let executable = find_tesseract_executable(config.tesseract_path.as_deref())?;
    let tessdata = find_tessdata_dir(config.tessdata_dir.as_deref());

    log::info!(
        "Tesseract: {} (tessdata: {})",
        executable.display(),
        tessdata
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "default".to_string())
    );

    Ok(TesseractPaths {
        executable,
        tessdata,
    })
}

fn find_tesseract_executable(configured: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = configured {
        if responds_to_version(path) {
            return Ok(path.to_path_buf());
        }
        return Err(anyhow!(
            "Configured tesseract_path {} is not runnable",
            path.display()
        ));
    }

    let on_path = PathBuf::from("tesseract");
    if responds_to_version(&on_path) {
        return Ok(on_path);
    }

    let common_paths = [
        "/usr/bin/tesseract",
        "/usr/local/bin/tesseract",
        "/opt/homebrew/bin/tesseract",
        r"C:\Program Files\Tesseract-OCR\tesseract.exe",
        r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
    ];
    for path in common_paths.iter().map(PathBuf::from) {
        if path.exists() && responds_to_version(&path) {
            return Ok(path);
        }
    }

    Err(anyhow!(
        "Tesseract not found. Install it (e.g. `apt install tesseract-ocr`) \
         or set tesseract_path in config.json"
    ))
}

fn find_tessdata_dir(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(dir) = configured {
        return Some(dir.to_path_buf());
    }
    let local = get_tessdata_dir();
    local.join("eng.traineddata").exists().then_some(local)
}

fn responds_to_version(executable: &Path) -> bool {
    Command::new(executable)
        .arg("--version")
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}

/// Checks that the located Tesseract can list the English language pack.
pub fn verify_language(paths: &TesseractPaths) -> Result<()> {
    let mut cmd = Command::new(&paths.executable);
    if let Some(dir) = &paths.tessdata {
        cmd.arg("--tessdata-dir").arg(dir);
    }
    let output = cmd
        .arg("--list-langs")
        .output()
        .context("Failed to run tesseract --list-langs")?;

    // Tesseract 4 prints the list on stderr, 5 on stdout
    let listing = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    if listing.lines().any(|l| l.trim() == "eng") {
        Ok(())
    } else {
        Err(anyhow!("Tesseract has no 'eng' language data installed"))
    }
}
