use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use chrono::Local;

static EXE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the directory containing the executable.
pub fn get_exe_dir() -> &'static PathBuf {
    EXE_DIR.get_or_init(|| {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
            .unwrap_or_else(|| PathBuf::from("."))
    })
}

/// Files written for one run: `<output_root>/YYYYMMDD_HHMMSS/`.
#[derive(Clone, Debug)]
pub struct SessionPaths {
    pub dir: PathBuf,
    pub csv: PathBuf,
    pub table: PathBuf,
    pub log: PathBuf,
    pub previews: PathBuf,
}

impl SessionPaths {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            csv: dir.join("telemetry.csv"),
            table: dir.join("telemetry.json"),
            log: dir.join("session.log"),
            previews: dir.join("previews"),
            dir,
        }
    }

    /// Creates a timestamped session directory under `output_root`.
    pub fn create(output_root: &Path) -> std::io::Result<Self> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S").to_string();
        let session = Self::new(output_root.join(timestamp));
        std::fs::create_dir_all(&session.dir)?;
        Ok(session)
    }
}
