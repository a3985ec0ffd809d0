use std::path::{Path, PathBuf};
use std::time::Duration;

/// Looked up in the working directory unless another path is given.
pub const SETTINGS_FILE_NAME: &str = "mergePdfSetting.txt";

/// Created beneath the source folder; receives `<patient>.pdf`.
pub const MERGE_FOLDER_NAME: &str = "MergeFolder";

/// Idle time between two passes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(120);

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error("Cannot read source folder from {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot read source folder from {}: first line is empty", path.display())]
    Empty { path: PathBuf },
}

/// Contents of the settings file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Folder scanned for reports and captures each pass.
    pub source_folder: PathBuf,
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let contents = std::fs::read_to_string(path).map_err(|source| SettingsError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&contents, path)
    }

    /// Only the first line matters, anything after it is ignored.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, SettingsError> {
        let first = contents
            .trim_start_matches('\u{feff}')
            .lines()
            .next()
            .unwrap_or_default()
            .trim();

        if first.is_empty() {
            return Err(SettingsError::Empty {
                path: path.to_path_buf(),
            });
        }

        Ok(Self {
            source_folder: PathBuf::from(first),
        })
    }

    pub fn merge_folder(&self) -> PathBuf {
        self.source_folder.join(MERGE_FOLDER_NAME)
    }
}
