use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn db_path() -> Option<PathBuf> {
        if let Ok(home) = std::env::var("HOME") {
            let state_dir = PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("rondo");
            Some(state_dir.join("results.db"))
        } else {
            ProjectDirs::from("", "", "rondo")
                .map(|proj_dirs| proj_dirs.data_local_dir().join("results.db"))
        }
    }

    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "rondo") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("rondo_config.json")
        }
    }
}
