use directories::ProjectDirs;
use std::path::PathBuf;

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "cardcade", "Cardcade")
}

pub fn data_root() -> PathBuf {
    if let Some(pd) = project_dirs() {
        pd.data_dir().to_path_buf()
    } else {
        // Fallback: current dir
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

pub fn config_root() -> PathBuf {
    match project_dirs() {
        Some(pd) => pd.config_dir().to_path_buf(),
        None => data_root(),
    }
}

pub fn default_store_file() -> (PathBuf, PathBuf) {
    let root = data_root();
    let file = root.join("cardcade.json");
    let backups = root.join("backups");
    (file, backups)
}

pub fn default_params_file() -> PathBuf {
    config_root().join("params.json")
}
