use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

use garden_core::service::GardenService;

pub struct Config {
    pub data_dir: PathBuf,
    pub db_path: PathBuf,
    pub upload_dir: PathBuf,
}

impl Config {
    /// Resolve the data directory (platform default unless overridden) and
    /// make sure it exists.
    pub fn load(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => ProjectDirs::from("", "", "garden")
                .context("Could not determine home directory")?
                .data_dir()
                .to_path_buf(),
        };
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Config {
            db_path: data_dir.join("garden.db"),
            upload_dir: data_dir.join("uploads"),
            data_dir,
        })
    }

    pub fn open_service(&self) -> Result<GardenService> {
        GardenService::new(&self.db_path, self.upload_dir.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_with_override() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("garden");

        let config = Config::load(Some(dir.clone())).unwrap();
        assert!(dir.is_dir());
        assert_eq!(config.db_path, dir.join("garden.db"));
        assert_eq!(config.upload_dir, dir.join("uploads"));

        let svc = config.open_service().unwrap();
        assert!(config.upload_dir.is_dir());
        assert!(config.db_path.exists());
        assert!(svc.list_beds(None).unwrap().is_empty());
    }
}
