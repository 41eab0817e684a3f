use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FolioConfig {
    pub database: Option<String>,
    pub port: Option<u16>,
    pub compose_file: Option<String>,
    pub api_base_url: Option<String>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("folio.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".folio").join("folio.db")
}

pub fn default_compose_path_in(base: &Path) -> PathBuf {
    base.join("infrastructure").join("docker").join("docker-compose.yml")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<FolioConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: FolioConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &FolioConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = ".folio/";

    if gitignore_path.exists() {
        let existing = std::fs::read_to_string(&gitignore_path)?;
        if existing.lines().any(|line| line.trim() == entry) {
            return Ok(());
        }
    }

    let mut content = String::new();
    if gitignore_path.exists() {
        content.push_str(&std::fs::read_to_string(&gitignore_path)?);
        if !content.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push_str(entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_missing_config_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");
        assert!(load_config(Some(&path)).unwrap().is_none());
    }

    #[test]
    fn test_write_then_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");

        let config = FolioConfig {
            database: Some(".folio/folio.db".into()),
            port: Some(8080),
            compose_file: None,
            api_base_url: Some("http://localhost:8080".into()),
        };
        write_config(&path, &config, false).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.database.as_deref(), Some(".folio/folio.db"));
        assert_eq!(loaded.port, Some(8080));
        assert_eq!(loaded.api_base_url.as_deref(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_write_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folio.toml");

        write_config(&path, &FolioConfig::default(), false).unwrap();
        assert!(write_config(&path, &FolioConfig::default(), false).is_err());
        assert!(write_config(&path, &FolioConfig::default(), true).is_ok());
    }

    #[test]
    fn test_ensure_gitignore_appends_once() {
        let dir = tempfile::tempdir().unwrap();

        ensure_gitignore(dir.path()).unwrap();
        ensure_gitignore(dir.path()).unwrap();

        let contents = std::fs::read_to_string(dir.path().join(".gitignore")).unwrap();
        assert_eq!(contents.matches(".folio/").count(), 1);
    }

    #[test]
    fn test_ensure_db_dir_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join(".folio").join("folio.db");

        ensure_db_dir(&db_path).unwrap();
        assert!(db_path.parent().unwrap().exists());
    }
}
