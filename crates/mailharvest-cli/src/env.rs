use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Name of the dotenv file for an optional environment.
pub fn env_file_name(env: Option<&str>) -> String {
    match env {
        Some(name) => format!(".env.{}", name),
        None => ".env".to_string(),
    }
}

/// Load `file_name` from the current directory or the closest ancestor that has one.
/// Returns the loaded path, or `None` if no directory up to the root has the file.
pub fn load_dotenv_from_ancestors(file_name: &str) -> Result<Option<PathBuf>> {
    let cwd = std::env::current_dir().context("Failed to get current directory")?;

    let mut current = cwd.as_path();
    loop {
        let env_path = current.join(file_name);
        if env_path.exists() {
            dotenvy::from_path(&env_path)
                .with_context(|| format!("Failed to load {} from {}", file_name, env_path.display()))?;
            info!("Loaded {} from {}", file_name, env_path.display());
            return Ok(Some(env_path));
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }

    Ok(None)
}

/// Load the dotenv file for `env`.
///
/// A missing `.env` is fine since credentials may already be exported. A
/// missing `.env.<ENV>` is an error because it was asked for explicitly.
pub fn load_env(env: Option<&str>) -> Result<()> {
    let file_name = env_file_name(env);

    if load_dotenv_from_ancestors(&file_name)?.is_some() {
        return Ok(());
    }

    if env.is_some() {
        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        anyhow::bail!(
            "No {} file found.\n\n\
            Searched from {} to filesystem root.\n\n\
            Hint: copy .env.example to {} and fill in your database credentials.",
            file_name,
            cwd.display(),
            file_name
        );
    }

    debug!("No .env file found, using the process environment");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_env_file_name() {
        assert_eq!(env_file_name(None), ".env");
        assert_eq!(env_file_name(Some("staging")), ".env.staging");
    }

    #[test]
    #[serial]
    fn test_load_dotenv_from_current_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".env"), "MH_TEST_VAR_CURRENT=hello").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp_dir.path()).unwrap();
        std::env::remove_var("MH_TEST_VAR_CURRENT");

        let loaded = load_dotenv_from_ancestors(".env").unwrap();
        assert!(loaded.is_some(), "Should find .env in current directory");
        assert_eq!(std::env::var("MH_TEST_VAR_CURRENT").unwrap(), "hello");

        std::env::set_current_dir(original_dir).unwrap();
        std::env::remove_var("MH_TEST_VAR_CURRENT");
    }

    #[test]
    #[serial]
    fn test_load_dotenv_from_grandparent_directory() {
        let grandparent_dir = TempDir::new().unwrap();
        let child_dir = grandparent_dir.path().join("parent").join("child");
        fs::create_dir_all(&child_dir).unwrap();
        fs::write(grandparent_dir.path().join(".env"), "MH_TEST_VAR_GRANDPARENT=nested").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&child_dir).unwrap();
        std::env::remove_var("MH_TEST_VAR_GRANDPARENT");

        let loaded = load_dotenv_from_ancestors(".env").unwrap();
        assert!(loaded.is_some(), "Should find .env in grandparent directory");
        assert_eq!(std::env::var("MH_TEST_VAR_GRANDPARENT").unwrap(), "nested");

        std::env::set_current_dir(original_dir).unwrap();
        std::env::remove_var("MH_TEST_VAR_GRANDPARENT");
    }

    #[test]
    #[serial]
    fn test_load_dotenv_prefers_closest_env_file() {
        let parent_dir = TempDir::new().unwrap();
        let child_dir = parent_dir.path().join("subdir");
        fs::create_dir(&child_dir).unwrap();
        fs::write(parent_dir.path().join(".env"), "MH_TEST_VAR_CLOSEST=parent").unwrap();
        fs::write(child_dir.join(".env"), "MH_TEST_VAR_CLOSEST=child").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(&child_dir).unwrap();
        std::env::remove_var("MH_TEST_VAR_CLOSEST");

        load_dotenv_from_ancestors(".env").unwrap();
        assert_eq!(
            std::env::var("MH_TEST_VAR_CLOSEST").unwrap(),
            "child",
            "Should prefer .env in current directory over parent"
        );

        std::env::set_current_dir(original_dir).unwrap();
        std::env::remove_var("MH_TEST_VAR_CLOSEST");
    }

    #[test]
    #[serial]
    fn test_load_named_env() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join(".env"), "MH_TEST_VAR_NAMED=default").unwrap();
        fs::write(temp_dir.path().join(".env.staging"), "MH_TEST_VAR_NAMED=staging").unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp_dir.path()).unwrap();
        std::env::remove_var("MH_TEST_VAR_NAMED");

        load_env(Some("staging")).unwrap();
        assert_eq!(std::env::var("MH_TEST_VAR_NAMED").unwrap(), "staging");

        std::env::set_current_dir(original_dir).unwrap();
        std::env::remove_var("MH_TEST_VAR_NAMED");
    }

    #[test]
    #[serial]
    fn test_missing_default_env_is_ok() {
        let temp_dir = TempDir::new().unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp_dir.path()).unwrap();

        assert!(load_env(None).is_ok());

        std::env::set_current_dir(original_dir).unwrap();
    }

    #[test]
    #[serial]
    fn test_missing_named_env_is_error() {
        let temp_dir = TempDir::new().unwrap();

        let original_dir = std::env::current_dir().unwrap();
        std::env::set_current_dir(temp_dir.path()).unwrap();

        let result = load_env(Some("mailharvest-test-missing"));
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("No .env.mailharvest-test-missing file found"));

        std::env::set_current_dir(original_dir).unwrap();
    }
}
