use std::{
    fs,
    io::Cursor,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::env::EnvMap;

pub fn load_env_file_sync(path: &Path, env: &mut EnvMap) -> Result<PathBuf> {
    let content =
        fs::read_to_string(path).with_context(|| format!("reading env file {}", path.display()))?;
    let iter = dotenvy::from_read_iter(Cursor::new(content));

    for item in iter {
        let (key, value) = item.with_context(|| format!("parsing env file {}", path.display()))?;
        env.insert(key, value);
    }

    Ok(path.to_path_buf())
}

/// Builds the configuration map: `.env` entries first, process variables on
/// top. An explicit env file must exist; the implicit `./.env` is optional.
pub fn load_environment(explicit: Option<&Path>) -> Result<EnvMap> {
    let mut env = EnvMap::new();

    match explicit {
        Some(path) => {
            load_env_file_sync(path, &mut env)?;
        }
        None => {
            let implicit = std::env::current_dir()?.join(".env");
            if implicit.is_file() {
                load_env_file_sync(&implicit, &mut env)?;
            }
        }
    }

    env.extend(std::env::vars());
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn load_env_file_sync_merges_values() -> Result<()> {
        let temp = tempdir()?;
        let env_path = temp.path().join("vars.env");
        fs::write(
            &env_path,
            "RAPID_PROD_CLIENT_ID=client\nRAPID_PROD_OAUTH_SCOPE=\"payments.read payments.write\"\n",
        )?;

        let mut env_map = EnvMap::new();
        load_env_file_sync(&env_path, &mut env_map)?;

        assert_eq!(
            env_map.get("RAPID_PROD_CLIENT_ID"),
            Some(&"client".to_string())
        );
        assert_eq!(
            env_map.get("RAPID_PROD_OAUTH_SCOPE"),
            Some(&"payments.read payments.write".to_string())
        );
        Ok(())
    }

    #[test]
    fn load_env_file_sync_propagates_io_errors() {
        let mut env_map = EnvMap::new();
        let path = PathBuf::from("does-not-exist.env");
        let err = load_env_file_sync(&path, &mut env_map).unwrap_err();
        assert!(err.to_string().contains("reading env file"));
    }

    #[test]
    fn load_environment_requires_explicit_file() {
        let err = load_environment(Some(Path::new("missing/settings.env"))).unwrap_err();
        assert!(err.to_string().contains("missing/settings.env"));
    }

    #[test]
    fn load_environment_includes_process_variables() -> Result<()> {
        let temp = tempdir()?;
        let env_path = temp.path().join("settings.env");
        fs::write(&env_path, "PAYCHECK_LOADER_ONLY_IN_FILE=file\n")?;

        let env = load_environment(Some(&env_path))?;
        assert_eq!(
            env.get("PAYCHECK_LOADER_ONLY_IN_FILE"),
            Some(&"file".to_string())
        );
        assert!(env.contains_key("PATH") || std::env::var("PATH").is_err());
        Ok(())
    }
}
