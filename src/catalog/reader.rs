use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

use super::model::{EnvironmentDefinition, EnvironmentsFile, TestCatalog};

fn resolve_relative(base: &Path, value: &str) -> PathBuf {
    let candidate = Path::new(value);
    if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        base.join(candidate)
    }
}

pub async fn load_environments(path: &Path) -> Result<Vec<EnvironmentDefinition>> {
    let contents = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading environments {}", path.display()))?;

    let parsed: EnvironmentsFile = serde_json::from_str(&contents)
        .with_context(|| format!("parsing environments {}", path.display()))?;

    Ok(parsed.environments)
}

pub async fn load_test_catalog(path: &Path) -> Result<TestCatalog> {
    let contents = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading test catalog {}", path.display()))?;

    serde_json::from_str(&contents)
        .with_context(|| format!("parsing test catalog {}", path.display()))
}

/// Location of `environments.json`. Nothing is cached: every call re-reads
/// the files so catalog edits apply to the next run.
#[derive(Debug, Clone)]
pub struct CatalogSource {
    environments_file: PathBuf,
}

impl CatalogSource {
    pub fn new(environments_file: impl Into<PathBuf>) -> Self {
        Self {
            environments_file: environments_file.into(),
        }
    }

    pub fn environments_file(&self) -> &Path {
        &self.environments_file
    }

    fn base_dir(&self) -> PathBuf {
        self.environments_file
            .parent()
            .map(|p| p.to_path_buf())
            .unwrap_or_default()
    }

    pub async fn environments(&self) -> Result<Vec<EnvironmentDefinition>> {
        load_environments(&self.environments_file).await
    }

    pub async fn environment(&self, environment_id: &str) -> Result<Option<EnvironmentDefinition>> {
        Ok(self
            .environments()
            .await?
            .into_iter()
            .find(|env| env.id == environment_id))
    }

    pub fn catalog_path(&self, environment: &EnvironmentDefinition) -> PathBuf {
        resolve_relative(&self.base_dir(), &environment.test_cases_file)
    }

    pub async fn catalog_for(&self, environment: &EnvironmentDefinition) -> Result<TestCatalog> {
        load_test_catalog(&self.catalog_path(environment)).await
    }
}
