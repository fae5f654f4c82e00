mod model;
mod reader;

pub use model::{EnvironmentDefinition, EnvironmentsFile, TestCase, TestCatalog};
pub use reader::{load_environments, load_test_catalog, CatalogSource};
