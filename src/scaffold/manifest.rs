use std::fs;

use camino::{Utf8Component, Utf8Path};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::templates;

pub const DEFAULT_PROJECT_NAME: &str = "datascience";
const DEFAULT_TEMPLATE: &str = "manifests/datascience.toml";
const PLACEHOLDER: &str = "{project_name}";

/// On-disk shape of a manifest file.
#[derive(Debug, Deserialize)]
struct ManifestFile {
    project_name: Option<String>,
    files: Vec<String>,
}

/// Ordered list of relative paths to materialize for one project.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Manifest {
    project_name: String,
    entries: Vec<String>,
}

impl Manifest {
    /// Build a manifest from already-rendered entries.
    pub fn new(project_name: impl Into<String>, entries: Vec<String>) -> Result<Self> {
        let project_name = project_name.into();
        validate_project_name(&project_name)?;
        for entry in &entries {
            validate_entry(entry)?;
        }
        Ok(Self {
            project_name,
            entries,
        })
    }

    /// The built-in data-science skeleton rendered for `project_name`.
    pub fn datascience(project_name: &str) -> Result<Self> {
        let raw = templates::get_string(DEFAULT_TEMPLATE)?;
        let file: ManifestFile = toml::from_str(&raw)
            .map_err(|err| Error::Template(format!("parsing {}: {}", DEFAULT_TEMPLATE, err)))?;
        Self::render(project_name, file.files)
    }

    /// Load a user manifest. `project_name` overrides the name in the file.
    pub fn load(path: &Utf8Path, project_name: Option<&str>) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| Error::io(path, source))?;
        let file: ManifestFile = toml::from_str(&raw)
            .map_err(|err| Error::InvalidManifest(format!("parsing {}: {}", path, err)))?;
        let name = project_name
            .map(str::to_owned)
            .or(file.project_name)
            .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_owned());
        Self::render(&name, file.files)
    }

    fn render(project_name: &str, templates: Vec<String>) -> Result<Self> {
        validate_project_name(project_name)?;
        let entries = templates
            .iter()
            .map(|entry| entry.replace(PLACEHOLDER, project_name))
            .collect();
        Self::new(project_name, entries)
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

fn validate_project_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::InvalidManifest("project name is empty".to_owned()));
    }
    if name.contains(['/', '\\']) {
        return Err(Error::InvalidManifest(format!(
            "project name `{}` must not contain path separators",
            name
        )));
    }
    Ok(())
}

fn validate_entry(entry: &str) -> Result<()> {
    if entry.trim().is_empty() {
        return Err(Error::InvalidManifest("empty manifest entry".to_owned()));
    }
    let path = Utf8Path::new(entry);
    for component in path.components() {
        match component {
            Utf8Component::Normal(_) | Utf8Component::CurDir => {}
            Utf8Component::ParentDir => {
                return Err(Error::InvalidManifest(format!(
                    "entry `{}` must not contain `..`",
                    entry
                )));
            }
            Utf8Component::RootDir | Utf8Component::Prefix(_) => {
                return Err(Error::InvalidManifest(format!(
                    "entry `{}` must be a relative path",
                    entry
                )));
            }
        }
    }
    if entry.ends_with('/') || path.file_name().is_none() {
        return Err(Error::InvalidManifest(format!(
            "entry `{}` does not name a file",
            entry
        )));
    }
    Ok(())
}
