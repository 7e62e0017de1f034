//! Project scaffolding for `ipm init`.

use crate::config::{ProjectFile, DEFAULT_CONFIG_NAME};
use crate::{BuildError, Result};
use std::path::{Path, PathBuf};
use tracing::info;

/// Create `<parent>/<project_name>/` holding a default config that links
/// against the isolate library at `isolate_root`.
///
/// Fails without touching the filesystem if the directory already exists.
/// Returns the path of the written config.
pub fn init_project(parent: &Path, project_name: &str, isolate_root: &str) -> Result<PathBuf> {
    let project_dir = parent.join(project_name);
    if project_dir.exists() {
        return Err(BuildError::ProjectExists(project_dir));
    }

    std::fs::create_dir(&project_dir).map_err(|source| BuildError::Write {
        path: project_dir.clone(),
        source,
    })?;

    let config_path = project_dir.join(DEFAULT_CONFIG_NAME);
    generate_default(project_name, &config_path, isolate_root)?;
    Ok(config_path)
}

/// Write the default config for `project_name` to `path`.
pub fn generate_default(project_name: &str, path: &Path, isolate_root: &str) -> Result<()> {
    info!(path = %path.display(), "generating default config");
    ProjectFile::default_for(project_name, isolate_root).write(path)
}
