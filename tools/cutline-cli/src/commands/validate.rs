//! Validate a project file.

use std::path::PathBuf;

use cutline_project_model::Project;

pub fn run(path: PathBuf) -> anyhow::Result<()> {
    let project =
        Project::load(&path).map_err(|e| anyhow::anyhow!("Failed to load project: {e}"))?;

    let errors = project.validate();
    if errors.is_empty() {
        println!("OK: {} is structurally valid", path.display());
        return Ok(());
    }

    eprintln!("{} problem(s) found:", errors.len());
    for error in &errors {
        eprintln!("  - {error}");
    }
    anyhow::bail!("project validation failed");
}
