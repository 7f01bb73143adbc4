//! Create a new empty project.

use std::path::PathBuf;

use cutline_project_model::Project;

pub fn run(name: String, output: PathBuf) -> anyhow::Result<()> {
    let path = output.join(format!("{name}.json"));
    if path.exists() {
        anyhow::bail!("Refusing to overwrite existing project at {}", path.display());
    }

    let mut project = Project::new(&name);
    project
        .save(&path)
        .map_err(|e| anyhow::anyhow!("Failed to save project: {e}"))?;

    println!("Created project '{name}' at {}", path.display());
    Ok(())
}
