use anyhow::Context;
use cueboard_core::{config::Config, io, paths, store::ActionDb};
use std::path::Path;

const CATALOG_TEMPLATE: &str = "\
# Display names offered by each plugin, as {id, name} pairs.
# streaming:
#   scenes:
#     - id: scene-1
#       name: Intro
# avatar:
#   models: []
#   expressions: []
#   hotkeys: []
{}
";

pub fn run(root: &Path) -> anyhow::Result<()> {
    let project_name = root
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());

    println!("Initializing cueboard in: {}", root.display());

    let dir = paths::cueboard_dir(root);
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;

    let config = if paths::config_path(root).exists() {
        println!("  exists:  {}", paths::CONFIG_FILE);
        Config::load(root).context("failed to load config")?
    } else {
        let config = Config::new(&project_name);
        config.save(root).context("failed to write config.yaml")?;
        println!("  created: {}", paths::CONFIG_FILE);
        config
    };

    let catalog = config.catalog_path(root);
    let created = io::write_if_missing(&catalog, CATALOG_TEMPLATE.as_bytes())
        .with_context(|| format!("failed to write {}", catalog.display()))?;
    report(created, &config.resolver.catalog);

    let store = config.store_path(root);
    let existed = store.exists();
    ActionDb::open(&store).with_context(|| format!("failed to open {}", store.display()))?;
    report(!existed, &config.store.path);

    println!("\ncueboard initialized. Next: cueboard config enable streaming|avatar");
    Ok(())
}

fn report(created: bool, path: &str) {
    if created {
        println!("  created: {path}");
    } else {
        println!("  exists:  {path}");
    }
}
