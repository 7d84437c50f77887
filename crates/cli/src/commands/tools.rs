//! `patchchat tools` — List the registered tools.

use patchchat_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;
    let registry = patchchat_tools::default_registry(&config.gateway.downloads_dir);

    println!("Registered tools ({}):\n", registry.len());
    for decl in registry.declarations() {
        println!("  {:<22} {}", decl.name, decl.description);
    }

    Ok(())
}
