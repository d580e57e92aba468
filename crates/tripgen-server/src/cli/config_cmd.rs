use crate::cli::ConfigCommands;
use crate::config::{StoreBackend, TripgenConfig};
use anyhow::Result;
use std::path::Path;

pub async fn run(cmd: ConfigCommands, config_path: &Path) -> Result<()> {
    match cmd {
        ConfigCommands::Validate => validate(config_path),
        ConfigCommands::Show => show(config_path),
    }
}

fn validate(config_path: &Path) -> Result<()> {
    let config = match TripgenConfig::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            println!("Failed to parse {}: {:#}", config_path.display(), e);
            std::process::exit(1);
        }
    };

    let errors = config.validate();
    if !errors.is_empty() {
        println!("Validation errors in {}:", config_path.display());
        for e in &errors {
            println!("  - {}", e);
        }
        std::process::exit(1);
    }

    println!("{} is valid.", config_path.display());
    println!("  store backend: {}", backend_name(config.store.backend));
    println!("  model:         {}", config.generation.model);
    Ok(())
}

fn show(config_path: &Path) -> Result<()> {
    let config = TripgenConfig::load_or_default(config_path)?;
    match toml::to_string_pretty(&config) {
        Ok(s) => println!("{}", s),
        Err(e) => anyhow::bail!("Failed to serialize config: {}", e),
    }
    Ok(())
}

fn backend_name(backend: StoreBackend) -> &'static str {
    match backend {
        StoreBackend::Redb => "redb",
        StoreBackend::Firestore => "firestore",
        StoreBackend::Memory => "memory",
    }
}
