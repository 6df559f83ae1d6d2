//! Init 命令

use anyhow::{Result, bail};
use oclkit_core::{CriteriaSection, DeviceCriteria, OclKitConfig};
use std::path::Path;

pub fn run(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!(
            "Configuration already exists at {} (use --force to overwrite)",
            path.display()
        );
    }

    let config = OclKitConfig {
        criteria: CriteriaSection::from_criteria(&DeviceCriteria::default()),
        ..Default::default()
    };
    config.save(path)?;

    println!("Configuration initialized at: {}", path.display());
    println!("\nDefault criteria:");
    println!("  device: {}", config.criteria.device.as_deref().unwrap_or("any"));
    println!("  platform: {}", config.criteria.platform.as_deref().unwrap_or("any"));
    println!("  preference: {}", config.criteria.preference.as_deref().unwrap_or("none"));
    println!("\nEdit the configuration file to change the default device criteria.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("oclkit").join("config.json");

        run(&path, false).unwrap();
        let config = OclKitConfig::load(&path).unwrap();
        assert_eq!(config.default_criteria(), DeviceCriteria::default());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        run(&path, false).unwrap();
        assert!(run(&path, false).is_err());
        assert!(run(&path, true).is_ok());
    }
}
