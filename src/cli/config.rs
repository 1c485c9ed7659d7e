use crate::destination::Destination;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, fs::File, path::PathBuf};

#[derive(Debug, Deserialize)]
pub struct Config {
    pub destinations: BTreeMap<String, Destination>,
}

impl Config {
    /// # Errors
    ///
    /// Will return `Err` if the file can't be read or parsed
    pub fn new(config_path: PathBuf) -> Result<Self> {
        let file = File::open(&config_path)
            .with_context(|| format!("unable to open {}", config_path.display()))?;

        let mut config: Self =
            serde_yaml_ng::from_reader(file).context("unable to parse config file")?;

        for (name, destination) in &mut config.destinations {
            destination.name.clone_from(name);
        }

        Ok(config)
    }

    /// Get the destination from the config.yml
    ///
    /// # Errors
    ///
    /// Will return `Err` if there is no destination called `name`
    pub fn get_destination(&self, name: &str) -> Result<&Destination> {
        self.destinations
            .get(name)
            .with_context(|| format!("could not find destination {name}"))
    }
}
