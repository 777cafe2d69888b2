use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::model::city::City;
use crate::model::talent::Talent;

#[derive(Debug, Error)]
pub enum DataError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Loads the city table, a JSON array of city records.
pub fn load_cities(path: &Path) -> Result<Vec<City>, DataError> {
    let cities: Vec<City> = load_json(path)?;
    info!("Loaded {} cities from {}", cities.len(), path.display());
    Ok(cities)
}

/// Loads the talent pool, a JSON array of `{name, effect}` records.
pub fn load_talents(path: &Path) -> Result<Vec<Talent>, DataError> {
    let talents: Vec<Talent> = load_json(path)?;
    info!("Loaded {} talents from {}", talents.len(), path.display());
    Ok(talents)
}

fn load_json<T: DeserializeOwned>(path: &Path) -> Result<T, DataError> {
    let raw = fs::read_to_string(path).map_err(|source| DataError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| DataError::Json {
        path: path.to_path_buf(),
        source,
    })
}
