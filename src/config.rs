//! Settings and credentials files.
//!
//! A `Config` is loaded once in `main` and handed to every component that needs it; there is
//! no global instance.
use crate::date_range::DateRange;
use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "configs/config.toml";
pub const CREDENTIALS_FILE: &str = "credentials.toml";
const DEFAULT_SEARCH_URL: &str = "https://api.daac.asf.alaska.edu/services/search/param";

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    pub aoi: Aoi,
    pub sentinel1: Sentinel1,
    #[serde(default)]
    pub catalog: CatalogSettings,
    #[serde(default)]
    pub paths: Paths,
    #[serde(skip)]
    root: PathBuf,
    #[serde(skip)]
    config_dir: PathBuf,
}

/// Area of interest, in degrees.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Aoi {
    #[serde(default)]
    pub name: String,
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Sentinel1 {
    #[serde(default = "default_platform")]
    pub platform: String,
    #[serde(default = "default_processing_level")]
    pub processing_level: String,
    #[serde(default = "default_beam_mode")]
    pub beam_mode: String,
    pub date_range: DateRange,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct CatalogSettings {
    #[serde(default = "default_search_url")]
    pub search_url: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            search_url: default_search_url(),
        }
    }
}

/// Directories relative to the project root.
#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct Paths {
    pub data_dir: String,
    pub raw_data_dir: String,
    pub processed_dir: String,
    pub output_dir: String,
    pub log_dir: String,
    pub temp_dir: String,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            raw_data_dir: "data/raw".to_string(),
            processed_dir: "data/processed".to_string(),
            output_dir: "outputs".to_string(),
            log_dir: "logs".to_string(),
            temp_dir: "temp".to_string(),
        }
    }
}

fn default_platform() -> String {
    "SENTINEL-1".to_string()
}

fn default_processing_level() -> String {
    "SLC".to_string()
}

fn default_beam_mode() -> String {
    "IW".to_string()
}

fn default_search_url() -> String {
    DEFAULT_SEARCH_URL.to_string()
}

impl Config {
    /// Reads the settings file and creates the configured directories.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let config = Self::read(path)?;
        config.setup_directories()?;
        Ok(config)
    }

    /// Reads the settings file without touching the filesystem otherwise.
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| Error::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| Error::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;

        // configs/config.toml -> project root is two levels up
        let config_dir = path.parent().unwrap_or(Path::new("")).to_path_buf();
        config.root = config_dir.parent().unwrap_or(Path::new("")).to_path_buf();
        config.config_dir = config_dir;
        Ok(config)
    }

    pub fn from_template(table: &toml::Table, root: &Path) -> Result<Self, Error> {
        let mut config: Self =
            toml::from_str(&table.to_string()).map_err(|source| Error::ConfigParse {
                path: root.to_path_buf(),
                source,
            })?;
        config.root = root.to_path_buf();
        config.config_dir = root.join("configs");
        Ok(config)
    }

    pub fn setup_directories(self: &Self) -> Result<(), Error> {
        let dirs = [
            self.data_dir(),
            self.raw_data_dir(),
            self.processed_dir(),
            self.output_dir(),
            self.log_dir(),
            self.temp_dir(),
        ];
        for path in dirs {
            fs::create_dir_all(&path).map_err(|source| Error::Directory { path, source })?;
        }
        Ok(())
    }

    pub fn root(self: &Self) -> &Path {
        &self.root
    }

    pub fn data_dir(self: &Self) -> PathBuf {
        self.root.join(&self.paths.data_dir)
    }

    pub fn raw_data_dir(self: &Self) -> PathBuf {
        self.root.join(&self.paths.raw_data_dir)
    }

    pub fn processed_dir(self: &Self) -> PathBuf {
        self.root.join(&self.paths.processed_dir)
    }

    pub fn output_dir(self: &Self) -> PathBuf {
        self.root.join(&self.paths.output_dir)
    }

    pub fn log_dir(self: &Self) -> PathBuf {
        self.root.join(&self.paths.log_dir)
    }

    pub fn temp_dir(self: &Self) -> PathBuf {
        self.root.join(&self.paths.temp_dir)
    }

    pub fn credentials_path(self: &Self) -> PathBuf {
        self.config_dir.join(CREDENTIALS_FILE)
    }

    pub fn date_range(self: &Self) -> DateRange {
        self.sentinel1.date_range
    }

    /// The AOI as a counter-clockwise WKT polygon starting at the south-east corner.
    pub fn aoi_wkt(self: &Self) -> String {
        let Aoi {
            min_lon,
            min_lat,
            max_lon,
            max_lat,
            ..
        } = self.aoi;
        format!(
            "POLYGON (({max_lon} {min_lat}, {max_lon} {max_lat}, {min_lon} {max_lat}, \
             {min_lon} {min_lat}, {max_lon} {min_lat}))"
        )
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct Credentials {
    #[serde(default)]
    pub asf: Option<Login>,
}

#[derive(Deserialize, Serialize, Clone, PartialEq)]
pub struct Login {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Login {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Login")
            .field("username", &self.username)
            .field("password", &"*".repeat(self.password.len()))
            .finish()
    }
}

impl Credentials {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::Credentials(format!(
                "credentials file not found: {}",
                path.display()
            )));
        }
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Credentials(format!("{}: {}", path.display(), e)))?;
        toml::from_str(&content)
            .map_err(|e| Error::Credentials(format!("{}: {}", path.display(), e)))
    }

    /// The ASF (Earthdata) login, if one with a username is present.
    pub fn asf_login(self: &Self) -> Result<Login, Error> {
        match &self.asf {
            Some(login) if !login.username.trim().is_empty() => Ok(login.clone()),
            _ => Err(Error::Credentials(
                "no [asf] username configured".to_string(),
            )),
        }
    }
}
