use crate::model::{CategoryLinkSet, ProgressState};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tapecrawl_scanner::ProductRecord;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error on {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("Invalid state file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to replace {}: {source}", .path.display())]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Owns the two on-disk state files: the category link map and the product
/// record list. Every save rewrites the whole file atomically.
#[derive(Debug, Clone)]
pub struct ProgressStore {
    links_path: PathBuf,
    products_path: PathBuf,
}

impl ProgressStore {
    pub fn new(links_path: impl Into<PathBuf>, products_path: impl Into<PathBuf>) -> Self {
        Self {
            links_path: links_path.into(),
            products_path: products_path.into(),
        }
    }

    pub fn links_path(&self) -> &Path {
        &self.links_path
    }

    pub fn products_path(&self) -> &Path {
        &self.products_path
    }

    /// Loads both files; a missing file is an empty state.
    pub fn load(&self) -> Result<ProgressState> {
        Ok(ProgressState::new(self.load_links()?, self.load_products()?))
    }

    pub fn save(&self, state: &ProgressState) -> Result<()> {
        self.save_links(&state.links)?;
        self.save_products(state.products())
    }

    pub fn load_links(&self) -> Result<CategoryLinkSet> {
        let links: CategoryLinkSet = read_json(&self.links_path)?;
        if !links.is_empty() {
            info!(
                "Loaded {} categories from {}",
                links.len(),
                self.links_path.display()
            );
        }
        Ok(links)
    }

    pub fn load_products(&self) -> Result<Vec<ProductRecord>> {
        let products: Vec<ProductRecord> = read_json(&self.products_path)?;
        if !products.is_empty() {
            info!(
                "Loaded {} products from {}",
                products.len(),
                self.products_path.display()
            );
        }
        Ok(products)
    }

    pub fn save_links(&self, links: &CategoryLinkSet) -> Result<()> {
        write_json(&self.links_path, links)?;
        debug!("Saved {} categories", links.len());
        Ok(())
    }

    pub fn save_products(&self, products: &[ProductRecord]) -> Result<()> {
        write_json(&self.products_path, products)?;
        debug!("Saved {} products", products.len());
        Ok(())
    }
}

fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if text.trim().is_empty() {
        return Ok(T::default());
    }

    serde_json::from_str(&text).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Write to a sibling temp file, then rename it over `path`.
fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let io_err = |source: io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(io_err)?;

    let mut json = serde_json::to_vec_pretty(value).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    json.push(b'\n');

    let mut tmp = NamedTempFile::new_in(dir).map_err(io_err)?;
    tmp.write_all(&json).map_err(io_err)?;
    tmp.as_file().sync_all().map_err(io_err)?;
    tmp.persist(path).map_err(|source| StoreError::Persist {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(())
}
