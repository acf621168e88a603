use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::locator::{PAGES_DIR, TEMPLATE_EXTENSION};
use crate::site::{Page, PageType};

pub const HOME_PAGE: &str = "index.html";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
}

pub struct SiteScanner {
    source_dir: PathBuf,
}

impl SiteScanner {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            source_dir: path.as_ref().to_path_buf(),
        }
    }

    /// Home page first, then the pages directory sorted by file name.
    pub fn scan(&self) -> Result<Vec<Page>, ScanError> {
        debug!("Scanning: {}", self.source_dir.display());

        let mut pages = Vec::new();
        if let Some(home) = self.scan_home() {
            pages.push(home);
        }
        pages.extend(self.scan_pages()?);

        Ok(pages)
    }

    fn scan_home(&self) -> Option<Page> {
        let path = self.source_dir.join(HOME_PAGE);
        if !path.is_file() {
            warn!("No {} found in {}", HOME_PAGE, self.source_dir.display());
            return None;
        }

        Some(Page {
            name: "index".into(),
            path,
            page_type: PageType::Home,
        })
    }

    pub fn scan_pages(&self) -> Result<Vec<Page>, ScanError> {
        let pages_dir = self.source_dir.join(PAGES_DIR);
        if !pages_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut pages = Vec::new();
        for entry in std::fs::read_dir(&pages_dir)? {
            let entry = entry?;
            let path = entry.path();

            // Only html files directly inside the pages directory
            if path.is_file() && get_extension(&path) == TEMPLATE_EXTENSION {
                pages.push(self.scan_page(path)?);
            }
        }
        pages.sort_by(|a, b| a.path.cmp(&b.path));

        Ok(pages)
    }

    fn scan_page(&self, path: PathBuf) -> Result<Page, ScanError> {
        let name = path
            .file_stem()
            .ok_or_else(|| ScanError::InvalidPath(path.clone()))?
            .to_string_lossy()
            .to_string();

        Ok(Page {
            name,
            path,
            page_type: PageType::Regular,
        })
    }
}

fn get_extension(path: &Path) -> String {
    match path.extension() {
        Some(ext) => ext.to_string_lossy().to_string(),
        None => "Unknown".into(),
    }
}
