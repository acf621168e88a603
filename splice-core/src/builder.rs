use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::base_url::{BuildMode, rewrite_base_url};
use crate::config::Config;
use crate::resolver::{Diagnostic, ResolveError, Resolver, split_lines};
use crate::scanner::{ScanError, SiteScanner};
use crate::site::Page;

pub const ASSETS_DIR: &str = "assets";

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Source directory not specified")]
    MissingSourceDir,
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
    #[error("Scan error: {0}")]
    ScanError(#[from] ScanError),
    #[error("Failed to resolve {}: {source}", path.display())]
    ResolveError {
        path: PathBuf,
        #[source]
        source: ResolveError,
    },
    #[error("IO error on {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl BuildError {
    fn io(path: &Path) -> impl FnOnce(std::io::Error) -> BuildError + '_ {
        move |source| BuildError::IoError {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Applied to every page's final HTML before it is written.
pub type PageFilter = Box<dyn Fn(&Path, String) -> String + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPage {
    pub source: PathBuf,
    pub output: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Default)]
pub struct BuildReport {
    pub pages: Vec<BuiltPage>,
}

impl BuildReport {
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.pages.iter().flat_map(|p| p.diagnostics.iter())
    }
}

pub struct SiteBuilder {
    source_dir: Option<PathBuf>,
    output_dir: PathBuf,
    mode: BuildMode,
    base_url: String,
    page_filter: Option<PageFilter>,
}

impl Default for SiteBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SiteBuilder {
    pub fn new() -> Self {
        Self {
            source_dir: None,
            output_dir: PathBuf::from("./dist"),
            mode: BuildMode::default(),
            base_url: String::new(),
            page_filter: None,
        }
    }

    // Required configuration
    pub fn source_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn output_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.output_dir = path.as_ref().to_path_buf();
        self
    }

    pub fn mode(mut self, mode: BuildMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn config(self, config: &Config) -> Self {
        self.mode(config.mode).base_url(config.site.base_url.clone())
    }

    pub fn page_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&Path, String) -> String + Send + Sync + 'static,
    {
        self.page_filter = Some(Box::new(filter));
        self
    }

    pub fn build(self) -> Result<Site, BuildError> {
        let source_dir = self.source_dir.ok_or(BuildError::MissingSourceDir)?;

        Ok(Site {
            source_dir,
            output_dir: self.output_dir,
            mode: self.mode,
            base_url: self.base_url,
            page_filter: self.page_filter,
        })
    }
}

pub struct Site {
    source_dir: PathBuf,
    output_dir: PathBuf,
    mode: BuildMode,
    base_url: String,
    page_filter: Option<PageFilter>,
}

impl Site {
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn assets_dir(&self) -> PathBuf {
        self.source_dir.join(ASSETS_DIR)
    }

    /// Pages are rebuilt from scratch on every call, each with its own
    /// resolver.
    pub fn build_pages(&self) -> Result<BuildReport, BuildError> {
        let pages = SiteScanner::new(&self.source_dir).scan()?;
        let mut report = BuildReport::default();

        for page in &pages {
            report.pages.push(self.build_page(page)?);
        }

        Ok(report)
    }

    fn build_page(&self, page: &Page) -> Result<BuiltPage, BuildError> {
        let output_path = self.output_dir.join(page.out_path());

        let bytes = std::fs::read(&page.path).map_err(BuildError::io(&page.path))?;
        let text = String::from_utf8_lossy(&bytes);

        let mut resolver = Resolver::new(&self.source_dir);
        let resolved = resolver
            .resolve(&split_lines(&text))
            .map_err(|source| BuildError::ResolveError {
                path: page.path.clone(),
                source,
            })?;

        let lines = rewrite_base_url(
            &resolved,
            &output_path,
            &self.output_dir,
            self.mode,
            &self.base_url,
        );

        let mut html = lines.join("\n");
        if let Some(filter) = &self.page_filter {
            html = filter(&output_path, html);
        }

        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(BuildError::io(parent))?;
        }
        std::fs::write(&output_path, html).map_err(BuildError::io(&output_path))?;
        info!("Built: {}", output_path.display());

        Ok(BuiltPage {
            source: page.path.clone(),
            output: output_path,
            diagnostics: resolver.finish(),
        })
    }

    /// Mirror the source assets directory into the output. Returns the number
    /// of files copied.
    pub fn copy_assets(&self) -> Result<usize, BuildError> {
        let src = self.assets_dir();
        let dest = self.output_dir.join(ASSETS_DIR);

        if !src.is_dir() {
            warn!("No {} folder to copy", src.display());
            return Ok(0);
        }

        let mut copied = 0;
        for entry in WalkDir::new(&src) {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(src.as_path()).to_path_buf();
                BuildError::IoError {
                    path,
                    source: e.into(),
                }
            })?;

            let relative = entry
                .path()
                .strip_prefix(&src)
                .map_err(|_| BuildError::InvalidPath(entry.path().to_path_buf()))?;
            let target = dest.join(relative);

            if entry.file_type().is_dir() {
                std::fs::create_dir_all(&target).map_err(BuildError::io(&target))?;
            } else {
                std::fs::copy(entry.path(), &target).map_err(BuildError::io(entry.path()))?;
                copied += 1;
            }
        }

        info!("Copied {} to {}", src.display(), dest.display());
        Ok(copied)
    }

    pub fn render_all(&self) -> Result<BuildReport, BuildError> {
        if !self.source_dir.is_dir() {
            return Err(BuildError::InvalidPath(self.source_dir.clone()));
        }
        std::fs::create_dir_all(&self.output_dir).map_err(BuildError::io(&self.output_dir))?;

        let report = self.build_pages()?;
        self.copy_assets()?;

        Ok(report)
    }
}

/// Build every page and copy assets using `config`.
pub fn build_site(
    config: &Config,
    source_dir: &Path,
    output_dir: &Path,
) -> Result<BuildReport, BuildError> {
    let site = SiteBuilder::new()
        .source_dir(source_dir)
        .output_dir(output_dir)
        .config(config)
        .build()?;

    site.render_all()
}
