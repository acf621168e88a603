use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    /// `index.html` at the root of the source directory.
    Home,
    /// Any `pages/*.html` file.
    Regular,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Name used in the output URL, `index` for the home page.
    pub name: String,
    /// Location of the source file.
    pub path: PathBuf,
    pub page_type: PageType,
}

impl Page {
    /// Output location relative to the output directory.
    pub fn out_path(&self) -> PathBuf {
        match self.page_type {
            PageType::Home => PathBuf::from("index.html"),
            PageType::Regular => Path::new(&self.name).join("index.html"),
        }
    }
}
