use std::path::{Path, PathBuf};

/// Directory holding the per-page sources. Never searched for templates.
pub const PAGES_DIR: &str = "pages";

pub const TEMPLATE_EXTENSION: &str = "html";

/// Find the template file for `name` anywhere below `base_dir`.
///
/// Depth-first in directory listing order, descending into a subdirectory as
/// soon as it is listed. The first file whose name matches `NAME.html`
/// case-insensitively wins; later matches are shadowed.
pub fn find_template(base_dir: &Path, name: &str) -> std::io::Result<Option<PathBuf>> {
    let wanted = format!("{}.{}", name.to_lowercase(), TEMPLATE_EXTENSION);
    search(base_dir, &wanted)
}

fn search(dir: &Path, wanted: &str) -> std::io::Result<Option<PathBuf>> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        let file_name = file_name.to_string_lossy();

        if entry.file_type()?.is_dir() {
            if file_name == PAGES_DIR {
                continue;
            }
            if let Some(found) = search(&entry.path(), wanted)? {
                return Ok(Some(found));
            }
        } else if file_name.to_lowercase() == wanted {
            return Ok(Some(entry.path()));
        }
    }

    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn finds_template_in_base_dir() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("header.html"), "<h1>Site</h1>").unwrap();

        let found = find_template(dir.path(), "header").unwrap();
        assert_eq!(found, Some(dir.path().join("header.html")));
    }

    #[test]
    fn matches_file_name_case_insensitively() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Header.HTML"), "").unwrap();

        let found = find_template(dir.path(), "header").unwrap();
        assert_eq!(found, Some(dir.path().join("Header.HTML")));
    }

    #[test]
    fn searches_nested_directories() {
        let dir = tempdir().unwrap();
        let nested = dir.path().join("partials").join("layout");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("footer.html"), "").unwrap();

        let found = find_template(dir.path(), "footer").unwrap();
        assert_eq!(found, Some(nested.join("footer.html")));
    }

    #[test]
    fn never_looks_inside_pages_dir() {
        let dir = tempdir().unwrap();
        let pages = dir.path().join(PAGES_DIR);
        fs::create_dir_all(&pages).unwrap();
        fs::write(pages.join("about.html"), "").unwrap();

        assert_eq!(find_template(dir.path(), "about").unwrap(), None);
    }

    #[test]
    fn only_matches_html_extension() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("card.htm"), "").unwrap();
        fs::write(dir.path().join("card.txt"), "").unwrap();

        assert_eq!(find_template(dir.path(), "card").unwrap(), None);
    }

    #[test]
    fn missing_template_is_none() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("header.html"), "").unwrap();

        assert_eq!(find_template(dir.path(), "footer").unwrap(), None);
    }

    #[test]
    fn missing_base_dir_is_an_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("nope");

        assert!(find_template(&missing, "header").is_err());
    }
}
