use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const BASE_URL_TOKEN: &str = "BASE_URL";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
    /// Links are relative to the page so the output works from any root.
    Development,
    /// Links use the configured base URL.
    #[default]
    Production,
}

/// The string that replaces `BASE_URL` in the page written to `output_path`.
pub fn base_for(
    output_path: &Path,
    output_root: &Path,
    mode: BuildMode,
    production_base: &str,
) -> String {
    match mode {
        BuildMode::Production => production_base.to_string(),
        BuildMode::Development => {
            let page_dir = output_path.parent().unwrap_or(Path::new("."));
            let relative = relative_path(&absolute(page_dir), &absolute(output_root));
            let relative = relative.to_string_lossy().replace('\\', "/");

            if relative.is_empty() {
                ".".to_string()
            } else {
                relative
            }
        }
    }
}

pub fn rewrite_base_url<S: AsRef<str>>(
    lines: &[S],
    output_path: &Path,
    output_root: &Path,
    mode: BuildMode,
    production_base: &str,
) -> Vec<String> {
    let base = base_for(output_path, output_root, mode, production_base);

    lines
        .iter()
        .map(|line| line.as_ref().replace(BASE_URL_TOKEN, &base))
        .collect()
}

fn absolute(path: &Path) -> PathBuf {
    let path = if path.as_os_str().is_empty() {
        Path::new(".")
    } else {
        path
    };
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Lexical path from `from` to `to`. Both are expected to be absolute.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from.components().filter(|c| *c != Component::CurDir).collect();
    let to: Vec<Component> = to.components().filter(|c| *c != Component::CurDir).collect();

    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for component in &to[common..] {
        out.push(component.as_os_str());
    }
    out
}
