use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::locator::find_template;
use crate::params::apply_params;
use crate::tag::parse_tag;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Failed to search {dir} for templates: {source}")]
    ReadDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to read template {path}: {source}")]
    ReadTemplate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A directive that was dropped from the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    NotFound { name: String },
    AlreadyVisited { name: String, path: PathBuf },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NotFound { name } => {
                write!(f, "Skipping template '{}': not found", name)
            }
            Diagnostic::AlreadyVisited { name, path } => write!(
                f,
                "Skipping template '{}': {} was already included",
                name,
                path.display()
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    pub lines: Vec<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Expands template directives for one top-level file.
///
/// The visited set lives as long as the resolver and is shared by every
/// nested expansion, so a template is inlined at most once per file. Create
/// a new resolver for each file.
pub struct Resolver {
    base_dir: PathBuf,
    visited: HashSet<PathBuf>,
    diagnostics: Vec<Diagnostic>,
}

impl Resolver {
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        let base_dir = base_dir.as_ref();
        let base_dir = std::path::absolute(base_dir).unwrap_or_else(|_| base_dir.to_path_buf());

        Self {
            base_dir,
            visited: HashSet::new(),
            diagnostics: Vec::new(),
        }
    }

    pub fn resolve<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<Vec<String>, ResolveError> {
        let mut out = Vec::with_capacity(lines.len());

        for line in lines {
            let line = line.as_ref();
            let Some(tag) = parse_tag(line) else {
                out.push(line.to_string());
                continue;
            };

            let found = find_template(&self.base_dir, &tag.template_name).map_err(|source| {
                ResolveError::ReadDir {
                    dir: self.base_dir.clone(),
                    source,
                }
            })?;

            let path = match found {
                None => {
                    self.skip(Diagnostic::NotFound {
                        name: tag.template_name,
                    });
                    continue;
                }
                Some(path) if self.visited.contains(&path) => {
                    self.skip(Diagnostic::AlreadyVisited {
                        name: tag.template_name,
                        path,
                    });
                    continue;
                }
                Some(path) => path,
            };

            debug!("Including {} from {}", tag.template_name, path.display());
            self.visited.insert(path.clone());

            let raw = std::fs::read(&path)
                .map_err(|source| ResolveError::ReadTemplate { path, source })?;
            // Invalid UTF-8 becomes U+FFFD rather than failing the page.
            let content = apply_params(&String::from_utf8_lossy(&raw), &tag.params);

            let expanded = self.resolve(&split_lines(&content))?;
            out.extend(expanded);
        }

        Ok(out)
    }

    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    fn skip(&mut self, diagnostic: Diagnostic) {
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

/// Resolve `lines` against `base_dir` with a fresh visited set.
pub fn resolve<S: AsRef<str>, P: AsRef<Path>>(
    lines: &[S],
    base_dir: P,
) -> Result<Resolved, ResolveError> {
    let mut resolver = Resolver::new(base_dir);
    let lines = resolver.resolve(lines)?;

    Ok(Resolved {
        lines,
        diagnostics: resolver.finish(),
    })
}

/// Split on `\n`, dropping a `\r` in front of it. A trailing newline leaves
/// a trailing empty line.
pub fn split_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::{TempDir, tempdir};

    fn site(files: &[(&str, &str)]) -> TempDir {
        let dir = tempdir().unwrap();
        for (name, body) in files {
            let path = dir.path().join(name);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(path, body).unwrap();
        }
        dir
    }

    #[test]
    fn plain_lines_pass_through() {
        let dir = site(&[]);
        let lines = ["<html>", "  <body>", "<!-- comment -->", "</html>"];

        let resolved = resolve(&lines, dir.path()).unwrap();
        assert_eq!(resolved.lines, lines);
        assert!(resolved.diagnostics.is_empty());
    }

    #[test]
    fn inlines_simple_template() {
        let dir = site(&[("header.html", "<h1>Site</h1>")]);

        let resolved = resolve(&["<!-->HEADER<-->"], dir.path()).unwrap();
        assert_eq!(resolved.lines, vec!["<h1>Site</h1>"]);
    }

    #[test]
    fn inlines_template_with_params() {
        let dir = site(&[("card.html", "<div>:::TITLE:::-:::DESC:::</div>")]);

        let resolved = resolve(
            &["<!-->CARD:::TITLE:::(((Hi))):::DESC:::(((Yo)))<-->"],
            dir.path(),
        )
        .unwrap();
        assert_eq!(resolved.lines, vec!["<div>Hi-Yo</div>"]);
    }

    #[test]
    fn splices_multi_line_templates_in_place() {
        let dir = site(&[("nav.html", "<nav>\r\n  <a>Home</a>\r\n</nav>")]);

        let resolved = resolve(&["<body>", "  <!-->NAV<-->", "</body>"], dir.path()).unwrap();
        assert_eq!(
            resolved.lines,
            vec!["<body>", "<nav>", "  <a>Home</a>", "</nav>", "</body>"]
        );
    }

    #[test]
    fn resolves_nested_templates() {
        let dir = site(&[
            ("layout/header.html", "<header>\n<!-->LOGO:::ALT:::(((Acme)))<-->\n</header>"),
            ("partials/logo.html", "<img alt=\":::ALT:::\">"),
        ]);

        let resolved = resolve(&["<!-->HEADER<-->"], dir.path()).unwrap();
        assert_eq!(
            resolved.lines,
            vec!["<header>", "<img alt=\"Acme\">", "</header>"]
        );
    }

    #[test]
    fn drops_missing_template_with_diagnostic() {
        let dir = site(&[]);

        let resolved = resolve(&["a", "<!-->MISSING<-->", "b"], dir.path()).unwrap();
        assert_eq!(resolved.lines, vec!["a", "b"]);
        assert_eq!(
            resolved.diagnostics,
            vec![Diagnostic::NotFound {
                name: "missing".to_string()
            }]
        );
    }

    #[test]
    fn self_reference_terminates() {
        let dir = site(&[("loop.html", "before\n<!-->LOOP<-->\nafter")]);

        let resolved = resolve(&["<!-->LOOP<-->"], dir.path()).unwrap();
        assert_eq!(resolved.lines, vec!["before", "after"]);
        assert_eq!(resolved.diagnostics.len(), 1);
        assert!(matches!(
            &resolved.diagnostics[0],
            Diagnostic::AlreadyVisited { name, .. } if name == "loop"
        ));
    }

    #[test]
    fn mutual_recursion_terminates() {
        let dir = site(&[("a.html", "a\n<!-->B<-->"), ("b.html", "b\n<!-->A<-->")]);

        let resolved = resolve(&["<!-->A<-->"], dir.path()).unwrap();
        assert_eq!(resolved.lines, vec!["a", "b"]);
        assert_eq!(resolved.diagnostics.len(), 1);
    }

    #[test]
    fn template_is_expanded_once_per_resolution() {
        let dir = site(&[
            ("page.html", "<!-->LEFT<-->\n<!-->RIGHT<-->"),
            ("left.html", "left\n<!-->ICON<-->"),
            ("right.html", "right\n<!-->ICON<-->"),
            ("icon.html", "*"),
        ]);

        let resolved = resolve(&["<!-->PAGE<-->", "<!-->ICON<-->"], dir.path()).unwrap();
        assert_eq!(resolved.lines, vec!["left", "*", "right"]);
        assert_eq!(resolved.diagnostics.len(), 2);
    }

    #[test]
    fn fresh_resolver_has_its_own_visited_set() {
        let dir = site(&[("header.html", "<h1>Site</h1>")]);

        let first = resolve(&["<!-->HEADER<-->"], dir.path()).unwrap();
        let second = resolve(&["<!-->HEADER<-->"], dir.path()).unwrap();
        assert_eq!(first.lines, second.lines);
        assert!(second.diagnostics.is_empty());
    }

    #[test]
    fn ignores_templates_inside_pages_dir() {
        let dir = site(&[("pages/about.html", "<p>About</p>")]);

        let resolved = resolve(&["<!-->ABOUT<-->"], dir.path()).unwrap();
        assert!(resolved.lines.is_empty());
        assert_eq!(resolved.diagnostics.len(), 1);
    }

    #[test]
    fn missing_base_dir_is_fatal() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("src");

        let err = resolve(&["<!-->HEADER<-->"], &missing).unwrap_err();
        assert!(matches!(err, ResolveError::ReadDir { .. }));
    }

    #[test]
    fn missing_base_dir_is_fine_without_directives() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("src");

        let resolved = resolve(&["<p>static</p>"], &missing).unwrap();
        assert_eq!(resolved.lines, vec!["<p>static</p>"]);
    }

    #[test]
    fn template_with_invalid_utf8_is_decoded_lossily() {
        let dir = site(&[]);
        fs::write(dir.path().join("menu.html"), b"caf\xe9 <b>ok</b>").unwrap();

        let resolved = resolve(&["<!-->MENU<-->"], dir.path()).unwrap();
        assert_eq!(resolved.lines, vec!["caf\u{FFFD} <b>ok</b>"]);
        assert!(resolved.diagnostics.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_template_is_fatal() {
        let dir = site(&[]);
        std::os::unix::fs::symlink(dir.path().join("nowhere.html"), dir.path().join("broken.html"))
            .unwrap();

        let err = resolve(&["<p>before</p>", "<!-->BROKEN<-->"], dir.path()).unwrap_err();
        match err {
            ResolveError::ReadTemplate { path, .. } => {
                assert!(path.ends_with("broken.html"));
            }
            other => panic!("expected ReadTemplate, got {other:?}"),
        }
    }

    #[test]
    fn split_lines_handles_crlf_and_trailing_newline() {
        assert_eq!(split_lines("a\r\nb\nc"), vec!["a", "b", "c"]);
        assert_eq!(split_lines("a\n"), vec!["a", ""]);
        assert_eq!(split_lines(""), vec![""]);
    }
}
