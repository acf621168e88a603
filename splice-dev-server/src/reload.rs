use std::path::{Component, Path};

use crate::LIVERELOAD_PATH;

/// Message that reloads every open page.
pub const RELOAD_ALL: &str = "*";

/// What a changed output file asks connected browsers to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reload {
    /// Reload browsers showing this URL path.
    Page(String),
    /// Stylesheets and scripts may be shared by any page.
    All,
}

impl Reload {
    /// Map a changed file under `root` to the pages it affects.
    ///
    /// `about/index.html` reloads `/about/`, `index.html` reloads `/`, and
    /// `.css`/`.js` files reload everything. Other files and paths outside
    /// `root` give `None`.
    pub fn for_path(root: &Path, path: &Path) -> Option<Reload> {
        let relative = path.strip_prefix(root).ok()?;
        let extension = relative.extension()?.to_str()?.to_ascii_lowercase();

        match extension.as_str() {
            "html" => page_url(relative).map(Reload::Page),
            "css" | "js" => Some(Reload::All),
            _ => None,
        }
    }

    /// Text sent over the WebSocket.
    pub fn message(&self) -> &str {
        match self {
            Reload::Page(url) => url,
            Reload::All => RELOAD_ALL,
        }
    }
}

/// The reloads for one batch of changed paths, without repeats. A batch that
/// touches any shared asset collapses to a single [`Reload::All`].
pub fn reloads_for<'a, I>(root: &Path, paths: I) -> Vec<Reload>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut reloads: Vec<Reload> = Vec::new();

    for reload in paths.into_iter().filter_map(|p| Reload::for_path(root, p)) {
        if reload == Reload::All {
            return vec![Reload::All];
        }
        if !reloads.contains(&reload) {
            reloads.push(reload);
        }
    }

    reloads
}

fn page_url(relative: &Path) -> Option<String> {
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(part) => segments.push(part.to_str()?),
            _ => return None,
        }
    }

    let file = segments.pop()?;
    let mut url = String::from("/");
    for segment in segments {
        url.push_str(segment);
        url.push('/');
    }
    if !file.eq_ignore_ascii_case("index.html") {
        url.push_str(file);
    }

    Some(url)
}

/// Add the live-reload client to a page, before the last `</body>` or at the
/// end when there is none.
///
/// The client connects back to whichever host served the page and reloads
/// on [`RELOAD_ALL`] or on a message naming its own path.
pub fn inject_livereload_script(html: &str) -> String {
    let script = format!(
        r#"
<script>
(function() {{
    const page = location.pathname.replace(/index\.html$/, '');
    const scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
    const socket = new WebSocket(scheme + location.host + '{LIVERELOAD_PATH}');
    socket.onmessage = function(event) {{
        if (event.data === '{RELOAD_ALL}' || event.data === page) {{
            location.reload();
        }}
    }};
}})();
</script>
"#
    );

    match html.rfind("</body>") {
        Some(pos) => {
            let mut out = String::with_capacity(html.len() + script.len());
            out.push_str(&html[..pos]);
            out.push_str(&script);
            out.push_str(&html[pos..]);
            out
        }
        None => format!("{html}{script}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn reload(path: &str) -> Option<Reload> {
        Reload::for_path(Path::new("/srv/dist"), &Path::new("/srv/dist").join(path))
    }

    #[test]
    fn html_changes_reload_their_own_page() {
        assert_eq!(reload("index.html"), Some(Reload::Page("/".into())));
        assert_eq!(reload("about/index.html"), Some(Reload::Page("/about/".into())));
        assert_eq!(
            reload("docs/guide/INDEX.HTML"),
            Some(Reload::Page("/docs/guide/".into()))
        );
        assert_eq!(reload("404.html"), Some(Reload::Page("/404.html".into())));
    }

    #[test]
    fn styles_and_scripts_reload_everything() {
        assert_eq!(reload("assets/site.css"), Some(Reload::All));
        assert_eq!(reload("assets/app.JS"), Some(Reload::All));
        assert_eq!(Reload::All.message(), "*");
    }

    #[test]
    fn other_files_do_not_reload() {
        assert_eq!(reload("assets/logo.png"), None);
        assert_eq!(reload("README"), None);
        assert_eq!(
            Reload::for_path(Path::new("/srv/dist"), Path::new("/tmp/index.html")),
            None
        );
    }

    #[test]
    fn batch_is_deduplicated() {
        let root = PathBuf::from("/srv/dist");
        let paths = [
            root.join("about/index.html"),
            root.join("index.html"),
            root.join("about/index.html"),
            root.join("assets/logo.png"),
        ];

        let reloads = reloads_for(&root, paths.iter().map(PathBuf::as_path));
        let messages: Vec<_> = reloads.iter().map(Reload::message).collect();
        assert_eq!(messages, vec!["/about/", "/"]);
    }

    #[test]
    fn shared_asset_collapses_batch_to_all() {
        let root = PathBuf::from("/srv/dist");
        let paths = [root.join("index.html"), root.join("assets/site.css")];

        let reloads = reloads_for(&root, paths.iter().map(PathBuf::as_path));
        assert_eq!(reloads, vec![Reload::All]);
    }

    #[test]
    fn injects_before_closing_body() {
        let html = inject_livereload_script("<html><body><p>hi</p></body></html>");
        let script_at = html.find("<script>").unwrap();
        assert!(script_at < html.find("</body>").unwrap());
        assert!(html.contains("location.host + '/__livereload'"));
        assert!(html.contains("event.data === '*'"));
        assert!(html.ends_with("</body></html>"));
    }

    #[test]
    fn appends_when_body_is_missing() {
        let html = inject_livereload_script("<p>fragment</p>");
        assert!(html.starts_with("<p>fragment</p>"));
        assert!(html.trim_end().ends_with("</script>"));
    }
}
