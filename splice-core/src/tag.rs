use std::sync::LazyLock;

use regex::Regex;

pub const TAG_OPEN: &str = "<!-->";
pub const TAG_CLOSE: &str = "<-->";
pub const PARAM_SEPARATOR: &str = ":::";

static TEMPLATE_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9_]+").expect("template name pattern is valid"));

// Non-greedy and allowed to cross line breaks.
static PARAM_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\(\(\((.*?)\)\)\)").expect("param value pattern is valid"));

/// Ordered key/value pairs captured from a directive.
///
/// Keys keep the position of their first appearance. Inserting a key twice
/// replaces the earlier value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    entries: Vec<(String, String)>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) {
        let key = key.into();
        let value = value.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.insert(k, v);
        }
        params
    }
}

/// A line that asks for a named template to be inlined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagDirective {
    /// Lowercased template name, i.e. the file stem to look for.
    pub template_name: String,
    pub params: Params,
}

/// Parse a single line as a template directive.
///
/// The trimmed line has to be a directive in its entirety:
///
/// ```text
/// <!-->NAME<-->
/// <!-->NAME:::KEY:::(((VALUE))):::KEY2:::(((VALUE2)))<-->
/// ```
///
/// Returns `None` for anything else. Keys whose segment is missing or
/// carries no `(((...)))` group are dropped.
pub fn parse_tag(line: &str) -> Option<TagDirective> {
    let body = line
        .trim()
        .strip_prefix(TAG_OPEN)?
        .strip_suffix(TAG_CLOSE)?;

    let name = TEMPLATE_NAME.find(body)?;
    let rest = &body[name.end()..];

    let mut params = Params::new();
    if !rest.is_empty() {
        let pairs = rest.strip_prefix(PARAM_SEPARATOR)?;
        let parts: Vec<&str> = pairs.split(PARAM_SEPARATOR).collect();
        // At least one KEY:::SEGMENT pair.
        if parts.len() < 2 {
            return None;
        }

        for pair in parts.chunks(2) {
            let key = pair[0];
            let value = pair
                .get(1)
                .and_then(|segment| PARAM_VALUE.captures(segment))
                .and_then(|c| c.get(1));

            if let Some(value) = value {
                params.insert(key, value.as_str());
            }
        }
    }

    Some(TagDirective {
        template_name: name.as_str().to_lowercase(),
        params,
    })
}
