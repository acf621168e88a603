use crate::tag::{PARAM_SEPARATOR, Params};

/// Replace every `:::KEY:::` placeholder for the keys in `params`.
///
/// Keys are applied one after another in mapping order, each replacing all
/// of its occurrences. Text inserted by an earlier key is never scanned by a
/// later one, so a value that happens to contain another key's placeholder
/// keeps it literally. Unknown placeholders are left alone.
pub fn apply_params(text: &str, params: &Params) -> String {
    let mut pieces = vec![Piece::Raw(text)];

    for (key, value) in params.iter() {
        let token = placeholder(key);
        let mut next = Vec::with_capacity(pieces.len());

        for piece in pieces {
            match piece {
                Piece::Raw(raw) if raw.contains(token.as_str()) => {
                    for (i, part) in raw.split(token.as_str()).enumerate() {
                        if i > 0 {
                            next.push(Piece::Inserted(value));
                        }
                        next.push(Piece::Raw(part));
                    }
                }
                other => next.push(other),
            }
        }

        pieces = next;
    }

    pieces.iter().map(Piece::as_str).collect()
}

/// Template text not yet touched, or a value that must stay as it is.
#[derive(Debug, Clone, Copy)]
enum Piece<'a> {
    Raw(&'a str),
    Inserted(&'a str),
}

impl<'a> Piece<'a> {
    fn as_str(&self) -> &'a str {
        match self {
            Piece::Raw(s) | Piece::Inserted(s) => s,
        }
    }
}

fn placeholder(key: &str) -> String {
    format!("{PARAM_SEPARATOR}{key}{PARAM_SEPARATOR}")
}
