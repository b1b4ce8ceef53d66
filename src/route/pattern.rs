use std::{
    fmt::{self, Display, Formatter},
    sync::Arc,
};

use super::{bindings::NameSlot, Bindings, Matcher, MethodSet};
use crate::{error::ParsePatternError, http::Method, utils::unescape, Request};

/// Bytes that can end a capture. `/` is the path separator, `.` usually
/// delimits a file extension, and `;` and `,` are suggested by section 3.3
/// of RFC 3986. They never appear in capture names.
const BREAKS: &[u8] = b"/.;,";

#[inline]
fn is_break(c: u8) -> bool {
    BREAKS.contains(&c)
}

#[derive(Debug, Clone, Eq, PartialEq)]
struct Capture {
    name: String,
    brk: u8,
}

/// A [`Matcher`] that matches request paths against a pattern with named
/// captures.
///
/// # Quick reference
///
/// ```text
/// Pattern         Matches             Does not match
///
/// /               /                   /hello
///
/// /hello          /hello              /hi
///                                     /hello/
///
/// /user/:name     /user/carl          /user/carl/photos
///                 /user/alice         /user/carl/
///                                     /user/
///
/// /:file.:ext     /data.json          /.json
///                 /info.txt           /data.
///                 /data.tar.gz        /data.json/download
///
/// /user/*         /user/              /user
///                 /user/carl
///                 /user/carl/photos
/// ```
///
/// # Static paths
///
/// Most paths can be written directly: `/hello` matches exactly that path
/// (`/hello/` is a different path). Patterns operate on the escaped form of
/// the path, so characters that appear escaped in a URL must be written in
/// their percent-encoded form.
///
/// # Named captures
///
/// A `:` that follows one of the break characters `/`, `.`, `;` or `,`
/// starts a capture, which is named by the run of characters up to the next
/// break character. A capture accepts any non-empty value up to the break
/// character that follows it in the pattern (or `/` for a capture at the end
/// of the pattern), and never crosses a `/`. For `/:file.:ext` the path
/// `/data.tar.gz` binds `file` to `data` and `ext` to `tar.gz`.
///
/// Captured values are percent-decoded. A value with a malformed escape makes
/// the pattern not match. Names must be unique within a pattern.
///
/// # Prefix matches
///
/// A pattern ending in `/*` matches any path that starts with the text
/// before the `*`. The unmatched suffix, including its leading `/`, becomes
/// the [remaining path](Bindings::remaining_path), which a nested
/// [`Mux`](crate::Mux) routes on. For `/user/*` and the path
/// `/user/carl/photos`, the remaining path is `/carl/photos`.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    methods: Option<MethodSet>,
    // One more literal than captures, interleaved as
    // literal, capture, literal, ..., literal.
    literals: Vec<String>,
    captures: Vec<Capture>,
    names: Arc<[NameSlot]>,
    wildcard: bool,
}

impl Pattern {
    /// Compiles a pattern.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid. Use [`Pattern::try_new`] to handle
    /// the error instead.
    pub fn new(pattern: impl AsRef<str>) -> Self {
        match Self::try_new(pattern) {
            Ok(pattern) => pattern,
            Err(err) => panic!("{}", err),
        }
    }

    /// Compiles a pattern, returning an error if it is invalid.
    pub fn try_new(pattern: impl AsRef<str>) -> Result<Self, ParsePatternError> {
        let raw = pattern.as_ref();
        let (spec, wildcard) = match raw.strip_suffix("/*") {
            Some(spec) => (&raw[..spec.len() + 1], true),
            None => (raw, false),
        };

        let bytes = spec.as_bytes();
        let mut literals = Vec::new();
        let mut captures = Vec::new();
        let mut start = 0;
        let mut i = 0;

        while i + 2 < bytes.len() {
            if !(is_break(bytes[i]) && bytes[i + 1] == b':' && !is_break(bytes[i + 2])) {
                i += 1;
                continue;
            }

            let name_start = i + 2;
            let name_end = bytes[name_start..]
                .iter()
                .position(|c| is_break(*c))
                .map(|n| name_start + n)
                .unwrap_or(bytes.len());

            literals.push(spec[start..i + 1].to_string());
            captures.push(Capture {
                name: spec[name_start..name_end].to_string(),
                brk: bytes.get(name_end).copied().unwrap_or(b'/'),
            });
            start = name_end;
            i = name_end;
        }
        literals.push(spec[start..].to_string());

        let mut names = captures
            .iter()
            .enumerate()
            .map(|(slot, capture)| NameSlot {
                name: capture.name.clone(),
                slot,
            })
            .collect::<Vec<_>>();
        names.sort_by(|a, b| a.name.cmp(&b.name));
        if let Some(dup) = names.windows(2).find(|w| w[0].name == w[1].name) {
            return Err(ParsePatternError::DuplicateName {
                pattern: raw.to_string(),
                name: dup[0].name.clone(),
            });
        }

        Ok(Self {
            raw: raw.to_string(),
            methods: None,
            literals,
            captures,
            names: names.into(),
            wildcard,
        })
    }

    /// Restricts this pattern to the given methods.
    ///
    /// A pattern that accepts `GET` also accepts `HEAD`.
    #[must_use]
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = Method>) -> Self {
        let mut set = methods.into_iter().collect::<MethodSet>();
        if set.contains(&Method::GET) {
            set.insert(Method::HEAD);
        }
        self.methods = Some(set);
        self
    }

    /// Returns `true` if this pattern ends with `/*`.
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.wildcard
    }

    /// Returns the capture names in the order they appear in the pattern.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.captures.iter().map(|capture| capture.name.as_str())
    }

    fn match_path(&self, mut path: &str) -> Option<(Vec<String>, Option<String>)> {
        let mut raw_values = Vec::with_capacity(self.captures.len());

        for (literal, capture) in self.literals.iter().zip(&self.captures) {
            path = path.strip_prefix(literal.as_str())?;

            let len = path
                .bytes()
                .position(|c| c == capture.brk || c == b'/')
                .unwrap_or(path.len());
            // Captures are never empty, otherwise `/:name` would match `/`.
            if len == 0 {
                return None;
            }

            raw_values.push(&path[..len]);
            path = &path[len..];
        }

        let tail = &self.literals[self.captures.len()];
        let remaining = if self.wildcard {
            if !path.starts_with(tail.as_str()) {
                return None;
            }
            Some(path[tail.len() - 1..].to_string())
        } else if path != tail {
            return None;
        } else {
            None
        };

        let values = raw_values
            .into_iter()
            .map(unescape)
            .collect::<Option<Vec<_>>>()?;
        Some((values, remaining))
    }
}

impl Display for Pattern {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl Matcher for Pattern {
    fn matches(&self, req: &Request) -> Option<Bindings> {
        if let Some(methods) = &self.methods {
            if !methods.contains(req.method()) {
                return None;
            }
        }

        let (values, remaining) = self.match_path(req.path())?;
        Some(
            req.bindings()
                .with_captures(self.names.clone(), values, remaining),
        )
    }

    fn methods(&self) -> Option<&MethodSet> {
        self.methods.as_ref()
    }

    fn prefix(&self) -> &str {
        &self.literals[0]
    }
}

macro_rules! define_method_pattern {
    ($($(#[$docs:meta])* ($name:ident, $($method:ident),+);)*) => {
        $(
        $(#[$docs])*
        ///
        /// # Panics
        ///
        /// Panics if the pattern is invalid.
        pub fn $name(pattern: impl AsRef<str>) -> Pattern {
            Pattern::new(pattern).with_methods([$(Method::$method),+])
        }
        )*
    };
}

define_method_pattern!(
    /// Returns a pattern that matches `GET` and `HEAD` requests.
    (get, GET, HEAD);
    /// Returns a pattern that matches `HEAD` requests.
    (head, HEAD);
    /// Returns a pattern that matches `POST` requests.
    (post, POST);
    /// Returns a pattern that matches `PUT` requests.
    (put, PUT);
    /// Returns a pattern that matches `DELETE` requests.
    (delete, DELETE);
    /// Returns a pattern that matches `PATCH` requests.
    (patch, PATCH);
    /// Returns a pattern that matches `OPTIONS` requests.
    (options, OPTIONS);
);
