use std::{
    collections::BTreeMap,
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use super::Matcher;
use crate::endpoint::ArcEndpoint;

/// A capture name and the position of its value in a match.
#[derive(Debug, Clone, Eq, PartialEq)]
pub(crate) struct NameSlot {
    pub(crate) name: String,
    pub(crate) slot: usize,
}

enum Entry {
    Path(String),
    Captures {
        names: Arc<[NameSlot]>,
        values: Vec<String>,
        remaining: Option<String>,
    },
    Param {
        name: String,
        value: String,
    },
    Matcher(Option<Arc<dyn Matcher>>),
    Handler(Option<ArcEndpoint>),
}

struct Frame {
    entry: Entry,
    parent: Bindings,
}

/// The values produced by routing a request.
///
/// `Bindings` is an immutable chain of frames. Every `with_*` method returns
/// a new chain that shares its parent, so a value is never modified after the
/// matching step that created it, and cloning is cheap. Lookups walk the
/// chain from the newest frame to the oldest, which lets a nested router
/// override what an outer router bound.
#[derive(Clone, Default)]
pub struct Bindings(Option<Arc<Frame>>);

struct Frames<'a>(Option<&'a Frame>);

impl<'a> Iterator for Frames<'a> {
    type Item = &'a Frame;

    fn next(&mut self) -> Option<Self::Item> {
        let frame = self.0?;
        self.0 = frame.parent.0.as_deref();
        Some(frame)
    }
}

impl Bindings {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, entry: Entry) -> Self {
        Bindings(Some(Arc::new(Frame {
            entry,
            parent: self.clone(),
        })))
    }

    fn frames(&self) -> Frames<'_> {
        Frames(self.0.as_deref())
    }

    /// Returns a chain that records `path` as the path to route on.
    #[must_use]
    pub fn with_path(&self, path: impl Into<String>) -> Self {
        self.push(Entry::Path(path.into()))
    }

    /// Returns a chain that binds `name` to `value`.
    #[must_use]
    pub fn with_param(&self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(Entry::Param {
            name: name.into(),
            value: value.into(),
        })
    }

    pub(crate) fn with_captures(
        &self,
        names: Arc<[NameSlot]>,
        values: Vec<String>,
        remaining: Option<String>,
    ) -> Self {
        self.push(Entry::Captures {
            names,
            values,
            remaining,
        })
    }

    /// Returns a chain that records `matcher` as the matcher that selected
    /// the route.
    #[must_use]
    pub fn with_matcher(&self, matcher: Arc<dyn Matcher>) -> Self {
        self.push(Entry::Matcher(Some(matcher)))
    }

    /// Returns a chain that records `handler` as the endpoint to call.
    ///
    /// A [`Mux`](crate::Mux) middleware can use this to send the request to
    /// a different endpoint than the one the router selected.
    #[must_use]
    pub fn with_handler(&self, handler: ArcEndpoint) -> Self {
        self.push(Entry::Handler(Some(handler)))
    }

    pub(crate) fn with_route(&self, matcher: Arc<dyn Matcher>, handler: ArcEndpoint) -> Self {
        self.with_matcher(matcher).with_handler(handler)
    }

    pub(crate) fn unmatched(&self) -> Self {
        self.push(Entry::Matcher(None)).push(Entry::Handler(None))
    }

    /// Returns the value bound to `name`, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        for frame in self.frames() {
            match &frame.entry {
                Entry::Captures { names, values, .. } => {
                    if let Ok(idx) = names.binary_search_by(|n| n.name.as_str().cmp(name)) {
                        return Some(&values[names[idx].slot]);
                    }
                }
                Entry::Param { name: n, value } if n == name => return Some(value),
                _ => {}
            }
        }
        None
    }

    /// Returns every bound name and its value. Newer bindings override older
    /// ones with the same name.
    pub fn all_names(&self) -> BTreeMap<String, String> {
        let frames = self.frames().collect::<Vec<_>>();
        let mut all = BTreeMap::new();
        for frame in frames.into_iter().rev() {
            match &frame.entry {
                Entry::Captures { names, values, .. } => {
                    for n in names.iter() {
                        all.insert(n.name.clone(), values[n.slot].clone());
                    }
                }
                Entry::Param { name, value } => {
                    all.insert(name.clone(), value.clone());
                }
                _ => {}
            }
        }
        all
    }

    /// Returns the path that the next routing layer should match against.
    ///
    /// After a pattern matched, this is the wildcard remainder, or the empty
    /// string for a pattern without a trailing `/*`.
    pub fn path(&self) -> Option<&str> {
        self.frames().find_map(|frame| match &frame.entry {
            Entry::Path(path) => Some(path.as_str()),
            Entry::Captures { remaining, .. } => Some(remaining.as_deref().unwrap_or_default()),
            _ => None,
        })
    }

    /// Returns the part of the path left unconsumed by the most recent
    /// pattern match. Empty unless that pattern ended with `/*`.
    pub fn remaining_path(&self) -> &str {
        self.frames()
            .find_map(|frame| match &frame.entry {
                Entry::Path(_) => Some(""),
                Entry::Captures { remaining, .. } => Some(remaining.as_deref().unwrap_or_default()),
                _ => None,
            })
            .unwrap_or_default()
    }

    /// Returns the most recently recorded matcher. An unmatched dispatch
    /// clears it.
    pub fn matcher(&self) -> Option<&Arc<dyn Matcher>> {
        self.frames().find_map(|frame| match &frame.entry {
            Entry::Matcher(matcher) => Some(matcher.as_ref()),
            _ => None,
        })?
    }

    /// Returns the most recently recorded handler. An unmatched dispatch
    /// clears it.
    pub fn handler(&self) -> Option<&ArcEndpoint> {
        self.frames().find_map(|frame| match &frame.entry {
            Entry::Handler(handler) => Some(handler.as_ref()),
            _ => None,
        })?
    }

    /// Returns `true` if a handler is bound.
    pub fn is_matched(&self) -> bool {
        self.handler().is_some()
    }
}

impl Debug for Bindings {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for frame in self.frames() {
            match &frame.entry {
                Entry::Path(path) => list.entry(&format_args!("path={:?}", path)),
                Entry::Captures {
                    names,
                    values,
                    remaining,
                } => list.entry(&format_args!(
                    "captures={:?} remaining={:?}",
                    names
                        .iter()
                        .map(|n| (&n.name, &values[n.slot]))
                        .collect::<Vec<_>>(),
                    remaining
                )),
                Entry::Param { name, value } => {
                    list.entry(&format_args!("param {}={:?}", name, value))
                }
                Entry::Matcher(Some(matcher)) => {
                    list.entry(&format_args!("matcher prefix={:?}", matcher.prefix()))
                }
                Entry::Matcher(None) => list.entry(&format_args!("no matcher")),
                Entry::Handler(Some(_)) => list.entry(&format_args!("handler")),
                Entry::Handler(None) => list.entry(&format_args!("no handler")),
            };
        }
        list.finish()
    }
}
