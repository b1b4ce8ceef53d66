use std::sync::Arc;

use fnv::FnvHashSet;

use super::Bindings;
use crate::{http::Method, Request};

/// A set of HTTP methods.
pub type MethodSet = FnvHashSet<Method>;

/// Decides whether a request qualifies for a route.
///
/// The [`Router`](super::Router) uses [`methods`](Matcher::methods) and
/// [`prefix`](Matcher::prefix) to skip matchers that cannot succeed, so both
/// must be conservative: a matcher may accept fewer requests than they
/// describe, never more.
pub trait Matcher: Send + Sync + 'static {
    /// Examines the request and returns the bindings it should carry if it
    /// matches.
    ///
    /// Implementations should build the result on top of
    /// [`req.bindings()`](Request::bindings) so that values bound by outer
    /// routers stay visible.
    fn matches(&self, req: &Request) -> Option<Bindings>;

    /// Returns the set of methods this matcher can accept, or `None` if that
    /// cannot be determined.
    fn methods(&self) -> Option<&MethodSet> {
        None
    }

    /// Returns a string that every path accepted by this matcher starts
    /// with. Requests whose path does not start with it are never passed to
    /// [`matches`](Matcher::matches).
    fn prefix(&self) -> &str {
        ""
    }
}

impl<T: Matcher + ?Sized> Matcher for Box<T> {
    fn matches(&self, req: &Request) -> Option<Bindings> {
        self.as_ref().matches(req)
    }

    fn methods(&self) -> Option<&MethodSet> {
        self.as_ref().methods()
    }

    fn prefix(&self) -> &str {
        self.as_ref().prefix()
    }
}

impl<T: Matcher + ?Sized> Matcher for Arc<T> {
    fn matches(&self, req: &Request) -> Option<Bindings> {
        self.as_ref().matches(req)
    }

    fn methods(&self) -> Option<&MethodSet> {
        self.as_ref().methods()
    }

    fn prefix(&self) -> &str {
        self.as_ref().prefix()
    }
}
