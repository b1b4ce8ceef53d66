//! Route matching and dispatch.
//!
//! A [`Router`] holds an ordered list of routes, each a [`Matcher`] paired
//! with an [`Endpoint`](crate::Endpoint). The most common matcher is
//! [`Pattern`], usually built with one of the method helpers such as
//! [`get`] or [`post`]. The values a match produces are recorded in the
//! request's [`Bindings`].

mod bindings;
pub(crate) mod internal;
mod matcher;
mod pattern;
mod router;

pub use bindings::Bindings;
pub use matcher::{Matcher, MethodSet};
pub use pattern::{delete, get, head, options, patch, post, put, Pattern};
pub use router::Router;
