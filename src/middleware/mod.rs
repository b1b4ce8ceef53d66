//! Commonly used middleware.

mod tracing;

pub use self::tracing::{Tracing, TracingEndpoint};
use crate::Endpoint;

/// Represents a middleware trait.
///
/// A [`Mux`](crate::Mux) applies its middleware after routing, so the
/// endpoints they produce can read the route bindings of the request.
pub trait Middleware<E> {
    /// New endpoint type.
    ///
    /// If you don't know what type to use, then you can use
    /// [`ArcEndpoint`](crate::endpoint::ArcEndpoint), which will bring some
    /// performance loss, but it is insignificant.
    type Output: Endpoint;

    /// Transform the input [`Endpoint`] to another one.
    fn transform(&self, ep: E) -> Self::Output;
}

impl<F, E, E2> Middleware<E> for F
where
    F: Fn(E) -> E2,
    E2: Endpoint,
{
    type Output = E2;

    fn transform(&self, ep: E) -> Self::Output {
        (self)(ep)
    }
}
