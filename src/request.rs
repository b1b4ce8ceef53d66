use std::{
    any::Any,
    convert::TryInto,
    fmt::{self, Debug, Formatter},
};

use crate::{
    http::{
        header::{HeaderMap, HeaderName, HeaderValue},
        Extensions, Method, Uri,
    },
    route::Bindings,
    Body,
};

#[derive(Default, Clone)]
pub(crate) struct RequestState {
    pub(crate) bindings: Bindings,
}

/// Represents an HTTP request.
#[derive(Default)]
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
    body: Body,
    state: RequestState,
}

impl Debug for Request {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("uri", &self.uri)
            .field("headers", &self.headers)
            .field("bindings", &self.state.bindings)
            .finish()
    }
}

impl Request {
    /// Creates a new builder-style object to manufacture a [`Request`].
    pub fn builder() -> RequestBuilder {
        RequestBuilder {
            method: Method::GET,
            uri: Uri::from_static("/"),
            headers: Default::default(),
            extensions: Default::default(),
        }
    }

    /// Returns a reference to the associated HTTP method.
    #[inline]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Sets the HTTP method for this request.
    #[inline]
    pub fn set_method(&mut self, method: Method) {
        self.method = method;
    }

    /// Returns a reference to the associated URI.
    #[inline]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    /// Sets the URI for this request.
    #[inline]
    pub fn set_uri(&mut self, uri: Uri) {
        self.uri = uri;
    }

    /// Returns a reference to the associated header map.
    #[inline]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a mutable reference to the associated header map.
    #[inline]
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns a reference to the associated extensions.
    #[inline]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Returns a mutable reference to the associated extensions.
    #[inline]
    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }

    /// Sets the body for this request.
    pub fn set_body(&mut self, body: impl Into<Body>) {
        self.body = body.into();
    }

    /// Take the body from this request and sets the body to empty.
    #[inline]
    pub fn take_body(&mut self) -> Body {
        std::mem::take(&mut self.body)
    }

    /// Returns the routing bindings attached to this request.
    #[inline]
    pub fn bindings(&self) -> &Bindings {
        &self.state.bindings
    }

    /// Replaces the routing bindings attached to this request.
    #[inline]
    pub fn set_bindings(&mut self, bindings: Bindings) {
        self.state.bindings = bindings;
    }

    /// Returns this request with `bindings` attached.
    #[inline]
    #[must_use]
    pub fn with_bindings(mut self, bindings: Bindings) -> Self {
        self.set_bindings(bindings);
        self
    }

    /// Returns the escaped path that matchers operate on.
    ///
    /// This is the path recorded in the bindings (the full path written by
    /// the root [`Mux`](crate::Mux), or the remainder left by an enclosing
    /// wildcard pattern). When nothing has recorded a path yet, the raw
    /// path of the request URI is used.
    pub fn path(&self) -> &str {
        match self.state.bindings.path() {
            Some(path) => path,
            None => self.uri.path(),
        }
    }

    /// Returns the value bound to `name` by the pattern that routed this
    /// request.
    ///
    /// # Panics
    ///
    /// Panics if `name` was never bound. Only names that appear in the
    /// matched pattern may be requested.
    pub fn param(&self, name: &str) -> &str {
        match self.state.bindings.get(name) {
            Some(value) => value,
            None => panic!("route parameter `{}` is not bound", name),
        }
    }
}

/// A request builder.
pub struct RequestBuilder {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    extensions: Extensions,
}

impl RequestBuilder {
    /// Sets the HTTP method for this request.
    ///
    /// By default this is [`Method::GET`].
    #[must_use]
    pub fn method(self, method: Method) -> RequestBuilder {
        Self { method, ..self }
    }

    /// Sets the URI for this request.
    ///
    /// By default this is `/`.
    #[must_use]
    pub fn uri(self, uri: Uri) -> RequestBuilder {
        Self { uri, ..self }
    }

    /// Sets the URI for this request from a string.
    ///
    /// Invalid URIs are ignored and the previous value is kept.
    #[must_use]
    pub fn uri_str(self, uri: &str) -> RequestBuilder {
        match uri.parse() {
            Ok(uri) => Self { uri, ..self },
            Err(_) => self,
        }
    }

    /// Appends a header to this request builder.
    ///
    /// Invalid header names or values are ignored.
    #[must_use]
    pub fn header<K, V>(mut self, key: K, value: V) -> Self
    where
        K: TryInto<HeaderName>,
        V: TryInto<HeaderValue>,
    {
        if let (Ok(key), Ok(value)) = (key.try_into(), value.try_into()) {
            self.headers.append(key, value);
        }
        self
    }

    /// Adds an extension to this request.
    #[must_use]
    pub fn extension<T>(mut self, extension: T) -> Self
    where
        T: Any + Send + Sync + 'static,
    {
        self.extensions.insert(extension);
        self
    }

    /// Consumes this builder, using the provided body to return a constructed
    /// [`Request`].
    pub fn body(self, body: impl Into<Body>) -> Request {
        Request {
            method: self.method,
            uri: self.uri,
            headers: self.headers,
            extensions: self.extensions,
            body: body.into(),
            state: Default::default(),
        }
    }

    /// Returns a [`Request`] with an empty body.
    pub fn finish(self) -> Request {
        self.body(Body::empty())
    }
}
