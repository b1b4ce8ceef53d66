use std::{
    fmt::{self, Debug, Formatter},
    sync::Arc,
};

use crate::{
    endpoint::{make_sync, ArcEndpoint},
    error::NotFoundError,
    route::{Matcher, Pattern, Router},
    Endpoint, Middleware, Request, Response, Result,
};

type MiddlewareFn = Arc<dyn Fn(ArcEndpoint) -> ArcEndpoint + Send + Sync>;

/// Calls the handler the router bound to the request, or the not-found
/// endpoint.
struct Dispatch {
    not_found: ArcEndpoint,
}

#[async_trait::async_trait]
impl Endpoint for Dispatch {
    async fn call(&self, req: Request) -> Result<Response> {
        match req.bindings().handler().cloned() {
            Some(handler) => handler.call(req).await,
            None => self.not_found.call(req).await,
        }
    }
}

/// An HTTP request multiplexer.
///
/// A `Mux` routes every request with its [`Router`] and then calls its
/// middleware stack, which finally passes the request to the endpoint of the
/// selected route. Requests that no route accepts go to the not-found
/// endpoint, which fails with a `404 Not Found` error unless replaced with
/// [`Mux::not_found`].
///
/// Middleware run after routing, so they can inspect the
/// [`Bindings`](crate::route::Bindings) of the request.
///
/// # Example
///
/// ```
/// use patmux::{
///     endpoint::make_sync, http::StatusCode, route::get, Endpoint, Mux, Request,
/// };
///
/// let app = Mux::new().handle(
///     get("/hello/:name"),
///     make_sync(|req| format!("hello: {}", req.param("name"))),
/// );
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let resp = app
///     .call(Request::builder().uri_str("/hello/carl").finish())
///     .await
///     .unwrap();
/// assert_eq!(resp.into_body().into_string(), "hello: carl");
///
/// let err = app
///     .call(Request::builder().uri_str("/bye").finish())
///     .await
///     .unwrap_err();
/// assert_eq!(err.status(), StatusCode::NOT_FOUND);
/// # });
/// ```
pub struct Mux {
    sub: bool,
    router: Router,
    middleware: Vec<MiddlewareFn>,
    not_found: ArcEndpoint,
    chain: ArcEndpoint,
}

impl Default for Mux {
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Mux {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mux")
            .field("sub", &self.sub)
            .field("router", &self.router)
            .field("middleware", &self.middleware.len())
            .finish()
    }
}

impl Mux {
    fn with_kind(sub: bool) -> Self {
        let not_found: ArcEndpoint = Arc::new(make_sync(|_| Err::<(), _>(NotFoundError)));
        let mut mux = Self {
            sub,
            router: Router::new(),
            middleware: Vec::new(),
            chain: not_found.clone(),
            not_found,
        };
        mux.build_chain();
        mux
    }

    /// Create a multiplexer that routes on the path of the request URI.
    pub fn new() -> Self {
        Self::with_kind(false)
    }

    /// Create a multiplexer to nest inside another one.
    ///
    /// It routes on the path the enclosing routes left over, which is the
    /// remainder matched by the `/*` of a wildcard [`Pattern`]. The path of
    /// the request URI is never consulted again.
    pub fn sub() -> Self {
        Self::with_kind(true)
    }

    fn build_chain(&mut self) {
        let mut chain: ArcEndpoint = Arc::new(Dispatch {
            not_found: self.not_found.clone(),
        });
        for middleware in self.middleware.iter().rev() {
            chain = middleware(chain);
        }
        self.chain = chain;
    }

    /// Add a route. Routes added earlier take precedence.
    #[must_use]
    pub fn handle<M, E>(mut self, matcher: M, ep: E) -> Self
    where
        M: Matcher,
        E: Endpoint,
    {
        self.router.handle(matcher, ep);
        self
    }

    /// Add a route for the pattern `pattern`, accepting any method.
    ///
    /// # Panics
    ///
    /// Panics if the pattern is invalid.
    #[must_use]
    pub fn at<E>(self, pattern: impl AsRef<str>, ep: E) -> Self
    where
        E: Endpoint,
    {
        self.handle(Pattern::new(pattern), ep)
    }

    /// Append a middleware to the stack.
    ///
    /// Middleware added first runs first: given `A`, `B` and `C` added in
    /// that order, a request passes through `A(B(C(handler)))`. The stack
    /// applies to every route, including those added afterwards.
    #[must_use]
    pub fn with<T>(mut self, middleware: T) -> Self
    where
        T: Middleware<ArcEndpoint> + Send + Sync + 'static,
    {
        self.middleware.push(Arc::new(move |ep: ArcEndpoint| {
            let ep: ArcEndpoint = Arc::new(middleware.transform(ep));
            ep
        }));
        self.build_chain();
        self
    }

    /// Replace the endpoint called when no route matches.
    #[must_use]
    pub fn not_found<E>(mut self, ep: E) -> Self
    where
        E: Endpoint,
    {
        self.not_found = Arc::new(ep);
        self.build_chain();
        self
    }
}

#[async_trait::async_trait]
impl Endpoint for Mux {
    async fn call(&self, mut req: Request) -> Result<Response> {
        if !self.sub {
            let bindings = req.bindings().with_path(req.uri().path());
            req.set_bindings(bindings);
        }
        let req = self.router.route(req);
        self.chain.call(req).await
    }
}
