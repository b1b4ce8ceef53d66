use std::{future::Future, marker::PhantomData, sync::Arc};

use crate::{IntoResponse, Middleware, Request, Response, Result};

/// An HTTP request handler.
#[async_trait::async_trait]
pub trait Endpoint: Send + Sync + 'static {
    /// Get the response to the request.
    async fn call(&self, req: Request) -> Result<Response>;
}

#[async_trait::async_trait]
impl<T: Endpoint + ?Sized> Endpoint for Box<T> {
    async fn call(&self, req: Request) -> Result<Response> {
        self.as_ref().call(req).await
    }
}

#[async_trait::async_trait]
impl<T: Endpoint + ?Sized> Endpoint for Arc<T> {
    async fn call(&self, req: Request) -> Result<Response> {
        self.as_ref().call(req).await
    }
}

/// A shared, type-erased endpoint. This is what routes hold.
pub type ArcEndpoint = Arc<dyn Endpoint>;

/// Represents a type that can convert into `Result<T>`.
pub trait IntoResult<T: IntoResponse> {
    /// Consumes this value returns a `Result<T>`.
    fn into_result(self) -> Result<T>;
}

impl<T, E> IntoResult<T> for Result<T, E>
where
    T: IntoResponse,
    E: Into<crate::Error> + Send + Sync + 'static,
{
    #[inline]
    fn into_result(self) -> Result<T> {
        self.map_err(Into::into)
    }
}

impl<T: IntoResponse> IntoResult<T> for T {
    #[inline]
    fn into_result(self) -> Result<T> {
        Ok(self)
    }
}

struct SyncFnEndpoint<T, F> {
    _mark: PhantomData<fn() -> T>,
    f: F,
}

#[async_trait::async_trait]
impl<F, T, R> Endpoint for SyncFnEndpoint<T, F>
where
    F: Fn(Request) -> R + Send + Sync + 'static,
    T: IntoResponse + 'static,
    R: IntoResult<T>,
{
    async fn call(&self, req: Request) -> Result<Response> {
        (self.f)(req).into_result().map(IntoResponse::into_response)
    }
}

struct AsyncFnEndpoint<T, F> {
    _mark: PhantomData<fn() -> T>,
    f: F,
}

#[async_trait::async_trait]
impl<F, Fut, T, R> Endpoint for AsyncFnEndpoint<T, F>
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send,
    T: IntoResponse + 'static,
    R: IntoResult<T>,
{
    async fn call(&self, req: Request) -> Result<Response> {
        (self.f)(req)
            .await
            .into_result()
            .map(IntoResponse::into_response)
    }
}

/// Create an endpoint with a function.
///
/// The output can be any type that implements [`IntoResult`].
///
/// # Example
///
/// ```
/// use patmux::{endpoint::make_sync, http::Method, Endpoint, Request};
///
/// let ep = make_sync(|req| req.method().to_string());
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let resp = ep
///     .call(Request::builder().method(Method::GET).finish())
///     .await
///     .unwrap();
/// assert_eq!(resp.into_body().into_string(), "GET");
/// # });
/// ```
pub fn make_sync<F, T, R>(f: F) -> impl Endpoint
where
    F: Fn(Request) -> R + Send + Sync + 'static,
    T: IntoResponse + 'static,
    R: IntoResult<T>,
{
    SyncFnEndpoint {
        _mark: PhantomData,
        f,
    }
}

/// Create an endpoint with an asynchronous function.
///
/// The output can be any type that implements [`IntoResult`].
///
/// # Example
///
/// ```
/// use patmux::{endpoint::make, http::Method, Endpoint, Request};
///
/// let ep = make(|req| async move { req.method().to_string() });
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let resp = ep
///     .call(Request::builder().method(Method::GET).finish())
///     .await
///     .unwrap();
/// assert_eq!(resp.into_body().into_string(), "GET");
/// # });
/// ```
pub fn make<F, Fut, T, R>(f: F) -> impl Endpoint
where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = R> + Send,
    T: IntoResponse + 'static,
    R: IntoResult<T>,
{
    AsyncFnEndpoint {
        _mark: PhantomData,
        f,
    }
}

/// Extension trait for [`Endpoint`].
pub trait EndpointExt: Endpoint {
    /// Wrap the endpoint in an `Arc`.
    fn arced(self) -> ArcEndpoint
    where
        Self: Sized,
    {
        Arc::new(self)
    }

    /// Use middleware to transform this endpoint.
    ///
    /// # Example
    ///
    /// ```
    /// use patmux::{endpoint::make_sync, middleware::Tracing, EndpointExt};
    ///
    /// let ep = make_sync(|_| "hello").with(Tracing);
    /// ```
    fn with<T>(self, middleware: T) -> T::Output
    where
        T: Middleware<Self>,
        Self: Sized,
    {
        middleware.transform(self)
    }
}

impl<T: Endpoint> EndpointExt for T {}
