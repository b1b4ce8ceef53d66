use bytes::Bytes;

/// A body object for requests and responses.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Body(pub(crate) Bytes);

impl From<&'static [u8]> for Body {
    #[inline]
    fn from(data: &'static [u8]) -> Self {
        Self(Bytes::from_static(data))
    }
}

impl From<&'static str> for Body {
    #[inline]
    fn from(data: &'static str) -> Self {
        Self(Bytes::from_static(data.as_bytes()))
    }
}

impl From<Bytes> for Body {
    #[inline]
    fn from(data: Bytes) -> Self {
        Self(data)
    }
}

impl From<Vec<u8>> for Body {
    #[inline]
    fn from(data: Vec<u8>) -> Self {
        Self(data.into())
    }
}

impl From<String> for Body {
    #[inline]
    fn from(data: String) -> Self {
        Self(data.into())
    }
}

impl From<()> for Body {
    #[inline]
    fn from(_: ()) -> Self {
        Body::empty()
    }
}

impl Body {
    /// Create a body object from [`Bytes`].
    #[inline]
    pub fn from_bytes(data: Bytes) -> Self {
        data.into()
    }

    /// Create a body object from [`String`].
    #[inline]
    pub fn from_string(data: String) -> Self {
        data.into()
    }

    /// Create an empty body.
    #[inline]
    pub fn empty() -> Self {
        Self(Bytes::new())
    }

    /// Returns `true` if this body contains no data.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes this body object to return a [`Bytes`] that contains all data.
    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.0
    }

    /// Consumes this body object to return a [`String`], replacing invalid
    /// UTF-8 sequences.
    pub fn into_string(self) -> String {
        String::from_utf8_lossy(&self.0).into_owned()
    }
}
