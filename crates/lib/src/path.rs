//! Path and address types for hierarchical node access.
//!
//! Paths are `/`-separated segment sequences addressing a node within a root
//! node. The [`Path`]/[`PathBuf`] types follow the same borrowed/owned
//! pattern as `std::path::Path`/`PathBuf`: construction normalizes away
//! leading, trailing, and duplicate slashes, so the empty path addresses the
//! root node.
//!
//! Addresses qualify a path with a transport endpoint:
//! `scheme://host[:port]/path...`. An address may embed a second, nested
//! address after the endpoint, which is how gateway forwarding chains
//! transports; [`Address::parse`] strips exactly one endpoint layer per call.

use std::{borrow::Borrow, fmt, ops::Deref, str::FromStr};

use thiserror::Error;

/// Errors for address strings that deviate from the
/// `scheme://host[:port]/...` grammar.
#[derive(Debug, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum AddressError {
    /// The address does not match the top-level grammar. Deviations are
    /// never guessed at; they always fail with this error.
    #[error("Malformed address '{address}': {reason}")]
    Malformed { address: String, reason: String },
}

impl AddressError {
    fn malformed(address: impl Into<String>, reason: impl Into<String>) -> Self {
        AddressError::Malformed {
            address: address.into(),
            reason: reason.into(),
        }
    }
}

/// Normalizes a path string by stripping empty segments.
///
/// - Empty string `""` stays empty (addresses the root node)
/// - Leading slashes `"/a"` become `"a"`
/// - Trailing slashes `"a/"` become `"a"`
/// - Consecutive slashes `"a//b"` become `"a/b"`
/// - Pure slashes `"///"` become `""`
pub fn normalize_path(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    input
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Concatenates two raw path fragments with exactly one separator.
///
/// Unlike [`PathBuf::push`], this does not normalize the fragment interiors,
/// so address-shaped prefixes (`scheme://host:port`) survive intact. Used by
/// proxies, where the prefix may be the tail of a nested gateway address.
/// For plain paths the result is idempotent under [`normalize_path`].
pub fn concat(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    if prefix.is_empty() {
        path.to_string()
    } else if path.is_empty() {
        prefix.to_string()
    } else {
        format!("{prefix}/{path}")
    }
}

/// An owned, normalized path for hierarchical node access.
///
/// # Examples
///
/// ```rust
/// # use vab::path::PathBuf;
/// # use std::str::FromStr;
/// // Construct from string (automatically normalized)
/// let path = PathBuf::from_str("elements/sensor/value")?;
///
/// // Build incrementally (infallible)
/// let path = PathBuf::new().push("elements").push("sensor").push("value");
///
/// let segments: Vec<&str> = path.segments().collect();
/// assert_eq!(segments, vec!["elements", "sensor", "value"]);
/// # Ok::<(), std::convert::Infallible>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PathBuf {
    inner: String,
}

/// A borrowed, normalized path for hierarchical node access.
///
/// `Path` is the borrowed counterpart to `PathBuf`, similar to how `&str`
/// relates to `String`. This type is unsized and must always be used behind
/// a reference.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Path {
    inner: str,
}

impl PathBuf {
    /// Creates a new empty path, addressing the root node.
    pub fn new() -> Self {
        Self {
            inner: String::new(),
        }
    }

    /// Creates a `PathBuf` by normalizing the input string.
    pub fn normalize(path: &str) -> Self {
        Self {
            inner: normalize_path(path),
        }
    }

    /// Adds a path fragment to the end of this path.
    ///
    /// The fragment is normalized before joining; pushing an empty fragment
    /// is a no-op.
    pub fn push(mut self, path: impl AsRef<str>) -> Self {
        let normalized = normalize_path(path.as_ref());
        if normalized.is_empty() {
            return self;
        }

        if self.inner.is_empty() {
            self.inner = normalized;
        } else {
            self.inner.push('/');
            self.inner.push_str(&normalized);
        }
        self
    }

    /// Returns the parent path, or `None` if this path is empty or a single
    /// segment.
    pub fn parent(&self) -> Option<PathBuf> {
        self.inner.rfind('/').map(|last| PathBuf {
            inner: self.inner[..last].to_string(),
        })
    }
}

impl Path {
    /// Creates a `Path` from an already-normalized string.
    ///
    /// # Safety
    /// The caller must ensure the string carries no leading, trailing, or
    /// consecutive slashes. Primarily intended for normalized literals.
    pub unsafe fn from_str_unchecked(s: &str) -> &Path {
        // SAFETY: Path has the same memory layout as str
        unsafe { &*(s as *const str as *const Path) }
    }

    /// Returns an iterator over the path segments as string slices.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.inner.split('/').filter(|s| !s.is_empty())
    }

    /// Returns the number of segments in the path.
    pub fn len(&self) -> usize {
        if self.inner.is_empty() {
            0
        } else {
            self.inner.split('/').count()
        }
    }

    /// Returns `true` if the path has no segments (addresses the root).
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the last segment of the path, or `None` if empty.
    pub fn last(&self) -> Option<&str> {
        if self.inner.is_empty() {
            None
        } else {
            self.inner.split('/').next_back()
        }
    }

    /// Splits into the parent path and the last segment, or `None` if empty.
    pub fn split_last(&self) -> Option<(&Path, &str)> {
        let last = self.last()?;
        let parent = match self.inner.rfind('/') {
            Some(i) => &self.inner[..i],
            None => "",
        };
        // SAFETY: a prefix of a normalized path is normalized
        Some((unsafe { Path::from_str_unchecked(parent) }, last))
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Converts this `Path` to an owned `PathBuf`.
    pub fn to_path_buf(&self) -> PathBuf {
        PathBuf {
            inner: self.inner.to_string(),
        }
    }
}

impl Deref for PathBuf {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        // Safe because the inner string is always normalized
        unsafe { Path::from_str_unchecked(self.inner.as_str()) }
    }
}

impl AsRef<Path> for PathBuf {
    fn as_ref(&self) -> &Path {
        self.deref()
    }
}

impl AsRef<Path> for Path {
    fn as_ref(&self) -> &Path {
        self
    }
}

impl AsRef<str> for Path {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl AsRef<str> for PathBuf {
    fn as_ref(&self) -> &str {
        &self.inner
    }
}

impl Borrow<Path> for PathBuf {
    fn borrow(&self) -> &Path {
        self.deref()
    }
}

impl FromStr for PathBuf {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::normalize(s))
    }
}

impl From<&str> for PathBuf {
    fn from(s: &str) -> Self {
        Self::normalize(s)
    }
}

impl fmt::Display for PathBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_empty() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", self.inner)
        }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.inner.is_empty() {
            write!(f, "(root)")
        } else {
            write!(f, "{}", &self.inner)
        }
    }
}

/// A parsed transport endpoint plus the remaining path.
///
/// Parsing consumes exactly one `scheme://host[:port]` layer; the remaining
/// path may itself start with `scheme2://`, which is what gateway forwarding
/// peels off on the next hop.
///
/// ```rust
/// # use vab::path::Address;
/// let addr = Address::parse("basyx://10.0.0.1:6998//sub/path")?;
/// assert_eq!(addr.scheme, "basyx");
/// assert_eq!(addr.host, "10.0.0.1");
/// assert_eq!(addr.port, Some(6998));
/// assert_eq!(addr.path, "sub/path");
/// assert_eq!(addr.authority(), "basyx://10.0.0.1:6998");
/// # Ok::<(), vab::path::AddressError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    /// Scheme token, e.g. `basyx` or `http`.
    pub scheme: String,
    /// Host name or IP literal.
    pub host: String,
    /// Optional port.
    pub port: Option<u16>,
    /// Remaining path, verbatim. May itself be a nested address.
    pub path: String,
}

impl Address {
    /// Parses the first `scheme://host[:port]` endpoint of an address string
    /// and returns it together with the remaining path.
    pub fn parse(address: &str) -> Result<Self, AddressError> {
        let (scheme, rest) = address
            .split_once("://")
            .ok_or_else(|| AddressError::malformed(address, "missing scheme separator '://'"))?;

        if scheme.is_empty() {
            return Err(AddressError::malformed(address, "empty scheme"));
        }

        let (authority, path) = match rest.find('/') {
            Some(i) => (&rest[..i], rest[i..].trim_start_matches('/')),
            None => (rest, ""),
        };

        if authority.is_empty() {
            return Err(AddressError::malformed(address, "empty host"));
        }

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                if host.is_empty() {
                    return Err(AddressError::malformed(address, "empty host"));
                }
                let port = port.parse::<u16>().map_err(|_| {
                    AddressError::malformed(address, format!("invalid port '{port}'"))
                })?;
                (host.to_string(), Some(port))
            }
            None => (authority.to_string(), None),
        };

        Ok(Address {
            scheme: scheme.to_string(),
            host,
            port,
            path: path.to_string(),
        })
    }

    /// Renders the endpoint as `scheme://host[:port]`, without the path.
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}://{}:{}", self.scheme, self.host, port),
            None => format!("{}://{}", self.scheme, self.host),
        }
    }

    /// `host:port` for socket connects; an address without a port is
    /// malformed for socket transports.
    pub fn socket_addr(&self) -> Result<String, AddressError> {
        let port = self.port.ok_or_else(|| {
            AddressError::malformed(self.authority(), "missing port for socket transport")
        })?;
        Ok(format!("{}:{}", self.host, port))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.authority())
        } else {
            write!(f, "{}//{}", self.authority(), self.path)
        }
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Address::parse(s)
    }
}
