use std::{fmt, path::Path};

use typed_path::Utf8UnixPathBuf;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A read-write bind mount from a host directory into a sandbox.
///
/// Displays in Docker's `-v` form, `host:guest`.
///
/// ## Examples
///
/// ```
/// use servercontrol::config::PathPair;
///
/// let bind = PathPair::new("/srv/palworld-server-1".into(), "/palworld".into());
/// assert_eq!(bind.to_string(), "/srv/palworld-server-1:/palworld");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPair {
    host: Utf8UnixPathBuf,
    guest: Utf8UnixPathBuf,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl PathPair {
    /// Creates a new `PathPair`.
    pub fn new(host: Utf8UnixPathBuf, guest: Utf8UnixPathBuf) -> Self {
        Self { host, guest }
    }

    /// Creates a `PathPair` from a native host path.
    pub fn from_host_path(host: &Path, guest: impl Into<Utf8UnixPathBuf>) -> Self {
        Self::new(host.to_string_lossy().into_owned().into(), guest.into())
    }

    /// Returns the host path.
    pub fn get_host(&self) -> &Utf8UnixPathBuf {
        &self.host
    }

    /// Returns the guest path.
    pub fn get_guest(&self) -> &Utf8UnixPathBuf {
        &self.guest
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for PathPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.guest)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
