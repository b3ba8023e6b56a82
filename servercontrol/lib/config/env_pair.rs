use std::fmt;

use getset::Getters;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// An environment variable handed to a sandbox, displayed in Docker's `VAR=value` form.
///
/// ## Examples
///
/// ```
/// use servercontrol::config::EnvPair;
///
/// let env = EnvPair::new("PLAYERS", "32");
/// assert_eq!(env.to_string(), "PLAYERS=32");
/// assert_eq!(env.get_var(), "PLAYERS");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Getters)]
#[getset(get = "pub with_prefix")]
pub struct EnvPair {
    /// The environment variable name.
    var: String,

    /// The value of the environment variable.
    value: String,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl EnvPair {
    /// Creates a new `EnvPair`.
    pub fn new(var: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            value: value.into(),
        }
    }

    /// Creates an `EnvPair` holding a `true`/`false` flag.
    pub fn flag(var: impl Into<String>, enabled: bool) -> Self {
        Self::new(var, enabled.to_string())
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for EnvPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.var, self.value)
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
