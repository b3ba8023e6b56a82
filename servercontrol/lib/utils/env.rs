use std::path::PathBuf;

use crate::config::DEFAULT_SERVERCONTROL_HOME;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Environment variable for the servercontrol home directory.
pub const SERVERCONTROL_HOME_ENV_VAR: &str = "SERVERCONTROL_HOME";

/// Environment variable overriding the advertised public address.
pub const PUBLIC_ADDRESS_ENV_VAR: &str = "SERVERCONTROL_PUBLIC_ADDRESS";

/// Environment variable overriding the Docker socket path.
pub const DOCKER_SOCKET_ENV_VAR: &str = "SERVERCONTROL_DOCKER_SOCKET";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns the servercontrol home directory.
///
/// Uses `SERVERCONTROL_HOME` when set and non-empty, otherwise `~/.servercontrol`.
pub fn get_servercontrol_home_path() -> PathBuf {
    match std::env::var(SERVERCONTROL_HOME_ENV_VAR) {
        Ok(home) if !home.trim().is_empty() => PathBuf::from(home),
        _ => DEFAULT_SERVERCONTROL_HOME.to_owned(),
    }
}
