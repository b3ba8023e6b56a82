use std::{path::PathBuf, sync::LazyLock};

use crate::utils::SERVERCONTROL_HOME_DIR;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The image every instance is created from.
pub const DEFAULT_IMAGE: &str = "thijsvanloef/palworld-server-docker:latest";

/// Name prefix that marks a sandbox as managed by servercontrol.
pub const DEFAULT_NAME_PREFIX: &str = "palworld-server-";

/// First port of the allocation range.
pub const DEFAULT_PORT_RANGE_START: u16 = 8211;

/// Last port of the allocation range (inclusive).
pub const DEFAULT_PORT_RANGE_END: u16 = 8299;

/// The game port inside the sandbox.
pub const GAME_PORT: u16 = 8211;

/// The query port inside the sandbox.
pub const QUERY_PORT: u16 = 27015;

/// The remote console port inside the sandbox.
pub const RCON_PORT: u16 = 25575;

/// Distance between an allocated game port and its published query port, so game port 8211
/// publishes its query port on 25015.
pub const DEFAULT_QUERY_PORT_OFFSET: u16 = 16804;

/// Memory ceiling per instance: 6 GiB.
pub const DEFAULT_MEMORY_LIMIT_BYTES: i64 = 6 * 1024 * 1024 * 1024;

/// The highest player cap an instance accepts.
pub const MAX_PLAYERS: u32 = 32;

/// The player cap used when a request does not name one.
pub const DEFAULT_MAX_PLAYERS: u32 = 32;

/// UID and GID the game server runs as inside the sandbox.
pub const DEFAULT_PUID: u32 = 1000;

/// Where the instance storage directory is mounted inside the sandbox.
pub const SANDBOX_DATA_PATH: &str = "/palworld";

/// Number of trailing output lines scanned by status inference.
pub const DEFAULT_STATUS_TAIL_LINES: usize = 200;

/// Number of trailing output lines returned by the logs operation.
pub const DEFAULT_LOGS_TAIL_LINES: usize = 100;

/// Grace period in seconds for an explicit stop.
pub const DEFAULT_STOP_GRACE_SECS: u32 = 30;

/// Grace period in seconds for the stop that precedes a delete.
pub const DEFAULT_DELETE_GRACE_SECS: u32 = 10;

/// Address advertised when no better public address can be determined.
pub const DEFAULT_FALLBACK_ADDRESS: &str = "192.168.1.1";

/// Default host for the HTTP server.
pub const DEFAULT_SERVER_HOST: &str = "0.0.0.0";

/// Default port for the HTTP server.
pub const DEFAULT_SERVER_PORT: u16 = 3000;

/// How many times provisioning may re-allocate after a bind conflict when retry is requested.
pub const DEFAULT_PROVISION_ATTEMPTS: u8 = 3;

/// Sub directory of the home directory holding per-instance storage.
pub const DATA_SUBDIR: &str = "palworld-servers";

/// Sub directory of the home directory holding per-instance settings.
pub const SETTINGS_SUBDIR: &str = "settings";

/// Sub directory of the home directory holding server log files.
pub const LOG_SUBDIR: &str = "log";

/// File name of the configuration file inside the home directory.
pub const CONFIG_FILENAME: &str = "servercontrol.toml";

/// The path where all servercontrol data is stored when `SERVERCONTROL_HOME` is unset.
pub static DEFAULT_SERVERCONTROL_HOME: LazyLock<PathBuf> = LazyLock::new(|| {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(SERVERCONTROL_HOME_DIR)
});
