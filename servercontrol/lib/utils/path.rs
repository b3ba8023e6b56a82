//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// The sub directory of the user's home where servercontrol keeps its data.
pub const SERVERCONTROL_HOME_DIR: &str = ".servercontrol";

/// The prefix of the daily server log files.
pub const SERVER_LOG_PREFIX: &str = "servercontrol.log";
