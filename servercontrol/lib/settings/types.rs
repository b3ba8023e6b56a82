use serde::{Deserialize, Serialize};

use crate::{
    config::{DEFAULT_MAX_PLAYERS, MAX_PLAYERS},
    ServerControlError, ServerControlResult,
};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Display name used when none was given.
pub const DEFAULT_SERVER_NAME: &str = "Unnamed Server";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Per-instance game settings, stored independently of the sandbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Name shown in the server browser.
    pub server_name: String,

    /// Free-form description.
    pub description: String,

    /// Join password. Empty means no password.
    pub password: String,

    /// Player cap.
    pub max_players: u32,

    /// World difficulty.
    pub difficulty: Difficulty,

    /// Player-versus-player combat.
    pub pvp: bool,

    /// Fewer items are lost on death.
    pub loss_items_decreased_death: bool,

    /// Remote console.
    pub rcon_enabled: bool,

    /// Listed in the community server browser.
    pub community: bool,

    /// The sandbox updates the game on boot.
    pub update_on_boot: bool,
}

/// World difficulty presets.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    /// Casual.
    Casual,

    /// Normal.
    #[default]
    Normal,

    /// Hard.
    Hard,

    /// Custom rates.
    Custom,
}

/// A partial settings change. Absent fields keep their stored value.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    /// Replaces [`Settings::server_name`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_name: Option<String>,
    /// Replaces [`Settings::description`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Replaces [`Settings::password`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Replaces [`Settings::max_players`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_players: Option<u32>,
    /// Replaces [`Settings::difficulty`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<Difficulty>,
    /// Replaces [`Settings::pvp`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pvp: Option<bool>,
    /// Replaces [`Settings::loss_items_decreased_death`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loss_items_decreased_death: Option<bool>,
    /// Replaces [`Settings::rcon_enabled`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rcon_enabled: Option<bool>,
    /// Replaces [`Settings::community`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<bool>,
    /// Replaces [`Settings::update_on_boot`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_on_boot: Option<bool>,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Settings {
    /// Checks the values a client may have supplied.
    pub fn validate(&self) -> ServerControlResult<()> {
        if self.server_name.trim().is_empty() {
            return Err(ServerControlError::InvalidArgument(
                "server name must not be empty".into(),
            ));
        }

        if !(1..=MAX_PLAYERS).contains(&self.max_players) {
            return Err(ServerControlError::InvalidArgument(format!(
                "max players must be between 1 and {MAX_PLAYERS}, got {}",
                self.max_players
            )));
        }

        Ok(())
    }
}

impl SettingsUpdate {
    /// Applies the present fields over `settings`.
    pub fn merge_into(self, mut settings: Settings) -> Settings {
        macro_rules! merge {
            ($($field:ident),* $(,)?) => {
                $(if let Some(value) = self.$field {
                    settings.$field = value;
                })*
            };
        }

        merge!(
            server_name,
            description,
            password,
            max_players,
            difficulty,
            pvp,
            loss_items_decreased_death,
            rcon_enabled,
            community,
            update_on_boot,
        );

        settings
    }
}

//--------------------------------------------------------------------------------------------------
// Trait Implementations
//--------------------------------------------------------------------------------------------------

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_name: DEFAULT_SERVER_NAME.to_string(),
            description: String::new(),
            password: String::new(),
            max_players: DEFAULT_MAX_PLAYERS,
            difficulty: Difficulty::Normal,
            pvp: false,
            loss_items_decreased_death: false,
            rcon_enabled: true,
            community: false,
            update_on_boot: true,
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_wire_format() -> anyhow::Result<()> {
        let json = serde_json::to_value(Settings::default())?;
        assert_eq!(json["serverName"], "Unnamed Server");
        assert_eq!(json["maxPlayers"], 32);
        assert_eq!(json["difficulty"], "Normal");
        assert_eq!(json["lossItemsDecreasedDeath"], false);
        assert_eq!(json["rconEnabled"], true);
        assert_eq!(json["updateOnBoot"], true);

        let partial: Settings = serde_json::from_str(r#"{"serverName":"Island","pvp":true}"#)?;
        assert_eq!(partial.server_name, "Island");
        assert!(partial.pvp);
        assert_eq!(partial.max_players, 32);
        Ok(())
    }

    #[test]
    fn test_settings_update_merge() -> anyhow::Result<()> {
        let update: SettingsUpdate =
            serde_json::from_str(r#"{"maxPlayers":8,"difficulty":"Hard","community":true}"#)?;
        let merged = update.merge_into(Settings {
            server_name: "Island".into(),
            ..Settings::default()
        });

        assert_eq!(merged.server_name, "Island");
        assert_eq!(merged.max_players, 8);
        assert_eq!(merged.difficulty, Difficulty::Hard);
        assert!(merged.community);
        assert!(merged.update_on_boot);
        Ok(())
    }

    #[test]
    fn test_settings_validate() {
        assert!(Settings::default().validate().is_ok());

        let settings = Settings {
            max_players: 0,
            ..Settings::default()
        };
        assert!(settings.validate().is_err());

        let settings = Settings {
            server_name: "  ".into(),
            ..Settings::default()
        };
        assert!(settings.validate().is_err());
    }
}
