use super::RollHandle;

/// Errors surfaced by the dice engine. None of them interrupt the tick.
#[derive(Debug, thiserror::Error)]
pub enum DiceError {
    /// The identifier is not in the die catalog.
    #[error("unknown die type: \"{0}\"")]
    UnknownDieType(String),

    /// The session has no arena yet, or was stopped.
    #[error("dice session is not initialized")]
    UninitializedSession,

    #[error("physics world is already initialized")]
    AlreadyInitialized,

    /// The handle does not name an active roll.
    #[error("no active roll {0}")]
    UnknownRoll(RollHandle),

    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    #[error("settings file error: {0}")]
    SettingsIo(#[from] std::io::Error),

    #[error("settings parse error: {0}")]
    SettingsParse(#[from] serde_json::Error),
}
