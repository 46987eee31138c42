//! Configuration for Boardsight
//!
//! Every setting comes from the environment. The presentation shell is
//! responsible for loading its `.env` file (or equivalent) before
//! calling [`Config::from_env`], and for checking
//! [`Config::missing_settings`] before accepting any user turn.

use std::env;

/// Environment variable holding the board API credential.
pub const MONDAY_API_KEY: &str = "MONDAY_API_KEY";
/// Environment variable holding the model API credential.
pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
/// Environment variable holding the work orders board identifier.
pub const WORK_ORDERS_BOARD_ID: &str = "WORK_ORDERS_BOARD_ID";
/// Environment variable holding the deals board identifier.
pub const DEALS_BOARD_ID: &str = "DEALS_BOARD_ID";

/// Application settings, all optional until validated
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Credential for the board API
    pub monday_api_key: Option<String>,
    /// Credential for the model inference API
    pub groq_api_key: Option<String>,
    /// Identifier of the work orders board
    pub work_orders_board_id: Option<String>,
    /// Identifier of the deals board
    pub deals_board_id: Option<String>,
}

impl Config {
    /// Read all settings from the environment.
    ///
    /// Empty values are treated the same as unset ones.
    pub fn from_env() -> Self {
        Self {
            monday_api_key: read_var(MONDAY_API_KEY),
            groq_api_key: read_var(GROQ_API_KEY),
            work_orders_board_id: read_var(WORK_ORDERS_BOARD_ID),
            deals_board_id: read_var(DEALS_BOARD_ID),
        }
    }

    /// Names of the settings that are still missing.
    ///
    /// An empty result means the configuration is complete and the
    /// agent can be constructed.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.monday_api_key.is_none() {
            missing.push(MONDAY_API_KEY);
        }
        if self.groq_api_key.is_none() {
            missing.push(GROQ_API_KEY);
        }
        if self.work_orders_board_id.is_none() {
            missing.push(WORK_ORDERS_BOARD_ID);
        }
        if self.deals_board_id.is_none() {
            missing.push(DEALS_BOARD_ID);
        }
        missing
    }

    /// Whether every required setting is present
    pub fn is_complete(&self) -> bool {
        self.missing_settings().is_empty()
    }
}

fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
