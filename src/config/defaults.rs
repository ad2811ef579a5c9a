//! Default value functions for configuration.

pub fn default_true() -> bool {
    true
}

// =============================================================================
// Chat Defaults
// =============================================================================

pub fn default_self_server() -> String {
    crate::chat::identity::DEFAULT_USER_SERVER.to_string()
}

// =============================================================================
// Storage Defaults
// =============================================================================

pub fn default_database_path() -> String {
    "gsbot.db".to_string()
}

// =============================================================================
// Hosting Defaults
// =============================================================================

pub fn default_base_url() -> String {
    "https://api.exaroton.com/v1".to_string()
}

pub fn default_hosting_timeout() -> u64 {
    10
}

// =============================================================================
// Poller Defaults
// =============================================================================

pub fn default_poll_timeout() -> u64 {
    50
}

pub fn default_poll_interval() -> u64 {
    10
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_level() -> String {
    "info".to_string()
}
