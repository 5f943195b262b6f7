//! Platform definition for vendor-specific configurations.

use indexmap::IndexMap;
use regex::bytes::Regex;

use super::privilege_level::PrivilegeLevel;
use crate::channel::compile_prompt_pattern;

/// A question the device may ask mid-command, answered automatically.
///
/// `copy running-config startup-config` on Cisco-style CLIs stops at
/// `Destination filename [startup-config]?` and waits for Enter.
#[derive(Debug, Clone)]
pub struct AutoResponse {
    /// Pattern of the question, anchored to the end of output.
    pub pattern: Regex,

    /// Text sent back (followed by the return character).
    pub reply: String,
}

impl AutoResponse {
    pub fn new(pattern: &str, reply: impl Into<String>) -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: compile_prompt_pattern(pattern)?,
            reply: reply.into(),
        })
    }
}

/// Everything the managed driver needs to know about one device family.
#[derive(Debug, Clone)]
pub struct PlatformDefinition {
    /// Platform name, matched against the inventory `device_type`.
    pub name: String,

    /// Privilege levels for this platform, in prompt-matching order.
    pub privilege_levels: IndexMap<String, PrivilegeLevel>,

    /// Level used for regular commands.
    pub default_privilege: String,

    /// Level in which configuration lines are sent.
    pub config_privilege: String,

    /// Substrings that mark a command as rejected.
    pub failed_when_contains: Vec<String>,

    /// Questions answered automatically while waiting for a prompt.
    pub auto_responses: Vec<AutoResponse>,

    /// Commands to run when connection is established.
    pub on_open_commands: Vec<String>,

    /// Commands to run before connection is closed.
    pub on_close_commands: Vec<String>,

    /// Terminal width for PTY.
    pub terminal_width: u32,

    /// Terminal height for PTY.
    pub terminal_height: u32,
}

impl PlatformDefinition {
    /// Create a new platform definition with minimal required fields.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            privilege_levels: IndexMap::new(),
            default_privilege: String::new(),
            config_privilege: String::new(),
            failed_when_contains: vec![],
            auto_responses: vec![],
            on_open_commands: vec![],
            on_close_commands: vec![],
            terminal_width: 511,
            terminal_height: 24,
        }
    }

    /// Add a privilege level.
    pub fn with_privilege(mut self, level: PrivilegeLevel) -> Self {
        self.privilege_levels.insert(level.name.clone(), level);
        self
    }

    /// Set the default privilege level.
    pub fn with_default_privilege(mut self, name: impl Into<String>) -> Self {
        self.default_privilege = name.into();
        self
    }

    /// Set the configuration privilege level.
    pub fn with_config_privilege(mut self, name: impl Into<String>) -> Self {
        self.config_privilege = name.into();
        self
    }

    /// Add a failure pattern.
    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failed_when_contains.push(pattern.into());
        self
    }

    /// Add an automatic answer to a device question.
    pub fn with_auto_response(mut self, response: AutoResponse) -> Self {
        self.auto_responses.push(response);
        self
    }

    /// Add an on_open command.
    pub fn with_on_open_command(mut self, command: impl Into<String>) -> Self {
        self.on_open_commands.push(command.into());
        self
    }

    /// Add an on_close command.
    pub fn with_on_close_command(mut self, command: impl Into<String>) -> Self {
        self.on_close_commands.push(command.into());
        self
    }

    /// Set terminal dimensions.
    pub fn with_terminal_size(mut self, width: u32, height: u32) -> Self {
        self.terminal_width = width;
        self.terminal_height = height;
        self
    }

    /// Get a privilege level by name.
    pub fn get_privilege(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.privilege_levels.get(name)
    }

    /// The configuration level, if the platform has one.
    pub fn config_level(&self) -> Option<&PrivilegeLevel> {
        self.privilege_levels.get(&self.config_privilege)
    }

    /// First substring of `output` listed in `failed_when_contains`.
    pub fn detect_failure(&self, output: &str) -> Option<&str> {
        self.failed_when_contains
            .iter()
            .map(String::as_str)
            .find(|pattern| output.contains(pattern))
    }
}
