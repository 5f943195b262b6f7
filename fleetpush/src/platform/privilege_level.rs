//! Privilege level definition.

use regex::bytes::Regex;

use crate::channel::compile_prompt_pattern;

/// A privilege level (CLI mode) of a managed device.
///
/// Levels form a graph where each level can have a parent (`previous_priv`)
/// and commands to escalate to it from the parent and back.
#[derive(Debug, Clone)]
pub struct PrivilegeLevel {
    /// Name of this level (e.g. "exec", "privilege_exec", "configuration").
    pub name: String,

    /// Prompt pattern, anchored to the end of output.
    pub pattern: Regex,

    /// Name of the parent level (None for the root level).
    pub previous_priv: Option<String>,

    /// Command to escalate TO this level from the parent.
    pub escalate_command: Option<String>,

    /// Other spellings of the escalate command that operators put in scripts
    /// (`conf t` for `configure terminal`).
    pub escalate_aliases: Vec<String>,

    /// Command to de-escalate FROM this level to the parent.
    pub deescalate_command: Option<String>,

    /// Password prompt shown while escalating, if the device may ask for one.
    pub escalate_prompt: Option<Regex>,

    /// Strings that must NOT be in the prompt for this level to match.
    /// `#` ends both privileged and configuration prompts on most CLIs.
    pub not_contains: Vec<String>,
}

impl PrivilegeLevel {
    /// Create a new privilege level with minimal required fields.
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            name: name.into(),
            pattern: compile_prompt_pattern(pattern)?,
            previous_priv: None,
            escalate_command: None,
            escalate_aliases: vec![],
            deescalate_command: None,
            escalate_prompt: None,
            not_contains: vec![],
        })
    }

    /// Set the parent privilege level.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.previous_priv = Some(parent.into());
        self
    }

    /// Set the escalation command.
    pub fn with_escalate(mut self, command: impl Into<String>) -> Self {
        self.escalate_command = Some(command.into());
        self
    }

    /// Add an alternative spelling of the escalation command.
    pub fn with_escalate_alias(mut self, alias: impl Into<String>) -> Self {
        self.escalate_aliases.push(alias.into());
        self
    }

    /// Set the de-escalation command.
    pub fn with_deescalate(mut self, command: impl Into<String>) -> Self {
        self.deescalate_command = Some(command.into());
        self
    }

    /// Set the password prompt that escalation may show.
    pub fn with_auth(mut self, prompt_pattern: &str) -> Result<Self, regex::Error> {
        self.escalate_prompt = Some(compile_prompt_pattern(prompt_pattern)?);
        Ok(self)
    }

    /// Add a not_contains pattern.
    pub fn with_not_contains(mut self, pattern: impl Into<String>) -> Self {
        self.not_contains.push(pattern.into());
        self
    }

    /// Check if this privilege level matches a prompt.
    pub fn matches(&self, prompt: &str) -> bool {
        if self.not_contains.iter().any(|nc| prompt.contains(nc.as_str())) {
            return false;
        }
        self.pattern.is_match(prompt.as_bytes())
    }

    /// Whether `command` is this level's escalate command or one of its
    /// aliases. Whitespace runs are collapsed before comparing.
    pub fn is_escalate_command(&self, command: &str) -> bool {
        let normalized = command.split_whitespace().collect::<Vec<_>>().join(" ");
        self.escalate_command
            .iter()
            .chain(self.escalate_aliases.iter())
            .any(|known| known.eq_ignore_ascii_case(&normalized))
    }
}
