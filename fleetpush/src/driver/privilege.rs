//! Privilege level tracking and navigation.

use std::collections::{HashMap, HashSet, VecDeque};

use indexmap::IndexMap;
use regex::bytes::Regex;

use crate::error::{DriverError, Result};
use crate::platform::PrivilegeLevel;

/// Tracks the device's current CLI mode and plans moves between modes.
///
/// Levels and their `previous_priv` links form an undirected graph; a move
/// between two levels follows the shortest path through it.
#[derive(Debug)]
pub struct PrivilegeManager {
    levels: IndexMap<String, PrivilegeLevel>,
    neighbours: HashMap<String, HashSet<String>>,
    current: Option<String>,
}

/// One step between adjacent levels.
#[derive(Debug, Clone)]
pub struct Transition {
    /// Command that performs the step.
    pub command: String,

    /// Password prompt the device may show before the step completes.
    pub auth_prompt: Option<Regex>,
}

impl PrivilegeManager {
    pub fn new(levels: IndexMap<String, PrivilegeLevel>) -> Self {
        let mut neighbours: HashMap<String, HashSet<String>> = HashMap::new();
        for (name, level) in &levels {
            neighbours.entry(name.clone()).or_default();
            if let Some(parent) = &level.previous_priv {
                neighbours.entry(name.clone()).or_default().insert(parent.clone());
                neighbours.entry(parent.clone()).or_default().insert(name.clone());
            }
        }

        Self {
            levels,
            neighbours,
            current: None,
        }
    }

    /// First level, in definition order, whose pattern matches `prompt`.
    pub fn determine_from_prompt(&self, prompt: &str) -> Result<&PrivilegeLevel> {
        self.levels
            .values()
            .find(|level| level.matches(prompt))
            .ok_or_else(|| {
                DriverError::UnknownPrivilege {
                    prompt: prompt.to_string(),
                }
                .into()
            })
    }

    /// Update the current level from a prompt. Unknown prompts leave the
    /// current level unset.
    pub fn observe_prompt(&mut self, prompt: &str) -> Option<&str> {
        self.current = self
            .determine_from_prompt(prompt)
            .ok()
            .map(|level| level.name.clone());
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&PrivilegeLevel> {
        self.current.as_ref().and_then(|name| self.levels.get(name))
    }

    pub fn current_name(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&PrivilegeLevel> {
        self.levels.get(name)
    }

    /// Shortest sequence of level names from `from` to `to`, both included.
    pub fn find_path(&self, from: &str, to: &str) -> Result<Vec<String>> {
        let no_path = || DriverError::NoPrivilegePath {
            from: from.to_string(),
            to: to.to_string(),
        };
        if !self.levels.contains_key(from) || !self.levels.contains_key(to) {
            return Err(no_path().into());
        }
        if from == to {
            return Ok(vec![from.to_string()]);
        }

        let mut came_from: HashMap<&str, &str> = HashMap::new();
        let mut queue = VecDeque::from([from]);
        let mut seen = HashSet::from([from]);

        while let Some(node) = queue.pop_front() {
            if node == to {
                let mut path = vec![to.to_string()];
                let mut cursor = to;
                while let Some(&prev) = came_from.get(cursor) {
                    path.push(prev.to_string());
                    cursor = prev;
                }
                path.reverse();
                return Ok(path);
            }

            for next in self.neighbours.get(node).into_iter().flatten() {
                if seen.insert(next.as_str()) {
                    came_from.insert(next.as_str(), node);
                    queue.push_back(next.as_str());
                }
            }
        }

        Err(no_path().into())
    }

    /// The step from `from` to the adjacent level `to`.
    ///
    /// Escalation uses the target's escalate command and may require
    /// authentication; de-escalation uses the source's deescalate command.
    pub fn transition(&self, from: &str, to: &str) -> Option<Transition> {
        let source = self.levels.get(from)?;
        let target = self.levels.get(to)?;

        if target.previous_priv.as_deref() == Some(from) {
            return Some(Transition {
                command: target.escalate_command.clone()?,
                auth_prompt: target.escalate_prompt.clone(),
            });
        }
        if source.previous_priv.as_deref() == Some(to) {
            return Some(Transition {
                command: source.deescalate_command.clone()?,
                auth_prompt: None,
            });
        }
        None
    }
}
