//! Cisco IOS platform definition.
//!
//! # Privilege Graph
//!
//! ```text
//! ┌──────┐  enable     ┌────────────────┐  configure terminal  ┌───────────────┐
//! │ exec ├──────────────► privilege_exec ├──────────────────────► configuration │
//! │  >   │   disable   │       #        │        end           │  (config*)#   │
//! └──────┘◄────────────┴────────────────┘◄─────────────────────┴───────────────┘
//! ```

use crate::platform::{AutoResponse, PlatformDefinition, PrivilegeLevel};

/// Create the Cisco IOS platform definition.
pub fn platform() -> PlatformDefinition {
    let exec = PrivilegeLevel::new("exec", r"[\w.\-@/:]{1,63}>").unwrap();

    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"[\w.\-@/:]{1,63}#")
        .unwrap()
        .with_parent("exec")
        .with_escalate("enable")
        .with_deescalate("disable")
        .with_auth(r"[Pp]assword:")
        .unwrap();

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"[\w.\-@/:]{1,63}\(config[\w.\-@/:+]{0,32}\)#",
    )
    .unwrap()
    .with_parent("privilege_exec")
    .with_escalate("configure terminal")
    .with_escalate_alias("conf t")
    .with_escalate_alias("config t")
    .with_deescalate("end");

    PlatformDefinition::new("cisco_ios")
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_config_privilege("configuration")
        .with_failure_pattern("% Ambiguous command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Invalid input detected")
        .with_failure_pattern("% Unknown command")
        .with_auto_response(AutoResponse::new(r"Destination filename \[[\w.\-]+\]\?", "").unwrap())
        .with_auto_response(AutoResponse::new(r"\[confirm\]", "").unwrap())
        .with_on_open_command("terminal length 0")
        .with_on_open_command("terminal width 511")
        .with_terminal_size(511, 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cisco_platform() {
        let platform = platform();
        assert_eq!(platform.name, "cisco_ios");
        assert_eq!(platform.default_privilege, "privilege_exec");
        assert_eq!(platform.on_open_commands.len(), 2);
    }

    #[test]
    fn test_prompt_disambiguation() {
        let platform = platform();
        let privileged = platform.get_privilege("privilege_exec").unwrap();
        let config = platform.get_privilege("configuration").unwrap();

        assert!(privileged.matches("sw-core-01#"));
        // ')' is outside the hostname class, so config prompts never match
        assert!(!privileged.matches("sw-core-01(config)#"));
        assert!(config.matches("sw-core-01(config-if)#"));
    }

    #[test]
    fn test_copy_questions() {
        let platform = platform();
        assert!(
            platform
                .auto_responses
                .iter()
                .any(|r| r.pattern.is_match(b"Destination filename [startup-config]? "))
        );
        assert!(
            platform
                .auto_responses
                .iter()
                .any(|r| r.pattern.is_match(b"Proceed with reload? [confirm]"))
        );
    }
}
