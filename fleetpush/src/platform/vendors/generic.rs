//! Generic OLT/switch platform.
//!
//! Loose Cisco-style prompts that most OLT CLIs follow. This is the platform
//! used when an inventory entry has no `device_type`.
//!
//! ```text
//! olt>                  # exec
//! olt#                  # privilege_exec
//! olt(config)#          # configuration
//! olt(config-gpon)#     # configuration sub-mode
//! ```

use crate::platform::{AutoResponse, PlatformDefinition, PrivilegeLevel};

/// Create the generic platform definition.
pub fn platform() -> PlatformDefinition {
    let exec = PrivilegeLevel::new("exec", r"[\w.\-@()/: ]{1,63}>").unwrap();

    let privilege_exec = PrivilegeLevel::new("privilege_exec", r"[\w.\-@()/: ]{1,63}#")
        .unwrap()
        .with_parent("exec")
        .with_escalate("enable")
        .with_deescalate("disable")
        .with_auth(r"[Pp]assword:")
        .unwrap()
        .with_not_contains("(conf");

    let configuration = PrivilegeLevel::new(
        "configuration",
        r"[\w.\-@/: ]{1,63}\(conf[\w.\-@/:+ ]{0,63}\)#",
    )
    .unwrap()
    .with_parent("privilege_exec")
    .with_escalate("configure terminal")
    .with_escalate_alias("conf t")
    .with_escalate_alias("config terminal")
    .with_escalate_alias("configure")
    .with_deescalate("end");

    PlatformDefinition::new("generic")
        .with_privilege(exec)
        .with_privilege(privilege_exec)
        .with_privilege(configuration)
        .with_default_privilege("privilege_exec")
        .with_config_privilege("configuration")
        .with_failure_pattern("% Invalid input")
        .with_failure_pattern("% Unknown command")
        .with_failure_pattern("% Incomplete command")
        .with_failure_pattern("% Ambiguous command")
        .with_auto_response(AutoResponse::new(r"\[[yY](?:es)?/[nN]o?\]\s*[?:]?", "y").unwrap())
        .with_terminal_size(511, 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generic_platform() {
        let platform = platform();
        assert_eq!(platform.name, "generic");
        assert_eq!(platform.privilege_levels.len(), 3);
        assert_eq!(platform.config_level().unwrap().name, "configuration");
        assert!(platform.on_open_commands.is_empty());
    }

    #[test]
    fn test_prompts() {
        let platform = platform();
        let exec = platform.get_privilege("exec").unwrap();
        let privileged = platform.get_privilege("privilege_exec").unwrap();
        let config = platform.get_privilege("configuration").unwrap();

        assert!(exec.matches("olt>"));
        assert!(!exec.matches("olt#"));

        assert!(privileged.matches("olt#"));
        assert!(privileged.matches("OLT-Parks-01#"));
        assert!(!privileged.matches("olt(config)#"));

        assert!(config.matches("olt(config)#"));
        assert!(config.matches("olt(config-if-10giga-ethernet0/1)#"));
        assert!(config.matches("olt(config-gpon-profile-flow)# "));
        assert!(!config.matches("olt#"));
    }

    #[test]
    fn test_confirmation_answered() {
        let platform = platform();
        let confirm = &platform.auto_responses[0];
        assert!(confirm.pattern.is_match(b"Save configuration? [y/n]"));
        assert!(confirm.pattern.is_match(b"Continue? [yes/no]: "));
        assert_eq!(confirm.reply, "y");
    }

    #[test]
    fn test_failure_detection() {
        let platform = platform();
        assert_eq!(
            platform.detect_failure("vlan 5000\r\n% Invalid input detected at '^' marker."),
            Some("% Invalid input")
        );
        assert_eq!(platform.detect_failure("vlan 100"), None);
    }
}
