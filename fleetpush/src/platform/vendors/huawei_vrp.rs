//! Huawei VRP platform definition (MA5600/MA5800 OLTs and S-series
//! switches).
//!
//! ```text
//! <OLT-HW>              # user_view
//! [OLT-HW]              # system_view
//! [OLT-HW-vlan100]      # system_view sub-view
//! ```

use crate::platform::{AutoResponse, PlatformDefinition, PrivilegeLevel};

/// Create the Huawei VRP platform definition.
pub fn platform() -> PlatformDefinition {
    let user_view = PrivilegeLevel::new("user_view", r"<[\w.\-@/:]{1,63}>").unwrap();

    let system_view = PrivilegeLevel::new("system_view", r"\[[~*]?[\w.\-@/:]{1,63}\]")
        .unwrap()
        .with_parent("user_view")
        .with_escalate("system-view")
        .with_escalate_alias("sys")
        .with_deescalate("return");

    PlatformDefinition::new("huawei_vrp")
        .with_privilege(user_view)
        .with_privilege(system_view)
        .with_default_privilege("user_view")
        .with_config_privilege("system_view")
        .with_failure_pattern("Error: ")
        .with_failure_pattern("Unrecognized command")
        .with_failure_pattern("Incomplete command")
        .with_auto_response(AutoResponse::new(r"\[Y/N\]:?", "y").unwrap())
        .with_on_open_command("screen-length 0 temporary")
        .with_terminal_size(511, 24)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_views() {
        let platform = platform();
        let user = platform.get_privilege("user_view").unwrap();
        let system = platform.get_privilege("system_view").unwrap();

        assert!(user.matches("<OLT-HW>"));
        assert!(!user.matches("[OLT-HW]"));
        assert!(system.matches("[OLT-HW]"));
        assert!(system.matches("[~OLT-HW-vlan100]"));
        assert!(system.is_escalate_command("sys"));
    }

    #[test]
    fn test_save_question() {
        let platform = platform();
        assert!(
            platform.auto_responses[0]
                .pattern
                .is_match(b"Are you sure to continue? [Y/N]:")
        );
    }
}
