//! Predefined OLT command scripts.

use crate::device::CommandPayload;

/// GPON flow profile with an Internet flow and a management (iphost) flow,
/// plus the matching VLAN translation profile. Saves the running config.
pub fn flow_profile(name: &str, internet_vlan: u16, management_vlan: u16) -> CommandPayload {
    CommandPayload::new(format!(
        "\
conf t
gpon profile flow {name}
add flow
{name}-1 encription disable
{name}-1 flow-type pbmp 1
{name}-1 vlan {internet_vlan} service Internet
add flow
{name}-2 encription disable
{name}-2 flow-type iphost 1
{name}-2 vlan {management_vlan} service Gerencia
!
gpon profile vlan-translation {name}
add translation-type access {internet_vlan}
end
show gpon profile flow {name}
show gpon profile vlan-translation {name}
copy r s
exit
"
    ))
}

/// Create a VLAN and allow it on an uplink trunk. Saves the running config.
pub fn vlan_uplink(vlan_id: u16, interface: &str) -> CommandPayload {
    CommandPayload::new(format!(
        "\
conf t
vlan database
vlan {vlan_id}
!
interface {interface}
switchport trunk allowed vlan add {vlan_id}
end
copy r s
exit
"
    ))
}
