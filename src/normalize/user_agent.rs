//! User-agent classification backed by woothee

use woothee::parser::Parser;

use crate::models::DeviceType;

/// Family name reported when the parser does not recognise an agent.
pub const UNKNOWN_FAMILY: &str = "Other";

/// Tokens that identify tablets. woothee files most of these under
/// `smartphone`, so they are checked separately. A bare "tablet" is not one:
/// Windows desktops advertise `Tablet PC 2.0`.
const TABLET_TOKENS: &[&str] = &["ipad", "kindle", "silk/", "playbook", "nexus 7", "nexus 10"];

/// Structured view of a user-agent string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentInfo {
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub browser_family: String,
    pub os_family: String,
}

impl Default for UserAgentInfo {
    fn default() -> Self {
        Self {
            is_mobile: false,
            is_tablet: false,
            browser_family: UNKNOWN_FAMILY.to_string(),
            os_family: UNKNOWN_FAMILY.to_string(),
        }
    }
}

impl UserAgentInfo {
    /// Parse a raw user-agent string. Empty or unrecognised input yields the
    /// default descriptor (desktop, `Other` families).
    pub fn parse(user_agent: &str) -> Self {
        let ua = user_agent.trim();
        if ua.is_empty() {
            return Self::default();
        }

        let lowered = ua.to_ascii_lowercase();
        let is_tablet = TABLET_TOKENS.iter().any(|token| lowered.contains(token))
            || (lowered.contains("android") && !lowered.contains("mobile"));

        let Some(result) = Parser::new().parse(ua) else {
            return Self {
                is_tablet,
                ..Self::default()
            };
        };

        let is_mobile = matches!(result.category, "smartphone" | "mobilephone") && !is_tablet;

        Self {
            is_mobile,
            is_tablet,
            browser_family: clean_family(result.name),
            os_family: clean_family(result.os),
        }
    }

    /// Mobile wins over tablet, tablet over desktop.
    pub fn device_type(&self) -> DeviceType {
        if self.is_mobile {
            DeviceType::Mobile
        } else if self.is_tablet {
            DeviceType::Tablet
        } else {
            DeviceType::Desktop
        }
    }
}

fn clean_family(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() || name == "UNKNOWN" {
        UNKNOWN_FAMILY.to_string()
    } else {
        name.to_string()
    }
}
