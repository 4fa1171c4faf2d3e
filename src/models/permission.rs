use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Camera authorization state as reported by the platform.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, EnumString, Display, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PermissionStatus {
    Authorized,
    Denied,
    /// Blocked by device policy (parental controls, MDM); the user cannot grant it.
    Restricted,
    NotDetermined,
}

impl PermissionStatus {
    pub fn is_authorized(self) -> bool {
        self == Self::Authorized
    }
}
