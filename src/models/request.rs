use serde::Deserialize;

use crate::collector::Target;

/// Body of `POST /interfaces`.
#[derive(Debug, Clone, Deserialize)]
pub struct InterfaceRequest {
    pub ip: String,
    pub community: Option<String>,
    pub port: Option<u16>,
}

impl InterfaceRequest {
    /// Target for this request; omitted fields come from `defaults`.
    pub fn into_target(self, defaults: &Target) -> Target {
        let mut target = defaults.clone();
        target.address = self.ip;
        if let Some(community) = self.community {
            target.community = community;
        }
        if let Some(port) = self.port {
            target.port = port;
        }
        target
    }
}
