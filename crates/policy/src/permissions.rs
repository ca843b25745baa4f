use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FsAccess {
    None,
    Read,
    #[default]
    ReadWrite,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Allow,
    Deny,
}

/// What the agent's tools may touch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct KernelPermissions {
    pub fs: FsAccess,
    pub shell: Access,
    pub network: Access,
    pub notifications: bool,
    pub sandboxed: bool,
}

impl Default for KernelPermissions {
    fn default() -> Self {
        Self {
            fs: FsAccess::ReadWrite,
            shell: Access::Allow,
            network: Access::Allow,
            notifications: true,
            sandboxed: false,
        }
    }
}

impl KernelPermissions {
    /// Read-only filesystem, no shell, no network.
    pub fn sandboxed() -> Self {
        Self {
            fs: FsAccess::Read,
            shell: Access::Deny,
            network: Access::Deny,
            notifications: true,
            sandboxed: true,
        }
    }
}

/// The resource class a tool needs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
pub enum Capability {
    None,
    FsRead,
    FsWrite,
    Shell,
    Network,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PermissionResult {
    Allowed,
    Denied(String),
}

pub struct PermissionEngine {
    permissions: KernelPermissions,
}

impl PermissionEngine {
    pub fn new(permissions: KernelPermissions) -> Self {
        Self { permissions }
    }

    pub fn permissions(&self) -> &KernelPermissions {
        &self.permissions
    }

    pub fn set_permissions(&mut self, permissions: KernelPermissions) {
        self.permissions = permissions;
    }

    pub fn check(&self, capability: Capability) -> PermissionResult {
        let p = &self.permissions;
        let denial = match capability {
            Capability::None => None,
            Capability::FsRead if p.fs == FsAccess::None => Some("FS read not permitted in sandbox"),
            Capability::FsWrite if p.fs != FsAccess::ReadWrite => Some("FS write not permitted in sandbox"),
            Capability::Shell if p.shell == Access::Deny => Some("Shell access denied"),
            Capability::Network if p.network == Access::Deny => Some("Network access denied"),
            _ => None,
        };
        match denial {
            Some(reason) => PermissionResult::Denied(reason.to_string()),
            None => PermissionResult::Allowed,
        }
    }
}

impl Default for PermissionEngine {
    fn default() -> Self {
        Self::new(KernelPermissions::default())
    }
}
