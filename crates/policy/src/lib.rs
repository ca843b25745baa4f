pub mod permissions;
pub mod profile;

pub use permissions::{Access, Capability, FsAccess, KernelPermissions, PermissionEngine, PermissionResult};
pub use profile::{AgentProfile, PolicyError, DEFAULT_SYSTEM_INSTRUCTION};
