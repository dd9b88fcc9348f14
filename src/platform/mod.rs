pub mod fixture;
#[cfg(target_os = "macos")]
pub mod macos;
pub mod process;

use crate::ax::probe::AttributeProbe;
use crate::platform::process::{PermissionOracle, ProcessRegistry};

/// Everything the engine needs from the host platform.
pub trait Desktop: AttributeProbe + ProcessRegistry + PermissionOracle {}

impl<T> Desktop for T where T: AttributeProbe + ProcessRegistry + PermissionOracle {}
