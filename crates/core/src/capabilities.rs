//! Optional-capability descriptor, resolved once at startup.
//!
//! The original deployment probed its optional stacks at import time; here
//! the same information is fixed at compile time and carried as an explicit
//! struct injected into the decoder and reported by the health endpoint.

use serde::Serialize;

/// What this build of the service can and cannot do.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Capabilities {
    /// A learned-model inference stack is linked. Never true: the MRNet
    /// branch is inert in this configuration.
    pub tensorflow_available: bool,
    /// DICOM pixel-data decoding is compiled in (`dicom` cargo feature).
    pub dicom_available: bool,
    /// The alternate MRNet scorer is enabled. Always false; the rule-based
    /// scorer is the only scoring path.
    pub mrnet_enabled: bool,
}

impl Capabilities {
    /// Resolve capabilities for this build.
    pub fn detect() -> Self {
        Self {
            tensorflow_available: false,
            dicom_available: cfg!(feature = "dicom"),
            mrnet_enabled: false,
        }
    }
}
