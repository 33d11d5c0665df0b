/// The scan converter's result type.
pub type FillResult = Result<(), FillError>;

/// An error reported by a device back-end.
///
/// Any error unwinds the current fill immediately; partial output is
/// acceptable per the device contract.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum DeviceError {
    /// The device cannot perform the requested operation.
    Unsupported,
    /// A backend-specific failure code.
    Backend(i32),
}

#[cfg(feature = "std")]
impl core::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            DeviceError::Unsupported => {
                std::write!(f, "Unsupported device operation")
            }
            DeviceError::Backend(code) => {
                std::write!(f, "Device backend error: #{}", code)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DeviceError {}

/// Describes an unexpected inconsistency inside the scan converter.
///
/// These indicate a programming error rather than bad input; they panic in
/// debug builds and surface as errors in release builds.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum InternalError {
    /// An active line violated the `start.y <= end.y` invariant or the
    /// X-list linkage broke.
    InconsistentActiveList,
    /// The spot-analysis loop ran against a device without an analyzer.
    MissingSpotAnalyzer,
}

#[cfg(feature = "std")]
impl core::fmt::Display for InternalError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InternalError::InconsistentActiveList => {
                std::write!(f, "Inconsistent active line list")
            }
            InternalError::MissingSpotAnalyzer => {
                std::write!(f, "Device does not provide a spot analyzer")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for InternalError {}

/// The scan converter's error enumeration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FillError {
    /// A curve's control polygon cannot be subdivided (out of the
    /// representable coordinate range).
    DegenerateCurve,
    Device(DeviceError),
    Internal(InternalError),
}

#[cfg(feature = "std")]
impl core::fmt::Display for FillError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            FillError::DegenerateCurve => {
                std::write!(f, "Degenerate curve segment")
            }
            FillError::Device(e) => {
                std::write!(f, "Device error: {}", e)
            }
            FillError::Internal(e) => {
                std::write!(f, "Internal error: {}", e)
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for FillError {}

impl core::convert::From<DeviceError> for FillError {
    fn from(value: DeviceError) -> Self {
        FillError::Device(value)
    }
}

impl core::convert::From<InternalError> for FillError {
    fn from(value: InternalError) -> Self {
        FillError::Internal(value)
    }
}
