use thiserror::Error;

/// Why an update was refused admission
///
/// Rejections carry a reason instead of a bare boolean so callers can tell
/// global throttling apart from per-symbol cooldown and staleness.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitError {
    #[error("Global admission limit reached for the trailing window")]
    RateLimited,

    #[error("Symbol admitted too recently, cooldown not elapsed")]
    TooSoon,

    #[error("Source timestamp not newer than the last admitted update")]
    StaleOrDuplicate,
}

pub type Result<T> = std::result::Result<T, AdmitError>;
