use std::io;

use thiserror_no_std::Error;


/// PRU subsystem error.
#[derive(Error, Clone, Debug, PartialEq)]
pub enum Error {
    #[error("invalid argument")]
    InvalidArgument,
    #[error("unsupported PRU subsystem feature")]
    Unsupported,
    #[error("physical range at {base:#010x} is already reserved")]
    Busy { base: u64 },
    #[error("failed to map physical range at {base:#010x}")]
    MapFailed { base: u64 },
    #[error("failed to claim {region}")]
    IoFailure {
        region: &'static str,
        #[source]
        cause: Box<Error>,
    },
    #[error("clock domain did not settle in time, overshoot {overshoot_ns}ns")]
    Timeout { overshoot_ns: i64 },
    #[error("out of memory")]
    OutOfMemory,
    #[error("permission denied")]
    PermissionDenied,
    #[error("session already open")]
    AlreadyOpen,
    #[error("memory device not found")]
    DeviceNotFound,
    #[error("other device error")]
    OtherDeviceError,
}

impl Error {
    /// The negative errno a character device would report for this error.
    pub fn errno(&self) -> i32 {
        let errno = match *self {
            Error::InvalidArgument => libc::EINVAL,
            Error::Unsupported => libc::EOPNOTSUPP,
            Error::Busy { .. } | Error::AlreadyOpen => libc::EBUSY,
            Error::MapFailed { .. } | Error::IoFailure { .. } | Error::OtherDeviceError => libc::EIO,
            Error::Timeout { .. } => libc::ETIMEDOUT,
            Error::OutOfMemory => libc::ENOMEM,
            Error::PermissionDenied => libc::EPERM,
            Error::DeviceNotFound => libc::ENODEV,
        };

        -errno
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        match err.kind() {
            io::ErrorKind::NotFound => Error::DeviceNotFound,
            io::ErrorKind::PermissionDenied => Error::PermissionDenied,
            _ => Error::OtherDeviceError,
        }
    }
}
