use thiserror::Error;

#[derive(Debug, Error)]
#[error(transparent)]
pub struct Error(Box<ErrorKind>);

impl Error {
    pub fn kind(&self) -> &ErrorKind {
        self.0.as_ref()
    }

    pub fn into_kind(self) -> ErrorKind {
        *self.0
    }

    pub fn invalid_arg(name: impl Into<String>, message: impl Into<String>) -> Error {
        Error(
            ErrorKind::InvalidArgument {
                name: name.into(),
                message: message.into(),
            }
            .into(),
        )
    }

    pub fn shape_mismatch(expected: &[usize], actual: &[usize]) -> Error {
        Error(
            ErrorKind::ShapeMismatch {
                expected: expected.to_vec(),
                actual: actual.to_vec(),
            }
            .into(),
        )
    }

    pub fn allocation_too_small(
        label: impl Into<String>,
        required: usize,
        available: usize,
    ) -> Error {
        Error(
            ErrorKind::AllocationTooSmall {
                label: label.into(),
                required,
                available,
            }
            .into(),
        )
    }

    pub fn misaligned_allocation(
        label: impl Into<String>,
        required: usize,
        address: usize,
    ) -> Error {
        Error(
            ErrorKind::MisalignedAllocation {
                label: label.into(),
                required,
                address,
            }
            .into(),
        )
    }
}

#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("invalid argument {name}: {message}")]
    InvalidArgument { name: String, message: String },

    #[error("shape mismatch: expected extents {expected:?}, got {actual:?}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error(
        "allocation record for '{label}' holds {available} bytes, view requires {required}"
    )]
    AllocationTooSmall {
        label: String,
        required: usize,
        available: usize,
    },

    #[error(
        "allocation record for '{label}' starts at {address:#x}, view requires {required}-byte alignment"
    )]
    MisalignedAllocation {
        label: String,
        required: usize,
        address: usize,
    },
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error(kind.into())
    }
}
