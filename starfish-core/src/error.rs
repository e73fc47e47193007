//! Error types for the starfish core library.
//!
//! Defines the error enums exposed by the public API: registry configuration
//! failures, image stack I/O failures and the opaque algorithm error that
//! concrete registration algorithms convert into.

use std::{fmt, io, path::PathBuf};

use arrow_schema::{ArrowError, DataType};
use thiserror::Error;

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Configuration error raised while building an [`crate::AlgorithmRegistry`].
///
/// These failures are fatal at startup: they indicate two algorithms that
/// cannot share one command surface and need a code change to resolve.
#[non_exhaustive]
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RegistryError {
    /// An algorithm reported an empty name.
    #[error("registration algorithm names must not be empty")]
    EmptyName,
    /// Two algorithms reported the same name.
    #[error("registration algorithm `{name}` is registered more than once")]
    DuplicateName {
        /// Name shared by the colliding algorithms.
        name: &'static str,
    },
    /// An algorithm declared an argument that shadows a component-level one.
    #[error("registration algorithm `{algorithm}` declares reserved argument `{argument}`")]
    ReservedArgument {
        /// Algorithm that declared the argument.
        algorithm: &'static str,
        /// Offending argument id or long flag.
        argument: String,
    },
}

define_error_codes! {
    /// Stable codes describing [`RegistryError`] variants.
    enum RegistryErrorCode for RegistryError {
        /// An algorithm reported an empty name.
        EmptyName => EmptyName => "REGISTRY_EMPTY_NAME",
        /// Two algorithms reported the same name.
        DuplicateName => DuplicateName { .. } => "REGISTRY_DUPLICATE_NAME",
        /// An algorithm declared an argument that shadows a component-level one.
        ReservedArgument => ReservedArgument { .. } => "REGISTRY_RESERVED_ARGUMENT",
    }
}

/// Errors raised while loading, validating or persisting an
/// [`crate::ImageStack`].
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum StackError {
    /// A filesystem operation failed.
    #[error("i/o error on `{path}`: {source}")]
    Io {
        /// Path that triggered the failure.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// One of the stack dimensions was zero.
    #[error("stack dimensions must be positive (got {rounds}x{channels}x{height}x{width})")]
    ZeroDimension {
        /// Number of imaging rounds.
        rounds: usize,
        /// Number of channels per round.
        channels: usize,
        /// Tile height in pixels.
        height: usize,
        /// Tile width in pixels.
        width: usize,
    },
    /// The pixel buffer did not match the declared shape.
    #[error("pixel buffer has {actual} values but the shape requires {expected}")]
    ValueCountMismatch {
        /// Number of values required by the shape.
        expected: usize,
        /// Number of values supplied.
        actual: usize,
    },
    /// The shape does not fit in memory on this host.
    #[error("stack shape exceeds capacity limits")]
    CapacityOverflow,
    /// A required column is missing from the Parquet schema.
    #[error("column `{column}` not found in stack schema")]
    ColumnNotFound {
        /// Missing column name.
        column: &'static str,
    },
    /// A column has an unexpected Arrow type.
    #[error("column `{column}` has unexpected type {actual:?}")]
    InvalidColumnType {
        /// Column name.
        column: &'static str,
        /// Type found in the file.
        actual: DataType,
    },
    /// A tile geometry metadata key is missing or malformed.
    #[error("stack metadata `{key}` is missing or invalid")]
    InvalidMetadata {
        /// Metadata key that failed to parse.
        key: &'static str,
    },
    /// A row contained a null value.
    #[error("row {row} contains a null value")]
    NullValue {
        /// Offending row index.
        row: usize,
    },
    /// A tile referenced a round or channel outside the stack.
    #[error("tile ({round}, {channel}) is outside a {rounds}x{channels} stack")]
    TileOutOfBounds {
        /// Round index.
        round: usize,
        /// Channel index.
        channel: usize,
        /// Number of rounds in the stack.
        rounds: usize,
        /// Number of channels in the stack.
        channels: usize,
    },
    /// The same tile appeared twice in the file.
    #[error("tile ({round}, {channel}) appears more than once")]
    DuplicateTile {
        /// Round index.
        round: usize,
        /// Channel index.
        channel: usize,
    },
    /// The file holds a different number of tiles than its metadata declares.
    #[error("stack metadata declares {expected} tiles but the file has {actual} rows")]
    RowCountMismatch {
        /// Tiles implied by the rounds and channels metadata.
        expected: usize,
        /// Rows stored in the file.
        actual: i64,
    },
    /// Arrow failed to build or decode a record batch.
    #[error("arrow error: {0}")]
    Arrow(#[from] ArrowError),
    /// Parquet failed to read or write the file.
    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

define_error_codes! {
    /// Stable codes describing [`StackError`] variants.
    enum StackErrorCode for StackError {
        /// A filesystem operation failed.
        Io => Io { .. } => "STACK_IO",
        /// One of the stack dimensions was zero.
        ZeroDimension => ZeroDimension { .. } => "STACK_ZERO_DIMENSION",
        /// The pixel buffer did not match the declared shape.
        ValueCountMismatch => ValueCountMismatch { .. } => "STACK_VALUE_COUNT_MISMATCH",
        /// The shape does not fit in memory on this host.
        CapacityOverflow => CapacityOverflow => "STACK_CAPACITY_OVERFLOW",
        /// A required column is missing from the Parquet schema.
        ColumnNotFound => ColumnNotFound { .. } => "STACK_COLUMN_NOT_FOUND",
        /// A column has an unexpected Arrow type.
        InvalidColumnType => InvalidColumnType { .. } => "STACK_INVALID_COLUMN_TYPE",
        /// A tile geometry metadata key is missing or malformed.
        InvalidMetadata => InvalidMetadata { .. } => "STACK_INVALID_METADATA",
        /// A row contained a null value.
        NullValue => NullValue { .. } => "STACK_NULL_VALUE",
        /// A tile referenced a round or channel outside the stack.
        TileOutOfBounds => TileOutOfBounds { .. } => "STACK_TILE_OUT_OF_BOUNDS",
        /// The same tile appeared twice in the file.
        DuplicateTile => DuplicateTile { .. } => "STACK_DUPLICATE_TILE",
        /// The file holds a different number of tiles than its metadata declares.
        RowCountMismatch => RowCountMismatch { .. } => "STACK_ROW_COUNT_MISMATCH",
        /// Arrow failed to build or decode a record batch.
        Arrow => Arrow(..) => "STACK_ARROW",
        /// Parquet failed to read or write the file.
        Parquet => Parquet(..) => "STACK_PARQUET",
    }
}

/// Failure reported by a registration algorithm.
///
/// The dispatcher treats this as opaque: it is surfaced to the user unchanged.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AlgorithmError {
    /// Parsed arguments could not be turned into a configured algorithm.
    #[error("invalid arguments for `{algorithm}`: {message}")]
    InvalidArguments {
        /// Algorithm being constructed.
        algorithm: &'static str,
        /// Human-readable description of the problem.
        message: String,
    },
    /// The algorithm failed while running against a stack.
    #[error("registration algorithm `{algorithm}` failed: {source}")]
    Failed {
        /// Algorithm that failed.
        algorithm: &'static str,
        /// Algorithm-specific cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl AlgorithmError {
    /// Wraps an algorithm-specific error raised while running `algorithm`.
    ///
    /// # Examples
    /// ```
    /// use starfish_core::AlgorithmError;
    ///
    /// let err = AlgorithmError::failed("demo", std::fmt::Error);
    /// assert!(err.to_string().starts_with("registration algorithm `demo` failed"));
    /// ```
    pub fn failed<E>(algorithm: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Failed {
            algorithm,
            source: Box::new(source),
        }
    }
}
