use std::{fmt, num::ParseIntError, str::FromStr};

use thiserror::Error;

/// Whole-pixel translation written on the command line as `DY,DX`.
///
/// # Examples
/// ```
/// use starfish_registration_translate::PixelShift;
///
/// let shift: PixelShift = "-2, 5".parse()?;
/// assert_eq!(shift, PixelShift::new(-2, 5));
/// assert_eq!(shift.to_string(), "-2,5");
/// # Ok::<(), starfish_registration_translate::ParsePixelShiftError>(())
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct PixelShift {
    /// Rows to move down (negative moves up).
    pub dy: i64,
    /// Columns to move right (negative moves left).
    pub dx: i64,
}

impl PixelShift {
    /// Creates a shift from its two components.
    #[must_use]
    pub const fn new(dy: i64, dx: i64) -> Self {
        Self { dy, dx }
    }
}

/// Error returned when a `DY,DX` pair cannot be parsed.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum ParsePixelShiftError {
    /// The value did not contain exactly two comma-separated components.
    #[error("expected `DY,DX` but found `{0}`")]
    Format(String),
    /// A component was not an integer.
    #[error("invalid shift component `{component}`: {source}")]
    Component {
        /// Offending component text.
        component: String,
        /// Integer parse failure.
        #[source]
        source: ParseIntError,
    },
}

impl FromStr for PixelShift {
    type Err = ParsePixelShiftError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut parts = raw.split(',');
        let (Some(dy), Some(dx), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(ParsePixelShiftError::Format(raw.to_owned()));
        };
        let component = |text: &str| {
            let trimmed = text.trim();
            trimmed
                .parse::<i64>()
                .map_err(|source| ParsePixelShiftError::Component {
                    component: trimmed.to_owned(),
                    source,
                })
        };
        Ok(Self::new(component(dy)?, component(dx)?))
    }
}

impl fmt::Display for PixelShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.dy, self.dx)
    }
}
