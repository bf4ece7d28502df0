use thiserror::Error;

/// Curve-domain faults.
///
/// `DivisionByZero` and `Overflow` are distinct classes: the first means the
/// call landed exactly on the curve's asymptote, the second that it went past
/// it (or past `u128`). Neither is translated into a friendlier error by the
/// market; together they cap the size of a single call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CurveError {
    #[error("curve division by zero: supply reached the curve asymptote")]
    DivisionByZero,

    #[error("curve arithmetic overflow: supply beyond the curve domain")]
    Overflow,

    #[error("invalid curve parameters: {0}")]
    InvalidParameters(&'static str),
}

pub type Result<T> = std::result::Result<T, CurveError>;
