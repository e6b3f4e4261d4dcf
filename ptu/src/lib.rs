pub mod command;
pub mod sweep;

pub use command::{
    Movement, encode_absolute, encode_home, encode_move, encode_pan, encode_tilt,
};
pub use sweep::{Corner, Edge, SweepPattern};

/// Largest absolute tilt/pan magnitude used for sweep extremes.
pub const ABS_MAX: i32 = 3000;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("Unknown movement command '{0}'")]
    UnknownCommand(char),

    #[error("Unknown sweep pattern '{0}', expected 'corners' or 'edges'")]
    UnknownPattern(String),
}
