use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

const HOME: &str = "RE\nA\n";

/// Relative jog direction for manual control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Movement {
    Up,
    Down,
    Left,
    Right,
}

impl Movement {
    pub const ALL: [Movement; 4] = [
        Movement::Up,
        Movement::Down,
        Movement::Left,
        Movement::Right,
    ];

    pub fn from_symbol(symbol: char) -> Result<Self, ProtocolError> {
        match symbol {
            'u' => Ok(Movement::Up),
            'd' => Ok(Movement::Down),
            'l' => Ok(Movement::Left),
            'r' => Ok(Movement::Right),
            other => Err(ProtocolError::UnknownCommand(other)),
        }
    }

    pub fn symbol(&self) -> char {
        match self {
            Movement::Up => 'u',
            Movement::Down => 'd',
            Movement::Left => 'l',
            Movement::Right => 'r',
        }
    }

    /// Relative offset command, without a trailing apply.
    pub fn command(&self) -> &'static str {
        match self {
            Movement::Up => "TO100\n",
            Movement::Down => "TO-100\n",
            Movement::Left => "PO-100\n",
            Movement::Right => "PO100\n",
        }
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Movement::Up => "up",
            Movement::Down => "down",
            Movement::Left => "left",
            Movement::Right => "right",
        };
        f.write_str(name)
    }
}

impl FromStr for Movement {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(symbol), None) => Movement::from_symbol(symbol),
            (Some(symbol), Some(_)) => Err(ProtocolError::UnknownCommand(symbol)),
            (None, _) => Err(ProtocolError::UnknownCommand('\0')),
        }
    }
}

/// Reset to the reference position and apply.
pub fn encode_home() -> &'static str {
    HOME
}

pub fn encode_move(symbol: char) -> Result<&'static str, ProtocolError> {
    Movement::from_symbol(symbol).map(|movement| movement.command())
}

/// Set absolute tilt and pan, then apply.
pub fn encode_absolute(tilt: i32, pan: i32) -> String {
    format!("TP{}\nPP{}\nA\n", tilt, pan)
}

pub fn encode_tilt(tilt: i32) -> String {
    format!("TP{}\nA\n", tilt)
}

pub fn encode_pan(pan: i32) -> String {
    format!("PP{}\nA\n", pan)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_resets_then_applies() {
        assert_eq!(encode_home(), "RE\nA\n");
    }

    #[test]
    fn every_symbol_maps_to_its_offset() {
        assert_eq!(encode_move('u'), Ok("TO100\n"));
        assert_eq!(encode_move('d'), Ok("TO-100\n"));
        assert_eq!(encode_move('l'), Ok("PO-100\n"));
        assert_eq!(encode_move('r'), Ok("PO100\n"));
    }

    #[test]
    fn unknown_symbol_is_rejected() {
        for symbol in ['w', 'a', 's', 'U', ' ', 'x'] {
            assert_eq!(
                encode_move(symbol),
                Err(ProtocolError::UnknownCommand(symbol))
            );
        }
    }

    #[test]
    fn movement_symbols_are_consistent() {
        for movement in Movement::ALL {
            assert_eq!(Movement::from_symbol(movement.symbol()), Ok(movement));
            assert_eq!(encode_move(movement.symbol()), Ok(movement.command()));
        }
    }

    #[test]
    fn movement_parses_from_single_char_strings_only() {
        assert_eq!("l".parse::<Movement>(), Ok(Movement::Left));
        assert_eq!(
            "left".parse::<Movement>(),
            Err(ProtocolError::UnknownCommand('l'))
        );
        assert!("".parse::<Movement>().is_err());
    }

    #[test]
    fn absolute_substitutes_values_verbatim() {
        assert_eq!(encode_absolute(3000, -3000), "TP3000\nPP-3000\nA\n");
        assert_eq!(encode_absolute(0, 0), "TP0\nPP0\nA\n");
        assert_eq!(encode_absolute(-1, 42), "TP-1\nPP42\nA\n");
        assert_eq!(
            encode_absolute(i32::MIN, i32::MAX),
            format!("TP{}\nPP{}\nA\n", i32::MIN, i32::MAX)
        );
    }

    #[test]
    fn single_axis_commands_apply() {
        assert_eq!(encode_tilt(-3000), "TP-3000\nA\n");
        assert_eq!(encode_pan(3000), "PP3000\nA\n");
    }
}
