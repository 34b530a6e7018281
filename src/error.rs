// SPDX-License-Identifier: GPL-3.0-or-later

use thiserror::Error;

// Malformed position encoding. Position::set() falls back to the starting
// position when it returns one of these.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    #[error("missing FEN field: {0}")]
    MissingField(&'static str),

    #[error("expected 8 ranks, found {0}")]
    BadRankCount(usize),

    #[error("rank {0} does not describe exactly 8 squares")]
    BadRank(u32),

    #[error("invalid piece character '{0}'")]
    BadPiece(char),

    #[error("too many pieces of kind '{0}'")]
    TooManyPieces(char),

    #[error("each side needs exactly one king")]
    KingCount,

    #[error("pawn on the first or last rank")]
    PawnOnBackRank,

    #[error("invalid side to move '{0}'")]
    BadSideToMove(String),

    #[error("invalid castling availability '{0}'")]
    BadCastling(char),

    #[error("invalid en passant square '{0}'")]
    BadEnPassant(String),

    #[error("invalid move counter '{0}'")]
    BadCounter(String),

    #[error("the side not to move is in check")]
    OpponentInCheck,
}

// A move coming from outside the engine that cannot be played.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    #[error("cannot parse move '{0}'")]
    Unparsable(String),

    #[error("illegal move '{0}'")]
    Illegal(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OptionError {
    #[error("no such option: {0}")]
    Unknown(String),

    #[error("option {name}: value {value} outside {min}..={max}")]
    OutOfRange {
        name: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("option {name}: invalid value '{value}'")]
    InvalidValue { name: String, value: String },
}

// Fatal: the engine cannot run without its transposition table.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TtError {
    #[error("failed to allocate {mb} MB for the transposition table")]
    Allocation { mb: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            FenError::BadPiece('x').to_string(),
            "invalid piece character 'x'"
        );
        assert_eq!(
            OptionError::OutOfRange {
                name: "Hash".to_string(),
                value: 0,
                min: 1,
                max: 65536
            }
            .to_string(),
            "option Hash: value 0 outside 1..=65536"
        );
        assert_eq!(
            TtError::Allocation { mb: 64 }.to_string(),
            "failed to allocate 64 MB for the transposition table"
        );
    }
}
