//! Opening style classification
//!
//! Looks at the destination squares of a player's first three moves and
//! buckets the player as aggressive, balanced or defensive.

use std::fmt;

use serde::Serialize;
use shakmaty::uci::UciMove;
use shakmaty::Square;

/// How many opening moves are inspected
pub const OPENING_MOVES: usize = 3;

/// Central advances
const AGGRESSIVE_SQUARES: [Square; 5] = [Square::E4, Square::D4, Square::C4, Square::F4, Square::G4];

/// Quiet third-rank moves
const DEFENSIVE_SQUARES: [Square; 5] = [Square::E3, Square::D3, Square::G3, Square::B3, Square::H3];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StyleCategory {
    Aggressive,
    Balanced,
    Defensive,
}

impl StyleCategory {
    pub const ALL: [StyleCategory; 3] = [
        StyleCategory::Aggressive,
        StyleCategory::Balanced,
        StyleCategory::Defensive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleCategory::Aggressive => "aggressive",
            StyleCategory::Balanced => "balanced",
            StyleCategory::Defensive => "defensive",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StyleCategory::Aggressive => "Aggressive",
            StyleCategory::Balanced => "Balanced",
            StyleCategory::Defensive => "Defensive",
        }
    }
}

impl fmt::Display for StyleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Destination square of a move; drops (`P@e4`) count too
fn destination(mv: &UciMove) -> Option<Square> {
    match mv {
        UciMove::Normal { to, .. } => Some(*to),
        UciMove::Put { to, .. } => Some(*to),
        UciMove::Null => None,
    }
}

/// Classifies a player from their opening moves.
///
/// Only the first three moves matter. Two or more central advances make the
/// player aggressive; otherwise two or more third-rank moves make them
/// defensive; anything else is balanced.
pub fn classify(moves: &[UciMove]) -> StyleCategory {
    let mut aggressive = 0;
    let mut defensive = 0;

    for to in moves.iter().take(OPENING_MOVES).filter_map(destination) {
        if AGGRESSIVE_SQUARES.contains(&to) {
            aggressive += 1;
        } else if DEFENSIVE_SQUARES.contains(&to) {
            defensive += 1;
        }
    }

    if aggressive >= 2 {
        StyleCategory::Aggressive
    } else if defensive >= 2 {
        StyleCategory::Defensive
    } else {
        StyleCategory::Balanced
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moves(list: &[&str]) -> Vec<UciMove> {
        list.iter().map(|m| m.parse().unwrap()).collect()
    }

    #[test]
    fn test_two_central_advances_are_aggressive() {
        assert_eq!(classify(&moves(&["e2e4", "d2d4", "g1f3"])), StyleCategory::Aggressive);
        assert_eq!(classify(&moves(&["c2c4", "b1c3", "g2g4"])), StyleCategory::Aggressive);
    }

    #[test]
    fn test_aggressive_checked_before_defensive() {
        assert_eq!(classify(&moves(&["e2e4", "f2f4", "e4e3"])), StyleCategory::Aggressive);
    }

    #[test]
    fn test_two_third_rank_moves_are_defensive() {
        assert_eq!(classify(&moves(&["e2e3", "g2g3", "g1f3"])), StyleCategory::Defensive);
        assert_eq!(classify(&moves(&["b2b3", "h2h3", "e2e4"])), StyleCategory::Defensive);
    }

    #[test]
    fn test_neutral_and_tied_openings_are_balanced() {
        assert_eq!(classify(&moves(&["g1f3", "b1c3", "a2a3"])), StyleCategory::Balanced);
        assert_eq!(classify(&moves(&["e2e4", "d2d3", "g1f3"])), StyleCategory::Balanced);
    }

    #[test]
    fn test_only_first_three_moves_count() {
        assert_eq!(
            classify(&moves(&["g1f3", "b1c3", "a2a3", "e2e4", "d2d4"])),
            StyleCategory::Balanced
        );
    }

    #[test]
    fn test_black_moves_use_the_same_squares() {
        // Black reaching e4/d4 is still a central advance
        assert_eq!(classify(&moves(&["e5e4", "d5d4", "b8c6"])), StyleCategory::Aggressive);
    }
}
