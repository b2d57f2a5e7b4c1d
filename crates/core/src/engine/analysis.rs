//! Types for representing engine search results

use std::fmt;

use serde::Serialize;
use shakmaty::uci::UciMove;

/// Score reported by the engine, relative to the side to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum Evaluation {
    /// Centipawn score (positive = side to move is better)
    Centipawns(i32),
    /// Forced mate in N (positive = side to move mates)
    Mate(i32),
}

impl fmt::Display for Evaluation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Evaluation::Centipawns(cp) => {
                let score = *cp as f32 / 100.0;
                if score >= 0.0 {
                    write!(f, "+{:.2}", score)
                } else {
                    write!(f, "{:.2}", score)
                }
            }
            Evaluation::Mate(moves) => write!(f, "M{}", moves),
        }
    }
}

/// One line of a multi-line search
#[derive(Debug, Clone)]
pub struct CandidateMove {
    /// First move of the line
    pub mv: UciMove,
    /// Engine's evaluation of the line
    pub evaluation: Evaluation,
    /// Principal variation in UCI notation, starting with `mv`
    pub pv: Vec<String>,
    /// Depth the line was reported at
    pub depth: u8,
}

impl CandidateMove {
    /// Returns a brief summary of the line
    pub fn summary(&self) -> String {
        format!(
            "{} ({}) depth {}: {}",
            self.mv,
            self.evaluation,
            self.depth,
            self.pv.iter().take(5).cloned().collect::<Vec<_>>().join(" ")
        )
    }
}

/// A parsed `info` line carrying a principal variation
#[derive(Debug, Clone, PartialEq)]
pub struct InfoLine {
    pub multipv: u32,
    pub depth: u8,
    pub evaluation: Option<Evaluation>,
    pub pv: Vec<String>,
}

/// Parses an `info` line from a UCI engine.
///
/// Returns `None` for lines without a principal variation (`info string`,
/// `currmove` updates and the like).
pub fn parse_info_line(line: &str) -> Option<InfoLine> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.first() != Some(&"info") {
        return None;
    }

    let mut info = InfoLine {
        multipv: 1,
        depth: 0,
        evaluation: None,
        pv: Vec::new(),
    };
    let mut i = 1;

    while i < parts.len() {
        match parts[i] {
            "depth" => {
                if i + 1 < parts.len() {
                    info.depth = parts[i + 1].parse().unwrap_or(0);
                }
                i += 2;
            }
            "multipv" => {
                if i + 1 < parts.len() {
                    info.multipv = parts[i + 1].parse().unwrap_or(1);
                }
                i += 2;
            }
            "score" => {
                if i + 2 < parts.len() {
                    match parts[i + 1] {
                        "cp" => {
                            if let Ok(cp) = parts[i + 2].parse::<i32>() {
                                info.evaluation = Some(Evaluation::Centipawns(cp));
                            }
                        }
                        "mate" => {
                            if let Ok(m) = parts[i + 2].parse::<i32>() {
                                info.evaluation = Some(Evaluation::Mate(m));
                            }
                        }
                        _ => {}
                    }
                }
                i += 3;
            }
            "string" => return None,
            "pv" => {
                // Everything after "pv" is the principal variation
                info.pv = parts[i + 1..].iter().map(|s| s.to_string()).collect();
                break;
            }
            _ => {
                i += 1;
            }
        }
    }

    if info.pv.is_empty() {
        None
    } else {
        Some(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multipv_line() {
        let line = "info depth 12 seldepth 18 multipv 2 score cp -35 nodes 5120 nps 9000 pv d2d4 d7d5 c2c4";
        let info = parse_info_line(line).unwrap();
        assert_eq!(info.multipv, 2);
        assert_eq!(info.depth, 12);
        assert_eq!(info.evaluation, Some(Evaluation::Centipawns(-35)));
        assert_eq!(info.pv, vec!["d2d4", "d7d5", "c2c4"]);
    }

    #[test]
    fn test_parse_mate_score() {
        let info = parse_info_line("info depth 9 score mate -3 pv h7h8q").unwrap();
        assert_eq!(info.multipv, 1);
        assert_eq!(info.evaluation, Some(Evaluation::Mate(-3)));
    }

    #[test]
    fn test_lines_without_pv_are_skipped() {
        assert!(parse_info_line("info depth 3 currmove e2e4 currmovenumber 1").is_none());
        assert!(parse_info_line("info string NNUE evaluation using nn.bin").is_none());
        assert!(parse_info_line("bestmove e2e4").is_none());
    }

    #[test]
    fn test_evaluation_display() {
        assert_eq!(Evaluation::Centipawns(35).to_string(), "+0.35");
        assert_eq!(Evaluation::Centipawns(-120).to_string(), "-1.20");
        assert_eq!(Evaluation::Mate(-2).to_string(), "M-2");
    }
}
