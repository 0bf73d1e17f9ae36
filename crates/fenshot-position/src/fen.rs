//! FEN synthesis, parsing and structural validation.
//!
//! Only the structure of a position is checked here. Legality (check, move
//! history, en-passant correctness) is left to the engine.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Color, FenError, Occupancy, Piece, PieceKind, Square};

const PLACEMENT_ALPHABET: &str = "rnbqkpRNBQKP12345678";

fn is_placement_char(c: char) -> bool {
    PLACEMENT_ALPHABET.contains(c)
}

/// Validated piece-placement field: rank 8 first, `/` separated, empty
/// squares run-length encoded.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Placement(String);

impl Placement {
    /// Run-length encode a board. The result is structurally valid by
    /// construction; piece counts are not checked here.
    pub fn from_occupancy(occ: &Occupancy) -> Self {
        let ranks: Vec<String> = occ
            .cells()
            .iter()
            .map(|rank| {
                let mut out = String::with_capacity(8);
                let mut empties = 0u8;
                for cell in rank {
                    match cell {
                        Some(piece) => {
                            if empties > 0 {
                                out.push((b'0' + empties) as char);
                                empties = 0;
                            }
                            out.push(piece.fen_char());
                        }
                        None => empties += 1,
                    }
                }
                if empties > 0 {
                    out.push((b'0' + empties) as char);
                }
                out
            })
            .collect();
        Self(ranks.join("/"))
    }

    /// Structural check: exactly eight `/`-separated groups drawn from the
    /// piece and digit alphabet. Rank widths are not checked.
    pub fn validate(placement: &str) -> Result<(), FenError> {
        let groups: Vec<&str> = placement.split('/').collect();
        let well_formed = groups.len() == 8
            && groups
                .iter()
                .all(|g| !g.is_empty() && g.chars().all(is_placement_char));
        if well_formed {
            Ok(())
        } else {
            Err(FenError::InvalidFenStructure {
                placement: placement.to_string(),
            })
        }
    }

    /// Validate and additionally require every rank to cover exactly 8 files.
    pub fn parse(placement: &str) -> Result<Self, FenError> {
        Self::validate(placement)?;
        decode(placement)?;
        Ok(Self(placement.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_occupancy(&self) -> Occupancy {
        // Widths were checked on construction.
        decode(&self.0).unwrap_or_default()
    }

    pub fn is_empty_board(&self) -> bool {
        self.0 == "8/8/8/8/8/8/8/8"
    }

    pub fn castling_rights(&self) -> CastlingRights {
        CastlingRights::infer(&self.to_occupancy())
    }

    /// Rank order reversed.
    pub fn flipped_ranks(&self) -> Self {
        Self::from_occupancy(&self.to_occupancy().flipped_ranks())
    }

    /// Ranks and files reversed: the view from the opposite side.
    pub fn rotated_180(&self) -> Self {
        Self::from_occupancy(&self.to_occupancy().rotated_180())
    }

    /// Files reversed in every rank.
    pub fn mirrored_files(&self) -> Self {
        Self::from_occupancy(&self.to_occupancy().mirrored_files())
    }
}

fn decode(placement: &str) -> Result<Occupancy, FenError> {
    let mut cells = [[None; 8]; 8];
    let groups: Vec<&str> = placement.split('/').collect();
    if groups.len() != 8 {
        return Err(FenError::InvalidFenStructure {
            placement: placement.to_string(),
        });
    }
    for (row, group) in groups.iter().enumerate() {
        let rank = 8 - row as u8;
        let mut col = 0usize;
        for c in group.chars() {
            if let Some(run) = c.to_digit(10) {
                col += run as usize;
            } else {
                let piece = Piece::from_fen_char(c)?;
                if col < 8 {
                    cells[row][col] = Some(piece);
                }
                col += 1;
            }
        }
        if col != 8 {
            return Err(FenError::InvalidRankWidth { rank, width: col });
        }
    }
    Ok(Occupancy::from_cells(cells))
}

impl fmt::Display for Placement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Placement {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Placement {
    type Error = FenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Placement> for String {
    fn from(p: Placement) -> Self {
        p.0
    }
}

impl From<&Occupancy> for Placement {
    fn from(occ: &Occupancy) -> Self {
        Self::from_occupancy(occ)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CastlingRights {
    pub white_king_side: bool,
    pub white_queen_side: bool,
    pub black_king_side: bool,
    pub black_queen_side: bool,
}

impl CastlingRights {
    /// Rights implied by king and rook placement alone: the king on its
    /// home square with the matching rook on its corner.
    pub fn infer(occ: &Occupancy) -> Self {
        let has = |sq: &str, color: Color, kind: PieceKind| {
            sq.parse::<Square>()
                .ok()
                .and_then(|s| occ.get(s))
                .is_some_and(|p| p == Piece::new(color, kind))
        };
        let white_king = has("e1", Color::White, PieceKind::King);
        let black_king = has("e8", Color::Black, PieceKind::King);
        Self {
            white_king_side: white_king && has("h1", Color::White, PieceKind::Rook),
            white_queen_side: white_king && has("a1", Color::White, PieceKind::Rook),
            black_king_side: black_king && has("h8", Color::Black, PieceKind::Rook),
            black_queen_side: black_king && has("a8", Color::Black, PieceKind::Rook),
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_none(&self) -> bool {
        *self == Self::none()
    }
}

/// `KQkq` order, `-` when no side may castle.
impl fmt::Display for CastlingRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("-");
        }
        for (flag, c) in [
            (self.white_king_side, 'K'),
            (self.white_queen_side, 'Q'),
            (self.black_king_side, 'k'),
            (self.black_queen_side, 'q'),
        ] {
            if flag {
                write!(f, "{c}")?;
            }
        }
        Ok(())
    }
}

impl FromStr for CastlingRights {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FenError::InvalidFen {
            fen: s.to_string(),
            reason: "castling field must be `-` or a subset of `KQkq`",
        };
        if s.is_empty() {
            return Err(invalid());
        }
        let mut rights = Self::none();
        for c in s.chars() {
            match c {
                'K' => rights.white_king_side = true,
                'Q' => rights.white_queen_side = true,
                'k' => rights.black_king_side = true,
                'q' => rights.black_queen_side = true,
                '-' => {}
                _ => return Err(invalid()),
            }
        }
        Ok(rights)
    }
}

/// A complete FEN record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fen {
    pub placement: Placement,
    pub side_to_move: Color,
    pub castling: CastlingRights,
    pub en_passant: Option<Square>,
    pub halfmove: u32,
    pub fullmove: u32,
}

impl Fen {
    /// Full record for `placement` with castling inferred from the back
    /// ranks, no en-passant square and both counters at zero.
    pub fn new(placement: Placement, side_to_move: Color) -> Self {
        let castling = placement.castling_rights();
        Self {
            placement,
            side_to_move,
            castling,
            en_passant: None,
            halfmove: 0,
            fullmove: 0,
        }
    }

    pub fn with_counters(mut self, halfmove: u32, fullmove: u32) -> Self {
        self.halfmove = halfmove;
        self.fullmove = fullmove;
        self
    }
}

fn side_char(side: Color) -> char {
    match side {
        Color::White => 'w',
        Color::Black => 'b',
    }
}

impl fmt::Display for Fen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} ",
            self.placement,
            side_char(self.side_to_move),
            self.castling
        )?;
        match self.en_passant {
            Some(sq) => f.write_str(&sq.uci())?,
            None => f.write_str("-")?,
        }
        write!(f, " {} {}", self.halfmove, self.fullmove)
    }
}

impl FromStr for Fen {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !is_valid_fen(s) {
            return Err(FenError::InvalidFen {
                fen: s.to_string(),
                reason: "expected `<placement> <w|b> <castling> <en-passant> <halfmove> <fullmove>`",
            });
        }
        let fields: Vec<&str> = s.split(' ').collect();
        let invalid = |reason| FenError::InvalidFen {
            fen: s.to_string(),
            reason,
        };

        let placement = Placement::parse(fields[0])?;
        let side_to_move = match fields[1] {
            "w" => Color::White,
            _ => Color::Black,
        };
        let castling: CastlingRights = fields[2].parse()?;
        let en_passant = match fields[3] {
            "-" => None,
            ep => Some(
                ep.parse::<Square>()
                    .map_err(|_| invalid("en-passant field is not a square"))?,
            ),
        };
        let halfmove = fields[4]
            .parse()
            .map_err(|_| invalid("halfmove counter out of range"))?;
        let fullmove = fields[5]
            .parse()
            .map_err(|_| invalid("fullmove counter out of range"))?;

        Ok(Self {
            placement,
            side_to_move,
            castling,
            en_passant,
            halfmove,
            fullmove,
        })
    }
}

/// Structural check of a complete FEN string.
///
/// Accepts eight placement groups over `rnbqkpRNBQKP1-8`, a side of `w` or
/// `b`, a non-empty castling field over `KQkq-`, an en-passant field over
/// `a-h`, `1-8` and `-`, and two unsigned counters, separated by single
/// spaces. Rank widths are not checked.
pub fn is_valid_fen(fen: &str) -> bool {
    let fields: Vec<&str> = fen.split(' ').collect();
    let [placement, side, castling, en_passant, halfmove, fullmove] = fields.as_slice() else {
        return false;
    };
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    Placement::validate(placement).is_ok()
        && matches!(*side, "w" | "b")
        && !castling.is_empty()
        && castling.chars().all(|c| "KQkq-".contains(c))
        && en_passant
            .chars()
            .all(|c| matches!(c, 'a'..='h' | '1'..='8' | '-'))
        && digits(*halfmove)
        && digits(*fullmove)
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

    fn sq(s: &str) -> Square {
        s.parse().expect("square")
    }

    #[test]
    fn empty_board_encodes_as_eights() {
        let p = Placement::from_occupancy(&Occupancy::empty());
        assert_eq!(p.as_str(), "8/8/8/8/8/8/8/8");
        assert!(p.is_empty_board());
        assert_eq!(Fen::new(p, Color::White).to_string(), "8/8/8/8/8/8/8/8 w - - 0 0");
    }

    #[test]
    fn two_kings() {
        let occ = Occupancy::from_placements(&[
            (sq("e1"), Piece::new(Color::White, PieceKind::King)),
            (sq("e8"), Piece::new(Color::Black, PieceKind::King)),
        ]);
        let p = Placement::from_occupancy(&occ);
        assert_eq!(p.as_str(), "4k3/8/8/8/8/8/8/4K3");
        assert!(p.castling_rights().is_none());
    }

    #[test]
    fn serialize_parse_serialize_is_identity() {
        for s in [
            START,
            "8/8/8/8/8/8/8/8",
            "4k3/8/8/8/8/8/8/4K3",
            "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R",
        ] {
            let p = Placement::parse(s).expect("valid");
            assert_eq!(Placement::from_occupancy(&p.to_occupancy()).as_str(), s);
        }
    }

    #[test]
    fn structure_errors() {
        for bad in [
            "8/8/8/8/8/8/8",
            "8/8/8/8/8/8/8/8/8",
            "8/8/8/8/8/8/8/x7",
            "8/8/8//8/8/8/8",
            "8/8/8/8/8/8/8/09",
        ] {
            assert_eq!(
                Placement::validate(bad),
                Err(FenError::InvalidFenStructure {
                    placement: bad.to_string()
                }),
                "{bad}"
            );
        }
    }

    #[test]
    fn rank_width_is_checked_on_parse() {
        assert!(Placement::validate("7/8/8/8/8/8/8/8").is_ok());
        assert_eq!(
            Placement::parse("7/8/8/8/8/8/8/8"),
            Err(FenError::InvalidRankWidth { rank: 8, width: 7 })
        );
        assert_eq!(
            Placement::parse("8/8/8/8/8/8/8/K8"),
            Err(FenError::InvalidRankWidth { rank: 1, width: 9 })
        );
    }

    #[test]
    fn castling_from_start_position() {
        let p = Placement::parse(START).expect("start");
        assert_eq!(p.castling_rights().to_string(), "KQkq");
        let fen = Fen::new(p, Color::White);
        assert_eq!(fen.to_string(), format!("{START} w KQkq - 0 0"));
    }

    #[test]
    fn castling_needs_king_and_rook_at_home() {
        let cases = [
            ("4k2r/8/8/8/8/8/8/R3K3", "Qk"),
            ("r3k3/8/8/8/8/8/8/4K2R", "Kq"),
            ("r2k3r/8/8/8/8/8/8/R3K2R", "KQ"),
            ("4k3/8/8/8/8/8/8/R2K3R", "-"),
            ("rnbqkbnr/8/8/8/8/8/8/RNBQKBNR", "KQkq"),
        ];
        for (placement, rights) in cases {
            let p = Placement::parse(placement).expect("valid");
            assert_eq!(p.castling_rights().to_string(), rights, "{placement}");
        }
    }

    #[test]
    fn castling_reads_cells_not_run_lengths() {
        // `R1p2K`: the king is three characters after the rook but stands on f1
        let p = Placement::parse("4k3/8/8/8/8/8/8/R1p2K2").expect("valid");
        assert!(p.castling_rights().is_none());
        let p = Placement::parse("r3k3/8/8/8/8/8/8/R1p1K3").expect("valid");
        assert_eq!(p.castling_rights().to_string(), "Qq");
    }

    #[test]
    fn full_fen_validation() {
        assert!(is_valid_fen(&format!("{START} w KQkq - 0 1")));
        assert!(is_valid_fen("8/8/8/8/8/8/8/8 b - e3 12 40"));
        assert!(!is_valid_fen(&format!("{START} x KQkq - 0 1")));
        assert!(!is_valid_fen(&format!("{START} w KQkx - 0 1")));
        assert!(!is_valid_fen(&format!("{START} w KQkq - 0")));
        assert!(!is_valid_fen(&format!("{START} w KQkq - a 1")));
        assert!(!is_valid_fen("8/8/8/8/8/8/8 w - - 0 0"));
        assert!(!is_valid_fen(&format!("{START}  w KQkq - 0 1")));
    }

    #[test]
    fn full_fen_round_trip() {
        let text = "r3k2r/8/8/8/4Pp2/8/8/R3K2R b KQkq e3 0 23";
        let fen: Fen = text.parse().expect("fen");
        assert_eq!(fen.side_to_move, Color::Black);
        assert_eq!(fen.en_passant, Some(sq("e3")));
        assert_eq!(fen.fullmove, 23);
        assert_eq!(fen.to_string(), text);
    }

    #[test]
    fn placement_transforms() {
        let p = Placement::parse("4k3/8/8/8/8/8/8/R3K3").expect("valid");
        assert_eq!(p.flipped_ranks().as_str(), "R3K3/8/8/8/8/8/8/4k3");
        assert_eq!(p.mirrored_files().as_str(), "3k4/8/8/8/8/8/8/3K3R");
        assert_eq!(p.rotated_180().as_str(), "3K3R/8/8/8/8/8/8/3k4");
    }

    #[test]
    fn placement_serializes_as_string() {
        let p = Placement::parse(START).expect("start");
        let json = serde_json::to_string(&p).expect("json");
        assert_eq!(json, format!("\"{START}\""));
        assert!(serde_json::from_str::<Placement>("\"8/8\"").is_err());
    }
}
