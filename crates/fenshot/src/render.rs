//! SVG board diagrams with an optional move arrow.

use std::fmt::Write;

use fenshot_board::TopSide;
use fenshot_position::{Piece, PieceKind, Placement, Square};
use serde::{Deserialize, Serialize};

/// Colours and size of a rendered diagram.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramStyle {
    /// Side length of the square image in pixels.
    pub size: u32,
    pub light: String,
    pub dark: String,
    /// `#rrggbb` or `#rrggbbaa`.
    pub arrow: String,
}

impl Default for DiagramStyle {
    fn default() -> Self {
        Self {
            size: 350,
            light: "#ffce9e".to_string(),
            dark: "#d18b47".to_string(),
            arrow: "#0000cccc".to_string(),
        }
    }
}

fn glyph(piece: Piece) -> char {
    use fenshot_position::Color::{Black, White};
    match (piece.color, piece.kind) {
        (White, PieceKind::King) => '\u{2654}',
        (White, PieceKind::Queen) => '\u{2655}',
        (White, PieceKind::Rook) => '\u{2656}',
        (White, PieceKind::Bishop) => '\u{2657}',
        (White, PieceKind::Knight) => '\u{2658}',
        (White, PieceKind::Pawn) => '\u{2659}',
        (Black, PieceKind::King) => '\u{265A}',
        (Black, PieceKind::Queen) => '\u{265B}',
        (Black, PieceKind::Rook) => '\u{265C}',
        (Black, PieceKind::Bishop) => '\u{265D}',
        (Black, PieceKind::Knight) => '\u{265E}',
        (Black, PieceKind::Pawn) => '\u{265F}',
    }
}

/// `#rrggbbaa` -> (`#rrggbb`, alpha in 0..=1). Other forms are opaque.
fn split_alpha(color: &str) -> (&str, f32) {
    if color.len() == 9 && color.starts_with('#') {
        if let Ok(a) = u8::from_str_radix(&color[7..], 16) {
            return (&color[..7], f32::from(a) / 255.0);
        }
    }
    (color, 1.0)
}

/// Screen cell (row, col) of `sq`. With White on top the board is drawn
/// from Black's side.
fn screen_cell(sq: Square, top: TopSide) -> (usize, usize) {
    match top {
        TopSide::Black => (sq.row(), sq.col()),
        TopSide::White => (7 - sq.row(), 7 - sq.col()),
    }
}

fn cell_centre(sq: Square, top: TopSide, cell: f64) -> (f64, f64) {
    let (row, col) = screen_cell(sq, top);
    ((col as f64 + 0.5) * cell, (row as f64 + 0.5) * cell)
}

fn push_arrow(svg: &mut String, from: Square, to: Square, top: TopSide, cell: f64, color: &str) {
    let (x0, y0) = cell_centre(from, top, cell);
    let (x1, y1) = cell_centre(to, top, cell);
    let angle = (y1 - y0).atan2(x1 - x0);
    let head = cell * 0.5;
    let spread = std::f64::consts::PI / 6.0;
    let (fill, alpha) = split_alpha(color);

    // shaft stops where the head starts
    let back = head * spread.cos();
    let (sx, sy) = (x1 - back * angle.cos(), y1 - back * angle.sin());
    let (lx, ly) = (
        x1 - head * (angle - spread).cos(),
        y1 - head * (angle - spread).sin(),
    );
    let (rx, ry) = (
        x1 - head * (angle + spread).cos(),
        y1 - head * (angle + spread).sin(),
    );

    let _ = writeln!(
        svg,
        r#"<g class="arrow {from}{to}" fill="{fill}" stroke="{fill}" opacity="{alpha:.3}">"#
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{x0:.1}" y1="{y0:.1}" x2="{sx:.1}" y2="{sy:.1}" stroke-width="{:.1}" stroke-linecap="round"/>"#,
        cell / 6.0
    );
    let _ = writeln!(
        svg,
        r#"<polygon points="{x1:.1},{y1:.1} {lx:.1},{ly:.1} {rx:.1},{ry:.1}" stroke="none"/>"#
    );
    svg.push_str("</g>\n");
}

/// Render `placement` as a standalone SVG document.
///
/// `top` names the side whose pieces sit at the top of the photo the
/// placement was read from; the diagram keeps that point of view.
pub fn board_svg(
    placement: &Placement,
    arrow: Option<(Square, Square)>,
    top: TopSide,
    style: &DiagramStyle,
) -> String {
    let size = style.size.max(8);
    let cell = f64::from(size) / 8.0;
    let occupancy = placement.to_occupancy();

    let mut svg = String::new();
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" version="1.1" width="{size}" height="{size}" viewBox="0 0 {size} {size}">"#
    );
    for (row, rank) in occupancy.cells().iter().enumerate() {
        for (col, piece) in rank.iter().enumerate() {
            let Some(sq) = Square::from_row_col(row, col) else {
                continue;
            };
            let (r, c) = screen_cell(sq, top);
            let (x, y) = (c as f64 * cell, r as f64 * cell);
            let fill = if (row + col) % 2 == 0 {
                &style.light
            } else {
                &style.dark
            };
            let _ = writeln!(
                svg,
                r#"<rect class="square {sq}" x="{x:.1}" y="{y:.1}" width="{cell:.1}" height="{cell:.1}" fill="{fill}"/>"#
            );
            if let Some(piece) = piece {
                let _ = writeln!(
                    svg,
                    r#"<text class="piece {piece}" x="{:.1}" y="{:.1}" font-size="{:.1}" text-anchor="middle" dominant-baseline="central">{}</text>"#,
                    x + cell / 2.0,
                    y + cell / 2.0,
                    cell * 0.8,
                    glyph(*piece)
                );
            }
        }
    }
    if let Some((from, to)) = arrow {
        push_arrow(&mut svg, from, to, top, cell, &style.arrow);
    }
    svg.push_str("</svg>\n");
    svg
}

#[cfg(test)]
mod tests {
    use super::*;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR";

    fn sq(s: &str) -> Square {
        s.parse().expect("square")
    }

    fn placement(s: &str) -> Placement {
        Placement::parse(s).expect("placement")
    }

    #[test]
    fn empty_board_has_squares_only() {
        let svg = board_svg(
            &placement("8/8/8/8/8/8/8/8"),
            None,
            TopSide::Black,
            &DiagramStyle::default(),
        );
        assert!(svg.starts_with("<svg "));
        assert!(svg.trim_end().ends_with("</svg>"));
        assert_eq!(svg.matches("<rect").count(), 64);
        assert_eq!(svg.matches("<text").count(), 0);
        assert!(!svg.contains("arrow"));
    }

    #[test]
    fn start_position_draws_every_piece() {
        let svg = board_svg(&placement(START), None, TopSide::Black, &DiagramStyle::default());
        assert_eq!(svg.matches("<text").count(), 32);
        assert_eq!(svg.matches('\u{2659}').count(), 8);
        assert_eq!(svg.matches('\u{265A}').count(), 1);
    }

    #[test]
    fn arrow_runs_from_origin_centre() {
        let svg = board_svg(
            &placement(START),
            Some((sq("e2"), sq("e4"))),
            TopSide::Black,
            &DiagramStyle::default(),
        );
        // 350 px board, 43.75 px cells: e2 is column 4, row 6
        assert!(svg.contains(r#"x1="196.9" y1="284.4""#), "{svg}");
        assert!(svg.contains(r##"fill="#0000cc""##));
        assert!(svg.contains(r#"opacity="0.800""#));
        assert_eq!(svg.matches("<polygon").count(), 1);
    }

    #[test]
    fn white_on_top_draws_from_blacks_side() {
        let style = DiagramStyle {
            size: 80,
            ..Default::default()
        };
        let svg = board_svg(&placement("8/8/8/8/8/8/8/4K3"), None, TopSide::White, &style);
        // e1 lands in screen row 0, column 3
        assert!(
            svg.contains(r#"<text class="piece K" x="35.0" y="5.0""#),
            "{svg}"
        );
        let svg = board_svg(
            &placement(START),
            Some((sq("e2"), sq("e4"))),
            TopSide::White,
            &style,
        );
        assert!(svg.contains(r#"x1="35.0" y1="15.0""#), "{svg}");
    }

    #[test]
    fn opaque_colours_pass_through() {
        assert_eq!(split_alpha("#0000cccc"), ("#0000cc", 0.8));
        assert_eq!(split_alpha("#15781b"), ("#15781b", 1.0));
        assert_eq!(split_alpha("red"), ("red", 1.0));
    }
}
