//! Piece boxes to board squares.
//!
//! A box is a poor proxy for where a piece stands: tall pieces lean over the
//! squares behind them. Points are therefore drawn from the bottom band of
//! each box (the piece's base), by default along its vertical centre line,
//! pushed through the composed transform into the canonical frame and voted
//! onto grid cells.

use std::sync::Arc;

use fenshot_core::{BoundingBox, Homography};
use log::debug;
use nalgebra::Point2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{BoardGrid, Piece, Square};

/// Class information attached to a piece box.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassScores {
    /// One score per class, in [`crate::PIECE_CLASSES`] order.
    Probabilities(Vec<f32>),
    /// Label already decided by the detector.
    Resolved(Piece),
}

impl ClassScores {
    /// Arg-max class (first one on ties). `None` for an empty vector or one
    /// without a finite score.
    pub fn resolve(&self) -> Option<Piece> {
        match self {
            ClassScores::Resolved(piece) => Some(*piece),
            ClassScores::Probabilities(probs) => {
                let mut best: Option<(usize, f32)> = None;
                for (i, &p) in probs.iter().enumerate() {
                    if !p.is_finite() {
                        continue;
                    }
                    if best.is_none_or(|(_, b)| p > b) {
                        best = Some((i, p));
                    }
                }
                Piece::from_class_index(best?.0)
            }
        }
    }
}

/// Detector output for one piece candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PieceDetection {
    pub bbox: BoundingBox,
    pub scores: ClassScores,
}

impl PieceDetection {
    pub fn resolved(bbox: BoundingBox, piece: Piece) -> Self {
        Self {
            bbox,
            scores: ClassScores::Resolved(piece),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapperParams {
    /// Random points drawn per box.
    pub samples: usize,
    /// Height of the sampling band, as a fraction of box height, measured up
    /// from the bottom edge.
    pub base_fraction: f32,
    /// Width of the sampling band, as a fraction of box width, centred on
    /// the box. `0` keeps every sample on the vertical centre line, so a box
    /// centred on a file boundary always lands on the same side.
    pub column_fraction: f32,
}

impl Default for MapperParams {
    fn default() -> Self {
        Self {
            samples: 10,
            base_fraction: 0.2,
            column_fraction: 0.0,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SquareMapper {
    params: MapperParams,
    grid: Arc<BoardGrid>,
}

impl Default for SquareMapper {
    fn default() -> Self {
        Self::new(MapperParams::default(), Arc::new(BoardGrid::canonical()))
    }
}

impl SquareMapper {
    pub fn new(params: MapperParams, grid: Arc<BoardGrid>) -> Self {
        Self { params, grid }
    }

    pub fn params(&self) -> &MapperParams {
        &self.params
    }

    pub fn grid(&self) -> &BoardGrid {
        &self.grid
    }

    /// Base-band sample points, or `None` when the band is not finite.
    fn sample_base<R: Rng + ?Sized>(
        &self,
        bbox: &BoundingBox,
        rng: &mut R,
    ) -> Option<Vec<Point2<f32>>> {
        let half = 0.5 * self.params.column_fraction.clamp(0.0, 1.0) * bbox.width;
        let (x0, x1) = (bbox.cx - half, bbox.cx + half);
        let y1 = bbox.bottom();
        let y0 = y1 - self.params.base_fraction.clamp(0.0, 1.0) * bbox.height;
        if ![x0, x1, y0, y1, x1 - x0, y1 - y0].iter().all(|v| v.is_finite()) {
            return None;
        }
        let points = (0..self.params.samples)
            .map(|_| {
                let x = if x1 > x0 { rng.gen_range(x0..=x1) } else { x0 };
                Point2::new(x, rng.gen_range(y0..=y1))
            })
            .collect();
        Some(points)
    }

    /// Square receiving the most sample hits for one detection.
    pub fn map_one<R: Rng + ?Sized>(
        &self,
        detection: &PieceDetection,
        h_board_from_piece: &Homography,
        rng: &mut R,
    ) -> Option<(Square, Piece)> {
        let Some(piece) = detection.scores.resolve() else {
            debug!("dropping box without a usable class score: {:?}", detection.bbox);
            return None;
        };
        let b = &detection.bbox;
        if !(b.cx.is_finite() && b.cy.is_finite() && b.width >= 0.0 && b.height >= 0.0) {
            debug!("dropping malformed box {b:?}");
            return None;
        }

        let Some(points) = self.sample_base(b, rng) else {
            debug!("dropping box with non-finite extents {b:?}");
            return None;
        };

        let mut hits = [0u32; 64];
        for p in points {
            if let Some(sq) = self.grid.locate(h_board_from_piece.apply(p)) {
                hits[BoardGrid::index_of(sq)] += 1;
            }
        }

        // strict `>` keeps the first square in grid order on ties
        let mut best: Option<(usize, u32)> = None;
        for (idx, &count) in hits.iter().enumerate() {
            if count > best.map_or(0, |(_, c)| c) {
                best = Some((idx, count));
            }
        }

        let Some((idx, count)) = best else {
            debug!("{piece} at ({:.1}, {:.1}) lands off the board", b.cx, b.cy);
            return None;
        };
        let sq = self.grid.squares().nth(idx)?;
        debug!("{piece} -> {sq} ({count}/{} hits)", self.params.samples);
        Some((sq, piece))
    }

    /// Map every detection; boxes that resolve to no square are dropped.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "debug", skip_all, fields(detections = detections.len()))
    )]
    pub fn map<R: Rng + ?Sized>(
        &self,
        detections: &[PieceDetection],
        h_board_from_piece: &Homography,
        rng: &mut R,
    ) -> Vec<(Square, Piece)> {
        detections
            .iter()
            .filter_map(|d| self.map_one(d, h_board_from_piece, rng))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Color, Occupancy, Placement, PieceKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const WP: Piece = Piece::new(Color::White, PieceKind::Pawn);

    fn sq(s: &str) -> Square {
        s.parse().expect("square")
    }

    #[test]
    fn argmax_resolves_first_maximum() {
        let mut probs = vec![0.0; 12];
        probs[5] = 0.7;
        probs[11] = 0.7;
        assert_eq!(
            ClassScores::Probabilities(probs).resolve(),
            Some(Piece::new(Color::White, PieceKind::King))
        );
        assert_eq!(ClassScores::Probabilities(vec![]).resolve(), None);
        assert_eq!(ClassScores::Probabilities(vec![f32::NAN; 12]).resolve(), None);
    }

    #[test]
    fn base_of_box_decides_the_square() {
        // tall box whose top reaches into e2 but whose base stands on e1
        let det = PieceDetection::resolved(BoundingBox::new(360.0, 560.0, 40.0, 140.0), WP);
        let mut rng = StdRng::seed_from_u64(1);
        let mapped = SquareMapper::default().map_one(&det, &Homography::identity(), &mut rng);
        assert_eq!(mapped, Some((sq("e1"), WP)));
    }

    #[test]
    fn off_board_pieces_are_dropped() {
        let det = PieceDetection::resolved(BoundingBox::new(-200.0, -200.0, 20.0, 20.0), WP);
        let mut rng = StdRng::seed_from_u64(1);
        assert!(SquareMapper::default()
            .map(&[det], &Homography::identity(), &mut rng)
            .is_empty());
    }

    #[test]
    fn box_centred_on_a_file_line_ignores_the_seed() {
        let det = PieceDetection::resolved(BoundingBox::new(320.0, 600.0, 40.0, 40.0), WP);
        let mapper = SquareMapper::default();
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(
                mapper.map_one(&det, &Homography::identity(), &mut rng),
                Some((sq("e1"), WP)),
                "seed {seed}"
            );
        }
    }

    #[test]
    fn full_width_band_votes_inside_one_cell() {
        let mapper = SquareMapper::new(
            MapperParams {
                column_fraction: 1.0,
                ..MapperParams::default()
            },
            Arc::new(BoardGrid::canonical()),
        );
        let det = PieceDetection::resolved(BoundingBox::new(200.0, 440.0, 60.0, 80.0), WP);
        let mut rng = StdRng::seed_from_u64(4);
        assert_eq!(
            mapper.map_one(&det, &Homography::identity(), &mut rng),
            Some((sq("c3"), WP))
        );
    }

    #[test]
    fn non_finite_extents_are_dropped() {
        let mut rng = StdRng::seed_from_u64(1);
        let mapper = SquareMapper::default();
        let infinite = PieceDetection::resolved(BoundingBox::new(320.0, 600.0, f32::INFINITY, 40.0), WP);
        let overflowing =
            PieceDetection::resolved(BoundingBox::new(320.0, f32::MAX, 40.0, f32::MAX), WP);
        let wide = PieceDetection {
            bbox: BoundingBox::new(f32::MAX, 600.0, f32::MAX, 40.0),
            ..infinite.clone()
        };
        assert!(mapper
            .map(&[infinite, overflowing, wide], &Homography::identity(), &mut rng)
            .is_empty());

        let full_width = SquareMapper::new(
            MapperParams {
                column_fraction: 1.0,
                ..Default::default()
            },
            Arc::new(BoardGrid::canonical()),
        );
        let huge = PieceDetection::resolved(BoundingBox::new(0.0, 600.0, f32::MAX, 40.0), WP);
        let nan = PieceDetection::resolved(BoundingBox::new(320.0, 600.0, 40.0, f32::NAN), WP);
        for det in [huge, nan] {
            // dropped or placed, but never a panic inside the sampler
            let _ = full_width.map_one(&det, &Homography::identity(), &mut rng);
        }
        assert_eq!(
            full_width.map_one(
                &PieceDetection::resolved(BoundingBox::new(320.0, 600.0, f32::INFINITY, 40.0), WP),
                &Homography::identity(),
                &mut rng
            ),
            None
        );
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let dets = vec![
            PieceDetection::resolved(BoundingBox::new(320.0, 600.0, 40.0, 40.0), WP),
            PieceDetection {
                bbox: BoundingBox::new(120.0, 100.0, 50.0, 60.0),
                scores: ClassScores::Probabilities(vec![
                    0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.9, 0.0, 0.1,
                ]),
            },
        ];
        let mapper = SquareMapper::default();
        let run = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            mapper.map(&dets, &Homography::identity(), &mut rng)
        };
        assert_eq!(run(42), run(42));
        let mapped = run(42);
        assert_eq!(mapped.len(), 2);
        assert_eq!(mapped[1], (sq("b7"), Piece::new(Color::Black, PieceKind::Rook)));
    }

    #[test]
    fn half_turn_moves_piece_to_the_opposite_square() {
        let det = PieceDetection::resolved(BoundingBox::new(360.0, 600.0, 40.0, 40.0), WP);
        let mut rng = StdRng::seed_from_u64(9);
        let h = Homography::identity().then(&Homography::rotation_180(640));
        let mapped = SquareMapper::default().map(&[det], &h, &mut rng);
        assert_eq!(mapped, vec![(sq("d8"), WP)]);
    }

    #[test]
    fn mapped_pairs_fold_into_a_placement() {
        let dets = [
            PieceDetection::resolved(
                BoundingBox::new(360.0, 600.0, 40.0, 40.0),
                Piece::new(Color::White, PieceKind::King),
            ),
            PieceDetection::resolved(
                BoundingBox::new(360.0, 40.0, 40.0, 40.0),
                Piece::new(Color::Black, PieceKind::King),
            ),
        ];
        let mut rng = StdRng::seed_from_u64(5);
        let pairs = SquareMapper::default().map(&dets, &Homography::identity(), &mut rng);
        let placement = Placement::from_occupancy(&Occupancy::from_placements(&pairs));
        assert_eq!(placement.as_str(), "4k3/8/8/8/8/8/8/4K3");
    }
}
