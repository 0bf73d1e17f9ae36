//! End-to-end board reading: photo -> placement.

use std::sync::Arc;

use fenshot_board::{
    rectify_from_corners, CornerError, CornerLocator, CornerSet, GridError, GridQuad,
    GridResolver, OrientationCorrector, OrientationReport, RectifyError, TopSide,
};
use fenshot_core::{Homography, RgbImage, RgbImageView};
use fenshot_position::{
    is_valid_fen, BoardGrid, Color, Fen, FenError, Occupancy, Piece, Placement, Square,
    SquareMapper,
};
use log::{debug, info};
use rand::Rng;

use crate::engine::playable_position;
use crate::{
    CornerDetector, DetectionThresholds, DetectorError, GridSegmenter, PieceDetector, ReaderConfig,
};

#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error(transparent)]
    Detector(#[from] DetectorError),
    #[error(transparent)]
    Corners(#[from] CornerError),
    #[error(transparent)]
    Rectify(#[from] RectifyError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Fen(#[from] FenError),
}

/// Everything one read produced.
#[derive(Clone, Debug)]
pub struct BoardReading {
    pub placement: Placement,
    pub occupancy: Occupancy,
    /// Mapped pieces in detection order, before collisions were folded.
    pub pieces: Vec<(Square, Piece)>,
    pub corners: CornerSet,
    pub grid_quad: GridQuad,
    /// Source image -> first rectified frame.
    pub h_rect_from_src: Homography,
    /// First rectified frame -> final board frame (grid warp plus orientation).
    pub h_board_from_rect: Homography,
    /// Source image -> final board frame.
    pub h_board_from_src: Homography,
    pub orientation: OrientationReport,
    /// Grid-rectified, oriented board image.
    pub board_image: RgbImage,
}

impl BoardReading {
    /// Full FEN for this placement with `side_to_move` to play.
    pub fn fen(&self, side_to_move: Color) -> Fen {
        Fen::new(self.placement.clone(), side_to_move)
    }
}

/// Runs the detectors and the geometric stages on one photograph.
pub struct BoardReader<'d> {
    corner_detector: &'d dyn CornerDetector,
    grid_segmenter: &'d dyn GridSegmenter,
    piece_detector: &'d dyn PieceDetector,
    corner_thresholds: DetectionThresholds,
    grid_thresholds: DetectionThresholds,
    piece_thresholds: DetectionThresholds,
    locator: CornerLocator,
    resolver: GridResolver,
    corrector: OrientationCorrector,
    mapper: SquareMapper,
    strict_position: bool,
}

impl<'d> BoardReader<'d> {
    pub fn new(
        corner_detector: &'d dyn CornerDetector,
        grid_segmenter: &'d dyn GridSegmenter,
        piece_detector: &'d dyn PieceDetector,
        config: &ReaderConfig,
    ) -> Self {
        Self::with_grid(
            corner_detector,
            grid_segmenter,
            piece_detector,
            config,
            Arc::new(BoardGrid::canonical()),
        )
    }

    /// Same as [`BoardReader::new`] with a caller-owned board grid.
    pub fn with_grid(
        corner_detector: &'d dyn CornerDetector,
        grid_segmenter: &'d dyn GridSegmenter,
        piece_detector: &'d dyn PieceDetector,
        config: &ReaderConfig,
        grid: Arc<BoardGrid>,
    ) -> Self {
        Self {
            corner_detector,
            grid_segmenter,
            piece_detector,
            corner_thresholds: config.corner_thresholds,
            grid_thresholds: config.grid_thresholds,
            piece_thresholds: config.piece_thresholds,
            locator: CornerLocator::new(config.corners.clone()),
            resolver: GridResolver::new(config.grid.clone()),
            corrector: OrientationCorrector::new(config.orientation.clone()),
            mapper: SquareMapper::new(config.mapper.clone(), grid),
            strict_position: config.strict_position,
        }
    }

    /// One backend serving all three detector roles.
    pub fn from_detector<D>(detector: &'d D, config: &ReaderConfig) -> Self
    where
        D: CornerDetector + GridSegmenter + PieceDetector,
    {
        Self::new(detector, detector, detector, config)
    }

    /// Read the piece placement from `image`.
    ///
    /// `top` names the side whose pieces are at the top of the photo.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(level = "info", skip(self, image, rng), fields(width = image.width, height = image.height, top = %top))
    )]
    pub fn read<R: Rng + ?Sized>(
        &self,
        image: &RgbImageView<'_>,
        top: TopSide,
        rng: &mut R,
    ) -> Result<BoardReading, ReadError> {
        let boxes = self
            .corner_detector
            .detect_corners(image, &self.corner_thresholds)?;
        debug!("{} corner boxes", boxes.len());
        let corners = self.locator.locate(&boxes)?;

        let rectified = rectify_from_corners(image, &corners)?;
        let rect_view = rectified.image.view();

        let contours = self
            .grid_segmenter
            .segment_grid(&rect_view, &self.grid_thresholds)?;
        let resolved = self.resolver.resolve(&rect_view, &contours)?;

        // pieces are detected on the first rectified image
        let detections = self
            .piece_detector
            .detect_pieces(&rect_view, &self.piece_thresholds)?;
        debug!("{} piece boxes", detections.len());

        let h_grid_from_rect = *resolved.homography();
        let grid_quad = resolved.quad;
        let oriented = self
            .corrector
            .correct(resolved.board.image, top, &mut *rng);

        let h_board_from_rect = h_grid_from_rect.then(&oriented.h_oriented_from_grid);
        let h_board_from_src = rectified.h_rect_from_src.then(&h_board_from_rect);

        let pieces = self.mapper.map(&detections, &h_board_from_rect, &mut *rng);
        let occupancy = Occupancy::from_placements(&pieces);
        let placement = Placement::from_occupancy(&occupancy);
        Placement::validate(placement.as_str())?;
        info!(
            "read {} of {} pieces: {}",
            occupancy.piece_count(),
            detections.len(),
            placement
        );

        Ok(BoardReading {
            placement,
            occupancy,
            pieces,
            corners,
            grid_quad,
            h_rect_from_src: rectified.h_rect_from_src,
            h_board_from_rect,
            h_board_from_src,
            orientation: oriented.report,
            board_image: oriented.image,
        })
    }

    /// Full FEN for `reading` with `side_to_move` to play.
    ///
    /// The record must pass [`is_valid_fen`]. With `strict_position` set in
    /// the config it must also be a playable position.
    pub fn checked_fen(
        &self,
        reading: &BoardReading,
        side_to_move: Color,
    ) -> Result<Fen, ReadError> {
        let fen = reading.fen(side_to_move);
        let text = fen.to_string();
        if !is_valid_fen(&text) {
            return Err(FenError::InvalidFen {
                fen: text,
                reason: "synthesized record is malformed",
            }
            .into());
        }
        if self.strict_position {
            if let Err(reason) = playable_position(&fen) {
                return Err(FenError::IllegalPosition { fen: text, reason }.into());
            }
        }
        Ok(fen)
    }

    /// [`BoardReader::read`] followed by [`BoardReader::checked_fen`].
    pub fn read_fen<R: Rng + ?Sized>(
        &self,
        image: &RgbImageView<'_>,
        top: TopSide,
        side_to_move: Color,
        rng: &mut R,
    ) -> Result<Fen, ReadError> {
        let reading = self.read(image, top, rng)?;
        self.checked_fen(&reading, side_to_move)
    }
}
