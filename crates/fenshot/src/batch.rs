//! Rectify every photo in a directory onto the canonical 640x640 square.
//!
//! Each photo `name.jpg` is paired with recorded corner output in
//! `name.detections.json` next to it. Photos without usable corners are
//! skipped and reported, not treated as errors.

use std::fs;
use std::path::{Path, PathBuf};

use fenshot_board::{rectify_from_corners, CornerLocator};
use log::{info, warn};

use crate::{CornerDetector, ReaderConfig, RecordedDetections};

const PHOTO_EXTENSIONS: [&str; 3] = ["jpg", "jpeg", "png"];

#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error("cannot read {path:?}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
}

/// What one batch run did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BatchSummary {
    /// Rectified images, in input file-name order.
    pub written: Vec<PathBuf>,
    /// Photos left out, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}

/// Recorded detections paired with `photo`.
pub fn detections_path(photo: &Path) -> PathBuf {
    let stem = photo
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    photo.with_file_name(format!("{stem}.detections.json"))
}

fn is_photo(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| PHOTO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Rectify one photo. `Err` holds the reason it was skipped.
fn rectify_one(
    photo: &Path,
    out_dir: &Path,
    locator: &CornerLocator,
    config: &ReaderConfig,
) -> Result<Result<PathBuf, String>, BatchError> {
    let detections = match RecordedDetections::load_json(detections_path(photo)) {
        Ok(d) => d,
        Err(e) => return Ok(Err(format!("no usable detections: {e}"))),
    };
    let image = match crate::images::load_rgb(photo) {
        Ok(img) => img,
        Err(e) => return Ok(Err(format!("cannot decode: {e}"))),
    };
    let view = image.view();

    let boxes = match detections.detect_corners(&view, &config.corner_thresholds) {
        Ok(b) => b,
        Err(e) => return Ok(Err(e.to_string())),
    };
    info!("{}: {} corners found", photo.display(), boxes.len());
    let corners = match locator.locate(&boxes) {
        Ok(c) => c,
        Err(e) => return Ok(Err(e.to_string())),
    };
    let board = match rectify_from_corners(&view, &corners) {
        Ok(b) => b,
        Err(e) => return Ok(Err(e.to_string())),
    };

    let Some(name) = photo.file_name() else {
        return Ok(Err("no file name".to_string()));
    };
    let target = out_dir.join(name);
    crate::images::save_rgb(&board.image, &target)?;
    Ok(Ok(target))
}

/// Rectify every photo in `images_dir` into `out_dir`, keeping file names.
///
/// `out_dir` is created when missing. Failing to write an output image is
/// an error; a photo whose corners cannot be located is skipped.
pub fn rectify_directory(
    images_dir: &Path,
    out_dir: &Path,
    config: &ReaderConfig,
) -> Result<BatchSummary, BatchError> {
    let entries = fs::read_dir(images_dir).map_err(|source| BatchError::ReadDir {
        path: images_dir.to_path_buf(),
        source,
    })?;
    let mut photos: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_photo(p))
        .collect();
    photos.sort();

    fs::create_dir_all(out_dir)?;
    let locator = CornerLocator::new(config.corners.clone());

    let mut summary = BatchSummary::default();
    for photo in photos {
        match rectify_one(&photo, out_dir, &locator, config)? {
            Ok(target) => summary.written.push(target),
            Err(reason) => {
                warn!("skipping {}: {reason}", photo.display());
                summary.skipped.push((photo, reason));
            }
        }
    }
    info!(
        "rectified {} photos, skipped {}",
        summary.written.len(),
        summary.skipped.len()
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fenshot_core::{BoundingBox, RgbImage, CANONICAL_SIDE};

    fn corner_boxes(n: usize) -> Vec<BoundingBox> {
        [(20.0, 15.0), (300.0, 20.0), (310.0, 230.0), (15.0, 220.0)]
            .iter()
            .take(n)
            .map(|&(x, y)| BoundingBox::new(x, y, 10.0, 10.0))
            .collect()
    }

    fn write_photo(dir: &Path, name: &str, corners: Option<usize>) -> PathBuf {
        let path = dir.join(name);
        let photo = RgbImage::filled(320, 240, [140, 120, 90]);
        crate::images::save_rgb(&photo, &path).expect("save photo");
        if let Some(n) = corners {
            let detections = RecordedDetections {
                corners: corner_boxes(n),
                ..Default::default()
            };
            detections
                .write_json(detections_path(&path))
                .expect("write detections");
        }
        path
    }

    #[test]
    fn sidecar_sits_next_to_the_photo() {
        assert_eq!(
            detections_path(Path::new("shots/game 3.jpg")),
            PathBuf::from("shots/game 3.detections.json")
        );
    }

    #[test]
    fn rectifies_what_it_can_and_reports_the_rest() {
        let input = tempfile::tempdir().expect("tempdir");
        let output = tempfile::tempdir().expect("tempdir");
        let out_dir = output.path().join("projections");

        write_photo(input.path(), "a.png", Some(4));
        let three = write_photo(input.path(), "b.png", Some(3));
        let bare = write_photo(input.path(), "c.png", None);
        fs::write(input.path().join("notes.txt"), "not a photo").expect("write");

        let summary =
            rectify_directory(input.path(), &out_dir, &ReaderConfig::default()).expect("batch");

        assert_eq!(summary.written, vec![out_dir.join("a.png")]);
        let skipped: Vec<&PathBuf> = summary.skipped.iter().map(|(p, _)| p).collect();
        assert_eq!(skipped, vec![&three, &bare]);
        assert!(summary.skipped[0].1.contains('3'), "{:?}", summary.skipped[0]);

        let board = crate::images::load_rgb(out_dir.join("a.png")).expect("load");
        assert_eq!((board.width, board.height), (CANONICAL_SIDE, CANONICAL_SIDE));
        assert!(!out_dir.join("b.png").exists());
    }

    #[test]
    fn missing_input_directory_is_an_error() {
        let output = tempfile::tempdir().expect("tempdir");
        let err = rectify_directory(
            &output.path().join("nowhere"),
            output.path(),
            &ReaderConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BatchError::ReadDir { .. }));
    }
}
