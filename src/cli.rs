// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands
//!
//! This module provides command-line functionality for:
//! - Printing the region of interest and OCR band for a frame size
//! - Scanning image files through a live worker

use cardscan_worker::constants::frame::MIN_IMAGE_EDGE;
use cardscan_worker::constants::ocr::{CARD_ASPECT_HEIGHT, CARD_ASPECT_WIDTH};
use cardscan_worker::media::transform::scaled_dimensions;
use cardscan_worker::{
    CallbackThread, ExecutionContext, MlWorker, NoObjectModel, QrTextPredictor, ScanListener,
    ScanResult, SensorRotation, WorkerComponents, WorkerConfig, compute_ocr_crop, compute_roi,
};
use image::{Rgb, RgbImage, imageops};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Sender};
use std::time::Duration;

/// Print the crop boxes for a frame of the given size
pub fn print_roi(
    width: u32,
    height: u32,
    orientation: i32,
    ratio: f32,
) -> Result<(), Box<dyn std::error::Error>> {
    if !(0.0..=1.0).contains(&ratio) {
        return Err(format!("ratio must be within 0.0..=1.0, got {}", ratio).into());
    }

    let rotation = SensorRotation::from_degrees_int(orientation);
    let (scaled_w, scaled_h) = scaled_dimensions(width, height, MIN_IMAGE_EDGE);
    let roi = compute_roi(scaled_w, scaled_h, orientation, ratio);
    let band = compute_ocr_crop(roi.side, roi.side);

    println!("Frame:     {}x{} (rotation {})", width, height, rotation);
    println!("Scaled:    {}x{}", scaled_w, scaled_h);
    println!(
        "ROI:       {}x{} square at ({}, {})",
        roi.side, roi.side, roi.x, roi.y
    );
    println!(
        "OCR band:  {}x{} at ({}, {}) in the upright square",
        band.width, band.height, band.x, band.y
    );

    Ok(())
}

/// Listener for one scanned file
struct FileListener {
    path: PathBuf,
    results: Sender<(PathBuf, Option<String>)>,
}

impl ScanListener for FileListener {
    fn on_prediction(&self, result: &ScanResult) {
        let _ = self.results.send((self.path.clone(), result.number.clone()));
    }

    fn on_fatal_error(&self) {
        let _ = self.results.send((self.path.clone(), None));
    }
}

/// Run image files through a worker with the QR text predictor
pub fn scan_images(
    input: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    timing: bool,
    timeout_secs: u64,
) -> Result<(), Box<dyn std::error::Error>> {
    let image_paths = collect_image_paths(&input)?;
    if image_paths.is_empty() {
        return Err("No PNG or JPEG images found in input".into());
    }

    let mut config = match config_path {
        Some(path) => WorkerConfig::load(&path)?,
        None => WorkerConfig::load_or_default()?,
    };
    config.print_timing |= timing;

    let executor = Arc::new(CallbackThread::spawn(&config.callback_thread_name)?);
    let worker = MlWorker::spawn(
        config,
        WorkerComponents::new(Box::new(QrTextPredictor::new()), Box::new(NoObjectModel)),
        executor,
    )?;
    worker.warm_up(ExecutionContext::empty());

    println!("Scanning {} images", image_paths.len());
    println!();

    let (tx, rx) = mpsc::channel();
    let mut posted = 0usize;
    for path in &image_paths {
        let image = match image::open(path) {
            Ok(image) => image.to_rgb8(),
            Err(e) => {
                eprintln!("  {}: failed to load ({})", path.display(), e);
                continue;
            }
        };
        let listener = Arc::new(FileListener {
            path: path.clone(),
            results: tx.clone(),
        });
        match worker.post_ocr_image(fit_to_card_band(image), listener, ExecutionContext::empty()) {
            Ok(true) => posted += 1,
            Ok(false) => break,
            Err(e) => eprintln!("  {}: not queued ({})", path.display(), e),
        }
    }
    drop(tx);

    let mut read = 0usize;
    for _ in 0..posted {
        match rx.recv_timeout(Duration::from_secs(timeout_secs)) {
            Ok((path, Some(text))) => {
                read += 1;
                println!("  {}: {}", path.display(), text);
            }
            Ok((path, None)) => println!("  {}: no code found", path.display()),
            Err(_) => break,
        }
    }

    let failed = worker.stats().failed();
    worker.shutdown();

    println!();
    println!("Read {} of {} images ({} failed)", read, posted, failed);

    Ok(())
}

/// Pad an image onto a white square so the OCR band covers all of it
fn fit_to_card_band(image: RgbImage) -> RgbImage {
    let (width, height) = image.dimensions();
    // one spare pixel absorbs the float rounding in the band height
    let side = width.max((height * CARD_ASPECT_WIDTH).div_ceil(CARD_ASPECT_HEIGHT) + 1);

    let mut canvas = RgbImage::from_pixel(side, side, Rgb([255, 255, 255]));
    let x = i64::from((side - width) / 2);
    let y = i64::from((side - height) / 2);
    imageops::overlay(&mut canvas, &image, x, y);
    canvas
}

/// Collect all image paths from input (files or directories)
fn collect_image_paths(input: &[PathBuf]) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let mut paths = Vec::new();

    for path in input {
        if path.is_dir() {
            for entry in std::fs::read_dir(path)? {
                let entry = entry?;
                let file_path = entry.path();
                if is_supported_image(&file_path) {
                    paths.push(file_path);
                }
            }
        } else if is_supported_image(path) {
            paths.push(path.clone());
        }
    }

    // Sort by filename for consistent ordering
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    Ok(paths)
}

/// Check if a path is a supported image file
fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            ext_lower == "png" || ext_lower == "jpg" || ext_lower == "jpeg"
        })
        .unwrap_or(false)
}
