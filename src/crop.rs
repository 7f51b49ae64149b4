/// Screenshot crop selection and cropping
use std::io::Cursor;

use image::{GenericImageView, ImageOutputFormat};
use serde::{Deserialize, Serialize};

use crate::content::DataUrl;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Point {
        Point { x, y }
    }
}

/// A rectangle in image pixels, as sent in `area`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropArea {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl CropArea {
    /// Both sides must be strictly larger than `min`
    pub fn is_accepted(&self, min: u32) -> bool {
        self.width > f64::from(min) && self.height > f64::from(min)
    }
}

/// A mouse drag from `start` to `end`, in any direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection {
    pub start: Point,
    pub end: Point,
}

impl Selection {
    pub fn new(start: Point, end: Point) -> Selection {
        Selection { start, end }
    }

    pub fn area(&self) -> CropArea {
        CropArea {
            left: self.start.x.min(self.end.x),
            top: self.start.y.min(self.end.y),
            width: (self.end.x - self.start.x).abs(),
            height: (self.end.y - self.start.y).abs(),
        }
    }

    pub fn is_accepted(&self, min: u32) -> bool {
        self.area().is_accepted(min)
    }
}

/// Pixel bounds of `area` clipped to a `width` x `height` image
fn clamp(area: &CropArea, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
    let left = area.left.max(0.0).round() as u32;
    let top = area.top.max(0.0).round() as u32;
    let right = ((area.left + area.width).round().max(0.0) as u32).min(width);
    let bottom = ((area.top + area.height).round().max(0.0) as u32).min(height);
    if left >= right || top >= bottom {
        return None;
    }
    Some((left, top, right - left, bottom - top))
}

/// Reject selections that are not strictly larger than `min` on both sides
pub fn check_selection(area: &CropArea, min: u32) -> Result<()> {
    if area.is_accepted(min) {
        return Ok(());
    }
    Err(Error::SelectionTooSmall {
        width: area.width.max(0.0) as u32,
        height: area.height.max(0.0) as u32,
        min,
    })
}

/// Crop a screenshot and re-encode the region as PNG
pub fn crop_screenshot(screenshot: &DataUrl, area: &CropArea, min: u32) -> Result<DataUrl> {
    check_selection(area, min)?;

    let image = image::load_from_memory(&screenshot.bytes)?;
    let (img_width, img_height) = image.dimensions();
    let (x, y, width, height) = clamp(area, img_width, img_height)
        .ok_or_else(|| Error::invalid_image("selection lies outside the screenshot"))?;

    log::debug!(
        "Cropping {}x{} screenshot to {}x{} at ({}, {})",
        img_width, img_height, width, height, x, y
    );

    let cropped = image.crop_imm(x, y, width, height);
    let mut buf = Cursor::new(Vec::new());
    cropped.write_to(&mut buf, ImageOutputFormat::Png)?;
    Ok(DataUrl::png(buf.into_inner()))
}
