//! Skin-tone mask visualization.
//!
//! The pipeline is fixed: resize to 640x480 with bilinear interpolation,
//! convert to 8-bit HSV, threshold the skin range, clean the mask with a 5x5
//! elliptical opening and keep only the masked pixels over black. Everything
//! after decoding runs on OpenCV `Mat`s in BGR order.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use image::RgbImage;
use opencv::core::{self, CV_8UC3, Mat, Point, Scalar, Size, Vec3b, Vector, BORDER_CONSTANT};
use opencv::imgcodecs::{self, IMWRITE_JPEG_QUALITY};
use opencv::imgproc::{self, COLOR_BGR2HSV, INTER_LINEAR, MORPH_ELLIPSE, MORPH_OPEN};
use opencv::prelude::*;

pub const MASK_WIDTH: u32 = 640;
pub const MASK_HEIGHT: u32 = 480;
const JPEG_QUALITY: i32 = 95;
const KERNEL_SIZE: i32 = 5;

const LOWER_SKIN: [f64; 3] = [0.0, 20.0, 70.0];
const UPPER_SKIN: [f64; 3] = [20.0, 255.0, 255.0];

#[derive(Debug, Clone, PartialEq)]
pub struct SkinMask {
    /// Base64 (standard alphabet) JPEG of the skin pixels over black.
    pub masked_image: String,
    /// Mean color of the pixels kept by the mask, black when none survive.
    pub mean_rgb: [u8; 3],
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum MaskError {
    #[error("Failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("OpenCV {operation} failed: {source}")]
    OpenCv {
        operation: &'static str,
        #[source]
        source: opencv::Error,
    },
    #[error("JPEG encoder rejected the masked image")]
    Encode,
}

impl MaskError {
    fn opencv(operation: &'static str) -> impl FnOnce(opencv::Error) -> Self {
        move |source| Self::OpenCv { operation, source }
    }
}

/// Runs the skin mask pipeline. Any failure yields `None`.
pub fn generate_skin_mask(image_bytes: &[u8]) -> Option<SkinMask> {
    match build_skin_mask(image_bytes) {
        Ok(mask) => Some(mask),
        Err(e) => {
            log::warn!("Skin mask generation failed: {}", e);
            None
        }
    }
}

fn build_skin_mask(image_bytes: &[u8]) -> Result<SkinMask, MaskError> {
    let decoded = image::load_from_memory(image_bytes).map_err(MaskError::Decode)?;
    let source = bgr_mat(&decoded.to_rgb8())?;

    let mut resized = Mat::default();
    imgproc::resize(
        &source,
        &mut resized,
        Size::new(MASK_WIDTH as i32, MASK_HEIGHT as i32),
        0.0,
        0.0,
        INTER_LINEAR,
    )
    .map_err(MaskError::opencv("resize"))?;

    let mask = open_mask(&threshold_skin(&to_hsv(&resized)?)?)?;

    let mut skin = Mat::default();
    core::bitwise_and(&resized, &resized, &mut skin, &mask)
        .map_err(MaskError::opencv("mask application"))?;

    Ok(SkinMask {
        masked_image: STANDARD.encode(encode_jpeg(&skin)?),
        mean_rgb: mean_rgb(&resized, &mask)?,
    })
}

/// Copies an RGB buffer into a BGR `Mat`.
pub(crate) fn bgr_mat(image: &RgbImage) -> Result<Mat, MaskError> {
    let mut mat = Mat::zeros(image.height() as i32, image.width() as i32, CV_8UC3)
        .and_then(|zeros| zeros.to_mat())
        .map_err(MaskError::opencv("allocation"))?;

    let pixels = mat
        .data_typed_mut::<Vec3b>()
        .map_err(MaskError::opencv("pixel access"))?;
    for (dst, src) in pixels.iter_mut().zip(image.pixels()) {
        let [r, g, b] = src.0;
        dst[0] = b;
        dst[1] = g;
        dst[2] = r;
    }
    Ok(mat)
}

/// 8-bit HSV with H in 0..180.
pub(crate) fn to_hsv(bgr: &Mat) -> Result<Mat, MaskError> {
    let mut hsv = Mat::default();
    imgproc::cvt_color_def(bgr, &mut hsv, COLOR_BGR2HSV)
        .map_err(MaskError::opencv("HSV conversion"))?;
    Ok(hsv)
}

/// 255 where every HSV channel lies inside the skin range (inclusive).
pub(crate) fn threshold_skin(hsv: &Mat) -> Result<Mat, MaskError> {
    let [h_low, s_low, v_low] = LOWER_SKIN;
    let [h_high, s_high, v_high] = UPPER_SKIN;
    let mut mask = Mat::default();
    core::in_range(
        hsv,
        &Scalar::new(h_low, s_low, v_low, 0.0),
        &Scalar::new(h_high, s_high, v_high, 0.0),
        &mut mask,
    )
    .map_err(MaskError::opencv("skin threshold"))?;
    Ok(mask)
}

pub(crate) fn ellipse_kernel() -> Result<Mat, MaskError> {
    imgproc::get_structuring_element(
        MORPH_ELLIPSE,
        Size::new(KERNEL_SIZE, KERNEL_SIZE),
        Point::new(-1, -1),
    )
    .map_err(MaskError::opencv("kernel creation"))
}

pub(crate) fn open_mask(mask: &Mat) -> Result<Mat, MaskError> {
    open_with(mask, &ellipse_kernel()?)
}

/// Erosion followed by dilation. Pixels outside the image never influence
/// the result.
pub(crate) fn open_with(mask: &Mat, kernel: &Mat) -> Result<Mat, MaskError> {
    let border_value =
        imgproc::morphology_default_border_value().map_err(MaskError::opencv("border value"))?;
    let mut opened = Mat::default();
    imgproc::morphology_ex(
        mask,
        &mut opened,
        MORPH_OPEN,
        kernel,
        Point::new(-1, -1),
        1,
        BORDER_CONSTANT,
        border_value,
    )
    .map_err(MaskError::opencv("opening"))?;
    Ok(opened)
}

fn mean_rgb(bgr: &Mat, mask: &Mat) -> Result<[u8; 3], MaskError> {
    let mean = core::mean(bgr, mask).map_err(MaskError::opencv("mean"))?;
    let channel = |i: usize| mean[i].round().clamp(0.0, 255.0) as u8;
    Ok([channel(2), channel(1), channel(0)])
}

fn encode_jpeg(bgr: &Mat) -> Result<Vec<u8>, MaskError> {
    let mut buffer = Vector::<u8>::new();
    let params = Vector::<i32>::from_slice(&[IMWRITE_JPEG_QUALITY, JPEG_QUALITY]);
    let written = imgcodecs::imencode(".jpg", bgr, &mut buffer, &params)
        .map_err(MaskError::opencv("JPEG encoding"))?;
    if !written {
        return Err(MaskError::Encode);
    }
    Ok(buffer.to_vec())
}
