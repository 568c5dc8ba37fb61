//! Image ↔ tensor codec.
//!
//! Encoding scales a photo to fit the model's fixed input canvas while
//! preserving aspect ratio, centers it with zero-filled padding, and lays
//! the normalized values out in the model's tensor layout. Decoding reverses
//! every step: denormalize with clamping, strip the padding, resize back to
//! the source dimensions, and JPEG-encode the result.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba, RgbaImage};
use ndarray::{ArrayD, IxDyn};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use crate::catalog::{StyleModel, TensorLayout};
use crate::error::{Error, Result};

/// Resampling filter for both the downscale into the model canvas and the
/// final upscale. Quality is a tunable, not a contract.
const RESIZE_FILTER: FilterType = FilterType::Triangle;

/// Fixed JPEG quality for styled output.
pub const JPEG_QUALITY: u8 = 90;

/// A decoded source photo, row-major RGBA. Zero-sized images are rejected
/// at construction so the codec never sees them.
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn open(path: &std::path::Path) -> Result<Self> {
        let img = image::open(path).map_err(|source| Error::ImageLoad {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_dynamic(img)
    }

    pub fn from_dynamic(img: DynamicImage) -> Result<Self> {
        let (width, height) = (img.width(), img.height());
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                width,
                height,
                reason: "source image must have a nonzero area".into(),
            });
        }
        Ok(Self {
            pixels: img.to_rgba8(),
        })
    }

    /// Wrap raw RGBA bytes; `data.len()` must equal `width * height * 4`.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions {
                width,
                height,
                reason: "source image must have a nonzero area".into(),
            });
        }
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(Error::InvalidDimensions {
                width,
                height,
                reason: format!("expected {expected} RGBA bytes, got {}", data.len()),
            });
        }
        let pixels = RgbaImage::from_raw(width, height, data).ok_or(Error::InvalidDimensions {
            width,
            height,
            reason: "RGBA buffer does not match dimensions".into(),
        })?;
        Ok(Self { pixels })
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    fn rgba(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Aspect-preserving placement of a source image inside the model's input
/// canvas: the fitted size plus the centering offset. The remaining border
/// is zero-filled at encode time and stripped again at decode time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FitGeometry {
    pub fit_width: u32,
    pub fit_height: u32,
    pub padding_x: u32,
    pub padding_y: u32,
}

pub fn fit_geometry(src_width: u32, src_height: u32, model: &StyleModel) -> FitGeometry {
    let aspect = src_width as f64 / src_height as f64;

    let (fit_width, fit_height) = if aspect > 1.0 {
        let fit_width = model.input_width;
        let fit_height = (fit_width as f64 / aspect).round() as u32;
        (fit_width, fit_height.clamp(1, model.input_height))
    } else {
        let fit_height = model.input_height;
        let fit_width = (fit_height as f64 * aspect).round() as u32;
        (fit_width.clamp(1, model.input_width), fit_height)
    };

    FitGeometry {
        fit_width,
        fit_height,
        padding_x: (model.input_width - fit_width) / 2,
        padding_y: (model.input_height - fit_height) / 2,
    }
}

/// A fully materialized styled result at the caller's original resolution.
#[derive(Debug, Clone)]
pub struct StyledImage {
    pub width: u32,
    pub height: u32,
    /// JPEG-encoded bytes.
    pub bytes: Vec<u8>,
}

impl StyledImage {
    /// Embeddable `data:image/jpeg;base64,...` form of [`Self::bytes`].
    pub fn data_uri(&self) -> String {
        format!("data:image/jpeg;base64,{}", BASE64.encode(&self.bytes))
    }
}

/// Convert a source image into a model input tensor.
///
/// The source is resized to fit the model canvas, centered, and normalized
/// per the model's byte↔float mapping. Returns the flat tensor (shape
/// `[1, H, W, 3]` or `[1, 3, H, W]` depending on layout) plus the geometry
/// needed to undo the placement after inference.
pub fn encode(source: &SourceImage, model: &StyleModel) -> Result<(ArrayD<f32>, FitGeometry)> {
    let geom = fit_geometry(source.width(), source.height(), model);
    let resized = imageops::resize(source.rgba(), geom.fit_width, geom.fit_height, RESIZE_FILTER);

    let input_w = model.input_width as usize;
    let input_h = model.input_height as usize;
    let mut tensor = match model.layout {
        TensorLayout::ChannelsLast => ArrayD::<f32>::zeros(IxDyn(&[1, input_h, input_w, 3])),
        TensorLayout::ChannelsFirst => ArrayD::<f32>::zeros(IxDyn(&[1, 3, input_h, input_w])),
    };

    let pad_x = geom.padding_x as usize;
    let pad_y = geom.padding_y as usize;

    for y in 0..geom.fit_height {
        for x in 0..geom.fit_width {
            let pixel = resized.get_pixel(x, y);
            let tx = x as usize + pad_x;
            let ty = y as usize + pad_y;
            for c in 0..3 {
                let value = model.normalization.to_float(pixel[c]);
                match model.layout {
                    TensorLayout::ChannelsLast => tensor[[0, ty, tx, c]] = value,
                    TensorLayout::ChannelsFirst => tensor[[0, c, ty, tx]] = value,
                }
            }
        }
    }

    Ok((tensor, geom))
}

fn expected_shape(model: &StyleModel) -> [usize; 4] {
    let h = model.input_height as usize;
    let w = model.input_width as usize;
    match model.layout {
        TensorLayout::ChannelsLast => [1, h, w, 3],
        TensorLayout::ChannelsFirst => [1, 3, h, w],
    }
}

/// Denormalize a full output tensor into an opaque RGBA canvas covering the
/// whole model input area, padding included. Every channel is clamped into
/// `[0, 255]`; `ZeroTo255` model outputs in particular are not guaranteed in
/// range.
fn tensor_to_canvas(tensor: &ArrayD<f32>, model: &StyleModel) -> Result<RgbaImage> {
    let expected = expected_shape(model);
    if tensor.shape() != &expected[..] {
        return Err(Error::TensorShape {
            expected: format!("{expected:?}"),
            actual: format!("{:?}", tensor.shape()),
        });
    }

    let mut canvas = RgbaImage::new(model.input_width, model.input_height);
    for y in 0..model.input_height as usize {
        for x in 0..model.input_width as usize {
            let (r, g, b) = match model.layout {
                TensorLayout::ChannelsLast => (
                    tensor[[0, y, x, 0]],
                    tensor[[0, y, x, 1]],
                    tensor[[0, y, x, 2]],
                ),
                TensorLayout::ChannelsFirst => (
                    tensor[[0, 0, y, x]],
                    tensor[[0, 1, y, x]],
                    tensor[[0, 2, y, x]],
                ),
            };
            canvas.put_pixel(
                x as u32,
                y as u32,
                Rgba([
                    model.normalization.to_byte(r),
                    model.normalization.to_byte(g),
                    model.normalization.to_byte(b),
                    255,
                ]),
            );
        }
    }
    Ok(canvas)
}

/// Convert a model output tensor back into a final styled image.
///
/// Fails with [`Error::TensorShape`] when the tensor does not match the
/// model's declared input size. The padding introduced by [`encode`] is
/// cropped away and the remainder resized to `(target_width, target_height)`
/// — the source image's original dimensions.
pub fn decode(
    tensor: &ArrayD<f32>,
    model: &StyleModel,
    geom: &FitGeometry,
    target_width: u32,
    target_height: u32,
    jpeg_quality: u8,
) -> Result<StyledImage> {
    let canvas = tensor_to_canvas(tensor, model)?;

    let cropped = imageops::crop_imm(
        &canvas,
        geom.padding_x,
        geom.padding_y,
        geom.fit_width,
        geom.fit_height,
    )
    .to_image();
    let restored = imageops::resize(&cropped, target_width, target_height, RESIZE_FILTER);

    let rgb = DynamicImage::ImageRgba8(restored).to_rgb8();
    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, jpeg_quality);
    DynamicImage::ImageRgb8(rgb)
        .write_with_encoder(encoder)
        .map_err(|source| Error::ImageEncode { source })?;

    Ok(StyledImage {
        width: target_width,
        height: target_height,
        bytes,
    })
}
