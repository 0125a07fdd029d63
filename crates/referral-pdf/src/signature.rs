//! Drawing signature images into signature field rectangles

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Object, ObjectId, Stream};
use referral_core::SignatureImage;
use tracing::{debug, warn};

use crate::error::PdfError;
use crate::form::FormDocument;
use crate::objects::{add_xobject_resource, append_page_content, draw_xobject_ops, get_rect, page_for_widget};

/// Inset between the field border and the image
pub const SIGNATURE_PADDING: f32 = 2.0;

/// Decoded PNG ready to embed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    /// `DeviceGray` or `DeviceRGB`
    pub color_space: &'static str,
    pub pixels: Vec<u8>,
    pub alpha: Option<Vec<u8>>,
}

/// Decode a PNG into 8-bit gray or RGB samples plus an optional alpha plane
pub fn decode_png(bytes: &[u8]) -> Result<RasterImage, PdfError> {
    let mut decoder = png::Decoder::new(bytes);
    decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| PdfError::Image(e.to_string()))?;
    let mut buf = vec![0; reader.output_buffer_size()];
    let frame = reader
        .next_frame(&mut buf)
        .map_err(|e| PdfError::Image(e.to_string()))?;
    let data = &buf[..frame.buffer_size()];

    let (color_space, channels, has_alpha) = match frame.color_type {
        png::ColorType::Grayscale => ("DeviceGray", 1, false),
        png::ColorType::GrayscaleAlpha => ("DeviceGray", 2, true),
        png::ColorType::Rgb => ("DeviceRGB", 3, false),
        png::ColorType::Rgba => ("DeviceRGB", 4, true),
        png::ColorType::Indexed => {
            return Err(PdfError::Image("palette was not expanded".into()));
        }
    };
    let color_channels = if has_alpha { channels - 1 } else { channels };

    let mut pixels = Vec::with_capacity(data.len());
    let mut alpha = has_alpha.then(Vec::new);
    for px in data.chunks_exact(channels) {
        pixels.extend_from_slice(&px[..color_channels]);
        if let Some(alpha) = alpha.as_mut() {
            alpha.push(px[channels - 1]);
        }
    }

    Ok(RasterImage {
        width: frame.width,
        height: frame.height,
        color_space,
        pixels,
        alpha,
    })
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, PdfError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| PdfError::Serialization(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| PdfError::Serialization(e.to_string()))
}

fn image_stream(width: u32, height: u32, color_space: &str, samples: &[u8]) -> Result<Stream, PdfError> {
    let mut stream = Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
            "Filter" => "FlateDecode",
        },
        deflate(samples)?,
    );
    stream.allows_compression = false;
    Ok(stream)
}

/// Largest rectangle with the image's aspect ratio that fits inside `rect`
/// minus `padding`, centered. Returns `[x, y, width, height]`.
pub fn fit_centered(rect: [f32; 4], image_w: u32, image_h: u32, padding: f32) -> Option<[f32; 4]> {
    let box_w = rect[2] - rect[0] - 2.0 * padding;
    let box_h = rect[3] - rect[1] - 2.0 * padding;
    if box_w <= 0.0 || box_h <= 0.0 || image_w == 0 || image_h == 0 {
        return None;
    }
    let scale = (box_w / image_w as f32).min(box_h / image_h as f32);
    let w = image_w as f32 * scale;
    let h = image_h as f32 * scale;
    Some([
        rect[0] + padding + (box_w - w) / 2.0,
        rect[1] + padding + (box_h - h) / 2.0,
        w,
        h,
    ])
}

impl FormDocument {
    /// Embed the image once and draw it on every widget of the first
    /// candidate field present. Returns the number of widgets drawn.
    /// An image that fails to decode draws nothing.
    pub fn draw_signature(&mut self, signature: &SignatureImage) -> Result<usize, PdfError> {
        let Some(field) = signature
            .field_names
            .iter()
            .find_map(|name| self.field(name))
        else {
            debug!(candidates = ?signature.field_names, "No signature field in template");
            return Ok(0);
        };
        let field_name = field.name.clone();
        let widgets = field.widgets.clone();

        let image = match decode_png(&signature.png) {
            Ok(image) => image,
            Err(e) => {
                warn!(field = %field_name, error = %e, "Signature image not drawn");
                return Ok(0);
            }
        };

        let image_id = self.embed_image(&image)?;
        let pages = self.doc.get_pages();
        let mut drawn = 0;
        for widget in widgets {
            let Some(rect) = self
                .doc
                .get_dictionary(widget)
                .ok()
                .and_then(|w| get_rect(&self.doc, w, b"Rect"))
            else {
                continue;
            };
            let Some([x, y, w, h]) = fit_centered(rect, image.width, image.height, SIGNATURE_PADDING) else {
                continue;
            };
            let Some(page_id) = page_for_widget(&self.doc, &pages, widget) else {
                continue;
            };
            let name = format!("Sig{}", image_id.0);
            add_xobject_resource(&mut self.doc, page_id, &name, image_id)?;
            append_page_content(
                &mut self.doc,
                page_id,
                draw_xobject_ops(&name, [w, 0.0, 0.0, h, x, y]),
            )?;
            drawn += 1;
        }
        debug!(field = %field_name, widgets = drawn, "Drew signature");
        Ok(drawn)
    }

    fn embed_image(&mut self, image: &RasterImage) -> Result<ObjectId, PdfError> {
        let mut stream = image_stream(image.width, image.height, image.color_space, &image.pixels)?;
        if let Some(alpha) = &image.alpha {
            let mask = image_stream(image.width, image.height, "DeviceGray", alpha)?;
            let mask_id = self.doc.add_object(mask);
            stream.dict.set("SMask", Object::Reference(mask_id));
        }
        Ok(self.doc.add_object(stream))
    }
}
