//! Tiling a tall raster over A4 pages.

use std::io::Write;

use flate2::Compression;
use flate2::write::ZlibEncoder;
use image::RgbImage;
use pdf_writer::{Content, Filter, Finish, Name, Pdf, Rect, Ref};

/// Width the image is stretched to, in millimetres.
pub const IMAGE_WIDTH_MM: f32 = 210.0;
/// Height of one tile when splitting the image across pages.
pub const TILE_HEIGHT_MM: f32 = 295.0;
/// A4 media box.
pub const PAGE_WIDTH_MM: f32 = 210.0;
pub const PAGE_HEIGHT_MM: f32 = 297.0;

const PT_PER_MM: f32 = 72.0 / 25.4;
const IMAGE_NAME: Name<'static> = Name(b"Im1");

/// Vertical offset of the image's top edge on each page, in the same unit as
/// the inputs (0 on the first page, negative afterwards).
///
/// A page is added for every tile that still has image left below it, so an
/// image exactly one tile tall yields one page.
pub fn page_offsets(image_height: f32, page_height: f32) -> Vec<f32> {
    let mut offsets = vec![0.0];
    if page_height <= 0.0 {
        return offsets;
    }
    let mut height_left = image_height - page_height;
    while height_left > 0.0 {
        offsets.push(height_left - image_height);
        height_left -= page_height;
    }
    offsets
}

/// Height in millimetres the image occupies when stretched to page width.
#[allow(clippy::cast_precision_loss)]
pub fn scaled_height_mm(width_px: u32, height_px: u32) -> f32 {
    if width_px == 0 {
        return 0.0;
    }
    height_px as f32 * IMAGE_WIDTH_MM / width_px as f32
}

/// Build a PDF showing `image` across as many A4 pages as it needs.
///
/// Every page references the same Flate-compressed image object.
///
/// # Errors
///
/// Returns an error if compressing the pixel data fails.
pub fn build_document(image: &RgbImage) -> std::io::Result<Vec<u8>> {
    let (width_px, height_px) = image.dimensions();
    let image_height = scaled_height_mm(width_px, height_px);
    let offsets = page_offsets(image_height, TILE_HEIGHT_MM);

    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(image.as_raw())?;
    let pixels = encoder.finish()?;

    let catalog_id = Ref::new(1);
    let tree_id = Ref::new(2);
    let image_id = Ref::new(3);
    let mut next_id = 4;
    let mut alloc = || {
        let id = Ref::new(next_id);
        next_id += 1;
        id
    };
    let pages: Vec<(Ref, Ref)> = offsets.iter().map(|_| (alloc(), alloc())).collect();

    let mut pdf = Pdf::new();
    pdf.catalog(catalog_id).pages(tree_id);
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    pdf.pages(tree_id)
        .kids(pages.iter().map(|(page_id, _)| *page_id))
        .count(pages.len() as i32);

    let mut xobject = pdf.image_xobject(image_id, &pixels);
    xobject.filter(Filter::FlateDecode);
    #[allow(clippy::cast_possible_wrap)]
    {
        xobject.width(width_px as i32);
        xobject.height(height_px as i32);
    }
    xobject.color_space().device_rgb();
    xobject.bits_per_component(8);
    xobject.finish();

    let page_w = PAGE_WIDTH_MM * PT_PER_MM;
    let page_h = PAGE_HEIGHT_MM * PT_PER_MM;
    let image_w = IMAGE_WIDTH_MM * PT_PER_MM;
    let image_h = image_height * PT_PER_MM;

    for ((page_id, content_id), offset_mm) in pages.iter().zip(&offsets) {
        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(0.0, 0.0, page_w, page_h));
        page.parent(tree_id);
        page.contents(*content_id);
        page.resources().x_objects().pair(IMAGE_NAME, image_id);
        page.finish();

        // Offsets are measured from the top edge; PDF y grows upwards.
        let bottom = page_h - (offset_mm * PT_PER_MM + image_h);
        let mut content = Content::new();
        content.save_state();
        content.transform([image_w, 0.0, 0.0, image_h, 0.0, bottom]);
        content.x_object(IMAGE_NAME);
        content.restore_state();
        pdf.stream(*content_id, &content.finish());
    }

    Ok(pdf.finish())
}
