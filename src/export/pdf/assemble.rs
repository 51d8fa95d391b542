//! PDF assembly: one image XObject per A4 page

use super::slice::PageSlice;
use crate::error::{Error, Result};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use std::io::Write;

/// A4 page width in PDF points.
pub const A4_WIDTH_PT: f32 = 595.28;
/// A4 page height in PDF points.
pub const A4_HEIGHT_PT: f32 = 841.89;

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

/// Build a PDF with one page per slice.
///
/// Each slice is drawn at full page width, anchored to the top of its page.
pub fn assemble_pdf(slices: &[PageSlice]) -> Result<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids = Vec::with_capacity(slices.len());

    for (index, slice) in slices.iter().enumerate() {
        let (width, height) = slice.image.dimensions();
        let rgb: Vec<u8> = slice
            .image
            .pixels()
            .flat_map(|pixel| [pixel[0], pixel[1], pixel[2]])
            .collect();

        let image_id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => width as i64,
                "Height" => height as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8i64,
                "Filter" => "FlateDecode",
            },
            deflate(&rgb)?,
        ));

        let name = format!("Im{}", index);
        let draw_height = A4_HEIGHT_PT * slice.page_fraction as f32;
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        real(A4_WIDTH_PT),
                        real(0.0),
                        real(0.0),
                        real(draw_height),
                        real(0.0),
                        real(A4_HEIGHT_PT - draw_height),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(name.clone().into_bytes())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![real(0.0), real(0.0), real(A4_WIDTH_PT), real(A4_HEIGHT_PT)],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    name.as_str() => image_id,
                },
            },
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| Error::PdfAssembly(e.to_string()))?;
    Ok(bytes)
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| Error::PdfAssembly(e.to_string()))?;
    encoder
        .finish()
        .map_err(|e| Error::PdfAssembly(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn slice(height: u32, fraction: f64) -> PageSlice {
        PageSlice {
            image: RgbaImage::from_pixel(21, height, Rgba([255, 255, 255, 255])),
            page_fraction: fraction,
        }
    }

    #[test]
    fn test_one_page_per_slice() {
        let bytes = assemble_pdf(&[slice(30, 1.0), slice(30, 1.0), slice(10, 0.33)]).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load_mem(&bytes).unwrap();
        assert_eq!(doc.get_pages().len(), 3);
    }

    #[test]
    fn test_pages_are_a4() {
        let bytes = assemble_pdf(&[slice(30, 1.0)]).unwrap();
        let doc = Document::load_mem(&bytes).unwrap();

        let (_, page_id) = doc.get_pages().into_iter().next().unwrap();
        let page = doc.get_dictionary(page_id).unwrap();
        let media_box = page.get(b"MediaBox").unwrap().as_array().unwrap();
        let height = media_box[3].as_float().unwrap() as f64;
        assert!((height - A4_HEIGHT_PT as f64).abs() < 0.01);
    }

    #[test]
    fn test_deflate_roundtrips_through_zlib() {
        use flate2::read::ZlibDecoder;
        use std::io::Read;

        let data = vec![7u8; 1000];
        let mut out = Vec::new();
        ZlibDecoder::new(deflate(&data).unwrap().as_slice())
            .read_to_end(&mut out)
            .unwrap();
        assert_eq!(out, data);
    }
}
