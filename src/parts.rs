//! Relationship registry for embedded parts.
//!
//! Stands in for the archive-side part manager: it allocates `rId`
//! values, stores embedded payloads (images, charts, OLE objects, media)
//! and resolves relationship ids back to their parts. No archive I/O
//! happens here; packaging is the embedder's concern.

use crate::error::{Error, Result};
use crate::unit::Emu;
use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// An embedded part payload with its content type.
#[derive(Debug, Clone)]
pub struct EmbeddedPart {
    pub content_type: String,
    pub blob: Vec<u8>,
}

/// Identity of a registered image part.
#[derive(Debug, Clone)]
pub struct ImageRef {
    pub r_id: String,
    pub desc: String,
    /// Native pixel size, used to derive default display extents.
    pub px_size: (u32, u32),
}

impl ImageRef {
    /// Scale the native pixel size (at 96 dpi) to display extents,
    /// honoring whichever of `width`/`height` the caller supplied and
    /// preserving aspect ratio for the other.
    pub fn scale(&self, width: Option<Emu>, height: Option<Emu>) -> (Emu, Emu) {
        let (px_w, px_h) = self.px_size;
        let native_w = Emu::from_px_96(px_w);
        let native_h = Emu::from_px_96(px_h);
        match (width, height) {
            (Some(w), Some(h)) => (w, h),
            (Some(w), None) => (w, Emu((w.0 as i128 * px_h as i128 / px_w as i128) as i64)),
            (None, Some(h)) => (Emu((h.0 as i128 * px_w as i128 / px_h as i128) as i64), h),
            (None, None) => (native_w, native_h),
        }
    }
}

/// In-memory relationship registry.
#[derive(Debug, Default)]
pub struct PartStore {
    next_rid: u32,
    parts: HashMap<String, EmbeddedPart>,
    image_index: HashMap<u64, String>,
}

impl PartStore {
    pub fn new() -> Self {
        PartStore::default()
    }

    fn next_r_id(&mut self) -> String {
        self.next_rid += 1;
        format!("rId{}", self.next_rid)
    }

    /// Register an image payload, reusing the existing relationship when
    /// an identical payload was registered before.
    pub fn get_or_add_image_part(&mut self, image: &[u8], desc: &str) -> Result<ImageRef> {
        let (px_size, content_type) = sniff_image(image)?;
        let mut hasher = DefaultHasher::new();
        image.hash(&mut hasher);
        let key = hasher.finish();

        let r_id = if let Some(existing) = self.image_index.get(&key) {
            existing.clone()
        } else {
            let r_id = self.next_r_id();
            self.parts.insert(
                r_id.clone(),
                EmbeddedPart {
                    content_type: content_type.to_string(),
                    blob: image.to_vec(),
                },
            );
            self.image_index.insert(key, r_id.clone());
            r_id
        };

        Ok(ImageRef {
            r_id,
            desc: desc.to_string(),
            px_size,
        })
    }

    /// Register a chart part payload and return its relationship id.
    pub fn add_chart_part(&mut self, chart_xml: Vec<u8>) -> Result<String> {
        let r_id = self.next_r_id();
        self.parts.insert(
            r_id.clone(),
            EmbeddedPart {
                content_type:
                    "application/vnd.openxmlformats-officedocument.drawingml.chart+xml".to_string(),
                blob: chart_xml,
            },
        );
        Ok(r_id)
    }

    /// Register an embedded OLE object payload.
    pub fn add_ole_object_part(&mut self, prog_id: &str, blob: Vec<u8>) -> Result<String> {
        if prog_id.is_empty() {
            return Err(Error::InvalidFormat("empty OLE progId".to_string()));
        }
        let r_id = self.next_r_id();
        self.parts.insert(
            r_id.clone(),
            EmbeddedPart {
                content_type: "application/vnd.openxmlformats-officedocument.oleObject"
                    .to_string(),
                blob,
            },
        );
        Ok(r_id)
    }

    /// Register a media (video/audio) payload.
    pub fn add_media_part(&mut self, mime_type: &str, blob: Vec<u8>) -> String {
        let r_id = self.next_r_id();
        self.parts.insert(
            r_id.clone(),
            EmbeddedPart {
                content_type: mime_type.to_string(),
                blob,
            },
        );
        r_id
    }

    /// Resolve a relationship id to its part.
    pub fn related_part(&self, r_id: &str) -> Result<&EmbeddedPart> {
        self.parts
            .get(r_id)
            .ok_or_else(|| Error::PartNotFound(r_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// Determine pixel size and content type from the image header.
///
/// PNG and JPEG cover what this DOM embeds; anything else is rejected
/// rather than guessed at.
fn sniff_image(image: &[u8]) -> Result<((u32, u32), &'static str)> {
    let (size, content_type) = if image.len() >= 24 && image.starts_with(b"\x89PNG\r\n\x1a\n") {
        // IHDR is the first chunk: width/height at fixed offsets 16/20.
        let w = u32::from_be_bytes([image[16], image[17], image[18], image[19]]);
        let h = u32::from_be_bytes([image[20], image[21], image[22], image[23]]);
        ((w, h), "image/png")
    } else if image.len() >= 4 && image.starts_with(b"\xff\xd8") {
        (jpeg_size(image)?, "image/jpeg")
    } else {
        return Err(Error::InvalidFormat(
            "unrecognized image format; PNG or JPEG expected".to_string(),
        ));
    };
    if size.0 == 0 || size.1 == 0 {
        return Err(Error::InvalidFormat(
            "image declares a zero pixel dimension".to_string(),
        ));
    }
    Ok((size, content_type))
}

/// Walk JPEG segment markers to the first SOF frame header.
fn jpeg_size(image: &[u8]) -> Result<(u32, u32)> {
    let mut pos = 2usize;
    while pos + 4 <= image.len() {
        if image[pos] != 0xff {
            break;
        }
        let marker = image[pos + 1];
        // Standalone markers carry no length field.
        if (0xd0..=0xd9).contains(&marker) {
            pos += 2;
            continue;
        }
        let len = u16::from_be_bytes([image[pos + 2], image[pos + 3]]) as usize;
        if matches!(marker, 0xc0..=0xc3 | 0xc5..=0xc7 | 0xc9..=0xcb | 0xcd..=0xcf) {
            if pos + 9 > image.len() {
                break;
            }
            let h = u16::from_be_bytes([image[pos + 5], image[pos + 6]]) as u32;
            let w = u16::from_be_bytes([image[pos + 7], image[pos + 8]]) as u32;
            return Ok((w, h));
        }
        pos += 2 + len;
    }
    Err(Error::InvalidFormat("truncated JPEG header".to_string()))
}

#[cfg(test)]
pub(crate) fn test_png(width: u32, height: u32) -> Vec<u8> {
    let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
    png.extend_from_slice(&13u32.to_be_bytes());
    png.extend_from_slice(b"IHDR");
    png.extend_from_slice(&width.to_be_bytes());
    png.extend_from_slice(&height.to_be_bytes());
    png.extend_from_slice(&[8, 2, 0, 0, 0]);
    png
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_png_sniff() {
        let png = test_png(640, 480);
        let (size, ct) = sniff_image(&png).unwrap();
        assert_eq!(size, (640, 480));
        assert_eq!(ct, "image/png");
    }

    #[test]
    fn test_jpeg_sniff() {
        // SOI, APP0 stub, SOF0 with 480x640.
        let mut jpeg = vec![0xff, 0xd8];
        jpeg.extend_from_slice(&[0xff, 0xe0, 0x00, 0x04, 0x00, 0x00]);
        jpeg.extend_from_slice(&[0xff, 0xc0, 0x00, 0x0b, 8, 0x01, 0xe0, 0x02, 0x80, 1, 0, 0, 0]);
        let (size, ct) = sniff_image(&jpeg).unwrap();
        assert_eq!(size, (640, 480));
        assert_eq!(ct, "image/jpeg");
    }

    #[test]
    fn test_unknown_format_rejected() {
        assert!(sniff_image(b"GIF89a").is_err());
    }

    #[test]
    fn test_zero_dimension_image_rejected() {
        let mut store = PartStore::new();
        assert!(matches!(
            store.get_or_add_image_part(&test_png(0, 10), "z.png"),
            Err(Error::InvalidFormat(_))
        ));
        assert!(matches!(
            store.get_or_add_image_part(&test_png(10, 0), "z.png"),
            Err(Error::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_image_dedup() {
        let mut store = PartStore::new();
        let png = test_png(10, 10);
        let first = store.get_or_add_image_part(&png, "a.png").unwrap();
        let second = store.get_or_add_image_part(&png, "b.png").unwrap();
        assert_eq!(first.r_id, second.r_id);
        assert_eq!(store.len(), 1);

        let other = test_png(20, 20);
        let third = store.get_or_add_image_part(&other, "c.png").unwrap();
        assert_ne!(first.r_id, third.r_id);
    }

    #[test]
    fn test_scale_preserves_aspect() {
        let image = ImageRef {
            r_id: "rId1".to_string(),
            desc: "x.png".to_string(),
            px_size: (200, 100),
        };
        let (w, h) = image.scale(None, None);
        assert_eq!(w, Emu::from_px_96(200));
        assert_eq!(h, Emu::from_px_96(100));

        let (w, h) = image.scale(Some(Emu(914_400)), None);
        assert_eq!(w, Emu(914_400));
        assert_eq!(h, Emu(457_200));
    }

    #[test]
    fn test_related_part_lookup() {
        let mut store = PartStore::new();
        let r_id = store.add_chart_part(b"<c:chartSpace/>".to_vec()).unwrap();
        assert!(store.related_part(&r_id).is_ok());
        assert!(matches!(
            store.related_part("rId99"),
            Err(Error::PartNotFound(_))
        ));
    }
}
