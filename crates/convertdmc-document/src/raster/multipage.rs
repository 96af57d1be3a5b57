// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Multi-frame raster documents: read the frames of a (possibly multi-page)
// TIFF one at a time, and write a sequence of frames back out as one TIFF with
// an IFD per frame, using the `tiff` crate.
//
// The `image` crate's TIFF decoder only ever yields the first IFD, so frame
// iteration talks to `tiff` directly.

use std::io::Cursor;

use convertdmc_core::error::{ConvertError, Result};
use image::{DynamicImage, GrayAlphaImage, GrayImage, ImageBuffer, Luma, Rgb, RgbImage, RgbaImage};
use tiff::ColorType;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::{CompressionMethod, Tag};
use tiff::encoder::{TiffEncoder, colortype};
use tracing::{debug, instrument};

/// Does `data` start with a classic or BigTIFF header?
pub fn is_tiff(data: &[u8]) -> bool {
    data.starts_with(b"II*\0")
        || data.starts_with(b"MM\0*")
        || data.starts_with(b"II+\0")
        || data.starts_with(b"MM\0+")
}

/// Lazily decodes the frames of a raster document in index order.
///
/// TIFF input yields one frame per IFD. Any other still image the `image`
/// crate can read is treated as a one-frame sequence.
pub struct FrameReader<'a> {
    source: FrameSource<'a>,
    /// Index of the next frame [`FrameReader::next_frame`] will return.
    index: usize,
    /// Set once the sequence is exhausted or a frame failed to decode.
    finished: bool,
}

enum FrameSource<'a> {
    Tiff {
        decoder: Decoder<Cursor<&'a [u8]>>,
        /// The decoder sits on an IFD that has not been read yet.
        pending: bool,
    },
    Still(Option<&'a [u8]>),
}

impl<'a> FrameReader<'a> {
    /// Open a frame reader over `data`. Only the TIFF header is parsed here.
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let source = if is_tiff(data) {
            let decoder = Decoder::new(Cursor::new(data))
                .map_err(|err| ConvertError::decode("TIFF image", err))?;
            FrameSource::Tiff {
                decoder,
                pending: true,
            }
        } else {
            FrameSource::Still(Some(data))
        };

        Ok(Self {
            source,
            index: 0,
            finished: false,
        })
    }

    /// Whether another frame follows.
    pub fn has_next(&mut self) -> bool {
        if self.finished {
            return false;
        }
        match &mut self.source {
            FrameSource::Tiff { decoder, pending } => *pending || decoder.more_images(),
            FrameSource::Still(data) => data.is_some(),
        }
    }

    /// Decode the next frame, or `Ok(None)` once every frame has been read.
    ///
    /// A frame the container announces but cannot deliver is a decode error,
    /// not the end of the sequence.
    pub fn next_frame(&mut self) -> Result<Option<DynamicImage>> {
        if !self.has_next() {
            self.finished = true;
            return Ok(None);
        }

        let index = self.index;
        let decoded = match &mut self.source {
            FrameSource::Tiff { decoder, pending } => advance_tiff(decoder, pending, index),
            FrameSource::Still(data) => data
                .take()
                .ok_or_else(|| ConvertError::EmptyResult("the image contains no frames".into()))
                .and_then(|bytes| {
                    image::load_from_memory(bytes)
                        .map_err(|err| ConvertError::decode("raster image", err))
                }),
        };

        match decoded {
            Ok(frame) => {
                debug!(
                    index,
                    width = frame.width(),
                    height = frame.height(),
                    color = ?frame.color(),
                    "Frame decoded"
                );
                self.index += 1;
                Ok(Some(frame))
            }
            Err(err) => {
                self.finished = true;
                Err(err)
            }
        }
    }

    /// Number of frames returned so far.
    pub fn frames_read(&self) -> usize {
        self.index
    }
}

impl Iterator for FrameReader<'_> {
    type Item = Result<DynamicImage>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

/// Decode only the first frame of `data`.
pub fn first_frame(data: &[u8]) -> Result<DynamicImage> {
    FrameReader::new(data)?
        .next_frame()?
        .ok_or_else(|| ConvertError::EmptyResult("the image contains no frames".into()))
}

/// Write `frames` as one TIFF, one IFD per frame, each as 8-bit RGB.
#[instrument(skip_all, fields(frames = frames.len()))]
pub fn write_frames(frames: &[DynamicImage]) -> Result<Vec<u8>> {
    if frames.is_empty() {
        return Err(ConvertError::EmptyResult(
            "no frames to write into the TIFF".into(),
        ));
    }

    let mut cursor = Cursor::new(Vec::new());
    {
        let mut encoder =
            TiffEncoder::new(&mut cursor).map_err(|err| ConvertError::encode("TIFF image", err))?;
        for (index, frame) in frames.iter().enumerate() {
            let rgb = frame.to_rgb8();
            encoder
                .write_image::<colortype::RGB8>(rgb.width(), rgb.height(), rgb.as_raw())
                .map_err(|err| {
                    ConvertError::encode("TIFF image", format!("frame {index}: {err}"))
                })?;
        }
    }

    Ok(cursor.into_inner())
}

// -- Frame decoding helpers ---------------------------------------------------

/// Step onto the next IFD unless the current one is still unread, then decode it.
fn advance_tiff(
    decoder: &mut Decoder<Cursor<&[u8]>>,
    pending: &mut bool,
    index: usize,
) -> Result<DynamicImage> {
    if !*pending {
        decoder.next_image().map_err(|err| {
            ConvertError::decode("TIFF image", format!("frame {index}: {err}"))
        })?;
    }
    *pending = false;
    read_tiff_frame(decoder, index)
}

fn read_tiff_frame(decoder: &mut Decoder<Cursor<&[u8]>>, index: usize) -> Result<DynamicImage> {
    let frame_err = |err: tiff::TiffError| {
        ConvertError::decode("TIFF image", format!("frame {index}: {err}"))
    };

    let (width, height) = decoder.dimensions().map_err(frame_err)?;
    let color = decoder.colortype().map_err(frame_err)?;
    let mut data = decoder.read_image().map_err(frame_err)?;

    // The JPEG codec already hands YCbCr back as RGB; other compressions do not.
    if let (ColorType::YCbCr(8), DecodingResult::U8(samples)) = (color, &mut data) {
        let compression = decoder
            .find_tag_unsigned::<u16>(Tag::Compression)
            .map_err(frame_err)?;
        let jpeg = matches!(
            compression.and_then(CompressionMethod::from_u16),
            Some(CompressionMethod::JPEG | CompressionMethod::ModernJPEG)
        );
        if !jpeg {
            ycbcr_to_rgb(samples);
        }
    }

    frame_to_image(width, height, color, data).ok_or_else(|| {
        ConvertError::decode(
            "TIFF image",
            format!("frame {index}: unsupported sample layout {color:?}"),
        )
    })
}

/// Map a decoded TIFF strip/tile buffer onto the matching `DynamicImage` layout.
fn frame_to_image(
    width: u32,
    height: u32,
    color: ColorType,
    data: DecodingResult,
) -> Option<DynamicImage> {
    match (color, data) {
        (ColorType::Gray(1), DecodingResult::U8(buf)) => {
            unpack_bilevel(width, height, &buf).map(DynamicImage::ImageLuma8)
        }
        (ColorType::Gray(8), DecodingResult::U8(buf)) => {
            GrayImage::from_raw(width, height, buf).map(DynamicImage::ImageLuma8)
        }
        (ColorType::GrayA(8), DecodingResult::U8(buf)) => {
            GrayAlphaImage::from_raw(width, height, buf).map(DynamicImage::ImageLumaA8)
        }
        (ColorType::RGB(8) | ColorType::YCbCr(8), DecodingResult::U8(buf)) => {
            RgbImage::from_raw(width, height, buf).map(DynamicImage::ImageRgb8)
        }
        (ColorType::RGBA(8), DecodingResult::U8(buf)) => {
            RgbaImage::from_raw(width, height, buf).map(DynamicImage::ImageRgba8)
        }
        (ColorType::CMYK(8), DecodingResult::U8(buf)) => {
            cmyk_to_rgb(width, height, &buf).map(DynamicImage::ImageRgb8)
        }
        (ColorType::Gray(16), DecodingResult::U16(buf)) => {
            ImageBuffer::<Luma<u16>, _>::from_raw(width, height, buf)
                .map(DynamicImage::ImageLuma16)
        }
        (ColorType::RGB(16), DecodingResult::U16(buf)) => {
            ImageBuffer::<Rgb<u16>, _>::from_raw(width, height, buf).map(DynamicImage::ImageRgb16)
        }
        (ColorType::RGBA(16), DecodingResult::U16(buf)) => {
            ImageBuffer::<image::Rgba<u16>, _>::from_raw(width, height, buf)
                .map(DynamicImage::ImageRgba16)
        }
        _ => None,
    }
}

/// Expand 1-bit rows (padded to a byte boundary, 1 = white) into 8-bit gray.
fn unpack_bilevel(width: u32, height: u32, packed: &[u8]) -> Option<GrayImage> {
    let row_bytes = (width as usize).div_ceil(8);
    if packed.len() < row_bytes * height as usize {
        return None;
    }
    Some(GrayImage::from_fn(width, height, |x, y| {
        let byte = packed[y as usize * row_bytes + x as usize / 8];
        let bit = (byte >> (7 - (x % 8))) & 1;
        Luma([if bit == 1 { 255 } else { 0 }])
    }))
}

/// Full-range BT.601 conversion, in place, for interleaved 8-bit samples.
fn ycbcr_to_rgb(samples: &mut [u8]) {
    for px in samples.chunks_exact_mut(3) {
        let y = f32::from(px[0]);
        let cb = f32::from(px[1]) - 128.0;
        let cr = f32::from(px[2]) - 128.0;
        let clamp = |v: f32| v.round().clamp(0.0, 255.0) as u8;
        px[0] = clamp(y + 1.402 * cr);
        px[1] = clamp(y - 0.344_136 * cb - 0.714_136 * cr);
        px[2] = clamp(y + 1.772 * cb);
    }
}

fn cmyk_to_rgb(width: u32, height: u32, cmyk: &[u8]) -> Option<RgbImage> {
    if cmyk.len() < width as usize * height as usize * 4 {
        return None;
    }
    let rgb = cmyk
        .chunks_exact(4)
        .flat_map(|px| {
            let k = 255 - u16::from(px[3]);
            let channel = |c: u8| ((255 - u16::from(c)) * k / 255) as u8;
            [channel(px[0]), channel(px[1]), channel(px[2])]
        })
        .collect();
    RgbImage::from_raw(width, height, rgb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::ImageProcessor;

    fn solid(width: u32, height: u32, rgb: [u8; 3]) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb(rgb)))
    }

    fn gray_two_frame_tiff() -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        {
            let mut encoder = TiffEncoder::new(&mut cursor).unwrap();
            encoder
                .write_image::<colortype::Gray8>(4, 2, &[0, 50, 100, 150, 200, 250, 10, 20])
                .unwrap();
            encoder
                .write_image::<colortype::Gray8>(2, 2, &[255, 255, 0, 0])
                .unwrap();
        }
        cursor.into_inner()
    }

    #[test]
    fn reads_frames_in_order() {
        let frames = vec![
            solid(10, 5, [255, 0, 0]),
            solid(7, 3, [0, 255, 0]),
            solid(4, 9, [0, 0, 255]),
        ];
        let tiff = write_frames(&frames).unwrap();

        let decoded: Vec<DynamicImage> = FrameReader::new(&tiff)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(decoded.len(), 3);
        for (expected, actual) in frames.iter().zip(&decoded) {
            assert_eq!(actual.to_rgb8(), expected.to_rgb8());
        }
    }

    #[test]
    fn has_next_tracks_the_sequence() {
        let tiff = gray_two_frame_tiff();
        let mut reader = FrameReader::new(&tiff).unwrap();

        assert!(reader.has_next());
        let first = reader.next_frame().unwrap().unwrap();
        assert_eq!((first.width(), first.height()), (4, 2));
        assert!(reader.has_next());
        reader.next_frame().unwrap().unwrap();
        assert!(!reader.has_next());
        assert!(reader.next_frame().unwrap().is_none());
        assert_eq!(reader.frames_read(), 2);
    }

    #[test]
    fn gray_frames_keep_their_samples() {
        let tiff = gray_two_frame_tiff();
        let first = first_frame(&tiff).unwrap();
        let DynamicImage::ImageLuma8(gray) = &first else {
            panic!("expected Luma8, got {:?}", first.color());
        };
        assert_eq!(gray.get_pixel(3, 0).0, [150]);
    }

    #[test]
    fn png_is_a_single_frame() {
        let png = ImageProcessor::from_dynamic(solid(6, 6, [9, 9, 9]))
            .to_png_bytes()
            .unwrap();
        let mut reader = FrameReader::new(&png).unwrap();
        assert!(reader.next_frame().unwrap().is_some());
        assert!(!reader.has_next());
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn truncated_tiff_fails_to_decode() {
        let tiff = write_frames(&[solid(32, 32, [1, 2, 3])]).unwrap();
        let truncated = &tiff[..12];
        let result = FrameReader::new(truncated).and_then(|mut reader| reader.next_frame());
        assert!(matches!(result, Err(ConvertError::Decode { .. })));
    }

    #[test]
    fn writing_nothing_is_refused() {
        assert!(matches!(write_frames(&[]), Err(ConvertError::EmptyResult(_))));
    }

    #[test]
    fn bilevel_rows_are_padded() {
        // 10 px wide => 2 bytes per row.
        let packed = [0b1000_0000, 0b0100_0000, 0xFF, 0xC0];
        let gray = unpack_bilevel(10, 2, &packed).unwrap();
        assert_eq!(gray.get_pixel(0, 0).0, [255]);
        assert_eq!(gray.get_pixel(1, 0).0, [0]);
        assert_eq!(gray.get_pixel(9, 0).0, [255]);
        assert_eq!(gray.get_pixel(9, 1).0, [255]);
    }

    #[test]
    fn ycbcr_frames_come_out_as_rgb() {
        // Pure red, green and white in YCbCr.
        let samples = [76, 85, 255, 150, 44, 21, 255, 128, 128, 255, 128, 128];
        let mut cursor = Cursor::new(Vec::new());
        TiffEncoder::new(&mut cursor)
            .unwrap()
            .write_image::<colortype::YCbCr8>(2, 2, &samples)
            .unwrap();

        let frame = first_frame(cursor.get_ref()).unwrap();
        let DynamicImage::ImageRgb8(rgb) = &frame else {
            panic!("expected Rgb8, got {:?}", frame.color());
        };
        let close = |actual: [u8; 3], expected: [u8; 3]| {
            actual.iter().zip(expected).all(|(a, e)| a.abs_diff(e) <= 3)
        };
        assert!(close(rgb.get_pixel(0, 0).0, [255, 0, 0]), "{:?}", rgb.get_pixel(0, 0));
        assert!(close(rgb.get_pixel(1, 0).0, [0, 255, 0]), "{:?}", rgb.get_pixel(1, 0));
        assert_eq!(rgb.get_pixel(0, 1).0, [255, 255, 255]);
    }

    #[test]
    fn cmyk_black_and_white() {
        let rgb = cmyk_to_rgb(2, 1, &[0, 0, 0, 0, 0, 0, 0, 255]).unwrap();
        assert_eq!(rgb.get_pixel(0, 0).0, [255, 255, 255]);
        assert_eq!(rgb.get_pixel(1, 0).0, [0, 0, 0]);
    }
}
