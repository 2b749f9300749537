//! Animated GIF encoding for the looping photo sequence.

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame};

use super::{validate, EncodeError};
use crate::decode::RasterImage;

/// Quantization speed passed to the GIF encoder (1 = best, 30 = fastest).
const GIF_SPEED: i32 = 10;

/// Encode frames into an infinitely looping GIF, each held for `delay_ms`.
///
/// Every frame must have the first frame's dimensions.
pub fn encode_gif(frames: &[RasterImage], delay_ms: u32) -> Result<Vec<u8>, EncodeError> {
    let first = frames.first().ok_or(EncodeError::NoFrames)?;

    for (index, frame) in frames.iter().enumerate() {
        validate(frame)?;
        if frame.width != first.width || frame.height != first.height {
            return Err(EncodeError::FrameSizeMismatch {
                index,
                width: frame.width,
                height: frame.height,
                expected_width: first.width,
                expected_height: first.height,
            });
        }
    }

    let to_error = |e: image::ImageError| EncodeError::EncodingFailed {
        format: "GIF",
        reason: e.to_string(),
    };

    let mut buffer = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(&mut buffer, GIF_SPEED);
        encoder.set_repeat(Repeat::Infinite).map_err(to_error)?;

        for frame in frames {
            let rgba = frame.to_rgba_image().ok_or(EncodeError::InvalidPixelData {
                expected: frame.width as usize * frame.height as usize * 4,
                actual: frame.pixels.len(),
            })?;
            let delay = Delay::from_numer_denom_ms(delay_ms, 1);
            encoder
                .encode_frame(Frame::from_parts(rgba, 0, 0, delay))
                .map_err(to_error)?;
        }
    }

    Ok(buffer)
}
