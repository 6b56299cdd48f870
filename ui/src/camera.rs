//! Synthetic camera feed.
//!
//! Capture hardware varies per deployment, so the kiosk ships with a
//! generated moving pattern behind the same [`FrameSource`] seam a real
//! camera would use. The capture path (snapshot, JPEG encode, upload) is
//! fully exercised either way.

use std::time::Instant;

use rollcall_business::{Frame, FrameSource};

#[derive(Debug)]
pub struct TestPattern {
    width: u32,
    height: u32,
    started: Instant,
}

impl TestPattern {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            started: Instant::now(),
        }
    }
}

impl FrameSource for TestPattern {
    fn latest_frame(&self) -> Option<Frame> {
        let shift = (self.started.elapsed().as_secs_f32() * 40.0) as u32;
        let mut rgb = Vec::with_capacity((self.width * self.height * 3) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                rgb.push(((x + shift) % 256) as u8);
                rgb.push((y % 256) as u8);
                rgb.push((((x + y) / 2 + shift) % 256) as u8);
            }
        }
        Some(Frame {
            width: self.width,
            height: self.height,
            rgb,
        })
    }
}
