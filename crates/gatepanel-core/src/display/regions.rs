//! Per-region double buffers.

use crate::graphics::{FrameBuffer, Rgba};

/// Two framebuffers for one screen region.
///
/// `counter % 2` selects the buffer being drawn. [`finish`](Self::finish)
/// hands the drawn buffer out for compositing and advances the counter, so
/// the next cycle draws into the other one.
#[derive(Debug)]
pub struct RegionBuffers {
    buffers: [FrameBuffer; 2],
    counter: u64,
    y: u32,
}

impl RegionBuffers {
    pub fn new(width: u32, height: u32, y: u32, fill: Rgba) -> Self {
        Self {
            buffers: [
                FrameBuffer::new(width, height, fill),
                FrameBuffer::new(width, height, fill),
            ],
            counter: 0,
            y,
        }
    }

    /// Screen row of the region's top edge.
    pub fn y(&self) -> u32 {
        self.y
    }

    pub fn counter(&self) -> u64 {
        self.counter
    }

    /// Buffer to draw this cycle.
    pub fn begin(&mut self) -> &mut FrameBuffer {
        &mut self.buffers[(self.counter % 2) as usize]
    }

    /// Finish the cycle and return the fully drawn buffer.
    pub fn finish(&mut self) -> &FrameBuffer {
        let drawn = (self.counter % 2) as usize;
        self.counter += 1;
        &self.buffers[drawn]
    }

    /// Most recently finished buffer.
    pub fn front(&self) -> &FrameBuffer {
        &self.buffers[(self.counter.wrapping_sub(1) % 2) as usize]
    }

    /// The buffer finished one cycle before [`front`](Self::front).
    pub fn back(&self) -> &FrameBuffer {
        &self.buffers[(self.counter % 2) as usize]
    }
}
