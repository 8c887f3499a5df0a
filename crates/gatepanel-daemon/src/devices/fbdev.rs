//! Linux framebuffer device sink.

use std::fs::{File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::Path;

use embedded_graphics::prelude::IntoStorage;
use gatepanel_core::display::{DisplayError, DisplaySink};
use gatepanel_core::graphics::Rgba;
use log::{info, warn};

use super::sysfs::read_attribute;

const SYSFS_GRAPHICS: &str = "/sys/class/graphics";

/// Pixel encodings the sink can write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 16 bpp, little endian
    Rgb565,
    /// 32 bpp, stored `B G R X`
    Xrgb8888,
}

impl PixelFormat {
    pub fn from_bits_per_pixel(bits: u32) -> Option<Self> {
        match bits {
            16 => Some(Self::Rgb565),
            32 => Some(Self::Xrgb8888),
            _ => None,
        }
    }

    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Self::Rgb565 => 2,
            Self::Xrgb8888 => 4,
        }
    }

    fn encode(self, pixel: Rgba, out: &mut Vec<u8>) {
        match self {
            Self::Rgb565 => {
                let raw: u16 = pixel.to_rgb565().into_storage();
                out.extend_from_slice(&raw.to_le_bytes());
            }
            Self::Xrgb8888 => out.extend_from_slice(&[pixel.b, pixel.g, pixel.r, 0xFF]),
        }
    }
}

/// Memory layout of the framebuffer: bytes per line and pixel encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FbLayout {
    pub stride: u32,
    pub format: PixelFormat,
}

fn invalid(message: String) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, message)
}

impl FbLayout {
    /// Rows of exactly `width` RGB565 pixels.
    pub fn packed(width: u32) -> Self {
        Self {
            stride: width * PixelFormat::Rgb565.bytes_per_pixel(),
            format: PixelFormat::Rgb565,
        }
    }

    /// Read `stride` and `bits_per_pixel` from a `graphics` class directory.
    pub fn from_sysfs(dir: &Path, width: u32) -> io::Result<Self> {
        let number = |name: &str| -> io::Result<u32> {
            let raw = read_attribute(&dir.join(name))?;
            raw.parse()
                .map_err(|_| invalid(format!("{}/{name}: {raw:?} is not a number", dir.display())))
        };
        let bits = number("bits_per_pixel")?;
        let format = PixelFormat::from_bits_per_pixel(bits)
            .ok_or_else(|| invalid(format!("unsupported depth {bits} bpp")))?;
        let stride = number("stride")?;
        if stride < width * format.bytes_per_pixel() {
            return Err(invalid(format!("stride {stride} too small for {width} pixels")));
        }
        Ok(Self { stride, format })
    }

    /// Layout of device node `device` (`/dev/fbN`); packed RGB565 when sysfs
    /// has no entry for it.
    pub fn detect(device: &Path, width: u32) -> io::Result<Self> {
        let Some(name) = device.file_name() else {
            return Ok(Self::packed(width));
        };
        let dir = Path::new(SYSFS_GRAPHICS).join(name);
        match Self::from_sysfs(&dir, width) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!("No framebuffer attributes in {}, assuming packed RGB565", dir.display());
                Ok(Self::packed(width))
            }
            other => other,
        }
    }
}

/// Writes pushed rectangles to the framebuffer, row by row.
pub struct FbDevSink<W> {
    device: W,
    width: u32,
    height: u32,
    layout: FbLayout,
    row: Vec<u8>,
}

impl FbDevSink<File> {
    pub fn open(path: &Path, width: u32, height: u32) -> io::Result<Self> {
        let layout = FbLayout::detect(path, width)?;
        let device = OpenOptions::new().write(true).open(path)?;
        info!(
            "Framebuffer {}: {:?}, {} bytes per line",
            path.display(),
            layout.format,
            layout.stride
        );
        Ok(Self::with_layout(device, width, height, layout))
    }
}

impl<W: Write + Seek> FbDevSink<W> {
    pub fn new(device: W, width: u32, height: u32) -> Self {
        Self::with_layout(device, width, height, FbLayout::packed(width))
    }

    pub fn with_layout(device: W, width: u32, height: u32, layout: FbLayout) -> Self {
        Self {
            device,
            width,
            height,
            layout,
            row: Vec::with_capacity((width * layout.format.bytes_per_pixel()) as usize),
        }
    }

    pub fn into_inner(self) -> W {
        self.device
    }

    fn write_row(&mut self, offset: u64) -> io::Result<()> {
        self.device.seek(SeekFrom::Start(offset))?;
        self.device.write_all(&self.row)
    }
}

fn transport(e: io::Error) -> DisplayError {
    DisplayError::Transport {
        message: e.to_string(),
    }
}

impl<W: Write + Seek> DisplaySink for FbDevSink<W> {
    fn push(
        &mut self,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        pixels: &[Rgba],
    ) -> Result<(), DisplayError> {
        if pixels.len() != width as usize * height as usize {
            return Err(DisplayError::Geometry {
                width,
                height,
                got: pixels.len(),
            });
        }
        if x + width > self.width || y + height > self.height {
            return Err(DisplayError::Transport {
                message: format!(
                    "{width}x{height} at ({x}, {y}) outside {}x{} framebuffer",
                    self.width, self.height
                ),
            });
        }

        let FbLayout { stride, format } = self.layout;
        for (row, line) in pixels.chunks_exact(width.max(1) as usize).enumerate() {
            self.row.clear();
            for pixel in line {
                format.encode(*pixel, &mut self.row);
            }
            let offset = (u64::from(y) + row as u64) * u64::from(stride)
                + u64::from(x) * u64::from(format.bytes_per_pixel());
            self.write_row(offset).map_err(transport)?;
        }
        self.device.flush().map_err(transport)
    }
}
