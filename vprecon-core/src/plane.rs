//! Plane buffers and borrowed plane views.
//!
//! A [`PlaneBuffer`] owns one 8-bit sample plane, optionally surrounded by a
//! border of pre-extended samples so that motion-compensated reads may start
//! left of or above the visible area. [`PlaneRef`] and [`PlaneMut`] are the
//! borrowed views the DSP stages operate on.

use crate::error::{Error, Result};

/// Row alignment applied to owned buffers.
pub const STRIDE_ALIGNMENT: usize = 32;

/// Chroma subsampling of a plane relative to luma.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Subsampling {
    /// Full resolution (luma, or 4:4:4 chroma).
    #[default]
    None,
    /// Half resolution in both axes (4:2:0 chroma).
    Yuv420,
}

impl Subsampling {
    /// Horizontal subsampling shift.
    pub fn shift_x(self) -> u32 {
        match self {
            Subsampling::None => 0,
            Subsampling::Yuv420 => 1,
        }
    }

    /// Vertical subsampling shift.
    pub fn shift_y(self) -> u32 {
        match self {
            Subsampling::None => 0,
            Subsampling::Yuv420 => 1,
        }
    }

    /// Dimensions of a plane subsampled from a `width`x`height` luma plane.
    pub fn plane_dimensions(self, width: usize, height: usize) -> (usize, usize) {
        let sx = self.shift_x();
        let sy = self.shift_y();
        ((width + (1 << sx) - 1) >> sx, (height + (1 << sy) - 1) >> sy)
    }
}

fn align_stride(width: usize) -> usize {
    (width + STRIDE_ALIGNMENT - 1) & !(STRIDE_ALIGNMENT - 1)
}

/// Owned 8-bit plane with an optional replicated border.
#[derive(Clone, PartialEq, Eq)]
pub struct PlaneBuffer {
    data: Vec<u8>,
    width: usize,
    height: usize,
    stride: usize,
    border: usize,
}

impl PlaneBuffer {
    /// Create a zeroed plane without border.
    pub fn new(width: usize, height: usize) -> Self {
        Self::with_border(width, height, 0)
    }

    /// Create a zeroed plane with `border` samples of padding on every side.
    pub fn with_border(width: usize, height: usize, border: usize) -> Self {
        let stride = align_stride(width + 2 * border);
        let rows = height + 2 * border;
        Self {
            data: vec![0; stride * rows],
            width,
            height,
            stride,
            border,
        }
    }

    /// Create a plane whose visible samples are produced by `f(x, y)`.
    ///
    /// The border is filled by replication afterwards.
    pub fn from_fn(
        width: usize,
        height: usize,
        border: usize,
        mut f: impl FnMut(usize, usize) -> u8,
    ) -> Self {
        let mut plane = Self::with_border(width, height, border);
        for y in 0..height {
            let row = plane.row_mut(y);
            for (x, sample) in row.iter_mut().enumerate() {
                *sample = f(x, y);
            }
        }
        plane.extend_borders();
        plane
    }

    /// Visible width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Visible height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance between rows in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Border width on each side.
    pub fn border(&self) -> usize {
        self.border
    }

    fn origin(&self) -> usize {
        self.border * self.stride + self.border
    }

    /// Visible samples of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: usize) -> &[u8] {
        assert!(y < self.height, "row {y} out of range");
        let start = self.origin() + y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Mutable visible samples of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        assert!(y < self.height, "row {y} out of range");
        let start = self.origin() + y * self.stride;
        let width = self.width;
        &mut self.data[start..start + width]
    }

    /// Sample at visible coordinates.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.data[self.origin() + y * self.stride + x])
        } else {
            None
        }
    }

    /// Fill the whole buffer, border included, with `value`.
    pub fn fill(&mut self, value: u8) {
        self.data.fill(value);
    }

    /// Replicate the outermost visible samples into the border.
    pub fn extend_borders(&mut self) {
        if self.border == 0 || self.width == 0 || self.height == 0 {
            return;
        }
        let b = self.border;
        let stride = self.stride;
        let width = self.width;

        for y in b..b + self.height {
            let row = &mut self.data[y * stride..y * stride + width + 2 * b];
            let left = row[b];
            let right = row[b + width - 1];
            row[..b].fill(left);
            row[b + width..].fill(right);
        }

        let line = width + 2 * b;
        let (top, rest) = self.data.split_at_mut(b * stride);
        let first = &rest[..line];
        for y in 0..b {
            top[y * stride..y * stride + line].copy_from_slice(first);
        }

        let last_row = b + self.height - 1;
        let (body, bottom) = self.data.split_at_mut((last_row + 1) * stride);
        let last = &body[last_row * stride..last_row * stride + line];
        for y in 0..b {
            bottom[y * stride..y * stride + line].copy_from_slice(last);
        }
    }

    /// Read-only view including the border.
    pub fn view(&self) -> PlaneRef<'_> {
        PlaneRef {
            data: &self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
            border: self.border,
        }
    }

    /// Mutable view of the visible area.
    pub fn view_mut(&mut self) -> PlaneMut<'_> {
        let origin = self.origin();
        PlaneMut {
            data: &mut self.data[origin..],
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }
}

impl std::fmt::Debug for PlaneBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaneBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("stride", &self.stride)
            .field("border", &self.border)
            .finish()
    }
}

/// Read-only plane view addressed with signed coordinates.
///
/// Coordinates are relative to the first visible sample; the valid range in
/// each axis is `[-border, size + border)`.
#[derive(Debug, Clone, Copy)]
pub struct PlaneRef<'a> {
    data: &'a [u8],
    width: usize,
    height: usize,
    stride: usize,
    border: usize,
}

impl<'a> PlaneRef<'a> {
    /// Wrap a caller-owned slice. `data[0]` is the top-left border sample.
    pub fn from_slice(
        data: &'a [u8],
        width: usize,
        height: usize,
        stride: usize,
        border: usize,
    ) -> Result<Self> {
        if stride < width + 2 * border {
            return Err(Error::invalid_param(format!(
                "stride {stride} cannot hold {width} samples plus {border} border"
            )));
        }
        let rows = height + 2 * border;
        let needed = if rows == 0 {
            0
        } else {
            (rows - 1) * stride + width + 2 * border
        };
        if data.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                available: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
            border,
        })
    }

    /// Visible width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Visible height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance between rows in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Border width on each side.
    pub fn border(&self) -> usize {
        self.border
    }

    /// Whether the `width`x`height` window at (`x`, `y`) lies inside the
    /// visible area extended by the border.
    pub fn contains_window(&self, x: isize, y: isize, width: usize, height: usize) -> bool {
        let b = self.border as isize;
        let max_x = self.width as isize + b;
        let max_y = self.height as isize + b;
        x >= -b
            && y >= -b
            && x.saturating_add(width as isize) <= max_x
            && y.saturating_add(height as isize) <= max_y
    }

    /// Fail with [`Error::OutOfBounds`] unless the window is addressable.
    pub fn check_window(&self, x: isize, y: isize, width: usize, height: usize) -> Result<()> {
        if self.contains_window(x, y, width, height) {
            Ok(())
        } else {
            Err(Error::OutOfBounds {
                x,
                y,
                width,
                height,
            })
        }
    }

    /// Sample at signed coordinates, if addressable.
    pub fn sample(&self, x: isize, y: isize) -> Option<u8> {
        if self.contains_window(x, y, 1, 1) {
            Some(self.data[self.offset(x, y)])
        } else {
            None
        }
    }

    fn offset(&self, x: isize, y: isize) -> usize {
        let b = self.border as isize;
        ((y + b) * self.stride as isize + (x + b)) as usize
    }

    /// `len` consecutive samples of row `y` starting at column `x`.
    ///
    /// # Panics
    ///
    /// Panics if the span leaves the backing slice. Spans that fall outside
    /// the border but inside the slice are not detected; use
    /// [`check_window`](Self::check_window) first when that matters.
    pub fn span(&self, x: isize, y: isize, len: usize) -> &'a [u8] {
        let start = self.offset(x, y);
        let data: &'a [u8] = self.data;
        &data[start..start.wrapping_add(len)]
    }
}

/// Mutable view of the visible area of a plane.
#[derive(Debug)]
pub struct PlaneMut<'a> {
    data: &'a mut [u8],
    width: usize,
    height: usize,
    stride: usize,
}

impl<'a> PlaneMut<'a> {
    /// Wrap a caller-owned slice. `data[0]` is the top-left visible sample.
    pub fn from_slice(data: &'a mut [u8], width: usize, height: usize, stride: usize) -> Result<Self> {
        if stride < width {
            return Err(Error::invalid_param(format!(
                "stride {stride} smaller than width {width}"
            )));
        }
        let needed = if height == 0 {
            0
        } else {
            (height - 1) * stride + width
        };
        if data.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                available: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            stride,
        })
    }

    /// Visible width in samples.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Visible height in rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Distance between rows in bytes.
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Reborrow with a shorter lifetime.
    pub fn reborrow(&mut self) -> PlaneMut<'_> {
        PlaneMut {
            data: &mut *self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
        }
    }

    /// Sample at visible coordinates.
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        if x < self.width && y < self.height {
            Some(self.data[y * self.stride + x])
        } else {
            None
        }
    }

    /// Visible samples of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row(&self, y: usize) -> &[u8] {
        assert!(y < self.height, "row {y} out of range");
        let start = y * self.stride;
        &self.data[start..start + self.width]
    }

    /// Mutable visible samples of row `y`.
    ///
    /// # Panics
    ///
    /// Panics if `y >= height`.
    pub fn row_mut(&mut self, y: usize) -> &mut [u8] {
        assert!(y < self.height, "row {y} out of range");
        let start = y * self.stride;
        &mut self.data[start..start + self.width]
    }

    /// Visible rows, top to bottom, each trimmed to `width`.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut [u8]> + '_ {
        let width = self.width;
        self.data
            .chunks_mut(self.stride)
            .take(self.height)
            .map(move |row| &mut row[..width])
    }

    /// Visible rows as a vector of disjoint mutable slices.
    pub fn split_rows(&mut self) -> Vec<&mut [u8]> {
        self.rows_mut().collect()
    }

    /// Read-only view of the visible area without border.
    pub fn as_plane_ref(&self) -> PlaneRef<'_> {
        PlaneRef {
            data: &*self.data,
            width: self.width,
            height: self.height,
            stride: self.stride,
            border: 0,
        }
    }
}
