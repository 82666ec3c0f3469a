use glam::{Vec2, Vec4};
use rayon::prelude::*;

use crate::config::FluidConfig;
use crate::error::FluidError;
use crate::resolution::grid_resolution;

/// Sample layout of a field, mirroring the render-target formats the solver
/// was designed around.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    /// One scalar channel (pressure, divergence, curl).
    R,
    /// Two channels (velocity).
    Rg,
    /// Four channels (dye, alpha unused by the solver).
    Rgba,
}

impl Format {
    pub fn channels(self) -> usize {
        match self {
            Format::R => 1,
            Format::Rg => 2,
            Format::Rgba => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filter {
    Nearest,
    Linear,
}

/// A 2D grid of samples for one physical quantity. Integer access clamps to
/// the edge; normalized-UV access honors the filter mode, with `Linear` as a
/// manual 4-tap bilinear over texel centers.
#[derive(Debug, Clone)]
pub struct Field {
    width: usize,
    height: usize,
    format: Format,
    filter: Filter,
    texel_size: Vec2,
    data: Vec<f32>,
}

impl Field {
    pub fn allocate(
        what: &'static str,
        width: usize,
        height: usize,
        format: Format,
        filter: Filter,
    ) -> Result<Self, FluidError> {
        let len = width * height * format.channels();
        let mut data = Vec::new();
        data.try_reserve_exact(len)
            .map_err(|_| FluidError::ResourceExhausted {
                what,
                bytes: len * std::mem::size_of::<f32>(),
            })?;
        data.resize(len, 0.0);

        Ok(Self {
            width,
            height,
            format,
            filter,
            texel_size: Vec2::new(1.0 / width as f32, 1.0 / height as f32),
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn texel_size(&self) -> Vec2 {
        self.texel_size
    }

    pub fn same_shape(&self, other: &Field) -> bool {
        self.width == other.width && self.height == other.height
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Normalized coordinates of the texel center at (x, y).
    pub fn uv(&self, x: usize, y: usize) -> Vec2 {
        Vec2::new(
            (x as f32 + 0.5) * self.texel_size.x,
            (y as f32 + 0.5) * self.texel_size.y,
        )
    }

    fn index(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.format.channels()
    }

    /// Fetch the sample at integer coordinates, clamped to the edge.
    /// Missing channels read as zero.
    pub fn fetch(&self, x: i32, y: i32) -> Vec4 {
        let x = x.clamp(0, self.width as i32 - 1) as usize;
        let y = y.clamp(0, self.height as i32 - 1) as usize;
        let i = self.index(x, y);
        let mut out = [0.0; 4];
        out[..self.format.channels()]
            .copy_from_slice(&self.data[i..i + self.format.channels()]);
        Vec4::from_array(out)
    }

    /// Write the sample at integer coordinates. Extra channels of `value`
    /// are discarded.
    pub fn store(&mut self, x: usize, y: usize, value: Vec4) {
        let ch = self.format.channels();
        let i = self.index(x, y);
        self.data[i..i + ch].copy_from_slice(&value.to_array()[..ch]);
    }

    /// Sample at a normalized UV coordinate according to the filter mode.
    pub fn sample(&self, uv: Vec2) -> Vec4 {
        match self.filter {
            Filter::Nearest => {
                let x = (uv.x * self.width as f32).floor() as i32;
                let y = (uv.y * self.height as f32).floor() as i32;
                self.fetch(x, y)
            }
            Filter::Linear => {
                let st = uv / self.texel_size - 0.5;
                let ix = st.x.floor();
                let iy = st.y.floor();
                let fx = st.x - ix;
                let fy = st.y - iy;
                let (ix, iy) = (ix as i32, iy as i32);

                let a = self.fetch(ix, iy);
                let b = self.fetch(ix + 1, iy);
                let c = self.fetch(ix, iy + 1);
                let d = self.fetch(ix + 1, iy + 1);

                a.lerp(b, fx).lerp(c.lerp(d, fx), fy)
            }
        }
    }

    /// Evaluate `shader(x, y)` for every texel and write the result, rows in
    /// parallel. This is the execution model of every kernel.
    pub fn apply<F>(&mut self, shader: F)
    where
        F: Fn(usize, usize) -> Vec4 + Sync,
    {
        let width = self.width;
        let ch = self.format.channels();
        self.data
            .par_chunks_mut(width * ch)
            .enumerate()
            .for_each(|(y, row)| {
                for x in 0..width {
                    let value = shader(x, y).to_array();
                    row[x * ch..(x + 1) * ch].copy_from_slice(&value[..ch]);
                }
            });
    }
}

/// Two same-shaped fields with interchangeable read/write roles, selected by
/// a single bit. Swapping reassigns the roles; the fields themselves never
/// move or copy.
#[derive(Debug, Clone)]
pub struct DoubleBuffer {
    front: Field,
    back: Field,
    read_front: bool,
}

impl DoubleBuffer {
    pub fn allocate(
        what: &'static str,
        width: usize,
        height: usize,
        format: Format,
        filter: Filter,
    ) -> Result<Self, FluidError> {
        Ok(Self {
            front: Field::allocate(what, width, height, format, filter)?,
            back: Field::allocate(what, width, height, format, filter)?,
            read_front: true,
        })
    }

    pub fn read(&self) -> &Field {
        if self.read_front { &self.front } else { &self.back }
    }

    pub fn write(&self) -> &Field {
        if self.read_front { &self.back } else { &self.front }
    }

    /// Borrow the read field and the write field at once, for kernels that
    /// consume one while producing the other.
    pub fn pair(&mut self) -> (&Field, &mut Field) {
        if self.read_front {
            (&self.front, &mut self.back)
        } else {
            (&self.back, &mut self.front)
        }
    }

    pub fn write_mut(&mut self) -> &mut Field {
        if self.read_front { &mut self.back } else { &mut self.front }
    }

    pub fn swap(&mut self) {
        self.read_front = !self.read_front;
    }
}

/// Owns every grid buffer of the simulation, allocated once at startup.
/// Velocity, dye and pressure are double-buffered because each is both
/// consumed and produced within a frame; divergence and curl are scratch
/// outputs consumed read-only.
#[derive(Debug, Clone)]
pub struct FieldStore {
    pub velocity: DoubleBuffer,
    pub dye: DoubleBuffer,
    pub pressure: DoubleBuffer,
    pub divergence: Field,
    pub curl: Field,
}

impl FieldStore {
    pub fn allocate(
        config: &FluidConfig,
        output_width: u32,
        output_height: u32,
    ) -> Result<Self, FluidError> {
        let (sim_w, sim_h) =
            grid_resolution(config.sim_resolution, output_width, output_height);
        let (dye_w, dye_h) =
            grid_resolution(config.dye_resolution, output_width, output_height);

        Ok(Self {
            velocity: DoubleBuffer::allocate(
                "velocity", sim_w, sim_h, Format::Rg, Filter::Linear,
            )?,
            dye: DoubleBuffer::allocate("dye", dye_w, dye_h, Format::Rgba, Filter::Linear)?,
            pressure: DoubleBuffer::allocate(
                "pressure", sim_w, sim_h, Format::R, Filter::Nearest,
            )?,
            divergence: Field::allocate(
                "divergence", sim_w, sim_h, Format::R, Filter::Nearest,
            )?,
            curl: Field::allocate("curl", sim_w, sim_h, Format::R, Filter::Nearest)?,
        })
    }
}
