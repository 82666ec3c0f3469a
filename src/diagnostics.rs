use crate::field::{Field, FieldStore};

/// Per-frame numerical summary of the fields, for headless runs and tests.
#[derive(Debug, Clone)]
pub struct FieldMetrics {
    pub frame: usize,
    pub mean_abs_divergence: f32,
    pub max_velocity: f32,
    pub kinetic_energy: f32,
    pub total_dye: f32,
}

impl FieldMetrics {
    pub fn measure(fields: &FieldStore, frame: usize) -> Self {
        Self {
            frame,
            mean_abs_divergence: mean_abs_divergence(fields.velocity.read()),
            max_velocity: max_velocity(fields.velocity.read()),
            kinetic_energy: kinetic_energy(fields.velocity.read()),
            total_dye: total_dye(fields.dye.read()),
        }
    }

    pub fn print_summary(&self) {
        println!("frame {} metrics:", self.frame);
        println!("  mean |divergence|: {:.6}", self.mean_abs_divergence);
        println!("  max velocity:      {:.6}", self.max_velocity);
        println!("  kinetic energy:    {:.6}", self.kinetic_energy);
        println!("  total dye:         {:.6}", self.total_dye);
    }
}

/// Mean absolute divergence, using the same solid-wall discretization as the
/// divergence kernel so the figure matches what the pressure solve sees.
pub fn mean_abs_divergence(velocity: &Field) -> f32 {
    let (w, h) = (velocity.width(), velocity.height());
    let mut total = 0.0;
    for y in 0..h {
        for x in 0..w {
            let (xi, yi) = (x as i32, y as i32);
            let c = velocity.fetch(xi, yi);
            let l = if x == 0 { -c.x } else { velocity.fetch(xi - 1, yi).x };
            let r = if x == w - 1 { -c.x } else { velocity.fetch(xi + 1, yi).x };
            let t = if y == h - 1 { -c.y } else { velocity.fetch(xi, yi + 1).y };
            let b = if y == 0 { -c.y } else { velocity.fetch(xi, yi - 1).y };
            total += (0.5 * (r - l + t - b)).abs();
        }
    }
    total / (w * h) as f32
}

fn max_velocity(velocity: &Field) -> f32 {
    let (w, h) = (velocity.width(), velocity.height());
    let mut max = 0.0f32;
    for y in 0..h {
        for x in 0..w {
            let v = velocity.fetch(x as i32, y as i32);
            max = max.max((v.x * v.x + v.y * v.y).sqrt());
        }
    }
    max
}

fn kinetic_energy(velocity: &Field) -> f32 {
    let (w, h) = (velocity.width(), velocity.height());
    let mut total = 0.0;
    for y in 0..h {
        for x in 0..w {
            let v = velocity.fetch(x as i32, y as i32);
            total += 0.5 * (v.x * v.x + v.y * v.y);
        }
    }
    total
}

fn total_dye(dye: &Field) -> f32 {
    let (w, h) = (dye.width(), dye.height());
    let mut total = 0.0;
    for y in 0..h {
        for x in 0..w {
            let c = dye.fetch(x as i32, y as i32);
            total += c.x + c.y + c.z;
        }
    }
    total
}
