//! The numerical operators of the solver. Each kernel is a pure grid-to-grid
//! transform: it reads one or more input fields and writes every texel of a
//! target field, rows in parallel. Neighbor access uses one-texel offsets
//! with clamp-to-edge semantics unless noted.

use glam::{Vec2, Vec3, Vec4};
use rayon::prelude::*;

use crate::error::FluidError;
use crate::field::Field;

/// Velocity components are clamped to this magnitude after vorticity
/// confinement to keep the solver from blowing up.
pub const VELOCITY_CLAMP: f32 = 1000.0;

const VORTICITY_EPSILON: f32 = 1e-4;

fn check_shape(
    kernel: &'static str,
    target: &Field,
    input: &Field,
    name: &'static str,
) -> Result<(), FluidError> {
    if target.same_shape(input) {
        Ok(())
    } else {
        Err(FluidError::kernel(
            kernel,
            format!(
                "{name} is {}x{} but target is {}x{}",
                input.width(),
                input.height(),
                target.width(),
                target.height()
            ),
        ))
    }
}

/// Scalar curl of the velocity field:
/// `0.5 * ((R.y - L.y) - (T.x - B.x))`.
pub fn curl(velocity: &Field, target: &mut Field) -> Result<(), FluidError> {
    check_shape("curl", target, velocity, "velocity")?;

    target.apply(|x, y| {
        let (x, y) = (x as i32, y as i32);
        let l = velocity.fetch(x - 1, y).y;
        let r = velocity.fetch(x + 1, y).y;
        let t = velocity.fetch(x, y + 1).x;
        let b = velocity.fetch(x, y - 1).x;
        Vec4::new(0.5 * (r - l - t + b), 0.0, 0.0, 1.0)
    });
    Ok(())
}

/// Push velocity along the gradient of |curl| to reinforce rotational motion
/// lost to grid advection. The force is normalized (with a small epsilon to
/// avoid division by zero), scaled by `curl_strength` and the local curl, and
/// the result is clamped to `±VELOCITY_CLAMP` per component.
pub fn vorticity(
    velocity: &Field,
    curl: &Field,
    curl_strength: f32,
    dt: f32,
    target: &mut Field,
) -> Result<(), FluidError> {
    check_shape("vorticity", target, velocity, "velocity")?;
    check_shape("vorticity", target, curl, "curl")?;

    target.apply(|x, y| {
        let (x, y) = (x as i32, y as i32);
        let l = curl.fetch(x - 1, y).x;
        let r = curl.fetch(x + 1, y).x;
        let t = curl.fetch(x, y + 1).x;
        let b = curl.fetch(x, y - 1).x;
        let c = curl.fetch(x, y).x;

        let mut force = 0.5 * Vec2::new(t.abs() - b.abs(), r.abs() - l.abs());
        force /= force.length() + VORTICITY_EPSILON;
        force *= curl_strength * c;
        // Screen-space convention: y points down.
        force.y *= -1.0;

        let velocity = velocity.fetch(x, y).truncate().truncate() + force * dt;
        let velocity = velocity.clamp(
            Vec2::splat(-VELOCITY_CLAMP),
            Vec2::splat(VELOCITY_CLAMP),
        );
        Vec4::new(velocity.x, velocity.y, 0.0, 1.0)
    });
    Ok(())
}

/// Central-difference divergence of the velocity field with solid-wall
/// boundaries: a neighbor that would fall outside the grid reflects the
/// center velocity component instead (no-penetration walls).
pub fn divergence(velocity: &Field, target: &mut Field) -> Result<(), FluidError> {
    check_shape("divergence", target, velocity, "velocity")?;

    let (w, h) = (target.width(), target.height());
    target.apply(|x, y| {
        let (xi, yi) = (x as i32, y as i32);
        let c = velocity.fetch(xi, yi);
        let mut l = velocity.fetch(xi - 1, yi).x;
        let mut r = velocity.fetch(xi + 1, yi).x;
        let mut t = velocity.fetch(xi, yi + 1).y;
        let mut b = velocity.fetch(xi, yi - 1).y;

        if x == 0 {
            l = -c.x;
        }
        if x == w - 1 {
            r = -c.x;
        }
        if y == h - 1 {
            t = -c.y;
        }
        if y == 0 {
            b = -c.y;
        }

        Vec4::new(0.5 * (r - l + t - b), 0.0, 0.0, 1.0)
    });
    Ok(())
}

/// Damp the pressure field by a constant weight. Applied once per frame
/// before relaxation so stale pressure does not accumulate across frames.
pub fn pressure_clear(pressure: &Field, value: f32, target: &mut Field) -> Result<(), FluidError> {
    check_shape("clear", target, pressure, "pressure")?;

    target.apply(|x, y| value * pressure.fetch(x as i32, y as i32));
    Ok(())
}

/// One Jacobi relaxation sweep of the discrete Poisson equation
/// `∇²p = div`: `p' = (L + R + B + T - div) / 4`.
pub fn pressure_jacobi(
    pressure: &Field,
    divergence: &Field,
    target: &mut Field,
) -> Result<(), FluidError> {
    check_shape("pressure", target, pressure, "pressure")?;
    check_shape("pressure", target, divergence, "divergence")?;

    target.apply(|x, y| {
        let (x, y) = (x as i32, y as i32);
        let l = pressure.fetch(x - 1, y).x;
        let r = pressure.fetch(x + 1, y).x;
        let t = pressure.fetch(x, y + 1).x;
        let b = pressure.fetch(x, y - 1).x;
        let div = divergence.fetch(x, y).x;
        Vec4::new((l + r + b + t - div) * 0.25, 0.0, 0.0, 1.0)
    });
    Ok(())
}

/// Subtract the pressure gradient from velocity, removing the divergent
/// component found by the relaxation sweeps. The gradient carries the same
/// half-spacing factor as the divergence stencil; without it the correction
/// overshoots and a well-converged solve re-divergences the field.
pub fn gradient_subtract(
    pressure: &Field,
    velocity: &Field,
    target: &mut Field,
) -> Result<(), FluidError> {
    check_shape("gradient_subtract", target, pressure, "pressure")?;
    check_shape("gradient_subtract", target, velocity, "velocity")?;

    target.apply(|x, y| {
        let (x, y) = (x as i32, y as i32);
        let l = pressure.fetch(x - 1, y).x;
        let r = pressure.fetch(x + 1, y).x;
        let t = pressure.fetch(x, y + 1).x;
        let b = pressure.fetch(x, y - 1).x;
        let velocity =
            velocity.fetch(x, y).truncate().truncate() - 0.5 * Vec2::new(r - l, t - b);
        Vec4::new(velocity.x, velocity.y, 0.0, 1.0)
    });
    Ok(())
}

/// Semi-Lagrangian advection: backtrace each texel through the velocity
/// field, sample `source` bilinearly at the traced position, and apply
/// exponential dissipation `1 / (1 + dissipation * dt)`.
///
/// `source` may live on a different grid than `velocity` (dye vs. sim);
/// the backtrace happens in normalized coordinates so the grids compose.
pub fn advect(
    velocity: &Field,
    source: &Field,
    dt: f32,
    dissipation: f32,
    target: &mut Field,
) -> Result<(), FluidError> {
    check_shape("advect", target, source, "source")?;

    let texel = target.texel_size();
    let velocity_texel = velocity.texel_size();
    let decay = 1.0 + dissipation * dt;

    target.apply(|x, y| {
        let uv = Vec2::new(
            (x as f32 + 0.5) * texel.x,
            (y as f32 + 0.5) * texel.y,
        );
        let v = velocity.sample(uv).truncate().truncate();
        let coord = uv - dt * v * velocity_texel;
        source.sample(coord) / decay
    });
    Ok(())
}

/// Add a Gaussian impulse `exp(-|p|² / radius) * value` onto `base` at
/// `point`, with the x offset pre-scaled by the output aspect ratio so the
/// splat stays circular on screen.
pub fn splat(
    base: &Field,
    point: Vec2,
    value: Vec3,
    radius: f32,
    aspect_ratio: f32,
    target: &mut Field,
) -> Result<(), FluidError> {
    check_shape("splat", target, base, "base")?;

    let texel = target.texel_size();
    target.apply(|x, y| {
        let uv = Vec2::new(
            (x as f32 + 0.5) * texel.x,
            (y as f32 + 0.5) * texel.y,
        );
        let mut p = uv - point;
        p.x *= aspect_ratio;
        let gauss = (-p.dot(p) / radius).exp();
        let out = base.fetch(x as i32, y as i32).truncate() + gauss * value;
        Vec4::new(out.x, out.y, out.z, 1.0)
    });
    Ok(())
}

/// Map the dye field to display pixels: RGB straight from the dye, alpha =
/// max(R, G, B). The optional shading term darkens texels facing away from a
/// fixed light, from the luminance gradient of the four neighbors. Rows are
/// flipped so the UV origin (bottom-left) lands at the image origin
/// (top-left).
pub fn compose(dye: &Field, shading: bool, pixels: &mut [u8]) -> Result<(), FluidError> {
    let (w, h) = (dye.width(), dye.height());
    if pixels.len() != w * h * 4 {
        return Err(FluidError::kernel(
            "compose",
            format!("pixel buffer is {} bytes, expected {}", pixels.len(), w * h * 4),
        ));
    }

    let texel_len = dye.texel_size().length();
    pixels
        .par_chunks_mut(w * 4)
        .enumerate()
        .for_each(|(row, out)| {
            let y = (h - 1 - row) as i32;
            for x in 0..w {
                let xi = x as i32;
                let mut c = dye.fetch(xi, y).truncate();

                if shading {
                    let lc = dye.fetch(xi - 1, y).truncate().length();
                    let rc = dye.fetch(xi + 1, y).truncate().length();
                    let tc = dye.fetch(xi, y + 1).truncate().length();
                    let bc = dye.fetch(xi, y - 1).truncate().length();
                    let n = Vec3::new(rc - lc, tc - bc, texel_len).normalize();
                    let diffuse = (n.z + 0.7).clamp(0.7, 1.0);
                    c *= diffuse;
                }

                let a = c.x.max(c.y).max(c.z);
                out[x * 4] = to_u8(c.x);
                out[x * 4 + 1] = to_u8(c.y);
                out[x * 4 + 2] = to_u8(c.z);
                out[x * 4 + 3] = to_u8(a);
            }
        });
    Ok(())
}

fn to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0) as u8
}
