/// Derive grid dimensions from a quality knob and the actual output size.
/// The shorter axis gets `quality` texels, the longer axis gets
/// `round(quality * aspect)`, with the longer length assigned to whichever
/// output axis is larger. Memory use is bounded by the quality knob while the
/// grid keeps the output's aspect.
pub fn grid_resolution(quality: u32, output_width: u32, output_height: u32) -> (usize, usize) {
    let mut aspect = output_width as f32 / output_height as f32;
    if aspect < 1.0 {
        aspect = 1.0 / aspect;
    }

    let min = quality as usize;
    let max = (quality as f32 * aspect).round() as usize;

    if output_width > output_height {
        (max, min)
    } else {
        (min, max)
    }
}
