use image::{Rgb, RgbImage};
use ndarray::ArrayView2;
use palette::{Lch, Srgb};
use slm_hologram::beams::{gaussian, lg};
use slm_hologram::preview::{far_field, first_order_offset};
use slm_hologram::sink::{HologramSink, PngSink};
use slm_hologram::{
    generate_hologram, GridParameters, HologramParameters, HologramSource, Method, Targets,
};
use slm_hologram::grid::{build_grid, GridSource};
use std::time::Duration;

/// Encodes an LG(0, 1) vortex for a 1920x1080 display, saves the mask and a simulated far field for each method.
pub fn main() -> Result<(), Box<dyn std::error::Error>> {
    let display = GridParameters {
        width: 15.36,
        height: 8.64,
        res_x: 1920,
        res_y: 1080,
    };
    let grid = build_grid(GridSource::Raw(display), 1, true)?;

    let incoming = gaussian(&grid, 3.3);
    let desired = lg(&grid, 0.5, 0, 1);

    let mut sink = PngSink::new(".", "vortex").with_resolution(display.res_y, display.res_x);
    for &method in Method::ALL.iter() {
        let params = HologramParameters::new(96.0, (4.0, 5.0), method);
        let hologram = generate_hologram(
            Targets::Single(desired.view()),
            HologramSource::Raw {
                incoming: incoming.view(),
                grid: &grid,
                params,
            },
        )?;
        println!("{} -> {:?}", method, sink.next_path());
        sink.display(hologram.view(), Some(Duration::from_millis(150)))?;

        let far = far_field(hologram.view(), incoming.view(), params.max_modulation)?;
        let intensity = far.map(|e| e.norm_sqr());
        let (dy, dx) = first_order_offset(grid.shape(), params.period);
        println!("first order expected {:.1} rows, {:.1} columns from the centre", dy, dx);
        save_real_image(
            format!("vortex_far_field_{}.png", method),
            log_intensity(intensity.view(), 1e-8).view(),
        )?;
    }
    Ok(())
}

pub fn log_intensity(arr: ArrayView2<f64>, min: f64) -> ndarray::Array2<f64> {
    let log_min = -min.ln();
    let max = arr.iter().fold(0.0, |max, e| e.max(max));
    arr.map(|e| ((e / max).ln() / log_min + 1.0).max(0.0).min(1.0))
}

pub fn save_real_image<T: AsRef<std::path::Path> + std::fmt::Debug>(
    file_name: T,
    arr: ArrayView2<f64>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let &[h, w, ..] = arr.shape() {
        let mut img = RgbImage::new(w as u32, h as u32);
        for (x, y, p) in img.enumerate_pixels_mut() {
            let value = arr[[y as usize, x as usize]].min(1.0);
            let colour = Srgb::from(Lch::new(value * 70.0, value * 128.0, 280.0 - 245.0 * value));
            *p = Rgb([
                (colour.red * 255.0) as u8,
                (colour.green * 255.0) as u8,
                (colour.blue * 255.0) as u8,
            ]);
        }
        img.save(&file_name)?;
        println!("h:{} w:{} - {:?}", h, w, file_name);
    }
    Ok(())
}
