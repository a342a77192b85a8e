use crate::error::{incompatible_shape, Result};
use image::GrayImage;
use log::{debug, trace};
use ndarray::{Array2, ArrayView2};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Anything that accepts finished holograms, e.g. an SLM window or a file writer.
pub trait HologramSink {
    /// Shows `hologram`. `hold` is how long the caller would like it to stay up before the next one.
    fn display(&mut self, hologram: ArrayView2<u8>, hold: Option<Duration>) -> Result<()>;
}

fn check_resolution(expected: Option<(usize, usize)>, hologram: &ArrayView2<u8>) -> Result<()> {
    match expected {
        Some((h, w)) if hologram.shape() != [h, w] => Err(incompatible_shape()),
        _ => Ok(()),
    }
}

/// Writes every hologram to a numbered 8-bit grayscale PNG.
#[derive(Debug)]
pub struct PngSink {
    dir: PathBuf,
    prefix: String,
    resolution: Option<(usize, usize)>,
    count: usize,
}

impl PngSink {
    pub fn new<P: AsRef<Path>>(dir: P, prefix: &str) -> Self {
        PngSink {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.to_string(),
            resolution: None,
            count: 0,
        }
    }

    /// Only accept holograms of `(rows, columns)`, like a physical display would.
    pub fn with_resolution(mut self, rows: usize, columns: usize) -> Self {
        self.resolution = Some((rows, columns));
        self
    }

    /// Path the next hologram will be written to.
    pub fn next_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}_{:04}.png", self.prefix, self.count))
    }
}

impl HologramSink for PngSink {
    fn display(&mut self, hologram: ArrayView2<u8>, hold: Option<Duration>) -> Result<()> {
        check_resolution(self.resolution, &hologram)?;
        let (h, w) = (hologram.shape()[0], hologram.shape()[1]);
        let img = GrayImage::from_raw(w as u32, h as u32, hologram.iter().copied().collect())
            .ok_or_else(incompatible_shape)?;
        let path = self.next_path();
        img.save(&path)?;
        debug!("wrote {}x{} hologram to {:?}", w, h, path);
        if let Some(hold) = hold {
            trace!("ignoring hold time of {:?} for file output", hold);
        }
        self.count += 1;
        Ok(())
    }
}

/// Keeps the most recent hologram in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub last: Option<Array2<u8>>,
    pub last_hold: Option<Duration>,
    pub frames: usize,
    resolution: Option<(usize, usize)>,
}

impl MemorySink {
    pub fn with_resolution(rows: usize, columns: usize) -> Self {
        MemorySink {
            resolution: Some((rows, columns)),
            ..Default::default()
        }
    }
}

impl HologramSink for MemorySink {
    fn display(&mut self, hologram: ArrayView2<u8>, hold: Option<Duration>) -> Result<()> {
        check_resolution(self.resolution, &hologram)?;
        self.last = Some(hologram.to_owned());
        self.last_hold = hold;
        self.frames += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HologramError;
    use ndarray::array;

    #[test]
    fn memory_sink_keeps_last_frame() {
        let mut sink = MemorySink::default();
        sink.display(array![[1u8, 2], [3, 4]].view(), None).unwrap();
        sink.display(array![[5u8, 6], [7, 8]].view(), Some(Duration::from_millis(150)))
            .unwrap();
        assert_eq!(sink.frames, 2);
        assert_eq!(sink.last, Some(array![[5u8, 6], [7, 8]]));
        assert_eq!(sink.last_hold, Some(Duration::from_millis(150)));
    }

    #[test]
    fn fixed_resolution_rejects_other_shapes() {
        let mut sink = MemorySink::with_resolution(2, 3);
        let result = sink.display(array![[1u8, 2], [3, 4]].view(), None);
        assert!(matches!(result, Err(HologramError::Shape(_))));
        assert_eq!(sink.frames, 0);
    }

    #[test]
    fn png_round_trip() {
        let dir = std::env::temp_dir().join(format!("slm_hologram_sink_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let mut sink = PngSink::new(&dir, "holo").with_resolution(2, 3);
        let path = sink.next_path();
        let hologram = array![[0u8, 10, 20], [30, 40, 255]];
        sink.display(hologram.view(), None).unwrap();

        let img = image::open(&path).unwrap().to_luma8();
        assert_eq!(img.dimensions(), (3, 2));
        assert_eq!(img.get_pixel(2, 1).0, [255]);
        assert_eq!(img.get_pixel(1, 0).0, [10]);
        assert_eq!(sink.next_path(), dir.join("holo_0001.png"));
        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn png_write_failure_is_an_image_error() {
        let mut sink = PngSink::new("/definitely/not/here", "holo");
        let result = sink.display(array![[1u8, 2], [3, 4]].view(), None);
        assert!(matches!(result, Err(HologramError::Image(_))));
        assert_eq!(sink.next_path(), Path::new("/definitely/not/here/holo_0000.png"));
    }
}
