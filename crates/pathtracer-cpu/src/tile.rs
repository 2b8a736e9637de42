//! Per-pixel sample statistics and the tile decomposition workers pull
//! pixels from. Pixels are independent of each other; each one serializes
//! its own accumulator behind a mutex so any worker may finish a sample for
//! it.

use std::sync::Mutex;

use pathtracer::geometry::Vec3;

/// Samples below this count always get priority.
const MIN_SAMPLES: u32 = 4;
/// After this many samples, a pixel whose variance fell under
/// `CONVERGED_VARIANCE` is considered done.
const CONVERGED_AFTER: u32 = 32;
const CONVERGED_VARIANCE: f32 = 0.001;

#[derive(Debug, Default)]
struct PixelState {
    sum: Vec3,
    samples: u32,

    // online mean/variance of sample luminance (Welford)
    mean: f32,
    m2: f32,
}

#[derive(Debug)]
pub struct Pixel {
    pub x: u32,
    pub y: u32,
    state: Mutex<PixelState>,
}

fn luminance(color: Vec3) -> f32 {
    0.2126 * color.0 + 0.7152 * color.1 + 0.0722 * color.2
}

impl Pixel {
    fn new(x: u32, y: u32) -> Pixel {
        Pixel {
            x,
            y,
            state: Mutex::new(PixelState::default()),
        }
    }

    pub fn add_sample(&self, color: Vec3) {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        state.sum += color;
        state.samples += 1;

        let value = luminance(color);
        let delta = value - state.mean;
        state.mean += delta / state.samples as f32;
        state.m2 += delta * (value - state.mean);
    }

    /// (sample count, luminance variance); variance is zero until two
    /// samples exist.
    pub fn statistics(&self) -> (u32, f32) {
        let state = self.state.lock().unwrap();
        if state.samples < 2 {
            (state.samples, 0.0)
        } else {
            (state.samples, state.m2 / (state.samples - 1) as f32)
        }
    }

    /// Mean color over all accumulated samples.
    pub fn average(&self) -> Vec3 {
        let state = self.state.lock().unwrap();
        if state.samples == 0 {
            Vec3::zero()
        } else {
            state.sum / state.samples as f32
        }
    }
}

#[derive(Debug)]
pub struct Framebuffer {
    pub width: usize,
    pub height: usize,
    pixels: Vec<Pixel>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Framebuffer {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(Pixel::new(x as u32, y as u32));
            }
        }
        Framebuffer {
            width,
            height,
            pixels,
        }
    }

    pub fn pixel(&self, index: u32) -> &Pixel {
        &self.pixels[index as usize]
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    /// Splits the framebuffer into `count` horizontal bands, one per worker.
    pub fn tiles(&self, count: usize) -> Vec<Tile> {
        let count = count.max(1).min(self.height.max(1));
        let mut tiles = Vec::with_capacity(count);
        for band in 0..count {
            let y_start = band * self.height / count;
            let y_end = (band + 1) * self.height / count;
            let mut indices = Vec::with_capacity((y_end - y_start) * self.width);
            for y in y_start..y_end {
                for x in 0..self.width {
                    indices.push((y * self.width + x) as u32);
                }
            }
            tiles.push(Tile { indices });
        }
        tiles
    }
}

/// The set of pixels one worker owns.
#[derive(Debug)]
pub struct Tile {
    indices: Vec<u32>,
}

impl Tile {
    /// The pixel most worth another round of samples: anything starved of
    /// its first few samples wins outright, converged pixels are skipped,
    /// and the rest rank by variance discounted by how much attention they
    /// already got. `None` once every pixel is converged or fully sampled.
    pub fn noisiest_pixel(&self, framebuffer: &Framebuffer, max_samples: u32) -> Option<u32> {
        let mut best: Option<u32> = None;
        let mut best_priority = -1.0f32;

        for &index in &self.indices {
            let (samples, variance) = framebuffer.pixel(index).statistics();
            if samples >= max_samples {
                continue;
            }
            if samples < MIN_SAMPLES {
                return Some(index);
            }
            if samples > CONVERGED_AFTER && variance < CONVERGED_VARIANCE {
                continue;
            }

            let priority = variance / (samples as f32).sqrt();
            if priority > best_priority {
                best = Some(index);
                best_priority = priority;
            }
        }

        best
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welford_matches_direct_variance() {
        let pixel = Pixel::new(0, 0);
        let values = [0.5f32, 1.5, 0.25, 2.0, 0.75];
        for &v in &values {
            pixel.add_sample(Vec3(v, v, v));
        }

        let mean: f32 = values.iter().sum::<f32>() / values.len() as f32;
        let direct: f32 = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f32>()
            / (values.len() - 1) as f32;

        let (samples, variance) = pixel.statistics();
        assert_eq!(samples, values.len() as u32);
        // luminance of a grey sample is the sample value itself
        assert!((variance - direct).abs() < 1e-4);
    }

    #[test]
    fn average_is_channelwise_mean() {
        let pixel = Pixel::new(0, 0);
        pixel.add_sample(Vec3(1.0, 0.0, 0.0));
        pixel.add_sample(Vec3(0.0, 1.0, 0.0));
        assert_eq!(pixel.average(), Vec3(0.5, 0.5, 0.0));
    }

    #[test]
    fn tiles_cover_every_pixel_once() {
        let framebuffer = Framebuffer::new(7, 5);
        let tiles = framebuffer.tiles(3);
        let mut covered: Vec<u32> = tiles.iter().flat_map(|t| t.indices.clone()).collect();
        covered.sort_unstable();
        let expected: Vec<u32> = (0..35).collect();
        assert_eq!(covered, expected);
    }

    #[test]
    fn starved_pixels_win_selection() {
        let framebuffer = Framebuffer::new(2, 1);
        let tiles = framebuffer.tiles(1);
        // give pixel 0 plenty of noisy samples, leave pixel 1 empty
        for i in 0..16 {
            framebuffer.pixel(0).add_sample(Vec3(i as f32, 0.0, 0.0));
        }
        assert_eq!(tiles[0].noisiest_pixel(&framebuffer, 1024), Some(1));
    }

    #[test]
    fn fully_sampled_tile_yields_nothing() {
        let framebuffer = Framebuffer::new(2, 1);
        let tiles = framebuffer.tiles(1);
        for index in 0..2 {
            for _ in 0..8 {
                framebuffer.pixel(index).add_sample(Vec3::one());
            }
        }
        assert_eq!(tiles[0].noisiest_pixel(&framebuffer, 8), None);
    }

    #[test]
    fn noisier_pixel_outranks_quiet_one() {
        let framebuffer = Framebuffer::new(2, 1);
        let tiles = framebuffer.tiles(1);
        for i in 0..8 {
            // pixel 0 alternates wildly, pixel 1 is steady
            let v = if i % 2 == 0 { 0.0 } else { 8.0 };
            framebuffer.pixel(0).add_sample(Vec3(v, v, v));
            framebuffer.pixel(1).add_sample(Vec3(0.5, 0.5, 0.5));
        }
        assert_eq!(tiles[0].noisiest_pixel(&framebuffer, 1024), Some(0));
    }
}
