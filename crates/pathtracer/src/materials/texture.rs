//! Lookup into decoded images with wrapping UV coordinates. Filtering is
//! nearest-texel; color data goes through the sRGB transfer at the call site
//! that needs linear values.

use image::RgbaImage;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgba(pub f32, pub f32, pub f32, pub f32);

impl Rgba {
    pub fn r(&self) -> f32 {
        self.0
    }

    pub fn g(&self) -> f32 {
        self.1
    }

    pub fn b(&self) -> f32 {
        self.2
    }

    pub fn a(&self) -> f32 {
        self.3
    }
}

fn wrap(coordinate: f32) -> f32 {
    let wrapped = coordinate - coordinate.floor();
    // 1.0 - epsilon can survive the floor subtraction; the index clamp below
    // still needs a value strictly inside [0, 1)
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

/// Sample an image at normalized, wrapping UV coordinates. Components are
/// returned in [0, 1] without any transfer applied.
pub fn sample_nearest(image: &RgbaImage, u: f32, v: f32) -> Rgba {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Rgba::default();
    }

    let x = (wrap(u) * width as f32) as u32;
    let y = (wrap(v) * height as f32) as u32;
    let pixel = image.get_pixel(x.min(width - 1), y.min(height - 1));

    Rgba(
        pixel.0[0] as f32 / 255.0,
        pixel.0[1] as f32 / 255.0,
        pixel.0[2] as f32 / 255.0,
        pixel.0[3] as f32 / 255.0,
    )
}

/// sRGB electro-optical transfer, one channel.
pub fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker_2x2() -> RgbaImage {
        let mut image = RgbaImage::new(2, 2);
        image.put_pixel(0, 0, image::Rgba([255, 0, 0, 255]));
        image.put_pixel(1, 0, image::Rgba([0, 255, 0, 255]));
        image.put_pixel(0, 1, image::Rgba([0, 0, 255, 255]));
        image.put_pixel(1, 1, image::Rgba([255, 255, 255, 255]));
        image
    }

    #[test]
    fn nearest_lookup_picks_texel() {
        let image = checker_2x2();
        assert_eq!(sample_nearest(&image, 0.25, 0.25), Rgba(1.0, 0.0, 0.0, 1.0));
        assert_eq!(sample_nearest(&image, 0.75, 0.25), Rgba(0.0, 1.0, 0.0, 1.0));
        assert_eq!(sample_nearest(&image, 0.25, 0.75), Rgba(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    fn coordinates_wrap_in_both_directions() {
        let image = checker_2x2();
        let inside = sample_nearest(&image, 0.25, 0.25);
        assert_eq!(sample_nearest(&image, 1.25, 0.25), inside);
        assert_eq!(sample_nearest(&image, -0.75, 2.25), inside);
    }

    #[test]
    fn srgb_endpoints_are_fixed() {
        assert_eq!(srgb_to_linear(0.0), 0.0);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-6);
        // mid grey lands well below the encoded value
        assert!(srgb_to_linear(0.5) < 0.25);
    }
}
