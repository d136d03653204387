use crate::grid::Grid;
use glam::{Vec2, Vec4Swizzles};
use image::{ImageBuffer, Rgb, RgbImage, Rgba, RgbaImage};

/// Maps simulation fields to displayable pixels
pub struct Renderer {
    width: u32,
    height: u32,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Field coordinates of the center of pixel `(x, y)`
    fn field_position(&self, field: &Grid, x: u32, y: u32) -> Vec2 {
        let pixel = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
        let scale = field.size().as_vec2() / Vec2::new(self.width as f32, self.height as f32);
        pixel * scale - 0.5
    }

    /// Dye colors, bilinearly upscaled; alpha is the brightest channel so
    /// that empty regions stay transparent
    pub fn render_dye(&self, dye: &Grid) -> RgbaImage {
        let mut img = ImageBuffer::new(self.width, self.height);

        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let color = dye
                .sample_bilinear(self.field_position(dye, x, y))
                .xyz()
                .clamp(glam::Vec3::ZERO, glam::Vec3::ONE);
            let alpha = color.max_element();
            let [r, g, b] = (color * 255.0).to_array().map(|c| c as u8);
            *pixel = Rgba([r, g, b, (alpha * 255.0) as u8]);
        }

        img
    }

    /// Velocity false colors: red for |vx|, green for |vy|, relative to `max_speed`
    pub fn render_velocity(&self, velocity: &Grid, max_speed: f32) -> RgbImage {
        let mut img = ImageBuffer::new(self.width, self.height);
        let scale = if max_speed > 0.0 { 255.0 / max_speed } else { 0.0 };

        for (x, y, pixel) in img.enumerate_pixels_mut() {
            let v = velocity.sample_bilinear(self.field_position(velocity, x, y));
            let r = (v.x.abs() * scale).min(255.0) as u8;
            let g = (v.y.abs() * scale).min(255.0) as u8;
            *pixel = Rgb([r, g, 128]);
        }

        img
    }
}
