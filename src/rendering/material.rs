/// Linear RGB colour, each channel in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub fn from_hex(hex: u32) -> Self {
        Self {
            r: ((hex >> 16) & 0xff) as f32 / 255.0,
            g: ((hex >> 8) & 0xff) as f32 / 255.0,
            b: (hex & 0xff) as f32 / 255.0,
        }
    }

    pub fn to_hex(&self) -> u32 {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u32;
        (channel(self.r) << 16) | (channel(self.g) << 8) | channel(self.b)
    }

    pub fn to_array(&self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }

    pub fn to_rgba8(&self, alpha: f32) -> [u8; 4] {
        let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [channel(self.r), channel(self.g), channel(self.b), channel(alpha)]
    }
}

/// Diffuse (Lambert) surface description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub color: Color,
    pub opacity: f32,
    pub transparent: bool,
}

impl Material {
    pub fn lambert(hex: u32) -> Self {
        Self {
            color: Color::from_hex(hex),
            opacity: 1.0,
            transparent: false,
        }
    }

    pub fn translucent(hex: u32, opacity: f32) -> Self {
        Self {
            color: Color::from_hex(hex),
            opacity: opacity.clamp(0.0, 1.0),
            transparent: true,
        }
    }

    pub fn rgba(&self) -> [f32; 4] {
        [self.color.r, self.color.g, self.color.b, self.opacity]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_round_trip() {
        for hex in [0x4f46e5, 0x059669, 0xfdbcbc, 0x000000, 0xffffff] {
            assert_eq!(Color::from_hex(hex).to_hex(), hex);
        }
    }

    #[test]
    fn test_translucent_clamps_opacity() {
        let m = Material::translucent(0x111827, 1.5);
        assert!(m.transparent);
        assert_eq!(m.opacity, 1.0);
    }
}
