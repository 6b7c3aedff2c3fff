use std::ops;

/// Linear rgb color with unbounded f32 channels, 1.0 being full intensity.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorRGB {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl ColorRGB {
    pub const BLACK: ColorRGB = ColorRGB { r: 0.0, g: 0.0, b: 0.0 };
    pub const WHITE: ColorRGB = ColorRGB { r: 1.0, g: 1.0, b: 1.0 };
    pub const RED:   ColorRGB = ColorRGB { r: 1.0, g: 0.0, b: 0.0 };
    pub const GREEN: ColorRGB = ColorRGB { r: 0.0, g: 1.0, b: 0.0 };
    pub const BLUE:  ColorRGB = ColorRGB { r: 0.0, g: 0.0, b: 1.0 };

    pub const fn new(r: f32, g: f32, b: f32) -> ColorRGB {
        return ColorRGB { r, g, b };
    }

    /// Color from 8 bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> ColorRGB {
        return ColorRGB {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
        };
    }

    /// Brings the color into displayable range without changing its hue.
    /// If the biggest channel is above 1.0 all channels are divided by it, otherwise
    /// the color is left untouched.
    pub fn max_to_one(self) -> ColorRGB {
        let max_channel = self.r.max(self.g).max(self.b);
        if max_channel > 1.0 {
            return self * (1.0 / max_channel);
        }
        return self;
    }

    /// Packs the color into the pixel buffer format - 0x00RRGGBB.
    /// Channels are rounded to the nearest u8 so interpolation error doesn't knock 1.0 down to 254.
    /// Values outside of [0.0, 1.0] saturate.
    pub fn to_packed(self) -> u32 {
        let r = (self.r * 255.0).round() as u8;
        let g = (self.g * 255.0).round() as u8;
        let b = (self.b * 255.0).round() as u8;
        return ((r as u32) << 16) | ((g as u32) << 8) | (b as u32);
    }

    /// Splits a packed pixel into its 8 bit channels.
    pub fn unpack_rgb8(packed: u32) -> [u8; 3] {
        return [(packed >> 16) as u8, (packed >> 8) as u8, packed as u8];
    }
}

impl ops::Add<ColorRGB> for ColorRGB {
    type Output = ColorRGB;

    fn add(self, rhs: ColorRGB) -> ColorRGB {
        return ColorRGB {
            r: self.r + rhs.r,
            g: self.g + rhs.g,
            b: self.b + rhs.b,
        };
    }
}

impl ops::Mul<f32> for ColorRGB {
    type Output = ColorRGB;

    fn mul(self, rhs: f32) -> ColorRGB {
        return ColorRGB {
            r: self.r * rhs,
            g: self.g * rhs,
            b: self.b * rhs,
        };
    }
}
