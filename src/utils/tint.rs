// SPDX-License-Identifier: GPL-3.0-only
// Copyright (C) 2025 Paul <abonnementspaul (at) gmail.com>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, version 3.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use crate::internal::icons::IconTinter;
use anyhow::{Context, Result, anyhow};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// Recolors an icon to the label color while keeping its shading and alpha.
pub struct ImageTinter;

impl IconTinter for ImageTinter {
    fn tint(&self, src: &Path, dst: &Path, color: &str) -> Result<()> {
        let color = parse_color(color)?;
        let mut img = image::open(src)
            .context(format!("Failed to open image {}", src.display()))?
            .to_rgba8();

        tint_image(&mut img, color);

        img.save_with_format(dst, image::ImageFormat::Png)
            .context(format!("Failed to save image {}", dst.display()))
    }
}

/// Accepts `0xRRGGBB`, `#RRGGBB` or `RRGGBB`.
pub fn parse_color(color: &str) -> Result<[u8; 3]> {
    let hex = color
        .trim()
        .trim_start_matches("0x")
        .trim_start_matches('#');
    if hex.len() != 6 {
        return Err(anyhow!("Invalid label color: {color}"));
    }

    let value = u32::from_str_radix(hex, 16).context(format!("Invalid label color: {color}"))?;
    Ok([(value >> 16) as u8, (value >> 8) as u8, value as u8])
}

/// Dark pixels go towards black, light ones towards white, mid-tones take
/// the label color.
pub fn tint_image(img: &mut RgbaImage, color: [u8; 3]) {
    for pixel in img.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let luminance = (0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32) / 255.0;
        let tinted = color.map(|c| {
            let c = c as f32;
            let v = if luminance < 0.5 {
                c * 2.0 * luminance
            } else {
                c + (255.0 - c) * (2.0 * luminance - 1.0)
            };
            v.round().clamp(0.0, 255.0) as u8
        });
        *pixel = Rgba([tinted[0], tinted[1], tinted[2], a]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_color() {
        assert_eq!(parse_color("0xcc0000").unwrap(), [0xcc, 0, 0]);
        assert_eq!(parse_color("#73d216").unwrap(), [0x73, 0xd2, 0x16]);
        assert!(parse_color("red").is_err());
    }

    #[test]
    fn test_tint_keeps_alpha_and_extremes() {
        let mut img = RgbaImage::from_pixel(2, 1, Rgba([0, 0, 0, 10]));
        img.put_pixel(1, 0, Rgba([255, 255, 255, 200]));
        tint_image(&mut img, [0xcc, 0, 0]);
        assert_eq!(*img.get_pixel(0, 0), Rgba([0, 0, 0, 10]));
        assert_eq!(*img.get_pixel(1, 0), Rgba([255, 255, 255, 200]));
    }

    #[test]
    fn test_tint_file() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src.png");
        let dst = dir.path().join("dst.png");
        RgbaImage::from_pixel(4, 4, Rgba([128, 128, 128, 255]))
            .save(&src)
            .unwrap();

        ImageTinter.tint(&src, &dst, "0x0000ff").unwrap();
        let out = image::open(&dst).unwrap().to_rgba8();
        let Rgba([r, g, b, a]) = *out.get_pixel(0, 0);
        assert_eq!(a, 255);
        assert!(r < 5 && g < 5);
        assert!(b > 200);
    }
}
