use std::path::Path;

use anyhow::{Context, Result, bail};
use image::{GrayImage, Luma, Rgb};

pub const SSIM_WINDOW: usize = 7;

const K1: f64 = 0.01;
const K2: f64 = 0.03;
const DATA_RANGE: f64 = 255.0;

// BT.601 luma weights in 14-bit fixed point.
const LUMA_SHIFT: u32 = 14;
const LUMA_R: u32 = 4899;
const LUMA_G: u32 = 9617;
const LUMA_B: u32 = 1868;

/// Decodes `path` to 8-bit luma with BT.601 weights.
pub fn load_grayscale(path: &Path) -> Result<GrayImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to decode image: {}", path.display()))?
        .to_rgb8();
    Ok(GrayImage::from_fn(image.width(), image.height(), |x, y| {
        Luma([bt601_luma(*image.get_pixel(x, y))])
    }))
}

pub fn bt601_luma(Rgb([red, green, blue]): Rgb<u8>) -> u8 {
    let weighted = u32::from(red) * LUMA_R + u32::from(green) * LUMA_G + u32::from(blue) * LUMA_B;
    ((weighted + (1 << (LUMA_SHIFT - 1))) >> LUMA_SHIFT) as u8
}

/// Resizes `candidate` to the reference dimensions; the reference wins.
pub fn align_dimensions(reference: &GrayImage, candidate: GrayImage) -> GrayImage {
    if reference.dimensions() == candidate.dimensions() {
        return candidate;
    }
    let (width, height) = reference.dimensions();
    resize_bilinear(&candidate, width, height)
}

/// Two-tap bilinear resize with pixel-centre alignment and no antialiasing.
/// Taps outside the source clamp to the edge pixel.
pub fn resize_bilinear(source: &GrayImage, width: u32, height: u32) -> GrayImage {
    let columns = bilinear_taps(source.width(), width);
    let rows = bilinear_taps(source.height(), height);

    GrayImage::from_fn(width, height, |x, y| {
        let (x0, x1, fx) = columns[x as usize];
        let (y0, y1, fy) = rows[y as usize];
        let sample = |col: u32, row: u32| f64::from(source.get_pixel(col, row)[0]);

        let top = sample(x0, y0) * (1.0 - fx) + sample(x1, y0) * fx;
        let bottom = sample(x0, y1) * (1.0 - fx) + sample(x1, y1) * fx;
        let value = top * (1.0 - fy) + bottom * fy;
        Luma([value.round().clamp(0.0, 255.0) as u8])
    })
}

fn bilinear_taps(source_len: u32, target_len: u32) -> Vec<(u32, u32, f64)> {
    let scale = f64::from(source_len) / f64::from(target_len);
    let last = source_len.saturating_sub(1);

    (0..target_len)
        .map(|index| {
            let position = (f64::from(index) + 0.5) * scale - 0.5;
            let floor = position.floor();
            if floor < 0.0 {
                (0, 0, 0.0)
            } else if floor as u32 >= last {
                (last, last, 0.0)
            } else {
                let lower = floor as u32;
                (lower, lower + 1, position - floor)
            }
        })
        .collect()
}

pub fn ssim_from_paths(reference_path: &Path, candidate_path: &Path) -> Result<f64> {
    let reference = load_grayscale(reference_path)?;
    let candidate = load_grayscale(candidate_path)?;
    let candidate = align_dimensions(&reference, candidate);
    structural_similarity(&reference, &candidate)
}

/// Mean SSIM over every 7x7 window lying fully inside the image, using a
/// uniform window and sample covariance.
pub fn structural_similarity(left: &GrayImage, right: &GrayImage) -> Result<f64> {
    if left.dimensions() != right.dimensions() {
        bail!(
            "ssim inputs differ in size: {:?} vs {:?}",
            left.dimensions(),
            right.dimensions()
        );
    }

    let (width, height) = (left.width() as usize, left.height() as usize);
    if width < SSIM_WINDOW || height < SSIM_WINDOW {
        bail!("images must be at least {SSIM_WINDOW}x{SSIM_WINDOW} for ssim, got {width}x{height}");
    }

    let tables = WindowTables::build(left, right);
    let count = (SSIM_WINDOW * SSIM_WINDOW) as f64;
    let covariance_norm = count / (count - 1.0);
    let c1 = (K1 * DATA_RANGE).powi(2);
    let c2 = (K2 * DATA_RANGE).powi(2);

    let mut total = 0.0_f64;
    let mut windows = 0usize;
    for top in 0..=(height - SSIM_WINDOW) {
        for left_edge in 0..=(width - SSIM_WINDOW) {
            let sums = tables.window(top, left_edge);
            let mean_x = sums.x / count;
            let mean_y = sums.y / count;
            let var_x = covariance_norm * (sums.xx / count - mean_x * mean_x);
            let var_y = covariance_norm * (sums.yy / count - mean_y * mean_y);
            let cov_xy = covariance_norm * (sums.xy / count - mean_x * mean_y);

            let numerator = (2.0 * mean_x * mean_y + c1) * (2.0 * cov_xy + c2);
            let denominator = (mean_x * mean_x + mean_y * mean_y + c1) * (var_x + var_y + c2);
            total += numerator / denominator;
            windows += 1;
        }
    }

    Ok(total / windows as f64)
}

#[derive(Debug, Default, Clone, Copy)]
struct WindowSums {
    x: f64,
    y: f64,
    xx: f64,
    yy: f64,
    xy: f64,
}

/// Summed-area tables over both images, one row and column of zero padding.
struct WindowTables {
    stride: usize,
    cells: Vec<WindowSums>,
}

impl WindowTables {
    fn build(left: &GrayImage, right: &GrayImage) -> Self {
        let (width, height) = (left.width() as usize, left.height() as usize);
        let stride = width + 1;
        let mut cells = vec![WindowSums::default(); stride * (height + 1)];

        for row in 0..height {
            let mut running = WindowSums::default();
            for col in 0..width {
                let x = f64::from(left.get_pixel(col as u32, row as u32)[0]);
                let y = f64::from(right.get_pixel(col as u32, row as u32)[0]);
                running.x += x;
                running.y += y;
                running.xx += x * x;
                running.yy += y * y;
                running.xy += x * y;

                let above = cells[row * stride + col + 1];
                cells[(row + 1) * stride + col + 1] = WindowSums {
                    x: above.x + running.x,
                    y: above.y + running.y,
                    xx: above.xx + running.xx,
                    yy: above.yy + running.yy,
                    xy: above.xy + running.xy,
                };
            }
        }

        Self { stride, cells }
    }

    fn window(&self, top: usize, left: usize) -> WindowSums {
        let bottom = top + SSIM_WINDOW;
        let right = left + SSIM_WINDOW;
        let a = self.cells[top * self.stride + left];
        let b = self.cells[top * self.stride + right];
        let c = self.cells[bottom * self.stride + left];
        let d = self.cells[bottom * self.stride + right];

        WindowSums {
            x: d.x - b.x - c.x + a.x,
            y: d.y - b.y - c.y + a.y,
            xx: d.xx - b.xx - c.xx + a.xx,
            yy: d.yy - b.yy - c.yy + a.yy,
            xy: d.xy - b.xy - c.xy + a.xy,
        }
    }
}
