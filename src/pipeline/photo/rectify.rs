//! Card rectification.
//!
//! Stage order, each passing its input through when it cannot decide:
//! 1. Perspective: the largest edge component's convex hull reduced to four
//!    corners, accepted when it is card-shaped, warped to the card size.
//! 2. Bounding box: Otsu foreground, largest component, cropped with a margin.
//! 3. Pass-through.
//!
//! Everything runs on a downscaled working copy; geometry is scaled back to
//! the full-resolution image before sampling.

use std::collections::VecDeque;

use image::imageops::FilterType;
use image::{GrayImage, Luma, Rgb, RgbImage};
use serde::Serialize;
use tracing::debug;

use crate::config::PhotoConfig;

/// Longest side of the working copy used for detection.
const WORK_MAX_DIM: u32 = 800;

/// Sobel magnitude (|gx| + |gy|) above which a pixel is an edge.
const EDGE_THRESHOLD: i32 = 80;

/// Quad area over hull area; lower means the hull is not four-sided.
const MIN_QUAD_HULL_RATIO: f64 = 0.85;

/// Quad area over image area.
const MIN_QUAD_IMAGE_RATIO: f64 = 0.1;

/// Foreground component area over image area for the bounding-box crop.
const MIN_COMPONENT_RATIO: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CropMethod {
    Perspective,
    BoundingBox,
    PassThrough,
}

#[derive(Debug, Clone)]
pub struct Rectified {
    pub image: RgbImage,
    pub method: CropMethod,
}

type Point = (f64, f64);

/// Rectify one oriented image.
pub fn rectify(image: &RgbImage, config: &PhotoConfig) -> Rectified {
    let (work, scale) = working_copy(image);
    let gray = rgb_to_gray(&work);

    if let Some(corners) = find_card_quad(&gray, config) {
        let corners = corners.map(|(x, y)| (x * scale, y * scale));
        let (w, h) = output_size(&corners, config);
        if let Some(warped) = warp_perspective(image, &corners, w, h) {
            debug!(width = w, height = h, "Card rectified by perspective warp");
            return Rectified {
                image: warped,
                method: CropMethod::Perspective,
            };
        }
    }

    if let Some((x0, y0, x1, y1)) = foreground_bbox(&gray) {
        let margin = config.crop_margin as f64;
        let left = ((x0 as f64 * scale) - margin).max(0.0) as u32;
        let top = ((y0 as f64 * scale) - margin).max(0.0) as u32;
        let right = (((x1 + 1) as f64 * scale + margin) as u32).min(image.width());
        let bottom = (((y1 + 1) as f64 * scale + margin) as u32).min(image.height());

        if right > left && bottom > top {
            let cropped =
                image::imageops::crop_imm(image, left, top, right - left, bottom - top).to_image();
            debug!(
                width = cropped.width(),
                height = cropped.height(),
                "Card cropped to foreground bounding box"
            );
            return Rectified {
                image: cropped,
                method: CropMethod::BoundingBox,
            };
        }
    }

    Rectified {
        image: image.clone(),
        method: CropMethod::PassThrough,
    }
}

// ═══════════════════════════════════════════════════════════
// Pure helpers
// ═══════════════════════════════════════════════════════════

/// ITU-R BT.601 luminance.
pub fn rgb_to_gray(rgb: &RgbImage) -> GrayImage {
    let (w, h) = (rgb.width(), rgb.height());
    let mut gray = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let p = rgb.get_pixel(x, y);
            let luma = (0.299 * p.0[0] as f32 + 0.587 * p.0[1] as f32 + 0.114 * p.0[2] as f32)
                .round()
                .clamp(0.0, 255.0) as u8;
            gray.put_pixel(x, y, Luma([luma]));
        }
    }
    gray
}

/// Downscaled copy and the factor mapping its coordinates back.
fn working_copy(image: &RgbImage) -> (RgbImage, f64) {
    let (w, h) = image.dimensions();
    let largest = w.max(h);
    if largest <= WORK_MAX_DIM {
        return (image.clone(), 1.0);
    }
    let ratio = WORK_MAX_DIM as f64 / largest as f64;
    let new_w = ((w as f64 * ratio).round() as u32).max(1);
    let new_h = ((h as f64 * ratio).round() as u32).max(1);
    let resized = image::imageops::resize(image, new_w, new_h, FilterType::Triangle);
    (resized, w as f64 / new_w as f64)
}

fn distance(a: Point, b: Point) -> f64 {
    ((a.0 - b.0).powi(2) + (a.1 - b.1).powi(2)).sqrt()
}

/// Shoelace area of a closed polygon.
fn polygon_area(points: &[Point]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0;
    for i in 0..points.len() {
        let (x0, y0) = points[i];
        let (x1, y1) = points[(i + 1) % points.len()];
        sum += x0 * y1 - x1 * y0;
    }
    sum.abs() / 2.0
}

/// Landscape card size when the quad is wider than tall, portrait otherwise.
fn output_size(corners: &[Point; 4], config: &PhotoConfig) -> (u32, u32) {
    let [tl, tr, br, bl] = *corners;
    let width = (distance(tl, tr) + distance(bl, br)) / 2.0;
    let height = (distance(tl, bl) + distance(tr, br)) / 2.0;
    if width >= height {
        (config.card_width, config.card_height)
    } else {
        (config.card_height, config.card_width)
    }
}

// ── Edge quad detection ───────────────────────────────────

fn edge_mask(gray: &GrayImage) -> Vec<bool> {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let mut mask = vec![false; w * h];
    if w < 3 || h < 3 {
        return mask;
    }
    let px = |x: usize, y: usize| gray.get_pixel(x as u32, y as u32).0[0] as i32;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let gx = px(x + 1, y - 1) + 2 * px(x + 1, y) + px(x + 1, y + 1)
                - px(x - 1, y - 1)
                - 2 * px(x - 1, y)
                - px(x - 1, y + 1);
            let gy = px(x - 1, y + 1) + 2 * px(x, y + 1) + px(x + 1, y + 1)
                - px(x - 1, y - 1)
                - 2 * px(x, y - 1)
                - px(x + 1, y - 1);
            mask[y * w + x] = gx.abs() + gy.abs() > EDGE_THRESHOLD;
        }
    }
    mask
}

/// One 3x3 dilation pass, closing single-pixel gaps in edge contours.
fn dilate(mask: &[bool], w: usize, h: usize) -> Vec<bool> {
    let mut out = vec![false; mask.len()];
    for y in 0..h {
        for x in 0..w {
            if !mask[y * w + x] {
                continue;
            }
            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    out[ny * w + nx] = true;
                }
            }
        }
    }
    out
}

struct Component {
    points: Vec<(usize, usize)>,
    min: (usize, usize),
    max: (usize, usize),
}

impl Component {
    fn bbox_area(&self) -> usize {
        (self.max.0 - self.min.0 + 1) * (self.max.1 - self.min.1 + 1)
    }
}

/// Connected components of `mask`, 8- or 4-connected.
fn components(mask: &[bool], w: usize, h: usize, eight: bool) -> Vec<Component> {
    let mut seen = vec![false; mask.len()];
    let mut found = Vec::new();
    let mut queue = VecDeque::new();

    for start in 0..mask.len() {
        if !mask[start] || seen[start] {
            continue;
        }
        seen[start] = true;
        queue.push_back(start);

        let mut component = Component {
            points: Vec::new(),
            min: (usize::MAX, usize::MAX),
            max: (0, 0),
        };

        while let Some(idx) = queue.pop_front() {
            let (x, y) = (idx % w, idx / w);
            component.points.push((x, y));
            component.min = (component.min.0.min(x), component.min.1.min(y));
            component.max = (component.max.0.max(x), component.max.1.max(y));

            for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
                for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                    if !eight && nx != x && ny != y {
                        continue;
                    }
                    let n = ny * w + nx;
                    if mask[n] && !seen[n] {
                        seen[n] = true;
                        queue.push_back(n);
                    }
                }
            }
        }
        found.push(component);
    }
    found
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.0 - o.0) * (b.1 - o.1) - (a.1 - o.1) * (b.0 - o.0)
}

/// Monotone-chain convex hull, counter-clockwise, no repeated endpoint.
fn convex_hull(points: &[(usize, usize)]) -> Vec<Point> {
    let mut pts: Vec<Point> = points.iter().map(|&(x, y)| (x as f64, y as f64)).collect();
    pts.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    let mut lower: Vec<Point> = Vec::new();
    for &p in &pts {
        while lower.len() >= 2 && cross(lower[lower.len() - 2], lower[lower.len() - 1], p) <= 0.0 {
            lower.pop();
        }
        lower.push(p);
    }
    let mut upper: Vec<Point> = Vec::new();
    for &p in pts.iter().rev() {
        while upper.len() >= 2 && cross(upper[upper.len() - 2], upper[upper.len() - 1], p) <= 0.0 {
            upper.pop();
        }
        upper.push(p);
    }
    lower.pop();
    upper.pop();
    lower.extend(upper);
    lower
}

/// Corners by coordinate sums and differences: [tl, tr, br, bl].
fn hull_corners(hull: &[Point]) -> Option<[Point; 4]> {
    let sum = |p: &&Point| p.0 + p.1;
    let diff = |p: &&Point| p.0 - p.1;

    let tl = hull.iter().min_by(|a, b| sum(a).total_cmp(&sum(b)))?;
    let br = hull.iter().max_by(|a, b| sum(a).total_cmp(&sum(b)))?;
    let tr = hull.iter().max_by(|a, b| diff(a).total_cmp(&diff(b)))?;
    let bl = hull.iter().min_by(|a, b| diff(a).total_cmp(&diff(b)))?;
    Some([*tl, *tr, *br, *bl])
}

fn find_card_quad(gray: &GrayImage, config: &PhotoConfig) -> Option<[Point; 4]> {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    if w < 3 || h < 3 {
        return None;
    }
    let edges = dilate(&edge_mask(gray), w, h);
    let largest = components(&edges, w, h, true)
        .into_iter()
        .max_by_key(Component::bbox_area)?;

    let hull = convex_hull(&largest.points);
    if hull.len() < 4 {
        return None;
    }
    let corners = hull_corners(&hull)?;

    let hull_area = polygon_area(&hull);
    let quad_area = polygon_area(&corners);
    let image_area = (w * h) as f64;
    if hull_area <= 0.0
        || quad_area < MIN_QUAD_HULL_RATIO * hull_area
        || quad_area < MIN_QUAD_IMAGE_RATIO * image_area
    {
        debug!(hull_area, quad_area, image_area, "Edge hull is not a usable quadrilateral");
        return None;
    }

    let [tl, tr, br, bl] = corners;
    let width = (distance(tl, tr) + distance(bl, br)) / 2.0;
    let height = (distance(tl, bl) + distance(tr, br)) / 2.0;
    let short = width.min(height);
    if short <= 0.0 {
        return None;
    }
    let aspect = width.max(height) / short;
    if aspect < config.card_aspect_min || aspect > config.card_aspect_max {
        debug!(aspect, "Quadrilateral aspect is not card-like");
        return None;
    }

    Some(corners)
}

// ── Perspective warp ──────────────────────────────────────

/// Solve `a · x = b` for an 8x8 system by Gaussian elimination with partial
/// pivoting. `None` when the system is singular.
fn solve8(mut a: [[f64; 8]; 8], mut b: [f64; 8]) -> Option<[f64; 8]> {
    for col in 0..8 {
        let pivot = (col..8).max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..8 {
            let factor = a[row][col] / a[col][col];
            for k in col..8 {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = [0.0; 8];
    for row in (0..8).rev() {
        let mut sum = b[row];
        for k in row + 1..8 {
            sum -= a[row][k] * x[k];
        }
        x[row] = sum / a[row][row];
    }
    Some(x)
}

/// Homography mapping each `from` point onto its `to` point.
fn homography(from: &[Point; 4], to: &[Point; 4]) -> Option<[f64; 9]> {
    let mut a = [[0.0; 8]; 8];
    let mut b = [0.0; 8];
    for i in 0..4 {
        let (u, v) = from[i];
        let (x, y) = to[i];
        a[2 * i] = [u, v, 1.0, 0.0, 0.0, 0.0, -u * x, -v * x];
        b[2 * i] = x;
        a[2 * i + 1] = [0.0, 0.0, 0.0, u, v, 1.0, -u * y, -v * y];
        b[2 * i + 1] = y;
    }
    let h = solve8(a, b)?;
    Some([h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0])
}

fn bilinear(image: &RgbImage, x: f64, y: f64) -> Rgb<u8> {
    let (w, h) = image.dimensions();
    if x < 0.0 || y < 0.0 || x > (w - 1) as f64 || y > (h - 1) as f64 {
        return Rgb([255, 255, 255]);
    }
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let (x1, y1) = ((x0 + 1).min(w - 1), (y0 + 1).min(h - 1));
    let (fx, fy) = (x - x0 as f64, y - y0 as f64);

    let mut out = [0u8; 3];
    for (c, slot) in out.iter_mut().enumerate() {
        let p00 = image.get_pixel(x0, y0).0[c] as f64;
        let p10 = image.get_pixel(x1, y0).0[c] as f64;
        let p01 = image.get_pixel(x0, y1).0[c] as f64;
        let p11 = image.get_pixel(x1, y1).0[c] as f64;
        let top = p00 + (p10 - p00) * fx;
        let bottom = p01 + (p11 - p01) * fx;
        *slot = (top + (bottom - top) * fy).round().clamp(0.0, 255.0) as u8;
    }
    Rgb(out)
}

/// Warp the quad `corners` ([tl, tr, br, bl]) of `image` onto a `w`x`h` image.
fn warp_perspective(image: &RgbImage, corners: &[Point; 4], w: u32, h: u32) -> Option<RgbImage> {
    if image.width() == 0 || image.height() == 0 || w == 0 || h == 0 {
        return None;
    }
    let (fw, fh) = ((w - 1) as f64, (h - 1) as f64);
    let target = [(0.0, 0.0), (fw, 0.0), (fw, fh), (0.0, fh)];
    let m = homography(&target, corners)?;

    let mut out = RgbImage::new(w, h);
    for v in 0..h {
        for u in 0..w {
            let (uf, vf) = (u as f64, v as f64);
            let denom = m[6] * uf + m[7] * vf + m[8];
            let pixel = if denom.abs() < 1e-12 {
                Rgb([255, 255, 255])
            } else {
                let x = (m[0] * uf + m[1] * vf + m[2]) / denom;
                let y = (m[3] * uf + m[4] * vf + m[5]) / denom;
                bilinear(image, x, y)
            };
            out.put_pixel(u, v, pixel);
        }
    }
    Some(out)
}

// ── Otsu bounding box ─────────────────────────────────────

/// Otsu threshold, or `None` when the histogram cannot be split.
pub fn otsu_threshold(gray: &GrayImage) -> Option<u8> {
    let mut histogram = [0u64; 256];
    for p in gray.pixels() {
        histogram[p.0[0] as usize] += 1;
    }
    let total: u64 = histogram.iter().sum();
    if total == 0 {
        return None;
    }
    let sum_all: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as f64 * c as f64)
        .sum();

    let mut weight_bg = 0u64;
    let mut sum_bg = 0.0;
    let mut best = (0.0, None);

    for (t, &count) in histogram.iter().enumerate() {
        weight_bg += count;
        if weight_bg == 0 {
            continue;
        }
        let weight_fg = total - weight_bg;
        if weight_fg == 0 {
            break;
        }
        sum_bg += t as f64 * count as f64;
        let mean_bg = sum_bg / weight_bg as f64;
        let mean_fg = (sum_all - sum_bg) / weight_fg as f64;
        let between = weight_bg as f64 * weight_fg as f64 * (mean_bg - mean_fg).powi(2);
        if between > best.0 {
            best = (between, Some(t as u8));
        }
    }
    best.1
}

fn border_mean(gray: &GrayImage) -> f64 {
    let (w, h) = gray.dimensions();
    let mut sum = 0u64;
    let mut count = 0u64;
    for (x, y, p) in gray.enumerate_pixels() {
        if x == 0 || y == 0 || x == w - 1 || y == h - 1 {
            sum += p.0[0] as u64;
            count += 1;
        }
    }
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}

/// Inclusive bounding box (x0, y0, x1, y1) of the largest foreground blob.
fn foreground_bbox(gray: &GrayImage) -> Option<(usize, usize, usize, usize)> {
    let threshold = otsu_threshold(gray)?;
    let light_border = border_mean(gray) > threshold as f64;
    let (w, h) = (gray.width() as usize, gray.height() as usize);

    let mask: Vec<bool> = gray
        .pixels()
        .map(|p| {
            let v = p.0[0];
            if light_border {
                v <= threshold
            } else {
                v > threshold
            }
        })
        .collect();

    let largest = components(&mask, w, h, false)
        .into_iter()
        .max_by_key(|c| c.points.len())?;

    if (largest.points.len() as f64) < MIN_COMPONENT_RATIO * (w * h) as f64 {
        return None;
    }
    Some((largest.min.0, largest.min.1, largest.max.0, largest.max.1))
}
