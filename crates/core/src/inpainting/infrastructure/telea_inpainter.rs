use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::inpainting::domain::inpainter::Inpainter;
use crate::masking::domain::mask::{Mask, MASK_OFF};
use crate::shared::constants::DEFAULT_INPAINT_RADIUS;
use crate::shared::error::WatermarkError;
use crate::shared::frame::Frame;

/// Arrival time assigned to pixels the front has not reached yet.
const UNREACHED: f64 = 1.0e6;

/// Below this the direction factor is replaced by a tiny constant so that
/// pixels perpendicular to the front still contribute a little.
const MIN_DIRECTION: f64 = 0.01;

#[derive(Clone, Copy, PartialEq, Eq)]
enum State {
    Known,
    Band,
    Inside,
}

/// Narrow-band entry. Ordered so that `BinaryHeap` pops the smallest arrival
/// time first, with insertion order breaking ties.
struct BandEntry {
    time: f64,
    seq: u64,
    idx: usize,
}

impl PartialEq for BandEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for BandEntry {}

impl PartialOrd for BandEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BandEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Fast-marching inpainting after Telea (2004).
///
/// The boundary of the mask advances inward in order of arrival time `T`.
/// Each pixel it reaches is filled with a weighted average of first-order
/// estimates `I(q) + ∇I(q)·(p − q)` from already known pixels `q` within
/// `radius`. Weights combine alignment with ∇T, inverse cubic distance and
/// level-set proximity.
pub struct TeleaInpainter {
    radius: u32,
}

impl TeleaInpainter {
    pub fn new(radius: u32) -> Self {
        Self {
            radius: radius.max(1),
        }
    }

    pub fn radius(&self) -> u32 {
        self.radius
    }
}

impl Default for TeleaInpainter {
    fn default() -> Self {
        Self::new(DEFAULT_INPAINT_RADIUS)
    }
}

impl Inpainter for TeleaInpainter {
    fn inpaint(&self, frame: &Frame, mask: &Mask) -> Result<Frame, WatermarkError> {
        if mask.width() != frame.width() || mask.height() != frame.height() {
            return Err(WatermarkError::MaskDimensions {
                frame_width: frame.width(),
                frame_height: frame.height(),
                mask_width: mask.width(),
                mask_height: mask.height(),
            });
        }

        let mut out = frame.clone();
        let mut march = FastMarch::new(frame, mask, self.radius as i64);
        march.run(out.data_mut());
        Ok(out)
    }
}

struct FastMarch {
    width: i64,
    height: i64,
    channels: usize,
    radius: i64,
    state: Vec<State>,
    time: Vec<f64>,
    band: BinaryHeap<BandEntry>,
    seq: u64,
}

impl FastMarch {
    fn new(frame: &Frame, mask: &Mask, radius: i64) -> Self {
        let width = i64::from(frame.width());
        let height = i64::from(frame.height());
        let (state, time) = mask
            .data()
            .iter()
            .map(|&m| {
                if m != MASK_OFF {
                    (State::Inside, UNREACHED)
                } else {
                    (State::Known, 0.0)
                }
            })
            .unzip();

        let mut march = Self {
            width,
            height,
            channels: frame.channels() as usize,
            radius,
            state,
            time,
            band: BinaryHeap::new(),
            seq: 0,
        };

        // Initial front: known pixels 4-adjacent to the mask.
        for y in 0..height {
            for x in 0..width {
                let idx = march.index(x, y);
                if march.state[idx] == State::Known
                    && march
                        .neighbours(x, y)
                        .any(|(nx, ny)| march.state_at(nx, ny) == State::Inside)
                {
                    march.state[idx] = State::Band;
                    march.push(idx);
                }
            }
        }
        march
    }

    fn run(&mut self, pixels: &mut [u8]) {
        while let Some(entry) = self.band.pop() {
            if self.state[entry.idx] == State::Known {
                continue;
            }
            self.state[entry.idx] = State::Known;

            let x = entry.idx as i64 % self.width;
            let y = entry.idx as i64 / self.width;
            let next: Vec<(i64, i64)> = self
                .neighbours(x, y)
                .filter(|&(nx, ny)| self.state_at(nx, ny) == State::Inside)
                .collect();

            for (nx, ny) in next {
                let nidx = self.index(nx, ny);
                self.time[nidx] = self.arrival_time(nx, ny);
                self.fill(nx, ny, pixels);
                self.state[nidx] = State::Band;
                self.push(nidx);
            }
        }
    }

    /// Smallest eikonal solution over the four quadrant neighbour pairs.
    fn arrival_time(&self, x: i64, y: i64) -> f64 {
        let pairs = [
            ((x, y - 1), (x - 1, y)),
            ((x, y - 1), (x + 1, y)),
            ((x, y + 1), (x - 1, y)),
            ((x, y + 1), (x + 1, y)),
        ];
        pairs
            .iter()
            .map(|&(a, b)| self.solve(a, b))
            .fold(f64::INFINITY, f64::min)
    }

    fn solve(&self, a: (i64, i64), b: (i64, i64)) -> f64 {
        let ta = self.time_at(a.0, a.1);
        let tb = self.time_at(b.0, b.1);
        let a_known = self.state_at(a.0, a.1) != State::Inside;
        let b_known = self.state_at(b.0, b.1) != State::Inside;
        match (a_known, b_known) {
            (true, true) => {
                let diff = ta - tb;
                if diff.abs() >= 1.0 {
                    1.0 + ta.min(tb)
                } else {
                    (ta + tb + (2.0 - diff * diff).sqrt()) * 0.5
                }
            }
            (true, false) => 1.0 + ta,
            (false, true) => 1.0 + tb,
            (false, false) => 1.0 + ta.min(tb),
        }
    }

    fn fill(&self, x: i64, y: i64, pixels: &mut [u8]) {
        let t_p = self.time[self.index(x, y)];
        let (grad_tx, grad_ty) = self.time_gradient(x, y);
        let channels = self.channels;

        let mut weight_sum = 0.0;
        let mut acc = [0.0f64; 3];
        let r2 = self.radius * self.radius;

        for qy in (y - self.radius).max(0)..=(y + self.radius).min(self.height - 1) {
            for qx in (x - self.radius).max(0)..=(x + self.radius).min(self.width - 1) {
                let qidx = self.index(qx, qy);
                if self.state[qidx] == State::Inside {
                    continue;
                }
                let rx = (x - qx) as f64;
                let ry = (y - qy) as f64;
                let len2 = rx * rx + ry * ry;
                if len2 == 0.0 || len2 > r2 as f64 {
                    continue;
                }

                let dst = 1.0 / (len2 * len2.sqrt());
                let lev = 1.0 / (1.0 + (self.time[qidx] - t_p).abs());
                let mut dir = rx * grad_tx + ry * grad_ty;
                if dir.abs() <= MIN_DIRECTION {
                    dir = 1.0e-6;
                }
                let w = (dst * lev * dir).abs();

                for (c, slot) in acc.iter_mut().enumerate().take(channels) {
                    let value = f64::from(pixels[qidx * channels + c]);
                    let (gx, gy) = self.image_gradient(qx, qy, c, pixels);
                    *slot += w * (value + gx * rx + gy * ry);
                }
                weight_sum += w;
            }
        }

        if weight_sum <= 0.0 {
            return;
        }
        let pidx = self.index(x, y);
        for (c, value) in acc.iter().enumerate().take(channels) {
            pixels[pidx * channels + c] = (value / weight_sum).round().clamp(0.0, 255.0) as u8;
        }
    }

    fn time_gradient(&self, x: i64, y: i64) -> (f64, f64) {
        let t = self.time[self.index(x, y)];
        let axis = |prev: (i64, i64), next: (i64, i64)| {
            let prev_known = self.state_at(prev.0, prev.1) != State::Inside;
            let next_known = self.state_at(next.0, next.1) != State::Inside;
            match (prev_known, next_known) {
                (true, true) => (self.time_at(next.0, next.1) - self.time_at(prev.0, prev.1)) * 0.5,
                (false, true) => self.time_at(next.0, next.1) - t,
                (true, false) => t - self.time_at(prev.0, prev.1),
                (false, false) => 0.0,
            }
        };
        (
            axis((x - 1, y), (x + 1, y)),
            axis((x, y - 1), (x, y + 1)),
        )
    }

    fn image_gradient(&self, x: i64, y: i64, channel: usize, pixels: &[u8]) -> (f64, f64) {
        let value = |px: i64, py: i64| f64::from(pixels[self.index(px, py) * self.channels + channel]);
        let here = value(x, y);
        let axis = |prev: (i64, i64), next: (i64, i64)| {
            let prev_known = self.state_at(prev.0, prev.1) != State::Inside;
            let next_known = self.state_at(next.0, next.1) != State::Inside;
            match (prev_known, next_known) {
                (true, true) => (value(next.0, next.1) - value(prev.0, prev.1)) * 0.5,
                (false, true) => value(next.0, next.1) - here,
                (true, false) => here - value(prev.0, prev.1),
                (false, false) => 0.0,
            }
        };
        (
            axis((x - 1, y), (x + 1, y)),
            axis((x, y - 1), (x, y + 1)),
        )
    }

    fn push(&mut self, idx: usize) {
        self.band.push(BandEntry {
            time: self.time[idx],
            seq: self.seq,
            idx,
        });
        self.seq += 1;
    }

    fn neighbours(&self, x: i64, y: i64) -> impl Iterator<Item = (i64, i64)> {
        let (w, h) = (self.width, self.height);
        [(x, y - 1), (x - 1, y), (x + 1, y), (x, y + 1)]
            .into_iter()
            .filter(move |&(nx, ny)| nx >= 0 && ny >= 0 && nx < w && ny < h)
    }

    /// Out-of-frame pixels behave as unreached.
    fn state_at(&self, x: i64, y: i64) -> State {
        if self.in_bounds(x, y) {
            self.state[self.index(x, y)]
        } else {
            State::Inside
        }
    }

    fn time_at(&self, x: i64, y: i64) -> f64 {
        if self.in_bounds(x, y) {
            self.time[self.index(x, y)]
        } else {
            UNREACHED
        }
    }

    fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn index(&self, x: i64, y: i64) -> usize {
        (y * self.width + x) as usize
    }
}
