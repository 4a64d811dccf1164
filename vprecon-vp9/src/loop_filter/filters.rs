//! Per-line edge filters.
//!
//! Each filter works on one line of samples crossing an edge. Samples before
//! the edge are `p0, p1, ...` counting away from it, samples after are
//! `q0, q1, ...`. The 4- and 8-wide filters read `p3..q3`; the 16-wide filter
//! reads `p7..q7`.

use crate::tables::LoopFilterThresh;

/// Filter strength selected for one edge position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterWidth {
    /// 4-tap filter modifying up to two samples per side.
    Narrow,
    /// 8-tap filter modifying up to three samples per side.
    Medium,
    /// 16-tap filter modifying up to seven samples per side.
    Wide,
}

impl FilterWidth {
    /// Samples read on each side of the edge.
    pub const fn reach(self) -> usize {
        match self {
            FilterWidth::Narrow | FilterWidth::Medium => 4,
            FilterWidth::Wide => 8,
        }
    }

    /// Nominal tap count.
    pub const fn taps(self) -> usize {
        match self {
            FilterWidth::Narrow => 4,
            FilterWidth::Medium => 8,
            FilterWidth::Wide => 16,
        }
    }
}

/// Filter one line across one edge.
///
/// `samples` holds `2 * width.reach()` samples; the edge lies between
/// `samples[reach - 1]` (p0) and `samples[reach]` (q0). Lines that fail the
/// edge-activity test are left untouched.
///
/// # Panics
///
/// Panics if `samples` is shorter than `2 * width.reach()`.
pub fn filter_edge(width: FilterWidth, thresh: &LoopFilterThresh, samples: &mut [u8]) {
    let center = width.reach();
    let core = center - 4..center + 4;

    if !filter_mask(thresh.lim, thresh.mblim, &samples[core.clone()]) {
        return;
    }
    let hev = high_edge_variance(thresh.hev_thr, &samples[core.clone()]);

    match width {
        FilterWidth::Narrow => filter4(&mut samples[core], hev),
        FilterWidth::Medium => {
            if is_flat(&samples[core.clone()]) {
                smooth(&mut samples[core], 3);
            } else {
                filter4(&mut samples[core], hev);
            }
        }
        FilterWidth::Wide => {
            let flat = is_flat(&samples[core.clone()]);
            if flat && is_flat_outer(&samples[..2 * center]) {
                smooth(&mut samples[..2 * center], 7);
            } else if flat {
                smooth(&mut samples[core], 3);
            } else {
                filter4(&mut samples[core], hev);
            }
        }
    }
}

#[inline]
fn abs_diff(a: u8, b: u8) -> u8 {
    a.abs_diff(b)
}

/// Edge activity test over `p3..q3`.
fn filter_mask(lim: u8, mblim: u8, s: &[u8]) -> bool {
    let [p3, p2, p1, p0, q0, q1, q2, q3] = [s[0], s[1], s[2], s[3], s[4], s[5], s[6], s[7]];
    abs_diff(p3, p2) <= lim
        && abs_diff(p2, p1) <= lim
        && abs_diff(p1, p0) <= lim
        && abs_diff(q1, q0) <= lim
        && abs_diff(q2, q1) <= lim
        && abs_diff(q3, q2) <= lim
        && abs_diff(p0, q0) as u32 * 2 + abs_diff(p1, q1) as u32 / 2 <= mblim as u32
}

fn high_edge_variance(thr: u8, s: &[u8]) -> bool {
    abs_diff(s[2], s[3]) > thr || abs_diff(s[5], s[4]) > thr
}

/// `p1..p3` within 1 of `p0` and `q1..q3` within 1 of `q0`.
fn is_flat(s: &[u8]) -> bool {
    let (p0, q0) = (s[3], s[4]);
    s[..3].iter().all(|&p| abs_diff(p, p0) <= 1) && s[5..8].iter().all(|&q| abs_diff(q, q0) <= 1)
}

/// `p4..p7` within 1 of `p0` and `q4..q7` within 1 of `q0`, over `p7..q7`.
fn is_flat_outer(s: &[u8]) -> bool {
    let (p0, q0) = (s[7], s[8]);
    s[..4].iter().all(|&p| abs_diff(p, p0) <= 1) && s[12..16].iter().all(|&q| abs_diff(q, q0) <= 1)
}

#[inline]
fn to_signed(x: u8) -> i32 {
    x as i32 - 128
}

#[inline]
fn from_signed(x: i32) -> u8 {
    (x + 128) as u8
}

#[inline]
fn signed_clamp(x: i32) -> i32 {
    x.clamp(-128, 127)
}

/// 4-tap filter over `p3..q3`, modifying `p1..q1`.
fn filter4(s: &mut [u8], hev: bool) {
    let ps1 = to_signed(s[2]);
    let ps0 = to_signed(s[3]);
    let qs0 = to_signed(s[4]);
    let qs1 = to_signed(s[5]);

    let outer = if hev { signed_clamp(ps1 - qs1) } else { 0 };
    let filter = signed_clamp(outer + 3 * (qs0 - ps0));

    let filter1 = signed_clamp(filter + 4) >> 3;
    let filter2 = signed_clamp(filter + 3) >> 3;
    s[4] = from_signed(signed_clamp(qs0 - filter1));
    s[3] = from_signed(signed_clamp(ps0 + filter2));

    if !hev {
        let filter = (filter1 + 1) >> 1;
        s[5] = from_signed(signed_clamp(qs1 - filter));
        s[2] = from_signed(signed_clamp(ps1 + filter));
    }
}

/// Low-pass smoothing of every sample but the outermost on each side.
///
/// Each output is the `2 * half + 1`-sample window around it, with the centre
/// counted twice and the outermost samples replicated past the ends,
/// divided by `2^(log2(half + 1) + 1)` with rounding. `half == 3` is the
/// 8-wide flat filter, `half == 7` the 16-wide one.
fn smooth(s: &mut [u8], half: usize) {
    let len = 2 * (half + 1);
    let shift = (half + 1).trailing_zeros() + 1;
    let round = 1u32 << (shift - 1);

    let mut input = [0u8; 16];
    input[..len].copy_from_slice(&s[..len]);
    let last = len - 1;

    for (i, out) in s.iter_mut().enumerate().take(last).skip(1) {
        let mut sum = input[i] as u32;
        for k in 0..=2 * half {
            let j = (i + k).saturating_sub(half).min(last);
            sum += input[j] as u32;
        }
        *out = ((sum + round) >> shift) as u8;
    }
}
