use std::ops::Deref;

use crate::metadata::Color;
use crate::qr::QR;

#[derive(Debug, PartialEq, Eq, Copy, Clone, PartialOrd, Ord)]
pub struct MaskPattern(u8);

impl MaskPattern {
    pub fn new(pattern: u8) -> Self {
        debug_assert!(pattern < 8, "Invalid masking pattern");
        Self(pattern)
    }
}

impl Deref for MaskPattern {
    type Target = u8;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

// Mask functions take (x = column, y = row)
mod mask_functions {
    pub fn checkerboard(x: i16, y: i16) -> bool {
        (x + y) & 1 == 0
    }

    pub fn horizontal_lines(_: i16, y: i16) -> bool {
        y & 1 == 0
    }

    pub fn vertical_lines(x: i16, _: i16) -> bool {
        x % 3 == 0
    }

    pub fn diagonal_lines(x: i16, y: i16) -> bool {
        (x + y) % 3 == 0
    }

    pub fn large_checkerboard(x: i16, y: i16) -> bool {
        ((y >> 1) + (x / 3)) & 1 == 0
    }

    pub fn fields(x: i16, y: i16) -> bool {
        ((x * y) & 1) + ((x * y) % 3) == 0
    }

    pub fn diamonds(x: i16, y: i16) -> bool {
        (((x * y) & 1) + ((x * y) % 3)) & 1 == 0
    }

    pub fn meadow(x: i16, y: i16) -> bool {
        (((x + y) & 1) + ((x * y) % 3)) & 1 == 0
    }
}

impl MaskPattern {
    pub fn mask_function(self) -> fn(i16, i16) -> bool {
        match self.0 {
            0b000 => mask_functions::checkerboard,
            0b001 => mask_functions::horizontal_lines,
            0b010 => mask_functions::vertical_lines,
            0b011 => mask_functions::diagonal_lines,
            0b100 => mask_functions::large_checkerboard,
            0b101 => mask_functions::fields,
            0b110 => mask_functions::diamonds,
            0b111 => mask_functions::meadow,
            _ => unreachable!("Invalid masking pattern"),
        }
    }
}

// Best mask search
//------------------------------------------------------------------------------

// Ties break toward the lowest mask index because min_by_key keeps
// the first minimum.
pub(crate) fn apply_best_mask(qr: &mut QR) -> MaskPattern {
    let best_mask = (0..8)
        .min_by_key(|&m| {
            let mut masked = qr.clone();
            masked.apply_mask(MaskPattern(m));
            compute_total_penalty(&masked)
        })
        .expect("Should return at least 1 mask");
    let best_mask = MaskPattern(best_mask);
    qr.apply_mask(best_mask);
    best_mask
}

// Penalty scores
//------------------------------------------------------------------------------

pub(crate) fn compute_total_penalty(qr: &QR) -> u32 {
    compute_adjacent_penalty(qr)
        + compute_block_penalty(qr)
        + compute_finder_pattern_penalty(qr, true)
        + compute_finder_pattern_penalty(qr, false)
        + compute_balance_penalty(qr)
}

// Rule 1: every run of 5 or more same-colored modules in a row or
// column scores 3 + (run length - 5)
fn compute_adjacent_penalty(qr: &QR) -> u32 {
    let mut penalty = 0;
    let w = qr.width() as i16;
    for is_row in [true, false] {
        for i in 0..w {
            let mut last = *qr.get(if is_row { i } else { 0 }, if is_row { 0 } else { i });
            let mut run_len = 1u32;
            for j in 1..w {
                let color = if is_row { *qr.get(i, j) } else { *qr.get(j, i) };
                if color == last {
                    run_len += 1;
                } else {
                    if run_len >= 5 {
                        penalty += run_len - 2;
                    }
                    last = color;
                    run_len = 1;
                }
            }
            if run_len >= 5 {
                penalty += run_len - 2;
            }
        }
    }
    penalty
}

// Rule 2: every 2x2 block of same-colored modules scores 3
fn compute_block_penalty(qr: &QR) -> u32 {
    let mut penalty = 0;
    let w = qr.width() as i16;
    for r in 0..w - 1 {
        for c in 0..w - 1 {
            let color = *qr.get(r, c);
            if color == *qr.get(r + 1, c)
                && color == *qr.get(r, c + 1)
                && color == *qr.get(r + 1, c + 1)
            {
                penalty += 3;
            }
        }
    }
    penalty
}

// Rule 3: every 1:1:3:1:1 finder-like pattern bordered by a 4-module
// light run, in a row or column, scores 40
fn compute_finder_pattern_penalty(qr: &QR, is_hor: bool) -> u32 {
    let mut penalty = 0;
    let w = qr.width() as i16;
    for i in 0..w {
        let mut window = 0u16;
        for j in 0..w {
            let color = if is_hor { *qr.get(i, j) } else { *qr.get(j, i) };
            window = (window << 1) & 0x7FF;
            if color == Color::Dark {
                window |= 1;
            }
            if j >= 10 && (window == 0b10111010000 || window == 0b00001011101) {
                penalty += 40;
            }
        }
    }
    penalty
}

// Rule 4: deviation of the dark-module ratio from 50%, in steps of 5%,
// scores 10 per step
fn compute_balance_penalty(qr: &QR) -> u32 {
    let dark_count = qr.count_dark_modules();
    let w = qr.width();
    let total = w * w;
    let percentage = dark_count * 100 / total;
    (percentage.abs_diff(50) / 5 * 10) as u32
}

#[cfg(test)]
mod mask_tests {
    use super::{
        compute_adjacent_penalty, compute_balance_penalty, compute_block_penalty,
        compute_finder_pattern_penalty, MaskPattern,
    };
    use crate::metadata::{Color, ECLevel, Version};
    use crate::qr::{Module, QR};

    fn filled_qr(version: Version, color: Color) -> QR {
        let mut qr = QR::new(version, ECLevel::L);
        let w = qr.width() as i16;
        for r in 0..w {
            for c in 0..w {
                qr.set(r, c, Module::Data(color));
            }
        }
        qr
    }

    #[test]
    fn test_mask_function_checkerboard() {
        let f = MaskPattern::new(0).mask_function();
        assert!(f(0, 0));
        assert!(!f(1, 0));
        assert!(!f(0, 1));
        assert!(f(1, 1));
    }

    #[test]
    fn test_mask_function_row_stripes() {
        let f = MaskPattern::new(1).mask_function();
        for x in 0..10 {
            assert!(f(x, 0));
            assert!(!f(x, 1));
            assert!(f(x, 2));
        }
    }

    #[test]
    fn test_adjacent_penalty_uniform_grid() {
        let qr = filled_qr(Version::Normal(1), Color::Light);
        // 21 rows and 21 columns, each a single run of 21
        assert_eq!(compute_adjacent_penalty(&qr), 2 * 21 * (3 + 21 - 5));
    }

    #[test]
    fn test_adjacent_penalty_short_runs() {
        let mut qr = filled_qr(Version::Normal(1), Color::Light);
        let w = qr.width() as i16;
        // Alternate colors every 4 modules so no run reaches 5
        for r in 0..w {
            for c in 0..w {
                let color = if (c / 4 + r) & 1 == 0 { Color::Light } else { Color::Dark };
                qr.set(r, c, Module::Data(color));
            }
        }
        assert_eq!(compute_adjacent_penalty(&qr), 0);
    }

    #[test]
    fn test_block_penalty_uniform_grid() {
        let qr = filled_qr(Version::Normal(1), Color::Dark);
        assert_eq!(compute_block_penalty(&qr), 3 * 20 * 20);
    }

    #[test]
    fn test_finder_pattern_penalty() {
        let mut qr = filled_qr(Version::Normal(1), Color::Light);
        // Paint 1011101 at the start of row 0; the trailing 0000 makes
        // exactly one horizontal occurrence
        for c in [0, 2, 3, 4, 6] {
            qr.set(0, c, Module::Data(Color::Dark));
        }
        assert_eq!(compute_finder_pattern_penalty(&qr, true), 40);
        assert_eq!(compute_finder_pattern_penalty(&qr, false), 0);
    }

    #[test]
    fn test_best_mask_has_minimum_penalty() {
        let (bits, version) = crate::codec::encode(b"MASK OPTIMALITY", ECLevel::Q).unwrap();
        let (data_blocks, ecc_blocks) = crate::ec::ecc(bits.data(), version, ECLevel::Q);
        let mut payload: Vec<u8> = data_blocks.concat();
        payload.extend(ecc_blocks.concat());

        let mut qr = QR::new(version, ECLevel::Q);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(&payload);

        let unmasked = qr.clone();
        let best = super::apply_best_mask(&mut qr);
        let penalties = (0..8)
            .map(|m| {
                let mut trial = unmasked.clone();
                trial.apply_mask(MaskPattern::new(m));
                super::compute_total_penalty(&trial)
            })
            .collect::<Vec<_>>();
        let min = penalties.iter().min().unwrap();
        assert_eq!(penalties[*best as usize], *min);
        // Ties break toward the lowest index
        let first_min = penalties.iter().position(|p| p == min).unwrap();
        assert_eq!(*best as usize, first_min);
    }

    #[test]
    fn test_balance_penalty() {
        let qr = filled_qr(Version::Normal(1), Color::Dark);
        assert_eq!(compute_balance_penalty(&qr), 100);
        let qr = filled_qr(Version::Normal(1), Color::Light);
        assert_eq!(compute_balance_penalty(&qr), 100);
    }
}
