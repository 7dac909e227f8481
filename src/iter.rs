use crate::metadata::Version;

// Iterator over the encoding region of the symbol
//------------------------------------------------------------------------------

// Walks column pairs right to left, alternating between upward and
// downward, and skips over the vertical timing column.
pub struct EncRegionIter {
    r: i16,
    c: i16,
    width: i16,
    vert_timing_col: i16,
}

impl EncRegionIter {
    pub const fn new(version: Version) -> Self {
        let w = version.width() as i16;
        Self { r: w - 1, c: w - 1, width: w, vert_timing_col: 6 }
    }
}

impl Iterator for EncRegionIter {
    type Item = (i16, i16);
    fn next(&mut self) -> Option<Self::Item> {
        let adjusted_col = if self.c <= self.vert_timing_col { self.c + 1 } else { self.c };
        if self.c < 0 {
            return None;
        }
        let res = (self.r, self.c);
        let col_type = (self.width - adjusted_col) % 4;
        match col_type {
            2 if self.r > 0 => {
                self.r -= 1;
                self.c += 1;
            }
            0 if self.r < self.width - 1 => {
                self.r += 1;
                self.c += 1;
            }
            0 | 2 if self.c == self.vert_timing_col + 1 => {
                self.c -= 2;
            }
            _ => {
                self.c -= 1;
            }
        }
        Some(res)
    }
}

#[cfg(test)]
mod iter_tests {
    use super::EncRegionIter;
    use crate::metadata::Version;

    #[test]
    fn test_covers_every_module_except_timing_column() {
        for v in 1..=40 {
            let version = Version::Normal(v);
            let w = version.width();
            let mut seen = vec![false; w * w];
            for (r, c) in EncRegionIter::new(version) {
                assert!(c != 6, "Timing column visited at version {v}");
                let idx = r as usize * w + c as usize;
                assert!(!seen[idx], "Module ({r}, {c}) visited twice at version {v}");
                seen[idx] = true;
            }
            let visited = seen.iter().filter(|&&s| s).count();
            assert_eq!(visited, w * w - w, "Wrong coverage at version {v}");
        }
    }

    #[test]
    fn test_starts_bottom_right_and_zigzags_upward() {
        let version = Version::Normal(1);
        let w = version.width() as i16;
        let coords = EncRegionIter::new(version).take(6).collect::<Vec<_>>();
        assert_eq!(
            coords,
            vec![
                (w - 1, w - 1),
                (w - 1, w - 2),
                (w - 2, w - 1),
                (w - 2, w - 2),
                (w - 3, w - 1),
                (w - 3, w - 2),
            ]
        );
    }
}
