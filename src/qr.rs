use std::ops::Deref;

use itertools::izip;

use crate::iter::EncRegionIter;
use crate::mask::MaskPattern;
use crate::metadata::{
    format_info, Color, ECLevel, Version, FORMAT_INFO_BIT_LEN, FORMAT_INFO_COORDS_MAIN,
    FORMAT_INFO_COORDS_SIDE, VERSION_INFO_BIT_LEN, VERSION_INFO_COORDS_BL, VERSION_INFO_COORDS_TR,
};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Module {
    Empty,
    Finder(Color),
    Alignment(Color),
    Func(Color),
    Format(Color),
    Version(Color),
    Data(Color),
}

impl Deref for Module {
    type Target = Color;
    fn deref(&self) -> &Self::Target {
        match self {
            Module::Empty => &Color::Dark,
            Module::Finder(c) => c,
            Module::Alignment(c) => c,
            Module::Func(c) => c,
            Module::Format(c) => c,
            Module::Version(c) => c,
            Module::Data(c) => c,
        }
    }
}

/// A built QR symbol: a square grid of dark/light modules plus the
/// metadata a renderer needs. Constructed through `QRBuilder`.
#[derive(Debug, Clone)]
pub struct QR {
    version: Version,
    width: usize,
    ec_level: ECLevel,
    mask: Option<MaskPattern>,
    // Center of the bottom-right-most alignment pattern, if any
    last_alignment: Option<(i16, i16)>,
    grid: Vec<Module>,
}

// QR accessors and indexing
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn new(version: Version, ec_level: ECLevel) -> Self {
        debug_assert!(matches!(version, Version::Normal(1..=40)), "Invalid version");

        let width = version.width();
        Self {
            version,
            width,
            ec_level,
            mask: None,
            last_alignment: None,
            grid: vec![Module::Empty; width * width],
        }
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// Side length of the symbol without the quiet zone.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn ec_level(&self) -> ECLevel {
        self.ec_level
    }

    /// The mask applied to the symbol; `None` until the build masks it.
    pub fn mask(&self) -> Option<MaskPattern> {
        self.mask
    }

    pub fn border_size(&self) -> usize {
        QUIET_ZONE_WIDTH
    }

    pub fn count_dark_modules(&self) -> usize {
        self.grid.iter().filter(|&m| matches!(**m, Color::Dark)).count()
    }

    #[cfg(test)]
    pub fn to_debug_str(&self) -> String {
        let w = self.width as i16;
        let mut res = String::with_capacity((w * (w + 1)) as usize);
        res.push('\n');
        for i in 0..w {
            for j in 0..w {
                let c = match self.get(i, j) {
                    Module::Empty => '.',
                    Module::Finder(Color::Dark)
                    | Module::Alignment(Color::Dark)
                    | Module::Func(Color::Dark) => 'f',
                    Module::Finder(Color::Light)
                    | Module::Alignment(Color::Light)
                    | Module::Func(Color::Light) => 'F',
                    Module::Version(Color::Dark) => 'v',
                    Module::Version(Color::Light) => 'V',
                    Module::Format(Color::Dark) => 'm',
                    Module::Format(Color::Light) => 'M',
                    Module::Data(Color::Dark) => 'd',
                    Module::Data(Color::Light) => 'D',
                };
                res.push(c);
            }
            res.push('\n');
        }
        res
    }

    fn coord_to_index(&self, r: i16, c: i16) -> usize {
        let w = self.width as i16;
        debug_assert!(-w <= r && r < w, "Row out of bound: {r}");
        debug_assert!(-w <= c && c < w, "Column out of bound: {c}");

        let r = if r < 0 { r + w } else { r };
        let c = if c < 0 { c + w } else { c };
        (r * w + c) as _
    }

    pub(crate) fn get(&self, r: i16, c: i16) -> Module {
        self.grid[self.coord_to_index(r, c)]
    }

    pub(crate) fn get_mut(&mut self, r: i16, c: i16) -> &mut Module {
        let index = self.coord_to_index(r, c);
        &mut self.grid[index]
    }

    pub(crate) fn set(&mut self, r: i16, c: i16, module: Module) {
        *self.get_mut(r, c) = module;
    }
}


// Finder patterns
//------------------------------------------------------------------------------

impl QR {
    fn draw_finder_patterns(&mut self) {
        self.draw_finder_pattern_at(3, 3);
        self.draw_finder_pattern_at(3, -4);
        self.draw_finder_pattern_at(-4, 3);
    }

    fn draw_finder_pattern_at(&mut self, r: i16, c: i16) {
        let (dr_left, dr_right) = if r > 0 { (-3, 4) } else { (-4, 3) };
        let (dc_top, dc_bottom) = if c > 0 { (-3, 4) } else { (-4, 3) };
        for i in dr_left..=dr_right {
            for j in dc_top..=dc_bottom {
                self.set(
                    r + i,
                    c + j,
                    match (i, j) {
                        (4 | -4, _) | (_, 4 | -4) => Module::Func(Color::Light),
                        (3 | -3, _) | (_, 3 | -3) => Module::Finder(Color::Dark),
                        (2 | -2, _) | (_, 2 | -2) => Module::Finder(Color::Light),
                        _ => Module::Finder(Color::Dark),
                    },
                );
            }
        }
    }

    /// Top-left corners of the three finder patterns as `(x, y)` in
    /// symbol coordinates, without the quiet zone.
    pub fn finder_pattern_points(&self) -> [(i16, i16); 3] {
        let w = self.width as i16;
        [(0, 0), (w - 7, 0), (0, w - 7)]
    }
}

#[cfg(test)]
mod finder_pattern_tests {
    use crate::metadata::{ECLevel, Version};

    use super::QR;

    #[test]
    fn test_finder_patterns() {
        let mut qr = QR::new(Version::Normal(1), ECLevel::L);
        qr.draw_finder_patterns();
        assert_eq!(
            qr.to_debug_str(),
            "\n\
             fffffffF.....Ffffffff\n\
             fFFFFFfF.....FfFFFFFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFfffFfF.....FfFfffFf\n\
             fFFFFFfF.....FfFFFFFf\n\
             fffffffF.....Ffffffff\n\
             FFFFFFFF.....FFFFFFFF\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             .....................\n\
             FFFFFFFF.............\n\
             fffffffF.............\n\
             fFFFFFfF.............\n\
             fFfffFfF.............\n\
             fFfffFfF.............\n\
             fFfffFfF.............\n\
             fFFFFFfF.............\n\
             fffffffF.............\n"
        );
    }

    #[test]
    fn test_finder_pattern_points() {
        let qr = QR::new(Version::Normal(2), ECLevel::L);
        assert_eq!(qr.finder_pattern_points(), [(0, 0), (18, 0), (0, 18)]);
    }
}

// Timing patterns
//------------------------------------------------------------------------------

impl QR {
    fn draw_timing_patterns(&mut self) {
        let w = self.width as i16;
        self.draw_line(6, 8, 6, w - 9);
        self.draw_line(8, 6, w - 9, 6);
    }

    fn draw_line(&mut self, r1: i16, c1: i16, r2: i16, c2: i16) {
        debug_assert!(r1 == r2 || c1 == c2, "Line is neither vertical nor horizontal");

        if r1 == r2 {
            for j in c1..=c2 {
                let m =
                    if j & 1 == 0 { Module::Func(Color::Dark) } else { Module::Func(Color::Light) };
                self.set(r1, j, m);
            }
        } else {
            for i in r1..=r2 {
                let m =
                    if i & 1 == 0 { Module::Func(Color::Dark) } else { Module::Func(Color::Light) };
                self.set(i, c1, m);
            }
        }
    }
}


// Alignment patterns
//------------------------------------------------------------------------------

impl QR {
    fn draw_alignment_patterns(&mut self) {
        let positions = self.version.alignment_pattern();
        for &r in positions {
            for &c in positions {
                self.draw_alignment_pattern_at(r, c);
            }
        }
    }

    fn draw_alignment_pattern_at(&mut self, r: i16, c: i16) {
        let w = self.width as i16;
        if (r == 6 && (c == 6 || c - w == -7)) || (r - w == -7 && c == 6) {
            return;
        }
        for i in -2..=2 {
            for j in -2..=2 {
                self.set(
                    r + i,
                    c + j,
                    match (i, j) {
                        (-2 | 2, _) | (_, -2 | 2) | (0, 0) => Module::Alignment(Color::Dark),
                        _ => Module::Alignment(Color::Light),
                    },
                )
            }
        }
        self.last_alignment = Some((r, c));
    }
}


// All function patterns
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn draw_all_function_patterns(&mut self) {
        self.draw_finder_patterns();
        self.draw_timing_patterns();
        self.draw_alignment_patterns();
    }
}


// Format & version info
//------------------------------------------------------------------------------

impl QR {
    fn reserve_format_area(&mut self) {
        self.draw_format_info((1 << FORMAT_INFO_BIT_LEN) - 1);
    }

    fn draw_format_info(&mut self, format_info: u32) {
        self.draw_number(
            format_info,
            FORMAT_INFO_BIT_LEN,
            Module::Format(Color::Light),
            Module::Format(Color::Dark),
            &FORMAT_INFO_COORDS_MAIN,
        );
        self.draw_number(
            format_info,
            FORMAT_INFO_BIT_LEN,
            Module::Format(Color::Light),
            Module::Format(Color::Dark),
            &FORMAT_INFO_COORDS_SIDE,
        );
        // Fixed dark module above the bottom-left finder
        self.set(-8, 8, Module::Format(Color::Dark));
    }

    fn draw_version_info(&mut self) {
        match self.version {
            Version::Normal(1..=6) => {}
            Version::Normal(_) => {
                let version_info = self.version.version_info();
                self.draw_number(
                    version_info,
                    VERSION_INFO_BIT_LEN,
                    Module::Version(Color::Light),
                    Module::Version(Color::Dark),
                    &VERSION_INFO_COORDS_BL,
                );
                self.draw_number(
                    version_info,
                    VERSION_INFO_BIT_LEN,
                    Module::Version(Color::Light),
                    Module::Version(Color::Dark),
                    &VERSION_INFO_COORDS_TR,
                );
            }
        }
    }

    fn draw_number(
        &mut self,
        number: u32,
        bit_len: usize,
        off_color: Module,
        on_color: Module,
        coords: &[(i16, i16)],
    ) {
        let masks = (0..bit_len).rev().map(|i| 1 << i);
        for (mask, (r, c)) in izip!(masks, coords) {
            let module = if number & mask == 0 { off_color } else { on_color };
            self.set(*r, *c, module);
        }
    }
}


// Encoding region
//------------------------------------------------------------------------------

impl QR {
    pub(crate) fn draw_encoding_region(&mut self, payload: &[u8]) {
        self.reserve_format_area();
        self.draw_version_info();
        self.draw_payload(payload);

        let empty = self.grid.iter().filter(|&&m| m == Module::Empty).count();
        assert!(empty == 0, "{empty} unfilled modules left in version {} symbol", self.version);
    }

    fn draw_payload(&mut self, payload: &[u8]) {
        let mut coords = EncRegionIter::new(self.version);
        self.draw_codewords(payload, &mut coords);
        self.fill_remainder_bits(&mut coords);
    }

    fn draw_codewords(&mut self, codewords: &[u8], coords: &mut EncRegionIter) {
        for &codeword in codewords.iter() {
            for i in (0..8).rev() {
                let bit = (codeword >> i) & 1;
                let module = Module::Data(if bit == 0 { Color::Light } else { Color::Dark });
                for (r, c) in coords.by_ref() {
                    if matches!(self.get(r, c), Module::Empty) {
                        self.set(r, c, module);
                        break;
                    }
                }
            }
        }
    }

    fn fill_remainder_bits(&mut self, coords: &mut EncRegionIter) {
        let empty_modules =
            coords.filter(|(r, c)| self.get(*r, *c) == Module::Empty).collect::<Vec<_>>();
        debug_assert!(
            empty_modules.len() == self.version.remainder_bits(),
            "Incorrect number of remainder modules: Version {}, Empty modules {}",
            self.version,
            empty_modules.len()
        );
        empty_modules.iter().for_each(|(r, c)| self.set(*r, *c, Module::Data(Color::Light)));
    }

    pub(crate) fn apply_mask(&mut self, pattern: MaskPattern) {
        let mask_function = pattern.mask_function();
        let w = self.width as i16;
        for r in 0..w {
            for c in 0..w {
                if mask_function(c, r) {
                    if let Module::Data(color) = self.get(r, c) {
                        self.set(r, c, Module::Data(!color));
                    }
                }
            }
        }
        let format_info = format_info(self.ec_level, pattern);
        self.draw_format_info(format_info);
        self.mask = Some(pattern);
    }
}

// Bitmap queries
//------------------------------------------------------------------------------

impl QR {
    fn blank_bitmap(&self) -> Vec<Vec<bool>> {
        let size = self.width + 2 * QUIET_ZONE_WIDTH;
        vec![vec![false; size]; size]
    }

    /// The full symbol as a `[y][x]`-indexed boolean matrix, quiet zone
    /// included. `true` is a dark module.
    pub fn bitmap(&self) -> Vec<Vec<bool>> {
        let mut bitmap = self.blank_bitmap();
        for r in 0..self.width as i16 {
            for c in 0..self.width as i16 {
                bitmap[r as usize + QUIET_ZONE_WIDTH][c as usize + QUIET_ZONE_WIDTH] =
                    *self.get(r, c) == Color::Dark;
            }
        }
        bitmap
    }

    /// Dark modules of the three finder patterns only, sized the same
    /// as `bitmap()`.
    pub fn finder_pattern_bitmap(&self) -> Vec<Vec<bool>> {
        let mut bitmap = self.blank_bitmap();
        for r in 0..self.width as i16 {
            for c in 0..self.width as i16 {
                bitmap[r as usize + QUIET_ZONE_WIDTH][c as usize + QUIET_ZONE_WIDTH] =
                    self.get(r, c) == Module::Finder(Color::Dark);
            }
        }
        bitmap
    }

    /// Dark modules of the bottom-right-most alignment pattern only,
    /// sized the same as `bitmap()`. All light for version 1, which has
    /// no alignment patterns.
    pub fn last_alignment_pattern_bitmap(&self) -> Vec<Vec<bool>> {
        let mut bitmap = self.blank_bitmap();
        if let Some((ar, ac)) = self.last_alignment {
            for i in -2..=2 {
                for j in -2..=2 {
                    let (r, c) = (ar + i, ac + j);
                    bitmap[r as usize + QUIET_ZONE_WIDTH][c as usize + QUIET_ZONE_WIDTH] =
                        self.get(r, c) == Module::Alignment(Color::Dark);
                }
            }
        }
        bitmap
    }
}


// Global constants
//------------------------------------------------------------------------------

pub const QUIET_ZONE_WIDTH: usize = 4;
