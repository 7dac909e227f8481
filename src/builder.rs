use std::ops::Deref;

use crate::codec;
use crate::ec::ecc;
use crate::error::{QRError, QRResult};
use crate::mask::apply_best_mask;
use crate::metadata::{ECLevel, Version};
use crate::qr::QR;

/// Builds a QR symbol from raw data.
///
/// ```
/// use qrforge::{ECLevel, QRBuilder};
///
/// let qr = QRBuilder::new(b"HELLO WORLD").ec_level(ECLevel::M).build().unwrap();
/// assert_eq!(*qr.version(), 1);
/// ```
pub struct QRBuilder<'a> {
    data: &'a [u8],
    version: Option<Version>,
    ec_level: ECLevel,
}

impl<'a> QRBuilder<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, version: None, ec_level: ECLevel::M }
    }

    pub fn data(&mut self, data: &'a [u8]) -> &mut Self {
        self.data = data;
        self
    }

    /// Force a version instead of searching for the smallest fit.
    pub fn version(&mut self, version: Version) -> &mut Self {
        self.version = Some(version);
        self
    }

    pub fn unset_version(&mut self) -> &mut Self {
        self.version = None;
        self
    }

    pub fn ec_level(&mut self, ec_level: ECLevel) -> &mut Self {
        self.ec_level = ec_level;
        self
    }
}

impl QRBuilder<'_> {
    pub fn build(&self) -> QRResult<QR> {
        if self.data.is_empty() {
            return Err(QRError::EmptyData);
        }

        // Encode data into segments, padded out to the data capacity
        let (bits, version) = match self.version {
            Some(v) => (codec::encode_with_version(self.data, v, self.ec_level)?, v),
            None => codec::encode(self.data, self.ec_level)?,
        };

        // Compute error correction codewords per block
        let (data_blocks, ecc_blocks) = ecc(bits.data(), version, self.ec_level);

        // Interleave data blocks, then ec blocks
        let mut payload = Self::interleave(&data_blocks);
        payload.extend(Self::interleave(&ecc_blocks));
        debug_assert!(
            payload.len() == version.total_codewords(),
            "Payload length doesn't match total codewords: Payload {}, Total {}",
            payload.len(),
            version.total_codewords()
        );

        let mut qr = QR::new(version, self.ec_level);
        qr.draw_all_function_patterns();
        qr.draw_encoding_region(&payload);
        apply_best_mask(&mut qr);

        Ok(qr)
    }

    fn interleave<T: Copy, V: Deref<Target = [T]>>(blocks: &[V]) -> Vec<T> {
        let max_block_size = blocks.iter().map(|b| b.len()).max().expect("Blocks is empty");
        let total_size = blocks.iter().map(|b| b.len()).sum::<usize>();
        let mut res = Vec::with_capacity(total_size);
        for i in 0..max_block_size {
            for b in blocks {
                if i < b.len() {
                    res.push(b[i]);
                }
            }
        }
        res
    }
}
