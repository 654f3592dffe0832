use crate::geometry::BlockAlphabet;

/// Confidence under which a block read is surfaced as a suspected bit error.
pub const LOW_CONFIDENCE: f32 = 0.25;

/// One decoded block: the bit group it carries and how sure the quantizer
/// is about it. Ambiguity is a recoverable signal for the error-correction
/// layer, never an error.
#[derive(Debug, Clone, Copy)]
pub struct BlockRead {
    pub bits: u8,
    /// 1.0 when the sample sits exactly on a level, 0.0 when it sits on the
    /// decision boundary between two levels.
    pub confidence: f32,
}

impl BlockRead {
    pub fn is_suspect(&self) -> bool {
        self.confidence < LOW_CONFIDENCE
    }
}

/// Grey level painted for a bit group.
/// Levels are spread evenly over 0..=255 so the spacing between any two
/// neighbours is maximal for the alphabet.
pub fn level_for_bits(bits: u8, alphabet: BlockAlphabet) -> u8 {
    let top = (alphabet.levels() - 1) as u16;
    ((bits as u16 * 255) / top) as u8
}

/// Quantize a sampled grey value back to a bit group.
///
/// The nearest level wins; the decision boundaries are the midpoints between
/// levels, so a sample survives any drift below half the inter-level spacing.
/// The confidence score falls linearly from 1.0 (on the level) to 0.0 (on a
/// boundary).
pub fn read_block(sample: u8, alphabet: BlockAlphabet) -> BlockRead {
    let top = (alphabet.levels() - 1) as f32;
    let spacing = 255.0 / top;
    let level = ((sample as f32 / spacing) + 0.5).floor().min(top) as u8;
    let ideal = level_for_bits(level, alphabet) as f32;
    let drift = (sample as f32 - ideal).abs();
    let confidence = (1.0 - drift / (spacing / 2.0)).clamp(0.0, 1.0);
    BlockRead {
        bits: level,
        confidence,
    }
}

/// Binary threshold used for marker cells and the embedded frame header,
/// which are written one bit per cell whatever the payload alphabet.
pub fn read_binary_block(sample: u8) -> bool {
    sample >= 128
}

#[cfg(test)]
mod blocklogics_tests {
    use super::*;

    #[test]
    fn test_level_for_bits_binary() {
        assert_eq!(level_for_bits(0, BlockAlphabet::Binary), 0);
        assert_eq!(level_for_bits(1, BlockAlphabet::Binary), 255);
    }

    #[test]
    fn test_level_for_bits_quad() {
        assert_eq!(level_for_bits(0, BlockAlphabet::Quad), 0);
        assert_eq!(level_for_bits(1, BlockAlphabet::Quad), 85);
        assert_eq!(level_for_bits(2, BlockAlphabet::Quad), 170);
        assert_eq!(level_for_bits(3, BlockAlphabet::Quad), 255);
    }

    #[test]
    fn test_read_block_exact_levels() {
        for alphabet in [BlockAlphabet::Binary, BlockAlphabet::Quad, BlockAlphabet::Hex] {
            for bits in 0..alphabet.levels() {
                let read = read_block(level_for_bits(bits, alphabet), alphabet);
                assert_eq!(read.bits, bits);
                assert!(read.confidence > 0.9);
            }
        }
    }

    #[test]
    fn test_read_block_tolerates_drift_below_half_spacing() {
        // Quad levels sit 85 apart; anything within 42 of a level must
        // still decode to it.
        for drift in 0u8..42 {
            let up = read_block(85 + drift, BlockAlphabet::Quad);
            let down = read_block(85 - drift, BlockAlphabet::Quad);
            assert_eq!(up.bits, 1);
            assert_eq!(down.bits, 1);
        }
    }

    #[test]
    fn test_read_block_boundary_is_low_confidence() {
        // 127/128 sit on the decision boundary between quad levels 1 and 2
        let read = read_block(127, BlockAlphabet::Quad);
        assert!(read.is_suspect());
        let read = read_block(128, BlockAlphabet::Quad);
        assert!(read.is_suspect());
    }

    #[test]
    fn test_read_block_confidence_drops_with_drift() {
        let near = read_block(90, BlockAlphabet::Quad);
        let far = read_block(110, BlockAlphabet::Quad);
        assert_eq!(near.bits, 1);
        assert_eq!(far.bits, 1);
        assert!(near.confidence > far.confidence);
    }

    #[test]
    fn test_read_binary_block_threshold() {
        assert_eq!(read_binary_block(0), false);
        assert_eq!(read_binary_block(127), false);
        assert_eq!(read_binary_block(128), true);
        assert_eq!(read_binary_block(255), true);
    }
}
