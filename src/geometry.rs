use crate::errors::CodecError;

/// Grid cells reserved for the corner markers.
pub const MARKER_CELLS: usize = 4;

/// Cells reserved for the embedded frame header, one bit per cell:
/// frame index (32), codeword id (32), shard sub-index (16),
/// payload length (16) and payload CRC-32 (32).
pub const FRAME_HEADER_BITS: usize = 128;

pub const DEFAULT_WIDTH: u16 = 1920;
pub const DEFAULT_HEIGHT: u16 = 1080;
pub const DEFAULT_BLOCK_SIZE: u16 = 8;

/// How many distinguishable grey levels one block may take.
///
/// More levels pack more bits per block but shrink the spacing between
/// levels, so the stream becomes less tolerant to compression drift.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BlockAlphabet {
    /// 2 levels, 1 bit per block. Most robust.
    Binary,
    /// 4 levels, 2 bits per block.
    Quad,
    /// 16 levels, 4 bits per block. Needs a gentle codec.
    Hex,
}

impl BlockAlphabet {
    pub fn levels(&self) -> u8 {
        match self {
            Self::Binary => 2,
            Self::Quad => 4,
            Self::Hex => 16,
        }
    }

    pub fn bits_per_block(&self) -> u8 {
        match self {
            Self::Binary => 1,
            Self::Quad => 2,
            Self::Hex => 4,
        }
    }

    /// Inverse of [`bits_per_block`], used when reading the value back
    /// from a stream header.
    pub fn from_bits_per_block(bits: u8) -> Option<BlockAlphabet> {
        match bits {
            1 => Some(Self::Binary),
            2 => Some(Self::Quad),
            4 => Some(Self::Hex),
            _ => None,
        }
    }
}

impl std::fmt::Display for BlockAlphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Binary => "binary",
            Self::Quad => "quad",
            Self::Hex => "hex",
        };
        s.fmt(f)
    }
}

impl std::str::FromStr for BlockAlphabet {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(Self::Binary),
            "quad" => Ok(Self::Quad),
            "hex" => Ok(Self::Hex),
            _ => Err(format!("Unknown alphabet: {s}")),
        }
    }
}

/// Immutable frame geometry shared by every component of one stream.
///
/// Carried explicitly into each call rather than living in a global so that
/// streams with different parameters can be processed side by side.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct FrameGeometry {
    pub width: u16,
    pub height: u16,
    /// Pixel edge of one block. A block covers `block_size`x`block_size`
    /// pixels all painted the same grey level.
    pub block_size: u16,
    pub alphabet: BlockAlphabet,
}

impl FrameGeometry {
    pub fn new(
        width: u16,
        height: u16,
        block_size: u16,
        alphabet: BlockAlphabet,
    ) -> Result<FrameGeometry, CodecError> {
        if block_size == 0 {
            return Err(CodecError::Geometry("block size must be at least 1".to_string()));
        }
        if width == 0 || height == 0 {
            return Err(CodecError::Geometry("frame dimensions must be non-zero".to_string()));
        }
        if width % block_size != 0 || height % block_size != 0 {
            return Err(CodecError::Geometry(format!(
                "frame {}x{} is not a multiple of the block size {}",
                width, height, block_size
            )));
        }
        let geometry = FrameGeometry {
            width,
            height,
            block_size,
            alphabet,
        };
        if geometry.cols() < 2 || geometry.rows() < 2 {
            return Err(CodecError::Geometry(
                "grid needs at least 2x2 cells for the corner markers".to_string(),
            ));
        }
        if geometry.payload_cells() == 0 || geometry.capacity_bytes() == 0 {
            return Err(CodecError::Geometry(format!(
                "grid of {} cells leaves no room for payload after {} reserved cells",
                geometry.cells(),
                MARKER_CELLS + FRAME_HEADER_BITS
            )));
        }
        Ok(geometry)
    }

    pub fn cols(&self) -> usize {
        self.width as usize / self.block_size as usize
    }

    pub fn rows(&self) -> usize {
        self.height as usize / self.block_size as usize
    }

    pub fn cells(&self) -> usize {
        self.cols() * self.rows()
    }

    /// Cells left for payload once markers and the frame header are placed.
    pub fn payload_cells(&self) -> usize {
        self.cells()
            .saturating_sub(MARKER_CELLS + FRAME_HEADER_BITS)
    }

    /// Whole bytes one frame can carry.
    pub fn capacity_bytes(&self) -> usize {
        self.payload_cells() * self.alphabet.bits_per_block() as usize / 8
    }
}
