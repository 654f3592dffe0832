use crate::bitlogics::{bit_of_slice, group_of_slice, set_bit_of_slice, set_group_of_slice};
use crate::blocklogics::{level_for_bits, read_binary_block, read_block};
use crate::geometry::{FrameGeometry, FRAME_HEADER_BITS};
use crate::videoframe::VideoFrame;

/// Codeword id marking the stream-header frame. Payload codeword ids are
/// chunk indices and stay below this sentinel.
pub const HEADER_CODEWORD: u32 = u32::MAX;

/// Per-frame metadata embedded ahead of the payload, one bit per cell.
/// One bit per cell keeps this readable at the most robust quantization
/// even when the payload uses a denser alphabet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    pub frame_index: u32,
    pub codeword_id: u32,
    /// Which shard of the codeword this frame carries.
    pub sub_index: u16,
}

/// Everything read back from one captured frame.
///
/// `valid` is false when the corner markers are off or the payload CRC does
/// not match; such a frame becomes an erasure for the error-correction
/// layer. Disassembly never aborts a decode.
#[derive(Debug, Clone)]
pub struct FrameContent {
    pub header: FrameHeader,
    pub payload: Vec<u8>,
    pub valid: bool,
    /// Payload cells whose quantization was ambiguous.
    pub suspect_cells: usize,
}

impl FrameContent {
    fn invalid() -> FrameContent {
        FrameContent {
            header: FrameHeader {
                frame_index: 0,
                codeword_id: 0,
                sub_index: 0,
            },
            payload: Vec::new(),
            valid: false,
            suspect_cells: 0,
        }
    }
}

fn binary_level(bit: bool) -> u8 {
    if bit {
        255
    } else {
        0
    }
}

/// Corner marker cells and their expected brightness. Three bright corners
/// and a dark bottom-left make the pattern asymmetric under rotation and
/// mirroring, so a flipped capture fails validation instead of misdecoding.
fn marker_cells(geometry: &FrameGeometry) -> [(usize, bool); 4] {
    let cols = geometry.cols();
    let cells = geometry.cells();
    [
        (0, true),                   // top-left
        (cols - 1, true),            // top-right
        (cells - cols, false),       // bottom-left
        (cells - 1, true),           // bottom-right
    ]
}

/// Raster-order cell indices with the corner markers skipped. The first
/// `FRAME_HEADER_BITS` of these carry the frame header, the rest payload.
fn data_cells(geometry: &FrameGeometry) -> impl Iterator<Item = usize> {
    let corners = marker_cells(geometry).map(|(index, _)| index);
    (0..geometry.cells()).filter(move |index| !corners.contains(index))
}

/// Lay the payload out on a frame canvas: corner markers, embedded frame
/// header, then the payload bytes MSB-first at the geometry's bits-per-block,
/// unused cells left dark.
pub fn assemble_frame(
    geometry: &FrameGeometry,
    header: &FrameHeader,
    payload: &[u8],
) -> VideoFrame {
    assert!(
        payload.len() <= geometry.capacity_bytes(),
        "payload of {} bytes exceeds the frame capacity of {}",
        payload.len(),
        geometry.capacity_bytes()
    );
    assert!(
        payload.len() <= u16::MAX as usize,
        "payload length does not fit the 16-bit length field"
    );

    let mut meta = [0u8; FRAME_HEADER_BITS / 8];
    meta[0..4].copy_from_slice(&header.frame_index.to_be_bytes());
    meta[4..8].copy_from_slice(&header.codeword_id.to_be_bytes());
    meta[8..10].copy_from_slice(&header.sub_index.to_be_bytes());
    meta[10..12].copy_from_slice(&(payload.len() as u16).to_be_bytes());
    meta[12..16].copy_from_slice(&crc32fast::hash(payload).to_be_bytes());

    let bits = geometry.alphabet.bits_per_block();
    let mut cell_values = vec![0u8; geometry.cells()];
    for (index, bright) in marker_cells(geometry) {
        cell_values[index] = binary_level(bright);
    }
    for (position, cell) in data_cells(geometry).enumerate() {
        if position < FRAME_HEADER_BITS {
            cell_values[cell] = binary_level(bit_of_slice(&meta, position));
        } else {
            let group = position - FRAME_HEADER_BITS;
            let value = group_of_slice(payload, group * bits as usize, bits);
            cell_values[cell] = level_for_bits(value, geometry.alphabet);
        }
    }

    let mut frame = VideoFrame::new(geometry.width, geometry.height);
    frame.fill_from_cells(&cell_values, geometry.block_size);
    frame
}

/// Inverse of [`assemble_frame`] over a captured frame.
pub fn disassemble_frame(geometry: &FrameGeometry, frame: &VideoFrame) -> FrameContent {
    if frame.width != geometry.width || frame.height != geometry.height {
        return FrameContent::invalid();
    }
    let samples = frame.sample_cells(geometry.block_size);

    let markers_found = marker_cells(geometry)
        .iter()
        .all(|(index, bright)| read_binary_block(samples[*index]) == *bright);

    let bits = geometry.alphabet.bits_per_block();
    let mut meta = [0u8; FRAME_HEADER_BITS / 8];
    let mut payload = vec![0u8; geometry.capacity_bytes()];
    let mut suspect_cells = 0;
    for (position, cell) in data_cells(geometry).enumerate() {
        if position < FRAME_HEADER_BITS {
            set_bit_of_slice(&mut meta, position, read_binary_block(samples[cell]));
        } else {
            let group = position - FRAME_HEADER_BITS;
            let read = read_block(samples[cell], geometry.alphabet);
            if read.is_suspect() {
                suspect_cells += 1;
            }
            set_group_of_slice(&mut payload, group * bits as usize, bits, read.bits);
        }
    }

    let header = FrameHeader {
        frame_index: u32::from_be_bytes(meta[0..4].try_into().unwrap()),
        codeword_id: u32::from_be_bytes(meta[4..8].try_into().unwrap()),
        sub_index: u16::from_be_bytes([meta[8], meta[9]]),
    };
    let payload_len = u16::from_be_bytes([meta[10], meta[11]]) as usize;
    let stored_crc = u32::from_be_bytes(meta[12..16].try_into().unwrap());

    let length_ok = payload_len <= payload.len();
    if length_ok {
        payload.truncate(payload_len);
    } else {
        payload.clear();
    }
    let crc_ok = length_ok && crc32fast::hash(&payload) == stored_crc;

    FrameContent {
        header,
        payload,
        valid: markers_found && crc_ok,
        suspect_cells,
    }
}
