use crate::ecclogics::Redundancy;
use crate::errors::CodecError;
use crate::geometry::{BlockAlphabet, FrameGeometry};

/// First bytes of every stream header.
pub const MAGIC: [u8; 8] = *b"FRAMEVLT";
pub const VERSION: u16 = 1;

/// Fixed encoded size of the stream header. The header must fit one frame's
/// payload capacity; the encoder validates that before emitting anything.
pub const HEADER_SIZE: usize = 96;

/// Identifier of the Reed-Solomon GF(2^8) erasure scheme, the only one
/// defined by format version 1.
pub const ECC_REED_SOLOMON: u8 = 1;

const CRC_OFFSET: usize = 72;

/// Manifest describing one encoded stream: how long the original file is,
/// how it was chunked and protected, and the digest the decoder verifies
/// the reassembled bytes against.
///
/// This is the only durable layout of the format. All multi-byte fields are
/// big-endian; unknown versions are rejected, never misparsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    pub byte_len: u64,
    pub chunk_size: u32,
    pub chunk_count: u32,
    pub data_shards: u8,
    pub parity_shards: u8,
    pub bits_per_block: u8,
    pub block_size: u16,
    pub width: u16,
    pub height: u16,
    /// SHA-256 of the original bytes.
    pub digest: [u8; 32],
}

impl StreamHeader {
    pub fn new(
        byte_len: u64,
        digest: [u8; 32],
        geometry: &FrameGeometry,
        redundancy: &Redundancy,
    ) -> StreamHeader {
        let chunk = redundancy.chunk_size as u64;
        let chunk_count = ((byte_len + chunk - 1) / chunk) as u32;
        StreamHeader {
            byte_len,
            chunk_size: redundancy.chunk_size,
            chunk_count,
            data_shards: redundancy.data_shards,
            parity_shards: redundancy.parity_shards,
            bits_per_block: geometry.alphabet.bits_per_block(),
            block_size: geometry.block_size,
            width: geometry.width,
            height: geometry.height,
            digest,
        }
    }

    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..8].copy_from_slice(&MAGIC);
        bytes[8..10].copy_from_slice(&VERSION.to_be_bytes());
        // 10..12 reserved
        bytes[12..20].copy_from_slice(&self.byte_len.to_be_bytes());
        bytes[20..24].copy_from_slice(&self.chunk_size.to_be_bytes());
        bytes[24..28].copy_from_slice(&self.chunk_count.to_be_bytes());
        bytes[28] = ECC_REED_SOLOMON;
        bytes[29] = self.data_shards;
        bytes[30] = self.parity_shards;
        bytes[31] = self.bits_per_block;
        bytes[32..34].copy_from_slice(&self.block_size.to_be_bytes());
        bytes[34..36].copy_from_slice(&self.width.to_be_bytes());
        bytes[36..38].copy_from_slice(&self.height.to_be_bytes());
        // 38..40 reserved
        bytes[40..72].copy_from_slice(&self.digest);
        let crc = crc32fast::hash(&bytes[..CRC_OFFSET]);
        bytes[CRC_OFFSET..CRC_OFFSET + 4].copy_from_slice(&crc.to_be_bytes());
        // 76..96 zero padding
        bytes
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<StreamHeader, CodecError> {
        if bytes.len() < HEADER_SIZE {
            return Err(CodecError::Format(format!(
                "header needs {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }
        if bytes[0..8] != MAGIC {
            return Err(CodecError::Format("bad magic value, not a framevault stream".to_string()));
        }
        let version = u16::from_be_bytes([bytes[8], bytes[9]]);
        if version != VERSION {
            return Err(CodecError::Format(format!(
                "unsupported stream version {version}, this build reads version {VERSION}"
            )));
        }
        let stored_crc = u32::from_be_bytes([
            bytes[CRC_OFFSET],
            bytes[CRC_OFFSET + 1],
            bytes[CRC_OFFSET + 2],
            bytes[CRC_OFFSET + 3],
        ]);
        if stored_crc != crc32fast::hash(&bytes[..CRC_OFFSET]) {
            return Err(CodecError::Format("header checksum mismatch".to_string()));
        }
        if bytes[28] != ECC_REED_SOLOMON {
            return Err(CodecError::Format(format!(
                "unknown error-correction scheme {}",
                bytes[28]
            )));
        }
        let mut digest = [0u8; 32];
        digest.copy_from_slice(&bytes[40..72]);
        Ok(StreamHeader {
            byte_len: u64::from_be_bytes(bytes[12..20].try_into().unwrap()),
            chunk_size: u32::from_be_bytes(bytes[20..24].try_into().unwrap()),
            chunk_count: u32::from_be_bytes(bytes[24..28].try_into().unwrap()),
            data_shards: bytes[29],
            parity_shards: bytes[30],
            bits_per_block: bytes[31],
            block_size: u16::from_be_bytes([bytes[32], bytes[33]]),
            width: u16::from_be_bytes([bytes[34], bytes[35]]),
            height: u16::from_be_bytes([bytes[36], bytes[37]]),
            digest,
        })
    }

    pub fn alphabet(&self) -> Result<BlockAlphabet, CodecError> {
        BlockAlphabet::from_bits_per_block(self.bits_per_block).ok_or_else(|| {
            CodecError::Format(format!("invalid bits-per-block {}", self.bits_per_block))
        })
    }

    pub fn redundancy(&self) -> Result<Redundancy, CodecError> {
        Redundancy::new(self.chunk_size, self.data_shards, self.parity_shards)
            .map_err(|e| CodecError::Format(format!("header carries invalid redundancy: {e}")))
    }
}

#[cfg(test)]
mod headerlogics_tests {
    use super::*;

    fn sample_header() -> StreamHeader {
        let geometry = FrameGeometry::new(64, 48, 2, BlockAlphabet::Quad).unwrap();
        let redundancy = Redundancy::new(256, 4, 2).unwrap();
        StreamHeader::new(1000, [7u8; 32], &geometry, &redundancy)
    }

    #[test]
    fn test_chunk_count_rounds_up() {
        let header = sample_header();
        assert_eq!(header.chunk_count, 4); // ceil(1000 / 256)
    }

    #[test]
    fn test_round_trip() {
        let header = sample_header();
        let bytes = header.to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);
        let decoded = StreamHeader::from_bytes(&bytes).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn test_zero_length_stream_header() {
        let geometry = FrameGeometry::new(64, 48, 2, BlockAlphabet::Quad).unwrap();
        let redundancy = Redundancy::new(256, 4, 2).unwrap();
        let header = StreamHeader::new(0, [0u8; 32], &geometry, &redundancy);
        assert_eq!(header.chunk_count, 0);
        let decoded = StreamHeader::from_bytes(&header.to_bytes()).unwrap();
        assert_eq!(decoded.byte_len, 0);
    }

    #[test]
    fn test_rejects_short_buffer() {
        let bytes = sample_header().to_bytes();
        let result = StreamHeader::from_bytes(&bytes[..HEADER_SIZE - 1]);
        assert!(matches!(result, Err(CodecError::Format(_))));
    }

    #[test]
    fn test_rejects_bad_magic() {
        let mut bytes = sample_header().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            StreamHeader::from_bytes(&bytes),
            Err(CodecError::Format(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_version() {
        let mut bytes = sample_header().to_bytes();
        bytes[8..10].copy_from_slice(&2u16.to_be_bytes());
        // A version bump must be detected, not misparsed; the CRC does not
        // get a chance to save us here so the version check must fire first.
        let result = StreamHeader::from_bytes(&bytes);
        match result {
            Err(CodecError::Format(message)) => assert!(message.contains("version")),
            other => panic!("expected format error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_rejects_corrupted_field() {
        let mut bytes = sample_header().to_bytes();
        bytes[21] ^= 0xFF; // chunk_size byte
        assert!(matches!(
            StreamHeader::from_bytes(&bytes),
            Err(CodecError::Format(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_ecc_scheme() {
        let header = sample_header();
        let mut bytes = header.to_bytes();
        bytes[28] = 9;
        let crc = crc32fast::hash(&bytes[..72]);
        bytes[72..76].copy_from_slice(&crc.to_be_bytes());
        assert!(matches!(
            StreamHeader::from_bytes(&bytes),
            Err(CodecError::Format(_))
        ));
    }

    #[test]
    fn test_accessors_recover_configuration() {
        let header = sample_header();
        assert_eq!(header.alphabet().unwrap(), BlockAlphabet::Quad);
        let redundancy = header.redundancy().unwrap();
        assert_eq!(redundancy.chunk_size, 256);
        assert_eq!(redundancy.data_shards, 4);
        assert_eq!(redundancy.parity_shards, 2);
    }
}
