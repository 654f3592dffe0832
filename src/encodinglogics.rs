use std::collections::VecDeque;

use sha2::{Digest, Sha256};

use crate::ecclogics::{Redundancy, ShardCoder};
use crate::errors::CodecError;
use crate::framelogics::{assemble_frame, FrameHeader, HEADER_CODEWORD};
use crate::geometry::FrameGeometry;
use crate::headerlogics::{StreamHeader, HEADER_SIZE};
use crate::videoframe::VideoFrame;

enum EncodeState {
    Header,
    Chunks,
    Done,
}

/// Turns a byte stream into its ordered frame sequence: the stream-header
/// frame first, then every chunk's codeword frames in chunk order.
///
/// The pipeline is a pull iterator. It never buffers more than one chunk's
/// worth of frames, so memory stays bounded whatever the input size, and
/// dropping it between frames is the cancellation path: no partial state
/// survives, a new stream restarts from scratch.
pub struct EncoderPipeline<'a> {
    geometry: FrameGeometry,
    coder: ShardCoder,
    input: &'a [u8],
    header: StreamHeader,
    state: EncodeState,
    next_chunk: u32,
    next_frame_index: u32,
    pending: VecDeque<VideoFrame>,
}

impl<'a> EncoderPipeline<'a> {
    pub fn new(
        geometry: FrameGeometry,
        redundancy: Redundancy,
        input: &'a [u8],
    ) -> Result<EncoderPipeline<'a>, CodecError> {
        let capacity = geometry.capacity_bytes();
        if capacity < HEADER_SIZE {
            return Err(CodecError::Geometry(format!(
                "frame capacity of {capacity} bytes cannot hold the {HEADER_SIZE}-byte stream header"
            )));
        }
        let shard_size = redundancy.shard_size();
        if shard_size > capacity {
            return Err(CodecError::Geometry(format!(
                "shards of {shard_size} bytes exceed the frame capacity of {capacity}; \
                 lower the chunk size or raise the data shard count"
            )));
        }
        if shard_size > u16::MAX as usize {
            return Err(CodecError::Geometry(format!(
                "shards of {shard_size} bytes overflow the 16-bit frame length field"
            )));
        }
        let chunk_count = (input.len() as u64 + redundancy.chunk_size as u64 - 1)
            / redundancy.chunk_size as u64;
        if chunk_count >= u64::from(u32::MAX) {
            return Err(CodecError::Geometry(
                "stream needs too many chunks for 32-bit codeword ids".to_string(),
            ));
        }
        let coder = ShardCoder::new(redundancy)?;
        let digest: [u8; 32] = Sha256::digest(input).into();
        let header = StreamHeader::new(input.len() as u64, digest, &geometry, &redundancy);
        Ok(EncoderPipeline {
            geometry,
            coder,
            input,
            header,
            state: EncodeState::Header,
            next_chunk: 0,
            next_frame_index: 0,
            pending: VecDeque::new(),
        })
    }

    /// The manifest this stream announces in its first frame.
    pub fn stream_header(&self) -> &StreamHeader {
        &self.header
    }

    /// One header frame plus one frame per shard of every codeword.
    pub fn total_frames(&self) -> u64 {
        1 + self.header.chunk_count as u64 * self.coder.redundancy().total_shards() as u64
    }

    fn push_chunk_frames(&mut self, chunk_index: u32) {
        let chunk_size = self.coder.redundancy().chunk_size as usize;
        let start = chunk_index as usize * chunk_size;
        let end = (start + chunk_size).min(self.input.len());
        let shards = self.coder.encode_codeword(&self.input[start..end]);
        for (sub_index, shard) in shards.iter().enumerate() {
            let frame_header = FrameHeader {
                frame_index: self.next_frame_index,
                codeword_id: chunk_index,
                sub_index: sub_index as u16,
            };
            self.pending
                .push_back(assemble_frame(&self.geometry, &frame_header, shard));
            self.next_frame_index += 1;
        }
    }
}

impl Iterator for EncoderPipeline<'_> {
    type Item = VideoFrame;

    fn next(&mut self) -> Option<VideoFrame> {
        loop {
            match self.state {
                EncodeState::Header => {
                    self.state = EncodeState::Chunks;
                    self.next_frame_index = 1;
                    let frame_header = FrameHeader {
                        frame_index: 0,
                        codeword_id: HEADER_CODEWORD,
                        sub_index: 0,
                    };
                    return Some(assemble_frame(
                        &self.geometry,
                        &frame_header,
                        &self.header.to_bytes(),
                    ));
                }
                EncodeState::Chunks => {
                    if let Some(frame) = self.pending.pop_front() {
                        return Some(frame);
                    }
                    if self.next_chunk >= self.header.chunk_count {
                        self.state = EncodeState::Done;
                        continue;
                    }
                    let chunk = self.next_chunk;
                    self.next_chunk += 1;
                    self.push_chunk_frames(chunk);
                }
                EncodeState::Done => return None,
            }
        }
    }
}

/// Encode a whole byte stream into its ordered frame sequence in one call.
pub fn data_to_frames(
    geometry: FrameGeometry,
    redundancy: Redundancy,
    data: &[u8],
) -> Result<Vec<VideoFrame>, CodecError> {
    Ok(EncoderPipeline::new(geometry, redundancy, data)?.collect())
}

#[cfg(test)]
mod encodinglogics_tests {
    use super::*;
    use crate::framelogics::disassemble_frame;
    use crate::geometry::BlockAlphabet;

    fn test_geometry() -> FrameGeometry {
        FrameGeometry::new(64, 48, 2, BlockAlphabet::Quad).unwrap()
    }

    fn test_redundancy() -> Redundancy {
        Redundancy::new(256, 4, 2).unwrap()
    }

    #[test]
    fn test_frame_count_matches_chunks() {
        let data = vec![7u8; 1000]; // ceil(1000/256) = 4 chunks of 6 frames
        let frames = data_to_frames(test_geometry(), test_redundancy(), &data).unwrap();
        assert_eq!(frames.len(), 1 + 4 * 6);
    }

    #[test]
    fn test_empty_input_emits_header_only() {
        let frames = data_to_frames(test_geometry(), test_redundancy(), &[]).unwrap();
        assert_eq!(frames.len(), 1);
        let content = disassemble_frame(&test_geometry(), &frames[0]);
        assert!(content.valid);
        assert_eq!(content.header.codeword_id, HEADER_CODEWORD);
        let header = StreamHeader::from_bytes(&content.payload).unwrap();
        assert_eq!(header.byte_len, 0);
        assert_eq!(header.chunk_count, 0);
    }

    #[test]
    fn test_header_frame_comes_first_with_index_zero() {
        let data = vec![1u8; 300];
        let frames = data_to_frames(test_geometry(), test_redundancy(), &data).unwrap();
        let first = disassemble_frame(&test_geometry(), &frames[0]);
        assert_eq!(first.header.frame_index, 0);
        assert_eq!(first.header.codeword_id, HEADER_CODEWORD);
        assert_eq!(first.payload.len(), HEADER_SIZE);
    }

    #[test]
    fn test_frame_indices_are_contiguous() {
        let data = vec![3u8; 600];
        let geometry = test_geometry();
        let frames = data_to_frames(geometry, test_redundancy(), &data).unwrap();
        for (expected, frame) in frames.iter().enumerate() {
            let content = disassemble_frame(&geometry, frame);
            assert!(content.valid);
            assert_eq!(content.header.frame_index, expected as u32);
        }
    }

    #[test]
    fn test_codeword_grouping_and_sub_indices() {
        let data = vec![9u8; 300]; // 2 chunks
        let geometry = test_geometry();
        let frames = data_to_frames(geometry, test_redundancy(), &data).unwrap();
        let contents: Vec<_> = frames[1..]
            .iter()
            .map(|f| disassemble_frame(&geometry, f).header)
            .collect();
        assert_eq!(contents.len(), 12);
        for (position, header) in contents.iter().enumerate() {
            assert_eq!(header.codeword_id, (position / 6) as u32);
            assert_eq!(header.sub_index, (position % 6) as u16);
        }
    }

    #[test]
    fn test_total_frames_matches_emission() {
        let data = vec![5u8; 2000];
        let pipeline = EncoderPipeline::new(test_geometry(), test_redundancy(), &data).unwrap();
        let announced = pipeline.total_frames();
        assert_eq!(pipeline.count() as u64, announced);
    }

    #[test]
    fn test_rejects_geometry_too_small_for_header() {
        // 20x14 cells = 280, minus 132 reserved = 148 cells, quad = 37 bytes
        let geometry = FrameGeometry::new(40, 28, 2, BlockAlphabet::Quad).unwrap();
        let result = EncoderPipeline::new(geometry, test_redundancy(), &[1, 2, 3]);
        assert!(matches!(result, Err(CodecError::Geometry(_))));
    }

    #[test]
    fn test_rejects_shard_larger_than_frame() {
        let redundancy = Redundancy::new(100_000, 4, 2).unwrap();
        let result = EncoderPipeline::new(test_geometry(), redundancy, &[1, 2, 3]);
        assert!(matches!(result, Err(CodecError::Geometry(_))));
    }
}
