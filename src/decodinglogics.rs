use std::collections::{BTreeMap, BTreeSet, HashMap};

use sha2::{Digest, Sha256};

use crate::ecclogics::ShardCoder;
use crate::errors::CodecError;
use crate::framelogics::{disassemble_frame, FrameContent, HEADER_CODEWORD};
use crate::geometry::FrameGeometry;
use crate::headerlogics::StreamHeader;
use crate::videoframe::VideoFrame;

/// Outcome of the final verification step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Every chunk recovered and the whole-file digest matches.
    Success,
    /// One or more chunks exceeded the correction capacity; the listed
    /// chunk indices hold zeros in the output.
    PartialLoss(Vec<u32>),
    /// All chunks recovered but the digest still disagrees with the header.
    ChecksumMismatch,
}

/// What a finished decode hands back: the best-effort bytes plus precise
/// diagnostics of anything that was lost on the way.
#[derive(Debug)]
pub struct DecodeReport {
    pub data: Vec<u8>,
    pub verification: Verification,
    /// Chunk indices that could not be recovered, ascending.
    pub lost_chunks: Vec<u32>,
    /// Frames dropped for failed markers or checksum, treated as erasures.
    pub corrupt_frames: usize,
    /// Ambiguously quantized cells across all frames, resolved by the
    /// error-correction layer.
    pub suspect_cells: usize,
}

struct CodewordCollector {
    shards: Vec<Option<Vec<u8>>>,
    received: usize,
}

/// Rebuilds the byte stream from frames arriving in any order.
///
/// Push frames one at a time, then call [`finish`](Self::finish). Payload
/// frames seen before the stream header are stashed and replayed once the
/// header frame shows up, so a shuffled capture still decodes. Each codeword
/// resolves as soon as all of its shards are in; stragglers resolve at
/// finish with their missing shards as erasures. Dropping the pipeline
/// between frames cancels the decode with nothing to clean up.
pub struct DecoderPipeline {
    geometry: FrameGeometry,
    header: Option<StreamHeader>,
    coder: Option<ShardCoder>,
    stashed: Vec<FrameContent>,
    pending: HashMap<u32, CodewordCollector>,
    recovered: BTreeMap<u32, Vec<u8>>,
    lost: BTreeSet<u32>,
    corrupt_frames: usize,
    suspect_cells: usize,
}

impl DecoderPipeline {
    pub fn new(geometry: FrameGeometry) -> DecoderPipeline {
        DecoderPipeline {
            geometry,
            header: None,
            coder: None,
            stashed: Vec::new(),
            pending: HashMap::new(),
            recovered: BTreeMap::new(),
            lost: BTreeSet::new(),
            corrupt_frames: 0,
            suspect_cells: 0,
        }
    }

    /// Disassemble one captured frame and feed it to the stream state.
    ///
    /// Only a bad stream header aborts: a corrupt payload frame is an
    /// erasure for the error-correction layer, not a failure.
    pub fn push_frame(&mut self, frame: &VideoFrame) -> Result<(), CodecError> {
        let content = disassemble_frame(&self.geometry, frame);
        if content.header.codeword_id == HEADER_CODEWORD {
            self.accept_header(content)
        } else {
            self.accept_payload(content);
            Ok(())
        }
    }

    fn accept_header(&mut self, content: FrameContent) -> Result<(), CodecError> {
        if !content.valid {
            return Err(CodecError::Format(
                "stream header frame failed validation, cannot decode without it".to_string(),
            ));
        }
        if self.header.is_some() {
            // Duplicate header frame, the first one won
            return Ok(());
        }
        let header = StreamHeader::from_bytes(&content.payload)?;
        self.check_geometry(&header)?;
        let coder = ShardCoder::new(header.redundancy()?)
            .map_err(|e| CodecError::Format(format!("header carries unusable redundancy: {e}")))?;
        self.header = Some(header);
        self.coder = Some(coder);
        for stashed in std::mem::take(&mut self.stashed) {
            self.accept_payload(stashed);
        }
        Ok(())
    }

    /// The stream must have been encoded with the geometry this decoder was
    /// configured for; a mismatch means the caller is sampling blocks at the
    /// wrong positions and nothing downstream can be trusted.
    fn check_geometry(&self, header: &StreamHeader) -> Result<(), CodecError> {
        let alphabet = header.alphabet()?;
        if header.width != self.geometry.width
            || header.height != self.geometry.height
            || header.block_size != self.geometry.block_size
            || alphabet != self.geometry.alphabet
        {
            return Err(CodecError::Format(format!(
                "stream encoded as {}x{} px, {} px blocks, {} alphabet; decoder configured for \
                 {}x{} px, {} px blocks, {} alphabet",
                header.width,
                header.height,
                header.block_size,
                alphabet,
                self.geometry.width,
                self.geometry.height,
                self.geometry.block_size,
                self.geometry.alphabet
            )));
        }
        Ok(())
    }

    fn accept_payload(&mut self, content: FrameContent) {
        let (chunk_count, total_shards, shard_size) = match (&self.header, &self.coder) {
            (Some(header), Some(coder)) => (
                header.chunk_count,
                coder.redundancy().total_shards(),
                coder.redundancy().shard_size(),
            ),
            _ => {
                self.stashed.push(content);
                return;
            }
        };
        self.suspect_cells += content.suspect_cells;
        if !content.valid {
            self.corrupt_frames += 1;
            return;
        }
        let frame_header = content.header;
        if frame_header.codeword_id >= chunk_count
            || frame_header.sub_index as usize >= total_shards
            || content.payload.len() != shard_size
        {
            // Readable frame that fits no codeword of this stream
            self.corrupt_frames += 1;
            return;
        }
        if self.recovered.contains_key(&frame_header.codeword_id)
            || self.lost.contains(&frame_header.codeword_id)
        {
            // Late duplicate of an already resolved codeword
            return;
        }
        let collector = self
            .pending
            .entry(frame_header.codeword_id)
            .or_insert_with(|| CodewordCollector {
                shards: vec![None; total_shards],
                received: 0,
            });
        let slot = &mut collector.shards[frame_header.sub_index as usize];
        if slot.is_some() {
            return;
        }
        *slot = Some(content.payload);
        collector.received += 1;
        if collector.received == total_shards {
            if let Some(collector) = self.pending.remove(&frame_header.codeword_id) {
                self.resolve(frame_header.codeword_id, collector);
            }
        }
    }

    fn resolve(&mut self, codeword_id: u32, mut collector: CodewordCollector) {
        let recovered = match self.coder.as_ref() {
            Some(coder) => coder.recover_codeword(&mut collector.shards),
            None => None,
        };
        match recovered {
            Some(chunk) => {
                self.recovered.insert(codeword_id, chunk);
            }
            None => {
                self.lost.insert(codeword_id);
            }
        }
    }

    /// End of stream: resolve stragglers, reassemble in chunk order, verify.
    pub fn finish(mut self) -> Result<DecodeReport, CodecError> {
        let header = self.header.take().ok_or_else(|| {
            CodecError::Format("no stream header found in the frame sequence".to_string())
        })?;

        let open: Vec<u32> = self.pending.keys().copied().collect();
        for codeword_id in open {
            if let Some(collector) = self.pending.remove(&codeword_id) {
                self.resolve(codeword_id, collector);
            }
        }
        for codeword_id in 0..header.chunk_count {
            if !self.recovered.contains_key(&codeword_id) {
                self.lost.insert(codeword_id);
            }
        }

        let chunk_size = header.chunk_size as usize;
        let mut data = Vec::with_capacity(header.byte_len as usize);
        for codeword_id in 0..header.chunk_count {
            match self.recovered.get(&codeword_id) {
                Some(chunk) => data.extend_from_slice(chunk),
                // A gap holds its place so later chunks stay aligned
                None => data.extend(std::iter::repeat(0u8).take(chunk_size)),
            }
        }
        data.truncate(header.byte_len as usize);

        let lost_chunks: Vec<u32> = self.lost.iter().copied().collect();
        let digest: [u8; 32] = Sha256::digest(&data).into();
        let verification = if !lost_chunks.is_empty() {
            Verification::PartialLoss(lost_chunks.clone())
        } else if digest == header.digest {
            Verification::Success
        } else {
            Verification::ChecksumMismatch
        };

        Ok(DecodeReport {
            data,
            verification,
            lost_chunks,
            corrupt_frames: self.corrupt_frames,
            suspect_cells: self.suspect_cells,
        })
    }
}

/// Decode an ordered (or disordered) frame sequence in one call.
pub fn frames_to_data(
    geometry: FrameGeometry,
    frames: &[VideoFrame],
) -> Result<DecodeReport, CodecError> {
    let mut pipeline = DecoderPipeline::new(geometry);
    for frame in frames {
        pipeline.push_frame(frame)?;
    }
    pipeline.finish()
}

#[cfg(test)]
mod decodinglogics_tests {
    use super::*;
    use crate::ecclogics::Redundancy;
    use crate::encodinglogics::data_to_frames;
    use crate::geometry::BlockAlphabet;

    fn test_geometry() -> FrameGeometry {
        FrameGeometry::new(64, 48, 2, BlockAlphabet::Quad).unwrap()
    }

    fn test_redundancy() -> Redundancy {
        Redundancy::new(256, 4, 2).unwrap()
    }

    fn test_data(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 256) as u8).collect()
    }

    #[test]
    fn test_decode_in_order() {
        let data = test_data(1000);
        let frames = data_to_frames(test_geometry(), test_redundancy(), &data).unwrap();
        let report = frames_to_data(test_geometry(), &frames).unwrap();
        assert_eq!(report.verification, Verification::Success);
        assert_eq!(report.data, data);
        assert_eq!(report.corrupt_frames, 0);
    }

    #[test]
    fn test_decode_header_frame_arriving_last() {
        let data = test_data(700);
        let mut frames = data_to_frames(test_geometry(), test_redundancy(), &data).unwrap();
        let header_frame = frames.remove(0);
        frames.push(header_frame);
        let report = frames_to_data(test_geometry(), &frames).unwrap();
        assert_eq!(report.verification, Verification::Success);
        assert_eq!(report.data, data);
    }

    #[test]
    fn test_finish_without_header_is_format_error() {
        let data = test_data(300);
        let frames = data_to_frames(test_geometry(), test_redundancy(), &data).unwrap();
        let result = frames_to_data(test_geometry(), &frames[1..]);
        assert!(matches!(result, Err(CodecError::Format(_))));
    }

    #[test]
    fn test_geometry_mismatch_is_format_error() {
        let data = test_data(300);
        let frames = data_to_frames(test_geometry(), test_redundancy(), &data).unwrap();
        // Same resolution, different alphabet: the payload of the header
        // frame misreads under the wrong quantization and fails validation
        let other = FrameGeometry::new(64, 48, 2, BlockAlphabet::Binary).unwrap();
        let mut pipeline = DecoderPipeline::new(other);
        let result = pipeline.push_frame(&frames[0]);
        assert!(matches!(result, Err(CodecError::Format(_))));
    }

    #[test]
    fn test_duplicate_frames_are_harmless() {
        let data = test_data(600);
        let mut frames = data_to_frames(test_geometry(), test_redundancy(), &data).unwrap();
        let dup = frames[3].clone();
        frames.push(dup);
        frames.push(frames[0].clone());
        let report = frames_to_data(test_geometry(), &frames).unwrap();
        assert_eq!(report.verification, Verification::Success);
        assert_eq!(report.data, data);
    }
}
