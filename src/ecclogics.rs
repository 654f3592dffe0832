use reed_solomon_erasure::galois_8::ReedSolomon;

use crate::errors::CodecError;

/// Redundancy parameters for one stream.
///
/// A chunk of `chunk_size` bytes splits into `data_shards` equal shards;
/// `parity_shards` Reed-Solomon shards are appended. Each shard rides in
/// exactly one frame, so a codeword survives the loss of up to
/// `parity_shards` of its frames.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Redundancy {
    pub chunk_size: u32,
    pub data_shards: u8,
    pub parity_shards: u8,
}

impl Redundancy {
    pub fn new(chunk_size: u32, data_shards: u8, parity_shards: u8) -> Result<Redundancy, CodecError> {
        if chunk_size == 0 {
            return Err(CodecError::Geometry("chunk size must be at least 1 byte".to_string()));
        }
        if data_shards == 0 {
            return Err(CodecError::Geometry("at least one data shard is required".to_string()));
        }
        if parity_shards == 0 {
            return Err(CodecError::Geometry("at least one parity shard is required".to_string()));
        }
        if data_shards as usize + parity_shards as usize > 255 {
            return Err(CodecError::Geometry(
                "data and parity shards must total 255 or fewer over GF(2^8)".to_string(),
            ));
        }
        Ok(Redundancy {
            chunk_size,
            data_shards,
            parity_shards,
        })
    }

    pub fn total_shards(&self) -> usize {
        self.data_shards as usize + self.parity_shards as usize
    }

    /// Bytes per shard, the last data shard zero-padded up to it.
    pub fn shard_size(&self) -> usize {
        let chunk = self.chunk_size as usize;
        let data = self.data_shards as usize;
        (chunk + data - 1) / data
    }
}

/// Reed-Solomon shard codec for one stream's redundancy parameters.
pub struct ShardCoder {
    redundancy: Redundancy,
    rs: ReedSolomon,
}

impl ShardCoder {
    pub fn new(redundancy: Redundancy) -> Result<ShardCoder, CodecError> {
        let rs = ReedSolomon::new(
            redundancy.data_shards as usize,
            redundancy.parity_shards as usize,
        )
        .map_err(|e| CodecError::Geometry(format!("reed-solomon setup failed: {e}")))?;
        Ok(ShardCoder { redundancy, rs })
    }

    pub fn redundancy(&self) -> &Redundancy {
        &self.redundancy
    }

    /// Encode one chunk into its codeword: data shards followed by parity
    /// shards, all `shard_size()` bytes. The chunk may be shorter than
    /// `chunk_size` (the final chunk of a stream); missing bytes pad as zero.
    ///
    /// Pure over its inputs, so callers may fan chunks out across threads
    /// and restore order by chunk index afterwards.
    pub fn encode_codeword(&self, chunk: &[u8]) -> Vec<Vec<u8>> {
        let shard_size = self.redundancy.shard_size();
        let mut shards: Vec<Vec<u8>> = Vec::with_capacity(self.redundancy.total_shards());
        for i in 0..self.redundancy.data_shards as usize {
            let start = (i * shard_size).min(chunk.len());
            let end = ((i + 1) * shard_size).min(chunk.len());
            let mut shard = chunk[start..end].to_vec();
            shard.resize(shard_size, 0);
            shards.push(shard);
        }
        for _ in 0..self.redundancy.parity_shards {
            shards.push(vec![0u8; shard_size]);
        }
        self.rs
            .encode(&mut shards)
            .expect("shard sizes are uniform by construction");
        shards
    }

    /// Rebuild one chunk from its received shards, `None` marking erasures.
    /// Returns the chunk bytes (padded length `chunk_size`) or `None` when
    /// more shards are missing than the parity can cover. The erasure
    /// decoder refuses rather than fabricating data.
    pub fn recover_codeword(&self, shards: &mut Vec<Option<Vec<u8>>>) -> Option<Vec<u8>> {
        let present = shards.iter().filter(|s| s.is_some()).count();
        if present < self.redundancy.data_shards as usize {
            return None;
        }
        if self.rs.reconstruct(shards).is_err() {
            return None;
        }
        let mut chunk = Vec::with_capacity(self.redundancy.chunk_size as usize);
        for shard in shards.iter().take(self.redundancy.data_shards as usize) {
            chunk.extend_from_slice(shard.as_ref()?);
        }
        chunk.truncate(self.redundancy.chunk_size as usize);
        Some(chunk)
    }
}
