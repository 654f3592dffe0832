mod bitlogics;
mod blocklogics;
mod decodinglogics;
mod ecclogics;
mod encodinglogics;
mod errors;
mod framefiles;
mod framelogics;
mod geometry;
mod headerlogics;
pub mod options;
mod videoframe;

use std::fs;
use std::path::Path;

use indicatif::ProgressBar;
use pretty_bytes_rust::pretty_bytes;

// Re-export for external access (main.rs, tests, benches)
pub use crate::blocklogics::{level_for_bits, read_block, BlockRead, LOW_CONFIDENCE};
pub use crate::decodinglogics::{frames_to_data, DecodeReport, DecoderPipeline, Verification};
pub use crate::ecclogics::{Redundancy, ShardCoder};
pub use crate::encodinglogics::{data_to_frames, EncoderPipeline};
pub use crate::errors::CodecError;
pub use crate::framefiles::{frames_to_png_dir, png_dir_to_frames};
pub use crate::framelogics::{
    assemble_frame, disassemble_frame, FrameContent, FrameHeader, HEADER_CODEWORD,
};
pub use crate::geometry::{
    BlockAlphabet, FrameGeometry, DEFAULT_BLOCK_SIZE, DEFAULT_HEIGHT, DEFAULT_WIDTH,
};
pub use crate::headerlogics::{StreamHeader, HEADER_SIZE};
pub use crate::options::{extract_options, CliData, CodecOptions, DecodeOptions, EncodeOptions};
pub use crate::videoframe::VideoFrame;

/// Execute codec logics
/// Two executions possible: encode a file into a frame sequence or decode
/// a captured frame sequence back into the original file.
pub fn execute_with_codec_options(options: CodecOptions) -> Result<(), CodecError> {
    match options {
        CodecOptions::EncodeToFrames(n) => {
            let data = fs::read(&n.input_file)?;
            let pipeline = EncoderPipeline::new(n.geometry, n.redundancy, &data)?;
            let total_frames = pipeline.total_frames();
            if n.show_progress {
                println!(
                    "Encoding {} into {} frames of {}x{}",
                    pretty_bytes(data.len() as u64, None),
                    total_frames,
                    n.geometry.width,
                    n.geometry.height
                );
            }
            let pb = ProgressBar::new(total_frames);
            let mut frames = Vec::with_capacity(total_frames as usize);
            for frame in pipeline {
                frames.push(frame);
                if n.show_progress {
                    pb.inc(1);
                }
            }
            frames_to_png_dir(Path::new(&n.frames_dir), &frames)?;
            if n.show_progress {
                pb.finish_with_message("done");
                println!("Frames saved: {}", n.frames_dir);
            }
        }
        CodecOptions::DecodeFromFrames(n) => {
            let frames = png_dir_to_frames(Path::new(&n.frames_dir))?;
            if n.show_progress {
                println!("Read {} frames from {}", frames.len(), n.frames_dir);
            }
            let pb = ProgressBar::new(frames.len() as u64);
            let mut pipeline = DecoderPipeline::new(n.geometry);
            for frame in &frames {
                pipeline.push_frame(frame)?;
                if n.show_progress {
                    pb.inc(1);
                }
            }
            let report = pipeline.finish()?;
            fs::write(&n.output_file, &report.data)?;
            if n.show_progress {
                pb.finish_with_message("done");
                match &report.verification {
                    Verification::Success => println!(
                        "File recovered: {} ({})",
                        n.output_file,
                        pretty_bytes(report.data.len() as u64, None)
                    ),
                    Verification::PartialLoss(lost) => println!(
                        "Partial recovery: {} chunks lost, indices {:?}",
                        lost.len(),
                        lost
                    ),
                    Verification::ChecksumMismatch => {
                        println!("WARNING: checksum mismatch, recovered bytes differ from the original")
                    }
                }
                if report.corrupt_frames > 0 {
                    println!(
                        "{} corrupt frames were treated as erasures",
                        report.corrupt_frames
                    );
                }
            }
        }
    }
    Ok(())
}
