use clap::builder::TypedValueParser;
use clap::command;
use clap::Parser;

use crate::ecclogics::Redundancy;
use crate::geometry::{
    BlockAlphabet, FrameGeometry, DEFAULT_BLOCK_SIZE, DEFAULT_HEIGHT, DEFAULT_WIDTH,
};

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AppMode {
    Encode,
    Decode,
}

impl std::fmt::Display for AppMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Encode => "encode",
            Self::Decode => "decode",
        };
        s.fmt(f)
    }
}

impl std::str::FromStr for AppMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "encode" => Ok(Self::Encode),
            "decode" => Ok(Self::Decode),
            _ => Err(format!("Unknown mode: {s}")),
        }
    }
}

/// CLI arguments
///
/// The command line accepts the options to encode a file into a frame
/// sequence and to decode a captured frame sequence back into the file.
///
#[derive(Parser)]
#[clap(name = "framevault")]
#[command(author, version, about, long_about = None)] // Read from `Cargo.toml`
pub struct CliData {
    /// The file to encode, or the directory of captured frames to decode
    #[arg(short, long)]
    input_path: Option<String>,

    /// Where the frame sequence (encode) or the recovered file (decode) goes
    #[arg(short, long)]
    pub output_path: Option<String>,

    #[arg(short, long)]
    pub width: Option<u16>,

    #[arg(short = 'g', long)]
    pub height: Option<u16>,

    /// Pixel edge of one block. Bigger blocks survive harsher compression
    /// but carry fewer bits per frame.
    ///
    /// # Expected Values
    /// A divisor of both width and height, e.g. 4, 8 or 16.
    #[arg(short, long)]
    pub block_size: Option<u16>,

    /// Grey levels per block: more levels pack more bits but tolerate less
    /// compression drift
    #[arg(short = 'a', long, value_parser = clap::builder::PossibleValuesParser::new(["binary", "quad", "hex"])
    .map(|s| s.parse::<BlockAlphabet>().unwrap()),)]
    pub alphabet: Option<BlockAlphabet>,

    /// Bytes per error-correction-protected chunk
    #[arg(short, long)]
    pub chunk_size: Option<u32>,

    /// Data shards per codeword
    #[arg(short, long)]
    pub data_shards: Option<u8>,

    /// Parity shards per codeword; the stream survives this many lost
    /// frames per codeword
    #[arg(short, long)]
    pub parity_shards: Option<u8>,

    /// Possible values:
    /// "encode" = encode a file into a frame sequence.
    /// "decode" = decode a frame sequence back into the file.
    #[arg(short='m', long, value_parser = clap::builder::PossibleValuesParser::new(["encode", "decode"])
    .map(|s| s.parse::<AppMode>().unwrap()),)]
    pub mode: Option<AppMode>,
}

/// Required options for encoding a file into a frame sequence
#[derive(Clone)]
pub struct EncodeOptions {
    pub input_file: String,
    pub frames_dir: String,
    pub geometry: FrameGeometry,
    pub redundancy: Redundancy,
    pub show_progress: bool,
}

/// Required options for decoding a frame sequence back into the file
#[derive(Clone)]
pub struct DecodeOptions {
    pub frames_dir: String,
    pub output_file: String,
    pub geometry: FrameGeometry,
    pub show_progress: bool,
}

#[derive(Clone)]
pub enum CodecOptions {
    EncodeToFrames(EncodeOptions),
    DecodeFromFrames(DecodeOptions),
}

/// Extract from the command line (CLI) argument the option.
/// Depending of the mode, the function returns the proper formed structure
/// or panic telling what argument is missing
///
/// # Arguments
/// args - The command line argument with encode or decode information
///
/// # Returns
/// Return a well formed structure for the task asked or return a failure
/// with the missing fields
pub fn extract_options(args: CliData) -> Result<CodecOptions, String> {
    let geometry = FrameGeometry::new(
        args.width.unwrap_or(DEFAULT_WIDTH),
        args.height.unwrap_or(DEFAULT_HEIGHT),
        args.block_size.unwrap_or(DEFAULT_BLOCK_SIZE),
        args.alphabet.unwrap_or(BlockAlphabet::Quad),
    )
    .map_err(|e| e.to_string())?;
    let redundancy = Redundancy::new(
        args.chunk_size.unwrap_or(4096),
        args.data_shards.unwrap_or(4),
        args.parity_shards.unwrap_or(2),
    )
    .map_err(|e| e.to_string())?;

    Ok(match args.mode {
        Some(i) => match i {
            AppMode::Encode => {
                let input_file = args
                    .input_path
                    .unwrap_or_else(|| panic!("Missing input file"));
                println!("Input file: {}", input_file);

                CodecOptions::EncodeToFrames(EncodeOptions {
                    input_file,
                    frames_dir: args.output_path.unwrap_or_else(|| "frames".to_string()),
                    geometry,
                    redundancy,
                    show_progress: true,
                })
            }
            AppMode::Decode => CodecOptions::DecodeFromFrames(DecodeOptions {
                frames_dir: args.input_path.unwrap_or_else(|| "frames".to_string()),
                output_file: args
                    .output_path
                    .unwrap_or_else(|| "recovered.bin".to_string()),
                geometry,
                show_progress: true,
            }),
        },
        None => panic!("Encode or decode mode is required"),
    })
}
