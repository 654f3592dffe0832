use clap::Parser;
use framevault::execute_with_codec_options;
use framevault::{extract_options, CliData};

fn main() {
    let args = CliData::parse();
    let options = extract_options(args);
    match options {
        Ok(o) => {
            if let Err(error) = execute_with_codec_options(o) {
                eprintln!("framevault failed: {error}");
                std::process::exit(1);
            }
        }
        Err(error) => panic!("{:?}", error),
    };
    std::process::exit(0);
}
