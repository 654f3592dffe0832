use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use rayon::prelude::*;

use crate::errors::CodecError;
use crate::videoframe::VideoFrame;

/// Write each frame as `frame_NNNNNN.png` under `dir`, creating it first.
///
/// The PNG sequence is the hand-off format to an external muxer (e.g.
/// `ffmpeg -framerate 30 -i frame_%06d.png`), which owns fps and codec
/// choices; it just must deliver frames back at the same resolution.
pub fn frames_to_png_dir(dir: &Path, frames: &[VideoFrame]) -> Result<(), CodecError> {
    fs::create_dir_all(dir)?;
    frames
        .par_iter()
        .enumerate()
        .try_for_each(|(index, frame)| -> Result<(), CodecError> {
            let path = dir.join(format!("frame_{:06}.png", index));
            let image = RgbImage::from_raw(
                frame.width as u32,
                frame.height as u32,
                frame.as_rgb24().to_vec(),
            )
            .expect("frame buffer matches its dimensions");
            image.save(&path)?;
            Ok(())
        })
}

/// Read a PNG frame sequence back, ordered by file name.
///
/// The decoder tolerates any frame order; the sort just keeps captures
/// deterministic and matches the names `frames_to_png_dir` writes.
pub fn png_dir_to_frames(dir: &Path) -> Result<Vec<VideoFrame>, CodecError> {
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "png"))
        .collect();
    paths.sort();
    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        let image = image::open(&path)?.to_rgb8();
        let (width, height) = image.dimensions();
        frames.push(VideoFrame::from_rgb24(
            width as u16,
            height as u16,
            image.into_raw(),
        )?);
    }
    Ok(frames)
}

#[cfg(test)]
mod framefiles_tests {
    use super::*;

    #[test]
    fn test_png_round_trip() {
        let dir = std::env::temp_dir().join(format!("framevault_png_{}", std::process::id()));
        let mut frame = VideoFrame::new(16, 8);
        frame.paint_block(2, 2, 2, 170);
        frame.paint_block(10, 4, 4, 85);
        let frames = vec![frame.clone(), VideoFrame::new(16, 8)];

        frames_to_png_dir(&dir, &frames).unwrap();
        let loaded = png_dir_to_frames(&dir).unwrap();
        fs::remove_dir_all(&dir).unwrap();

        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].as_rgb24(), frame.as_rgb24());
        assert_eq!(loaded[1].as_rgb24(), frames[1].as_rgb24());
    }
}
