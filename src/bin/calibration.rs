use framevault::{level_for_bits, BlockAlphabet, FrameGeometry, VideoFrame};
use image::RgbImage;

/// Render one calibration frame: vertical bands covering every grey level of
/// the densest alphabet, with the corner markers in place. Run a video
/// pipeline over it and eyeball which levels survive before picking an
/// alphabet for real data.
fn main() {
    let width: u16 = 1920;
    let height: u16 = 1080;
    let size: u16 = 8;
    let geometry = FrameGeometry::new(width, height, size, BlockAlphabet::Hex)
        .expect("calibration geometry must be valid");
    let levels = geometry.alphabet.levels() as usize;

    println!(
        "Creating a calibration frame of size {}x{} with {} px blocks and {} grey levels",
        width, height, size, levels
    );

    let mut frame = VideoFrame::new(width, height);
    let cols = geometry.cols();
    for cy in 0..geometry.rows() {
        for cx in 0..cols {
            let level = (cx * levels / cols) as u8;
            let value = level_for_bits(level, geometry.alphabet);
            frame.paint_block(cx as u16 * size, cy as u16 * size, size, value);
        }
    }
    // Corner markers as the frame assembler paints them
    frame.paint_block(0, 0, size, 255);
    frame.paint_block(width - size, 0, size, 255);
    frame.paint_block(0, height - size, size, 0);
    frame.paint_block(width - size, height - size, size, 255);

    let image = RgbImage::from_raw(width as u32, height as u32, frame.into_rgb24())
        .expect("frame buffer matches its dimensions");
    image
        .save("calibration.png")
        .expect("Writing calibration frame must succeed");
    println!("Calibration frame saved: calibration.png");
}
