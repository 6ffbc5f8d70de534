pub const DEFAULT_OUTPUT_DIR: &str = "videos";
pub const DEFAULT_VIDEO_NAME: &str = "default.mp4";
pub const FRAMES_DIR_NAME: &str = "frames";

pub const DEFAULT_CAMERA_INDEX: i32 = 0;
pub const DEFAULT_CAPTURE_WIDTH: u32 = 640;
pub const DEFAULT_CAPTURE_HEIGHT: u32 = 480;

pub const OUTPUT_FOURCC: [char; 4] = ['m', 'p', '4', 'v'];
pub const OUTPUT_FPS: f64 = 20.0;

/// Milliseconds to wait for a key press between frames.
pub const KEY_POLL_DELAY_MS: i32 = 25;
/// `q` and Esc stop the frame loop.
pub const CANCEL_KEYS: &[i32] = &[b'q' as i32, 27];

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";
pub const TIMESTAMP_ORIGIN: (i32, i32) = (20, 25);
pub const TIMESTAMP_COLOR: [u8; 3] = [255, 255, 255];

pub const LOWER_WHITE: [u8; 3] = [220, 220, 220];
pub const UPPER_WHITE: [u8; 3] = [255, 255, 255];
pub const DEFAULT_BACKGROUND_COLOR: i32 = 255;
/// Side of the elliptical structuring element used to open the white mask.
pub const SPECKLE_KERNEL_SIZE: usize = 2;

pub const EYE_CASCADE_NAME: &str = "haarcascade_eye.xml";
pub const FACE_CASCADE_NAME: &str = "haarcascade_frontalface_alt.xml";
pub const CASCADE_BASE_URL: &str =
    "https://raw.githubusercontent.com/opencv/opencv/4.x/data/haarcascades";
pub const CASCADE_DIR_ENV: &str = "VCAP_CASCADE_DIR";
pub const SYSTEM_CASCADE_DIRS: &[&str] = &[
    "/usr/share/opencv4/haarcascades",
    "/usr/local/share/opencv4/haarcascades",
    "/opt/homebrew/share/opencv4/haarcascades",
    "/usr/share/opencv/haarcascades",
];

/// Colours are BGR.
pub const EYE_BOX_COLOR: [u8; 3] = [0, 255, 0];
pub const FACE_BOX_COLOR: [u8; 3] = [0, 0, 255];
pub const EYE_MIN_SIZE: (u32, u32) = (30, 30);
pub const FACE_MIN_SIZE: (u32, u32) = (50, 50);
pub const BOX_THICKNESS: u32 = 2;

pub const RAW_WINDOW: &str = "TestFrame";
pub const COMPOSITE_WINDOW: &str = "FGMaskMorph";
pub const PLAYBACK_WINDOW: &str = "Frame";
pub const PLAYBACK_MASK_WINDOW: &str = "FG Mask";

pub const ASSEMBLED_VIDEO_NAME: &str = "crafted.avi";
pub const ASSEMBLED_FPS: f64 = 1.0;
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];
