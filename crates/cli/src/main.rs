use std::path::{Component, Path, PathBuf};
use std::process;

use clap::{Args, Parser, Subcommand};

use vcap_core::annotation::domain::frame_stamper::FrameStamper;
use vcap_core::annotation::infrastructure::hershey_text_renderer::HersheyTextRenderer;
use vcap_core::annotation::infrastructure::opencv_rectangle_renderer::OpenCvRectangleRenderer;
use vcap_core::detection::domain::detection_pass::DetectionPass;
use vcap_core::detection::infrastructure::cascade_resolver;
use vcap_core::detection::infrastructure::haar_cascade_detector::HaarCascadeDetector;
use vcap_core::pipeline::assemble_video_use_case::AssembleVideoUseCase;
use vcap_core::pipeline::pipeline_logger::StdoutPipelineLogger;
use vcap_core::pipeline::session_config::SessionConfig;
use vcap_core::pipeline::video_session_use_case::{CaptureStages, VideoSessionUseCase};
use vcap_core::segmentation::domain::background_subtractor::{
    BackgroundSubtractor, SubtractorAlgorithm,
};
use vcap_core::segmentation::infrastructure::opencv_background_subtractor::OpenCvBackgroundSubtractor;
use vcap_core::segmentation::infrastructure::opencv_compositor::OpenCvCompositor;
use vcap_core::shared::constants::{
    ASSEMBLED_FPS, ASSEMBLED_VIDEO_NAME, BOX_THICKNESS, DEFAULT_CAMERA_INDEX,
    DEFAULT_CAPTURE_HEIGHT, DEFAULT_CAPTURE_WIDTH, DEFAULT_OUTPUT_DIR, EYE_BOX_COLOR,
    EYE_CASCADE_NAME, EYE_MIN_SIZE, FACE_BOX_COLOR, FACE_CASCADE_NAME, FACE_MIN_SIZE,
    FRAMES_DIR_NAME, OUTPUT_FOURCC, OUTPUT_FPS,
};
use vcap_core::video::domain::frame_display::FrameDisplay;
use vcap_core::video::infrastructure::headless_display::HeadlessDisplay;
use vcap_core::video::infrastructure::highgui_display::HighguiDisplay;
use vcap_core::video::infrastructure::image_file_reader::ImageFileReader;
use vcap_core::video::infrastructure::image_file_writer::ImageFileWriter;
use vcap_core::video::infrastructure::opencv_capture::OpenCvCapture;
use vcap_core::video::infrastructure::opencv_video_writer::OpenCvVideoWriter;

/// Webcam capture and playback with timestamping, eye/face detection and
/// background masking.
#[derive(Parser)]
#[command(name = "vcap", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Record from a camera into PATH/default.mp4.
    Capture(CaptureArgs),
    /// Play a video file with its foreground mask.
    Play(PlayArgs),
    /// Build PATH/crafted.avi from the snapshots in PATH/frames.
    Assemble(AssembleArgs),
}

#[derive(Args)]
struct CaptureArgs {
    /// Output directory.
    #[arg(default_value = DEFAULT_OUTPUT_DIR)]
    path: PathBuf,

    /// Run without windows. Requires --max-frames, since no key can stop it.
    #[arg(long)]
    headless: bool,

    /// Output video file name inside PATH.
    #[arg(long)]
    output: Option<String>,

    /// Save every composite as PATH/frames/<index>.png.
    #[arg(long)]
    save_frames: bool,

    /// Requested capture width.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_WIDTH)]
    width: u32,

    /// Requested capture height.
    #[arg(long, default_value_t = DEFAULT_CAPTURE_HEIGHT)]
    height: u32,

    /// Background subtractor: knn or mog2.
    #[arg(long, default_value = "knn")]
    subtractor: String,

    /// Directory holding the Haar cascade XML files.
    #[arg(long)]
    cascade_dir: Option<PathBuf>,

    /// Camera device index.
    #[arg(long, default_value_t = DEFAULT_CAMERA_INDEX)]
    camera: i32,

    /// Stop after this many frames.
    #[arg(long)]
    max_frames: Option<usize>,
}

#[derive(Args)]
struct PlayArgs {
    /// Video file to play.
    path: PathBuf,

    /// Run without windows.
    #[arg(long)]
    headless: bool,

    /// Background subtractor: knn or mog2.
    #[arg(long, default_value = "knn")]
    subtractor: String,
}

#[derive(Args)]
struct AssembleArgs {
    /// Directory containing the frames/ snapshot folder.
    #[arg(default_value = DEFAULT_OUTPUT_DIR)]
    path: PathBuf,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    match cli.command {
        Command::Capture(args) => {
            run_capture(args)?;
            println!("cap test passed successfully!");
        }
        Command::Play(args) => {
            run_play(args)?;
            println!("play test passed successfully!");
        }
        Command::Assemble(args) => run_assemble(&args.path)?,
    }

    Ok(())
}

fn run_capture(args: CaptureArgs) -> Result<(), Box<dyn std::error::Error>> {
    let algorithm: SubtractorAlgorithm = args.subtractor.parse()?;
    let passes = build_detection_passes(args.cascade_dir.as_deref())?;

    let config = SessionConfig::capture(&args.path, args.output.as_deref())
        .with_save_frames(args.save_frames)
        .with_max_frames(args.max_frames);
    let source = OpenCvCapture::camera(args.camera).with_size(args.width, args.height);
    let writer = OpenCvVideoWriter::new()
        .with_fourcc(OUTPUT_FOURCC)
        .with_fps(OUTPUT_FPS);

    let stages = CaptureStages {
        writer: Box::new(writer),
        stamper: Some(FrameStamper::new(Box::new(HersheyTextRenderer::new()))),
        passes,
        compositor: Box::new(OpenCvCompositor::default()),
        snapshots: Some(Box::new(ImageFileWriter::new())),
    };

    let mut session = VideoSessionUseCase::capture(
        config,
        Box::new(source),
        build_subtractor(algorithm)?,
        build_display(args.headless),
        stages,
    )
    .with_logger(Box::new(StdoutPipelineLogger::default()));

    let report = session.execute()?;
    log::info!(
        "Recorded {} frames to {}",
        report.frames_written,
        session
            .config()
            .destination
            .as_deref()
            .unwrap_or(&args.path)
            .display()
    );
    Ok(())
}

fn run_play(args: PlayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let algorithm: SubtractorAlgorithm = args.subtractor.parse()?;
    let config = SessionConfig::playback(&args.path);

    let mut session = VideoSessionUseCase::playback(
        config,
        Box::new(OpenCvCapture::file(&args.path)),
        build_subtractor(algorithm)?,
        build_display(args.headless),
    )
    .with_logger(Box::new(StdoutPipelineLogger::default()));

    let report = session.execute()?;
    log::info!("Played {} frames of {}", report.frames_read, args.path.display());
    Ok(())
}

fn run_assemble(dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let output = dir.join(ASSEMBLED_VIDEO_NAME);
    let writer = OpenCvVideoWriter::new()
        .with_fourcc(OUTPUT_FOURCC)
        .with_fps(ASSEMBLED_FPS);

    let mut use_case =
        AssembleVideoUseCase::new(Box::new(ImageFileReader::new()), Box::new(writer));
    let written = use_case.execute(&dir.join(FRAMES_DIR_NAME), &output)?;
    log::info!("Assembled {written} frames into {}", output.display());
    Ok(())
}

fn build_detection_passes(
    cascade_dir: Option<&Path>,
) -> Result<Vec<DetectionPass>, Box<dyn std::error::Error>> {
    let specs = [
        ("eyes", EYE_CASCADE_NAME, EYE_MIN_SIZE, EYE_BOX_COLOR),
        ("face", FACE_CASCADE_NAME, FACE_MIN_SIZE, FACE_BOX_COLOR),
    ];

    let mut passes = Vec::with_capacity(specs.len());
    for (label, name, min_size, color) in specs {
        log::info!("Resolving cascade: {name}");
        let path =
            cascade_resolver::resolve(name, cascade_dir, Some(Box::new(download_progress)))?;
        let detector = HaarCascadeDetector::new(&path, min_size)?;
        passes.push(DetectionPass::new(
            label,
            Box::new(detector),
            Box::new(OpenCvRectangleRenderer::new()),
            color,
            BOX_THICKNESS,
        ));
    }
    Ok(passes)
}

fn build_subtractor(
    algorithm: SubtractorAlgorithm,
) -> Result<Box<dyn BackgroundSubtractor>, Box<dyn std::error::Error>> {
    log::info!("Using {algorithm} background subtractor");
    Ok(Box::new(OpenCvBackgroundSubtractor::new(algorithm)?))
}

fn build_display(headless: bool) -> Box<dyn FrameDisplay> {
    if headless {
        Box::new(HeadlessDisplay::new())
    } else {
        Box::new(HighguiDisplay::new())
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Command::Capture(args) => {
            if args.width == 0 || args.height == 0 {
                return Err(format!(
                    "Capture size must be non-zero, got {}x{}",
                    args.width, args.height
                )
                .into());
            }
            if args.camera < 0 {
                return Err(format!("Camera index must be >= 0, got {}", args.camera).into());
            }
            if args.max_frames == Some(0) {
                return Err("--max-frames must be at least 1".into());
            }
            if args.headless && args.max_frames.is_none() {
                return Err("--headless capture needs --max-frames to stop".into());
            }
            if let Some(name) = &args.output {
                if !is_plain_file_name(name) {
                    return Err(format!("Invalid output file name: '{name}'").into());
                }
            }
            if let Some(dir) = &args.cascade_dir {
                if !dir.is_dir() {
                    return Err(format!("Cascade directory not found: {}", dir.display()).into());
                }
            }
            args.subtractor.parse::<SubtractorAlgorithm>()?;
        }
        Command::Play(args) => {
            if !args.path.exists() {
                return Err(format!("Input file not found: {}", args.path.display()).into());
            }
            args.subtractor.parse::<SubtractorAlgorithm>()?;
        }
        Command::Assemble(args) => {
            let frames = args.path.join(FRAMES_DIR_NAME);
            if !frames.is_dir() {
                return Err(format!("Frames directory not found: {}", frames.display()).into());
            }
        }
    }
    Ok(())
}

/// A single normal path component: no directories, no `.` or `..`.
fn is_plain_file_name(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading cascade... {pct}%");
    } else {
        eprint!("\rDownloading cascade... {downloaded} bytes");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_capture_defaults() {
        let cli = parse(&["vcap", "capture"]);
        let Command::Capture(args) = &cli.command else {
            panic!("expected capture");
        };
        assert_eq!(args.path, PathBuf::from("videos"));
        assert!(!args.headless);
        assert_eq!((args.width, args.height), (640, 480));
        assert_eq!(args.subtractor, "knn");
        assert_eq!(args.camera, 0);
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_zero_size_rejected() {
        let cli = parse(&["vcap", "capture", "--width", "0"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_unknown_subtractor_rejected() {
        let cli = parse(&["vcap", "capture", "--subtractor", "gmg"]);
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().contains("gmg"));
    }

    #[test]
    fn test_play_requires_existing_file() {
        let cli = parse(&["vcap", "play", "/nonexistent/clip.mp4"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_play_requires_path() {
        assert!(Cli::try_parse_from(["vcap", "play"]).is_err());
    }

    #[test]
    fn test_headless_flag() {
        let cli = parse(&["vcap", "capture", "out", "--headless", "--max-frames", "5"]);
        let Command::Capture(args) = &cli.command else {
            panic!("expected capture");
        };
        assert!(args.headless);
        assert_eq!(args.max_frames, Some(5));
        assert_eq!(args.path, PathBuf::from("out"));
    }

    #[test]
    fn test_zero_max_frames_rejected() {
        let cli = parse(&["vcap", "capture", "--max-frames", "0"]);
        assert!(validate(&cli).is_err());
    }

    #[test]
    fn test_headless_capture_requires_frame_limit() {
        let cli = parse(&["vcap", "capture", "--headless"]);
        let err = validate(&cli).unwrap_err();
        assert!(err.to_string().contains("--max-frames"));

        let cli = parse(&["vcap", "capture", "--headless", "--max-frames", "5"]);
        assert!(validate(&cli).is_ok());
    }

    #[test]
    fn test_headless_play_needs_no_frame_limit() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let path = tmp.path().to_str().unwrap();
        let cli = parse(&["vcap", "play", path, "--headless"]);
        assert!(validate(&cli).is_ok());
    }

    #[rstest]
    #[case("clip.mp4", true)]
    #[case("sub/clip.mp4", false)]
    #[case("../clip.mp4", false)]
    #[case("/tmp/clip.mp4", false)]
    #[case("..", false)]
    fn test_output_must_be_a_bare_file_name(#[case] name: &str, #[case] accepted: bool) {
        let cli = parse(&["vcap", "capture", "--output", name]);
        assert_eq!(validate(&cli).is_ok(), accepted);
    }

    #[test]
    fn test_empty_and_dot_names_are_not_plain() {
        assert!(!is_plain_file_name(""));
        assert!(!is_plain_file_name("."));
        assert!(is_plain_file_name("take-2.mp4"));
    }
}
