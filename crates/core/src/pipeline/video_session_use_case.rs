use std::time::Instant;

use crate::annotation::domain::frame_stamper::FrameStamper;
use crate::detection::domain::detection_pass::DetectionPass;
use crate::segmentation::domain::background_subtractor::BackgroundSubtractor;
use crate::segmentation::domain::compositor::{CompositeError, MaskCompositor};
use crate::shared::constants::{
    COMPOSITE_WINDOW, OUTPUT_FOURCC, OUTPUT_FPS, PLAYBACK_MASK_WINDOW, PLAYBACK_WINDOW,
    RAW_WINDOW,
};
use crate::shared::frame::Frame;
use crate::shared::video_metadata::VideoMetadata;
use crate::video::domain::frame_display::FrameDisplay;
use crate::video::domain::frame_source::FrameSource;
use crate::video::domain::image_writer::ImageWriter;
use crate::video::domain::video_writer::VideoWriter;

use super::output_dirs::prepare_output_dirs;
use super::pipeline_logger::{NullPipelineLogger, PipelineLogger};
use super::session_config::{SessionConfig, SessionMode};
use super::session_error::SessionError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEnd {
    EndOfStream,
    Cancelled,
}

/// What a finished session did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionReport {
    pub frames_read: usize,
    pub frames_written: usize,
    /// Composites produced (capture) or masks shown (playback).
    pub overlays: usize,
    /// Frames whose composite was skipped because it could not be built.
    pub overlays_skipped: usize,
    pub end: SessionEnd,
}

impl SessionReport {
    fn new() -> Self {
        Self {
            frames_read: 0,
            frames_written: 0,
            overlays: 0,
            overlays_skipped: 0,
            end: SessionEnd::EndOfStream,
        }
    }
}

/// Stages that only run when recording from a camera.
pub struct CaptureStages {
    pub writer: Box<dyn VideoWriter>,
    pub stamper: Option<FrameStamper>,
    pub passes: Vec<DetectionPass>,
    pub compositor: Box<dyn MaskCompositor>,
    /// Saves each composite as `<dir>/frames/<index>.png` when present.
    pub snapshots: Option<Box<dyn ImageWriter>>,
}

/// Drives one capture or playback session from open to release.
///
/// Every resource is owned by the use case and released before `execute`
/// returns, whether the loop ended normally, was cancelled, or failed.
pub struct VideoSessionUseCase {
    config: SessionConfig,
    source: Box<dyn FrameSource>,
    subtractor: Box<dyn BackgroundSubtractor>,
    display: Box<dyn FrameDisplay>,
    capture: Option<CaptureStages>,
    logger: Box<dyn PipelineLogger>,
}

impl VideoSessionUseCase {
    pub fn capture(
        config: SessionConfig,
        source: Box<dyn FrameSource>,
        subtractor: Box<dyn BackgroundSubtractor>,
        display: Box<dyn FrameDisplay>,
        stages: CaptureStages,
    ) -> Self {
        Self {
            config,
            source,
            subtractor,
            display,
            capture: Some(stages),
            logger: Box::new(NullPipelineLogger),
        }
    }

    pub fn playback(
        config: SessionConfig,
        source: Box<dyn FrameSource>,
        subtractor: Box<dyn BackgroundSubtractor>,
        display: Box<dyn FrameDisplay>,
    ) -> Self {
        Self {
            config,
            source,
            subtractor,
            display,
            capture: None,
            logger: Box::new(NullPipelineLogger),
        }
    }

    pub fn with_logger(mut self, logger: Box<dyn PipelineLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn execute(&mut self) -> Result<SessionReport, SessionError> {
        if self.config.mode == SessionMode::Capture {
            prepare_output_dirs(&self.config.output_dir).map_err(|source| {
                SessionError::OutputDir {
                    path: self.config.output_dir.clone(),
                    source,
                }
            })?;
        }

        let metadata = match self.source.open() {
            Ok(m) => m,
            Err(e) => {
                let _ = self.release();
                return Err(SessionError::SourceOpen(e.to_string()));
            }
        };

        if let Err(e) = self.open_writer(&metadata) {
            let _ = self.release();
            return Err(e);
        }

        let result = self.run_loop(&metadata);
        let closed = self.release();
        let report = result?;
        closed?;

        log::info!(
            "Session ended ({:?}): {} frames read, {} written, {} overlays, {} skipped",
            report.end,
            report.frames_read,
            report.frames_written,
            report.overlays,
            report.overlays_skipped
        );
        Ok(report)
    }

    fn open_writer(&mut self, metadata: &VideoMetadata) -> Result<(), SessionError> {
        let Some(stages) = self.capture.as_mut() else {
            return Ok(());
        };
        let path = self
            .config
            .destination
            .clone()
            .unwrap_or_else(|| self.config.output_dir.clone());
        let out_meta = VideoMetadata {
            fps: OUTPUT_FPS,
            total_frames: 0,
            codec: OUTPUT_FOURCC.iter().collect(),
            source_path: Some(path.clone()),
            ..metadata.clone()
        };
        stages
            .writer
            .open(&path, &out_meta)
            .map_err(|e| SessionError::WriterOpen {
                path,
                message: e.to_string(),
            })
    }

    fn run_loop(&mut self, metadata: &VideoMetadata) -> Result<SessionReport, SessionError> {
        let Self {
            config,
            source,
            subtractor,
            display,
            capture,
            logger,
        } = self;
        let expected = (metadata.width, metadata.height);
        let mut report = SessionReport::new();
        logger.info(&format!(
            "{:?} session on {}: {}x{} @ {:.1} fps",
            config.mode,
            if metadata.is_live() { "camera" } else { "file" },
            metadata.width,
            metadata.height,
            metadata.fps
        ));

        loop {
            let frame = match source.read() {
                Ok(Some(frame)) => frame,
                Ok(None) => break,
                Err(e) => return Err(SessionError::Read(e.to_string())),
            };
            report.frames_read += 1;

            match capture.as_mut() {
                Some(stages) => capture_frame(
                    config,
                    expected,
                    frame,
                    stages,
                    subtractor.as_mut(),
                    display.as_mut(),
                    logger.as_mut(),
                    &mut report,
                )?,
                None => playback_frame(
                    frame,
                    subtractor.as_mut(),
                    display.as_mut(),
                    &mut report,
                )?,
            }
            logger.progress(report.frames_read, metadata.total_frames);

            let key = display
                .poll_key(config.key_delay_ms)
                .map_err(|e| SessionError::Display(e.to_string()))?;
            if key.is_some_and(|k| config.is_cancel_key(k)) {
                log::info!("Cancelled by key press after {} frames", report.frames_read);
                report.end = SessionEnd::Cancelled;
                break;
            }
            if config.max_frames.is_some_and(|max| report.frames_read >= max) {
                log::info!("Reached frame limit of {}", report.frames_read);
                break;
            }
        }

        Ok(report)
    }

    /// Releases the source, finalizes the writer and closes windows.
    fn release(&mut self) -> Result<(), SessionError> {
        self.source.release();
        let closed = match self.capture.as_mut() {
            Some(stages) => stages
                .writer
                .close()
                .map_err(|e| SessionError::Write(e.to_string())),
            None => Ok(()),
        };
        self.display.close();
        self.logger.summary();
        closed
    }
}

fn subtract_and_compose(
    frame: &Frame,
    subtractor: &mut dyn BackgroundSubtractor,
    compositor: &dyn MaskCompositor,
) -> Result<Frame, CompositeError> {
    let fg_mask = subtractor
        .apply(frame)
        .map_err(|e| CompositeError::Processing(e.to_string()))?;
    compositor.compose(frame, &fg_mask)
}

#[allow(clippy::too_many_arguments)]
fn capture_frame(
    config: &SessionConfig,
    expected: (u32, u32),
    mut frame: Frame,
    stages: &mut CaptureStages,
    subtractor: &mut dyn BackgroundSubtractor,
    display: &mut dyn FrameDisplay,
    logger: &mut dyn PipelineLogger,
    report: &mut SessionReport,
) -> Result<(), SessionError> {
    let index = frame.index();
    if frame.dimensions() != expected {
        return Err(SessionError::FrameSizeMismatch {
            index,
            expected,
            actual: frame.dimensions(),
        });
    }

    if let Some(stamper) = &stages.stamper {
        if let Err(e) = stamper.stamp(&mut frame) {
            log::warn!("Frame {index}: timestamp skipped: {e}");
        }
    }

    let t = Instant::now();
    let composite = match subtract_and_compose(&frame, subtractor, stages.compositor.as_ref()) {
        Ok(c) => {
            report.overlays += 1;
            Some(c)
        }
        Err(e) => {
            log::warn!("Frame {index}: composite skipped: {e}");
            report.overlays_skipped += 1;
            None
        }
    };
    logger.timing("composite", t.elapsed().as_secs_f64() * 1000.0);

    // Every pass sees the same unboxed frame.
    let t = Instant::now();
    let found: Vec<_> = stages
        .passes
        .iter_mut()
        .map(|pass| pass.detect(&frame))
        .collect();
    for (pass, found) in stages.passes.iter().zip(found) {
        match found {
            Ok(regions) => {
                log::debug!("Frame {index}: {} {} region(s)", regions.len(), pass.label());
                logger.metric(pass.label(), regions.len() as f64);
                if let Err(e) = pass.draw(&mut frame, &regions) {
                    log::warn!("Frame {index}: {} boxes not drawn: {e}", pass.label());
                }
            }
            Err(e) => log::warn!("Frame {index}: {} detection skipped: {e}", pass.label()),
        }
    }
    logger.timing("detect", t.elapsed().as_secs_f64() * 1000.0);

    if let Some(composite) = &composite {
        display
            .show(COMPOSITE_WINDOW, composite)
            .map_err(|e| SessionError::Display(e.to_string()))?;
        if let (true, Some(snapshots)) = (config.save_frames, &stages.snapshots) {
            let path = config.snapshot_path(index);
            if let Err(e) = snapshots.write(&path, composite) {
                log::warn!("Frame {index}: snapshot {} not saved: {e}", path.display());
            }
        }
    }
    display
        .show(RAW_WINDOW, &frame)
        .map_err(|e| SessionError::Display(e.to_string()))?;

    let t = Instant::now();
    stages
        .writer
        .write(&frame)
        .map_err(|e| SessionError::Write(e.to_string()))?;
    logger.timing("write", t.elapsed().as_secs_f64() * 1000.0);
    report.frames_written += 1;
    Ok(())
}

fn playback_frame(
    frame: Frame,
    subtractor: &mut dyn BackgroundSubtractor,
    display: &mut dyn FrameDisplay,
    report: &mut SessionReport,
) -> Result<(), SessionError> {
    let mask = match subtractor.apply(&frame) {
        Ok(mask) => Some(mask),
        Err(e) => {
            log::warn!("Frame {}: foreground mask skipped: {e}", frame.index());
            report.overlays_skipped += 1;
            None
        }
    };
    display
        .show(PLAYBACK_WINDOW, &frame)
        .map_err(|e| SessionError::Display(e.to_string()))?;
    if let Some(mask) = mask {
        display
            .show(PLAYBACK_MASK_WINDOW, &mask)
            .map_err(|e| SessionError::Display(e.to_string()))?;
        report.overlays += 1;
    }
    Ok(())
}
