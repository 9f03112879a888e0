//! Main application module for live mudra recognition.

use crate::{
    classification::Classifier,
    error::{Error, Result},
    frame::{Frame, InvertMode},
    hand_detection::LandmarkSource,
    pipeline::{FrameResult, Pipeline},
    render::Renderer,
    utils::image_conversion::{frame_to_mat, mat_to_frame},
    utils::safe_cast::{f64_to_i32_saturating, usize_to_i32},
};
use log::{debug, info, warn};
use opencv::{
    core::{Mat, Size},
    highgui::{self, WINDOW_NORMAL},
    imgproc::{self, InterpolationFlags},
    prelude::*,
    videoio::{self, VideoCapture, CAP_PROP_BUFFERSIZE},
};
use std::time::{Duration, Instant};

const MAIN_WINDOW: &str = "Mudra Detection";
const PREVIEW_WINDOW: &str = "Model Input";

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Camera index or video file path
    pub video_source: VideoSource,
    /// GUI display mode
    pub gui_mode: GuiMode,
    /// Image inversion mode
    pub invert_mode: InvertMode,
    /// Show the classifier input window
    pub show_model_input: bool,
    /// Side length of the classifier input window
    pub model_preview_size: usize,
    /// Draw the frame rate
    pub show_fps: bool,
    /// Playback rate for video files
    pub target_fps: f64,
}

/// Video source type
#[derive(Debug, Clone, PartialEq)]
pub enum VideoSource {
    /// Webcam index
    Camera(i32),
    /// Video file path
    File(String),
}

/// GUI display mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuiMode {
    /// Camera window and model input window
    All,
    /// Show camera window only
    Camera,
    /// No GUI (headless)
    None,
}

impl GuiMode {
    /// Parse a command line or config value, falling back to `All`
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "cam" | "camera" => Self::Camera,
            "none" => Self::None,
            _ => Self::All,
        }
    }

    fn shows_camera(self) -> bool {
        self != Self::None
    }
}

/// Anything that yields frames one at a time
pub trait FrameSource {
    /// Next frame, `None` at end of stream
    ///
    /// # Errors
    ///
    /// Returns [`Error::Capture`] for a frame that could not be read; the
    /// caller may retry.
    fn next_frame(&mut self) -> Result<Option<Frame>>;
}

/// Camera or video file read through OpenCV
pub struct VideoCaptureSource {
    capture: VideoCapture,
    is_file: bool,
}

impl VideoCaptureSource {
    /// Open a camera or video file
    ///
    /// # Errors
    ///
    /// Returns [`Error::Device`] if the source cannot be opened.
    pub fn open(source: &VideoSource) -> Result<Self> {
        let (capture, is_file) = match source {
            VideoSource::Camera(index) => {
                info!("Opening camera {index}");
                let mut cap = VideoCapture::new(*index, videoio::CAP_ANY)?;
                if cap.is_opened()? {
                    // Reduce buffer size for lower latency (webcam only)
                    cap.set(CAP_PROP_BUFFERSIZE, 1.0)?;
                }
                (cap, false)
            }
            VideoSource::File(path) => {
                info!("Opening video file: {path}");
                (VideoCapture::from_file(path, videoio::CAP_ANY)?, true)
            }
        };

        if !capture.is_opened()? {
            return Err(Error::Device(format!("Could not open video source {source:?}")));
        }
        Ok(Self { capture, is_file })
    }
}

impl FrameSource for VideoCaptureSource {
    fn next_frame(&mut self) -> Result<Option<Frame>> {
        let mut mat = Mat::default();
        let read = self.capture.read(&mut mat);
        read_outcome(read, &mat, self.is_file)
    }
}

/// Turn the result of one `VideoCapture::read` into a frame.
///
/// A file that stops yielding frames has ended. For cameras every failure,
/// including an OpenCV exception or an unusable frame format, is a
/// [`Error::Capture`] so the loop retries with the next frame.
fn read_outcome(read: opencv::Result<bool>, mat: &Mat, is_file: bool) -> Result<Option<Frame>> {
    if is_file {
        if !read? || mat.empty() {
            return Ok(None);
        }
        return mat_to_frame(mat).map(Some);
    }

    match read {
        Ok(true) if !mat.empty() => mat_to_frame(mat)
            .map(Some)
            .map_err(|e| Error::Capture(format!("Unusable camera frame: {e}"))),
        Ok(_) => Err(Error::Capture("Failed to read frame from camera".to_string())),
        Err(e) => Err(Error::Capture(format!("Camera read failed: {e}"))),
    }
}

impl Drop for VideoCaptureSource {
    fn drop(&mut self) {
        if let Err(e) = self.capture.release() {
            warn!("Failed to release video source: {e}");
        }
    }
}

/// Main application struct
pub struct MudraApp<L: LandmarkSource, C: Classifier> {
    config: AppConfig,
    source: Box<dyn FrameSource>,
    pipeline: Pipeline<L, C>,
    renderer: Renderer,
    last_labels: Vec<Option<String>>,
}

impl<L: LandmarkSource, C: Classifier> MudraApp<L, C> {
    /// Open the video source and create the GUI windows
    ///
    /// # Errors
    ///
    /// Returns an error if the video source cannot be opened or a window
    /// cannot be created.
    pub fn new(config: AppConfig, pipeline: Pipeline<L, C>, renderer: Renderer) -> Result<Self> {
        info!("Initializing mudra recognition application");
        let source = Box::new(VideoCaptureSource::open(&config.video_source)?);
        Self::with_source(config, source, pipeline, renderer)
    }

    /// Build the application around an already opened frame source
    ///
    /// # Errors
    ///
    /// Returns an error if a window cannot be created.
    pub fn with_source(
        config: AppConfig,
        source: Box<dyn FrameSource>,
        pipeline: Pipeline<L, C>,
        renderer: Renderer,
    ) -> Result<Self> {
        if config.gui_mode.shows_camera() {
            highgui::named_window(MAIN_WINDOW, WINDOW_NORMAL)?;
        }
        if config.gui_mode == GuiMode::All && config.show_model_input {
            highgui::named_window(PREVIEW_WINDOW, WINDOW_NORMAL)?;
        }

        let slots = pipeline.slots();
        Ok(Self {
            config,
            source,
            pipeline,
            renderer,
            last_labels: vec![None; slots],
        })
    }

    /// Run the main application loop
    ///
    /// # Errors
    ///
    /// Returns an error on a non-transient capture, processing or display
    /// failure.
    pub fn run(&mut self) -> Result<()> {
        info!("Starting main application loop");

        let mut frame_count = 0u32;
        let mut fps_window_start = Instant::now();
        let mut fps = 0.0;
        let wait_ms = self.wait_delay_ms();

        loop {
            let mut frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("End of video file reached");
                    break;
                }
                Err(e) if e.is_transient() => {
                    warn!("{e}, retrying...");
                    continue;
                }
                Err(e) => return Err(e),
            };

            frame.apply_inversion(self.config.invert_mode);

            let result = match self.pipeline.process_frame(&frame) {
                Ok(result) => result,
                Err(e) => {
                    warn!("Hand detection failed: {e}");
                    FrameResult::default()
                }
            };
            self.log_label_changes(&result);

            // Update FPS counter
            frame_count += 1;
            let elapsed = fps_window_start.elapsed();
            if elapsed >= Duration::from_secs(1) {
                fps = f64::from(frame_count) / elapsed.as_secs_f64();
                frame_count = 0;
                fps_window_start = Instant::now();
                debug!("FPS: {fps:.1}");
            }

            if self.config.gui_mode.shows_camera() {
                self.display_results(&frame, &result, fps)?;

                let key = highgui::wait_key(wait_ms)?;
                if key == 27 || key == i32::from(b'q') {
                    info!("Exit requested by user");
                    break;
                }
                if key == i32::from(b'r') {
                    self.pipeline.reset_tracking();
                    self.last_labels.fill(None);
                }
            }
        }

        info!("Application shutting down");
        if self.config.gui_mode.shows_camera() {
            highgui::destroy_all_windows()?;
        }
        Ok(())
    }

    fn wait_delay_ms(&self) -> i32 {
        match self.config.video_source {
            VideoSource::File(_) if self.config.target_fps > 0.0 => {
                f64_to_i32_saturating(1000.0 / self.config.target_fps).max(1)
            }
            _ => 1,
        }
    }

    /// Report label changes per hand slot
    fn log_label_changes(&mut self, result: &FrameResult) {
        for (slot, hand) in result.hands.iter().enumerate() {
            let Some(decision) = &hand.decision else {
                continue;
            };
            let text = decision.to_string();
            if let Some(last) = self.last_labels.get_mut(slot) {
                if last.as_deref() != Some(text.as_str()) {
                    info!("Hand {slot}: {text}");
                    *last = Some(text);
                }
            }
        }
    }

    /// Display results in GUI windows
    fn display_results(&self, frame: &Frame, result: &FrameResult, fps: f64) -> Result<()> {
        let mut display_frame = frame_to_mat(frame)?;
        let fps = self.config.show_fps.then_some(fps);
        self.renderer.draw(&mut display_frame, result, fps)?;
        highgui::imshow(MAIN_WINDOW, &display_frame)?;

        if self.config.gui_mode == GuiMode::All && self.config.show_model_input {
            let preview = result.hands.iter().find_map(|h| h.model_input.as_ref());
            if let Some(preview) = preview {
                let side = usize_to_i32(self.config.model_preview_size)?;
                let mut resized = Mat::default();
                imgproc::resize(
                    &frame_to_mat(preview)?,
                    &mut resized,
                    Size::new(side, side),
                    0.0,
                    0.0,
                    InterpolationFlags::INTER_LINEAR as i32,
                )?;
                highgui::imshow(PREVIEW_WINDOW, &resized)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gui_mode_parse() {
        assert_eq!(GuiMode::parse("all"), GuiMode::All);
        assert_eq!(GuiMode::parse("cam"), GuiMode::Camera);
        assert_eq!(GuiMode::parse("NONE"), GuiMode::None);
        assert_eq!(GuiMode::parse("bogus"), GuiMode::All);
    }

    #[test]
    fn test_camera_read_exception_is_retried() {
        let err = read_outcome(Err(opencv::Error::new(-2, "device busy")), &Mat::default(), false).unwrap_err();
        assert!(matches!(err, Error::Capture(_)));
        assert!(err.is_transient());

        let err = read_outcome(Ok(false), &Mat::default(), false).unwrap_err();
        assert!(err.is_transient());
    }

    #[test]
    fn test_unusable_camera_frame_is_retried() {
        let gray = Mat::new_rows_cols_with_default(4, 4, opencv::core::CV_8UC1, opencv::core::Scalar::all(0.0)).unwrap();
        let err = read_outcome(Ok(true), &gray, false).unwrap_err();
        assert!(matches!(err, Error::Capture(_)));
    }

    #[test]
    fn test_file_end_and_frames() {
        assert!(read_outcome(Ok(false), &Mat::default(), true).unwrap().is_none());

        let bgr = Mat::new_rows_cols_with_default(2, 3, opencv::core::CV_8UC3, opencv::core::Scalar::all(7.0)).unwrap();
        let frame = read_outcome(Ok(true), &bgr, false).unwrap().unwrap();
        assert_eq!((frame.width(), frame.height()), (3, 2));
        assert_eq!(frame.pixel(1, 2), [7, 7, 7]);
    }
}
