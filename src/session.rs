//! Edit session controller
//!
//! A state machine over one working image. Every edit flows through here: the
//! session validates the transition, delegates raster work to the compositor
//! or a remote collaborator, and replaces the working image only on success.
//! At most one operation is in flight at a time; the working image is never
//! mutated, only swapped for the operation's output.

use crate::compositor::Compositor;
use crate::config::EditorConfig;
use crate::error::{EditorError, Result};
use crate::geometry::{CropArea, EditAdjustments, ResizeSpec};
use crate::monetize::{GateDecision, GatedAction, MonetizationGate};
use crate::preview::{PreviewFrame, PreviewProxy};
use crate::remote::{BackgroundRemover, RewardedAdProvider, UpscaleFactor, Upscaler};
use crate::services::io::ImageIOService;
use crate::services::progress::{EditStage, NoOpProgressReporter, ProgressReporter, ProgressTracker};
use crate::types::{Background, EditMetadata, EditTimings, RasterImage};
use instant::Instant;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// States the edit session moves through
///
/// `Empty -> Loaded` on image selection; each edit flow steps into its own
/// state and returns to `Loaded` on confirm, cancel, or failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No image selected
    Empty,
    /// Working image ready, no flow active
    Loaded,
    /// Crop flow active
    Cropping,
    /// Resize flow active
    Resizing,
    /// Adjustment flow active, previews being served
    Adjusting,
    /// Background-removal call pending
    RemovingBackground,
    /// Upscaling call pending
    Upscaling,
}

impl SessionState {
    /// Whether an edit flow or remote call is currently active
    #[must_use]
    pub fn is_busy(&self) -> bool {
        !matches!(self, Self::Empty | Self::Loaded)
    }
}

/// Outcome of an operation that consults the monetization gate
#[derive(Debug)]
pub enum Gated<T> {
    /// The gate allowed the action and it completed
    Allowed(T),
    /// The action was not performed; a rewarded ad or premium is required
    NeedsAdOrPremium,
}

impl<T> Gated<T> {
    /// Whether the gate allowed the action
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed(_))
    }
}

/// Edit session over a single working image
pub struct EditSession {
    config: EditorConfig,
    compositor: Compositor,
    gate: MonetizationGate,
    state: SessionState,
    working: Option<RasterImage>,
    image_name: Option<String>,
    background: Background,
    history: Vec<EditMetadata>,
    preview_proxy: Option<PreviewProxy>,
    preview_generation: u64,
    remover: Option<Arc<dyn BackgroundRemover>>,
    upscaler: Option<Arc<dyn Upscaler>>,
    ad_provider: Option<Arc<dyn RewardedAdProvider>>,
    reporter: Arc<dyn ProgressReporter>,
}

impl EditSession {
    /// Create a session with no remote collaborators wired
    #[must_use]
    pub fn new(config: EditorConfig) -> Self {
        let compositor = Compositor::from_config(&config);
        Self {
            config,
            compositor,
            gate: MonetizationGate::new(),
            state: SessionState::Empty,
            working: None,
            image_name: None,
            background: Background::Transparent,
            history: Vec::new(),
            preview_proxy: None,
            preview_generation: 0,
            remover: None,
            upscaler: None,
            ad_provider: None,
            reporter: Arc::new(NoOpProgressReporter),
        }
    }

    /// Wire the background-removal collaborator
    #[must_use]
    pub fn with_background_remover(mut self, remover: Arc<dyn BackgroundRemover>) -> Self {
        self.remover = Some(remover);
        self
    }

    /// Wire the upscaling collaborator
    #[must_use]
    pub fn with_upscaler(mut self, upscaler: Arc<dyn Upscaler>) -> Self {
        self.upscaler = Some(upscaler);
        self
    }

    /// Wire the rewarded-ad collaborator
    #[must_use]
    pub fn with_ad_provider(mut self, provider: Arc<dyn RewardedAdProvider>) -> Self {
        self.ad_provider = Some(provider);
        self
    }

    /// Wire a progress reporter
    #[must_use]
    pub fn with_progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    // Accessors

    #[must_use]
    pub fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub fn working_image(&self) -> Option<&RasterImage> {
        self.working.as_ref()
    }

    #[must_use]
    pub fn image_name(&self) -> Option<&str> {
        self.image_name.as_deref()
    }

    #[must_use]
    pub fn monetization(&self) -> &MonetizationGate {
        &self.gate
    }

    /// Committed edits, oldest first
    #[must_use]
    pub fn history(&self) -> &[EditMetadata] {
        &self.history
    }

    /// Generation of the most recently requested preview
    ///
    /// A `PreviewFrame` with an older generation is stale and must not be
    /// displayed.
    #[must_use]
    pub fn preview_generation(&self) -> u64 {
        self.preview_generation
    }

    /// Background applied when composing the final image
    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    // Image selection

    /// Load a new working image from encoded bytes
    ///
    /// Allowed when no edit flow is active; replaces any previous image.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::Decode` for undecodable bytes and
    /// `EditorError::ConcurrentEdit` while a flow is active.
    #[instrument(skip(self, bytes, name), fields(name = %name.as_ref(), bytes = bytes.len()))]
    pub fn select_image(&mut self, bytes: Vec<u8>, name: impl AsRef<str>) -> Result<()> {
        self.ensure_idle("select image")?;
        let image = RasterImage::from_bytes(bytes)?;
        info!(
            width = image.width(),
            height = image.height(),
            "image selected"
        );
        self.working = Some(image);
        self.image_name = Some(name.as_ref().to_string());
        self.invalidate_preview();
        self.state = SessionState::Loaded;
        Ok(())
    }

    /// Drop the working image and all flow state, back to `Empty`
    pub fn reset(&mut self) {
        self.working = None;
        self.image_name = None;
        self.background = Background::Transparent;
        self.history.clear();
        self.invalidate_preview();
        self.state = SessionState::Empty;
        debug!("session reset");
    }

    // Crop flow

    /// Enter the crop flow
    pub fn begin_crop(&mut self) -> Result<()> {
        self.begin_flow(SessionState::Cropping, "crop")
    }

    /// Commit the crop and return to `Loaded`
    ///
    /// # Errors
    ///
    /// Returns `EditorError::InvalidCrop` for out-of-bounds geometry; the
    /// working image is untouched and the flow stays active so the caller can
    /// retry or cancel.
    #[instrument(skip(self))]
    pub fn confirm_crop(&mut self, area: CropArea) -> Result<()> {
        self.ensure_state(SessionState::Cropping, "confirm crop")?;
        let tracker = self.tracker();
        tracker.stage(EditStage::Cropping);

        let start = Instant::now();
        let source = self.working_ref()?;
        let result = match self.compositor.crop(source, area) {
            Ok(image) => image,
            Err(e) => {
                tracker.error(EditStage::Cropping, &e.to_string());
                return Err(e);
            },
        };
        self.commit("crop", result, start, &tracker);
        Ok(())
    }

    // Resize flow

    /// Enter the resize flow
    pub fn begin_resize(&mut self) -> Result<()> {
        self.begin_flow(SessionState::Resizing, "resize")
    }

    /// Commit the resize and return to `Loaded`
    #[instrument(skip(self))]
    pub fn confirm_resize(&mut self, spec: ResizeSpec) -> Result<()> {
        self.ensure_state(SessionState::Resizing, "confirm resize")?;
        let tracker = self.tracker();
        tracker.stage(EditStage::Resizing);

        let start = Instant::now();
        let source = self.working_ref()?;
        let result = match self.compositor.resize(source, spec) {
            Ok(image) => image,
            Err(e) => {
                tracker.error(EditStage::Resizing, &e.to_string());
                return Err(e);
            },
        };
        self.commit("resize", result, start, &tracker);
        Ok(())
    }

    // Adjustment flow

    /// Enter the adjustment flow
    pub fn begin_adjust(&mut self) -> Result<()> {
        self.begin_flow(SessionState::Adjusting, "adjust")
    }

    /// Render a live preview of the given adjustments
    ///
    /// Serves from a cached downscaled proxy of the working image; each call
    /// bumps the generation so earlier frames become stale. Only valid while
    /// the adjustment flow is active.
    pub fn preview_adjustments(&mut self, adjustments: EditAdjustments) -> Result<PreviewFrame> {
        self.ensure_state(SessionState::Adjusting, "preview adjustments")?;
        if self.preview_proxy.is_none() {
            let decoded = self.working_ref()?.decode()?;
            self.preview_proxy = Some(PreviewProxy::from_image(&decoded));
        }
        self.preview_generation += 1;
        let proxy = self
            .preview_proxy
            .as_ref()
            .ok_or_else(|| EditorError::internal("preview proxy missing after construction"))?;
        Ok(PreviewFrame::render(
            proxy,
            adjustments,
            self.preview_generation,
        ))
    }

    /// Whether a rendered frame is still the latest requested preview
    #[must_use]
    pub fn is_current_preview(&self, frame: &PreviewFrame) -> bool {
        frame.generation == self.preview_generation
    }

    /// Commit the adjustments through the exact pipeline and return to `Loaded`
    #[instrument(skip(self))]
    pub fn confirm_adjust(&mut self, adjustments: EditAdjustments) -> Result<()> {
        self.ensure_state(SessionState::Adjusting, "confirm adjustments")?;
        let tracker = self.tracker();
        tracker.stage(EditStage::Adjusting);

        let start = Instant::now();
        let source = self.working_ref()?;
        let result = match self.compositor.apply_adjustments(source, adjustments) {
            Ok(image) => image,
            Err(e) => {
                tracker.error(EditStage::Adjusting, &e.to_string());
                return Err(e);
            },
        };
        self.commit("adjust", result, start, &tracker);
        Ok(())
    }

    /// Abandon the active flow without committing anything
    ///
    /// No-op when no flow is active.
    pub fn cancel(&mut self) {
        if self.state.is_busy() {
            debug!(state = ?self.state, "flow cancelled");
            self.invalidate_preview();
            self.state = SessionState::Loaded;
        }
    }

    // Remote operations

    /// Remove the background of the working image via the remote service
    ///
    /// On success the working image is replaced by the returned cut-out; on
    /// failure the working image is untouched and the error surfaces.
    ///
    /// # Errors
    ///
    /// Returns `EditorError::ConcurrentEdit` while another flow is active,
    /// `EditorError::InvalidConfig` when no collaborator is wired, and
    /// `EditorError::RemoteService` for service failures.
    #[instrument(skip(self))]
    pub async fn request_remove_background(&mut self) -> Result<()> {
        self.ensure_state(SessionState::Loaded, "remove background")?;
        let remover = self
            .remover
            .clone()
            .ok_or_else(|| EditorError::invalid_config("no background remover configured"))?;

        let tracker = self.tracker();
        let start = Instant::now();
        self.state = SessionState::RemovingBackground;
        tracker.stage(EditStage::Uploading);

        let source_bytes = match self.working_ref() {
            Ok(image) => image.as_bytes().to_vec(),
            Err(e) => {
                self.state = SessionState::Loaded;
                return Err(e);
            },
        };
        tracker.stage(EditStage::RemovingBackground);
        let outcome = remover.remove_background(&source_bytes).await;
        self.state = SessionState::Loaded;

        match outcome {
            Ok(bytes) => {
                let image = RasterImage::from_bytes(bytes)?;
                self.commit("remove_background", image, start, &tracker);
                Ok(())
            },
            Err(e) => {
                warn!(error = %e, "background removal failed, keeping working image");
                tracker.error(EditStage::RemovingBackground, &e.to_string());
                Err(e)
            },
        }
    }

    /// Upscale the working image via the remote service, subject to the gate
    ///
    /// Returns `Gated::NeedsAdOrPremium` without side effects when the gate
    /// rejects the action.
    #[instrument(skip(self))]
    pub async fn request_upscale(&mut self, factor: UpscaleFactor) -> Result<Gated<()>> {
        self.ensure_state(SessionState::Loaded, "upscale")?;
        if self.gate.request_gated_action(GatedAction::Upscale) == GateDecision::NeedsAdOrPremium {
            debug!("upscale gated");
            return Ok(Gated::NeedsAdOrPremium);
        }
        let upscaler = self
            .upscaler
            .clone()
            .ok_or_else(|| EditorError::invalid_config("no upscaler configured"))?;

        let tracker = self.tracker();
        let start = Instant::now();
        self.state = SessionState::Upscaling;
        tracker.stage(EditStage::Uploading);

        let source_bytes = match self.working_ref() {
            Ok(image) => image.as_bytes().to_vec(),
            Err(e) => {
                self.state = SessionState::Loaded;
                return Err(e);
            },
        };
        tracker.stage(EditStage::Upscaling);
        let outcome = upscaler.upscale(&source_bytes, factor).await;
        self.state = SessionState::Loaded;

        match outcome {
            Ok(bytes) => {
                let image = RasterImage::from_bytes(bytes)?;
                self.commit("upscale", image, start, &tracker);
                Ok(Gated::Allowed(()))
            },
            Err(e) => {
                warn!(error = %e, "upscaling failed, keeping working image");
                tracker.error(EditStage::Upscaling, &e.to_string());
                Err(e)
            },
        }
    }

    /// Show a rewarded ad and record its outcome in the gate
    ///
    /// Returns whether the reward was earned. The session waits for the
    /// provider's genuine completion signal; there is no timer fallback.
    pub async fn watch_rewarded_ad(&mut self) -> Result<bool> {
        let provider = self
            .ad_provider
            .clone()
            .ok_or_else(|| EditorError::invalid_config("no rewarded-ad provider configured"))?;
        provider.prepare().await?;
        let outcome = provider.show().await?;
        Ok(self.gate.complete_rewarded_ad(&outcome))
    }

    /// Upgrade the session to premium
    pub fn grant_premium(&mut self) {
        self.gate.grant_premium();
    }

    // Final composition

    /// Compose the final image: background, subject, watermark if visible
    ///
    /// Standard quality is capped to the configured max dimension and carries
    /// the watermark while it is visible. High quality bypasses the cap and
    /// omits the watermark, subject to the gate.
    #[instrument(skip(self))]
    pub fn compose_final(&self, high_quality: bool) -> Result<Gated<RasterImage>> {
        self.ensure_state(SessionState::Loaded, "compose final image")?;
        if high_quality
            && self.gate.request_gated_action(GatedAction::HighQualityExport)
                == GateDecision::NeedsAdOrPremium
        {
            debug!("high-quality export gated");
            return Ok(Gated::NeedsAdOrPremium);
        }

        let tracker = self.tracker();
        let subject = self.working_ref()?;
        let mut composed = self.compositor.composite_background(subject, &self.background)?;

        if !high_quality {
            composed = self
                .compositor
                .downscale_to_fit(&composed, self.config.export_max_dimension)?;
            if self.gate.watermark_visible() {
                tracker.stage(EditStage::Watermarking);
                composed = self
                    .compositor
                    .stamp_watermark(&composed, &self.config.watermark)?;
            }
        }

        tracker.stage(EditStage::Encoding);
        info!(
            high_quality,
            width = composed.width(),
            height = composed.height(),
            "final image composed"
        );
        Ok(Gated::Allowed(composed))
    }

    /// Compose the final image and write it to a file
    pub fn export<P: AsRef<Path>>(&self, path: P, high_quality: bool) -> Result<Gated<()>> {
        match self.compose_final(high_quality)? {
            Gated::Allowed(image) => {
                ImageIOService::save_image(&image, path)?;
                Ok(Gated::Allowed(()))
            },
            Gated::NeedsAdOrPremium => Ok(Gated::NeedsAdOrPremium),
        }
    }

    // Internal helpers

    fn tracker(&self) -> ProgressTracker {
        ProgressTracker::new(self.reporter.clone())
    }

    fn working_ref(&self) -> Result<&RasterImage> {
        self.working
            .as_ref()
            .ok_or_else(|| EditorError::internal("no working image in a loaded session"))
    }

    fn ensure_idle(&self, operation: &str) -> Result<()> {
        if self.state.is_busy() {
            return Err(EditorError::concurrent_edit(format!(
                "cannot {} while {:?} is active",
                operation, self.state
            )));
        }
        Ok(())
    }

    fn ensure_state(&self, expected: SessionState, operation: &str) -> Result<()> {
        if self.state == expected {
            return Ok(());
        }
        if self.state == SessionState::Empty {
            return Err(EditorError::concurrent_edit(format!(
                "cannot {}: no image loaded",
                operation
            )));
        }
        if self.state.is_busy() {
            return Err(EditorError::concurrent_edit(format!(
                "cannot {} while {:?} is active",
                operation, self.state
            )));
        }
        Err(EditorError::concurrent_edit(format!(
            "cannot {} in state {:?}",
            operation, self.state
        )))
    }

    fn begin_flow(&mut self, target: SessionState, name: &str) -> Result<()> {
        self.ensure_state(SessionState::Loaded, name)?;
        debug!(flow = name, "flow started");
        self.state = target;
        Ok(())
    }

    /// Swap in the operation's output and record its metadata
    fn commit(&mut self, operation: &str, image: RasterImage, start: Instant, tracker: &ProgressTracker) {
        let timings = EditTimings {
            operation_ms: start.elapsed().as_millis() as u64,
            total_ms: tracker.elapsed_ms(),
            ..EditTimings::default()
        };
        debug!(
            operation,
            width = image.width(),
            height = image.height(),
            elapsed_ms = timings.total_ms,
            "edit committed"
        );
        self.working = Some(image);
        self.history
            .push(EditMetadata::new(operation).with_timings(timings.clone()));
        self.invalidate_preview();
        self.state = SessionState::Loaded;
        tracker.complete(&timings);
    }

    fn invalidate_preview(&mut self) {
        self.preview_proxy = None;
    }
}
