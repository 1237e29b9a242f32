//! Interactive mask design session
//!
//! [MaskSession] holds everything a mask builder plugin keeps between user
//! actions: the shape list, undo history, FOV overlay, grism selection and
//! display options. Every method runs one user action to completion and
//! redraws the affected canvas objects. Requests that would break a placement
//! rule come back as a [Rejection] without touching any state, for the host
//! to show as a warning.

use glam::DVec2;
use log::{info, warn};
use thiserror::Error;

use std::path::{Path, PathBuf};

use crate::canvas::{Canvas, Color, Drawable, Style};
use crate::codec::mdp::{read_mdp, MdpWriter};
use crate::codec::sbr::{SbrConfig, SbrWriter};
use crate::codec::{MaskWriter, WriteReport};
use crate::common::DisplayTransform;
use crate::error::Error;
use crate::fov::{FovGeometry, FovModel, DET1_TAG, DET2_TAG, FOV_BASE_TAG, GAP_LIMIT_ARCSEC};
use crate::grism::{GrismError, GrismParams, GrismTable};
use crate::math::{Arcsec, Degree, PixelScale};
use crate::overlap::exclude_overlaps;
use crate::settings::Settings;
use crate::shape::{Shape, ShapeKind, ShapeState, SizeError};
use crate::spectra::{self, SpectraError, SPECTRA_BUNDLE_TAG};

/// Which optional labels and objects are drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayOptions {
    pub show_ids: bool,
    pub show_comments: bool,
    pub show_excluded: bool,
    pub show_spectra: bool,
}
impl From<&Settings> for DisplayOptions {
    fn from(settings: &Settings) -> Self {
        Self {
            show_ids: settings.display_slit_id,
            show_comments: settings.display_comments,
            show_excluded: settings.show_excluded,
            show_spectra: settings.display_spectra,
        }
    }
}

/// New position, size and comment for an existing shape
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeEdit {
    pub position: DVec2,
    pub kind: ShapeKind,
    pub comment: String,
}
impl ShapeEdit {
    /// Build a slit edit from text fields
    pub fn parse_slit(
        x: &str,
        y: &str,
        width: &str,
        length: &str,
        angle: &str,
        comment: &str,
    ) -> Result<Self, Rejection> {
        Ok(Self {
            position: DVec2::new(number(x)?, number(y)?),
            kind: ShapeKind::Slit {
                width: number(width)?,
                length: number(length)?,
                angle: Degree::new(number(angle)?),
            },
            comment: comment.to_string(),
        })
    }

    /// Build a hole edit from text fields
    pub fn parse_hole(x: &str, y: &str, diameter: &str, comment: &str) -> Result<Self, Rejection> {
        Ok(Self {
            position: DVec2::new(number(x)?, number(y)?),
            kind: ShapeKind::Hole {
                diameter: number(diameter)?,
            },
            comment: comment.to_string(),
        })
    }
}

fn number(field: &str) -> Result<f64, Rejection> {
    field
        .trim()
        .parse::<f64>()
        .map_err(|_| Rejection::InvalidNumber(field.to_string()))
}

/// Reasons a user request is refused
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Rejection {
    #[error("The selected position is outside the allowed FOV.")]
    OutsideFov,
    #[error("The selected position is too close to the detector gap.")]
    TooCloseToGap,
    #[error(transparent)]
    Size(#[from] SizeError),
    #[error("Please enter valid numeric values (got {0:?}).")]
    InvalidNumber(String),
    #[error("No shape with index {0}")]
    NoSuchShape(usize),
    #[error("Shape {0} is deleted")]
    Deleted(usize),
    #[error("Shape {0} is a different kind of aperture")]
    KindMismatch(usize),
}

pub struct MaskSession<C: Canvas> {
    canvas: C,
    shapes: Vec<Shape>,
    undo_stack: Vec<Vec<Shape>>,
    fov_center: DVec2,
    pixel_scale: PixelScale,
    overlay: Option<FovModel>,
    channels: (bool, bool),
    grisms: GrismTable,
    grism_name: String,
    grism: Option<GrismParams>,
    transform: DisplayTransform,
    options: DisplayOptions,
    image: Option<(String, u32, u32)>,
    mdp_path: Option<PathBuf>,
    sbr_config: SbrConfig,
}

impl<C: Canvas> MaskSession<C> {
    pub fn new(canvas: C, settings: &Settings) -> Self {
        Self::with_grisms(canvas, settings, GrismTable::default())
    }

    pub fn with_grisms(canvas: C, settings: &Settings, grisms: GrismTable) -> Self {
        let grism = match grisms.get(&settings.grism) {
            Ok(params) => Some(params),
            Err(e) => {
                warn!("{e}");
                None
            }
        };
        Self {
            canvas,
            shapes: Vec::new(),
            undo_stack: Vec::new(),
            fov_center: DVec2::from(settings.fov_center),
            pixel_scale: settings.sbr.pixel_scale,
            overlay: None,
            channels: (settings.show_ch1, settings.show_ch2),
            grisms,
            grism_name: settings.grism.clone(),
            grism,
            transform: DisplayTransform::IDENTITY,
            options: DisplayOptions::from(settings),
            image: None,
            mdp_path: None,
            sbr_config: settings.sbr,
        }
    }

    pub fn shapes(&self) -> &[Shape] {
        &self.shapes
    }
    pub fn canvas(&self) -> &C {
        &self.canvas
    }
    pub fn canvas_mut(&mut self) -> &mut C {
        &mut self.canvas
    }
    pub fn undo_depth(&self) -> usize {
        self.undo_stack.len()
    }
    pub fn fov_center(&self) -> DVec2 {
        self.fov_center
    }
    pub fn overlay(&self) -> Option<&FovModel> {
        self.overlay.as_ref()
    }
    pub fn grism(&self) -> Option<&GrismParams> {
        self.grism.as_ref()
    }
    pub fn grism_name(&self) -> &str {
        &self.grism_name
    }
    pub fn options(&self) -> DisplayOptions {
        self.options
    }

    /// Attach to the host viewer
    pub fn start(&mut self) {
        self.canvas.redraw();
    }

    /// Detach from the host viewer and drop all session state
    pub fn stop(&mut self) {
        self.canvas.clear();
        self.shapes.clear();
        self.undo_stack.clear();
        self.remove_fov();
        info!("Mask session stopped and resources cleared.");
    }

    /// Name and size of the displayed image
    pub fn set_image(&mut self, name: impl Into<String>, width: u32, height: u32) {
        self.image = Some((name.into(), width, height));
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.rescale(width, height);
        }
    }

    pub fn set_transform(&mut self, transform: DisplayTransform) {
        self.transform = transform;
        self.redraw_overlay();
        self.refresh();
    }

    pub fn set_display_options(&mut self, options: DisplayOptions) {
        self.options = options;
        self.refresh();
    }

    // ---- files ----

    /// Replace the shape list with the content of an `.mdp` file
    pub fn load_mdp(&mut self, path: &Path) -> Result<usize, Error> {
        self.shapes = read_mdp(path)?;
        self.mdp_path = Some(path.to_path_buf());
        info!("Loaded {} shapes from {}", self.shapes.len(), path.display());
        self.refresh();
        Ok(self.shapes.len())
    }

    pub fn save_mdp(&self, path: &Path) -> Result<WriteReport, Error> {
        Ok(MdpWriter.save(&self.shapes, path)?)
    }

    /// Write the laser cutter file around an explicitly chosen focal-plane centre
    pub fn save_sbr(&self, path: &Path, center: DVec2) -> Result<WriteReport, Error> {
        let mut writer = SbrWriter::new(center).with_config(self.sbr_config);
        if let Some(path) = &self.mdp_path {
            writer = writer.with_mdp_name(path.display().to_string());
        }
        if let Some((name, _, _)) = &self.image {
            writer = writer.with_image_name(name.clone());
        }
        let report = writer.save(&self.shapes, path)?;
        if !report.skipped.is_empty() {
            warn!(
                "{} shape(s) left out of {}",
                report.skipped.len(),
                path.display()
            );
        }
        Ok(report)
    }

    // ---- field of view ----

    pub fn set_fov_center(&mut self, center: DVec2) {
        self.fov_center = center;
        match self.overlay.as_mut() {
            Some(overlay) => {
                overlay.reposition(center);
                info!("FOV center updated to: ({:.1}, {:.1})", center.x, center.y);
                self.redraw_overlay();
            }
            None => warn!("FOV overlay not active."),
        }
        self.refresh();
    }

    pub fn set_position_angle(&mut self, pa: Degree) {
        if let Some(overlay) = self.overlay.as_mut() {
            overlay.set_position_angle(pa);
            self.redraw_overlay();
        }
    }

    /// Show the overlay with the selected detector channels
    pub fn show_fov(&mut self, ch1: bool, ch2: bool) {
        self.channels = (ch1, ch2);
        if !ch1 && !ch2 {
            info!("Both channels unchecked; FOV overlay removed.");
            self.remove_fov();
            return;
        }
        let Some((_, width, height)) = self.image.clone() else {
            warn!("No image loaded, cannot place the FOV overlay");
            self.remove_fov();
            return;
        };
        if width == 0 || height == 0 {
            warn!("No image loaded: width={width}, height={height}");
            self.remove_fov();
            return;
        }

        let (center, pixel_scale) = (self.fov_center, self.pixel_scale);
        let overlay = self.overlay.get_or_insert_with(|| {
            info!("Creating new FOV overlay");
            FovModel::build(center, pixel_scale)
        });
        overlay.rescale(width, height);
        overlay.reposition(center);
        if !overlay.is_consistent() {
            warn!("FOV overlay objects invalid. Rebuilding...");
            overlay.rebuild();
        }
        info!("FOV visibility updated: CH1={ch1}, CH2={ch2}");
        self.redraw_overlay();
    }

    pub fn remove_fov(&mut self) {
        for tag in [FOV_BASE_TAG, DET1_TAG, DET2_TAG] {
            self.canvas.delete_by_tag(tag);
        }
        if self.overlay.take().is_some() {
            info!("FOV overlay removed successfully.");
        }
        self.canvas.redraw();
    }

    fn redraw_overlay(&mut self) {
        let Some(overlay) = self.overlay.as_ref() else {
            return;
        };
        for tag in [FOV_BASE_TAG, DET1_TAG, DET2_TAG] {
            self.canvas.delete_by_tag(tag);
        }
        let (ch1, ch2) = self.channels;
        for (tag, group) in overlay.groups(ch1, ch2) {
            self.canvas.add(tag, self.transform.apply(group));
        }
        self.canvas.redraw();
    }

    // ---- placement ----

    /// Always true while no overlay is shown
    pub fn is_within_fov(&self, x: f64, y: f64) -> bool {
        match &self.overlay {
            Some(overlay) => overlay.geometry().is_within_fov(x, y),
            None => true,
        }
    }

    pub fn is_within_gap_limit(&self, y: f64, min_offset: Arcsec) -> bool {
        self.geometry().is_within_gap_limit(y, min_offset)
    }

    /// Field geometry at the current centre and the session's plate scale
    pub fn geometry(&self) -> FovGeometry {
        FovGeometry::new(self.fov_center, self.pixel_scale)
    }

    fn check_placement(&self, position: DVec2) -> Result<(), Rejection> {
        if !self.is_within_fov(position.x, position.y) {
            return Err(Rejection::OutsideFov);
        }
        if !self.is_within_gap_limit(position.y, Arcsec::new(GAP_LIMIT_ARCSEC)) {
            return Err(Rejection::TooCloseToGap);
        }
        Ok(())
    }

    /// Check a candidate shape against the placement and size rules
    pub fn validate_and_stage(&self, shape: &Shape) -> Result<(), Rejection> {
        self.check_placement(shape.position)?;
        shape.kind.check_limits()?;
        Ok(())
    }

    // ---- editing ----

    fn push_undo(&mut self) {
        self.undo_stack.push(self.shapes.clone());
    }

    /// Add a shape where the user clicked, returning its index
    ///
    /// `display` is in displayed pixels and is mapped back to mask pixels.
    pub fn add_shape(
        &mut self,
        kind: ShapeKind,
        display: DVec2,
        comment: &str,
    ) -> Result<usize, Rejection> {
        let position = self.transform.to_mask(display);
        let shape = Shape::new(position, kind).with_comment(comment);
        self.validate_and_stage(&shape)?;
        self.push_undo();
        self.shapes.push(shape);
        self.refresh();
        Ok(self.shapes.len() - 1)
    }

    pub fn edit_shape(&mut self, index: usize, edit: ShapeEdit) -> Result<(), Rejection> {
        let shape = self.shapes.get(index).ok_or(Rejection::NoSuchShape(index))?;
        if shape.is_deleted() {
            return Err(Rejection::Deleted(index));
        }
        if shape.kind.is_slit() != edit.kind.is_slit() {
            return Err(Rejection::KindMismatch(index));
        }
        self.check_placement(edit.position)?;
        edit.kind.check_limits()?;

        self.push_undo();
        let shape = &mut self.shapes[index];
        shape.position = edit.position;
        shape.kind = edit.kind;
        shape.comment = edit.comment;
        self.refresh();
        Ok(())
    }

    /// Include or exclude a shape by hand
    pub fn set_included(&mut self, index: usize, included: bool) -> Result<(), Rejection> {
        let state = if included {
            ShapeState::Active
        } else {
            ShapeState::Excluded
        };
        self.set_state(index, state)
    }

    pub fn delete_shape(&mut self, index: usize) -> Result<(), Rejection> {
        self.set_state(index, ShapeState::Deleted)
    }

    fn set_state(&mut self, index: usize, state: ShapeState) -> Result<(), Rejection> {
        if index >= self.shapes.len() {
            return Err(Rejection::NoSuchShape(index));
        }
        self.push_undo();
        self.shapes[index].state = state;
        self.refresh();
        Ok(())
    }

    /// Restore the shape list from before the last edit
    pub fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(shapes) => {
                self.shapes = shapes;
                self.refresh();
                info!("Undo performed");
                true
            }
            None => {
                info!("Nothing to undo");
                false
            }
        }
    }

    /// Exclude shapes whose spectra would collide, returning how many were excluded
    pub fn auto_detect_overlaps(&mut self) -> usize {
        if self.shapes.is_empty() {
            info!("No shapes to analyze.");
            return 0;
        }
        let excluded = exclude_overlaps(&mut self.shapes, self.fov_center.y);
        self.refresh();
        info!("Excluded {excluded} overlapping shape(s).");
        excluded
    }

    // ---- grism ----

    pub fn set_grism(&mut self, name: &str) -> Result<(), GrismError> {
        self.grism = Some(self.grisms.get(name)?);
        self.grism_name = name.to_string();
        self.redraw_spectra();
        Ok(())
    }

    pub fn set_grism_param(&mut self, key: &str, value: f64) -> Result<(), GrismError> {
        self.grism.get_or_insert_with(GrismParams::default).set(key, value)?;
        self.redraw_spectra();
        Ok(())
    }

    /// Restore the table values of the selected grism
    pub fn reset_grism(&mut self) -> Result<(), GrismError> {
        self.grism = Some(self.grisms.get(&self.grism_name)?);
        self.redraw_spectra();
        Ok(())
    }

    // ---- rendering ----

    fn refresh(&mut self) {
        self.draw_shapes();
        self.redraw_spectra();
    }

    fn redraw_spectra(&mut self) {
        if let Err(e) = self.draw_spectra() {
            warn!("Spectra not drawn: {e}");
        }
    }

    /// Redraw every slit and hole with its optional labels
    pub fn draw_shapes(&mut self) {
        for prefix in ["slit", "label", "hole"] {
            self.canvas.delete_by_prefix(prefix);
        }
        let scale = self.transform.scale();
        let samplefac = self.transform.samplefac;
        let options = self.options;

        for (i, shape) in self.shapes.iter().enumerate() {
            match shape.state {
                ShapeState::Deleted => continue,
                ShapeState::Excluded if !options.show_excluded => continue,
                _ => {}
            }
            let excluded = shape.state == ShapeState::Excluded;
            let center = self.transform.to_display(shape.position);
            let (extent, color, tags) = match shape.kind {
                ShapeKind::Slit {
                    width,
                    length,
                    angle,
                } => {
                    let half_size = DVec2::new(width, length) / scale / 2.0;
                    let color = if excluded { Color::Purple } else { Color::White };
                    self.canvas.add(
                        &format!("slit{i}"),
                        Drawable::Rectangle {
                            center,
                            half_size,
                            rotation: angle,
                            style: Style::solid(color),
                        },
                    );
                    (
                        half_size.y,
                        Color::White,
                        (format!("label{i}"), format!("label_comment{i}")),
                    )
                }
                ShapeKind::Hole { diameter } => {
                    let radius = diameter / scale.x / 2.0;
                    let color = if excluded { Color::Purple } else { Color::Yellow };
                    self.canvas.add(
                        &format!("hole{i}"),
                        Drawable::Circle {
                            center,
                            radius,
                            style: Style::solid(color),
                        },
                    );
                    (
                        radius,
                        Color::Yellow,
                        (format!("label_hole{i}"), format!("label_comment_hole{i}")),
                    )
                }
            };
            if options.show_ids {
                self.canvas.add(
                    &tags.0,
                    Drawable::Text {
                        at: center + DVec2::new(0.0, extent + 10.0 / samplefac),
                        text: i.to_string(),
                        rotation: Degree::default(),
                        style: Style::solid(color),
                    },
                );
            }
            if options.show_comments && !shape.comment.is_empty() {
                self.canvas.add(
                    &tags.1,
                    Drawable::Text {
                        at: center - DVec2::new(0.0, extent + 30.0 / samplefac),
                        text: shape.comment.clone(),
                        rotation: Degree::default(),
                        style: Style::solid(color),
                    },
                );
            }
        }
        self.canvas.redraw();
    }

    /// Replace the spectra bundle, returning how many footprints it holds
    pub fn draw_spectra(&mut self) -> Result<usize, SpectraError> {
        self.canvas.delete_by_tag(SPECTRA_BUNDLE_TAG);
        let grism = match (&self.grism, self.options.show_spectra) {
            (Some(grism), true) => *grism,
            _ => {
                self.canvas.redraw();
                return Ok(0);
            }
        };
        let split_y = self.transform.y_to_display(self.fov_center.y);
        let footprints = spectra::project(&self.shapes, &grism, split_y, &self.transform)?;
        let count = footprints.len();
        self.canvas
            .add(SPECTRA_BUNDLE_TAG, spectra::bundle(footprints));
        self.canvas.redraw();
        Ok(count)
    }

    /// One summary line per shape, as shown in the shape manager
    pub fn shape_list(&self) -> Vec<String> {
        self.shapes
            .iter()
            .enumerate()
            .map(|(i, shape)| {
                let state = match shape.state {
                    ShapeState::Active => "",
                    ShapeState::Excluded => " [excluded]",
                    ShapeState::Deleted => " [deleted]",
                };
                format!(
                    "{} #{i} | x={:.1}, y={:.1} | {}{state}",
                    shape.kind.name(),
                    shape.x(),
                    shape.y(),
                    shape.comment
                )
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::canvas::MemoryCanvas;

    fn session() -> MaskSession<MemoryCanvas> {
        let mut session = MaskSession::new(MemoryCanvas::new(), &Settings::default());
        session.set_image("frame.fits", 2048, 3600);
        session
    }

    fn loaded() -> MaskSession<MemoryCanvas> {
        let mut session = session();
        session.load_mdp(Path::new("./test/sample.mdp")).unwrap();
        session
    }

    #[test]
    fn test_load_draws_shapes() {
        let session = loaded();
        assert_eq!(session.shapes().len(), 5);
        let tags = session.canvas().tags();
        assert!(tags.contains(&"slit0".to_string()));
        assert!(tags.contains(&"hole3".to_string()));
        assert!(tags.contains(&"label_hole4".to_string()));
        assert!(!tags.contains(&SPECTRA_BUNDLE_TAG.to_string()));
    }

    #[test]
    fn test_gap_limit_example() {
        let session = session();
        let limit = Arcsec::new(GAP_LIMIT_ARCSEC);
        assert!(session.is_within_gap_limit(1786.0 + 10.0 / 0.117, limit));
        assert!(!session.is_within_gap_limit(1871.0, limit));

        let mut session = session;
        session.show_fov(true, true);
        let on_limit = DVec2::new(1084.0, 1786.0 + 10.0 / 0.117);
        assert_eq!(
            session.add_shape(ShapeKind::default_hole(), on_limit, ""),
            Ok(0)
        );
    }

    #[test]
    fn test_one_plate_scale_for_both_checks() {
        let settings = Settings {
            sbr: SbrConfig {
                pixel_scale: PixelScale::new(0.2),
                ..Default::default()
            },
            ..Default::default()
        };
        let mut session = MaskSession::new(MemoryCanvas::new(), &settings);
        session.set_image("frame.fits", 2048, 3600);
        session.show_fov(true, true);
        let overlay = session.overlay().unwrap().geometry();
        assert_eq!(overlay.pixel_scale, PixelScale::new(0.2));
        assert_eq!(*overlay, session.geometry());
        // 10" is 50 px at 0.2"/px, inside the 0.117"/px limit of 85 px
        assert!(session.is_within_gap_limit(1786.0 + 50.0, Arcsec::new(GAP_LIMIT_ARCSEC)));
    }

    #[test]
    fn test_add_requires_overlay_bounds() {
        let mut session = session();
        // No overlay yet, so only the gap rule applies
        assert!(session
            .add_shape(ShapeKind::default_hole(), DVec2::new(5000.0, 2000.0), "")
            .is_ok());
        session.show_fov(true, true);
        assert_eq!(
            session.add_shape(ShapeKind::default_hole(), DVec2::new(5000.0, 2000.0), ""),
            Err(Rejection::OutsideFov)
        );
        assert_eq!(
            session.add_shape(ShapeKind::default_hole(), DVec2::new(1084.0, 1800.0), ""),
            Err(Rejection::TooCloseToGap)
        );
        assert_eq!(session.shapes().len(), 1);
        assert_eq!(session.undo_depth(), 1);
        let index = session
            .add_shape(ShapeKind::default_slit(), DVec2::new(1084.0, 2000.0), "new")
            .unwrap();
        assert_eq!(index, 1);
        assert_eq!(session.shapes()[1].comment, "new");
    }

    #[test]
    fn test_add_maps_display_to_mask() {
        let mut session = session();
        session.set_transform(DisplayTransform::new([2.0, 2.0], 1.0, [0.0, 0.0]));
        session
            .add_shape(ShapeKind::default_hole(), DVec2::new(542.0, 1000.0), "")
            .unwrap();
        assert_eq!(session.shapes()[0].position, DVec2::new(1084.0, 2000.0));
    }

    #[test]
    fn test_edit_and_undo() {
        let mut session = loaded();
        let before = session.shapes().to_vec();
        let edit = ShapeEdit::parse_slit("1000", "1950", "60", "8", "0", "moved").unwrap();
        session.edit_shape(0, edit).unwrap();
        assert_eq!(session.shapes()[0].kind.x_size(), 60.0);
        assert!(session.undo());
        assert_eq!(session.shapes(), &before[..]);
        assert!(!session.undo());
    }

    #[test]
    fn test_edit_rejections_leave_state() {
        let mut session = loaded();
        session.show_fov(true, true);
        let before = session.shapes().to_vec();

        assert!(matches!(
            ShapeEdit::parse_hole("70O", "1400", "25", ""),
            Err(Rejection::InvalidNumber(_))
        ));
        let narrow = ShapeEdit::parse_slit("1000", "1950", "30", "8", "0", "").unwrap();
        assert_eq!(
            session.edit_shape(0, narrow),
            Err(Rejection::Size(SizeError::SlitTooNarrow(30.0)))
        );
        let big = ShapeEdit::parse_hole("700", "1400", "31", "").unwrap();
        assert_eq!(
            session.edit_shape(3, big.clone()),
            Err(Rejection::Size(SizeError::HoleDiameter(31.0)))
        );
        assert_eq!(session.edit_shape(0, big), Err(Rejection::KindMismatch(0)));
        let gap = ShapeEdit::parse_hole("700", "1790", "25", "").unwrap();
        assert_eq!(session.edit_shape(3, gap), Err(Rejection::TooCloseToGap));
        assert_eq!(session.shapes(), &before[..]);
        assert_eq!(session.undo_depth(), 0);

        session.delete_shape(3).unwrap();
        let fine = ShapeEdit::parse_hole("700", "1400", "25", "").unwrap();
        assert_eq!(session.edit_shape(3, fine), Err(Rejection::Deleted(3)));
    }

    #[test]
    fn test_auto_detect_and_manual_include() {
        let mut session = loaded();
        assert_eq!(session.auto_detect_overlaps(), 1);
        assert_eq!(session.shapes()[1].state, ShapeState::Excluded);
        assert!(!session.canvas().tags().contains(&"slit1".to_string()));

        session.set_included(1, true).unwrap();
        assert!(session.shapes()[1].is_active());
        session.set_included(2, false).unwrap();
        assert_eq!(session.shapes()[2].state, ShapeState::Excluded);
        assert_eq!(session.set_included(9, true), Err(Rejection::NoSuchShape(9)));
    }

    #[test]
    fn test_show_excluded_in_purple() {
        let mut session = loaded();
        session.auto_detect_overlaps();
        session.set_display_options(DisplayOptions {
            show_excluded: true,
            ..session.options()
        });
        assert!(matches!(
            session.canvas().get("slit1"),
            Some(Drawable::Rectangle {
                style: Style {
                    color: Color::Purple,
                    ..
                },
                ..
            })
        ));
    }

    #[test]
    fn test_spectra_bundle() {
        let mut session = loaded();
        session.set_display_options(DisplayOptions {
            show_spectra: true,
            ..session.options()
        });
        let Some(Drawable::Compound(items)) = session.canvas().get(SPECTRA_BUNDLE_TAG) else {
            panic!("no spectra bundle");
        };
        assert_eq!(items.len(), 5);

        session.auto_detect_overlaps();
        assert_eq!(session.draw_spectra(), Ok(4));
        session.set_grism_param("dispersion", 0.0).unwrap();
        assert_eq!(session.draw_spectra(), Err(SpectraError::ZeroDispersion));
        session.reset_grism().unwrap();
        assert_eq!(session.draw_spectra(), Ok(4));
        assert!(session.set_grism("HK500").is_ok());
        assert!(session.set_grism("XX").is_err());
        assert_eq!(session.grism_name(), "HK500");
    }

    #[test]
    fn test_unknown_grism_draws_no_spectra() {
        let settings = Settings {
            grism: "nope".into(),
            display_spectra: true,
            ..Default::default()
        };
        let mut session = MaskSession::new(MemoryCanvas::new(), &settings);
        session.load_mdp(Path::new("./test/sample.mdp")).unwrap();
        assert!(session.grism().is_none());
        assert_eq!(session.draw_spectra(), Ok(0));
        assert!(session.canvas().get(SPECTRA_BUNDLE_TAG).is_none());
        assert!(session.canvas().get("slit0").is_some());
    }

    #[test]
    fn test_sbr_header_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("mask.sbr");
        let session = MaskSession::new(MemoryCanvas::new(), &Settings::default());
        session.save_sbr(&path, DVec2::new(1084.0, 1786.0)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "# mdp: UNKNOWN_MDP");
        assert_eq!(lines[1], "# Image: UNKNOWN_IMAGE");

        let session = loaded();
        session.save_sbr(&path, DVec2::new(1084.0, 1786.0)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("# mdp: ./test/sample.mdp\n# Image: frame.fits\n"));
    }

    #[test]
    fn test_fov_overlay_lifecycle() {
        let mut session = MaskSession::new(MemoryCanvas::new(), &Settings::default());
        session.show_fov(true, true);
        assert!(session.overlay().is_none());

        session.set_image("frame.fits", 2048, 3600);
        session.show_fov(true, false);
        let tags = session.canvas().tags();
        assert!(tags.contains(&FOV_BASE_TAG.to_string()));
        assert!(tags.contains(&DET1_TAG.to_string()));
        assert!(!tags.contains(&DET2_TAG.to_string()));

        session.set_fov_center(DVec2::new(1000.0, 1700.0));
        assert_eq!(session.overlay().unwrap().center(), DVec2::new(1000.0, 1700.0));

        session.show_fov(false, false);
        assert!(session.overlay().is_none());
        assert!(!session.canvas().tags().contains(&FOV_BASE_TAG.to_string()));
    }

    #[test]
    fn test_stop_clears_everything() {
        let mut session = loaded();
        session.show_fov(true, true);
        session.delete_shape(0).unwrap();
        session.stop();
        assert!(session.shapes().is_empty());
        assert_eq!(session.undo_depth(), 0);
        assert!(session.overlay().is_none());
        assert!(session.canvas().is_empty());
    }

    #[test]
    fn test_shape_list() {
        let mut session = loaded();
        session.delete_shape(4).unwrap();
        let list = session.shape_list();
        assert_eq!(list[0], "Slit #0 | x=1000.0, y=1950.0 | target A");
        assert_eq!(list[4], "Hole #4 | x=1500.0, y=2300.0 | guide [deleted]");
    }
}
