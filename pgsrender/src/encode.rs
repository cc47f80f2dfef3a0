/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Packs indexed images into a Presentation Graphics Stream.
//!
//! The timeline is cut at every cue start and end, and the images visible at each cut form one
//! display set. Windows belong to regions: before anything is written, consecutive runs of cues
//! are gathered into epochs for as long as their regions still fit into at most two separate
//! windows. The first display set of an epoch defines the palette and its objects. Later display
//! sets in the same epoch only carry what changed, so an object that is shown again in the same
//! window is never sent twice. Every display set repeats the epoch's window definition, which
//! charges it for the windows a decoder redraws.
//!
//! Each display set is scheduled such that a decoder has finished it by its presentation time.
//! When two cues are too close for that, encoding fails instead of producing a stream players
//! would drop.

#[cfg(test)]
mod tests;

use super::{
    bitmap::Bitmap,
    config::{CancelToken, FrameRate},
    error::Diagnostic,
    layout::Rect,
    quantize::{quantize, IndexedImage, MAX_COLORS},
    style::Rgba,
};
use pgs::{
    color::{ycbcr_pixel, ColorMatrix, RgbPixel},
    decoder::MAX_WINDOWS,
    displayset::{
        Cid,
        CompositionObject,
        DisplaySet,
        Object,
        Palette,
        PaletteEntry,
        Vid,
        Window,
        WriteDisplaySetExt,
        WriteError as DisplaySetWriteError,
    },
    rle::DecodeError,
    segment::CompositionState,
    ts_to_timestamp,
};
use std::{
    collections::{BTreeMap, BTreeSet},
    io::Write,
};
use thiserror::Error as ThisError;
use tracing::{debug, info, warn};

/// A specialized [`Result`](std::result::Result) type for stream encoding.
pub type EncodeResult<T> = Result<T, EncodeError>;

/// Errors that stop a stream from being encoded.
#[derive(ThisError, Debug)]
pub enum EncodeError {
    #[error("display set could not be written")]
    DisplaySetError {
        #[from]
        source: DisplaySetWriteError,
    },
    #[error("indexed image could not be decoded")]
    ImageError {
        #[from]
        source: DecodeError,
    },
    /// A display set cannot be decoded between the previous one and its own presentation.
    #[error(
        "cue {cue} needs {needed} ticks to decode but only {available} remain after cue \
        {previous_cue}"
    )]
    TimingOverflow {
        previous_cue: usize,
        cue: usize,
        pts: u32,
        needed: u32,
        available: u32,
    },
}

/// The target the stream is encoded for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EncoderSettings {
    pub width: u16,
    pub height: u16,
    pub frame_rate: FrameRate,
}

/// A cue's image and the time it is shown.
#[derive(Clone, Debug, PartialEq)]
pub struct CueFrame {
    pub cue: usize,
    pub start_ms: u64,
    pub end_ms: u64,
    /// Stacking order; higher values are drawn above lower ones.
    pub z_index: i32,
    /// The area of the region the cue is drawn in. Cues sharing a region share a window.
    pub region: Rect,
    /// `None` when the cue drew nothing visible.
    pub image: Option<IndexedImage>,
}

/// What an encoder wrote.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EncodeSummary {
    pub display_sets: usize,
    pub epochs: usize,
    pub object_definitions: usize,
    /// Composition objects shown without sending their object again.
    pub reused_objects: usize,
    pub diagnostics: Vec<Diagnostic>,
    pub cancelled: bool,
}

struct Timed {
    cue: usize,
    start: u32,
    end: u32,
    z_index: i32,
    region: Rect,
    /// Already cropped to the canvas.
    image: IndexedImage,
}

/// The windows of an epoch and the regions drawn into each.
#[derive(Clone, Debug, Default, PartialEq)]
struct Layout {
    windows: Vec<Rect>,
    regions: Vec<Vec<Rect>>,
}

impl Layout {

    /// Gives each region a window around everything drawn in it, then joins windows until none
    /// overlap and there are few enough of them.
    fn plan<'a>(timed: impl IntoIterator<Item = &'a Timed>) -> Self {

        let mut layout = Layout::default();

        for timed in timed {
            let rect = timed.image.rect();
            match layout.window_of(&timed.region) {
                Some(index) => layout.windows[index] = layout.windows[index].union(&rect),
                None => {
                    layout.windows.push(rect);
                    layout.regions.push(vec![timed.region]);
                }
            }
        }

        while let Some((first, second)) = layout.overlapping().or_else(|| layout.crowded()) {
            layout.join(first, second);
        }

        let mut windows = layout.windows.into_iter()
            .zip(layout.regions)
            .collect::<Vec<(Rect, Vec<Rect>)>>();

        windows.sort_by_key(|(rect, _)| (rect.y, rect.x));

        let (windows, regions) = windows.into_iter().unzip();

        Layout { windows, regions }
    }

    fn window_of(&self, region: &Rect) -> Option<usize> {
        self.regions.iter().position(|regions| regions.contains(region))
    }

    /// Whether different regions had to share a window.
    fn is_joined(&self) -> bool {
        self.regions.iter().any(|regions| regions.len() > 1)
    }

    fn pairs(&self) -> impl Iterator<Item = (usize, usize)> {

        let count = self.windows.len();

        (0..count).flat_map(move |first| (first + 1..count).map(move |second| (first, second)))
    }

    fn overlapping(&self) -> Option<(usize, usize)> {
        self.pairs().find(|&(first, second)| self.windows[first].overlaps(&self.windows[second]))
    }

    /// The two windows whose union is smallest, when there are more than a decoder allows.
    fn crowded(&self) -> Option<(usize, usize)> {

        if self.windows.len() <= MAX_WINDOWS {
            return None
        }

        self.pairs().min_by_key(|&(first, second)| {
            let union = self.windows[first].union(&self.windows[second]);
            union.width as i64 * union.height as i64
        })
    }

    fn join(&mut self, first: usize, second: usize) {

        let window = self.windows.remove(second);
        let regions = self.regions.remove(second);

        self.windows[first] = self.windows[first].union(&window);
        self.regions[first].extend(regions);
    }
}

/// Cues that will share one epoch, as indices into the timeline.
struct EpochPlan {
    layout: Layout,
    cues: Vec<usize>,
}

/// Groups the timeline into runs of cues with no gap between them, then gathers runs into
/// epochs for as long as their regions keep separate windows. A run that would force regions
/// together is only added when it fits the windows already planned.
fn plan_epochs(timed: &[Timed]) -> Vec<EpochPlan> {

    let mut order = (0..timed.len()).collect::<Vec<usize>>();
    let mut runs = Vec::<Vec<usize>>::new();
    let mut run_end = 0;

    order.sort_by_key(|&index| (timed[index].start, timed[index].cue));

    for index in order {
        if runs.is_empty() || timed[index].start > run_end {
            runs.push(Vec::new());
        }
        if let Some(run) = runs.last_mut() {
            run.push(index);
        }
        run_end = run_end.max(timed[index].end);
    }

    let mut plans = Vec::<EpochPlan>::new();

    for run in runs {

        if let Some(plan) = plans.last_mut() {
            let candidate = Layout::plan(plan.cues.iter().chain(run.iter()).map(|&index| &timed[index]));
            if !candidate.is_joined() || candidate == plan.layout {
                plan.layout = candidate;
                plan.cues.extend(run);
                continue
            }
        }

        plans.push(EpochPlan {
            layout: Layout::plan(run.iter().map(|&index| &timed[index])),
            cues: run,
        });
    }

    plans
}

/// An image to be composed, along with the cues it shows.
struct Visible {
    cues: Vec<usize>,
    image: IndexedImage,
}

struct Held {
    image: IndexedImage,
    version: u8,
}

struct Epoch {
    /// Index of the plan the epoch was started from.
    plan: usize,
    /// Window IDs are positions in this list, and so are the IDs of the objects shown in them.
    windows: Vec<Rect>,
    palette: Vec<Rgba>,
    lookup: BTreeMap<Rgba, u8>,
    palette_version: u8,
    objects: Vec<Option<Held>>,
}

impl Epoch {

    fn new(plan: usize, windows: Vec<Rect>) -> Self {

        let objects = windows.iter().map(|_| None).collect();

        Self {
            plan,
            windows,
            palette: vec![Rgba::TRANSPARENT],
            lookup: BTreeMap::new(),
            palette_version: 0,
            objects,
        }
    }

    fn new_colors(&self, visible: &[Option<Visible>]) -> BTreeSet<Rgba> {
        visible.iter()
            .flatten()
            .flat_map(|visible| visible.image.palette.iter().skip(1))
            .filter(|color| !self.lookup.contains_key(color))
            .copied()
            .collect()
    }

    fn extend_palette(&mut self, colors: BTreeSet<Rgba>) {
        for color in colors {
            self.lookup.insert(color, self.palette.len() as u8);
            self.palette.push(color);
        }
    }

    fn window_definitions(&self) -> BTreeMap<u8, Window> {
        self.windows.iter()
            .enumerate()
            .map(|(window_id, rect)| {
                (window_id as u8, Window {
                    x: rect.x as u16,
                    y: rect.y as u16,
                    width: rect.width as u16,
                    height: rect.height as u16,
                })
            })
            .collect()
    }

    /// Re-indexes an image against the epoch's palette.
    fn object(&self, image: &IndexedImage) -> EncodeResult<Object> {

        let mapping = image.palette.iter()
            .enumerate()
            .map(|(index, color)| match index {
                0 => 0,
                _ => self.lookup.get(color).copied().unwrap_or(0),
            })
            .collect::<Vec<u8>>();
        let lines = image.lines()?
            .into_iter()
            .map(|line| {
                line.into_iter()
                    .map(|index| mapping.get(index as usize).copied().unwrap_or(0))
                    .collect()
            })
            .collect::<Vec<Vec<u8>>>();

        Ok(Object::from_lines(&lines))
    }
}

struct Previous {
    pts: u32,
    cue: usize,
}

/// Writes display sets for a timeline of cue frames to a sink.
pub struct SegmentEncoder<W: Write> {
    sink: W,
    settings: EncoderSettings,
    matrix: ColorMatrix,
    composition_number: u16,
    previous: Option<Previous>,
    epoch: Option<Epoch>,
    /// Object IDs and versions presented by the last display set.
    on_screen: Vec<(u16, u8)>,
    summary: EncodeSummary,
}

impl<W: Write> SegmentEncoder<W> {

    pub fn new(sink: W, settings: EncoderSettings) -> Self {
        Self {
            sink,
            settings,
            matrix: ColorMatrix::for_height(settings.height),
            composition_number: 0,
            previous: None,
            epoch: None,
            on_screen: Vec::new(),
            summary: EncodeSummary::default(),
        }
    }

    /// Encodes a whole timeline. Each display set is written as soon as it is complete, so a
    /// cancelled or failed encode leaves every display set before it intact.
    pub fn encode(mut self, frames: &[CueFrame], cancel: &CancelToken) -> EncodeResult<EncodeSummary> {

        let timed = self.timed(frames)?;
        let plans = plan_epochs(&timed);
        let mut plan_of = vec![0_usize; timed.len()];
        let mut cuts = timed.iter()
            .flat_map(|timed| [timed.start, timed.end])
            .collect::<Vec<u32>>();

        for (plan_index, plan) in plans.iter().enumerate() {
            debug!(
                "Planned epoch {} for {} cue(s) in {} window(s).",
                plan_index,
                plan.cues.len(),
                plan.layout.windows.len(),
            );
            for &index in plan.cues.iter() {
                plan_of[index] = plan_index;
            }
        }

        cuts.sort_unstable();
        cuts.dedup();

        for &pts in cuts.iter() {

            if cancel.is_cancelled() {
                info!("Encoding cancelled at {}.", ts_to_timestamp(pts));
                if !self.on_screen.is_empty() {
                    self.clear(pts)?;
                }
                self.summary.cancelled = true;
                return Ok(self.summary)
            }

            let mut active = (0..timed.len())
                .filter(|&index| timed[index].start <= pts && pts < timed[index].end)
                .collect::<Vec<usize>>();

            active.sort_by_key(|&index| (timed[index].z_index, timed[index].cue));

            let plan_index = match active.first() {
                Some(&index) => plan_of[index],
                None => {
                    if !self.on_screen.is_empty() {
                        self.clear(pts)?;
                    }
                    continue
                }
            };
            let layout = &plans[plan_index].layout;
            let mut visible = Vec::<Option<Visible>>::new();

            for window_id in 0..layout.windows.len() {
                let members = active.iter()
                    .map(|&index| &timed[index])
                    .filter(|timed| layout.window_of(&timed.region) == Some(window_id))
                    .collect::<Vec<&Timed>>();
                visible.push(self.compose(&members)?);
            }

            let visible = self.share_palette(visible)?;
            let cue = active.iter()
                .map(|&index| &timed[index])
                .find(|timed| timed.start == pts)
                .unwrap_or(&timed[active[0]])
                .cue;

            self.present(pts, cue, plan_index, layout, visible)?;
        }

        info!(
            "Wrote {} display sets with {} objects across {} epochs.",
            self.summary.display_sets,
            self.summary.object_definitions,
            self.summary.epochs,
        );

        Ok(self.summary)
    }

    /// Snaps cues to frames and crops their images to the canvas, dropping whatever would not
    /// be seen.
    fn timed(&self, frames: &[CueFrame]) -> EncodeResult<Vec<Timed>> {

        let frame_rate = self.settings.frame_rate;
        let canvas = Rect {
            x: 0,
            y: 0,
            width: self.settings.width as i32,
            height: self.settings.height as i32,
        };
        let mut timed = Vec::<Timed>::new();

        for frame in frames {

            let image = match &frame.image {
                Some(image) => image,
                None => continue,
            };
            let start = frame_rate.snap(frame.start_ms);
            let end = frame_rate.snap(frame.end_ms);

            if start >= end {
                debug!("Cue {} is shorter than a frame; skipping.", frame.cue);
                continue
            }
            if let Some(image) = fit_to(image, canvas)? {
                timed.push(Timed {
                    cue: frame.cue,
                    start,
                    end,
                    z_index: frame.z_index,
                    region: frame.region,
                    image,
                });
            }
        }

        Ok(timed)
    }

    /// Builds the object for one window out of the cues shown in it.
    fn compose(&mut self, members: &[&Timed]) -> EncodeResult<Option<Visible>> {

        match members {
            [] => Ok(None),
            [timed] => Ok(Some(Visible { cues: vec![timed.cue], image: timed.image.clone() })),
            _ => {
                let visible = members.iter()
                    .map(|timed| Visible { cues: vec![timed.cue], image: timed.image.clone() })
                    .collect();
                Ok(Some(self.merge(visible)?))
            }
        }
    }

    fn merge(&mut self, visible: Vec<Visible>) -> EncodeResult<Visible> {

        let cues = visible.iter()
            .flat_map(|visible| visible.cues.iter().copied())
            .collect::<Vec<usize>>();
        let bounds = visible.iter()
            .map(|visible| visible.image.rect())
            .reduce(|bounds, rect| bounds.union(&rect))
            .unwrap_or_default();
        let mut bitmap = Bitmap::new(bounds);

        for visible in visible.iter() {
            bitmap.composite_over(&visible.image.to_bitmap()?);
        }

        let quantized = quantize(&bitmap);

        debug!("Merging cues {:?} into one object.", cues);
        self.diagnose(Diagnostic::ObjectsMerged { cues: cues.clone() });

        if let Some(colors) = quantized.reduced_from {
            self.diagnose(Diagnostic::PaletteReduced { cue: cues[0], colors });
        }

        Ok(Visible { cues, image: quantized.image })
    }

    /// Reduces the objects of one composition to a single palette when together they use more
    /// colors than a palette holds.
    fn share_palette(&mut self, visible: Vec<Option<Visible>>) -> EncodeResult<Vec<Option<Visible>>> {

        let colors = visible.iter()
            .flatten()
            .flat_map(|visible| visible.image.palette.iter().skip(1))
            .collect::<BTreeSet<&Rgba>>()
            .len();

        if colors <= MAX_COLORS {
            return Ok(visible)
        }

        let bounds = visible.iter()
            .flatten()
            .map(|visible| visible.image.rect())
            .reduce(|bounds, rect| bounds.union(&rect))
            .unwrap_or_default();
        let mut bitmap = Bitmap::new(bounds);

        for visible in visible.iter().flatten() {
            bitmap.composite_over(&visible.image.to_bitmap()?);
        }

        let quantized = quantize(&bitmap);
        let shared = quantized.image.to_bitmap()?;

        if let (Some(colors), Some(first)) = (quantized.reduced_from, visible.iter().flatten().next()) {
            self.diagnose(Diagnostic::PaletteReduced { cue: first.cues[0], colors });
        }

        Ok(
            visible.into_iter()
                .map(|visible| {
                    visible.map(|visible| {
                        let image = quantize(&shared.extract(visible.image.rect())).image;
                        Visible { cues: visible.cues, image }
                    })
                })
                .collect()
        )
    }

    fn diagnose(&mut self, diagnostic: Diagnostic) {
        if !self.summary.diagnostics.contains(&diagnostic) {
            self.summary.diagnostics.push(diagnostic);
        }
    }

    fn present(
        &mut self,
        pts: u32,
        cue: usize,
        plan: usize,
        layout: &Layout,
        visible: Vec<Option<Visible>>,
    ) -> EncodeResult<()> {

        let continued = self.epoch.take().filter(|epoch| {
            epoch.plan == plan
                && epoch.palette.len() + epoch.new_colors(&visible).len() <= MAX_COLORS + 1
        });
        let epoch_start = continued.is_none();
        let mut epoch = continued.unwrap_or_else(|| Epoch::new(plan, layout.windows.clone()));
        let new_colors = epoch.new_colors(&visible);
        let palette_changed = !new_colors.is_empty();

        if epoch_start {
            debug!("Starting epoch at {} with {} window(s).", ts_to_timestamp(pts), epoch.windows.len());
            self.summary.epochs += 1;
        } else if palette_changed {
            epoch.palette_version = epoch.palette_version.wrapping_add(1);
        }

        epoch.extend_palette(new_colors);

        let mut display_set = self.display_set(pts);
        let mut shown = Vec::<(u16, u8)>::new();
        let mut reused = 0;

        display_set.composition.state = if epoch_start {
            CompositionState::EpochStart
        } else {
            CompositionState::Normal
        };
        display_set.windows = epoch.window_definitions();

        if epoch_start || palette_changed {
            display_set.palettes.insert(
                Vid { id: 0, version: epoch.palette_version },
                self.palette(&epoch.palette),
            );
        }

        for (window_id, visible) in visible.iter().enumerate() {

            let visible = match visible {
                Some(visible) => visible,
                None => continue,
            };
            let object_id = window_id as u16;
            let held = epoch.objects[window_id].as_ref();
            let version = match held.filter(|held| held.image == visible.image) {
                Some(held) => {
                    reused += 1;
                    held.version
                }
                None => {
                    let version = held.map_or(0, |held| held.version.wrapping_add(1));
                    display_set.objects.insert(
                        Vid { id: object_id, version },
                        epoch.object(&visible.image)?,
                    );
                    epoch.objects[window_id] = Some(
                        Held { image: visible.image.clone(), version }
                    );
                    version
                }
            };

            display_set.composition.objects.insert(
                Cid { object_id, window_id: window_id as u8 },
                CompositionObject {
                    x: visible.image.x as u16,
                    y: visible.image.y as u16,
                    forced: false,
                    crop: None,
                },
            );
            shown.push((object_id, version));
        }

        let unchanged = !epoch_start
            && !palette_changed
            && display_set.objects.is_empty()
            && shown == self.on_screen;

        self.epoch = Some(epoch);

        if unchanged {
            debug!("Composition at {} is already on screen.", ts_to_timestamp(pts));
            return Ok(())
        }

        if reused > 0 {
            debug!("Reusing {} object(s) at {}.", reused, ts_to_timestamp(pts));
        }

        self.write(display_set, cue)?;
        self.summary.reused_objects += reused;
        self.on_screen = shown;

        Ok(())
    }

    /// Removes every object from the screen. The epoch's windows, palette, and objects stay
    /// defined for whatever follows.
    fn clear(&mut self, pts: u32) -> EncodeResult<()> {

        let mut display_set = self.display_set(pts);
        let cue = self.previous.as_ref().map_or(0, |previous| previous.cue);

        display_set.composition.state = CompositionState::Normal;

        if let Some(epoch) = &self.epoch {
            display_set.windows = epoch.window_definitions();
        }

        self.write(display_set, cue)?;
        self.on_screen.clear();

        Ok(())
    }

    fn display_set(&self, pts: u32) -> DisplaySet {
        DisplaySet {
            pts,
            width: self.settings.width,
            height: self.settings.height,
            frame_rate: self.settings.frame_rate.pcs_code(),
            palette_update_id: None,
            ..Default::default()
        }
    }

    fn palette(&self, colors: &[Rgba]) -> Palette {
        Palette {
            entries: colors.iter()
                .enumerate()
                .map(|(index, color)| {
                    let ycbcr = ycbcr_pixel(
                        self.matrix,
                        RgbPixel { red: color.r, green: color.g, blue: color.b },
                    );
                    (index as u8, PaletteEntry { y: ycbcr.y, cr: ycbcr.cr, cb: ycbcr.cb, alpha: color.a })
                })
                .collect(),
        }
    }

    /// Schedules a display set after the previous one and writes it.
    fn write(&mut self, mut display_set: DisplaySet, cue: usize) -> EncodeResult<()> {

        let needed = display_set.decode_duration();

        display_set.composition.number = self.composition_number;

        match &self.previous {
            Some(previous) => {
                let decodable = display_set.dts().map_or(false, |dts| dts >= previous.pts);
                if !decodable || display_set.pts <= previous.pts {
                    return Err(EncodeError::TimingOverflow {
                        previous_cue: previous.cue,
                        cue,
                        pts: display_set.pts,
                        needed,
                        available: display_set.pts.saturating_sub(previous.pts),
                    })
                }
            }
            None => {
                if display_set.dts().is_none() {
                    warn!(
                        "Cue {} is presented at {} instead of {} to leave time for decoding.",
                        cue,
                        ts_to_timestamp(needed),
                        ts_to_timestamp(display_set.pts),
                    );
                    self.summary.diagnostics.push(Diagnostic::PresentationDelayed {
                        cue,
                        requested_pts: display_set.pts,
                        pts: needed,
                    });
                    display_set.pts = needed;
                }
            }
        }

        self.sink.write_display_set(&display_set)?;
        self.composition_number = self.composition_number.wrapping_add(1);
        self.summary.display_sets += 1;
        self.summary.object_definitions += display_set.objects.len();
        self.previous = Some(Previous { pts: display_set.pts, cue });

        Ok(())
    }
}

/// Crops an image to the canvas, or returns `None` when nothing of it is on the canvas.
fn fit_to(image: &IndexedImage, canvas: Rect) -> EncodeResult<Option<IndexedImage>> {

    let rect = image.rect();

    match rect.intersection(&canvas) {
        Some(inside) if inside == rect => Ok(Some(image.clone())),
        Some(inside) => {
            debug!("Cropping image at ({}, {}) to the canvas.", rect.x, rect.y);
            Ok(Some(quantize(&image.to_bitmap()?.extract(inside)).image))
        }
        None => Ok(None),
    }
}
