/*
 * SPDX-FileCopyrightText: 2021 William Swartzendruber <wswartzendruber@gmail.com>
 *
 * SPDX-License-Identifier: MPL-2.0
 */

//! Places the characters of a cue on the canvas.
//!
//! The canvas holds a content box, the part of the frame the video actually covers once it is
//! letterboxed or pillarboxed. Regions are laid out relative to that box and relative font
//! sizes scale with it, so subtitles keep their proportions to the visible picture. Layout
//! works on an inline axis (along a line) and a block axis (across lines); vertical writing
//! swaps the two and stacks its columns from right to left.


use super::{
    config::{AspectRatio, RenderConfig, TargetVideoInfo},
    document::{DisplayAlign, Region, TextAlign, WritingMode},
    font::GlyphSource,
    normalize::RenderCue,
    style::{ResolvedStyle, LINE_HEIGHT},
};
use tracing::debug;

/// Size of ruby text relative to the text it annotates.
pub const RUBY_SCALE: f32 = 0.5;

/// A rectangle in canvas pixels.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {

    pub fn right(&self) -> i32 {
        self.x.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.y.saturating_add(self.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn intersection(&self, other: &Rect) -> Option<Rect> {

        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let rect = Rect {
            x,
            y,
            width: self.right().min(other.right()) - x,
            height: self.bottom().min(other.bottom()) - y,
        };

        Some(rect).filter(|rect| !rect.is_empty())
    }

    pub fn union(&self, other: &Rect) -> Rect {

        let x = self.x.min(other.x);
        let y = self.y.min(other.y);

        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }
}

/// The output frame and the part of it covered by picture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CanvasSpec {
    pub output_width: u32,
    pub output_height: u32,
    pub content_aspect_ratio: AspectRatio,
    /// Treats the full canvas as content, whatever the aspect ratio.
    pub force_16_9: bool,
}

impl CanvasSpec {

    /// Decides the content aspect ratio: a manual override wins over forcing 16:9, which wins
    /// over the video's own dimensions.
    pub fn new(config: &RenderConfig, video: &TargetVideoInfo) -> Self {
        Self {
            output_width: config.canvas_width as u32,
            output_height: config.canvas_height as u32,
            content_aspect_ratio: config.override_content_aspect_ratio.unwrap_or(AspectRatio {
                width: video.width.max(1),
                height: video.height.max(1),
            }),
            force_16_9: config.force_16_9 && config.override_content_aspect_ratio.is_none(),
        }
    }

    pub fn canvas(&self) -> Rect {
        Rect {
            x: 0,
            y: 0,
            width: self.output_width as i32,
            height: self.output_height as i32,
        }
    }

    /// The canvas minus any letterbox or pillarbox bars, centered.
    pub fn content_box(&self) -> Rect {

        let canvas = self.canvas();

        if self.force_16_9 || canvas.is_empty() {
            return canvas
        }

        let canvas_ratio = canvas.width as f64 / canvas.height as f64;
        let content_ratio = self.content_aspect_ratio.as_f64();

        if (content_ratio - canvas_ratio).abs() < 1e-6 {
            canvas
        } else if content_ratio > canvas_ratio {
            let height = (canvas.width as f64 / content_ratio).round() as i32;
            Rect { x: 0, y: (canvas.height - height) / 2, width: canvas.width, height }
        } else {
            let width = (canvas.height as f64 * content_ratio).round() as i32;
            Rect { x: (canvas.width - width) / 2, y: 0, width, height: canvas.height }
        }
    }

    /// Places a region: percentages of the content box, then pixel offsets on top.
    pub fn region_rect(&self, region: &Region) -> Rect {

        let content = self.content_box();
        let scale = |percent: f32, length: i32| (percent as f64 * length as f64 / 100.0).round() as i32;

        Rect {
            x: content.x.saturating_add(scale(region.x, content.width)).saturating_add(region.offset_x),
            y: content.y.saturating_add(scale(region.y, content.height)).saturating_add(region.offset_y),
            width: scale(region.width, content.width),
            height: scale(region.height, content.height),
        }
    }
}

/// A character positioned on the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    pub ch: char,
    pub px: f32,
    /// Pen position on the baseline.
    pub x: f32,
    pub baseline: f32,
    /// Index of the text run, and so the style, the character belongs to.
    pub run: usize,
}

/// Raised when a cue's text needs more room than its region offers.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OverflowWarning {
    pub cue: usize,
    pub needed_width: u32,
    pub needed_height: u32,
    pub region_width: u32,
    pub region_height: u32,
}

/// A cue with every character placed.
#[derive(Clone, Debug, PartialEq)]
pub struct LaidOutCue {
    pub cue: usize,
    /// The region's area on the canvas; nothing is drawn outside it.
    pub clip: Option<Rect>,
    pub glyphs: Vec<PlacedGlyph>,
    /// Styles by text run.
    pub styles: Vec<ResolvedStyle>,
    pub overflow: Option<OverflowWarning>,
}

struct Cell {
    ch: char,
    run: usize,
    px: f32,
    inline: f32,
}

#[derive(Default)]
struct Cluster {
    base: Vec<Cell>,
    ruby: Vec<Cell>,
    space: bool,
}

impl Cluster {

    fn base_inline(&self) -> f32 {
        self.base.iter().map(|cell| cell.inline).sum()
    }

    fn ruby_inline(&self) -> f32 {
        self.ruby.iter().map(|cell| cell.inline).sum()
    }

    fn inline(&self) -> f32 {
        self.base_inline().max(self.ruby_inline())
    }
}

enum Token {
    Cluster(Cluster),
    LineBreak,
}

#[derive(Default)]
struct Line {
    clusters: Vec<Cluster>,
}

impl Line {

    fn trim_trailing_spaces(&mut self) {
        while self.clusters.last().map(|cluster| cluster.space).unwrap_or(false) {
            self.clusters.pop();
        }
    }

    fn inline(&self) -> f32 {
        self.clusters.iter().map(Cluster::inline).sum()
    }

    fn base_px(&self) -> Option<f32> {
        self.clusters.iter()
            .flat_map(|cluster| cluster.base.iter())
            .map(|cell| cell.px)
            .reduce(f32::max)
    }

    fn ruby_px(&self) -> Option<f32> {
        self.clusters.iter()
            .flat_map(|cluster| cluster.ruby.iter())
            .map(|cell| cell.px)
            .reduce(f32::max)
    }
}

/// Whether a character is set full width and may be broken around like CJK text.
pub fn is_wide(ch: char) -> bool {
    matches!(
        ch as u32,
        0x1100..=0x115F
            | 0x2E80..=0xA4CF
            | 0xAC00..=0xD7A3
            | 0xF900..=0xFAFF
            | 0xFE30..=0xFE4F
            | 0xFF00..=0xFF60
            | 0xFFE0..=0xFFE6
            | 0x20000..=0x3FFFD
    )
}

/// Lays out a cue inside its region.
pub fn layout(cue: &RenderCue, canvas: &CanvasSpec, glyphs: &dyn GlyphSource) -> LaidOutCue {

    let region = canvas.region_rect(&cue.region);
    let content = canvas.content_box();
    let vertical = matches!(cue.writing_mode, WritingMode::Vertical | WritingMode::VerticalLr);
    let sizes = cue.text_runs.iter()
        .map(|run| run.style.font_size.resolve(content.height as f32, region.height as f32))
        .collect::<Vec<f32>>();
    let inline_size = |ch: char, px: f32| {
        let advance = glyphs.advance(ch, px);
        if vertical && advance > 0.0 { px } else { advance }
    };
    let tokens = tokenize(cue, &sizes, &inline_size);
    let (inline_available, block_available) = if vertical {
        (region.height as f32, region.width as f32)
    } else {
        (region.width as f32, region.height as f32)
    };
    let lines = break_lines(tokens, inline_available);
    let fallback_px = sizes.first().copied().unwrap_or(0.0);
    let extents = lines.iter()
        .map(|line| {
            let ruby = line.ruby_px().map(|px| px * LINE_HEIGHT).unwrap_or(0.0);
            let base = line.base_px().unwrap_or(fallback_px) * LINE_HEIGHT;
            (ruby, base)
        })
        .collect::<Vec<(f32, f32)>>();
    let block_needed = extents.iter().map(|(ruby, base)| ruby + base).sum::<f32>();
    let inline_needed = lines.iter().map(Line::inline).fold(0.0, f32::max);
    let mut block = match cue.region.display_align {
        DisplayAlign::Before => 0.0,
        DisplayAlign::Center => (block_available - block_needed) / 2.0,
        DisplayAlign::After => block_available - block_needed,
    };
    let mut placed = Vec::<PlacedGlyph>::new();

    for (line, (ruby_extent, base_extent)) in lines.iter().zip(extents) {

        let line_inline = line.inline();
        let mut inline = match cue.region.text_align {
            TextAlign::Start => 0.0,
            TextAlign::Center => (inline_available - line_inline) / 2.0,
            TextAlign::End => inline_available - line_inline,
        };
        let base_px = line.base_px().unwrap_or(fallback_px);
        let ruby_px = line.ruby_px().unwrap_or(0.0);
        let bands = Bands {
            vertical,
            left_to_right: cue.writing_mode == WritingMode::VerticalLr,
            region,
            ruby_start: block,
            ruby_extent,
            base_start: block + ruby_extent,
            base_extent,
        };

        for cluster in line.clusters.iter() {
            let width = cluster.inline();
            let base_start = inline + (width - cluster.base_inline()) / 2.0;
            let ruby_start = inline + (width - cluster.ruby_inline()) / 2.0;
            bands.place(&cluster.base, base_start, base_px, false, glyphs, &mut placed);
            bands.place(&cluster.ruby, ruby_start, ruby_px, true, glyphs, &mut placed);
            inline += width;
        }

        block += ruby_extent + base_extent;
    }

    let overflow = (inline_needed > inline_available + 0.5 || block_needed > block_available + 0.5)
        .then(|| {
            let (needed_width, needed_height) = if vertical {
                (block_needed, inline_needed)
            } else {
                (inline_needed, block_needed)
            };
            debug!("Cue {} overflows its region.", cue.index);
            OverflowWarning {
                cue: cue.index,
                needed_width: needed_width.ceil() as u32,
                needed_height: needed_height.ceil() as u32,
                region_width: region.width.max(0) as u32,
                region_height: region.height.max(0) as u32,
            }
        });

    LaidOutCue {
        cue: cue.index,
        clip: region.intersection(&canvas.canvas()),
        glyphs: placed,
        styles: cue.text_runs.iter().map(|run| run.style).collect(),
        overflow,
    }
}

fn tokenize(
    cue: &RenderCue,
    sizes: &[f32],
    inline_size: &dyn Fn(char, f32) -> f32,
) -> Vec<Token> {

    let mut tokens = Vec::<Token>::new();
    let mut word = Cluster::default();
    let flush = |word: &mut Cluster, tokens: &mut Vec<Token>| {
        if !word.base.is_empty() {
            tokens.push(Token::Cluster(std::mem::take(word)));
        }
    };

    for (run_index, run) in cue.text_runs.iter().enumerate() {

        let px = sizes[run_index];
        let ruby = cue.ruby_annotations.iter().find(|ruby| ruby.run == run_index);

        // Annotated runs are kept whole so that the ruby stays over its base.
        if let Some(ruby) = ruby {
            flush(&mut word, &mut tokens);
            let ruby_px = px * RUBY_SCALE;
            let cell = |ch: char, px: f32| Cell { ch, run: run_index, px, inline: inline_size(ch, px) };
            tokens.push(Token::Cluster(Cluster {
                base: run.text.chars().filter(|ch| *ch != '\n').map(|ch| cell(ch, px)).collect(),
                ruby: ruby.text.chars().filter(|ch| *ch != '\n').map(|ch| cell(ch, ruby_px)).collect(),
                space: false,
            }));
            continue
        }

        for ch in run.text.chars() {

            let cell = Cell { ch, run: run_index, px, inline: inline_size(ch, px) };

            if ch == '\n' {
                flush(&mut word, &mut tokens);
                tokens.push(Token::LineBreak);
            } else if ch.is_whitespace() {
                flush(&mut word, &mut tokens);
                tokens.push(Token::Cluster(Cluster { base: vec![cell], ruby: vec![], space: true }));
            } else if cell.inline == 0.0 && !word.base.is_empty() {
                // Combining marks stay with the character they modify.
                word.base.push(cell);
            } else if is_wide(ch) {
                flush(&mut word, &mut tokens);
                word.base.push(cell);
                flush(&mut word, &mut tokens);
            } else {
                word.base.push(cell);
            }
        }
    }

    flush(&mut word, &mut tokens);

    tokens
}

fn break_lines(tokens: Vec<Token>, available: f32) -> Vec<Line> {

    let mut lines = Vec::<Line>::new();
    let mut line = Line::default();
    let mut line_inline = 0.0_f32;
    let mut wrapped = false;

    for token in tokens {
        match token {
            Token::LineBreak => {
                line.trim_trailing_spaces();
                lines.push(std::mem::take(&mut line));
                line_inline = 0.0;
                wrapped = false;
            }
            Token::Cluster(cluster) => {
                let inline = cluster.inline();
                if !line.clusters.is_empty() && line_inline + inline > available + 0.5 {
                    line.trim_trailing_spaces();
                    lines.push(std::mem::take(&mut line));
                    line_inline = 0.0;
                    wrapped = true;
                }
                if cluster.space && wrapped && line.clusters.is_empty() {
                    continue
                }
                line_inline += inline;
                line.clusters.push(cluster);
            }
        }
    }

    line.trim_trailing_spaces();
    lines.push(line);

    lines
}

/// Where one line's ruby and base text sit along the block axis.
struct Bands {
    vertical: bool,
    /// Vertical columns advance rightward.
    left_to_right: bool,
    region: Rect,
    ruby_start: f32,
    ruby_extent: f32,
    base_start: f32,
    base_extent: f32,
}

impl Bands {

    fn place(
        &self,
        cells: &[Cell],
        inline_start: f32,
        px: f32,
        ruby: bool,
        glyphs: &dyn GlyphSource,
        placed: &mut Vec<PlacedGlyph>,
    ) {

        if cells.is_empty() {
            return
        }

        let (band_start, band_extent) = if ruby {
            (self.ruby_start, self.ruby_extent)
        } else {
            (self.base_start, self.base_extent)
        };
        let metrics = glyphs.line_metrics(px);
        let mut inline = inline_start;

        for cell in cells {

            let (x, baseline) = if self.vertical {
                // Ruby takes the side columns advance from: the right of right-to-left text
                // and the left of left-to-right text.
                let band_left = if self.left_to_right {
                    self.region.x as f32 + band_start
                } else {
                    self.region.right() as f32 - band_start - band_extent
                };
                let advance = glyphs.advance(cell.ch, cell.px);
                let glyph_metrics = glyphs.line_metrics(cell.px);
                (
                    band_left + (band_extent - advance) / 2.0,
                    self.region.y as f32 + inline
                        + (cell.inline - glyph_metrics.height()) / 2.0 + glyph_metrics.ascent,
                )
            } else {
                (
                    self.region.x as f32 + inline,
                    self.region.y as f32 + band_start
                        + (band_extent - metrics.height()) / 2.0 + metrics.ascent,
                )
            };

            placed.push(PlacedGlyph { ch: cell.ch, px: cell.px, x, baseline, run: cell.run });
            inline += cell.inline;
        }
    }
}
