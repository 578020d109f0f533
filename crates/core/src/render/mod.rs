//! Character-grid renderer for scenes.

use crate::{
    emitters::Firework,
    scene::{Feature, Scene},
    theater::{CurtainState, TheaterView},
};

const MIN_WIDTH: usize = 24;
const MIN_HEIGHT: usize = 10;
/// Emitter geometry is in CSS pixels; one cell covers this many.
const PX_PER_COLUMN: f32 = 8.0;
const PX_PER_ROW: f32 = 16.0;

/// Turns a [`Scene`] into fixed-size lines of text.
#[derive(Debug, Clone, Copy)]
pub struct FrameComposer {
    width: usize,
    height: usize,
}

impl FrameComposer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width: width.max(MIN_WIDTH),
            height: height.max(MIN_HEIGHT),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `elapsed_ms` is the time since the scene's phase was entered and
    /// drives the emitter animations.
    pub fn compose(&self, scene: &Scene, elapsed_ms: u64) -> Vec<String> {
        let mut canvas = Canvas::new(self.width, self.height);
        let t = elapsed_ms as f32 / 1_000.0;
        let mid = self.height / 2;

        match scene {
            Scene::Countdown { remaining } => {
                canvas.centered(mid - 1, &remaining.to_string());
                let dots = (*remaining as usize).min(self.width / 2);
                canvas.centered(mid + 1, &"o ".repeat(dots));
            }
            Scene::Title { text } => canvas.paragraph(mid - 1, text),
            Scene::Balloons { balloons } => {
                for balloon in balloons {
                    let Some(pos) = balloon.position_at(t) else {
                        continue;
                    };
                    let x = pos.x_percent / 100.0 * (self.width - 1) as f32
                        + pos.sway_px / PX_PER_COLUMN;
                    let y = (self.height - 1) as f32 * (1.0 - pos.rise);
                    let glyph = if pos.opacity > 0.3 { 'O' } else { 'o' };
                    canvas.put_f(x, y, glyph);
                    canvas.put_f(x, y + 1.0, '|');
                }
            }
            Scene::Greeting {
                headline,
                photo,
                fireworks,
            } => {
                let anchors = [
                    (self.width / 8, mid),
                    (self.width * 7 / 8, mid),
                    (self.width / 4, 2),
                    (self.width * 3 / 4, 2),
                ];
                for (firework, (x, y)) in fireworks.iter().zip(anchors) {
                    canvas.firework(firework, x, y, t);
                }
                canvas.centered(1, headline);
                canvas.centered(mid, &format!("[ {photo} ]"));
            }
            Scene::Blackout => {}
            Scene::Theater { stage, feature } => self.theater(&mut canvas, stage, feature.as_ref()),
            Scene::Closing { text, fireworks } => {
                canvas.centered(self.height / 3, text);
                let row = self.height * 2 / 3;
                let slots = fireworks.len() + 1;
                for (i, firework) in fireworks.iter().enumerate() {
                    canvas.firework(firework, self.width * (i + 1) / slots, row, t);
                }
            }
        }

        canvas.into_lines()
    }

    fn theater(&self, canvas: &mut Canvas, stage: &TheaterView, feature: Option<&Feature>) {
        let (w, h) = (self.width, self.height);
        for x in 0..w {
            canvas.put(x, 0, '=');
            canvas.put(x, h - 1, '=');
        }
        for y in 1..h - 1 {
            canvas.put(0, y, '#');
            canvas.put(w - 1, y, '#');
        }

        if stage.show_children {
            let mid = h / 2;
            match feature {
                Some(Feature::Video { source }) => {
                    let marker = if stage.playing { ">" } else { "||" };
                    canvas.centered(mid, &format!("{marker} {source}"));
                }
                Some(Feature::Quote { text }) => canvas.paragraph(mid - 1, text),
                None => {}
            }
        }

        let audience = vec!["o"; stage.audience].join(" ");
        canvas.centered(h - 2, &audience);

        // curtains hang from the top bar down to the audience row
        let half = (w - 2) / 2;
        let covered = match stage.curtains {
            CurtainState::Closed => half,
            CurtainState::Opening { progress } => {
                (half as f32 * (1.0 - progress.clamp(0.0, 1.0))).round() as usize
            }
            CurtainState::Open => 0,
        };
        for y in 1..h - 2 {
            for i in 0..covered {
                canvas.put(1 + i, y, '|');
                canvas.put(w - 2 - i, y, '|');
            }
        }
    }
}

struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<char>,
}

impl Canvas {
    fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![' '; width * height],
        }
    }

    fn put(&mut self, x: usize, y: usize, glyph: char) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = glyph;
        }
    }

    fn put_f(&mut self, x: f32, y: f32, glyph: char) {
        if x >= 0.0 && y >= 0.0 {
            self.put(x.round() as usize, y.round() as usize, glyph);
        }
    }

    fn centered(&mut self, y: usize, text: &str) {
        let chars: Vec<char> = text.chars().take(self.width).collect();
        let start = (self.width - chars.len()) / 2;
        for (i, glyph) in chars.into_iter().enumerate() {
            self.put(start + i, y, glyph);
        }
    }

    /// Word-wraps `text` to two thirds of the width, one line per row from
    /// `top` down.
    fn paragraph(&mut self, top: usize, text: &str) {
        let limit = (self.width * 2 / 3).max(1);
        let mut line = String::new();
        let mut row = top;
        for word in text.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > limit {
                self.centered(row, &line);
                row += 1;
                line.clear();
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        if !line.is_empty() {
            self.centered(row, &line);
        }
    }

    fn firework(&mut self, firework: &Firework, x: usize, y: usize, t: f32) {
        for spark in firework.sparks_at(t) {
            let glyph = if spark.intensity > 0.5 { '*' } else { '.' };
            self.put_f(
                x as f32 + spark.dx / PX_PER_COLUMN,
                y as f32 + spark.dy / PX_PER_ROW,
                glyph,
            );
        }
        let core = if firework.glow_at(t) > 1.25 { '@' } else { '+' };
        self.put(x, y, core);
    }

    fn into_lines(self) -> Vec<String> {
        self.cells
            .chunks(self.width)
            .map(|row| row.iter().collect())
            .collect()
    }
}
