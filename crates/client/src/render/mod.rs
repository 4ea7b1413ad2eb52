// Canvas rendering - background grid, food, players and their labels
use glam::Vec2;
use protocol::{Food, Player};
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::camera::Camera;

pub const BACKGROUND_COLOR: &str = "#0f172a";
pub const GRID_COLOR: &str = "#1e293b";
pub const LABEL_COLOR: &str = "#fff";
pub const LABEL_FONT: &str = "14px sans-serif";
/// Gap between the top of a player's circle and its label baseline.
pub const LABEL_GAP: f32 = 8.0;

/// Something frames can be painted onto. The browser uses a 2D canvas;
/// tests record the calls.
pub trait Surface {
    /// Current drawable size in pixels.
    fn size(&self) -> Vec2;
    fn fill_background(&mut self, color: &str);
    /// Stroke a batch of line segments with one style.
    fn stroke_lines(&mut self, segments: &[(Vec2, Vec2)], color: &str, width: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: &str);
    /// Horizontally centered text with its baseline at `at`.
    fn fill_text(&mut self, text: &str, at: Vec2, color: &str, font: &str);
}

/// What a frame needs to know about the local player.
#[derive(Debug, Clone, Copy)]
pub struct LocalView {
    pub id: u32,
    /// Locally-predicted position. Always used instead of the server echo.
    pub position: Vec2,
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    /// Paint one frame. Returns the camera used so callers can reuse it.
    pub fn draw_frame<S: Surface>(
        &self,
        surface: &mut S,
        local: LocalView,
        players: &[Player],
        foods: &[Food],
    ) -> Camera {
        let camera = Camera::centered_on(local.position, surface.size());

        surface.fill_background(BACKGROUND_COLOR);
        self.draw_grid(surface, &camera);

        for food in foods {
            let screen = camera.world_to_screen(food.position);
            surface.fill_circle(screen, food.radius, &food.color.to_hex());
        }

        for player in players {
            let world = if player.id == local.id {
                local.position
            } else {
                player.position
            };
            self.draw_player(surface, camera.world_to_screen(world), player);
        }

        camera
    }

    fn draw_grid<S: Surface>(&self, surface: &mut S, camera: &Camera) {
        let size = camera.viewport();
        let mut segments: Vec<(Vec2, Vec2)> = Vec::with_capacity(32);
        segments.extend(
            camera
                .grid_columns()
                .map(|x| (Vec2::new(x, 0.0), Vec2::new(x, size.y))),
        );
        segments.extend(
            camera
                .grid_rows()
                .map(|y| (Vec2::new(0.0, y), Vec2::new(size.x, y))),
        );
        if !segments.is_empty() {
            surface.stroke_lines(&segments, GRID_COLOR, 1.0);
        }
    }

    fn draw_player<S: Surface>(&self, surface: &mut S, screen: Vec2, player: &Player) {
        surface.fill_circle(screen, player.radius, &player.color.to_hex());
        let label_at = screen - Vec2::new(0.0, player.radius + LABEL_GAP);
        surface.fill_text(&player.name, label_at, LABEL_COLOR, LABEL_FONT);
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

/// `Surface` over an HTML canvas 2D context.
pub struct Canvas2dSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl Canvas2dSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or("Failed to get 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self { canvas, ctx })
    }

    /// Match the canvas backing store to the given size.
    pub fn resize(&self, width: u32, height: u32) {
        if self.canvas.width() != width {
            self.canvas.set_width(width);
        }
        if self.canvas.height() != height {
            self.canvas.set_height(height);
        }
    }
}

impl Surface for Canvas2dSurface {
    #[inline]
    fn size(&self) -> Vec2 {
        Vec2::new(self.canvas.width() as f32, self.canvas.height() as f32)
    }

    fn fill_background(&mut self, color: &str) {
        let size = self.size();
        self.ctx.set_fill_style_str(color);
        self.ctx.fill_rect(0.0, 0.0, size.x as f64, size.y as f64);
    }

    fn stroke_lines(&mut self, segments: &[(Vec2, Vec2)], color: &str, width: f32) {
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(width as f64);
        self.ctx.begin_path();
        for (from, to) in segments {
            self.ctx.move_to(from.x as f64, from.y as f64);
            self.ctx.line_to(to.x as f64, to.y as f64);
        }
        self.ctx.stroke();
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: &str) {
        // arc() throws on a negative radius
        if !(radius > 0.0) {
            return;
        }
        self.ctx.begin_path();
        let _ = self.ctx.arc(
            center.x as f64,
            center.y as f64,
            radius as f64,
            0.0,
            std::f64::consts::TAU,
        );
        self.ctx.set_fill_style_str(color);
        self.ctx.fill();
    }

    fn fill_text(&mut self, text: &str, at: Vec2, color: &str, font: &str) {
        self.ctx.set_fill_style_str(color);
        self.ctx.set_font(font);
        self.ctx.set_text_align("center");
        let _ = self.ctx.fill_text(text, at.x as f64, at.y as f64);
    }
}
