use crate::game::{ClientGameState, Phase, RenderedPlayer};
use crate::view::{Camera, Minimap};
use macroquad::color::hsl_to_rgb;
use macroquad::prelude::*;
use shared::{Food, Point, COLLISION_RADIUS};

const BACKGROUND: Color = Color::new(0.07, 0.07, 0.09, 1.0);
const GRID_COLOR: Color = Color::new(0.14, 0.14, 0.17, 1.0);
const GRID_SPACING: f32 = 50.0;
const FOOD_RADIUS: f32 = 5.0;

/// Converts a 0..360 hue into a saturated colour
pub fn hue_color(hue: u16, lightness: f32) -> Color {
    hsl_to_rgb((hue % 360) as f32 / 360.0, 0.8, lightness)
}

pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Renderer
    }

    pub fn render(&mut self, state: &ClientGameState, camera: &Camera) {
        let (width, height) = (screen_width(), screen_height());
        clear_background(BACKGROUND);

        self.draw_grid(camera, width, height);
        self.draw_border(camera, state.map_size, width, height);

        for food in &state.food {
            self.draw_food(food, camera, width, height);
        }

        let mut players: Vec<&RenderedPlayer> = state.players.values().collect();
        players.sort_by_key(|rendered| rendered.player.id);
        for rendered in players {
            let is_local = Some(rendered.player.id) == state.local_id;
            self.draw_snake(rendered, is_local, camera, width, height);
        }

        self.draw_minimap(state, width, height);
        self.draw_hud(state);

        match &state.phase {
            Phase::Dead => self.draw_banner("You died", "Press R to play again", width, height),
            Phase::Disconnected(reason) => {
                self.draw_banner("Disconnected", reason, width, height)
            }
            Phase::Joining => self.draw_banner("Joining...", "", width, height),
            Phase::Playing => {}
        }
    }

    fn draw_grid(&self, camera: &Camera, width: f32, height: f32) {
        let start_x = -((camera.center.x - width / 2.0).rem_euclid(GRID_SPACING));
        let start_y = -((camera.center.y - height / 2.0).rem_euclid(GRID_SPACING));

        let mut x = start_x;
        while x < width {
            draw_line(x, 0.0, x, height, 1.0, GRID_COLOR);
            x += GRID_SPACING;
        }
        let mut y = start_y;
        while y < height {
            draw_line(0.0, y, width, y, 1.0, GRID_COLOR);
            y += GRID_SPACING;
        }
    }

    fn draw_border(&self, camera: &Camera, map_size: f32, width: f32, height: f32) {
        let half = map_size / 2.0;
        let top_left = camera.world_to_screen(Point::new(-half, -half), width, height);
        draw_rectangle_lines(top_left.x, top_left.y, map_size, map_size, 4.0, RED);
    }

    fn draw_food(&self, food: &Food, camera: &Camera, width: f32, height: f32) {
        if !camera.is_visible(food.position(), FOOD_RADIUS, width, height) {
            return;
        }
        let screen = camera.world_to_screen(food.position(), width, height);
        draw_circle(screen.x, screen.y, FOOD_RADIUS, hue_color(food.hue, 0.6));
    }

    fn draw_snake(
        &self,
        rendered: &RenderedPlayer,
        is_local: bool,
        camera: &Camera,
        width: f32,
        height: f32,
    ) {
        let player = &rendered.player;
        let offset = rendered.render_offset();
        let body = hue_color(player.hue, 0.5);
        let head = hue_color(player.hue, 0.65);

        // Tail first so the head ends up on top
        for segment in player.segments.iter().skip(1).rev() {
            let world = Point::new(segment.x + offset.x, segment.y + offset.y);
            if camera.is_visible(world, COLLISION_RADIUS, width, height) {
                let screen = camera.world_to_screen(world, width, height);
                draw_circle(screen.x, screen.y, COLLISION_RADIUS, body);
            }
        }

        let screen = camera.world_to_screen(rendered.position, width, height);
        draw_circle(screen.x, screen.y, COLLISION_RADIUS + 1.0, head);
        if is_local {
            draw_circle_lines(screen.x, screen.y, COLLISION_RADIUS + 2.0, 2.0, WHITE);
        }
        if player.boosting {
            draw_circle_lines(screen.x, screen.y, COLLISION_RADIUS + 5.0, 1.0, YELLOW);
        }

        let label = measure_text(&player.name, None, 16, 1.0);
        draw_text(
            &player.name,
            screen.x - label.width / 2.0,
            screen.y - COLLISION_RADIUS - 6.0,
            16.0,
            WHITE,
        );
    }

    fn draw_minimap(&self, state: &ClientGameState, width: f32, height: f32) {
        let minimap = Minimap::anchored(width, height, state.map_size);
        draw_rectangle(
            minimap.origin.x,
            minimap.origin.y,
            minimap.size,
            minimap.size,
            Color::new(0.0, 0.0, 0.0, 0.6),
        );
        draw_rectangle_lines(
            minimap.origin.x,
            minimap.origin.y,
            minimap.size,
            minimap.size,
            1.0,
            GRAY,
        );

        for rendered in state.players.values() {
            let dot = minimap.project(rendered.position);
            if Some(rendered.player.id) == state.local_id {
                draw_circle(dot.x, dot.y, 3.5, WHITE);
            } else {
                draw_circle(dot.x, dot.y, 2.0, hue_color(rendered.player.hue, 0.6));
            }
        }
    }

    fn draw_hud(&self, state: &ClientGameState) {
        let mut y = 24.0;
        if let Some(room_id) = &state.room_id {
            draw_text(&format!("Room {}", room_id), 10.0, y, 20.0, WHITE);
            y += 22.0;
        }

        if let Some(local) = state.local_player() {
            draw_text(&format!("Score {}", local.player.score), 10.0, y, 20.0, WHITE);
            y += 22.0;
            draw_text(
                &format!("Length {}", local.player.segments.len()),
                10.0,
                y,
                20.0,
                WHITE,
            );
            y += 22.0;
        }

        draw_text(
            &format!("{} players", state.players.len()),
            10.0,
            y,
            20.0,
            LIGHTGRAY,
        );
    }

    fn draw_banner(&self, title: &str, subtitle: &str, width: f32, height: f32) {
        draw_rectangle(0.0, height / 2.0 - 50.0, width, 100.0, Color::new(0.0, 0.0, 0.0, 0.7));

        let title_size = measure_text(title, None, 40, 1.0);
        draw_text(
            title,
            (width - title_size.width) / 2.0,
            height / 2.0,
            40.0,
            WHITE,
        );

        if !subtitle.is_empty() {
            let subtitle_size = measure_text(subtitle, None, 20, 1.0);
            draw_text(
                subtitle,
                (width - subtitle_size.width) / 2.0,
                height / 2.0 + 30.0,
                20.0,
                LIGHTGRAY,
            );
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}
