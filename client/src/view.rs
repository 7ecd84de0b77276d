//! World-to-screen projections for the main view and the minimap overlay

use shared::{Point, MINIMAP_SIZE};

/// Distance of the minimap overlay from the screen's bottom-right corner
pub const MINIMAP_MARGIN: f32 = 10.0;

/// Keeps the local snake centred on screen
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Camera {
    pub center: Point,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recentres on `target`; without a target the camera stays where it was
    pub fn follow(&mut self, target: Option<Point>) {
        if let Some(target) = target {
            self.center = target;
        }
    }

    pub fn world_to_screen(&self, world: Point, screen_width: f32, screen_height: f32) -> Point {
        Point::new(
            world.x - self.center.x + screen_width / 2.0,
            world.y - self.center.y + screen_height / 2.0,
        )
    }

    /// True if a circle of `radius` around `world` would be at least partly visible
    pub fn is_visible(&self, world: Point, radius: f32, screen_width: f32, screen_height: f32) -> bool {
        let screen = self.world_to_screen(world, screen_width, screen_height);
        screen.x >= -radius
            && screen.y >= -radius
            && screen.x <= screen_width + radius
            && screen.y <= screen_height + radius
    }
}

/// Fixed overlay showing every known snake on a scaled-down arena
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Minimap {
    /// Top-left corner of the overlay in screen space
    pub origin: Point,
    pub size: f32,
    pub map_size: f32,
}

impl Minimap {
    /// Anchors the overlay in the bottom-right corner of the screen
    pub fn anchored(screen_width: f32, screen_height: f32, map_size: f32) -> Self {
        Self {
            origin: Point::new(
                screen_width - MINIMAP_SIZE - MINIMAP_MARGIN,
                screen_height - MINIMAP_SIZE - MINIMAP_MARGIN,
            ),
            size: MINIMAP_SIZE,
            map_size,
        }
    }

    pub fn scale(&self) -> f32 {
        self.size / self.map_size
    }

    /// Projects an arena position (centred at the origin) into the overlay
    pub fn project(&self, world: Point) -> Point {
        let half = self.map_size / 2.0;
        let scale = self.scale();
        Point::new(
            self.origin.x + (world.x + half) * scale,
            self.origin.y + (world.y + half) * scale,
        )
    }
}
