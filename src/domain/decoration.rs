/// Background entities: clouds, mountains and the water overlay.
///
/// Layout depends only on the level width, never on the level content.
/// None of these take part in collision.

use super::entity::{Body, Vec2};

/// Horizontal distance between two clouds.
const CLOUD_SPACING: f32 = 5.0;
const CLOUD_SPEED: f32 = 0.5;
const CLOUD_HEIGHTS: [f32; 3] = [0.0, 0.75, 1.5];

/// Mountain layers scroll slower the further back they are.
pub const MOUNTAIN_PARALLAX: [f32; 3] = [0.8, 0.5, 0.3];

#[derive(Clone, Debug, PartialEq)]
pub struct Cloud {
    pub body: Body,
    pub velocity: Vec2,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Clouds {
    pub position: Vec2,
    pub length: f32,
    pub clouds: Vec<Cloud>,
}

impl Clouds {
    pub fn new(level_width: usize) -> Self {
        let length = level_width as f32;
        let count = (length / CLOUD_SPACING) as usize;
        let clouds = (0..count)
            .map(|i| Cloud {
                body: Body::new(
                    i as f32 * CLOUD_SPACING,
                    CLOUD_HEIGHTS[i % CLOUD_HEIGHTS.len()],
                    3.0,
                    2.0,
                ),
                velocity: Vec2::new(-CLOUD_SPEED, 0.0),
            })
            .collect();
        Clouds { position: Vec2::new(0.0, 2.0), length, clouds }
    }

    /// Drift left; a cloud that leaves the level re-enters on the right.
    pub fn update(&mut self, dt: f32) {
        for cloud in &mut self.clouds {
            cloud.body.position.x += cloud.velocity.x * dt;
            if cloud.body.position.x < -cloud.body.dimension.x {
                cloud.body.position.x += self.length + cloud.body.dimension.x;
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Mountains {
    pub position: Vec2,
    pub length: f32,
    pub scroll_x: f32,
}

impl Mountains {
    pub fn new(level_width: usize) -> Self {
        Mountains {
            position: Vec2::new(-1.0, -1.0),
            length: level_width as f32,
            scroll_x: 0.0,
        }
    }

    /// Follow the camera focus (the player).
    pub fn update_scroll_position(&mut self, focus_x: f32) {
        self.scroll_x = focus_x;
    }

    /// Horizontal draw offset of one parallax layer.
    pub fn layer_offset(&self, layer: usize) -> f32 {
        let factor = MOUNTAIN_PARALLAX.get(layer).copied().unwrap_or(0.0);
        self.position.x + self.scroll_x * factor
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct WaterOverlay {
    pub position: Vec2,
    pub length: f32,
}

impl WaterOverlay {
    pub fn new(level_width: usize) -> Self {
        WaterOverlay { position: Vec2::new(0.0, -3.6), length: level_width as f32 }
    }
}

/// All background elements of a level.
#[derive(Clone, Debug, PartialEq)]
pub struct Decorations {
    pub clouds: Clouds,
    pub mountains: Mountains,
    pub water: WaterOverlay,
}

impl Decorations {
    pub fn new(level_width: usize) -> Self {
        Decorations {
            clouds: Clouds::new(level_width),
            mountains: Mountains::new(level_width),
            water: WaterOverlay::new(level_width),
        }
    }

    pub fn update(&mut self, dt: f32, focus_x: f32) {
        self.clouds.update(dt);
        self.mountains.update_scroll_position(focus_x);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_count_follows_width() {
        assert_eq!(Clouds::new(4).clouds.len(), 0);
        assert_eq!(Clouds::new(20).clouds.len(), 4);
    }

    #[test]
    fn clouds_wrap_around() {
        let mut clouds = Clouds::new(10);
        clouds.update(7.0); // first cloud: 0 - 3.5 = -3.5 < -3.0
        let first = &clouds.clouds[0];
        assert!((first.body.position.x - 9.5).abs() < 1e-5);
    }

    #[test]
    fn mountain_layers_parallax() {
        let mut m = Mountains::new(30);
        m.update_scroll_position(10.0);
        assert!((m.layer_offset(0) - 7.0).abs() < 1e-5);
        assert!((m.layer_offset(2) - 2.0).abs() < 1e-5);
        assert_eq!(m.layer_offset(9), -1.0);
    }
}
