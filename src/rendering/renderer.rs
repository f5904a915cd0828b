use crate::{
    rendering::scene::{ContainerTransform, SceneGraph},
    Result,
};
use bytemuck::{Pod, Zeroable};

/// Draw entry point of the 2D renderer backing a marker layer
pub trait SpriteRenderer {
    /// Draws every child of `scene` through `transform`
    fn render(&mut self, scene: &SceneGraph, transform: &ContainerTransform) -> Result<()>;
}

/// Per-sprite record laid out for a GPU instance buffer
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpriteInstance {
    /// Container pixel position of the anchor
    pub position: [f32; 2],
    /// On-screen size in pixels
    pub size: [f32; 2],
    pub anchor: [f32; 2],
    /// Radians, clockwise
    pub rotation: f32,
    pub texture_slot: u32,
}

impl SpriteInstance {
    /// Top-left corner of the unrotated quad
    pub fn min(&self) -> [f32; 2] {
        [
            self.position[0] - self.anchor[0] * self.size[0],
            self.position[1] - self.anchor[1] * self.size[1],
        ]
    }
}

/// Builds instance records for every drawable sprite, in draw order
pub fn build_instances(scene: &SceneGraph, transform: &ContainerTransform) -> Vec<SpriteInstance> {
    scene
        .children()
        .iter()
        .filter(|sprite| !sprite.texture.is_empty())
        .map(|sprite| {
            let position = transform.apply(&sprite.position);
            let pixel_scale = sprite.scale * transform.scale;
            let (width, height) = sprite.texture.size();
            SpriteInstance {
                position: [position.x as f32, position.y as f32],
                size: [(width * pixel_scale) as f32, (height * pixel_scale) as f32],
                anchor: [sprite.anchor.0 as f32, sprite.anchor.1 as f32],
                rotation: sprite.rotation.to_radians() as f32,
                texture_slot: sprite.texture.slot,
            }
        })
        .collect()
}

/// One recorded draw call
#[derive(Debug, Clone)]
pub struct FrameRecord {
    pub transform: ContainerTransform,
    pub instances: Vec<SpriteInstance>,
}

impl FrameRecord {
    /// Raw instance bytes as they would be uploaded
    pub fn instance_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Renderer that keeps its draw calls for inspection (headless use and tests)
#[derive(Debug, Default)]
pub struct FrameRecorder {
    frames: Vec<FrameRecord>,
    max_frames: Option<usize>,
    draw_calls: usize,
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps only the most recent `max_frames` draw calls
    pub fn with_history(max_frames: usize) -> Self {
        Self {
            frames: Vec::new(),
            max_frames: Some(max_frames.max(1)),
            draw_calls: 0,
        }
    }

    /// Total draw calls, including frames dropped from the history
    pub fn draw_calls(&self) -> usize {
        self.draw_calls
    }

    pub fn last_frame(&self) -> Option<&FrameRecord> {
        self.frames.last()
    }

    pub fn frames(&self) -> &[FrameRecord] {
        &self.frames
    }

    pub fn clear(&mut self) {
        self.frames.clear();
        self.draw_calls = 0;
    }
}

impl SpriteRenderer for FrameRecorder {
    fn render(&mut self, scene: &SceneGraph, transform: &ContainerTransform) -> Result<()> {
        self.draw_calls += 1;
        self.frames.push(FrameRecord {
            transform: *transform,
            instances: build_instances(scene, transform),
        });
        if let Some(max) = self.max_frames {
            if self.frames.len() > max {
                let excess = self.frames.len() - max;
                self.frames.drain(..excess);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::geo::Point,
        layers::marker::{IconId, MarkerId},
        rendering::{assets::Texture, scene::Sprite},
    };
    use std::sync::Arc;

    fn scene_with(textures: &[Texture]) -> SceneGraph {
        let mut scene = SceneGraph::with_projection(13.0, Point::default());
        for (i, texture) in textures.iter().enumerate() {
            let mut sprite = Sprite::new(
                MarkerId::from(i as i64),
                IconId::new("pin"),
                Arc::new(texture.clone()),
            );
            sprite.anchor = (0.5, 1.0);
            sprite.position = Point::new(10.0 * i as f64, 20.0);
            sprite.scale = 0.5;
            scene.add_child(sprite);
        }
        scene
    }

    #[test]
    fn test_instance_layout_is_32_bytes() {
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 32);
    }

    #[test]
    fn test_instances_keep_constant_pixel_size() {
        let scene = scene_with(&[Texture::solid(20, 40, [0, 0, 0, 255])]);
        let transform = ContainerTransform {
            scale: 2.0,
            translate: Point::new(5.0, 5.0),
        };

        let instances = build_instances(&scene, &transform);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].size, [20.0, 40.0]);
        assert_eq!(instances[0].position, [5.0, 45.0]);
        assert_eq!(instances[0].min(), [-5.0, 5.0]);
    }

    #[test]
    fn test_empty_textures_are_not_drawn() {
        let scene = scene_with(&[Texture::empty(), Texture::solid(4, 4, [0, 0, 0, 255])]);
        let transform = ContainerTransform {
            scale: 1.0,
            translate: Point::default(),
        };
        assert_eq!(build_instances(&scene, &transform).len(), 1);
    }

    #[test]
    fn test_recorder_history() {
        let scene = scene_with(&[Texture::solid(4, 4, [0, 0, 0, 255])]);
        let transform = ContainerTransform {
            scale: 1.0,
            translate: Point::default(),
        };
        let mut recorder = FrameRecorder::with_history(2);
        for _ in 0..5 {
            recorder.render(&scene, &transform).unwrap();
        }
        assert_eq!(recorder.draw_calls(), 5);
        assert_eq!(recorder.frames().len(), 2);
        assert_eq!(recorder.last_frame().unwrap().instance_bytes().len(), 32);
    }
}
