//! egui backend: uploads icon textures, draws sprite instances as textured meshes and paints
//! the tooltip/popup widgets attached to a [`Map`].

use crate::{
    core::map::Map,
    rendering::{
        assets::AssetRegistry,
        renderer::{build_instances, SpriteInstance, SpriteRenderer},
        scene::{ContainerTransform, SceneGraph},
    },
    traits::HostMap,
    ui::overlay::{OverlayWidget, TooltipDirection},
    Result,
};
use egui::{
    emath::Rot2, Color32, FontId, Mesh, Painter, Pos2, Rect, Shape, TextureHandle,
    TextureOptions, Vec2,
};

#[derive(Debug, Clone)]
pub struct OverlayStyle {
    pub background_color: Color32,
    pub border_color: Color32,
    pub border_width: f32,
    pub rounding: f32,
    pub padding: f32,
    pub font_id: FontId,
    pub text_color: Color32,
    pub max_width: f32,
    /// Size of the popup's pointer tip
    pub tip_size: f32,
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            background_color: Color32::WHITE,
            border_color: Color32::GRAY,
            border_width: 1.0,
            rounding: 4.0,
            padding: 8.0,
            font_id: FontId::proportional(12.0),
            text_color: Color32::BLACK,
            max_width: 300.0,
            tip_size: 8.0,
        }
    }
}

/// Sprite renderer that keeps the latest instance list for painting with egui
#[derive(Default)]
pub struct EguiSpriteRenderer {
    textures: Vec<TextureHandle>,
    instances: Vec<SpriteInstance>,
}

impl EguiSpriteRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Uploads every registry texture, indexed by slot
    pub fn upload(&mut self, ctx: &egui::Context, registry: &AssetRegistry) {
        self.textures = registry
            .iter()
            .map(|(alias, texture)| {
                let image = egui::ColorImage::from_rgba_unmultiplied(
                    [texture.width as usize, texture.height as usize],
                    &texture.rgba,
                );
                ctx.load_texture(format!("spritelet-{}", alias), image, TextureOptions::LINEAR)
            })
            .collect();
        log::debug!("uploaded {} sprite textures", self.textures.len());
    }

    pub fn is_uploaded(&self) -> bool {
        !self.textures.is_empty()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Paints the last drawn instances inside `rect`
    pub fn paint(&self, painter: &Painter, rect: Rect) {
        let clip = rect.expand(64.0);
        for instance in &self.instances {
            let Some(texture) = self.textures.get(instance.texture_slot as usize) else {
                continue;
            };
            let anchor = rect.min + Vec2::new(instance.position[0], instance.position[1]);
            if !clip.contains(anchor) {
                continue;
            }
            let min = instance.min();
            let quad = Rect::from_min_size(
                rect.min + Vec2::new(min[0], min[1]),
                Vec2::new(instance.size[0], instance.size[1]),
            );

            let mut mesh = Mesh::with_texture(texture.id());
            mesh.add_rect_with_uv(
                quad,
                Rect::from_min_max(Pos2::ZERO, Pos2::new(1.0, 1.0)),
                Color32::WHITE,
            );
            if instance.rotation != 0.0 {
                mesh.rotate(Rot2::from_angle(instance.rotation), anchor);
            }
            painter.add(Shape::mesh(mesh));
        }
    }
}

impl SpriteRenderer for EguiSpriteRenderer {
    fn render(&mut self, scene: &SceneGraph, transform: &ContainerTransform) -> Result<()> {
        self.instances = build_instances(scene, transform);
        Ok(())
    }
}

/// Paints every tooltip and popup attached to `map`
pub fn paint_overlays(painter: &Painter, rect: Rect, map: &Map, style: &OverlayStyle) {
    for (_, widget) in map.overlays() {
        let Some(anchor) = map.container_point(&widget.lat_lng()) else {
            continue;
        };
        let offset = widget.offset();
        let at = rect.min + Vec2::new((anchor.x + offset.x) as f32, (anchor.y + offset.y) as f32);

        match widget {
            OverlayWidget::Tooltip(tooltip) => {
                let opacity = tooltip.options.opacity.clamp(0.0, 1.0);
                let body = text_box(painter, &tooltip.content, style, style.max_width);
                let placed = place(body, at, tooltip.options.direction);
                paint_box(painter, placed, &tooltip.content, style, opacity);
            }
            OverlayWidget::Popup(popup) => {
                let body = text_box(painter, &popup.content, style, popup.options.max_width as f32);
                let placed = place(body, at - Vec2::new(0.0, style.tip_size), TooltipDirection::Top);
                paint_box(painter, placed, &popup.content, style, 1.0);

                let tip = vec![
                    at,
                    at + Vec2::new(-style.tip_size, -style.tip_size),
                    at + Vec2::new(style.tip_size, -style.tip_size),
                ];
                painter.add(Shape::convex_polygon(
                    tip,
                    style.background_color,
                    (style.border_width, style.border_color),
                ));
            }
        }
    }
}

fn text_box(painter: &Painter, text: &str, style: &OverlayStyle, max_width: f32) -> Vec2 {
    let text_size = painter
        .layout_no_wrap(text.to_string(), style.font_id.clone(), style.text_color)
        .size();
    Vec2::new(
        (text_size.x + style.padding * 2.0).min(max_width),
        text_size.y + style.padding * 2.0,
    )
}

fn place(size: Vec2, at: Pos2, direction: TooltipDirection) -> Rect {
    let min = match direction {
        TooltipDirection::Auto | TooltipDirection::Top => at - Vec2::new(size.x / 2.0, size.y),
        TooltipDirection::Bottom => at - Vec2::new(size.x / 2.0, 0.0),
        TooltipDirection::Left => at - Vec2::new(size.x, size.y / 2.0),
        TooltipDirection::Right => at - Vec2::new(0.0, size.y / 2.0),
        TooltipDirection::Center => at - size / 2.0,
    };
    Rect::from_min_size(min, size)
}

fn paint_box(painter: &Painter, rect: Rect, text: &str, style: &OverlayStyle, opacity: f32) {
    painter.rect_filled(
        rect,
        style.rounding,
        style.background_color.gamma_multiply(opacity),
    );
    painter.rect_stroke(
        rect,
        style.rounding,
        (style.border_width, style.border_color.gamma_multiply(opacity)),
    );
    painter.text(
        rect.shrink(style.padding).min,
        egui::Align2::LEFT_TOP,
        text,
        style.font_id.clone(),
        style.text_color.gamma_multiply(opacity),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_directions() {
        let size = Vec2::new(40.0, 20.0);
        let at = Pos2::new(100.0, 100.0);

        let top = place(size, at, TooltipDirection::Top);
        assert_eq!(top.center_bottom(), at);

        let bottom = place(size, at, TooltipDirection::Bottom);
        assert_eq!(bottom.center_top(), at);

        let center = place(size, at, TooltipDirection::Center);
        assert_eq!(center.center(), at);
    }
}
