//! Viewport-synchronized marker layer.
//!
//! Owns a [`SceneGraph`] attached to a host map and keeps one sprite per marker in step with
//! the map's pan/zoom. Pointer interaction on sprites drives at most one open tooltip and one
//! open popup.
//!
//! The layer is driven from the UI thread. Call [`MarkerLayer::update`] once per frame (or
//! after any change of markers, map or assets) and feed pointer input through
//! [`MarkerLayer::handle_pointer`].

use crate::{
    core::{config::LayerConfig, geo::Point, map::MapInstanceId},
    input::{
        click::ClickTracker,
        events::{EventHandled, PointerInput, PointerKind, SpriteEvent},
    },
    layers::marker::{IconId, Marker, MarkerId},
    rendering::{
        assets::{load_registry, AssetManifest, AssetRegistry, AssetSource, AssetState, Texture},
        renderer::SpriteRenderer,
        scene::{SceneGraph, Sprite, SpriteId},
    },
    traits::{HostMap, ViewportAware},
    ui::overlay::{OverlayState, PopupData, TooltipData},
};
use fxhash::{FxHashMap, FxHashSet};
use std::sync::Arc;

const NO_ZOOM: &str = "no zoom found, give the host map an initial view before drawing markers";

/// Receives the id of a clicked marker
pub type ClickHandler = Box<dyn FnMut(&MarkerId)>;

struct Attachment {
    map_id: MapInstanceId,
    scene: SceneGraph,
    seen_revision: u64,
}

pub struct MarkerLayer {
    config: LayerConfig,
    assets: AssetState,
    attachment: Option<Attachment>,
    markers: Arc<[Marker]>,
    on_click: Option<ClickHandler>,
    overlays: OverlayState,
    clicks: FxHashMap<SpriteId, ClickTracker>,
    hovered: Option<SpriteId>,
    needs_apply: bool,
}

impl MarkerLayer {
    pub fn new(config: LayerConfig) -> Self {
        Self {
            config,
            assets: AssetState::Unloaded,
            attachment: None,
            markers: Arc::from(Vec::new()),
            on_click: None,
            overlays: OverlayState::new(),
            clicks: FxHashMap::default(),
            hovered: None,
            needs_apply: true,
        }
    }

    pub fn with_click_handler<F>(mut self, handler: F) -> Self
    where
        F: FnMut(&MarkerId) + 'static,
    {
        self.set_click_handler(handler);
        self
    }

    /// Installs the click callback; sprites are rewired on the next update
    pub fn set_click_handler<F>(&mut self, handler: F)
    where
        F: FnMut(&MarkerId) + 'static,
    {
        self.on_click = Some(Box::new(handler));
        self.needs_apply = true;
    }

    pub fn clear_click_handler(&mut self) {
        self.on_click = None;
        self.needs_apply = true;
    }

    pub fn config(&self) -> &LayerConfig {
        &self.config
    }

    pub fn asset_state(&self) -> &AssetState {
        &self.assets
    }

    /// Starts the one-time asset load; ignored unless the layer is still unloaded
    pub fn load_assets(&mut self, manifest: AssetManifest, source: Arc<dyn AssetSource>) -> bool {
        if !matches!(self.assets, AssetState::Unloaded) {
            return false;
        }
        let (sender, receiver) = crossbeam_channel::bounded(1);
        crate::runtime::spawn(async move {
            let result = load_registry(&manifest, source.as_ref()).await;
            // The layer may be gone by now; nothing depends on the result then
            let _ = sender.send(result);
        });
        self.assets = AssetState::Loading(receiver);
        true
    }

    /// Installs an already loaded registry; ignored unless the layer is still unloaded
    pub fn preload(&mut self, registry: AssetRegistry) -> bool {
        if !matches!(self.assets, AssetState::Unloaded) {
            return false;
        }
        self.assets = AssetState::Loaded(Arc::new(registry));
        self.needs_apply = true;
        true
    }

    /// Checks for a finished asset load; returns true when assets just became available
    pub fn poll_assets(&mut self) -> bool {
        let loaded = self.assets.poll();
        if loaded {
            self.needs_apply = true;
        }
        loaded
    }

    /// Replaces the whole marker set
    pub fn set_markers(&mut self, markers: impl Into<Arc<[Marker]>>) {
        self.markers = markers.into();
        self.needs_apply = true;
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn scene(&self) -> Option<&SceneGraph> {
        self.attachment.as_ref().map(|a| &a.scene)
    }

    pub fn sprite_count(&self) -> usize {
        self.scene().map_or(0, SceneGraph::len)
    }

    pub fn attached_map(&self) -> Option<MapInstanceId> {
        self.attachment.as_ref().map(|a| a.map_id)
    }

    pub fn open_tooltip(&self) -> Option<&TooltipData> {
        self.overlays.tooltip_data()
    }

    pub fn open_popup(&self) -> Option<&PopupData> {
        self.overlays.popup_data()
    }

    pub fn overlays(&self) -> &OverlayState {
        &self.overlays
    }

    /// Attaches a fresh scene graph to `map`, discarding the previous one and its overlays
    pub fn attach(&mut self, map: &mut dyn HostMap) -> bool {
        let Some(scene) = SceneGraph::new(map) else {
            log::error!("{}", NO_ZOOM);
            return false;
        };

        if let Some(mut previous) = self.attachment.take() {
            let removed = previous.scene.remove_children();
            log::debug!(
                "discarded {} sprites from map {:?}",
                removed,
                previous.map_id
            );
        }

        self.overlays.reset(map);
        self.clicks.clear();
        self.hovered = None;
        self.attachment = Some(Attachment {
            map_id: map.instance_id(),
            scene,
            seen_revision: map.view_revision(),
        });
        self.needs_apply = true;
        log::debug!("marker layer attached to map {:?}", map.instance_id());
        true
    }

    /// Removes all sprites and overlay widgets; a later update re-attaches
    pub fn detach(&mut self, map: &mut dyn HostMap) {
        if let Some(mut attachment) = self.attachment.take() {
            attachment.scene.remove_children();
        }
        self.overlays.clear(map);
        self.clicks.clear();
        self.hovered = None;
        self.needs_apply = true;
    }

    /// Per-frame driver: assets, map changes, marker application, redraws and overlays
    pub fn update(&mut self, map: &mut dyn HostMap, renderer: &mut dyn SpriteRenderer) {
        self.poll_assets();

        if map.zoom().is_none() {
            log::error!("{}", NO_ZOOM);
            return;
        }

        if self.attached_map() != Some(map.instance_id()) && !self.attach(map) {
            return;
        }

        let view_changed = self
            .attachment
            .as_ref()
            .is_some_and(|a| a.seen_revision != map.view_revision());

        if self.needs_apply {
            self.apply_markers(map, renderer);
        } else if view_changed {
            self.on_viewport_changed(map, renderer);
        }

        self.overlays.sync(map);
    }

    /// Rebuilds one sprite per marker, in marker order, and draws once.
    ///
    /// Without an attached scene or loaded assets this only clears the previous sprites.
    pub fn apply_markers(&mut self, map: &dyn HostMap, renderer: &mut dyn SpriteRenderer) {
        self.needs_apply = false;
        self.clicks.clear();

        // The hovered sprite is about to be discarded; its tooltip follows the rebuilt sprite
        let hovered_marker = match self.hovered.take() {
            Some(id) => self
                .scene()
                .and_then(|scene| scene.get(id))
                .map(|sprite| sprite.marker_id.clone()),
            None => None,
        };
        if hovered_marker.is_some() {
            self.overlays.set_tooltip(None);
        }

        let Self {
            config,
            assets,
            attachment,
            markers,
            on_click,
            overlays,
            hovered,
            ..
        } = self;

        let Some(attachment) = attachment.as_mut() else {
            return;
        };
        attachment.scene.remove_children();

        let AssetState::Loaded(registry) = assets else {
            return;
        };
        let Some(scale) = attachment.scene.scale(map) else {
            log::error!("{}", NO_ZOOM);
            return;
        };

        let clickable = on_click.is_some();
        let placeholder = Arc::new(Texture::empty());
        let mut missing: FxHashSet<IconId> = FxHashSet::default();

        for marker in markers.iter() {
            let texture = match registry.get(&marker.icon_id) {
                Some(texture) => texture.clone(),
                None => {
                    if missing.insert(marker.icon_id.clone()) {
                        log::debug!("icon {} is not in the asset registry", marker.icon_id);
                    }
                    placeholder.clone()
                }
            };

            let mut sprite = Sprite::new(marker.id.clone(), marker.icon_id.clone(), texture);
            sprite.anchor = marker.anchor.unwrap_or(config.default_anchor);
            sprite.position = attachment.scene.project(map, &marker.position);
            if let Some(angle) = marker.angle {
                sprite.rotation = angle;
            }
            sprite.scale = 1.0 / scale;

            // Several forced-open popups resolve to the last one in marker order
            if marker.popup_open {
                overlays.set_popup(Some(PopupData {
                    marker_id: marker.id.clone(),
                    offset: config.popup_offset,
                    position: marker.position,
                    content: marker.popup.clone(),
                }));
            }

            sprite.interactive = marker.is_interactive();
            sprite.bindings.click = marker.popup.is_some() && clickable;
            sprite.bindings.tooltip = marker.tooltip.as_ref().map(|text| TooltipData {
                marker_id: marker.id.clone(),
                offset: config.tooltip_offset,
                position: marker.position,
                content: text.clone(),
                options: marker.tooltip_options.clone().unwrap_or_default(),
            });

            attachment.scene.add_child(sprite);
        }

        attachment.scene.rebuild_index();
        attachment.seen_revision = map.view_revision();

        if let Some(marker_id) = hovered_marker {
            if let Some(sprite) = attachment
                .scene
                .children()
                .iter()
                .find(|s| s.interactive && s.marker_id == marker_id)
            {
                *hovered = Some(sprite.id());
                overlays.set_tooltip(sprite.bindings.tooltip.clone());
            }
        }

        draw(&attachment.scene, map, renderer);
    }

    /// Dispatches one event to a sprite
    pub fn handle_sprite_event(&mut self, id: SpriteId, event: SpriteEvent) -> EventHandled {
        let Some(sprite) = self.attachment.as_ref().and_then(|a| a.scene.get(id)) else {
            return EventHandled::NotHandled;
        };
        if !sprite.interactive {
            return EventHandled::NotHandled;
        }
        let marker_id = sprite.marker_id.clone();
        let clickable = sprite.bindings.click;
        let tooltip = sprite.bindings.tooltip.clone();

        match event {
            SpriteEvent::Down(kind) if clickable => {
                self.clicks.entry(id).or_default().press(kind);
            }
            SpriteEvent::Move(kind) if clickable => {
                if let Some(tracker) = self.clicks.get_mut(&id) {
                    tracker.moved(kind);
                }
            }
            SpriteEvent::Up(kind) if clickable => {
                let clicked = self
                    .clicks
                    .get_mut(&id)
                    .is_some_and(|tracker| tracker.release(kind, &self.config.click));
                if clicked {
                    log::debug!("marker {} clicked", marker_id);
                    if let Some(handler) = self.on_click.as_mut() {
                        handler(&marker_id);
                    }
                }
            }
            SpriteEvent::PointerEnter if tooltip.is_some() => {
                self.overlays.set_tooltip(tooltip);
            }
            SpriteEvent::PointerLeave if tooltip.is_some() => {
                self.overlays.set_tooltip(None);
            }
            _ => return EventHandled::NotHandled,
        }
        EventHandled::Handled
    }

    /// Topmost interactive sprite under a container point
    pub fn sprite_at(&self, map: &dyn HostMap, position: &Point) -> Option<SpriteId> {
        let scene = &self.attachment.as_ref()?.scene;
        let layer_point = scene.container_transform(map)?.invert(position);
        scene.hit_test(&layer_point)
    }

    /// Routes container-space pointer input to sprites, then syncs overlays on `map`
    pub fn handle_pointer(&mut self, input: PointerInput, map: &mut dyn HostMap) -> EventHandled {
        if self.attached_map() != Some(map.instance_id()) {
            self.overlays.release(map);
            return EventHandled::NotHandled;
        }

        let target = match input.position() {
            Some(position) => self.sprite_at(map, &position),
            None => None,
        };

        // Touch has no hover
        if input.kind() != Some(PointerKind::Touch) && self.hovered != target {
            if let Some(previous) = self.hovered.take() {
                self.handle_sprite_event(previous, SpriteEvent::PointerLeave);
            }
            if let Some(next) = target {
                self.handle_sprite_event(next, SpriteEvent::PointerEnter);
            }
            self.hovered = target;
        }

        let event = match input {
            PointerInput::Moved { kind, .. } => Some(SpriteEvent::Move(kind)),
            PointerInput::Pressed { kind, .. } => Some(SpriteEvent::Down(kind)),
            PointerInput::Released { kind, .. } => Some(SpriteEvent::Up(kind)),
            PointerInput::Left => None,
        };
        if let (Some(id), Some(event)) = (target, event) {
            self.handle_sprite_event(id, event);
        }

        self.overlays.sync(map);

        if target.is_some() {
            EventHandled::Handled
        } else {
            EventHandled::NotHandled
        }
    }

    /// Removes tooltip/popup widgets this layer left on a map it is no longer attached to.
    ///
    /// Switching maps through [`update`](Self::update) only sees the new map; widgets on the
    /// old one are removed here, by [`handle_pointer`](Self::handle_pointer) on that map, or when
    /// the layer attaches to it again.
    pub fn release_map(&mut self, map: &mut dyn HostMap) {
        self.overlays.release(map);
    }

    /// Pushes pending tooltip/popup changes to `map`
    pub fn sync_overlays(&mut self, map: &mut dyn HostMap) {
        self.overlays.sync(map);
    }
}

impl Default for MarkerLayer {
    fn default() -> Self {
        Self::new(LayerConfig::default())
    }
}

impl ViewportAware for MarkerLayer {
    /// Keeps icons at a constant pixel size under the new zoom and redraws
    fn on_viewport_changed(&mut self, map: &dyn HostMap, renderer: &mut dyn SpriteRenderer) {
        let Some(attachment) = self.attachment.as_mut() else {
            return;
        };
        let Some(scale) = attachment.scene.scale(map) else {
            log::error!("{}", NO_ZOOM);
            return;
        };
        attachment.scene.set_children_scale(1.0 / scale);
        attachment.seen_revision = map.view_revision();
        draw(&attachment.scene, map, renderer);
    }
}

fn draw(scene: &SceneGraph, map: &dyn HostMap, renderer: &mut dyn SpriteRenderer) {
    let Some(transform) = scene.container_transform(map) else {
        log::error!("{}", NO_ZOOM);
        return;
    };
    if let Err(e) = renderer.render(scene, &transform) {
        log::warn!("failed to draw {} marker sprites: {}", scene.len(), e);
    }
}
