use anyhow::Context as _;
use spritelet::{
    AssetManifest, AssetSource, AssetState, EguiSpriteRenderer, FileAssetSource, IconId,
    LatLng, LatLngBounds, Map, Marker, MarkerId, MarkerLayer, MarkerSource, MemoryAssetSource,
    OverlayStyle, Point, PointerInput, PointerKind,
};
use std::{cell::RefCell, path::Path, rc::Rc, sync::Arc};

const MARKER_COUNT: usize = 15_000;
const ICON: &str = "bluebird-arrow";
const ICON_SRC: &str = "/bluebird-arrow.png";
const ASSET_DIR: &str = "assets";

/// Standalone viewer rendering thousands of marker sprites
fn main() -> anyhow::Result<()> {
    spritelet::init_logging();

    let source = icon_source()?;
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Spritelet - Marker Sprites"),
        ..Default::default()
    };

    eframe::run_native(
        "spritelet-app",
        options,
        Box::new(move |_cc| Box::new(SpriteletApp::new(source))),
    )
    .map_err(|e| anyhow::anyhow!("viewer exited with an error: {}", e))?;

    Ok(())
}

/// Reads the icon from disk when present, otherwise draws one in memory
fn icon_source() -> anyhow::Result<Arc<dyn AssetSource>> {
    let on_disk = Path::new(ASSET_DIR).join(ICON_SRC.trim_start_matches('/'));
    if on_disk.exists() {
        log::info!("using icon {}", on_disk.display());
        return Ok(Arc::new(FileAssetSource::new(ASSET_DIR)));
    }

    log::info!("{} not found, generating the icon", on_disk.display());
    let bytes = arrow_png(25, 41).context("failed to encode the generated icon")?;
    Ok(Arc::new(MemoryAssetSource::new().with_file(ICON_SRC, bytes)))
}

/// A filled downward-pointing arrow whose tip sits on the bottom edge
fn arrow_png(width: u32, height: u32) -> anyhow::Result<Vec<u8>> {
    let fill = image::Rgba([41, 121, 255, 255]);
    let clear = image::Rgba([0, 0, 0, 0]);
    let head = height as f32 * 0.45;
    let half = width as f32 / 2.0;

    let icon = image::RgbaImage::from_fn(width, height, |x, y| {
        let dx = (x as f32 + 0.5 - half).abs();
        let y = y as f32 + 0.5;
        let inside = if y < height as f32 - head {
            dx <= width as f32 * 0.18
        } else {
            dx <= half * (height as f32 - y) / head
        };
        if inside {
            fill
        } else {
            clear
        }
    });

    let mut bytes = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(icon).write_to(&mut bytes, image::ImageOutputFormat::Png)?;
    Ok(bytes.into_inner())
}

struct SpriteletApp {
    map: Map,
    layer: MarkerLayer,
    renderer: EguiSpriteRenderer,
    style: OverlayStyle,
    points: Vec<Marker>,
    open_popup: Option<MarkerId>,
    clicked: Rc<RefCell<Option<MarkerId>>>,
    pointer_inside: bool,
}

impl SpriteletApp {
    fn new(source: Arc<dyn AssetSource>) -> Self {
        let map = Map::with_view(
            LatLng::new(-6.1592, 106.8456),
            13.0,
            Point::new(1200.0, 800.0),
        )
        .with_zoom_limits(1.0, 18.0);

        let bounds = LatLngBounds::from_coords(-6.5, 106.0, -6.0, 107.0);
        let points = MarkerSource::new(bounds)
            .generate(MARKER_COUNT)
            .into_iter()
            .map(|generated| {
                generated
                    .into_marker(IconId::new(ICON))
                    .with_tooltip(generated.position.to_string())
                    .with_popup("this is a popup")
            })
            .collect();

        let clicked = Rc::new(RefCell::new(None));
        let sink = clicked.clone();
        let mut layer = MarkerLayer::default().with_click_handler(move |id: &MarkerId| {
            *sink.borrow_mut() = Some(id.clone());
        });
        layer.load_assets(AssetManifest::new().with_asset(ICON, ICON_SRC), source);

        let mut app = Self {
            map,
            layer,
            renderer: EguiSpriteRenderer::new(),
            style: OverlayStyle::default(),
            points,
            open_popup: None,
            clicked,
            pointer_inside: false,
        };
        app.push_markers();
        app
    }

    /// Rebuilds the marker set with the selected popup forced open
    fn push_markers(&mut self) {
        let open = self.open_popup.as_ref();
        let markers: Vec<Marker> = self
            .points
            .iter()
            .map(|marker| {
                let forced = open == Some(&marker.id);
                marker.clone().with_popup_open(forced)
            })
            .collect();
        self.layer.set_markers(markers);
    }

    fn handle_view_input(&mut self, ui: &egui::Ui, rect: egui::Rect, response: &egui::Response) {
        if response.dragged() {
            let delta = response.drag_delta();
            self.map.pan_by(Point::new(delta.x as f64, delta.y as f64));
        }

        if response.hovered() {
            let (scroll, hover) = ui.input(|i| (i.raw_scroll_delta.y, i.pointer.hover_pos()));
            if scroll != 0.0 {
                if let Some(zoom) = self.map.viewport().map(|v| v.zoom) {
                    let focus = hover.map(|pos| {
                        let local = pos - rect.min;
                        Point::new(local.x as f64, local.y as f64)
                    });
                    self.map.zoom_to(zoom + scroll as f64 / 120.0, focus);
                }
            }
        }
    }

    fn handle_marker_input(&mut self, ui: &egui::Ui, rect: egui::Rect) {
        let (hover, pressed, released, moved, touch) = ui.input(|i| {
            (
                i.pointer.hover_pos(),
                i.pointer.primary_pressed(),
                i.pointer.primary_released(),
                i.pointer.delta() != egui::Vec2::ZERO,
                i.any_touches(),
            )
        });
        let kind = if touch {
            PointerKind::Touch
        } else {
            PointerKind::Mouse
        };

        let Some(pos) = hover.filter(|pos| rect.contains(*pos)) else {
            if std::mem::take(&mut self.pointer_inside) {
                self.layer.handle_pointer(PointerInput::Left, &mut self.map);
            }
            return;
        };
        self.pointer_inside = true;

        let local = pos - rect.min;
        let position = Point::new(local.x as f64, local.y as f64);
        let mut inputs = Vec::with_capacity(3);
        if pressed {
            inputs.push(PointerInput::Pressed { position, kind });
        }
        if moved || (!pressed && !released) {
            inputs.push(PointerInput::Moved { position, kind });
        }
        if released {
            inputs.push(PointerInput::Released { position, kind });
        }
        for input in inputs {
            self.layer.handle_pointer(input, &mut self.map);
        }

        let clicked = self.clicked.borrow_mut().take();
        if let Some(id) = clicked {
            log::info!("marker {} clicked", id);
            if self.open_popup.as_ref() != Some(&id) {
                self.open_popup = Some(id);
                self.push_markers();
            }
        }
    }

    fn status_bar(&self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(viewport) = self.map.viewport() {
                ui.label(format!(
                    "Center: {:.4}, {:.4} | Zoom: {:.2}",
                    viewport.center.lat, viewport.center.lng, viewport.zoom
                ));
            }
            ui.separator();
            ui.label(format!("Sprites: {}", self.layer.sprite_count()));
            ui.separator();
            match self.layer.asset_state() {
                AssetState::Loaded(_) => ui.label("Icons loaded"),
                AssetState::Failed(e) => ui.colored_label(egui::Color32::RED, e.as_str()),
                _ => ui.label("Loading icons..."),
            };
            if let Some(popup) = self.layer.open_popup() {
                ui.separator();
                ui.label(format!("Popup: marker {}", popup.marker_id));
            }
        });
    }
}

impl eframe::App for SpriteletApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("status_bar").show(ctx, |ui| self.status_bar(ui));

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_rgb(230, 230, 230)))
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_exact_size(ui.available_size(), egui::Sense::click_and_drag());
                self.map
                    .resize(Point::new(rect.width() as f64, rect.height() as f64));

                self.handle_view_input(ui, rect, &response);
                self.handle_marker_input(ui, rect);
                self.layer.update(&mut self.map, &mut self.renderer);

                if !self.renderer.is_uploaded() {
                    if let Some(registry) = self.layer.asset_state().registry() {
                        self.renderer.upload(ctx, registry);
                    }
                }

                let painter = ui.painter_at(rect);
                self.renderer.paint(&painter, rect);
                spritelet::paint_overlays(&painter, rect, &self.map, &self.style);
            });

        if matches!(self.layer.asset_state(), AssetState::Loading(_)) {
            ctx.request_repaint();
        }
    }
}
