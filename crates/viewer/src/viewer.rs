//! The embedding facade.
//!
//! A [`Viewer`] owns the whole engine state for one sky view: view and zoom,
//! the image layer stack, overlays, the tile buffer and downloader, and the
//! per-tick event bus. The embedder drives it with pointer events and a
//! `tick(now, fetcher)` call per display frame; a tick that has nothing to
//! draw returns `None`.
//!
//! Compositing order is fixed: image layers bottom to top, then grid,
//! catalogs, footprints, the selection preview, and the reticle.

use foundation::math::frames::CooFrame;
use foundation::math::projection::ProjectionKind;
use foundation::math::sphere::LonLat;
use foundation::math::vec::Vec2;
use foundation::time::Time;

use gpu::backend::{BackendError, RenderBackend};
use gpu::commands::{Color, RenderCommand, RenderFrame};
use healpix::cache::{BASE_ORDER, CornerCache};
use layers::catalog::Catalog;
use layers::footprint::Footprint;
use layers::grid::{GridCfg, GridLabel, build_grid};
use layers::stack::LayerStack;
use layers::survey::Survey;
use runtime::budget::FrameBudget;
use runtime::event_bus::{Event, EventBus, ViewerEvent};
use runtime::frame::Frame;
use runtime::redraw::RedrawScheduler;
use scene::selector::{PointerEvent, Region, SelectionKind, Selector, SelectorUpdate};
use scene::traversal::{SubRect, TileDraw, traverse};
use scene::view::ViewState;
use scene::zoom::{self, LevelStepper, MAX_IDX_DELTA_PER_THROTTLE, ZoomAnimation};
use streaming::allsky::allsky_rect;
use streaming::buffer::{NB_MAX_TILES, TileBuffer};
use streaming::downloader::{Downloader, FetchOutcome, TileFetcher};
use streaming::properties::{PropertiesError, parse_properties};
use streaming::tile::TileState;

/// Draw commands allowed per tick.
pub const FRAME_BUDGET_UNITS: u32 = 2000;

/// Duration of programmatic zoom animations.
pub const ZOOM_ANIMATION_S: f64 = 0.3;

/// The allsky mosaic backs the view only up to this display order.
pub const ALLSKY_MAX_ORDER: u8 = 6;

/// Slack added to the deferred redraw after the tile-request interval.
const REDRAW_SLACK_S: f64 = 0.01;

/// Pointer travel below this is a click, not a pan.
const CLICK_SLOP_PX: f64 = 5.0;

pub struct Viewer {
    view: ViewState,
    stack: LayerStack,
    catalogs: Vec<Catalog>,
    footprints: Vec<Footprint>,
    grid: GridCfg,
    grid_labels: Vec<GridLabel>,
    selector: Selector,
    last_selection: Option<Region>,
    reticle: bool,
    tiles: TileBuffer,
    downloader: Downloader,
    corners: CornerCache,
    events: EventBus,
    redraw: RedrawScheduler,
    frame: Frame,
    started: bool,
    zoom_anim: Option<ZoomAnimation>,
    stepper: LevelStepper,
    drag_last: Option<Vec2>,
    drag_travel: f64,
}

impl Viewer {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            view: ViewState::new(width, height),
            stack: LayerStack::new(),
            catalogs: Vec::new(),
            footprints: Vec::new(),
            grid: GridCfg::default(),
            grid_labels: Vec::new(),
            selector: Selector::new(),
            last_selection: None,
            reticle: true,
            tiles: TileBuffer::new(NB_MAX_TILES),
            downloader: Downloader::new(),
            corners: CornerCache::new(),
            events: EventBus::new(),
            redraw: RedrawScheduler::new(),
            frame: Frame::first(Time::ZERO),
            started: false,
            zoom_anim: None,
            stepper: LevelStepper::new(),
            drag_last: None,
            drag_travel: 0.0,
        }
    }

    // ---- view ----------------------------------------------------------

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.view.resize(width, height);
        self.redraw.request_redraw();
    }

    pub fn point_to(&mut self, lon_deg: f64, lat_deg: f64) {
        self.view.point_to(LonLat::new(lon_deg, lat_deg));
        self.emit(ViewerEvent::PositionChanged {
            center: self.view.center(),
        });
        self.redraw.request_redraw();
    }

    /// Sets the fov directly, dropping any zoom animation in flight.
    pub fn set_fov(&mut self, fov_deg: f64) {
        self.zoom_anim = None;
        self.stepper.reset();
        self.view.set_fov(fov_deg);
        self.emit(ViewerEvent::ZoomChanged {
            fov_deg: self.view.fov_deg(),
        });
        self.redraw.request_redraw();
    }

    pub fn zoom_in(&mut self, now: Time) {
        let target = self.view.fov_deg() / 3.0;
        self.animate_fov_to(target, now);
    }

    pub fn zoom_out(&mut self, now: Time) {
        let target = self.view.fov_deg() * 3.0;
        self.animate_fov_to(target, now);
    }

    /// Wheel zoom: steps through the discrete level table, throttled to two
    /// steps per event, then animates to the chosen level.
    pub fn wheel_zoom(&mut self, steps: i32, now: Time) {
        let steps = steps.clamp(-MAX_IDX_DELTA_PER_THROTTLE, MAX_IDX_DELTA_PER_THROTTLE);
        let current = self
            .zoom_anim
            .as_ref()
            .map_or(self.view.fov_deg(), |a| a.target());
        let target = self.stepper.step(current, steps);
        self.animate_fov_to(target, now);
    }

    fn animate_fov_to(&mut self, target_fov: f64, now: Time) {
        let limit = self.view.projection_kind().fov_limit_deg();
        let target = target_fov.clamp(zoom::min_fov(), limit);
        match &mut self.zoom_anim {
            Some(anim) => anim.retarget(target, now),
            None => {
                self.zoom_anim = Some(ZoomAnimation::start(
                    self.view.fov_deg(),
                    target,
                    now,
                    ZOOM_ANIMATION_S,
                ));
            }
        }
        self.redraw.request_redraw();
    }

    pub fn set_projection(&mut self, kind: ProjectionKind) {
        self.view.set_projection(kind);
        self.emit(ViewerEvent::ProjectionChanged { kind });
        self.redraw.request_redraw();
    }

    pub fn set_frame(&mut self, frame: CooFrame) {
        self.view.set_frame(frame);
        self.emit(ViewerEvent::FrameChanged { frame });
        self.redraw.request_redraw();
    }

    // ---- layers --------------------------------------------------------

    /// Registers an image layer from its fetched `properties` document.
    ///
    /// A parse failure leaves no trace of the layer in the stack; losing
    /// the base layer this way raises the empty flag.
    pub fn add_image_layer(
        &mut self,
        name: &str,
        root_url: &str,
        properties_text: &str,
    ) -> Result<(), PropertiesError> {
        match parse_properties(properties_text) {
            Ok(props) => {
                let survey = Survey::from_properties(name, root_url, &props);
                self.stack.set_layer(survey);
                self.emit(ViewerEvent::LayerAdded {
                    name: name.to_owned(),
                });
                self.redraw.request_redraw();
                Ok(())
            }
            Err(err) => {
                self.stack.mark_load_failure(name);
                self.emit(ViewerEvent::LayerError {
                    name: name.to_owned(),
                    message: err.to_string(),
                });
                Err(err)
            }
        }
    }

    pub fn remove_image_layer(&mut self, name: &str) -> bool {
        let removed = self.stack.remove_layer(name);
        if removed {
            self.emit(ViewerEvent::LayerRemoved {
                name: name.to_owned(),
            });
            self.redraw.request_redraw();
        }
        removed
    }

    pub fn layers(&self) -> &LayerStack {
        &self.stack
    }

    pub fn layers_mut(&mut self) -> &mut LayerStack {
        &mut self.stack
    }

    /// True when there is no base imagery to show; the embedder displays
    /// its fallback.
    pub fn is_empty(&self) -> bool {
        self.stack.empty_flag()
    }

    // ---- overlays ------------------------------------------------------

    pub fn add_catalog(&mut self, catalog: Catalog) {
        self.emit(ViewerEvent::LayerAdded {
            name: catalog.name().to_owned(),
        });
        self.catalogs.push(catalog);
        self.redraw.request_redraw();
    }

    pub fn remove_catalog(&mut self, name: &str) -> bool {
        let Some(i) = self.catalogs.iter().position(|c| c.name() == name) else {
            return false;
        };
        self.catalogs.remove(i);
        self.emit(ViewerEvent::LayerRemoved {
            name: name.to_owned(),
        });
        self.redraw.request_redraw();
        true
    }

    pub fn add_footprint(&mut self, footprint: Footprint) {
        self.footprints.push(footprint);
        self.redraw.request_redraw();
    }

    pub fn remove_footprint(&mut self, name: &str) -> bool {
        let Some(i) = self.footprints.iter().position(|f| f.name() == name) else {
            return false;
        };
        self.footprints.remove(i);
        self.redraw.request_redraw();
        true
    }

    pub fn set_grid(&mut self, cfg: GridCfg) {
        self.grid = cfg;
        self.redraw.request_redraw();
    }

    /// Edge labels of the grid drawn by the last tick.
    pub fn grid_labels(&self) -> &[GridLabel] {
        &self.grid_labels
    }

    pub fn set_reticle(&mut self, on: bool) {
        self.reticle = on;
        self.redraw.request_redraw();
    }

    // ---- selection and pointer -----------------------------------------

    pub fn start_selection(&mut self, kind: SelectionKind) {
        self.selector.arm(kind);
    }

    pub fn cancel_selection(&mut self) {
        if self.selector.handle(PointerEvent::Cancel) == SelectorUpdate::Cancelled {
            self.redraw.request_redraw();
        }
        self.selector.disarm();
    }

    pub fn selection_region(&self) -> Option<&Region> {
        self.last_selection.as_ref()
    }

    /// Routes a pointer event. The selector owns input while armed;
    /// otherwise dragging pans, a click picks, a double click recenters.
    pub fn pointer(&mut self, event: PointerEvent) {
        if self.selector.is_active() {
            match self.selector.handle(event) {
                SelectorUpdate::None => {}
                SelectorUpdate::Redraw => self.redraw.request_redraw(),
                SelectorUpdate::Done(region) => {
                    let vertex_count = match &region {
                        Region::Rect { .. } => 4,
                        Region::Circle { .. } => 1,
                        Region::Polygon { vertices } => vertices.len(),
                    };
                    self.last_selection = Some(region);
                    self.emit(ViewerEvent::SelectionDone { vertex_count });
                    self.redraw.request_redraw();
                }
                SelectorUpdate::Cancelled => self.redraw.request_redraw(),
            }
            return;
        }

        match event {
            PointerEvent::Down(p) => {
                self.drag_last = Some(p);
                self.drag_travel = 0.0;
            }
            PointerEvent::Move(p) => {
                if let Some(last) = self.drag_last {
                    self.drag_travel += (p - last).length();
                    if let Some(center) = self.view.drag_center(last, p) {
                        self.view.point_to(center);
                        self.emit(ViewerEvent::PositionChanged {
                            center: self.view.center(),
                        });
                        self.redraw.request_redraw();
                    }
                    self.drag_last = Some(p);
                }
            }
            PointerEvent::Up(p) => {
                if self.drag_last.is_some() && self.drag_travel < CLICK_SLOP_PX {
                    self.click(p);
                }
                self.drag_last = None;
            }
            PointerEvent::DoubleClick(p) => {
                if let Some(target) = self.view.unproject(p) {
                    self.view.point_to(target);
                    self.emit(ViewerEvent::PositionChanged {
                        center: self.view.center(),
                    });
                    self.redraw.request_redraw();
                }
            }
            PointerEvent::Cancel => {
                self.drag_last = None;
            }
        }
    }

    /// Hit-tests the catalogs, topmost first.
    fn click(&mut self, cursor: Vec2) {
        let hit = self.catalogs.iter().rev().find_map(|catalog| {
            catalog
                .hit_test(&self.view, cursor)
                .map(|h| (catalog.name().to_owned(), h.source_index))
        });
        if let Some((layer, source_index)) = hit {
            self.emit(ViewerEvent::ObjectClicked {
                layer,
                source_index,
            });
        }
    }

    // ---- tiles ---------------------------------------------------------

    /// Completion callback for a transfer started through the fetcher.
    /// Stale completions for evicted tiles are dropped here.
    pub fn on_tile_loaded(&mut self, url: &str, outcome: FetchOutcome) {
        let known = self.downloader.complete(url);
        if !known && !self.tiles.contains(url) {
            return;
        }
        let success = match outcome {
            FetchOutcome::Success { width, height } => {
                let stored = self.tiles.mark_ready(url, width, height);
                if stored && url.contains("/Npix") {
                    for survey in self.stack.iter_mut() {
                        if url.starts_with(survey.root_url()) {
                            survey.note_tile_width(width);
                        }
                    }
                }
                stored
            }
            FetchOutcome::Failure => {
                self.tiles.mark_errored(url);
                false
            }
        };
        self.emit(ViewerEvent::TileLoaded {
            url: url.to_owned(),
            success,
        });
        self.redraw.request_redraw();
    }

    // ---- events --------------------------------------------------------

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    fn emit(&mut self, kind: ViewerEvent) {
        self.events.emit(self.frame, kind);
    }

    // ---- tick ----------------------------------------------------------

    /// One cooperative tick. Advances animations, decides whether a redraw
    /// is due, and if so composites a [`RenderFrame`].
    pub fn tick(&mut self, now: Time, fetcher: &mut dyn TileFetcher) -> Option<RenderFrame> {
        let sampled = self.zoom_anim.as_ref().map(|anim| anim.sample(now));
        if let Some((fov, done)) = sampled {
            self.view.set_fov(fov);
            self.emit(ViewerEvent::ZoomChanged {
                fov_deg: self.view.fov_deg(),
            });
            if done {
                self.zoom_anim = None;
            }
            // The animation keeps the redraw loop alive until it lands.
            self.redraw.request_redraw();
        }

        if !self.redraw.take_redraw(now) {
            return None;
        }

        self.frame = if self.started {
            self.frame.next(now)
        } else {
            self.started = true;
            Frame::first(now)
        };

        let mut rf = RenderFrame::new(self.frame.index);
        let mut budget = FrameBudget::new(FRAME_BUDGET_UNITS);

        self.composite_image_layers(now, &mut rf, &mut budget);
        self.downloader.start_ready(fetcher);
        self.composite_overlays(&mut rf, &mut budget);

        Some(rf)
    }

    /// Submits one tick's output to a backend, if the tick drew.
    pub fn tick_into(
        &mut self,
        now: Time,
        fetcher: &mut dyn TileFetcher,
        backend: &mut dyn RenderBackend,
    ) -> Result<bool, BackendError> {
        let Some(rf) = self.tick(now, fetcher) else {
            return Ok(false);
        };
        let viewport = self.view.viewport();
        backend.begin_frame(viewport.width, viewport.height);
        backend.submit(&rf)?;
        Ok(true)
    }

    fn composite_image_layers(&mut self, now: Time, rf: &mut RenderFrame, budget: &mut FrameBudget) {
        let mut deferred_redraw = false;
        let mut geometry_errors = Vec::new();

        for survey in self.stack.iter_mut() {
            let entry_order = self
                .view
                .display_order(survey.tile_width())
                .min(survey.max_order());

            if entry_order <= ALLSKY_MAX_ORDER {
                allsky_pass(
                    &self.view,
                    survey,
                    &mut self.tiles,
                    &mut self.downloader,
                    &mut self.corners,
                    rf,
                    budget,
                );
            }

            let allow = survey.allow_tile_requests(now);
            let out = traverse(
                &self.view,
                &survey.geometry(),
                entry_order,
                &mut self.corners,
                &self.tiles,
                allow,
            );

            for err in &out.geometry_errors {
                geometry_errors.push((err.order, err.ipix));
            }

            for draw in out.draws {
                if !push_tile(rf, budget, survey, draw) {
                    break;
                }
            }

            if !out.requests.is_empty() {
                for (i, url) in out.requests.iter().enumerate() {
                    self.tiles.add_tile(url);
                    self.downloader.request(url, i as i32);
                }
                survey.note_tile_requests(now);
                deferred_redraw = true;
            }
        }

        for (order, ipix) in geometry_errors {
            self.emit(ViewerEvent::GeometryError { order, ipix });
        }
        if deferred_redraw {
            self.redraw.request_redraw_at(
                now.plus_seconds(layers::survey::TILE_REQUEST_INTERVAL_S + REDRAW_SLACK_S),
            );
        }
    }

    fn composite_overlays(&mut self, rf: &mut RenderFrame, budget: &mut FrameBudget) {
        let grid_draw = build_grid(&self.view, &self.grid);
        self.grid_labels = grid_draw.labels;
        let grid_color = Color::rgba(
            self.grid.color[0],
            self.grid.color[1],
            self.grid.color[2],
            self.grid.color[3],
        );
        for points in grid_draw.polylines {
            if !push(rf, budget, RenderCommand::Polyline {
                points,
                color: grid_color,
                width_px: 1.0,
                closed: false,
            }) {
                return;
            }
        }

        for catalog in &self.catalogs {
            if !catalog.is_visible() {
                continue;
            }
            let points: Vec<Vec2> = catalog
                .project_markers(&self.view)
                .into_iter()
                .map(|m| m.px)
                .collect();
            if points.is_empty() {
                continue;
            }
            if !push(rf, budget, RenderCommand::Markers {
                points,
                color: catalog.color,
                size_px: catalog.marker_size_px,
            }) {
                return;
            }
        }

        for footprint in &self.footprints {
            let draw = footprint.project(&self.view);
            if !draw.fill_indices.is_empty()
                && !push(rf, budget, RenderCommand::FillTriangles {
                    vertices: draw.fill_vertices,
                    indices: draw.fill_indices,
                    color: footprint.color,
                })
            {
                return;
            }
            for points in draw.outlines {
                if !push(rf, budget, RenderCommand::Polyline {
                    points,
                    color: footprint.color,
                    width_px: 1.5,
                    closed: true,
                }) {
                    return;
                }
            }
        }

        if let Some(region) = self.selector.preview()
            && !push_selection(rf, budget, &region)
        {
            return;
        }

        if self.reticle
            && let Some(center_px) = self.view.project(self.view.center())
        {
            push(rf, budget, RenderCommand::Reticle {
                center: center_px,
                color: Color::WHITE,
                size_px: 20.0,
            });
        }
    }
}

/// Draws the allsky mosaic under the tiles: every visible order-3 cell is
/// textured from its sub-tile of the mosaic. Requests the mosaic when it is
/// not resident yet.
fn allsky_pass(
    view: &ViewState,
    survey: &Survey,
    tiles: &mut TileBuffer,
    downloader: &mut Downloader,
    corners: &mut CornerCache,
    rf: &mut RenderFrame,
    budget: &mut FrameBudget,
) {
    let url = survey.allsky_url();
    match tiles.state(&url) {
        Some(TileState::Ready { width, .. }) => {
            let mosaic_width = f64::from(width);
            for cell in view.visible_cells(BASE_ORDER, survey.frame(), corners) {
                // Cells wrapped around the projection seam would smear the
                // mosaic across the map; the traversal reports them.
                if view.quad_wraps_seam(&cell.corners) {
                    continue;
                }
                let Some(rect) = allsky_rect(cell.ipix, width) else {
                    continue;
                };
                let sub_rect = SubRect {
                    u0: f64::from(rect.dx) / mosaic_width,
                    v0: f64::from(rect.dy) / mosaic_width,
                    scale: f64::from(rect.size) / mosaic_width,
                };
                if !push(rf, budget, RenderCommand::TexturedTile {
                    layer: survey.name().to_owned(),
                    url: url.clone(),
                    corners: cell.corners,
                    sub_rect,
                    opacity: survey.opacity(),
                    blend: survey.blend(),
                }) {
                    return;
                }
            }
        }
        Some(_) => {}
        None => {
            tiles.add_tile(&url);
            // Ahead of every tile request.
            downloader.request(&url, -1);
        }
    }
}

fn push(rf: &mut RenderFrame, budget: &mut FrameBudget, cmd: RenderCommand) -> bool {
    if budget.try_consume(1) {
        rf.commands.push(cmd);
        true
    } else {
        rf.truncated = true;
        false
    }
}

fn push_tile(rf: &mut RenderFrame, budget: &mut FrameBudget, survey: &Survey, draw: TileDraw) -> bool {
    push(rf, budget, RenderCommand::TexturedTile {
        layer: survey.name().to_owned(),
        url: draw.tex_url,
        corners: draw.corners,
        sub_rect: draw.sub_rect,
        opacity: survey.opacity(),
        blend: survey.blend(),
    })
}

fn push_selection(rf: &mut RenderFrame, budget: &mut FrameBudget, region: &Region) -> bool {
    let color = Color::rgba(1.0, 1.0, 0.3, 0.9);
    let (points, closed) = match region {
        Region::Rect { x, y, w, h } => (
            vec![
                Vec2::new(*x, *y),
                Vec2::new(x + w, *y),
                Vec2::new(x + w, y + h),
                Vec2::new(*x, y + h),
            ],
            true,
        ),
        Region::Circle { cx, cy, r } => {
            let mut points = Vec::with_capacity(64);
            for i in 0..64 {
                let a = std::f64::consts::TAU * i as f64 / 64.0;
                points.push(Vec2::new(cx + r * a.cos(), cy + r * a.sin()));
            }
            (points, true)
        }
        Region::Polygon { vertices } => (vertices.clone(), false),
    };
    push(rf, budget, RenderCommand::Polyline {
        points,
        color,
        width_px: 1.0,
        closed,
    })
}
