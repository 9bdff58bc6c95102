//! Grid placement, viewport clamping, auto-alignment, and startup layout planning.

use crate::model::{Position, Size, Viewport, WindowId, WindowKind, WindowRecord};

/// Position given to windows created without one.
pub const NEW_WINDOW_POSITION: Position = Position::new(50, 50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutConfig {
    pub start_x: i32,
    pub start_y: i32,
    pub margin_x: i32,
    pub margin_y: i32,
    /// Height kept free at the bottom for the footer.
    pub footer_reserve: i32,
    /// Smallest gap kept between a window and the left/right viewport edges.
    pub min_margin: i32,
    pub window_size: Size,
    /// Top offset of the search and translation windows.
    pub default_window_y: i32,
    /// Half the width of the centered page title the default windows sit beside.
    pub title_half_width: i32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            start_x: 50,
            start_y: 200,
            margin_x: 20,
            margin_y: 20,
            footer_reserve: 80,
            min_margin: 20,
            window_size: Size::default(),
            default_window_y: 40,
            title_half_width: 200,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridShape {
    pub columns: i32,
    pub rows: i32,
}

impl LayoutConfig {
    pub fn grid_shape(&self, viewport: Viewport, size: Size) -> GridShape {
        let columns = (viewport.width - 2 * self.start_x) / (size.width + self.margin_x);
        let rows = (viewport.height - self.start_y - self.footer_reserve)
            / (size.height + self.margin_y);
        GridShape {
            columns: columns.max(1),
            rows: rows.max(1),
        }
    }
}

/// Row-major grid slot for the `index`-th window.
///
/// When a band of `columns x rows` fills up, the next window starts a new band to the right
/// of it. The result is clamped into the viewport.
pub fn compute_grid_slot(
    index: usize,
    viewport: Viewport,
    size: Size,
    config: &LayoutConfig,
) -> Position {
    let shape = config.grid_shape(viewport, size);
    let per_band = (shape.columns * shape.rows) as usize;
    let band = (index / per_band) as i32;
    let within = (index % per_band) as i32;
    let column = within % shape.columns;
    let row = within / shape.columns;

    let step_x = size.width + config.margin_x;
    let step_y = size.height + config.margin_y;
    let band_x = (config.start_x + band * shape.columns * step_x)
        .min(viewport.width - size.width - config.min_margin);

    clamp_to_viewport(
        Position::new(band_x + column * step_x, config.start_y + row * step_y),
        size,
        viewport,
        config,
    )
}

/// Clamps into `x in [min_margin, width - w - min_margin]` and
/// `y in [start_y, height - h - footer_reserve]`. The lower bound wins when the viewport is
/// too small for both.
pub fn clamp_to_viewport(
    position: Position,
    size: Size,
    viewport: Viewport,
    config: &LayoutConfig,
) -> Position {
    let max_x = viewport.width - size.width - config.min_margin;
    let max_y = viewport.height - size.height - config.footer_reserve;
    Position::new(
        position.x.min(max_x).max(config.min_margin),
        position.y.min(max_y).max(config.start_y),
    )
}

/// Clamp used while dragging: anywhere fully inside the viewport.
pub fn clamp_drag_position(position: Position, size: Size, viewport: Viewport) -> Position {
    Position::new(
        position.x.min(viewport.width - size.width).max(0),
        position.y.min(viewport.height - size.height).max(0),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignPlan {
    pub placements: Vec<(WindowId, Position)>,
    pub size: Size,
    pub shape: GridShape,
}

/// Re-flows every window through the grid in ascending id order, at the standard size.
pub fn auto_align(windows: &[WindowRecord], viewport: Viewport, config: &LayoutConfig) -> AlignPlan {
    let mut ids: Vec<WindowId> = windows.iter().map(|w| w.id).collect();
    ids.sort_unstable();
    let size = config.window_size;
    let placements = ids
        .into_iter()
        .enumerate()
        .map(|(index, id)| (id, compute_grid_slot(index, viewport, size, config)))
        .collect();
    AlignPlan {
        placements,
        size,
        shape: config.grid_shape(viewport, size),
    }
}

/// Positions for the search (left of the title) and translation (right of it) windows.
pub fn default_window_slots(viewport: Viewport, config: &LayoutConfig) -> (Position, Position) {
    let size = config.window_size;
    let center_x = viewport.width / 2;
    let left_x = center_x - config.title_half_width - size.width - config.margin_x;
    let right_x = center_x + config.title_half_width + config.margin_x;
    let clamp = |x: i32| {
        Position::new(
            x.min(viewport.width - size.width - config.min_margin)
                .max(config.min_margin),
            config
                .default_window_y
                .min(viewport.height - size.height)
                .max(0),
        )
    };
    (clamp(left_x), clamp(right_x))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartupPlacement {
    pub folder: String,
    pub position: Position,
    pub size: Size,
    /// Saved window to reuse, if one already backs the folder.
    pub existing: Option<WindowId>,
}

/// Placement for each folder at startup. Folders that already have a bookmark window keep
/// its saved position and size; the rest take consecutive grid slots.
pub fn plan_startup_layout(
    folders: &[String],
    existing: &[WindowRecord],
    viewport: Viewport,
    config: &LayoutConfig,
) -> Vec<StartupPlacement> {
    let mut next_slot = 0;
    folders
        .iter()
        .filter(|folder| !folder.trim().is_empty())
        .map(|folder| {
            let saved = existing
                .iter()
                .find(|w| w.kind == WindowKind::Bookmark && &w.folder == folder);
            match saved {
                Some(window) => StartupPlacement {
                    folder: folder.clone(),
                    position: window.position,
                    size: window.size,
                    existing: Some(window.id),
                },
                None => {
                    let position =
                        compute_grid_slot(next_slot, viewport, config.window_size, config);
                    next_slot += 1;
                    StartupPlacement {
                        folder: folder.clone(),
                        position,
                        size: config.window_size,
                        existing: None,
                    }
                }
            }
        })
        .collect()
}
