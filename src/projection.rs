// 🗺️ Coordinate Projector - grid ↔ isometric screen space
//
//   screenX = (x - y) * (W / 2)
//   screenY = (x + y) * (H / 2)
//
// Tiles and building sprites both go through `project`. Anything drawn on
// the map must be sorted with `depth_sort` first (painter's algorithm):
// nearer tiles have a larger x + y and must be drawn last.

use serde::{Deserialize, Serialize};

/// Zoom bounds of the map viewport
pub const MIN_ZOOM: f64 = 0.3;
pub const MAX_ZOOM: f64 = 3.0;

/// Zoom step applied by zoom in / zoom out
pub const ZOOM_STEP: f64 = 1.2;

// ============================================================================
// POINTS & TILE SIZE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridPoint {
    pub x: i32,
    pub y: i32,
}

impl GridPoint {
    pub fn new(x: i32, y: i32) -> Self {
        GridPoint { x, y }
    }

    /// Painter's-order key: (x + y) first, x breaks ties
    pub fn depth_key(&self) -> (i64, i32) {
        (self.x as i64 + self.y as i64, self.x)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileSize {
    pub width: f64,
    pub height: f64,
}

impl Default for TileSize {
    fn default() -> Self {
        // 2:1 diamond tiles
        TileSize {
            width: 64.0,
            height: 32.0,
        }
    }
}

// ============================================================================
// PROJECTION
// ============================================================================

/// Map a grid cell to its isometric screen position
pub fn project(point: GridPoint, tile: TileSize) -> ScreenPoint {
    let x = point.x as f64;
    let y = point.y as f64;

    ScreenPoint {
        x: (x - y) * (tile.width / 2.0),
        y: (x + y) * (tile.height / 2.0),
    }
}

/// Inverse of `project`, rounded to the nearest tile.
///
/// Returns `None` for points outside a `grid_size` × `grid_size` grid or
/// when the tile size is degenerate.
pub fn unproject(screen: ScreenPoint, tile: TileSize, grid_size: u32) -> Option<GridPoint> {
    let half_w = tile.width / 2.0;
    let half_h = tile.height / 2.0;

    if !(half_w.is_finite() && half_h.is_finite()) || half_w <= 0.0 || half_h <= 0.0 {
        return None;
    }
    if !(screen.x.is_finite() && screen.y.is_finite()) {
        return None;
    }

    // a = x - y, b = x + y
    let a = screen.x / half_w;
    let b = screen.y / half_h;

    let x = ((a + b) / 2.0).round();
    let y = ((b - a) / 2.0).round();

    let size = grid_size as f64;
    if x < 0.0 || y < 0.0 || x >= size || y >= size {
        return None;
    }

    Some(GridPoint::new(x as i32, y as i32))
}

/// Sort drawables into painter's order (farthest first)
pub fn depth_sort<T, F>(items: &mut [T], position: F)
where
    F: Fn(&T) -> GridPoint,
{
    items.sort_by_key(|item| position(item).depth_key());
}

// ============================================================================
// CAMERA
// ============================================================================

/// Viewport transform applied after projection (pan + zoom)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub offset_x: f64,
    pub offset_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Camera {
            offset_x: 0.0,
            offset_y: 0.0,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn new(offset_x: f64, offset_y: f64, zoom: f64) -> Self {
        Camera {
            offset_x,
            offset_y,
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn zoom_in(&mut self) {
        self.zoom = clamp_zoom(self.zoom * ZOOM_STEP);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = clamp_zoom(self.zoom / ZOOM_STEP);
    }

    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// World (projected) point → viewport point
    pub fn apply(&self, point: ScreenPoint) -> ScreenPoint {
        ScreenPoint {
            x: point.x * self.zoom + self.offset_x,
            y: point.y * self.zoom + self.offset_y,
        }
    }

    /// Viewport point → world (projected) point
    pub fn invert(&self, point: ScreenPoint) -> ScreenPoint {
        ScreenPoint {
            x: (point.x - self.offset_x) / self.zoom,
            y: (point.y - self.offset_y) / self.zoom,
        }
    }

    /// Grid cell under a viewport point (mouse picking)
    pub fn pick(&self, point: ScreenPoint, tile: TileSize, grid_size: u32) -> Option<GridPoint> {
        unproject(self.invert(point), tile, grid_size)
    }
}

fn clamp_zoom(zoom: f64) -> f64 {
    if !zoom.is_finite() {
        return 1.0;
    }
    zoom.clamp(MIN_ZOOM, MAX_ZOOM)
}
