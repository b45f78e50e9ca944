// Contract with the fixed-cell virtualized grid that renders a pane.
// The engine never draws; it only reads geometry and issues scroll commands.

/// Where the target row ends up after a programmatic scroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    /// Target row becomes the topmost visible row.
    #[default]
    Start,
    Center,
    End,
}

/// Geometry reported by the virtualized grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    /// Outer box width in pixels.
    pub width: f64,
    /// Outer box (viewport) height in pixels.
    pub height: f64,
    /// Fixed row height in pixels.
    pub row_height: f64,
    /// Cells per row.
    pub columns: usize,
}

impl GridGeometry {
    pub fn new(width: f64, height: f64, row_height: f64, columns: usize) -> Self {
        Self {
            width,
            height,
            row_height,
            columns,
        }
    }

    /// Number of rows that fit in the viewport, at least one.
    pub fn visible_rows(&self) -> usize {
        if self.row_height <= 0.0 {
            return 1;
        }
        ((self.height / self.row_height).floor() as usize).max(1)
    }
}

/// The off-the-shelf fixed-cell virtualized grid, seen from the engine.
///
/// Implementations wrap whatever windowing widget the host uses. A remount
/// (new widget instance) must change `instance_id`.
pub trait GridWidget {
    /// Identity of the currently mounted widget instance.
    fn instance_id(&self) -> u64;

    fn geometry(&self) -> GridGeometry;

    /// Current vertical scroll offset in pixels.
    fn scroll_top(&self) -> f64;

    /// Scrolls so that `row` lands at `align` within the viewport.
    fn scroll_to_row(&mut self, row: usize, align: Align);

    /// Scrolls to an absolute pixel offset.
    fn scroll_to_offset(&mut self, scroll_top: f64);

    /// Informs the widget of the total row count it should virtualize.
    fn set_row_count(&mut self, rows: usize);
}

/// Headless fixed-cell grid that tracks scroll state the way a windowing
/// widget does: offsets are clamped to the scrollable range.
///
/// Used by the CLI and by hosts that drive the engine without a real widget.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedCellGrid {
    instance_id: u64,
    geometry: GridGeometry,
    row_count: usize,
    scroll_top: f64,
}

impl FixedCellGrid {
    pub fn new(instance_id: u64, geometry: GridGeometry) -> Self {
        Self {
            instance_id,
            geometry,
            row_count: 0,
            scroll_top: 0.0,
        }
    }

    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Simulates a host-side resize. Like real windowing widgets, the scroll
    /// offset is re-clamped and so may be lost.
    pub fn resize(&mut self, width: f64, height: f64, columns: usize) {
        self.geometry.width = width;
        self.geometry.height = height;
        self.geometry.columns = columns;
        self.scroll_top = self.clamp(self.scroll_top);
    }

    /// Simulates a remount: new identity, offset reset to the top.
    pub fn remount(&mut self, instance_id: u64) {
        self.instance_id = instance_id;
        self.scroll_top = 0.0;
    }

    /// Top-most row currently visible.
    pub fn first_visible_row(&self) -> usize {
        if self.geometry.row_height <= 0.0 {
            return 0;
        }
        (self.scroll_top / self.geometry.row_height).floor() as usize
    }

    fn max_scroll_top(&self) -> f64 {
        let content = self.row_count as f64 * self.geometry.row_height;
        (content - self.geometry.height).max(0.0)
    }

    fn clamp(&self, scroll_top: f64) -> f64 {
        scroll_top.clamp(0.0, self.max_scroll_top())
    }
}

impl GridWidget for FixedCellGrid {
    fn instance_id(&self) -> u64 {
        self.instance_id
    }

    fn geometry(&self) -> GridGeometry {
        self.geometry
    }

    fn scroll_top(&self) -> f64 {
        self.scroll_top
    }

    fn scroll_to_row(&mut self, row: usize, align: Align) {
        let row_top = row as f64 * self.geometry.row_height;
        let target = match align {
            Align::Start => row_top,
            Align::Center => row_top - (self.geometry.height - self.geometry.row_height) / 2.0,
            Align::End => row_top - (self.geometry.height - self.geometry.row_height),
        };
        self.scroll_top = self.clamp(target);
    }

    fn scroll_to_offset(&mut self, scroll_top: f64) {
        self.scroll_top = self.clamp(scroll_top);
    }

    fn set_row_count(&mut self, rows: usize) {
        self.row_count = rows;
        self.scroll_top = self.clamp(self.scroll_top);
    }
}
