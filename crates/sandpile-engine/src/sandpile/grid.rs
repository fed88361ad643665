//! CPU model of the sandpile grid.
//!
//! The GPU owns the live state; this type describes its shape, produces the
//! seed pattern uploaded into both state buffers, and carries a reference
//! implementation of the toppling rule that `sandpile.frag.wgsl` mirrors.

/// Number of von Neumann neighbours; also the grains a toppling cell loses.
pub const NEIGHBOURS: u32 = 4;

/// Height at which a cell topples.
pub const TOPPLE_THRESHOLD: u32 = 4;

/// Distinct values of the seed pattern (`k mod SEED_STATES`).
pub const SEED_STATES: u32 = 5;

/// What happens at the border of the grid.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Edges {
    /// The grid is a torus; grains are conserved.
    Wrap,
    /// Grains toppled across the border are lost.
    Open,
}

/// Toppling rule parameters.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Rule {
    threshold: u32,
    edges: Edges,
}

impl Rule {
    /// A toppling cell always sheds [`NEIGHBOURS`] grains, so thresholds
    /// below that are raised to it.
    pub fn new(threshold: u32, edges: Edges) -> Self {
        if threshold < NEIGHBOURS {
            log::warn!("topple threshold {threshold} raised to {NEIGHBOURS}");
        }
        Self {
            threshold: threshold.max(NEIGHBOURS),
            edges,
        }
    }

    /// Height at which a cell topples.
    pub fn threshold(self) -> u32 {
        self.threshold
    }

    pub fn edges(self) -> Edges {
        self.edges
    }
}

impl Default for Rule {
    fn default() -> Self {
        Self::new(TOPPLE_THRESHOLD, Edges::Wrap)
    }
}

/// Grid dimensions in cells.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct GridSize {
    pub width: u32,
    pub height: u32,
}

impl GridSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn cell_count(self) -> usize {
        (self.width * self.height) as usize
    }

    pub fn extent(self) -> wgpu::Extent3d {
        wgpu::Extent3d {
            width: self.width,
            height: self.height,
            depth_or_array_layers: 1,
        }
    }

    /// Dimensions as the `vec2<f32>` the simulation shader receives.
    pub fn as_vec2(self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

impl Default for GridSize {
    fn default() -> Self {
        Self::new(16, 16)
    }
}

/// Row-major grid of cell heights.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Grid {
    size: GridSize,
    cells: Vec<u32>,
}

impl Grid {
    /// Deterministic seed: the cell at linear index `k` holds `k mod 5`.
    pub fn seeded(size: GridSize) -> Self {
        let cells = (0..size.cell_count() as u32)
            .map(|k| k % SEED_STATES)
            .collect();
        Self { size, cells }
    }

    pub fn from_cells(size: GridSize, cells: Vec<u32>) -> Self {
        assert_eq!(cells.len(), size.cell_count(), "cell count does not match grid size");
        Self { size, cells }
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// Texel bytes for an `R32Uint` texture upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.cells)
    }

    pub fn get(&self, x: u32, y: u32) -> u32 {
        self.cells[self.index(x, y)]
    }

    /// Height at `(x, y)` with toroidal wrap-around.
    pub fn get_wrapped(&self, x: i64, y: i64) -> u32 {
        let w = self.size.width as i64;
        let h = self.size.height as i64;
        self.get(x.rem_euclid(w) as u32, y.rem_euclid(h) as u32)
    }

    pub fn total_grains(&self) -> u64 {
        self.cells.iter().map(|&c| c as u64).sum()
    }

    pub fn is_stable(&self, rule: Rule) -> bool {
        self.cells.iter().all(|&c| c < rule.threshold)
    }

    /// [`Grid::step_with`] under the default rule.
    pub fn step(&self) -> Grid {
        self.step_with(Rule::default())
    }

    /// One synchronous toppling step over the whole grid.
    ///
    /// Every cell at or above the threshold loses [`NEIGHBOURS`] grains and
    /// every cell gains one per toppling neighbour.
    pub fn step_with(&self, rule: Rule) -> Grid {
        let (w, h) = (self.size.width as i64, self.size.height as i64);
        let topples = |x: i64, y: i64| {
            let inside = (0..w).contains(&x) && (0..h).contains(&y);
            if rule.edges == Edges::Open && !inside {
                return 0;
            }
            (self.get_wrapped(x, y) >= rule.threshold) as u32
        };

        let mut next = Vec::with_capacity(self.cells.len());
        for y in 0..h {
            for x in 0..w {
                let cell = self.get_wrapped(x, y);
                let kept = if cell >= rule.threshold { cell - NEIGHBOURS } else { cell };
                let gained = topples(x + 1, y) + topples(x - 1, y) + topples(x, y + 1) + topples(x, y - 1);
                next.push(kept + gained);
            }
        }

        Grid {
            size: self.size,
            cells: next,
        }
    }

    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.size.width && y < self.size.height);
        (y * self.size.width + x) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SIZE: GridSize = GridSize::new(16, 16);

    #[test]
    fn seed_is_index_mod_five() {
        let grid = Grid::seeded(SIZE);
        assert_eq!(grid.cells().len(), 256);
        for (k, &value) in grid.cells().iter().enumerate() {
            assert_eq!(value, k as u32 % 5);
        }
    }

    #[test]
    fn seeding_is_deterministic() {
        assert_eq!(Grid::seeded(SIZE), Grid::seeded(SIZE));
    }

    #[test]
    fn seed_bytes_are_native_u32_texels() {
        let grid = Grid::seeded(SIZE);
        let bytes = grid.as_bytes();
        assert_eq!(bytes.len(), 256 * 4);
        assert_eq!(&bytes[4..8], &1u32.to_ne_bytes());
    }

    #[test]
    fn step_is_deterministic() {
        let grid = Grid::seeded(SIZE);
        assert_eq!(grid.step(), grid.step());
    }

    #[test]
    fn step_conserves_grains_on_torus() {
        let mut grid = Grid::seeded(SIZE);
        let total = grid.total_grains();
        for _ in 0..32 {
            grid = grid.step();
            assert_eq!(grid.total_grains(), total);
        }
    }

    #[test]
    fn stable_grid_is_a_fixed_point() {
        let grid = Grid::from_cells(GridSize::new(3, 3), vec![3, 2, 1, 0, 3, 2, 1, 0, 3]);
        assert!(grid.is_stable(Rule::default()));
        assert_eq!(grid.step(), grid);
    }

    #[test]
    fn open_edges_drop_grains() {
        let mut cells = vec![0; 16];
        cells[0] = 4;
        let grid = Grid::from_cells(GridSize::new(4, 4), cells);
        let rule = Rule::new(TOPPLE_THRESHOLD, Edges::Open);

        let next = grid.step_with(rule);
        assert_eq!(next.get(1, 0), 1);
        assert_eq!(next.get(0, 1), 1);
        assert_eq!(next.get(3, 0), 0);
        assert_eq!(next.get(0, 3), 0);
        assert_eq!(next.total_grains(), 2);
    }

    #[test]
    fn open_edges_never_gain_grains() {
        let rule = Rule::new(TOPPLE_THRESHOLD, Edges::Open);
        let mut grid = Grid::seeded(SIZE);
        for _ in 0..32 {
            let next = grid.step_with(rule);
            assert!(next.total_grains() <= grid.total_grains());
            grid = next;
        }
    }

    #[test]
    fn threshold_never_below_neighbour_count() {
        assert_eq!(Rule::new(1, Edges::Wrap).threshold(), NEIGHBOURS);
        assert_eq!(Rule::new(6, Edges::Open).threshold(), 6);
    }

    #[test]
    fn higher_threshold_holds_more_grains() {
        let grid = Grid::from_cells(GridSize::new(3, 3), vec![4; 9]);
        let rule = Rule::new(5, Edges::Wrap);
        assert!(grid.is_stable(rule));
        assert_eq!(grid.step_with(rule), grid);
    }

    #[test]
    fn single_topple_feeds_four_neighbours() {
        let mut cells = vec![0; 25];
        cells[2 * 5 + 2] = 4;
        let grid = Grid::from_cells(GridSize::new(5, 5), cells);

        let next = grid.step();
        assert_eq!(next.get(2, 2), 0);
        assert_eq!(next.get(1, 2), 1);
        assert_eq!(next.get(3, 2), 1);
        assert_eq!(next.get(2, 1), 1);
        assert_eq!(next.get(2, 3), 1);
        assert_eq!(next.total_grains(), 4);
    }

    #[test]
    fn corner_topple_wraps_around_edges() {
        let mut cells = vec![0; 16];
        cells[0] = 5;
        let grid = Grid::from_cells(GridSize::new(4, 4), cells);

        let next = grid.step();
        assert_eq!(next.get(0, 0), 1);
        assert_eq!(next.get(1, 0), 1);
        assert_eq!(next.get(3, 0), 1);
        assert_eq!(next.get(0, 1), 1);
        assert_eq!(next.get(0, 3), 1);
    }
}
