//! Building recipes and the shape-matching engine.
//!
//! Each recipe is stored as one canonical pattern. The full orientation set
//! (up to 4 rotations x 2 reflections) is derived when the catalog is built,
//! with duplicate orientations collapsed, so symmetric shapes like the Farm
//! carry fewer than eight variants.
//!
//! Pattern text uses the board symbol alphabet for resources, `.` for a
//! cell outside the shape (no tile may be selected there) and `*` for a
//! wildcard (a tile of any resource kind is required).

use crate::board::{BuildingKind, Resource};
use crate::grid::CellIndex;
use serde::Serialize;
use std::sync::OnceLock;

/// One cell of a recipe pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Slot {
    /// Outside the shape
    Blank,
    /// Any resource, but a tile must be present
    Any,
    /// Exactly this resource
    Exact(Resource),
}

impl Slot {
    fn from_symbol(symbol: char) -> Option<Self> {
        match symbol {
            '.' => Some(Slot::Blank),
            '*' => Some(Slot::Any),
            other => Resource::from_symbol(other).map(Slot::Exact),
        }
    }

    fn accepts(&self, tile: Option<Resource>) -> bool {
        match (self, tile) {
            (Slot::Blank, None) => true,
            (Slot::Any, Some(_)) => true,
            (Slot::Exact(want), Some(got)) => *want == got,
            _ => false,
        }
    }
}

/// A rectangular grid of slots, row-major
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Pattern {
    rows: usize,
    cols: usize,
    slots: Vec<Slot>,
}

impl Pattern {
    /// Parse rows of pattern text. Returns `None` for ragged rows, unknown
    /// symbols or an empty pattern.
    pub fn parse(rows: &[&str]) -> Option<Self> {
        let cols = rows.first()?.chars().count();
        if cols == 0 {
            return None;
        }
        let mut slots = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.chars().count() != cols {
                return None;
            }
            for symbol in row.chars() {
                slots.push(Slot::from_symbol(symbol)?);
            }
        }
        Some(Self {
            rows: rows.len(),
            cols,
            slots,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn get(&self, row: usize, col: usize) -> Slot {
        self.slots[row * self.cols + col]
    }

    /// Number of tiles a matching selection must contain
    pub fn footprint(&self) -> usize {
        self.slots.iter().filter(|s| **s != Slot::Blank).count()
    }

    /// Rotate 90 degrees clockwise
    pub fn rotated_cw(&self) -> Pattern {
        let (rows, cols) = (self.cols, self.rows);
        let mut slots = Vec::with_capacity(self.slots.len());
        for r in 0..rows {
            for c in 0..cols {
                slots.push(self.get(self.rows - 1 - c, r));
            }
        }
        Pattern { rows, cols, slots }
    }

    /// Mirror left-to-right
    pub fn reflected(&self) -> Pattern {
        let mut slots = Vec::with_capacity(self.slots.len());
        for r in 0..self.rows {
            for c in 0..self.cols {
                slots.push(self.get(r, self.cols - 1 - c));
            }
        }
        Pattern {
            rows: self.rows,
            cols: self.cols,
            slots,
        }
    }

    /// All distinct rotations and reflections, starting with `self`
    pub fn orientations(&self) -> Vec<Pattern> {
        let mut out: Vec<Pattern> = Vec::with_capacity(8);
        for base in [self.clone(), self.reflected()] {
            let mut current = base;
            for _ in 0..4 {
                let next = current.rotated_cw();
                if !out.contains(&current) {
                    out.push(current);
                }
                current = next;
            }
        }
        out
    }

    fn matches(&self, shape: &SelectionShape) -> bool {
        if self.rows != shape.rows || self.cols != shape.cols {
            return false;
        }
        self.slots
            .iter()
            .zip(shape.tiles.iter())
            .all(|(slot, tile)| slot.accepts(*tile))
    }
}

/// A selection normalized to its bounding rectangle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionShape {
    rows: usize,
    cols: usize,
    tiles: Vec<Option<Resource>>,
}

impl SelectionShape {
    /// Normalize selected tiles into their minimal bounding rectangle.
    /// Returns `None` for an empty selection.
    pub fn from_selection(selection: &[(CellIndex, Resource)]) -> Option<Self> {
        let min_row = selection.iter().map(|(c, _)| c.row()).min()?;
        let max_row = selection.iter().map(|(c, _)| c.row()).max()?;
        let min_col = selection.iter().map(|(c, _)| c.col()).min()?;
        let max_col = selection.iter().map(|(c, _)| c.col()).max()?;

        let rows = max_row - min_row + 1;
        let cols = max_col - min_col + 1;
        let mut tiles = vec![None; rows * cols];
        for (cell, resource) in selection {
            tiles[(cell.row() - min_row) * cols + (cell.col() - min_col)] = Some(*resource);
        }
        Some(Self { rows, cols, tiles })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }
}

/// A building recipe with its derived orientation set
#[derive(Debug, Clone, Serialize)]
pub struct Recipe {
    pub building: BuildingKind,
    pub glyph: &'static str,
    orientations: Vec<Pattern>,
}

impl Recipe {
    /// Build a recipe from one canonical shape
    pub fn new(building: BuildingKind, glyph: &'static str, canonical: Pattern) -> Self {
        Self {
            building,
            glyph,
            orientations: canonical.orientations(),
        }
    }

    pub fn orientations(&self) -> &[Pattern] {
        &self.orientations
    }

    /// Whether the shape matches any orientation
    pub fn matches(&self, shape: &SelectionShape) -> bool {
        self.orientations.iter().any(|p| p.matches(shape))
    }
}

/// The fixed recipe catalog, scanned in a stable order
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    recipes: Vec<Recipe>,
}

static STANDARD_CATALOG: OnceLock<Catalog> = OnceLock::new();

impl Catalog {
    /// Build a catalog from recipes; scan order is the given order
    pub fn new(recipes: Vec<Recipe>) -> Self {
        Self { recipes }
    }

    /// The standard eight-building catalog, built once per process
    pub fn standard() -> &'static Catalog {
        STANDARD_CATALOG.get_or_init(|| {
            let recipe = |building: BuildingKind, glyph: &'static str, rows: &[&str]| {
                let canonical = Pattern::parse(rows).unwrap_or_else(|| {
                    panic!("malformed built-in recipe for {}", building)
                });
                Recipe::new(building, glyph, canonical)
            };
            Catalog::new(vec![
                recipe(BuildingKind::Well, "🕳️", &["ws"]),
                recipe(BuildingKind::Theatre, "🎭", &[".s.", "wgw"]),
                recipe(BuildingKind::Factory, "🏭", &["w...", "bssb"]),
                recipe(BuildingKind::Cottage, "🏠", &[".h", "bg"]),
                recipe(BuildingKind::Chapel, "💒", &["..g", "sgs"]),
                recipe(BuildingKind::Farm, "🌾", &["hh", "ww"]),
                recipe(BuildingKind::Tavern, "🍺", &["bbg"]),
                recipe(BuildingKind::Cathedral, "🛐", &["h.", "sg"]),
            ])
        })
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    /// Recipe for a building kind
    pub fn get(&self, building: BuildingKind) -> Option<&Recipe> {
        self.recipes.iter().find(|r| r.building == building)
    }

    /// First recipe whose any orientation exactly matches the selection
    pub fn match_recipe(&self, selection: &[(CellIndex, Resource)]) -> Option<&Recipe> {
        let shape = SelectionShape::from_selection(selection)?;
        self.recipes.iter().find(|r| r.matches(&shape))
    }
}

/// Match a selection against the standard catalog
pub fn match_recipe(selection: &[(CellIndex, Resource)]) -> Option<BuildingKind> {
    Catalog::standard()
        .match_recipe(selection)
        .map(|r| r.building)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Resource::*;

    fn sel(tiles: &[(usize, Resource)]) -> Vec<(CellIndex, Resource)> {
        tiles
            .iter()
            .map(|(i, r)| (CellIndex::new(*i).unwrap(), *r))
            .collect()
    }

    /// Lay a pattern onto the grid at (row, col), returning the selection
    fn place(pattern: &Pattern, row: usize, col: usize) -> Vec<(CellIndex, Resource)> {
        let mut out = Vec::new();
        for r in 0..pattern.rows() {
            for c in 0..pattern.cols() {
                let resource = match pattern.get(r, c) {
                    Slot::Exact(res) => res,
                    Slot::Any => Wood,
                    Slot::Blank => continue,
                };
                out.push((CellIndex::from_row_col(row + r, col + c).unwrap(), resource));
            }
        }
        out
    }

    #[test]
    fn test_parse_rejects_ragged_and_unknown() {
        assert!(Pattern::parse(&["ws", "w"]).is_none());
        assert!(Pattern::parse(&["wx"]).is_none());
        assert!(Pattern::parse(&[]).is_none());
    }

    #[test]
    fn test_rotation_four_times_is_identity() {
        let p = Pattern::parse(&["w...", "bssb"]).unwrap();
        let back = p.rotated_cw().rotated_cw().rotated_cw().rotated_cw();
        assert_eq!(back, p);
        let r = p.rotated_cw();
        assert_eq!((r.rows(), r.cols()), (4, 2));
        // top-left of the canonical shape ends up top-right after rotation
        assert_eq!(r.get(0, 1), Slot::Exact(Wood));
        assert_eq!(r.get(0, 0), Slot::Exact(Brick));
    }

    #[test]
    fn test_orientation_counts() {
        let catalog = Catalog::standard();
        let count = |b| catalog.get(b).unwrap().orientations().len();
        assert_eq!(count(BuildingKind::Well), 4);
        assert_eq!(count(BuildingKind::Theatre), 4);
        assert_eq!(count(BuildingKind::Factory), 8);
        assert_eq!(count(BuildingKind::Cottage), 8);
        assert_eq!(count(BuildingKind::Chapel), 8);
        assert_eq!(count(BuildingKind::Farm), 4);
        assert_eq!(count(BuildingKind::Tavern), 4);
        assert_eq!(count(BuildingKind::Cathedral), 8);
    }

    #[test]
    fn test_every_orientation_matches_anywhere_it_fits() {
        let catalog = Catalog::standard();
        for recipe in catalog.recipes() {
            for pattern in recipe.orientations() {
                for row in 0..=(4 - pattern.rows()) {
                    for col in 0..=(4 - pattern.cols()) {
                        let selection = place(pattern, row, col);
                        assert_eq!(
                            catalog.match_recipe(&selection).map(|r| r.building),
                            Some(recipe.building),
                            "{} at ({}, {})",
                            recipe.building,
                            row,
                            col
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_well_both_axes() {
        assert_eq!(
            match_recipe(&sel(&[(0, Wood), (1, Stone)])),
            Some(BuildingKind::Well)
        );
        assert_eq!(
            match_recipe(&sel(&[(5, Stone), (9, Wood)])),
            Some(BuildingKind::Well)
        );
    }

    #[test]
    fn test_selection_order_does_not_matter() {
        assert_eq!(
            match_recipe(&sel(&[(1, Stone), (0, Wood)])),
            Some(BuildingKind::Well)
        );
    }

    #[test]
    fn test_empty_selection_never_matches() {
        assert_eq!(match_recipe(&[]), None);
    }

    #[test]
    fn test_single_wrong_resource_rejects() {
        let catalog = Catalog::standard();
        for recipe in catalog.recipes() {
            let selection = place(&recipe.orientations()[0], 0, 0);
            for i in 0..selection.len() {
                let mut wrong = selection.clone();
                let original = wrong[i].1;
                for replacement in Resource::ALL.into_iter().filter(|r| *r != original) {
                    wrong[i].1 = replacement;
                    // a different recipe may legitimately match; this one must not
                    let matched = catalog.match_recipe(&wrong).map(|r| r.building);
                    assert_ne!(matched, Some(recipe.building), "{}", recipe.building);
                }
            }
        }
    }

    #[test]
    fn test_missing_tile_rejects() {
        // Theatre without its stone
        let selection = sel(&[(4, Wood), (5, Glass), (6, Wood)]);
        assert_eq!(match_recipe(&selection), None);
    }

    #[test]
    fn test_extra_tile_in_blank_slot_rejects() {
        // Cottage shape plus a tile in the blank corner
        let selection = sel(&[(0, Wood), (1, Wheat), (4, Brick), (5, Glass)]);
        assert_eq!(match_recipe(&selection), None);
    }

    #[test]
    fn test_wildcard_requires_a_tile() {
        let catalog = Catalog::new(vec![Recipe::new(
            BuildingKind::Well,
            "?",
            Pattern::parse(&["w*"]).unwrap(),
        )]);
        assert!(catalog.match_recipe(&sel(&[(0, Wood), (1, Glass)])).is_some());
        assert!(catalog.match_recipe(&sel(&[(0, Wood), (1, Brick)])).is_some());
        assert!(catalog.match_recipe(&sel(&[(0, Wood)])).is_none());
    }

    #[test]
    fn test_disconnected_selection_does_not_match() {
        assert_eq!(match_recipe(&sel(&[(0, Wood), (2, Stone)])), None);
    }

    #[test]
    fn test_bounding_box_normalization() {
        let shape = SelectionShape::from_selection(&sel(&[(5, Wood), (10, Stone)])).unwrap();
        assert_eq!((shape.rows(), shape.cols()), (2, 2));
    }
}
