use serde::{Deserialize, Serialize};
use shared::{Location, Terrain};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("the map contains no rows")]
    Empty,

    #[error("all lines must have the same length: line {line} has {found} cells, expected {expected}")]
    UnequalLines {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("only W, L, H and D are allowed, found `{code}` at {location}")]
    InvalidTerrain { code: char, location: Location },

    #[error("the island must be surrounded by water, found {terrain} at {location}")]
    BorderNotWater { terrain: Terrain, location: Location },
}

/// Validated terrain layout, stored row-major
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IslandMap {
    pub rows: usize,
    pub cols: usize,
    terrain: Vec<Terrain>,
}

impl IslandMap {
    /// Parse a multi-line map string.
    ///
    /// Lines are trimmed and blank lines dropped. Every line must have the
    /// same length, contain only terrain codes, and the outer ring must be
    /// water.
    pub fn parse(spec: &str) -> Result<Self, MapError> {
        let lines: Vec<&str> = spec
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();

        let rows = lines.len();
        let cols = lines.first().map(|line| line.chars().count()).ok_or(MapError::Empty)?;

        let mut terrain = Vec::with_capacity(rows * cols);
        for (r, line) in lines.iter().enumerate() {
            let found = line.chars().count();
            if found != cols {
                return Err(MapError::UnequalLines {
                    line: r + 1,
                    expected: cols,
                    found,
                });
            }

            for (c, code) in line.chars().enumerate() {
                let location = Location::new(r + 1, c + 1);
                let kind = Terrain::from_code(code)
                    .map_err(|_| MapError::InvalidTerrain { code, location })?;
                let on_border = r == 0 || r == rows - 1 || c == 0 || c == cols - 1;
                if on_border && kind != Terrain::Water {
                    return Err(MapError::BorderNotWater {
                        terrain: kind,
                        location,
                    });
                }
                terrain.push(kind);
            }
        }

        Ok(Self {
            rows,
            cols,
            terrain,
        })
    }

    pub fn contains(&self, location: Location) -> bool {
        (1..=self.rows).contains(&location.row) && (1..=self.cols).contains(&location.col)
    }

    /// Row-major index of a 1-based location
    pub fn index(&self, location: Location) -> Option<usize> {
        self.contains(location)
            .then(|| (location.row - 1) * self.cols + (location.col - 1))
    }

    pub fn terrain_at(&self, location: Location) -> Option<Terrain> {
        self.index(location).map(|idx| self.terrain[idx])
    }

    /// Every location with its terrain, row by row
    pub fn iter(&self) -> impl Iterator<Item = (Location, Terrain)> + '_ {
        self.terrain.iter().enumerate().map(move |(idx, &terrain)| {
            let location = Location::new(idx / self.cols + 1, idx % self.cols + 1);
            (location, terrain)
        })
    }
}
