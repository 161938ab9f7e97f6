//! Opening build orders given on the command line.

use std::{error::Error, fmt, str::FromStr};

use hive_defence_core::{CellCoord, Command, Grid, StructureKind};

/// Cell typed as `column,row`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CellArg(pub(crate) CellCoord);

impl FromStr for CellArg {
    type Err = CellArgError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(CellArgError::Empty);
        }

        let (column, row) = trimmed
            .split_once(',')
            .ok_or_else(|| CellArgError::Invalid(trimmed.to_owned()))?;
        let column = column
            .trim()
            .parse::<i32>()
            .map_err(|_| CellArgError::Invalid(trimmed.to_owned()))?;
        let row = row
            .trim()
            .parse::<i32>()
            .map_err(|_| CellArgError::Invalid(trimmed.to_owned()))?;

        Ok(Self(CellCoord::new(column, row)))
    }
}

/// Errors produced while parsing a cell argument.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum CellArgError {
    /// The argument was empty or contained only whitespace.
    Empty,
    /// The argument did not match `column,row`.
    Invalid(String),
}

impl fmt::Display for CellArgError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "cell argument was empty"),
            Self::Invalid(value) => {
                write!(f, "could not parse cell '{value}', expected column,row")
            }
        }
    }
}

impl Error for CellArgError {}

/// Build actions performed before the first wave.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct Layout {
    pub(crate) walls: Vec<CellArg>,
    pub(crate) turrets: Vec<CellArg>,
    pub(crate) snipers: Vec<CellArg>,
    pub(crate) traps: Vec<CellArg>,
}

impl Layout {
    /// Translates the layout into commands aimed at cell centres.
    ///
    /// Walls come first, then turrets, snipers and traps, each in the order
    /// they were given.
    pub(crate) fn commands(&self, grid: Grid) -> Vec<(CellCoord, Command)> {
        let structures = [
            (StructureKind::Wall, &self.walls),
            (StructureKind::Turret, &self.turrets),
            (StructureKind::Sniper, &self.snipers),
        ];
        let mut commands: Vec<(CellCoord, Command)> = structures
            .into_iter()
            .flat_map(|(kind, cells)| {
                cells.iter().map(move |CellArg(cell)| {
                    let point = grid.point_from_cell(*cell);
                    (*cell, Command::PlaceStructure { kind, point })
                })
            })
            .collect();
        commands.extend(self.traps.iter().map(|CellArg(cell)| {
            let point = grid.point_from_cell(*cell);
            (*cell, Command::PlaceTrap { point })
        }));
        commands
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hive_defence_core::GameConfig;

    #[test]
    fn parses_column_and_row() {
        assert_eq!(
            " 12, 4 ".parse::<CellArg>(),
            Ok(CellArg(CellCoord::new(12, 4)))
        );
        assert_eq!("-1,3".parse::<CellArg>(), Ok(CellArg(CellCoord::new(-1, 3))));
    }

    #[test]
    fn rejects_malformed_cells() {
        assert_eq!("".parse::<CellArg>(), Err(CellArgError::Empty));
        assert_eq!(
            "12x4".parse::<CellArg>(),
            Err(CellArgError::Invalid("12x4".to_owned()))
        );
        assert_eq!(
            "a,4".parse::<CellArg>(),
            Err(CellArgError::Invalid("a,4".to_owned()))
        );
    }

    #[test]
    fn commands_target_cell_centres_in_build_order() {
        let grid = GameConfig::default().grid();
        let layout = Layout {
            walls: vec![CellArg(CellCoord::new(14, 3))],
            turrets: vec![CellArg(CellCoord::new(5, 3))],
            snipers: Vec::new(),
            traps: vec![CellArg(CellCoord::new(3, 5))],
        };

        let commands = layout.commands(grid);

        assert_eq!(commands.len(), 3);
        assert_eq!(
            commands[0].1,
            Command::PlaceStructure {
                kind: StructureKind::Wall,
                point: grid.point_from_cell(CellCoord::new(14, 3)),
            }
        );
        assert!(matches!(
            commands[1].1,
            Command::PlaceStructure {
                kind: StructureKind::Turret,
                ..
            }
        ));
        assert_eq!(
            commands[2],
            (
                CellCoord::new(3, 5),
                Command::PlaceTrap {
                    point: grid.point_from_cell(CellCoord::new(3, 5)),
                }
            )
        );
    }
}
