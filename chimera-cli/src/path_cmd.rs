//! Path command - run A* on an empty board

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use chimera_core::{Grid, Oddity, Offset, Pathfinder};

#[derive(Clone, Copy, ValueEnum)]
pub enum OddityArg {
    Odd,
    Even,
}

impl From<OddityArg> for Oddity {
    fn from(arg: OddityArg) -> Self {
        match arg {
            OddityArg::Odd => Oddity::Odd,
            OddityArg::Even => Oddity::Even,
        }
    }
}

#[derive(Args)]
pub struct PathArgs {
    #[arg(long, default_value = "10")]
    pub width: i32,

    #[arg(long, default_value = "10")]
    pub height: i32,

    /// Which rows are shifted right
    #[arg(long, value_enum, default_value = "odd")]
    pub oddity: OddityArg,

    /// Start tile as COL,ROW
    #[arg(long, value_parser = parse_offset)]
    pub from: Offset,

    /// Goal tile as COL,ROW
    #[arg(long, value_parser = parse_offset)]
    pub to: Offset,

    /// Clip the path to this many steps
    #[arg(long)]
    pub max_steps: Option<usize>,
}

pub fn run(args: PathArgs) -> Result<()> {
    let grid = Grid::generate(args.width, args.height, args.oddity.into())
        .context("invalid board size")?;
    let path = Pathfinder::new(&grid)
        .find_path(args.from, args.to, args.max_steps)
        .with_context(|| format!("no path query possible from {} to {}", args.from, args.to))?;

    if path.is_empty() {
        println!("unreachable");
        return Ok(());
    }

    let tiles: Vec<String> = path.tiles.iter().map(|t| format!("({})", t)).collect();
    println!("path: {}", tiles.join(" -> "));
    println!("cost: {}", path.cost);
    println!("distance: {}", grid.distance(args.from, args.to));
    Ok(())
}

fn parse_offset(s: &str) -> Result<Offset, String> {
    let (col, row) = s
        .split_once(',')
        .ok_or_else(|| format!("expected COL,ROW, got {:?}", s))?;
    let col = col.trim().parse().map_err(|e| format!("bad column: {}", e))?;
    let row = row.trim().parse().map_err(|e| format!("bad row: {}", e))?;
    Ok(Offset::new(col, row))
}
