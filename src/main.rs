//! Canvas Layout CLI
//!
//! Usage:
//!   canvas-layout [OPTIONS] [FILE]
//!
//! Options:
//!   --width <W>          Allocated width (overrides the document)
//!   --height <H>         Allocated height (overrides the document)
//!   -p, --point <X,Y>    Report the items covering a point (repeatable)
//!   -r, --rect <X,Y,W,H> Report the items intersecting a rectangle (repeatable)
//!   -h, --help           Print help

use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use clap::Parser;

use canvas_layout::layout::{Point, Rect};
use canvas_layout::{init_tracing, run_document, Error, RunOptions};

#[derive(Parser)]
#[command(name = "canvas-layout")]
#[command(about = "Pack canvas items described in TOML and query their layout")]
struct Cli {
    /// Input file (reads from stdin if not provided)
    input: Option<PathBuf>,

    /// Allocated width (overrides the document)
    #[arg(long)]
    width: Option<f64>,

    /// Allocated height (overrides the document)
    #[arg(long)]
    height: Option<f64>,

    /// Report the items covering a point, given as X,Y
    #[arg(short, long, value_parser = parse_point)]
    point: Vec<Point>,

    /// Report the items intersecting a rectangle, given as X,Y,W,H
    #[arg(short, long, value_parser = parse_rect)]
    rect: Vec<Rect>,
}

fn parse_numbers<const N: usize>(value: &str) -> Result<[f64; N], String> {
    let numbers = value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .map_err(|e| format!("'{}': {}", part.trim(), e))
        })
        .collect::<Result<Vec<_>, _>>()?;
    numbers
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected {} comma-separated numbers, got {}", N, v.len()))
}

fn parse_point(value: &str) -> Result<Point, String> {
    let [x, y] = parse_numbers(value)?;
    Ok(Point::new(x, y))
}

fn parse_rect(value: &str) -> Result<Rect, String> {
    let [x, y, width, height] = parse_numbers(value)?;
    Ok(Rect::new(x, y, width, height))
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    // If no input file and stdin is a terminal (interactive), show intro help
    if cli.input.is_none() && io::stdin().is_terminal() {
        print_intro();
        return;
    }

    // Read input
    let (source, filename) = match &cli.input {
        Some(path) => match fs::read_to_string(path) {
            Ok(content) => (content, path.display().to_string()),
            Err(e) => {
                eprintln!("Error reading file '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => {
            let mut buffer = String::new();
            match io::stdin().read_to_string(&mut buffer) {
                Ok(_) => (buffer, "<stdin>".to_string()),
                Err(e) => {
                    eprintln!("Error reading from stdin: {}", e);
                    std::process::exit(1);
                }
            }
        }
    };

    let options = RunOptions {
        width: cli.width,
        height: cli.height,
        points: cli.point,
        rects: cli.rect,
    };
    match run_document(&source, &options) {
        Ok(report) => {
            println!("{}", report);
        }
        Err(Error::Document(e)) => {
            eprintln!("{}", e.format(&source, &filename));
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn print_intro() {
    println!(
        r#"Canvas Layout - constraint-based box packing

USAGE:
    canvas-layout [OPTIONS] [FILE]
    cat box.toml | canvas-layout --point 10,10

DOCUMENT:
    orientation = "horizontal"      # or "vertical"
    spacing = 10
    margin = [4, 8]                 # 1-4 values: top, right, bottom, left
    padding = [2]

    [allocation]
    width = 300
    height = 40

    [[items]]
    name = "content"
    natural = [100, 20]
    primary = ["expand", "fill"]    # expand, fill, shrink
    pack = "start"                  # or "end"

Run --help for all options."#
    );
}
