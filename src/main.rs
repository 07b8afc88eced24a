
extern crate clap;
#[macro_use] extern crate log;
extern crate fern;
extern crate chrono;
extern crate regex;
extern crate term_grid;

pub mod assembler;
pub mod frontend;

use clap::{Arg, ArgMatches, App};
use term_grid::{Grid, GridOptions, Direction, Filling, Cell};

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use assembler::AsmError;

fn main() {
    let args = process_arguments();
    initialize_logging(args.occurrences_of("verbose"));

    debug!("Arguments:\n\tVerbosity: {}\n\tTokens: {}\n\tAst: {}\n\tOutfile: {}\n\tInfile: {}",
        match args.occurrences_of("verbose") {
            0 => log::LevelFilter::Error.to_string(),
            1 => log::LevelFilter::Warn.to_string(),
            2 => log::LevelFilter::Info.to_string(),
            _ => log::LevelFilter::Debug.to_string(),
        },
        args.is_present("tokens"),
        args.is_present("ast"),
        args.value_of("output").unwrap_or("None"),
        args.value_of("INPUT").unwrap()
    );

    let ipath = PathBuf::from(args.value_of("INPUT").unwrap());

    let source = match read_source(&ipath) {
        Err(err) => {
            error!("fatal: unable to read input file `{}`: {}", ipath.display(), err);
            std::process::exit(1);
        },
        Ok(text) => text,
    };

    // -t and -a treat the input as language source and stop after
    // the requested front-end stage.
    if args.is_present("tokens") {
        let tokens = match frontend::lexer::tokenize(&source) {
            Err(err) => {
                error!("fatal: {}", err);
                std::process::exit(1);
            },
            Ok(tokens) => tokens,
        };

        for tok in tokens.iter() {
            println!("{:>4}: {:?}", tok.line, tok.kind);
        }
        return;
    }

    if args.is_present("ast") {
        let root = frontend::lexer::tokenize(&source)
            .map_err(|err| err.to_string())
            .and_then(|tokens| {
                frontend::parser::Parser::new(tokens)
                    .run()
                    .map_err(|err| err.to_string())
            });

        match root {
            Err(err) => {
                error!("fatal: {}", err);
                std::process::exit(1);
            },
            Ok(block) => println!("{:#?}", block),
        }
        return;
    }

    // Default mode: the input is mnemonic text.
    let manager = match assembler::assemble(&source) {
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(1);
        },
        Ok(manager) => manager,
    };

    if args.is_present("print-debug") {
        print_labels(&manager);
        print_image(&manager);
    }

    let opath = if let Some(filename) = args.value_of("output") {
        PathBuf::from(filename)
    } else {
        ipath.with_extension("bin")
    };

    if let Err(err) = manager.create_bin(&opath) {
        error!("fatal: unable to write output file `{}`: {}", opath.display(), err);
        std::process::exit(1);
    }

    info!("wrote {} bytes to `{}`", manager.image().len(), opath.display());
}

/// Reads the whole input file, checking the byte count read against the
/// file's length.
fn read_source(path: &Path) -> Result<String, AsmError> {
    let mut file = File::open(path)?;
    let expected = file.metadata()?.len() as usize;

    let mut bytes = Vec::with_capacity(expected);
    let actual = file.read_to_end(&mut bytes)?;
    if actual != expected {
        return Err(AsmError::IoMismatch { expected, actual });
    }

    String::from_utf8(bytes).map_err(|err| {
        AsmError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
    })
}

fn print_labels(manager: &assembler::Manager) {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for label in manager.labels().iter() {
        grid.add(Cell::from(format!("{}:", label.name)));
        grid.add(Cell::from("=>".to_string()));
        grid.add(Cell::from(format!("{:#06X}", label.ip_pos)));
    }

    println!("{}", grid.fit_into_columns(3));
}

fn print_image(manager: &assembler::Manager) {
    let mut grid = Grid::new(GridOptions {
        filling:     Filling::Spaces(1),
        direction:   Direction::LeftToRight,
    });

    for (idx, chunk) in manager.image().chunks(8).enumerate() {
        grid.add(Cell::from(format!("{:#06X}:", idx * 8)));
        for byte in chunk {
            grid.add(Cell::from(format!("{:02X}", byte)));
        }
        for _ in chunk.len()..8 {
            grid.add(Cell::from("..".to_string()));
        }
    }

    println!("{}", grid.fit_into_columns(9));
}

fn process_arguments() -> ArgMatches<'static> {
    App::new(option_env!("CARGO_PKG_NAME").unwrap())
        .version(option_env!("CARGO_PKG_VERSION").unwrap())
        .about(option_env!("CARGO_PKG_DESCRIPTION").unwrap())
        .arg(Arg::with_name("INPUT")
            .help("Sets the input file to use")
            .required(true)
            .multiple(false)
            .index(1))
        .arg(Arg::with_name("verbose")
            .short("v")
            .multiple(true)
            .takes_value(false)
            .help("Sets the level of verbosity"))
        .arg(Arg::with_name("output")
            .short("o")
            .takes_value(true)
            .help("write the bytecode artifact to an outfile"))
        .arg(Arg::with_name("tokens")
            .short("t")
            .long("tokens")
            .takes_value(false)
            .help("tokenize the input as language source and print the tokens"))
        .arg(Arg::with_name("ast")
            .short("a")
            .long("ast")
            .takes_value(false)
            .conflicts_with("tokens")
            .help("parse the input as language source and print the AST"))
        .arg(Arg::with_name("print-debug")
            .short("d")
            .alias("show")
            .alias("s")
            .takes_value(false)
            .help("prints the label table and an image hex dump alongside the assembly"))
        .get_matches()
}

fn initialize_logging(verbosity: u64) {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{}[{}][{}][{}:{}] {}",
                chrono::Local::now().format("[%Y-%m-%d][%H:%M:%S]"),
                record.target(),
                record.level(),
                record.file().unwrap_or("?"),
                record.line().unwrap_or(0),
                message
            ))
        })
        .level(match verbosity {
            0 => log::LevelFilter::Error,
            1 => log::LevelFilter::Warn,
            2 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .chain(std::io::stdout())
        .apply().ok();
}
