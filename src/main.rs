use std::{
    fs::File,
    io::{Read, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use structopt::StructOpt;
use tracing::Level;

use minic::driver::{check, compile, front_end, lex, Options};
use minic::error::CompileError;
use minic::lexer::lex::LexMode;
use minic::parser::recursive_descent::ParseMode;
use minic::semantics::analyzer::AnalysisMode;

fn main() {
    let opts = Opt::from_args();

    tracing_subscriber::fmt()
        .with_max_level(if opts.verbose { Level::DEBUG } else { Level::WARN })
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(e) = run(&opts) {
        match e.downcast_ref::<CompileError>() {
            Some(err) => {
                for err in err.flatten() {
                    eprintln!("minic: {}", err);
                }
            }
            None => eprintln!("minic: {:#}", e),
        }
        std::process::exit(1);
    }
}

fn run(opts: &Opt) -> Result<()> {
    let src = read_source(opts.path.as_ref())?;
    let options = opts.options();

    if opts.lex {
        for token in lex(&src, &options)? {
            println!("{}", token);
        }
        return Ok(());
    }

    if opts.parse {
        let (_, program) = front_end(&src, &options)?;
        println!("{:#?}", program);
        return Ok(());
    }

    if opts.validate || opts.symbols {
        let (_, program, analysis) = check(&src, &options)?;
        for warning in &analysis.warnings {
            eprintln!("minic: {}", warning);
        }
        if opts.symbols {
            println!(
                "{:<16} {:<10} {:<6} {:>5} {:>5}",
                "name", "kind", "type", "scope", "used"
            );
            for symbol in &analysis.symbols {
                println!(
                    "{:<16} {:<10} {:<6} {:>5} {:>5}",
                    symbol.name, symbol.kind, symbol._type, symbol.scope_id, symbol.used
                );
            }
        } else {
            println!("{:#?}", program);
        }
        return Ok(());
    }

    let compilation = compile(&src, &options)?;
    for warning in &compilation.analysis.warnings {
        eprintln!("minic: {}", warning);
    }

    match &opts.output {
        Some(path) => {
            let mut f = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            f.write_all(compilation.assembly.as_bytes())?;
        }
        None => print!("{}", compilation.assembly),
    }

    Ok(())
}

fn read_source(path: Option<&PathBuf>) -> Result<String> {
    let src = match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    Ok(src)
}

#[derive(Debug, StructOpt)]
#[structopt(name = "minic", about = "Compiles a small C subset to x86-64 NASM")]
struct Opt {
    /// Source file; stdin when absent
    path: Option<PathBuf>,

    #[structopt(name = "lex", long)]
    lex: bool,

    #[structopt(name = "parse", long)]
    parse: bool,

    #[structopt(name = "validate", long)]
    validate: bool,

    #[structopt(name = "symbols", long)]
    symbols: bool,

    #[structopt(name = "lenient", long)]
    lenient: bool,

    #[structopt(name = "recover", long)]
    recover: bool,

    #[structopt(name = "skip-unknown", long)]
    skip_unknown: bool,

    #[structopt(name = "no-optimize", long)]
    no_optimize: bool,

    #[structopt(name = "output", short = "o", long, parse(from_os_str))]
    output: Option<PathBuf>,

    #[structopt(name = "verbose", short = "v", long)]
    verbose: bool,
}

impl Opt {
    fn options(&self) -> Options {
        Options {
            lex_mode: if self.skip_unknown {
                LexMode::Skip
            } else {
                LexMode::Strict
            },
            parse_mode: if self.recover {
                ParseMode::Recover
            } else {
                ParseMode::FailFast
            },
            analysis_mode: if self.lenient {
                AnalysisMode::Lenient
            } else {
                AnalysisMode::Strict
            },
            optimize: !self.no_optimize,
        }
    }
}
