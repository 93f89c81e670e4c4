use anyhow::Context;
use clap::{Parser, Subcommand};
use lyclang::CompileOptions;
use std::{fs, path::PathBuf};

#[derive(Parser)]
#[command(name = "lycc", version, about = "LYC stylesheet compiler")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a `.lyc` source file to CSS
    Compile {
        /// the `.lyc` source file
        #[arg(short, long)]
        source: PathBuf,
        /// output path (defaults to the source with a `.css` extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// keep the readable, unminified output
        #[arg(long)]
        pretty: bool,
        /// fail on undefined variables and mixins, warn on unused variables
        #[arg(long)]
        strict: bool,
        /// reserved: source maps are not emitted yet
        #[arg(long)]
        source_map: bool,
    },
    /// Parse and validate without writing any output
    Check {
        /// the `.lyc` source file
        #[arg(short, long)]
        source: PathBuf,
        /// fail on undefined variables and mixins, warn on unused variables
        #[arg(long)]
        strict: bool,
    },
}

fn main() -> anyhow::Result<()> {
    // warnings (unused variables in strict mode) should be visible without
    // RUST_LOG being set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Cli::parse();

    match args.command {
        Commands::Compile {
            source,
            output,
            pretty,
            strict,
            source_map,
        } => {
            let options = CompileOptions {
                minify: !pretty,
                strict,
                source_map,
            };
            let css = compile_file(&source, &options)?;

            let target = output.unwrap_or_else(|| source.with_extension("css"));
            if let Some(parent) = target.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("couldn't create {}", parent.display()))?;
            }
            fs::write(&target, css)
                .with_context(|| format!("couldn't write {}", target.display()))?;
            println!("→ Compiled {} to {}", source.display(), target.display());
        }
        Commands::Check { source, strict } => {
            let text = read_source(&source)?;
            let tokens = lyclang::lexer::tokenize(&text)?;
            let stylesheet = lyclang::parser::parse(&tokens)?;
            if strict {
                for warning in lyclang::semantic::validate(&stylesheet)? {
                    log::warn!("{warning}");
                    eprintln!("warning: {warning}");
                }
            }
            println!("→ {} is valid", source.display());
        }
    }
    Ok(())
}

fn compile_file(source: &PathBuf, options: &CompileOptions) -> anyhow::Result<String> {
    let text = read_source(source)?;
    let css = lyclang::compile(&text, options)
        .with_context(|| format!("failed to compile {}", source.display()))?;
    Ok(css)
}

fn read_source(source: &PathBuf) -> anyhow::Result<String> {
    fs::read_to_string(source).with_context(|| format!("couldn't read {}", source.display()))
}
