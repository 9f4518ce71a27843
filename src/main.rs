use clap::{Parser, Subcommand};
use perzip::archive::ARCHIVE_EXTENSION;
use perzip::cli::{compress_to_file, extract_from_file, show_archive, CompressOptions, ExtractOptions};
use perzip::PerzipError;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Version info from build.rs
const VERSION: &str = env!("PERZIP_VERSION");
const BUILD: &str = env!("PERZIP_BUILD");
const PROFILE: &str = env!("PERZIP_PROFILE");
const GIT_HASH: &str = env!("PERZIP_GIT_HASH");

fn get_version() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} {} build {} ({})", PROFILE, VERSION, BUILD, GIT_HASH))
}

#[derive(Parser)]
#[command(name = "perzip")]
#[command(author, about = "Encrypted, Huffman-compressed file archiver", long_about = None)]
struct Cli {
    /// Print version
    #[arg(short = 'V', long)]
    version: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Archive a file or directory
    #[command(alias = "c")]
    Compress {
        /// File or directory to archive
        input: PathBuf,

        /// Output archive (must end in .perzip)
        output: PathBuf,

        /// First prime key seed
        #[arg(long = "prime1", env = "PRIME1")]
        p: u32,

        /// Second prime key seed
        #[arg(long = "prime2", env = "PRIME2")]
        q: u32,

        /// Worker threads (defaults to all cores)
        #[arg(long, env = "PERZIP_THREADS")]
        threads: Option<usize>,
    },

    /// Extract files from an archive
    #[command(alias = "d")]
    Decompress {
        /// Archive to read
        input: PathBuf,

        /// Existing directory to extract into
        output: PathBuf,

        /// Regex selecting entries; a trailing "/*" strips the matched prefix
        pattern: Option<String>,

        /// Worker threads (defaults to all cores)
        #[arg(long, env = "PERZIP_THREADS")]
        threads: Option<usize>,
    },

    /// List the files inside an archive
    #[command(alias = "s")]
    Show {
        /// Archive to inspect
        input: PathBuf,
    },
}

fn init_logging(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn has_archive_extension(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some(ARCHIVE_EXTENSION)
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if cli.version {
        println!("perzip {}", get_version());
        return ExitCode::SUCCESS;
    }

    let command = match cli.command {
        Some(cmd) => cmd,
        None => {
            use clap::CommandFactory;
            if Cli::command().print_help().is_err() {
                return ExitCode::FAILURE;
            }
            println!();
            return ExitCode::SUCCESS;
        }
    };

    init_logging(cli.quiet);

    let result = match command {
        Commands::Compress {
            input,
            output,
            p,
            q,
            threads,
        } => {
            if !has_archive_extension(&output) {
                Err(PerzipError::Configuration(format!(
                    "output file must have '.{}' extension",
                    ARCHIVE_EXTENSION
                )))
            } else if !input.exists() {
                Err(PerzipError::Configuration(format!(
                    "input '{}' does not exist",
                    input.display()
                )))
            } else {
                let options = CompressOptions { p, q, threads };
                compress_to_file(&input, &output, &options).map(|count| {
                    println!("Archived {} files to {}", count, output.display());
                })
            }
        }

        Commands::Decompress {
            input,
            output,
            pattern,
            threads,
        } => {
            if !output.is_dir() {
                Err(PerzipError::Configuration(format!(
                    "output path '{}' must be a directory",
                    output.display()
                )))
            } else {
                let options = ExtractOptions {
                    pattern: pattern.unwrap_or_default(),
                    threads,
                };
                extract_from_file(&input, &output, &options).map(|report| {
                    println!(
                        "Extracted {} files to {} ({} skipped)",
                        report.written.len(),
                        output.display(),
                        report.skipped.len()
                    );
                })
            }
        }

        Commands::Show { input } => show_archive(&input).map(|listing| {
            print!("{}", listing);
        }),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
