//! KML Factory CLI
//!
//! Turns KML documents into construction scripts and back, validates them
//! against the bundled KML schemas, and re-serializes them canonically.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};

use clap::{Parser, Subcommand};
use kml_factory::{
    parse_file, print_to_string, print_to_string_pretty, read_construction_script,
    write_construction_script, Element, NamespaceRegistry, Schema, KML22_GX_SCHEMA,
};
use tracing_subscriber::EnvFilter;

/// KML document construction tool
#[derive(Parser)]
#[command(name = "kml")]
#[command(version)]
#[command(about = "Build, validate and script KML documents", long_about = None)]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the construction script that rebuilds a KML file
    #[command(visible_alias = "s")]
    Script {
        /// KML file
        file: String,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Validate a KML file against a bundled schema
    Validate {
        /// KML file
        file: String,
        /// Schema resource: ogckml22.xsd or kml22gx.xsd
        #[arg(short, long, default_value = KML22_GX_SCHEMA)]
        schema: String,
        /// Load the schema from this directory instead of the bundled copy
        #[arg(long)]
        schema_dir: Option<String>,
    },

    /// Re-serialize a KML file in canonical form
    Fmt {
        /// KML file
        file: String,
        /// Indent nested elements
        #[arg(short, long)]
        pretty: bool,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Execute a construction script and print the document
    #[command(visible_alias = "r")]
    Run {
        /// Construction script
        script: String,
        /// Indent nested elements
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() -> std::process::ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Script { file, output } => run_script(&file, output.as_deref()),
        Commands::Validate {
            file,
            schema,
            schema_dir,
        } => run_validate(&file, &schema, schema_dir.as_deref()),
        Commands::Fmt {
            file,
            pretty,
            output,
        } => run_fmt(&file, pretty, output.as_deref()),
        Commands::Run { script, pretty } => run_run(&script, pretty),
    };

    match result {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

/// Opens the output file, or stdout when none is given.
fn output_writer(output_path: Option<&str>) -> io::Result<Box<dyn Write>> {
    Ok(match output_path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(io::stdout()),
    })
}

fn serialize(doc: &Element, registry: &NamespaceRegistry, pretty: bool) -> io::Result<String> {
    if pretty {
        print_to_string_pretty(doc, registry)
    } else {
        print_to_string(doc, registry).map(|mut xml| {
            xml.push('\n');
            xml
        })
    }
}

/// Writes the construction script of a KML file.
fn run_script(file: &str, output_path: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let registry = NamespaceRegistry::kml();
    tracing::info!(file, "Parsing document");
    let doc = parse_file(file)?;

    let mut output = output_writer(output_path)?;
    output.write_all(write_construction_script(&doc, &registry).as_bytes())?;
    output.flush()?;
    Ok(())
}

/// Validates a KML file, listing every issue with its line in the file.
fn run_validate(
    file: &str,
    schema_name: &str,
    schema_dir: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let schema = match schema_dir {
        Some(dir) => Schema::open_in(dir, schema_name)?,
        None => Schema::open(schema_name)?,
    };
    let xml = fs::read_to_string(file)?;

    let report = schema.validate_xml(&xml);
    if report.is_valid() {
        println!("{}: valid against {}", file, schema.name());
        return Ok(());
    }

    for issue in report.issues() {
        println!("{}", issue);
    }
    Err(format!(
        "{} is not valid against {} ({} issues)",
        file,
        schema.name(),
        report.issues().len()
    )
    .into())
}

/// Re-serializes a KML file.
fn run_fmt(
    file: &str,
    pretty: bool,
    output_path: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let registry = NamespaceRegistry::kml();
    let doc = parse_file(file)?;

    let mut output = output_writer(output_path)?;
    output.write_all(serialize(&doc, &registry, pretty)?.as_bytes())?;
    output.flush()?;
    Ok(())
}

/// Executes a construction script and prints the document it builds.
fn run_run(script_path: &str, pretty: bool) -> Result<(), Box<dyn std::error::Error>> {
    let registry = NamespaceRegistry::kml();
    let script = fs::read_to_string(script_path)?;
    let doc = read_construction_script(&script, &registry)?;

    print!("{}", serialize(&doc, &registry, pretty)?);
    Ok(())
}
