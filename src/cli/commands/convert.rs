//! `nxconv convert` command - fill an application definition from input files

use clap::builder::PossibleValuesParser;
use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::GlobalOpts;
use crate::core::{Config, Conversion, ConversionOutcome};
use crate::readers::ReaderRegistry;
use crate::writer::JsonTreeWriter;

#[derive(clap::Args, Debug)]
pub struct ConvertArgs {
    /// Input file to read (repeat for several files)
    #[arg(long = "input-file", value_name = "PATH")]
    pub input_file: Vec<PathBuf>,

    /// Reader to use [default: example, or from config]
    #[arg(long, ignore_case = true, value_parser = reader_names())]
    pub reader: Option<String>,

    /// NXDL application definition file
    #[arg(long, value_name = "PATH")]
    pub nxdl: PathBuf,

    /// Output file [default: output.nxs, or from config]
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Print the empty template of the definition and exit
    #[arg(long)]
    pub generate_template: bool,

    /// Do not write the output when validation finds errors
    #[arg(long)]
    pub strict: bool,
}

fn reader_names() -> PossibleValuesParser {
    PossibleValuesParser::new(ReaderRegistry::default().list_available())
}

pub fn run(args: ConvertArgs, global: &GlobalOpts) -> Result<()> {
    let config = Config::load();

    let conversion = Conversion::new(&args.nxdl)
        .reader(args.reader.as_deref().unwrap_or(config.reader()))
        .inputs(args.input_file)
        .output(args.output.unwrap_or_else(|| config.output()))
        .strict(args.strict || config.strict());

    if args.generate_template {
        let generated = conversion.template()?;
        println!("{}", generated.template.skeleton_json());
        return Ok(());
    }

    let outcome = conversion.run(&JsonTreeWriter)?;
    print_report(&outcome, global);
    Ok(())
}

fn print_report(outcome: &ConversionOutcome, global: &GlobalOpts) {
    let report = &outcome.report;

    for issue in &report.errors {
        eprintln!(
            "{} {}: {}",
            style("✗").red(),
            style(&issue.path).bold(),
            issue.message
        );
    }
    if !global.quiet {
        for issue in &report.warnings {
            eprintln!(
                "{} {}: {}",
                style("!").yellow(),
                issue.path,
                style(&issue.message).dim()
            );
        }
    }

    let total = report.statuses().count();
    let filled = report.filled_count();
    if global.quiet {
        return;
    }
    if report.is_valid() {
        println!(
            "{} Wrote {} for {} ({}/{} template paths filled)",
            style("✓").green().bold(),
            style(outcome.output.display()).cyan(),
            outcome.nxdl_name,
            style(filled).green(),
            total
        );
    } else {
        println!(
            "{} Wrote {} for {} with {} validation error(s) ({}/{} template paths filled)",
            style("!").yellow().bold(),
            style(outcome.output.display()).cyan(),
            outcome.nxdl_name,
            style(report.errors.len()).red(),
            style(filled).yellow(),
            total
        );
    }
}
