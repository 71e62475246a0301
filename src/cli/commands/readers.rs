//! `nxconv readers` command - list discovered readers

use console::style;
use miette::Result;
use tabled::{builder::Builder, settings::Style};

use crate::cli::GlobalOpts;
use crate::readers::ReaderRegistry;

pub fn run(global: &GlobalOpts) -> Result<()> {
    let registry = ReaderRegistry::default();
    let names = registry.list_available();

    let mut table = Builder::default();
    table.push_record(["Reader", "Supported definitions"]);
    for name in &names {
        let reader = registry.load(name)?;
        table.push_record([name.to_string(), reader.supported_nxdls().join(", ")]);
    }

    println!("{}", table.build().with(Style::markdown()));
    if !global.quiet {
        println!(
            "\n{} reader(s) available. Select one with {}",
            style(names.len()).cyan(),
            style("nxconv convert --reader <NAME>").bold()
        );
    }
    Ok(())
}
