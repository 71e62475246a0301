use clap::Parser;
use miette::Result;
use nxconv::cli::{Cli, Commands};
use nxconv::core::logging::init_tracing;

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping `--generate-template` into `head` panics on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    init_tracing(global.verbose, global.quiet);

    match cli.command {
        Commands::Convert(args) => nxconv::cli::commands::convert::run(args, &global),
        Commands::Readers => nxconv::cli::commands::readers::run(&global),
    }
}
