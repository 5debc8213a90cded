use anyhow::{Context, Result};

mod args;
mod cmd_commit;
mod cmd_payload;
mod cmd_sign;
mod cmd_verify;

use args::GlobalArgs;

fn configure_tracing(global_args: &GlobalArgs) -> Result<()> {
    use tracing_log::{AsLog, LogTracer};
    use tracing_subscriber::filter::LevelFilter;

    let filter = match global_args.verbose {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };

    LogTracer::builder()
        .with_max_level(filter.as_log())
        .init()?;

    // Log to stderr, so that payloads and signatures on stdout can be piped
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(filter)
        .with_ansi(global_args.use_color_stderr())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn configure_color(global_args: &GlobalArgs) {
    console::set_colors_enabled(global_args.use_color());
    console::set_colors_enabled_stderr(global_args.use_color_stderr());
}

fn try_main() -> Result<()> {
    let args = &args::CommandLineArgs::parse_args();
    let global_args = &args.global_args;

    configure_color(global_args);
    configure_tracing(global_args).context("Failed to initialize logging")?;

    match &args.command {
        args::Command::Payload(args) => cmd_payload::run(global_args, args),
        args::Command::Sign(args) => cmd_sign::run(global_args, args),
        args::Command::Verify(args) => cmd_verify::run(global_args, args),
        args::Command::Commit(args) => cmd_commit::run(global_args, args),
    }
}

fn main() {
    if let Err(e) = try_main() {
        eprintln!("Error: {e:?}");
        std::process::exit(2);
    }
}
