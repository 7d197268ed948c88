use clap::Parser;
use meflank::{
    cli::{init_verbose, Cli, Command, FULL_VERSION},
    commands::extendflanks,
    utils::{handle_error_and_exit, Result},
};
use std::{env, time};

fn disable_htslib_logging() {
    if env::var_os("MEFLANK_ENABLE_HTSLIB_LOGGING").is_some() {
        log::debug!("MEFLANK_ENABLE_HTSLIB_LOGGING is set, keeping htslib logging enabled");
        return;
    }
    unsafe {
        use rust_htslib::htslib::{htsLogLevel_HTS_LOG_OFF, hts_set_log_level};
        hts_set_log_level(htsLogLevel_HTS_LOG_OFF);
    }
}

fn runner() -> Result<()> {
    let cli = Cli::parse();
    init_verbose(&cli);
    disable_htslib_logging();
    log::info!(
        "Running {}-{} [{}]",
        env!("CARGO_PKG_NAME"),
        FULL_VERSION,
        cli.command.name()
    );

    let start_timer = time::Instant::now();
    match cli.command {
        Command::Extendflanks(args) => {
            log::trace!("Extendflanks arguments: {:#?}", args);
            args.preflight()?;
            extendflanks::extendflanks(args)?
        }
    }

    log::info!("Total execution time: {:.2?}", start_timer.elapsed());
    log::info!("{} end", env!("CARGO_PKG_NAME"));
    Ok(())
}

fn main() {
    if let Err(e) = runner() {
        handle_error_and_exit(e);
    }
}
