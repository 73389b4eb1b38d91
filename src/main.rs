use clap::Parser;
use log::{debug, LevelFilter};
use snafu::ErrorCompat;

mod app;
mod args;

fn main() {
    let args = args::Args::parse();

    if args.verbose {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }
    debug!("main: args: {:?}", args);

    if let Err(e) = app::run_query(&args) {
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(e.as_ref()) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
