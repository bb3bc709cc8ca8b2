use std::io::Write;

use clap::Parser;

use glyphframe::cli::Args;
use glyphframe::config::PreviewConfig;
use glyphframe::pipeline::Pipeline;
use glyphframe::source::FfmpegSource;

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // Help and version go to stdout and are not failures
            let _ = e.print();
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.log_filter()))
        .target(env_logger::Target::Stderr)
        .init();

    let config = match PreviewConfig::load(args.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut pipeline = match Pipeline::new(&config) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let tools = config.tools();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let result = pipeline.run(|| FfmpegSource::open(&args.input, &tools), &mut out);
    let _ = out.flush();

    match result {
        Ok(outcome) => {
            log::info!(
                "Displayed {} frame(s) at {}",
                outcome.frames_displayed,
                outcome.geometry
            );
        }
        Err(e) => {
            log::debug!("pipeline finished in state {:?}", pipeline.state());
            eprintln!("Error [{}]: {}", e.kind(), e);
            std::process::exit(1);
        }
    }
}
