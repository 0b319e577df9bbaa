//! Renders the built-in OPL3 pattern to a raw PCM file. Play it back with
//! something like `aplay -f S16_LE -c 2 -r <rate> opl3-demo.raw`.

mod cli;
mod config;
mod demo;

use std::{
    error::Error,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use cli::*;
use log::info;
use opl3_emulator::Chip;
use simplelog::TermLogger;

fn main() -> Result<(), Box<dyn Error>> {
    let options: CLIOptions = argh::from_env();

    TermLogger::init(
        options.verbose.unwrap_or(log::LevelFilter::Info),
        simplelog::ConfigBuilder::default()
            .set_time_level(log::LevelFilter::Trace)
            .build(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let mut opl_config = config::load(options.config.as_deref().map(Path::new))?;
    config::sync_cli(&mut opl_config, &options);

    let mut chip = Chip::with_config(&opl_config)?;
    demo::place_voices(&mut chip);

    let rate = opl_config.output_rate;
    let frames = demo::total_frames(rate, options.loops).ok_or_else(|| {
        format!(
            "{} loops at {} Hz is too long to render",
            options.loops, rate
        )
    })?;
    let events = demo::pattern(rate, options.loops);

    let mut writer = BufWriter::new(File::create(&options.output)?);
    demo::play(&mut chip, &events, frames, &mut writer)?;
    writer.flush()?;

    info!(
        "Wrote {} frames of stereo s16le at {} Hz to {}",
        frames, rate, options.output
    );
    Ok(())
}
