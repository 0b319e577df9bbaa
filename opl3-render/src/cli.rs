use argh::FromArgs;
use log::LevelFilter;

/// Render the built-in OPL3 demo pattern to raw PCM
#[derive(Debug, Clone, FromArgs)]
pub struct CLIOptions {
    /// verbose level: off, error, warn, info, debug, trace
    #[argh(option)]
    pub verbose: Option<LevelFilter>,
    /// output file, signed 16-bit little endian interleaved stereo
    #[argh(option, default = "String::from(\"opl3-demo.raw\")")]
    pub output: String,
    /// chip config in RON, defaults to opl3-render/opl.ron in the user config
    /// dir
    #[argh(option)]
    pub config: Option<String>,
    /// output sample rate in Hz, overrides the config
    #[argh(option)]
    pub rate: Option<u32>,
    /// continuous panning, overrides the config
    #[argh(option)]
    pub full_pan: Option<bool>,
    /// how many times to play the pattern
    #[argh(option, default = "1")]
    pub loops: u32,
}
