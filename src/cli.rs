use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;
use image_compressor_lib::{GifOptimizerConfig, LogMode, Quality, RunConfig};

/// Recompress every image under a directory, in place.
#[derive(Parser, Debug)]
#[command(name = "image-compressor", version, about)]
pub struct Cli {
    /// Directory to scan recursively
    pub directory: PathBuf,

    /// JPEG quality, 1-100. Higher keeps more detail.
    #[arg(short, long, default_value_t = 85, value_parser = clap::value_parser!(u32).range(1..=100))]
    pub quality: u32,

    /// Only process these extensions (comma separated, e.g. jpg,png)
    #[arg(short, long, value_delimiter = ',')]
    pub formats: Vec<String>,

    /// External GIF optimizer binary
    #[arg(long, env = "IMAGE_COMPRESSOR_GIF_OPTIMIZER", default_value = "gifsicle")]
    pub gif_optimizer: String,

    /// Argument for the GIF optimizer; repeatable, supports {input} and {output}
    #[arg(long = "gif-optimizer-arg", allow_hyphen_values = true)]
    pub gif_optimizer_args: Vec<String>,

    /// Seconds before a hung GIF optimizer is killed
    #[arg(long, default_value_t = 60)]
    pub gif_timeout: u64,

    /// Write the error log once at the end instead of after each failure
    #[arg(long)]
    pub log_at_end: bool,

    /// Print the run summary as JSON on stdout
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    pub fn to_config(&self) -> anyhow::Result<RunConfig> {
        let mut gif_optimizer = GifOptimizerConfig {
            program: self.gif_optimizer.clone(),
            timeout: Duration::from_secs(self.gif_timeout),
            ..GifOptimizerConfig::default()
        };
        if !self.gif_optimizer_args.is_empty() {
            gif_optimizer.args = self.gif_optimizer_args.clone();
        }

        let mut config = RunConfig::new(&self.directory)
            .with_quality(Quality::new(self.quality)?)
            .with_gif_optimizer(gif_optimizer)
            .with_log_mode(if self.log_at_end {
                LogMode::AtEnd
            } else {
                LogMode::Incremental
            });

        if !self.formats.is_empty() {
            config = config.with_extensions(&self.formats);
        }

        Ok(config)
    }
}
