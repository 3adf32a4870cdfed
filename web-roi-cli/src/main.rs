use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use std::io::Read;
use std::path::{Path, PathBuf};

use web_roi::{capture_screen_with, ImageFormat, NodeConfig, NodeRegistry, PngCompression};

#[derive(Parser)]
#[command(name = "web-roi-cli")]
#[command(about = "Run the Web ROI capture node outside a host", long_about = None)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true, default_value_t)]
    verbose: bool,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true, default_value_t)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Decode a data URL into an image tensor
    Decode {
        /// File containing the data URL (`-` for stdin)
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        /// Value of the `trigger_always` input
        #[arg(short, long, default_value_t = 0)]
        trigger: u64,

        /// Node config (JSON)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Save the resulting tensor as an image
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Exit with an error if the placeholder was produced
        #[arg(long, default_value_t)]
        strict: bool,
    },

    /// Encode an image file as a data URL, like the capture widget does
    Encode {
        /// Input image
        #[arg(value_name = "IMAGE")]
        input: PathBuf,

        /// Image format
        #[arg(short, long, value_enum, default_value_t = FormatArg::Jpeg)]
        format: FormatArg,

        /// JPEG quality (1-100)
        #[arg(long, value_name = "QUALITY", default_value_t = 70)]
        quality: u8,

        /// PNG compression level
        #[arg(long, value_enum, default_value_t = PngCompressionArg::Default)]
        png_compression: PngCompressionArg,
    },

    /// Print the node registry as JSON
    Describe,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Jpeg,
    Png,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum PngCompressionArg {
    Fast,
    Default,
    Best,
}

impl From<PngCompressionArg> for PngCompression {
    fn from(arg: PngCompressionArg) -> Self {
        match arg {
            PngCompressionArg::Fast => PngCompression::Fast,
            PngCompressionArg::Default => PngCompression::Default,
            PngCompressionArg::Best => PngCompression::Best,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(args.verbose, args.quiet);

    match args.command {
        Command::Decode {
            input,
            trigger,
            config,
            output,
            strict,
        } => decode(&input, trigger, config.as_deref(), output.as_deref(), strict),
        Command::Encode {
            input,
            format,
            quality,
            png_compression,
        } => {
            let format = match format {
                FormatArg::Jpeg => {
                    if !(1..=100).contains(&quality) {
                        anyhow::bail!("Quality must be between 1 and 100");
                    }
                    ImageFormat::Jpeg { quality }
                }
                FormatArg::Png => ImageFormat::Png {
                    compression: png_compression.into(),
                },
            };
            encode(&input, format)
        }
        Command::Describe => {
            let manifest = NodeRegistry::default().manifest();
            println!("{}", serde_json::to_string_pretty(&manifest)?);
            Ok(())
        }
    }
}

fn decode(
    input: &Path,
    trigger: u64,
    config: Option<&Path>,
    output: Option<&Path>,
    strict: bool,
) -> Result<()> {
    let config = match config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };

    let data = read_input(input)?;
    let capture = capture_screen_with(&config, data.trim_end(), trigger);
    let [batch, height, width, channels] = capture.image().shape();

    match capture.reason() {
        Some(reason) if strict => anyhow::bail!("Placeholder produced: {reason}"),
        Some(reason) => log::warn!("Placeholder produced: {reason}"),
        None => log::info!("Decoded {width}x{height} image"),
    }
    println!("({batch}, {height}, {width}, {channels})");

    if let Some(output) = output {
        capture
            .image()
            .to_rgb_image()
            .save(output)
            .with_context(|| format!("Failed to write {}", output.display()))?;
        log::info!("Wrote {}", output.display());
    }

    Ok(())
}

fn encode(input: &Path, format: ImageFormat) -> Result<()> {
    let img = image::open(input).with_context(|| format!("Failed to open {}", input.display()))?;
    let url = web_roi::image::to_data_url(&img, format)?;
    println!("{url}");
    Ok(())
}

fn read_input(input: &Path) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut data = String::new();
        std::io::stdin()
            .read_to_string(&mut data)
            .context("Failed to read stdin")?;
        return Ok(data);
    }

    std::fs::read_to_string(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn setup_logging(verbose: bool, quiet: bool) {
    let level = if quiet {
        log::LevelFilter::Error
    } else if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .format_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_decode_args() {
        let args = Args::try_parse_from([
            "web-roi-cli",
            "decode",
            "-",
            "--trigger",
            "18446744073709551615",
            "--strict",
            "-q",
        ])
        .unwrap();

        assert!(args.quiet);
        match args.command {
            Command::Decode {
                input,
                trigger,
                strict,
                ..
            } => {
                assert_eq!(input, PathBuf::from("-"));
                assert_eq!(trigger, u64::MAX);
                assert!(strict);
            }
            _ => panic!("expected decode"),
        }
    }

    #[test]
    fn negative_trigger_rejected() {
        assert!(Args::try_parse_from(["web-roi-cli", "decode", "x.txt", "--trigger", "-1"]).is_err());
    }
}
