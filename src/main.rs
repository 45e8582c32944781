use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "text-image-styler",
    version,
    about = "Overlay styled text on an image"
)]
struct Cli {
    /// Source image (any format the image decoder understands)
    #[arg(short = 'i', long = "image")]
    image: Option<PathBuf>,

    /// Text to draw (read from stdin when omitted)
    #[arg(short = 't', long = "text")]
    text: Option<String>,

    /// Style options as a JSON object, inline or a path to a .json file
    #[arg(short = 's', long = "style")]
    style: Option<String>,

    /// Single style option (e.g. --set font_size=64); repeatable
    #[arg(long = "set", value_name = "KEY=VALUE")]
    set: Vec<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Directory outputs are written below (overrides settings)
    #[arg(long = "media-root")]
    media_root: Option<String>,

    /// Do not download fonts from the web font service
    #[arg(long = "no-remote-fonts")]
    no_remote_fonts: bool,

    /// Print the font the style resolves to and exit
    #[arg(long = "show-font")]
    show_font: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    text_image_styler::logging::init(cli.verbose)?;

    let input = if cli.text.is_none() && !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Some(buffer)
    } else {
        None
    };

    let config = text_image_styler::Config {
        image: cli.image,
        text: cli.text,
        style: cli.style,
        set: cli.set,
        settings_path: cli.read_settings,
        media_root: cli.media_root,
        no_remote_fonts: cli.no_remote_fonts,
        show_font: cli.show_font,
    };
    let output = text_image_styler::run(config, input).await?;
    println!("{}", output);
    Ok(())
}
