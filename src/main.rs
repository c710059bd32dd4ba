use std::path::PathBuf;

use clap::{
    CommandFactory, Parser, Subcommand,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use clap_complete::{Shell, generate};

use grabnetease::{cli, config, error, types::AudioQuality};

fn styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::White.on_default() | Effects::BOLD)
        .usage(AnsiColor::White.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightBlue.on_default())
        .placeholder(AnsiColor::BrightGreen.on_default())
}

#[derive(Parser, Debug, Clone)]
#[clap(
  version = env!("CARGO_PKG_VERSION"),
  name=env!("CARGO_PKG_NAME"),
  bin_name=env!("CARGO_PKG_NAME"),
  about=env!("CARGO_PKG_DESCRIPTION"),
  styles=styles(),
)]
struct Cli {
    /// Root of the download tree (defaults to GRAB_DOWNLOAD_DIR or ./Download)
    #[clap(long, global = true)]
    download_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in by scanning a QR code with the NetEase Cloud Music app
    Login,

    /// End the stored session
    Logout,

    /// Show the logged-in account
    Status,

    /// Download an album into the music library
    Album(AlbumOptions),

    /// Move a local audio file into the music library
    Organize(OrganizeOptions),

    /// Get shell completions
    Completions(CompletionsOption),
}

#[derive(Parser, Debug, Clone)]
pub struct AlbumOptions {
    /// Album URL or numeric ID; asked for when omitted
    pub input: Option<String>,

    /// standard, higher, exhigh, lossless or hires (defaults to GRAB_QUALITY)
    #[clap(long, short)]
    pub quality: Option<AudioQuality>,
}

#[derive(Parser, Debug, Clone)]
pub struct OrganizeOptions {
    /// Audio file to move
    pub file: PathBuf,
    #[clap(long)]
    pub artist: String,
    #[clap(long)]
    pub album: String,
    #[clap(long)]
    pub year: i32,
    #[clap(long, default_value_t = 1)]
    pub disc: u32,
    #[clap(long)]
    pub track: u32,
    #[clap(long)]
    pub title: String,
}

#[derive(Parser, Debug, Clone)]
pub struct CompletionsOption {
    shell: Shell,
}

#[tokio::main]
async fn main() {
    if let Err(e) = config::load_env().await {
        error!("Cannot load environment. Err: {}", e);
    }

    let cli = Cli::parse();
    let download_dir = cli::resolve_download_dir(cli.download_dir.as_deref());

    match cli.command {
        Some(Command::Login) => cli::login().await,
        Some(Command::Logout) => cli::logout().await,
        Some(Command::Status) => cli::status().await,
        Some(Command::Album(opt)) => {
            let quality = opt.quality.unwrap_or_else(config::quality);
            cli::album(opt.input, quality, download_dir).await
        }
        None => cli::album(None, config::quality(), download_dir).await,
        Some(Command::Organize(opt)) => {
            let request = cli::OrganizeRequest {
                file: opt.file,
                artist: opt.artist,
                album: opt.album,
                year: opt.year,
                disc: opt.disc,
                track: opt.track,
                title: opt.title,
            };
            cli::organize(request, download_dir).await
        }
        Some(Command::Completions(opt)) => {
            let mut cmd = Cli::command_for_update();
            let name = cmd.get_name().to_string();
            generate(opt.shell, &mut cmd, name, &mut std::io::stdout())
        }
    }
}
