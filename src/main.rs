use clap::{Parser, Subcommand};
use dogpix::app::settings::{
    HeadReset, NavigatorSettings, ViewerSettings, DEFAULT_API_BASE, DEFAULT_TOTAL_IMAGES,
};
use dogpix::app::{NavError, NavSnapshot, Step, Viewer};
use dogpix::input::{GestureMapper, InputEvent, KeyCode, NavIntent};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "dogpix")]
#[command(about = "Page through a random image feed from the terminal")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Base URL of the image API
    #[arg(long = "api-base", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Directory holding the favorites record (default: platform data dir)
    #[arg(long = "data-dir")]
    data_dir: Option<PathBuf>,

    /// Claimed size of the remote catalog
    #[arg(long = "total-images", default_value_t = DEFAULT_TOTAL_IMAGES)]
    total_images: u32,

    /// Request timeout in seconds, 0 disables it
    #[arg(long = "timeout-secs", default_value_t = 30)]
    timeout_secs: u64,

    /// Skip the short pause after each fetch
    #[arg(long = "no-settle-delay", default_value_t = false, action = clap::ArgAction::SetTrue)]
    no_settle_delay: bool,

    /// Counter value after stepping back past the first image (default: random 0-9)
    #[arg(long = "head-reset")]
    head_reset: Option<u32>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Browse interactively (default)
    Browse,
    /// Upload an image to the catalog
    Submit {
        path: PathBuf,
    },
    /// List saved favorites
    Favorites,
}

impl Args {
    fn settings(&self) -> ViewerSettings {
        let defaults = NavigatorSettings::default();
        ViewerSettings {
            api_base: self.api_base.clone(),
            request_timeout: (self.timeout_secs > 0)
                .then(|| Duration::from_secs(self.timeout_secs)),
            data_dir: self.data_dir.clone(),
            navigator: NavigatorSettings {
                total_images: self.total_images,
                settle_delay: if self.no_settle_delay { None } else { defaults.settle_delay },
                head_reset: self.head_reset.map(HeadReset::Fixed).unwrap_or(HeadReset::Random),
            },
            ..ViewerSettings::default()
        }
    }
}

const HELP: &str = "\
  j / down / <enter>   next image
  k / up               previous image
  f                    toggle favorite
  favs                 list favorites
  unfav <n>            remove favorite number n
  save [dir]           write current image to dir (default .)
  submit <path>        upload an image
  q                    quit";

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = Args::parse();
    let viewer = match Viewer::from_settings(args.settings()) {
        Ok(viewer) => viewer,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    match args.command.unwrap_or(Command::Browse) {
        Command::Browse => browse(&viewer).await,
        Command::Submit { path } => match viewer.submit_image(&path).await {
            Ok(()) => println!("Image submitted successfully!"),
            Err(e) => {
                eprintln!("Upload failed: {}", e);
                std::process::exit(1);
            }
        },
        Command::Favorites => print_favorites(&viewer),
    }
}

async fn browse(viewer: &Viewer) {
    if let Err(e) = viewer.initialize().await {
        report_nav_error(&e);
    }
    print_status(&viewer.snapshot(), viewer.is_favorite());
    println!("Type 'help' for commands.");

    let mut gestures = GestureMapper::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        };
        let (word, rest) = match line.trim().split_once(' ') {
            Some((word, rest)) => (word, rest.trim()),
            None => (line.trim(), ""),
        };

        match word {
            "q" | "quit" => break,
            "help" | "?" => println!("{}", HELP),
            "favs" => print_favorites(viewer),
            "unfav" => unfavorite(viewer, rest),
            "save" => {
                let dir = if rest.is_empty() { PathBuf::from(".") } else { PathBuf::from(rest) };
                match viewer.download_current(&dir).await {
                    Ok(Some(path)) => println!("Saved {}", path.display()),
                    Ok(None) => println!("Nothing to save yet."),
                    Err(e) => eprintln!("Save failed: {}", e),
                }
            }
            "submit" => match viewer.submit_image(&PathBuf::from(rest)).await {
                Ok(()) => println!("Image submitted successfully!"),
                Err(e) => eprintln!("Upload failed: {}", e),
            },
            "f" => match viewer.toggle_favorite() {
                Ok(Some(true)) => println!("Added to favorites."),
                Ok(Some(false)) => println!("Removed from favorites."),
                Ok(None) => println!("Nothing to favorite yet."),
                Err(e) => eprintln!("Could not save favorites: {}", e),
            },
            _ => {
                let event = InputEvent::KeyDown { keycode: KeyCode::from_name(word) };
                let loading = viewer.snapshot().loading;
                match gestures.handle(&event, Instant::now(), loading) {
                    Some(intent) => navigate(viewer, intent).await,
                    None => println!("Unknown command '{}'. Type 'help'.", word),
                }
            }
        }
    }
}

async fn navigate(viewer: &Viewer, intent: NavIntent) {
    let result = match intent {
        NavIntent::Next => viewer.next().await,
        NavIntent::Previous => viewer.previous().await,
    };

    match result {
        Ok(Step::Skipped(reason)) => log::debug!("Navigation skipped: {:?}", reason),
        Ok(_) => {}
        Err(e) => report_nav_error(&e),
    }
    print_status(&viewer.snapshot(), viewer.is_favorite());
}

fn report_nav_error(err: &NavError) {
    match err {
        NavError::Fetch(e) if e.is_timeout() => {
            eprintln!("Timed out waiting for an image. Try again, or raise --timeout-secs.")
        }
        e => eprintln!("Could not load an image: {}", e),
    }
}

fn print_status(snapshot: &NavSnapshot, favorite: bool) {
    let Some((id, node)) = &snapshot.current else {
        println!("[no image]");
        return;
    };

    let kind = node
        .url
        .strip_prefix("data:")
        .and_then(|rest| rest.split(';').next())
        .unwrap_or("remote");
    println!(
        "{}/{}  #{}  {}x{} ({}x{} full)  {}  {} chars{}",
        snapshot.display_index,
        snapshot.total_images,
        id.index(),
        node.display_size.width,
        node.display_size.height,
        node.display_size.full_width,
        node.display_size.full_height,
        kind,
        node.url.len(),
        if favorite { "  ♥" } else { "" }
    );
}

fn print_favorites(viewer: &Viewer) {
    let favorites = viewer.favorites();
    println!("{} images", favorites.len());
    for (i, url) in favorites.iter().enumerate() {
        println!("{:>3}. {}", i + 1, abbreviate(url));
    }
}

fn unfavorite(viewer: &Viewer, arg: &str) {
    let favorites = viewer.favorites();
    let Some(url) = arg
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| favorites.iter().nth(i))
    else {
        println!("No favorite numbered '{}'.", arg);
        return;
    };

    match viewer.remove_favorite_url(url) {
        Ok(_) => println!("Removed favorite {}.", arg),
        Err(e) => eprintln!("Could not save favorites: {}", e),
    }
}

fn abbreviate(url: &str) -> String {
    const MAX: usize = 72;
    if url.chars().count() <= MAX {
        url.to_string()
    } else {
        let head: String = url.chars().take(MAX).collect();
        format!("{}…", head)
    }
}
