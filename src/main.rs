use clap::builder::NonEmptyStringValueParser;
use clap::{ArgAction, Parser, Subcommand};
use cloudphoto::config::{self, Config};
use cloudphoto::output;
use cloudphoto::repository::Repository;
use cloudphoto::site;
use cloudphoto::store::S3Store;
use cloudphoto::template::Templates;
use dialoguer::{Input, Password};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cloudphoto")]
#[command(about = "Photo albums in an S3-compatible bucket, published as a static site")]
#[command(long_about = "\
Photo albums in an S3-compatible bucket, published as a static site

Albums are key prefixes in the configured bucket. A photo uploaded from
vacation/beach.jpg with --album vacation is stored as:

  vacation/beach

'mksite' turns the bucket into a public website with one page per album
(album1.html, album2.html, ... in album-name order), an index.html linking
them, and an error.html.

Run 'cloudphoto init' first to write the config file.")]
#[command(version = env!("CLOUDPHOTO_VERSION"))]
struct Cli {
    /// Config file (default: ~/.config/cloudphoto/cloudphotorc)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory with index.html, album.html and error.html templates
    #[arg(long, global = true)]
    templates: Option<PathBuf>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Upload the .jpg/.jpeg files of a directory into an album
    Upload {
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        album: String,
        /// Directory to read photos from
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Download every photo of an album into a directory
    Download {
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        album: String,
        /// Directory to write photos to
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// List albums, or the photos of one album
    List {
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        album: Option<String>,
    },
    /// Delete an album, or one photo of it
    Delete {
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        album: String,
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        photo: Option<String>,
    },
    /// Publish the bucket as a static website and print its URL
    Mksite,
    /// Write the config file and make sure the bucket exists
    Init,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Upload { .. } => "upload",
            Command::Download { .. } => "download",
            Command::List { .. } => "list",
            Command::Delete { .. } => "delete",
            Command::Mksite => "mksite",
            Command::Init => "init",
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            eprintln!("Can not {}", cli.command.name());
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("cloudphoto={level},warn")));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_path()?,
    };
    let open = || -> Result<Repository<S3Store>, Box<dyn std::error::Error>> {
        connect(&config::load(&config_path)?)
    };

    match &cli.command {
        Command::Upload { album, path } => {
            let report = open()?.upload(album, path)?;
            output::print_lines(&output::format_upload(album, &report));
        }
        Command::Download { album, path } => {
            let report = open()?.download(album, path)?;
            output::print_lines(&output::format_download(album, path, &report));
        }
        Command::List { album: None } => {
            let albums = open()?.list_albums()?;
            output::print_lines(&output::format_list(&albums));
        }
        Command::List { album: Some(album) } => {
            let photos = open()?.list_photos(album)?;
            output::print_lines(&output::format_list(&photos));
        }
        Command::Delete {
            album,
            photo: Some(photo),
        } => {
            open()?.delete_photo(album, photo)?;
            output::print_lines(&output::format_delete_photo(album, photo));
        }
        Command::Delete { album, photo: None } => {
            let deleted = open()?.delete_album(album)?;
            output::print_lines(&output::format_delete_album(album, deleted));
        }
        Command::Mksite => {
            let templates = Templates::resolve(cli.templates.as_deref())?;
            let report = site::publish(&open()?, &templates)?;
            output::print_lines(&output::format_site(&report));
        }
        Command::Init => init(&config_path)?,
    }

    Ok(())
}

/// Open an S3 session for `config` and create its bucket when missing.
fn connect(config: &Config) -> Result<Repository<S3Store>, Box<dyn std::error::Error>> {
    let store = S3Store::connect(config)?;
    let repo = Repository::new(store, config.bucket.clone());
    if repo.ensure_bucket(&config.region)? {
        info!(bucket = %config.bucket, "Created bucket");
    }
    Ok(repo)
}

fn init(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let access_key_id: String = Input::new()
        .with_prompt("aws_access_key_id")
        .interact_text()?;
    let secret_access_key: String = Password::new()
        .with_prompt("aws_secret_access_key")
        .interact()?;
    let bucket: String = Input::new().with_prompt("bucket").interact_text()?;

    let config = Config::new(&access_key_id, &secret_access_key, &bucket);
    config::save(config_path, &config)?;
    info!(path = %config_path.display(), "Wrote config");

    connect(&config)?;
    println!("Config written to {}", config_path.display());
    Ok(())
}
