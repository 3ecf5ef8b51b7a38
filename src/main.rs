use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use image::ImageFormat;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::debug;

use contactbook::avatar;
use contactbook::config::{self, Config};
use contactbook::contact::initials_of;
use contactbook::source::{fetch_contacts, VdirSource};
use contactbook::{ContactDetails, Error, SectionedIndex, Selection};

const PERMISSION_ERROR: &str = "Failed to access contacts";
const NO_INFO_ERROR: &str = "No information to show";

#[derive(Parser, Debug)]
#[command(name = "contactbook", about = "Browse contacts grouped by first letter")]
struct Cli {
    /// Configuration file (defaults to the per-user config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// vdir directory or .vcf file to read contacts from
    #[arg(long, global = true)]
    source: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every section with its contacts
    List(ListArgs),
    /// Print the section titles used for quick jumps
    Titles,
    /// Show the details of the contact at a section/row position
    Show(ShowArgs),
    /// Render an initials avatar for a name into a PNG file
    Avatar(AvatarArgs),
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct ShowArgs {
    section: usize,
    row: usize,
}

#[derive(Args, Debug)]
struct AvatarArgs {
    name: String,

    #[arg(long, short = 'o', value_name = "FILE")]
    out: PathBuf,

    /// Seed for the background color
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Serialize)]
struct SectionView {
    title: String,
    contacts: Vec<ContactDetails>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    let config = config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(path) = &config.config_path {
        debug!("loaded configuration from {}", path.display());
    }

    match cli.command {
        Command::List(args) => {
            let index = load_index(&config, cli.source)?;
            handle_list(&index, args.json)
        }
        Command::Titles => {
            let index = load_index(&config, cli.source)?;
            println!("{}", index.section_titles().join(" "));
            Ok(())
        }
        Command::Show(args) => {
            let index = load_index(&config, cli.source)?;
            handle_show(&index, args)
        }
        Command::Avatar(args) => handle_avatar(&config, args),
    }
}

fn load_index(config: &Config, source_override: Option<PathBuf>) -> Result<SectionedIndex> {
    let path = source_override
        .or_else(|| config.source.clone())
        .ok_or_else(|| anyhow!("no contact source configured; pass --source or set `source`"))?;

    let mut source = VdirSource::new(path).create_missing(config.create_source);
    match source.open() {
        Ok(()) => {}
        Err(err @ Error::AccessDenied) => {
            return Err(err).with_context(|| {
                format!(
                    "{PERMISSION_ERROR}. Please grant read access to {}",
                    source.path().display()
                )
            });
        }
        Err(err) => return Err(err.into()),
    }

    let result = fetch_contacts(&source, &config.normalizer(), &mut rand::thread_rng());
    if let Some(err) = result.error {
        return Err(err).context("failed to enumerate contacts");
    }

    debug!("indexed {} contacts", result.contacts.len());
    Ok(SectionedIndex::build(result.contacts))
}

fn handle_list(index: &SectionedIndex, json: bool) -> Result<()> {
    if json {
        let sections: Vec<SectionView> = index
            .sections()
            .iter()
            .map(|section| SectionView {
                title: section.title(),
                contacts: section.contacts().iter().map(ContactDetails::from).collect(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&sections)?);
        return Ok(());
    }

    if index.is_empty() {
        println!("No contacts.");
        return Ok(());
    }

    for section in index.sections() {
        println!("{}", section.title());
        for (row, contact) in section.contacts().iter().enumerate() {
            let details = ContactDetails::from(contact);
            let phone = details
                .phones
                .first()
                .map(|phone| format!("{}: {}", phone.number_type, phone.number))
                .unwrap_or_default();
            println!("  {row}. {}\t{phone}", details.title);
        }
    }
    Ok(())
}

fn handle_show(index: &SectionedIndex, args: ShowArgs) -> Result<()> {
    let contact = match index.select(args.section, args.row) {
        Selection::Contact(contact) => contact,
        Selection::NoInformation => bail!(NO_INFO_ERROR),
    };

    let details = ContactDetails::from(contact);
    println!("{}", details.title);
    if let Some(initials) = &details.initials {
        println!("Initials: {initials}");
    }
    if let Some(image) = &details.image {
        let origin = if image.generated { "generated" } else { "photo" };
        println!("Image: {}x{} ({origin})", image.width, image.height);
    }
    println!("Phones:");
    for phone in &details.phones {
        println!("  {}: {}", phone.number_type, phone.number);
    }
    Ok(())
}

fn handle_avatar(config: &Config, args: AvatarArgs) -> Result<()> {
    let initials = initials_of(&args.name)
        .ok_or_else(|| anyhow!("cannot derive initials from an empty name"))?;

    let style = config.avatar.style();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let image = avatar::render_with_rng(&initials, &style, &mut rng).ok_or_else(|| {
        anyhow!(
            "unable to allocate a {}x{} drawing surface",
            style.frame.width,
            style.frame.height
        )
    })?;

    image
        .save_with_format(&args.out, ImageFormat::Png)
        .with_context(|| format!("failed to write avatar to {}", args.out.display()))?;
    println!("Wrote {} ({}x{})", args.out.display(), image.width(), image.height());
    Ok(())
}
