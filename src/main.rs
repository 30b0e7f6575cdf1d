use clap::{Parser, Subcommand};
use photo_journal::config::{self, JournalConfig};
use photo_journal::journal::{Journal, JournalEvent};
use photo_journal::map::LeafletLayer;
use photo_journal::pdf::PdfWriter;
use photo_journal::storage::FileStorage;
use photo_journal::types::{Coordinates, PhotoId};
use photo_journal::{output, page, upload};
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread::JoinHandle;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "photo-journal")]
#[command(about = "Travel photo journal with map, gallery and shareable diaries")]
#[command(long_about = "\
Travel photo journal with map, gallery and shareable diaries

Photos are kept in the data directory as a single JSON document. Each photo
has a location, a description, a time, and optionally a position on the map.

Typical session:

  photo-journal upload trip/                      # add every image in trip/
  photo-journal list                              # ids, locations, times
  photo-journal edit <ID> --location Kyoto        # annotate
  photo-journal place <ID> 35.0116 135.7681       # put it on the map
  photo-journal render --output journal.html      # the full page
  photo-journal diary --all --pdf out/ --share https://me.example/journal/

Run 'photo-journal gen-config' to generate a documented journal.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Data directory (photo storage and journal.toml)
    #[arg(long, default_value = ".photo-journal", global = true)]
    data_dir: PathBuf,

    /// Config file (defaults to journal.toml in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

/// Gallery filter flags.
#[derive(clap::Args, Clone, Default)]
struct FilterArgs {
    /// Case-insensitive search on location and description
    #[arg(long)]
    search: Option<String>,

    /// Show only photos with exactly this location
    #[arg(long)]
    location: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Add image files (directories are searched recursively)
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// List photos in upload order
    List(FilterArgs),
    /// Change a photo's location, description or time
    Edit {
        id: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// YYYY-MM-DDTHH:MM, UTC
        #[arg(long)]
        time: Option<String>,
    },
    /// Put a photo on the map
    Place {
        id: String,
        #[arg(allow_negative_numbers = true)]
        lat: f64,
        #[arg(allow_negative_numbers = true)]
        lng: f64,
    },
    /// Delete a photo
    Delete { id: String },
    /// Render the journal page to an HTML file
    Render {
        #[arg(long, default_value = "journal.html")]
        output: PathBuf,
        /// Render with the edit panel open on this photo
        #[arg(long)]
        edit: Option<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Compose a diary from selected photos
    Diary {
        #[arg(long)]
        title: Option<String>,
        /// Photo ids to include (repeatable)
        #[arg(long = "select")]
        select: Vec<String>,
        /// Include every photo
        #[arg(long)]
        all: bool,
        /// Export a PDF into this directory
        #[arg(long)]
        pdf: Option<PathBuf>,
        /// Print a share link based on this page address
        #[arg(long)]
        share: Option<String>,
        /// Write the page with the diary open to this file
        #[arg(long)]
        preview: Option<PathBuf>,
    },
    /// Open a shared diary link
    OpenShare {
        url: String,
        /// Export the shared diary as a PDF into this directory
        #[arg(long)]
        pdf: Option<PathBuf>,
    },
    /// Print a stock journal.toml with all options documented
    GenConfig,
}

type AppJournal = Journal<FileStorage, LeafletLayer>;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => config::load_config_file(path)?,
        None => config::load_config(&cli.data_dir)?,
    };
    let (mut journal, printer) = open_journal(config, &cli.data_dir)?;
    let result = run(&mut journal, cli.command);

    // Dropping the journal closes the event channel
    drop(journal);
    printer.join().ok();
    result
}

fn open_journal(
    config: JournalConfig,
    data_dir: &Path,
) -> Result<(AppJournal, JoinHandle<()>), Box<dyn std::error::Error>> {
    let storage = FileStorage::open(data_dir)?;
    let (tx, rx) = mpsc::channel::<JournalEvent>();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_journal_event(&event);
        }
    });
    let journal = Journal::open(config, storage, LeafletLayer::new(), Some(tx));
    Ok((journal, printer))
}

fn run(journal: &mut AppJournal, command: Command) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Upload { paths } => {
            let files = upload::collect_images(&paths);
            let (tx, rx) = mpsc::channel();
            let decoder = std::thread::spawn(move || upload::decode_all(&files, tx));
            let added = journal.receive_uploads(rx);
            decoder.join().ok();
            journal.close_editor();
            println!("Uploaded {} photos", added.len());
        }
        Command::List(filter) => {
            apply_filter(journal, filter);
            let ids: Vec<PhotoId> = journal.cards().iter().map(|c| c.id.clone()).collect();
            let photos: Vec<_> = ids.iter().filter_map(|id| journal.find(id)).collect();
            output::print_photo_list(&photos, &journal.config().labels);
        }
        Command::Edit {
            id,
            location,
            description,
            time,
        } => {
            open_editor(journal, &id)?;
            if let Some(form) = journal.editor_form_mut() {
                if let Some(location) = location {
                    form.location = location;
                }
                if let Some(description) = description {
                    form.description = description;
                }
                if let Some(time) = time {
                    form.time = time;
                }
            }
            journal.save_editor()?;
        }
        Command::Place { id, lat, lng } => {
            open_editor(journal, &id)?;
            journal.map_click(Coordinates::new(lat, lng))?;
            journal.close_editor();
        }
        Command::Delete { id } => {
            open_editor(journal, &id)?;
            journal.delete_editor()?;
        }
        Command::Render {
            output: out,
            edit,
            filter,
        } => {
            apply_filter(journal, filter);
            if let Some(id) = edit {
                open_editor(journal, &id)?;
            }
            write_page(journal, &out)?;
        }
        Command::Diary {
            title,
            select,
            all,
            pdf,
            share,
            preview,
        } => {
            journal.open_diary();
            if let Some(title) = title {
                journal.set_diary_title(title);
            }
            let ids: Vec<PhotoId> = if all {
                journal.photos().iter().map(|p| p.id.clone()).collect()
            } else {
                select.into_iter().map(PhotoId::new).collect()
            };
            for id in &ids {
                if journal.find(id).is_none() {
                    return Err(format!("No photo with id {id}").into());
                }
                journal.set_diary_checked(id, true);
            }
            journal.generate_diary();
            output::print_diary(
                journal.diary_title(),
                journal.diary().selected(),
                &journal.config().labels,
            );
            finish_diary(journal, pdf, share, preview)?;
        }
        Command::OpenShare { url, pdf } => {
            if !journal.startup(&url) {
                return Err("No readable shared diary in this link".into());
            }
            output::print_diary(
                journal.diary_title(),
                journal.diary().selected(),
                &journal.config().labels,
            );
            finish_diary(journal, pdf, None, None)?;
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }
    Ok(())
}

fn apply_filter(journal: &mut AppJournal, filter: FilterArgs) {
    if let Some(search) = filter.search {
        journal.set_search(search);
    }
    journal.set_location_filter(filter.location);
}

fn open_editor(journal: &mut AppJournal, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    if journal.open_editor(&PhotoId::new(id)) {
        Ok(())
    } else {
        Err(format!("No photo with id {id}").into())
    }
}

fn finish_diary(
    journal: &AppJournal,
    pdf: Option<PathBuf>,
    share: Option<String>,
    preview: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(dir) = pdf {
        std::fs::create_dir_all(&dir)?;
        let mut writer = PdfWriter::new(dir, &journal.config().pdf);
        journal.export_pdf(&mut writer)?;
    }
    if let Some(page_url) = share {
        println!("{}", journal.share_url(&page_url)?);
    }
    if let Some(path) = preview {
        write_page(journal, &path)?;
    }
    Ok(())
}

fn write_page(journal: &AppJournal, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, page::render_page(journal).into_string())?;
    println!("Page \u{2192} {}", path.display());
    Ok(())
}
