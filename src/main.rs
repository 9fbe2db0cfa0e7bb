use std::{io, path::PathBuf};

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use city_library::{LibraryManager, StoreConfig, console::Console, observers::EventLogger};

/// Command-line arguments for the library console
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding books.json and members.json
    #[arg(short, long, default_value = ".")]
    data_dir: PathBuf,

    /// Use this file for books instead of <data-dir>/books.json
    #[arg(long)]
    books_file: Option<PathBuf>,

    /// Use this file for members instead of <data-dir>/members.json
    #[arg(long)]
    members_file: Option<PathBuf>,

    /// Log debug details to stderr (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// File locations after applying overrides
    fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::in_dir(&self.data_dir);
        if let Some(path) = &self.books_file {
            config.books_path.clone_from(path);
        }
        if let Some(path) = &self.members_file {
            config.members_path.clone_from(path);
        }
        config
    }
}

/// Log to stderr so the menu on stdout stays readable
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let installed =
        fmt().with_env_filter(filter).with_target(false).with_writer(io::stderr).try_init();
    if installed.is_err() {
        eprintln!("tracing subscriber already installed");
    }
}

fn main() -> io::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut manager = LibraryManager::new(args.store_config());
    manager.register_observer(Box::new(EventLogger));
    let problems = manager.load_from_file();

    let mut console = Console::new(io::stdin().lock(), io::stdout().lock());
    console.report_load_errors(&problems)?;
    console.run(&mut manager)
}
