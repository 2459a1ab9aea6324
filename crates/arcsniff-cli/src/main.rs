//! arcsniff - Identify files by content and look inside BBS-era archives
//!
//! This tool names the real format of a file regardless of its extension,
//! and lists or extracts archives with a fallback to the archivers installed
//! on the host for formats no Rust crate reads.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use arcsniff_core::magic::{self, registry};
use arcsniff_core::archive::Finds;
use arcsniff_core::{exe, id3, ArchiveConfig, Archiver, Backend, ExtMatch};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Identify files by content and list or extract legacy archives
#[derive(Parser, Debug)]
#[command(name = "arcsniff")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    archive: ArchiveFlags,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

/// Flags mapped onto the archive configuration
#[derive(Args, Debug)]
struct ArchiveFlags {
    /// Seconds an external archiver may run before it is killed
    #[arg(long, env = "ARCSNIFF_TOOL_TIMEOUT", default_value = "60", global = true)]
    tool_timeout: u64,

    /// Never run external archivers
    #[arg(long, env = "ARCSNIFF_NO_SYSTEM_TOOLS", global = true)]
    no_system_tools: bool,

    /// Do not ask `file` about unrecognised content
    #[arg(long, global = true)]
    no_magic_probe: bool,

    /// Maximum number of members to list (0 = unlimited)
    #[arg(long, default_value = "0", global = true)]
    max_entries: usize,
}

impl ArchiveFlags {
    fn config(&self) -> ArchiveConfig {
        ArchiveConfig::new()
            .tool_timeout(Duration::from_secs(self.tool_timeout))
            .system_tools(!self.no_system_tools)
            .magic_probe(!self.no_magic_probe)
            .max_entries(self.max_entries)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the detected format of files
    Identify {
        /// Files to identify
        paths: Vec<PathBuf>,

        /// Also identify every file below this directory
        #[arg(short, long)]
        directory: Option<PathBuf>,
    },

    /// List the files inside an archive
    List {
        /// Archive to list
        archive: PathBuf,

        /// Name the archive was uploaded as, if different from the path
        #[arg(long)]
        name: Option<String>,

        /// Print an empty listing with a warning instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// Extract files from an archive
    Extract {
        /// Archive to extract
        archive: PathBuf,

        /// Destination directory
        #[arg(short, long)]
        output: PathBuf,

        /// Name the archive was uploaded as, if different from the path
        #[arg(long)]
        name: Option<String>,

        /// Members to extract (default: all)
        targets: Vec<String>,
    },

    /// Print the member that best describes an archive
    Readme {
        /// Archive to inspect
        archive: PathBuf,

        /// Name the archive was uploaded as, if different from the path
        #[arg(long)]
        name: Option<String>,

        /// Print every candidate with its rank, best first
        #[arg(long)]
        all: bool,
    },

    /// Describe the NE/PE header of an executable
    Exe {
        /// Executable to inspect
        file: PathBuf,
    },

    /// Print the song title from an ID3 tag
    Id3 {
        /// Audio file to inspect
        file: PathBuf,
    },

    /// Print the known formats
    Formats {
        /// Only this category (archive, image, program, ...)
        #[arg(short, long)]
        category: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .init();

    let archiver = || Archiver::with_config(cli.archive.config());

    match &cli.command {
        Command::Identify { paths, directory } => identify(paths, directory.as_deref()),
        Command::List {
            archive,
            name,
            lenient,
        } => list(&archiver(), archive, name.as_deref(), *lenient),
        Command::Extract {
            archive,
            output,
            name,
            targets,
        } => extract(&archiver(), archive, output, name.as_deref(), targets),
        Command::Readme { archive, name, all } => {
            readme(&archiver(), archive, name.as_deref(), *all)
        }
        Command::Exe { file } => describe_exe(file),
        Command::Id3 { file } => describe_id3(file),
        Command::Formats { category } => formats(category.as_deref()),
    }
}

/// The name an archive claims: `--name` if given, else its file name.
fn claimed_name(path: &Path, name: Option<&str>) -> String {
    match name {
        Some(name) => name.to_string(),
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}

fn identify(paths: &[PathBuf], directory: Option<&Path>) -> Result<()> {
    if paths.is_empty() && directory.is_none() {
        bail!("Nothing to identify: pass files or --directory");
    }

    let mut files = paths.to_vec();
    if let Some(directory) = directory {
        if !directory.is_dir() {
            bail!("Not a directory: {}", directory.display());
        }
        files.extend(
            WalkDir::new(directory)
                .follow_links(false)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file())
                .map(|e| e.into_path()),
        );
    }

    for path in &files {
        let file =
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
        let signature = magic::find(&file);
        let name = claimed_name(path, None);
        let note = match magic::match_ext(&name, &file) {
            ExtMatch::Contradicts { .. } => "  [extension mismatch]",
            _ => "",
        };
        println!(
            "{}: {} ({}){}",
            path.display(),
            signature.name(),
            signature.title(),
            note
        );
    }
    Ok(())
}

fn list(archiver: &Archiver, archive: &Path, name: Option<&str>, lenient: bool) -> Result<()> {
    let name = claimed_name(archive, name);
    let contents = match archiver.list(archive, &name) {
        Ok(contents) => contents,
        Err(e) if lenient => {
            warn!(archive = %archive.display(), error = %e, "Could not list archive");
            return Ok(());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to list {}", archive.display()));
        }
    };
    debug!(ext = %contents.ext, format = contents.format.name(), backend = ?contents.backend, "Listed");
    for file in &contents.files {
        println!("{file}");
    }
    Ok(())
}

fn extract(
    archiver: &Archiver,
    archive: &Path,
    output: &Path,
    name: Option<&str>,
    targets: &[String],
) -> Result<()> {
    let name = claimed_name(archive, name);
    let targets: Vec<&str> = targets.iter().map(String::as_str).collect();
    let contents = archiver
        .extract(archive, &name, output, &targets)
        .with_context(|| format!("Failed to extract {}", archive.display()))?;
    let via = match contents.backend {
        Backend::Library => "library",
        Backend::Tool(program) => program,
    };
    for file in &contents.files {
        println!("{}", output.join(file).display());
    }
    eprintln!(
        "{} file(s) in {} (read as {} via {})",
        contents.len(),
        output.display(),
        contents.ext,
        via
    );
    Ok(())
}

fn readme(archiver: &Archiver, archive: &Path, name: Option<&str>, all: bool) -> Result<()> {
    let name = claimed_name(archive, name);
    let contents = archiver
        .list(archive, &name)
        .with_context(|| format!("Failed to list {}", archive.display()))?;
    if all {
        let finds = Finds::new(&name, &contents.files);
        if finds.is_empty() {
            bail!("No description file in {}", archive.display());
        }
        for (rank, file) in finds.ranked() {
            println!("{:<14} {file}", format!("{rank:?}"));
        }
        return Ok(());
    }
    match contents.readme(&name) {
        Some(readme) => {
            println!("{readme}");
            Ok(())
        }
        None => bail!("No description file in {}", archive.display()),
    }
}

fn describe_exe(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let header = exe::parse(&file);
    println!("{header}");
    if let Some(compiled) = header.compiled() {
        println!("linked {}", format_utc(compiled));
    }
    Ok(())
}

fn describe_id3(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    match id3::song(&file) {
        Some(song) => println!("{song}"),
        None => bail!("No ID3 tag in {}", path.display()),
    }
    Ok(())
}

fn formats(category: Option<&str>) -> Result<()> {
    let categories = registry::categories();
    if let Some(wanted) = category {
        if !categories.iter().any(|(name, _)| *name == wanted) {
            let known: Vec<_> = categories.iter().map(|(name, _)| *name).collect();
            bail!("Unknown category '{wanted}', expected one of: {}", known.join(", "));
        }
    }

    for (name, view) in categories {
        if category.is_some_and(|wanted| wanted != *name) {
            continue;
        }
        println!("[{name}]");
        for signature in view() {
            println!(
                "  {:<16} {:<44} {}",
                signature.name(),
                signature.title(),
                signature.extensions().join(" ")
            );
        }
    }
    Ok(())
}

/// `YYYY-MM-DD HH:MM:SS UTC` for a link timestamp.
fn format_utc(time: SystemTime) -> String {
    DateTime::<Utc>::from(time)
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claimed_name() {
        assert_eq!(claimed_name(Path::new("/tmp/GAME.ZIP"), None), "GAME.ZIP");
        assert_eq!(
            claimed_name(Path::new("/tmp/upload-1"), Some("GAME.LZH")),
            "GAME.LZH"
        );
    }

    #[test]
    fn test_format_utc() {
        use std::time::UNIX_EPOCH;

        assert_eq!(format_utc(UNIX_EPOCH), "1970-01-01 00:00:00 UTC");
        let at = |secs| UNIX_EPOCH + Duration::from_secs(secs);
        assert_eq!(format_utc(at(1_000_000_000)), "2001-09-09 01:46:40 UTC");
        assert_eq!(format_utc(at(951_782_400)), "2000-02-29 00:00:00 UTC");
    }

    #[test]
    fn test_flags_map_onto_config() {
        let cli = Cli::parse_from([
            "arcsniff",
            "list",
            "GAME.ZIP",
            "--no-system-tools",
            "--tool-timeout",
            "5",
        ]);
        let config = cli.archive.config();
        assert!(!config.system_tools);
        assert!(config.magic_probe);
        assert_eq!(config.tool_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_readme_all_flag() {
        let cli = Cli::parse_from(["arcsniff", "readme", "GAME.ZIP", "--all"]);
        assert!(matches!(cli.command, Command::Readme { all: true, .. }));
    }

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
