//! simpatch - patch iOS Mach-O executables for the iOS Simulator.
//!
//! Point it at a single binary or at an unpacked app bundle (e.g. an IPA's
//! `Payload/` directory); every Mach-O found is patched in place and
//! re-signed with an ad-hoc signature.

use std::fs::{self, File, OpenOptions};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use memmap2::MmapMut;
use rayon::prelude::*;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use simpatch::{
    is_patchable_magic, patch_for_simulator, PatchOptions, PatchSummary, DEFAULT_MAX_HEADER_SIZE,
};

/// Patch iOS Mach-O executables to run under the iOS Simulator.
#[derive(Parser, Debug)]
#[command(name = "simpatch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Mach-O file or app bundle directory to patch in place
    path: PathBuf,

    /// Maximum accepted fat arch offset in bytes
    #[arg(long, env = "MAX_HEADER_SIZE", default_value_t = DEFAULT_MAX_HEADER_SIZE)]
    max_header_size: u64,

    /// Skip re-signing the patched binaries with codesign
    #[arg(long)]
    no_sign: bool,

    /// Verbosity level (0=quiet, 1=warnings, 2=info, 3=debug)
    #[arg(short, long, default_value = "2")]
    verbosity: u8,

    /// Number of parallel jobs (default: number of CPUs)
    #[arg(short, long)]
    jobs: Option<usize>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbosity);

    let options = PatchOptions {
        max_header_size: cli.max_header_size,
    };

    let start = Instant::now();

    let targets = collect_macho_files(&cli.path)?;
    if targets.is_empty() {
        bail!("no Mach-O files found under: {}", cli.path.display());
    }

    if targets.len() == 1 {
        let path = &targets[0];
        let summary = patch_file(path, &options)
            .with_context(|| format!("failed to patch: {}", path.display()))?;
        log_summary(path, &summary);
        if !cli.no_sign {
            sign_file(path)?;
        }
        info!("Patched 1 file in {:.2}s", start.elapsed().as_secs_f64());
        return Ok(());
    }

    info!("Patching {} Mach-O files", targets.len());

    let progress = ProgressBar::new(targets.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap()
            .progress_chars("#>-"),
    );

    if let Some(n) = cli.jobs {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n)
            .build_global()
            .ok();
    }

    let errors: Vec<_> = targets
        .par_iter()
        .filter_map(|path| {
            let result = patch_file(path, &options)
                .map_err(anyhow::Error::from)
                .and_then(|summary| {
                    log_summary(path, &summary);
                    if cli.no_sign {
                        Ok(())
                    } else {
                        sign_file(path)
                    }
                });

            progress.inc(1);
            result.err().map(|e| (path.clone(), e))
        })
        .collect();

    progress.finish_with_message("Done");

    let elapsed = start.elapsed();
    let success = targets.len() - errors.len();

    if !errors.is_empty() {
        warn!("{} files failed to patch:", errors.len());
        for (path, err) in &errors {
            error!("  {}: {:#}", path.display(), err);
        }
    }

    info!(
        "Patched {}/{} files in {:.2}s",
        success,
        targets.len(),
        elapsed.as_secs_f64()
    );

    if !errors.is_empty() {
        bail!("{} of {} files failed", errors.len(), targets.len());
    }

    Ok(())
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::ERROR,
        1 => Level::WARN,
        2 => Level::INFO,
        _ => Level::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .without_time()
        .finish();

    tracing::subscriber::set_global_default(subscriber).ok();
}

/// Returns true if the file starts with a patchable Mach-O magic.
fn sniff_macho(path: &Path) -> bool {
    let mut prefix = [0u8; 4];
    match File::open(path) {
        Ok(mut f) => f.read_exact(&mut prefix).is_ok() && is_patchable_magic(&prefix),
        Err(_) => false,
    }
}

/// Collects Mach-O files under the given path.
///
/// A file argument is returned as-is (after a magic check); a directory is
/// walked recursively, keeping every file whose leading bytes look like a
/// thin 64-bit or fat Mach-O.
fn collect_macho_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        if !sniff_macho(path) {
            bail!("not a Mach-O file: {}", path.display());
        }
        return Ok(vec![path.to_path_buf()]);
    }

    if !path.is_dir() {
        bail!("path does not exist: {}", path.display());
    }

    let mut files = Vec::new();
    let mut pending = vec![path.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in fs::read_dir(&dir)
            .with_context(|| format!("failed to read directory: {}", dir.display()))?
        {
            let entry = entry?;
            let entry_path = entry.path();
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                pending.push(entry_path);
            } else if file_type.is_file() && sniff_macho(&entry_path) {
                files.push(entry_path);
            }
        }
    }

    // Deterministic ordering for reporting
    files.sort();
    Ok(files)
}

/// Patches a single file in place through a writable memory map.
fn patch_file(path: &Path, options: &PatchOptions) -> simpatch::Result<PatchSummary> {
    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .open(path)
        .map_err(|source| simpatch::Error::FileOpen {
            path: path.to_path_buf(),
            source,
        })?;

    let mut mmap = unsafe { MmapMut::map_mut(&file) }.map_err(|source| {
        simpatch::Error::MemoryMap {
            path: path.to_path_buf(),
            source,
        }
    })?;

    let summary = patch_for_simulator(&mut mmap, options)?;

    mmap.flush().map_err(|source| simpatch::Error::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(summary)
}

fn log_summary(path: &Path, summary: &PatchSummary) {
    let build_version = if summary.inserted_build_version {
        "inserted"
    } else {
        "replaced"
    };
    info!(
        "{}: removed {} commands ({} bytes), {} simulator build version",
        path.display(),
        summary.removed_commands,
        summary.removed_bytes,
        build_version
    );
}

/// Re-signs a patched binary with an ad-hoc signature.
///
/// Patching invalidates the existing code signature, so without this step
/// the simulator refuses to load the binary.
fn sign_file(path: &Path) -> Result<()> {
    let output = Command::new("/usr/bin/codesign")
        .arg("-f")
        .arg("-s")
        .arg("-")
        .arg(path)
        .output()
        .with_context(|| format!("failed to run codesign on: {}", path.display()))?;

    if !output.status.success() {
        bail!(
            "codesign failed for {}: {}",
            path.display(),
            String::from_utf8_lossy(&output.stderr).trim()
        );
    }

    Ok(())
}
