//! snipq — manage the persisted capture queue from a terminal.
//!
//! Usage:
//!   snipq list [--json]                    Show queued captures, oldest first
//!   snipq add <image> [--mode <mode>]      Queue an image file
//!   snipq remove <index>                   Drop one capture
//!   snipq clear                            Drop every capture
//!   snipq export <dir>                     Write captures out, then empty the queue

use clap::{Parser, Subcommand};
use image::DynamicImage;
use serde::Serialize;
use snip_queue::{
    default_queue_dir, CaptureMode, CaptureQueue, ImageArtifact, JsonConfig, QueueSettings,
};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "snipq", version, about = "Manage the persisted screenshot capture queue")]
struct Cli {
    /// Queue directory [default: platform cache dir]
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Settings file [default: platform config dir]
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Capacity, overriding `queue_max_size` from the settings file
    #[arg(long, global = true)]
    max_size: Option<NonZeroUsize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show queued captures, oldest first
    List {
        #[arg(long)]
        json: bool,
    },
    /// Queue an image file
    Add {
        image: PathBuf,
        #[arg(long, default_value_t = CaptureMode::Region)]
        mode: CaptureMode,
    },
    /// Drop the capture at INDEX
    Remove { index: usize },
    /// Drop every capture
    Clear,
    /// Write every capture into DIR as capture_NNN.png, then empty the queue.
    /// DIR must be empty or absent; existing files are never overwritten.
    Export { out_dir: PathBuf },
}

#[derive(Serialize)]
struct ListEntry {
    index: usize,
    created_at: String,
    mode: CaptureMode,
    width: u32,
    height: u32,
    path: Option<String>,
}

fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        log::error!("{}", e);
        eprintln!("snipq: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let settings = match cli.max_size {
        Some(max_size) => QueueSettings { max_size },
        None => {
            let path = cli.config.unwrap_or_else(JsonConfig::default_path);
            QueueSettings::from_provider(&JsonConfig::load_from(&path))
        }
    };
    let dir = cli.dir.unwrap_or_else(default_queue_dir);

    let start = std::time::Instant::now();
    let mut queue: CaptureQueue<DynamicImage> = CaptureQueue::persistent(settings.max_size, &dir);
    log::info!(
        "Opened {} ({}/{} captures) in {}ms",
        dir.display(),
        queue.count(),
        queue.max_size(),
        start.elapsed().as_millis()
    );

    match cli.command {
        Command::List { json } => list(&queue, json),
        Command::Add { image, mode } => {
            let screenshot = image::open(&image)
                .map_err(|e| format!("Cannot read {}: {}", image.display(), e))?;
            let index = queue_image(&mut queue, screenshot, mode, &dir)?;
            println!("{}", index);
            Ok(())
        }
        Command::Remove { index } => {
            if queue.remove(index) {
                Ok(())
            } else {
                Err(format!("No capture at index {} (queue holds {})", index, queue.count()))
            }
        }
        Command::Clear => {
            let count = queue.count();
            queue.clear();
            println!("Removed {} captures", count);
            Ok(())
        }
        Command::Export { out_dir } => {
            let exported = export(&mut queue, &out_dir)?;
            println!("Exported {} captures to {}", exported, out_dir.display());
            Ok(())
        }
    }
}

fn list(queue: &CaptureQueue<DynamicImage>, json: bool) -> Result<(), String> {
    let entries: Vec<ListEntry> = queue
        .items()
        .enumerate()
        .map(|(index, item)| ListEntry {
            index,
            created_at: item.created_at().to_string(),
            mode: item.mode(),
            width: item.artifact().width(),
            height: item.artifact().height(),
            path: item.persisted_path().map(|p| p.display().to_string()),
        })
        .collect();

    if json {
        let out = serde_json::to_string_pretty(&entries).map_err(|e| e.to_string())?;
        println!("{}", out);
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{:>3}  {}  {:<10}  {:>5}x{:<5}  {}",
            entry.index,
            entry.created_at,
            entry.mode,
            entry.width,
            entry.height,
            entry.path.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}

/// Queues `screenshot` and fails unless it reached disk, since a memory-only
/// item would vanish when the process exits.
fn queue_image(
    queue: &mut CaptureQueue<DynamicImage>,
    screenshot: DynamicImage,
    mode: CaptureMode,
    dir: &Path,
) -> Result<usize, String> {
    let index = queue.add(screenshot, mode);
    let persisted = queue
        .item_at(index)
        .and_then(|item| item.persisted_path())
        .is_some();
    if !persisted {
        return Err(format!("Queued at {} but could not write it to {}", index, dir.display()));
    }
    Ok(index)
}

/// Writes every capture before removing any, so a failed export loses nothing.
/// Refuses an `out_dir` that already has entries.
fn export(queue: &mut CaptureQueue<DynamicImage>, out_dir: &Path) -> Result<usize, String> {
    std::fs::create_dir_all(out_dir)
        .map_err(|e| format!("Failed to create {}: {}", out_dir.display(), e))?;
    let mut existing = std::fs::read_dir(out_dir)
        .map_err(|e| format!("Failed to read {}: {}", out_dir.display(), e))?;
    if existing.next().is_some() {
        return Err(format!("Refusing to export into non-empty {}", out_dir.display()));
    }

    for (index, item) in queue.items().enumerate() {
        let dest = out_dir.join(format!("capture_{:03}.png", index));
        item.artifact()
            .encode_to(&dest)
            .map_err(|e| format!("Failed to write {}: {}", dest.display(), e))?;
    }

    Ok(queue.pop_all().len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::fs;

    fn shot(shade: u8) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 3, Rgba([shade, 0, 255 - shade, 255])))
    }

    fn persistent_queue(dir: &Path, shades: &[u8]) -> CaptureQueue<DynamicImage> {
        let mut queue = CaptureQueue::persistent(NonZeroUsize::new(10).unwrap(), dir);
        for &shade in shades {
            queue_image(&mut queue, shot(shade), CaptureMode::Region, dir).unwrap();
        }
        queue
    }

    fn file_count(dir: &Path) -> usize {
        fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }

    // ── add ──

    #[test]
    fn queue_image_reports_the_tail_index() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("queue");
        let mut queue = persistent_queue(&dir, &[1]);

        let index = queue_image(&mut queue, shot(2), CaptureMode::Window, &dir).unwrap();

        assert_eq!(index, 1);
        assert_eq!(file_count(&dir), 2);
    }

    #[test]
    fn queue_image_fails_when_nothing_reaches_disk() {
        let root = tempfile::tempdir().unwrap();
        let blocker = root.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();
        let mut queue = CaptureQueue::persistent(NonZeroUsize::new(10).unwrap(), &blocker);

        let err = queue_image(&mut queue, shot(1), CaptureMode::Region, &blocker).unwrap_err();

        assert!(err.contains("could not write"), "{}", err);
    }

    // ── export ──

    #[test]
    fn export_writes_numbered_files_and_empties_the_queue() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("queue");
        let out = root.path().join("out");
        let mut queue = persistent_queue(&dir, &[10, 20]);

        let exported = export(&mut queue, &out).unwrap();

        assert_eq!(exported, 2);
        assert!(queue.is_empty());
        assert_eq!(file_count(&dir), 0);
        let first = image::open(out.join("capture_000.png")).unwrap();
        let second = image::open(out.join("capture_001.png")).unwrap();
        assert_eq!(first.to_rgba8(), shot(10).to_rgba8());
        assert_eq!(second.to_rgba8(), shot(20).to_rgba8());
    }

    #[test]
    fn failed_export_leaves_queue_and_files_intact() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("queue");
        let blocker = root.path().join("out");
        fs::write(&blocker, b"x").unwrap();
        let mut queue = persistent_queue(&dir, &[10, 20]);

        assert!(export(&mut queue, &blocker).is_err());

        assert_eq!(queue.count(), 2);
        assert_eq!(file_count(&dir), 2);
        assert!(queue.items().all(|item| item.persisted_path().is_some_and(|p| p.exists())));
    }

    #[test]
    fn export_refuses_a_non_empty_directory() {
        let root = tempfile::tempdir().unwrap();
        let dir = root.path().join("queue");
        let out = root.path().join("out");
        fs::create_dir(&out).unwrap();
        fs::write(out.join("capture_000.png"), b"earlier export").unwrap();
        let mut queue = persistent_queue(&dir, &[10]);

        let err = export(&mut queue, &out).unwrap_err();

        assert!(err.contains("non-empty"), "{}", err);
        assert_eq!(queue.count(), 1);
        assert_eq!(file_count(&dir), 1);
        assert_eq!(fs::read(out.join("capture_000.png")).unwrap(), b"earlier export");
    }
}
