use std::env;
use std::process::ExitCode;

use scratch_arena::{AllocError, Allocator, AllocatorConfig, AnyAllocator, ArenaSnapshot};

const FRAMES: usize = 6;

fn main() -> ExitCode {
    env_logger::init();

    let config = match env::args().nth(1) {
        Some(path) => match AllocatorConfig::load_from_file(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("failed to load allocator config `{path}`: {err}");
                return ExitCode::FAILURE;
            }
        },
        None => AllocatorConfig::arena(64 * 1024),
    };

    let mut allocator = match config.build() {
        Ok(allocator) => allocator,
        Err(err) => {
            log::error!("failed to build allocator: {err}");
            return ExitCode::FAILURE;
        }
    };

    for frame in 0..FRAMES {
        match run_frame(&mut allocator, frame) {
            Ok(bytes) => log::info!("frame={frame} scratch_bytes={bytes}"),
            Err(err) => log::warn!("frame={frame} dropped: {err}"),
        }

        if let Some(arena) = allocator.as_arena() {
            let snapshot = ArenaSnapshot::capture(arena);
            log::info!(
                "frame={frame} used={} peak={} capacity={}",
                snapshot.used.len(),
                snapshot.peak,
                snapshot.capacity
            );
        }
        allocator.reset();
    }

    ExitCode::SUCCESS
}

/// Builds one frame's worth of transient vertex and text data.
fn run_frame(allocator: &mut AnyAllocator, frame: usize) -> Result<usize, AllocError> {
    let sprites = 64 * (frame + 1);
    let mut total = 0;

    let vertices = allocator.allocate(sprites * 4 * 16, 16)?;
    if let Some(bytes) = allocator.bytes_mut(&vertices) {
        for (index, vertex) in bytes.chunks_exact_mut(16).enumerate() {
            vertex[..8].copy_from_slice(&(index as u64).to_le_bytes());
        }
    }
    total += vertices.len();

    let label = format!("frame {frame}: {sprites} sprites");
    let text = allocator.allocate_default(label.len())?;
    if let Some(bytes) = allocator.bytes_mut(&text) {
        bytes.copy_from_slice(label.as_bytes());
    }
    total += text.len();

    allocator.free(text);
    allocator.free(vertices);
    Ok(total)
}
