use std::{io, path::Path, sync::mpsc::channel, thread};

use anyhow::{Context, Error, Result};

use crate::{
    palette::{ConsoleSink, Palette},
    tail::{TailConfig, TailPipeline, WatchTarget},
};

pub const FAREWELL: &str = "ciao";

/// Prints lines appended to `path` until the user presses Enter (or Ctrl+C).
pub fn follow_file(path: &Path, config: TailConfig, palette: Palette) -> Result<()> {
    let target = WatchTarget::new(path).with_context(|| format!("Invalid path {:?}", path))?;
    let mut pipeline = TailPipeline::new(target, config);

    let mut sink = ConsoleSink::stdout(palette);
    pipeline
        .subscribe(move |line| {
            if let Err(e) = sink.emit(line) {
                tracing::warn!("could not write line to stdout: {e}");
            }
        })
        .with_context(|| format!("Could not follow {:?}", path))?;

    wait_for_exit_request()?;

    pipeline.dispose();
    println!("{FAREWELL}");

    Ok(())
}

/// Blocks until a line (or EOF) arrives on stdin, or Ctrl+C is pressed.
fn wait_for_exit_request() -> Result<()> {
    let (tx, rx) = channel();

    let interrupted = tx.clone();
    ctrlc::set_handler(move || {
        let _ = interrupted.send(());
    })
    .with_context(|| "Could not install Ctrl+C handler")?;

    thread::spawn(move || {
        let mut line = String::new();
        if let Err(e) = io::stdin().read_line(&mut line) {
            tracing::debug!("stdin closed with error: {e}");
        }
        let _ = tx.send(());
    });

    rx.recv()
        .map_err(|_| Error::msg("Exit request channel disconnected"))
}
