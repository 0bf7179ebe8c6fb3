use std::{ffi::OsString, sync::mpsc::Sender};

use notify::{
    event::{AccessKind, AccessMode},
    Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher,
};

use crate::{
    error::{Result, TailError},
    tail::{debounce::Signal, target::WatchTarget},
};

/// OS change notifications for one file.
///
/// The parent directory is watched rather than the file, so a file replaced
/// by rename (as many editors save) keeps producing signals. Events for other
/// files in the directory are ignored. Dropping the notifier stops delivery.
pub struct ChangeNotifier {
    _watcher: RecommendedWatcher,
}

impl ChangeNotifier {
    pub fn watch(target: &WatchTarget, signals: Sender<Signal>) -> Result<Self> {
        let directory = target.directory().to_path_buf();
        if !directory.is_dir() {
            return Err(TailError::NotifierSetup {
                path: directory,
                reason: "directory does not exist".to_string(),
            });
        }

        let setup_err = |e: notify::Error| TailError::NotifierSetup {
            path: directory.clone(),
            reason: e.to_string(),
        };

        let file_name = target.file_name().to_os_string();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if is_change_of(&event, &file_name) => {
                // the session is gone once the receiver is dropped
                let _ = signals.send(Signal::Changed);
            }
            Ok(_) => (),
            Err(e) => tracing::warn!("file watcher error: {e}"),
        })
        .map_err(setup_err)?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .map_err(setup_err)?;

        Ok(Self { _watcher: watcher })
    }
}

fn is_change_of(event: &Event, file_name: &OsString) -> bool {
    let relevant_kind = match event.kind {
        EventKind::Modify(_) | EventKind::Create(_) => true,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        _ => false,
    };

    relevant_kind
        && event
            .paths
            .iter()
            .any(|path| path.file_name() == Some(file_name.as_os_str()))
}
