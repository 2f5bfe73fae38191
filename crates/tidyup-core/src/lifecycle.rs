//! Lifecycle controller - the single owner of TidyUp's state.
//!
//! The controller loads state at startup, reacts to [`Intent`]s from the
//! shell, persists after every mutation, and persists once more on quit.
//! It is the only code that touches the state files, so no locking is
//! needed.

use crate::config::{ConfigError, TidyConfig};
use crate::intents::{Intent, IntentReceiver};
use crate::persistence::{
    self, check_timestamp_now, load_settings, save_settings, CodecError, DirectoryEntry,
    FileEntry, Record, Settings, SettingsError, StateError, TrackedState,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] StateError),

    #[error("Failed to save settings: {0}")]
    Settings(#[from] SettingsError),

    #[error("Invalid {kind}: {source}")]
    InvalidEntry {
        kind: &'static str,
        #[source]
        source: CodecError,
    },

    #[error("Not watching {0}")]
    NotWatched(String),

    #[error("Not tracking {0}")]
    NotTracked(String),
}

/// What the event loop should do after an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

pub struct Controller {
    config: TidyConfig,
    state: TrackedState,
    settings: Settings,
    had_prior_state: bool,
}

impl Controller {
    /// Prepare the data directory and load everything from disk.
    ///
    /// Only a missing data directory that can't be created is fatal. Broken
    /// state or settings files are logged and replaced with empty defaults
    /// in memory.
    pub fn start(config: TidyConfig) -> Result<Self, LifecycleError> {
        config.ensure_data_dir()?;
        log::info!("Loading state from {}", config.data_dir().display());

        let init = persistence::initialize(
            &config.file_entry_state_path(),
            &config.directory_entry_state_path(),
        );

        let settings = load_settings(config.data_dir()).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable settings: {}", e);
            Settings::default()
        });

        log::info!(
            "Watching {} director{}, tracking {} file(s)",
            init.state.directory_entries.len(),
            if init.state.directory_entries.len() == 1 { "y" } else { "ies" },
            init.state.file_entries.len()
        );

        Ok(Self {
            config,
            state: init.state,
            settings,
            had_prior_state: init.had_prior_state,
        })
    }

    pub fn state(&self) -> &TrackedState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn had_prior_state(&self) -> bool {
        self.had_prior_state
    }

    pub fn config(&self) -> &TidyConfig {
        &self.config
    }

    /// Write both state files.
    pub fn persist(&self) -> Result<(), StateError> {
        persistence::persist(
            &self.config.file_entry_state_path(),
            &self.config.directory_entry_state_path(),
            &self.state,
        )
    }

    /// Apply one intent.
    ///
    /// Entries the state files cannot hold (empty paths, a comma in the first
    /// field, line breaks) are rejected before anything changes.
    /// Mutations are persisted immediately. A failed persist is returned but
    /// the in-memory change is kept, so the next successful save catches up.
    pub fn handle(&mut self, intent: Intent) -> Result<Flow, LifecycleError> {
        let mutates = intent.mutates_state();

        match intent {
            Intent::ToggleStartup => {
                let toggled = Settings {
                    start_on_login: !self.settings.start_on_login,
                };
                save_settings(self.config.data_dir(), &toggled)?;
                self.settings = toggled;
                log::info!(
                    "Start on login {}",
                    if self.settings.start_on_login {
                        "enabled"
                    } else {
                        "disabled"
                    }
                );
            }
            Intent::Quit => {
                log::info!("Quitting, saving state");
                self.persist()?;
                return Ok(Flow::Exit);
            }
            Intent::ListState => self.log_state(),
            Intent::Watch(entry) => {
                check_record(&entry)?;
                self.watch(entry);
            }
            Intent::Unwatch { watch_path } => {
                self.state
                    .remove_directory(&watch_path)
                    .ok_or_else(|| LifecycleError::NotWatched(watch_path.clone()))?;
                log::info!("Stopped watching {}", watch_path);
            }
            Intent::SetAgeThreshold { watch_path, hours } => {
                if !self.state.set_age_threshold(&watch_path, hours) {
                    return Err(LifecycleError::NotWatched(watch_path));
                }
                log::info!("{} now tidies files older than {}h", watch_path, hours);
            }
            Intent::Ignore { path } => {
                if !self.state.set_file_ignored(&path, true) {
                    return Err(LifecycleError::NotTracked(path));
                }
                log::info!("Ignoring {}", path);
            }
            Intent::RecordCheck { path } => {
                let timestamp = check_timestamp_now();
                check_record(&FileEntry::new(path.as_str(), timestamp.as_str(), false))?;
                self.state.record_file_check(&path, timestamp);
            }
        }

        if mutates {
            self.persist()?;
        }
        Ok(Flow::Continue)
    }

    fn watch(&mut self, entry: DirectoryEntry) {
        let watch_path = entry.watch_path.clone();
        if self.state.upsert_directory(entry) {
            log::info!("Updated watch on {}", watch_path);
        } else {
            log::info!("Watching {}", watch_path);
        }
    }

    fn log_state(&self) {
        for entry in &self.state.directory_entries {
            log::info!(
                "watch {} -> {} after {}h",
                entry.watch_path,
                entry.destination_path,
                entry.age_threshold_hours
            );
        }
        for entry in &self.state.file_entries {
            log::info!(
                "file {} checked {}{}",
                entry.path,
                entry.last_checked_timestamp,
                if entry.ignore { " (ignored)" } else { "" }
            );
        }
        log::info!("Start on login: {}", self.settings.start_on_login);
    }

    /// Handle intents until `Quit` or until every sender is gone.
    ///
    /// Intents are applied one at a time in arrival order. Senders wait
    /// while the queue is full, so none are lost.
    ///
    /// Errors from individual intents are logged and the loop keeps going;
    /// nothing is retried. A failed save on `Quit` ends the loop with that
    /// error. If every sender closes without a `Quit`, state is
    /// persisted before returning. Returns the final state.
    pub async fn run(
        mut self,
        mut intents: IntentReceiver,
    ) -> Result<TrackedState, LifecycleError> {
        loop {
            match intents.recv().await {
                Some(intent) => {
                    let quitting = intent == Intent::Quit;
                    match self.handle(intent) {
                        Ok(Flow::Continue) => {}
                        Ok(Flow::Exit) => break,
                        // Quit is never retried; report the failed save and stop
                        Err(e) if quitting => return Err(e),
                        Err(e) => log::error!("{}", e),
                    }
                }
                None => {
                    log::info!("All intent senders closed, saving state");
                    self.persist()?;
                    break;
                }
            }
        }
        Ok(self.state)
    }
}

fn check_record<T: Record>(entry: &T) -> Result<(), LifecycleError> {
    entry
        .validate()
        .map_err(|source| LifecycleError::InvalidEntry {
            kind: T::KIND,
            source,
        })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intents::{intent_channel, intent_channel_with_capacity, DEFAULT_CAPACITY};
    use crate::persistence::load_state;
    use std::fs;
    use tempfile::{tempdir, TempDir};

    fn start(dir: &TempDir) -> Controller {
        Controller::start(TidyConfig::new(dir.path().join("data"))).unwrap()
    }

    fn on_disk(controller: &Controller) -> TrackedState {
        let config = controller.config();
        load_state(
            &config.file_entry_state_path(),
            &config.directory_entry_state_path(),
        )
        .unwrap()
        .state
    }

    #[test]
    fn start_creates_data_dir_and_state_files() {
        let dir = tempdir().unwrap();
        let controller = start(&dir);

        assert!(!controller.had_prior_state());
        assert!(controller.config().file_entry_state_path().exists());
        assert!(controller.config().directory_entry_state_path().exists());
    }

    #[test]
    fn restart_sees_prior_state() {
        let dir = tempdir().unwrap();
        {
            let mut controller = start(&dir);
            controller
                .handle(Intent::Watch(DirectoryEntry::new("/w", "/d", 24)))
                .unwrap();
        }

        let controller = start(&dir);
        assert!(controller.had_prior_state());
        assert_eq!(
            controller.state().directory_entries,
            vec![DirectoryEntry::new("/w", "/d", 24)]
        );
    }

    #[test]
    fn watch_intents_persist_immediately() {
        let dir = tempdir().unwrap();
        let mut controller = start(&dir);

        controller
            .handle(Intent::Watch(DirectoryEntry::new("/a", "/d", 1)))
            .unwrap();
        controller
            .handle(Intent::Watch(DirectoryEntry::new("/b", "/d", 2)))
            .unwrap();
        controller
            .handle(Intent::SetAgeThreshold {
                watch_path: "/a".into(),
                hours: 10,
            })
            .unwrap();
        controller
            .handle(Intent::Unwatch {
                watch_path: "/b".into(),
            })
            .unwrap();

        assert_eq!(
            on_disk(&controller).directory_entries,
            vec![DirectoryEntry::new("/a", "/d", 10)]
        );
    }

    #[test]
    fn watch_same_path_twice_keeps_one_entry() {
        let dir = tempdir().unwrap();
        let mut controller = start(&dir);

        controller
            .handle(Intent::Watch(DirectoryEntry::new("/a", "/d", 1)))
            .unwrap();
        controller
            .handle(Intent::Watch(DirectoryEntry::new("/a", "/e", 2)))
            .unwrap();

        assert_eq!(
            controller.state().directory_entries,
            vec![DirectoryEntry::new("/a", "/e", 2)]
        );
    }

    #[test]
    fn unknown_watch_path_is_an_error() {
        let dir = tempdir().unwrap();
        let mut controller = start(&dir);

        let err = controller
            .handle(Intent::Unwatch {
                watch_path: "/nope".into(),
            })
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotWatched(ref p) if p == "/nope"));

        let err = controller
            .handle(Intent::SetAgeThreshold {
                watch_path: "/nope".into(),
                hours: 1,
            })
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotWatched(_)));
    }

    #[test]
    fn record_check_then_ignore() {
        let dir = tempdir().unwrap();
        let mut controller = start(&dir);

        assert!(matches!(
            controller.handle(Intent::Ignore { path: "/f".into() }),
            Err(LifecycleError::NotTracked(_))
        ));

        controller
            .handle(Intent::RecordCheck { path: "/f".into() })
            .unwrap();
        controller
            .handle(Intent::Ignore { path: "/f".into() })
            .unwrap();

        let files = on_disk(&controller).file_entries;
        assert_eq!(files.len(), 1);
        assert!(files[0].ignore);
        assert!(files[0].last_checked_timestamp.ends_with('Z'));
    }

    #[test]
    fn toggle_startup_persists_setting() {
        let dir = tempdir().unwrap();
        let mut controller = start(&dir);

        assert_eq!(
            controller.handle(Intent::ToggleStartup).unwrap(),
            Flow::Continue
        );
        assert!(controller.settings().start_on_login);
        assert!(load_settings(controller.config().data_dir()).unwrap().start_on_login);

        controller.handle(Intent::ToggleStartup).unwrap();
        assert!(!load_settings(controller.config().data_dir()).unwrap().start_on_login);
    }

    #[test]
    fn corrupt_settings_fall_back_to_default() {
        let dir = tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir_all(&data).unwrap();
        fs::write(data.join("settings.json"), "garbage").unwrap();

        let controller = Controller::start(TidyConfig::new(&data)).unwrap();
        assert!(!controller.settings().start_on_login);
    }

    #[test]
    fn quit_exits_and_persists() {
        let dir = tempdir().unwrap();
        let mut controller = start(&dir);
        controller.state.record_file_check("/unsaved", "t");

        assert_eq!(controller.handle(Intent::Quit).unwrap(), Flow::Exit);
        assert_eq!(on_disk(&controller).file_entries.len(), 1);
    }

    #[test]
    fn start_fails_when_data_dir_cannot_be_created() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "").unwrap();

        let result = Controller::start(TidyConfig::new(blocker.join("data")));
        assert!(matches!(result, Err(LifecycleError::Config(_))));
    }

    #[test]
    fn toggle_startup_keeps_setting_when_save_fails() {
        let dir = tempdir().unwrap();
        let mut controller = start(&dir);
        fs::remove_dir_all(controller.config().data_dir()).unwrap();

        let err = controller.handle(Intent::ToggleStartup).unwrap_err();

        assert!(matches!(err, LifecycleError::Settings(_)));
        assert!(!controller.settings().start_on_login);
    }

    #[test]
    fn watch_rejects_entries_the_state_file_cannot_hold() {
        let dir = tempdir().unwrap();
        let mut controller = start(&dir);

        for entry in [
            DirectoryEntry::new("/a,b", "/dest", 5),
            DirectoryEntry::new("", "/dest", 5),
            DirectoryEntry::new("/w", "", 5),
            DirectoryEntry::new("/w\nx", "/dest", 5),
            DirectoryEntry::new("/w", "/dest\r\n", 5),
        ] {
            let err = controller.handle(Intent::Watch(entry)).unwrap_err();
            assert!(matches!(
                err,
                LifecycleError::InvalidEntry {
                    kind: "directory entry",
                    ..
                }
            ));
        }

        assert!(controller.state().directory_entries.is_empty());
        assert!(on_disk(&controller).directory_entries.is_empty());
    }

    #[test]
    fn record_check_rejects_unstorable_paths() {
        let dir = tempdir().unwrap();
        let mut controller = start(&dir);

        for path in ["", "/a,b.txt", "/a\nb.txt"] {
            let err = controller
                .handle(Intent::RecordCheck { path: path.into() })
                .unwrap_err();
            assert!(matches!(err, LifecycleError::InvalidEntry { .. }));
        }

        assert!(controller.state().file_entries.is_empty());
    }

    #[test]
    fn accepted_entries_survive_restart_unchanged() {
        let dir = tempdir().unwrap();
        let expected = {
            let mut controller = start(&dir);
            controller
                .handle(Intent::Watch(DirectoryEntry::new(
                    "/Users/me/My Downloads",
                    "/Volumes/Old, Stuff",
                    5,
                )))
                .unwrap();
            controller
                .handle(Intent::RecordCheck {
                    path: "/Users/me/My Downloads/a b.zip".into(),
                })
                .unwrap();
            controller.state().clone()
        };

        let controller = start(&dir);
        assert_eq!(controller.state(), &expected);
    }

    #[tokio::test]
    async fn run_until_quit() {
        let dir = tempdir().unwrap();
        let controller = start(&dir);
        let config = controller.config().clone();
        let (sender, receiver) = intent_channel();

        sender
            .send(Intent::Watch(DirectoryEntry::new("/w", "/d", 5)))
            .await;
        sender
            .send(Intent::Unwatch {
                watch_path: "/missing".into(),
            })
            .await;
        sender.send(Intent::ListState).await;
        sender.send(Intent::Quit).await;
        // Never handled
        sender
            .send(Intent::Watch(DirectoryEntry::new("/late", "/d", 5)))
            .await;

        let state = controller.run(receiver).await.unwrap();

        assert_eq!(
            state.directory_entries,
            vec![DirectoryEntry::new("/w", "/d", 5)]
        );
        let reloaded = load_state(
            &config.file_entry_state_path(),
            &config.directory_entry_state_path(),
        )
        .unwrap();
        assert_eq!(reloaded.state, state);
    }

    #[tokio::test]
    async fn run_handles_more_intents_than_queue_capacity() {
        let dir = tempdir().unwrap();
        let controller = start(&dir);
        let config = controller.config().clone();
        let (sender, receiver) = intent_channel_with_capacity(8);
        let count = DEFAULT_CAPACITY + 36;

        let producer = tokio::spawn(async move {
            for i in 0..count {
                let entry = DirectoryEntry::new(format!("/w{i}"), "/d", 1);
                assert!(sender.send(Intent::Watch(entry)).await);
            }
            sender.send(Intent::Quit).await;
        });

        let state = controller.run(receiver).await.unwrap();
        producer.await.unwrap();

        assert_eq!(state.directory_entries.len(), count);
        assert_eq!(
            state.directory_entries[count - 1].watch_path,
            format!("/w{}", count - 1)
        );
        let reloaded = load_state(
            &config.file_entry_state_path(),
            &config.directory_entry_state_path(),
        )
        .unwrap();
        assert_eq!(reloaded.state.directory_entries.len(), count);
    }

    #[tokio::test]
    async fn run_persists_when_senders_close() {
        let dir = tempdir().unwrap();
        let mut controller = start(&dir);
        controller.state.record_file_check("/pending", "t");
        let config = controller.config().clone();

        let (sender, receiver) = intent_channel();
        drop(sender);

        controller.run(receiver).await.unwrap();

        let reloaded = load_state(
            &config.file_entry_state_path(),
            &config.directory_entry_state_path(),
        )
        .unwrap();
        assert_eq!(reloaded.state.file_entries.len(), 1);
    }
}
