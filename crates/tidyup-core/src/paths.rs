use std::env;
use std::path::PathBuf;

/// Directory name used under the platform data location.
const APP_DIR_MAC_WIN: &str = "TidyUp";
const APP_DIR_XDG: &str = "tidyup";

/// Return the user's home directory path.
///
/// Uses HOME on Unix-like systems and USERPROFILE on Windows.
pub fn get_home_dir() -> Result<String, String> {
    if let Some(home) = non_empty_var("HOME") {
        return Ok(home);
    }

    if let Some(profile) = non_empty_var("USERPROFILE") {
        return Ok(profile);
    }

    Err("Home directory not set".to_string())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.is_empty())
}

/// Platform families with different data directory conventions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Windows,
    Xdg,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Xdg
        }
    }
}

/// Default app data directory for the current platform.
///
/// - macOS: `~/Library/Application Support/TidyUp`
/// - Windows: `%APPDATA%\TidyUp`
/// - Linux and others: `$XDG_DATA_HOME/tidyup`, falling back to
///   `~/.local/share/tidyup`
pub fn app_data_dir() -> Result<PathBuf, String> {
    app_data_dir_for(Platform::current())
}

pub fn app_data_dir_for(platform: Platform) -> Result<PathBuf, String> {
    match platform {
        Platform::MacOs => Ok(PathBuf::from(get_home_dir()?)
            .join("Library")
            .join("Application Support")
            .join(APP_DIR_MAC_WIN)),
        Platform::Windows => {
            let base = match non_empty_var("APPDATA") {
                Some(appdata) => PathBuf::from(appdata),
                None => PathBuf::from(get_home_dir()?)
                    .join("AppData")
                    .join("Roaming"),
            };
            Ok(base.join(APP_DIR_MAC_WIN))
        }
        Platform::Xdg => {
            let base = match non_empty_var("XDG_DATA_HOME") {
                Some(xdg) => PathBuf::from(xdg),
                None => PathBuf::from(get_home_dir()?).join(".local").join("share"),
            };
            Ok(base.join(APP_DIR_XDG))
        }
    }
}
