//! Login-time autostart for the current executable.
//!
//! The OS keeps the record; nothing is cached here. Every query re-reads the
//! store, and the entry only counts as enabled when it points at *this*
//! executable.

use std::path::{Component, Path, PathBuf};
use tracing::{debug, info};

use crate::error::AutostartError;

#[cfg(target_os = "macos")]
mod launch_agent;
#[cfg(windows)]
mod registry;
#[cfg(all(unix, not(target_os = "macos")))]
mod xdg;

#[cfg(target_os = "macos")]
pub use launch_agent::LaunchAgentStore as PlatformStore;
#[cfg(windows)]
pub use registry::RunKeyStore as PlatformStore;
#[cfg(all(unix, not(target_os = "macos")))]
pub use xdg::DesktopEntryStore as PlatformStore;

/// Name of the autostart entry.
pub const ENTRY_NAME: &str = "Autotile";

/// A per-user key-value store the OS consults at login.
pub trait AutostartStore {
    /// Stored executable path for `name`, or `None` if there is no entry.
    fn read(&self, name: &str) -> Result<Option<String>, AutostartError>;

    fn write(&self, name: &str, executable: &str) -> Result<(), AutostartError>;

    /// Remove the entry. Removing a missing entry is not an error.
    fn remove(&self, name: &str) -> Result<(), AutostartError>;
}

/// Autostart manager for one executable.
pub struct Autostart<S> {
    store: S,
    name: String,
    executable: Result<PathBuf, String>,
}

impl<S: AutostartStore> Autostart<S> {
    pub fn new(store: S, name: impl Into<String>, executable: PathBuf) -> Self {
        Self {
            store,
            name: name.into(),
            executable: Ok(executable),
        }
    }

    /// Manager for the running executable.
    ///
    /// An unresolvable executable path is remembered rather than returned:
    /// the manager then reports "disabled" and refuses to enable.
    pub fn for_current_exe(store: S) -> Self {
        match std::env::current_exe() {
            Ok(executable) => Self::new(store, ENTRY_NAME, executable),
            Err(e) => Self {
                store,
                name: ENTRY_NAME.to_string(),
                executable: Err(e.to_string()),
            },
        }
    }

    fn executable(&self) -> Result<&Path, AutostartError> {
        self.executable.as_deref().map_err(|e| {
            AutostartError::CurrentExe(std::io::Error::new(std::io::ErrorKind::NotFound, e.clone()))
        })
    }

    /// True only if the entry exists and points at this executable.
    /// Any store error counts as disabled.
    pub fn is_enabled(&self) -> bool {
        let Ok(executable) = self.executable() else {
            return false;
        };

        match self.store.read(&self.name) {
            Ok(Some(stored)) => {
                let matches = normalize_path(Path::new(&stored)) == normalize_path(executable);
                if !matches {
                    debug!(
                        stored = %stored,
                        executable = %executable.display(),
                        "Autostart entry points elsewhere"
                    );
                }
                matches
            }
            Ok(None) => false,
            Err(e) => {
                debug!(error = %e, "Autostart store unreadable, treating as disabled");
                false
            }
        }
    }

    pub fn enable(&self) -> Result<(), AutostartError> {
        let executable = self.executable()?;
        self.store
            .write(&self.name, &executable.to_string_lossy())?;
        info!(executable = %executable.display(), "Autostart enabled");
        Ok(())
    }

    pub fn disable(&self) -> Result<(), AutostartError> {
        self.store.remove(&self.name)?;
        info!("Autostart disabled");
        Ok(())
    }

    /// Flip the state. Returns whether autostart is enabled afterwards.
    pub fn toggle(&self) -> Result<bool, AutostartError> {
        if self.is_enabled() {
            self.disable()?;
            Ok(false)
        } else {
            self.enable()?;
            Ok(true)
        }
    }
}

/// Autostart manager backed by the platform store.
#[cfg(any(windows, unix))]
pub fn system() -> Result<Autostart<PlatformStore>, AutostartError> {
    Ok(Autostart::for_current_exe(PlatformStore::new()?))
}

/// Lexically clean a path: drop `.` segments, resolve `..` against preceding
/// segments, and collapse redundant and trailing separators. The filesystem
/// is not consulted.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                // `..` at the root stays at the root
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory store that can be told to fail.
    #[derive(Default)]
    struct MemoryStore {
        entries: RefCell<HashMap<String, String>>,
        broken: bool,
    }

    impl MemoryStore {
        fn broken() -> Self {
            Self {
                broken: true,
                ..Self::default()
            }
        }

        fn check(&self) -> Result<(), AutostartError> {
            if self.broken {
                Err(AutostartError::store(
                    "memory",
                    std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied"),
                ))
            } else {
                Ok(())
            }
        }
    }

    impl AutostartStore for MemoryStore {
        fn read(&self, name: &str) -> Result<Option<String>, AutostartError> {
            self.check()?;
            Ok(self.entries.borrow().get(name).cloned())
        }

        fn write(&self, name: &str, executable: &str) -> Result<(), AutostartError> {
            self.check()?;
            self.entries
                .borrow_mut()
                .insert(name.to_string(), executable.to_string());
            Ok(())
        }

        fn remove(&self, name: &str) -> Result<(), AutostartError> {
            self.check()?;
            self.entries.borrow_mut().remove(name);
            Ok(())
        }
    }

    fn exe() -> PathBuf {
        if cfg!(windows) {
            PathBuf::from(r"C:\Tools\autotile\autotile.exe")
        } else {
            PathBuf::from("/opt/autotile/bin/autotile")
        }
    }

    fn manager(store: MemoryStore) -> Autostart<MemoryStore> {
        Autostart::new(store, ENTRY_NAME, exe())
    }

    #[test]
    fn test_empty_store_enable_via_toggle() {
        let autostart = manager(MemoryStore::default());
        assert!(!autostart.is_enabled());

        assert!(autostart.toggle().unwrap());
        assert_eq!(
            autostart.store.entries.borrow().get(ENTRY_NAME).cloned(),
            Some(exe().to_string_lossy().into_owned())
        );
        assert!(autostart.is_enabled());
    }

    #[test]
    fn test_toggle_twice_restores_state() {
        let autostart = manager(MemoryStore::default());

        assert!(!autostart.is_enabled());
        autostart.toggle().unwrap();
        autostart.toggle().unwrap();
        assert!(!autostart.is_enabled());
        assert!(autostart.store.entries.borrow().is_empty());

        autostart.enable().unwrap();
        autostart.toggle().unwrap();
        autostart.toggle().unwrap();
        assert!(autostart.is_enabled());
    }

    #[test]
    fn test_entry_for_other_executable_is_disabled() {
        let autostart = manager(MemoryStore::default());
        let other = exe().with_file_name("something-else");
        autostart
            .store
            .write(ENTRY_NAME, &other.to_string_lossy())
            .unwrap();

        assert!(!autostart.is_enabled());

        // Toggling claims the entry for this executable
        assert!(autostart.toggle().unwrap());
        assert!(autostart.is_enabled());
    }

    #[test]
    fn test_unnormalized_entry_still_matches() {
        let autostart = manager(MemoryStore::default());
        let exe = exe();
        let dir = exe.parent().unwrap();
        let sep = std::path::MAIN_SEPARATOR;
        let messy = format!(
            "{}{sep}{sep}.{sep}sub{sep}..{sep}{}",
            dir.display(),
            exe.file_name().unwrap().to_string_lossy(),
            sep = sep
        );
        autostart.store.write(ENTRY_NAME, &messy).unwrap();

        assert!(autostart.is_enabled());
    }

    #[test]
    fn test_store_errors_fail_closed() {
        let autostart = manager(MemoryStore::broken());
        assert!(!autostart.is_enabled());
        assert!(autostart.enable().is_err());
        assert!(autostart.toggle().is_err());
    }

    #[test]
    fn test_disable_without_entry_is_ok() {
        let autostart = manager(MemoryStore::default());
        autostart.disable().unwrap();
        assert!(!autostart.is_enabled());
    }

    #[test]
    fn test_unknown_executable_never_enabled() {
        let autostart = Autostart {
            store: MemoryStore::default(),
            name: ENTRY_NAME.to_string(),
            executable: Err("gone".to_string()),
        };
        autostart.store.write(ENTRY_NAME, "/opt/autotile/bin/autotile").unwrap();

        assert!(!autostart.is_enabled());
        assert!(matches!(
            autostart.enable(),
            Err(AutostartError::CurrentExe(_))
        ));
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(
            normalize_path(Path::new("/usr//local/./bin/")),
            PathBuf::from("/usr/local/bin")
        );
        assert_eq!(
            normalize_path(Path::new("/usr/local/../bin/autotile")),
            PathBuf::from("/usr/bin/autotile")
        );
        assert_eq!(normalize_path(Path::new("/../etc")), PathBuf::from("/etc"));
        assert_eq!(normalize_path(Path::new("a/b/../../..")), PathBuf::from(".."));
        assert_eq!(normalize_path(Path::new("./")), PathBuf::from("."));
        assert_eq!(normalize_path(Path::new("")), PathBuf::from("."));
    }

    #[test]
    fn test_normalize_path_is_case_sensitive() {
        assert_ne!(
            normalize_path(Path::new("/opt/Autotile")),
            normalize_path(Path::new("/opt/autotile"))
        );
    }
}
