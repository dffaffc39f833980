//! Autostart command - inspect and change the login entry.

use anyhow::{Context, Result};

use crate::autostart::{self, Autostart, AutostartStore};
use crate::cli::AutostartAction;

/// Run the autostart command.
pub fn run(action: AutostartAction) -> Result<()> {
    let manager = autostart::system().context("Autostart is not available on this system")?;
    let enabled = apply(&manager, action)?;
    println!("{}", describe(enabled));
    Ok(())
}

/// Apply `action` and return the resulting state.
fn apply<S: AutostartStore>(manager: &Autostart<S>, action: AutostartAction) -> Result<bool> {
    match action {
        AutostartAction::Status => Ok(manager.is_enabled()),
        AutostartAction::Enable => {
            manager.enable().context("Failed to enable autostart")?;
            Ok(manager.is_enabled())
        }
        AutostartAction::Disable => {
            manager.disable().context("Failed to disable autostart")?;
            Ok(manager.is_enabled())
        }
        AutostartAction::Toggle => manager.toggle().context("Failed to toggle autostart"),
    }
}

fn describe(enabled: bool) -> &'static str {
    if enabled {
        "Autostart enabled"
    } else {
        "Autostart disabled"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AutostartError;
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[derive(Default)]
    struct SingleEntry(RefCell<Option<String>>);

    impl AutostartStore for SingleEntry {
        fn read(&self, _name: &str) -> Result<Option<String>, AutostartError> {
            Ok(self.0.borrow().clone())
        }

        fn write(&self, _name: &str, executable: &str) -> Result<(), AutostartError> {
            *self.0.borrow_mut() = Some(executable.to_string());
            Ok(())
        }

        fn remove(&self, _name: &str) -> Result<(), AutostartError> {
            *self.0.borrow_mut() = None;
            Ok(())
        }
    }

    #[test]
    fn test_actions() {
        let manager = Autostart::new(
            SingleEntry::default(),
            autostart::ENTRY_NAME,
            PathBuf::from("/usr/bin/autotile"),
        );

        assert!(!apply(&manager, AutostartAction::Status).unwrap());
        assert!(apply(&manager, AutostartAction::Enable).unwrap());
        assert!(apply(&manager, AutostartAction::Status).unwrap());
        assert!(!apply(&manager, AutostartAction::Toggle).unwrap());
        assert!(apply(&manager, AutostartAction::Toggle).unwrap());
        assert!(!apply(&manager, AutostartAction::Disable).unwrap());
        assert_eq!(describe(false), "Autostart disabled");
    }
}
