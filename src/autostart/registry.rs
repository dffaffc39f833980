//! `HKCU\...\CurrentVersion\Run` registry store.

use std::io::ErrorKind;
use winreg::enums::{HKEY_CURRENT_USER, KEY_QUERY_VALUE, KEY_SET_VALUE};
use winreg::RegKey;

use super::AutostartStore;
use crate::error::AutostartError;

const RUN_KEY: &str = r"Software\Microsoft\Windows\CurrentVersion\Run";

pub struct RunKeyStore {
    hkcu: RegKey,
}

impl RunKeyStore {
    pub fn new() -> Result<Self, AutostartError> {
        Ok(Self {
            hkcu: RegKey::predef(HKEY_CURRENT_USER),
        })
    }
}

fn location(name: &str) -> String {
    format!(r"HKCU\{}\{}", RUN_KEY, name)
}

impl AutostartStore for RunKeyStore {
    fn read(&self, name: &str) -> Result<Option<String>, AutostartError> {
        let key = match self.hkcu.open_subkey_with_flags(RUN_KEY, KEY_QUERY_VALUE) {
            Ok(key) => key,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AutostartError::store(location(name), e)),
        };

        match key.get_value::<String, _>(name) {
            Ok(value) => Ok(Some(unquote(&value).to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AutostartError::store(location(name), e)),
        }
    }

    fn write(&self, name: &str, executable: &str) -> Result<(), AutostartError> {
        let (key, _disposition) = self
            .hkcu
            .create_subkey(RUN_KEY)
            .map_err(|e| AutostartError::store(location(name), e))?;

        key.set_value(name, &quote(executable))
            .map_err(|e| AutostartError::store(location(name), e))
    }

    fn remove(&self, name: &str) -> Result<(), AutostartError> {
        let key = match self.hkcu.open_subkey_with_flags(RUN_KEY, KEY_SET_VALUE) {
            Ok(key) => key,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(AutostartError::store(location(name), e)),
        };

        match key.delete_value(name) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AutostartError::store(location(name), e)),
        }
    }
}

/// Windows splits an unquoted Run command at the first space, so
/// `C:\Program Files\...` must be quoted.
fn quote(path: &str) -> String {
    format!("\"{}\"", path)
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quoting() {
        assert_eq!(
            quote(r"C:\Program Files\Autotile\autotile.exe"),
            r#""C:\Program Files\Autotile\autotile.exe""#
        );
        assert_eq!(
            unquote(r#""C:\Program Files\Autotile\autotile.exe""#),
            r"C:\Program Files\Autotile\autotile.exe"
        );
        // Entries written unquoted by older versions
        assert_eq!(unquote(r"C:\Tools\autotile.exe"), r"C:\Tools\autotile.exe");
    }
}
