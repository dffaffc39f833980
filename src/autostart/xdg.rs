//! XDG autostart store (`~/.config/autostart/<name>.desktop`).

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::AutostartStore;
use crate::error::AutostartError;

pub struct DesktopEntryStore {
    dir: PathBuf,
}

impl DesktopEntryStore {
    pub fn new() -> Result<Self, AutostartError> {
        let config_dir = dirs::config_dir().ok_or(AutostartError::Location("config directory"))?;
        Ok(Self::in_dir(config_dir.join("autostart")))
    }

    pub fn in_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn entry_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.desktop", name.to_lowercase()))
    }
}

impl AutostartStore for DesktopEntryStore {
    fn read(&self, name: &str) -> Result<Option<String>, AutostartError> {
        let path = self.entry_path(name);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AutostartError::store(path.display().to_string(), e)),
        };
        Ok(parse_exec(&content))
    }

    fn write(&self, name: &str, executable: &str) -> Result<(), AutostartError> {
        let path = self.entry_path(name);
        fs::create_dir_all(&self.dir)
            .map_err(|e| AutostartError::store(self.dir.display().to_string(), e))?;
        fs::write(&path, desktop_entry(name, executable))
            .map_err(|e| AutostartError::store(path.display().to_string(), e))
    }

    fn remove(&self, name: &str) -> Result<(), AutostartError> {
        let path = self.entry_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AutostartError::store(path.display().to_string(), e)),
        }
    }
}

fn desktop_entry(name: &str, executable: &str) -> String {
    format!(
        "[Desktop Entry]\n\
         Type=Application\n\
         Name={name}\n\
         Comment=Flip the tiling direction of narrow windows\n\
         Exec={exec}\n\
         Terminal=false\n\
         X-GNOME-Autostart-enabled=true\n",
        name = name,
        exec = quote_exec(executable)
    )
}

/// Executable from the `Exec=` key of the `[Desktop Entry]` group. Entries
/// that are hidden or disabled count as absent.
fn parse_exec(content: &str) -> Option<String> {
    let mut in_main_group = false;
    let mut exec = None;

    for line in content.lines().map(str::trim) {
        if line.starts_with('[') {
            in_main_group = line == "[Desktop Entry]";
            continue;
        }
        if !in_main_group {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match (key.trim(), value.trim()) {
            ("Hidden", "true") | ("X-GNOME-Autostart-enabled", "false") => return None,
            ("Exec", value) => exec = unquote_exec(value),
            _ => {}
        }
    }

    exec
}

const RESERVED: &[char] = &[
    ' ', '\t', '\n', '"', '\'', '\\', '>', '<', '~', '|', '&', ';', '$', '*', '?', '#', '(',
    ')', '`',
];

/// Quote a path as the program of an `Exec=` value.
fn quote_exec(path: &str) -> String {
    let path = path.replace('%', "%%");
    if !path.contains(RESERVED) {
        return path;
    }

    let mut quoted = String::with_capacity(path.len() + 2);
    quoted.push('"');
    for c in path.chars() {
        if matches!(c, '"' | '`' | '$' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');

    // String-level escaping applies on top of the quoting rules
    quoted.replace('\\', "\\\\")
}

/// First argument of an `Exec=` value.
fn unquote_exec(value: &str) -> Option<String> {
    let value = value.replace("\\\\", "\\");
    let value = value.trim();

    let program = if let Some(rest) = value.strip_prefix('"') {
        let mut program = String::new();
        let mut chars = rest.chars();
        loop {
            match chars.next()? {
                '"' => break,
                '\\' => program.push(chars.next()?),
                c => program.push(c),
            }
        }
        program
    } else {
        value.split_whitespace().next()?.to_string()
    };

    Some(program.replace("%%", "%"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = DesktopEntryStore::in_dir(dir.path().join("autostart"));

        assert_eq!(store.read("Autotile").unwrap(), None);

        store.write("Autotile", "/opt/autotile/bin/autotile").unwrap();
        let file = dir.path().join("autostart").join("autotile.desktop");
        let content = fs::read_to_string(&file).unwrap();
        assert!(content.contains("Exec=/opt/autotile/bin/autotile\n"));
        assert_eq!(
            store.read("Autotile").unwrap().as_deref(),
            Some("/opt/autotile/bin/autotile")
        );

        store.remove("Autotile").unwrap();
        assert!(!file.exists());
        assert_eq!(store.read("Autotile").unwrap(), None);

        // Second removal is fine
        store.remove("Autotile").unwrap();
    }

    #[test]
    fn test_paths_with_spaces_survive() {
        let dir = tempfile::tempdir().unwrap();
        let store = DesktopEntryStore::in_dir(dir.path().to_path_buf());
        let exe = "/home/me/My Apps/auto$tile 100%/autotile";

        store.write("Autotile", exe).unwrap();
        assert_eq!(store.read("Autotile").unwrap().as_deref(), Some(exe));
    }

    #[test]
    fn test_parse_exec() {
        let content = "[Desktop Entry]\nType=Application\nExec=/usr/bin/autotile --flag\n";
        assert_eq!(parse_exec(content).as_deref(), Some("/usr/bin/autotile"));

        let quoted = "[Desktop Entry]\nExec=\"/opt/my apps/autotile\" run\n";
        assert_eq!(parse_exec(quoted).as_deref(), Some("/opt/my apps/autotile"));

        let other_group = "[Desktop Action New]\nExec=/usr/bin/other\n";
        assert_eq!(parse_exec(other_group), None);
    }

    #[test]
    fn test_disabled_entry_is_absent() {
        let hidden = "[Desktop Entry]\nExec=/usr/bin/autotile\nHidden=true\n";
        assert_eq!(parse_exec(hidden), None);

        let gnome_off = "[Desktop Entry]\nExec=/usr/bin/autotile\nX-GNOME-Autostart-enabled=false\n";
        assert_eq!(parse_exec(gnome_off), None);
    }

    #[test]
    fn test_unreadable_entry_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = DesktopEntryStore::in_dir(dir.path().to_path_buf());
        // A directory where the file should be
        fs::create_dir(dir.path().join("autotile.desktop")).unwrap();
        assert!(store.read("Autotile").is_err());
    }
}
