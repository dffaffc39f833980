//! macOS LaunchAgent store (`~/Library/LaunchAgents/<label>.plist`).

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::AutostartStore;
use crate::error::AutostartError;

const LABEL_PREFIX: &str = "dev";

pub struct LaunchAgentStore {
    dir: PathBuf,
}

impl LaunchAgentStore {
    pub fn new() -> Result<Self, AutostartError> {
        let home = dirs::home_dir().ok_or(AutostartError::Location("home directory"))?;
        Ok(Self::in_dir(home.join("Library").join("LaunchAgents")))
    }

    pub fn in_dir(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn plist_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.plist", label(name)))
    }
}

fn label(name: &str) -> String {
    format!("{}.{}", LABEL_PREFIX, name.to_lowercase())
}

impl AutostartStore for LaunchAgentStore {
    fn read(&self, name: &str) -> Result<Option<String>, AutostartError> {
        let path = self.plist_path(name);
        match fs::read_to_string(&path) {
            Ok(content) => Ok(parse_program(&content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AutostartError::store(path.display().to_string(), e)),
        }
    }

    fn write(&self, name: &str, executable: &str) -> Result<(), AutostartError> {
        let path = self.plist_path(name);
        fs::create_dir_all(&self.dir)
            .map_err(|e| AutostartError::store(self.dir.display().to_string(), e))?;
        fs::write(&path, plist_content(&label(name), executable))
            .map_err(|e| AutostartError::store(path.display().to_string(), e))
    }

    fn remove(&self, name: &str) -> Result<(), AutostartError> {
        let path = self.plist_path(name);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AutostartError::store(path.display().to_string(), e)),
        }
    }
}

fn plist_content(label: &str, executable: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{label}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{executable}</string>
    </array>
    <key>RunAtLoad</key>
    <true/>
</dict>
</plist>
"#,
        label = xml_escape(label),
        executable = xml_escape(executable)
    )
}

/// First entry of `ProgramArguments`.
fn parse_program(content: &str) -> Option<String> {
    let after_key = content.split_once("<key>ProgramArguments</key>")?.1;
    let after_open = after_key.split_once("<string>")?.1;
    let raw = after_open.split_once("</string>")?.0;
    Some(xml_unescape(raw.trim()))
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn xml_unescape(s: &str) -> String {
    s.replace("&quot;", "\"")
        .replace("&gt;", ">")
        .replace("&lt;", "<")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_read_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = LaunchAgentStore::in_dir(dir.path().to_path_buf());
        let exe = "/Applications/Auto & Tile.app/Contents/MacOS/autotile";

        assert_eq!(store.read("Autotile").unwrap(), None);

        store.write("Autotile", exe).unwrap();
        assert!(dir.path().join("dev.autotile.plist").exists());
        assert_eq!(store.read("Autotile").unwrap().as_deref(), Some(exe));

        store.remove("Autotile").unwrap();
        assert_eq!(store.read("Autotile").unwrap(), None);
        store.remove("Autotile").unwrap();
    }

    #[test]
    fn test_plist_without_program_is_absent() {
        assert_eq!(parse_program("<plist><dict></dict></plist>"), None);
    }
}
