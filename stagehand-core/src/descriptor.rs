//! Asset descriptor metadata extraction.
//!
//! Every asset bundle carries a line-oriented `config.txt`:
//!
//! ```text
//! kind          "traincar"
//! kuid          <kuid:523:19001>
//! username      "BR 218 Rot"
//! ```
//!
//! Only two facts are read from it: the asset id (`kuid`, angle-bracket
//! delimited) and the display name (`username`, falling back to
//! `asset-filename`, double-quote delimited). A key only matches when it is the
//! first whitespace-delimited token of a line, so indented lines never match.

use std::path::Path;

use crate::error::{io_err, CoreError};
use crate::types::AssetId;

/// Descriptor file name inside each asset bundle.
pub const DESCRIPTOR_FILE: &str = "config.txt";

/// Key whose value is the asset id.
pub const ID_KEY: &str = "kuid";

/// Display-name keys, primary first. Whichever appears first in the file wins.
pub const NAME_KEYS: [&str; 2] = ["username", "asset-filename"];

/// Metadata extracted from a descriptor. Either field may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Descriptor {
    pub id: Option<AssetId>,
    pub name: Option<String>,
}

/// Read and parse the descriptor at `path`.
///
/// Bytes are decoded lossily; legacy descriptors are frequently not UTF-8.
pub fn read_at(path: &Path) -> Result<Descriptor, CoreError> {
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    Ok(parse(&String::from_utf8_lossy(&bytes)))
}

/// Parse descriptor text.
pub fn parse(text: &str) -> Descriptor {
    Descriptor {
        id: extract_id(text).map(AssetId::from),
        name: extract_name(text).map(str::to_string),
    }
}

fn meaningful_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim_end).filter(|line| !line.is_empty())
}

fn first_token(line: &str) -> &str {
    line.split(char::is_whitespace).next().unwrap_or_default()
}

fn extract_id(text: &str) -> Option<&str> {
    meaningful_lines(text)
        .filter(|line| first_token(line) == ID_KEY)
        .find_map(|line| between(line, '<', '>'))
}

fn extract_name(text: &str) -> Option<&str> {
    meaningful_lines(text)
        .filter(|line| {
            let key = first_token(line);
            NAME_KEYS.contains(&key) && line.len() > key.len()
        })
        .find_map(|line| between(line, '"', '"'))
}

/// Text after the first `open`, up to the next `close` (or end of line).
fn between(line: &str, open: char, close: char) -> Option<&str> {
    let (_, rest) = line.split_once(open)?;
    Some(rest.split(close).next().unwrap_or(rest))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_id_and_username() {
        let d = parse("kind \"traincar\"\nkuid <kuid:523:19001>\nusername \"BR 218\"\n");
        assert_eq!(d.id, Some(AssetId::from("kuid:523:19001")));
        assert_eq!(d.name.as_deref(), Some("BR 218"));
    }

    #[test]
    fn asset_filename_is_accepted_as_name() {
        let d = parse("asset-filename \"signal_box\"\r\nkuid <kuid2:1:2:3>\r\n");
        assert_eq!(d.name.as_deref(), Some("signal_box"));
        assert_eq!(d.id, Some(AssetId::from("kuid2:1:2:3")));
    }

    #[test]
    fn first_name_key_in_file_wins() {
        let d = parse("asset-filename \"file\"\nusername \"user\"\n");
        assert_eq!(d.name.as_deref(), Some("file"));
    }

    #[test]
    fn bare_name_key_without_value_is_skipped() {
        let d = parse("username   \nasset-filename \"fallback\"\n");
        assert_eq!(d.name.as_deref(), Some("fallback"));
    }

    #[test]
    fn indented_keys_do_not_match() {
        let d = parse("container\n{\n  kuid <kuid:9:9>\n  username \"nested\"\n}\n");
        assert_eq!(d, Descriptor::default());
    }

    #[test]
    fn key_must_be_whole_token() {
        let d = parse("kuid-table\n{\n}\nkuidx <kuid:1:1>\n");
        assert!(d.id.is_none());
    }

    #[test]
    fn descriptor_without_keys_yields_nothing() {
        assert_eq!(parse("kind \"scenery\"\n\n"), Descriptor::default());
    }

    #[test]
    fn read_at_decodes_non_utf8_bytes() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join(DESCRIPTOR_FILE);
        let mut bytes = b"kuid <kuid:7:7>\nusername \"Gr".to_vec();
        bytes.push(0xFC); // latin-1 'ü'
        bytes.extend_from_slice(b"n\"\n");
        std::fs::write(&path, bytes).unwrap();

        let d = read_at(&path).unwrap();
        assert_eq!(d.id, Some(AssetId::from("kuid:7:7")));
        assert!(d.name.unwrap().starts_with("Gr"));
    }

    #[test]
    fn read_at_missing_file_reports_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let err = read_at(&dir.path().join("config.txt")).unwrap_err();
        assert!(err.to_string().contains("config.txt"));
    }
}
