//! Parsing for Windows `tasklist /FO CSV /NH` output.
//!
//! ```text
//! "TADDaemon.exe","4312","Console","1","18,220 K"
//! ```
//!
//! When nothing matches the filter, tasklist prints an `INFO:` line instead.

/// Windows image name for `name`, adding `.exe` when missing.
pub fn image_name(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(".exe") {
        name.to_string()
    } else {
        format!("{name}.exe")
    }
}

/// `true` if any CSV row's first column equals `image` (case-insensitive).
pub fn contains_image(output: &str, image: &str) -> bool {
    output
        .lines()
        .filter_map(first_column)
        .any(|column| column.eq_ignore_ascii_case(image))
}

fn first_column(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('"')?;
    rest.split('"').next()
}
