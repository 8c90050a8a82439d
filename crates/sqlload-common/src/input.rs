//! File-or-stdin opener

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;
use tracing::debug;

/// Path argument that selects the process's standard input.
pub const STDIN_PATH: &str = "-";

/// Open `path` for reading, mapping the literal `-` to standard input.
pub fn open_input(path: &str) -> io::Result<Box<dyn Read + Send>> {
    if path == STDIN_PATH {
        debug!("Reading input from stdin");
        return Ok(Box::new(io::stdin()));
    }

    debug!(path = %path, "Opening input file");
    let file = File::open(Path::new(path))?;
    Ok(Box::new(file))
}

/// Read the whole input into a string.
///
/// Scripts are small compared to data files, so they are loaded at once.
pub fn read_to_string(path: &str) -> io::Result<String> {
    let mut reader = open_input(path)?;
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    Ok(text)
}
