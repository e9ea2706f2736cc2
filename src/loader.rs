//! Program file loading: parses a text file of hexadecimal 32-bit words
//! into the sequence the simulator loads into its text region.

use std::fs;
use std::path::Path;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("could not read program file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// The outcome of parsing a program file.
///
/// `words` holds everything successfully parsed before a stop, whether that
/// stop was end-of-file or a malformed line. `stopped_at`, when present,
/// names the 1-indexed line and raw text that ended parsing early.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProgram {
    pub words: Vec<u32>,
    pub stopped_at: Option<(usize, String)>,
}

impl LoadedProgram {
    pub fn program_size(&self) -> usize {
        self.words.len()
    }
}

/// Parse one line as a hexadecimal `u32`, stripping an optional `0x`/`0X`
/// prefix. Leading/trailing whitespace is ignored; anything else that does
/// not parse as hex fails.
fn parse_hex_word(line: &str) -> Option<u32> {
    let trimmed = line.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    u32::from_str_radix(digits, 16).ok()
}

/// Read `path` and parse it as a sequence of hex-word lines, stopping at the
/// first line that isn't well-formed hex (blank lines are skipped, not
/// treated as a stop). Mirrors the original loader's `fscanf("%x")` loop,
/// which silently quits consuming input on the first non-hex token rather
/// than treating it as an error.
pub fn load_program_text(path: &Path) -> Result<LoadedProgram, LoaderError> {
    let contents = fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut words = Vec::new();
    let mut stopped_at = None;

    for (idx, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_hex_word(line) {
            Some(word) => words.push(word),
            None => {
                stopped_at = Some((idx + 1, line.to_string()));
                break;
            }
        }
    }

    Ok(LoadedProgram { words, stopped_at })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::TempPath {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        f.into_temp_path()
    }

    #[test]
    fn parses_plain_and_prefixed_hex() {
        assert_eq!(parse_hex_word("00500093"), Some(0x0050_0093));
        assert_eq!(parse_hex_word("0x00500093"), Some(0x0050_0093));
        assert_eq!(parse_hex_word("0X00500093\n"), Some(0x0050_0093));
        assert_eq!(parse_hex_word("not hex"), None);
    }

    #[test]
    fn loads_well_formed_file_fully() {
        let tmp = write_temp("00500093\n00A00113\n002081B3\n00000073\n");
        let program = load_program_text(&tmp).unwrap();
        assert_eq!(program.words, vec![0x0050_0093, 0x00A0_0113, 0x0020_81B3, 0x0000_0073]);
        assert_eq!(program.stopped_at, None);
    }

    #[test]
    fn stops_at_first_malformed_line_and_keeps_earlier_words() {
        let tmp = write_temp("00500093\n00A00113\nnot a word\n002081B3\n");
        let program = load_program_text(&tmp).unwrap();
        assert_eq!(program.words, vec![0x0050_0093, 0x00A0_0113]);
        assert_eq!(program.program_size(), 2);
        let (line, text) = program.stopped_at.unwrap();
        assert_eq!(line, 3);
        assert_eq!(text, "not a word");
    }

    #[test]
    fn blank_lines_are_skipped_not_treated_as_a_stop() {
        let tmp = write_temp("00500093\n\n   \n00A00113\n");
        let program = load_program_text(&tmp).unwrap();
        assert_eq!(program.words, vec![0x0050_0093, 0x00A0_0113]);
        assert_eq!(program.stopped_at, None);
    }

    #[test]
    fn missing_file_is_a_loader_error() {
        let missing = Path::new("/nonexistent/path/does/not/exist.hex");
        assert!(load_program_text(missing).is_err());
    }
}
