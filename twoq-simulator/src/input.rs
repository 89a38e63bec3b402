//! Input data handling for cache simulation
//!
//! Parses request logs from CSV files. Each line is `timestamp,key,size`; a
//! header row, blank lines and `#` comments are skipped, and any trailing
//! columns are ignored. Requests are streamed one at a time so memory use does
//! not grow with the size of the trace.

use crate::models::Request;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Error types for log parsing
#[derive(Debug)]
pub enum LogParseError {
    /// Reading a log file or directory failed
    Io(io::Error),
    /// A line did not have the expected shape
    Parse(String),
}

impl fmt::Display for LogParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogParseError::Io(err) => write!(f, "I/O error: {err}"),
            LogParseError::Parse(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for LogParseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LogParseError::Io(err) => Some(err),
            LogParseError::Parse(_) => None,
        }
    }
}

impl From<io::Error> for LogParseError {
    fn from(err: io::Error) -> Self {
        LogParseError::Io(err)
    }
}

/// Reader for cache request logs
pub struct LogReader {
    input_dir: PathBuf,
}

impl LogReader {
    /// Create a new reader for the given input directory
    pub fn new<P: AsRef<Path>>(input_dir: P) -> Self {
        Self {
            input_dir: input_dir.as_ref().to_path_buf(),
        }
    }

    /// Get all log files in the input directory, sorted by name
    pub fn get_log_files(&self) -> io::Result<Vec<PathBuf>> {
        let mut log_files = Vec::new();
        for entry in fs::read_dir(&self.input_dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }
            let is_log = path
                .extension()
                .is_some_and(|ext| ext == "log" || ext == "csv" || ext == "txt");
            if is_log {
                log_files.push(path);
            }
        }

        // Sort files by name for consistent ordering
        log_files.sort();
        Ok(log_files)
    }

    /// Parse a single line into a Request
    pub(crate) fn parse_line(line: &str, line_num: usize) -> Result<Option<Request>, LogParseError> {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || (line_num == 0 && line.contains("timestamp"))
        {
            return Ok(None);
        }

        let mut parts = line.splitn(4, ',');

        let ts_str = parts
            .next()
            .ok_or_else(|| LogParseError::Parse(format!("Line {} missing timestamp", line_num + 1)))?;
        let timestamp = ts_str.trim().parse::<u64>().map_err(|_| {
            LogParseError::Parse(format!(
                "Invalid timestamp in line {}: {}",
                line_num + 1,
                ts_str
            ))
        })?;

        let key = parts
            .next()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| LogParseError::Parse(format!("Line {} missing key", line_num + 1)))?
            .to_string();

        let size_str = parts
            .next()
            .ok_or_else(|| LogParseError::Parse(format!("Line {} missing size", line_num + 1)))?;
        let size = size_str.trim().parse::<u64>().map_err(|_| {
            LogParseError::Parse(format!("Invalid size in line {}: {}", line_num + 1, size_str))
        })?;

        Ok(Some(Request::new(timestamp, key, size)))
    }

    /// Create a streaming iterator over all requests in all log files.
    pub fn stream_requests(&self) -> Result<RequestIterator, LogParseError> {
        let log_files = self.get_log_files()?;
        Ok(RequestIterator::new(log_files))
    }
}

/// Iterator that streams requests from multiple log files without loading all into memory
pub struct RequestIterator {
    files: Vec<PathBuf>,
    current_file_index: usize,
    current_reader: Option<BufReader<File>>,
    current_line_num: usize,
    line_buffer: String,
}

impl RequestIterator {
    fn new(files: Vec<PathBuf>) -> Self {
        Self {
            files,
            current_file_index: 0,
            current_reader: None,
            current_line_num: 0,
            line_buffer: String::with_capacity(256),
        }
    }

    /// Open the next file for reading
    fn open_next_file(&mut self) -> io::Result<bool> {
        let Some(path) = self.files.get(self.current_file_index) else {
            return Ok(false);
        };

        let file = File::open(path)?;
        self.current_reader = Some(BufReader::with_capacity(1024 * 1024, file));
        self.current_line_num = 0;
        self.current_file_index += 1;
        Ok(true)
    }
}

impl Iterator for RequestIterator {
    type Item = Result<Request, LogParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.current_reader.is_none() {
                match self.open_next_file() {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(e) => return Some(Err(LogParseError::Io(e))),
                }
            }

            let reader = self.current_reader.as_mut()?;
            self.line_buffer.clear();
            match reader.read_line(&mut self.line_buffer) {
                Ok(0) => {
                    // EOF on current file, move to next
                    self.current_reader = None;
                }
                Ok(_) => {
                    let line_num = self.current_line_num;
                    self.current_line_num += 1;

                    match LogReader::parse_line(&self.line_buffer, line_num) {
                        Ok(Some(request)) => return Some(Ok(request)),
                        Ok(None) => {}
                        Err(e) => return Some(Err(e)),
                    }
                }
                Err(e) => return Some(Err(LogParseError::Io(e))),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_temp_dir(test_name: &str) -> PathBuf {
        let temp_dir = std::env::temp_dir().join(format!("twoq_input_test_{test_name}"));
        let _ = fs::remove_dir_all(&temp_dir);
        fs::create_dir_all(&temp_dir).expect("Failed to create temp directory");
        temp_dir
    }

    #[test]
    fn test_parse_line() {
        let request = LogReader::parse_line("1700000000, key_1 ,512", 3)
            .unwrap()
            .unwrap();
        assert_eq!(request, Request::new(1_700_000_000, "key_1".to_string(), 512));

        // trailing columns are ignored
        let request = LogReader::parse_line("1,k,2,3600", 1).unwrap().unwrap();
        assert_eq!(request.size, 2);
    }

    #[test]
    fn test_parse_line_skips_header_and_comments() {
        assert!(LogReader::parse_line("timestamp,key,size", 0).unwrap().is_none());
        assert!(LogReader::parse_line("# comment", 5).unwrap().is_none());
        assert!(LogReader::parse_line("   ", 5).unwrap().is_none());
    }

    #[test]
    fn test_parse_line_errors() {
        assert!(matches!(
            LogReader::parse_line("abc,key,1", 1),
            Err(LogParseError::Parse(_))
        ));
        assert!(matches!(
            LogReader::parse_line("1,key", 1),
            Err(LogParseError::Parse(_))
        ));
        assert!(matches!(
            LogReader::parse_line("1,,5", 1),
            Err(LogParseError::Parse(_))
        ));
        assert!(matches!(
            LogReader::parse_line("1,key,-5", 1),
            Err(LogParseError::Parse(_))
        ));
    }

    #[test]
    fn test_stream_requests_across_files_in_name_order() {
        let dir = create_temp_dir("stream");
        let mut second = File::create(dir.join("b.csv")).unwrap();
        writeln!(second, "timestamp,key,size").unwrap();
        writeln!(second, "3,c,30").unwrap();
        let mut first = File::create(dir.join("a.csv")).unwrap();
        writeln!(first, "timestamp,key,size").unwrap();
        writeln!(first, "1,a,10").unwrap();
        writeln!(first).unwrap();
        writeln!(first, "2,b,20").unwrap();
        File::create(dir.join("notes.md")).unwrap();

        let reader = LogReader::new(&dir);
        assert_eq!(reader.get_log_files().unwrap().len(), 2);

        let keys: Vec<String> = reader
            .stream_requests()
            .unwrap()
            .map(|r| r.unwrap().key)
            .collect();
        assert_eq!(keys, vec!["a", "b", "c"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let reader = LogReader::new("/nonexistent/twoq/traces");
        assert!(matches!(reader.stream_requests(), Err(LogParseError::Io(_))));
    }
}
