use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{EdfError, Result};
use crate::reader::{detect, parse_file_header_with, parse_signal_headers};
use crate::types::{EdfHeader, FileType, HeaderOptions, SignalFormat};
use crate::writer::{compute_data_record_count, resolve_data_records, serialize_header};
use crate::{EDF_FILE_HEADER_LEN, EDF_MAX_SIGNALS, EDF_SIGNAL_HEADER_LEN};

const NOT_EDF_MESSAGE: &str = "File is not in EDF format!";

/// An open EDF/EDF+ file whose header region can be read and rewritten
///
/// The file handle is owned exclusively and closed when the value is
/// dropped. Opening a file that is not EDF is not an error: the returned
/// `EdfFile` reports `is_ready() == false` and keeps a message in
/// `last_error()`, so callers can branch on it directly.
///
/// Header values are never cached; every `read_header` goes back to disk.
///
/// # Examples
///
/// ```rust
/// use edfheader::{EdfFile, EdfHeader, FileType, PatientIdentification, Gender, SignalHeader};
///
/// # let dir = tempfile::tempdir().unwrap();
/// # let path = dir.path().join("session.edf");
/// let signal = SignalHeader {
///     label: "EEG Fp1".to_string(),
///     physical_min: -200.0,
///     physical_max: 200.0,
///     digital_min: -32768,
///     digital_max: 32767,
///     samples_per_record: 256,
///     ..Default::default()
/// };
/// let mut header = EdfHeader::new(FileType::EdfPlus, vec![signal]);
/// header.file.patient = PatientIdentification::new("P001", Gender::Female, None, "Jane Doe");
///
/// let mut edf = EdfFile::create(&path)?;
/// edf.write_header(&header)?;
/// edf.close()?;
///
/// let mut edf = EdfFile::open(&path)?;
/// assert!(edf.is_ready());
/// let read = edf.read_header()?;
/// assert_eq!(read.file.patient.code, "P001");
/// assert_eq!(read.file.patient.name, "Jane_Doe");
/// assert_eq!(read.signals[0].label, "EEG Fp1");
/// # Ok::<(), edfheader::EdfError>(())
/// ```
#[derive(Debug)]
pub struct EdfFile {
    file: File,
    path: PathBuf,
    writable: bool,
    ready: bool,
    file_type: FileType,
    signal_format: SignalFormat,
    last_error: Option<String>,
}

impl EdfFile {
    /// Opens an existing file for reading and writing and detects its format
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path.as_ref(), true)
    }

    /// Opens an existing file for inspection only; `write_header` will fail
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with(path.as_ref(), false)
    }

    fn open_with(path: &Path, writable: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(writable)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::NotFound => {
                    EdfError::FileNotFound(format!("{}: {}", path.display(), e))
                }
                _ => EdfError::Io(e),
            })?;

        let mut edf = EdfFile {
            file,
            path: path.to_path_buf(),
            writable,
            ready: false,
            file_type: FileType::Edf,
            signal_format: SignalFormat::Unknown,
            last_error: None,
        };
        edf.detect()?;
        Ok(edf)
    }

    /// Creates (or truncates) a file that a header will be written into
    ///
    /// The new file is ready immediately and assumed to be EDF+ until a
    /// header is written.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| EdfError::FileNotFound(format!("{}: {}", path.display(), e)))?;

        Ok(EdfFile {
            file,
            path: path.to_path_buf(),
            writable: true,
            ready: true,
            file_type: FileType::EdfPlus,
            signal_format: SignalFormat::Continuous,
            last_error: None,
        })
    }

    fn detect(&mut self) -> Result<()> {
        let mut head = Vec::with_capacity(EDF_FILE_HEADER_LEN);
        self.file.seek(SeekFrom::Start(0))?;
        (&mut self.file)
            .take(EDF_FILE_HEADER_LEN as u64)
            .read_to_end(&mut head)?;

        let detection = detect(&head);
        match detection.file_type() {
            Some(file_type) => {
                self.ready = true;
                self.file_type = file_type;
                self.signal_format = detection.signal_format();
                debug!(path = %self.path.display(), ?detection, "opened EDF file");
            }
            None => {
                self.ready = false;
                self.last_error = Some(NOT_EDF_MESSAGE.to_string());
                warn!(path = %self.path.display(), "{}", NOT_EDF_MESSAGE);
            }
        }
        Ok(())
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Detected layout, `None` when the file is not EDF
    pub fn file_type(&self) -> Option<FileType> {
        self.ready.then_some(self.file_type)
    }

    pub fn is_edf_plus(&self) -> bool {
        self.file_type() == Some(FileType::EdfPlus)
    }

    pub fn signal_format(&self) -> SignalFormat {
        self.signal_format
    }

    /// Message describing the failure of the most recent operation, if any
    ///
    /// A successful `read_header`, `write_header` or `save_as` clears it.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the file in bytes
    pub fn file_len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready {
            Ok(())
        } else {
            Err(EdfError::NotEdfFormat(
                self.last_error
                    .clone()
                    .unwrap_or_else(|| NOT_EDF_MESSAGE.to_string()),
            ))
        }
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        self.last_error = result.as_ref().err().map(ToString::to_string);
        result
    }

    /// Reads and parses the main header and all signal headers
    pub fn read_header(&mut self) -> Result<EdfHeader> {
        self.read_header_with(&HeaderOptions::default())
    }

    pub fn read_header_with(&mut self, options: &HeaderOptions) -> Result<EdfHeader> {
        let result = self.read_header_inner(options);
        self.record(result)
    }

    fn read_header_inner(&mut self, options: &HeaderOptions) -> Result<EdfHeader> {
        self.ensure_ready()?;

        self.file.seek(SeekFrom::Start(0))?;
        let mut main_header = vec![0u8; EDF_FILE_HEADER_LEN];
        self.file.read_exact(&mut main_header)?;

        let file = parse_file_header_with(&main_header, self.file_type, options)?;
        if file.signal_count > EDF_MAX_SIGNALS {
            return Err(EdfError::InvalidSignalCount(file.signal_count));
        }

        let mut signal_header = vec![0u8; file.signal_count * EDF_SIGNAL_HEADER_LEN];
        self.file.read_exact(&mut signal_header)?;
        let signals = parse_signal_headers(&signal_header, file.signal_count)?;

        Ok(EdfHeader { file, signals })
    }

    /// Derived data record count for `header` given the current file size
    pub fn compute_data_record_count(&self, header: &EdfHeader) -> Result<Option<i64>> {
        Ok(compute_data_record_count(
            self.file_len()?,
            header.file.header_bytes,
            &header.signals,
        ))
    }

    /// Rewrites the header region at the start of the file
    ///
    /// A data record count of `-1` is derived from the current file size
    /// first. Returns the header exactly as it was written.
    ///
    /// # Errors
    ///
    /// * `EdfError::NotEdfFormat` - the file did not pass detection
    /// * `EdfError::InvalidSignalCount` - `signals` does not match `signal_count`
    /// * `EdfError::Io` - the write failed
    pub fn write_header(&mut self, header: &EdfHeader) -> Result<EdfHeader> {
        let result = self.write_header_inner(header);
        self.record(result)
    }

    fn write_header_inner(&mut self, header: &EdfHeader) -> Result<EdfHeader> {
        self.ensure_ready()?;

        if header.signals.len() != header.file.signal_count {
            return Err(EdfError::InvalidSignalCount(header.signals.len()));
        }
        if !header.file.is_consistent() {
            warn!(
                header_bytes = header.file.header_bytes,
                signal_count = header.file.signal_count,
                "writing header whose byte count does not match the number of signals"
            );
        }

        let file_len = self.file_len()?;
        let written = EdfHeader {
            file: resolve_data_records(&header.file, &header.signals, file_len),
            signals: header.signals.clone(),
        };
        let bytes = serialize_header(&written, file_len);

        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&bytes)?;
        self.file.flush()?;

        self.file_type = written.file.file_type;
        self.signal_format = written.file.signal_format;
        debug!(
            path = %self.path.display(),
            bytes = bytes.len(),
            data_records = written.file.data_records,
            "header written"
        );

        Ok(written)
    }

    /// Copies this file to `path` and writes `header` into the copy
    ///
    /// Saving onto the file's own path rewrites it in place. An existing
    /// different file at `path` is never overwritten.
    pub fn save_as<P: AsRef<Path>>(&mut self, path: P, header: &EdfHeader) -> Result<EdfHeader> {
        let result = self.save_as_inner(path.as_ref(), header);
        self.record(result)
    }

    fn save_as_inner(&mut self, target: &Path, header: &EdfHeader) -> Result<EdfHeader> {
        self.ensure_ready()?;
        self.file.flush()?;

        if target.exists() {
            if fs::canonicalize(target)? == fs::canonicalize(&self.path)? {
                return self.write_header(header);
            }
            return Err(EdfError::Io(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", target.display()),
            )));
        }

        fs::copy(&self.path, target)?;
        let mut copy = EdfFile::open(target)?;
        let written = copy.write_header(header)?;
        copy.close()?;
        Ok(written)
    }

    /// Flushes pending writes and closes the file, reporting any error
    pub fn close(mut self) -> Result<()> {
        self.file.flush()?;
        if self.writable {
            self.file.sync_all()?;
        }
        Ok(())
    }
}
