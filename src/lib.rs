//! # EDF/EDF+ header codec
//!
//! Reads, validates and rewrites the header region of EDF and EDF+
//! (European Data Format) files: the 256-byte main header record followed
//! by one 256-byte block per signal. Sample data records are never touched.
//!
//! ## Quick Start
//!
//! ### Inspecting a file
//!
//! ```rust
//! use edfheader::{EdfFile, Result};
//!
//! fn main() -> Result<()> {
//!     # let dir = tempfile::tempdir().unwrap();
//!     # let path = dir.path().join("recording.edf");
//!     # edfheader::doctest_utils::create_simple_test_file(&path)?;
//!     let mut edf = EdfFile::open(&path)?;
//!
//!     // Detection problems are a status, not an error
//!     if !edf.is_ready() {
//!         eprintln!("{}", edf.last_error().unwrap_or("not an EDF file"));
//!         return Ok(());
//!     }
//!
//!     let header = edf.read_header()?;
//!     println!("EDF+: {}", edf.is_edf_plus());
//!     println!("Patient: {}", header.file.patient.name);
//!     println!("Data records: {}", header.file.data_records);
//!     for signal in &header.signals {
//!         println!("{} ({} samples/record)", signal.label, signal.samples_per_record);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Editing patient information in place
//!
//! Headers are plain values. Build a new one from the old and write it back;
//! a data record count of `-1` is recomputed from the file size.
//!
//! ```rust
//! use edfheader::{EdfFile, Gender, PatientIdentification, Result};
//!
//! fn main() -> Result<()> {
//!     # let dir = tempfile::tempdir().unwrap();
//!     # let path = dir.path().join("edit.edf");
//!     # edfheader::doctest_utils::create_simple_test_file(&path)?;
//!     let mut edf = EdfFile::open(&path)?;
//!     let header = edf.read_header()?;
//!
//!     let file = header.file.clone()
//!         .with_patient(PatientIdentification::new("P042", Gender::Male, None, "Anonymous"))
//!         .with_data_records(-1);
//!     let written = edf.write_header(&header.with_file(file))?;
//!
//!     assert_eq!(written.file.patient.code, "P042");
//!     assert!(written.file.data_records >= 0);
//!     Ok(())
//! }
//! ```
//!
//! ### Working on bytes
//!
//! ```rust
//! use edfheader::{read_header_bytes, serialize_header, EdfHeader, FileType, SignalHeader};
//!
//! let signal = SignalHeader { label: "ECG".to_string(), samples_per_record: 128, ..Default::default() };
//! let header = EdfHeader::new(FileType::EdfPlus, vec![signal]);
//!
//! let bytes = serialize_header(&header, 512 + 256 * 10);
//! assert_eq!(bytes.len(), 512);
//!
//! let parsed = read_header_bytes(&bytes).unwrap();
//! assert_eq!(parsed.file.data_records, 10);
//! assert_eq!(parsed.signals[0].label, "ECG");
//! ```

pub mod error;
pub mod types;
pub mod utils;
pub mod reader;
pub mod writer;
pub mod file;

#[doc(hidden)]
pub mod doctest_utils; // For internal doctest support

// Re-export main types for convenience
pub use error::{EdfError, Result};
pub use types::{
    CommentJoin, EdfHeader, FileHeader, FileType, Gender, HeaderOptions, PatientIdentification,
    RecordingIdentification, SignalFormat, SignalHeader,
};
pub use reader::{detect, read_header_bytes, read_header_bytes_with, Detection};
pub use writer::{compute_data_record_count, serialize_header};
pub use file::EdfFile;

// Important constants
pub const EDF_FILE_HEADER_LEN: usize = 256;
pub const EDF_SIGNAL_HEADER_LEN: usize = 256;
pub const EDF_BYTES_PER_SAMPLE: i64 = 2;
// 信号数字段宽 4 字节
pub const EDF_MAX_SIGNALS: usize = 9999;

// 编辑器中各自由文本区域的可用字符数
pub const EDF_PATIENT_FREE_SPACE: usize = 63;
pub const EDF_RECORDING_FREE_SPACE: usize = 52;
pub const EDF_RESERVED_FREE_SPACE: usize = 38;

/// Library version
///
/// # Examples
///
/// ```rust
/// let version = edfheader::version();
/// assert!(version.contains('.'));
/// ```
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
