use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};

use crate::{
    EDF_FILE_HEADER_LEN, EDF_PATIENT_FREE_SPACE, EDF_RECORDING_FREE_SPACE,
    EDF_RESERVED_FREE_SPACE, EDF_SIGNAL_HEADER_LEN,
};

/// Header layout flavour
///
/// `EdfPlus` files carry structured sub-fields inside the patient and
/// recording identification fields; plain `Edf` files keep them as opaque text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Edf,
    EdfPlus,
}

/// Continuity tag stored at the start of the reserved field of EDF+ files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignalFormat {
    Continuous,
    Discontinuous,
    #[default]
    Unknown,
}

impl SignalFormat {
    /// The five-byte tag written into the reserved field, if any
    pub fn tag(self) -> Option<&'static str> {
        match self {
            SignalFormat::Continuous => Some("EDF+C"),
            SignalFormat::Discontinuous => Some("EDF+D"),
            SignalFormat::Unknown => None,
        }
    }

    /// Classifies the raw reserved field by its prefix
    pub fn from_reserved(reserved: &str) -> Self {
        if reserved.starts_with("EDF+C") {
            SignalFormat::Continuous
        } else if reserved.starts_with("EDF+D") {
            SignalFormat::Discontinuous
        } else {
            SignalFormat::Unknown
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_char(self) -> char {
        match self {
            Gender::Male => 'M',
            Gender::Female => 'F',
            Gender::Unknown => 'X',
        }
    }

    /// Anything other than a leading `M` or `F` is treated as unknown
    pub fn from_token(token: &str) -> Self {
        match token.chars().next() {
            Some('M') => Gender::Male,
            Some('F') => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

/// Local patient identification field
///
/// `raw` always holds the trimmed field text. The structured members are
/// only filled in for EDF+ files whose field splits into exactly four
/// sub-fields; otherwise they keep their defaults.
///
/// In EDF+ mode the writer rebuilds the field from the structured members
/// and ignores `raw`, so after a write/read cycle `raw` holds the rebuilt
/// text (`X X X X` for an empty identification) rather than what was set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatientIdentification {
    pub raw: String,
    pub code: String,
    pub gender: Gender,
    pub birth_date: Option<NaiveDate>,
    pub name: String,
}

impl PatientIdentification {
    pub fn new(code: &str, gender: Gender, birth_date: Option<NaiveDate>, name: &str) -> Self {
        PatientIdentification {
            raw: String::new(),
            code: code.to_string(),
            gender,
            birth_date,
            name: name.to_string(),
        }
    }

    /// Opaque identification for legacy EDF files
    pub fn from_raw(raw: &str) -> Self {
        PatientIdentification {
            raw: raw.to_string(),
            ..Default::default()
        }
    }

    /// Characters still available to the code and name sub-fields combined
    pub fn remaining_capacity(&self) -> usize {
        EDF_PATIENT_FREE_SPACE.saturating_sub(self.code.len() + self.name.len())
    }
}

/// Local recording identification field
///
/// In EDF+ mode the field reads
/// `Startdate dd-MMM-yyyy admincode technician equipment [comments...]`.
///
/// As with [`PatientIdentification`], `raw` is only written for legacy EDF;
/// EDF+ writes rebuild the field from the structured members.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordingIdentification {
    pub raw: String,
    pub start_date: Option<NaiveDate>,
    pub admin_code: String,
    pub technician: String,
    pub equipment: String,
    pub comments: String,
}

impl RecordingIdentification {
    pub fn new(
        start_date: Option<NaiveDate>,
        admin_code: &str,
        technician: &str,
        equipment: &str,
        comments: &str,
    ) -> Self {
        RecordingIdentification {
            raw: String::new(),
            start_date,
            admin_code: admin_code.to_string(),
            technician: technician.to_string(),
            equipment: equipment.to_string(),
            comments: comments.to_string(),
        }
    }

    pub fn from_raw(raw: &str) -> Self {
        RecordingIdentification {
            raw: raw.to_string(),
            ..Default::default()
        }
    }

    /// Characters still available to the four free-text sub-fields combined
    pub fn remaining_capacity(&self) -> usize {
        let used = self.admin_code.len()
            + self.technician.len()
            + self.equipment.len()
            + self.comments.len();
        EDF_RECORDING_FREE_SPACE.saturating_sub(used)
    }
}

/// One per-signal header record
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignalHeader {
    pub label: String,
    pub transducer: String,
    pub physical_dimension: String,
    pub physical_min: f64,
    pub physical_max: f64,
    pub digital_min: i32,
    pub digital_max: i32,
    pub prefilter: String,
    pub samples_per_record: i32,
    pub reserved: String,
}

impl SignalHeader {
    /// Size of this signal's share of one data record (2 bytes per sample)
    pub fn bytes_per_record(&self) -> i64 {
        self.samples_per_record as i64 * crate::EDF_BYTES_PER_SAMPLE
    }
}

/// The 256-byte main header record
#[derive(Debug, Clone, PartialEq)]
pub struct FileHeader {
    pub file_type: FileType,
    pub version: i32,
    pub patient: PatientIdentification,
    pub recording: RecordingIdentification,
    /// Recording start, `None` when the stored date/time is invalid
    pub start: Option<NaiveDateTime>,
    pub header_bytes: usize,
    pub signal_format: SignalFormat,
    pub reserved: String,
    /// `-1` asks the writer to derive the count from the file length
    pub data_records: i64,
    /// Duration of one data record in seconds
    pub record_duration: f64,
    pub signal_count: usize,
}

impl FileHeader {
    /// Creates a header for `signal_count` signals with a consistent byte count
    ///
    /// EDF+ headers default to the continuous format. The data record count is
    /// left at `-1` so the writer derives it.
    pub fn new(file_type: FileType, signal_count: usize) -> Self {
        let signal_format = match file_type {
            FileType::EdfPlus => SignalFormat::Continuous,
            FileType::Edf => SignalFormat::Unknown,
        };

        FileHeader {
            file_type,
            version: 0,
            patient: PatientIdentification::default(),
            recording: RecordingIdentification::default(),
            start: None,
            header_bytes: header_bytes_for(signal_count),
            signal_format,
            reserved: String::new(),
            data_records: -1,
            record_duration: 1.0,
            signal_count,
        }
    }

    pub fn is_edf_plus(&self) -> bool {
        self.file_type == FileType::EdfPlus
    }

    /// Whether `header_bytes` matches `256 * (1 + signal_count)`
    pub fn is_consistent(&self) -> bool {
        self.header_bytes == header_bytes_for(self.signal_count)
    }

    pub fn with_patient(self, patient: PatientIdentification) -> Self {
        FileHeader { patient, ..self }
    }

    pub fn with_recording(self, recording: RecordingIdentification) -> Self {
        FileHeader { recording, ..self }
    }

    pub fn with_start(self, start: Option<NaiveDateTime>) -> Self {
        FileHeader { start, ..self }
    }

    pub fn with_signal_format(self, signal_format: SignalFormat) -> Self {
        FileHeader { signal_format, ..self }
    }

    pub fn with_reserved(self, reserved: &str) -> Self {
        FileHeader {
            reserved: reserved.to_string(),
            ..self
        }
    }

    pub fn with_data_records(self, data_records: i64) -> Self {
        FileHeader { data_records, ..self }
    }

    pub fn with_record_duration(self, record_duration: f64) -> Self {
        FileHeader {
            record_duration,
            ..self
        }
    }

    /// Characters still available to the free reserved text
    pub fn remaining_capacity(&self) -> usize {
        EDF_RESERVED_FREE_SPACE.saturating_sub(self.reserved.len())
    }
}

/// Size of the whole header region for `signal_count` signals
pub fn header_bytes_for(signal_count: usize) -> usize {
    EDF_FILE_HEADER_LEN + signal_count * EDF_SIGNAL_HEADER_LEN
}

/// Main header plus its signal headers, i.e. the full header region
#[derive(Debug, Clone, PartialEq)]
pub struct EdfHeader {
    pub file: FileHeader,
    pub signals: Vec<SignalHeader>,
}

impl EdfHeader {
    /// Builds a header whose signal count and byte count follow `signals`
    pub fn new(file_type: FileType, signals: Vec<SignalHeader>) -> Self {
        EdfHeader {
            file: FileHeader::new(file_type, signals.len()),
            signals,
        }
    }

    pub fn with_file(self, file: FileHeader) -> Self {
        EdfHeader { file, ..self }
    }
}

/// How the trailing comment tokens of an EDF+ recording field are rejoined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentJoin {
    /// Single space between tokens
    #[default]
    Space,
    /// Tokens glued together with no separator, as older editors stored them
    Concatenate,
}

impl CommentJoin {
    pub fn separator(self) -> &'static str {
        match self {
            CommentJoin::Space => " ",
            CommentJoin::Concatenate => "",
        }
    }
}

/// Parser policy knobs
#[derive(Debug, Clone, Default)]
pub struct HeaderOptions {
    /// Latest accepted start year; `None` means the current year plus one
    pub max_start_year: Option<i32>,
    pub comment_joiner: CommentJoin,
}

impl HeaderOptions {
    pub fn max_year(&self) -> i32 {
        self.max_start_year
            .unwrap_or_else(|| Utc::now().year() + 1)
    }
}
