use tracing::{debug, warn};

use crate::error::{EdfError, Result};
use crate::types::{
    header_bytes_for, EdfHeader, FileHeader, FileType, HeaderOptions, PatientIdentification,
    RecordingIdentification, SignalFormat, SignalHeader,
};
use crate::utils::{
    ascii_text, decode_subfield, parse_edf_date, parse_number, parse_start_datetime, read_field,
    split_subfields, DATA_RECORDS, HEADER_BYTES, PATIENT, RECORDING, RECORDING_DEFAULT,
    RECORD_DURATION, RESERVED, SIGNAL_COLUMNS, SIGNAL_COUNT, START_DATE, START_TIME, VERSION,
    VERSION_DEFAULT,
};
use crate::{EDF_FILE_HEADER_LEN, EDF_MAX_SIGNALS, EDF_SIGNAL_HEADER_LEN};

/// Outcome of format detection on the first 256 bytes of a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    NotEdf,
    Edf,
    EdfPlus(SignalFormat),
}

impl Detection {
    pub fn is_valid(self) -> bool {
        self != Detection::NotEdf
    }

    pub fn file_type(self) -> Option<FileType> {
        match self {
            Detection::NotEdf => None,
            Detection::Edf => Some(FileType::Edf),
            Detection::EdfPlus(_) => Some(FileType::EdfPlus),
        }
    }

    pub fn signal_format(self) -> SignalFormat {
        match self {
            Detection::EdfPlus(format) => format,
            _ => SignalFormat::Unknown,
        }
    }
}

/// Classifies a byte buffer as EDF, EDF+ or neither
///
/// A buffer is EDF when it holds at least 256 bytes, its version field is
/// exactly `"0       "` and the header byte count parses to a positive
/// integer. It is additionally EDF+ when the recording field starts with
/// `Startdate`; the continuity tag in the reserved field only decides the
/// signal format, an untagged file still gets the EDF+ field layout.
///
/// # Examples
///
/// ```rust
/// use edfheader::reader::{detect, Detection};
///
/// let mut header = vec![b' '; 256];
/// header[0] = b'0';
/// header[184..187].copy_from_slice(b"256");
/// assert_eq!(detect(&header), Detection::Edf);
///
/// assert_eq!(detect(&header[..255]), Detection::NotEdf);
/// ```
pub fn detect(bytes: &[u8]) -> Detection {
    if bytes.len() < EDF_FILE_HEADER_LEN {
        return Detection::NotEdf;
    }

    if &bytes[VERSION.range()] != VERSION_DEFAULT.as_bytes() {
        return Detection::NotEdf;
    }

    match parse_number::<i64>(&read_field(bytes, HEADER_BYTES), HEADER_BYTES.name) {
        Ok(n) if n > 0 => {}
        _ => return Detection::NotEdf,
    }

    if !read_field(bytes, RECORDING).starts_with(RECORDING_DEFAULT) {
        return Detection::Edf;
    }

    Detection::EdfPlus(SignalFormat::from_reserved(&read_field(bytes, RESERVED)))
}

/// Detects and parses a complete header region held in memory
///
/// `bytes` must start at file offset 0 and contain at least the main header
/// and every signal header it announces; anything after that is ignored.
pub fn read_header_bytes(bytes: &[u8]) -> Result<EdfHeader> {
    read_header_bytes_with(bytes, &HeaderOptions::default())
}

pub fn read_header_bytes_with(bytes: &[u8], options: &HeaderOptions) -> Result<EdfHeader> {
    let detection = detect(bytes);
    let file_type = detection
        .file_type()
        .ok_or_else(|| EdfError::NotEdfFormat("version or header size field invalid".to_string()))?;
    debug!(?detection, "detected header format");

    let file = parse_file_header_with(&bytes[..EDF_FILE_HEADER_LEN], file_type, options)?;
    if file.signal_count > EDF_MAX_SIGNALS {
        return Err(EdfError::InvalidSignalCount(file.signal_count));
    }

    let end = header_bytes_for(file.signal_count);
    if bytes.len() < end {
        return Err(EdfError::InvalidHeader(format!(
            "header region truncated: expected {} bytes, got {}",
            end,
            bytes.len()
        )));
    }

    let signals = parse_signal_headers(&bytes[EDF_FILE_HEADER_LEN..end], file.signal_count)?;
    Ok(EdfHeader { file, signals })
}

/// Parses the 256-byte main header record
///
/// Required numeric fields that fail to parse abort with
/// `EdfError::FormatError` naming the field. An unparsable start date/time
/// is not an error; it yields `start == None`.
pub fn parse_file_header(bytes: &[u8], file_type: FileType) -> Result<FileHeader> {
    parse_file_header_with(bytes, file_type, &HeaderOptions::default())
}

pub fn parse_file_header_with(
    bytes: &[u8],
    file_type: FileType,
    options: &HeaderOptions,
) -> Result<FileHeader> {
    if bytes.len() < EDF_FILE_HEADER_LEN {
        return Err(EdfError::InvalidHeader(format!(
            "main header needs {} bytes, got {}",
            EDF_FILE_HEADER_LEN,
            bytes.len()
        )));
    }

    let version = parse_number::<i32>(&read_field(bytes, VERSION), VERSION.name)?;

    let patient = parse_patient(&read_field(bytes, PATIENT), file_type);
    let recording = parse_recording(&read_field(bytes, RECORDING), file_type, options);

    let start = parse_start_datetime(
        &read_field(bytes, START_DATE),
        &read_field(bytes, START_TIME),
        options.max_year(),
    );
    if start.is_none() {
        debug!("start date/time invalid or out of range");
    }

    let header_bytes = parse_number::<usize>(&read_field(bytes, HEADER_BYTES), HEADER_BYTES.name)?;

    // EDF+ 模式下保留字段前5字节是格式标识
    let reserved_field = read_field(bytes, RESERVED);
    let (signal_format, reserved) = match file_type {
        FileType::EdfPlus => {
            let format = SignalFormat::from_reserved(&reserved_field);
            let rest = match format.tag() {
                Some(tag) => &reserved_field[tag.len()..],
                None => &reserved_field[..],
            };
            (format, rest.trim().to_string())
        }
        FileType::Edf => (SignalFormat::Unknown, reserved_field.trim().to_string()),
    };

    let data_records = parse_number::<i64>(&read_field(bytes, DATA_RECORDS), DATA_RECORDS.name)?;

    let record_duration =
        parse_number::<f64>(&read_field(bytes, RECORD_DURATION), RECORD_DURATION.name)?;
    if !record_duration.is_finite() || record_duration < 0.0 {
        return Err(EdfError::field(RECORD_DURATION.name));
    }

    let signal_count = parse_number::<usize>(&read_field(bytes, SIGNAL_COUNT), SIGNAL_COUNT.name)?;

    let header = FileHeader {
        file_type,
        version,
        patient,
        recording,
        start,
        header_bytes,
        signal_format,
        reserved,
        data_records,
        record_duration,
        signal_count,
    };

    if !header.is_consistent() {
        warn!(
            header_bytes,
            signal_count, "header byte count does not match the number of signals"
        );
    }

    Ok(header)
}

/// Splits the patient field into its four EDF+ sub-fields when possible
fn parse_patient(field: &str, file_type: FileType) -> PatientIdentification {
    let mut patient = PatientIdentification::from_raw(field.trim());
    if file_type != FileType::EdfPlus {
        return patient;
    }

    let tokens = split_subfields(field.trim_end());
    if tokens.len() != 4 {
        warn!(
            tokens = tokens.len(),
            "EDF+ patient field does not hold 4 sub-fields, keeping raw text only"
        );
        return patient;
    }

    patient.code = decode_subfield(tokens[0]);
    patient.gender = crate::types::Gender::from_token(tokens[1]);
    patient.birth_date = parse_edf_date(tokens[2]);
    patient.name = decode_subfield(tokens[3]);
    patient
}

/// Splits the recording field into `Startdate`, date, admin code,
/// technician, equipment and trailing comments
fn parse_recording(
    field: &str,
    file_type: FileType,
    options: &HeaderOptions,
) -> RecordingIdentification {
    let raw = field.trim_end();
    let mut recording = RecordingIdentification::from_raw(raw);
    if file_type != FileType::EdfPlus {
        return recording;
    }

    let tokens = split_subfields(raw);
    if tokens.len() < 5 {
        warn!(
            tokens = tokens.len(),
            "EDF+ recording field holds fewer than 5 sub-fields, keeping raw text only"
        );
        return recording;
    }

    recording.start_date = parse_edf_date(tokens[1]);
    recording.admin_code = decode_subfield(tokens[2]);
    recording.technician = decode_subfield(tokens[3]);
    recording.equipment = decode_subfield(tokens[4]);
    recording.comments = tokens[5..].join(options.comment_joiner.separator());
    recording
}

/// Parses `n` signal headers stored column by column
///
/// All labels come first, then all transducers, and so on through the ten
/// columns; each column holds `n` fixed-width cells.
pub fn parse_signal_headers(bytes: &[u8], n: usize) -> Result<Vec<SignalHeader>> {
    let needed = n * EDF_SIGNAL_HEADER_LEN;
    if bytes.len() < needed {
        return Err(EdfError::InvalidHeader(format!(
            "signal headers need {} bytes, got {}",
            needed,
            bytes.len()
        )));
    }

    // 每一列的起始偏移 = n × 前面各列宽度之和
    let mut column_starts = [0usize; 10];
    let mut offset = 0;
    for (start, (_, width)) in column_starts.iter_mut().zip(SIGNAL_COLUMNS.iter()) {
        *start = offset;
        offset += n * width;
    }

    let cell = |column: usize, signal: usize| -> String {
        let width = SIGNAL_COLUMNS[column].1;
        let start = column_starts[column] + signal * width;
        ascii_text(&bytes[start..start + width])
    };
    let text = |column: usize, signal: usize| cell(column, signal).trim().to_string();
    let name = |column: usize| SIGNAL_COLUMNS[column].0;

    let mut signals = Vec::with_capacity(n);
    for i in 0..n {
        signals.push(SignalHeader {
            label: text(0, i),
            transducer: text(1, i),
            physical_dimension: text(2, i),
            physical_min: parse_number(&cell(3, i), name(3))?,
            physical_max: parse_number(&cell(4, i), name(4))?,
            digital_min: parse_number(&cell(5, i), name(5))?,
            digital_max: parse_number(&cell(6, i), name(6))?,
            prefilter: text(7, i),
            samples_per_record: parse_number(&cell(8, i), name(8))?,
            reserved: text(9, i),
        });
    }

    Ok(signals)
}
