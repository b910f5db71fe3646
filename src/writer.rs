use crate::types::{
    EdfHeader, FileHeader, FileType, PatientIdentification, RecordingIdentification, SignalHeader,
};
use crate::utils::{
    encode_subfield, fit_field, format_duration, format_edf_date, format_number,
    format_start_datetime, write_field, DATA_RECORDS, HEADER_BYTES, PATIENT, RECORDING,
    RECORDING_DEFAULT, RECORD_DURATION, RESERVED, SIGNAL_COLUMNS, SIGNAL_COUNT, START_DATE,
    START_TIME, SUBFIELD_SEPARATOR, UNKNOWN_SUBFIELD, VERSION,
};
use crate::{EDF_FILE_HEADER_LEN, EDF_SIGNAL_HEADER_LEN};

/// Number of data records a file of `file_len` bytes holds
///
/// Each data record takes `2 * samples_per_record` bytes per signal.
/// Returns `None` when there are no signals or the record size is zero,
/// since the count is meaningless then. A file shorter than its header
/// holds zero records.
///
/// # Examples
///
/// ```rust
/// use edfheader::{writer::compute_data_record_count, SignalHeader};
///
/// let signal = SignalHeader { samples_per_record: 512, ..Default::default() };
/// assert_eq!(compute_data_record_count(2304, 256, &[signal]), Some(2));
/// assert_eq!(compute_data_record_count(2304, 256, &[]), None);
/// ```
pub fn compute_data_record_count(
    file_len: u64,
    header_bytes: usize,
    signals: &[SignalHeader],
) -> Option<i64> {
    if signals.is_empty() {
        return None;
    }

    let bytes_per_record: i64 = signals.iter().map(SignalHeader::bytes_per_record).sum();
    if bytes_per_record <= 0 {
        return None;
    }

    let data_bytes = (file_len as i64 - header_bytes as i64).max(0);
    Some(data_bytes / bytes_per_record)
}

/// Returns `file` with a `-1` data record count replaced by the derived one
///
/// The count stays `-1` when it cannot be derived.
pub fn resolve_data_records(file: &FileHeader, signals: &[SignalHeader], file_len: u64) -> FileHeader {
    if file.data_records != -1 {
        return file.clone();
    }

    let derived = compute_data_record_count(file_len, file.header_bytes, signals).unwrap_or(-1);
    file.clone().with_data_records(derived)
}

/// Serializes the main header record into exactly 256 bytes
///
/// Every field is padded with spaces or truncated to its width; over-long
/// values are never an error. EDF+ headers get their patient and recording
/// fields rebuilt from the structured sub-fields and the continuity tag
/// put in front of the reserved text.
pub fn serialize_file_header(
    file: &FileHeader,
    signals: &[SignalHeader],
    file_len: u64,
) -> [u8; EDF_FILE_HEADER_LEN] {
    let file = resolve_data_records(file, signals, file_len);
    let mut header = [b' '; EDF_FILE_HEADER_LEN];

    write_field(&mut header, VERSION, &file.version.to_string());

    let (patient, recording, reserved) = match file.file_type {
        FileType::EdfPlus => (
            patient_field(&file.patient),
            recording_field(&file.recording),
            match file.signal_format.tag() {
                Some(tag) => format!("{} {}", tag, file.reserved),
                None => file.reserved.clone(),
            },
        ),
        FileType::Edf => (
            file.patient.raw.clone(),
            file.recording.raw.clone(),
            file.reserved.clone(),
        ),
    };
    write_field(&mut header, PATIENT, &patient);
    write_field(&mut header, RECORDING, &recording);

    // 起始日期和时间两个字段连续写入
    let start_range = START_DATE.offset..START_TIME.offset + START_TIME.width;
    header[start_range].copy_from_slice(&fit_field(
        &format_start_datetime(file.start),
        START_DATE.width + START_TIME.width,
    ));

    write_field(&mut header, HEADER_BYTES, &file.header_bytes.to_string());
    write_field(&mut header, RESERVED, &reserved);
    write_field(&mut header, DATA_RECORDS, &file.data_records.to_string());
    write_field(&mut header, RECORD_DURATION, &format_duration(file.record_duration));
    write_field(&mut header, SIGNAL_COUNT, &file.signal_count.to_string());

    header
}

/// `code gender birthdate name`, unknown sub-fields written as `X`
fn patient_field(patient: &PatientIdentification) -> String {
    let birth_date = patient
        .birth_date
        .map(format_edf_date)
        .unwrap_or_else(|| UNKNOWN_SUBFIELD.to_string());

    [
        encode_subfield(&patient.code),
        patient.gender.as_char().to_string(),
        birth_date,
        encode_subfield(&patient.name),
    ]
    .join(&SUBFIELD_SEPARATOR.to_string())
}

/// `Startdate date admincode technician equipment [comments]`
fn recording_field(recording: &RecordingIdentification) -> String {
    let start_date = recording
        .start_date
        .map(format_edf_date)
        .unwrap_or_else(|| UNKNOWN_SUBFIELD.to_string());

    let mut parts = vec![
        RECORDING_DEFAULT.to_string(),
        start_date,
        encode_subfield(&recording.admin_code),
        encode_subfield(&recording.technician),
        encode_subfield(&recording.equipment),
    ];
    if !recording.comments.is_empty() {
        parts.push(encode_subfield(&recording.comments));
    }

    parts.join(&SUBFIELD_SEPARATOR.to_string())
}

fn column_text(signal: &SignalHeader, column: usize) -> String {
    match column {
        0 => signal.label.clone(),
        1 => signal.transducer.clone(),
        2 => signal.physical_dimension.clone(),
        3 => format_number(signal.physical_min),
        4 => format_number(signal.physical_max),
        5 => signal.digital_min.to_string(),
        6 => signal.digital_max.to_string(),
        7 => signal.prefilter.clone(),
        8 => signal.samples_per_record.to_string(),
        _ => signal.reserved.clone(),
    }
}

/// Serializes signal headers column by column
///
/// The output is `256 * signals.len()` bytes: every label, then every
/// transducer, and so on through the ten columns.
pub fn serialize_signal_headers(signals: &[SignalHeader]) -> Vec<u8> {
    let mut out = Vec::with_capacity(signals.len() * EDF_SIGNAL_HEADER_LEN);

    for (column, (_, width)) in SIGNAL_COLUMNS.iter().enumerate() {
        for signal in signals {
            out.extend_from_slice(&fit_field(&column_text(signal, column), *width));
        }
    }

    out
}

/// Serializes the whole header region: main record then signal records
pub fn serialize_header(header: &EdfHeader, file_len: u64) -> Vec<u8> {
    let mut out = serialize_file_header(&header.file, &header.signals, file_len).to_vec();
    out.extend(serialize_signal_headers(&header.signals));
    out
}
