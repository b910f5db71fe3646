// Internal utilities for documentation tests
// This file contains helper functions to generate test files for doctests

use std::fs;
use std::path::Path;

use chrono::NaiveDate;

use crate::{
    serialize_header, EdfHeader, FileType, Gender, PatientIdentification,
    RecordingIdentification, Result, SignalHeader,
};

/// EEG channel used by the generated files
pub fn eeg_signal(label: &str) -> SignalHeader {
    SignalHeader {
        label: label.to_string(),
        transducer: "AgAgCl cup electrodes".to_string(),
        physical_dimension: "uV".to_string(),
        physical_min: -200.0,
        physical_max: 200.0,
        digital_min: -32768,
        digital_max: 32767,
        prefilter: "HP:0.1Hz LP:70Hz".to_string(),
        samples_per_record: 256,
        reserved: String::new(),
    }
}

/// Creates an EDF+ file with one signal and five zeroed data records
pub fn create_simple_test_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let signal = eeg_signal("EEG Fp1");
    let record_bytes = signal.bytes_per_record() as usize;

    let mut header = EdfHeader::new(FileType::EdfPlus, vec![signal]);
    header.file = header
        .file
        .with_patient(PatientIdentification::new(
            "DOC001",
            Gender::Male,
            NaiveDate::from_ymd_opt(1990, 1, 1),
            "Test Patient",
        ))
        .with_recording(RecordingIdentification::new(
            NaiveDate::from_ymd_opt(2020, 6, 15),
            "EEG-17",
            "Tech",
            "Amplifier",
            "",
        ))
        .with_start(
            NaiveDate::from_ymd_opt(2020, 6, 15).and_then(|d| d.and_hms_opt(9, 30, 0)),
        );

    let total = header.file.header_bytes + 5 * record_bytes;
    let mut bytes = serialize_header(&header, total as u64);
    bytes.resize(total, 0);
    fs::write(path, bytes)?;
    Ok(())
}
