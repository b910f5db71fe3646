use chrono::NaiveDate;
use edfheader::{
    detect, read_header_bytes, serialize_header, Detection, EdfError, EdfFile, EdfHeader,
    FileType, Gender, PatientIdentification, RecordingIdentification, SignalFormat, SignalHeader,
};
use std::fs;
use std::path::Path;

// 创建测试信号的辅助函数
fn create_test_eeg_signal() -> SignalHeader {
    SignalHeader {
        label: "EEG Fp1".to_string(),
        transducer: "AgAgCl electrodes".to_string(),
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

fn create_test_ecg_signal() -> SignalHeader {
    SignalHeader {
        label: "ECG Lead II".to_string(),
        transducer: "Chest electrodes".to_string(),
        physical_dimension: "mV".to_string(),
        physical_min: -5.5,
        physical_max: 5.5,
        digital_min: -2048,
        digital_max: 2047,
        prefilter: "HP:0.1Hz LP:100Hz".to_string(),
        samples_per_record: 128,
        reserved: "spare".to_string(),
    }
}

fn start_time() -> Option<chrono::NaiveDateTime> {
    NaiveDate::from_ymd_opt(2010, 1, 2).and_then(|d| d.and_hms_opt(8, 15, 30))
}

// 写入头部和指定数量的零数据记录
fn write_test_file(path: &Path, header: &EdfHeader, records: usize) {
    let record_bytes: i64 = header.signals.iter().map(SignalHeader::bytes_per_record).sum();
    let total = header.file.header_bytes + records * record_bytes as usize;
    let mut bytes = serialize_header(header, total as u64);
    bytes.resize(total, 0);
    fs::write(path, bytes).unwrap();
}

fn edf_plus_header() -> EdfHeader {
    let header = EdfHeader::new(
        FileType::EdfPlus,
        vec![create_test_eeg_signal(), create_test_ecg_signal()],
    );
    let file = header
        .file
        .clone()
        .with_patient(PatientIdentification::new(
            "MCH-0234567",
            Gender::Female,
            NaiveDate::from_ymd_opt(1951, 5, 2),
            "Haagse_Harry",
        ))
        .with_recording(RecordingIdentification::new(
            NaiveDate::from_ymd_opt(2010, 1, 2),
            "EMG561",
            "BK/JOP",
            "Sony.",
            "",
        ))
        .with_start(start_time())
        .with_reserved("site-7");
    header.with_file(file)
}

#[test]
fn test_edf_plus_write_read_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edf_plus_cycle.edf");
    let header = edf_plus_header();
    write_test_file(&path, &header, 3);

    let mut edf = EdfFile::open(&path).unwrap();
    assert!(edf.is_ready());
    assert!(edf.is_edf_plus());
    assert_eq!(edf.signal_format(), SignalFormat::Continuous);
    assert_eq!(edf.last_error(), None);

    let read = edf.read_header().unwrap();
    let file = &read.file;
    assert_eq!(file.file_type, FileType::EdfPlus);
    assert_eq!(file.version, 0);
    assert_eq!(file.patient.code, "MCH-0234567");
    assert_eq!(file.patient.gender, Gender::Female);
    assert_eq!(file.patient.birth_date, NaiveDate::from_ymd_opt(1951, 5, 2));
    assert_eq!(file.patient.name, "Haagse_Harry");
    assert_eq!(file.patient.raw, "MCH-0234567 F 02-MAY-1951 Haagse_Harry");
    assert_eq!(file.recording.start_date, NaiveDate::from_ymd_opt(2010, 1, 2));
    assert_eq!(file.recording.admin_code, "EMG561");
    assert_eq!(file.recording.technician, "BK/JOP");
    assert_eq!(file.recording.equipment, "Sony.");
    assert_eq!(file.recording.comments, "");
    assert_eq!(file.start, start_time());
    assert_eq!(file.header_bytes, 768);
    assert_eq!(file.signal_format, SignalFormat::Continuous);
    assert_eq!(file.reserved, "site-7");
    assert_eq!(file.data_records, 3);
    assert_eq!(file.record_duration, 1.0);
    assert_eq!(file.signal_count, 2);
    assert!(file.is_consistent());

    // 信号头部应完全一致
    assert_eq!(read.signals, header.signals);
}

#[test]
fn test_legacy_edf_round_trip_is_exact() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("legacy.edf");

    let header = EdfHeader::new(FileType::Edf, vec![create_test_eeg_signal()]);
    let file = header
        .file
        .clone()
        .with_patient(PatientIdentification::from_raw("John Smith 1962"))
        .with_recording(RecordingIdentification::from_raw("Sleep lab bed 3"))
        .with_start(start_time())
        .with_reserved("free text")
        .with_data_records(4)
        .with_record_duration(0.25);
    let header = header.with_file(file);
    write_test_file(&path, &header, 4);

    let mut edf = EdfFile::open(&path).unwrap();
    assert_eq!(edf.file_type(), Some(FileType::Edf));
    assert!(!edf.is_edf_plus());

    let read = edf.read_header().unwrap();
    assert_eq!(read, header);
}

#[test]
fn test_open_non_edf_reports_status() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("not_edf.bin");
    fs::write(&path, vec![b'1'; 600]).unwrap();

    let mut edf = EdfFile::open(&path).unwrap();
    assert!(!edf.is_ready());
    assert_eq!(edf.file_type(), None);
    assert_eq!(edf.last_error(), Some("File is not in EDF format!"));
    assert!(matches!(edf.read_header(), Err(EdfError::NotEdfFormat(_))));
}

#[test]
fn test_open_short_file_is_not_edf() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.edf");
    let bytes = serialize_header(&edf_plus_header(), 0);
    fs::write(&path, &bytes[..200]).unwrap();

    let edf = EdfFile::open(&path).unwrap();
    assert!(!edf.is_ready());
}

#[test]
fn test_open_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let result = EdfFile::open(dir.path().join("missing.edf"));
    assert!(matches!(result, Err(EdfError::FileNotFound(_))));
}

#[test]
fn test_rewrite_derives_record_count() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("derive.edf");
    let header = edf_plus_header();
    let file = header.file.clone().with_data_records(99);
    write_test_file(&path, &header.clone().with_file(file), 6);

    let mut edf = EdfFile::open(&path).unwrap();
    let read = edf.read_header().unwrap();
    assert_eq!(read.file.data_records, 99);
    assert_eq!(edf.compute_data_record_count(&read).unwrap(), Some(6));

    let file = read.file.clone().with_data_records(-1);
    let written = edf.write_header(&read.with_file(file)).unwrap();
    assert_eq!(written.file.data_records, 6);

    let reread = edf.read_header().unwrap();
    assert_eq!(reread.file.data_records, 6);
    // 数据区不应被改动
    let expected_len = 768 + 6 * (512 + 256);
    assert_eq!(edf.file_len().unwrap(), expected_len as u64);
}

#[test]
fn test_edit_patient_keeps_other_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("edit.edf");
    write_test_file(&path, &edf_plus_header(), 2);

    {
        let mut edf = EdfFile::open(&path).unwrap();
        let read = edf.read_header().unwrap();
        let file = read.file.clone().with_patient(PatientIdentification::new(
            "P042",
            Gender::Male,
            None,
            "John Smith",
        ));
        edf.write_header(&read.with_file(file)).unwrap();
        edf.close().unwrap();
    }

    let mut edf = EdfFile::open(&path).unwrap();
    let read = edf.read_header().unwrap();
    assert_eq!(read.file.patient.code, "P042");
    assert_eq!(read.file.patient.gender, Gender::Male);
    assert_eq!(read.file.patient.birth_date, None);
    // 空格在写入时被替换为下划线，读取时不会恢复
    assert_eq!(read.file.patient.name, "John_Smith");
    assert_eq!(read.file.recording.admin_code, "EMG561");
    assert_eq!(read.file.start, start_time());
    assert_eq!(read.file.reserved, "site-7");
    assert_eq!(read.signals.len(), 2);
}

#[test]
fn test_save_as_leaves_source_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.edf");
    let target = dir.path().join("target.edf");
    write_test_file(&source, &edf_plus_header(), 2);
    let original_bytes = fs::read(&source).unwrap();

    let mut edf = EdfFile::open(&source).unwrap();
    let read = edf.read_header().unwrap();
    let file = read.file.clone().with_recording(RecordingIdentification::new(
        read.file.recording.start_date,
        "EMG562",
        "AB",
        "Sony.",
        "re-labelled",
    ));
    let written = edf.save_as(&target, &read.with_file(file)).unwrap();
    assert_eq!(written.file.recording.admin_code, "EMG562");

    assert_eq!(fs::read(&source).unwrap(), original_bytes);

    let copy_bytes = fs::read(&target).unwrap();
    assert_eq!(copy_bytes.len(), original_bytes.len());
    assert_eq!(copy_bytes[768..], original_bytes[768..]);

    let mut copy = EdfFile::open(&target).unwrap();
    let copy_header = copy.read_header().unwrap();
    assert_eq!(copy_header.file.recording.admin_code, "EMG562");
    assert_eq!(copy_header.file.recording.comments, "re-labelled");

    // 不覆盖已存在的其他文件
    let other = dir.path().join("other.edf");
    fs::write(&other, b"keep").unwrap();
    assert!(edf.save_as(&other, &copy_header).is_err());
    assert_eq!(fs::read(&other).unwrap(), b"keep");
}

#[test]
fn test_read_only_file_rejects_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("read_only.edf");
    write_test_file(&path, &edf_plus_header(), 1);
    let before = fs::read(&path).unwrap();

    let mut edf = EdfFile::open_read_only(&path).unwrap();
    let read = edf.read_header().unwrap();
    assert!(edf.write_header(&read).is_err());
    assert!(edf.last_error().is_some());
    assert_eq!(fs::read(&path).unwrap(), before);
}

#[test]
fn test_write_rejects_signal_count_mismatch() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("mismatch.edf");
    let mut edf = EdfFile::create(&path).unwrap();

    let mut header = edf_plus_header();
    header.signals.pop();
    let result = edf.write_header(&header);
    assert!(matches!(result, Err(EdfError::InvalidSignalCount(1))));
}

#[test]
fn test_invalid_start_survives_round_trip() {
    let header = edf_plus_header();
    let file = header.file.clone().with_start(None);
    let header = header.with_file(file);

    let bytes = serialize_header(&header, 768);
    assert_eq!(&bytes[168..184], b"00.00.0000.00.00");
    let read = read_header_bytes(&bytes).unwrap();
    assert_eq!(read.file.start, None);
}

#[test]
fn test_detection_on_bytes() {
    let mut h = vec![b' '; 256];
    h[0] = b'0';
    h[184..187].copy_from_slice(b"512");
    assert_eq!(detect(&h), Detection::Edf);

    for i in 0..8 {
        let mut changed = h.clone();
        changed[i] = b'7';
        assert_eq!(detect(&changed), Detection::NotEdf, "version byte {}", i);
    }
    assert_eq!(detect(&h[..255]), Detection::NotEdf);

    h[88..98].copy_from_slice(b"Startdate ");
    assert_eq!(detect(&h), Detection::EdfPlus(SignalFormat::Unknown));
    h[192..197].copy_from_slice(b"EDF+C");
    assert_eq!(detect(&h), Detection::EdfPlus(SignalFormat::Continuous));
    h[192..197].copy_from_slice(b"EDF+D");
    assert_eq!(detect(&h), Detection::EdfPlus(SignalFormat::Discontinuous));
}

#[test]
fn test_untagged_edf_plus_round_trip() {
    let header = edf_plus_header();
    let file = header
        .file
        .clone()
        .with_signal_format(SignalFormat::Unknown)
        .with_data_records(1);
    let header = header.with_file(file);

    let bytes = serialize_header(&header, 0);
    assert_eq!(detect(&bytes), Detection::EdfPlus(SignalFormat::Unknown));

    let read = read_header_bytes(&bytes).unwrap();
    assert_eq!(read.file.signal_format, SignalFormat::Unknown);
    assert_eq!(read.file.reserved, "site-7");
    assert_eq!(read.file.patient.code, "MCH-0234567");
}

#[test]
fn test_discontinuous_round_trip() {
    let header = edf_plus_header();
    let file = header
        .file
        .clone()
        .with_signal_format(SignalFormat::Discontinuous);
    let header = header.with_file(file);

    let read = read_header_bytes(&serialize_header(&header, 768 + 768 * 2)).unwrap();
    assert_eq!(read.file.signal_format, SignalFormat::Discontinuous);
    assert_eq!(read.file.data_records, 2);
}

#[test]
fn test_truncated_signal_block_is_rejected() {
    let bytes = serialize_header(&edf_plus_header(), 0);
    let result = read_header_bytes(&bytes[..600]);
    assert!(matches!(result, Err(EdfError::InvalidHeader(_))));
}

#[test]
fn test_remaining_capacity() {
    let patient = PatientIdentification::new("P001", Gender::Male, None, "Smith");
    assert_eq!(patient.remaining_capacity(), 63 - 9);

    let recording = RecordingIdentification::new(None, "EEG-1", "AB", "Amp", "");
    assert_eq!(recording.remaining_capacity(), 52 - 10);

    let file = edf_plus_header().file;
    assert_eq!(file.remaining_capacity(), 38 - 6);
}

#[test]
fn test_edf_plus_round_trip_matches_structured_fields() {
    let header = edf_plus_header();
    let file = header.file.clone().with_data_records(3);
    let header = header.with_file(file);

    let mut read = read_header_bytes(&serialize_header(&header, 0)).unwrap();
    // EDF+ 模式下 raw 由结构化字段重建
    assert_eq!(read.file.patient.raw, "MCH-0234567 F 02-MAY-1951 Haagse_Harry");
    assert_eq!(read.file.recording.raw, "Startdate 02-JAN-2010 EMG561 BK/JOP Sony.");
    read.file.patient.raw.clear();
    read.file.recording.raw.clear();

    assert_eq!(read, header);
}

#[test]
fn test_header_with_many_signals() {
    let signals = vec![create_test_ecg_signal(); 5000];
    let header = EdfHeader::new(FileType::Edf, signals);
    assert_eq!(header.file.header_bytes, 256 * 5001);

    let read = read_header_bytes(&serialize_header(&header, 0)).unwrap();
    assert_eq!(read.file.signal_count, 5000);
    assert_eq!(read.signals.len(), 5000);
    assert_eq!(read.signals[4999], create_test_ecg_signal());
}

#[test]
fn test_successful_operation_clears_last_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last_error.edf");
    let mut edf = EdfFile::create(&path).unwrap();

    let mut header = edf_plus_header();
    header.signals.pop();
    assert!(edf.write_header(&header).is_err());
    assert!(edf.last_error().is_some());

    edf.write_header(&edf_plus_header()).unwrap();
    assert_eq!(edf.last_error(), None);

    edf.read_header().unwrap();
    assert_eq!(edf.last_error(), None);
}
