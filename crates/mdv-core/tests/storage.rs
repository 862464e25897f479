//! Tests for writing dumps to disk

use mdv_core::storage::{save_matrix, Format, MFE_COMMENT, MFE_HEADER_LEN};
use mdv_core::types::{MatType, Matrix};
use mdv_core::MdvError;

fn bgr_pixel() -> Matrix
{
    Matrix::new(1, 2, MatType::from_code(16).unwrap(), vec![10, 20, 30, 40, 50, 60]).unwrap()
}

#[test]
fn test_save_every_format_by_extension()
{
    let dir = tempfile::tempdir().unwrap();
    let matrix = Matrix::new(2, 2, MatType::from_code(0).unwrap(), vec![0, 64, 128, 255]).unwrap();

    for name in ["m.xml", "m.yml", "m.yaml", "m.json", "m.mfe", "m.edf", "m.txt"] {
        let path = dir.path().join(name);
        let format = Format::from_path(&path).unwrap();
        save_matrix(&path, format, "matrix", &matrix).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0, "{name} is empty");
    }

    let txt = std::fs::read_to_string(dir.path().join("m.txt")).unwrap();
    assert_eq!(txt, "2 2\n0 64 128 255 ");
}

#[test]
fn test_mfe_file_carries_raw_data()
{
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixel.mfe");
    save_matrix(&path, Format::Mfe, "ignored name", &bgr_pixel()).unwrap();

    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(bytes.len(), MFE_HEADER_LEN + MFE_COMMENT.len() + 6);
    assert!(bytes.ends_with(&[10, 20, 30, 40, 50, 60]));
}

#[test]
fn test_json_file_is_valid_json()
{
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixel.json");
    save_matrix(&path, Format::Json, "matrix", &bgr_pixel()).unwrap();

    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(value["matrix"]["dt"], "3u");
    assert_eq!(value["matrix"]["data"].as_array().unwrap().len(), 6);
}

#[test]
fn test_bad_record_name_is_rejected()
{
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.xml");
    std::fs::write(&path, "<opencv_storage/>").unwrap();
    let err = save_matrix(&path, Format::Xml, "not a tag", &bgr_pixel()).unwrap_err();
    assert!(matches!(err, MdvError::InvalidArgument(_)));
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "<opencv_storage/>");
}

#[test]
fn test_txt_refuses_multichannel()
{
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pixel.txt");
    let err = save_matrix(&path, Format::Txt, "matrix", &bgr_pixel()).unwrap_err();
    assert!(matches!(err, MdvError::UnsupportedFormat(_)));
}
