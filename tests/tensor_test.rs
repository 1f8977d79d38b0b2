use std::io::Cursor;

use microvgg::tensor::Tensor;
use microvgg::CnnError;

#[test]
fn tensor_get_set() {
    let mut t = Tensor::new(2, 3, 4);
    t.set(1, 2, 3, 42.0);
    assert_eq!(t.get(1, 2, 3), 42.0);
    assert_eq!(t.len(), 24);
}

#[test]
fn tensor_index_mapping_is_plane_major() {
    let mut t = Tensor::new(2, 3, 4);
    t.set(1, 2, 1, 7.0);
    // width * (height * plane + y) + x
    assert_eq!(t.as_slice()[4 * (3 * 1 + 2) + 1], 7.0);
    assert_eq!(t.plane(1)[4 * 2 + 1], 7.0);
}

#[test]
fn tensor_fill() {
    let mut t = Tensor::new(1, 2, 2);
    t.fill(7.0);
    assert_eq!(t.get(0, 0, 0), 7.0);
    assert_eq!(t.get(0, 1, 1), 7.0);
}

#[test]
fn tensor_from_vec_checks_length() {
    let t = Tensor::from_vec(1, 2, 2, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    assert_eq!(t.get(0, 1, 0), 3.0);

    let err = Tensor::from_vec(1, 2, 2, vec![1.0; 3]).unwrap_err();
    assert!(matches!(err, CnnError::ShapeMismatch { .. }));

    let err = Tensor::from_vec(0, 2, 2, vec![]).unwrap_err();
    assert!(matches!(err, CnnError::ShapeMismatch { .. }));
}

#[test]
#[should_panic]
fn tensor_new_rejects_zero_dimension() {
    let _ = Tensor::new(1, 0, 3);
}

#[test]
fn flatten_orders_row_col_plane() {
    let t = Tensor::from_vec(2, 2, 2, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]).unwrap();
    let mut flat = vec![0.0; 8];
    t.flatten(&mut flat).unwrap();
    assert_eq!(flat, vec![1.0, 5.0, 2.0, 6.0, 3.0, 7.0, 4.0, 8.0]);
    assert_eq!(t.flatten_to_vec(), flat);
}

#[test]
fn flatten_non_square_planes() {
    // 3 planes of 1x2: plane p holds [10p, 10p + 1]
    let t = Tensor::from_vec(3, 1, 2, vec![0.0, 1.0, 10.0, 11.0, 20.0, 21.0]).unwrap();
    assert_eq!(t.flatten_to_vec(), vec![0.0, 10.0, 20.0, 1.0, 11.0, 21.0]);
}

#[test]
fn flatten_rejects_wrong_destination_length() {
    let t = Tensor::new(2, 2, 2);
    let mut flat = vec![-1.0; 7];
    let err = t.flatten(&mut flat).unwrap_err();
    assert!(matches!(err, CnnError::ShapeMismatch { .. }));
    assert!(flat.iter().all(|&v| v == -1.0), "destination must be untouched");
}

#[test]
fn load_cells_reads_little_endian() {
    let mut bytes = Vec::new();
    for v in [1.5f32, -2.0, 3.25, 0.0] {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    bytes.extend_from_slice(&[0xde, 0xad]);

    let mut t = Tensor::new(1, 2, 2);
    t.load_cells(&mut Cursor::new(bytes)).unwrap();
    assert_eq!(t.as_slice(), &[1.5, -2.0, 3.25, 0.0]);
}

#[test]
fn load_cells_reports_truncation() {
    let bytes: Vec<u8> = 1.0f32.to_le_bytes().to_vec();
    let mut t = Tensor::new(1, 1, 2);
    match t.load_cells(&mut Cursor::new(bytes)).unwrap_err() {
        CnnError::TruncatedInput { expected, actual, .. } => {
            assert_eq!(expected, 2);
            assert_eq!(actual, 1);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn tensor_display() {
    assert_eq!(Tensor::new(64, 224, 224).to_string(), "64x224x224");
}
