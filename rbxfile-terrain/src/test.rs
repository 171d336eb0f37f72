use crate::{scan, MaterialRun, Shape, ShapeRun};
use test_log::test;

// Encode one run: tag byte, then a short or 0xff-escaped big-endian length.
fn run(tag: u8, cells: u32, out: &mut Vec<u8>) {
    out.push(tag);
    if cells < 0xff {
        out.push(cells as u8);
    } else {
        out.push(0xff);
        out.extend_from_slice(&(cells as u16).to_be_bytes());
    }
}

fn chunk(pos: (i16, i16, i16), shapes: &[(u8, u32)], materials: &[(u8, u32)]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&pos.0.to_le_bytes());
    out.extend_from_slice(&pos.1.to_le_bytes());
    out.extend_from_slice(&pos.2.to_le_bytes());
    for &(tag, cells) in shapes {
        run(tag, cells, &mut out);
    }
    for &(tag, cells) in materials {
        run(tag, cells, &mut out);
    }
    out
}

#[test]
fn scans_runs_and_positions() {
    // Shape tag 0b01_001_000: rotation 1, block 1.
    let shape_tag = 0x48;
    let blob = chunk(
        (3, -1, 200),
        &[(shape_tag, 0x100), (0x28, 0x4000 - 0x100)],
        &[(7, 0x20), (0x11, 0x4000 - 0x20)],
    );
    let chunks = scan(&blob).unwrap();
    assert_eq!(chunks.len(), 1);
    let c = &chunks[0];
    assert_eq!(c.position, (3, -1, 200));
    assert_eq!(
        c.shapes,
        [
            ShapeRun {
                cells: 0x100,
                fill: Some(Shape {
                    block: 1,
                    rotation: 1
                })
            },
            ShapeRun {
                cells: 0x4000 - 0x100,
                fill: None
            }
        ]
    );
    assert_eq!(
        c.materials,
        [
            MaterialRun {
                cells: 0x20,
                material: Some(7)
            },
            MaterialRun {
                cells: 0x4000 - 0x20,
                material: None
            }
        ]
    );
}

#[test]
fn scans_consecutive_chunks() {
    let mut blob = chunk((0, 0, 0), &[(0x28, 0x4000)], &[(0x11, 0x4000)]);
    blob.extend_from_slice(&chunk((1, 0, 0), &[(0x28, 0x4000)], &[(0x11, 0x4000)]));
    let chunks = scan(&blob).unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[1].position, (1, 0, 0));
}

#[test]
fn rejects_overrun() {
    let blob = chunk((0, 0, 0), &[(0x28, 0x4001)], &[]);
    assert!(scan(&blob).is_err());
}

#[test]
fn rejects_truncation() {
    let blob = chunk((0, 0, 0), &[(0x28, 0x4000)], &[(0x11, 0x4000)]);
    assert!(scan(&blob[..blob.len() - 1]).is_err());
}
