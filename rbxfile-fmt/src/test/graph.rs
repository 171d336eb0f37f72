use crate::test::fixtures::{folded_words, record, string_body, FileBuilder};
use crate::{decode, DecodeError, Value, ValueKind};
use test_log::test;

// A small mixed file used by several structural checks: two classes, a
// referent-typed property, and a two-level parent tree.
fn sample() -> Vec<u8> {
    let mut b = FileBuilder::new();
    let part = b.class("Part", &[0, 2, 3]);
    let model = b.class("Model", &[1]);
    b.prop(part, "Name", 0x01, &string_body(&["a", "b", "c"]));
    // Links: instance 0 -> 1, instance 2 -> nil (zero delta), instance 3 ->
    // far out of the arena, which also resolves to nil.
    b.prop(part, "Target", 0x13, &folded_words(&[1, 0, i32::MIN]));
    b.prop(model, "Name", 0x01, &string_body(&["m"]));
    b.parents(&[(0, 1), (2, 1), (3, 1), (1, -1)]);
    b.build()
}

#[test]
fn arena_is_addressable_by_referent() {
    let file = decode(&sample()).unwrap();
    assert_eq!(file.instances().len(), 4);
    for (i, inst) in file.instances().iter().enumerate() {
        assert_eq!(inst.referent().0, i as i32);
    }
    // Per-class counts add up to the arena size.
    let total: usize = file.classes().iter().map(|c| c.instance_count()).sum();
    assert_eq!(total, file.instances().len());
}

#[test]
fn every_referent_lands_in_its_class() {
    let file = decode(&sample()).unwrap();
    for class in file.classes() {
        for &r in class.referents() {
            let inst = file.instance(r).unwrap();
            assert_eq!(file.class_of(inst).type_id(), class.type_id());
        }
    }
}

#[test]
fn no_referent_values_survive() {
    let file = decode(&sample()).unwrap();
    for class in file.classes() {
        for prop in class.properties() {
            assert_ne!(prop.kind(), ValueKind::Referent);
        }
    }
    for inst in file.instances() {
        for value in inst.values() {
            assert_ne!(value.kind(), ValueKind::Referent);
            if let Value::Object(Some(r)) = value {
                assert!(file.instance(*r).is_some());
            }
        }
    }
}

#[test]
fn every_instance_carries_class_columns_plus_parent() {
    let file = decode(&sample()).unwrap();
    for inst in file.instances() {
        let class = file.class_of(inst);
        assert_eq!(inst.values().len(), class.properties().len());
        let (last, _) = file.props(inst).last().unwrap();
        assert_eq!(last.name(), &"Parent");
        assert_eq!(last.kind(), ValueKind::Object);
    }
}

#[test]
fn parent_tree_resolves() {
    let file = decode(&sample()).unwrap();
    let root = &file.instances()[1];
    assert!(file.parent(root).is_none());
    for i in [0usize, 2, 3] {
        let inst = &file.instances()[i];
        let parent = file.parent(inst).unwrap();
        assert_eq!(parent.referent().0, 1);
    }
}

#[test]
fn names_are_reachable() {
    let file = decode(&sample()).unwrap();
    assert_eq!(file.name_of(&file.instances()[1]).unwrap(), &"m");
    assert_eq!(file.name_of(&file.instances()[2]).unwrap(), &"b");
}

#[test]
fn instance_tag_bytes_are_preserved() {
    let mut b = FileBuilder::new();
    b.class_with_tags("Part", &[0, 1], &[0xaa, 0xbb]);
    let file = decode(&b.build()).unwrap();
    assert_eq!(file.classes()[0].instance_tags().unwrap(), &[0xaa, 0xbb]);
}

#[test]
fn empty_file_decodes() {
    let file = decode(&FileBuilder::new().build()).unwrap();
    assert!(file.classes().is_empty());
    assert!(file.instances().is_empty());
    assert!(file.warnings().is_empty());
}

#[test]
fn rejects_bad_magic() {
    let mut bytes = FileBuilder::new().build();
    bytes[1] = b'x';
    assert_eq!(decode(&bytes).unwrap_err(), DecodeError::BadMagic);
}

#[test]
fn rejects_truncated_input() {
    let bytes = sample();
    for cut in [4usize, 15, 20, 30] {
        match decode(&bytes[..cut]).unwrap_err() {
            DecodeError::UnexpectedEnd | DecodeError::WrongTag { .. } => (),
            other => panic!("unexpected error for cut at {}: {:?}", cut, other),
        }
    }
}

#[test]
fn rejects_nonzero_reserved_word() {
    let mut b = FileBuilder::new();
    b.class("Part", &[0]);
    let mut bytes = b.build();
    // The INST record starts right after the 32-byte header; its reserved
    // word is at offset 12 inside the record.
    let reserved = 32 + 12;
    bytes[reserved] = 1;
    assert_eq!(decode(&bytes).unwrap_err(), DecodeError::CorruptChunkHeader);
}

#[test]
fn rejects_out_of_order_type_ids() {
    // Hand-build a file whose single INST record claims type id 1.
    let mut payload = Vec::new();
    payload.extend_from_slice(&1u32.to_le_bytes());
    payload.extend_from_slice(&4u32.to_le_bytes());
    payload.extend_from_slice(b"Part");
    payload.push(0);
    payload.extend_from_slice(&1u32.to_le_bytes());
    payload.extend_from_slice(&folded_words(&[0]));

    let mut bytes = Vec::new();
    bytes.extend_from_slice(b"<roblox!");
    bytes.extend_from_slice(&[0u8; 8]);
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&1u32.to_le_bytes());
    bytes.extend_from_slice(&[0u8; 8]);
    bytes.extend_from_slice(&record(b"INST", &payload));
    assert_eq!(
        decode(&bytes).unwrap_err(),
        DecodeError::CountMismatch { expected: 0, got: 1 }
    );
}

#[test]
fn rejects_header_count_disagreement() {
    let mut b = FileBuilder::new();
    b.class("Part", &[0, 1]);
    let mut bytes = b.build();
    // Bump the header object count from 2 to 3.
    bytes[20] = 3;
    assert_eq!(
        decode(&bytes).unwrap_err(),
        DecodeError::CountMismatch { expected: 3, got: 2 }
    );
}

#[test]
fn rejects_unknown_class_in_prop() {
    let mut b = FileBuilder::new();
    b.class("Part", &[0]);
    b.prop(9, "Name", 0x01, &string_body(&["x"]));
    assert_eq!(decode(&b.build()).unwrap_err(), DecodeError::UnknownClass(9));
}

#[test]
fn rejects_unsupported_parent_version() {
    let mut b = FileBuilder::new();
    b.class("Part", &[0]);
    let mut payload = vec![2u8];
    payload.extend_from_slice(&1u32.to_le_bytes());
    payload.extend_from_slice(&folded_words(&[0]));
    payload.extend_from_slice(&folded_words(&[-1]));
    let mut bytes = Vec::new();
    b.parents(&[(0, -1)]); // placeholder; replaced below
    let built = b.build();
    // Rebuild with the bad PRNT record swapped in: everything up to the
    // PRNT tag is reusable.
    let prnt_at = find_tag(&built, b"PRNT");
    bytes.extend_from_slice(&built[..prnt_at]);
    bytes.extend_from_slice(&record(b"PRNT", &payload));
    bytes.extend_from_slice(&record(b"END\0", b""));
    assert_eq!(
        decode(&bytes).unwrap_err(),
        DecodeError::UnsupportedPrntVersion(2)
    );
}

#[test]
fn rejects_parent_count_disagreement() {
    let mut b = FileBuilder::new();
    b.class("Part", &[0, 1]);
    b.parents(&[(0, -1)]);
    assert_eq!(
        decode(&b.build()).unwrap_err(),
        DecodeError::CountMismatch { expected: 2, got: 1 }
    );
}

#[test]
fn rejects_missing_parent_record() {
    let mut b = FileBuilder::new();
    b.class("Part", &[0]);
    let built = b.build();
    // Splice the PRNT record out: the decoder must stop at the END tag.
    let prnt_at = find_tag(&built, b"PRNT");
    let end_at = find_tag(&built, b"END\0");
    let mut bytes = built[..prnt_at].to_vec();
    bytes.extend_from_slice(&built[end_at..]);
    assert_eq!(
        decode(&bytes).unwrap_err(),
        DecodeError::WrongTag {
            expected: *b"PRNT",
            got: *b"END\0"
        }
    );
}

#[test]
fn rejects_referent_outside_arena() {
    let mut b = FileBuilder::new();
    b.class("Part", &[0, 5]); // arena only has two slots
    b.parents(&[(0, -1), (5, -1)]);
    assert_eq!(
        decode(&b.build()).unwrap_err(),
        DecodeError::CountMismatch { expected: 2, got: 5 }
    );
}

#[test]
fn rejects_duplicate_referents() {
    let mut b = FileBuilder::new();
    b.class("Part", &[0, 0]);
    b.parents(&[(0, -1), (1, -1)]);
    assert_eq!(
        decode(&b.build()).unwrap_err(),
        DecodeError::CountMismatch { expected: 2, got: 0 }
    );
}

#[test]
fn out_of_range_links_fall_to_nil() {
    let mut b = FileBuilder::new();
    let id = b.class("Part", &[0]);
    b.prop(id, "Target", 0x13, &folded_words(&[40])); // link to nowhere
    let file = decode(&b.build()).unwrap();
    assert_eq!(file.instances()[0].values()[0], Value::Object(None));
}

fn find_tag(bytes: &[u8], tag: &[u8; 4]) -> usize {
    bytes
        .windows(4)
        .position(|w| w == tag)
        .unwrap_or_else(|| panic!("tag {:?} not found", tag))
}
