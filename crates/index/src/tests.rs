use super::*;
use tempfile::tempdir;

fn path(dir: &tempfile::TempDir, name: &str) -> String {
    dir.path().join(name).to_string_lossy().into_owned()
}

#[test]
fn create_then_open_reads_back_declared_fanout() {
    let dir = tempdir().unwrap();
    let p = path(&dir, "i1.idx");
    create(&p, 42).unwrap();

    let idx = Index::open(&p, DataType::Int).unwrap();
    assert_eq!(idx.declared_fanout(), 42);
    assert_eq!(idx.get_key_type(), DataType::Int);
    assert_eq!(idx.get_num_entries(), 0);
}

#[test]
fn insert_then_find_round_trips() {
    let dir = tempdir().unwrap();
    let p = path(&dir, "i2.idx");
    create(&p, 4).unwrap();
    let mut idx = Index::open(&p, DataType::Int).unwrap();

    let rid = Rid::new(3, 1);
    idx.insert(Value::Int(10), rid).unwrap();
    assert_eq!(idx.find(&Value::Int(10)).unwrap(), rid);
}

#[test]
fn insert_duplicate_key_fails() {
    let dir = tempdir().unwrap();
    let p = path(&dir, "i3.idx");
    create(&p, 4).unwrap();
    let mut idx = Index::open(&p, DataType::Int).unwrap();

    idx.insert(Value::Int(1), Rid::new(0, 0)).unwrap();
    let err = idx.insert(Value::Int(1), Rid::new(0, 1)).unwrap_err();
    assert!(matches!(err, DbError::KeyAlreadyExists));
}

#[test]
fn find_missing_key_fails() {
    let dir = tempdir().unwrap();
    let p = path(&dir, "i4.idx");
    create(&p, 4).unwrap();
    let idx = Index::open(&p, DataType::Int).unwrap();
    let err = idx.find(&Value::Int(99)).unwrap_err();
    assert!(matches!(err, DbError::KeyNotFound));
}

#[test]
fn delete_key_then_find_fails() {
    let dir = tempdir().unwrap();
    let p = path(&dir, "i5.idx");
    create(&p, 4).unwrap();
    let mut idx = Index::open(&p, DataType::Int).unwrap();

    idx.insert(Value::Int(5), Rid::new(1, 0)).unwrap();
    idx.delete_key(&Value::Int(5)).unwrap();
    assert!(matches!(
        idx.find(&Value::Int(5)).unwrap_err(),
        DbError::KeyNotFound
    ));
    assert_eq!(idx.get_num_entries(), 0);
}

#[test]
fn scan_emits_entries_in_ascending_key_order() {
    let dir = tempdir().unwrap();
    let p = path(&dir, "i6.idx");
    create(&p, 4).unwrap();
    let mut idx = Index::open(&p, DataType::Int).unwrap();

    let r30 = Rid::new(0, 0);
    let r10 = Rid::new(1, 0);
    let r20 = Rid::new(2, 0);
    idx.insert(Value::Int(30), r30).unwrap();
    idx.insert(Value::Int(10), r10).unwrap();
    idx.insert(Value::Int(20), r20).unwrap();

    let mut scan = idx.open_scan();
    assert_eq!(scan.next_entry().unwrap(), r10);
    assert_eq!(scan.next_entry().unwrap(), r20);
    assert_eq!(scan.next_entry().unwrap(), r30);
    assert!(matches!(scan.next_entry().unwrap_err(), DbError::NoMoreEntries));
}

#[test]
fn get_num_nodes_subtracts_duplicate_page_pairs() {
    let dir = tempdir().unwrap();
    let p = path(&dir, "i7.idx");
    create(&p, 4).unwrap();
    let mut idx = Index::open(&p, DataType::Int).unwrap();

    // three entries land on page 7: (i=1,j=0) and (i=2,j=0) and (i=2,j=1)
    // all match page 7, so duplicatePagePairCount = 3.
    idx.insert(Value::Int(1), Rid::new(7, 0)).unwrap();
    idx.insert(Value::Int(2), Rid::new(7, 1)).unwrap();
    idx.insert(Value::Int(3), Rid::new(7, 2)).unwrap();

    assert_eq!(idx.get_num_entries(), 3);
    assert_eq!(idx.get_num_nodes(), 0);
}

#[test]
fn get_num_nodes_equals_entries_when_no_page_repeats() {
    let dir = tempdir().unwrap();
    let p = path(&dir, "i8.idx");
    create(&p, 4).unwrap();
    let mut idx = Index::open(&p, DataType::Int).unwrap();

    idx.insert(Value::Int(1), Rid::new(1, 0)).unwrap();
    idx.insert(Value::Int(2), Rid::new(2, 0)).unwrap();

    assert_eq!(idx.get_num_nodes(), 2);
}

#[test]
fn close_releases_the_pool() {
    let dir = tempdir().unwrap();
    let p = path(&dir, "i9.idx");
    create(&p, 4).unwrap();
    let idx = Index::open(&p, DataType::Int).unwrap();
    idx.close().unwrap();
}

#[test]
fn delete_removes_metadata_file() {
    let dir = tempdir().unwrap();
    let p = path(&dir, "i10.idx");
    create(&p, 4).unwrap();
    delete(&p).unwrap();
    assert!(!std::path::Path::new(&p).exists());
}
