//! Integration tests for TestingLoaderSaver bookkeeping

use fssafe::{Close, Loader, Saver};
use fssafe_mocked::{Fault, TestingLoaderSaver};
use std::io::{Read, Write};

fn payload(i: usize) -> Vec<u8> {
    format!("payload number {i}, thirty-three").into_bytes()
}

#[test]
fn test_history_and_close_flags() {
    let store = TestingLoaderSaver::new();

    // Loader fails before the first saver
    assert!(matches!(store.loader(), Err(e) if e.is_not_found()));
    assert_eq!(store.current_reader(), None, "no reader yet");
    assert_eq!(store.current_writer(), None, "no writer yet");

    let mut expected = Vec::new();
    for i in 1..=3 {
        let mut writer = store.saver().expect("saver should open");
        assert_eq!(store.current_writer(), Some(i - 1), "writer index should match");
        assert_eq!(store.buffers().len(), i - 1, "no buffer yet");

        let data = payload(i);
        writer.write_all(&data).unwrap();
        assert_eq!(store.buffers().len(), i - 1, "still no buffer yet");

        writer.close().expect("close should commit");
        assert_eq!(store.buffers().len(), i, "got a buffer now");
        expected.push(data.clone());

        let mut reader = store.loader().expect("buffer exists, so reading it should be fine");
        assert_eq!(store.current_reader(), Some(i - 1), "reader index should match");

        let mut read = Vec::new();
        reader.read_to_end(&mut read).unwrap();
        assert_eq!(read, data, "found the same bytes from loader that we wrote");
        reader.close().expect("reader close should not error");
    }

    assert_eq!(store.buffers(), expected);
    assert_eq!(store.readers_closed(), vec![true; 3]);
    assert_eq!(store.writers_closed(), vec![true; 3]);
}

#[test]
fn test_unclosed_handles_are_reported() {
    let store = TestingLoaderSaver::new();

    let mut closed = store.saver().unwrap();
    closed.write_all(b"a").unwrap();
    closed.close().unwrap();

    let mut forgotten = store.saver().unwrap();
    forgotten.write_all(b"never committed").unwrap();
    drop(forgotten);

    let _open_reader = store.loader().unwrap();
    let mut closed_reader = store.loader().unwrap();
    closed_reader.close().unwrap();

    assert_eq!(store.writers_closed(), vec![true, false]);
    assert_eq!(store.readers_closed(), vec![false, true]);
    assert_eq!(store.buffers(), vec![b"a".to_vec()]);
}

#[test]
fn test_reader_snapshot_ignores_later_commits() {
    let store = TestingLoaderSaver::new();
    fssafe::save_bytes(&store, b"before").unwrap();

    let mut early = store.loader().unwrap();
    let mut writer = store.saver().unwrap();
    writer.write_all(b"after").unwrap();
    writer.close().unwrap();

    let mut data = Vec::new();
    early.read_to_end(&mut data).unwrap();
    assert_eq!(data, b"before");
    assert_eq!(store.committed().as_deref(), Some(&b"after"[..]));
}

#[test]
fn test_concurrent_savers_commit_in_close_order() {
    let store = TestingLoaderSaver::new();

    let mut first = store.saver().unwrap();
    let mut second = store.saver().unwrap();
    first.write_all(b"first").unwrap();
    second.write_all(b"second").unwrap();

    // Readers never see in-progress writes
    assert!(matches!(store.loader(), Err(e) if e.is_not_found()));

    second.close().unwrap();
    first.close().unwrap();

    assert_eq!(store.buffers(), vec![b"second".to_vec(), b"first".to_vec()]);
    assert_eq!(store.committed().as_deref(), Some(&b"first"[..]));
    assert_eq!(store.writers_closed(), vec![true, true]);
}

#[test]
fn test_faults_are_one_shot_and_independent() {
    let store = TestingLoaderSaver::new();
    store.fail_next(Fault::Save);
    store.fail_next(Fault::Commit);

    assert!(store.saver().is_err());

    let mut writer = store.saver().unwrap();
    writer.write_all(b"lost").unwrap();
    assert!(writer.close().is_err());

    fssafe::save_bytes(&store, b"kept").unwrap();

    assert_eq!(store.buffers(), vec![b"kept".to_vec()]);
    assert_eq!(store.writers_closed(), vec![true, true]);
}
