//! File loading tests.

use std::io::Write;

use ragline_rag::{Loader, RagError, TextFileLoader, load_path};

#[tokio::test]
async fn text_file_becomes_one_document() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("notes.md");
    std::fs::write(&path, "# Notes\n\ntokio is an async runtime.").unwrap();

    let documents = TextFileLoader.load(&path).await.unwrap();

    assert_eq!(documents.len(), 1);
    assert_eq!(documents[0].id, "notes");
    assert_eq!(documents[0].text, "# Notes\n\ntokio is an async runtime.");
    assert_eq!(documents[0].source_uri.as_deref(), Some(path.to_str().unwrap()));
}

#[tokio::test]
async fn load_path_reads_text_by_default() {
    let mut file = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
    write!(file, "plain text").unwrap();

    let documents = load_path(file.path()).await.unwrap();
    assert_eq!(documents[0].text, "plain text");
}

#[tokio::test]
async fn invalid_utf8_is_a_loader_error() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&[0xff, 0xfe, 0x00]).unwrap();

    let err = TextFileLoader.load(file.path()).await.unwrap_err();
    assert!(matches!(err, RagError::LoaderError { .. }));
}

#[tokio::test]
async fn corrupt_pdf_is_a_loader_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.pdf");
    std::fs::write(&path, b"not a pdf").unwrap();

    let err = load_path(&path).await.unwrap_err();
    assert!(matches!(err, RagError::LoaderError { .. }));
}
