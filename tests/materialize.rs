//! Materialization Integration Tests
//!
//! Tests for path construction, caching by path, atomic copies and
//! batch behavior against an in-memory provider.

mod common;

use std::fs;
use std::sync::Arc;

use common::{reference, FakeEntry, FakeResolver};
use contentfile::config::Settings;
use contentfile::core::{FileMaterializer, MaterializeError, MimeStrategy};
use tempfile::TempDir;

const DOC: &str = "content://com.android.providers.downloads.documents/document/17";

fn materializer(temp: &TempDir, resolver: Arc<FakeResolver>) -> FileMaterializer {
    FileMaterializer::new(resolver, Settings::new(temp.path().join("ContentFile")))
}

#[test]
fn test_materialize_copies_bytes_into_cache_root() {
    let temp = TempDir::new().unwrap();
    let resolver = Arc::new(
        FakeResolver::new().with(DOC, FakeEntry::file("notes.txt", Some("text/plain"), "hello")),
    );

    let file = materializer(&temp, resolver)
        .materialize(&reference(DOC))
        .unwrap();

    assert_eq!(file.path, temp.path().join("ContentFile").join("notes.txt"));
    assert_eq!(file.mime_type.as_deref(), Some("text/plain"));
    assert_eq!(fs::read_to_string(&file.path).unwrap(), "hello");
}

#[test]
fn test_second_materialize_skips_copy() {
    let temp = TempDir::new().unwrap();
    let resolver = Arc::new(
        FakeResolver::new().with(DOC, FakeEntry::file("photo.jpg", Some("image/jpeg"), vec![7u8; 100])),
    );
    let materializer = materializer(&temp, resolver.clone());

    let first = materializer.materialize(&reference(DOC)).unwrap();
    let second = materializer.materialize(&reference(DOC)).unwrap();

    assert_eq!(first, second);
    assert_eq!(resolver.opens(), 1);
}

#[test]
fn test_directory_at_destination_is_not_a_cache_hit() {
    let temp = TempDir::new().unwrap();
    let occupied = temp.path().join("ContentFile").join("photos");
    fs::create_dir_all(&occupied).unwrap();

    let resolver = Arc::new(FakeResolver::new().with(DOC, FakeEntry::file("photos", None, "bytes")));
    let result = materializer(&temp, resolver.clone()).materialize(&reference(DOC));

    match result {
        Err(MaterializeError::Io { path, .. }) => assert_eq!(path, occupied),
        other => panic!("expected Io error, got {:?}", other),
    }
    assert_eq!(resolver.opens(), 0);
    assert!(occupied.is_dir());
}

#[test]
fn test_display_name_whitespace_is_preserved() {
    let temp = TempDir::new().unwrap();
    let resolver = Arc::new(
        FakeResolver::new().with(DOC, FakeEntry::file(" notes.txt", Some("text/plain"), "hi")),
    );

    let file = materializer(&temp, resolver)
        .materialize(&reference(DOC))
        .unwrap();

    assert_eq!(file.path, temp.path().join("ContentFile").join(" notes.txt"));
}

#[test]
fn test_pdf_without_extension_gets_suffix() {
    let temp = TempDir::new().unwrap();
    let resolver = Arc::new(
        FakeResolver::new().with(DOC, FakeEntry::file("report", Some("application/pdf"), "%PDF-1.4")),
    );

    let file = materializer(&temp, resolver)
        .materialize(&reference(DOC))
        .unwrap();

    assert!(file.path.ends_with("report.pdf"));
    assert_eq!(file.mime_type.as_deref(), Some("application/pdf"));
    assert_eq!(fs::read(&file.path).unwrap(), b"%PDF-1.4");
}

#[test]
fn test_resolvable_name_keeps_its_extension() {
    let temp = TempDir::new().unwrap();
    let resolver = Arc::new(
        FakeResolver::new().with(DOC, FakeEntry::file("report.txt", Some("application/pdf"), "x")),
    );
    let settings = Settings::new(temp.path()).with_mime_strategy(MimeStrategy::ExtensionTable);

    let file = FileMaterializer::new(resolver, settings)
        .materialize(&reference(DOC))
        .unwrap();

    assert_eq!(file.path, temp.path().join("report.txt"));
}

#[test]
fn test_guessed_type_used_when_provider_reports_none() {
    let temp = TempDir::new().unwrap();
    let resolver = Arc::new(FakeResolver::new().with(DOC, FakeEntry::file("clip.mp4", None, "v")));

    let file = materializer(&temp, resolver)
        .materialize(&reference(DOC))
        .unwrap();

    assert_eq!(file.mime_type.as_deref(), Some("video/mp4"));
}

#[test]
fn test_copy_completeness_across_buffer_boundaries() {
    let temp = TempDir::new().unwrap();
    let large: Vec<u8> = (0..40_000u32).map(|i| (i % 251) as u8).collect();

    let resolver = Arc::new(
        FakeResolver::new()
            .with(DOC, FakeEntry::file("empty.bin", None, Vec::new()))
            .with(
                "content://com.android.providers.downloads.documents/document/18",
                FakeEntry::file("large.bin", None, large.clone()),
            ),
    );
    let materializer = materializer(&temp, resolver);

    let empty = materializer.materialize(&reference(DOC)).unwrap();
    assert_eq!(fs::read(&empty.path).unwrap().len(), 0);

    let copied = materializer
        .materialize(&reference(
            "content://com.android.providers.downloads.documents/document/18",
        ))
        .unwrap();
    assert_eq!(fs::read(&copied.path).unwrap(), large);
}

#[test]
fn test_failed_copy_leaves_nothing_behind() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("ContentFile");

    let broken = FakeEntry {
        fail_after: Some(20_000),
        ..FakeEntry::file("movie.mkv", None, vec![1u8; 50_000])
    };
    let resolver = Arc::new(FakeResolver::new().with(DOC, broken));

    let result = materializer(&temp, resolver).materialize(&reference(DOC));

    match result {
        Err(e) => assert!(e.is_io_failure(), "unexpected error: {}", e),
        Ok(file) => panic!("Expected failure, got {:?}", file),
    }
    assert!(!root.join("movie.mkv").exists());
    assert_eq!(fs::read_dir(&root).unwrap().count(), 0);

    // A retry with a healthy source must copy again
    let healthy = Arc::new(
        FakeResolver::new().with(DOC, FakeEntry::file("movie.mkv", None, vec![1u8; 50_000])),
    );
    let file = materializer(&temp, healthy.clone())
        .materialize(&reference(DOC))
        .unwrap();
    assert_eq!(healthy.opens(), 1);
    assert_eq!(fs::read(&file.path).unwrap().len(), 50_000);
}

#[test]
fn test_open_failure_is_io_failure() {
    let temp = TempDir::new().unwrap();
    let refused = FakeEntry {
        fail_open: true,
        ..FakeEntry::file("secret.txt", None, "s")
    };
    let resolver = Arc::new(FakeResolver::new().with(DOC, refused));

    let result = materializer(&temp, resolver).materialize(&reference(DOC));
    assert!(matches!(result, Err(MaterializeError::Open { .. })));
}

#[test]
fn test_missing_display_name() {
    let temp = TempDir::new().unwrap();
    let nameless = FakeEntry {
        name: None,
        ..FakeEntry::file("", None, "data")
    };
    let resolver = Arc::new(FakeResolver::new().with(DOC, nameless));

    let result = materializer(&temp, resolver.clone()).materialize(&reference(DOC));
    assert!(matches!(result, Err(MaterializeError::MetadataNotFound(_))));
    assert_eq!(resolver.opens(), 0);

    let settings = Settings::new(temp.path()).with_generated_names(true);
    let file = FileMaterializer::new(resolver, settings)
        .materialize(&reference(DOC))
        .unwrap();
    let name = file.file_name().unwrap();
    assert!(uuid::Uuid::parse_str(name).is_ok(), "not a uuid: {}", name);
}

#[test]
fn test_unknown_reference_fails_metadata_lookup() {
    let temp = TempDir::new().unwrap();
    let resolver = Arc::new(FakeResolver::new());

    let result = materializer(&temp, resolver).materialize(&reference(DOC));
    assert!(matches!(result, Err(MaterializeError::Metadata { .. })));
}

#[test]
fn test_hostile_display_name_stays_in_root() {
    let temp = TempDir::new().unwrap();
    let root = temp.path().join("ContentFile");
    let resolver = Arc::new(
        FakeResolver::new().with(DOC, FakeEntry::file("../../escape.txt", None, "x")),
    );

    let file = materializer(&temp, resolver)
        .materialize(&reference(DOC))
        .unwrap();

    assert_eq!(file.path.parent().unwrap(), root);
    assert!(!temp.path().join("escape.txt").exists());
}

#[test]
fn test_batch_aborts_on_first_failure() {
    let temp = TempDir::new().unwrap();
    let other = "content://com.android.providers.downloads.documents/document/99";
    let resolver = Arc::new(
        FakeResolver::new()
            .with(DOC, FakeEntry::file("a.txt", None, "a"))
            .with(other, FakeEntry {
                name: None,
                ..FakeEntry::default()
            }),
    );
    let materializer = materializer(&temp, resolver);

    let result = materializer.materialize_all(&[reference(DOC), reference(other)]);
    assert!(matches!(result, Err(MaterializeError::MetadataNotFound(_))));

    let ok = materializer.materialize_all(&[reference(DOC)]).unwrap();
    assert_eq!(ok.len(), 1);
}

#[test]
fn test_clip_skips_empty_items() {
    let temp = TempDir::new().unwrap();
    let second = "content://com.android.providers.downloads.documents/document/18";
    let resolver = Arc::new(
        FakeResolver::new()
            .with(DOC, FakeEntry::file("a.txt", None, "a"))
            .with(second, FakeEntry::file("b.txt", None, "b")),
    );

    let files = materializer(&temp, resolver)
        .materialize_clip(&[Some(reference(DOC)), None, Some(reference(second))])
        .unwrap();

    let names: Vec<_> = files.iter().filter_map(|f| f.file_name()).collect();
    assert_eq!(names, vec!["a.txt", "b.txt"]);
}
