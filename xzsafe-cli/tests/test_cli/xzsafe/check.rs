use crate::add_test;
use crate::common::{generate_random_data, xz_available, Fixture, SAMPLE_TEXT};
use crate::KB;

// A verified archive removes the source and reports both digests
add_test!(check_commits_verified_archive, async {
    if !xz_available() {
        return;
    }
    const FILE_NAME: &str = "archive_me.txt";

    let fixture = Fixture::with_file(FILE_NAME, SAMPLE_TEXT.as_bytes());

    let output = fixture.run(&["--check", &fixture.path(FILE_NAME)]).await;
    assert!(output.status.success(), "{}", output.stderr);
    assert!(!fixture.file_exists(FILE_NAME));
    assert!(fixture.file_exists("archive_me.txt.xz"));
    assert!(output.stdout.contains("verified sha256:"), "{}", output.stdout);
    assert!(output.stdout.contains("source removed"), "{}", output.stdout);
    assert_eq!(output.stdout.lines().count(), 1);

    let restored = fixture
        .run(&["-dc", &fixture.compressed_path(FILE_NAME)])
        .await;
    assert!(restored.status.success(), "{}", restored.stderr);
    assert_eq!(restored.stdout, SAMPLE_TEXT);
});

// Every registered algorithm can drive the check
add_test!(check_with_each_algorithm, async {
    if !xz_available() {
        return;
    }
    for algorithm in ["xxh3", "crc32", "md5", "sha256", "blake3", "fast-hash", "crypto-hash"] {
        let fixture = Fixture::with_file("data.bin", &generate_random_data(16 * KB));

        let output = fixture
            .run(&["--check", "-C", algorithm, &fixture.path("data.bin")])
            .await;
        assert!(output.status.success(), "{algorithm}: {}", output.stderr);
        assert!(!fixture.file_exists("data.bin"), "{algorithm}");
    }
});

// The legacy flag spelling still works
add_test!(deflate_check_alias, async {
    if !xz_available() {
        return;
    }
    let fixture = Fixture::with_file("legacy.txt", b"legacy flags");

    let output = fixture
        .run(&["--deflate-check", "--checksum", "crc32", &fixture.path("legacy.txt")])
        .await;
    assert!(output.status.success(), "{}", output.stderr);
    assert!(output.stdout.contains("crc32:"), "{}", output.stdout);
});

// An unknown algorithm fails before any file is touched
add_test!(check_rejects_unknown_algorithm, async {
    const FILE_NAME: &str = "untouched.txt";

    let fixture = Fixture::with_file(FILE_NAME, SAMPLE_TEXT.as_bytes());

    let output = fixture
        .run(&["--check", "-C", "md4", &fixture.path(FILE_NAME)])
        .await;
    assert!(!output.status.success());
    assert!(
        output.stderr.contains("unsupported digest algorithm: md4"),
        "{}",
        output.stderr
    );
    assert!(output.stdout.is_empty());
    fixture.assert_files(&[FILE_NAME], &[SAMPLE_TEXT.as_bytes()]);
    assert!(!fixture.file_exists("untouched.txt.xz"));
});

// A missing engine leaves the source in place and reports a rollback
add_test!(check_without_engine_keeps_source, async {
    const FILE_NAME: &str = "keep_me.txt";

    let fixture = Fixture::with_file(FILE_NAME, SAMPLE_TEXT.as_bytes());
    let engine = fixture.path("no-such-engine");

    let output = fixture
        .run(&["--check", "--engine", &engine, &fixture.path(FILE_NAME)])
        .await;
    assert!(!output.status.success());
    assert!(
        output.stdout.contains("compression failed"),
        "{}",
        output.stdout
    );
    assert!(
        output.stderr.contains("archive not verified, source kept"),
        "{}",
        output.stderr
    );
    fixture.assert_files(&[FILE_NAME], &[SAMPLE_TEXT.as_bytes()]);
});

// Standard input cannot be archived
add_test!(check_refuses_stdin, async {
    let fixture = Fixture::new();

    let output = fixture.run_with_stdin(&["--check"], b"data").await;
    assert!(!output.status.success());
    assert!(
        output.stderr.contains("(stdin): --check cannot read from standard input"),
        "{}",
        output.stderr
    );
});
