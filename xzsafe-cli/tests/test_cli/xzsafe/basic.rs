use crate::add_test;
use crate::common::{generate_random_data, xz_available, Fixture, BINARY_DATA, SAMPLE_TEXT};
use crate::KB;

// Compress in place, then decompress in place
add_test!(compress_decompress, async {
    if !xz_available() {
        return;
    }
    const FILE_NAME: &str = "input.txt";

    let data = SAMPLE_TEXT.as_bytes();
    let fixture = Fixture::with_file(FILE_NAME, data);

    let output = fixture.run(&[&fixture.path(FILE_NAME)]).await;
    assert!(output.status.success(), "{}", output.stderr);
    assert!(!fixture.file_exists(FILE_NAME));
    assert!(fixture.file_exists("input.txt.xz"));

    let output = fixture.run(&["-d", &fixture.compressed_path(FILE_NAME)]).await;
    assert!(output.status.success(), "{}", output.stderr);
    assert!(!fixture.file_exists("input.txt.xz"));

    fixture.assert_files(&[FILE_NAME], &[data]);
});

// -k keeps the original next to the archive
add_test!(compress_keep_original, async {
    if !xz_available() {
        return;
    }
    const FILE_NAME: &str = "keep_test.bin";

    let fixture = Fixture::with_file(FILE_NAME, BINARY_DATA);

    let output = fixture.run(&["-k", &fixture.path(FILE_NAME)]).await;
    assert!(output.status.success(), "{}", output.stderr);

    assert!(fixture.file_exists(FILE_NAME));
    assert!(fixture.file_exists("keep_test.bin.xz"));
});

// --inflate is accepted for decompression
add_test!(inflate_alias_decompresses, async {
    if !xz_available() {
        return;
    }
    const FILE_NAME: &str = "alias.txt";

    let data = SAMPLE_TEXT.as_bytes();
    let fixture = Fixture::with_file(FILE_NAME, data);

    let output = fixture.run(&["--deflate", &fixture.path(FILE_NAME)]).await;
    assert!(output.status.success(), "{}", output.stderr);

    let output = fixture
        .run(&["--inflate", &fixture.compressed_path(FILE_NAME)])
        .await;
    assert!(output.status.success(), "{}", output.stderr);
    fixture.assert_files(&[FILE_NAME], &[data]);
});

// -dc streams the decompressed bytes and leaves the archive alone
add_test!(decompress_to_stdout, async {
    if !xz_available() {
        return;
    }
    const FILE_NAME: &str = "stream.bin";

    let data = generate_random_data(256 * KB);
    let fixture = Fixture::with_file(FILE_NAME, &data);

    let output = fixture.run(&["-1", &fixture.path(FILE_NAME)]).await;
    assert!(output.status.success(), "{}", output.stderr);

    let output = fixture
        .run(&["-d", "-c", &fixture.compressed_path(FILE_NAME)])
        .await;
    assert!(output.status.success(), "{}", output.stderr);
    assert!(output.stdout_raw == data);
    assert!(fixture.file_exists("stream.bin.xz"));
    assert!(!fixture.file_exists(FILE_NAME));
});

// Standard input is compressed to stdout and back
add_test!(stdin_round_trip, async {
    if !xz_available() {
        return;
    }
    let fixture = Fixture::new();
    let data = generate_random_data(64 * KB);

    let compressed = fixture.run_with_stdin(&["-z"], &data).await;
    assert!(compressed.status.success(), "{}", compressed.stderr);
    assert!(!compressed.stdout_raw.is_empty());

    let restored = fixture
        .run_with_stdin(&["-d", "-"], &compressed.stdout_raw)
        .await;
    assert!(restored.status.success(), "{}", restored.stderr);
    assert!(restored.stdout_raw == data);
});

// Standard input larger than any pipe buffer flows through the engine
add_test!(large_stdin_round_trip, async {
    if !xz_available() {
        return;
    }
    let fixture = Fixture::new();
    let data = generate_random_data(4 * 1024 * KB);

    let compressed = fixture.run_with_stdin(&["-z", "-0", "-"], &data).await;
    assert!(compressed.status.success(), "{}", compressed.stderr);

    let restored = fixture
        .run_with_stdin(&["-d"], &compressed.stdout_raw)
        .await;
    assert!(restored.status.success(), "{}", restored.stderr);
    assert!(restored.stdout_raw == data);
});

// Compressing to stdout keeps the source and writes a valid stream
add_test!(compress_to_stdout, async {
    if !xz_available() {
        return;
    }
    const FILE_NAME: &str = "stdout_test.txt";

    let data = SAMPLE_TEXT.as_bytes();
    let fixture = Fixture::with_file(FILE_NAME, data);

    let output = fixture.run(&["-c", &fixture.path(FILE_NAME)]).await;
    assert!(output.status.success(), "{}", output.stderr);
    assert!(fixture.file_exists(FILE_NAME));

    let restored = fixture.run_with_stdin(&["-d"], &output.stdout_raw).await;
    assert!(restored.status.success(), "{}", restored.stderr);
    assert_eq!(restored.stdout, SAMPLE_TEXT);
});

// Every file is processed even when one of them fails
add_test!(multiple_files_continue_after_failure, async {
    if !xz_available() {
        return;
    }
    let fixture = Fixture::with_files(&["a.txt", "b.txt"], &[b"first", b"second"]);

    let output = fixture
        .run(&[
            "-k",
            &fixture.path("a.txt"),
            &fixture.path("missing.txt"),
            &fixture.path("b.txt"),
        ])
        .await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("missing.txt"), "{}", output.stderr);
    assert!(fixture.file_exists("a.txt.xz"));
    assert!(fixture.file_exists("b.txt.xz"));
});
