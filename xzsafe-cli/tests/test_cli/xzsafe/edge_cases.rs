use crate::add_test;
use crate::common::{xz_available, Fixture, SAMPLE_TEXT};

// A missing input is reported with its name
add_test!(missing_input_file, async {
    let fixture = Fixture::new();

    let output = fixture.run(&[&fixture.path("nope.txt")]).await;
    assert!(!output.status.success());
    assert!(output.stderr.starts_with("xzsafe: "), "{}", output.stderr);
    assert!(output.stderr.contains("nope.txt"), "{}", output.stderr);
});

// Decompressing a file without the engine suffix is skipped with a warning
add_test!(decompress_unknown_suffix, async {
    const FILE_NAME: &str = "plain.txt";

    let fixture = Fixture::with_file(FILE_NAME, SAMPLE_TEXT.as_bytes());

    let output = fixture.run(&["-d", &fixture.path(FILE_NAME)]).await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("unknown suffix"), "{}", output.stderr);
    assert!(fixture.file_exists(FILE_NAME));

    // -q silences the warning but not the exit status
    let output = fixture.run(&["-q", "-d", &fixture.path(FILE_NAME)]).await;
    assert!(!output.status.success());
    assert!(output.stderr.is_empty(), "{}", output.stderr);
});

// The suffix is matched case-sensitively, like xz does
add_test!(decompress_uppercase_suffix, async {
    let fixture = Fixture::with_file("DATA.XZ", b"not looked at");

    let output = fixture.run(&["-d", &fixture.path("DATA.XZ")]).await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("unknown suffix"), "{}", output.stderr);
    assert!(!output.stderr.contains("engine"), "{}", output.stderr);
    assert!(fixture.file_exists("DATA.XZ"));
    assert!(!fixture.file_exists("DATA"));
});

// Compressing a file that already carries the suffix is skipped
add_test!(compress_already_compressed, async {
    let fixture = Fixture::with_file("data.xz", b"whatever");

    let output = fixture.run(&[&fixture.path("data.xz")]).await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("Already has `.xz` suffix"), "{}", output.stderr);
    fixture.assert_files(&["data.xz"], &[b"whatever"]);
});

// An existing output is not overwritten without -f
add_test!(existing_output_needs_force, async {
    if !xz_available() {
        return;
    }
    let fixture = Fixture::with_files(
        &["input.txt", "input.txt.xz"],
        &[SAMPLE_TEXT.as_bytes(), b"old archive"],
    );

    let output = fixture.run(&[&fixture.path("input.txt")]).await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("Output file already exists"), "{}", output.stderr);
    fixture.assert_files(&["input.txt", "input.txt.xz"], &[SAMPLE_TEXT.as_bytes(), b"old archive"]);

    let output = fixture.run(&["-f", &fixture.path("input.txt")]).await;
    assert!(output.status.success(), "{}", output.stderr);
    assert!(fixture.read("input.txt.xz") != b"old archive");
});

// Corrupt archives fail to decompress and keep the input
add_test!(decompress_corrupt_archive, async {
    if !xz_available() {
        return;
    }
    let fixture = Fixture::with_file("broken.xz", b"this is not an xz stream");

    let output = fixture.run(&["-d", &fixture.path("broken.xz")]).await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("engine failed"), "{}", output.stderr);
    assert!(fixture.file_exists("broken.xz"));

    let output = fixture.run(&["-dc", &fixture.path("broken.xz")]).await;
    assert!(!output.status.success());
    assert!(output.stdout_raw.is_empty());
});

// Conflicting modes are rejected by the argument parser
add_test!(conflicting_modes, async {
    let fixture = Fixture::with_file("f.txt", b"x");

    let output = fixture.run(&["-d", "--check", &fixture.path("f.txt")]).await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("cannot be used with"), "{}", output.stderr);
});

// The engine may be missing altogether
add_test!(missing_engine, async {
    let fixture = Fixture::with_file("f.txt", b"x");
    let engine = fixture.root_dir_path().join("absent-xz");

    let output = fixture
        .run(&["--engine", engine.to_str().unwrap(), &fixture.path("f.txt")])
        .await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("cannot start engine"), "{}", output.stderr);
    assert!(fixture.file_exists("f.txt"));
});

// The engine can also be named through the environment
add_test!(engine_from_environment, async {
    let fixture = Fixture::with_file("f.txt", b"x");
    let engine = fixture.root_dir_path().join("env-xz");

    let output = fixture
        .run_with_engine_env(&[&fixture.path("f.txt")], &engine)
        .await;
    assert!(!output.status.success());
    assert!(output.stderr.contains("cannot start engine"), "{}", output.stderr);
    assert!(output.stderr.contains("env-xz"), "{}", output.stderr);
    assert!(fixture.file_exists("f.txt"));
});
