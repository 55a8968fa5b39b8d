use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*;
use std::io::Write;
use std::process::Command; // Run programs
type STDRESULT = Result<(), Box<dyn std::error::Error>>;

fn roundtrip(data: &[u8]) -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("in.bin");
    let z_path = temp_dir.path().join("z.bin");
    let out_path = temp_dir.path().join("out.bin");
    std::fs::File::create(&in_path)?.write_all(data)?;

    Command::cargo_bin("huffstream")?
        .arg("-c")
        .arg(&in_path)
        .arg(&z_path)
        .assert()
        .success();

    Command::cargo_bin("huffstream")?
        .arg("-d")
        .arg(&z_path)
        .arg(&out_path)
        .assert()
        .success();

    let back = std::fs::read(&out_path)?;
    assert_eq!(back, data);
    Ok(())
}

#[test]
fn compress_then_expand_small_text() -> STDRESULT {
    roundtrip(b"the quick brown fox jumps over the lazy dog")
}

#[test]
fn compress_then_expand_empty_file() -> STDRESULT {
    roundtrip(b"")
}

#[test]
fn compress_then_expand_single_symbol() -> STDRESULT {
    roundtrip(b"AAAAAAAAAAAAAAAA")
}

#[test]
fn expand_alias_matches_decompress() -> STDRESULT {
    let temp_dir = tempfile::tempdir()?;
    let in_path = temp_dir.path().join("in.bin");
    let z_path = temp_dir.path().join("z.bin");
    let out_path = temp_dir.path().join("out.bin");
    std::fs::File::create(&in_path)?.write_all(b"AABBCCDD")?;

    Command::cargo_bin("huffstream")?
        .arg("-c")
        .arg(&in_path)
        .arg(&z_path)
        .assert()
        .success();

    Command::cargo_bin("huffstream")?
        .arg("-x")
        .arg(&z_path)
        .arg(&out_path)
        .assert()
        .success();

    assert_eq!(std::fs::read(out_path)?, b"AABBCCDD");
    Ok(())
}

#[test]
fn conflicting_flags_is_a_usage_error() -> STDRESULT {
    Command::cargo_bin("huffstream")?
        .arg("-c")
        .arg("-d")
        .assert()
        .failure();
    Ok(())
}

#[test]
fn missing_input_file_fails_cleanly() {
    Command::cargo_bin("huffstream")
        .unwrap()
        .arg("-c")
        .arg("tests/does_not_exist.bin")
        .assert()
        .failure()
        .stderr(predicate::str::is_empty().not());
}
