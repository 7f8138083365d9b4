use assert_cmd::prelude::*;
use assert_cmd::Command;
use predicates::prelude::*;

type STDRESULT = Result<(), Box<dyn std::error::Error>>;

const SAMPLE: &[u8] =
    b"I am Sam. Sam I am. I do not like this Sam I am.\nI do not like them here or there,\nI do not like them anywhere.";

#[test]
fn compress_then_expand_round_trips_through_files() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let src_path = dir.path().join("input.txt");
    let lz_path = dir.path().join("input.lz78");
    let out_path = dir.path().join("output.txt");
    std::fs::write(&src_path, SAMPLE)?;

    Command::cargo_bin("lz78")?
        .arg("compress")
        .arg("-i").arg(&src_path)
        .arg("-o").arg(&lz_path)
        .assert()
        .success();

    Command::cargo_bin("lz78")?
        .arg("expand")
        .arg("-i").arg(&lz_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();

    assert_eq!(std::fs::read(&out_path)?, SAMPLE);
    Ok(())
}

#[test]
fn round_trips_through_stdin_and_stdout() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let lz_path = dir.path().join("piped.lz78");

    Command::cargo_bin("lz78")?
        .arg("compress")
        .arg("-o").arg(&lz_path)
        .write_stdin(SAMPLE)
        .assert()
        .success();

    let expand_assert = Command::cargo_bin("lz78")?
        .arg("expand")
        .arg("-i").arg(&lz_path)
        .assert()
        .success();
    assert_eq!(expand_assert.get_output().stdout, SAMPLE);
    Ok(())
}

#[test]
fn rejects_identical_input_and_output_paths() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("same.txt");
    std::fs::write(&path, SAMPLE)?;

    Command::cargo_bin("lz78")?
        .arg("compress")
        .arg("-i").arg(&path)
        .arg("-o").arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("must differ"));
    Ok(())
}

#[test]
fn md5_flag_survives_round_trip() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let src_path = dir.path().join("input.txt");
    let lz_path = dir.path().join("input.lz78");
    let out_path = dir.path().join("output.txt");
    std::fs::write(&src_path, SAMPLE)?;

    Command::cargo_bin("lz78")?
        .arg("compress")
        .arg("-m")
        .arg("-i").arg(&src_path)
        .arg("-o").arg(&lz_path)
        .assert()
        .success();

    Command::cargo_bin("lz78")?
        .arg("expand")
        .arg("-i").arg(&lz_path)
        .arg("-o").arg(&out_path)
        .assert()
        .success();

    assert_eq!(std::fs::read(&out_path)?, SAMPLE);
    Ok(())
}

#[test]
fn corrupted_stream_fails_expansion_cleanly() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let src_path = dir.path().join("input.txt");
    let lz_path = dir.path().join("input.lz78");
    let out_path = dir.path().join("output.txt");
    std::fs::write(&src_path, SAMPLE)?;

    Command::cargo_bin("lz78")?
        .arg("compress")
        .arg("-i").arg(&src_path)
        .arg("-o").arg(&lz_path)
        .assert()
        .success();

    let bytes = std::fs::read(&lz_path)?;
    let truncated = &bytes[..bytes.len() / 2];
    std::fs::write(&lz_path, truncated)?;

    Command::cargo_bin("lz78")?
        .arg("expand")
        .arg("-i").arg(&lz_path)
        .arg("-o").arg(&out_path)
        .assert()
        .failure();
    Ok(())
}

#[test]
fn expand_restores_original_filename_when_o_is_omitted() -> STDRESULT {
    let dir = tempfile::tempdir()?;
    let src_path = dir.path().join("poem.txt");
    let lz_path = dir.path().join("poem.lz78");
    std::fs::write(&src_path, SAMPLE)?;

    Command::cargo_bin("lz78")?
        .arg("compress")
        .arg("-n")
        .arg("-i").arg(&src_path)
        .arg("-o").arg(&lz_path)
        .assert()
        .success();

    Command::cargo_bin("lz78")?
        .arg("expand")
        .arg("-f")
        .arg("-i").arg(&lz_path)
        .current_dir(dir.path())
        .assert()
        .success();

    assert_eq!(std::fs::read(&src_path)?, SAMPLE);
    Ok(())
}
