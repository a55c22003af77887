use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

const SHEET: &str = "\
sample\treplicate\tcondition\tfile
wt_1\t1\twt\twt_1.tsv
ko_1\t1\tko\tko_1.tsv
";

/// Totals 100 (wt) vs 200 (ko): wt becomes the reference, ko's factor is 0.5.
fn write_inputs(temp: &TempDir) -> anyhow::Result<std::path::PathBuf> {
    let sheet = temp.path().join("samples.tsv");
    fs::write(&sheet, SHEET)?;
    fs::write(
        temp.path().join("wt_1.tsv"),
        "chr1\t10000\t11000\t60\nchr1\t11000\t12000\t40\n",
    )?;
    fs::write(
        temp.path().join("ko_1.tsv"),
        "chr1\t10000\t11000\t150\nchr1\t12000\t13000\t50\n",
    )?;
    Ok(sheet)
}

#[test]
fn command_profile_normalized() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let sheet = write_inputs(&temp)?;

    let mut cmd = Command::cargo_bin("u4c")?;
    let output = cmd
        .arg("profile")
        .arg(&sheet)
        .arg("--viewpoint")
        .arg("chr1:401-600")
        .output()?;
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("# reference: wt\n"));
    assert!(stdout.contains("# factor: ko\t0.500000\n"));
    assert!(stdout.contains("# factor: wt\t1.000000\n"));

    // columns are sorted group labels: ko then wt
    assert!(stdout.contains("#chrom\tstart\tend\tko\twt\n"));
    assert!(stdout.contains("chr1\t10000\t11000\t75.0000\t60.0000\n"));
    // union grid zero-fills missing fragments
    assert!(stdout.contains("chr1\t11000\t12000\t0.0000\t40.0000\n"));
    assert!(stdout.contains("chr1\t12000\t13000\t25.0000\t0.0000\n"));

    Ok(())
}

#[test]
fn command_profile_group_by_sample_raw() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let sheet = write_inputs(&temp)?;

    let mut cmd = Command::cargo_bin("u4c")?;
    let output = cmd
        .arg("profile")
        .arg(&sheet)
        .arg("--viewpoint")
        .arg("chr1:401-600")
        .arg("--group-by")
        .arg("sample")
        .arg("--raw")
        .output()?;

    let stdout = String::from_utf8(output.stdout)?;
    // singleton groups keep the per-sample values untouched
    assert!(stdout.contains("#chrom\tstart\tend\tko_1\twt_1\n"));
    assert!(stdout.contains("chr1\t10000\t11000\t150\t60\n"));
    assert!(stdout.contains("chr1\t11000\t12000\t0\t40\n"));

    Ok(())
}

#[test]
fn command_profile_reference_override() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let sheet = write_inputs(&temp)?;

    let mut cmd = Command::cargo_bin("u4c")?;
    let output = cmd
        .arg("profile")
        .arg(&sheet)
        .arg("--viewpoint")
        .arg("chr1:401-600")
        .arg("--reference")
        .arg("ko")
        .output()?;
    let stdout = String::from_utf8(output.stdout)?;
    assert!(stdout.contains("# reference: ko\n"));
    assert!(stdout.contains("# factor: wt\t2.000000\n"));

    // an override that names no group is a configuration error
    let mut cmd = Command::cargo_bin("u4c")?;
    let output = cmd
        .arg("profile")
        .arg(&sheet)
        .arg("--viewpoint")
        .arg("chr1:401-600")
        .arg("--reference")
        .arg("mutant")
        .output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("configuration error"));
    assert!(stderr.contains("mutant"));

    Ok(())
}

#[test]
fn command_profile_empty_region_fails() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let sheet = write_inputs(&temp)?;

    // a viewpoint on another chromosome retains nothing
    let mut cmd = Command::cargo_bin("u4c")?;
    let output = cmd
        .arg("profile")
        .arg(&sheet)
        .arg("--viewpoint")
        .arg("chr9:401-600")
        .output()?;
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr)?;
    assert!(stderr.contains("empty result"));

    Ok(())
}
