//! Integration tests for the calctex binary

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

const CONTENT: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-content><office:body><office:spreadsheet>
<table:table table:name="Calc">
<table:table-row>
<table:table-cell office:value-type="string"><text:p>data</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>texput</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>description</text:p></table:table-cell>
</table:table-row>
<table:table-row>
<table:table-cell office:value-type="float" office:value="5"><text:p>5</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>a</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>length</text:p></table:table-cell>
</table:table-row>
<table:table-row>
<table:table-cell table:formula="of:=[.A2]*2" office:value-type="float" office:value="10"><text:p>10</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>b</text:p></table:table-cell>
<table:table-cell office:value-type="string"><text:p>double length</text:p></table:table-cell>
</table:table-row>
</table:table>
</office:spreadsheet></office:body></office:document-content>
"#;

struct Fixture {
    dir: tempfile::TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let file = std::fs::File::create(dir.path().join("calc.ods")).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("content.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(CONTENT.as_bytes()).unwrap();
        writer.finish().unwrap();
        // An explicit empty config keeps the user's config.toml out of the tests.
        std::fs::write(dir.path().join("config.toml"), "").unwrap();
        Fixture { dir }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn run_calctex(cwd: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_calctex"))
        .current_dir(cwd)
        .env_remove("CALCTEX_LOG")
        .args(args)
        .output()
        .expect("Failed to execute calctex");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(-1);

    (stdout, stderr, exit_code)
}

#[test]
fn test_renders_to_explicit_tex_file() {
    let fx = Fixture::new();
    let (stdout, stderr, code) = run_calctex(
        fx.dir.path(),
        &["calc.ods", "Calc", "-t", "out.tex", "-c", "config.toml"],
    );
    assert_eq!(code, 0, "stderr: {}", stderr);

    let text = std::fs::read_to_string(fx.path("out.tex")).unwrap();
    assert!(text.starts_with("Length $a = 5$.\n\n"));
    assert!(text.contains("\t= 5 \\cdot 2\n"));

    let expected = format!(
        "Calc : 3 x 3\n\nWritten {} bytes in 'out.tex'\n",
        text.len()
    );
    assert_eq!(stdout, expected);
    assert!(stderr.is_empty());
}

#[test]
fn test_default_output_file() {
    let fx = Fixture::new();
    let (_, stderr, code) = run_calctex(fx.dir.path(), &["calc.ods", "Calc", "-c", "config.toml"]);
    assert_eq!(code, 0, "stderr: {}", stderr);
    assert!(fx.path("data_calc.tex").exists());
}

#[test]
fn test_quiet_prints_nothing() {
    let fx = Fixture::new();
    let (stdout, stderr, code) = run_calctex(
        fx.dir.path(),
        &["-q", "calc.ods", "Calc", "-c", "config.toml"],
    );
    assert_eq!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.is_empty());
    assert!(fx.path("data_calc.tex").exists());
}

#[test]
fn test_config_file_changes_output() {
    let fx = Fixture::new();
    std::fs::write(
        fx.path("config.toml"),
        "language = \"ru\"\n[render]\nuse_equation_numbers = false\n",
    )
    .unwrap();
    let (_, stderr, code) = run_calctex(fx.dir.path(), &["calc.ods", "Calc", "-c", "config.toml"]);
    assert_eq!(code, 0, "stderr: {}", stderr);

    let text = std::fs::read_to_string(fx.path("data_calc.tex")).unwrap();
    assert!(text.contains("по формуле"));
    assert!(text.contains("\\begin{equation*}"));
}

#[test]
fn test_missing_sheet_fails() {
    let fx = Fixture::new();
    let (_, stderr, code) = run_calctex(
        fx.dir.path(),
        &["calc.ods", "Other", "-c", "config.toml"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("Error:"));
    assert!(stderr.contains("Other"));
    assert!(!fx.path("data_calc.tex").exists());
}

#[test]
fn test_missing_input_fails() {
    let fx = Fixture::new();
    let (_, stderr, code) = run_calctex(
        fx.dir.path(),
        &["nope.ods", "Calc", "-c", "config.toml"],
    );
    assert_eq!(code, 1);
    assert!(stderr.contains("nope.ods"));
}

#[test]
fn test_help() {
    let fx = Fixture::new();
    let (_, stderr, code) = run_calctex(fx.dir.path(), &["--help"]);
    assert_eq!(code, 0);
    assert!(stderr.contains("Usage: calctex"));
}

#[test]
fn test_missing_arguments() {
    let fx = Fixture::new();
    let (_, stderr, code) = run_calctex(fx.dir.path(), &["calc.ods"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Expected an ODS file and a sheet name"));
}

#[test]
fn test_unknown_option() {
    let fx = Fixture::new();
    let (_, stderr, code) = run_calctex(fx.dir.path(), &["calc.ods", "Calc", "--bogus"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Unknown option: --bogus"));
}
