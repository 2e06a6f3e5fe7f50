//! Legacy package through fix, re-check, and build.

use std::path::{Path, PathBuf};

use quire_cli::build::{run_build, BuildArgs};
use quire_cli::check::{run_check, CheckArgs};
use quire_cli::config::QuireConfig;
use quire_cli::fix::{run_fix, FixArgs};
use quire_cli::verify::{run_verify, VerifyArgs};

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

/// Structure and title are in place; head metadata and doctype are not.
fn near_template_chapter(numeral: &str) -> String {
    let body = "<p>Good work is quiet work, repeated until it becomes second nature.</p>\n"
        .repeat(50);
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html>
<head>
  <meta charset="utf-8" />
  <title>Chapter {numeral}</title>
</head>
<body>
  <div class="chapter-number-container">{numeral}</div>
  <div class="chapter-title-container"><span class="chapter-title-word">Craft</span></div>
  {body}
</body>
</html>"#
    )
}

#[test]
fn fix_brings_package_into_compliance_and_builds() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    let config = QuireConfig::default();

    write(root, "book/mimetype", "application/epub+zip");
    write(root, "book/META-INF/container.xml", "<container/>");
    write(root, "book/OEBPS/content.opf", "<package/>");
    for numeral in ["iii", "i", "ii"] {
        write(
            root,
            &format!("book/OEBPS/text/chapter-{numeral}.xhtml"),
            &near_template_chapter(numeral),
        );
    }

    let check = |dir: &str| CheckArgs {
        dir: PathBuf::from(dir),
        report: PathBuf::from("report.json"),
        workers: 2,
    };
    assert_eq!(run_check(&check("book"), &config, root).unwrap(), 2);

    let fix = FixArgs {
        dir: PathBuf::from("book"),
        out_dir: PathBuf::from("fixed/OEBPS/text"),
    };
    assert_eq!(run_fix(&fix, &config, root).unwrap(), 0);
    assert_eq!(run_check(&check("fixed"), &config, root).unwrap(), 0);

    // Swap the remediated chapters into the package and build it.
    for entry in std::fs::read_dir(root.join("fixed/OEBPS/text")).unwrap() {
        let entry = entry.unwrap();
        std::fs::copy(
            entry.path(),
            root.join("book/OEBPS/text").join(entry.file_name()),
        )
        .unwrap();
    }
    assert_eq!(run_check(&check("book"), &config, root).unwrap(), 0);

    let build = BuildArgs {
        source: PathBuf::from("book"),
        output: Some(PathBuf::from("book.epub")),
    };
    assert_eq!(run_build(&build, root).unwrap(), 0);

    let verify = VerifyArgs {
        file: PathBuf::from("book.epub"),
        list: false,
    };
    assert_eq!(run_verify(&verify, root).unwrap(), 0);
}
