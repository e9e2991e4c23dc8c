use std::{
    fs,
    io::Write,
    path::{Component, Path, PathBuf},
};

use anyhow::{bail, Context, Result};

use crate::codegen::{CodegenFile, CodegenMessage};

/// Pretty-print generated Rust sources. Anything that isn't a `.rs` file, or doesn't parse, is
/// returned unchanged.
pub fn format_source(name: &str, content: &str) -> String {
    if Path::new(name).extension().map_or(true, |ext| ext != "rs") {
        return content.to_owned();
    }
    match syn::parse_file(content) {
        Ok(file) => prettyplease::unparse(&file),
        Err(err) => {
            log::warn!(target: "hypertune_gen", "failed to format {name}: {err}");
            content.to_owned()
        }
    }
}

/// Write every file below `dir`, overwriting existing ones, and report each path to `out`.
///
/// A relative `dir` is resolved against `cwd` for writing but reported as given.
pub fn write_files(
    cwd: &Path,
    dir: &Path,
    files: &[CodegenFile],
    out: &mut impl Write,
) -> Result<()> {
    fs::create_dir_all(cwd.join(dir)).context("failed to create output directory")?;

    for file in files {
        let display_path = dir.join(relative_path(&file.name)?);
        let path = cwd.join(&display_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory for {}", file.name))?;
        }
        fs::write(&path, format_source(&file.name, &file.content))
            .with_context(|| format!("failed to write file {}", file.name))?;
        writeln!(out, "Created file {}", display_path.display())?;
    }
    Ok(())
}

/// File names come from the server; keep them inside the output directory.
fn relative_path(name: &str) -> Result<PathBuf> {
    let path = Path::new(name);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if name.is_empty() || escapes {
        bail!("refusing to write file with unsafe name {name:?}");
    }
    Ok(path.to_path_buf())
}

/// Print server messages as `level message`, followed by indented metadata if there is any.
pub fn print_messages(messages: &[CodegenMessage], out: &mut impl Write) -> Result<()> {
    for message in messages {
        writeln!(out, "{} {}", message.level, message.message)?;
        if let Some(metadata) = message.metadata.as_ref().filter(|m| !m.is_null()) {
            writeln!(out, "{}", serde_json::to_string_pretty(metadata)?)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use serde_json::json;

    use super::{format_source, print_messages, write_files};
    use crate::codegen::{CodegenFile, CodegenMessage, LogLevel};

    fn file(name: &str, content: &str) -> CodegenFile {
        CodegenFile {
            name: name.to_owned(),
            content: content.to_owned(),
        }
    }

    #[test]
    fn formats_rust_sources() {
        assert_eq!(format_source("client.rs", "pub fn x(){}"), "pub fn x() {}\n");
    }

    #[test]
    fn keeps_unparseable_sources() {
        assert_eq!(format_source("client.rs", "pub fn {"), "pub fn {");
    }

    #[test]
    fn leaves_other_files_alone() {
        assert_eq!(format_source("schema.json", "{ }"), "{ }");
        assert_eq!(format_source("README", "pub fn x(){}"), "pub fn x(){}");
    }

    #[test]
    fn writes_files_and_reports_them() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("generated");
        let mut out = Vec::new();

        write_files(
            dir.path(),
            Path::new("generated"),
            &[file("client.rs", "pub fn x(){}"), file("nested/data.json", "{}")],
            &mut out,
        )
        .unwrap();

        assert_eq!(
            fs::read_to_string(output.join("client.rs")).unwrap(),
            "pub fn x() {}\n"
        );
        assert_eq!(fs::read_to_string(output.join("nested/data.json")).unwrap(), "{}");

        let out = String::from_utf8(out).unwrap();
        let expected = format!("Created file {}", Path::new("generated").join("client.rs").display());
        assert_eq!(out.lines().next(), Some(expected.as_str()));
        assert_eq!(out.lines().count(), 2);
    }

    #[test]
    fn overwrites_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("client.rs"), "old").unwrap();

        write_files(dir.path(), Path::new("."), &[file("client.rs", "new")], &mut Vec::new())
            .unwrap();
        assert_eq!(fs::read_to_string(dir.path().join("client.rs")).unwrap(), "new");
    }

    #[test]
    fn rejects_paths_outside_the_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let output = Path::new("generated");

        for name in ["../escape.rs", "/etc/passwd", ""] {
            assert!(
                write_files(dir.path(), output, &[file(name, "x")], &mut Vec::new()).is_err(),
                "{name:?}"
            );
        }
        assert!(!dir.path().join("escape.rs").exists());
    }

    #[test]
    fn prints_messages_with_metadata() {
        let messages = vec![
            CodegenMessage {
                level: LogLevel::Warn,
                message: "deprecated field".to_owned(),
                metadata: Some(json!({"field": "a"})),
            },
            CodegenMessage {
                level: LogLevel::Info,
                message: "done".to_owned(),
                metadata: None,
            },
        ];
        let mut out = Vec::new();
        print_messages(&messages, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Warn deprecated field\n{\n  \"field\": \"a\"\n}\nInfo done\n"
        );
    }
}
