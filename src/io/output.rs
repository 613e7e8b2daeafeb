use crate::scan::{ClassSummary, ScanReport};
use crate::signature::SkippedMethod;
use crate::table::{methods_frame, MethodRow, COLUMNS};
use clap::ValueEnum;
use colored::*;
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Markdown,
    Terminal,
}

/// Classes found in one file.
#[derive(Debug, Clone, Serialize)]
pub struct ClassListing {
    pub source: PathBuf,
    pub classes: Vec<ClassSummary>,
}

pub trait OutputWriter {
    fn write_methods(&mut self, reports: &[ScanReport], std_types: bool) -> anyhow::Result<()>;
    fn write_classes(&mut self, listings: &[ClassListing]) -> anyhow::Result<()>;
}

#[derive(Serialize)]
struct FileTables<'a> {
    source: &'a Path,
    classes: Vec<ClassTable<'a>>,
    skipped: &'a [SkippedMethod],
}

#[derive(Serialize)]
struct ClassTable<'a> {
    class: &'a str,
    rows: Vec<MethodRow>,
}

fn file_tables(report: &ScanReport, std_types: bool) -> FileTables<'_> {
    FileTables {
        source: &report.source,
        classes: report
            .classes
            .iter()
            .map(|record| ClassTable {
                class: &record.qualified_name,
                rows: methods_frame(record, std_types),
            })
            .collect(),
        skipped: &report.skipped,
    }
}

pub struct JsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> JsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for JsonWriter<W> {
    fn write_methods(&mut self, reports: &[ScanReport], std_types: bool) -> anyhow::Result<()> {
        let tables: Vec<_> = reports
            .iter()
            .map(|report| file_tables(report, std_types))
            .collect();
        serde_json::to_writer_pretty(&mut self.writer, &tables)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }

    fn write_classes(&mut self, listings: &[ClassListing]) -> anyhow::Result<()> {
        serde_json::to_writer_pretty(&mut self.writer, listings)?;
        writeln!(self.writer)?;
        self.writer.flush()?;
        Ok(())
    }
}

pub struct MarkdownWriter<W: Write> {
    writer: W,
}

impl<W: Write> MarkdownWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    fn write_row(&mut self, cells: &[String]) -> anyhow::Result<()> {
        writeln!(self.writer, "| {} |", cells.join(" | "))?;
        Ok(())
    }

    fn write_skipped(&mut self, skipped: &[SkippedMethod]) -> anyhow::Result<()> {
        if skipped.is_empty() {
            return Ok(());
        }
        writeln!(self.writer, "### Skipped methods")?;
        writeln!(self.writer)?;
        for method in skipped {
            writeln!(
                self.writer,
                "- `{}::{}`: {}",
                method.class, method.method, method.reason
            )?;
        }
        writeln!(self.writer)?;
        Ok(())
    }
}

impl<W: Write> OutputWriter for MarkdownWriter<W> {
    fn write_methods(&mut self, reports: &[ScanReport], std_types: bool) -> anyhow::Result<()> {
        for report in reports {
            writeln!(self.writer, "# {}", report.source.display())?;
            writeln!(self.writer)?;
            for record in &report.classes {
                writeln!(self.writer, "## {}", record.qualified_name)?;
                writeln!(self.writer)?;
                let header: Vec<String> = COLUMNS.iter().map(|c| c.to_string()).collect();
                self.write_row(&header)?;
                let rule: Vec<String> = COLUMNS.iter().map(|c| "-".repeat(c.len())).collect();
                self.write_row(&rule)?;
                for row in methods_frame(record, std_types) {
                    self.write_row(&row.cells())?;
                }
                writeln!(self.writer)?;
            }
            self.write_skipped(&report.skipped)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_classes(&mut self, listings: &[ClassListing]) -> anyhow::Result<()> {
        for listing in listings {
            writeln!(self.writer, "# {}", listing.source.display())?;
            writeln!(self.writer)?;
            for class in &listing.classes {
                writeln!(
                    self.writer,
                    "- `{}` ({}, line {})",
                    class.qualified_name, class.kind, class.location.line
                )?;
            }
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

pub struct TerminalWriter<W: Write> {
    writer: W,
}

impl<W: Write> TerminalWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }
}

impl<W: Write> OutputWriter for TerminalWriter<W> {
    fn write_methods(&mut self, reports: &[ScanReport], std_types: bool) -> anyhow::Result<()> {
        for report in reports {
            writeln!(self.writer, "{}", report.source.display().to_string().bold().blue())?;
            for record in &report.classes {
                writeln!(
                    self.writer,
                    "{} {} ({} methods, {} signatures)",
                    "class".green(),
                    record.qualified_name.bold(),
                    record.methods.len(),
                    record.signature_count()
                )?;

                let mut table = Table::new();
                table.load_preset(UTF8_FULL);
                table.set_header(COLUMNS.to_vec());
                for row in methods_frame(record, std_types) {
                    table.add_row(row.cells().iter().map(Cell::new).collect::<Vec<_>>());
                }
                writeln!(self.writer, "{table}")?;
            }
            for method in &report.skipped {
                writeln!(
                    self.writer,
                    "{} {}::{}: {}",
                    "skipped".yellow(),
                    method.class,
                    method.method,
                    method.reason
                )?;
            }
            writeln!(self.writer)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    fn write_classes(&mut self, listings: &[ClassListing]) -> anyhow::Result<()> {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["class", "kind", "location"]);
        for listing in listings {
            for class in &listing.classes {
                table.add_row(vec![
                    Cell::new(&class.qualified_name),
                    Cell::new(class.kind),
                    Cell::new(format!(
                        "{}:{}",
                        class.location.path.display(),
                        class.location.line
                    )),
                ]);
            }
        }
        writeln!(self.writer, "{table}")?;
        self.writer.flush()?;
        Ok(())
    }
}

pub fn create_writer<'a>(format: OutputFormat, writer: Box<dyn Write + 'a>) -> Box<dyn OutputWriter + 'a> {
    match format {
        OutputFormat::Json => Box::new(JsonWriter::new(writer)),
        OutputFormat::Markdown => Box::new(MarkdownWriter::new(writer)),
        OutputFormat::Terminal => Box::new(TerminalWriter::new(writer)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::TranslationUnitBuilder;
    use crate::ast::TypeKind;
    use crate::signature::ClassAggregator;
    use crate::testkit;

    fn report() -> ScanReport {
        let mut builder = TranslationUnitBuilder::new("dac.hpp");
        let root = builder.root();
        let class = testkit::add_class(&mut builder, root, "Dac");
        let int = builder.builtin(TypeKind::Int);
        testkit::add_method(&mut builder, class, "set_level", TypeKind::Void, &[("level", int)]);
        let tu = builder.finish();
        let (record, skipped) = ClassAggregator::default()
            .class_record("hw::Dac", tu.cursor_at(class))
            .unwrap();
        ScanReport {
            source: PathBuf::from("dac.hpp"),
            classes: vec![record],
            skipped,
        }
    }

    #[test]
    fn test_json_methods() {
        let mut buffer = Vec::new();
        JsonWriter::new(&mut buffer)
            .write_methods(&[report()], true)
            .unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        let row = &value[0]["classes"][0]["rows"][0];
        assert_eq!(value[0]["classes"][0]["class"], "hw::Dac");
        assert_eq!(row["camel_name"], "SetLevel");
        assert_eq!(row["atom_type"], "int32_t");
        assert!(row["return_atom_type"].is_null());
    }

    #[test]
    fn test_markdown_methods() {
        let mut buffer = Vec::new();
        MarkdownWriter::new(&mut buffer)
            .write_methods(&[report()], false)
            .unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("## hw::Dac"));
        assert!(text.contains("| method_i | method_name |"));
        assert!(text.contains("| 0 | set_level | SetLevel | void | 0 | 1 | 0 | level | int32 | 0 |"));
    }

    #[test]
    fn test_terminal_methods() {
        colored::control::set_override(false);
        let mut buffer = Vec::new();
        TerminalWriter::new(&mut buffer)
            .write_methods(&[report()], true)
            .unwrap();

        let text = String::from_utf8(buffer).unwrap();
        assert!(text.contains("class hw::Dac (1 methods, 1 signatures)"));
        assert!(text.contains("SetLevel"));
    }
}
