//! C++ frontend: parses headers with tree-sitter and lowers them into a
//! [`TranslationUnit`].

pub mod args;
pub mod builtins;
mod lower;
pub mod parser;

pub use args::{CompilerArgs, SourceLanguage, DEFAULT_ARGS};

use crate::ast::{TranslationUnit, TypeKind};
use crate::errors::{Error, Result};
use indexmap::IndexMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Parsing context shared by every translation unit of a run.
#[derive(Debug, Clone, Default)]
pub struct Index {
    args: CompilerArgs,
    /// Extra typedef names resolved to builtins without a declaration.
    typedefs: IndexMap<String, TypeKind>,
}

impl Index {
    pub fn new<S: AsRef<str>>(args: &[S]) -> Result<Self> {
        Ok(Self {
            args: CompilerArgs::parse(args)?,
            typedefs: IndexMap::new(),
        })
    }

    /// Register typedef names by the builtin spelling they stand for
    /// (`"real_t" => "double"`).
    pub fn with_typedefs<'a, I>(mut self, typedefs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a String, &'a String)>,
    {
        for (name, spelling) in typedefs {
            let kind = builtins::kind_from_spelling(spelling).ok_or_else(|| {
                Error::Configuration(format!(
                    "typedef `{name}` maps to `{spelling}`, which is not a builtin type"
                ))
            })?;
            self.typedefs.insert(name.clone(), kind);
        }
        Ok(self)
    }

    pub fn args(&self) -> &CompilerArgs {
        &self.args
    }

    /// Parse `path`, failing when the file has any error diagnostic.
    pub fn parse(&self, path: &Path) -> Result<TranslationUnit> {
        let source = read_source(path)?;
        self.parse_source(&source, path)
    }

    /// Parse `path` and keep the tree even when it has errors.
    pub fn parse_lenient(&self, path: &Path) -> Result<TranslationUnit> {
        let source = read_source(path)?;
        self.parse_source_lenient(&source, path)
    }

    pub fn parse_source(&self, source: &str, path: &Path) -> Result<TranslationUnit> {
        let tu = self.parse_source_lenient(source, path)?;
        if tu.has_errors() {
            let diagnostics = tu
                .diagnostics()
                .iter()
                .filter(|diagnostic| diagnostic.is_error())
                .cloned()
                .collect();
            return Err(Error::ParseFailure {
                path: path.to_path_buf(),
                diagnostics,
            });
        }
        Ok(tu)
    }

    pub fn parse_source_lenient(&self, source: &str, path: &Path) -> Result<TranslationUnit> {
        let tu = lower::lower(path, source, &self.args, &self.typedefs)?;
        for diagnostic in tu.diagnostics() {
            if diagnostic.is_error() {
                warn!(
                    path = %diagnostic.location.path.display(),
                    line = diagnostic.location.line,
                    "{}",
                    diagnostic.message
                );
            } else {
                debug!(
                    path = %diagnostic.location.path.display(),
                    line = diagnostic.location.line,
                    "{}",
                    diagnostic.message
                );
            }
        }
        debug!(path = %path.display(), diagnostics = tu.diagnostics().len(), "parsed translation unit");
        Ok(tu)
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map_err(|err| Error::file_system(format!("cannot read {}", path.display()), path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Cursor, CursorKind};
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn lower(source: &str) -> TranslationUnit {
        Index::default()
            .parse_source(source, Path::new("test.hpp"))
            .unwrap()
    }

    fn find<'tu>(cursor: Cursor<'tu>, kind: CursorKind, name: &str) -> Option<Cursor<'tu>> {
        if cursor.kind() == kind && cursor.spelling() == name {
            return Some(cursor);
        }
        cursor.children().find_map(|child| find(child, kind, name))
    }

    #[test]
    fn test_namespaces_and_classes() {
        let tu = lower(indoc! {"
            namespace hw { namespace dac {
            class Channel {
            public:
                void set_gain(double gain);
                double gain() const;
            };
            } }
        "});
        let class = find(tu.cursor(), CursorKind::ClassDecl, "Channel").unwrap();
        let parent = class.semantic_parent().unwrap();
        assert_eq!(parent.kind(), CursorKind::Namespace);
        assert_eq!(parent.spelling(), "dac");

        let methods: Vec<_> = class.children().map(|c| c.display_name().to_string()).collect();
        assert_eq!(methods, vec!["set_gain(double)", "gain()"]);
    }

    #[test]
    fn test_nested_namespace_definition() {
        let tu = lower("namespace a::b { class Foo {}; }");
        let a = find(tu.cursor(), CursorKind::Namespace, "a").unwrap();
        let b = a.children().next().unwrap();
        assert_eq!(b.spelling(), "b");
        assert_eq!(b.children().next().unwrap().spelling(), "Foo");
    }

    #[test]
    fn test_parameter_types() {
        let tu = lower(indoc! {"
            class Buffer {
            public:
                void fill(const double* values, unsigned int count, uint32_t& out);
            };
        "});
        let fill = find(tu.cursor(), CursorKind::CxxMethod, "fill").unwrap();
        let arguments: Vec<_> = fill.arguments().collect();
        assert_eq!(arguments.len(), 3);
        assert_eq!(arguments[0].spelling(), "values");

        let values = arguments[0].cursor_type().unwrap();
        assert_eq!(values.kind(), TypeKind::Pointer);
        assert_eq!(values.pointee().unwrap().canonical().kind(), TypeKind::Double);

        let count = arguments[1].cursor_type().unwrap();
        assert_eq!(count.kind(), TypeKind::UInt);

        let out = arguments[2].cursor_type().unwrap();
        assert_eq!(out.kind(), TypeKind::LValueReference);
        assert_eq!(fill.display_name(), "fill(const double *, unsigned int, uint32_t &)");
    }

    #[test]
    fn test_stdint_typedef_is_elaborated_builtin() {
        let tu = lower("class A { public: uint8_t read(); };");
        let read = find(tu.cursor(), CursorKind::CxxMethod, "read").unwrap();
        let result = read.result_type().unwrap();
        assert_eq!(result.kind(), TypeKind::Elaborated);
        assert_eq!(result.canonical().kind(), TypeKind::UChar);
    }

    #[test]
    fn test_typedef_anonymous_struct_takes_typedef_name() {
        let tu = lower(indoc! {"
            typedef struct {
                uint32_t length;
                double* data;
            } DoubleArray;
            class Sampler { public: DoubleArray samples(); };
        "});
        let samples = find(tu.cursor(), CursorKind::CxxMethod, "samples").unwrap();
        let result = samples.result_type().unwrap();
        let record = result.canonical();
        assert_eq!(record.kind(), TypeKind::Record);
        let declaration = record.declaration().unwrap();
        assert_eq!(declaration.spelling(), "DoubleArray");
        let fields: Vec<_> = declaration.children().map(|c| c.spelling().to_string()).collect();
        assert_eq!(fields, vec!["length", "data"]);
    }

    #[test]
    fn test_out_of_line_definition_is_linked() {
        let tu = lower(indoc! {"
            class Motor {
            public:
                int step(int count);
            };
            int Motor::step(int steps) { return steps; }
        "});
        let class = find(tu.cursor(), CursorKind::ClassDecl, "Motor").unwrap();
        let declaration = class.children().next().unwrap();
        let definition = declaration.definition().unwrap();
        assert_ne!(definition.id(), declaration.id());
        assert_eq!(definition.semantic_parent().unwrap().id(), class.id());
        assert_eq!(definition.arguments().next().unwrap().spelling(), "steps");
    }

    #[test]
    fn test_unmatched_out_of_line_definition_is_an_error() {
        let source = indoc! {"
            class Motor { public: int step(int count); };
            int Motor::step(double count) { return 0; }
        "};
        let err = Index::default()
            .parse_source(source, Path::new("motor.cpp"))
            .unwrap_err();
        match err {
            Error::ParseFailure { diagnostics, .. } => {
                assert!(diagnostics[0].message.contains("does not match"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_pure_virtual_and_special_members() {
        let tu = lower(indoc! {"
            class Sensor {
            public:
                Sensor(int pin);
                virtual ~Sensor();
                virtual double read(int channel) = 0;
                operator bool() const;
            };
        "});
        let class = find(tu.cursor(), CursorKind::ClassDecl, "Sensor").unwrap();
        let kinds: Vec<_> = class.children().map(|c| c.kind()).collect();
        assert_eq!(
            kinds,
            vec![
                CursorKind::Constructor,
                CursorKind::Destructor,
                CursorKind::CxxMethod,
                CursorKind::ConversionFunction,
            ]
        );
        let read = find(tu.cursor(), CursorKind::CxxMethod, "read").unwrap();
        assert!(read.is_pure_virtual());
    }

    #[test]
    fn test_unknown_type_is_a_warning() {
        let source = "class A { public: Missing get(); };";
        let tu = Index::default()
            .parse_source(source, Path::new("a.hpp"))
            .unwrap();
        let get = find(tu.cursor(), CursorKind::CxxMethod, "get").unwrap();
        assert_eq!(get.result_type().unwrap().kind(), TypeKind::Invalid);

        let diagnostic = &tu.diagnostics()[0];
        assert!(!diagnostic.is_error());
        assert_eq!(diagnostic.message, "unknown type name 'Missing'");
    }

    #[test]
    fn test_invalid_specifier_fails_strict_parse() {
        let source = "class A { public: short double get(); };";
        let index = Index::default();
        assert!(matches!(
            index.parse_source(source, Path::new("a.hpp")),
            Err(Error::ParseFailure { .. })
        ));
        assert!(index.parse_source_lenient(source, Path::new("a.hpp")).is_ok());
    }

    #[test]
    fn test_conditional_blocks_follow_defines() {
        let source = indoc! {"
            class Board {
            public:
            #ifdef WITH_DAC
                void set_dac(int value);
            #else
                void no_dac();
            #endif
            };
        "};
        let plain = lower(source);
        assert!(find(plain.cursor(), CursorKind::CxxMethod, "no_dac").is_some());
        assert!(find(plain.cursor(), CursorKind::CxxMethod, "set_dac").is_none());

        let tu = Index::new(&["-DWITH_DAC"])
            .unwrap()
            .parse_source(source, Path::new("board.hpp"))
            .unwrap();
        assert!(find(tu.cursor(), CursorKind::CxxMethod, "set_dac").is_some());
        assert!(find(tu.cursor(), CursorKind::CxxMethod, "no_dac").is_none());
    }

    #[test]
    fn test_configured_typedefs() {
        let typedefs: IndexMap<String, String> =
            [("real_t".to_string(), "double".to_string())].into_iter().collect();
        let index = Index::default().with_typedefs(&typedefs).unwrap();
        let tu = index
            .parse_source("class A { public: real_t get(); };", Path::new("a.hpp"))
            .unwrap();
        let get = find(tu.cursor(), CursorKind::CxxMethod, "get").unwrap();
        assert_eq!(get.result_type().unwrap().canonical().kind(), TypeKind::Double);

        let bad: IndexMap<String, String> =
            [("thing".to_string(), "Widget".to_string())].into_iter().collect();
        assert!(matches!(
            Index::default().with_typedefs(&bad),
            Err(Error::Configuration(_))
        ));
    }

    #[test]
    fn test_missing_file_is_filesystem_error() {
        let err = Index::default()
            .parse(&PathBuf::from("/nonexistent/cppsig/missing.hpp"))
            .unwrap_err();
        assert!(matches!(err, Error::FileSystem { .. }));
    }
}
