//! Headers pulled in through `#include`, include directories and
//! preprocessor conditionals.

mod common;

use common::Fixture;
use cppsig::{CollisionPolicy, Error, ScanOptions, Scanner};
use indoc::indoc;
use pretty_assertions::assert_eq;

const ARRAYS: &str = indoc! {"
    #ifndef ARRAYS_HPP
    #define ARRAYS_HPP
    #include <cstdint>

    namespace hw {
    struct Int16Array {
        uint32_t length;
        int16_t* data;
    };
    }

    #endif
"};

#[test]
fn test_quoted_include_next_to_source() {
    let fixture = Fixture::new();
    fixture.write("arrays.hpp", ARRAYS);
    let adc = fixture.write(
        "adc.hpp",
        indoc! {r#"
            #include "arrays.hpp"

            namespace hw {
            class Adc {
            public:
                Int16Array capture(uint32_t samples);
            };
            }
        "#},
    );

    let report = Scanner::new(&ScanOptions::default())
        .unwrap()
        .scan(&adc)
        .unwrap();
    let capture = &report.class("hw::Adc").unwrap().methods["capture"][0];
    assert_eq!(capture.return_type.ndims(), 1);
    assert_eq!(capture.return_type.atom.std_name(), Some("int16_t"));
}

#[test]
fn test_include_directory_from_compiler_args() {
    let fixture = Fixture::new();
    fixture.write("include/hw/arrays.hpp", ARRAYS);
    let source = fixture.write(
        "src/adc.cpp",
        indoc! {r#"
            #include "hw/arrays.hpp"

            class Adc {
            public:
                hw::Int16Array capture();
            };
        "#},
    );

    let options = ScanOptions {
        compiler_args: vec![format!("-I{}", fixture.path().join("include").display())],
        ..ScanOptions::default()
    };
    let report = Scanner::new(&options).unwrap().scan(&source).unwrap();
    let capture = &report.class("Adc").unwrap().methods["capture"][0];
    assert_eq!(capture.return_type.ndims(), 1);
}

#[test]
fn test_missing_quoted_include_fails() {
    let fixture = Fixture::new();
    let source = fixture.write(
        "broken.hpp",
        "#include \"nowhere.hpp\"\nclass Foo { public: int f(); };\n",
    );

    let err = Scanner::new(&ScanOptions::default())
        .unwrap()
        .scan(&source)
        .unwrap_err();
    match err {
        Error::ParseFailure { diagnostics, .. } => {
            assert!(diagnostics[0].message.contains("'nowhere.hpp' file not found"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_missing_system_header_is_ignored() {
    let report = common::scan("#include <vector>\nclass Foo { public: int f(); };\n");
    assert!(report.class("Foo").is_some());
}

#[test]
fn test_header_is_lowered_once() {
    let fixture = Fixture::new();
    fixture.write(
        "base.hpp",
        indoc! {"
            #pragma once
            namespace hw { class Base { public: int id(); }; }
        "},
    );
    fixture.write("left.hpp", "#include \"base.hpp\"\n");
    fixture.write("right.hpp", "#include \"base.hpp\"\n");
    let main = fixture.write("main.hpp", "#include \"left.hpp\"\n#include \"right.hpp\"\n");

    let options = ScanOptions {
        collisions: CollisionPolicy::Reject,
        ..ScanOptions::default()
    };
    let scanner = Scanner::new(&options).unwrap();
    let report = scanner.scan(&main).unwrap();
    assert_eq!(report.classes.len(), 1);

    let classes = scanner.classes(&main).unwrap();
    assert_eq!(classes[0].qualified_name, "hw::Base");
    assert!(classes[0].location.path.ends_with("base.hpp"));
}

#[test]
fn test_conditionals_follow_defines() {
    let fixture = Fixture::new();
    let source = fixture.write(
        "board.hpp",
        indoc! {"
            #define HAS_ADC 1

            class Board {
            public:
            #if HAS_ADC
                int read_adc();
            #else
                int read_stub();
            #endif
            #ifdef WITH_DAC
                void write_dac(int value);
            #endif
            };
        "},
    );

    let methods = |args: Vec<String>| {
        let options = ScanOptions {
            compiler_args: args,
            ..ScanOptions::default()
        };
        let report = Scanner::new(&options).unwrap().scan(&source).unwrap();
        report
            .class("Board")
            .unwrap()
            .methods
            .keys()
            .cloned()
            .collect::<Vec<_>>()
    };

    assert_eq!(methods(vec![]), vec!["read_adc"]);
    assert_eq!(
        methods(vec!["-DWITH_DAC".to_string()]),
        vec!["read_adc", "write_dac"]
    );
}
