//! End-to-end extraction from C++ sources: frontend, class collection,
//! signature extraction and the flattened method table.

mod common;

use common::{rows, scan, scan_with};
use cppsig::{CollisionPolicy, Error, RecordPolicy, ScanOptions, TypeTag};
use indoc::indoc;
use pretty_assertions::assert_eq;

const DEVICE: &str = indoc! {"
    #pragma once
    #include <cstdint>

    struct DoubleArray {
        uint32_t length;
        double* data;
    };

    namespace hw {

    class Device {
    public:
        Device(int pin);
        ~Device();

        void reset();
        void set_gain(double gain);
        void set_gain(double gain, uint8_t channel);
        DoubleArray read_samples(uint16_t count);
        bool write_block(const int32_t* values, uint32_t size);

    private:
        int pin_;
    };

    }  // namespace hw
"};

#[test]
fn test_device_method_table() {
    let report = scan(DEVICE);
    assert!(report.skipped.is_empty());

    let table: Vec<[String; 10]> = rows(&report, "hw::Device")
        .iter()
        .map(|row| row.cells())
        .collect();
    let expected: Vec<[&str; 10]> = vec![
        ["0", "reset", "Reset", "", "0", "0", "", "", "", ""],
        ["1", "set_gain", "SetGain", "", "0", "1", "0", "gain", "double", "0"],
        ["1", "set_gain", "SetGain", "", "0", "2", "0", "gain", "double", "0"],
        ["1", "set_gain", "SetGain", "", "0", "2", "1", "channel", "uint8_t", "0"],
        ["2", "read_samples", "ReadSamples", "double", "1", "1", "0", "count", "uint16_t", "0"],
        ["3", "write_block", "WriteBlock", "bool", "0", "2", "0", "values", "int32_t", "1"],
        ["3", "write_block", "WriteBlock", "bool", "0", "2", "1", "size", "uint32_t", "0"],
    ];
    assert_eq!(table, expected.into_iter().map(|row| row.map(String::from)).collect::<Vec<_>>());
}

#[test]
fn test_constructors_and_fields_are_not_methods() {
    let report = scan(DEVICE);
    let record = report.class("hw::Device").unwrap();
    let names: Vec<_> = record.methods.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["reset", "set_gain", "read_samples", "write_block"]);
    assert_eq!(record.signature_count(), 5);
}

#[test]
fn test_structs_are_not_collected() {
    let report = scan(DEVICE);
    let names: Vec<_> = report.classes.iter().map(|c| c.qualified_name.as_str()).collect();
    assert_eq!(names, vec!["hw::Device"]);
}

#[test]
fn test_typedef_anonymous_array_struct() {
    let report = scan(indoc! {"
        typedef struct {
            uint64_t length;
            float* data;
        } FloatArray;

        class Filter {
        public:
            FloatArray apply(FloatArray input, float gain);
        };
    "});

    let record = report.class("Filter").unwrap();
    let apply = &record.methods["apply"][0];
    assert_eq!(apply.return_type.atom, TypeTag::Float32);
    assert_eq!(apply.return_type.ndims(), 1);
    assert_eq!(apply.arguments[0].ty.atom, TypeTag::Float32);
    assert_eq!(apply.arguments[0].ty.ndims(), 1);
    assert_eq!(apply.arguments[1].ty.ndims(), 0);
}

#[test]
fn test_const_data_pointer_array_struct() {
    let report = scan(indoc! {"
        #include <cstdint>

        struct ConstDoubleArray {
            uint32_t length;
            const double* data;
        };

        class Recorder {
        public:
            ConstDoubleArray history();
            void replay(ConstDoubleArray samples);
        };
    "});
    assert!(report.skipped.is_empty());

    let record = report.class("Recorder").unwrap();
    let history = &record.methods["history"][0];
    assert_eq!(history.return_type.atom, TypeTag::Float64);
    assert_eq!(history.return_type.ndims(), 1);

    let replay = &record.methods["replay"][0];
    assert_eq!(replay.arguments[0].ty.atom, TypeTag::Float64);
    assert_eq!(replay.arguments[0].ty.ndims(), 1);
}

#[test]
fn test_pure_virtual_methods_use_declaration() {
    let report = scan(indoc! {"
        class Sensor {
        public:
            virtual ~Sensor() {}
            virtual double read(int channel) = 0;
            virtual void calibrate() = 0;
        };
    "});

    let table = rows(&report, "Sensor");
    assert_eq!(table.len(), 2);
    assert_eq!(table[0].method_name, "read");
    assert_eq!(table[0].arg_name.as_deref(), Some("channel"));
    assert_eq!(table[0].return_atom_type.as_deref(), Some("double"));
    assert_eq!(table[1].method_name, "calibrate");
    assert_eq!(table[1].arg_count, 0);
}

#[test]
fn test_out_of_line_definition_names_arguments() {
    let report = scan(indoc! {"
        namespace motion {
        class Stepper {
        public:
            int step(int);
            void set_speed(double rpm);
        };

        int Stepper::step(int count) { return count; }
        }

        void motion::Stepper::set_speed(double target_rpm) {}
    "});

    let table = rows(&report, "motion::Stepper");
    assert_eq!(table[0].arg_name.as_deref(), Some("count"));
    assert_eq!(table[1].arg_name.as_deref(), Some("target_rpm"));
}

#[test]
fn test_unresolvable_methods_are_skipped() {
    let report = scan(indoc! {"
        #include <string>

        class Logger {
        public:
            void log(const std::string& message);
            void set_level(int level);
            long double precision();
        };
    "});

    let record = report.class("Logger").unwrap();
    let names: Vec<_> = record.methods.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["set_level"]);

    let skipped: Vec<_> = report.skipped.iter().map(|s| s.method.as_str()).collect();
    assert_eq!(skipped, vec!["log(const std::string &)", "precision()"]);
}

#[test]
fn test_unknown_type_names_skip_only_their_method() {
    let report = scan(indoc! {"
        #include <string>
        using namespace std;

        class Logger {
        public:
            void ok(int x);
            void name(string s);
        };
    "});

    let record = report.class("Logger").unwrap();
    let names: Vec<_> = record.methods.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["ok"]);

    let skipped: Vec<_> = report.skipped.iter().map(|s| s.method.as_str()).collect();
    assert_eq!(skipped, vec!["name(string)"]);
}

#[test]
fn test_interleaved_overloads_keep_declaration_order() {
    let report = scan(indoc! {"
        class Mixer {
        public:
            void foo();
            void bar(double x);
            void foo(int y);
        };
    "});

    let table: Vec<_> = rows(&report, "Mixer")
        .into_iter()
        .map(|row| (row.method_i, row.method_name, row.arg_name))
        .collect();
    assert_eq!(
        table,
        vec![
            (0, "foo".to_string(), None),
            (1, "bar".to_string(), Some("x".to_string())),
            (0, "foo".to_string(), Some("y".to_string())),
        ]
    );
}

#[test]
fn test_opaque_records_depend_on_policy() {
    let source = indoc! {"
        struct Point { double x; double y; };

        class Canvas {
        public:
            void move_to(Point target);
        };
    "};

    let report = scan(source);
    let move_to = &report.class("Canvas").unwrap().methods["move_to"][0];
    assert_eq!(move_to.arguments[0].ty.atom, TypeTag::Unresolved);
    assert_eq!(move_to.arguments[0].ty.ndims(), 0);

    let strict = ScanOptions {
        record_policy: RecordPolicy::Strict,
        ..ScanOptions::default()
    };
    let report = scan_with(source, &strict).unwrap();
    assert!(report.class("Canvas").unwrap().methods.is_empty());
    assert!(report.skipped[0].reason.contains("not an array shape"));
}

#[test]
fn test_templates_follow_the_include_flag() {
    let source = indoc! {"
        namespace util {
        template <typename T>
        class Ring {
        public:
            int size();
            void push(T value);
        };
        class Clock { public: uint64_t now(); };
        }
    "};

    let report = scan(source);
    let ring = report.class("util::Ring<T>").unwrap();
    let names: Vec<_> = ring.methods.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["size"]);

    let without = ScanOptions {
        include_templates: false,
        ..ScanOptions::default()
    };
    let report = scan_with(source, &without).unwrap();
    let names: Vec<_> = report.classes.iter().map(|c| c.qualified_name.as_str()).collect();
    assert_eq!(names, vec!["util::Clock"]);
}

#[test]
fn test_duplicate_classes_under_reject_policy() {
    let source = indoc! {"
        namespace a { class Foo { public: int f(); }; }
        namespace a { class Foo { public: int g(); }; }
    "};

    let report = scan(source);
    let foo = report.class("a::Foo").unwrap();
    assert!(foo.methods.contains_key("g"));

    let reject = ScanOptions {
        collisions: CollisionPolicy::Reject,
        ..ScanOptions::default()
    };
    let err = scan_with(source, &reject).unwrap_err();
    assert!(matches!(err, Error::DuplicateClass { qualified_name } if qualified_name == "a::Foo"));
}

#[test]
fn test_syntax_errors_fail_the_scan() {
    let err = scan_with("class Broken { int f( };", &ScanOptions::default()).unwrap_err();
    match err {
        Error::ParseFailure { diagnostics, .. } => assert!(!diagnostics.is_empty()),
        other => panic!("unexpected error: {other:?}"),
    }
}
