use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cppsig::{methods_frame, ScanOptions, Scanner};
use std::hint::black_box;
use std::path::PathBuf;
use tempfile::TempDir;

fn create_header(classes: usize) -> String {
    let mut content = String::from(
        "#include <cstdint>\n\nstruct DoubleArray {\n    uint32_t length;\n    double* data;\n};\n\n",
    );

    for i in 0..classes {
        content.push_str(&format!(
            r#"
namespace bench_{i} {{
class Device{i} {{
public:
    Device{i}(int pin);
    void reset();
    void set_gain(double gain);
    void set_gain(double gain, uint8_t channel);
    DoubleArray read_samples(uint16_t count);
    bool write_block(const int32_t* values, uint32_t size);
    uint64_t timestamp_{i}();
}};
}}
"#
        ));
    }
    content
}

fn create_test_files(count: usize, classes: usize) -> (TempDir, Vec<PathBuf>) {
    let temp_dir = TempDir::new().unwrap();
    let paths = (0..count)
        .map(|i| {
            let path = temp_dir.path().join(format!("device_{i}.hpp"));
            std::fs::write(&path, create_header(classes)).unwrap();
            path
        })
        .collect();
    (temp_dir, paths)
}

fn bench_scan_single(c: &mut Criterion) {
    let scanner = Scanner::new(&ScanOptions::default()).unwrap();
    let mut group = c.benchmark_group("scan_single");

    for classes in [1, 10, 50] {
        let (_dir, paths) = create_test_files(1, classes);
        group.bench_with_input(BenchmarkId::from_parameter(classes), &paths[0], |b, path| {
            b.iter(|| scanner.scan(black_box(path)).unwrap())
        });
    }
    group.finish();
}

fn bench_scan_all(c: &mut Criterion) {
    let scanner = Scanner::new(&ScanOptions::default()).unwrap();
    let (_dir, paths) = create_test_files(16, 10);

    c.bench_function("scan_all_16_files", |b| {
        b.iter(|| scanner.scan_all(black_box(&paths)))
    });
}

fn bench_methods_frame(c: &mut Criterion) {
    let scanner = Scanner::new(&ScanOptions::default()).unwrap();
    let (_dir, paths) = create_test_files(1, 50);
    let report = scanner.scan(&paths[0]).unwrap();

    c.bench_function("methods_frame_50_classes", |b| {
        b.iter(|| {
            report
                .classes
                .iter()
                .map(|record| methods_frame(black_box(record), true).len())
                .sum::<usize>()
        })
    });
}

criterion_group!(benches, bench_scan_single, bench_scan_all, bench_methods_frame);
criterion_main!(benches);
