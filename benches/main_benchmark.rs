use bake::build::{BuildSession, StalenessCheck, Targets, fill_template};
use bake::config;
use bake::project::{CProject, ProjectIndex, scan_source};
use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::path::Path;

const MOCK_CONFIG: &str = r#"
[build]
compiler = "clang++ -std=c++20 {include} -c {source} -o {output}"
linker = "clang++ {objects} -o {output} {libs}"
emit_pch = "clang++ -x c++-header {include} {header} -o {output}"
include_pch = "-include-pch {pch}"
dst = "out"
"#;

const MOCK_SOURCE: &str = r#"//! exe bench_app
#include "window.h"
#include "../common/util.h"
#include <vector>
#include <cmath>

static int helper(int x) { return x * 2; }

int main(int argc, char** argv) {
    std::vector<int> v;
    return helper(argc);
}
"#;

fn bench_config_parse(c: &mut Criterion) {
    c.bench_function("parse_bake_toml", |b| {
        b.iter(|| {
            let _: config::BakeConfig = toml::from_str(black_box(MOCK_CONFIG)).unwrap();
        })
    });
}

fn bench_scan_source(c: &mut Criterion) {
    c.bench_function("scan_source", |b| {
        b.iter(|| scan_source(black_box(MOCK_SOURCE.as_bytes()), black_box(true)))
    });
}

fn bench_fill_template(c: &mut Criterion) {
    let template = "clang++ -std=c++20 {include} -c {source} -o {output}";
    c.bench_function("fill_template_compile", |b| {
        b.iter(|| {
            fill_template(
                black_box(template),
                &[
                    ("include", "-I /p/common -I /p/lib"),
                    ("source", "/p/app/main.cpp"),
                    ("output", "/cache/L3AvYXBwL21haW4uY3Bw"),
                ],
                "compiler",
            )
            .unwrap()
        })
    });
}

fn write_project(root: &Path, apps: usize) {
    std::fs::create_dir_all(root.join("common")).unwrap();
    std::fs::write(root.join("common/util.h"), "#include <cmath>\nint util();\n").unwrap();
    std::fs::write(root.join("common/util.cpp"), "#include \"util.h\"\nint util() { return 1; }\n")
        .unwrap();
    for i in 0..apps {
        let dir = root.join(format!("app{i}"));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("main.cpp"),
            "#include \"../common/util.h\"\nint main() { return util(); }\n",
        )
        .unwrap();
    }
}

fn bench_scan_project(c: &mut Criterion) {
    // Setup a temp dir for scanning
    let temp_dir = tempfile::tempdir().unwrap();
    write_project(temp_dir.path(), 50);

    c.bench_function("scan_project_50_apps", |b| {
        b.iter(|| ProjectIndex::scan(black_box(temp_dir.path()), &CProject).unwrap())
    });

    let index = ProjectIndex::scan(temp_dir.path(), &CProject).unwrap();
    c.bench_function("object_closures_50_apps", |b| {
        b.iter(|| {
            let targets = Targets::new(&index, &CProject);
            for exe in targets.executables() {
                black_box(targets.object_closure(exe));
            }
        })
    });

    let artifact = temp_dir.path().join("artifact.o");
    std::fs::write(&artifact, "o").unwrap();
    c.bench_function("staleness_check_all", |b| {
        b.iter(|| {
            let session = BuildSession::new();
            let check = StalenessCheck::new(&index, &session, None);
            for (id, _) in index.iter() {
                black_box(check.check(&artifact, id));
            }
        })
    });
}

criterion_group!(
    benches,
    bench_config_parse,
    bench_scan_source,
    bench_fill_template,
    bench_scan_project
);
criterion_main!(benches);
