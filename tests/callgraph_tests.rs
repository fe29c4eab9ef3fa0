//! Call graph generation integration tests, run against a scripted executor

mod support;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use resolvr::Generator;
use resolvr::config::CallgraphConfig;
use resolvr::constants::callgraph::OUTPUT_FILE;
use resolvr::process::ProcessOutput;
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use support::{FakeExecutor, Workspace, pom, services};

const TIMEOUT: Duration = Duration::from_secs(30);

/// Java settings pointing at a local jar so no JVM or download is needed
fn java_configs(ws: &Workspace) -> CallgraphConfig {
    let jar = ws.write("tools/soot-wrapper.jar", "jar");
    let mut configs = CallgraphConfig::default();
    if let Some(java) = configs.java.as_mut() {
        java.soot_jar = Some(jar);
    }
    configs
}

/// Unzip the base64 encoded archive at `path` and return its single entry
fn decode_output(path: &std::path::Path) -> String {
    let encoded = std::fs::read_to_string(path).unwrap();
    let zipped = STANDARD.decode(encoded).unwrap();
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(zipped)).unwrap();
    let mut entry = archive.by_name("call-graph").unwrap();
    let mut content = String::new();
    entry.read_to_string(&mut content).unwrap();
    content
}

#[tokio::test]
async fn test_java_call_graph_is_packaged() {
    let ws = Workspace::new();
    ws.write("app/pom.xml", &pom(&["core"]));
    ws.write("app/core/pom.xml", &pom(&[]));
    ws.write("app/core/target/classes/com/acme/Main.class", "");
    let configs = java_configs(&ws);
    let executor = Arc::new(FakeExecutor::new().on("-jar", |cmd| {
        std::fs::write(cmd.dir.join(OUTPUT_FILE), "Main.main -> Util.run\n").unwrap();
        Ok(ProcessOutput::default())
    }));

    let generator = Generator::new(2, services(&executor));
    let generation = generator
        .generate(&ws.roots(), &[], &[], &configs, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(generation.len(), 1);
    assert!(!generation.jobs()[0].errors().has_error());

    let lines = executor.command_lines();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("mvn dependency:copy-dependencies"));
    assert!(lines[1].contains(&format!(
        "-u {}",
        ws.join("app/core/target/classes").display()
    )));

    let output = ws.join("app").join(OUTPUT_FILE);
    assert_eq!(decode_output(&output), "Main.main -> Util.run\n");
    assert!(!ws.join("app/.resolvr-call-graph.zip").exists());
}

#[tokio::test]
async fn test_java_root_without_classes_is_a_warning() {
    let ws = Workspace::new();
    ws.write("app/pom.xml", &pom(&[]));
    let configs = java_configs(&ws);
    let executor = Arc::new(FakeExecutor::new());

    let generator = Generator::new(2, services(&executor));
    let generation = generator
        .generate(&ws.roots(), &[], &[], &configs, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(generation.len(), 1);
    let errors = generation.jobs()[0].errors();
    assert_eq!(errors.get_warning_errors().len(), 1);
    assert!(!errors.has_critical());
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_java_build_failing_on_every_root_is_an_error() {
    let ws = Workspace::new();
    ws.write("a/pom.xml", &pom(&[]));
    ws.write("b/pom.xml", &pom(&[]));
    let mut configs = java_configs(&ws);
    if let Some(java) = configs.java.as_mut() {
        java.build = true;
    }
    let executor = Arc::new(FakeExecutor::new().fail("package -q", "COMPILATION ERROR"));

    let generator = Generator::new(2, services(&executor));
    let err = generator
        .generate(&ws.roots(), &[], &[], &configs, TIMEOUT)
        .await
        .unwrap_err();

    assert!(format!("{err:#}").contains("Build failed for every Maven root"));
    assert_eq!(executor.calls_matching("package -q").len(), 2);
}

#[tokio::test]
async fn test_java_build_failing_on_some_roots_is_a_warning() {
    let ws = Workspace::new();
    ws.write("a/pom.xml", &pom(&[]));
    ws.write("a/target/classes/A.class", "");
    ws.write("b/pom.xml", &pom(&[]));
    ws.write("b/target/classes/B.class", "");
    let mut configs = java_configs(&ws);
    if let Some(java) = configs.java.as_mut() {
        java.build = true;
    }
    let failing_dir = ws.join("b");
    let executor = Arc::new(
        FakeExecutor::new()
            .on("package -q", move |cmd| {
                if cmd.dir == failing_dir {
                    Err(support::exit_error(cmd, "COMPILATION ERROR"))
                } else {
                    Ok(ProcessOutput::default())
                }
            })
            .on("-jar", |cmd| {
                std::fs::write(cmd.dir.join(OUTPUT_FILE), "edges").unwrap();
                Ok(ProcessOutput::default())
            }),
    );

    let generator = Generator::new(2, services(&executor));
    let generation = generator
        .generate(&ws.roots(), &[], &[], &configs, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(generation.len(), 2);
    assert!(!generation.has_critical());
    assert!(!generation.jobs()[0].errors().has_error());
    let warnings = generation.jobs()[1].errors().get_warning_errors();
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].message().contains("COMPILATION ERROR"));

    // only the root that built is analyzed, stale classes of the other are ignored
    let soot_calls = executor.calls_matching("-jar");
    assert_eq!(soot_calls.len(), 1);
    assert_eq!(soot_calls[0].dir, ws.join("a"));
    assert!(
        executor
            .calls_matching("copy-dependencies")
            .iter()
            .all(|cmd| cmd.dir == ws.join("a"))
    );
    assert!(!ws.join("b").join(OUTPUT_FILE).exists());
}

#[tokio::test]
async fn test_java_build_output_is_rescanned_with_exclusions() {
    let ws = Workspace::new();
    ws.write("app/pom.xml", &pom(&[]));
    let mut configs = java_configs(&ws);
    if let Some(java) = configs.java.as_mut() {
        java.build = true;
    }
    let executor = Arc::new(
        FakeExecutor::new()
            .on("package -q", |cmd| {
                for class in ["target/classes/Main.class", "vendor/lib/Dep.class"] {
                    let path = cmd.dir.join(class);
                    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
                    std::fs::write(path, "").unwrap();
                }
                Ok(ProcessOutput::default())
            })
            .on("-jar", |cmd| {
                std::fs::write(cmd.dir.join(OUTPUT_FILE), "edges").unwrap();
                Ok(ProcessOutput::default())
            }),
    );

    let generator = Generator::new(1, services(&executor));
    let generation = generator
        .generate(&ws.roots(), &["**/vendor/**".to_string()], &[], &configs, TIMEOUT)
        .await
        .unwrap();

    assert_eq!(generation.len(), 1);
    assert!(!generation.jobs()[0].errors().has_error());
    let soot = executor.calls_matching("-jar");
    assert_eq!(soot.len(), 1);
    let line = soot[0].to_string();
    assert!(line.contains(&format!("-u {}", ws.join("app/target/classes").display())));
    assert!(!line.contains("vendor"));
}

#[tokio::test]
async fn test_golang_call_graph_per_main_package() {
    let ws = Workspace::new();
    ws.write("svc/go.mod", "module svc\n");
    ws.write("svc/cmd/server/main.go", "package main\n\nfunc main() {}\n");
    ws.write("svc/internal/store/store.go", "package store\n");
    let executor = Arc::new(FakeExecutor::new().stdout("callgraph", "main.main --> store.Open\n"));

    let generator = Generator::new(2, services(&executor));
    let generation = generator
        .generate(&ws.roots(), &[], &[], &CallgraphConfig::default(), TIMEOUT)
        .await
        .unwrap();

    assert_eq!(generation.len(), 1);
    assert!(!generation.has_critical());
    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].dir, ws.join("svc/cmd/server"));

    let output = ws.join("svc/cmd/server").join(OUTPUT_FILE);
    assert_eq!(decode_output(&output), "main.main --> store.Open\n");
}

#[tokio::test]
async fn test_inclusion_overrides_exclusion() {
    let ws = Workspace::new();
    ws.write("app/pom.xml", &pom(&[]));
    ws.write("app/target/classes/Main.class", "");
    let configs = java_configs(&ws);
    let executor = Arc::new(FakeExecutor::new().on("-jar", |cmd| {
        std::fs::write(cmd.dir.join(OUTPUT_FILE), "edges").unwrap();
        Ok(ProcessOutput::default())
    }));

    let generator = Generator::new(1, services(&executor));
    let generation = generator
        .generate(
            &ws.roots(),
            &["**/target/**".to_string()],
            &["**/classes/**".to_string()],
            &configs,
            TIMEOUT,
        )
        .await
        .unwrap();

    assert_eq!(generation.len(), 1);
    assert!(!generation.jobs()[0].errors().has_error());
}

#[tokio::test]
async fn test_disabled_languages_produce_no_jobs() {
    let ws = Workspace::new();
    ws.write("app/pom.xml", &pom(&[]));
    ws.write("svc/main.go", "package main\nfunc main() {}\n");
    let executor = Arc::new(FakeExecutor::new());
    let configs = CallgraphConfig {
        java: None,
        golang: None,
    };

    let generator = Generator::new(1, services(&executor));
    let generation = generator
        .generate(&ws.roots(), &[], &[], &configs, TIMEOUT)
        .await
        .unwrap();

    assert!(generation.is_empty());
    assert!(executor.calls().is_empty());
}
