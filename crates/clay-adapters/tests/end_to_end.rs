//! End-to-end tests: real adapters driving `ClayService` over a temp project.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;

use clay_adapters::{
    BuiltinFormatters, HandlebarsRenderer, LocalFilesystem, MemoryFilesystem, ShellCommandRunner,
};
use clay_core::{
    application::{ClayService, ports::Filesystem},
    domain::{DomainError, JsonPath, trace_to_source},
    error::ClayError,
};

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn root(&self) -> &Path {
        self.dir.path()
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.root().join(relative)
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn write_json(&self, relative: &str, value: Value) {
        self.write(relative, &serde_json::to_string_pretty(&value).unwrap());
    }

    fn read(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    fn index(&self) -> Value {
        serde_json::from_str(&self.read(".clay")).unwrap()
    }

    fn service(&self) -> ClayService {
        service_over(self.root(), Arc::new(LocalFilesystem::new()))
    }

    /// A model with one included type and one inline type, rendered to
    /// `src/<kebab name>.ts`.
    fn shop(&self) {
        self.write_json(
            "model.json",
            json!({
                "name": "shop",
                "generators": ["./gen"],
                "model": {
                    "types": [
                        { "include": "types/order.json" },
                        { "name": "customer", "fields": [] }
                    ]
                }
            }),
        );
        self.write_json(
            "types/order.json",
            json!({ "name": "order", "fields": [{ "name": "id" }, { "name": "total" }] }),
        );
        self.write_json(
            "gen/generator.json",
            json!({
                "steps": [
                    { "generate": "templates", "select": "$.model.types[*]", "target": "src" }
                ],
                "formatters": ["trailing-whitespace", "final-newline"]
            }),
        );
        self.write(
            "gen/templates/{{kebabCase name}}.ts",
            "export interface {{pascalCase name}} {\n{{#each fields}}  {{name}}: string;\n{{/each}}}",
        );
    }
}

fn service_over(root: &Path, filesystem: Arc<dyn Filesystem>) -> ClayService {
    ClayService::new(
        root,
        filesystem,
        Arc::new(HandlebarsRenderer::new()),
        Arc::new(ShellCommandRunner::new()),
        Arc::new(BuiltinFormatters::new()),
    )
}

#[test]
fn generates_files_and_records_them() {
    let project = Project::new();
    project.shop();

    let report = project
        .service()
        .generate_model(&project.path("model.json"), ".")
        .unwrap();

    assert_eq!(report.written, 2);
    assert_eq!(
        project.read("src/order.ts"),
        "export interface Order {\n  id: string;\n  total: string;\n}\n"
    );
    assert_eq!(project.read("src/customer.ts"), "export interface Customer {\n}\n");

    let index = project.index();
    let entry = &index["models"][0];
    assert_eq!(entry["path"], "model.json");
    assert_eq!(entry["output"], ".");
    assert!(entry["generated_files"]["src/order.ts"]["md5"].is_string());
    assert!(entry["last_generated"].is_string());
}

#[test]
fn second_run_without_changes_writes_nothing() {
    let project = Project::new();
    project.shop();
    let service = project.service();
    let model = project.path("model.json");

    service.generate_model(&model, ".").unwrap();
    let second = service.generate_model(&model, ".").unwrap();

    assert_eq!(second.written, 0);
    assert_eq!(second.skipped, 2);
}

#[test]
fn second_run_performs_zero_file_writes_besides_the_index() {
    let filesystem = MemoryFilesystem::new();
    filesystem.insert(
        "/p/model.json",
        &json!({
            "name": "m",
            "generators": ["gen"],
            "model": { "items": [{ "name": "a" }, { "name": "b" }] }
        })
        .to_string(),
    );
    filesystem.insert(
        "/p/gen/generator.json",
        &json!({ "steps": [{ "generate": "t", "select": "$.model.items[*]" }] }).to_string(),
    );
    filesystem.insert("/p/gen/t/{{name}}.txt", "{{name}}");

    let service = service_over(Path::new("/p"), Arc::new(filesystem.clone()));
    service.generate_model(Path::new("/p/model.json"), ".").unwrap();
    let after_first = filesystem.write_count();
    let index_first = filesystem.read_file("/p/.clay").unwrap();
    service.generate_model(Path::new("/p/model.json"), ".").unwrap();

    // only `.clay` is rewritten
    assert_eq!(filesystem.write_count(), after_first + 1);
    assert_eq!(filesystem.read_file("/p/a.txt").as_deref(), Some("a"));

    let index_second = filesystem.read_file("/p/.clay").unwrap();
    assert_eq!(without_timestamps(&index_second), without_timestamps(&index_first));
}

/// Index text with every `date` and `last_generated` value blanked.
fn without_timestamps(raw: &str) -> String {
    let mut index: Value = serde_json::from_str(raw).unwrap();
    for entry in index["models"].as_array_mut().unwrap() {
        entry["last_generated"] = Value::Null;
        for file in entry["generated_files"].as_object_mut().unwrap().values_mut() {
            file["date"] = Value::Null;
        }
    }
    serde_json::to_string_pretty(&index).unwrap()
}

#[test]
fn deleted_output_is_written_again() {
    let project = Project::new();
    project.shop();
    let service = project.service();
    let model = project.path("model.json");

    service.generate_model(&model, ".").unwrap();
    fs::remove_file(project.path("src/order.ts")).unwrap();
    let report = service.generate_model(&model, ".").unwrap();

    assert_eq!(report.written, 1);
    assert!(project.path("src/order.ts").exists());
}

#[test]
fn includes_are_spliced_in_memory_only() {
    let project = Project::new();
    project.shop();

    let model = project
        .service()
        .resolver()
        .resolve(&project.path("model.json"))
        .unwrap();

    let first = &model.document()["model"]["types"][0];
    let keys: Vec<_> = first.as_object().unwrap().keys().cloned().collect();
    assert_eq!(keys, vec!["name", "fields"]);
    assert!(project.read("model.json").contains("\"include\": \"types/order.json\""));
}

#[test]
fn edits_inside_an_include_trace_back_to_the_included_file() {
    let project = Project::new();
    project.shop();

    let resolved = project
        .service()
        .resolver()
        .resolve_with_map(&project.path("model.json"))
        .unwrap();
    let document = resolved.model.document();

    let field = JsonPath::parse_normalized("$.model.types[0].fields[1]").unwrap();
    let traced = trace_to_source(document, &resolved.includes, &field);
    assert!(traced.file_path.unwrap().ends_with("types/order.json"));
    assert_eq!(traced.relative_path.to_string(), "$.fields[1]");

    let inline = JsonPath::parse_normalized("$.model.types[1].name").unwrap();
    let traced = trace_to_source(document, &resolved.includes, &inline);
    assert_eq!(traced.file_path, None);
    assert_eq!(traced.relative_path, inline);
}

#[test]
fn include_cycle_through_a_parent_dir_alias_is_rejected() {
    let project = Project::new();
    project.write_json(
        "m.json",
        json!({ "name": "m", "generators": [], "model": { "include": "b.json" } }),
    );
    project.write_json("b.json", json!({ "next": { "include": "x/../b.json" } }));
    fs::create_dir_all(project.path("x")).unwrap();

    let err = project
        .service()
        .resolver()
        .resolve(&project.path("m.json"))
        .unwrap_err();

    assert!(matches!(err, ClayError::Domain(DomainError::InvalidInclude { .. })));
}

#[test]
fn include_map_holds_normalized_file_paths() {
    let project = Project::new();
    project.write_json(
        "models/shop.json",
        json!({ "name": "shop", "generators": [], "model": { "order": { "include": "types/order.json" } } }),
    );
    project.write_json(
        "models/types/order.json",
        json!({ "name": "order", "id": { "include": "../fields/./id.json" } }),
    );
    project.write_json("models/fields/id.json", json!({ "name": "id" }));

    let resolved = project
        .service()
        .resolver()
        .resolve_with_map(&project.path("models/shop.json"))
        .unwrap();

    let id = JsonPath::parse_normalized("$.model.order.id").unwrap();
    let expected = std::path::absolute(project.path("models/fields/id.json")).unwrap();
    assert_eq!(resolved.includes.get(&id), Some(expected.as_path()));
    assert_eq!(resolved.model.document()["model"]["order"]["id"], json!({ "name": "id" }));
}

#[test]
fn clean_reverses_generate() {
    let project = Project::new();
    project.shop();
    let service = project.service();
    let model = project.path("model.json");

    service.generate_model(&model, ".").unwrap();
    let report = service.clean_model(&model).unwrap();

    assert_eq!(report.removed, 2);
    assert_eq!(report.pruned_dirs, 1);
    assert!(!project.path("src").exists());
    assert!(project.path("model.json").exists());
    assert_eq!(project.index()["models"], json!([]));
}

#[test]
fn clean_tolerates_files_removed_by_hand() {
    let project = Project::new();
    project.shop();
    let service = project.service();
    let model = project.path("model.json");

    service.generate_model(&model, ".").unwrap();
    fs::remove_file(project.path("src/customer.ts")).unwrap();
    let report = service.clean_model(&model).unwrap();

    assert_eq!(report.removed, 1);
    assert_eq!(report.missing, 1);
}

#[test]
fn copy_with_select_templates_destination_names() {
    let project = Project::new();
    project.write_json(
        "model.json",
        json!({
            "name": "docs",
            "generators": [{ "generator": "gen/generator.json", "output": "site" }],
            "model": { "pages": [{ "slug": "intro" }, { "slug": "usage" }] }
        }),
    );
    project.write_json(
        "gen/generator.json",
        json!({
            "steps": [
                { "copy": "static/{{slug}}.md", "select": "$.model.pages[*]", "target": "pages" },
                { "copy": "assets", "target": "assets" }
            ]
        }),
    );
    project.write("gen/static/{{slug}}.md", "# {{slug}} stays verbatim\n");
    project.write("gen/assets/logo.svg", "<svg/>");

    let report = project
        .service()
        .generate_model(&project.path("model.json"), "out")
        .unwrap();

    assert_eq!(report.copied, 3);
    assert_eq!(
        project.read("out/site/pages/intro.md"),
        "# {{slug}} stays verbatim\n"
    );
    assert!(project.path("out/site/pages/usage.md").exists());
    assert_eq!(project.read("out/site/assets/logo.svg"), "<svg/>");

    let files = &project.index()["models"][0]["generated_files"];
    assert!(files["out/site/pages/intro.md"].is_object());
    assert!(files["out/site/assets/logo.svg"].is_object());
}

#[test]
fn touch_never_overwrites_or_records() {
    let project = Project::new();
    project.write_json(
        "model.json",
        json!({ "name": "app", "generators": ["gen"], "model": {} }),
    );
    project.write_json(
        "gen/generator.json",
        json!({
            "steps": [
                { "generate": "seed/settings.json", "touch": true },
                { "generate": "seed/README.md" }
            ]
        }),
    );
    project.write("gen/seed/settings.json", "{ \"debug\": false }");
    project.write("gen/seed/README.md", "{{name}}");
    project.write("settings.json", "{ \"debug\": true }");

    let report = project
        .service()
        .generate_model(&project.path("model.json"), ".")
        .unwrap();

    assert_eq!(report.skipped, 1);
    assert_eq!(report.written, 1);
    assert_eq!(project.read("settings.json"), "{ \"debug\": true }");
    assert_eq!(project.read("README.md"), "app");

    let files = &project.index()["models"][0]["generated_files"];
    assert!(files.get("settings.json").is_none());
    assert!(files.get("README.md").is_some());
}

#[test]
fn json_formatter_runs_on_json_outputs_only() {
    let project = Project::new();
    project.write_json(
        "model.json",
        json!({ "name": "cfg", "generators": ["gen"], "model": { "port": 8080 } }),
    );
    project.write_json(
        "gen/generator.json",
        json!({
            "steps": [{ "generate": "t" }],
            "formatters": ["json"]
        }),
    );
    project.write("gen/t/app.json", "{\"name\":\"{{name}}\",\"port\":{{model.port}}}");
    project.write("gen/t/notes.txt", "{\"raw\":true}");

    project
        .service()
        .generate_model(&project.path("model.json"), ".")
        .unwrap();

    assert_eq!(
        project.read("app.json"),
        "{\n  \"name\": \"cfg\",\n  \"port\": 8080\n}\n"
    );
    assert_eq!(project.read("notes.txt"), "{\"raw\":true}");
}

#[test]
fn merge_conflicted_index_is_repaired_on_load() {
    let project = Project::new();
    project.shop();
    project.write(
        ".clay",
        "{\n  \"models\": [\n\
         <<<<<<< HEAD\n\
         { \"path\": \"other.json\", \"output\": \"ours\" }\n\
         =======\n\
         { \"path\": \"other.json\", \"output\": \"theirs\" }\n\
         >>>>>>> feature\n\
         ]\n}\n",
    );

    project
        .service()
        .generate_model(&project.path("model.json"), ".")
        .unwrap();

    let raw = project.read(".clay");
    assert!(!raw.contains("<<<<<<<"));
    let index = project.index();
    assert_eq!(index["models"][0]["output"], "theirs");
    assert_eq!(index["models"][1]["path"], "model.json");
}

#[test]
fn rendering_failure_aborts_and_keeps_earlier_records() {
    let project = Project::new();
    project.write_json(
        "model.json",
        json!({ "name": "broken", "generators": ["ok", "bad"], "model": {} }),
    );
    project.write_json("ok/generator.json", json!({ "steps": [{ "generate": "a.txt" }] }));
    project.write("ok/a.txt", "fine");
    project.write_json("bad/generator.json", json!({ "steps": [{ "generate": "b.txt" }] }));
    project.write("bad/b.txt", "{{#if}}");

    let err = project
        .service()
        .generate_model(&project.path("model.json"), ".")
        .unwrap_err();

    assert!(err.to_string().contains("b.txt"));
    assert_eq!(project.read("a.txt"), "fine");
    let entry = &project.index()["models"][0];
    assert!(entry["generated_files"]["a.txt"].is_object());
    assert!(entry["last_generated"].is_null());
}

#[cfg(unix)]
#[test]
fn run_command_executes_in_the_output_root() {
    let project = Project::new();
    project.write_json(
        "model.json",
        json!({
            "name": "cmd",
            "generators": ["gen"],
            "model": { "parts": [{ "name": "x" }, { "name": "y" }] }
        }),
    );
    project.write_json(
        "gen/generator.json",
        json!({
            "steps": [
                { "runCommand": "touch {{name}}.done", "select": "$.model.parts[*]" },
                { "runCommand": "exit 1" }
            ]
        }),
    );

    let report = project
        .service()
        .generate_model(&project.path("model.json"), "out")
        .unwrap();

    assert_eq!(report.commands, 3);
    assert!(project.path("out/x.done").exists());
    assert!(project.path("out/y.done").exists());
}
