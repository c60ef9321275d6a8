//! "Go to implementation" through the completer, with files on disk.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use common::{ScriptedEngine, TestProject, definition};
use engine_broker::config::CompleterConfig;
use engine_broker::resolver::registry::NoHooks;
use engine_broker::responses::{CommandResponse, GoToResponse};
use engine_broker::{Command, Request, SemanticCompleter};

fn completer(engine: Arc<ScriptedEngine>, max_hops: usize) -> SemanticCompleter {
    let config = CompleterConfig {
        implementation_max_hops: max_hops,
        ..Default::default()
    };
    SemanticCompleter::new(config, engine, Arc::new(NoHooks))
}

#[test]
fn test_import_chain_resolves_to_definition() {
    println!("\n=== TEST: two import hops then a definition ===");

    let project = TestProject::new();
    let main = project.add_file("main.py", "from a import thing\nthing()\n");
    let a = project.add_file("a.py", "from b import thing\n");
    let b = project.add_file("b.py", "import os\nfrom c import thing\n");
    let c = project.add_file("c.py", "\n\ndef thing():\n    pass\n");

    let (engine, script) = ScriptedEngine::new();
    script.on_goto(&main, 1, 14, vec![definition(&a, 1, 14)]);
    script.on_goto(&a, 1, 14, vec![definition(&b, 2, 14)]);
    script.on_goto(&b, 2, 14, vec![definition(&c, 3, 4)]);

    let completer = completer(engine, 10);
    let request = Request::new(&main, "from a import thing\nthing()\n", 1, 15);
    let location = completer.goto_implementation(&request).unwrap();

    assert_eq!(location.path, c);
    assert_eq!((location.line, location.column), (3, 5));
    // Two import hops, one more query to reach the definition
    assert_eq!(script.goto_calls.load(Ordering::SeqCst), 3);
    println!("  ✓ landed on {}:{}", location.path.display(), location.line);
}

#[test]
fn test_unsaved_buffer_is_used_for_classification() {
    let project = TestProject::new();
    let main = project.add_file("main.py", "x\n");
    // On disk this is an import, in the editor it has become a definition.
    let a = project.add_file("a.py", "from b import thing\n");

    let (engine, script) = ScriptedEngine::new();
    script.on_goto(&main, 1, 0, vec![definition(&a, 1, 0)]);

    let mut request = Request::new(&main, "x\n", 1, 1);
    request.file_data.insert(
        a.clone(),
        engine_broker::service::FileData {
            contents: "thing = 1\n".to_string(),
            filetypes: vec!["python".to_string()],
        },
    );

    let location = completer(engine, 10).goto_implementation(&request).unwrap();
    assert_eq!(location.path, a);
    assert_eq!(script.goto_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_hop_sessions_see_the_classified_text() {
    let project = TestProject::new();
    let main = project.add_file("main.py", "saved\n");
    let a = project.add_file("a.py", "from b import thing\n");
    let b = project.add_file("b.py", "thing = 1\n");

    let (engine, script) = ScriptedEngine::new();
    script.on_goto(&main, 1, 0, vec![definition(&a, 1, 0)]);
    script.on_goto(&a, 1, 0, vec![definition(&b, 1, 0)]);

    let request = Request::new(&main, "from a import thing\n", 1, 1);
    let location = completer(engine, 10).goto_implementation(&request).unwrap();
    assert_eq!(location.path, b);

    // The request buffer for main.py, the disk text for a.py
    assert_eq!(
        *script.sessions.lock(),
        vec![
            (main.clone(), "from a import thing\n".to_string()),
            (a.clone(), "from b import thing\n".to_string()),
        ]
    );
}

#[test]
fn test_cycle_stops_at_revisited_location() {
    let project = TestProject::new();
    let main = project.add_file("main.py", "from a import x\n");
    let a = project.add_file("a.py", "from b import x\n");
    let b = project.add_file("b.py", "from a import x\n");

    let (engine, script) = ScriptedEngine::new();
    script.on_goto(&main, 1, 0, vec![definition(&a, 1, 0)]);
    script.on_goto(&a, 1, 0, vec![definition(&b, 1, 0)]);
    script.on_goto(&b, 1, 0, vec![definition(&a, 1, 0)]);

    let location = completer(engine, 10)
        .goto_implementation(&Request::new(&main, "from a import x\n", 1, 1))
        .unwrap();

    assert_eq!(location.path, a);
    assert_eq!(script.goto_calls.load(Ordering::SeqCst), 3);
}

#[test]
fn test_hop_cap_returns_last_location() {
    println!("\n=== TEST: chain longer than the hop cap ===");

    let project = TestProject::new();
    let files: Vec<_> = (0..6)
        .map(|i| project.add_file(&format!("m{i}.py"), "from elsewhere import x\n"))
        .collect();

    let (engine, script) = ScriptedEngine::new();
    for pair in files.windows(2) {
        script.on_goto(&pair[0], 1, 0, vec![definition(&pair[1], 1, 0)]);
    }

    let request = Request::new(&files[0], "from elsewhere import x\n", 1, 1);
    let location = completer(engine, 3).goto_implementation(&request).unwrap();

    assert_eq!(location.path, files[3]);
    assert_eq!(script.goto_calls.load(Ordering::SeqCst), 3);
    println!("  ✓ stopped at {} after 3 hops", location.path.display());
}

#[test]
fn test_first_hop_failure_is_an_error() {
    let project = TestProject::new();
    let main = project.add_file("main.py", "x\n");
    let (engine, _script) = ScriptedEngine::new();

    let err = completer(engine, 10)
        .run_command(
            &Request::new(&main, "x\n", 1, 1),
            Command::GoToImplementation,
            &[],
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Can't jump to implementation.");
    assert_eq!(err.status_code(), "NO_DEFINITION");
}

#[test]
fn test_later_failure_keeps_best_location() {
    let project = TestProject::new();
    let main = project.add_file("main.py", "from a import x\n");
    let a = project.add_file("a.py", "from nowhere import x\n");

    let (engine, script) = ScriptedEngine::new();
    script.on_goto(&main, 1, 0, vec![definition(&a, 1, 0)]);

    let response = completer(engine, 10)
        .run_command(
            &Request::new(&main, "from a import x\n", 1, 1),
            Command::GoToImplementation,
            &[],
        )
        .unwrap();

    match response {
        CommandResponse::GoTo(GoToResponse::Single(location)) => assert_eq!(location.path, a),
        other => panic!("unexpected response {other:?}"),
    }
    assert_eq!(script.goto_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn test_first_candidate_is_followed() {
    let project = TestProject::new();
    let main = project.add_file("main.py", "x\n");
    let first = project.add_file("first.py", "def x(): pass\n");
    let second = project.add_file("second.py", "def x(): pass\n");

    let (engine, script) = ScriptedEngine::new();
    script.on_goto(
        &main,
        1,
        0,
        vec![definition(&first, 1, 4), definition(&second, 1, 4)],
    );

    let location = completer(engine, 10)
        .goto_implementation(&Request::new(&main, "x\n", 1, 1))
        .unwrap();
    assert_eq!(location.path, first);
}

#[test]
fn test_engine_is_never_entered_concurrently() {
    println!("\n=== TEST: concurrent walks are serialized at the engine ===");

    let project = TestProject::new();
    let main = project.add_file("main.py", "from a import x\n");
    let a = project.add_file("a.py", "from b import x\n");
    let b = project.add_file("b.py", "x = 1\n");

    let (engine, script) = ScriptedEngine::new();
    script.on_goto(&main, 1, 0, vec![definition(&a, 1, 0)]);
    script.on_goto(&a, 1, 0, vec![definition(&b, 1, 0)]);

    let completer = Arc::new(completer(engine, 10));
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let completer = completer.clone();
            let request = Request::new(&main, "from a import x\n", 1, 1);
            std::thread::spawn(move || completer.goto_implementation(&request).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().path, b);
    }
    assert_eq!(script.max_in_flight.load(Ordering::SeqCst), 1);
    assert_eq!(script.goto_calls.load(Ordering::SeqCst), 16);
    println!("  ✓ 16 engine queries, never more than one at a time");
}
