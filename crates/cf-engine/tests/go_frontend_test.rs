use cf_core::{CallKind, CodeCall, CodeFile, CodeImport, DataStructKind, Error, FieldScope, TypeRef};
use cf_engine::parser::{AnalyzeOptions, GoFrontend};

fn analyze(source: &str) -> CodeFile {
    GoFrontend::new()
        .analyze_source(source, "main.go", &AnalyzeOptions::default())
        .unwrap()
}

fn calls_of<'a>(file: &'a CodeFile, function: &str) -> &'a [CodeCall] {
    &file
        .find_function(function)
        .unwrap_or_else(|| panic!("function {function} not found"))
        .calls
}

fn edge(call: &CodeCall) -> (Option<&str>, Option<&str>, &str) {
    (
        call.package.as_deref(),
        call.type_name.as_deref(),
        call.function_name.as_str(),
    )
}

#[test]
fn test_local_allocation_resolves_receiver() {
    let file = analyze(
        r#"package main

import (
	"fmt"
	"sync"
)

func main() {
	l := new(sync.Mutex)
	l.Lock()
	defer l.Unlock()
	fmt.Println("1")
}
"#,
    );

    let main = file.find_function("main").unwrap();
    let edges: Vec<_> = main.calls.iter().map(edge).collect();
    assert_eq!(
        edges,
        vec![
            (Some("sync"), Some("sync.Mutex"), "Lock"),
            (Some("sync"), Some("sync.Mutex"), "Unlock"),
            (Some("fmt"), Some("fmt"), "Println"),
        ]
    );
    assert_eq!(main.calls[0].kind, CallKind::Method);
    assert_eq!(main.calls[2].kind, CallKind::PackageFunction);
    assert_eq!(
        main.calls.iter().map(|c| c.index).collect::<Vec<_>>(),
        vec![0, 1, 2]
    );

    assert_eq!(main.fields.len(), 1, "fields: {:?}", main.fields);
    assert_eq!(main.fields[0].name, "l");
    assert_eq!(main.fields[0].scope, FieldScope::Local);
    assert_eq!(main.fields[0].type_ref, Some(TypeRef::new("sync", "sync.Mutex")));
}

#[test]
fn test_global_var_declared_type_resolves_receiver() {
    let file = analyze(
        r#"package main

import (
	"fmt"
	"sync"
)

var l *sync.Mutex

func main() {
	l = new(sync.Mutex)
	l.Lock()
	defer l.Unlock()
	fmt.Println("1")
}
"#,
    );

    assert_eq!(file.fields.len(), 1);
    assert_eq!(file.fields[0].name, "l");
    assert_eq!(file.fields[0].scope, FieldScope::Global);
    assert_eq!(file.fields[0].type_name(), Some("sync.Mutex"));

    let calls = calls_of(&file, "main");
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].package.as_deref(), Some("sync"));
    assert_eq!(calls[0].type_name.as_deref(), Some("sync.Mutex"));
    assert_eq!(calls[2].package.as_deref(), Some("fmt"));
}

#[test]
fn test_explicit_var_declaration_in_body() {
    let file = analyze(
        r#"package main

import "sync"

func main() {
	var mu sync.RWMutex
	mu.RLock()
}
"#,
    );

    let calls = calls_of(&file, "main");
    assert_eq!(calls.len(), 1);
    assert_eq!(edge(&calls[0]), (Some("sync"), Some("sync.RWMutex"), "RLock"));
}

#[test]
fn test_self_call_is_local() {
    let file = analyze(
        r#"package main

func A() {
	B()
}

func B() {}
"#,
    );

    let calls = calls_of(&file, "A");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].function_name, "B");
    assert_eq!(calls[0].package, None);
    assert_eq!(calls[0].type_name, None);
    assert!(calls[0].is_local());
    assert!(calls_of(&file, "B").is_empty());
}

#[test]
fn test_unknown_receiver_degrades_to_unresolved_call() {
    let file = analyze(
        r#"package main

func main() {
	thing.Frobnicate(1, 2)
}
"#,
    );

    let calls = calls_of(&file, "main");
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].function_name, "Frobnicate");
    assert_eq!(calls[0].package, None);
    assert_eq!(calls[0].type_name, None);
    assert_eq!(calls[0].kind, CallKind::Unresolved);
    assert!(!calls[0].is_resolved());
}

#[test]
fn test_builtin_calls_are_tagged() {
    let file = analyze(
        r#"package main

func main() {
	xs := make([]int, 0)
	xs = append(xs, 1)
	println(len(xs))
}
"#,
    );

    let calls = calls_of(&file, "main");
    let names: Vec<_> = calls.iter().map(|c| c.function_name.as_str()).collect();
    assert_eq!(names, vec!["append", "println", "len"]);
    assert!(calls.iter().all(|c| c.kind == CallKind::Builtin));
    assert!(calls.iter().all(|c| c.package.is_none() && c.type_name.is_none()));
}

#[test]
fn test_call_order_follows_called_names() {
    let file = analyze(
        r#"package main

func main() {
	a.B().C(d.E())
	f(g(), h())
}
"#,
    );

    let names: Vec<_> = calls_of(&file, "main")
        .iter()
        .map(|c| c.function_name.as_str())
        .collect();
    assert_eq!(names, vec!["B", "C", "E", "f", "g", "h"]);
}

#[test]
fn test_function_count_matches_declarations() {
    let file = analyze(
        r#"package shapes

type Circle struct {
	r float64
}

func (c Circle) Area() float64 { return 3.14 * c.r * c.r }

func (c *Circle) Scale(f float64) { c.r *= f }

func NewCircle(r float64) *Circle { return &Circle{r: r} }

func helper() {}
"#,
    );

    let functions = file.functions();
    assert_eq!(functions.len(), 4);
    let names: Vec<_> = functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["Area", "Scale", "NewCircle", "helper"]);
    assert!(functions.iter().all(|f| !f.name.is_empty()));
}

#[test]
fn test_methods_grouped_under_receiver() {
    let file = analyze(
        r#"package main

type Server struct {
	addr string
	port int
}

func (s *Server) Start() {}

func (s Server) Addr() string { return s.addr }
"#,
    );

    let server = file.find_struct("Server").unwrap();
    assert_eq!(server.kind, DataStructKind::Struct);
    assert_eq!(server.members.len(), 2);
    assert!(server.members.iter().all(|m| m.function_nodes.len() == 1));
    assert_eq!(server.members[0].id, "main:Server.Start");
    assert_eq!(server.fields.len(), 2);
    assert!(server.fields.iter().all(|f| f.scope == FieldScope::Member));

    let start = &server.members[0].function_nodes[0];
    assert_eq!(start.receiver, Some(TypeRef::new("main", "Server")));
    assert!(start.is_method());

    // No free functions: no implicit global structure either.
    assert!(file.global_struct().is_none());
}

#[test]
fn test_free_functions_live_in_global_struct() {
    let file = analyze(
        r#"package util

func One() {}

func Two() {}
"#,
    );

    let global = file.global_struct().unwrap();
    assert_eq!(global.name, "default");
    assert_eq!(global.kind, DataStructKind::Global);
    let ids: Vec<_> = global.members.iter().map(|m| m.id.as_str()).collect();
    assert_eq!(ids, vec!["util:One", "util:Two"]);
}

#[test]
fn test_method_before_type_declaration() {
    let file = analyze(
        r#"package main

func (q *Queue) Push(v int) {}

type Queue struct {
	items []int
}
"#,
    );

    assert_eq!(file.data_structures.len(), 1);
    let queue = &file.data_structures[0];
    assert_eq!(queue.name, "Queue");
    assert_eq!(queue.kind, DataStructKind::Struct);
    assert_eq!(queue.position.line, 5);
    assert_eq!(queue.members.len(), 1);
    assert_eq!(queue.fields[0].name, "items");
    assert_eq!(queue.fields[0].type_name(), Some("[]int"));
}

#[test]
fn test_interface_methods_are_specs_not_functions() {
    let file = analyze(
        r#"package store

import "io"

type Store interface {
	io.Closer
	Get(key string) (string, error)
	Put(key, value string) error
}
"#,
    );

    let store = file.find_struct("Store").unwrap();
    assert_eq!(store.kind, DataStructKind::Interface);
    assert_eq!(store.method_specs.len(), 2);
    assert_eq!(store.method_specs[0].name, "Get");
    assert_eq!(store.method_specs[0].return_types.len(), 2);
    assert_eq!(store.method_specs[1].parameters.len(), 2);
    assert_eq!(store.embedded, vec![TypeRef::new("io", "io.Closer")]);
    assert!(file.functions().is_empty());
}

#[test]
fn test_aliased_import_qualifies_calls() {
    let file = analyze(
        r#"package main

import (
	f "fmt"
	_ "net/http/pprof"
	str "strings"
)

func main() {
	f.Println(str.ToUpper("x"))
}
"#,
    );

    assert_eq!(file.imports.len(), 3);
    assert_eq!(file.find_import("f").map(|i| i.source.as_str()), Some("fmt"));
    assert_eq!(file.imports[1].alias.as_deref(), Some("_"));
    assert!(file.find_import("pprof").is_none());

    let calls = calls_of(&file, "main");
    assert_eq!(edge(&calls[0]), (Some("fmt"), Some("fmt"), "Println"));
    assert_eq!(edge(&calls[1]), (Some("strings"), Some("strings"), "ToUpper"));
}

#[test]
fn test_local_variable_shadows_import() {
    let file = analyze(
        r#"package main

import "fmt"

type printer struct{}

func (printer) Println(s string) {}

func main() {
	fmt := printer{}
	fmt.Println("shadowed")
}
"#,
    );

    let calls = calls_of(&file, "main");
    assert_eq!(calls.len(), 1);
    assert_eq!(edge(&calls[0]), (Some("main"), Some("printer"), "Println"));
    assert_eq!(calls[0].kind, CallKind::Method);
}

#[test]
fn test_related_imports_resolve_foreign_qualifiers() {
    let source = r#"package main

func main() {
	log.Info("started")
}
"#;
    let options = AnalyzeOptions::default()
        .with_related_imports(vec![CodeImport::new("github.com/acme/log")]);
    let file = GoFrontend::new()
        .analyze_source(source, "main.go", &options)
        .unwrap();

    let calls = calls_of(&file, "main");
    assert_eq!(
        edge(&calls[0]),
        (Some("github.com/acme/log"), Some("log"), "Info")
    );
    // Related imports are not copied into the file's own import list.
    assert!(file.imports.is_empty());
}

#[test]
fn test_package_hint_used_without_package_clause() {
    let options = AnalyzeOptions::default().with_package_hint("hinted");
    let file = GoFrontend::new()
        .analyze_source("func run() {}\n", "run.go", &options)
        .unwrap();
    assert_eq!(file.package_name, "hinted");
    assert_eq!(file.global_struct().unwrap().members[0].id, "hinted:run");

    let file = GoFrontend::new()
        .analyze_source("package real\n\nfunc run() {}\n", "run.go", &options)
        .unwrap();
    assert_eq!(file.package_name, "real");
}

#[test]
fn test_constructor_prefix_infers_type() {
    let file = analyze(
        r#"package main

import "github.com/acme/parser"

func main() {
	p := parser.NewParser()
	p.Parse()
}
"#,
    );

    let calls = calls_of(&file, "main");
    assert_eq!(
        edge(&calls[0]),
        (Some("github.com/acme/parser"), Some("parser"), "NewParser")
    );
    assert_eq!(
        edge(&calls[1]),
        (Some("github.com/acme/parser"), Some("parser.Parser"), "Parse")
    );
}

#[test]
fn test_composite_literal_and_address_of() {
    let file = analyze(
        r#"package main

import "bytes"

type Server struct{}

func (s *Server) Start() {}

func main() {
	s := &Server{}
	s.Start()
	var buf = bytes.Buffer{}
	buf.WriteString("x")
}
"#,
    );

    let calls = calls_of(&file, "main");
    assert_eq!(edge(&calls[0]), (Some("main"), Some("Server"), "Start"));
    assert_eq!(edge(&calls[1]), (Some("bytes"), Some("bytes.Buffer"), "WriteString"));
}

#[test]
fn test_multi_value_results_from_local_function() {
    let file = analyze(
        r#"package main

import "os"

func open(name string) (*os.File, error) {
	return os.Open(name)
}

func main() {
	f, err := open("x")
	if err != nil {
		panic(err)
	}
	f.Close()
	err.Error()
}
"#,
    );

    let calls = calls_of(&file, "main");
    let edges: Vec<_> = calls.iter().map(edge).collect();
    assert_eq!(
        edges,
        vec![
            (None, None, "open"),
            (None, None, "panic"),
            (Some("os"), Some("os.File"), "Close"),
            (None, Some("error"), "Error"),
        ]
    );
    assert_eq!(calls[0].kind, CallKind::Local);

    let main = file.find_function("main").unwrap();
    assert_eq!(main.find_field("err").unwrap().type_name(), Some("error"));
}

#[test]
fn test_method_results_and_struct_fields_chain() {
    let file = analyze(
        r#"package app

import "database/sql"

type Router struct{}

func (r *Router) Handle(path string) {}

type App struct {
	db     *sql.DB
	router *Router
}

func (a *App) Routes() *Router { return a.router }

func (a *App) Run() {
	r := a.Routes()
	r.Handle("/")
	a.db.Query("select 1")
	a.router.Handle("/health")
}
"#,
    );

    let calls = calls_of(&file, "Run");
    let edges: Vec<_> = calls.iter().map(edge).collect();
    assert_eq!(
        edges,
        vec![
            (Some("app"), Some("App"), "Routes"),
            (Some("app"), Some("Router"), "Handle"),
            (Some("database/sql"), Some("sql.DB"), "Query"),
            (Some("app"), Some("Router"), "Handle"),
        ]
    );
}

#[test]
fn test_type_switch_binds_case_type() {
    let file = analyze(
        r#"package main

import "bytes"

func reset(x interface{}) {
	switch v := x.(type) {
	case *bytes.Buffer:
		v.Reset()
	case string, int:
		v.Whatever()
	}
}
"#,
    );

    let calls = calls_of(&file, "reset");
    assert_eq!(edge(&calls[0]), (Some("bytes"), Some("bytes.Buffer"), "Reset"));
    assert_eq!(calls[1].kind, CallKind::Unresolved);

    let reset = file.find_function("reset").unwrap();
    let aliases: Vec<_> = reset
        .local_fields()
        .map(|f| (f.name.as_str(), f.type_ref.clone()))
        .collect();
    assert_eq!(
        aliases,
        vec![
            ("v", Some(TypeRef::new("bytes", "bytes.Buffer"))),
            ("v", None),
        ]
    );
}

#[test]
fn test_nested_function_literal_is_flattened() {
    let file = analyze(
        r#"package api

import "sort"

type CallAPI struct {
	Size int
}

func less(a, b CallAPI) bool { return a.Size < b.Size }

func SortAPIs(callAPIs []CallAPI) {
	sort.Slice(callAPIs, func(i, j int) bool {
		return less(callAPIs[i], callAPIs[j])
	})
}
"#,
    );

    let sort_apis = file.find_function("SortAPIs").unwrap();
    let edges: Vec<_> = sort_apis.calls.iter().map(edge).collect();
    assert_eq!(
        edges,
        vec![(Some("sort"), Some("sort"), "Slice"), (None, None, "less")]
    );
    assert_eq!(sort_apis.calls[1].kind, CallKind::Local);

    let scopes: Vec<_> = sort_apis
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.scope))
        .collect();
    assert_eq!(
        scopes,
        vec![
            ("callAPIs", FieldScope::Parameter),
            ("i", FieldScope::Local),
            ("j", FieldScope::Local),
        ]
    );
    assert_eq!(sort_apis.local_fields().count(), 2);
}

#[test]
fn test_literal_parameters_do_not_leak() {
    let file = analyze(
        r#"package main

import "net/http"

func main() {
	handler := func(w http.ResponseWriter) {
		w.WriteHeader(200)
	}
	w.Flush()
	handler(nil)
}
"#,
    );

    let calls = calls_of(&file, "main");
    assert_eq!(
        edge(&calls[0]),
        (Some("net/http"), Some("http.ResponseWriter"), "WriteHeader")
    );
    assert_eq!(calls[1].function_name, "Flush");
    assert_eq!(calls[1].kind, CallKind::Unresolved);
    // A local func value is not a sibling function.
    assert_eq!(calls[2].function_name, "handler");
    assert_eq!(calls[2].kind, CallKind::Unresolved);
}

#[test]
fn test_immediately_invoked_literal() {
    let file = analyze(
        r#"package main

import "fmt"

func main() {
	func() {
		fmt.Println("now")
	}()
}
"#,
    );

    let names: Vec<_> = calls_of(&file, "main")
        .iter()
        .map(|c| c.function_name.as_str())
        .collect();
    assert_eq!(names, vec!["Println", "func"]);
}

#[test]
fn test_inner_scope_shadowing_ends_with_block() {
    let file = analyze(
        r#"package main

import "strings"

func main() {
	b := strings.Builder{}
	if true {
		b := 42
		_ = b
	}
	b.WriteString("x")
}
"#,
    );

    let calls = calls_of(&file, "main");
    assert_eq!(
        edge(&calls[0]),
        (Some("strings"), Some("strings.Builder"), "WriteString")
    );
    // Each declaration site is its own field.
    let main = file.find_function("main").unwrap();
    let declared: Vec<_> = main
        .fields
        .iter()
        .filter(|f| f.name == "b")
        .map(|f| (f.position.line, f.type_name()))
        .collect();
    assert_eq!(
        declared,
        vec![(6, Some("strings.Builder")), (8, Some("int"))]
    );
}

#[test]
fn test_sibling_blocks_keep_their_own_fields() {
    let file = analyze(
        r#"package main

import (
	"bytes"
	"sync"
)

func main() {
	if true {
		x := new(sync.Mutex)
		x.Lock()
	} else {
		x := new(bytes.Buffer)
		x.Reset()
	}
}
"#,
    );

    let main = file.find_function("main").unwrap();
    let edges: Vec<_> = main.calls.iter().map(edge).collect();
    assert_eq!(
        edges,
        vec![
            (Some("sync"), Some("sync.Mutex"), "Lock"),
            (Some("bytes"), Some("bytes.Buffer"), "Reset"),
        ]
    );
    let types: Vec<_> = main.local_fields().map(|f| f.type_name()).collect();
    assert_eq!(types, vec![Some("sync.Mutex"), Some("bytes.Buffer")]);
}

#[test]
fn test_redeclaration_in_function_scope_adds_no_field() {
    let file = analyze(
        r#"package main

import "os"

func open(name string) (*os.File, error) {
	return os.Open(name)
}

func reopen(err error) {
	f, err := open("x")
	f.Close()
	err.Error()
}
"#,
    );

    let reopen = file.find_function("reopen").unwrap();
    let names: Vec<_> = reopen
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.scope))
        .collect();
    assert_eq!(
        names,
        vec![("err", FieldScope::Parameter), ("f", FieldScope::Local)]
    );
    assert_eq!(edge(&reopen.calls[1]), (Some("os"), Some("os.File"), "Close"));
    assert_eq!(edge(&reopen.calls[2]), (None, Some("error"), "Error"));
}

#[test]
fn test_select_receive_shadows_outer_binding() {
    let file = analyze(
        r#"package main

import "sync"

func main() {
	ch := make(chan int)
	v := new(sync.Mutex)
	select {
	case v := <-ch:
		v.Lock()
	default:
	}
	v.Unlock()
}
"#,
    );

    let main = file.find_function("main").unwrap();
    assert_eq!(main.calls[0].function_name, "Lock");
    assert_eq!(main.calls[0].kind, CallKind::Unresolved);
    assert_eq!(edge(&main.calls[1]), (Some("sync"), Some("sync.Mutex"), "Unlock"));

    let received: Vec<_> = main.fields.iter().filter(|f| f.name == "v").collect();
    assert_eq!(received.len(), 2);
    assert_eq!(received[1].type_ref, None);
}

#[test]
fn test_call_arguments_carry_inferred_types() {
    let file = analyze(
        r#"package main

import (
	"fmt"
	"sync"
)

func main() {
	l := new(sync.Mutex)
	fmt.Println(l, "x", unknown)
	l.Lock()
}
"#,
    );

    let calls = calls_of(&file, "main");
    assert_eq!(
        calls[0].arguments,
        vec![
            Some(TypeRef::new("sync", "sync.Mutex")),
            Some(TypeRef::unqualified("string")),
            None,
        ]
    );
    assert!(calls[1].arguments.is_empty());
}

#[test]
fn test_deeply_nested_expression_is_analyzed() {
    let chain = vec!["\"a\""; 20_000].join(" + ");
    let source = format!(
        "package main\n\nimport \"fmt\"\n\n\
         func long() string {{\n\treturn {chain}\n}}\n\n\
         func main() {{\n\tfmt.Println(long())\n}}\n"
    );

    let file = GoFrontend::new()
        .analyze_source(&source, "deep.go", &AnalyzeOptions::default())
        .expect("deep expression should not fail the file");

    assert!(calls_of(&file, "long").is_empty());
    let edges: Vec<_> = calls_of(&file, "main").iter().map(edge).collect();
    assert_eq!(
        edges,
        vec![(Some("fmt"), Some("fmt"), "Println"), (None, None, "long")]
    );
}

#[test]
fn test_range_variables_shadow_outer_bindings() {
    let file = analyze(
        r#"package main

import "sync"

var item *sync.Mutex

func main() {
	for _, item := range []int{1, 2} {
		item.Lock()
	}
	item.Lock()
}
"#,
    );

    let calls = calls_of(&file, "main");
    assert_eq!(calls[0].kind, CallKind::Unresolved);
    assert_eq!(edge(&calls[1]), (Some("sync"), Some("sync.Mutex"), "Lock"));
}

#[test]
fn test_function_signature_is_recorded() {
    let file = analyze(
        r#"package main

import "context"

func Fetch(ctx context.Context, urls ...string) ([]byte, error) {
	return nil, nil
}
"#,
    );

    let fetch = file.find_function("Fetch").unwrap();
    assert_eq!(fetch.parameters.len(), 2);
    assert_eq!(fetch.parameters[0].name, "ctx");
    assert_eq!(
        fetch.parameters[0].type_ref,
        Some(TypeRef::new("context", "context.Context"))
    );
    assert_eq!(fetch.parameters[1].type_text, "...string");
    assert_eq!(fetch.return_types.len(), 2);
    assert_eq!(fetch.return_types[0].name, "[]byte");
    assert!(fetch
        .fields
        .iter()
        .all(|f| f.scope == FieldScope::Parameter));
}

#[test]
fn test_untyped_global_is_still_recorded() {
    let file = analyze(
        r#"package main

var (
	handlers = registry()
	count    = 3
)

const name = "svc"
"#,
    );

    let fields: Vec<_> = file
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.type_name()))
        .collect();
    assert_eq!(
        fields,
        vec![("handlers", None), ("count", Some("int")), ("name", Some("string"))]
    );
}

#[test]
fn test_call_positions_point_at_called_name() {
    let file = analyze("package main\n\nimport \"fmt\"\n\nfunc main() {\n\tfmt.Println()\n}\n");
    let call = &calls_of(&file, "main")[0];
    assert_eq!(call.position.line, 6);
    assert_eq!(call.position.column, 6);
}

#[test]
fn test_syntax_error_is_reported() {
    let result = GoFrontend::new().analyze_source(
        "package main\n\nfunc main( {\n",
        "broken.go",
        &AnalyzeOptions::default(),
    );
    match result {
        Err(Error::ParseError(msg)) => assert!(msg.starts_with("broken.go:"), "got: {msg}"),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_analysis_is_idempotent() -> anyhow::Result<()> {
    let source = r#"package main

import (
	"fmt"
	"sync"
)

type Cache struct {
	mu sync.Mutex
}

func (c *Cache) Get() {
	c.mu.Lock()
	defer c.mu.Unlock()
}

func main() {
	c := &Cache{}
	c.Get()
	fmt.Println(c)
}
"#;
    let frontend = GoFrontend::new();
    let first = frontend.analyze_source(source, "cache.go", &AnalyzeOptions::default())?;
    let second = frontend.analyze_source(source, "cache.go", &AnalyzeOptions::default())?;

    assert_eq!(first, second);
    assert_eq!(serde_json::to_string(&first)?, serde_json::to_string(&second)?);

    let get_calls = calls_of(&first, "Get");
    assert_eq!(edge(&get_calls[0]), (Some("sync"), Some("sync.Mutex"), "Lock"));
    Ok(())
}

#[test]
fn test_concurrent_analysis_shares_frontend() {
    let frontend = GoFrontend::new();
    let sources: Vec<String> = (0..8)
        .map(|i| {
            format!(
                "package p{i}\n\nimport \"sync\"\n\n\
                 func F{i}() {{\n\tm := new(sync.Mutex)\n\tm.Lock()\n}}\n"
            )
        })
        .collect();

    let results: Vec<CodeFile> = std::thread::scope(|scope| {
        let handles: Vec<_> = sources
            .iter()
            .enumerate()
            .map(|(i, src)| {
                let frontend = &frontend;
                scope.spawn(move || {
                    frontend
                        .analyze_source(src, &format!("f{i}.go"), &AnalyzeOptions::default())
                        .unwrap()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (i, file) in results.iter().enumerate() {
        assert_eq!(file.package_name, format!("p{i}"));
        let calls = calls_of(file, &format!("F{i}"));
        assert_eq!(calls.len(), 1);
        assert_eq!(edge(&calls[0]), (Some("sync"), Some("sync.Mutex"), "Lock"));
    }
}
