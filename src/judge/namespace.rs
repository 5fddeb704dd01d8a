//! Restricted execution namespace and bootstrap rendering.
//!
//! Candidate code never runs at interpreter top level. The host renders a
//! bootstrap program (passed to the guest as `python -c`) that builds a
//! capability table from an explicit allow-list of builtin names, `exec`s the
//! candidate into a fresh globals mapping whose only `__builtins__` is that
//! table, resolves the entry point, runs the test loop, and emits exactly one
//! marker-prefixed result record on stdout.
//!
//! The allow-list is the policy boundary. The hard boundary is the wasm/WASI
//! instantiation itself (no preopens, no sockets, no host environment), which
//! is what keeps interpreter-level introspection escapes away from the host.

/// Prefix of the single result line the bootstrap writes to guest stdout.
///
/// Candidate code cannot forge it: neither profile exposes `print` or any
/// other way to reach stdout.
pub const RESULT_MARKER: &str = "__JUDGE_RESULT__";

/// Builtin names granted to candidate code under the minimal profile.
///
/// Pure-function surface only: construction and traversal of the basic value
/// types. No import mechanism, no I/O, no reflective access, no class
/// machinery.
const MINIMAL_BUILTINS: &[&str] = &[
    "abs",
    "all",
    "any",
    "bin",
    "bool",
    "dict",
    "enumerate",
    "filter",
    "float",
    "int",
    "len",
    "list",
    "map",
    "max",
    "min",
    "pow",
    "range",
    "reversed",
    "set",
    "sorted",
    "str",
    "sum",
    "tuple",
    "zip",
];

/// Additional names granted under the relaxed profile: the class-definition
/// machinery plus a small set of raisable standard error conditions, enough
/// for the `Solution`-object authoring style.
const RELAXED_EXTRAS: &[&str] = &[
    "__build_class__",
    "object",
    "super",
    "staticmethod",
    "classmethod",
    "property",
    "isinstance",
    "Exception",
    "ValueError",
    "TypeError",
    "KeyError",
    "IndexError",
    "ZeroDivisionError",
    "StopIteration",
    "RuntimeError",
];

/// Allow-list profile for the restricted namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Pure functions only. `class` statements fail to load.
    Minimal,
    /// Minimal plus class definitions and a small exception set.
    Relaxed,
}

impl Default for Profile {
    fn default() -> Self {
        Profile::Relaxed
    }
}

impl Profile {
    /// The builtin names this profile exposes to candidate code.
    pub fn allowed_builtins(&self) -> Vec<&'static str> {
        match self {
            Profile::Minimal => MINIMAL_BUILTINS.to_vec(),
            Profile::Relaxed => {
                let mut names = MINIMAL_BUILTINS.to_vec();
                names.extend_from_slice(RELAXED_EXTRAS);
                names
            }
        }
    }

    /// Stable lowercase name, used for config parsing and logs.
    pub fn name(&self) -> &'static str {
        match self {
            Profile::Minimal => "minimal",
            Profile::Relaxed => "relaxed",
        }
    }
}

impl std::str::FromStr for Profile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minimal" => Ok(Profile::Minimal),
            "relaxed" => Ok(Profile::Relaxed),
            other => Err(format!("unknown profile: {other:?}")),
        }
    }
}

/// The bootstrap program skeleton. `@ALLOWED@` and `@MARKER@` are filled in
/// by [`render_bootstrap`]. The program reads the request JSON from stdin and
/// owns the whole guest-side pipeline:
///
/// 1. build the capability table from the allow-list
/// 2. compile + exec the candidate into a fresh namespace
/// 3. resolve the entry point (declared name, `Solution` attribute with a
///    fresh instance per invocation, last-defined callable fallback)
/// 4. run every test, counting structural-equality passes
/// 5. emit one marker-prefixed record
///
/// Candidate code sees none of these harness names: its globals contain only
/// its own definitions and the capability table.
const BOOTSTRAP_TEMPLATE: &str = r#"
import builtins as _host_builtins
import json as _json
import sys as _sys

_MARKER = "@MARKER@"
_ALLOWED = (@ALLOWED@)


def _emit(record):
    _sys.stdout.write(_MARKER + " " + _json.dumps(record) + "\n")
    _sys.stdout.flush()


def _capability_table():
    table = {}
    for name in _ALLOWED:
        value = getattr(_host_builtins, name, None)
        if value is not None:
            table[name] = value
    return table


def _resolve(namespace, export_name):
    if export_name:
        direct = namespace.get(export_name)
        if callable(direct) and not isinstance(direct, type):
            return direct
        container = namespace.get("Solution")
        if isinstance(container, type) and hasattr(container, export_name):
            def _dispatch(*args):
                return getattr(container(), export_name)(*args)
            return _dispatch
    fallback = None
    for name, value in namespace.items():
        if name == "__builtins__":
            continue
        if name.startswith("__") and name.endswith("__"):
            continue
        if callable(value) and not isinstance(value, type):
            fallback = value
    return fallback


def _grade():
    request = _json.loads(_sys.stdin.read())
    code = request.get("code") or ""
    export_name = request.get("exportName")
    tests = request.get("tests") or []

    try:
        compiled = compile(code, "<candidate>", "exec")
    except BaseException as exc:
        _emit({"status": "error", "kind": "compile", "message": str(exc)})
        return

    namespace = {"__builtins__": _capability_table(), "__name__": "candidate"}
    try:
        exec(compiled, namespace)
    except BaseException as exc:
        _emit({"status": "error", "kind": "load", "message": str(exc)})
        return

    entry = _resolve(namespace, export_name)
    if entry is None:
        if export_name:
            message = "no callable entry point named " + repr(export_name)
        else:
            message = "no callable entry point found"
        _emit({"status": "error", "kind": "resolve", "message": message})
        return

    passed = 0
    for case in tests:
        args = (case.get("input") or {}).get("args") or []
        try:
            if entry(*args) == case.get("output"):
                passed += 1
        except BaseException:
            pass

    _emit({"status": "ok", "passCount": passed, "total": len(tests)})


try:
    _grade()
except BaseException as _exc:
    _emit({"status": "error", "kind": "internal", "message": str(_exc)})
"#;

/// Render the bootstrap program for the given profile.
pub fn render_bootstrap(profile: Profile) -> String {
    let allowed = profile
        .allowed_builtins()
        .iter()
        .map(|name| format!("{name:?}"))
        .collect::<Vec<_>>()
        .join(", ");

    // Trailing comma keeps a single-element tuple a tuple.
    BOOTSTRAP_TEMPLATE
        .replace("@ALLOWED@", &format!("{allowed},"))
        .replace("@MARKER@", RESULT_MARKER)
}
