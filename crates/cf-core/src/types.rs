use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Name of the implicit structure that owns free functions.
pub const GLOBAL_STRUCT_NAME: &str = "default";

// ── Position ──
/// 1-based source position of the first byte of a node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

// ── Type references ──
/// A declared or inferred type.
///
/// `name` is the normalized display name (`sync.Mutex`, `Parser`,
/// `[]string`); `package` is the import path of a qualified type, the
/// file's own package for a file-local named type, and `None` for
/// predeclared and composite types.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeRef {
    pub package: Option<String>,
    pub name: String,
}

impl TypeRef {
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: Some(package.into()),
            name: name.into(),
        }
    }

    /// A type that belongs to no package (predeclared or composite).
    pub fn unqualified(name: impl Into<String>) -> Self {
        Self {
            package: None,
            name: name.into(),
        }
    }

    /// The type name without its package qualifier: `sync.Mutex` → `Mutex`.
    pub fn base_name(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((_, base)) if !self.name.starts_with('[') && !self.name.starts_with("map[") => {
                base
            }
            _ => &self.name,
        }
    }
}

impl std::fmt::Display for TypeRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.package {
            Some(pkg) => write!(f, "{pkg}:{}", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

// ── Imports ──
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeImport {
    /// Import path without quotes, e.g. `github.com/org/repo/pkg`.
    pub source: String,
    /// Explicit alias as written (`f`, `.`, `_`), if any.
    pub alias: Option<String>,
}

impl CodeImport {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            alias: None,
        }
    }

    pub fn with_alias(source: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            alias: Some(alias.into()),
        }
    }

    /// Last segment of the import path: the package's default name.
    pub fn package_name(&self) -> &str {
        self.source.rsplit('/').next().unwrap_or(&self.source)
    }

    /// The identifier code in the importing file uses to qualify names.
    pub fn usage_name(&self) -> &str {
        self.alias.as_deref().unwrap_or_else(|| self.package_name())
    }

    /// Dot and blank imports never qualify an identifier.
    pub fn is_qualifying(&self) -> bool {
        !matches!(self.alias.as_deref(), Some(".") | Some("_"))
    }
}

// ── Fields ──
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldScope {
    Global,
    Parameter,
    Local,
    Member,
}

impl std::fmt::Display for FieldScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Global => "global",
            Self::Parameter => "parameter",
            Self::Local => "local",
            Self::Member => "member",
        };
        write!(f, "{s}")
    }
}

impl FromStr for FieldScope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "global" => Ok(Self::Global),
            "parameter" => Ok(Self::Parameter),
            "local" => Ok(Self::Local),
            "member" => Ok(Self::Member),
            other => Err(format!("unknown FieldScope: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeField {
    pub name: String,
    /// `None` when the type could not be determined.
    pub type_ref: Option<TypeRef>,
    pub scope: FieldScope,
    pub position: Position,
}

impl CodeField {
    pub fn type_name(&self) -> Option<&str> {
        self.type_ref.as_ref().map(|t| t.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeParameter {
    /// Empty for unnamed parameters such as `func(int, string)`.
    pub name: String,
    /// The type exactly as written, e.g. `*sync.Mutex` or `...string`.
    pub type_text: String,
    pub type_ref: Option<TypeRef>,
}

// ── Calls ──
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    /// Call to a sibling function declared in the same file.
    Local,
    /// Call to a predeclared function such as `len` or `append`.
    Builtin,
    /// `pkg.Func(...)` through an import alias.
    PackageFunction,
    /// Method call on a receiver whose type was resolved.
    Method,
    Unresolved,
}

impl std::fmt::Display for CallKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Local => "local",
            Self::Builtin => "builtin",
            Self::PackageFunction => "package_function",
            Self::Method => "method",
            Self::Unresolved => "unresolved",
        };
        write!(f, "{s}")
    }
}

impl FromStr for CallKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "local" => Ok(Self::Local),
            "builtin" => Ok(Self::Builtin),
            "package_function" => Ok(Self::PackageFunction),
            "method" => Ok(Self::Method),
            "unresolved" => Ok(Self::Unresolved),
            other => Err(format!("unknown CallKind: {other}")),
        }
    }
}

/// One textual call site inside a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCall {
    pub package: Option<String>,
    pub type_name: Option<String>,
    pub function_name: String,
    /// Inferred type of each argument, `None` where it is unknown.
    pub arguments: Vec<Option<TypeRef>>,
    /// 0-based position of this call within its function.
    pub index: usize,
    pub kind: CallKind,
    pub position: Position,
}

impl CodeCall {
    /// True for calls to a sibling function of the same file.
    pub fn is_local(&self) -> bool {
        self.kind == CallKind::Local
    }

    pub fn is_resolved(&self) -> bool {
        self.type_name.is_some()
    }

    /// `package:Type.method`, `Type.method` or just `method`.
    pub fn qualified_name(&self) -> String {
        match (&self.package, &self.type_name) {
            (Some(pkg), Some(ty)) => format!("{pkg}:{ty}.{}", self.function_name),
            (None, Some(ty)) => format!("{ty}.{}", self.function_name),
            _ => self.function_name.clone(),
        }
    }
}

// ── Functions ──
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFunctionNode {
    pub name: String,
    /// Receiver type for methods, `None` for free functions.
    pub receiver: Option<TypeRef>,
    pub parameters: Vec<CodeParameter>,
    pub return_types: Vec<TypeRef>,
    /// Call edges in source order.
    pub calls: Vec<CodeCall>,
    /// Parameters and local variables.
    pub fields: Vec<CodeField>,
    pub position: Position,
}

impl CodeFunctionNode {
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }

    pub fn local_fields(&self) -> impl Iterator<Item = &CodeField> {
        self.fields.iter().filter(|f| f.scope == FieldScope::Local)
    }

    pub fn find_field(&self, name: &str) -> Option<&CodeField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMember {
    /// `<package>:<Structure>.<name>` for methods, `<package>:<name>` otherwise.
    pub id: String,
    pub name: String,
    pub function_nodes: Vec<CodeFunctionNode>,
}

/// Abstract method signature declared inside an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeMethodSpec {
    pub name: String,
    pub parameters: Vec<CodeParameter>,
    pub return_types: Vec<TypeRef>,
    pub position: Position,
}

// ── Data structures ──
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataStructKind {
    Struct,
    Interface,
    /// Any other named type (`type ID string`, `type Handler func()`).
    Alias,
    /// Implicit container for free functions.
    Global,
}

impl std::fmt::Display for DataStructKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Struct => "struct",
            Self::Interface => "interface",
            Self::Alias => "alias",
            Self::Global => "global",
        };
        write!(f, "{s}")
    }
}

impl FromStr for DataStructKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "struct" => Ok(Self::Struct),
            "interface" => Ok(Self::Interface),
            "alias" => Ok(Self::Alias),
            "global" => Ok(Self::Global),
            other => Err(format!("unknown DataStructKind: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDataStruct {
    pub name: String,
    pub kind: DataStructKind,
    pub fields: Vec<CodeField>,
    /// Embedded structs or interfaces.
    pub embedded: Vec<TypeRef>,
    pub method_specs: Vec<CodeMethodSpec>,
    pub members: Vec<CodeMember>,
    pub position: Position,
}

impl CodeDataStruct {
    pub fn new(name: impl Into<String>, kind: DataStructKind, position: Position) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
            embedded: Vec::new(),
            method_specs: Vec::new(),
            members: Vec::new(),
            position,
        }
    }

    pub fn functions(&self) -> impl Iterator<Item = &CodeFunctionNode> {
        self.members.iter().flat_map(|m| m.function_nodes.iter())
    }
}

// ── File ──
/// Everything the frontend learned about one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeFile {
    pub file_name: String,
    pub package_name: String,
    pub imports: Vec<CodeImport>,
    pub data_structures: Vec<CodeDataStruct>,
    /// Package-level variables and constants.
    pub fields: Vec<CodeField>,
}

impl CodeFile {
    /// All function nodes in source declaration order.
    pub fn functions(&self) -> Vec<&CodeFunctionNode> {
        let mut functions: Vec<&CodeFunctionNode> = self
            .data_structures
            .iter()
            .flat_map(|ds| ds.functions())
            .collect();
        functions.sort_by_key(|f| f.position);
        functions
    }

    /// All members in the order their function was declared.
    pub fn members(&self) -> Vec<&CodeMember> {
        let mut members: Vec<&CodeMember> = self
            .data_structures
            .iter()
            .flat_map(|ds| ds.members.iter())
            .collect();
        members.sort_by_key(|m| m.function_nodes.first().map(|f| f.position));
        members
    }

    /// First function or method with the given name.
    pub fn find_function(&self, name: &str) -> Option<&CodeFunctionNode> {
        self.functions().into_iter().find(|f| f.name == name)
    }

    pub fn find_struct(&self, name: &str) -> Option<&CodeDataStruct> {
        self.data_structures.iter().find(|ds| ds.name == name)
    }

    /// The implicit container of free functions, if the file has any.
    pub fn global_struct(&self) -> Option<&CodeDataStruct> {
        self.data_structures
            .iter()
            .find(|ds| ds.kind == DataStructKind::Global)
    }

    pub fn find_import(&self, usage_name: &str) -> Option<&CodeImport> {
        self.imports.iter().find(|i| i.usage_name() == usage_name)
    }
}
