//! Doclet data model: one record per documented symbol.
//!
//! Input fields mirror the JSON dump produced by `jsdoc -X`. Fields the
//! pipeline computes (`signature`, `attribs`, `id`, ...) are skipped during
//! deserialization and filled in by later stages.

use serde::Deserialize;
use std::fmt;
use std::path::Path;

/// Symbol kind. Unknown kinds from the front end are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "String")]
pub enum Kind {
    Module,
    Class,
    Namespace,
    Mixin,
    External,
    Interface,
    Event,
    Member,
    Function,
    Typedef,
    Constant,
    Package,
    File,
    Mainpage,
    Globalobj,
    Source,
    Other(String),
}

impl Kind {
    pub fn as_str(&self) -> &str {
        match self {
            Kind::Module => "module",
            Kind::Class => "class",
            Kind::Namespace => "namespace",
            Kind::Mixin => "mixin",
            Kind::External => "external",
            Kind::Interface => "interface",
            Kind::Event => "event",
            Kind::Member => "member",
            Kind::Function => "function",
            Kind::Typedef => "typedef",
            Kind::Constant => "constant",
            Kind::Package => "package",
            Kind::File => "file",
            Kind::Mainpage => "mainpage",
            Kind::Globalobj => "globalobj",
            Kind::Source => "source",
            Kind::Other(s) => s,
        }
    }

    /// Kinds that get a page of their own.
    pub fn is_container(&self) -> bool {
        matches!(
            self,
            Kind::Class
                | Kind::Module
                | Kind::External
                | Kind::Namespace
                | Kind::Mixin
                | Kind::Interface
        )
    }
}

impl From<String> for Kind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "module" => Kind::Module,
            "class" => Kind::Class,
            "namespace" => Kind::Namespace,
            "mixin" => Kind::Mixin,
            "external" => Kind::External,
            "interface" => Kind::Interface,
            "event" => Kind::Event,
            "member" => Kind::Member,
            "function" => Kind::Function,
            "typedef" => Kind::Typedef,
            "constant" => Kind::Constant,
            "package" => Kind::Package,
            "file" => Kind::File,
            "mainpage" => Kind::Mainpage,
            "globalobj" => Kind::Globalobj,
            "source" => Kind::Source,
            _ => Kind::Other(s),
        }
    }
}

impl Default for Kind {
    fn default() -> Self {
        Kind::Other(String::new())
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Global,
    Static,
    Instance,
    Inner,
}

impl Scope {
    /// Punctuation joining a member to its parent in a longname.
    pub fn punc(self) -> &'static str {
        match self {
            Scope::Static => ".",
            Scope::Instance => "#",
            Scope::Inner => "~",
            Scope::Global => "",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Scope::Global => "global",
            Scope::Static => "static",
            Scope::Instance => "instance",
            Scope::Inner => "inner",
        }
    }
}

/// A `{names: [...]}` type expression.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct TypeSpec {
    pub names: Vec<String>,
}

/// Parameter, property, return or yield entry.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Param {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_spec: Option<TypeSpec>,
    pub optional: bool,
    pub nullable: Option<bool>,
    #[serde(alias = "variable")]
    pub variadic: bool,
    pub description: Option<String>,
    pub defaultvalue: Option<serde_json::Value>,
}

impl Param {
    pub fn type_names(&self) -> &[String] {
        self.type_spec.as_ref().map_or(&[], |t| t.names.as_slice())
    }
}

/// Example block; captions are split off by the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "String")]
pub struct Example {
    pub caption: String,
    pub code: String,
}

impl From<String> for Example {
    fn from(code: String) -> Self {
        Example {
            caption: String::new(),
            code,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CodeMeta {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub node_type: Option<String>,
}

/// Where a doclet came from.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Meta {
    pub filename: String,
    pub path: Option<String>,
    pub lineno: Option<u32>,
    pub code: CodeMeta,
    /// Source path with the common prefix removed, set by the link stage.
    #[serde(skip)]
    pub shortpath: Option<String>,
}

impl Meta {
    /// Full path of the origin file, `path` joined with `filename`.
    pub fn source_path(&self) -> String {
        match self.path.as_deref() {
            Some(dir) if !dir.is_empty() && dir != "null" => {
                Path::new(dir).join(&self.filename).to_string_lossy().into_owned()
            }
            _ => self.filename.clone(),
        }
    }
}

/// A documented symbol.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Doclet {
    pub longname: String,
    pub name: String,
    pub kind: Kind,
    pub memberof: Option<String>,
    pub scope: Option<Scope>,
    pub access: Option<String>,
    pub description: Option<String>,
    pub summary: Option<String>,
    pub classdesc: Option<String>,
    pub params: Vec<Param>,
    pub returns: Vec<Param>,
    pub yields: Vec<Param>,
    pub properties: Vec<Param>,
    pub exceptions: Vec<Param>,
    #[serde(rename = "type")]
    pub type_spec: Option<TypeSpec>,
    pub examples: Vec<Example>,
    pub see: Vec<String>,
    pub meta: Option<Meta>,
    pub augments: Vec<String>,
    pub fires: Vec<String>,
    pub listens: Vec<String>,
    pub author: Vec<String>,
    pub deprecated: Option<serde_json::Value>,
    pub since: Option<String>,
    pub version: Option<String>,
    pub defaultvalue: Option<serde_json::Value>,
    pub undocumented: bool,
    pub ignore: bool,
    #[serde(rename = "virtual")]
    pub is_virtual: bool,
    #[serde(rename = "async")]
    pub is_async: bool,
    pub generator: bool,
    pub readonly: bool,
    pub nullable: Option<bool>,

    // -- computed ------------------------------------------------------------
    #[serde(skip)]
    pub signature: String,
    #[serde(skip)]
    pub attribs: String,
    #[serde(skip)]
    pub id: String,
    #[serde(skip)]
    pub ancestors: String,
    /// Longnames of doclets that listen to this event.
    #[serde(skip)]
    pub listeners: Vec<String>,
    /// Classes/functions exported as the module itself.
    #[serde(skip)]
    pub module_exports: Vec<Doclet>,
    /// README HTML carried by the synthetic main page.
    #[serde(skip)]
    pub readme: Option<String>,
    /// Escaped source text carried by source-listing pages.
    #[serde(skip)]
    pub code: Option<String>,
}

impl Doclet {
    /// A doclet that exists only for page rendering (main page, global
    /// object, source listing).
    pub fn synthetic(kind: Kind, longname: impl Into<String>) -> Self {
        let longname = longname.into();
        Doclet {
            name: longname.clone(),
            longname,
            kind,
            ..Default::default()
        }
    }

    pub fn type_names(&self) -> &[String] {
        self.type_spec.as_ref().map_or(&[], |t| t.names.as_slice())
    }

    /// Deprecation notice, if any. `true` yields an empty notice.
    pub fn deprecation(&self) -> Option<&str> {
        match self.deprecated.as_ref()? {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Bool(true) => Some(""),
            _ => None,
        }
    }
}

/// Parse a `jsdoc -X` dump: a JSON array of doclets.
pub fn parse_doclets(json: &str) -> serde_json::Result<Vec<Doclet>> {
    serde_json::from_str(json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_doclet() {
        let docs = parse_doclets(r#"[{"longname":"Foo","name":"Foo","kind":"class"}]"#).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].kind, Kind::Class);
        assert!(docs[0].memberof.is_none());
        assert!(docs[0].signature.is_empty());
    }

    #[test]
    fn parse_unknown_kind_is_kept() {
        let docs = parse_doclets(r#"[{"longname":"x","name":"x","kind":"param"}]"#).unwrap();
        assert_eq!(docs[0].kind, Kind::Other("param".to_string()));
        assert_eq!(docs[0].kind.as_str(), "param");
    }

    #[test]
    fn parse_params_and_flags() {
        let docs = parse_doclets(
            r#"[{
                "longname": "f", "name": "f", "kind": "function", "scope": "global",
                "async": true, "virtual": true,
                "params": [{"name": "rest", "variable": true, "type": {"names": ["string"]}}],
                "examples": ["foo()"],
                "meta": {"filename": "a.js", "path": "/src", "lineno": 3, "code": {"type": "FunctionDeclaration"}}
            }]"#,
        )
        .unwrap();
        let f = &docs[0];
        assert!(f.is_async);
        assert!(f.is_virtual);
        assert_eq!(f.scope, Some(Scope::Global));
        assert!(f.params[0].variadic);
        assert_eq!(f.params[0].type_names(), ["string"]);
        assert_eq!(f.examples[0].code, "foo()");
        let meta = f.meta.as_ref().unwrap();
        assert_eq!(meta.code.node_type.as_deref(), Some("FunctionDeclaration"));
        assert_eq!(meta.source_path(), "/src/a.js");
    }

    #[test]
    fn meta_path_null_uses_filename() {
        let meta = Meta {
            filename: "x.js".to_string(),
            path: Some("null".to_string()),
            ..Default::default()
        };
        assert_eq!(meta.source_path(), "x.js");
    }

    #[test]
    fn deprecation_forms() {
        let mut d = Doclet::synthetic(Kind::Function, "f");
        assert_eq!(d.deprecation(), None);
        d.deprecated = Some(serde_json::Value::Bool(true));
        assert_eq!(d.deprecation(), Some(""));
        d.deprecated = Some(serde_json::Value::String("use g".to_string()));
        assert_eq!(d.deprecation(), Some("use g"));
    }
}
