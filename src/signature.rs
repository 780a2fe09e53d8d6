//! Signature synthesizer: display signatures and attribute badges.
//!
//! Runs after every link is registered so type names can be hyperlinked.

use crate::html::{htmlsafe, signature_attributes, type_signature};
use crate::link::LinkRegistry;
use crate::model::{Doclet, Kind, Param, Scope};
use crate::query::DocletStore;

/// Whether `doclet` is shown with a call signature.
pub fn needs_signature(doclet: &Doclet) -> bool {
    match doclet.kind {
        Kind::Function | Kind::Class => true,
        // typedefs that describe a function
        Kind::Typedef => doclet
            .type_names()
            .iter()
            .any(|name| name.eq_ignore_ascii_case("function")),
        // namespaces that are themselves functions
        Kind::Namespace => doclet
            .meta
            .as_ref()
            .and_then(|m| m.code.node_type.as_deref())
            .is_some_and(|t| t.contains("Function") || t.contains("function")),
        _ => false,
    }
}

/// Tags shown after a parameter name.
pub fn param_attributes(param: &Param) -> Vec<&'static str> {
    let mut tags = Vec::new();
    if param.optional {
        tags.push("opt");
    }
    match param.nullable {
        Some(true) => tags.push("nullable"),
        Some(false) => tags.push("non-null"),
        None => {}
    }
    tags
}

fn param_name(param: &Param) -> String {
    let mut name = htmlsafe(param.name.as_deref().unwrap_or(""));
    if param.variadic {
        name = format!("&hellip;{}", name);
    }
    let tags = param_attributes(param);
    if !tags.is_empty() {
        name.push_str(&signature_attributes(&tags));
    }
    name
}

/// Rendered top-level parameter names; dotted sub-parameters such as
/// `options.foo` are dropped.
pub fn param_list(params: &[Param]) -> Vec<String> {
    params
        .iter()
        .filter(|p| p.name.as_deref().is_some_and(|n| !n.is_empty() && !n.contains('.')))
        .map(param_name)
        .collect()
}

/// Attribute tags of a doclet: modifiers, non-public access, non-instance
/// scope, readonly, constant, and nullability.
pub fn doclet_attributes(doclet: &Doclet) -> Vec<String> {
    let mut attribs = Vec::new();
    if doclet.is_async {
        attribs.push("async".to_string());
    }
    if doclet.generator {
        attribs.push("generator".to_string());
    }
    if doclet.is_virtual {
        attribs.push("abstract".to_string());
    }
    if let Some(access) = doclet.access.as_deref().filter(|a| *a != "public") {
        attribs.push(access.to_string());
    }
    if let Some(scope) = doclet.scope.filter(|s| !matches!(s, Scope::Instance | Scope::Global)) {
        if matches!(doclet.kind, Kind::Function | Kind::Member | Kind::Constant) {
            attribs.push(scope.as_str().to_string());
        }
    }
    if doclet.readonly && doclet.kind == Kind::Member {
        attribs.push("readonly".to_string());
    }
    if doclet.kind == Kind::Constant {
        attribs.push("constant".to_string());
    }
    match doclet.nullable {
        Some(true) => attribs.push("nullable".to_string()),
        Some(false) => attribs.push("non-null".to_string()),
        None => {}
    }
    attribs
}

/// `(a, b) ` escaped, or empty.
pub fn attribs_string(attribs: &[String]) -> String {
    if attribs.is_empty() {
        return String::new();
    }
    htmlsafe(&format!("({}) ", attribs.join(", ")))
}

fn type_strings(links: &LinkRegistry, names: &[String]) -> Vec<String> {
    names.iter().map(|name| links.link_type(name)).collect()
}

pub fn add_signature_params(doclet: &mut Doclet) {
    let params = param_list(&doclet.params);
    doclet.signature = format!("{}({})", doclet.signature, params.join(", "));
}

pub fn add_signature_returns(doclet: &mut Doclet, links: &LinkRegistry) {
    let source = if doclet.yields.is_empty() {
        &doclet.returns
    } else {
        &doclet.yields
    };

    let mut attribs: Vec<String> = Vec::new();
    let mut types: Vec<String> = Vec::new();
    for item in source {
        for tag in param_attributes(item).into_iter().filter(|t| *t != "opt") {
            if !attribs.iter().any(|a| a == tag) {
                attribs.push(tag.to_string());
            }
        }
        types.extend(type_strings(links, item.type_names()));
    }

    let returns = if types.is_empty() {
        String::new()
    } else {
        format!(" &rarr; {}{{{}}}", attribs_string(&attribs), types.join("|"))
    };

    doclet.signature = format!(
        "<span class=\"signature\">{}</span>{}",
        doclet.signature,
        type_signature(&returns)
    );
}

pub fn add_signature_types(doclet: &mut Doclet, links: &LinkRegistry) {
    let types = type_strings(links, doclet.type_names());
    let suffix = if types.is_empty() {
        String::new()
    } else {
        format!(" :{}", types.join("|"))
    };
    doclet.signature = format!("{}{}", doclet.signature, type_signature(&suffix));
}

pub fn add_attribs(doclet: &mut Doclet) {
    let attribs = attribs_string(&doclet_attributes(doclet));
    doclet.attribs = type_signature(&attribs);
}

/// Fill `id`, `signature`, `attribs` and `ancestors` on every doclet.
/// Constants are relabelled as members once their signature is built.
pub fn synthesize(store: &mut DocletStore, links: &LinkRegistry) {
    let ancestors: Vec<String> = store
        .iter()
        .map(|doclet| ancestor_links(store, links, doclet))
        .collect();

    for (doclet, ancestors) in store.iter_mut().zip(ancestors) {
        doclet.id = match links.url(&doclet.longname).and_then(|u| u.split_once('#')) {
            Some((_, fragment)) => fragment.to_string(),
            None => doclet.name.clone(),
        };

        if needs_signature(doclet) {
            add_signature_params(doclet);
            add_signature_returns(doclet, links);
            add_attribs(doclet);
        }

        doclet.ancestors = ancestors;

        match doclet.kind {
            Kind::Member => {
                add_signature_types(doclet, links);
                add_attribs(doclet);
            }
            Kind::Constant => {
                add_signature_types(doclet, links);
                add_attribs(doclet);
                doclet.kind = Kind::Member;
            }
            _ => {}
        }
    }
}

/// Breadcrumb of linked ancestors, the last one followed by the doclet's
/// own scope punctuation.
fn ancestor_links(store: &DocletStore, links: &LinkRegistry, doclet: &Doclet) -> String {
    let chain = store.ancestors(doclet);
    if chain.is_empty() {
        return String::new();
    }
    let mut out: String = chain
        .iter()
        .map(|a| {
            let punc = a.scope.map_or("", Scope::punc);
            links.linkto(&a.longname, Some(&htmlsafe(&format!("{}{}", punc, a.name))), None)
        })
        .collect();
    out.push_str(doclet.scope.map_or("", Scope::punc));
    out
}
