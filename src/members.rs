//! Member classifier: kind-based groups used by the nav and page emitter.

use crate::model::{Doclet, Kind};
use crate::query::{DocletFilter, DocletStore};

/// Doclets partitioned by kind. `globals` are top-level members, functions,
/// constants and typedefs.
#[derive(Debug, Default)]
pub struct Members<'a> {
    pub modules: Vec<&'a Doclet>,
    pub externals: Vec<&'a Doclet>,
    pub namespaces: Vec<&'a Doclet>,
    pub classes: Vec<&'a Doclet>,
    pub interfaces: Vec<&'a Doclet>,
    pub events: Vec<&'a Doclet>,
    pub mixins: Vec<&'a Doclet>,
    pub globals: Vec<&'a Doclet>,
}

pub fn get_members(store: &DocletStore) -> Members<'_> {
    let of_kind = |kind: Kind| store.find(&DocletFilter::new().kind(kind));
    Members {
        modules: of_kind(Kind::Module),
        externals: of_kind(Kind::External),
        namespaces: of_kind(Kind::Namespace),
        classes: of_kind(Kind::Class),
        interfaces: of_kind(Kind::Interface),
        events: of_kind(Kind::Event),
        mixins: of_kind(Kind::Mixin),
        globals: store.find(
            &DocletFilter::new()
                .kinds(&[Kind::Member, Kind::Function, Kind::Constant, Kind::Typedef])
                .no_memberof(),
        ),
    }
}

/// Attach classes and functions whose longname equals a module's longname
/// (the module exports that symbol) to the module, renamed for display as
/// `(require("name"))`. Only symbols with a description are kept, except
/// classes, which always show their constructor.
pub fn attach_module_symbols(store: &mut DocletStore) {
    let exports: Vec<Doclet> = store
        .find(
            &DocletFilter::new()
                .kinds(&[Kind::Class, Kind::Function])
                .longname_prefix("module:"),
        )
        .into_iter()
        .filter(|d| d.description.is_some() || d.kind == Kind::Class)
        .map(|d| {
            let mut symbol = d.clone();
            symbol.name = format!("{}\"))", symbol.name.replacen("module:", "(require(\"", 1));
            symbol
        })
        .collect();

    if exports.is_empty() {
        return;
    }
    for module in store.iter_mut().filter(|d| d.kind == Kind::Module) {
        module.module_exports = exports
            .iter()
            .filter(|s| s.longname == module.longname)
            .cloned()
            .collect();
    }
}
