use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use swc_common::sync::Lrc;
use swc_common::{FileName, SourceMap, Spanned};
use swc_ecma_ast::{
    ArrowExpr, BlockStmt, CatchClause, ClassExpr, Constructor, Decl, DefaultDecl, EsVersion,
    Expr, FnExpr, ForInStmt, ForOfStmt, ForStmt, Function, GetterProp, JSXAttrName,
    JSXAttrOrSpread, JSXAttrValue, JSXElement, JSXElementName, JSXExpr, JSXMemberExpr, JSXObject,
    Lit, Module, ModuleDecl, ModuleExportName, ModuleItem, ObjectPatProp, ParamOrTsParamProp, Pat,
    Prop as SwcProp, PropName, PropOrSpread, SetterProp, Stmt, SwitchStmt, TsModuleBlock,
    TsParamPropParam, VarDecl, VarDeclKind,
};
use swc_ecma_parser::lexer::Lexer;
use swc_ecma_parser::{EsConfig, Parser, StringInput, Syntax, TsConfig};
use swc_ecma_visit::{Visit, VisitWith};

use crate::error::TransformError;
use crate::tree::{
    AttrValue, Attribute, BindingKind, Element, Entry, ImportDecl, ImportSpecifier, Key,
    ModuleSource, Prop, Reference, Span, StrLit, Tag, Tree,
};

/// Picks the parser syntax from a file extension. Anything that isn't TypeScript is parsed as
/// ECMAScript with JSX enabled.
pub fn syntax_for(path: &Path) -> Syntax {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("ts") | Some("mts") | Some("cts") => Syntax::Typescript(TsConfig {
            tsx: false,
            ..Default::default()
        }),
        Some("tsx") => Syntax::Typescript(TsConfig {
            tsx: true,
            ..Default::default()
        }),
        _ => Syntax::Es(EsConfig {
            jsx: true,
            ..Default::default()
        }),
    }
}

/// Parses `source` with [`swc_ecma_parser`] and lowers the module into a [`Tree`].
///
/// Recoverable parser errors are treated the same as fatal ones: a file that doesn't parse
/// cleanly is never rewritten.
pub fn parse(path: &Path, source: &str) -> Result<Tree, TransformError> {
    let cm = Lrc::<SourceMap>::default();
    let fm = cm.new_source_file(FileName::Real(path.to_path_buf()), source.to_string());

    let lexer = Lexer::new(
        syntax_for(path),
        EsVersion::EsNext,
        StringInput::from(&*fm),
        None,
    );

    let mut parser = Parser::new_from(lexer);
    let base = fm.start_pos.0;
    let failure = |error: swc_ecma_parser::error::Error| {
        let offset = error.span().lo.0.saturating_sub(base) as usize;
        let (line, column) = line_col(source, offset);
        TransformError::Parse {
            path: path.to_path_buf(),
            line,
            column,
            message: error.kind().msg().into_owned(),
        }
    };

    let module = parser.parse_module().map_err(&failure)?;
    if let Some(error) = parser.take_errors().into_iter().next() {
        return Err(failure(error));
    }

    Ok(lower(&module, source, base))
}

/// Converts a byte offset into a one-based `(line, column)` pair.
pub fn line_col(text: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(text.len());
    let before = text.get(..offset).unwrap_or(text);
    let line = before.matches('\n').count() + 1;
    let column = before
        .rfind('\n')
        .map_or(before.chars().count(), |nl| before[nl + 1..].chars().count())
        + 1;
    (line, column)
}

/// Lowers a parsed [`swc_ecma_ast::Module`] into a [`Tree`]. `base` is the position of the
/// file's first byte in the source map.
pub fn lower(module: &Module, text: &str, base: u32) -> Tree {
    let mut lowering = Lowering {
        text,
        base,
        tree: Tree::default(),
        scopes: Vec::new(),
        open: Vec::new(),
    };
    module.visit_with(&mut lowering);
    lowering.tree
}

struct Lowering<'a> {
    text: &'a str,
    base: u32,
    tree: Tree,

    /// Names declared by enclosing non-module scopes, innermost last.
    scopes: Vec<HashSet<String>>,

    /// Indices of the elements currently being visited, innermost last.
    open: Vec<usize>,
}

impl<'a> Lowering<'a> {
    fn span(&self, span: swc_common::Span) -> Span {
        Span::new(
            span.lo.0.saturating_sub(self.base) as usize,
            span.hi.0.saturating_sub(self.base) as usize,
        )
    }

    fn with_scope(&mut self, names: HashSet<String>, f: impl FnOnce(&mut Self)) {
        self.scopes.push(names);
        f(self);
        self.scopes.pop();
    }

    fn is_shadowed(&self, name: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(name))
    }

    fn lower_import(&mut self, decl: &swc_ecma_ast::ImportDecl) {
        let origin = self.span(decl.span);
        let source_span = self.span(decl.src.span);
        let quote = source_span.slice(self.text).chars().next().unwrap_or('\'');

        let specifiers = decl
            .specifiers
            .iter()
            .map(|specifier| match specifier {
                swc_ecma_ast::ImportSpecifier::Named(named) => ImportSpecifier {
                    kind: BindingKind::Named,
                    imported: match &named.imported {
                        Some(ModuleExportName::Ident(ident)) => ident.sym.to_string(),
                        Some(ModuleExportName::Str(s)) => s.value.to_string(),
                        None => named.local.sym.to_string(),
                    },
                    local: named.local.sym.to_string(),
                    type_only: named.is_type_only,
                },
                swc_ecma_ast::ImportSpecifier::Default(default) => ImportSpecifier {
                    kind: BindingKind::Default,
                    imported: "default".to_string(),
                    local: default.local.sym.to_string(),
                    type_only: false,
                },
                swc_ecma_ast::ImportSpecifier::Namespace(namespace) => ImportSpecifier {
                    kind: BindingKind::Namespace,
                    imported: "*".to_string(),
                    local: namespace.local.sym.to_string(),
                    type_only: false,
                },
            })
            .collect();

        self.tree.imports.push(ImportDecl {
            origin,
            source: ModuleSource {
                value: decl.src.value.to_string(),
                quote,
                span: source_span,
            },
            specifiers,
            type_only: decl.type_only,
            semicolon: origin.slice(self.text).trim_end().ends_with(';'),
        });
    }

    fn lower_tag(&self, name: &JSXElementName) -> Tag {
        match name {
            JSXElementName::Ident(ident) => {
                let name = ident.sym.to_string();
                if is_intrinsic(&name) {
                    Tag::Intrinsic(name)
                } else {
                    Tag::Reference(Reference {
                        shadowed: self.is_shadowed(&name),
                        root: name,
                        members: Vec::new(),
                    })
                }
            }
            JSXElementName::JSXMemberExpr(member) => {
                let (root, members) = member_path(member);
                Tag::Reference(Reference {
                    shadowed: self.is_shadowed(&root),
                    root,
                    members,
                })
            }
            JSXElementName::JSXNamespacedName(name) => {
                Tag::Intrinsic(format!("{}:{}", name.ns.sym, name.name.sym))
            }
        }
    }

    fn lower_attr(&self, attr: &JSXAttrOrSpread) -> Attribute {
        match attr {
            JSXAttrOrSpread::SpreadElement(spread) => Attribute::Spread(self.span(spread.span())),
            JSXAttrOrSpread::JSXAttr(attr) => {
                let name = match &attr.name {
                    JSXAttrName::Ident(ident) => ident.sym.to_string(),
                    JSXAttrName::JSXNamespacedName(name) => {
                        format!("{}:{}", name.ns.sym, name.name.sym)
                    }
                };
                let value = match &attr.value {
                    None => AttrValue::Absent,
                    Some(JSXAttrValue::Lit(Lit::Str(s))) => {
                        AttrValue::Str(self.str_lit(&s.value, s.span, false))
                    }
                    Some(JSXAttrValue::Lit(lit)) => AttrValue::Literal(self.span(lit.span())),
                    Some(JSXAttrValue::JSXExprContainer(container)) => match &container.expr {
                        JSXExpr::Expr(expr) => self.lower_value(expr),
                        JSXExpr::JSXEmptyExpr(empty) => AttrValue::Literal(self.span(empty.span)),
                    },
                    Some(JSXAttrValue::JSXElement(element)) => {
                        AttrValue::Element(self.span(element.span))
                    }
                    Some(JSXAttrValue::JSXFragment(fragment)) => {
                        AttrValue::Element(self.span(fragment.span))
                    }
                };

                Attribute::Prop(Prop {
                    span: self.span(attr.span),
                    key: Key {
                        name,
                        span: self.span(attr.name.span()),
                    },
                    value,
                })
            }
        }
    }

    fn lower_value(&self, expr: &Expr) -> AttrValue {
        match expr {
            Expr::Lit(Lit::Str(s)) => AttrValue::Str(self.str_lit(&s.value, s.span, true)),
            Expr::Lit(lit) => AttrValue::Literal(self.span(lit.span())),

            Expr::Tpl(tpl) if tpl.exprs.is_empty() => {
                let span = self.span(tpl.span);
                let raw = span.slice(self.text);
                let value = raw
                    .strip_prefix('`')
                    .and_then(|raw| raw.strip_suffix('`'))
                    .unwrap_or(raw);
                AttrValue::Str(StrLit {
                    value: value.to_string(),
                    quote: '`',
                    braced: true,
                    span,
                })
            }

            Expr::Paren(paren) => self.lower_value(&paren.expr),
            Expr::TsConstAssertion(assertion) => self.lower_value(&assertion.expr),

            Expr::Object(object) => {
                let mut entries = Vec::with_capacity(object.props.len());
                for prop in &object.props {
                    let PropOrSpread::Prop(prop) = prop else {
                        return AttrValue::Dynamic(self.span(object.span));
                    };
                    let SwcProp::KeyValue(kv) = &**prop else {
                        return AttrValue::Dynamic(self.span(object.span));
                    };
                    let key = match &kv.key {
                        PropName::Ident(ident) => ident.sym.to_string(),
                        PropName::Str(s) => s.value.to_string(),
                        PropName::Num(n) => n.value.to_string(),
                        _ => return AttrValue::Dynamic(self.span(object.span)),
                    };
                    entries.push(Entry {
                        key,
                        value: self.lower_value(&kv.value),
                    });
                }
                AttrValue::Object(entries)
            }

            Expr::JSXElement(element) => AttrValue::Element(self.span(element.span)),
            Expr::JSXFragment(fragment) => AttrValue::Element(self.span(fragment.span)),

            other => AttrValue::Dynamic(self.span(other.span())),
        }
    }

    fn str_lit(&self, value: &str, span: swc_common::Span, braced: bool) -> StrLit {
        let span = self.span(span);
        StrLit {
            value: value.to_string(),
            quote: span.slice(self.text).chars().next().unwrap_or('"'),
            braced,
            span,
        }
    }
}

impl<'a> Visit for Lowering<'a> {
    fn visit_module(&mut self, n: &Module) {
        let mut locals = BTreeSet::new();
        for item in &n.body {
            match item {
                ModuleItem::ModuleDecl(ModuleDecl::Import(decl)) => self.lower_import(decl),
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                    decl_names(&export.decl, true, &mut locals)
                }
                ModuleItem::ModuleDecl(ModuleDecl::ExportDefaultDecl(export)) => {
                    let ident = match &export.decl {
                        DefaultDecl::Fn(f) => f.ident.as_ref(),
                        DefaultDecl::Class(c) => c.ident.as_ref(),
                        DefaultDecl::TsInterfaceDecl(_) => None,
                    };
                    if let Some(ident) = ident {
                        locals.insert(ident.sym.to_string());
                    }
                }
                ModuleItem::Stmt(Stmt::Decl(decl)) => decl_names(decl, true, &mut locals),
                _ => {}
            }
        }

        let mut vars = VarNames::default();
        n.visit_children_with(&mut vars);
        locals.extend(vars.0);
        self.tree.module_locals = locals;

        n.visit_children_with(self);
    }

    fn visit_function(&mut self, n: &Function) {
        let mut names = HashSet::new();
        for param in &n.params {
            pat_names(&param.pat, &mut names);
        }
        if let Some(body) = &n.body {
            let mut vars = VarNames::default();
            body.visit_with(&mut vars);
            names.extend(vars.0);
        }
        self.with_scope(names, |this| n.visit_children_with(this));
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        let names = n.ident.iter().map(|ident| ident.sym.to_string()).collect();
        self.with_scope(names, |this| n.visit_children_with(this));
    }

    fn visit_class_expr(&mut self, n: &ClassExpr) {
        let names = n.ident.iter().map(|ident| ident.sym.to_string()).collect();
        self.with_scope(names, |this| n.visit_children_with(this));
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        let mut names = HashSet::new();
        for param in &n.params {
            pat_names(param, &mut names);
        }
        let mut vars = VarNames::default();
        n.body.visit_with(&mut vars);
        names.extend(vars.0);
        self.with_scope(names, |this| n.visit_children_with(this));
    }

    fn visit_block_stmt(&mut self, n: &BlockStmt) {
        let mut names = HashSet::new();
        for stmt in &n.stmts {
            if let Stmt::Decl(decl) = stmt {
                decl_names(decl, false, &mut names);
            }
        }
        self.with_scope(names, |this| n.visit_children_with(this));
    }

    fn visit_constructor(&mut self, n: &Constructor) {
        let mut names = HashSet::new();
        for param in &n.params {
            match param {
                ParamOrTsParamProp::Param(param) => pat_names(&param.pat, &mut names),
                ParamOrTsParamProp::TsParamProp(prop) => match &prop.param {
                    TsParamPropParam::Ident(binding) => {
                        names.insert(binding.id.sym.to_string());
                    }
                    TsParamPropParam::Assign(assign) => pat_names(&assign.left, &mut names),
                },
            }
        }
        if let Some(body) = &n.body {
            let mut vars = VarNames::default();
            body.visit_with(&mut vars);
            names.extend(vars.0);
        }
        self.with_scope(names, |this| n.visit_children_with(this));
    }

    fn visit_setter_prop(&mut self, n: &SetterProp) {
        let mut names = HashSet::new();
        pat_names(&n.param, &mut names);
        if let Some(body) = &n.body {
            let mut vars = VarNames::default();
            body.visit_with(&mut vars);
            names.extend(vars.0);
        }
        self.with_scope(names, |this| n.visit_children_with(this));
    }

    fn visit_getter_prop(&mut self, n: &GetterProp) {
        let mut vars = VarNames::default();
        n.body.visit_with(&mut vars);
        self.with_scope(vars.0, |this| n.visit_children_with(this));
    }

    fn visit_switch_stmt(&mut self, n: &SwitchStmt) {
        // every case shares the block of the switch
        let mut names = HashSet::new();
        for case in &n.cases {
            for stmt in &case.cons {
                if let Stmt::Decl(decl) = stmt {
                    decl_names(decl, false, &mut names);
                }
            }
        }
        self.with_scope(names, |this| n.visit_children_with(this));
    }

    fn visit_ts_module_block(&mut self, n: &TsModuleBlock) {
        let mut names = HashSet::new();
        for item in &n.body {
            match item {
                ModuleItem::Stmt(Stmt::Decl(decl)) => decl_names(decl, true, &mut names),
                ModuleItem::ModuleDecl(ModuleDecl::ExportDecl(export)) => {
                    decl_names(&export.decl, true, &mut names)
                }
                _ => {}
            }
        }
        let mut vars = VarNames::default();
        n.visit_children_with(&mut vars);
        names.extend(vars.0);
        self.with_scope(names, |this| n.visit_children_with(this));
    }

    fn visit_catch_clause(&mut self, n: &CatchClause) {
        let mut names = HashSet::new();
        if let Some(param) = &n.param {
            pat_names(param, &mut names);
        }
        self.with_scope(names, |this| n.visit_children_with(this));
    }

    fn visit_for_stmt(&mut self, n: &ForStmt) {
        let mut head = HeadNames::default();
        n.init.visit_with(&mut head);
        self.with_scope(head.0, |this| n.visit_children_with(this));
    }

    fn visit_for_in_stmt(&mut self, n: &ForInStmt) {
        let mut head = HeadNames::default();
        n.left.visit_with(&mut head);
        self.with_scope(head.0, |this| n.visit_children_with(this));
    }

    fn visit_for_of_stmt(&mut self, n: &ForOfStmt) {
        let mut head = HeadNames::default();
        n.left.visit_with(&mut head);
        self.with_scope(head.0, |this| n.visit_children_with(this));
    }

    fn visit_jsx_element(&mut self, n: &JSXElement) {
        let id = self.tree.elements.len();
        let element = Element {
            span: self.span(n.opening.span),
            tag: self.lower_tag(&n.opening.name),
            attrs: n.opening.attrs.iter().map(|attr| self.lower_attr(attr)).collect(),
            parent: self.open.last().copied(),
        };
        self.tree.elements.push(element);

        self.open.push(id);
        n.visit_children_with(self);
        self.open.pop();
    }
}

/// Collects `var` declarations, which are hoisted to the enclosing function, without
/// descending into nested functions or classes.
#[derive(Default)]
struct VarNames(HashSet<String>);

impl Visit for VarNames {
    fn visit_var_decl(&mut self, n: &VarDecl) {
        if n.kind == VarDeclKind::Var {
            for declarator in &n.decls {
                pat_names(&declarator.name, &mut self.0);
            }
        }
        n.visit_children_with(self);
    }

    fn visit_function(&mut self, _: &Function) {}
    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}
    fn visit_class(&mut self, _: &swc_ecma_ast::Class) {}
    fn visit_getter_prop(&mut self, _: &GetterProp) {}
    fn visit_setter_prop(&mut self, _: &SetterProp) {}
    fn visit_ts_module_block(&mut self, _: &TsModuleBlock) {}
}

/// Collects every name declared in a loop head.
#[derive(Default)]
struct HeadNames(HashSet<String>);

impl Visit for HeadNames {
    fn visit_var_decl(&mut self, n: &VarDecl) {
        for declarator in &n.decls {
            pat_names(&declarator.name, &mut self.0);
        }
    }

    fn visit_function(&mut self, _: &Function) {}
    fn visit_arrow_expr(&mut self, _: &ArrowExpr) {}
}

/// Adds the value names a declaration binds. Block-level `var`s are skipped unless
/// `include_var` is set, since they belong to the enclosing function.
fn decl_names<S: Extend<String>>(decl: &Decl, include_var: bool, out: &mut S) {
    match decl {
        Decl::Fn(f) => out.extend([f.ident.sym.to_string()]),
        Decl::Class(c) => out.extend([c.ident.sym.to_string()]),
        Decl::TsEnum(e) => out.extend([e.id.sym.to_string()]),
        Decl::Var(var) => {
            if var.kind != VarDeclKind::Var || include_var {
                let mut names = HashSet::new();
                for declarator in &var.decls {
                    pat_names(&declarator.name, &mut names);
                }
                out.extend(names);
            }
        }
        _ => {}
    }
}

fn pat_names(pat: &Pat, out: &mut HashSet<String>) {
    match pat {
        Pat::Ident(binding) => {
            out.insert(binding.id.sym.to_string());
        }
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                pat_names(elem, out);
            }
        }
        Pat::Rest(rest) => pat_names(&rest.arg, out),
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => pat_names(&kv.value, out),
                    ObjectPatProp::Assign(assign) => {
                        out.insert(assign.key.sym.to_string());
                    }
                    ObjectPatProp::Rest(rest) => pat_names(&rest.arg, out),
                }
            }
        }
        Pat::Assign(assign) => pat_names(&assign.left, out),
        _ => {}
    }
}

fn member_path(member: &JSXMemberExpr) -> (String, Vec<String>) {
    let (root, mut members) = match &member.obj {
        JSXObject::Ident(ident) => (ident.sym.to_string(), Vec::new()),
        JSXObject::JSXMemberExpr(inner) => member_path(inner),
    };
    members.push(member.prop.sym.to_string());
    (root, members)
}

/// Host elements start with a lowercase letter or contain a dash.
fn is_intrinsic(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_lowercase()) || name.contains('-')
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::{line_col, parse};
    use crate::error::TransformError;
    use crate::testing::*;
    use crate::tree::{AttrValue, Attribute, BindingKind, Tag};

    #[test]
    fn empty() {
        let tree = parse_helper("");
        assert!(tree.imports.is_empty());
        assert!(tree.elements.is_empty());
    }

    #[test]
    fn imports() {
        let tree = parse_helper(
            "import Lab, { Button as Btn, type ButtonProps } from '@ui/lab';\nimport * as Core from \"@ui/core\"\nimport './styles.css';\n",
        );
        assert_eq!(tree.imports.len(), 3);

        let lab = &tree.imports[0];
        assert_eq!(lab.source.value, "@ui/lab");
        assert_eq!(lab.source.quote, '\'');
        assert!(lab.semicolon);
        let kinds: Vec<_> = lab.specifiers.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, [BindingKind::Default, BindingKind::Named, BindingKind::Named]);
        assert_eq!(lab.specifiers[1].imported, "Button");
        assert_eq!(lab.specifiers[1].local, "Btn");
        assert!(lab.specifiers[2].type_only);

        let core = &tree.imports[1];
        assert_eq!(core.source.quote, '"');
        assert!(!core.semicolon);
        assert_eq!(core.specifiers[0].kind, BindingKind::Namespace);
        assert_eq!(core.specifiers[0].local, "Core");

        assert!(tree.imports[2].specifiers.is_empty());
    }

    #[test]
    fn element_attributes() {
        let tree = parse_helper(
            "const a = <Button size=\"lg\" disabled count={2} onClick={handle} {...rest} icon={<Icon />} />;",
        );
        assert_eq!(tree.elements.len(), 2);

        let button = &tree.elements[0];
        let values: Vec<_> = button
            .attrs
            .iter()
            .map(|attr| match attr {
                Attribute::Prop(prop) => match &prop.value {
                    AttrValue::Absent => "absent",
                    AttrValue::Str(_) => "str",
                    AttrValue::Literal(_) => "literal",
                    AttrValue::Object(_) => "object",
                    AttrValue::Element(_) => "element",
                    AttrValue::Dynamic(_) => "dynamic",
                },
                Attribute::Spread(_) => "spread",
            })
            .collect();
        assert_eq!(
            values,
            ["str", "absent", "literal", "dynamic", "spread", "element"]
        );

        // the icon element nests inside the attribute of its parent
        assert_eq!(tree.elements[1].parent, Some(0));
    }

    #[test]
    fn string_values() {
        let tree = parse_helper(
            "<><A size={'sm'} /><A size={`md`} /><A size={\"lg\" as const} /><A size={`x${y}`} /></>",
        );
        let values: Vec<_> = tree
            .elements
            .iter()
            .map(|element| match &element.attrs[0] {
                Attribute::Prop(prop) => match &prop.value {
                    AttrValue::Str(s) => Some((s.value.clone(), s.quote, s.braced)),
                    _ => None,
                },
                Attribute::Spread(_) => None,
            })
            .collect();
        assert_eq!(
            values,
            [
                Some(("sm".to_string(), '\'', true)),
                Some(("md".to_string(), '`', true)),
                Some(("lg".to_string(), '"', true)),
                None,
            ]
        );
    }

    #[test]
    fn object_values() {
        let tree = parse_helper("<A size={{ mobile: 'small', 'desktop': big }} />");
        let Attribute::Prop(prop) = &tree.elements[0].attrs[0] else {
            panic!("expected a prop");
        };
        let AttrValue::Object(entries) = &prop.value else {
            panic!("expected an object value");
        };
        assert_eq!(entries[0].key, "mobile");
        assert!(matches!(&entries[0].value, AttrValue::Str(s) if s.value == "small"));
        assert_eq!(entries[1].key, "desktop");
        assert!(matches!(entries[1].value, AttrValue::Dynamic(_)));
    }

    #[test]
    fn tags() {
        let tree = parse_helper("<div><Lab.Button /><svg:path /><my-widget /></div>");
        assert_eq!(tree.elements[0].tag, Tag::Intrinsic("div".to_string()));
        match &tree.elements[1].tag {
            Tag::Reference(reference) => {
                assert_eq!(reference.root, "Lab");
                assert_eq!(reference.members, ["Button"]);
                assert!(!reference.shadowed);
            }
            other => panic!("unexpected tag {:?}", other),
        }
        assert_eq!(tree.elements[2].tag, Tag::Intrinsic("svg:path".to_string()));
        assert_eq!(tree.elements[3].tag, Tag::Intrinsic("my-widget".to_string()));
        assert!(tree.elements[1..].iter().all(|e| e.parent == Some(0)));
    }

    fn shadowed(source: &str) -> Vec<bool> {
        parse_helper(source)
            .elements
            .iter()
            .map(|element| match &element.tag {
                Tag::Reference(reference) => reference.shadowed,
                Tag::Intrinsic(_) => false,
            })
            .collect()
    }

    #[test]
    fn shadowing() {
        assert_eq!(
            shadowed("function App() { function Button() {} return <Button />; }"),
            [true]
        );
        assert_eq!(shadowed("const f = (Button) => <Button />;"), [true]);
        assert_eq!(shadowed("const f = ({ Button }) => <Button />;"), [true]);
        assert_eq!(
            shadowed("function f() { if (x) { var Button = 1; } return <Button />; }"),
            [true]
        );
        assert_eq!(
            shadowed("function f() { { let Button = 1; } return <Button />; }"),
            [false]
        );
        assert_eq!(
            shadowed("for (const Button of list) { use(<Button />); } use(<Button />);"),
            [true, false]
        );
        assert_eq!(
            shadowed("try {} catch (Button) { use(<Button />); }"),
            [true]
        );
        assert_eq!(shadowed("const f = () => <Button />;"), [false]);
    }

    #[test]
    fn shadowing_in_nested_scopes() {
        assert_eq!(
            shadowed("function f(x) { switch (x) { case 1: const Button = () => null; default: return <Button />; } }"),
            [true]
        );
        assert_eq!(
            shadowed("class A { constructor(Button) { this.el = <Button />; } }"),
            [true]
        );
        assert_eq!(
            shadowed("class A { constructor(private Button: any) { this.el = <Button />; } }"),
            [true]
        );
        assert_eq!(
            shadowed("class A { constructor() { if (x) { var Button = 1; } this.el = <Button />; } }"),
            [true]
        );
        assert_eq!(
            shadowed("const o = { set el(Button) { use(<Button />); } };"),
            [true]
        );
        assert_eq!(
            shadowed("const o = { get el() { var Button = 1; return <Button />; } };
use(<Button />);"),
            [true, false]
        );
        assert_eq!(
            shadowed("namespace Ui { const Button = () => null; export const a = <Button />; }
use(<Button />);"),
            [true, false]
        );
    }

    #[test]
    fn module_locals() {
        let tree = parse_helper(
            "import { Button } from 'x';\nfunction Card() {}\nexport const Box = 1;\nexport default class Panel {}\nif (x) { var Flag = 1; }\nfunction f() { var Inner = 1; }",
        );
        let locals: Vec<_> = tree.module_locals.iter().map(String::as_str).collect();
        assert_eq!(locals, ["Box", "Card", "Flag", "Panel", "f"]);
    }

    #[test]
    fn typescript() {
        let tree = parse_helper_at(
            "button.ts",
            "import type { ButtonProps } from '@ui/lab';\nconst x = <ButtonProps>value;",
        );
        assert!(tree.imports[0].type_only);
        assert!(tree.elements.is_empty());
    }

    #[test]
    fn parse_failure() {
        match parse(Path::new("broken.jsx"), "const a = <Button size=\"lg\" ;") {
            Err(TransformError::Parse { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected a parse failure, got {:?}", other),
        }
    }

    #[test]
    fn recoverable_parse_failure() {
        // swc recovers from a legacy octal literal in module code and only reports it afterwards
        match parse(Path::new("legacy.js"), "const a = 08;\nexport default a;") {
            Err(TransformError::Parse { line, .. }) => assert_eq!(line, 1),
            other => panic!("expected a parse failure, got {:?}", other),
        }
    }

    #[test]
    fn positions() {
        assert_eq!(line_col("ab\ncd", 0), (1, 1));
        assert_eq!(line_col("ab\ncd", 4), (2, 2));
        assert_eq!(line_col("ab", 99), (1, 3));
    }
}
