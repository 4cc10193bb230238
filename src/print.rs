use crate::tree::{AttrValue, Attribute, BindingKind, ImportDecl, Span, StrLit, Tree};

/// A replacement of one byte range of the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Edit {
    span: Span,
    text: String,
}

impl Edit {
    fn new(span: Span, text: impl Into<String>) -> Self {
        Self {
            span,
            text: text.into(),
        }
    }
}

/// Serializes `rewritten` back to source.
///
/// Only nodes that differ from `original` (the tree `text` was parsed into) are printed;
/// everything else is copied from `text` untouched. When nothing differs the result is
/// `text` byte for byte.
pub fn print(text: &str, original: &Tree, rewritten: &Tree) -> Result<String, String> {
    let mut edits = Vec::new();
    import_edits(text, original, rewritten, &mut edits);
    element_edits(text, original, rewritten, &mut edits)?;
    apply(text, without_removed(edits))
}

/// Drops the edits that fall inside text another edit removes, ie a nested element rewritten
/// inside an attribute that was dropped.
fn without_removed(edits: Vec<Edit>) -> Vec<Edit> {
    let removals: Vec<Span> = edits
        .iter()
        .filter(|edit| edit.text.is_empty())
        .map(|edit| edit.span)
        .collect();

    edits
        .into_iter()
        .filter(|edit| {
            !removals.iter().any(|removal| {
                *removal != edit.span && removal.lo <= edit.span.lo && edit.span.hi <= removal.hi
            })
        })
        .collect()
}

fn import_edits(text: &str, original: &Tree, rewritten: &Tree, edits: &mut Vec<Edit>) {
    for before in &original.imports {
        let group: Vec<&ImportDecl> = rewritten
            .imports
            .iter()
            .filter(|decl| decl.origin == before.origin)
            .collect();

        match group.as_slice() {
            [] => edits.push(Edit::new(line_removal(text, before.origin), "")),
            [after]
                if after.specifiers == before.specifiers
                    && after.type_only == before.type_only =>
            {
                if after.source.value != before.source.value {
                    edits.push(Edit::new(
                        before.source.span,
                        quote(&after.source.value, after.source.quote),
                    ));
                }
            }
            group => {
                let rendered: Vec<String> = group.iter().map(|decl| render_import(decl)).collect();
                edits.push(Edit::new(before.origin, rendered.join("\n")));
            }
        }
    }
}

fn element_edits(
    text: &str,
    original: &Tree,
    rewritten: &Tree,
    edits: &mut Vec<Edit>,
) -> Result<(), String> {
    if original.elements.len() != rewritten.elements.len() {
        return Err("element count changed".to_string());
    }

    for (before, after) in original.elements.iter().zip(&rewritten.elements) {
        for attr in &before.attrs {
            let Attribute::Prop(old) = attr else {
                continue;
            };
            match after.attrs.iter().find(|attr| attr.span() == old.span) {
                None => edits.push(Edit::new(attr_removal(text, old.span), "")),
                Some(Attribute::Prop(new)) => {
                    if new.key.name != old.key.name {
                        edits.push(Edit::new(old.key.span, new.key.name.clone()));
                    }
                    value_edits(&old.value, &new.value, edits);
                }
                Some(Attribute::Spread(_)) => {
                    return Err(format!("attribute at {} turned into a spread", old.span.lo));
                }
            }
        }
    }

    Ok(())
}

fn value_edits(before: &AttrValue, after: &AttrValue, edits: &mut Vec<Edit>) {
    match (before, after) {
        (AttrValue::Str(old), AttrValue::Str(new)) if old.value != new.value => {
            edits.push(Edit::new(old.span, render_str(new)));
        }
        (AttrValue::Object(old), AttrValue::Object(new)) => {
            for (old, new) in old.iter().zip(new) {
                value_edits(&old.value, &new.value, edits);
            }
        }
        _ => {}
    }
}

fn apply(text: &str, mut edits: Vec<Edit>) -> Result<String, String> {
    if edits.is_empty() {
        return Ok(text.to_string());
    }

    edits.sort_by_key(|edit| (edit.span.lo, edit.span.hi));

    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.span.lo < cursor || edit.span.hi > text.len() {
            return Err(format!(
                "overlapping edit at {}..{}",
                edit.span.lo, edit.span.hi
            ));
        }
        out.push_str(&text[cursor..edit.span.lo]);
        out.push_str(&edit.text);
        cursor = edit.span.hi;
    }
    out.push_str(&text[cursor..]);

    Ok(out)
}

/// Extends an attribute span over the whitespace separating it from what comes before.
fn attr_removal(text: &str, span: Span) -> Span {
    let before = text.get(..span.lo).unwrap_or("");
    Span::new(before.trim_end().len(), span.hi)
}

/// Extends a statement span over the rest of its line when nothing else follows on it.
fn line_removal(text: &str, span: Span) -> Span {
    let rest = text.get(span.hi..).unwrap_or("");
    let line = rest.find('\n').map_or(rest, |nl| &rest[..=nl]);
    if line.trim().is_empty() {
        Span::new(span.lo, span.hi + line.len())
    } else {
        span
    }
}

/// Renders an import declaration from scratch.
pub fn render_import(decl: &ImportDecl) -> String {
    let mut clauses = Vec::new();
    let mut named = Vec::new();
    for specifier in &decl.specifiers {
        match specifier.kind {
            BindingKind::Default => clauses.push(specifier.local.clone()),
            BindingKind::Namespace => clauses.push(format!("* as {}", specifier.local)),
            BindingKind::Named => {
                let imported = if is_identifier(&specifier.imported) {
                    specifier.imported.clone()
                } else {
                    quote(&specifier.imported, decl.source.quote)
                };
                let mut clause = String::new();
                if specifier.type_only {
                    clause.push_str("type ");
                }
                if imported == specifier.local {
                    clause.push_str(&imported);
                } else {
                    clause.push_str(&format!("{} as {}", imported, specifier.local));
                }
                named.push(clause);
            }
        }
    }
    if !named.is_empty() {
        clauses.push(format!("{{ {} }}", named.join(", ")));
    }

    let mut out = String::from("import ");
    if decl.type_only {
        out.push_str("type ");
    }
    if !clauses.is_empty() {
        out.push_str(&clauses.join(", "));
        out.push_str(" from ");
    }
    out.push_str(&quote(&decl.source.value, decl.source.quote));
    if decl.semicolon {
        out.push(';');
    }
    out
}

fn render_str(lit: &StrLit) -> String {
    if !lit.braced {
        // markup attribute strings can't escape their quote, so switch quotes instead
        let quote = match lit.quote {
            '"' if lit.value.contains('"') => '\'',
            '\'' if lit.value.contains('\'') => '"',
            quote => quote,
        };
        return format!("{0}{1}{0}", quote, lit.value);
    }
    quote(&lit.value, lit.quote)
}

fn quote(value: &str, quote: char) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '$' if quote == '`' => out.push_str("\\$"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .map_or(false, |c| c == '_' || c == '$' || c.is_alphabetic())
        && chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}
