//! Structural extraction of source units
//!
//! Extractors match on surface structure (package line, type header,
//! annotations) rather than parsing a full grammar. Unusual formatting can
//! therefore produce a missed or partial unit.

use super::types::SourceUnit;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Turns one source file into a [`SourceUnit`]
pub trait StructuralExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    /// File extensions handled, without the leading dot
    fn extensions(&self) -> &[&'static str];

    fn handles(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions().contains(&ext))
    }

    /// Returns `None` when no primary type declaration is found.
    /// `relative_path` and `module` are filled in by the scanner.
    fn extract(&self, path: &Path, content: &str) -> Option<SourceUnit>;
}

pub struct JavaExtractor {
    package_re: Regex,
    import_re: Regex,
    type_re: Regex,
}

impl Default for JavaExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl JavaExtractor {
    pub fn new() -> Self {
        Self {
            package_re: Regex::new(r"(?m)^\s*package\s+([\w.]+)\s*;").expect("valid regex"),
            import_re: Regex::new(r"(?m)^\s*import\s+(?:static\s+)?([\w.]+(?:\.\*)?)\s*;")
                .expect("valid regex"),
            type_re: Regex::new(r"\b(class|interface|enum|record)\s+([A-Za-z_$][\w$]*)")
                .expect("valid regex"),
        }
    }
}

/// Simple names of all annotations in `text`, first occurrence order
fn annotations(text: &str) -> Vec<String> {
    static ANNOTATION: OnceLock<Regex> = OnceLock::new();
    let re = ANNOTATION.get_or_init(|| Regex::new(r"@([A-Za-z_][\w.]*)").expect("valid regex"));

    let mut out: Vec<String> = Vec::new();
    for caps in re.captures_iter(text) {
        let full = &caps[1];
        if full == "interface" {
            continue;
        }
        let simple = full.rsplit('.').next().unwrap_or(full).to_string();
        if !out.contains(&simple) {
            out.push(simple);
        }
    }
    out
}

impl StructuralExtractor for JavaExtractor {
    fn name(&self) -> &'static str {
        "java"
    }

    fn extensions(&self) -> &[&'static str] {
        &["java"]
    }

    fn extract(&self, path: &Path, content: &str) -> Option<SourceUnit> {
        let code = strip_comments(content);

        let package = self
            .package_re
            .captures(&code)
            .map(|c| c[1].to_string())
            .unwrap_or_default();

        let imports = self
            .import_re
            .captures_iter(&code)
            .map(|c| c[1].to_string())
            .collect();

        let decl = self.type_re.captures(&code)?;
        let kind = decl.get(1)?.as_str();
        let name = decl.get(2)?.as_str().to_string();
        let decl_start = decl.get(0)?.start();
        let decl_end = decl.get(0)?.end();

        // Annotations between the last import/package statement and the type keyword
        let header_start = code[..decl_start].rfind(';').map(|i| i + 1).unwrap_or(0);
        let annotations = annotations(&code[header_start..decl_start]);

        let rest = &code[decl_end..];
        let header_end = rest.find('{').unwrap_or(rest.len());
        let header = strip_generics(&rest[..header_end]);
        let (supertypes, interfaces) = split_inheritance(kind, &header);

        Some(SourceUnit {
            name,
            package,
            path: path.to_path_buf(),
            relative_path: String::new(),
            module: String::new(),
            content: content.to_string(),
            supertypes,
            interfaces,
            annotations,
            imports,
        })
    }
}

/// Annotation names used anywhere in the type body (e.g. `@Scheduled` on a method)
pub fn body_annotations(content: &str) -> Vec<String> {
    let code = strip_comments(content);
    match code.find('{') {
        Some(open) => annotations(&code[open..]),
        None => Vec::new(),
    }
}

fn split_inheritance(kind: &str, header: &str) -> (Vec<String>, Vec<String>) {
    let header = match header.find('(') {
        // record components
        Some(open) if kind == "record" => match header[open..].find(')') {
            Some(close) => format!("{}{}", &header[..open], &header[open + close + 1..]),
            None => header.to_string(),
        },
        _ => header.to_string(),
    };

    let mut supertypes = Vec::new();
    let mut interfaces = Vec::new();
    let mut target: Option<&mut Vec<String>> = None;

    for token in header.split(|c: char| c.is_whitespace() || c == ',') {
        match token {
            "" => {}
            // interface `extends` lists are supertypes too
            "extends" => target = Some(&mut supertypes),
            "implements" => target = Some(&mut interfaces),
            "permits" | "throws" => target = None,
            name => {
                if let Some(list) = target.as_deref_mut() {
                    let simple = name.rsplit('.').next().unwrap_or(name).to_string();
                    if !list.contains(&simple) {
                        list.push(simple);
                    }
                }
            }
        }
    }
    (supertypes, interfaces)
}

/// Removes `<...>` segments, including nested ones
fn strip_generics(text: &str) -> String {
    let mut depth = 0usize;
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => depth += 1,
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
    }
    out
}

/// Removes `//` and `/* */` comments, leaving string literals intact
pub fn strip_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(quote) = in_string {
            out.push(c);
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push(next);
                }
            } else if c == quote {
                in_string = None;
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) | ('\'', _) => {
                in_string = Some(c);
                out.push(c);
            }
            ('/', Some('/')) => {
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                    }
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(content: &str) -> SourceUnit {
        JavaExtractor::new()
            .extract(Path::new("/src/X.java"), content)
            .expect("unit")
    }

    #[test]
    fn test_entity_header() {
        let unit = extract(
            r#"package com.acme.model;

import javax.persistence.Entity;
import javax.persistence.Table;

/** A customer. @Deprecated in docs only */
@Entity
@Table(name = "customers")
public class Customer extends BaseEntity implements Serializable, Comparable<Customer> {
    @Id private Long id;
}
"#,
        );
        assert_eq!(unit.name, "Customer");
        assert_eq!(unit.package, "com.acme.model");
        assert_eq!(unit.annotations, vec!["Entity", "Table"]);
        assert_eq!(unit.supertypes, vec!["BaseEntity"]);
        assert_eq!(unit.interfaces, vec!["Serializable", "Comparable"]);
        assert_eq!(unit.imports.len(), 2);
    }

    #[test]
    fn test_interface_extends_generic_repository() {
        let unit = extract(
            "package com.acme.repo;\n\npublic interface OrderRepository extends JpaRepository<Order, Map<String, Long>>, Custom {\n}\n",
        );
        assert_eq!(unit.name, "OrderRepository");
        assert_eq!(unit.supertypes, vec!["JpaRepository", "Custom"]);
        assert!(unit.interfaces.is_empty());
        assert!(unit.annotations.is_empty());
    }

    #[test]
    fn test_record_components_ignored() {
        let unit = extract("package a;\n@Value\npublic record Point(int x, int y) implements Shape {}\n");
        assert_eq!(unit.name, "Point");
        assert_eq!(unit.interfaces, vec!["Shape"]);
        assert_eq!(unit.annotations, vec!["Value"]);
    }

    #[test]
    fn test_commented_out_class_is_ignored() {
        let unit = extract(
            "package a;\n// class Fake {}\n/* interface Nope {} */\npublic enum Status { ON, OFF }\n",
        );
        assert_eq!(unit.name, "Status");
    }

    #[test]
    fn test_no_type_declaration() {
        assert!(JavaExtractor::new()
            .extract(Path::new("package-info.java"), "package a;\n")
            .is_none());
    }

    #[test]
    fn test_qualified_annotation_uses_simple_name() {
        let unit = extract("package a;\n@org.springframework.stereotype.Service\nclass S {}\n");
        assert_eq!(unit.annotations, vec!["Service"]);
    }

    #[test]
    fn test_body_annotations() {
        let anns = body_annotations(
            "@Component\nclass Jobs {\n  @Scheduled(cron = \"0 * * * * *\")\n  void run() {}\n  // @KafkaListener\n}\n",
        );
        assert_eq!(anns, vec!["Scheduled"]);
    }

    #[test]
    fn test_strip_comments_keeps_strings() {
        let code = strip_comments("String s = \"http://x\"; // tail\nint a; /* b */ int c;");
        assert!(code.contains("\"http://x\""));
        assert!(!code.contains("tail"));
        assert!(!code.contains("b */"));
        assert!(code.contains("int c;"));
    }
}
