//! Maven `pom.xml` parsing

use super::descriptor::{BuildDescriptor, ParentRef};
use super::types::{BuildTool, Dependency, DependencyScope};
use roxmltree::{Document, Node};
use std::collections::HashMap;

pub const POM_FILE: &str = "pom.xml";

const LANGUAGE_VERSION_PROPERTIES: &[&str] = &[
    "java.version",
    "maven.compiler.release",
    "maven.compiler.source",
    "maven.compiler.target",
];

pub fn parse_pom(content: &str) -> Result<BuildDescriptor, String> {
    let doc = Document::parse(content).map_err(|e| e.to_string())?;
    let project = doc.root_element();
    if !project.has_tag_name("project") {
        return Err(format!(
            "expected <project> root element, found <{}>",
            project.tag_name().name()
        ));
    }

    let mut properties = HashMap::new();
    if let Some(props) = child(project, "properties") {
        for prop in props.children().filter(Node::is_element) {
            if let Some(value) = prop.text() {
                properties.insert(prop.tag_name().name().to_string(), value.trim().to_string());
            }
        }
    }

    let parent = child(project, "parent").map(|p| ParentRef {
        group_id: child_text(p, "groupId"),
        artifact_id: child_text(p, "artifactId"),
        version: child_text(p, "version"),
    });

    let version = child_text(project, "version")
        .or_else(|| parent.as_ref().and_then(|p| p.version.clone()));
    if let Some(v) = &version {
        properties.insert("project.version".to_string(), v.clone());
    }

    let group_id = child_text(project, "groupId");
    if let Some(g) = group_id.as_ref().or(parent.as_ref().and_then(|p| p.group_id.as_ref())) {
        properties.insert("project.groupId".to_string(), g.clone());
    }

    let language_version = LANGUAGE_VERSION_PROPERTIES
        .iter()
        .find_map(|key| properties.get(*key))
        .map(|v| resolve(v, &properties));

    let modules = child(project, "modules")
        .map(|m| {
            m.children()
                .filter(|n| n.has_tag_name("module"))
                .filter_map(|n| n.text())
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect()
        })
        .unwrap_or_default();

    // Only direct <dependencies>; <dependencyManagement> pins versions but declares nothing.
    let dependencies = child(project, "dependencies")
        .map(|deps| {
            deps.children()
                .filter(|n| n.has_tag_name("dependency"))
                .filter_map(|n| parse_dependency(n, &properties))
                .collect()
        })
        .unwrap_or_default();

    Ok(BuildDescriptor {
        tool: BuildTool::Maven,
        group_id,
        artifact_id: child_text(project, "artifactId"),
        name: child_text(project, "name"),
        version,
        parent,
        language_version,
        framework_version: None,
        modules,
        dependencies,
    })
}

fn parse_dependency(node: Node, properties: &HashMap<String, String>) -> Option<Dependency> {
    let group_id = resolve(&child_text(node, "groupId")?, properties);
    let artifact_id = resolve(&child_text(node, "artifactId")?, properties);
    let scope = child_text(node, "scope")
        .and_then(|s| DependencyScope::from_name(&s))
        .unwrap_or_default();

    let mut dependency = Dependency::new(group_id, artifact_id).with_scope(scope);
    if let Some(version) = child_text(node, "version") {
        dependency = dependency.with_version(resolve(&version, properties));
    }
    Some(dependency)
}

fn child<'a, 'input>(node: Node<'a, 'input>, name: &str) -> Option<Node<'a, 'input>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn child_text(node: Node, name: &str) -> Option<String> {
    child(node, name)
        .and_then(|n| n.text())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Substitutes `${property}` placeholders, leaving unknown ones intact
fn resolve(value: &str, properties: &HashMap<String, String>) -> String {
    let mut out = value.to_string();
    for _ in 0..4 {
        let Some(start) = out.find("${") else { break };
        let Some(end) = out[start..].find('}') else { break };
        let key = &out[start + 2..start + end];
        match properties.get(key) {
            Some(replacement) => {
                out = format!("{}{}{}", &out[..start], replacement, &out[start + end + 1..]);
            }
            None => break,
        }
    }
    out
}
