//! Prompt assembly shared by all converters

use super::response::CodeField;
use super::ConversionContext;
use crate::scanner::SourceUnit;
use std::fmt::Write as _;

/// System prompt: role, category guidance and the response contract
pub fn system_prompt(
    ctx: &ConversionContext,
    category_guidance: &str,
    fields: &[CodeField],
    allow_skip: bool,
) -> String {
    let mut prompt = format!(
        "You are migrating a {source} project to idiomatic {target}. \
         You convert one source file at a time into the target module `{module}`.\n\n",
        source = ctx.source_framework,
        target = ctx.target_language,
        module = ctx.target_module,
    );

    prompt.push_str(category_guidance.trim());
    prompt.push_str("\n\nRespond with a single JSON object and nothing else:\n{\n");
    prompt.push_str("  \"name\": \"<primary type name in the target code>\",\n");
    for field in fields {
        let _ = writeln!(
            prompt,
            "  \"{}\": \"<complete {} source{}>\",",
            field.key,
            ctx.target_language,
            if field.required { "" } else { ", optional" }
        );
    }
    prompt.push_str("  \"notes\": [\"<behavioural differences worth knowing>\"],\n");
    prompt.push_str("  \"requires_review\": <true if a human must check the result>,\n");
    prompt.push_str("  \"review_reason\": \"<why review is needed, or empty>\"");
    if allow_skip {
        prompt.push_str(
            ",\n  \"skip\": <true if this file is not actually of this kind>,\n  \"skip_reason\": \"<why it was skipped>\"",
        );
    }
    prompt.push_str("\n}\n\nEscape newlines and quotes inside code strings. Do not wrap code in markdown.");
    prompt
}

/// User prompt: the unit's structural facts followed by its source
pub fn user_prompt(unit: &SourceUnit, ctx: &ConversionContext) -> String {
    let mut prompt = String::new();
    let _ = writeln!(prompt, "Project: {}", ctx.project_name);
    let _ = writeln!(prompt, "Base package: {}", ctx.base_package);
    let _ = writeln!(prompt, "File: {}", unit.relative_path);
    let _ = writeln!(prompt, "Type: {}", unit.qualified_name());
    if !unit.annotations.is_empty() {
        let _ = writeln!(prompt, "Annotations: {}", unit.annotations.join(", "));
    }
    if !unit.supertypes.is_empty() {
        let _ = writeln!(prompt, "Extends: {}", unit.supertypes.join(", "));
    }
    if !unit.interfaces.is_empty() {
        let _ = writeln!(prompt, "Implements: {}", unit.interfaces.join(", "));
    }
    if !ctx.notes.is_empty() {
        prompt.push_str("\nProject context:\n");
        for note in &ctx.notes {
            let _ = writeln!(prompt, "- {}", note);
        }
    }
    let _ = write!(prompt, "\n```java\n{}\n```\n", unit.content.trim_end());
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn unit() -> SourceUnit {
        SourceUnit {
            name: "User".into(),
            package: "com.acme.model".into(),
            path: PathBuf::from("/src/User.java"),
            relative_path: "src/main/java/com/acme/model/User.java".into(),
            module: ".".into(),
            content: "@Entity\npublic class User {}\n".into(),
            supertypes: vec![],
            interfaces: vec!["Serializable".into()],
            annotations: vec!["Entity".into()],
            imports: vec![],
        }
    }

    #[test]
    fn test_system_prompt_lists_fields_and_skip() {
        let ctx = ConversionContext::default();
        let prompt = system_prompt(
            &ctx,
            "Convert entities.",
            &[CodeField::required("code", "")],
            true,
        );
        assert!(prompt.contains("\"code\""));
        assert!(prompt.contains("\"skip_reason\""));
        assert!(prompt.contains("Convert entities."));

        let no_skip = system_prompt(&ctx, "x", &[CodeField::required("code", "")], false);
        assert!(!no_skip.contains("skip_reason"));
    }

    #[test]
    fn test_user_prompt_contains_unit() {
        let ctx = ConversionContext {
            notes: vec!["primary database: PostgreSQL".into()],
            ..Default::default()
        };
        let prompt = user_prompt(&unit(), &ctx);
        assert!(prompt.contains("Type: com.acme.model.User"));
        assert!(prompt.contains("Implements: Serializable"));
        assert!(prompt.contains("- primary database: PostgreSQL"));
        assert!(prompt.contains("```java\n@Entity"));
    }
}
