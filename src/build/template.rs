use crate::error::BuildError;
use regex::Regex;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([a-z]+)\}").expect("placeholder pattern is valid"));

/// Fills `{name}` placeholders in a command template.
///
/// Every supplied name must appear in the template. After substitution no
/// `{lowercase}` token may remain, whether the template left it unfilled or a
/// value carried it in.
pub fn fill_template(
    template: &str,
    values: &[(&str, &str)],
    context: &str,
) -> Result<String, BuildError> {
    for (name, _) in values {
        if !template.contains(&format!("{{{}}}", name)) {
            return Err(BuildError::MissingPlaceholder {
                context: context.to_string(),
                placeholder: name.to_string(),
                template: template.to_string(),
            });
        }
    }

    let filled = PLACEHOLDER.replace_all(template, |caps: &regex::Captures| {
        values
            .iter()
            .find(|(name, _)| *name == &caps[1])
            .map_or_else(|| caps[0].to_string(), |(_, value)| value.to_string())
    });

    // anything still shaped like a placeholder is an error, even if a value brought it in
    let mut unknown: Vec<String> = PLACEHOLDER
        .find_iter(&filled)
        .map(|m| m.as_str().to_string())
        .collect();
    if !unknown.is_empty() {
        unknown.sort();
        unknown.dedup();
        return Err(BuildError::UnrecognizedPlaceholder {
            context: context.to_string(),
            placeholders: unknown,
        });
    }

    Ok(filled.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "{compiler} -c {source} -o {output}";

    #[test]
    fn test_literal_substitution() {
        let out = fill_template(
            TEMPLATE,
            &[
                ("compiler", "g++"),
                ("source", "/p/a.cpp"),
                ("output", "/c/obj"),
            ],
            "--compiler",
        )
        .unwrap();
        assert_eq!(out, "g++ -c /p/a.cpp -o /c/obj");
        assert!(!out.contains('{'));
    }

    #[test]
    fn test_missing_placeholder() {
        let err = fill_template(
            "{compiler} -c {source}",
            &[("compiler", "g++"), ("source", "a.cpp"), ("output", "a.o")],
            "--compiler",
        )
        .unwrap_err();
        match err {
            BuildError::MissingPlaceholder {
                context,
                placeholder,
                template,
            } => {
                assert_eq!(context, "--compiler");
                assert_eq!(placeholder, "output");
                assert_eq!(template, "{compiler} -c {source}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unrecognized_placeholder() {
        let err = fill_template(
            "{compiler} -c {source} -o {output} {bogus}",
            &[("compiler", "g++"), ("source", "a.cpp"), ("output", "a.o")],
            "--compiler",
        )
        .unwrap_err();
        match err {
            BuildError::UnrecognizedPlaceholder { placeholders, .. } => {
                assert_eq!(placeholders, vec!["{bogus}".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_every_occurrence_is_replaced() {
        let out = fill_template("{output} && strip {output}", &[("output", "app")], "link")
            .unwrap();
        assert_eq!(out, "app && strip app");
    }

    #[test]
    fn test_placeholder_inside_value_is_rejected() {
        let err = fill_template("cc {source}", &[("source", "/p/{weird}.c")], "compiler")
            .unwrap_err();
        match err {
            BuildError::UnrecognizedPlaceholder {
                context,
                placeholders,
            } => {
                assert_eq!(context, "compiler");
                assert_eq!(placeholders, vec!["{weird}".to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_uppercase_braces_are_not_placeholders() {
        let out = fill_template("sh -c 'echo ${HOME}' {output}", &[("output", "x")], "link")
            .unwrap();
        assert_eq!(out, "sh -c 'echo ${HOME}' x");
    }
}
