/// Replace `${ENV_VAR}` placeholders in raw config text.
///
/// Placeholders naming unset variables are kept verbatim, so a config file
/// still parses when optional variables are missing.
pub fn substitute_env(input: &str) -> String {
    substitute_env_with(input, |name| std::env::var(name).ok())
}

/// Seam for tests: variables are looked up through a closure instead of the
/// real process environment.
fn substitute_env_with(input: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            // Unterminated placeholder: keep the tail as written.
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        if name.is_empty() {
            out.push_str("${}");
        } else {
            match lookup(name) {
                Some(value) => out.push_str(&value),
                None => out.push_str(&rest[start..=start + 2 + end]),
            }
        }
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
