/// Returns the target of the `rel="next"` entry of an RFC 8288 `Link` header.
pub fn parse_next_link(header: &str) -> Option<String> {
    split_link_values(header).into_iter().find_map(|value| {
        let mut params = value.split(';');
        let target = params.next()?.trim();
        let url = target.strip_prefix('<')?.strip_suffix('>')?.trim();

        let is_next = params.any(|param| {
            let Some((key, rel)) = param.split_once('=') else {
                return false;
            };
            key.trim().eq_ignore_ascii_case("rel")
                && rel
                    .trim()
                    .trim_matches('"')
                    .split_whitespace()
                    .any(|rel| rel.eq_ignore_ascii_case("next"))
        });

        (is_next && !url.is_empty()).then(|| url.to_string())
    })
}

// Commas inside `<...>` belong to the URL, not the header list.
fn split_link_values(header: &str) -> Vec<&str> {
    let mut values = Vec::new();
    let mut in_target = false;
    let mut start = 0;

    for (index, ch) in header.char_indices() {
        match ch {
            '<' => in_target = true,
            '>' => in_target = false,
            ',' if !in_target => {
                values.push(&header[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    values.push(&header[start..]);

    values
}

#[cfg(test)]
mod tests {
    use super::parse_next_link;

    #[test]
    fn finds_next_among_other_relations() {
        let header = "<https://api.bugsnag.com/projects/1/errors?offset=0>; rel=\"prev\", \
                      <https://api.bugsnag.com/projects/1/errors?offset=100&per_page=100>; rel=\"next\"";

        assert_eq!(
            parse_next_link(header).as_deref(),
            Some("https://api.bugsnag.com/projects/1/errors?offset=100&per_page=100")
        );
    }

    #[test]
    fn accepts_unquoted_and_multi_valued_rel() {
        assert_eq!(
            parse_next_link("<https://x.test/a?page=2>; rel=next").as_deref(),
            Some("https://x.test/a?page=2")
        );
        assert_eq!(
            parse_next_link("<https://x.test/a?page=2>; title=\"more\"; REL=\"next last\"").as_deref(),
            Some("https://x.test/a?page=2")
        );
    }

    #[test]
    fn commas_inside_target_are_kept() {
        assert_eq!(
            parse_next_link("<https://x.test/a?ids=1,2,3>; rel=\"next\"").as_deref(),
            Some("https://x.test/a?ids=1,2,3")
        );
    }

    #[test]
    fn no_next_relation() {
        assert_eq!(parse_next_link(""), None);
        assert_eq!(parse_next_link("<https://x.test/a>; rel=\"prev\""), None);
        assert_eq!(parse_next_link("https://x.test/a; rel=\"next\""), None);
        assert_eq!(parse_next_link("<>; rel=\"next\""), None);
    }
}
