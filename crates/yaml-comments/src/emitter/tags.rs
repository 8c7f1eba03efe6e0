use crate::tree::TagDirective;

/// Tag handles in effect for one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct TagScope {
    /// `(handle, prefix)` pairs.
    handles: Vec<(String, String)>,
}

impl Default for TagScope {
    fn default() -> Self {
        Self {
            handles: vec![
                ("!".to_owned(), "!".to_owned()),
                ("!!".to_owned(), "tag:yaml.org,2002:".to_owned()),
            ],
        }
    }
}

impl TagScope {
    /// The default handles with `directives` applied on top.
    pub fn for_document(directives: &[TagDirective]) -> Self {
        let mut scope = Self::default();
        for directive in directives {
            match scope
                .handles
                .iter_mut()
                .find(|(handle, _)| *handle == directive.handle)
            {
                Some((_, prefix)) => prefix.clone_from(&directive.prefix),
                None => scope
                    .handles
                    .push((directive.handle.clone(), directive.prefix.clone())),
            }
        }
        scope
    }

    /// Shorthand for `tag` using the handle with the longest matching
    /// prefix, or the verbatim `!<tag>` form if no handle fits.
    pub fn render(&self, tag: &str) -> String {
        if tag == "!" {
            return "!".to_owned();
        }
        self.handles
            .iter()
            .filter_map(|(handle, prefix)| {
                let suffix = tag.strip_prefix(prefix.as_str())?;
                is_tag_suffix(suffix).then_some((handle, prefix.len(), suffix))
            })
            .max_by_key(|&(_, len, _)| len)
            .map_or_else(
                || format!("!<{tag}>"),
                |(handle, _, suffix)| format!("{handle}{suffix}"),
            )
    }
}

fn is_tag_suffix(suffix: &str) -> bool {
    let bytes = suffix.as_bytes();
    if bytes.is_empty() {
        return false;
    }
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'%' {
            let escaped = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !escaped {
                return false;
            }
            i += 3;
            continue;
        }
        if !(b.is_ascii_alphanumeric() || b"-;/?:@&=+$_.~*'()".contains(&b)) {
            return false;
        }
        i += 1;
    }
    true
}
