use std::collections::HashMap;

use indexmap::IndexMap;

/// Section name -> (key -> value). Sections keep the order they first appear in.
pub type IniSections = IndexMap<String, HashMap<String, String>>;

/// Parses the INI dialect used by the AWS shared `credentials` and `config` files.
///
/// Blank lines and lines starting with `#` or `;` are skipped. Key-value lines
/// found before the first section header are ignored. A repeated key inside a
/// section overwrites the earlier value, and a repeated section header keeps
/// accumulating into the same section.
pub fn parse_ini(content: &str) -> IniSections {
    let mut sections = IniSections::new();
    let mut current: Option<String> = None;

    for line in content.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }

        if line.len() > 2 && line.starts_with('[') && line.ends_with(']') {
            let name = line[1..line.len() - 1].to_string();
            sections.entry(name.clone()).or_insert_with(HashMap::new);
            current = Some(name);
            continue;
        }

        if let (Some(section), Some((key, value))) = (current.as_ref(), line.split_once('=')) {
            let key = key.trim();
            if key.is_empty() {
                continue;
            }
            if let Some(entries) = sections.get_mut(section) {
                entries.insert(key.to_string(), value.trim().to_string());
            }
        }
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_sections_and_keys() {
        let sections = parse_ini(
            "[default]\naws_access_key_id = AKIA1\n  region=us-east-1  \n\n[profile dev]\nregion = eu-west-1\n",
        );
        assert_eq!(sections.len(), 2);
        assert_eq!(sections["default"]["aws_access_key_id"], "AKIA1");
        assert_eq!(sections["default"]["region"], "us-east-1");
        assert_eq!(sections["profile dev"]["region"], "eu-west-1");
    }

    #[test]
    fn skips_comments_and_orphan_keys() {
        let sections = parse_ini("orphan=1\n# comment\n; other = comment\n[a]\n#k=v\nk=v\n");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections["a"].len(), 1);
        assert_eq!(sections["a"]["k"], "v");
    }

    #[test]
    fn later_keys_overwrite_and_split_on_first_equals() {
        let sections = parse_ini("[s]\nkey=one\nkey=two\nurl=a=b\nKey=upper\n");
        assert_eq!(sections["s"]["key"], "two");
        assert_eq!(sections["s"]["url"], "a=b");
        assert_eq!(sections["s"]["Key"], "upper");
    }

    #[test]
    fn sections_keep_file_order() {
        let sections = parse_ini("[zeta]\n[alpha]\n[mid]\n[alpha]\n");
        let names: Vec<&str> = sections.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn repeated_section_accumulates() {
        let sections = parse_ini("[s]\na=1\n[t]\nb=2\n[s]\nc=3\n");
        assert_eq!(sections["s"].len(), 2);
        assert_eq!(sections["s"]["c"], "3");
    }

    #[test]
    fn handles_crlf_and_empty_values() {
        let sections = parse_ini("[s]\r\nempty=\r\nnoequals\r\n");
        assert_eq!(sections["s"]["empty"], "");
        assert!(!sections["s"].contains_key("noequals"));
    }

    #[test]
    fn comment_only_input_is_empty() {
        assert!(parse_ini("# nothing\n\n; here\n").is_empty());
    }
}
