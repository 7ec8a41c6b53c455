/// Build a query selecting `fields` of `object` records
/// having an `id_field` among `ids`.
pub fn select_in(object: &str, fields: &[String], id_field: &str, ids: &[String]) -> String {
    let ids: Vec<String> = ids.iter().map(|id| quote(id)).collect();

    format!(
        "SELECT {} FROM {object} WHERE {id_field} IN ({})",
        fields.join(", "),
        ids.join(", "),
    )
}

// Quote a string literal, escaping quotes and backslashes.
fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('\'');
    for c in value.chars() {
        if c == '\'' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
    out
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_select_in() {
        let fields = vec!["Id".to_string(), "AccountId".to_string(), "Status".to_string()];
        let ids = vec![
            "001000000000001AAA".to_string(),
            "001000000000002AAA".to_string(),
            r"it's\".to_string(),
        ];

        insta::assert_snapshot!(
            select_in("Case", &fields, "AccountId", &ids),
            @r###"SELECT Id, AccountId, Status FROM Case WHERE AccountId IN ('001000000000001AAA', '001000000000002AAA', 'it\'s\\')"###
        );
    }
}
