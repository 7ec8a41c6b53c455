use models::{ExplorerConfig, Record};
use std::collections::BTreeSet;
use std::sync::Arc;

/// ObjectPlan is the per-type plan of which fields are queried and displayed,
/// computed once per run from the configuration and the remote schema.
#[derive(Debug, Clone)]
pub struct ObjectPlan {
    pub object: String,
    /// Fields selected by queries: the identifier, then available link
    /// fields, then available display fields.
    pub query_fields: Vec<String>,
    /// Available, operator-selected display fields (excluding the identifier).
    pub display_fields: Vec<String>,
    /// Available link fields.
    pub link_fields: Vec<String>,
    /// All fields of the type known to the remote store.
    pub available: Arc<BTreeSet<String>>,
}

impl ObjectPlan {
    pub fn new(config: &ExplorerConfig, object: &str, available: Arc<BTreeSet<String>>) -> Self {
        let link_fields: Vec<String> = config
            .registry()
            .link_fields(object)
            .into_iter()
            .filter(|field| available.contains(field))
            .collect();

        let display_fields: Vec<String> = config
            .display_fields(object)
            .into_iter()
            .filter(|field| available.contains(field))
            .collect();

        let mut query_fields = vec![Record::ID.to_string()];
        for field in link_fields.iter().chain(display_fields.iter()) {
            if !query_fields.contains(field) {
                query_fields.push(field.clone());
            }
        }

        Self {
            object: object.to_string(),
            query_fields,
            display_fields,
            link_fields,
            available,
        }
    }

    /// Is `field` known to the remote store?
    pub fn has_field(&self, field: &str) -> bool {
        self.available.contains(field)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_plan_filters_unavailable_fields() {
        let config = ExplorerConfig::from_slice(
            br#"
fields:
  Contact: [Email, LastName, Nickname__c, AccountId]
"#,
        )
        .unwrap();

        let available: BTreeSet<String> = ["Id", "AccountId", "Email", "LastName"]
            .into_iter()
            .map(String::from)
            .collect();
        let plan = ObjectPlan::new(&config, "Contact", Arc::new(available));

        assert_eq!(plan.query_fields, vec!["Id", "AccountId", "Email", "LastName"]);
        assert_eq!(plan.display_fields, vec!["Email", "LastName", "AccountId"]);
        assert_eq!(plan.link_fields, vec!["AccountId"]);
        assert!(plan.has_field("Email"));
        assert!(!plan.has_field("IndividualId"));
    }
}
