use super::ObjectView;
use fetcher::ObjectPlan;
use models::{ExplorerConfig, ACCOUNT};
use std::collections::BTreeMap;

/// ObjectLayout is how the records of one entity type are rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLayout {
    pub key: String,
    pub label: String,
    /// Displayed fields, following the identifier.
    pub display_fields: Vec<String>,
    /// Link fields, which are rendered as hidden if they aren't displayed.
    pub link_fields: Vec<String>,
    pub hidden: bool,
}

/// Layout of the account and its linked entity types, in display order.
#[derive(Debug, Clone)]
pub struct Layout {
    pub account: ObjectLayout,
    pub objects: Vec<ObjectLayout>,
}

impl Layout {
    /// Build the Layout of a run. Types having a query plan render its
    /// available fields. Others (which were degraded) fall back to their
    /// configured fields.
    pub fn new(config: &ExplorerConfig, plans: &BTreeMap<String, ObjectPlan>) -> Self {
        let registry = config.registry();

        let object = |key: &str, hidden: bool| {
            let (display_fields, link_fields) = match plans.get(key) {
                Some(plan) => (plan.display_fields.clone(), plan.link_fields.clone()),
                None => (config.display_fields(key), registry.link_fields(key)),
            };
            ObjectLayout {
                key: key.to_string(),
                label: registry.label(key).to_string(),
                display_fields,
                link_fields,
                hidden,
            }
        };

        Self {
            account: object(ACCOUNT, false),
            objects: config
                .objects()
                .iter()
                .map(|view| object(&view.key, view.hidden))
                .collect(),
        }
    }

    /// Linked entity types which are rendered.
    pub fn visible(&self) -> impl Iterator<Item = &ObjectLayout> {
        self.objects.iter().filter(|object| !object.hidden)
    }

    pub fn views(&self) -> Vec<ObjectView> {
        self.visible()
            .map(|object| ObjectView {
                key: object.key.clone(),
                label: object.label.clone(),
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_layout_of_planned_and_degraded_types() {
        let config = ExplorerConfig::from_slice(
            br#"
fields:
  Case: [Subject, Origin]
objects:
  - key: Case
  - key: Contact
    hidden: true
"#,
        )
        .unwrap();

        let available = ["Id", "AccountId", "Subject"]
            .into_iter()
            .map(String::from)
            .collect();
        let mut plans = BTreeMap::new();
        plans.insert(
            "Case".to_string(),
            ObjectPlan::new(&config, "Case", Arc::new(available)),
        );

        let layout = Layout::new(&config, &plans);

        assert_eq!(layout.account.key, "Account");
        assert_eq!(layout.objects[0].key, "Case");
        assert_eq!(layout.objects[0].display_fields, vec!["Subject"]);
        assert_eq!(layout.objects[0].link_fields, vec!["AccountId"]);

        // Contact has no plan, and falls back to its configuration.
        assert_eq!(layout.objects[1].key, "Contact");
        assert!(layout.objects[1].hidden);
        assert_eq!(
            layout.objects[1].link_fields,
            config.registry().link_fields("Contact")
        );

        let views = layout.views();
        assert_eq!(views[0].key, "Case");
        assert!(views.iter().all(|view| view.key != "Contact"));
        assert_eq!(views.len(), layout.objects.len() - 1);
    }
}
