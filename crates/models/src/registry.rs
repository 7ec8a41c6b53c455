use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Name of the root entity type, which every run is keyed on.
pub const ACCOUNT: &str = "Account";
/// Name of the entity type through which individuals and
/// contact points are reached.
pub const CONTACT: &str = "Contact";
/// Name of the entity type referenced by contacts, through which
/// contact points may alternatively be reached.
pub const INDIVIDUAL: &str = "Individual";

/// Registry is the Schema Registry: the fixed set of entity types which
/// are fetched for each account, and how each one links back to it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct Registry {
    /// Entity types, in their default display order.
    pub objects: Vec<ObjectDef>,
}

/// ObjectDef describes one entity type of the remote store.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ObjectDef {
    /// # Remote name of the entity type.
    pub name: String,
    /// # Human-readable label of the entity type.
    pub label: String,
    /// # Link fields which must always be queried.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_fields: Vec<String>,
    /// # How records of this type are reached from an account.
    pub link: Link,
    /// # Fields displayed when the operator hasn't selected any.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub default_fields: Vec<String>,
}

/// Link is the path through which records of a type are reached from an account.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Link {
    /// The root type itself, selected by its identifier.
    Root,
    /// Linked directly to the account by an account-reference field.
    Direct { field: String },
    /// Referenced by the `field` of each of the account's contacts.
    #[serde(rename = "contactReference")]
    ContactReference { field: String },
    /// Reachable through the account's contacts (by `contactField`) and/or
    /// through the account's individuals (by `individualField`).
    ContactPoint {
        #[serde(
            default,
            rename = "contactField",
            skip_serializing_if = "Option::is_none"
        )]
        contact_field: Option<String>,
        #[serde(
            default,
            rename = "individualField",
            skip_serializing_if = "Option::is_none"
        )]
        individual_field: Option<String>,
    },
}

/// LinkPath is one of the two alternative paths to a contact point.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum LinkPath {
    /// Reached through one of the account's contacts.
    Contact,
    /// Reached through one of the account's individuals.
    Individual,
}

impl LinkPath {
    pub fn all() -> &'static [LinkPath] {
        &[LinkPath::Contact, LinkPath::Individual]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LinkPath::Contact => "contact",
            LinkPath::Individual => "individual",
        }
    }
}

/// LinkSource is the provenance of a contact point within an account:
/// the path through which it was reached, and the field which linked it.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinkSource {
    #[serde(rename = "type")]
    pub path: LinkPath,
    pub field: String,
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RegistryError {
    #[error("registry must define exactly one root type named {ACCOUNT} (found {0:?})")]
    Root(Vec<String>),
    #[error("entity type {0} is defined more than once")]
    Duplicate(String),
    #[error("{object} links through {through}, which is not a directly-linked type")]
    MissingLink { object: String, through: &'static str },
    #[error("contact point {0} must define a contact field, an individual field, or both")]
    NoContactPointPath(String),
}

impl Registry {
    pub fn get(&self, name: &str) -> Option<&ObjectDef> {
        self.objects.iter().find(|def| def.name == name)
    }

    /// Human-readable label of `name`, or the name itself if it's unknown.
    pub fn label<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).map(|def| def.label.as_str()).unwrap_or(name)
    }

    /// Types other than the root, in their registry order.
    pub fn linked(&self) -> impl Iterator<Item = &ObjectDef> {
        self.objects
            .iter()
            .filter(|def| !matches!(def.link, Link::Root))
    }

    /// Verify the structural expectations of the registry: a single root
    /// named Account, unique names, and that contact-referenced types and
    /// contact points can actually be reached.
    pub fn validate(&self) -> Result<(), RegistryError> {
        let roots: Vec<String> = self
            .objects
            .iter()
            .filter(|def| matches!(def.link, Link::Root))
            .map(|def| def.name.clone())
            .collect();

        if roots.len() != 1 || roots[0] != ACCOUNT {
            return Err(RegistryError::Root(roots));
        }

        for (index, def) in self.objects.iter().enumerate() {
            if self.objects[..index].iter().any(|o| o.name == def.name) {
                return Err(RegistryError::Duplicate(def.name.clone()));
            }
        }

        let is_direct = |name: &str| {
            matches!(self.get(name), Some(ObjectDef { link: Link::Direct { .. }, .. }))
        };

        for def in &self.objects {
            match &def.link {
                Link::ContactReference { .. } if !is_direct(CONTACT) => {
                    return Err(RegistryError::MissingLink {
                        object: def.name.clone(),
                        through: CONTACT,
                    });
                }
                Link::ContactPoint {
                    contact_field: None,
                    individual_field: None,
                } => return Err(RegistryError::NoContactPointPath(def.name.clone())),
                Link::ContactPoint { .. } if !is_direct(CONTACT) => {
                    return Err(RegistryError::MissingLink {
                        object: def.name.clone(),
                        through: CONTACT,
                    });
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// All fields of `name` which link it to other records: its required
    /// fields, followed by the fields of its link path.
    pub fn link_fields(&self, name: &str) -> Vec<String> {
        let Some(def) = self.get(name) else {
            return Vec::new();
        };
        let mut out: Vec<String> = Vec::new();
        let mut push = |field: &str| {
            if !field.is_empty() && !out.iter().any(|f| f == field) {
                out.push(field.to_string());
            }
        };

        for field in &def.required_fields {
            push(field);
        }
        match &def.link {
            // Referenced types are selected by their own identifier.
            Link::Root | Link::ContactReference { .. } => {}
            Link::Direct { field } => push(field),
            Link::ContactPoint {
                contact_field,
                individual_field,
            } => {
                for field in [contact_field, individual_field].into_iter().flatten() {
                    push(field);
                }
            }
        }
        // Contacts carry the reference which individuals are reached through.
        if name == CONTACT {
            for def in &self.objects {
                if let Link::ContactReference { field } = &def.link {
                    push(field);
                }
            }
        }
        out
    }
}

impl Default for Registry {
    fn default() -> Self {
        fn def(name: &str, label: &str, required: &[&str], link: Link, fields: &[&str]) -> ObjectDef {
            ObjectDef {
                name: name.to_string(),
                label: label.to_string(),
                required_fields: required.iter().map(|s| s.to_string()).collect(),
                link,
                default_fields: fields.iter().map(|s| s.to_string()).collect(),
            }
        }
        let direct = |field: &str| Link::Direct {
            field: field.to_string(),
        };
        let contact_point = || Link::ContactPoint {
            contact_field: Some("Contact__c".to_string()),
            individual_field: Some("ParentId".to_string()),
        };

        Registry {
            objects: vec![
                def(
                    ACCOUNT,
                    "Account",
                    &[],
                    Link::Root,
                    &["Name", "Type", "Industry", "BillingCity", "BillingCountry"],
                ),
                def(
                    "BillingProfile__c",
                    "Billing Profile",
                    &["Account__c"],
                    direct("Account__c"),
                    &["Name", "OwnerId", "CreatedDate", "LastModifiedDate"],
                ),
                def(
                    CONTACT,
                    "Contact",
                    &["AccountId", "IndividualId"],
                    direct("AccountId"),
                    &["FirstName", "LastName", "Email", "Phone", "Title"],
                ),
                def(
                    "Contract",
                    "Contract",
                    &["AccountId"],
                    direct("AccountId"),
                    &["ContractNumber", "Status", "StartDate", "EndDate", "OwnerId"],
                ),
                def(
                    "AccountContactRelation",
                    "Account Contact Relation",
                    &["AccountId", "ContactId"],
                    direct("AccountId"),
                    &["Roles", "IsActive", "IsDirect", "StartDate", "EndDate"],
                ),
                def(
                    "Case",
                    "Case",
                    &["AccountId"],
                    direct("AccountId"),
                    &["CaseNumber", "Status", "Priority", "Origin", "Subject"],
                ),
                def(
                    "Order",
                    "Order",
                    &["AccountId"],
                    direct("AccountId"),
                    &["OrderNumber", "Status", "EffectiveDate", "TotalAmount", "OwnerId"],
                ),
                def(
                    "Sale__c",
                    "Sale",
                    &["Account__c"],
                    direct("Account__c"),
                    &["Name", "Account__c", "Status__c", "SaleStartDate__c", "CreatedDate"],
                ),
                def(
                    INDIVIDUAL,
                    "Individual",
                    &[],
                    Link::ContactReference {
                        field: "IndividualId".to_string(),
                    },
                    &["FirstName", "LastName", "HasOptedOutTracking", "HasOptedOutProfiling"],
                ),
                def(
                    "ContactPointPhone",
                    "Contact Point Phone",
                    &[],
                    contact_point(),
                    &["TelephoneNumber", "IsPrimary", "UsageType", "Status__c"],
                ),
                def(
                    "ContactPointEmail",
                    "Contact Point Email",
                    &[],
                    contact_point(),
                    &["EmailAddress", "IsPrimary", "UsageType", "Status__c"],
                ),
            ],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_registry_is_valid() {
        let registry = Registry::default();
        registry.validate().unwrap();

        assert_eq!(registry.label("BillingProfile__c"), "Billing Profile");
        assert_eq!(registry.label("Unknown__c"), "Unknown__c");
        assert_eq!(registry.linked().count(), registry.objects.len() - 1);
    }

    #[test]
    fn test_link_fields() {
        let registry = Registry::default();

        assert_eq!(registry.link_fields(ACCOUNT), Vec::<String>::new());
        assert_eq!(registry.link_fields("Case"), vec!["AccountId"]);
        assert_eq!(registry.link_fields(CONTACT), vec!["AccountId", "IndividualId"]);
        assert_eq!(
            registry.link_fields("ContactPointPhone"),
            vec!["Contact__c", "ParentId"]
        );
        assert_eq!(registry.link_fields(INDIVIDUAL), Vec::<String>::new());
    }

    #[test]
    fn test_registry_round_trips_through_serde() {
        let fixture = json!({
            "objects": [
                {"name": "Account", "label": "Account", "link": {"kind": "root"}},
                {"name": "Contact", "label": "Contact", "link": {"kind": "direct", "field": "AccountId"}},
                {"name": "Individual", "label": "Individual", "link": {"kind": "contactReference", "field": "IndividualId"}},
                {"name": "ContactPointEmail", "label": "Email", "link": {"kind": "contactPoint", "individualField": "ParentId"}},
            ]
        });
        let registry: Registry = serde_json::from_value(fixture.clone()).unwrap();
        registry.validate().unwrap();

        assert_eq!(
            registry.get("ContactPointEmail").unwrap().link,
            Link::ContactPoint {
                contact_field: None,
                individual_field: Some("ParentId".to_string()),
            }
        );
        assert_eq!(serde_json::to_value(&registry).unwrap(), fixture);
    }

    #[test]
    fn test_validation_errors() {
        let mut registry = Registry::default();
        registry.objects.retain(|def| def.name != ACCOUNT);
        insta::assert_snapshot!(registry.validate().unwrap_err(), @"registry must define exactly one root type named Account (found [])");

        let mut registry = Registry::default();
        registry.objects.retain(|def| def.name != CONTACT);
        insta::assert_snapshot!(registry.validate().unwrap_err(), @"Individual links through Contact, which is not a directly-linked type");

        let mut registry = Registry::default();
        let case = registry.get("Case").unwrap().clone();
        registry.objects.push(case);
        insta::assert_snapshot!(registry.validate().unwrap_err(), @"entity type Case is defined more than once");

        let mut registry = Registry::default();
        registry.objects.push(ObjectDef {
            name: "ContactPointAddress".to_string(),
            label: "Contact Point Address".to_string(),
            required_fields: Vec::new(),
            link: Link::ContactPoint {
                contact_field: None,
                individual_field: None,
            },
            default_fields: Vec::new(),
        });
        insta::assert_snapshot!(registry.validate().unwrap_err(), @"contact point ContactPointAddress must define a contact field, an individual field, or both");
    }
}
